//! Shared fakes for the integration tests.

#![allow(dead_code)] // not every test file uses every helper

use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{Router, extract::State, http::header, response::IntoResponse, routing::post};
use gandi_zone_import::gandi::types::{RecordInfo, ZoneFilter, ZoneId, ZoneInfo};
use gandi_zone_import::{ApiKey, Fault, RpcError, ZoneApi};

pub fn key() -> ApiKey {
    ApiKey::new("test-api-key").unwrap()
}

/// Remote calls in the order they reached the fake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    CountZones,
    CreateZone(String),
    NewVersion(ZoneId, i64),
    SetRecords(ZoneId, i64),
    SetCurrentVersion(ZoneId, i64),
    DeleteVersion(ZoneId, i64),
    DeleteZone(ZoneId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Op {
    CountZones,
    CreateZone,
    NewVersion,
    SetRecords,
    SetCurrentVersion,
    DeleteVersion,
    DeleteZone,
}

#[derive(Debug, Default)]
pub struct FakeZone {
    pub name: String,
    pub versions: Vec<i64>,
    pub current: i64,
    pub records: BTreeMap<i64, usize>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    zones: BTreeMap<ZoneId, FakeZone>,
    next_id: i64,
    failures: HashMap<Op, Fault>,
    failing_names: HashMap<String, Fault>,
}

/// In-memory registrar that records every call and fails on demand.
#[derive(Default)]
pub struct FakeZoneApi {
    state: Mutex<FakeState>,
}

impl FakeZoneApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(self, op: Op, fault: Fault) -> Self {
        self.state.lock().unwrap().failures.insert(op, fault);
        self
    }

    /// Zone creation fails for this name only.
    pub fn fail_create_for(self, name: &str, fault: Fault) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_names
            .insert(name.to_string(), fault);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn zone_names(&self) -> Vec<(ZoneId, String)> {
        let state = self.state.lock().unwrap();
        state
            .zones
            .iter()
            .map(|(id, zone)| (*id, zone.name.clone()))
            .collect()
    }

    pub fn with_zone<T>(&self, id: ZoneId, f: impl FnOnce(Option<&FakeZone>) -> T) -> T {
        let state = self.state.lock().unwrap();
        f(state.zones.get(&id))
    }

    fn enter(&self, call: Call, op: Op) -> Result<std::sync::MutexGuard<'_, FakeState>, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get(&op) {
            Some(fault) => Err(RpcError::Fault(fault.clone())),
            None => Ok(state),
        }
    }
}

fn no_zone(id: ZoneId) -> RpcError {
    RpcError::Fault(Fault::new(581042, format!("zone {id} does not exist")))
}

/// Records are the lines that are neither blank, comments nor directives.
pub fn count_records(zone_file: &str) -> usize {
    zone_file
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with(';') && !l.starts_with('$'))
        .count()
}

#[async_trait]
impl ZoneApi for FakeZoneApi {
    async fn count_zones(&self, _key: &ApiKey, filter: &ZoneFilter) -> Result<i64, RpcError> {
        let state = self.enter(Call::CountZones, Op::CountZones)?;
        let count = state
            .zones
            .values()
            .filter(|z| filter.name.as_deref().is_none_or(|n| n == z.name))
            .count();
        Ok(count as i64)
    }

    async fn create_zone(&self, _key: &ApiKey, name: &str) -> Result<ZoneInfo, RpcError> {
        let mut state = self.enter(Call::CreateZone(name.to_string()), Op::CreateZone)?;
        if let Some(fault) = state.failing_names.get(name) {
            return Err(RpcError::Fault(fault.clone()));
        }
        state.next_id += 1;
        let id = ZoneId(1000 + state.next_id);
        state.zones.insert(
            id,
            FakeZone {
                name: name.to_string(),
                versions: vec![1],
                current: 1,
                records: BTreeMap::new(),
            },
        );
        Ok(ZoneInfo {
            id,
            name: name.to_string(),
            version: Some(1),
            date_updated: None,
        })
    }

    async fn new_version(
        &self,
        _key: &ApiKey,
        zone: ZoneId,
        base_version: i64,
    ) -> Result<i64, RpcError> {
        let mut state = self.enter(Call::NewVersion(zone, base_version), Op::NewVersion)?;
        let z = state.zones.get_mut(&zone).ok_or_else(|| no_zone(zone))?;
        let version = z.versions.iter().max().copied().unwrap_or(0) + 1;
        z.versions.push(version);
        Ok(version)
    }

    async fn set_records(
        &self,
        _key: &ApiKey,
        zone: ZoneId,
        version: i64,
        zone_file: &str,
    ) -> Result<Vec<RecordInfo>, RpcError> {
        let mut state = self.enter(Call::SetRecords(zone, version), Op::SetRecords)?;
        let z = state.zones.get_mut(&zone).ok_or_else(|| no_zone(zone))?;
        let count = count_records(zone_file);
        z.records.insert(version, count);
        Ok((0..count)
            .map(|i| RecordInfo {
                id: Some(i as i64),
                name: "@".into(),
                rtype: "A".into(),
                value: "192.0.2.1".into(),
                ttl: Some(300),
            })
            .collect())
    }

    async fn set_current_version(
        &self,
        _key: &ApiKey,
        zone: ZoneId,
        version: i64,
    ) -> Result<(), RpcError> {
        let mut state = self.enter(Call::SetCurrentVersion(zone, version), Op::SetCurrentVersion)?;
        let z = state.zones.get_mut(&zone).ok_or_else(|| no_zone(zone))?;
        z.current = version;
        Ok(())
    }

    async fn delete_version(
        &self,
        _key: &ApiKey,
        zone: ZoneId,
        version: i64,
    ) -> Result<(), RpcError> {
        let mut state = self.enter(Call::DeleteVersion(zone, version), Op::DeleteVersion)?;
        let z = state.zones.get_mut(&zone).ok_or_else(|| no_zone(zone))?;
        z.versions.retain(|v| *v != version);
        z.records.remove(&version);
        Ok(())
    }

    async fn delete_zone(&self, _key: &ApiKey, zone: ZoneId) -> Result<(), RpcError> {
        let mut state = self.enter(Call::DeleteZone(zone), Op::DeleteZone)?;
        state.zones.remove(&zone).map(|_| ()).ok_or_else(|| no_zone(zone))
    }
}

/// Scripted XML-RPC endpoint: answers by method name, remembers every body.
#[derive(Clone, Default)]
pub struct FakeServer {
    responses: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeServer {
    pub fn respond(&self, method: &str, response_xml: String) {
        self.responses
            .lock()
            .unwrap()
            .insert(method.to_string(), response_xml);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|body| method_name(body).to_string())
            .collect()
    }

    pub async fn spawn(&self) -> SocketAddr {
        let app = Router::new()
            .route("/xmlrpc/", post(handle))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }
}

pub fn endpoint(addr: SocketAddr) -> String {
    format!("http://{addr}/xmlrpc/")
}

pub fn method_name(body: &str) -> &str {
    body.split_once("<methodName>")
        .and_then(|(_, rest)| rest.split_once("</methodName>"))
        .map(|(name, _)| name)
        .unwrap_or_default()
}

async fn handle(State(server): State<FakeServer>, body: String) -> impl IntoResponse {
    let method = method_name(&body).to_string();
    server.requests.lock().unwrap().push(body);
    let xml = server
        .responses
        .lock()
        .unwrap()
        .get(&method)
        .cloned()
        .unwrap_or_else(|| fault_xml(1, &format!("unknown method {method}")));
    ([(header::CONTENT_TYPE, "text/xml")], xml)
}

pub fn response_xml(value_xml: &str) -> String {
    format!(
        "<?xml version='1.0'?>\n<methodResponse>\n<params>\n<param>\n\
         <value>{value_xml}</value>\n</param>\n</params>\n</methodResponse>\n"
    )
}

pub fn fault_xml(code: i64, message: &str) -> String {
    format!(
        "<?xml version='1.0'?>\n<methodResponse>\n<fault>\n<value><struct>\n\
         <member>\n<name>faultCode</name>\n<value><int>{code}</int></value>\n</member>\n\
         <member>\n<name>faultString</name>\n<value><string>{message}</string></value>\n</member>\n\
         </struct></value>\n</fault>\n</methodResponse>\n"
    )
}

/// Script a server where every import step succeeds with `records` records.
pub fn happy_server(zone_id: i64, records: usize) -> FakeServer {
    let server = FakeServer::default();
    server.respond("domain.zone.count", response_xml("<int>0</int>"));
    server.respond(
        "domain.zone.create",
        response_xml(&format!(
            "<struct><member><name>id</name><value><int>{zone_id}</int></value></member>\
             <member><name>name</name><value><string>example.com.zone</string></value></member>\
             <member><name>version</name><value><int>1</int></value></member>\
             <member><name>date_updated</name>\
             <value><dateTime.iso8601>20261018T09:00:00</dateTime.iso8601></value></member>\
             </struct>"
        )),
    );
    server.respond("domain.zone.version.new", response_xml("<int>2</int>"));
    let record = "<value><struct>\
        <member><name>id</name><value><int>1</int></value></member>\
        <member><name>name</name><value><string>www</string></value></member>\
        <member><name>type</name><value><string>A</string></value></member>\
        <member><name>value</name><value><string>192.0.2.1</string></value></member>\
        <member><name>ttl</name><value><int>300</int></value></member>\
        </struct></value>";
    server.respond(
        "domain.zone.record.set",
        response_xml(&format!("<array><data>{}</data></array>", record.repeat(records))),
    );
    server.respond("domain.zone.version.set", response_xml("<boolean>1</boolean>"));
    server.respond("domain.zone.version.delete", response_xml("<boolean>1</boolean>"));
    server.respond("domain.zone.delete", response_xml("<boolean>1</boolean>"));
    server
}
