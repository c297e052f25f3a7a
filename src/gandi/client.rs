use crate::config::{ApiKey, AppConfig};
use crate::error::RpcError;
use crate::gandi::types::*;
use crate::gandi::xmlrpc::{self, Value};
use crate::remote::ZoneApi;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

#[derive(Clone)]
pub struct GandiClient {
    http: Client,
    endpoint: String, // e.g. "https://rpc.gandi.net/xmlrpc/"
}

impl GandiClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, RpcError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(
        &self,
        method: &'static str,
        key: &ApiKey,
        params: Vec<Value>,
    ) -> Result<Value, RpcError> {
        let mut all = Vec::with_capacity(params.len() + 1);
        all.push(Value::from(key.expose()));
        all.extend(params);

        debug!(method, endpoint = %self.endpoint, "xml-rpc call");
        let res = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(xmlrpc::encode_call(method, &all))
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(RpcError::Status(res.status()));
        }
        let body = res.text().await?;
        xmlrpc::decode_response(&body)
    }

    async fn call_bool(
        &self,
        method: &'static str,
        key: &ApiKey,
        params: Vec<Value>,
    ) -> Result<(), RpcError> {
        match self.call(method, key, params).await? {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) => Err(RpcError::Rejected { method }),
            other => Err(unexpected(method, "boolean", &other)),
        }
    }

    async fn call_int(
        &self,
        method: &'static str,
        key: &ApiKey,
        params: Vec<Value>,
    ) -> Result<i64, RpcError> {
        let value = self.call(method, key, params).await?;
        value
            .as_i64()
            .ok_or_else(|| unexpected(method, "int", &value))
    }
}

fn unexpected(method: &str, expected: &str, found: &Value) -> RpcError {
    RpcError::malformed(format!(
        "{method} returned {}, expected {expected}",
        found.type_name()
    ))
}

#[async_trait]
impl ZoneApi for GandiClient {
    async fn count_zones(&self, key: &ApiKey, filter: &ZoneFilter) -> Result<i64, RpcError> {
        self.call_int("domain.zone.count", key, vec![Value::from(filter)])
            .await
    }

    async fn create_zone(&self, key: &ApiKey, name: &str) -> Result<ZoneInfo, RpcError> {
        let params = vec![Value::structure([("name", Value::from(name))])];
        let value = self.call("domain.zone.create", key, params).await?;
        ZoneInfo::try_from(value)
    }

    async fn new_version(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        base_version: i64,
    ) -> Result<i64, RpcError> {
        self.call_int(
            "domain.zone.version.new",
            key,
            vec![zone.into(), Value::Int(base_version)],
        )
        .await
    }

    async fn set_records(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        version: i64,
        zone_file: &str,
    ) -> Result<Vec<RecordInfo>, RpcError> {
        let params = vec![zone.into(), Value::Int(version), Value::from(zone_file)];
        let value = self.call("domain.zone.record.set", key, params).await?;
        records_from_value(value)
    }

    async fn set_current_version(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        version: i64,
    ) -> Result<(), RpcError> {
        self.call_bool(
            "domain.zone.version.set",
            key,
            vec![zone.into(), Value::Int(version)],
        )
        .await
    }

    async fn delete_version(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        version: i64,
    ) -> Result<(), RpcError> {
        self.call_bool(
            "domain.zone.version.delete",
            key,
            vec![zone.into(), Value::Int(version)],
        )
        .await
    }

    async fn delete_zone(&self, key: &ApiKey, zone: ZoneId) -> Result<(), RpcError> {
        self.call_bool("domain.zone.delete", key, vec![zone.into()])
            .await
    }
}
