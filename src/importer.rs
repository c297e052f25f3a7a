//! Per-file import sequence with best-effort rollback, plus the key check.
use std::fmt;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ApiKey;
use crate::error::{CredentialError, RpcError};
use crate::gandi::types::{INITIAL_VERSION, ZoneFilter, ZoneId};
use crate::remote::ZoneApi;
use crate::validation::{ValidationError, validate_zone_name};

/// Name used for the dummy count issued by [`check_credential`].
pub const DUMMY_ZONE_NAME: &str = "-dummy-";

/// A zone file to upload. The name becomes the remote zone's name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneSource {
    name: String,
    contents: String,
}

impl ZoneSource {
    pub fn new(
        name: impl Into<String>,
        contents: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_zone_name(&name)?;
        Ok(Self {
            name,
            contents: contents.into(),
        })
    }

    /// Reads the whole file; the path as given is used as the zone name.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::new(path.display().to_string(), contents)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn line_count(&self) -> usize {
        self.contents.matches('\n').count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportStep {
    CreateZone,
    CreateVersion,
    SetRecords,
    PromoteVersion,
    DeleteOldVersion,
}

impl fmt::Display for ImportStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImportStep::CreateZone => "create zone",
            ImportStep::CreateVersion => "create version",
            ImportStep::SetRecords => "set records",
            ImportStep::PromoteVersion => "promote version",
            ImportStep::DeleteOldVersion => "delete old version",
        })
    }
}

/// What happened to the half-built zone after a failed step.
#[derive(Debug)]
pub enum Cleanup {
    /// The zone was never created.
    NotNeeded,
    Deleted,
    Failed(RpcError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Imported {
    pub zone_id: ZoneId,
    pub version: i64,
    pub records: usize,
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct ImportFailure {
    pub step: ImportStep,
    pub zone_id: Option<ZoneId>,
    #[source]
    pub error: RpcError,
    pub cleanup: Cleanup,
}

/// Dummy remote query that only succeeds with a usable key.
pub async fn check_credential<A>(api: &A, key: &ApiKey) -> Result<(), CredentialError>
where
    A: ZoneApi + ?Sized,
{
    api.count_zones(key, &ZoneFilter::by_name(DUMMY_ZONE_NAME))
        .await
        .map(|_| ())
        .map_err(CredentialError::from)
}

/// Creates one remote zone holding the records of `source`.
///
/// Once the zone exists, any failing step triggers exactly one delete of
/// the whole zone. The delete is not retried.
pub async fn import_zone<A>(
    api: &A,
    key: &ApiKey,
    source: &ZoneSource,
) -> Result<Imported, ImportFailure>
where
    A: ZoneApi + ?Sized,
{
    let zone = api
        .create_zone(key, source.name())
        .await
        .map_err(|error| ImportFailure {
            step: ImportStep::CreateZone,
            zone_id: None,
            error,
            cleanup: Cleanup::NotNeeded,
        })?;
    debug!(zone = %zone.id, name = source.name(), "zone created");

    match populate(api, key, zone.id, source).await {
        Ok(imported) => {
            info!(
                zone = %imported.zone_id,
                records = imported.records,
                "zone imported"
            );
            Ok(imported)
        }
        Err((step, error)) => {
            warn!(zone = %zone.id, %step, %error, "import failed, deleting zone");
            let cleanup = match api.delete_zone(key, zone.id).await {
                Ok(()) => Cleanup::Deleted,
                Err(err) => {
                    warn!(zone = %zone.id, error = %err, "cleanup delete failed");
                    Cleanup::Failed(err)
                }
            };
            Err(ImportFailure {
                step,
                zone_id: Some(zone.id),
                error,
                cleanup,
            })
        }
    }
}

async fn populate<A>(
    api: &A,
    key: &ApiKey,
    zone: ZoneId,
    source: &ZoneSource,
) -> Result<Imported, (ImportStep, RpcError)>
where
    A: ZoneApi + ?Sized,
{
    let version = api
        .new_version(key, zone, INITIAL_VERSION)
        .await
        .map_err(|e| (ImportStep::CreateVersion, e))?;

    let records = api
        .set_records(key, zone, version, source.contents())
        .await
        .map_err(|e| (ImportStep::SetRecords, e))?;

    api.set_current_version(key, zone, version)
        .await
        .map_err(|e| (ImportStep::PromoteVersion, e))?;
    api.delete_version(key, zone, INITIAL_VERSION)
        .await
        .map_err(|e| (ImportStep::DeleteOldVersion, e))?;

    Ok(Imported {
        zone_id: zone,
        version,
        records: records.len(),
    })
}
