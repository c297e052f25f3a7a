//! Zone-management operations the importer needs from the registrar.
use async_trait::async_trait;

use crate::config::ApiKey;
use crate::error::RpcError;
use crate::gandi::types::{RecordInfo, ZoneFilter, ZoneId, ZoneInfo};

#[async_trait]
pub trait ZoneApi: Send + Sync {
    async fn count_zones(&self, key: &ApiKey, filter: &ZoneFilter) -> Result<i64, RpcError>;

    async fn create_zone(&self, key: &ApiKey, name: &str) -> Result<ZoneInfo, RpcError>;

    /// Creates a new version copied from `base_version`, returning its number.
    async fn new_version(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        base_version: i64,
    ) -> Result<i64, RpcError>;

    /// Replaces every record of `version` with the parsed zone-file text.
    async fn set_records(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        version: i64,
        zone_file: &str,
    ) -> Result<Vec<RecordInfo>, RpcError>;

    async fn set_current_version(
        &self,
        key: &ApiKey,
        zone: ZoneId,
        version: i64,
    ) -> Result<(), RpcError>;

    async fn delete_version(&self, key: &ApiKey, zone: ZoneId, version: i64)
    -> Result<(), RpcError>;

    async fn delete_zone(&self, key: &ApiKey, zone: ZoneId) -> Result<(), RpcError>;
}
