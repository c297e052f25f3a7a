//! Crate entrypoint wiring together configuration, the Gandi client and the importer.

pub mod config;
pub mod error;
pub mod gandi;
pub mod importer;
pub mod remote;
pub mod report;
pub mod validation;

pub use config::{ApiKey, AppConfig, Environment};
pub use error::{CredentialError, Fault, RpcError};
pub use gandi::client::GandiClient;
pub use importer::{ImportFailure, Imported, ZoneSource, check_credential, import_zone};
pub use remote::ZoneApi;
