use std::fmt;
use std::time::Duration;

use crate::validation::{ValidationError, validate_api_key};

pub const PRODUCTION_ENDPOINT: &str = "https://rpc.gandi.net/xmlrpc/";
pub const OTE_ENDPOINT: &str = "https://rpc.ote.gandi.net/xmlrpc/";

/// Which Gandi platform the run talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Production,
    /// Operational Test & Evaluation platform.
    Ote,
}

impl Environment {
    pub fn from_ote_flag(ote: bool) -> Self {
        if ote {
            Environment::Ote
        } else {
            Environment::Production
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_ENDPOINT,
            Environment::Ote => OTE_ENDPOINT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Ote => "ote",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// API key passed as first argument of every remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into().trim().to_string();
        validate_api_key(&key)?;
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Resolved runtime settings for one invocation.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub environment: Environment,
    pub endpoint: String,
    pub timeout: Option<Duration>,
}

impl AppConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            endpoint: environment.endpoint().to_string(),
            timeout: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}
