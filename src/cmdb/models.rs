//! CMDB record types
//!
//! Wire shapes of the ServiceNow Table API for server configuration items.

use super::error::{CmdbError, CmdbResult};
use serde::{Deserialize, Serialize};

/// A server configuration item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub sys_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub short_description: String,
}

/// List response envelope: `{"result": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct ServerList {
    pub result: Vec<Server>,
}

/// Single record response
///
/// The Table API wraps one record as `{"result": {...}}`; bare records are
/// accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SingleServer {
    Wrapped { result: Server },
    Bare(Server),
}

impl From<SingleServer> for Server {
    fn from(value: SingleServer) -> Self {
        match value {
            SingleServer::Wrapped { result } => result,
            SingleServer::Bare(server) => server,
        }
    }
}

/// Sparse update body. Unset fields are left out of the JSON entirely so the
/// remote record keeps its current values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
}

impl UpdatePayload {
    /// Build a payload from optional CLI values. Empty strings count as unset.
    pub fn new(name: Option<String>, short_description: Option<String>) -> CmdbResult<Self> {
        let payload = Self {
            name: name.filter(|s| !s.is_empty()),
            short_description: short_description.filter(|s| !s.is_empty()),
        };

        if payload.is_empty() {
            return Err(CmdbError::EmptyUpdate);
        }
        Ok(payload)
    }

    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            && self.short_description.as_deref().map_or(true, str::is_empty)
    }
}
