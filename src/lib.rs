//! Command-line client for ServiceNow CMDB server records

pub mod cmdb;
pub mod config;
pub mod output;

pub use cmdb::client::CmdbClient;
pub use cmdb::error::{CmdbError, CmdbResult};
pub use cmdb::models::{Server, UpdatePayload};
pub use config::Config;
