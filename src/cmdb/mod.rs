//! ServiceNow CMDB API interaction module
//!
//! # Module Structure
//!
//! - [`client`] - CMDB client exposing list/get/update operations
//! - [`error`] - Error kinds surfaced by the client
//! - [`http`] - HTTP backend trait and its reqwest implementation
//! - [`models`] - Server records and request/response shapes
//!
//! # Example
//!
//! ```ignore
//! use cmdbctl::cmdb::client::CmdbClient;
//!
//! async fn example(config: &cmdbctl::config::Config) -> anyhow::Result<()> {
//!     let client = CmdbClient::new(config)?;
//!     for server in client.list_servers().await? {
//!         println!("{}", server.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod models;
