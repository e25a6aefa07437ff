//! rcpanel core - typed client for the rclone remote-control (RC) API.
//!
//! The client speaks to rclone through a [`Transport`]: either an HTTP
//! connection to `rclone rcd`, or librclone linked into the process. Both
//! report failures through the returned status code, so the same client code
//! works over either.
//!
//! # Example
//!
//! ```rust,ignore
//! use rcpanel_core::{HttpTransport, RcClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> rcpanel_core::Result<()> {
//!     let transport = HttpTransport::new("http://localhost:5572").expect("valid url");
//!     let rc = RcClient::new(Arc::new(transport));
//!
//!     for remote in rc.list_remotes().await? {
//!         println!("{remote}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod transport;

pub use cancel::CancellationToken;
pub use client::RcClient;
pub use config::{JobConfig, RcConfig, TransportConfig};
pub use error::{RcError, Result};
pub use jobs::{JobSummary, JobTracker};
pub use models::{fs_address, Job, JobState, ListEntry, RemoteConfig, StatsSnapshot, VersionInfo};
pub use transport::{EmbeddedTransport, Engine, HttpTransport, RpcReply, Transport};
