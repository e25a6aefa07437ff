//! rcpanel server - a browser control panel for rclone.
//!
//! Pages are rendered on the server; actions answer with a stream of Datastar
//! update events that patch the page in place. All engine access goes through
//! [`rcpanel_core::RcClient`].

pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod updates;
pub mod views;

pub use config::ServerConfig;
pub use context::Context;
pub use error::{error_fragment, PanelError};
pub use router::PanelRouter;
pub use server::{build_router, start_server, AppState};
pub use updates::{PatchMode, UpdateChannel, UpdateEvent, UpdateStream};
