//! In-process transport over an engine linked into this binary.
//!
//! # Thread Safety
//!
//! Engine initialization is guarded by a `tokio::sync::OnceCell`: concurrent
//! first calls wait on the same initializer, and no call reaches the engine
//! before initialization has completed. Engine calls are blocking and run on
//! the blocking thread pool.
//!
//! The linked engine is usually a process singleton. Several
//! `EmbeddedTransport` values can exist (tests build one per case), but only
//! one should drive a real engine at a time.

use super::{normalize_params, RpcReply, Transport};
use crate::RcError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// A linked RC engine.
///
/// All methods block the calling thread.
pub trait Engine: Send + Sync + 'static {
    /// Prepare the engine. Called at most once per successful initialization.
    fn initialize(&self) -> crate::Result<()>;

    /// Execute one RC method. `params` is always a JSON object.
    fn rpc(&self, method: &str, params: &str) -> RpcReply;

    /// Release engine resources.
    fn finalize(&self);
}

/// Transport that calls an [`Engine`] in this process.
pub struct EmbeddedTransport<E: Engine> {
    engine: Arc<E>,
    initialized: OnceCell<()>,
    shut_down: AtomicBool,
}

impl<E: Engine> EmbeddedTransport<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(engine),
            initialized: OnceCell::new(),
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.initialized()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Initialize the engine once. A failed attempt leaves the cell empty so
    /// the next call tries again.
    async fn ensure_initialized(&self) -> crate::Result<()> {
        self.initialized
            .get_or_try_init(|| async {
                let engine = Arc::clone(&self.engine);
                tokio::task::spawn_blocking(move || engine.initialize())
                    .await
                    .map_err(|e| RcError::EngineInit(format!("initializer panicked: {}", e)))??;
                info!("Embedded rc engine initialized");
                Ok::<(), RcError>(())
            })
            .await
            .map(|_| ())
    }

    /// Finalize the engine. Idempotent; later calls are rejected.
    pub fn close(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.is_initialized() {
            self.engine.finalize();
            info!("Embedded rc engine finalized");
        }
    }
}

#[async_trait]
impl<E: Engine> Transport for EmbeddedTransport<E> {
    async fn call(&self, method: &str, params: &str) -> RpcReply {
        if self.is_shut_down() {
            warn!("rc call {} after engine shutdown", method);
            return RpcReply::failure("embedded engine has been shut down");
        }

        if let Err(e) = self.ensure_initialized().await {
            return RpcReply::failure(e);
        }

        let engine = Arc::clone(&self.engine);
        let method_owned = method.to_string();
        let params = normalize_params(params).to_string();
        debug!("rc embedded call {}", method);

        tokio::task::spawn_blocking(move || engine.rpc(&method_owned, &params))
            .await
            .unwrap_or_else(|e| RpcReply::failure(format!("engine call {} panicked: {}", method, e)))
    }

    async fn shutdown(&self) {
        self.close();
    }
}
