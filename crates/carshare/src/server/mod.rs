//! JSON HTTP service over the rental lifecycle.
//!
//! Every request that changes something authenticates with HTTP Basic
//! credentials. Storage calls are synchronous, so handlers hop onto the
//! blocking pool and serialize on one connection.

mod auth;
mod error;
mod extract;
mod handlers;

use std::sync::{Arc, Mutex};

use axum::routing::{get, patch, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lifecycle::LifecyclePolicy;
use crate::storage::Storage;

pub use auth::CurrentActor;
pub use error::ApiError;
pub use extract::ApiJson;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
    policy: LifecyclePolicy,
    page_size: usize,
}

impl AppState {
    /// Wrap an open storage.
    #[must_use]
    pub fn new(storage: Storage, policy: LifecyclePolicy, page_size: usize) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
            policy,
            page_size,
        }
    }

    /// The lifecycle policy in effect.
    #[must_use]
    pub fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Maximum rentals returned by one browse request.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Run `work` against the storage on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns whatever `work` returns, or an internal error if the task
    /// panicked or the lock is poisoned.
    pub async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&Storage, LifecyclePolicy) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        let policy = self.policy;
        tokio::task::spawn_blocking(move || {
            let storage = storage
                .lock()
                .map_err(|_| Error::internal("storage lock poisoned"))?;
            work(&storage, policy)
        })
        .await
        .map_err(|err| Error::internal(format!("storage task failed: {err}")))?
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/users", post(handlers::register_user))
        .route("/users/:id/overview", get(handlers::user_overview))
        .route("/cars", get(handlers::list_cars).post(handlers::register_car))
        .route(
            "/rentals",
            get(handlers::browse_rentals).post(handlers::create_rental),
        )
        .route(
            "/rentals/:id",
            get(handlers::show_rental)
                .patch(handlers::update_rental)
                .delete(handlers::delete_rental),
        )
        .route("/rentals/:id/rent", patch(handlers::reserve_rental))
        .route("/rentals/:id/cancel", patch(handlers::cancel_rental))
        .with_state(state)
}

/// Open the configured database and serve until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let storage = Storage::open(config.database_path())?;
    let state = AppState::new(storage, config.policy, config.listing.page_size);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| Error::ServerBind {
            addr: addr.to_string(),
            source,
        })?;
    info!(%addr, policy = ?config.policy, "Serving carshare API");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until killed.
        std::future::pending::<()>().await;
    }
}
