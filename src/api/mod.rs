//! HTTP control surface.
//!
//! Every configured device gets two routes:
//!
//! - `GET|POST /{label}` with `brightness` (required), `hue`, `saturation`,
//!   `kelvin` and `transition` runs a transition immediately.
//! - `GET /{label}/status` reports power and colour.
//!
//! Errors are JSON objects with an `error` field.

pub mod handlers;
pub mod params;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::device::{Device, DeviceTransition};

pub use params::{ParamError, parse_power_params};

/// Shared by every handler.
#[derive(Clone)]
pub struct ApiState {
    pub devices: Arc<BTreeMap<String, Arc<dyn Device>>>,
    pub transition: Arc<DeviceTransition>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/:label", get(handlers::power).post(handlers::power))
        .route("/:label/status", get(handlers::status))
        .with_state(state)
}

/// Serve until `running` is cleared.
pub async fn serve(listen: SocketAddr, state: ApiState, running: Arc<AtomicBool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {listen}"))?;
    log_block_start!("Listening on http://{listen}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while running.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(250)).await;
            }
        })
        .await
        .context("HTTP server failed")
}

/// Run [`serve`] on its own Tokio runtime in a background thread.
///
/// The dispatcher keeps the main thread. Errors end the HTTP surface only.
pub fn spawn(
    listen: SocketAddr,
    state: ApiState,
    running: Arc<AtomicBool>,
) -> Result<std::thread::JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start HTTP runtime")?;

    std::thread::Builder::new()
        .name("http".to_string())
        .spawn(move || {
            if let Err(e) = runtime.block_on(serve(listen, state, running)) {
                log_error!("HTTP control surface stopped: {e:#}");
            }
        })
        .context("Failed to start HTTP thread")
}

#[cfg(test)]
mod tests;
