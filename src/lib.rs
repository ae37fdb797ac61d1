pub mod backend;
pub mod basemap;
pub mod classify;
pub mod config;
mod error;
pub mod geo;
pub mod layers;
pub mod mitigation;
pub mod notify;
pub mod session;
pub mod validation;

pub use error::{FetchError, LoadError, RangeError, UhiMapperError, GENERIC_BACKEND_MESSAGE};
pub use session::{Session, SessionController};

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
