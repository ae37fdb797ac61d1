//! The heat-analysis session engine.
//!
//! # Architecture
//!
//! - **State**: [`SessionState`] holds the loaded window, per-track status and
//!   the live layer handles. It is owned by one [`SessionController`].
//! - **Dispatch**: user triggers and backend responses are [`Event`]s; each
//!   maps to one handler, which may return a [`Command`] for the backend.
//! - **Runner**: [`Session`] executes commands against a [`BackendClient`]
//!   and feeds the responses back in.
//!
//! Two tracks run independently. Heat loads are keyed by date window and
//! skipped when the window matches the last successful load; mitigation loads
//! always hit the backend.
//!
//! # Example
//!
//! ```ignore
//! let mut session = Session::open(map, HttpBackendClient::from_config(&config)?, prefs, &config, today);
//! session.load_heat_data("2024-01-01", "2024-01-31").await;
//! session.load_mitigation().await;
//! ```
//!
//! [`BackendClient`]: crate::backend::BackendClient

mod controller;
mod events;
mod runner;
mod state;

pub use controller::{SessionController, SessionSettings};
pub use events::{Command, Event, TriggerId};
pub use runner::Session;
pub use state::{Phase, SessionState, TrackStatus};
