//! Casha presentation state
//!
//! Headless screen state for the Casha personal-finance client:
//! - Observable UI state snapshots per screen (`state`)
//! - View models that turn user intents into background work (`feature`)
//! - Form input validation and request building (`form`)
//! - Use-case and session seams, with an in-memory backend (`usecase`, `session`)
//! - Time-boxed caching of summaries (`cache`)
//!
//! FLOW:
//! INTENT → VALIDATE → LOADING → USE CASE → SNAPSHOT (+ CASCADE REFRESH)

pub mod cache;
pub mod config;
pub mod error;
pub mod feature;
pub mod form;
pub mod models;
pub mod scope;
pub mod session;
pub mod state;
pub mod usecase;

pub use error::{CashaError, Result};

// Re-export common types
pub use cache::{CachedValue, Clock, SystemClock};
pub use config::AppConfig;
pub use form::Form;
pub use scope::TaskScope;
pub use state::{StateContainer, StateObserver};
