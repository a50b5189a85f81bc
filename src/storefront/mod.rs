// storefront/mod.rs - Root module for the gift storefront search core
//
// Architecture:
// - model/: Domain types shared by every layer (filters, products, envelopes)
// - debounce.rs: Debounce filter for the keyword box
// - query_state.rs: Filter values <-> serialized location
// - orchestrator.rs: Search state machine and its async session driver
// - api/: Backend seam, HTTP client and (server feature) JSON endpoints
// - config.rs: Environment configuration
// - format.rs: Display formatting and input validation

pub mod model;

pub mod debounce;

pub mod query_state;

pub mod orchestrator;

pub mod api;

pub mod config;

pub mod format;

pub use api::{ApiError, BackendClient, GiftBackend};
pub use config::AppConfig;
pub use debounce::Debouncer;
pub use orchestrator::{SearchOrchestrator, SearchSession, SearchState};
pub use query_state::{FilterContext, QueryState, Update};
