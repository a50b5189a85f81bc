// fixtures/mod.rs - Test fixtures module
//
// Reusable catalog data for unit tests, integration tests and local
// experiments against the storefront without a running backend.

pub mod catalog;

pub use catalog::{sample_gifts, sample_result};
