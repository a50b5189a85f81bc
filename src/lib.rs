// lib.rs - Root module for the uchigift library
//
// The storefront search core lives under `storefront`; `fixtures` holds
// the sample catalog that unit and integration tests share.

pub mod storefront;

/// Sample gift catalog and a deterministic backend response over it
pub mod fixtures;
