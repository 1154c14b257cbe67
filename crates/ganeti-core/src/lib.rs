//! # ganeti-core
//!
//! Transport, error and polling primitives for the Ganeti Remote API (RAPI v2).
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and HTTP status mapping
//! - [`config`] - Connection configuration and validation
//! - [`client`] - Authenticated HTTP session and request execution
//! - [`clock`] - Time sources for polling
//! - [`poll`] - Poll-until-settled primitive
//! - [`query`] - Query parameter builder
//! - [`types`] - Payload normalization helpers
//! - [`uuid`] - Strongly-typed UUID wrappers for Ganeti objects

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod poll;
pub mod query;
pub mod types;
pub mod uuid;

// Re-export commonly used types
pub use client::{ApiClient, ApiClientBuilder, ClientConfig};
pub use clock::{Clock, ScriptedClock, SystemClock};
pub use config::RapiClientConfig;
pub use error::{ApiFailure, Error, Result};
pub use poll::{poll_until, PollOutcome, PollPolicy};
