//! Shared building blocks for the ZPA client crates.
//!
//! Defines the error taxonomy used across the workspace and the small wire
//! primitives (API version selector, pagination envelope) that both the
//! transport and the policy layer depend on.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod error;
mod wire;

pub use error::{ZpaError, ZpaResult};
pub use wire::{ApiStatus, ApiVersion, Page};
