//! HTTP transport for the ZPA management API.
//!
//! This crate owns everything between the policy layer and the wire: client
//! configuration, the signin session, the customer-scoped URL scheme, and the
//! paginated list protocol. It deliberately carries no retry or rate-limit
//! logic; failures surface to the caller on first occurrence.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

mod client;
mod config;
mod session;

pub use client::ZpaClient;
pub use config::ZpaConfig;
pub use session::{Session, TokenResponse};
