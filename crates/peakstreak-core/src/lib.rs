//! Domain rules and read-side aggregation for peakstreak.
//!
//! Storage is reached only through the [`gateway::Gateway`] and
//! [`storage::BlobStore`] traits; both are passed in when the
//! [`service::Service`] is constructed.

pub mod context;
pub mod error;
pub mod gateway;
pub mod service;
pub mod storage;

mod accounts;
mod feeds;
mod habits;
mod profile;
mod social;

#[cfg(test)]
mod memory;

pub use context::RequestContext;
pub use error::{Error, ErrorKind, Result};
pub use service::{Service, ServiceConfig};
