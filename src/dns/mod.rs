//! DNS module.
//!
//! This module provides the probing functionality:
//! - Query specification and construction
//! - UDP/TCP transport
//! - The probe loop
//! - Outcome types and run statistics

pub mod probe;
pub mod query;
pub mod transport;
pub mod types;

pub use probe::Prober;
pub use query::{QuerySpec, TransportMode};
pub use transport::{DnsResponse, NetworkTransport, Transport};
pub use types::*;
