//! Query specification and construction.
//!
//! The query is built once per run. Building fails fast on an unknown
//! record type or an unusable domain, before any packet is sent.

use crate::config::ProbeSettings;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use trust_dns_resolver::proto::op::{Edns, Message, MessageType, OpCode, Query};
use trust_dns_resolver::proto::rr::{Name, RecordType};

/// How queries reach the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Connectionless, EDNS enabled
    #[default]
    Udp,
    /// Length-prefixed over a TCP connection, no EDNS
    Tcp,
}

impl TransportMode {
    #[must_use]
    pub fn from_tcp_flag(tcp: bool) -> Self {
        if tcp {
            Self::Tcp
        } else {
            Self::Udp
        }
    }

    /// Whether queries in this mode carry an EDNS OPT record.
    #[must_use]
    pub fn uses_edns(self) -> bool {
        matches!(self, Self::Udp)
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Udp => write!(f, "udp"),
            Self::Tcp => write!(f, "tcp"),
        }
    }
}

/// What to ask and how to send it. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    domain: String,
    name: Name,
    record_type: RecordType,
    mode: TransportMode,
}

impl QuerySpec {
    /// Validate a domain and record type for probing.
    ///
    /// The record type is matched case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownRecordType` for an unrecognized type and
    /// `Error::InvalidDomain` if the domain is not a valid DNS name.
    pub fn new(domain: &str, record_type: &str, mode: TransportMode) -> Result<Self> {
        let record_type = parse_record_type(record_type)?;

        let domain = domain.trim();
        if domain.is_empty() {
            return Err(Error::InvalidDomain("empty domain".into()));
        }
        let fqdn = if domain.ends_with('.') {
            domain.to_string()
        } else {
            format!("{domain}.")
        };
        let name =
            Name::from_ascii(&fqdn).map_err(|e| Error::InvalidDomain(format!("{domain}: {e}")))?;

        Ok(Self {
            domain: domain.trim_end_matches('.').to_string(),
            name,
            record_type,
            mode,
        })
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn name(&self) -> &Name {
        &self.name
    }

    #[must_use]
    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    #[must_use]
    pub fn mode(&self) -> TransportMode {
        self.mode
    }
}

/// Parse a record type mnemonic such as `a`, `AAAA` or `txt`.
///
/// # Errors
///
/// Returns `Error::UnknownRecordType` if the mnemonic is not recognized.
pub fn parse_record_type(record_type: &str) -> Result<RecordType> {
    let upper = record_type.trim().to_ascii_uppercase();
    RecordType::from_str(&upper).map_err(|_| Error::UnknownRecordType(record_type.to_string()))
}

/// Build the query message for a run.
///
/// UDP queries advertise EDNS with the configured payload size; TCP
/// queries are plain.
#[must_use]
pub fn build_query(spec: &QuerySpec, settings: &ProbeSettings) -> Message {
    let mut message = Message::new();
    message
        .set_id(fastrand::u16(..))
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(spec.name.clone(), spec.record_type));

    if spec.mode.uses_edns() {
        let mut edns = Edns::new();
        edns.set_max_payload(settings.edns_payload);
        edns.set_version(0);
        *message.extensions_mut() = Some(edns);
    }

    message
}
