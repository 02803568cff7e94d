//! UDP and TCP query transport.
//!
//! The probe loop talks to the network through the [`Transport`] trait so
//! it can be driven by a scripted transport in tests. [`NetworkTransport`]
//! is the tokio-socket implementation used by the CLI.

#![allow(clippy::missing_errors_doc)]

use crate::error::{Error, Result};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use trust_dns_resolver::proto::op::{Message, ResponseCode};
use trust_dns_resolver::proto::rr::Record;
use trust_dns_resolver::proto::serialize::binary::BinEncodable;

/// Receive buffer for UDP replies. Holds the largest datagram a DNS message can fill,
/// whatever payload size the query advertised.
const UDP_RECV_BUFFER_SIZE: usize = u16::MAX as usize;

/// A reply from the server.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    /// Answer section records
    pub answers: Vec<Record>,
    /// Response code from the header
    pub response_code: ResponseCode,
    /// Round trip from send to parsed reply
    pub elapsed: Duration,
}

impl DnsResponse {
    fn from_message(message: &Message, elapsed: Duration) -> Self {
        Self {
            answers: message.answers().to_vec(),
            response_code: message.response_code(),
            elapsed,
        }
    }
}

/// Sends a built query to a server.
///
/// Implementations must return `Error::Timeout` when no reply arrives
/// within `timeout`, and any other error for transport failures.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Send over UDP without a handshake.
    async fn send_udp(
        &self,
        query: &Message,
        server: SocketAddr,
        timeout: Duration,
    ) -> Result<DnsResponse>;

    /// Send over a TCP connection with a length prefix.
    async fn send_tcp(
        &self,
        query: &Message,
        server: SocketAddr,
        timeout: Duration,
    ) -> Result<DnsResponse>;
}

/// Transport backed by tokio sockets.
///
/// Each query uses a fresh socket or connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkTransport;

impl NetworkTransport {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    async fn exchange_udp(query: &Message, bytes: &[u8], server: SocketAddr) -> Result<Message> {
        let bind_addr: SocketAddr = if server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.send_to(bytes, server).await?;

        let mut buf = vec![0u8; UDP_RECV_BUFFER_SIZE];
        loop {
            let (len, src) = socket.recv_from(&mut buf).await?;
            if src != server {
                tracing::debug!("Ignoring datagram from unexpected source {src}");
                continue;
            }
            let response = match Message::from_vec(&buf[..len]) {
                Ok(response) => response,
                Err(e) => {
                    tracing::debug!("Ignoring undecodable datagram from {src}: {e}");
                    continue;
                }
            };
            if response.id() != query.id() {
                tracing::debug!(
                    "Ignoring reply with id {} (expected {})",
                    response.id(),
                    query.id()
                );
                continue;
            }
            return Ok(response);
        }
    }

    async fn exchange_tcp(query: &Message, bytes: &[u8], server: SocketAddr) -> Result<Message> {
        let len = u16::try_from(bytes.len())
            .map_err(|_| Error::parse(format!("query too large: {} bytes", bytes.len())))?;

        let mut stream = TcpStream::connect(server).await?;
        let mut send_buf = Vec::with_capacity(bytes.len() + 2);
        send_buf.extend_from_slice(&len.to_be_bytes());
        send_buf.extend_from_slice(bytes);
        stream.write_all(&send_buf).await?;

        let mut len_buf = [0u8; 2];
        stream.read_exact(&mut len_buf).await?;
        let response_len = u16::from_be_bytes(len_buf) as usize;
        let mut response_buf = vec![0u8; response_len];
        stream.read_exact(&mut response_buf).await?;

        let response = Message::from_vec(&response_buf)?;
        if response.id() != query.id() {
            return Err(Error::network(format!(
                "reply id {} does not match query id {}",
                response.id(),
                query.id()
            )));
        }
        Ok(response)
    }
}

impl Transport for NetworkTransport {
    async fn send_udp(
        &self,
        query: &Message,
        server: SocketAddr,
        limit: Duration,
    ) -> Result<DnsResponse> {
        let bytes = query.to_vec()?;
        tracing::debug!("Sending {} byte UDP query to {server}", bytes.len());

        let start = Instant::now();
        let response = timeout(limit, Self::exchange_udp(query, &bytes, server))
            .await
            .map_err(|_| Error::Timeout)??;
        Ok(DnsResponse::from_message(&response, start.elapsed()))
    }

    async fn send_tcp(
        &self,
        query: &Message,
        server: SocketAddr,
        limit: Duration,
    ) -> Result<DnsResponse> {
        let bytes = query.to_vec()?;
        tracing::debug!("Sending {} byte TCP query to {server}", bytes.len());

        let start = Instant::now();
        let response = timeout(limit, Self::exchange_tcp(query, &bytes, server))
            .await
            .map_err(|_| Error::Timeout)??;
        Ok(DnsResponse::from_message(&response, start.elapsed()))
    }
}
