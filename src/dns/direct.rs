//! Direct queries to a single nameserver over UDP.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use hickory_client::client::{AsyncClient, ClientHandle};
use hickory_client::proto::rr::{DNSClass, Name, RecordType};
use hickory_client::udp::UdpClientStream;
use tokio::net::UdpSocket;

use super::records::to_fqdn;
use super::{DirectAnswer, DirectResolver};
use crate::error_handling::{error_chain, LookupError};

/// Sends recursion-desired queries to `server:53` without any caching.
#[derive(Debug, Clone)]
pub struct UdpDirectResolver {
    timeout: Duration,
    port: u16,
}

impl UdpDirectResolver {
    /// Queries port 53, giving up on a server after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, port: 53 }
    }

    /// Overrides the destination port (53 by default).
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

#[async_trait]
impl DirectResolver for UdpDirectResolver {
    async fn query(
        &self,
        server: IpAddr,
        name: &str,
        rtype: RecordType,
    ) -> Result<DirectAnswer, LookupError> {
        let fqdn = to_fqdn(name);
        let query_name = Name::from_ascii(&fqdn).map_err(|e| LookupError::InvalidName {
            name: fqdn.clone(),
            message: e.to_string(),
        })?;
        let addr = SocketAddr::new(server, self.port);

        let exchange = async {
            let stream = UdpClientStream::<UdpSocket>::with_timeout(addr, self.timeout);
            let (mut client, background) = AsyncClient::connect(stream).await?;
            let background = tokio::spawn(background);
            let response = client.query(query_name, DNSClass::IN, rtype).await;
            background.abort();
            response
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(response)) => Ok(DirectAnswer {
                response_code: response.response_code(),
                answers: response.answers().to_vec(),
            }),
            Ok(Err(e)) => Err(LookupError::Resolution {
                name: fqdn,
                rtype: rtype.to_string(),
                message: format!("query to {addr} failed: {}", error_chain(&e)),
            }),
            Err(_) => Err(LookupError::Timeout {
                name: fqdn,
                rtype: rtype.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
