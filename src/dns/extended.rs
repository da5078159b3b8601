//! Extended DNS Errors (RFC 8914) from a public resolver.
//!
//! Used only to enrich a failure the validating resolver already reported:
//! public resolvers attach an EDE option that names the exact DNSSEC fault.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use hickory_client::client::{AsyncClient, ClientHandle};
use hickory_client::proto::op::Edns;
use hickory_client::proto::rr::rdata::opt::EdnsOption;
use hickory_client::proto::rr::{DNSClass, Name, RecordType};
use hickory_client::udp::UdpClientStream;
use log::debug;
use tokio::net::UdpSocket;

/// EDNS option code assigned to Extended DNS Errors.
const EDE_OPTION_CODE: u16 = 15;

/// An Extended DNS Error attached to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedError {
    /// INFO-CODE from the IANA Extended DNS Error Codes registry
    pub info_code: u16,
    /// Free-form EXTRA-TEXT, possibly empty
    pub extra_text: String,
}

/// Explains a failed resolution with an Extended DNS Error.
///
/// Best effort: `None` means no explanation was available, for whatever
/// reason.
#[async_trait]
pub trait ExtendedErrorSource: Send + Sync {
    /// Looks for an Extended DNS Error for `name`/`rtype`.
    async fn extended_error(&self, name: &Name, rtype: RecordType) -> Option<ExtendedError>;
}

impl ExtendedError {
    /// Parses the option payload: two bytes of info code, then UTF-8 text.
    pub fn decode(data: &[u8]) -> Option<ExtendedError> {
        if data.len() < 2 {
            return None;
        }
        let info_code = u16::from_be_bytes([data[0], data[1]]);
        let extra_text = String::from_utf8_lossy(&data[2..])
            .trim_end_matches('\0')
            .to_string();
        Some(ExtendedError {
            info_code,
            extra_text,
        })
    }

    /// Registered name of the info code.
    pub fn purpose(&self) -> &'static str {
        match self.info_code {
            0 => "Other Error",
            1 => "Unsupported DNSKEY Algorithm",
            2 => "Unsupported DS Digest Type",
            3 => "Stale Answer",
            4 => "Forged Answer",
            5 => "DNSSEC Indeterminate",
            6 => "DNSSEC Bogus",
            7 => "Signature Expired",
            8 => "Signature Not Yet Valid",
            9 => "DNSKEY Missing",
            10 => "RRSIGs Missing",
            11 => "No Zone Key Bit Set",
            12 => "NSEC Missing",
            13 => "Cached Error",
            14 => "Not Ready",
            15 => "Blocked",
            16 => "Censored",
            17 => "Filtered",
            18 => "Prohibited",
            19 => "Stale NXDOMAIN Answer",
            20 => "Not Authoritative",
            21 => "Not Supported",
            22 => "No Reachable Authority",
            23 => "Network Error",
            24 => "Invalid Data",
            _ => "Unknown Error",
        }
    }

    /// Info codes 1, 2 and 5 through 12 describe DNSSEC validation faults.
    pub fn is_dnssec(&self) -> bool {
        matches!(self.info_code, 1 | 2 | 5..=12)
    }
}

impl fmt::Display for ExtendedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.purpose(), self.info_code)?;
        if !self.extra_text.is_empty() {
            write!(f, ": {}", self.extra_text)?;
        }
        Ok(())
    }
}

fn extended_error(edns: &Edns) -> Option<ExtendedError> {
    edns.options()
        .as_ref()
        .values()
        .find_map(|option| match option {
            EdnsOption::Unknown(code, data) if *code == EDE_OPTION_CODE => {
                ExtendedError::decode(data)
            }
            _ => None,
        })
}

/// Re-asks a public resolver for a name to read its Extended DNS Error.
#[derive(Debug, Clone)]
pub struct ExtendedErrorProbe {
    server: SocketAddr,
    timeout: Duration,
}

impl ExtendedErrorProbe {
    /// Probes `server` over UDP, giving up after `timeout`.
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        Self { server, timeout }
    }

    /// Best effort: any failure is logged and reported as `None`.
    pub async fn probe(&self, name: &Name, rtype: RecordType) -> Option<ExtendedError> {
        let query = async {
            let stream = UdpClientStream::<UdpSocket>::with_timeout(self.server, self.timeout);
            let (mut client, background) = AsyncClient::connect(stream).await?;
            let background = tokio::spawn(background);
            let response = client.query(name.clone(), DNSClass::IN, rtype).await;
            background.abort();
            response
        };

        match tokio::time::timeout(self.timeout, query).await {
            Ok(Ok(response)) => response.extensions().as_ref().and_then(extended_error),
            Ok(Err(e)) => {
                debug!("Extended error probe for {name}/{rtype} via {} failed: {e}", self.server);
                None
            }
            Err(_) => {
                debug!("Extended error probe for {name}/{rtype} via {} timed out", self.server);
                None
            }
        }
    }
}

#[async_trait]
impl ExtendedErrorSource for ExtendedErrorProbe {
    async fn extended_error(&self, name: &Name, rtype: RecordType) -> Option<ExtendedError> {
        self.probe(name, rtype).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_extended_error() {
        let mut data = vec![0x00, 0x06];
        data.extend_from_slice(b"signature expired");
        let ede = ExtendedError::decode(&data).unwrap();
        assert_eq!(ede.info_code, 6);
        assert_eq!(ede.extra_text, "signature expired");
        assert!(ede.is_dnssec());
        assert_eq!(ede.to_string(), "DNSSEC Bogus (6): signature expired");
    }

    #[test]
    fn test_decode_rejects_short_payload() {
        assert_eq!(ExtendedError::decode(&[0x01]), None);
    }

    #[test]
    fn test_non_dnssec_codes() {
        let blocked = ExtendedError::decode(&[0x00, 15]).unwrap();
        assert!(!blocked.is_dnssec());
        assert_eq!(blocked.to_string(), "Blocked (15)");
        assert!(!ExtendedError::decode(&[0x00, 3]).unwrap().is_dnssec());
    }
}
