//! Address pinning for the emulated request.

use std::net::{IpAddr, SocketAddr};

use reqwest::dns::{Addrs, Name, Resolve, Resolving};

use super::result::ProbeRecorder;
use crate::context::ScanContext;
use crate::dns::normalize_fqdn;

/// Resolver handed to reqwest for a single probe.
///
/// The domain under test always resolves to the address being probed. Any
/// other host (a redirect target) gets a random address from the scan's
/// cached lookups, as the validation server would pick one.
pub(crate) struct PinnedResolver {
    domain: String,
    ip: IpAddr,
    dial_port: u16,
    ctx: ScanContext,
    recorder: ProbeRecorder,
}

impl PinnedResolver {
    /// `dial_port` of `None` keeps the scheme's default port.
    pub(crate) fn new(
        domain: &str,
        ip: IpAddr,
        dial_port: Option<u16>,
        ctx: ScanContext,
        recorder: ProbeRecorder,
    ) -> Self {
        Self {
            domain: normalize_fqdn(domain),
            ip,
            // Port 0 tells the connector to use the URL's port
            dial_port: dial_port.unwrap_or(0),
            ctx,
            recorder,
        }
    }
}

impl Resolve for PinnedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = normalize_fqdn(name.as_str());
        let pinned = (host == self.domain).then_some(self.ip);
        let dial_port = self.dial_port;
        let ctx = self.ctx.clone();
        let recorder = self.recorder.clone();

        Box::pin(async move {
            let ip = match pinned {
                Some(ip) => ip,
                None => ctx.lookup_random_http_record(&host).await?,
            };
            recorder.trace(format!("Dialing {ip}"));
            let addrs: Addrs = Box::new(std::iter::once(SocketAddr::new(ip, dial_port)));
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(addrs)
        })
    }
}

