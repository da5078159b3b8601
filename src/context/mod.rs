//! Per-scan context.
//!
//! This module defines the `ScanContext` struct that groups the shared
//! resources a checker needs with the state that belongs to one scan: the
//! operator's options and the DNS lookup cache.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use anyhow::anyhow;
use hickory_resolver::proto::rr::{Record, RecordType};
use log::trace;
use rand::seq::IndexedRandom;
use tokio::sync::{Mutex, OnceCell};

use crate::config::ScanOptions;
use crate::dns::{addresses, normalize_fqdn, DirectResolver, DnsResolver};
use crate::error_handling::LookupError;
use crate::fetch::ProberConfig;

type LookupResult = Result<Vec<Record>, LookupError>;
type LookupCache = HashMap<(String, RecordType), Arc<OnceCell<LookupResult>>>;

/// Resources shared by every scan an engine runs.
#[derive(Clone)]
pub struct ScanResources {
    /// Validating resolver, as seen by the validation server
    pub resolver: Arc<dyn DnsResolver>,
    /// Client for queries sent straight to a nameserver
    pub direct: Arc<dyn DirectResolver>,
    /// Settings for the emulated HTTP-01 requests
    pub prober: ProberConfig,
    /// HTTP client for ordinary requests (redirects followed)
    pub client: Arc<reqwest::Client>,
    /// HTTP client for ordinary requests (redirects disabled)
    pub redirect_client: Arc<reqwest::Client>,
}

/// Context handed to every checker of one scan.
///
/// Cloning is cheap and every clone shares the same lookup cache, so async
/// checker blocks can move a clone into each spawned task.
#[derive(Clone)]
pub struct ScanContext {
    resources: ScanResources,
    options: Arc<ScanOptions>,
    cache: Arc<Mutex<LookupCache>>,
}

impl ScanContext {
    /// Creates a context with an empty lookup cache.
    pub fn new(resources: ScanResources, options: ScanOptions) -> Self {
        Self {
            resources,
            options: Arc::new(options),
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Operator options for this scan.
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Settings for emulated HTTP-01 requests.
    pub fn prober(&self) -> &ProberConfig {
        &self.resources.prober
    }

    /// Client for queries sent straight to a nameserver. Not cached.
    pub fn direct(&self) -> &Arc<dyn DirectResolver> {
        &self.resources.direct
    }

    /// Ordinary HTTP client that follows redirects.
    pub fn client(&self) -> &reqwest::Client {
        &self.resources.client
    }

    /// Ordinary HTTP client that never follows redirects.
    pub fn redirect_client(&self) -> &reqwest::Client {
        &self.resources.redirect_client
    }

    /// Resolves `name`/`rtype` through the validating resolver, at most once
    /// per scan.
    ///
    /// The outcome (errors included) is cached under the normalized name.
    /// Concurrent callers asking for the same key wait for the first one's
    /// resolution instead of issuing their own.
    pub async fn lookup(&self, name: &str, rtype: RecordType) -> LookupResult {
        let name = normalize_fqdn(name);
        let cell = {
            let mut cache = self.cache.lock().await;
            cache
                .entry((name.clone(), rtype))
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        cell.get_or_init(|| async {
            trace!("Cache miss for {name}/{rtype}");
            self.resources.resolver.lookup(&name, rtype).await
        })
        .await
        .clone()
    }

    /// Picks a random address for `name` the way the validation server
    /// picks one to connect to: AAAA records first, A records otherwise.
    pub async fn lookup_random_http_record(&self, name: &str) -> anyhow::Result<IpAddr> {
        let mut last_error = None;
        for rtype in [RecordType::AAAA, RecordType::A] {
            match self.lookup(name, rtype).await {
                Ok(records) => {
                    let picked = addresses(&records).choose(&mut rand::rng()).copied();
                    if let Some(ip) = picked {
                        return Ok(ip);
                    }
                }
                Err(e) => last_error = Some(e),
            }
        }

        match last_error {
            Some(e) => Err(anyhow!(e).context(format!("No AAAA or A records found for {name}"))),
            None => Err(anyhow!("No AAAA or A records found for {name}")),
        }
    }
}
