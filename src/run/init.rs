//! Engine construction.

use std::sync::Arc;
use std::time::Duration;

use log::debug;

use super::Engine;
use crate::checker::Checker;
use crate::checks::default_checkers;
use crate::config::{EngineConfig, CLOUDFLARE_TIMEOUT_SECS};
use crate::context::ScanResources;
use crate::dns::{DirectResolver, DnsResolver};
use crate::error_handling::InitializationError;
use crate::fetch::ProberConfig;
use crate::initialization::{init_client, init_direct_resolver, init_redirect_client, init_resolver};

impl Engine {
    /// Builds an engine with the default checkers and real network resolvers.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or an HTTP client
    /// cannot be created.
    pub fn new(config: EngineConfig) -> Result<Self, InitializationError> {
        let resolver = init_resolver(&config)?;
        let direct = init_direct_resolver(&config);
        let prober = ProberConfig {
            timeout: config.http_timeout,
            ..Default::default()
        };
        debug!(
            "Engine configured with {:?} upstream, DNS timeout {:?}, HTTP timeout {:?}",
            config.upstream, config.dns_timeout, config.http_timeout
        );
        Self::with_parts(resolver, direct, prober, default_checkers())
    }

    /// Builds an engine from explicit parts.
    ///
    /// Lets embedders and tests substitute resolvers or run their own checker
    /// list. `checkers` run in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created.
    pub fn with_parts(
        resolver: Arc<dyn DnsResolver>,
        direct: Arc<dyn DirectResolver>,
        prober: ProberConfig,
        checkers: Vec<Arc<dyn Checker>>,
    ) -> Result<Self, InitializationError> {
        let timeout = Duration::from_secs(CLOUDFLARE_TIMEOUT_SECS);
        let resources = ScanResources {
            resolver,
            direct,
            prober,
            client: Arc::new(init_client(timeout)?),
            redirect_client: Arc::new(init_redirect_client(timeout)?),
        };
        Ok(Self {
            resources,
            checkers: Arc::new(checkers),
        })
    }
}
