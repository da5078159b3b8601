//! DNS resolver initialization.
//!
//! This module provides functions to build the validating resolver and the
//! direct nameserver client from an [`EngineConfig`].

use std::sync::Arc;
use std::time::Duration;

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

use crate::config::{EngineConfig, UpstreamResolver, EXTENDED_ERROR_TIMEOUT_SECS};
use crate::dns::{ExtendedErrorProbe, UdpDirectResolver, ValidatingResolver};
use crate::error_handling::InitializationError;

fn upstream_config(upstream: UpstreamResolver) -> ResolverConfig {
    match upstream {
        UpstreamResolver::Google => ResolverConfig::google(),
        UpstreamResolver::Cloudflare => ResolverConfig::cloudflare(),
        UpstreamResolver::Quad9 => ResolverConfig::quad9(),
    }
}

/// Resolver options used for every scan.
///
/// - DNSSEC validation against the built-in root trust anchor
/// - Cached answers expire immediately, so each lookup sees live data
/// - No hosts file and no search list
pub fn resolver_opts(config: &EngineConfig) -> ResolverOpts {
    let mut opts = ResolverOpts::default();
    opts.timeout = config.dns_attempt_timeout;
    opts.attempts = 2;
    opts.ndots = 0;
    opts.validate = true;
    opts.edns0 = true;
    opts.use_hosts_file = false;
    opts.preserve_intermediates = true;
    opts.positive_min_ttl = None;
    opts.negative_min_ttl = None;
    opts.positive_max_ttl = Some(Duration::ZERO);
    opts.negative_max_ttl = Some(Duration::ZERO);
    opts
}

/// Creates the shared validating resolver handle.
///
/// Built once per engine and shared by every scan through an `Arc`.
///
/// # Errors
///
/// Returns `InitializationError::ConfigError` if the timeouts are unusable.
pub fn init_resolver(
    config: &EngineConfig,
) -> Result<Arc<ValidatingResolver>, InitializationError> {
    config.validate()?;

    let handle = TokioAsyncResolver::tokio(upstream_config(config.upstream), resolver_opts(config));
    let mut resolver = ValidatingResolver::new(Arc::new(handle), config.dns_timeout);
    if let Some(server) = config.extended_error_resolver {
        resolver = resolver.with_extended_errors(Arc::new(ExtendedErrorProbe::new(
            server,
            Duration::from_secs(EXTENDED_ERROR_TIMEOUT_SECS),
        )));
    }
    Ok(Arc::new(resolver))
}

/// Creates the client used for queries sent straight to nameservers.
pub fn init_direct_resolver(config: &EngineConfig) -> Arc<UdpDirectResolver> {
    Arc::new(UdpDirectResolver::new(config.direct_query_timeout))
}
