//! Hostname lookup on the tokio runtime.

use std::net::IpAddr;
use std::time::Duration;

use tokio::net::lookup_host;
use tracing::trace;

use crate::core::{ResolveCompletion, ResolveError, Resolver};

/// [`Resolver`] backed by the system resolver through `tokio::net::lookup_host`.
///
/// Each lookup runs in its own task and is bounded by a timeout. IP literals
/// complete without touching the system resolver. When a name has both
/// IPv4 and IPv6 addresses, the family of the local socket wins so the
/// request can actually be sent.
///
/// Must be used from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct DnsResolver {
    timeout: Duration,
    prefer_ipv6: bool,
}

impl DnsResolver {
    /// Create a resolver with the given per-lookup timeout.
    pub fn new(timeout: Duration, prefer_ipv6: bool) -> Self {
        Self {
            timeout,
            prefer_ipv6,
        }
    }
}

impl Resolver for DnsResolver {
    fn resolve(&mut self, host: &str, on_complete: ResolveCompletion) {
        let host = host.to_string();
        let timeout = self.timeout;
        let prefer_ipv6 = self.prefer_ipv6;

        tokio::spawn(async move {
            let result = lookup(&host, timeout, prefer_ipv6).await;
            trace!(attempt = %on_complete.attempt(), %host, ?result, "lookup finished");
            on_complete.complete(result);
        });
    }
}

async fn lookup(host: &str, timeout: Duration, prefer_ipv6: bool) -> Result<IpAddr, ResolveError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs = match tokio::time::timeout(timeout, lookup_host((host, 0))).await {
        Err(_) => return Err(ResolveError::TimedOut),
        Ok(Err(e)) => return Err(ResolveError::Lookup(e.to_string())),
        Ok(Ok(addrs)) => addrs.map(|addr| addr.ip()).collect::<Vec<_>>(),
    };

    select_address(&addrs, prefer_ipv6).ok_or_else(|| ResolveError::NotFound {
        host: host.to_string(),
    })
}

/// First address of the preferred family, else the first address.
fn select_address(addrs: &[IpAddr], prefer_ipv6: bool) -> Option<IpAddr> {
    addrs
        .iter()
        .find(|ip| ip.is_ipv6() == prefer_ipv6)
        .or_else(|| addrs.first())
        .copied()
}
