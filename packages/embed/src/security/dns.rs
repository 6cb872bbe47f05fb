//! Connect-time DNS resolution through the [`UrlGuard`].
//!
//! reqwest asks [`GuardedResolver`] for addresses on every connection,
//! including redirect hops, so a name that resolves into private space is
//! refused before any socket is opened. Lookups run inside the request
//! future and are bounded by the client timeout.

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::fmt::Debug;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::warn;

use crate::error::SecurityError;
use crate::security::UrlGuard;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Host name lookup.
#[async_trait]
pub trait HostLookup: Send + Sync + Debug {
    /// All addresses `host` resolves to.
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>>;
}

/// The operating system resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl HostLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// reqwest resolver that only hands out addresses the guard allows.
#[derive(Debug, Clone)]
pub struct GuardedResolver {
    guard: UrlGuard,
    lookup: Arc<dyn HostLookup>,
}

impl GuardedResolver {
    pub fn new(guard: UrlGuard, lookup: Arc<dyn HostLookup>) -> Self {
        Self { guard, lookup }
    }
}

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let guard = self.guard.clone();
        let lookup = self.lookup.clone();

        Box::pin(async move {
            let host = name.as_str();
            let ips = lookup
                .lookup(host)
                .await
                .map_err(|e| SecurityError::DnsResolution(format!("{host}: {e}")))?;

            let allowed = guard.allowed_addrs(host, ips).map_err(|e| {
                warn!(host = %host, error = %e, "Blocked connection");
                e
            })?;

            // Port 0 is replaced with the URL's port by the connector.
            let addrs: Addrs = Box::new(allowed.into_iter().map(|ip| SocketAddr::new(ip, 0)));
            Ok::<Addrs, BoxError>(addrs)
        })
    }
}
