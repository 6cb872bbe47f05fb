//! URL guard for SSRF protection.

use std::net::IpAddr;
use url::{Host, Url};

use crate::error::{SecurityError, SecurityResult};

/// Decides whether a URL is safe to fetch.
///
/// Rejects:
/// - Non-HTTP(S) schemes (file://, ftp://)
/// - `localhost`
/// - IPv4 and IPv6 literals, whatever range they fall in
/// - Unparseable URLs (fail closed)
///
/// [`UrlGuard::allowed_addrs`] filters resolved addresses, rejecting private,
/// loopback and link-local space. It runs at connect time inside
/// [`crate::security::GuardedResolver`], so every hop is covered.
///
/// The operator's own site is always allowed, so the site can embed its own
/// content even when it is served from `localhost` or an IP.
#[derive(Debug, Clone)]
pub struct UrlGuard {
    /// Host and effective port of the operator's site
    site_authority: Option<(String, u16)>,

    /// Ranges rejected after DNS resolution
    blocked_cidrs: Vec<ipnet::IpNet>,
}

impl Default for UrlGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlGuard {
    /// Create a guard with default rules and no site exception.
    pub fn new() -> Self {
        Self {
            site_authority: None,
            blocked_cidrs: [
                "0.0.0.0/8",
                "10.0.0.0/8",
                "100.64.0.0/10", // Carrier-grade NAT
                "127.0.0.0/8",
                "169.254.0.0/16", // Link-local / cloud metadata
                "172.16.0.0/12",
                "192.168.0.0/16",
                "::/128",
                "::1/128",
                "fc00::/7",  // IPv6 private
                "fe80::/10", // IPv6 link-local
            ]
            .into_iter()
            .filter_map(|cidr| cidr.parse().ok())
            .collect(),
        }
    }

    /// Allow the operator's own site through every rule.
    pub fn with_site_url(mut self, site_url: &Url) -> Self {
        self.site_authority = authority(site_url);
        self
    }

    /// Block an additional CIDR range after DNS resolution.
    pub fn block_cidr(mut self, cidr: ipnet::IpNet) -> Self {
        self.blocked_cidrs.push(cidr);
        self
    }

    /// True if the URL must not be fetched.
    pub fn is_unsafe(&self, raw_url: &str) -> bool {
        self.check(raw_url).is_err()
    }

    /// Validate a raw URL against the literal rules.
    pub fn check(&self, raw_url: &str) -> SecurityResult<()> {
        let parsed = Url::parse(raw_url)?;
        self.check_url(&parsed)
    }

    /// Validate an already-parsed URL against the literal rules.
    pub fn check_url(&self, url: &Url) -> SecurityResult<()> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SecurityError::DisallowedScheme(url.scheme().to_string()));
        }

        let host = url.host().ok_or(SecurityError::NoHost)?;

        if self.is_site_host(url) {
            return Ok(());
        }

        match host {
            Host::Domain(domain) => {
                if domain.trim_end_matches('.').eq_ignore_ascii_case("localhost") {
                    return Err(SecurityError::BlockedHost(domain.to_string()));
                }
                Ok(())
            }
            Host::Ipv4(ip) => Err(SecurityError::BlockedHost(ip.to_string())),
            Host::Ipv6(ip) => Err(SecurityError::BlockedHost(format!("[{ip}]"))),
        }
    }

    /// Filter the addresses a host name resolved to.
    ///
    /// Blocked addresses are dropped; an error is returned when none remain.
    /// The operator's own host keeps every address. The connect-time
    /// resolver only sees the host name, so the exception is keyed on the
    /// name there.
    pub fn allowed_addrs(
        &self,
        host: &str,
        addrs: impl IntoIterator<Item = IpAddr>,
    ) -> SecurityResult<Vec<IpAddr>> {
        let addrs: Vec<IpAddr> = addrs.into_iter().collect();
        if addrs.is_empty() {
            return Err(SecurityError::DnsResolution(format!("no addresses for {host}")));
        }
        if self.is_site_host_name(host) {
            return Ok(addrs);
        }

        let (allowed, blocked): (Vec<IpAddr>, Vec<IpAddr>) = addrs
            .into_iter()
            .partition(|ip| self.blocked_range(*ip).is_none());

        if allowed.is_empty() {
            let ip = blocked[0];
            let cidr = self
                .blocked_range(ip)
                .map(ToString::to_string)
                .unwrap_or_default();
            return Err(SecurityError::BlockedCidr(format!(
                "DNS for {host} resolved to blocked IP {ip} ({cidr})"
            )));
        }

        Ok(allowed)
    }

    fn is_site_host_name(&self, host: &str) -> bool {
        self.site_authority
            .as_ref()
            .is_some_and(|(site, _)| site.eq_ignore_ascii_case(host.trim_end_matches('.')))
    }

    fn is_site_host(&self, url: &Url) -> bool {
        match (&self.site_authority, authority(url)) {
            (Some(site), Some(candidate)) => *site == candidate,
            _ => false,
        }
    }

    fn blocked_range(&self, ip: IpAddr) -> Option<&ipnet::IpNet> {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        self.blocked_cidrs.iter().find(|cidr| cidr.contains(&ip))
    }
}

fn authority(url: &Url) -> Option<(String, u16)> {
    let host = url.host_str()?.to_ascii_lowercase();
    let port = url.port_or_known_default()?;
    Some((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_blocks_localhost() {
        let guard = UrlGuard::new();
        assert!(guard.is_unsafe("http://localhost/"));
        assert!(guard.is_unsafe("http://LOCALHOST:8080/admin"));
        assert!(guard.is_unsafe("http://127.0.0.1/"));
        assert!(guard.is_unsafe("http://[::1]/"));
    }

    #[test]
    fn test_blocks_ip_literals() {
        let guard = UrlGuard::new();
        assert!(guard.is_unsafe("http://10.0.0.1/"));
        assert!(guard.is_unsafe("http://192.168.1.1/"));
        assert!(guard.is_unsafe("http://169.254.169.254/latest/meta-data"));
        // Public addresses are rejected too: literals are never embedded.
        assert!(guard.is_unsafe("http://8.8.8.8/"));
        assert!(guard.is_unsafe("http://[2001:db8::1]/"));
        // Decimal-encoded loopback normalizes to an IPv4 host.
        assert!(guard.is_unsafe("http://2130706433/"));
    }

    #[test]
    fn test_blocks_non_http_and_malformed() {
        let guard = UrlGuard::new();
        assert!(guard.is_unsafe("file:///etc/passwd"));
        assert!(guard.is_unsafe("ftp://example.com/"));
        assert!(guard.is_unsafe("not a url"));
        assert!(guard.is_unsafe(""));
        assert!(matches!(
            guard.check("gopher://example.com"),
            Err(SecurityError::DisallowedScheme(_))
        ));
    }

    #[test]
    fn test_allows_public_urls() {
        let guard = UrlGuard::new();
        assert!(!guard.is_unsafe("https://example.com/"));
        assert!(!guard.is_unsafe("http://www.youtube.com/watch?v=abc"));
    }

    #[test]
    fn test_site_host_exception() {
        let site = Url::parse("http://localhost:2368/").unwrap();
        let guard = UrlGuard::new().with_site_url(&site);

        assert!(!guard.is_unsafe("http://localhost:2368/my-post/"));
        // Same hostname on another port is a different host.
        assert!(guard.is_unsafe("http://localhost:8080/"));
        assert!(guard.is_unsafe("http://127.0.0.1:2368/"));
    }

    #[test]
    fn test_site_host_exception_for_ip_site() {
        let site = Url::parse("http://127.0.0.1:4000").unwrap();
        let guard = UrlGuard::new().with_site_url(&site);
        assert!(!guard.is_unsafe("http://127.0.0.1:4000/page"));
    }

    fn ips(list: &[&str]) -> Vec<IpAddr> {
        list.iter().map(|ip| ip.parse().unwrap()).collect()
    }

    #[test]
    fn test_allowed_addrs_drops_blocked_ranges() {
        let guard = UrlGuard::new();
        let allowed = guard
            .allowed_addrs("mixed.example.com", ips(&["10.0.0.7", "93.184.216.34"]))
            .unwrap();
        assert_eq!(allowed, ips(&["93.184.216.34"]));

        let err = guard
            .allowed_addrs("internal.example.com", ips(&["127.0.0.1", "::1"]))
            .unwrap_err();
        assert!(matches!(err, SecurityError::BlockedCidr(_)));

        assert!(matches!(
            guard.allowed_addrs("empty.example.com", Vec::new()),
            Err(SecurityError::DnsResolution(_))
        ));
    }

    #[test]
    fn test_allowed_addrs_keeps_site_host() {
        let site = Url::parse("http://localhost:2368/").unwrap();
        let guard = UrlGuard::new().with_site_url(&site);
        let allowed = guard.allowed_addrs("LOCALHOST", ips(&["127.0.0.1"])).unwrap();
        assert_eq!(allowed, ips(&["127.0.0.1"]));
        assert!(guard.allowed_addrs("other.local", ips(&["127.0.0.1"])).is_err());
    }

    #[test]
    fn test_blocked_range_sees_mapped_ipv4() {
        let guard = UrlGuard::new();
        let mapped: IpAddr = "::ffff:10.1.2.3".parse().unwrap();
        assert!(guard.blocked_range(mapped).is_some());
        let public: IpAddr = "93.184.216.34".parse().unwrap();
        assert!(guard.blocked_range(public).is_none());
    }

    proptest! {
        #[test]
        fn prop_every_ipv4_literal_is_unsafe(a: u8, b: u8, c: u8, d: u8, port in 1u16..) {
            let guard = UrlGuard::new();
            let url = format!("http://{a}.{b}.{c}.{d}:{port}/");
            prop_assert!(guard.is_unsafe(&url));
        }
    }
}
