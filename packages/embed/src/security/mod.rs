//! SSRF protection.

pub mod dns;
pub mod ssrf;

pub use dns::{GuardedResolver, HostLookup, SystemLookup};
pub use ssrf::UrlGuard;
