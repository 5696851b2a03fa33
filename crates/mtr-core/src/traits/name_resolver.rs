// # Name Resolver Trait
//
// Defines the interface for forward and reverse DNS lookups.
//
// ## Implementations
//
// - hickory-resolver: `mtr-dns-hickory` crate
// - Tests: in-memory tables in `tests/common`
//
// ## Usage
//
// ```rust,ignore
// use mtr_core::NameResolver;
//
// let addrs = resolver.lookup_ip("example.com").await?;
// let names = resolver.reverse_lookup("8.8.8.8".parse()?).await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for DNS resolver implementations
///
/// # Error semantics
///
/// Forward lookups feed target resolution, where an empty result and an error
/// both end as `HostNotFound`. Implementations should map "no such name"
/// answers to `Ok(vec![])` and reserve `Err` for resolver failures.
///
/// Reverse lookups feed identity resolution, which treats any error or empty
/// answer as "no hostname". Implementations must not retry; the caller bounds
/// every reverse lookup with its own timeout.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve a host name to all of its addresses, in resolver order
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>, crate::Error>;

    /// Resolve an address back to its host names, in resolver order
    ///
    /// Names are returned as the resolver presents them, including any
    /// trailing root dot.
    async fn reverse_lookup(&self, ip: IpAddr) -> Result<Vec<String>, crate::Error>;

    /// Get the resolver name (for logging/debugging)
    fn resolver_name(&self) -> &'static str;
}
