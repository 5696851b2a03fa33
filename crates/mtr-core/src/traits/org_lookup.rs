// # Organization Lookup Trait
//
// Optional collaborator mapping an address to its network owner.
//
// Returned strings follow the ASN database convention of a leading AS
// token followed by a free-form name, e.g. `"AS15169 Google LLC"`. Identity
// resolution keeps only the leading token.
//
// ## Implementations
//
// - Team Cymru over DNS: `mtr-dns-hickory` crate

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for organization/ASN lookups
///
/// Absence of an implementation is a valid configuration; labels are then
/// omitted from the report entirely.
#[async_trait]
pub trait OrgLookup: Send + Sync {
    /// Look up the owner of `ip`
    async fn lookup(&self, ip: IpAddr) -> Result<String, crate::Error>;

    /// Get the lookup name (for logging/debugging)
    fn lookup_name(&self) -> &'static str;
}
