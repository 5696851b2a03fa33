// # hickory DNS
//
// This crate provides the DNS-backed collaborators for mtr-core:
//
// - **HickoryResolver**: `NameResolver` for target resolution (A/AAAA) and
//   hop names (PTR)
// - **CymruOrgLookup**: `OrgLookup` answering `"AS<n> <name>"` from the
//   Team Cymru IP-to-ASN DNS zones
//
// Both share one `TokioResolver`, built from the system configuration and
// falling back to public resolvers when none can be read.
//
// Neither type retries or caches. Timeouts around reverse and organization
// lookups are owned by mtr-core's identity resolution.

mod cymru;

pub use cymru::CymruOrgLookup;

use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::{ResolveError, Resolver, TokioResolver};
use mtr_core::traits::NameResolver;
use mtr_core::{Error, Result};
use std::net::IpAddr;
use tracing::{debug, warn};

/// NameResolver backed by hickory-resolver
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: TokioResolver,
}

impl HickoryResolver {
    /// Create a resolver from the system DNS configuration
    ///
    /// Falls back to Google public DNS when the system configuration cannot
    /// be read (e.g. no `/etc/resolv.conf` in a minimal container).
    pub fn from_system_conf() -> Self {
        let resolver = match Resolver::builder_tokio() {
            Ok(builder) => builder.build(),
            Err(e) => {
                warn!("System DNS config unavailable ({}), using Google DNS", e);
                Resolver::builder_with_config(
                    ResolverConfig::google(),
                    TokioConnectionProvider::default(),
                )
                .build()
            }
        };
        Self { resolver }
    }

    /// Wrap an already-configured resolver
    pub fn with_resolver(resolver: TokioResolver) -> Self {
        Self { resolver }
    }

    /// Organization lookup sharing this resolver
    pub fn cymru(&self) -> CymruOrgLookup {
        CymruOrgLookup::new(self.resolver.clone())
    }
}

#[async_trait]
impl NameResolver for HickoryResolver {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(e) if e.is_no_records_found() => {
                debug!("No A/AAAA records for {}", host);
                Ok(Vec::new())
            }
            Err(e) => Err(resolve_error("forward lookup", host, e)),
        }
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<Vec<String>> {
        match self.resolver.reverse_lookup(ip).await {
            Ok(names) => Ok(names.iter().map(|name| name.to_string()).collect()),
            Err(e) if e.is_no_records_found() => Ok(Vec::new()),
            Err(e) => Err(resolve_error("reverse lookup", &ip.to_string(), e)),
        }
    }

    fn resolver_name(&self) -> &'static str {
        "hickory"
    }
}

pub(crate) fn resolve_error(what: &str, subject: &str, e: ResolveError) -> Error {
    Error::Other(format!("DNS {} of {} failed: {}", what, subject, e))
}
