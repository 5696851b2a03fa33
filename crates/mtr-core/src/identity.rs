//! Per-hop identity resolution
//!
//! Every IP of every hop gets its own reverse-DNS lookup and, when an
//! [`OrgLookup`] is configured, its own organization lookup. Each lookup
//! waits for a semaphore permit, is spawned as a task, and only then is
//! raced against the lookup timeout:
//!
//! ```text
//!   (hop, ip) ──► permit ──spawn──► lookup task ─► resolver
//!                   │                    │
//!                   └─ timeout(handle) ──┴─► value or ""
//! ```
//!
//! Time spent queued for a permit never counts against a lookup. A lookup
//! that loses the race is detached, not aborted; its permit is released
//! when the race ends, it finishes in the background, and its result is
//! dropped. Failures of any kind end as an empty string and are never
//! reported as errors.

use crate::config::IdentityConfig;
use crate::decode::RawHop;
use crate::traits::{NameResolver, OrgLookup};
use std::future::Future;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, trace};

/// Identity fields for one hop, index-aligned with its `ips`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HopIdentity {
    pub hostnames: Vec<String>,
    pub org_labels: Option<Vec<String>>,
}

impl HopIdentity {
    /// All-empty identity for `ip_count` addresses
    pub fn unresolved(ip_count: usize, with_org: bool) -> Self {
        Self {
            hostnames: vec![String::new(); ip_count],
            org_labels: with_org.then(|| vec![String::new(); ip_count]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Hostname,
    OrgLabel,
}

/// Concurrent, timeout-bounded hostname and organization resolver
pub struct IdentityResolver {
    resolver: Arc<dyn NameResolver>,
    org: Option<Arc<dyn OrgLookup>>,
    reverse_dns: bool,
    timeout: Duration,
    permits: Arc<Semaphore>,
}

impl IdentityResolver {
    /// Create a resolver with the given collaborators and limits
    pub fn new(
        resolver: Arc<dyn NameResolver>,
        org: Option<Arc<dyn OrgLookup>>,
        config: &IdentityConfig,
    ) -> Self {
        Self {
            resolver,
            org,
            reverse_dns: config.reverse_dns,
            timeout: config.lookup_timeout(),
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
        }
    }

    /// Resolve identities for `hops`, returning one entry per hop
    pub async fn resolve(&self, hops: &[RawHop]) -> Vec<HopIdentity> {
        let mut identities: Vec<HopIdentity> = hops
            .iter()
            .map(|hop| HopIdentity::unresolved(hop.ips.len(), self.org.is_some()))
            .collect();

        let mut tasks = JoinSet::new();
        for (h, hop) in hops.iter().enumerate() {
            for (i, ip) in hop.ips.iter().enumerate() {
                let Ok(addr) = ip.parse::<IpAddr>() else {
                    trace!("Hop {} reports non-IP {:?}, leaving identity empty", h, ip);
                    continue;
                };

                if self.reverse_dns {
                    let resolver = Arc::clone(&self.resolver);
                    let lookup = self.race(async move {
                        first_hostname(resolver.reverse_lookup(addr).await.ok())
                    });
                    tasks.spawn(async move { (h, i, Field::Hostname, lookup.await) });
                }

                if let Some(org) = &self.org {
                    let org = Arc::clone(org);
                    let lookup =
                        self.race(async move { org_label(org.lookup(addr).await.ok()) });
                    tasks.spawn(async move { (h, i, Field::OrgLabel, lookup.await) });
                }
            }
        }

        let mut resolved = 0usize;
        let mut attempted = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let Ok((h, i, field, value)) = joined else {
                continue;
            };
            attempted += 1;
            if !value.is_empty() {
                resolved += 1;
            }
            match field {
                Field::Hostname => identities[h].hostnames[i] = value,
                Field::OrgLabel => {
                    if let Some(labels) = identities[h].org_labels.as_mut() {
                        labels[i] = value;
                    }
                }
            }
        }
        debug!("Identity lookups: {} of {} answered", resolved, attempted);

        identities
    }

    /// Wait for a permit, then run `lookup` as a detached task and wait for
    /// it at most `timeout`
    fn race<F>(&self, lookup: F) -> impl Future<Output = String> + Send + 'static
    where
        F: Future<Output = String> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let timeout = self.timeout;
        async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return String::new();
            };
            let handle = tokio::spawn(lookup);
            match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(value)) => value,
                _ => String::new(),
            }
        }
    }
}

/// First reverse name, exactly as the resolver returned it
fn first_hostname(names: Option<Vec<String>>) -> String {
    names
        .and_then(|names| names.into_iter().next())
        .unwrap_or_default()
}

/// Leading token of an organization string (`"AS15169 Google"` → `"AS15169"`)
fn org_label(org: Option<String>) -> String {
    org.as_deref()
        .and_then(|org| org.split(' ').next())
        .unwrap_or_default()
        .to_string()
}
