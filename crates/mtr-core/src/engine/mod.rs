//! Report pipeline
//!
//! The ReportBuilder is responsible for:
//! - Resolving the caller's target to one address
//! - Running the probe once, under a cancellation signal
//! - Decoding the raw output into hops
//! - Computing statistics and resolving identities per hop
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐    ┌─────────────┐    ┌──────────┐
//! │ NameResolver │───►│   Target    │───►│  Probe   │── raw text ──┐
//! │ LocalAddrs   │    │ resolution  │    │  Runner  │              │
//! └──────────────┘    └─────────────┘    └──────────┘              ▼
//!                                                            ┌──────────┐
//!                      ┌──────────────────────────────────── │  decode  │
//!                      │                                     └──────────┘
//!           ┌──────────┴─────────┐
//!           ▼                    ▼
//!    ┌─────────────┐     ┌──────────────┐
//!    │  statistics │     │   identity   │ (concurrent, timeout-bounded)
//!    └─────────────┘     └──────────────┘
//!           └──────────┬─────────┘
//!                      ▼
//!                 ┌─────────┐
//!                 │ Report  │
//!                 └─────────┘
//! ```
//!
//! Every step before identity resolution is fatal on error; no partial
//! report is ever returned.

use crate::cancel::Cancel;
use crate::config::ReportConfig;
use crate::decode;
use crate::error::Result;
use crate::identity::IdentityResolver;
use crate::probe;
use crate::report::{Hop, Report};
use crate::target::{self, AddressFamily, Target};
use crate::traits::{LocalAddresses, NameResolver, OrgLookup, ProbeRunner};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds one [`Report`] per call
///
/// Collaborators are shared behind `Arc` because identity lookups run as
/// spawned tasks that outlive a single borrow.
pub struct ReportBuilder {
    /// Forward and reverse DNS
    resolver: Arc<dyn NameResolver>,

    /// Local interface addresses, consulted for automatic family selection
    local_addrs: Arc<dyn LocalAddresses>,

    /// Executes the probe
    runner: Arc<dyn ProbeRunner>,

    /// Per-IP hostname and organization lookups
    identities: IdentityResolver,

    /// Probe rounds, also every hop's `sent`
    rounds: NonZeroU32,
}

impl ReportBuilder {
    /// Create a new report builder
    ///
    /// # Parameters
    ///
    /// - `resolver`: DNS implementation for target and hop names
    /// - `local_addrs`: local interface addresses
    /// - `runner`: probe execution
    /// - `org`: optional organization lookup; `None` leaves `org_labels` unset
    /// - `config`: validated before anything is stored
    pub fn new(
        resolver: Arc<dyn NameResolver>,
        local_addrs: Arc<dyn LocalAddresses>,
        runner: Arc<dyn ProbeRunner>,
        org: Option<Arc<dyn OrgLookup>>,
        config: ReportConfig,
    ) -> Result<Self> {
        config.validate()?;

        if let Some(org) = &org {
            debug!("Organization lookups via {}", org.lookup_name());
        }
        let identities = IdentityResolver::new(Arc::clone(&resolver), org, &config.identity);

        Ok(Self {
            resolver,
            local_addrs,
            runner,
            identities,
            rounds: config.probe.rounds(),
        })
    }

    /// Resolve `raw_target`, probe it and build the report
    ///
    /// # Returns
    ///
    /// - `Ok(Report)`: the probe completed and its output decoded
    /// - `Err(Error)`: the first fatal failure; the probe is never started
    ///   when target resolution fails
    pub async fn build(
        &self,
        raw_target: &str,
        family: AddressFamily,
        cancel: Cancel,
    ) -> Result<Report> {
        let target = target::resolve_target(
            raw_target,
            family,
            self.resolver.as_ref(),
            self.local_addrs.as_ref(),
        )
        .await?;
        info!("Target {} resolved to {}", target.raw(), target.address());

        let raw = probe::run_probe(self.runner.as_ref(), &target, self.rounds, cancel).await?;
        self.build_from_raw(target, &raw).await
    }

    /// Build a report from already-captured `mtr --raw` output
    pub async fn build_from_raw(&self, target: Target, raw: &str) -> Result<Report> {
        let decoded = decode::decode(raw)?;
        info!(
            "Decoded {} hop(s) for {} ({} before trimming)",
            decoded.hops.len(),
            target.raw(),
            decoded.hop_count
        );

        let identities = self.identities.resolve(&decoded.hops).await;
        let hops = decoded
            .hops
            .into_iter()
            .zip(identities)
            .map(|(raw, identity)| Hop::new(raw, identity, self.rounds))
            .collect();

        Ok(Report::new(target, hops))
    }

    /// Probe rounds per run
    pub fn rounds(&self) -> NonZeroU32 {
        self.rounds
    }
}
