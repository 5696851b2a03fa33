//! Test doubles and common utilities for pipeline contract tests
//!
//! These doubles stand in for DNS, the probe binary and the organization
//! database. They record how they were called so tests can assert on side
//! effects (was the probe spawned, how many lookups ran at once, ...).

#![allow(dead_code)]

use mtr_core::error::{Error, Result};
use mtr_core::traits::{LocalAddresses, NameResolver, OrgLookup, ProbeRunner};
use mtr_core::{Cancel, ReportBuilder, ReportConfig};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Parse an address literal
pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// In-memory forward and reverse DNS tables
#[derive(Default)]
pub struct MockResolver {
    forward: HashMap<String, Vec<IpAddr>>,
    reverse: HashMap<IpAddr, Vec<String>>,
    /// Reverse lookups for these addresses sleep before answering
    slow: HashMap<IpAddr, Duration>,
    /// Every forward lookup fails with a resolver error
    forward_fails: bool,
    /// Call counter for lookup_ip()
    forward_calls: AtomicUsize,
    /// Call counter for reverse_lookup()
    reverse_calls: AtomicUsize,
    /// Reverse lookups currently running
    in_flight: AtomicUsize,
    /// Highest value `in_flight` ever reached
    max_in_flight: AtomicUsize,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer forward lookups of `host` with `addrs`
    pub fn with_host(mut self, host: &str, addrs: &[&str]) -> Self {
        self.forward
            .insert(host.to_string(), addrs.iter().map(|a| ip(a)).collect());
        self
    }

    /// Answer reverse lookups of `addr` with `names`
    pub fn with_ptr(mut self, addr: &str, names: &[&str]) -> Self {
        self.reverse
            .insert(ip(addr), names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Delay reverse lookups of `addr` by `delay`
    pub fn with_slow_ptr(mut self, addr: &str, delay: Duration) -> Self {
        self.slow.insert(ip(addr), delay);
        self
    }

    /// Make every forward lookup fail
    pub fn failing_forward(mut self) -> Self {
        self.forward_fails = true;
        self
    }

    /// Get the number of times lookup_ip() was called
    pub fn forward_calls(&self) -> usize {
        self.forward_calls.load(Ordering::SeqCst)
    }

    /// Get the number of times reverse_lookup() was called
    pub fn reverse_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst)
    }

    /// Get the highest number of concurrent reverse lookups observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NameResolver for MockResolver {
    async fn lookup_ip(&self, host: &str) -> Result<Vec<IpAddr>> {
        self.forward_calls.fetch_add(1, Ordering::SeqCst);
        if self.forward_fails {
            return Err(Error::Other("resolver unreachable".to_string()));
        }
        Ok(self.forward.get(host).cloned().unwrap_or_default())
    }

    async fn reverse_lookup(&self, ip: IpAddr) -> Result<Vec<String>> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Yield so concurrent lookups overlap even without a delay
        tokio::task::yield_now().await;
        if let Some(delay) = self.slow.get(&ip) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.reverse
            .get(&ip)
            .cloned()
            .ok_or_else(|| Error::Other(format!("no PTR for {}", ip)))
    }

    fn resolver_name(&self) -> &'static str {
        "mock"
    }
}

/// What the mock probe does when run
#[derive(Debug, Clone)]
pub enum ProbeBehavior {
    /// Exit zero with this stdout
    Output(String),
    /// Exit non-zero with this status and stderr
    Fail { status: String, stderr: String },
    /// Never exit on its own; only the cancel signal ends it
    Hang,
}

/// A ProbeRunner that records its arguments
pub struct MockProbeRunner {
    behavior: ProbeBehavior,
    /// Call counter for run()
    run_calls: AtomicUsize,
    /// Arguments of every run() call
    recorded_args: Mutex<Vec<Vec<String>>>,
}

impl MockProbeRunner {
    pub fn new(behavior: ProbeBehavior) -> Self {
        Self {
            behavior,
            run_calls: AtomicUsize::new(0),
            recorded_args: Mutex::new(Vec::new()),
        }
    }

    /// Runner that prints `raw` and exits zero
    pub fn output(raw: &str) -> Self {
        Self::new(ProbeBehavior::Output(raw.to_string()))
    }

    /// Get the number of times run() was called
    pub fn run_calls(&self) -> usize {
        self.run_calls.load(Ordering::SeqCst)
    }

    /// Get the arguments of the most recent run() call
    pub fn last_args(&self) -> Option<Vec<String>> {
        self.recorded_args.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl ProbeRunner for MockProbeRunner {
    async fn run(&self, args: &[String], cancel: Cancel) -> Result<String> {
        self.run_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded_args.lock().unwrap().push(args.to_vec());

        match &self.behavior {
            ProbeBehavior::Output(raw) => Ok(raw.clone()),
            ProbeBehavior::Fail { status, stderr } => {
                Err(Error::process(status.clone(), stderr.clone()))
            }
            ProbeBehavior::Hang => Err(Error::canceled(cancel.fired().await)),
        }
    }

    fn runner_name(&self) -> &'static str {
        "mock"
    }
}

/// Organization lookup backed by a fixed table; unknown addresses fail
#[derive(Default)]
pub struct MockOrgLookup {
    table: HashMap<IpAddr, String>,
    /// Call counter for lookup()
    calls: AtomicUsize,
}

impl MockOrgLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, addr: &str, org: &str) -> Self {
        self.table.insert(ip(addr), org.to_string());
        self
    }

    /// Get the number of times lookup() was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl OrgLookup for MockOrgLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.table
            .get(&ip)
            .cloned()
            .ok_or_else(|| Error::Other(format!("no origin for {}", ip)))
    }

    fn lookup_name(&self) -> &'static str {
        "mock"
    }
}

/// Local host with only private IPv4 and link-local IPv6
pub fn v4_only_host() -> Arc<dyn LocalAddresses> {
    Arc::new(vec![ip("192.168.1.10"), ip("fe80::1")])
}

/// Local host with a global IPv6 address
pub fn dual_stack_host() -> Arc<dyn LocalAddresses> {
    Arc::new(vec![ip("192.168.1.10"), ip("2001:db8:1::10")])
}

/// Helper to build a ReportBuilder from test doubles
pub fn builder(
    resolver: &Arc<MockResolver>,
    runner: &Arc<MockProbeRunner>,
    org: Option<&Arc<MockOrgLookup>>,
    config: ReportConfig,
) -> ReportBuilder {
    ReportBuilder::new(
        Arc::clone(resolver) as Arc<dyn NameResolver>,
        v4_only_host(),
        Arc::clone(runner) as Arc<dyn ProbeRunner>,
        org.map(|org| Arc::clone(org) as Arc<dyn OrgLookup>),
        config,
    )
    .expect("builder construction succeeds")
}
