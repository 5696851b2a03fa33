//! Finalized report types
//!
//! A [`Report`] is assembled once, after decode, statistics and identity
//! resolution, and is read-only from then on. It is the only value handed to
//! renderers and serializers.

use crate::decode::RawHop;
use crate::identity::HopIdentity;
use crate::stats::{self, HopStats};
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// One finalized hop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hop {
    /// Addresses reported at this position, in arrival order
    pub ips: Vec<String>,

    /// Reverse-DNS names, one per entry of `ips`, as the resolver returned
    /// them (`"dns.google."`); empty when unresolved
    pub hostnames: Vec<String>,

    /// Organization labels, one per entry of `ips`; absent when no
    /// organization lookup was configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_labels: Option<Vec<String>>,

    /// Raw round-trip samples, in arrival order
    #[serde(with = "samples_nanos")]
    pub samples: Vec<Duration>,

    #[serde(flatten)]
    pub stats: HopStats,
}

impl Hop {
    /// Finalize a decoded hop
    pub fn new(raw: RawHop, identity: HopIdentity, sent: NonZeroU32) -> Self {
        let stats = stats::summarize(&raw.samples, sent);
        Self {
            ips: raw.ips,
            hostnames: identity.hostnames,
            org_labels: identity.org_labels,
            samples: raw.samples,
            stats,
        }
    }

    /// Best display name: first hostname, else first IP
    pub fn display_name(&self) -> Option<&str> {
        self.hostnames
            .first()
            .filter(|name| !name.is_empty())
            .or_else(|| self.ips.first())
            .map(String::as_str)
    }

    /// Label of the first IP, if one was resolved
    pub fn first_org_label(&self) -> Option<&str> {
        self.org_labels
            .as_ref()
            .and_then(|labels| labels.first())
            .filter(|label| !label.is_empty())
            .map(String::as_str)
    }
}

/// Immutable per-hop report for one probe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    target: Target,
    hops: Vec<Hop>,
}

impl Report {
    /// Assemble a report; hops must already be in path order
    pub fn new(target: Target, hops: Vec<Hop>) -> Self {
        Self { target, hops }
    }

    /// The probed target
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Hops in path order
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Serialize as JSON
    pub fn to_json(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize as indented JSON
    pub fn to_json_pretty(&self) -> Result<String, crate::Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

mod samples_nanos {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(samples: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(
            samples
                .iter()
                .map(|s| u64::try_from(s.as_nanos()).unwrap_or(u64::MAX)),
        )
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = Vec::<u64>::deserialize(deserializer)?;
        Ok(nanos.into_iter().map(Duration::from_nanos).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hop(ips: &[&str], hostnames: &[&str]) -> Hop {
        let raw = RawHop {
            ips: ips.iter().map(|s| s.to_string()).collect(),
            samples: vec![Duration::from_micros(1500)],
        };
        let identity = HopIdentity {
            hostnames: hostnames.iter().map(|s| s.to_string()).collect(),
            org_labels: None,
        };
        Hop::new(raw, identity, NonZeroU32::new(10).unwrap())
    }

    #[test]
    fn display_name_prefers_hostname() {
        assert_eq!(hop(&["8.8.8.8"], &["dns.google"]).display_name(), Some("dns.google"));
        assert_eq!(hop(&["8.8.8.8"], &[""]).display_name(), Some("8.8.8.8"));
        assert_eq!(hop(&[], &[]).display_name(), None);
    }

    #[test]
    fn json_shape() {
        let target = Target::literal("8.8.8.8", "8.8.8.8".parse().unwrap());
        let report = Report::new(target, vec![hop(&["8.8.8.8"], &["dns.google"])]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        let first = &json["hops"][0];
        assert_eq!(first["ips"][0], "8.8.8.8");
        assert_eq!(first["hostnames"][0], "dns.google");
        assert_eq!(first["sent"], 10);
        assert_eq!(first["received"], 1);
        assert_eq!(first["loss"], 90);
        assert_eq!(first["avg"], 1_500_000);
        assert_eq!(first["samples"][0], 1_500_000);
        assert!(first.get("org_labels").is_none());
        assert_eq!(json["target"]["address"], "8.8.8.8");
    }

    #[test]
    fn json_round_trip_preserves_report() {
        let target = Target::literal("8.8.8.8", "8.8.8.8".parse().unwrap());
        let report = Report::new(target, vec![hop(&["10.0.0.1"], &[""])]);
        let back: Report = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, report);
    }
}
