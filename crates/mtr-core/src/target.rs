//! Target validation and resolution
//!
//! Turns a caller-supplied target string into one concrete address that is
//! safe to hand to the probe as its final argument.
//!
//! ## Resolution order
//!
//! 1. Trim surrounding spaces, `\n` and `\r`
//! 2. Reject empty strings, embedded spaces and a leading `-`
//! 3. A literal IP is used as-is (no DNS), whatever family was requested
//! 4. Otherwise resolve via [`NameResolver`] and pick by [`AddressFamily`]

use crate::error::{Error, Result};
use crate::traits::{LocalAddresses, NameResolver};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;
use tracing::debug;

/// Address family requested by the caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// Prefer IPv6 when the local host can reach it, else IPv4
    #[default]
    Auto,
    /// IPv4 only (`-4`)
    V4,
    /// IPv6 only (`-6`)
    V6,
}

impl AddressFamily {
    /// Probe flag pinning the family, if any
    pub fn probe_flag(self) -> Option<&'static str> {
        match self {
            AddressFamily::Auto => None,
            AddressFamily::V4 => Some("-4"),
            AddressFamily::V6 => Some("-6"),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::Auto => f.write_str("auto"),
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

impl FromStr for AddressFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "auto" => Ok(AddressFamily::Auto),
            "4" | "v4" | "ipv4" => Ok(AddressFamily::V4),
            "6" | "v6" | "ipv6" => Ok(AddressFamily::V6),
            other => Err(Error::config(format!(
                "Unknown address family '{}'. Valid: auto, 4, 6",
                other
            ))),
        }
    }
}

/// IP version of a resolved address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    V4,
    V6,
}

impl From<IpAddr> for IpVersion {
    fn from(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

/// A validated, resolved probe target
///
/// Constructed once per report, either by [`resolve_target`] or by
/// [`Target::literal`] for already-captured output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    raw: String,
    address: IpAddr,
    family: IpVersion,
    requested: AddressFamily,
}

impl Target {
    /// A target for a known address, with no family pinned
    pub fn literal(raw: impl Into<String>, address: IpAddr) -> Self {
        Self::new(raw, address, AddressFamily::Auto)
    }

    fn new(raw: impl Into<String>, address: IpAddr, requested: AddressFamily) -> Self {
        Self {
            raw: raw.into(),
            address,
            family: address.into(),
            requested,
        }
    }

    /// The target as the caller wrote it, after trimming
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The address the probe is pointed at
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// IP version of [`Target::address`]
    pub fn family(&self) -> IpVersion {
        self.family
    }

    /// Family the caller asked for
    pub fn requested(&self) -> AddressFamily {
        self.requested
    }
}

/// Trim and validate a raw target string
///
/// The result is later passed to the probe as a bare argument, so anything
/// that could be read as a flag or split into two arguments is rejected.
pub fn validate_target(raw: &str) -> Result<&str> {
    let trimmed = raw.trim_matches(|c| matches!(c, ' ' | '\n' | '\r'));
    if trimmed.is_empty() || trimmed.contains(' ') || trimmed.starts_with('-') {
        return Err(Error::invalid_target(trimmed));
    }
    Ok(trimmed)
}

/// Resolve `raw` to a single probe target
pub async fn resolve_target(
    raw: &str,
    family: AddressFamily,
    resolver: &dyn NameResolver,
    local: &dyn LocalAddresses,
) -> Result<Target> {
    let host = validate_target(raw)?;

    // The probe receives the requested family's flag and reports a mismatch
    if let Ok(address) = host.parse::<IpAddr>() {
        debug!("Target {} is a literal {:?} address", host, IpVersion::from(address));
        return Ok(Target::new(host, address, family));
    }

    let addrs = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| {
            debug!("Forward lookup of {} via {} failed: {}", host, resolver.resolver_name(), e);
            Error::host_not_found(host)
        })?;
    if addrs.is_empty() {
        return Err(Error::host_not_found(host));
    }
    debug!("Resolved {} to {} address(es)", host, addrs.len());

    let local_v6 = family == AddressFamily::Auto && has_global_ipv6(&local.addresses());
    let address = select_address(host, &addrs, family, local_v6)?;
    debug!("Selected {} for {} (requested family: {})", address, host, family);

    Ok(Target::new(host, address, family))
}

/// Pick one address out of a resolved set
///
/// `local_v6` says whether the local host has a global IPv6 address; it is
/// only consulted for [`AddressFamily::Auto`].
pub fn select_address(
    host: &str,
    addrs: &[IpAddr],
    family: AddressFamily,
    local_v6: bool,
) -> Result<IpAddr> {
    match family {
        AddressFamily::V4 => addrs
            .iter()
            .find_map(|ip| as_ipv4(*ip))
            .ok_or_else(|| Error::no_address_of_family(host, family)),
        AddressFamily::V6 => addrs
            .iter()
            .copied()
            .find(is_genuine_ipv6)
            .ok_or_else(|| Error::no_address_of_family(host, family)),
        AddressFamily::Auto => {
            let v6 = if local_v6 {
                addrs.iter().copied().find(|ip| match ip {
                    IpAddr::V6(v6) => is_global_ipv6(v6),
                    IpAddr::V4(_) => false,
                })
            } else {
                None
            };
            v6.or_else(|| addrs.iter().find_map(|ip| as_ipv4(*ip)))
                .ok_or_else(|| Error::no_address_found(host))
        }
    }
}

/// Whether any of `addrs` is a global-scope IPv6 address
pub fn has_global_ipv6(addrs: &[IpAddr]) -> bool {
    addrs.iter().any(|ip| match ip {
        IpAddr::V6(v6) => is_global_ipv6(v6),
        IpAddr::V4(_) => false,
    })
}

/// Not loopback, link-local (fe80::/10), unique-local (fc00::/7),
/// unspecified, multicast or IPv4-mapped
pub fn is_global_ipv6(ip: &Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || (first & 0xffc0) == 0xfe80
        || (first & 0xfe00) == 0xfc00
        || ip.to_ipv4_mapped().is_some())
}

fn is_genuine_ipv6(ip: &IpAddr) -> bool {
    matches!(ip, IpAddr::V6(v6) if v6.to_ipv4_mapped().is_none())
}

fn as_ipv4(ip: IpAddr) -> Option<IpAddr> {
    match ip {
        IpAddr::V4(_) => Some(ip),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4),
    }
}
