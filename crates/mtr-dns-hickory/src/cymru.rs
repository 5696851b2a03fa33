//! Team Cymru IP-to-ASN lookups over DNS
//!
//! Two TXT queries per address:
//!
//! ```text
//! 8.8.8.8.origin.asn.cymru.com   "15169 | 8.8.8.0/24 | US | arin | 2023-12-28"
//! AS15169.asn.cymru.com          "15169 | US | arin | 2000-03-30 | GOOGLE, US"
//! ```
//!
//! and the answer is rendered as `"AS15169 GOOGLE, US"`. When the second
//! query fails the bare `"AS15169"` is still returned.

use crate::resolve_error;
use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use hickory_resolver::proto::rr::rdata::TXT;
use mtr_core::traits::OrgLookup;
use mtr_core::{Error, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use tracing::trace;

/// OrgLookup backed by the Team Cymru DNS zones
#[derive(Clone)]
pub struct CymruOrgLookup {
    resolver: TokioResolver,
}

impl CymruOrgLookup {
    pub fn new(resolver: TokioResolver) -> Self {
        Self { resolver }
    }

    /// First TXT answer for `name`, joined and unquoted
    async fn first_txt(&self, name: &str) -> Result<String> {
        let answers = self
            .resolver
            .txt_lookup(name)
            .await
            .map_err(|e| resolve_error("TXT lookup", name, e))?;
        answers
            .iter()
            .next()
            .map(txt_text)
            .ok_or_else(|| Error::Other(format!("Empty TXT answer for {}", name)))
    }
}

#[async_trait]
impl OrgLookup for CymruOrgLookup {
    async fn lookup(&self, ip: IpAddr) -> Result<String> {
        let origin = self.first_txt(&origin_query(ip)).await?;
        let asn = parse_origin(&origin)
            .ok_or_else(|| Error::Other(format!("Unparseable origin record {:?}", origin)))?;

        let name = match self.first_txt(&format!("AS{}.asn.cymru.com", asn)).await {
            Ok(record) => parse_as_name(&record),
            Err(e) => {
                trace!("AS{} name lookup failed: {}", asn, e);
                None
            }
        };

        Ok(match name {
            Some(name) => format!("AS{} {}", asn, name),
            None => format!("AS{}", asn),
        })
    }

    fn lookup_name(&self) -> &'static str {
        "cymru"
    }
}

fn txt_text(txt: &TXT) -> String {
    let joined: String = txt
        .txt_data()
        .iter()
        .filter_map(|bytes| std::str::from_utf8(bytes).ok())
        .collect();
    joined.trim_matches('"').to_string()
}

/// Query name for the origin zone of `ip`
fn origin_query(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => origin_query_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => origin_query_v4(v4),
            None => origin_query_v6(v6),
        },
    }
}

fn origin_query_v4(ip: Ipv4Addr) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{}.{}.{}.{}.origin.asn.cymru.com", d, c, b, a)
}

fn origin_query_v6(ip: Ipv6Addr) -> String {
    let nibbles: Vec<String> = ip
        .octets()
        .iter()
        .rev()
        .flat_map(|byte| [byte & 0xf, byte >> 4])
        .map(|nibble| format!("{:x}", nibble))
        .collect();
    format!("{}.origin6.asn.cymru.com", nibbles.join("."))
}

/// ASN from an origin record; the first one when several are announced
fn parse_origin(record: &str) -> Option<u32> {
    let first_field = record.split('|').next()?;
    first_field
        .split_whitespace()
        .next()?
        .trim_start_matches("AS")
        .parse()
        .ok()
}

/// AS name from an `AS<n>.asn.cymru.com` record (fifth field)
fn parse_as_name(record: &str) -> Option<String> {
    record
        .split('|')
        .nth(4)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| name.chars().filter(|c| !c.is_control()).collect())
}
