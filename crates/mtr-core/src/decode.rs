//! Decoder for the `mtr --raw` record stream
//!
//! The raw format is one record per line, fields separated by single
//! spaces:
//!
//! ```text
//! h 0 192.168.1.1      host (IP) seen at hop 0
//! p 0 1523             round-trip of 1523µs at hop 0
//! p 0 1523 17          same, with a trailing sequence token
//! d 0 gateway.lan      pre-resolved name (ignored)
//! ```
//!
//! Records arrive in probe order, not hop order, so the hop table is built
//! in two passes: collect every record while tracking the highest index,
//! then allocate the table and replay.
//!
//! Once the destination answers, mtr keeps reporting it at increasing
//! indices for the remaining rounds. Those trailing repeats are trimmed.

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::{debug, trace};

/// Highest hop index accepted; mtr caps TTL at 255
const MAX_HOP_INDEX: usize = 255;

/// One hop as decoded from the raw stream, before statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHop {
    /// Addresses reported at this position, in arrival order
    pub ips: Vec<String>,
    /// Round-trip samples, in arrival order
    pub samples: Vec<Duration>,
}

/// Output of [`decode`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Highest observed index + 1, before trimming
    pub hop_count: usize,
    /// Hops that survived the trailing-duplicate trim
    pub hops: Vec<RawHop>,
}

#[derive(Debug)]
enum Kind {
    Host,
    Ping,
    Other,
}

#[derive(Debug)]
struct Record<'a> {
    kind: Kind,
    idx: usize,
    value: &'a str,
    line: usize,
}

/// Decode one completed probe run
///
/// Lines that do not have the shape of a record are skipped. A `p` record
/// whose value is not an integer aborts the whole decode. Latencies are
/// unsigned, so a negative value such as `p 0 -5` aborts it too.
pub fn decode(raw: &str) -> Result<Decoded> {
    let mut records = Vec::new();
    let mut hop_count = 0;

    for (n, line) in raw.lines().enumerate() {
        let Some(record) = parse_line(line, n + 1) else {
            trace!("Skipping raw line {}: {:?}", n + 1, line);
            continue;
        };
        hop_count = hop_count.max(record.idx + 1);
        records.push(record);
    }

    let mut hops = vec![RawHop::default(); hop_count];
    for record in &records {
        let hop = &mut hops[record.idx];
        match record.kind {
            Kind::Host => hop.ips.push(record.value.to_string()),
            Kind::Ping => {
                let micros: u64 = record
                    .value
                    .parse()
                    .map_err(|_| Error::format(record.line, record.value))?;
                hop.samples.push(Duration::from_micros(micros));
            }
            Kind::Other => {}
        }
    }

    let kept = trailing_duplicate_cut(&hops);
    hops.truncate(kept);
    debug!(
        "Decoded {} record(s) into {} hop(s), kept {}",
        records.len(),
        hop_count,
        kept
    );

    Ok(Decoded { hop_count, hops })
}

fn parse_line(line: &str, number: usize) -> Option<Record<'_>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let tokens: Vec<&str> = line.split(' ').collect();
    let kind = match (tokens.len(), tokens[0]) {
        (3, "h") => Kind::Host,
        (3 | 4, "p") => Kind::Ping,
        (3, _) => Kind::Other,
        _ => return None,
    };
    let idx: usize = tokens[1].parse().ok()?;
    if idx > MAX_HOP_INDEX {
        return None;
    }

    Some(Record {
        kind,
        idx,
        value: tokens[2],
        line: number,
    })
}

/// Number of leading hops to keep
///
/// Walks forward remembering the first IP of the last kept hop; a hop
/// repeating it is not kept. Hops without any IP neither extend nor reset
/// the run, so they survive only if a later, distinct hop follows them.
fn trailing_duplicate_cut(hops: &[RawHop]) -> usize {
    let mut previous: Option<&str> = None;
    let mut keep = 0;

    for (idx, hop) in hops.iter().enumerate() {
        if let Some(first) = hop.ips.first()
            && previous != Some(first.as_str())
        {
            previous = Some(first.as_str());
            keep = idx + 1;
        }
    }

    keep
}
