//! Text rendering in the layout of `mtr --report`

use mtr_core::{Hop, Report};
use std::fmt::Write;
use std::time::Duration;

/// Width of the host column, including the leading `HOST: ` row label
const HOST_WIDTH: usize = 40;
const NAME_WIDTH: usize = 38;

/// Render `report` as an mtr-style table
pub fn text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "HOST: {:<HOST_WIDTH$}Loss%   Snt   Last   Avg  Best  Wrst StDev",
        report.target().raw()
    );
    for (idx, hop) in report.hops().iter().enumerate() {
        let stats = &hop.stats;
        let _ = writeln!(
            out,
            "{:>2}.|-- {:<NAME_WIDTH$} {:>3}.0%   {:>3}  {:>5.1} {:>5.1} {:>5.1} {:>5.1} {:>5.1}",
            idx + 1,
            row_name(hop),
            stats.loss,
            stats.sent,
            millis(stats.last),
            millis(stats.avg),
            millis(stats.best),
            millis(stats.worst),
            millis(stats.stddev),
        );
    }
    out
}

/// Hop label: org label (if any), then hostname or IP, else `???`
fn row_name(hop: &Hop) -> String {
    let name = hop.display_name().unwrap_or("???");
    let label = match hop.first_org_label() {
        Some(org) => format!("{} {}", org, name),
        None => name.to_string(),
    };
    label.chars().take(NAME_WIDTH).collect()
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
