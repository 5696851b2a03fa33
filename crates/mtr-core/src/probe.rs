//! Probe invocation contract
//!
//! Builds the argument list handed to the [`ProbeRunner`]:
//!
//! ```text
//! --raw -n -c <rounds> [-4|-6] <address>
//! ```
//!
//! `-n` keeps mtr from resolving names itself; identity resolution happens
//! afterwards under our own timeouts. The address is always a literal IP
//! produced by target resolution, never the caller's raw string.

use crate::cancel::Cancel;
use crate::error::Result;
use crate::target::Target;
use crate::traits::ProbeRunner;
use std::num::NonZeroU32;
use tracing::{debug, info};

/// Arguments for one probe run against `target`
pub fn probe_args(target: &Target, rounds: NonZeroU32) -> Vec<String> {
    let mut args = vec![
        "--raw".to_string(),
        "-n".to_string(),
        "-c".to_string(),
        rounds.to_string(),
    ];
    if let Some(flag) = target.requested().probe_flag() {
        args.push(flag.to_string());
    }
    args.push(target.address().to_string());
    args
}

/// Run the probe once and return its raw output
pub async fn run_probe(
    runner: &dyn ProbeRunner,
    target: &Target,
    rounds: NonZeroU32,
    cancel: Cancel,
) -> Result<String> {
    let args = probe_args(target, rounds);
    info!(
        "Probing {} ({}) with {} round(s) via {}",
        target.raw(),
        target.address(),
        rounds,
        runner.runner_name()
    );
    debug!("Probe arguments: {:?}", args);

    let output = runner.run(&args, cancel).await?;
    debug!("Probe finished with {} byte(s) of output", output.len());
    Ok(output)
}
