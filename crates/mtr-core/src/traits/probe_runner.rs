// # Probe Runner Trait
//
// Defines the interface for executing the external probe binary.
//
// ## Implementations
//
// - tokio::process: `mtr-probe-process` crate
//
// ## Usage
//
// ```rust,ignore
// use mtr_core::{Cancel, ProbeRunner};
//
// let args = mtr_core::probe::probe_args(&target, rounds);
// let stdout = runner.run(&args, Cancel::after(Duration::from_secs(60))).await?;
// ```

use crate::cancel::Cancel;
use async_trait::async_trait;

/// Trait for probe execution
///
/// # Contract
///
/// - Run the probe once with exactly the given arguments
/// - Exit status zero: return standard output as text
/// - Non-zero exit: return `Error::Process` carrying standard error verbatim
/// - `cancel` fires first: terminate the child and return
///   `Error::Canceled` with the signal's reason
///
/// Implementations must not retry and must not parse the output; decoding is
/// owned by `mtr_core::decode`.
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Execute the probe and capture its output
    async fn run(&self, args: &[String], cancel: Cancel) -> Result<String, crate::Error>;

    /// Get the runner name (for logging/debugging)
    fn runner_name(&self) -> &'static str;
}
