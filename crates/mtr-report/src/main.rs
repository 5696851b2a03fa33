// # mtr-report
//
// Thin command-line front end over mtr-core.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the hickory, pnet and process collaborators into a ReportBuilder
// 4. Printing the report as an mtr-style table or as JSON
//
// All decoding, statistics and resolution logic lives in mtr-core.
//
// ## Configuration
//
// ### Target
// - `MTR_TARGET`: Host name or IP to probe (required unless `MTR_RAW_INPUT`)
// - `MTR_FAMILY`: Address family (auto, 4, 6)
//
// ### Probe
// - `MTR_BINARY`: Probe binary (default: mtr)
// - `MTR_ROUNDS`: Probe rounds, 1..=1000 (default: 10)
// - `MTR_DEADLINE_SECS`: Cancel the probe after this many seconds, 1..=3600
// - `MTR_RAW_INPUT`: Read captured `mtr --raw` output from a file, or `-`
//   for stdin, instead of running the probe
//
// ### Identity
// - `MTR_REVERSE_DNS`: Resolve hop names (default: true)
// - `MTR_LOOKUP_TIMEOUT_MS`: Per-lookup timeout (default: 1000)
// - `MTR_MAX_IN_FLIGHT`: Concurrent lookup cap (default: 32)
// - `MTR_ORG_LOOKUP`: Organization lookup (none, cymru)
//
// ### Output
// - `MTR_OUTPUT`: text or json (default: text)
// - `MTR_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// MTR_TARGET=example.com MTR_ROUNDS=5 MTR_ORG_LOOKUP=cymru mtr-report
// mtr --raw -n -c 10 8.8.8.8 | MTR_RAW_INPUT=- MTR_TARGET=8.8.8.8 mtr-report
// ```

mod render;

use anyhow::{Context, Result};
use mtr_core::traits::{LocalAddresses, NameResolver, OrgLookup, ProbeRunner};
use mtr_core::{AddressFamily, Cancel, Report, ReportBuilder, ReportConfig, Target};
use mtr_dns_hickory::HickoryResolver;
use mtr_probe_process::ProcessProbeRunner;
use std::env;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Report printed
/// - 1: Configuration or startup error
/// - 2: Runtime error (resolution, probe, decode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MtrExitCode {
    /// Report printed
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<MtrExitCode> for ExitCode {
    fn from(code: MtrExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Output {
    Text,
    Json,
}

/// Organization lookup backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OrgBackend {
    None,
    Cymru,
}

/// Application configuration
#[derive(Debug)]
struct Config {
    target: Option<String>,
    family: AddressFamily,
    rounds: u32,
    binary: String,
    deadline_secs: Option<u64>,
    reverse_dns: bool,
    lookup_timeout_ms: u64,
    max_in_flight: usize,
    org_lookup: OrgBackend,
    output: Output,
    raw_input: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value source
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            target: non_empty("MTR_TARGET"),
            family: non_empty("MTR_FAMILY")
                .map(|s| s.parse::<AddressFamily>())
                .transpose()
                .context("MTR_FAMILY")?
                .unwrap_or_default(),
            rounds: parse_number(non_empty("MTR_ROUNDS"), "MTR_ROUNDS")?.unwrap_or(10),
            binary: non_empty("MTR_BINARY").unwrap_or_else(|| "mtr".to_string()),
            deadline_secs: parse_number(non_empty("MTR_DEADLINE_SECS"), "MTR_DEADLINE_SECS")?,
            reverse_dns: match non_empty("MTR_REVERSE_DNS") {
                Some(v) => parse_bool(&v).context("MTR_REVERSE_DNS")?,
                None => true,
            },
            lookup_timeout_ms: parse_number(
                non_empty("MTR_LOOKUP_TIMEOUT_MS"),
                "MTR_LOOKUP_TIMEOUT_MS",
            )?
            .unwrap_or(1000),
            max_in_flight: parse_number(non_empty("MTR_MAX_IN_FLIGHT"), "MTR_MAX_IN_FLIGHT")?
                .unwrap_or(32),
            org_lookup: match non_empty("MTR_ORG_LOOKUP").as_deref().map(str::to_lowercase) {
                None => OrgBackend::None,
                Some(v) if v == "none" => OrgBackend::None,
                Some(v) if v == "cymru" => OrgBackend::Cymru,
                Some(v) => anyhow::bail!(
                    "MTR_ORG_LOOKUP '{}' is not supported. Supported: none, cymru",
                    v
                ),
            },
            output: match non_empty("MTR_OUTPUT").as_deref().map(str::to_lowercase) {
                None => Output::Text,
                Some(v) if v == "text" => Output::Text,
                Some(v) if v == "json" => Output::Json,
                Some(v) => anyhow::bail!(
                    "MTR_OUTPUT '{}' is not supported. Supported: text, json",
                    v
                ),
            },
            raw_input: non_empty("MTR_RAW_INPUT"),
            log_level: non_empty("MTR_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.target.is_none() && self.raw_input.is_none() {
            anyhow::bail!(
                "MTR_TARGET is required. \
                Set it via: export MTR_TARGET=example.com"
            );
        }

        if !(1..=1000).contains(&self.rounds) {
            anyhow::bail!("MTR_ROUNDS must be between 1 and 1000. Got: {}", self.rounds);
        }

        if let Some(deadline) = self.deadline_secs
            && !(1..=3600).contains(&deadline)
        {
            anyhow::bail!(
                "MTR_DEADLINE_SECS must be between 1 and 3600 seconds. Got: {}",
                deadline
            );
        }

        if self.lookup_timeout_ms == 0 {
            anyhow::bail!("MTR_LOOKUP_TIMEOUT_MS must be greater than 0");
        }

        if self.max_in_flight == 0 {
            anyhow::bail!("MTR_MAX_IN_FLIGHT must be greater than 0");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "MTR_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.report_config().validate()?;
        Ok(())
    }

    /// Core configuration derived from the environment
    fn report_config(&self) -> ReportConfig {
        let mut config = ReportConfig::default();
        config.probe = config
            .probe
            .with_binary(self.binary.clone())
            .with_rounds(self.rounds);
        config.identity.reverse_dns = self.reverse_dns;
        config.identity.lookup_timeout_ms = self.lookup_timeout_ms;
        config.identity.max_in_flight = self.max_in_flight;
        config
    }

    fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| anyhow::anyhow!("{} must be a number. Got: {}", key, v))
        })
        .transpose()
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected true or false, got '{}'", other),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MtrExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return MtrExitCode::ConfigError.into();
    }

    // Initialize tracing (stderr, so stdout carries only the report)
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MtrExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MtrExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run(&config).await {
            Ok(rendered) => {
                print!("{}", rendered);
                MtrExitCode::Success
            }
            Err(e) => {
                error!("{:#}", e);
                MtrExitCode::RuntimeError
            }
        }
    });

    code.into()
}

/// Build one report and render it
async fn run(config: &Config) -> Result<String> {
    let dns = HickoryResolver::from_system_conf();
    let org: Option<Arc<dyn OrgLookup>> = match config.org_lookup {
        OrgBackend::Cymru => Some(Arc::new(dns.cymru())),
        OrgBackend::None => None,
    };
    let resolver: Arc<dyn NameResolver> = Arc::new(dns);
    let local = local_addresses();
    let runner: Arc<dyn ProbeRunner> = Arc::new(ProcessProbeRunner::new(config.binary.clone()));

    let builder = ReportBuilder::new(
        Arc::clone(&resolver),
        Arc::clone(&local),
        runner,
        org,
        config.report_config(),
    )?;

    let report = match &config.raw_input {
        Some(source) => {
            let raw = read_raw(source).await?;
            let target = offline_target(config, &raw, resolver.as_ref(), local.as_ref()).await?;
            info!("Building report from captured output for {}", target.raw());
            builder.build_from_raw(target, &raw).await?
        }
        None => {
            let raw_target = config.target.as_deref().unwrap_or_default();
            let cancel = cancel_signal(config.deadline())?;
            builder.build(raw_target, config.family, cancel).await?
        }
    };

    format_report(&report, config.output)
}

fn format_report(report: &Report, output: Output) -> Result<String> {
    Ok(match output {
        Output::Text => render::text(report),
        Output::Json => report.to_json_pretty()? + "\n",
    })
}

#[cfg(feature = "pnet")]
fn local_addresses() -> Arc<dyn LocalAddresses> {
    Arc::new(mtr_ifaces_pnet::PnetInterfaces::new())
}

#[cfg(not(feature = "pnet"))]
fn local_addresses() -> Arc<dyn LocalAddresses> {
    debug!("Interface enumeration disabled, automatic family selection is IPv4-only");
    Arc::new(Vec::<IpAddr>::new())
}

/// Read captured probe output from a file, or stdin for `-`
async fn read_raw(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("Failed to read raw output from stdin")?;
        Ok(raw)
    } else {
        tokio::fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read raw output from {}", source))
    }
}

/// Target for captured output
///
/// Uses `MTR_TARGET` when set (resolved like a live target), otherwise the
/// first address of the last hop in the capture.
async fn offline_target(
    config: &Config,
    raw: &str,
    resolver: &dyn NameResolver,
    local: &dyn LocalAddresses,
) -> Result<Target> {
    if let Some(target) = &config.target {
        return Ok(mtr_core::target::resolve_target(target, config.family, resolver, local).await?);
    }

    let destination = mtr_core::decode::decode(raw)
        .ok()
        .and_then(|decoded| decoded.hops.last()?.ips.first()?.parse::<IpAddr>().ok());
    let address = destination.unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    debug!("No MTR_TARGET set, labelling capture as {}", address);
    Ok(Target::literal(address.to_string(), address))
}

/// Cancel on SIGINT/SIGTERM, or once `deadline` has elapsed
fn cancel_signal(deadline: Option<Duration>) -> Result<Cancel> {
    let shutdown = shutdown_signal()?;
    Ok(Cancel::from_future(async move {
        match deadline {
            Some(deadline) => tokio::select! {
                name = shutdown => name,
                reason = Cancel::after(deadline).fired() => reason,
            },
            None => shutdown.await,
        }
    }))
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// Handlers are installed immediately so a signal arriving before the
/// returned future is polled is not lost.
#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = String> + Send + 'static> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM".to_string(),
            _ = sigint.recv() => "SIGINT".to_string(),
        }
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = String> + Send + 'static> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT".to_string(),
            Err(_) => std::future::pending().await,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[("MTR_TARGET", "example.com")]).unwrap();
        assert_eq!(config.family, AddressFamily::Auto);
        assert_eq!(config.rounds, 10);
        assert_eq!(config.binary, "mtr");
        assert!(config.reverse_dns);
        assert_eq!(config.max_in_flight, 32);
        assert_eq!(config.org_lookup, OrgBackend::None);
        assert_eq!(config.output, Output::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn target_required_without_raw_input() {
        assert!(config(&[]).unwrap().validate().is_err());
        assert!(config(&[("MTR_RAW_INPUT", "-")]).unwrap().validate().is_ok());
    }

    #[test]
    fn ranges_are_enforced() {
        let zero = config(&[("MTR_TARGET", "h"), ("MTR_ROUNDS", "0")]).unwrap();
        assert!(zero.validate().is_err());
        let many = config(&[("MTR_TARGET", "h"), ("MTR_ROUNDS", "1001")]).unwrap();
        assert!(many.validate().is_err());
        let long = config(&[("MTR_TARGET", "h"), ("MTR_DEADLINE_SECS", "7200")]).unwrap();
        assert!(long.validate().is_err());
        let no_lookups = config(&[("MTR_TARGET", "h"), ("MTR_MAX_IN_FLIGHT", "0")]).unwrap();
        assert!(no_lookups.validate().is_err());
    }

    #[test]
    fn malformed_values_are_config_errors() {
        assert!(config(&[("MTR_ROUNDS", "ten")]).is_err());
        assert!(config(&[("MTR_FAMILY", "5")]).is_err());
        assert!(config(&[("MTR_OUTPUT", "xml")]).is_err());
        assert!(config(&[("MTR_ORG_LOOKUP", "geoip")]).is_err());
        assert!(config(&[("MTR_REVERSE_DNS", "maybe")]).is_err());
        assert!(config(&[("MTR_MAX_IN_FLIGHT", "-1")]).is_err());
    }

    #[test]
    fn explicit_settings() {
        let config = config(&[
            ("MTR_TARGET", "example.com"),
            ("MTR_FAMILY", "6"),
            ("MTR_ROUNDS", "3"),
            ("MTR_REVERSE_DNS", "false"),
            ("MTR_ORG_LOOKUP", "CYMRU"),
            ("MTR_OUTPUT", "json"),
            ("MTR_DEADLINE_SECS", "60"),
            ("MTR_MAX_IN_FLIGHT", "4"),
        ])
        .unwrap();

        assert_eq!(config.family, AddressFamily::V6);
        assert_eq!(config.org_lookup, OrgBackend::Cymru);
        assert_eq!(config.output, Output::Json);
        assert_eq!(config.deadline(), Some(Duration::from_secs(60)));

        let core = config.report_config();
        assert_eq!(core.probe.rounds().get(), 3);
        assert!(!core.identity.reverse_dns);
        assert_eq!(core.identity.max_in_flight, 4);
    }

    #[test]
    fn exit_codes() {
        assert_eq!(MtrExitCode::Success as u8, 0);
        assert_eq!(MtrExitCode::ConfigError as u8, 1);
        assert_eq!(MtrExitCode::RuntimeError as u8, 2);
    }

    #[tokio::test]
    async fn json_output_ends_with_newline() {
        let report = Report::new(Target::literal("8.8.8.8", "8.8.8.8".parse().unwrap()), Vec::new());
        let out = format_report(&report, Output::Json).unwrap();
        assert!(out.starts_with('{'));
        assert!(out.ends_with("}\n"));
    }
}
