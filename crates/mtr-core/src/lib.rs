// # mtr-core
//
// Core library that turns one run of `mtr --raw` into a per-hop report.
//
// ## Architecture Overview
//
// This library provides the pipeline and its collaborator contracts:
// - **NameResolver**: forward lookup for the target, reverse lookup for hops
// - **LocalAddresses**: local interface addresses for family selection
// - **ProbeRunner**: executes the probe and returns its raw output
// - **OrgLookup**: optional per-IP organization (ASN) label
// - **ReportBuilder**: runs resolve → probe → decode → stats/identity
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Library-First**: The binary is a thin shell over `ReportBuilder`
// 3. **Fail Whole**: Any fatal error aborts the build; identity lookups
//    degrade to empty strings instead of failing

pub mod cancel;
pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod identity;
pub mod probe;
pub mod report;
pub mod stats;
pub mod target;
pub mod traits;

// Re-export core types for convenience
pub use cancel::Cancel;
pub use config::{IdentityConfig, ProbeConfig, ReportConfig};
pub use engine::ReportBuilder;
pub use error::{Error, Result};
pub use report::{Hop, Report};
pub use stats::HopStats;
pub use target::{AddressFamily, IpVersion, Target};
pub use traits::{LocalAddresses, NameResolver, OrgLookup, ProbeRunner};
