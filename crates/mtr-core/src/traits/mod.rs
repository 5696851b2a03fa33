//! Collaborator traits for the report pipeline
//!
//! The core never talks to the network or spawns processes itself. Everything
//! external is reached through one of these seams:
//!
//! - [`NameResolver`]: forward and reverse DNS
//! - [`LocalAddresses`]: addresses configured on the local host
//! - [`ProbeRunner`]: executes the probe binary
//! - [`OrgLookup`]: optional network-owner database

pub mod name_resolver;
pub mod local_addresses;
pub mod probe_runner;
pub mod org_lookup;

pub use name_resolver::NameResolver;
pub use local_addresses::LocalAddresses;
pub use probe_runner::ProbeRunner;
pub use org_lookup::OrgLookup;
