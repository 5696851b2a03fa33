// # Local Addresses Trait
//
// Exposes the addresses configured on the local host's interfaces.
//
// Target resolution uses this to decide whether automatic family selection
// may prefer IPv6: only a host with a globally routable IPv6 address can
// probe an IPv6 destination.
//
// ## Implementations
//
// - pnet datalink: `mtr-ifaces-pnet` crate

use std::net::IpAddr;

/// Trait for local interface address enumeration
pub trait LocalAddresses: Send + Sync {
    /// All addresses currently assigned to local interfaces
    ///
    /// Enumeration failures are reported as an empty list; a host whose
    /// interfaces cannot be read is treated as IPv4-only.
    fn addresses(&self) -> Vec<IpAddr>;
}

/// A fixed address list, for embedding and tests
impl LocalAddresses for Vec<IpAddr> {
    fn addresses(&self) -> Vec<IpAddr> {
        self.clone()
    }
}
