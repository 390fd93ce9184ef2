// # Interface
//
// A network interface as reported by the OS. The `id` is process-local and
// stays stable for as long as the interface is known; it is not the kernel
// ifindex, which the OS may reassign.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process-local interface identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceId(pub u32);

impl InterfaceId {
    /// Raw numeric value
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for InterfaceId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interface flag bitset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceFlags {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub loopback: bool,
    #[serde(default)]
    pub point_to_point: bool,
}

impl InterfaceFlags {
    /// Flags for an interface that is both up and running
    pub const fn up_running() -> Self {
        Self {
            up: true,
            running: true,
            loopback: false,
            point_to_point: false,
        }
    }
}

/// A network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    /// Stable process-local identity
    pub id: InterfaceId,
    /// Interface name (e.g., "eth0")
    pub name: String,
    /// Interface type as reported by the OS (e.g., "ether", "loopback")
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Maximum transmission unit
    #[serde(default)]
    pub mtu: u32,
    /// Hardware address bytes (may be empty)
    #[serde(default)]
    pub hw_addr: Vec<u8>,
    /// Up/running/loopback/point-to-point flags
    #[serde(default)]
    pub flags: InterfaceFlags,
}

impl Interface {
    /// Create an interface with default type, mtu and no hardware address
    pub fn new(id: impl Into<InterfaceId>, name: impl Into<String>, flags: InterfaceFlags) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: String::new(),
            mtu: 0,
            hw_addr: Vec::new(),
            flags,
        }
    }

    /// Set the interface type
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the MTU
    pub fn with_mtu(mut self, mtu: u32) -> Self {
        self.mtu = mtu;
        self
    }

    /// Set the hardware address
    pub fn with_hw_addr(mut self, hw_addr: impl Into<Vec<u8>>) -> Self {
        self.hw_addr = hw_addr.into();
        self
    }

    /// An interface is usable only when it is both up and running
    pub fn is_active(&self) -> bool {
        self.flags.up && self.flags.running
    }
}
