//! Entity model: interfaces, addresses and routes
//!
//! - [`Interface`]: a network interface and its up/running flags
//! - [`Address`]: an IP address assigned to an interface
//! - [`Route`]: a kernel routing table entry
//!
//! All three are plain values. Relationships between them are expressed by
//! [`InterfaceId`] references and tracked by the registry and indices.

pub mod address;
pub mod interface;
pub mod route;

pub use address::{Address, AddressSet};
pub use interface::{Interface, InterfaceFlags, InterfaceId};
pub use route::{Route, RouteSet};
