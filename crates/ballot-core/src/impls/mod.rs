//! Impls - in-process implementations of the ports.
//!
//! # Included
//! - **LocalTransport**: delivers node requests by calling the action
//!   directly, with per-node fault injection
//! - **StaticClusterState**: a replaceable membership snapshot

pub mod local_transport;
pub mod static_cluster;

pub use self::local_transport::{Fault, LocalTransport};
pub use self::static_cluster::StaticClusterState;
