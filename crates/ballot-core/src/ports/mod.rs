//! Ports: the collaborators the core consumes but does not own.
//!
//! - **ClusterStateSource**: current node membership
//! - **Transport**: sends a node-level request to a named node
//! - **Clock** / **IdGenerator**: time and identifiers, swappable in tests

pub mod clock;
pub mod cluster;
pub mod id_generator;
pub mod transport;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::cluster::ClusterStateSource;
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::transport::Transport;
