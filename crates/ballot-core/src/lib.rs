//! ballot-core
//!
//! Building blocks for cluster coordination.
//!
//! # Modules
//! - **domain**: decisions, nodes, shards, identifiers and errors
//! - **ports**: collaborators (ClusterStateSource, Transport, Clock, IdGenerator)
//! - **allocation**: pluggable allocation deciders and their composite
//! - **action**: fan-out of one request to many nodes with exactly-once aggregation
//! - **impls**: in-process implementations (LocalTransport, StaticClusterState)
//! - **config**: JSON configuration

pub mod action;
pub mod allocation;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use self::config::BallotConfig;
