//! ballot - inspect allocation decisions and run node fan-outs against a
//! demo cluster.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use ballot_core::BallotConfig;
use ballot_core::action::{BaseNodesRequest, NodeStatsAction, TransportNodesAction};
use ballot_core::allocation::{
    AllocationDecider, AllocationDeciders, EnableAllocationDecider, RoutingAllocation, RoutingNodes,
    SameShardAllocationDecider,
};
use ballot_core::domain::{DiscoveryNode, DiscoveryNodes, NodeId, NodeRoles, ShardId, ShardRouting};
use ballot_core::impls::{Fault, LocalTransport, StaticClusterState};
use ballot_core::ports::{IdGenerator, SystemClock, UlidGenerator};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Shard allocation deciders and node fan-out.
#[derive(Parser)]
#[command(name = "ballot")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter; overrides the config file, overridden by RUST_LOG
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the deciders for every unassigned shard on every node
    Explain {
        /// Keep every decider's vote and explanation
        #[arg(long)]
        debug: bool,
    },

    /// Collect node stats from the nodes matching the filters
    Stats {
        /// Node filter expressions (ids, `_local`, `data:true`, `n*`, ...)
        #[arg(long = "nodes", num_args = 1..)]
        nodes: Vec<String>,

        /// Make these nodes fail their request
        #[arg(long = "fail")]
        fail: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BallotConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => BallotConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_tracing(&config)?;

    let output = match cli.command {
        Commands::Explain { debug } => explain(&config, debug || config.allocation.debug_decisions)?,
        Commands::Stats { nodes, fail } => stats(&config, nodes, fail).await?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(config: &BallotConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))
}

fn demo_nodes() -> DiscoveryNodes {
    DiscoveryNodes::new(DiscoveryNode::new("m1").with_name("master-1").with_roles(NodeRoles::master_only()))
        .with_node(
            DiscoveryNode::new("d1")
                .with_name("data-1")
                .with_roles(NodeRoles::data_only())
                .with_attribute("zone", "a"),
        )
        .with_node(
            DiscoveryNode::new("d2")
                .with_name("data-2")
                .with_roles(NodeRoles::data_only())
                .with_attribute("zone", "b"),
        )
        .with_node(
            DiscoveryNode::new("d3")
                .with_name("data-3")
                .with_roles(NodeRoles::data_only())
                .with_attribute("zone", "b"),
        )
        .with_master("m1")
}

fn demo_shards() -> Vec<ShardRouting> {
    vec![
        ShardRouting::started(ShardId::new("logs", 0), true, NodeId::new("d1")),
        ShardRouting::unassigned(ShardId::new("logs", 0), false),
        ShardRouting::started(ShardId::new("logs", 1), true, NodeId::new("d2")),
        ShardRouting::unassigned(ShardId::new("logs", 1), false),
        ShardRouting::unassigned(ShardId::new("metrics", 0), true),
        ShardRouting {
            allocated_before: true,
            ..ShardRouting::unassigned(ShardId::new("metrics", 1), true)
        },
    ]
}

fn explain(config: &BallotConfig, debug: bool) -> anyhow::Result<serde_json::Value> {
    let deciders = AllocationDeciders::builder()
        .add(Arc::new(EnableAllocationDecider::new(config.allocation.enable)))?
        .add(Arc::new(SameShardAllocationDecider))?
        .build();

    let nodes = Arc::new(demo_nodes());
    let routing = RoutingNodes::new(&nodes, demo_shards());
    let ids = UlidGenerator::new(SystemClock);
    let mut allocation = RoutingAllocation::new(ids.generate_pass_id(), nodes, routing);
    allocation.set_debug_decision(debug);
    let debug_decision = debug;
    info!(pass = %allocation.pass_id(), deciders = ?deciders.names(), debug = debug_decision, "explaining allocation");

    let shards: Vec<serde_json::Value> = allocation
        .routing_nodes()
        .unassigned()
        .iter()
        .map(|shard| {
            let per_node: Vec<serde_json::Value> = allocation
                .routing_nodes()
                .iter()
                .map(|node| {
                    json!({
                        "node": node.node_id(),
                        "decision": deciders.can_allocate(shard, node, &allocation),
                    })
                })
                .collect();
            json!({
                "shard": shard.shard_id.to_string(),
                "primary": shard.primary,
                "shard_decision": deciders.can_allocate_shard(shard, &allocation),
                "nodes": per_node,
            })
        })
        .collect();

    Ok(json!({
        "pass_id": allocation.pass_id().to_string(),
        "debug": debug,
        "deciders": deciders.names(),
        "shards": shards,
    }))
}

async fn stats(config: &BallotConfig, filters: Vec<String>, fail: Vec<String>) -> anyhow::Result<serde_json::Value> {
    let nodes = demo_nodes();
    let routing = Arc::new(RoutingNodes::new(&nodes, demo_shards()));
    let cluster = Arc::new(StaticClusterState::new(&config.cluster_name, nodes));
    let action = Arc::new(
        NodeStatsAction::new(cluster.clone(), routing, Arc::new(SystemClock))
            .with_accumulate_failures(config.fanout.accumulate_failures),
    );
    let transport = Arc::new(LocalTransport::new(Arc::clone(&action)));
    for node_id in fail {
        transport.inject(NodeId::new(node_id), Fault::Fail("injected from the command line".to_string()));
    }
    let fanout = TransportNodesAction::new(action, cluster, transport);

    let mut request = BaseNodesRequest::new(filters);
    if let Some(timeout) = config.fanout.node_timeout() {
        request = request.with_timeout(timeout);
    }
    info!(action = fanout.transport_action(), "collecting node stats");
    let response = fanout.execute_async(request).await?;
    Ok(serde_json::to_value(&response)?)
}
