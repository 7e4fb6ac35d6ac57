//! Cluster membership: node descriptors and the membership snapshot.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node with neither role is a client node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRoles {
    pub master: bool,
    pub data: bool,
}

impl NodeRoles {
    pub const fn all() -> Self {
        Self {
            master: true,
            data: true,
        }
    }

    pub const fn data_only() -> Self {
        Self {
            master: false,
            data: true,
        }
    }

    pub const fn master_only() -> Self {
        Self {
            master: true,
            data: false,
        }
    }

    pub const fn client() -> Self {
        Self {
            master: false,
            data: false,
        }
    }
}

impl Default for NodeRoles {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryNode {
    id: NodeId,
    name: String,
    host: String,
    roles: NodeRoles,
    attributes: BTreeMap<String, String>,
}

impl DiscoveryNode {
    /// A master-eligible data node named after its id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: NodeId(id),
            host: "127.0.0.1".to_string(),
            roles: NodeRoles::default(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_roles(mut self, roles: NodeRoles) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn roles(&self) -> NodeRoles {
        self.roles
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn is_master_eligible(&self) -> bool {
        self.roles.master
    }

    pub fn is_data(&self) -> bool {
        self.roles.data
    }

    pub fn is_client(&self) -> bool {
        !self.roles.master && !self.roles.data
    }

    /// Client nodes do not open connections to other client nodes.
    pub fn should_connect_to(&self, other: &DiscoveryNode) -> bool {
        !(self.is_client() && other.is_client())
    }
}

/// Immutable membership snapshot. The local node is always a member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryNodes {
    nodes: BTreeMap<NodeId, DiscoveryNode>,
    local_node_id: NodeId,
    master_node_id: Option<NodeId>,
}

impl DiscoveryNodes {
    pub fn new(local: DiscoveryNode) -> Self {
        let local_node_id = local.id.clone();
        let mut nodes = BTreeMap::new();
        nodes.insert(local_node_id.clone(), local);
        Self {
            nodes,
            local_node_id,
            master_node_id: None,
        }
    }

    pub fn with_node(mut self, node: DiscoveryNode) -> Self {
        self.nodes.insert(node.id.clone(), node);
        self
    }

    /// Ignored unless `node_id` is a member.
    pub fn with_master(mut self, node_id: impl Into<NodeId>) -> Self {
        let node_id = node_id.into();
        if self.nodes.contains_key(&node_id) {
            self.master_node_id = Some(node_id);
        }
        self
    }

    /// Drop a member; the local node cannot be removed.
    pub fn without_node(mut self, node_id: &str) -> Self {
        if node_id != self.local_node_id.as_str() {
            self.nodes.remove(node_id);
            if self.master_node_id.as_ref().is_some_and(|m| m.as_str() == node_id) {
                self.master_node_id = None;
            }
        }
        self
    }

    pub fn get(&self, node_id: &str) -> Option<&DiscoveryNode> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn local_node(&self) -> &DiscoveryNode {
        &self.nodes[&self.local_node_id]
    }

    pub fn local_node_id(&self) -> &NodeId {
        &self.local_node_id
    }

    pub fn master_node(&self) -> Option<&DiscoveryNode> {
        self.master_node_id.as_ref().and_then(|id| self.nodes.get(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveryNode> {
        self.nodes.values()
    }

    pub fn data_nodes(&self) -> impl Iterator<Item = &DiscoveryNode> {
        self.nodes.values().filter(|node| node.is_data())
    }

    /// Resolve node filter expressions to node ids.
    ///
    /// An empty list or `_all` selects every node. Other expressions:
    /// `_local`, `_master`, an exact node id, `role:bool` for the `master`,
    /// `data` and `client` roles, `attr:value` for attributes, or a `*`
    /// pattern matched against id, name and host. Results keep first-match
    /// order without duplicates; expressions matching nothing are dropped.
    pub fn resolve_node_ids<S: AsRef<str>>(&self, expressions: &[S]) -> Vec<NodeId> {
        if expressions.is_empty() || expressions.iter().any(|e| e.as_ref() == "_all") {
            return self.nodes.keys().cloned().collect();
        }

        let mut resolved: Vec<NodeId> = Vec::new();
        let mut add = |id: &NodeId| {
            if !resolved.contains(id) {
                resolved.push(id.clone());
            }
        };

        for expression in expressions {
            let expression = expression.as_ref();
            match expression {
                "_local" => add(&self.local_node_id),
                "_master" => {
                    if let Some(master) = self.master_node() {
                        add(master.id());
                    }
                }
                _ if self.nodes.contains_key(expression) => {
                    if let Some((id, _)) = self.nodes.get_key_value(expression) {
                        add(id);
                    }
                }
                _ => {
                    if let Some((key, value)) = expression.split_once(':') {
                        for node in self.nodes.values() {
                            if selector_matches(node, key, value) {
                                add(&node.id);
                            }
                        }
                    } else {
                        for node in self.nodes.values() {
                            if simple_match(expression, node.id.as_str())
                                || simple_match(expression, &node.name)
                                || simple_match(expression, &node.host)
                            {
                                add(&node.id);
                            }
                        }
                    }
                }
            }
        }
        resolved
    }
}

fn selector_matches(node: &DiscoveryNode, key: &str, value: &str) -> bool {
    match key {
        "master" => node.is_master_eligible() == (value == "true"),
        "data" => node.is_data() == (value == "true"),
        "client" => node.is_client() == (value == "true"),
        _ => node
            .attributes
            .get(key)
            .is_some_and(|attr| simple_match(value, attr)),
    }
}

/// Glob match where `*` matches any run of characters.
pub(crate) fn simple_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == value;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let head = parts[0];
    let tail = parts[parts.len() - 1];
    let Some(mut rest) = value.strip_prefix(head) else {
        return false;
    };
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn cluster() -> DiscoveryNodes {
        DiscoveryNodes::new(DiscoveryNode::new("n1").with_name("alpha").with_roles(NodeRoles::master_only()))
            .with_node(
                DiscoveryNode::new("n2")
                    .with_name("beta")
                    .with_host("10.0.0.2")
                    .with_roles(NodeRoles::data_only())
                    .with_attribute("zone", "east"),
            )
            .with_node(
                DiscoveryNode::new("n3")
                    .with_name("gamma")
                    .with_roles(NodeRoles::data_only())
                    .with_attribute("zone", "west"),
            )
            .with_node(DiscoveryNode::new("c1").with_name("client-1").with_roles(NodeRoles::client()))
            .with_master("n1")
    }

    fn ids(nodes: &[&str]) -> Vec<NodeId> {
        nodes.iter().map(|id| NodeId::new(*id)).collect()
    }

    #[rstest]
    #[case::empty(&[], &["c1", "n1", "n2", "n3"])]
    #[case::all(&["_all"], &["c1", "n1", "n2", "n3"])]
    #[case::local(&["_local"], &["n1"])]
    #[case::master(&["_master"], &["n1"])]
    #[case::exact(&["n3", "n2"], &["n3", "n2"])]
    #[case::by_name(&["beta"], &["n2"])]
    #[case::wildcard(&["n*"], &["n1", "n2", "n3"])]
    #[case::host(&["10.0.*"], &["n2"])]
    #[case::data_role(&["data:true"], &["n2", "n3"])]
    #[case::client_role(&["client:true"], &["c1"])]
    #[case::attribute(&["zone:we*"], &["n3"])]
    #[case::dedup(&["n2", "beta", "data:true"], &["n2", "n3"])]
    #[case::unknown(&["nope"], &[])]
    fn resolves_filters(#[case] filters: &[&str], #[case] expected: &[&str]) {
        assert_eq!(cluster().resolve_node_ids(filters), ids(expected));
    }

    #[rstest]
    #[case("abc", "abc", true)]
    #[case("a*", "abc", true)]
    #[case("*c", "abc", true)]
    #[case("a*c", "abc", true)]
    #[case("a*b*c", "axxbyyc", true)]
    #[case("a*c", "ab", false)]
    #[case("ab*ba", "aba", false)]
    fn simple_match_cases(#[case] pattern: &str, #[case] value: &str, #[case] expected: bool) {
        assert_eq!(simple_match(pattern, value), expected);
    }

    #[test]
    fn client_nodes_do_not_connect_to_each_other() {
        let nodes = cluster();
        let client = nodes.get("c1").unwrap();
        let other_client = DiscoveryNode::new("c2").with_roles(NodeRoles::client());
        let data = nodes.get("n2").unwrap();

        assert!(!client.should_connect_to(&other_client));
        assert!(client.should_connect_to(data));
        assert!(data.should_connect_to(client));
    }

    #[test]
    fn local_node_cannot_be_removed() {
        let nodes = cluster().without_node("n1").without_node("n2");
        assert!(nodes.contains("n1"));
        assert!(!nodes.contains("n2"));
        assert_eq!(nodes.local_node().name(), "alpha");
    }
}
