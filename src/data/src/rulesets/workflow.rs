// Copyright © deckhand 2024-present
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use enum_kinds::EnumKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::DefinitionId;
use crate::match_states::pending_input::InputKind;
use crate::rulesets::expressions::Predicate;

/// Reserved id of the implicit start node present in every workflow graph.
pub const START_NODE_ID: &str = "__start__";

/// Reserved id of the implicit end node present in every workflow graph.
pub const END_NODE_ID: &str = "__end__";

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Start,
    End,
    Intermediate,
}

/// A node in a workflow graph.
///
/// `component_definition_id` links the node to a child component definition:
/// a node inside the Game workflow refers to a Turn definition, and a node
/// inside a Turn workflow refers to a Phase definition. Entering such a node
/// instantiates the child component and enters its workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowNode {
    pub id: String,
    pub name: String,
    #[serde(default = "default_node_type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub component_definition_id: Option<DefinitionId>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub available_input_ids: Vec<DefinitionId>,
}

fn default_node_type() -> NodeType {
    NodeType::Intermediate
}

/// Shared fields of every workflow edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeBase {
    pub from_node_id: String,
    pub to_node_id: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// A transition between workflow nodes.
///
/// `Simple` edges are always enabled. `Condition` edges are enabled when the
/// predicate evaluates true. `Input` edges are never auto-taken: they become
/// the transition path only when a player activates the named input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, EnumKind)]
#[enum_kind(EdgeKind, derive(Serialize, Deserialize))]
#[serde(tag = "edge_type", rename_all = "snake_case")]
pub enum WorkflowEdge {
    Simple {
        #[serde(flatten)]
        base: EdgeBase,
    },
    Condition {
        #[serde(flatten)]
        base: EdgeBase,
        condition: Predicate,
    },
    Input {
        #[serde(flatten)]
        base: EdgeBase,
        trigger_input_id: DefinitionId,
        #[serde(default)]
        condition: Option<Predicate>,
        /// What kind of choice the pending input presents to players.
        #[serde(default)]
        kind: InputKind,
        /// Constraint map copied onto pending inputs produced by this edge.
        #[serde(default)]
        constraints: Map<String, Value>,
    },
}

impl WorkflowEdge {
    pub fn base(&self) -> &EdgeBase {
        match self {
            WorkflowEdge::Simple { base }
            | WorkflowEdge::Condition { base, .. }
            | WorkflowEdge::Input { base, .. } => base,
        }
    }

    pub fn from_node_id(&self) -> &str {
        &self.base().from_node_id
    }

    pub fn to_node_id(&self) -> &str {
        &self.base().to_node_id
    }

    pub fn priority(&self) -> i32 {
        self.base().priority
    }

    pub fn kind(&self) -> EdgeKind {
        EdgeKind::from(self)
    }

    pub fn is_input(&self) -> bool {
        matches!(self, WorkflowEdge::Input { .. })
    }

    /// The predicate gating this edge, if any.
    pub fn condition(&self) -> Option<&Predicate> {
        match self {
            WorkflowEdge::Simple { .. } => None,
            WorkflowEdge::Condition { condition, .. } => Some(condition),
            WorkflowEdge::Input { condition, .. } => condition.as_ref(),
        }
    }
}

/// Container for workflow graph nodes and edges.
///
/// The graph always contains implicit start and end nodes with the reserved
/// ids [START_NODE_ID] and [END_NODE_ID]; `nodes` lists only the
/// intermediate nodes. Edges may reference the start node as a source and
/// the end node as a target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
    pub fn start_node() -> WorkflowNode {
        WorkflowNode {
            id: START_NODE_ID.to_string(),
            name: "Start".to_string(),
            node_type: NodeType::Start,
            component_definition_id: None,
            metadata: Map::new(),
            available_input_ids: vec![],
        }
    }

    pub fn end_node() -> WorkflowNode {
        WorkflowNode {
            id: END_NODE_ID.to_string(),
            name: "End".to_string(),
            node_type: NodeType::End,
            component_definition_id: None,
            metadata: Map::new(),
            available_input_ids: vec![],
        }
    }

    /// True if the graph declares neither nodes nor edges.
    ///
    /// An empty workflow is trivially exitable: the component sits at the
    /// implicit start node until its owner decides to leave.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Looks up a node by id, including the implicit start and end nodes.
    pub fn node(&self, node_id: &str) -> Option<WorkflowNode> {
        if node_id == START_NODE_ID {
            return Some(Self::start_node());
        }
        if node_id == END_NODE_ID {
            return Some(Self::end_node());
        }
        self.nodes.iter().find(|n| n.id == node_id).cloned()
    }

    /// All outgoing edges from a node, in declaration order.
    pub fn outgoing_edges(&self, node_id: &str) -> Vec<&WorkflowEdge> {
        self.edges.iter().filter(|e| e.from_node_id() == node_id).collect()
    }

    pub fn incoming_edges(&self, node_id: &str) -> Vec<&WorkflowEdge> {
        self.edges.iter().filter(|e| e.to_node_id() == node_id).collect()
    }

    /// Validates the structure of the graph.
    ///
    /// Checks that all edges reference declared nodes, that nothing enters
    /// the start node or leaves the end node, that a non-empty graph
    /// connects start and end, and that every node either reaches the end
    /// node or has at least one outgoing edge.
    pub fn validate(&self) -> Result<(), String> {
        let mut node_ids: Vec<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        node_ids.push(START_NODE_ID);
        node_ids.push(END_NODE_ID);

        for edge in &self.edges {
            if !node_ids.contains(&edge.from_node_id()) {
                return Err(format!("edge references unknown source node: {}", edge.from_node_id()));
            }
            if !node_ids.contains(&edge.to_node_id()) {
                return Err(format!("edge references unknown target node: {}", edge.to_node_id()));
            }
            if edge.to_node_id() == START_NODE_ID {
                return Err("no edge can target the start node".to_string());
            }
            if edge.from_node_id() == END_NODE_ID {
                return Err("no edge can originate from the end node".to_string());
            }
        }

        if !self.nodes.is_empty() {
            if self.outgoing_edges(START_NODE_ID).is_empty() {
                return Err("start node must have at least one outgoing edge".to_string());
            }
            if self.incoming_edges(END_NODE_ID).is_empty() {
                return Err("end node must have at least one incoming edge".to_string());
            }
            for node in &self.nodes {
                if !self.reaches_end(&node.id) && self.outgoing_edges(&node.id).is_empty() {
                    return Err(format!("node {} cannot reach the end node", node.id));
                }
            }
        }

        Ok(())
    }

    /// True if the end node is reachable from `from` following edges.
    pub fn reaches_end(&self, from: &str) -> bool {
        let mut visited = vec![from.to_string()];
        let mut frontier = vec![from.to_string()];
        while let Some(current) = frontier.pop() {
            for edge in self.outgoing_edges(&current) {
                let target = edge.to_node_id();
                if target == END_NODE_ID {
                    return true;
                }
                if !visited.iter().any(|v| v == target) {
                    visited.push(target.to_string());
                    frontier.push(target.to_string());
                }
            }
        }
        false
    }
}
