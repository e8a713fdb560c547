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

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rulesets::workflow::{WorkflowEdge, WorkflowGraph, WorkflowNode, START_NODE_ID};

/// The workflow position of a component instance.
///
/// Holds the graph, the current node, the history of visited nodes, and
/// instance metadata. A self-contained workflow instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub graph: WorkflowGraph,
    pub current_node_id: Option<String>,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl WorkflowState {
    /// Creates a workflow instance positioned at the implicit start node.
    pub fn from_graph(graph: WorkflowGraph) -> Self {
        Self {
            graph,
            current_node_id: Some(START_NODE_ID.to_string()),
            history: vec![],
            metadata: Map::new(),
        }
    }

    pub fn current_node(&self) -> Option<WorkflowNode> {
        self.current_node_id.as_deref().and_then(|id| self.graph.node(id))
    }

    pub fn outgoing_edges(&self) -> Vec<&WorkflowEdge> {
        match self.current_node_id.as_deref() {
            Some(id) => self.graph.outgoing_edges(id),
            None => vec![],
        }
    }

    /// Moves to a node, recording the previous position in the history.
    pub fn enter_node(&mut self, node_id: &str) {
        if let Some(current) = self.current_node_id.take() {
            self.history.push(current);
        }
        self.current_node_id = Some(node_id.to_string());
    }

    /// Returns the position and history to the start node, keeping the
    /// graph.
    pub fn reset(&mut self) {
        self.current_node_id = Some(START_NODE_ID.to_string());
        self.history.clear();
        self.metadata.clear();
    }
}
