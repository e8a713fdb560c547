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

use data::core::primitives::{ComponentId, DefinitionId, MatchId};
use data::match_states::match_state::MatchState;
use data::rulesets::component_definition::ComponentDefinition;
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::workflow::{END_NODE_ID, START_NODE_ID};
use rules::workflows::workflow_executor::{
    can_exit_workflow, current_node, enter_workflow, step_workflow, take_input_edge,
    valid_transitions, StepOutcome,
};
use serde_json::json;
use uuid::Uuid;

fn ruleset() -> RulesetIR {
    RulesetIR::from_value(json!({
        "version": "1.0.0",
        "turn_structure": { "phases": [{ "id": 1, "name": "Main" }] }
    }))
    .expect("ruleset should load")
}

fn definition_with_graph(graph: serde_json::Value) -> ComponentDefinition {
    serde_json::from_value(json!({
        "id": 50,
        "name": "Flow",
        "component_type": "custom",
        "workflow_graph": graph
    }))
    .expect("definition should parse")
}

fn component_with_graph(graph: serde_json::Value) -> (RulesetIR, MatchState, ComponentId) {
    let ruleset = ruleset();
    let mut state = MatchState::new(MatchId(Uuid::nil()), 1);
    let definition = definition_with_graph(graph);
    let component = state.components.create(&definition, None, None);
    enter_workflow(&mut state, component, &definition).expect("enter should succeed");
    (ruleset, state, component)
}

#[test]
fn steps_through_a_simple_chain_to_the_end() {
    let (ruleset, mut state, component) = component_with_graph(json!({
        "nodes": [{ "id": "a", "name": "A" }],
        "edges": [
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "a" },
            { "edge_type": "simple", "from_node_id": "a", "to_node_id": END_NODE_ID }
        ]
    }));

    assert_eq!(current_node(&state, component).unwrap().id, START_NODE_ID);
    assert_eq!(step_workflow(&ruleset, &mut state, component).unwrap(), StepOutcome::Advanced);
    assert_eq!(current_node(&state, component).unwrap().id, "a");
    assert_eq!(step_workflow(&ruleset, &mut state, component).unwrap(), StepOutcome::Ended);
    assert_eq!(current_node(&state, component).unwrap().id, END_NODE_ID);

    // History records the visited nodes.
    let history =
        &state.component(component).unwrap().workflow.as_ref().unwrap().history;
    assert_eq!(history, &vec![START_NODE_ID.to_string(), "a".to_string()]);
}

#[test]
fn transitions_are_ordered_by_priority_then_declaration() {
    let (ruleset, state, component) = component_with_graph(json!({
        "nodes": [
            { "id": "low", "name": "Low" },
            { "id": "high", "name": "High" },
            { "id": "tie", "name": "Tie" }
        ],
        "edges": [
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "low", "priority": 1 },
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "high", "priority": 5 },
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "tie", "priority": 5 },
            { "edge_type": "simple", "from_node_id": "low", "to_node_id": END_NODE_ID },
            { "edge_type": "simple", "from_node_id": "high", "to_node_id": END_NODE_ID },
            { "edge_type": "simple", "from_node_id": "tie", "to_node_id": END_NODE_ID }
        ]
    }));

    let targets: Vec<String> = valid_transitions(&ruleset, &state, component)
        .iter()
        .map(|edge| edge.to_node_id().to_string())
        .collect();
    assert_eq!(targets, vec!["high", "tie", "low"]);
}

#[test]
fn condition_edges_gate_on_their_predicate() {
    let (ruleset, mut state, component) = component_with_graph(json!({
        "nodes": [
            { "id": "blocked", "name": "Blocked" },
            { "id": "open", "name": "Open" }
        ],
        "edges": [
            {
                "edge_type": "condition",
                "from_node_id": START_NODE_ID,
                "to_node_id": "blocked",
                "priority": 10,
                "condition": {
                    "kind": "pred.gt",
                    "a": { "kind": "const.number", "value": 0 },
                    "b": { "kind": "const.number", "value": 1 }
                }
            },
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "open" },
            { "edge_type": "simple", "from_node_id": "blocked", "to_node_id": END_NODE_ID },
            { "edge_type": "simple", "from_node_id": "open", "to_node_id": END_NODE_ID }
        ]
    }));

    // The higher-priority edge's predicate is false, so the simple edge
    // wins.
    assert_eq!(step_workflow(&ruleset, &mut state, component).unwrap(), StepOutcome::Advanced);
    assert_eq!(current_node(&state, component).unwrap().id, "open");
}

#[test]
fn input_edges_block_stepping_until_activated() {
    let (ruleset, mut state, component) = component_with_graph(json!({
        "nodes": [{ "id": "wait", "name": "Wait" }],
        "edges": [
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "wait" },
            {
                "edge_type": "input",
                "from_node_id": "wait",
                "to_node_id": END_NODE_ID,
                "trigger_input_id": 5
            }
        ]
    }));

    assert_eq!(step_workflow(&ruleset, &mut state, component).unwrap(), StepOutcome::Advanced);
    // The input edge is never auto-taken.
    assert_eq!(step_workflow(&ruleset, &mut state, component).unwrap(), StepOutcome::Blocked);

    // Activating the wrong input is a mismatch.
    assert!(take_input_edge(&ruleset, &mut state, component, DefinitionId(6)).is_err());

    assert_eq!(
        take_input_edge(&ruleset, &mut state, component, DefinitionId(5)).unwrap(),
        StepOutcome::Ended
    );
}

#[test]
fn can_exit_is_true_for_empty_graphs_and_one_step_exits() {
    let (ruleset, state, empty) = component_with_graph(json!({}));
    assert!(can_exit_workflow(&ruleset, &state, empty));

    let (ruleset, mut state, chain) = component_with_graph(json!({
        "nodes": [{ "id": "a", "name": "A" }],
        "edges": [
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "a" },
            { "edge_type": "simple", "from_node_id": "a", "to_node_id": END_NODE_ID }
        ]
    }));
    // From the start node the end is two steps away.
    assert!(!can_exit_workflow(&ruleset, &state, chain));
    step_workflow(&ruleset, &mut state, chain).unwrap();
    assert!(can_exit_workflow(&ruleset, &state, chain));
}
