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

use data::core::errors::MatchError;
use data::match_states::event::EventType;
use data::rulesets::component_definition::ComponentTag;
use data::rulesets::expressions::{NumExpr, Predicate, Selector, DYNAMIC_SOURCE};
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::workflow::{WorkflowGraph, END_NODE_ID, START_NODE_ID};
use serde_json::json;

fn minimal_ruleset() -> serde_json::Value {
    json!({
        "version": "1.0.0",
        "metadata": { "name": "Test", "author": "Test" },
        "turn_structure": {
            "phases": [
                { "id": 1, "name": "Main" },
                { "id": 2, "name": "End" }
            ],
            "initial_phase_id": 1,
            "max_turns_per_player": 1
        }
    })
}

#[test]
fn loads_minimal_ruleset_and_synthesizes_workflows() {
    let ruleset = RulesetIR::from_value(minimal_ruleset()).expect("should load");

    let game = ruleset.game_component.as_ref().expect("game component synthesized");
    assert_eq!(game.tag, ComponentTag::Game);
    let graph = game.workflow_graph.as_ref().expect("game workflow synthesized");
    assert_eq!(graph.nodes.len(), 1, "one turn node");

    let turns: Vec<_> = ruleset.components_with_tag(ComponentTag::Turn).collect();
    assert_eq!(turns.len(), 1);
    let turn_graph = turns[0].workflow_graph.as_ref().expect("turn workflow");
    assert_eq!(turn_graph.nodes.len(), 2, "one node per phase");
    assert_eq!(turns[0].max_turns_per_player, Some(1));

    let phases: Vec<_> = ruleset.components_with_tag(ComponentTag::Phase).collect();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0].property_u64("phase_id"), Some(1));
}

#[test]
fn ignores_unknown_fields_and_field_order() {
    let mut value = minimal_ruleset();
    value["future_field"] = json!({ "anything": true });
    value["turn_structure"]["phases"][0]["unknown"] = json!("ignored");
    assert!(RulesetIR::from_value(value).is_ok());
}

#[test]
fn rejects_duplicate_ids() {
    let mut value = minimal_ruleset();
    value["rules"] = json!([
        { "id": 1, "name": "A", "effects": [] },
        { "id": 1, "name": "B", "effects": [] }
    ]);
    match RulesetIR::from_value(value) {
        Err(MatchError::MalformedRuleset(message)) => {
            assert!(message.contains("duplicate rule id"), "unexpected message: {message}");
        }
        other => panic!("expected MalformedRuleset, got {other:?}"),
    }
}

#[test]
fn rejects_unknown_rule_references() {
    let mut value = minimal_ruleset();
    value["actions"] = json!([
        { "id": 1, "name": "Draw", "execute_rules": [99] }
    ]);
    assert!(matches!(RulesetIR::from_value(value), Err(MatchError::MalformedRuleset(_))));
}

#[test]
fn workflow_graph_validation_catches_bad_edges() {
    let graph: WorkflowGraph = serde_json::from_value(json!({
        "nodes": [{ "id": "a", "name": "A" }],
        "edges": [
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "a" },
            { "edge_type": "simple", "from_node_id": "a", "to_node_id": "missing" }
        ]
    }))
    .expect("graph should parse");
    assert!(graph.validate().is_err());

    let graph: WorkflowGraph = serde_json::from_value(json!({
        "nodes": [{ "id": "a", "name": "A" }],
        "edges": [
            { "edge_type": "simple", "from_node_id": START_NODE_ID, "to_node_id": "a" },
            { "edge_type": "simple", "from_node_id": "a", "to_node_id": END_NODE_ID }
        ]
    }))
    .expect("graph should parse");
    assert!(graph.validate().is_ok());
    assert!(graph.reaches_end("a"));
}

#[test]
fn expressions_parse_and_report_dependencies() {
    let predicate: Predicate = serde_json::from_value(json!({
        "kind": "pred.gt",
        "a": { "kind": "prop.number", "path": ["self", "power"] },
        "b": { "kind": "const.number", "value": 2 }
    }))
    .expect("predicate should parse");
    let deps = predicate.dependencies();
    assert!(deps.contains(&(DYNAMIC_SOURCE.to_string(), "power".to_string())));

    let selector: Selector = serde_json::from_value(json!({
        "kind": "sel.filter",
        "in": { "kind": "sel.zone", "name": "battlefield" },
        "where": {
            "kind": "pred.gt",
            "a": { "kind": "prop.number", "path": ["it", "power"] },
            "b": { "kind": "const.number", "value": 2 }
        }
    }))
    .expect("selector should parse");
    let deps = selector.dependencies();
    assert!(deps.contains(&("zone".to_string(), "battlefield".to_string())));

    let sum: NumExpr = serde_json::from_value(json!({
        "kind": "op.add",
        "a": { "kind": "const.number", "value": 1 },
        "b": { "kind": "const.number", "value": 2 }
    }))
    .expect("num should parse");
    assert!(sum.dependencies().is_empty());
}

#[test]
fn event_types_round_trip_through_strings() {
    assert_eq!(EventType::from("PhaseStarted"), EventType::PhaseStarted);
    assert_eq!(EventType::PhaseStarted.as_str(), "PhaseStarted");
    assert!(EventType::PhaseStarted.is_system());

    let custom = EventType::from("CardExhausted");
    assert_eq!(custom, EventType::Custom("CardExhausted".to_string()));
    assert!(!custom.is_system());

    let serialized = serde_json::to_value(&custom).unwrap();
    assert_eq!(serialized, json!("CardExhausted"));
    let parsed: EventType = serde_json::from_value(serialized).unwrap();
    assert_eq!(parsed, custom);
}

#[test]
fn ruleset_json_schema_includes_top_level_fields() {
    let schema = serde_json::to_value(RulesetIR::json_schema()).expect("schema serializes");
    let properties = schema["properties"].as_object().expect("schema has properties");
    for field in ["version", "turn_structure", "component_definitions", "actions", "rules"] {
        assert!(properties.contains_key(field), "schema missing {field}");
    }
}
