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

//! Load-time ruleset checks and default workflow synthesis.
//!
//! Validation covers only what the executor depends on: id uniqueness,
//! cross-reference resolution, and workflow graph well-formedness. Deeper
//! semantic validation belongs to the authoring pipeline.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::core::errors::MatchError;
use crate::core::primitives::DefinitionId;
use crate::rulesets::component_definition::{ComponentDefinition, ComponentTag};
use crate::rulesets::rule_definition::EffectDefinition;
use crate::rulesets::ruleset_ir::RulesetIR;
use crate::rulesets::trigger_definition::TriggerDefinition;
use crate::rulesets::workflow::{
    EdgeBase, WorkflowEdge, WorkflowGraph, WorkflowNode, END_NODE_ID, START_NODE_ID,
};

/// Validates the parts of a ruleset the executor depends on.
pub fn validate(ruleset: &RulesetIR) -> Result<(), MatchError> {
    check_unique_ids(ruleset)?;

    let game = ruleset
        .game_component
        .as_ref()
        .ok_or_else(|| malformed("ruleset declares no game component"))?;
    if game.tag != ComponentTag::Game {
        return Err(malformed("game_component must have component_type \"game\""));
    }
    if game.workflow_graph.is_none() {
        return Err(malformed("game component declares no workflow graph"));
    }

    for definition in all_definitions(ruleset) {
        if let Some(graph) = &definition.workflow_graph {
            graph
                .validate()
                .map_err(|e| malformed(&format!("workflow of {}: {e}", definition.name)))?;
            for node in &graph.nodes {
                if let Some(child) = node.component_definition_id {
                    if ruleset.component(child).is_none() {
                        return Err(malformed(&format!(
                            "workflow node {} references unknown component definition {child}",
                            node.id
                        )));
                    }
                }
            }
        }
        for trigger in &definition.triggers {
            check_trigger(ruleset, trigger)?;
        }
    }

    for trigger in &ruleset.system_triggers {
        check_trigger(ruleset, trigger)?;
    }

    for action in &ruleset.actions {
        for rule_id in &action.execute_rules {
            if ruleset.rule(*rule_id).is_none() {
                return Err(malformed(&format!(
                    "action {} references unknown rule {rule_id}",
                    action.name
                )));
            }
        }
    }

    for rule in &ruleset.rules {
        check_effects(ruleset, &rule.effects)?;
    }

    Ok(())
}

fn malformed(message: &str) -> MatchError {
    MatchError::MalformedRuleset(message.to_string())
}

fn all_definitions(ruleset: &RulesetIR) -> impl Iterator<Item = &ComponentDefinition> {
    ruleset.game_component.iter().chain(ruleset.component_definitions.iter())
}

fn check_unique_ids(ruleset: &RulesetIR) -> Result<(), MatchError> {
    let mut seen = HashSet::new();
    for definition in all_definitions(ruleset) {
        if !seen.insert(definition.id) {
            return Err(malformed(&format!("duplicate component definition id {}", definition.id)));
        }
    }

    let mut seen = HashSet::new();
    for action in &ruleset.actions {
        if !seen.insert(action.id) {
            return Err(malformed(&format!("duplicate action id {}", action.id)));
        }
    }

    let mut seen = HashSet::new();
    for rule in &ruleset.rules {
        if !seen.insert(rule.id) {
            return Err(malformed(&format!("duplicate rule id {}", rule.id)));
        }
    }

    let mut seen = HashSet::new();
    for phase in &ruleset.turn_structure.phases {
        if !seen.insert(phase.id) {
            return Err(malformed(&format!("duplicate phase id {}", phase.id)));
        }
    }

    Ok(())
}

fn check_trigger(ruleset: &RulesetIR, trigger: &TriggerDefinition) -> Result<(), MatchError> {
    if trigger.is_state_based() {
        if trigger.condition.is_none() {
            return Err(malformed(&format!(
                "state-based trigger {} declares no condition",
                trigger.id
            )));
        }
    } else if trigger.when.is_none() {
        return Err(malformed(&format!("event trigger {} declares no when filter", trigger.id)));
    }
    check_effects(ruleset, &trigger.effects)
}

fn check_effects(ruleset: &RulesetIR, effects: &[EffectDefinition]) -> Result<(), MatchError> {
    for effect in effects {
        match effect {
            EffectDefinition::ExecuteRule { rule_id, .. } => {
                if ruleset.rule(*rule_id).is_none() {
                    return Err(malformed(&format!("effect references unknown rule {rule_id}")));
                }
            }
            EffectDefinition::Sequence { actions } => check_effects(ruleset, actions)?,
            EffectDefinition::If { then_actions, else_actions, .. } => {
                check_effects(ruleset, then_actions)?;
                check_effects(ruleset, else_actions)?;
            }
            EffectDefinition::ForEach { body, .. } => check_effects(ruleset, body)?,
            EffectDefinition::EmitEvent { .. } | EffectDefinition::ModifyState { .. } => {}
        }
    }
    Ok(())
}

/// Synthesizes the default Game → Turn → Phase workflow hierarchy from the
/// declarative turn structure.
///
/// Rulesets that ship an explicit workflow on the game component are left
/// untouched. Otherwise a Turn definition whose workflow chains the declared
/// phases (starting from `initial_phase_id`) is generated, along with one
/// Phase definition per declared phase, and the game component's workflow
/// becomes start → turn → end.
pub fn synthesize_workflows(ruleset: &mut RulesetIR) {
    let has_explicit_workflow = ruleset
        .game_component
        .as_ref()
        .and_then(|g| g.workflow_graph.as_ref())
        .map(|w| !w.is_empty())
        .unwrap_or(false);
    if has_explicit_workflow {
        return;
    }

    let mut next_id = ruleset.max_definition_id() + 1;
    let mut allocate = || {
        let id = DefinitionId(next_id);
        next_id += 1;
        id
    };

    // Phase chain order: the initial phase first, then the phases declared
    // after it.
    let phases = &ruleset.turn_structure.phases;
    let start_index = ruleset
        .turn_structure
        .initial_phase_id
        .and_then(|initial| phases.iter().position(|p| p.id == initial))
        .unwrap_or(0);
    let ordered: Vec<_> = phases.iter().skip(start_index).cloned().collect();

    let mut phase_defs = Vec::new();
    for phase in &ordered {
        let mut properties = Map::new();
        properties.insert("phase_id".to_string(), Value::from(phase.id.0));
        phase_defs.push(ComponentDefinition {
            id: allocate(),
            name: phase.name.clone(),
            description: phase.description.clone(),
            tag: ComponentTag::Phase,
            sub_component_ids: vec![],
            triggers: vec![],
            resources: vec![],
            properties,
            workflow_graph: Some(WorkflowGraph::default()),
            max_players: None,
            max_turns_per_player: None,
        });
    }

    let game_graph = if phase_defs.is_empty() {
        // Nothing to play through: the game workflow runs straight to the
        // end node.
        WorkflowGraph {
            nodes: vec![],
            edges: vec![simple_edge(START_NODE_ID, END_NODE_ID)],
        }
    } else {
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for (index, def) in phase_defs.iter().enumerate() {
            let node_id = format!("phase_{}", def.id);
            let from = if index == 0 {
                START_NODE_ID.to_string()
            } else {
                format!("phase_{}", phase_defs[index - 1].id)
            };
            edges.push(simple_edge(&from, &node_id));
            nodes.push(WorkflowNode {
                id: node_id,
                name: def.name.clone(),
                node_type: crate::rulesets::workflow::NodeType::Intermediate,
                component_definition_id: Some(def.id),
                metadata: Map::new(),
                available_input_ids: vec![],
            });
        }
        let last = format!("phase_{}", phase_defs[phase_defs.len() - 1].id);
        edges.push(simple_edge(&last, END_NODE_ID));
        let turn_graph = WorkflowGraph { nodes, edges };

        let turn_def = ComponentDefinition {
            id: allocate(),
            name: "Turn".to_string(),
            description: None,
            tag: ComponentTag::Turn,
            sub_component_ids: phase_defs.iter().map(|d| d.id).collect(),
            triggers: vec![],
            resources: vec![],
            properties: Map::new(),
            workflow_graph: Some(turn_graph),
            max_players: None,
            max_turns_per_player: ruleset.turn_structure.max_turns_per_player,
        };
        let turn_def_id = turn_def.id;

        let graph = WorkflowGraph {
            nodes: vec![WorkflowNode {
                id: "turn".to_string(),
                name: "Turn".to_string(),
                node_type: crate::rulesets::workflow::NodeType::Intermediate,
                component_definition_id: Some(turn_def_id),
                metadata: Map::new(),
                available_input_ids: vec![],
            }],
            edges: vec![simple_edge(START_NODE_ID, "turn"), simple_edge("turn", END_NODE_ID)],
        };
        ruleset.component_definitions.push(turn_def);
        graph
    };

    ruleset.component_definitions.append(&mut phase_defs);

    match &mut ruleset.game_component {
        Some(game) => game.workflow_graph = Some(game_graph),
        None => {
            ruleset.game_component = Some(ComponentDefinition {
                id: allocate(),
                name: "Game".to_string(),
                description: None,
                tag: ComponentTag::Game,
                sub_component_ids: vec![],
                triggers: vec![],
                resources: vec![],
                properties: Map::new(),
                workflow_graph: Some(game_graph),
                max_players: None,
                max_turns_per_player: None,
            });
        }
    }
}

fn simple_edge(from: &str, to: &str) -> WorkflowEdge {
    WorkflowEdge::Simple {
        base: EdgeBase {
            from_node_id: from.to_string(),
            to_node_id: to.to_string(),
            priority: 0,
            metadata: Map::new(),
        },
    }
}
