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

//! Pure queries over the ruleset interpreter: which actions a player can
//! take, and with which targets.

use std::collections::BTreeMap;

use data::actions::player_action::PlayerAction;
use data::core::errors::MatchError;
use data::core::primitives::{ComponentId, DefinitionId};
use data::match_states::component::Component;
use data::match_states::match_state::MatchState;
use data::rulesets::action_definition::{
    ActionDefinition, ActionTiming, CostDefinition, InteractionMode, SelectableObjectType,
};
use data::rulesets::component_definition::ComponentTag;
use data::rulesets::ruleset_ir::RulesetIR;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mutations::resources;
use crate::queries::eval::{evaluate_selector, predicate_holds, EvalContext};

/// Valid choices for one of an action's target slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOptions {
    pub id: String,
    pub name: Option<String>,
    pub target_type: SelectableObjectType,
    pub count: u32,
    pub valid_targets: Vec<ComponentId>,
}

/// An action a player can currently take, with UI-ready cost and target
/// descriptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableAction {
    pub id: DefinitionId,
    pub name: String,
    pub description: Option<String>,
    pub timing: ActionTiming,
    /// Total cost by resource name.
    pub costs: BTreeMap<String, i64>,
    pub targets: Vec<TargetOptions>,
    pub ui: Option<Value>,
}

/// Client-side requirements for activating an action on an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRequirements {
    pub needs_button: bool,
    pub needs_drag_target: bool,
    pub needs_additional_selection: bool,
    pub selection_count: usize,
    /// Zone names that accept the drag for drag interactions.
    pub drag_targets: Vec<String>,
}

/// An action available on a selected object, with interaction metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectAction {
    pub id: DefinitionId,
    pub name: String,
    pub description: Option<String>,
    pub interaction_mode: InteractionMode,
    pub costs: BTreeMap<String, i64>,
    pub additional_targets: Vec<TargetOptions>,
    pub ui: Option<Value>,
    pub activation_requirements: ActivationRequirements,
}

/// All actions the player can take in the current state.
///
/// Filters by current phase, evaluates preconditions with the player as
/// `self`, and requires costs to be affordable.
pub fn available_actions(
    ruleset: &RulesetIR,
    state: &MatchState,
    player: ComponentId,
) -> Vec<AvailableAction> {
    ruleset
        .actions
        .iter()
        .filter(|action| can_take_action(ruleset, state, player, action))
        .map(|action| AvailableAction {
            id: action.id,
            name: action.name.clone(),
            description: action.description.clone(),
            timing: action.timing,
            costs: cost_totals(&action.costs),
            targets: target_options(ruleset, state, player, action),
            ui: action.ui.clone(),
        })
        .collect()
}

/// Actions for which the selected object is a valid primary target.
pub fn actions_for_object(
    ruleset: &RulesetIR,
    state: &MatchState,
    player: ComponentId,
    object_kind: SelectableObjectType,
    object_id: ComponentId,
) -> Vec<ObjectAction> {
    ruleset
        .actions
        .iter()
        .filter(|action| {
            matches_primary_target(ruleset, state, player, action, object_kind, object_id)
                && can_take_action(ruleset, state, player, action)
        })
        .map(|action| ObjectAction {
            id: action.id,
            name: action.name.clone(),
            description: action.description.clone(),
            interaction_mode: action.interaction_mode,
            costs: cost_totals(&action.costs),
            additional_targets: target_options(ruleset, state, player, action),
            ui: action.ui.clone(),
            activation_requirements: activation_requirements(action),
        })
        .collect()
}

/// Rechecks phase, preconditions, costs, and target validity for a
/// submitted action.
pub fn validate_action(
    ruleset: &RulesetIR,
    state: &MatchState,
    action: &PlayerAction,
) -> Result<(), MatchError> {
    let Some(definition) = ruleset.action(action.action) else {
        return Err(MatchError::InvalidAction(format!("unknown action {}", action.action)));
    };
    if state.component(action.player_id).map(|c| c.tag) != Some(ComponentTag::Player) {
        return Err(MatchError::InvalidAction("acting component is not a player".to_string()));
    }
    if !can_take_action(ruleset, state, action.player_id, definition) {
        return Err(MatchError::InvalidAction(format!(
            "action {} is not available",
            definition.name
        )));
    }

    for target in &definition.targets {
        let chosen = action.targets.get(&target.id).map(Vec::as_slice).unwrap_or(&[]);
        if chosen.len() > target.count as usize {
            return Err(MatchError::InvalidAction(format!(
                "too many targets for slot {}",
                target.id
            )));
        }
        let ctx = EvalContext::with_source(action.player_id);
        let valid = evaluate_selector(ruleset, state, &ctx, &target.selector).unwrap_or_default();
        for id in chosen {
            if !valid.contains(id) {
                return Err(MatchError::InvalidAction(format!(
                    "target not valid for slot {}",
                    target.id
                )));
            }
        }
    }
    Ok(())
}

fn can_take_action(
    ruleset: &RulesetIR,
    state: &MatchState,
    player: ComponentId,
    action: &ActionDefinition,
) -> bool {
    if !action.phase_ids.is_empty() {
        match state.current_phase_id {
            Some(phase) if action.phase_ids.contains(&phase) => {}
            _ => return false,
        }
    }

    let ctx = EvalContext::with_source(player);
    if !action.preconditions.iter().all(|p| predicate_holds(ruleset, state, &ctx, p)) {
        return false;
    }

    resources::can_pay(ruleset, state, player, &action.costs)
}

fn cost_totals(costs: &[CostDefinition]) -> BTreeMap<String, i64> {
    let mut totals = BTreeMap::new();
    for cost in costs {
        match cost {
            CostDefinition::PayResource { resource, amount } => {
                *totals.entry(resource.clone()).or_insert(0) += amount;
            }
        }
    }
    totals
}

fn target_options(
    ruleset: &RulesetIR,
    state: &MatchState,
    player: ComponentId,
    action: &ActionDefinition,
) -> Vec<TargetOptions> {
    let ctx = EvalContext::with_source(player);
    action
        .targets
        .iter()
        .map(|target| TargetOptions {
            id: target.id.clone(),
            name: target.name.clone(),
            target_type: target.target_type,
            count: target.count,
            valid_targets: evaluate_selector(ruleset, state, &ctx, &target.selector)
                .unwrap_or_default(),
        })
        .collect()
}

fn matches_primary_target(
    ruleset: &RulesetIR,
    state: &MatchState,
    player: ComponentId,
    action: &ActionDefinition,
    object_kind: SelectableObjectType,
    object_id: ComponentId,
) -> bool {
    let Some(primary_kind) = action.primary_target_type else {
        // Actions without a primary target are not activated on objects.
        return false;
    };
    if primary_kind != object_kind {
        return false;
    }
    let Some(object) = state.component(object_id) else {
        return false;
    };
    if !object_matches_kind(object, object_kind) {
        return false;
    }

    match &action.primary_target_selector {
        None => true,
        Some(selector) => {
            let ctx = EvalContext::with_source(player);
            evaluate_selector(ruleset, state, &ctx, selector)
                .map(|valid| valid.contains(&object_id))
                .unwrap_or(false)
        }
    }
}

fn object_matches_kind(object: &Component, kind: SelectableObjectType) -> bool {
    match kind {
        SelectableObjectType::Card => object.tag == ComponentTag::Card,
        SelectableObjectType::Zone => object.tag == ComponentTag::Zone,
        SelectableObjectType::Player => object.tag == ComponentTag::Player,
        SelectableObjectType::Component => true,
    }
}

fn activation_requirements(action: &ActionDefinition) -> ActivationRequirements {
    let drag_targets = action
        .targets
        .iter()
        .filter(|target| target.target_type == SelectableObjectType::Zone)
        .filter_map(|target| match &target.selector {
            data::rulesets::expressions::Selector::Zone { name } => Some(name.clone()),
            _ => None,
        })
        .collect();

    ActivationRequirements {
        needs_button: action.interaction_mode == InteractionMode::Button,
        needs_drag_target: action.interaction_mode == InteractionMode::Drag,
        needs_additional_selection: action.interaction_mode == InteractionMode::MultiSelect,
        selection_count: match action.interaction_mode {
            InteractionMode::MultiSelect => action.targets.len(),
            _ => 0,
        },
        drag_targets,
    }
}
