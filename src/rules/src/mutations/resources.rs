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
use data::core::primitives::ComponentId;
use data::match_states::match_state::MatchState;
use data::rulesets::action_definition::CostDefinition;
use data::rulesets::resource_definition::ResourceDefinition;
use data::rulesets::ruleset_ir::RulesetIR;
use tracing::debug;

/// Finds the resource definition with the given name among a component's
/// templates.
pub fn find_definition<'a>(
    ruleset: &'a RulesetIR,
    state: &MatchState,
    component: ComponentId,
    name: &str,
) -> Option<&'a ResourceDefinition> {
    let definition_id = state.component(component)?.definition_id;
    ruleset.component(definition_id)?.resources.iter().find(|r| r.name == name)
}

/// Adjusts or sets a named resource on a component, clamping to its
/// definition's bounds. Returns false when the component or resource does
/// not exist.
pub fn change_resource(
    ruleset: &RulesetIR,
    state: &mut MatchState,
    component: ComponentId,
    name: &str,
    amount: i64,
    set: Option<i64>,
) -> bool {
    let Some(definition) = find_definition(ruleset, state, component, name).cloned() else {
        return false;
    };
    let Some(instance) = state
        .component_mut(component)
        .and_then(|c| c.resources.get_mut(&definition.id))
    else {
        return false;
    };
    match set {
        Some(value) => instance.set(value, &definition),
        None if amount >= 0 => instance.gain(amount, &definition),
        None => instance.adjust(amount, &definition),
    }
    true
}

/// True if the player can afford every cost in the list.
pub fn can_pay(
    ruleset: &RulesetIR,
    state: &MatchState,
    player: ComponentId,
    costs: &[CostDefinition],
) -> bool {
    costs.iter().all(|cost| match cost {
        CostDefinition::PayResource { resource, amount } => {
            let Some(definition) = find_definition(ruleset, state, player, resource) else {
                return false;
            };
            state
                .component(player)
                .and_then(|c| c.resources.get(&definition.id))
                .map(|instance| instance.can_spend(*amount, definition))
                .unwrap_or(false)
        }
    })
}

/// Deducts costs from the player, verifying affordability first so that a
/// failure leaves no partial payment behind.
pub fn pay(
    ruleset: &RulesetIR,
    state: &mut MatchState,
    player: ComponentId,
    costs: &[CostDefinition],
) -> Result<(), MatchError> {
    if !can_pay(ruleset, state, player, costs) {
        return Err(MatchError::InvalidAction("cannot pay action costs".to_string()));
    }
    for cost in costs {
        match cost {
            CostDefinition::PayResource { resource, amount } => {
                let Some(definition) =
                    find_definition(ruleset, state, player, resource).cloned()
                else {
                    return Err(MatchError::InvalidAction(format!(
                        "player has no resource named {resource}"
                    )));
                };
                let spent = state
                    .component_mut(player)
                    .and_then(|c| c.resources.get_mut(&definition.id))
                    .map(|instance| instance.spend(*amount, &definition))
                    .unwrap_or(false);
                if !spent {
                    return Err(MatchError::InvalidAction(format!(
                        "cannot spend {amount} {resource}"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Turn-boundary housekeeping: resets per-turn tracking and applies
/// regeneration on every live component's resources.
pub fn turn_rollover(ruleset: &RulesetIR, state: &mut MatchState) {
    let ids: Vec<ComponentId> = state.components.iter().map(|c| c.id).collect();
    for id in ids {
        let Some(definition_id) = state.component(id).map(|c| c.definition_id) else {
            continue;
        };
        let Some(definition) = ruleset.component(definition_id) else {
            continue;
        };
        for template in &definition.resources {
            if let Some(instance) =
                state.component_mut(id).and_then(|c| c.resources.get_mut(&template.id))
            {
                instance.reset_turn_tracking();
                if template.regeneration_per_turn != 0 {
                    debug!(component = ?id, resource = %template.name, "Regenerating resource");
                    instance.gain(template.regeneration_per_turn, template);
                }
            }
        }
    }
}
