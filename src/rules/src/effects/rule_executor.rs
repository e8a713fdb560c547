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

//! Runs rule effect pipelines, producing events.
//!
//! The executor never mutates state directly: `modify_state` primitives are
//! realized by emitting the corresponding state-change events, which the
//! match actor pushes onto the stack and applies in order.

use data::core::errors::MatchError;
use data::core::primitives::{ComponentId, DefinitionId};
use data::match_states::event::{payload_object, Event, EventType, ObjectRef};
use data::match_states::match_state::MatchState;
use data::rulesets::rule_definition::{EffectDefinition, StateOp};
use data::rulesets::ruleset_ir::RulesetIR;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use utils::outcome::Value as Out;

use crate::queries::eval::{evaluate_predicate, evaluate_selector, EvalContext};

/// Cap on effect pipeline recursion, matching the resolution loop's guard.
pub const MAX_EFFECT_DEPTH: u32 = 100;

/// Executes a rule's effect pipeline with an empty parameter binding.
pub fn execute_rule(
    ruleset: &RulesetIR,
    state: &MatchState,
    rule_id: DefinitionId,
    caused_by: ObjectRef,
) -> Out<Vec<Event>> {
    execute_rule_at_depth(ruleset, state, rule_id, &Map::new(), caused_by, 0)
}

/// Runs a trigger's or watcher's effect pipeline.
pub fn run_effects(
    ruleset: &RulesetIR,
    state: &MatchState,
    effects: &[EffectDefinition],
    caused_by: ObjectRef,
) -> Out<Vec<Event>> {
    process_effects(ruleset, state, effects, &Map::new(), caused_by, 0)
}

fn execute_rule_at_depth(
    ruleset: &RulesetIR,
    state: &MatchState,
    rule_id: DefinitionId,
    params: &Map<String, Value>,
    caused_by: ObjectRef,
    depth: u32,
) -> Out<Vec<Event>> {
    check_depth(depth)?;
    let Some(rule) = ruleset.rule(rule_id) else {
        // A ruleset bug, not a fatal condition: drop the invocation and
        // keep resolving.
        warn!(%rule_id, "rule not found, skipping execution");
        return Ok(vec![]);
    };
    debug!(%rule_id, rule = %rule.name, "Executing rule");

    // Bind declared parameter defaults underneath the caller's arguments.
    let mut bound = Map::new();
    for parameter in &rule.parameters {
        if let Some(default) = &parameter.default {
            bound.insert(parameter.name.clone(), default.clone());
        }
    }
    for (key, value) in params {
        bound.insert(key.clone(), value.clone());
    }

    let mut events = process_effects(ruleset, state, &rule.effects, &bound, caused_by, depth + 1)?;
    events.push(
        Event::new(EventType::RuleExecuted, payload_object(json!({ "rule_id": rule_id.0 })))
            .caused_by(caused_by),
    );
    Ok(events)
}

fn process_effects(
    ruleset: &RulesetIR,
    state: &MatchState,
    effects: &[EffectDefinition],
    params: &Map<String, Value>,
    caused_by: ObjectRef,
    depth: u32,
) -> Out<Vec<Event>> {
    check_depth(depth)?;
    let mut events = vec![];

    for effect in effects {
        match effect {
            EffectDefinition::ExecuteRule { rule_id, rule_params } => {
                let substituted = substitute_params(rule_params, params);
                events.extend(execute_rule_at_depth(
                    ruleset,
                    state,
                    *rule_id,
                    &substituted,
                    caused_by,
                    depth + 1,
                )?);
            }
            EffectDefinition::EmitEvent { event_type, event_payload } => {
                let payload = substitute_params(event_payload, params);
                events.push(
                    Event::new(EventType::from(event_type.as_str()), payload)
                        .caused_by(caused_by),
                );
            }
            EffectDefinition::Sequence { actions } => {
                events.extend(process_effects(
                    ruleset,
                    state,
                    actions,
                    params,
                    caused_by,
                    depth + 1,
                )?);
            }
            EffectDefinition::If { condition, then_actions, else_actions } => {
                let ctx = EvalContext::with_source(caused_by.id);
                let branch = if evaluate_predicate(ruleset, state, &ctx, condition)? {
                    then_actions
                } else {
                    else_actions
                };
                events.extend(process_effects(ruleset, state, branch, params, caused_by, depth + 1)?);
            }
            EffectDefinition::ForEach { selector, body } => {
                let ctx = EvalContext::with_source(caused_by.id);
                for target in evaluate_selector(ruleset, state, &ctx, selector)? {
                    // Rebind `self`/`it` and the cause attribution to the
                    // iterated component.
                    let rebound = ObjectRef::component(target);
                    events.extend(process_effects(
                        ruleset, state, body, params, rebound,
                        depth + 1,
                    )?);
                }
            }
            EffectDefinition::ModifyState { op, args } => {
                let args = substitute_params(args, params);
                events.extend(modify_state(state, *op, &args, caused_by)?);
            }
        }
    }

    Ok(events)
}

fn check_depth(depth: u32) -> Out<()> {
    if depth > MAX_EFFECT_DEPTH {
        return Err(MatchError::ResolutionOverflow(format!(
            "effect pipeline exceeded depth {MAX_EFFECT_DEPTH}"
        ))
        .into());
    }
    Ok(())
}

/// Replaces `"$name"` string values with the bound parameter of that name.
fn substitute_params(
    values: &Map<String, Value>,
    params: &Map<String, Value>,
) -> Map<String, Value> {
    values
        .iter()
        .map(|(key, value)| {
            let substituted = match value {
                Value::String(s) if s.starts_with('$') => {
                    params.get(&s[1..]).cloned().unwrap_or_else(|| value.clone())
                }
                _ => value.clone(),
            };
            (key.clone(), substituted)
        })
        .collect()
}

/// Realizes a `modify_state` primitive as its state-change event.
fn modify_state(
    state: &MatchState,
    op: StateOp,
    args: &Map<String, Value>,
    caused_by: ObjectRef,
) -> Out<Vec<Event>> {
    match op {
        StateOp::MoveCard => {
            let from_zone = str_arg(args, "from_zone").unwrap_or("deck");
            let to_zone = str_arg(args, "to_zone").unwrap_or("hand");
            let player = resolve_player(args.get("player"), caused_by);
            let card = match args.get("card_id") {
                Some(value) if value != &Value::String("top_card".to_string()) => {
                    serde_json::from_value::<ComponentId>(value.clone()).ok()
                }
                _ => state.components.top_of_zone(from_zone, player),
            };
            let Some(card) = card else {
                // Nothing to move (empty zone); the effect fizzles.
                debug!(from_zone, "move_card found no card, skipping");
                return Ok(vec![]);
            };
            Ok(vec![Event::new(
                EventType::CardMoved,
                payload_object(json!({
                    "card_id": card,
                    "from_zone": from_zone,
                    "to_zone": to_zone,
                    "player_id": player,
                })),
            )
            .caused_by(caused_by)])
        }
        StateOp::ChangeResource => {
            let Some(resource) = str_arg(args, "resource") else {
                warn!("change_resource without a resource name, skipping");
                return Ok(vec![]);
            };
            let mut payload = Map::new();
            payload.insert("resource".to_string(), Value::from(resource));
            if let Some(amount) = args.get("amount") {
                payload.insert("amount".to_string(), amount.clone());
            }
            if let Some(set) = args.get("set") {
                payload.insert("set".to_string(), set.clone());
            }

            let targets: Vec<ComponentId> = match str_arg(args, "target") {
                Some("each_player") => state.player_ids.clone(),
                _ => match resolve_player(args.get("player"), caused_by) {
                    Some(player) => vec![player],
                    None => vec![caused_by.id],
                },
            };
            Ok(targets
                .into_iter()
                .map(|target| {
                    let mut payload = payload.clone();
                    payload.insert(
                        "component_id".to_string(),
                        serde_json::to_value(target).unwrap_or(Value::Null),
                    );
                    Event::new(EventType::ResourceChanged, payload).caused_by(caused_by)
                })
                .collect())
        }
        StateOp::DealDamage => {
            let amount = args.get("amount").and_then(Value::as_i64).unwrap_or(1);
            let targets: Vec<ComponentId> = match str_arg(args, "target") {
                Some("opponent") => state.opponents_of(caused_by.id),
                Some("self") | None => vec![caused_by.id],
                Some(_) => match args.get("target") {
                    Some(value) => serde_json::from_value::<ComponentId>(value.clone())
                        .map(|id| vec![id])
                        .unwrap_or_default(),
                    None => vec![],
                },
            };
            Ok(targets
                .into_iter()
                .map(|target| {
                    Event::new(
                        EventType::DamageDealt,
                        payload_object(json!({
                            "target": target,
                            "amount": amount,
                            "source": caused_by.id,
                        })),
                    )
                    .caused_by(caused_by)
                })
                .collect())
        }
        StateOp::SetProperty => {
            let Some(key) = str_arg(args, "key") else {
                warn!("set_property without a key, skipping");
                return Ok(vec![]);
            };
            let target = resolve_player(args.get("component"), caused_by).unwrap_or(caused_by.id);
            Ok(vec![Event::new(
                EventType::from("PropertySet"),
                payload_object(json!({
                    "component_id": target,
                    "key": key,
                    "value": args.get("value").cloned().unwrap_or(Value::Null),
                })),
            )
            .caused_by(caused_by)])
        }
    }
}

fn str_arg<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Resolves a player argument: `"self"` or absent binds the cause, an
/// explicit id binds that component.
fn resolve_player(value: Option<&Value>, caused_by: ObjectRef) -> Option<ComponentId> {
    match value {
        None => Some(caused_by.id),
        Some(Value::String(s)) if s == "self" => Some(caused_by.id),
        Some(other) => serde_json::from_value::<ComponentId>(other.clone()).ok(),
    }
}
