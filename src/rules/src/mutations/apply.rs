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

//! Applies resolved events to match state.
//!
//! Only state-change semantics live here. Workflow-control events
//! (`NextPhase`, `NextTurn`, `EndGame`, ...) are interpreted by the match
//! actor, which owns workflow progression; from this module's point of view
//! they only land in the log.

use data::core::primitives::ComponentId;
use data::match_states::event::{Event, EventStatus, EventType};
use data::match_states::match_state::{MatchState, MatchStatus};
use data::rulesets::ruleset_ir::RulesetIR;
use serde_json::Value;
use tracing::{debug, warn};

use crate::mutations::resources;

/// Applies an event's state mutation and appends it to the event log.
///
/// Missing references are logged and skipped rather than failing the match:
/// a slightly malformed ruleset should still make progress.
pub fn apply(ruleset: &RulesetIR, state: &mut MatchState, event: &Event) {
    debug!(event_type = %event.event_type, order = event.order, "Applying event");

    match &event.event_type {
        EventType::MatchStarted => {
            state.status = MatchStatus::Playing;
        }
        EventType::GameEnded => {
            state.status = MatchStatus::GameOver;
        }
        EventType::CardMoved => {
            apply_card_moved(state, event);
        }
        EventType::ResourceChanged => {
            apply_resource_changed(ruleset, state, event);
        }
        EventType::DamageDealt => {
            apply_damage_dealt(ruleset, state, event);
        }
        EventType::Custom(name) if name == "PropertySet" => {
            apply_property_set(state, event);
        }
        // Control-plane and notification events carry no direct state
        // mutation.
        _ => {}
    }

    let mut logged = event.clone();
    logged.status = EventStatus::Applied;
    state.event_log.push(logged);
}

fn component_arg(event: &Event, keys: &[&str]) -> Option<ComponentId> {
    for key in keys {
        if let Some(value) = event.payload.get(*key) {
            if let Ok(id) = serde_json::from_value::<ComponentId>(value.clone()) {
                return Some(id);
            }
        }
    }
    None
}

fn apply_card_moved(state: &mut MatchState, event: &Event) {
    let Some(card) = component_arg(event, &["card_id"]) else {
        warn!("CardMoved without a resolvable card_id, skipping");
        return;
    };
    let Some(to_zone) = event.payload.get("to_zone").and_then(Value::as_str) else {
        warn!("CardMoved without a to_zone, skipping");
        return;
    };
    let controller = component_arg(event, &["player_id"]);
    if !state.components.move_to_zone(card, to_zone, controller) {
        warn!(?card, "CardMoved references an unknown card, skipping");
    }
}

fn apply_resource_changed(ruleset: &RulesetIR, state: &mut MatchState, event: &Event) {
    let Some(target) = component_arg(event, &["component_id", "player_id"]) else {
        warn!("ResourceChanged without a resolvable target, skipping");
        return;
    };
    let Some(name) = event.payload.get("resource").and_then(Value::as_str) else {
        warn!("ResourceChanged without a resource name, skipping");
        return;
    };

    let set = event.payload.get("set").and_then(Value::as_i64);
    let amount = event.payload.get("amount").and_then(Value::as_i64).unwrap_or(0);
    if !resources::change_resource(ruleset, state, target, name, amount, set) {
        warn!(?target, name, "ResourceChanged could not resolve the resource, skipping");
    }
}

fn apply_damage_dealt(ruleset: &RulesetIR, state: &mut MatchState, event: &Event) {
    let Some(target) = component_arg(event, &["target"]) else {
        warn!("DamageDealt without a resolvable target, skipping");
        return;
    };
    let amount = event.payload.get("amount").and_then(Value::as_i64).unwrap_or(0);

    // Damage lands on the target's life resource when it has one.
    if !resources::change_resource(ruleset, state, target, "life", -amount, None) {
        warn!(?target, "DamageDealt target has no life resource, skipping");
    }
}

fn apply_property_set(state: &mut MatchState, event: &Event) {
    let Some(target) = component_arg(event, &["component_id"]) else {
        warn!("PropertySet without a resolvable component, skipping");
        return;
    };
    let Some(key) = event.payload.get("key").and_then(Value::as_str) else {
        warn!("PropertySet without a key, skipping");
        return;
    };
    let value = event.payload.get("value").cloned().unwrap_or(Value::Null);
    match state.component_mut(target) {
        Some(component) => {
            component.properties.insert(key.to_string(), value);
        }
        None => warn!(?target, "PropertySet references an unknown component, skipping"),
    }
}
