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

use data::core::primitives::{ComponentId, MatchId};
use data::match_states::component::ComponentStatus;
use data::match_states::event::{payload_object, Event, EventType, ObjectRef};
use data::match_states::match_state::MatchState;
use data::rulesets::component_definition::ComponentDefinition;
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::trigger_definition::TriggerDefinition;
use rules::triggers::event_bus::EventBus;
use serde_json::{json, Map};
use uuid::Uuid;

fn ruleset() -> RulesetIR {
    RulesetIR::from_value(json!({
        "version": "1.0.0",
        "turn_structure": { "phases": [{ "id": 1, "name": "Main" }] }
    }))
    .expect("ruleset should load")
}

fn trigger(value: serde_json::Value) -> TriggerDefinition {
    serde_json::from_value(value).expect("trigger should parse")
}

fn definition(id: u32, name: &str, tag: &str) -> ComponentDefinition {
    serde_json::from_value(json!({ "id": id, "name": name, "component_type": tag }))
        .expect("definition should parse")
}

/// Two players with the active player seated first.
fn state_with_players() -> (MatchState, ComponentId, ComponentId) {
    let mut state = MatchState::new(MatchId(Uuid::nil()), 1);
    let player_def = definition(1, "Player", "player");
    let one = state.components.create(&player_def, None, None);
    let two = state.components.create(&player_def, None, None);
    state.player_ids = vec![one, two];
    state.active_player = Some(one);
    (state, one, two)
}

#[test]
fn dispatch_matches_event_type_and_payload_filters() {
    let ruleset = ruleset();
    let (state, one, _) = state_with_players();
    let mut bus = EventBus::default();
    bus.subscribe(
        EventType::PhaseStarted,
        trigger(json!({
            "id": 1,
            "when": { "eventType": "PhaseStarted", "filters": { "phase_id": 1 } },
            "effects": []
        })),
        one,
        Map::new(),
    );

    let matching =
        Event::new(EventType::PhaseStarted, payload_object(json!({ "phase_id": 1 })));
    assert_eq!(bus.dispatch(&ruleset, &state, &matching).len(), 1);

    let wrong_payload =
        Event::new(EventType::PhaseStarted, payload_object(json!({ "phase_id": 2 })));
    assert!(bus.dispatch(&ruleset, &state, &wrong_payload).is_empty());

    let wrong_type = Event::new(EventType::TurnStarted, payload_object(json!({ "phase_id": 1 })));
    assert!(bus.dispatch(&ruleset, &state, &wrong_type).is_empty());
}

#[test]
fn dispatch_returns_registration_order_and_is_deterministic() {
    let ruleset = ruleset();
    let (state, one, two) = state_with_players();
    let mut bus = EventBus::default();
    for (index, component) in [one, two, one].into_iter().enumerate() {
        bus.subscribe(
            EventType::TurnEnded,
            trigger(json!({
                "id": index + 1,
                "when": { "eventType": "TurnEnded" },
                "effects": []
            })),
            component,
            Map::new(),
        );
    }
    // Wildcard subscriptions come after type-specific ones.
    bus.subscribe(
        EventType::from("*"),
        trigger(json!({ "id": 9, "when": { "eventType": "*" }, "effects": [] })),
        one,
        Map::new(),
    );

    let event = Event::new(EventType::TurnEnded, Map::new());
    let first = bus.dispatch(&ruleset, &state, &event);
    let second = bus.dispatch(&ruleset, &state, &event);
    let ids: Vec<u32> = first.iter().map(|r| r.trigger_id.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 9]);
    assert_eq!(first, second, "dispatch must be a pure function of its inputs");
}

#[test]
fn scope_controls_caused_by_fanout() {
    let ruleset = ruleset();
    let (state, one, two) = state_with_players();
    let mut bus = EventBus::default();
    bus.subscribe(
        EventType::TurnEnded,
        trigger(json!({
            "id": 1,
            "when": { "eventType": "TurnEnded" },
            "scope": "all",
            "effects": []
        })),
        one,
        Map::new(),
    );
    bus.subscribe(
        EventType::TurnEnded,
        trigger(json!({
            "id": 2,
            "when": { "eventType": "TurnEnded" },
            "scope": "opponent",
            "effects": []
        })),
        one,
        Map::new(),
    );

    let event =
        Event::new(EventType::TurnEnded, Map::new()).caused_by(ObjectRef::player(one));
    let reactions = bus.dispatch(&ruleset, &state, &event);

    let all: Vec<_> =
        reactions.iter().filter(|r| r.trigger_id.0 == 1).map(|r| r.caused_by.id).collect();
    assert_eq!(all, vec![one, two], "scope all binds every player");

    let opponents: Vec<_> =
        reactions.iter().filter(|r| r.trigger_id.0 == 2).map(|r| r.caused_by.id).collect();
    assert_eq!(opponents, vec![two], "scope opponent binds the other side");
}

#[test]
fn inactive_components_are_not_dispatched_to() {
    let ruleset = ruleset();
    let (mut state, one, _) = state_with_players();
    let mut bus = EventBus::default();
    bus.subscribe(
        EventType::TurnEnded,
        trigger(json!({ "id": 1, "when": { "eventType": "TurnEnded" }, "effects": [] })),
        one,
        Map::new(),
    );

    let event = Event::new(EventType::TurnEnded, Map::new());
    assert_eq!(bus.dispatch(&ruleset, &state, &event).len(), 1);

    state.component_mut(one).unwrap().status = ComponentStatus::Inactive;
    assert!(bus.dispatch(&ruleset, &state, &event).is_empty());
}

#[test]
fn activation_context_restricts_zones() {
    let ruleset = ruleset();
    let (mut state, player, _) = state_with_players();
    let card_def = definition(3, "Card", "card");
    let card = state.components.create(&card_def, Some("deck".to_string()), Some(player));

    let mut bus = EventBus::default();
    bus.subscribe(
        EventType::TurnStarted,
        trigger(json!({
            "id": 1,
            "when": { "eventType": "TurnStarted" },
            "active_while": { "zones": ["battlefield"] },
            "effects": []
        })),
        card,
        Map::new(),
    );

    let event = Event::new(EventType::TurnStarted, Map::new());
    assert!(bus.dispatch(&ruleset, &state, &event).is_empty(), "card is still in the deck");

    state.components.move_to_zone(card, "battlefield", None);
    assert_eq!(bus.dispatch(&ruleset, &state, &event).len(), 1);
}

#[test]
fn unsubscribe_all_from_component_clears_subscriptions() {
    let ruleset = ruleset();
    let (state, one, _) = state_with_players();
    let mut bus = EventBus::default();
    for id in 1..=3 {
        bus.subscribe(
            EventType::TurnEnded,
            trigger(json!({ "id": id, "when": { "eventType": "TurnEnded" }, "effects": [] })),
            one,
            Map::new(),
        );
    }
    assert_eq!(bus.subscription_count(), 3);

    let removed = bus.unsubscribe_all_from_component(one);
    assert_eq!(removed.len(), 3);
    assert_eq!(bus.subscription_count(), 0);
    let event = Event::new(EventType::TurnEnded, Map::new());
    assert!(bus.dispatch(&ruleset, &state, &event).is_empty());
}
