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

use data::core::primitives::MatchId;
use data::match_states::event::{Event, EventType};
use data::match_states::match_state::MatchState;
use data::match_states::registries::{EventRegistry, ReactionRegistry};
use data::match_states::resource_state::ResourceState;
use data::match_states::stack::{ResolutionStack, StackRef};
use data::rulesets::component_definition::ComponentDefinition;
use data::rulesets::resource_definition::ResourceDefinition;
use serde_json::{json, Map};
use uuid::Uuid;

fn definition(id: u32, name: &str, tag: &str) -> ComponentDefinition {
    serde_json::from_value(json!({
        "id": id,
        "name": name,
        "component_type": tag,
    }))
    .expect("definition should parse")
}

fn resource(id: u32, json_extra: serde_json::Value) -> ResourceDefinition {
    let mut base = json!({ "id": id, "name": "mana", "description": "test" });
    if let (Some(base_map), serde_json::Value::Object(extra)) = (base.as_object_mut(), json_extra)
    {
        base_map.extend(extra);
    }
    serde_json::from_value(base).expect("resource should parse")
}

fn new_state(seed: u64) -> MatchState {
    MatchState::new(MatchId(Uuid::nil()), seed)
}

#[test]
fn event_registry_assigns_strictly_increasing_ids() {
    let mut registry = EventRegistry::default();
    let mut previous = 0;
    for _ in 0..10 {
        let id = registry.register(Event::new(EventType::MatchStarted, Map::new()));
        assert!(id.0 > previous, "id {id} not greater than {previous}");
        previous = id.0;
    }
    // Ids remain monotonic across unregistration.
    let survivor = registry.register(Event::new(EventType::TurnStarted, Map::new()));
    registry.unregister(survivor);
    let next = registry.register(Event::new(EventType::TurnEnded, Map::new()));
    assert!(next.0 > survivor.0);
}

#[test]
fn reaction_registry_reclaims_storage_on_unregister() {
    let mut registry = ReactionRegistry::default();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    // Reactions are built by the bus in practice; registry behavior only
    // depends on ids.
    let reaction: data::match_states::event::Reaction = serde_json::from_value(json!({
        "id": 0,
        "trigger_id": 1,
        "when": null,
        "effects": [],
        "timing": "post",
        "caused_by": serde_json::to_value(data::match_states::event::ObjectRef::component(
            Default::default()
        ))
        .unwrap(),
        "source": serde_json::to_value(data::core::primitives::ComponentId::default()).unwrap(),
    }))
    .expect("reaction should parse");
    let id = registry.register(reaction);
    assert_eq!(registry.len(), 1);
    assert!(registry.get(id).is_some());
    registry.unregister(id);
    assert!(registry.get(id).is_none());
    assert!(registry.is_empty());
}

#[test]
fn stack_is_lifo_and_orders_are_monotonic() {
    let mut registry = EventRegistry::default();
    let mut stack = ResolutionStack::default();

    let first = registry.register(Event::new(EventType::MatchStarted, Map::new()));
    let second = registry.register(Event::new(EventType::TurnStarted, Map::new()));
    let o1 = stack.push_ref(StackRef::Event(first));
    let o2 = stack.push_ref(StackRef::Event(second));
    assert!(o1 < o2);

    // The later push pops first.
    assert_eq!(stack.pop().map(|i| i.reference), Some(StackRef::Event(second)));
    assert_eq!(stack.pop().map(|i| i.reference), Some(StackRef::Event(first)));
    assert!(stack.is_empty());

    // The counter never goes backwards, even across pops.
    let third = registry.register(Event::new(EventType::TurnEnded, Map::new()));
    let o3 = stack.push_ref(StackRef::Event(third));
    assert!(o3 > o2);
}

#[test]
fn resource_respects_bounds_and_per_turn_cap() {
    let definition =
        resource(1, json!({ "starting_amount": 5, "max_amount": 10, "min_amount": 0, "max_per_turn": 3 }));
    let mut state = ResourceState::new(&definition);
    assert_eq!(state.current, 5);

    // Spending beyond the per-turn cap is rejected without mutation.
    assert!(!state.spend(4, &definition));
    assert_eq!(state.current, 5);
    assert!(state.spend(3, &definition));
    assert_eq!(state.current, 2);
    assert_eq!(state.spent_this_turn, 3);
    assert!(!state.can_spend(1, &definition));

    state.reset_turn_tracking();
    assert!(state.can_spend(1, &definition));

    // Gains clamp to the maximum.
    state.gain(100, &definition);
    assert_eq!(state.current, 10);

    // Sets clamp to the minimum.
    state.set(-5, &definition);
    assert_eq!(state.current, 0);
}

#[test]
fn components_index_zones_and_never_reuse_ids() {
    let mut state = new_state(7);
    let player_def = definition(1, "Player", "player");
    let card_def = definition(2, "Card", "card");

    let player = state.components.create(&player_def, None, None);
    let a = state.components.create(&card_def, Some("deck".to_string()), Some(player));
    let b = state.components.create(&card_def, Some("deck".to_string()), Some(player));
    assert_eq!(state.components.in_zone("deck"), &[a, b]);
    assert_eq!(state.components.top_of_zone("deck", Some(player)), Some(b));

    assert!(state.components.move_to_zone(b, "hand", None));
    assert_eq!(state.components.in_zone("deck"), &[a]);
    assert_eq!(state.components.in_zone("hand"), &[b]);

    // Destroyed components leave their zone but stay resolvable.
    assert!(state.components.destroy(a));
    assert!(state.components.in_zone("deck").is_empty());
    assert!(state.components.get(a).is_some());
    assert!(!state.components.get(a).unwrap().is_active());

    // New creations never reuse an id.
    let c = state.components.create(&card_def, Some("deck".to_string()), Some(player));
    assert_ne!(c, a);
    assert_ne!(c, b);
}

#[test]
fn zone_shuffles_are_deterministic_per_seed() {
    let card_def = definition(2, "Card", "card");
    let shuffled = |seed: u64| {
        let mut state = new_state(seed);
        for _ in 0..8 {
            state.components.create(&card_def, Some("deck".to_string()), None);
        }
        let mut rng = state.rng.clone();
        state.components.shuffle_zone("deck", &mut rng);
        state
            .components
            .in_zone("deck")
            .iter()
            .map(|id| format!("{id:?}"))
            .collect::<Vec<_>>()
    };

    assert_eq!(shuffled(42), shuffled(42));
    assert_ne!(shuffled(42), shuffled(43));
}
