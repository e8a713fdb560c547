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
use data::match_states::match_state::MatchState;
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::trigger_definition::TriggerDefinition;
use rules::triggers::state_watchers::StateWatchers;
use serde_json::json;
use uuid::Uuid;

/// Ruleset with a player definition carrying a life resource.
fn ruleset() -> RulesetIR {
    RulesetIR::from_value(json!({
        "version": "1.0.0",
        "turn_structure": { "phases": [{ "id": 1, "name": "Main" }] },
        "component_definitions": [
            {
                "id": 10,
                "name": "Player",
                "component_type": "player",
                "resources": [
                    {
                        "id": 1,
                        "name": "life",
                        "description": "life total",
                        "resource_type": "tracked",
                        "starting_amount": 20,
                        "min_amount": 0
                    }
                ]
            }
        ]
    }))
    .expect("ruleset should load")
}

/// Triggers when the owning component's life drops below 1.
fn life_zero_watcher() -> TriggerDefinition {
    serde_json::from_value(json!({
        "id": 1,
        "trigger_type": "state_based",
        "condition": {
            "kind": "pred.gt",
            "a": { "kind": "const.number", "value": 1 },
            "b": { "kind": "prop.number", "path": ["self", "life"] }
        },
        "effects": [{ "kind": "emit_event", "event_type": "EndGame" }]
    }))
    .expect("watcher should parse")
}

fn state_with_player(ruleset: &RulesetIR) -> (MatchState, ComponentId) {
    let mut state = MatchState::new(MatchId(Uuid::nil()), 1);
    let player_def = ruleset.player_definition().expect("player definition");
    let player = state.components.create(player_def, None, None);
    state.player_ids = vec![player];
    state.active_player = Some(player);
    (state, player)
}

fn set_life(ruleset: &RulesetIR, state: &mut MatchState, player: ComponentId, amount: i64) {
    let definition = ruleset.player_definition().unwrap().resources[0].clone();
    let resource =
        state.component_mut(player).unwrap().resources.get_mut(&definition.id).unwrap();
    resource.set(amount, &definition);
}

#[test]
fn check_returns_empty_when_not_dirty() {
    let ruleset = ruleset();
    let (state, player) = state_with_player(&ruleset);
    let mut watchers = StateWatchers::default();
    watchers.register_watcher(life_zero_watcher(), player);

    assert!(!watchers.is_dirty());
    assert!(watchers.check_watchers(&ruleset, &state).is_empty());
}

#[test]
fn dirty_check_evaluates_conditions_and_clears_flag() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    let mut watchers = StateWatchers::default();
    watchers.register_watcher(life_zero_watcher(), player);

    // Life is still 20: dirty, but the condition does not hold.
    watchers.mark_dirty();
    assert!(watchers.check_watchers(&ruleset, &state).is_empty());
    assert!(!watchers.is_dirty(), "checking clears the flag");

    set_life(&ruleset, &mut state, player, 0);
    watchers.mark_dirty();
    let triggered = watchers.check_watchers(&ruleset, &state);
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].source, player);
    assert!(!watchers.is_dirty());
}

#[test]
fn triggered_watchers_come_back_in_registration_order() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    let second_player = {
        let def = ruleset.player_definition().unwrap().clone();
        state.components.create(&def, None, None)
    };

    let mut watchers = StateWatchers::default();
    let first = watchers.register_watcher(life_zero_watcher(), player);
    let second = watchers.register_watcher(life_zero_watcher(), second_player);
    assert!(first < second);

    set_life(&ruleset, &mut state, player, 0);
    set_life(&ruleset, &mut state, second_player, 0);
    watchers.mark_dirty();
    let triggered = watchers.check_watchers(&ruleset, &state);
    let ids: Vec<_> = triggered.iter().map(|w| w.id).collect();
    assert_eq!(ids, vec![first, second]);
}

#[test]
fn unregister_removes_watchers_from_source() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    let mut watchers = StateWatchers::default();
    watchers.register_watcher(life_zero_watcher(), player);
    watchers.register_watcher(life_zero_watcher(), player);
    assert_eq!(watchers.watcher_count(), 2);

    let removed = watchers.unregister_watchers_from_source(player);
    assert_eq!(removed.len(), 2);
    assert_eq!(watchers.watcher_count(), 0);

    set_life(&ruleset, &mut state, player, 0);
    watchers.mark_dirty();
    assert!(watchers.check_watchers(&ruleset, &state).is_empty());
}
