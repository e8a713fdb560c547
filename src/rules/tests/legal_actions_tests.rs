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

use data::actions::player_action::PlayerAction;
use data::core::errors::MatchError;
use data::core::primitives::{ComponentId, DefinitionId, MatchId};
use data::match_states::match_state::MatchState;
use data::rulesets::action_definition::SelectableObjectType;
use data::rulesets::ruleset_ir::RulesetIR;
use rules::queries::legal_actions::{actions_for_object, available_actions, validate_action};
use serde_json::json;
use uuid::Uuid;

/// Player with a mana pool plus a "play a card from hand" action costing 2
/// mana, restricted to phase 1.
fn ruleset() -> RulesetIR {
    RulesetIR::from_value(json!({
        "version": "1.0.0",
        "turn_structure": {
            "phases": [{ "id": 1, "name": "Main" }, { "id": 2, "name": "End" }]
        },
        "component_definitions": [
            {
                "id": 10,
                "name": "Player",
                "component_type": "player",
                "resources": [{
                    "id": 1,
                    "name": "mana",
                    "description": "mana",
                    "starting_amount": 3
                }]
            },
            { "id": 11, "name": "Card", "component_type": "card" }
        ],
        "rules": [{ "id": 1, "name": "PlayCard", "effects": [] }],
        "actions": [{
            "id": 20,
            "name": "Play Card",
            "phase_ids": [1],
            "costs": [{ "op": "pay_resource", "resource": "mana", "amount": 2 }],
            "targets": [{
                "id": "card",
                "selector": { "kind": "sel.zone", "name": "hand" }
            }],
            "execute_rules": [1],
            "primary_target_type": "card",
            "primary_target_selector": { "kind": "sel.zone", "name": "hand" },
            "interaction_mode": "drag"
        }]
    }))
    .expect("ruleset should load")
}

fn state_with_player(ruleset: &RulesetIR) -> (MatchState, ComponentId) {
    let mut state = MatchState::new(MatchId(Uuid::nil()), 1);
    let player_def = ruleset.player_definition().expect("player definition").clone();
    let player = state.components.create(&player_def, None, None);
    state.player_ids = vec![player];
    state.active_player = Some(player);
    state.current_phase_id = Some(DefinitionId(1));
    (state, player)
}

fn add_card(ruleset: &RulesetIR, state: &mut MatchState, player: ComponentId, zone: &str) -> ComponentId {
    let card_def = ruleset.component(DefinitionId(11)).expect("card definition").clone();
    state.components.create(&card_def, Some(zone.to_string()), Some(player))
}

#[test]
fn actions_filter_by_phase() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    add_card(&ruleset, &mut state, player, "hand");

    assert_eq!(available_actions(&ruleset, &state, player).len(), 1);

    state.current_phase_id = Some(DefinitionId(2));
    assert!(available_actions(&ruleset, &state, player).is_empty());
}

#[test]
fn actions_require_affordable_costs() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    let card = add_card(&ruleset, &mut state, player, "hand");

    let available = available_actions(&ruleset, &state, player);
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].costs.get("mana"), Some(&2));
    assert_eq!(available[0].targets[0].valid_targets, vec![card]);

    // Drain the mana pool; the action disappears.
    let mana = ruleset.player_definition().unwrap().resources[0].clone();
    state.component_mut(player).unwrap().resources.get_mut(&mana.id).unwrap().set(1, &mana);
    assert!(available_actions(&ruleset, &state, player).is_empty());
}

#[test]
fn validate_action_rejects_bad_targets() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    let in_hand = add_card(&ruleset, &mut state, player, "hand");
    let in_deck = add_card(&ruleset, &mut state, player, "deck");

    let mut action = PlayerAction::new(DefinitionId(20), player);
    action.targets.insert("card".to_string(), vec![in_hand]);
    assert!(validate_action(&ruleset, &state, &action).is_ok());

    let mut action = PlayerAction::new(DefinitionId(20), player);
    action.targets.insert("card".to_string(), vec![in_deck]);
    assert!(matches!(
        validate_action(&ruleset, &state, &action),
        Err(MatchError::InvalidAction(_))
    ));

    let action = PlayerAction::new(DefinitionId(99), player);
    assert!(matches!(
        validate_action(&ruleset, &state, &action),
        Err(MatchError::InvalidAction(_))
    ));
}

#[test]
fn object_queries_respect_primary_target_selectors() {
    let ruleset = ruleset();
    let (mut state, player) = state_with_player(&ruleset);
    let in_hand = add_card(&ruleset, &mut state, player, "hand");
    let in_deck = add_card(&ruleset, &mut state, player, "deck");

    let on_hand_card =
        actions_for_object(&ruleset, &state, player, SelectableObjectType::Card, in_hand);
    assert_eq!(on_hand_card.len(), 1);
    let action = &on_hand_card[0];
    assert!(action.activation_requirements.needs_drag_target);
    assert!(!action.activation_requirements.needs_button);

    // A card outside the primary selector's zone offers nothing.
    assert!(actions_for_object(&ruleset, &state, player, SelectableObjectType::Card, in_deck)
        .is_empty());

    // Kind mismatches never match.
    assert!(actions_for_object(&ruleset, &state, player, SelectableObjectType::Player, in_hand)
        .is_empty());
}
