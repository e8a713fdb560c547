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

//! Match setup: instantiates the component tree declared by a ruleset.

use data::core::errors::MatchError;
use data::core::primitives::ComponentId;
use data::match_states::match_state::MatchState;
use data::rulesets::component_definition::ComponentTag;
use data::rulesets::ruleset_ir::RulesetIR;
use tracing::debug;

/// Default number of players when the game component does not set one.
pub const DEFAULT_PLAYER_COUNT: u32 = 2;

/// Instantiates the game, player, zone, card, and custom components for a
/// new match.
///
/// Returns every created component id in creation order so the caller can
/// register their triggers. Card definitions honor their `copies`,
/// `per_player` and `starting_zone` properties; zones marked
/// `shuffle_on_start` receive a seeded shuffle once all cards are placed.
pub fn instantiate_components(
    ruleset: &RulesetIR,
    state: &mut MatchState,
) -> Result<Vec<ComponentId>, MatchError> {
    let mut created = vec![];

    let game_definition = ruleset
        .game_component
        .as_ref()
        .ok_or_else(|| MatchError::MalformedRuleset("ruleset has no game component".to_string()))?;
    let game = state.components.create(game_definition, None, None);
    state.game_component = Some(game);
    created.push(game);

    // Players first, so zone and card controllers can reference them.
    if let Some(player_definition) = ruleset.player_definition() {
        let seats = game_definition.max_players.unwrap_or(DEFAULT_PLAYER_COUNT);
        for seat in 0..seats {
            let player = state.components.create(player_definition, None, None);
            debug!(seat, ?player, "Created player component");
            state.player_ids.push(player);
            created.push(player);
        }
    }
    state.active_player = state.player_ids.first().copied();

    for definition in &ruleset.component_definitions {
        match definition.tag {
            ComponentTag::Player | ComponentTag::Turn | ComponentTag::Phase => {
                // Players are seated above; turns and phases are
                // instantiated by the workflow hierarchy as it runs.
            }
            ComponentTag::Game => {}
            ComponentTag::Zone => {
                created.push(state.components.create(definition, None, None));
            }
            ComponentTag::Card => {
                let copies = definition.copies();
                let zone = definition.starting_zone().to_string();
                if definition.per_player() {
                    for player in state.player_ids.clone() {
                        for _ in 0..copies {
                            created.push(state.components.create(
                                definition,
                                Some(zone.clone()),
                                Some(player),
                            ));
                        }
                    }
                } else {
                    for _ in 0..copies {
                        created.push(state.components.create(definition, Some(zone.clone()), None));
                    }
                }
            }
            ComponentTag::Custom => {
                created.push(state.components.create(definition, None, None));
            }
        }
    }

    // Seeded shuffles once every starting card is in place.
    for definition in ruleset.components_with_tag(ComponentTag::Zone) {
        if definition.shuffle_on_start() {
            debug!(zone = %definition.name, "Shuffling zone");
            state.components.shuffle_zone(&definition.name, &mut state.rng);
        }
    }

    Ok(created)
}
