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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::{ComponentId, DefinitionId};

/// A player's request to take an action.
///
/// `targets` maps the action's target slot ids to the objects chosen for
/// each slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerAction {
    #[serde(rename = "type")]
    pub action: DefinitionId,
    pub player_id: ComponentId,
    #[serde(default)]
    pub targets: HashMap<String, Vec<ComponentId>>,
    #[serde(default)]
    pub modes: Vec<String>,
    #[serde(default)]
    pub cost_choices: Map<String, Value>,
}

impl PlayerAction {
    pub fn new(action: DefinitionId, player_id: ComponentId) -> Self {
        Self {
            action,
            player_id,
            targets: HashMap::new(),
            modes: vec![],
            cost_choices: Map::new(),
        }
    }
}
