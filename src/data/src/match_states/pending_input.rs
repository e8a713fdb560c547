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

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use typed_builder::TypedBuilder;

use crate::core::primitives::{ComponentId, DefinitionId, InputId};

/// The kind of choice a pending input presents.
#[derive(
    Debug, Clone, Copy, Default, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    TargetSelect,
    OrderSelect,
    ModePick,
    PayCost,
    #[default]
    Confirm,
}

/// A blocking request for one or more player choices.
///
/// Produced when workflow progress requires an Input edge to be taken. At
/// most one unresolved pending input is observable to the outside at a
/// time. Expiry is advisory and enforced by the host, not the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
pub struct PendingInput {
    pub id: InputId,
    /// The input definition named by the workflow edge awaiting activation.
    pub input_definition_id: DefinitionId,
    /// Component whose workflow is paused on this input.
    pub component: ComponentId,
    pub for_players: Vec<ComponentId>,
    #[builder(default)]
    pub kind: InputKind,
    #[builder(default)]
    pub constraints: Map<String, Value>,
    /// Epoch milliseconds after which the host may consider this input
    /// expired.
    #[builder(default)]
    pub expires_at: Option<u64>,
}
