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

use derive_more::Display;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use uuid::Uuid;

new_key_type! {
    /// Identifies a component instance within a match.
    ///
    /// Components are runtime objects instantiated from component
    /// definitions: the game itself, players, zones, cards, turns, phases,
    /// and custom objects. Keys are versioned, so an id is never reused
    /// within a match even after the component is destroyed.
    pub struct ComponentId;
}

/// Identifies a struct that is 1:1 associated with a given [ComponentId].
pub trait HasComponentId {
    fn component_id(&self) -> ComponentId;
}

impl HasComponentId for ComponentId {
    fn component_id(&self) -> ComponentId {
        *self
    }
}

/// Identifies a definition within a ruleset.
///
/// Definition ids are assigned by the ruleset author and are unique within
/// each definition kind (components, actions, rules, resources, triggers).
/// Cross-references between definitions are always by id.
#[derive(
    Debug,
    Display,
    Clone,
    Copy,
    Default,
    Eq,
    PartialEq,
    Hash,
    Ord,
    PartialOrd,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct DefinitionId(pub u32);

/// Identifier assigned to an event by the event registry.
///
/// Strictly increasing within a match; stable once assigned.
#[derive(
    Debug, Display, Clone, Copy, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct EventId(pub u64);

/// Identifier assigned to a reaction by the reaction registry.
#[derive(
    Debug, Display, Clone, Copy, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct ReactionId(pub u64);

/// Identifier for a trigger subscription on the event bus.
#[derive(
    Debug, Display, Clone, Copy, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct SubscriptionId(pub u64);

/// Identifier for a registered state watcher.
#[derive(
    Debug, Display, Clone, Copy, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct WatcherId(pub u64);

/// Identifier for a pending player input.
#[derive(
    Debug, Display, Clone, Copy, Default, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct InputId(pub u64);

/// Unique identifier for a match
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MatchId(pub Uuid);

/// Turn number within a match, starting from 1.
pub type TurnNumber = u32;
