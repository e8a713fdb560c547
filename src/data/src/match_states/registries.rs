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

use crate::core::primitives::{EventId, ReactionId};
use crate::match_states::event::{Event, Reaction};

/// Owns event records between registration and resolution, and assigns
/// strictly increasing ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventRegistry {
    counter: u64,
    entries: HashMap<EventId, Event>,
}

impl EventRegistry {
    /// Assigns the next id to the event, stores it, and returns the id.
    pub fn register(&mut self, mut event: Event) -> EventId {
        self.counter += 1;
        let id = EventId(self.counter);
        event.id = id;
        self.entries.insert(id, event);
        id
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: EventId) -> Option<&mut Event> {
        self.entries.get_mut(&id)
    }

    /// Removes an event after resolution; reclaims storage on success and
    /// failure alike.
    pub fn unregister(&mut self, id: EventId) -> Option<Event> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Owns reaction records between registration and resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReactionRegistry {
    counter: u64,
    entries: HashMap<ReactionId, Reaction>,
}

impl ReactionRegistry {
    pub fn register(&mut self, mut reaction: Reaction) -> ReactionId {
        self.counter += 1;
        let id = ReactionId(self.counter);
        reaction.id = id;
        self.entries.insert(id, reaction);
        id
    }

    pub fn get(&self, id: ReactionId) -> Option<&Reaction> {
        self.entries.get(&id)
    }

    pub fn unregister(&mut self, id: ReactionId) -> Option<Reaction> {
        self.entries.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
