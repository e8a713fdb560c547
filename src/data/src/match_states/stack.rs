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

use enum_kinds::EnumKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::primitives::{EventId, ReactionId};

/// Handle to a record owned by one of the registries.
///
/// The stack never owns events or reactions; it borrows them by id so that
/// the component ↔ trigger ↔ reaction ↔ event reference cycle stays acyclic
/// in ownership terms.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, EnumKind)]
#[enum_kind(StackItemKind, derive(Serialize, Deserialize))]
#[serde(tag = "kind", content = "ref_id", rename_all = "lowercase")]
pub enum StackRef {
    Event(EventId),
    Reaction(ReactionId),
}

/// A unit scheduled for resolution on the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackItem {
    #[serde(flatten)]
    pub reference: StackRef,
    pub created_at_order: u64,
    #[serde(default)]
    pub flags: Map<String, Value>,
}

/// LIFO stack of events and reactions pending resolution.
///
/// The order counter is the match-wide total order: it stamps both stack
/// items and the `order` field of events at push time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionStack {
    items: Vec<StackItem>,
    order_counter: u64,
}

impl ResolutionStack {
    /// Advances and returns the monotonic order counter.
    pub fn next_order(&mut self) -> u64 {
        self.order_counter += 1;
        self.order_counter
    }

    pub fn push(&mut self, item: StackItem) {
        self.items.push(item);
    }

    /// Pushes a reference, stamping it with the next order value.
    pub fn push_ref(&mut self, reference: StackRef) -> u64 {
        let order = self.next_order();
        self.push(StackItem { reference, created_at_order: order, flags: Map::new() });
        order
    }

    pub fn pop(&mut self) -> Option<StackItem> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&StackItem> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
