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

use std::collections::{BTreeMap, HashMap};

use data::core::primitives::{ComponentId, WatcherId};
use data::match_states::match_state::MatchState;
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::trigger_definition::TriggerDefinition;

use crate::queries::eval::{predicate_holds, EvalContext};

/// A registered state-based trigger.
#[derive(Debug, Clone)]
pub struct StateWatcher {
    pub id: WatcherId,
    pub trigger: TriggerDefinition,
    /// Component that owns this watcher.
    pub source: ComponentId,
}

/// Evaluates state-based triggers on a dirty flag.
///
/// Watchers are checked after the event stack empties. Anything that
/// mutates state marks the engine dirty; the next check evaluates every
/// registered watcher and clears the flag. When the flag is clear, checking
/// returns empty immediately.
#[derive(Debug, Clone, Default)]
pub struct StateWatchers {
    watchers: BTreeMap<WatcherId, StateWatcher>,
    by_source: HashMap<ComponentId, Vec<WatcherId>>,
    dirty: bool,
    next_id: u64,
}

impl StateWatchers {
    pub fn register_watcher(
        &mut self,
        trigger: TriggerDefinition,
        source: ComponentId,
    ) -> WatcherId {
        self.next_id += 1;
        let id = WatcherId(self.next_id);
        self.watchers.insert(id, StateWatcher { id, trigger, source });
        self.by_source.entry(source).or_default().push(id);
        id
    }

    pub fn unregister_watchers_from_source(&mut self, source: ComponentId) -> Vec<WatcherId> {
        let ids = self.by_source.remove(&source).unwrap_or_default();
        for id in &ids {
            self.watchers.remove(id);
        }
        ids
    }

    /// Marks state as changed, requiring watcher re-evaluation.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.len()
    }

    /// Evaluates all watchers if state is dirty, clearing the flag.
    ///
    /// Returns the triggered watchers in registration order. Watchers whose
    /// owning component is gone or inactive are skipped; a condition that
    /// fails to evaluate counts as not triggered.
    pub fn check_watchers(&mut self, ruleset: &RulesetIR, state: &MatchState) -> Vec<StateWatcher> {
        if !self.dirty {
            return vec![];
        }

        let mut triggered = vec![];
        for watcher in self.watchers.values() {
            let active = state
                .component(watcher.source)
                .map(|component| component.is_active())
                .unwrap_or(false);
            if !active {
                continue;
            }
            let Some(condition) = &watcher.trigger.condition else {
                continue;
            };
            let ctx = EvalContext::with_source(watcher.source);
            if predicate_holds(ruleset, state, &ctx, condition) {
                triggered.push(watcher.clone());
            }
        }

        self.dirty = false;
        triggered
    }

    pub fn clear(&mut self) {
        self.watchers.clear();
        self.by_source.clear();
        self.dirty = false;
    }
}
