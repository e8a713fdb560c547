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

use data::core::primitives::{ComponentId, ReactionId, SubscriptionId};
use data::match_states::event::{Event, EventType, ObjectRef, Reaction};
use data::match_states::match_state::MatchState;
use data::rulesets::ruleset_ir::RulesetIR;
use data::rulesets::trigger_definition::{TriggerDefinition, TriggerScope};
use serde_json::{Map, Value};

use crate::queries::eval::{predicate_holds, EvalContext};

/// Event type under which wildcard subscriptions are indexed; they match
/// every dispatched event.
pub const WILDCARD: &str = "*";

/// A registered trigger subscription.
#[derive(Debug, Clone)]
pub struct TriggerSubscription {
    pub id: SubscriptionId,
    pub event_type: EventType,
    pub trigger: TriggerDefinition,
    /// Component instance that owns this trigger.
    pub component: ComponentId,
    /// Hooks for future priority schemes: controller, entered-play order.
    pub metadata: Map<String, Value>,
}

/// Indexes trigger subscriptions by event type and dispatches events to
/// matching reactions.
///
/// Dispatch is a pure function of `(event, subscriptions, state)`: it
/// returns reactions in subscription-registration order and performs no
/// mutation.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscriptions: HashMap<EventType, Vec<TriggerSubscription>>,
    by_component: HashMap<ComponentId, Vec<SubscriptionId>>,
    next_id: u64,
}

impl EventBus {
    /// Registers a trigger subscription, returning its monotonic id.
    pub fn subscribe(
        &mut self,
        event_type: EventType,
        trigger: TriggerDefinition,
        component: ComponentId,
        metadata: Map<String, Value>,
    ) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscriptions.entry(event_type.clone()).or_default().push(TriggerSubscription {
            id,
            event_type,
            trigger,
            component,
            metadata,
        });
        self.by_component.entry(component).or_default().push(id);
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let mut removed_component = None;
        for subscriptions in self.subscriptions.values_mut() {
            if let Some(index) = subscriptions.iter().position(|s| s.id == id) {
                removed_component = Some(subscriptions.remove(index).component);
                break;
            }
        }
        match removed_component {
            Some(component) => {
                if let Some(ids) = self.by_component.get_mut(&component) {
                    ids.retain(|s| *s != id);
                }
                true
            }
            None => false,
        }
    }

    /// Removes every subscription owned by a component, returning the
    /// removed ids.
    pub fn unsubscribe_all_from_component(&mut self, component: ComponentId) -> Vec<SubscriptionId> {
        let ids = self.by_component.remove(&component).unwrap_or_default();
        for subscriptions in self.subscriptions.values_mut() {
            subscriptions.retain(|s| s.component != component);
        }
        ids
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.values().map(Vec::len).sum()
    }

    pub fn subscriptions_for_component(&self, component: ComponentId) -> Vec<&TriggerSubscription> {
        self.subscriptions
            .values()
            .flatten()
            .filter(|s| s.component == component)
            .collect()
    }

    /// Finds all reactions for an event.
    ///
    /// Considers subscriptions on the event's type and on the wildcard, in
    /// registration order. For each: the owning component must be active
    /// and the activation context satisfied; every `when` filter key must
    /// equal the payload value; every condition must hold. One reaction is
    /// produced per `caused_by` binding resolved from the trigger's scope.
    ///
    /// Reaction ids are assigned later by the reaction registry.
    pub fn dispatch(
        &self,
        ruleset: &RulesetIR,
        state: &MatchState,
        event: &Event,
    ) -> Vec<Reaction> {
        let mut candidates: Vec<&TriggerSubscription> = vec![];
        if let Some(subscriptions) = self.subscriptions.get(&event.event_type) {
            candidates.extend(subscriptions.iter());
        }
        if let Some(subscriptions) = self.subscriptions.get(&EventType::from(WILDCARD)) {
            candidates.extend(subscriptions.iter());
        }

        let mut reactions = vec![];
        for subscription in candidates {
            if !self.is_active(ruleset, state, subscription) {
                continue;
            }
            if !matches_filters(&subscription.trigger, event) {
                continue;
            }
            let ctx =
                EvalContext { source: Some(subscription.component), event: Some(event) };
            if !subscription
                .trigger
                .conditions
                .iter()
                .all(|c| predicate_holds(ruleset, state, &ctx, c))
            {
                continue;
            }
            for caused_by in resolve_caused_by(state, &subscription.trigger, event) {
                reactions.push(Reaction {
                    id: ReactionId::default(),
                    trigger_id: subscription.trigger.id,
                    when: subscription.trigger.when.clone(),
                    conditions: subscription.trigger.conditions.clone(),
                    effects: subscription.trigger.effects.clone(),
                    timing: subscription.trigger.timing,
                    caused_by,
                    source: subscription.component,
                });
            }
        }
        reactions
    }

    /// Checks whether a subscription is currently listening: the owning
    /// component is active and the trigger's activation context holds.
    fn is_active(
        &self,
        ruleset: &RulesetIR,
        state: &MatchState,
        subscription: &TriggerSubscription,
    ) -> bool {
        let component = match state.component(subscription.component) {
            Some(component) => component,
            None => return false,
        };
        if !component.is_active() {
            return false;
        }

        let Some(context) = &subscription.trigger.active_while else {
            return true;
        };
        if let Some(zones) = &context.zones {
            match &component.zone {
                Some(zone) if zones.contains(zone) => {}
                _ => return false,
            }
        }
        if let Some(phases) = &context.phases {
            match state.current_phase_id {
                Some(phase) if phases.contains(&phase) => {}
                _ => return false,
            }
        }
        if let Some(condition) = &context.condition {
            let ctx = EvalContext::with_source(subscription.component);
            if !predicate_holds(ruleset, state, &ctx, condition) {
                return false;
            }
        }
        true
    }
}

/// Every listed filter key must be equal-compared against the event
/// payload.
fn matches_filters(trigger: &TriggerDefinition, event: &Event) -> bool {
    let Some(when) = &trigger.when else {
        return false;
    };
    when.filters.iter().all(|(key, value)| event.payload.get(key) == Some(value))
}

/// Resolves the `caused_by` bindings for a firing trigger.
///
/// `self` binds the causing object, falling back to the active player;
/// `all` binds every player; `opponent` binds every player other than the
/// causing one.
fn resolve_caused_by(
    state: &MatchState,
    trigger: &TriggerDefinition,
    event: &Event,
) -> Vec<ObjectRef> {
    let causing_player = event
        .caused_by
        .map(|cause| cause.id)
        .or(state.active_player);
    match trigger.scope {
        TriggerScope::SelfObject => match event.caused_by.or(causing_player.map(ObjectRef::player))
        {
            Some(cause) => vec![cause],
            None => vec![],
        },
        TriggerScope::All => state.player_ids.iter().copied().map(ObjectRef::player).collect(),
        TriggerScope::Opponent => match causing_player {
            Some(player) => {
                state.opponents_of(player).into_iter().map(ObjectRef::player).collect()
            }
            None => vec![],
        },
    }
}
