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

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use slotmap::SlotMap;

use crate::core::primitives::{ComponentId, DefinitionId, HasComponentId};
use crate::match_states::resource_state::ResourceState;
use crate::match_states::workflow_state::WorkflowState;
use crate::rulesets::component_definition::{ComponentDefinition, ComponentTag};
use crate::rulesets::trigger_definition::TriggerDefinition;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    #[default]
    Active,
    Inactive,
    Destroyed,
}

/// A live instance of a component definition.
///
/// Triggers are copied from the definition at creation so that per-instance
/// trigger mutation (gaining or losing abilities) never touches the shared
/// ruleset. A destroyed component may still be referenced from the event
/// log but is never dispatched to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub definition_id: DefinitionId,
    pub name: String,
    pub tag: ComponentTag,
    pub status: ComponentStatus,
    /// Name of the zone this component currently occupies, if any.
    pub zone: Option<String>,
    /// Player component controlling this one, if any.
    pub controller: Option<ComponentId>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Resource instances keyed by their definition id.
    #[serde(default)]
    pub resources: BTreeMap<DefinitionId, ResourceState>,
    #[serde(default)]
    pub triggers: Vec<TriggerDefinition>,
    #[serde(default)]
    pub workflow: Option<WorkflowState>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Component {
    pub fn is_active(&self) -> bool {
        self.status == ComponentStatus::Active
    }

    pub fn property_i64(&self, key: &str) -> Option<i64> {
        self.properties.get(key).and_then(Value::as_i64)
    }
}

impl HasComponentId for Component {
    fn component_id(&self) -> ComponentId {
        self.id
    }
}

/// Creates, indexes, and moves component instances.
///
/// Storage is a versioned slot map, so instance ids are never reused within
/// a match. Zone membership is kept in insertion order; a seeded shuffle
/// permutes it and "top of zone" is the last entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    all: SlotMap<ComponentId, Component>,
    #[serde(default)]
    by_tag: HashMap<ComponentTag, Vec<ComponentId>>,
    #[serde(default)]
    by_zone: HashMap<String, Vec<ComponentId>>,
}

impl Components {
    /// Creates a new component instance from a definition.
    ///
    /// Copies the definition's triggers and instantiates its resource
    /// templates at their starting amounts.
    pub fn create(
        &mut self,
        definition: &ComponentDefinition,
        zone: Option<String>,
        controller: Option<ComponentId>,
    ) -> ComponentId {
        let mut resources = BTreeMap::new();
        for template in &definition.resources {
            resources.insert(template.id, ResourceState::new(template));
        }

        let id = self.all.insert(Component {
            id: ComponentId::default(),
            definition_id: definition.id,
            name: definition.name.clone(),
            tag: definition.tag,
            status: ComponentStatus::Active,
            zone: zone.clone(),
            controller,
            properties: definition.properties.clone(),
            resources,
            triggers: definition.triggers.clone(),
            workflow: None,
            metadata: Map::new(),
        });
        self.all[id].id = id;

        self.by_tag.entry(definition.tag).or_default().push(id);
        if let Some(zone) = zone {
            self.by_zone.entry(zone).or_default().push(id);
        }
        id
    }

    pub fn get(&self, id: impl HasComponentId) -> Option<&Component> {
        self.all.get(id.component_id())
    }

    pub fn get_mut(&mut self, id: impl HasComponentId) -> Option<&mut Component> {
        self.all.get_mut(id.component_id())
    }

    /// Iterator over all live components in slot order (deterministic).
    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.all.values()
    }

    pub fn len(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    /// Component ids with the given tag, in creation order.
    pub fn with_tag(&self, tag: ComponentTag) -> &[ComponentId] {
        self.by_tag.get(&tag).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Component ids currently in the named zone, in zone order.
    pub fn in_zone(&self, zone: &str) -> &[ComponentId] {
        self.by_zone.get(zone).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Components in a zone restricted to a controller, preserving zone
    /// order.
    pub fn in_zone_controlled_by(&self, zone: &str, controller: ComponentId) -> Vec<ComponentId> {
        self.in_zone(zone)
            .iter()
            .copied()
            .filter(|id| {
                self.all.get(*id).map(|c| c.controller == Some(controller)).unwrap_or(false)
            })
            .collect()
    }

    /// The top card of a zone: the last entry in zone order, optionally
    /// restricted to a controller.
    pub fn top_of_zone(&self, zone: &str, controller: Option<ComponentId>) -> Option<ComponentId> {
        self.in_zone(zone)
            .iter()
            .copied()
            .filter(|id| match controller {
                Some(player) => {
                    self.all.get(*id).map(|c| c.controller == Some(player)).unwrap_or(false)
                }
                None => true,
            })
            .last()
    }

    /// Moves a component to a new zone and optionally a new controller.
    pub fn move_to_zone(
        &mut self,
        id: ComponentId,
        new_zone: &str,
        new_controller: Option<ComponentId>,
    ) -> bool {
        let old_zone = match self.all.get_mut(id) {
            Some(component) => {
                let old = component.zone.take();
                component.zone = Some(new_zone.to_string());
                if let Some(controller) = new_controller {
                    component.controller = Some(controller);
                }
                old
            }
            None => return false,
        };

        if let Some(old_zone) = old_zone {
            if let Some(members) = self.by_zone.get_mut(&old_zone) {
                members.retain(|m| *m != id);
            }
        }
        self.by_zone.entry(new_zone.to_string()).or_default().push(id);
        true
    }

    /// Marks a component destroyed and removes it from its zone index.
    ///
    /// The record itself is retained so the event log can still be
    /// interpreted against it.
    pub fn destroy(&mut self, id: ComponentId) -> bool {
        let zone = match self.all.get_mut(id) {
            Some(component) => {
                component.status = ComponentStatus::Destroyed;
                component.zone.take()
            }
            None => return false,
        };
        if let Some(zone) = zone {
            if let Some(members) = self.by_zone.get_mut(&zone) {
                members.retain(|m| *m != id);
            }
        }
        true
    }

    /// Applies a seeded permutation to a zone's order.
    pub fn shuffle_zone(&mut self, zone: &str, rng: &mut impl Rng) {
        if let Some(members) = self.by_zone.get_mut(zone) {
            members.shuffle(rng);
        }
    }

    /// The zone component registered under the given zone name, if any.
    pub fn zone_component_by_name(&self, name: &str) -> Option<&Component> {
        self.with_tag(ComponentTag::Zone)
            .iter()
            .filter_map(|id| self.all.get(*id))
            .find(|c| c.name == name)
    }
}
