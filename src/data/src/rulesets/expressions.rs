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

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root of a property access path.
///
/// `self` refers to the expression's source component; `it` refers to the
/// current candidate inside a filter selector or `for_each` body, where the
/// source is rebound per element.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum PropRoot {
    #[serde(rename = "self")]
    SelfObject,
    #[serde(rename = "it")]
    It,
}

/// Numeric expressions.
///
/// A closed, total set: every variant evaluates to an integer or fails with
/// a reported error, never panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum NumExpr {
    /// Literal integer constant.
    #[serde(rename = "const.number")]
    Const { value: i64 },

    /// Property access on `self` or `it`.
    ///
    /// Resolution order on the component: property bag first, then the
    /// current amount of a resource with a matching name.
    #[serde(rename = "prop.number")]
    Prop { path: (PropRoot, String) },

    #[serde(rename = "op.add")]
    Add { a: Box<NumExpr>, b: Box<NumExpr> },

    #[serde(rename = "op.sub")]
    Sub { a: Box<NumExpr>, b: Box<NumExpr> },
}

/// Boolean expressions used by preconditions, edge conditions, and trigger
/// conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum Predicate {
    #[serde(rename = "pred.gt")]
    Gt { a: NumExpr, b: NumExpr },

    #[serde(rename = "pred.eq")]
    Eq { a: NumExpr, b: NumExpr },

    #[serde(rename = "pred.and")]
    And { all: Vec<Predicate> },
}

/// Selector expressions yielding sets of components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind")]
pub enum Selector {
    /// All components currently in the named zone.
    #[serde(rename = "sel.zone")]
    Zone { name: String },

    /// Candidates from the inner selector for which the predicate holds,
    /// with `self`/`it` rebound to each candidate in turn.
    #[serde(rename = "sel.filter")]
    Filter {
        #[serde(rename = "in")]
        input: Box<Selector>,
        #[serde(rename = "where")]
        predicate: Predicate,
    },

    #[serde(rename = "sel.union")]
    Union { selectors: Vec<Selector> },
}

/// A dependency reported by an expression: `(component_or_zone, field)`.
///
/// The concrete source component is not known at authoring time, so
/// property accesses advertise the symbolic origin
/// [`DYNAMIC_SOURCE`] instead of an instance id.
pub type Dependency = (String, String);

/// Symbolic dependency origin for the expression's runtime source component.
pub const DYNAMIC_SOURCE: &str = "<dynamic:source>";

impl NumExpr {
    pub fn dependencies(&self) -> BTreeSet<Dependency> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut BTreeSet<Dependency>) {
        match self {
            NumExpr::Const { .. } => {}
            NumExpr::Prop { path } => {
                deps.insert((DYNAMIC_SOURCE.to_string(), path.1.clone()));
            }
            NumExpr::Add { a, b } | NumExpr::Sub { a, b } => {
                a.collect_dependencies(deps);
                b.collect_dependencies(deps);
            }
        }
    }
}

impl Predicate {
    pub fn dependencies(&self) -> BTreeSet<Dependency> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut BTreeSet<Dependency>) {
        match self {
            Predicate::Gt { a, b } | Predicate::Eq { a, b } => {
                a.collect_dependencies(deps);
                b.collect_dependencies(deps);
            }
            Predicate::And { all } => {
                for p in all {
                    p.collect_dependencies(deps);
                }
            }
        }
    }
}

impl Selector {
    pub fn dependencies(&self) -> BTreeSet<Dependency> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(&mut deps);
        deps
    }

    fn collect_dependencies(&self, deps: &mut BTreeSet<Dependency>) {
        match self {
            Selector::Zone { name } => {
                deps.insert(("zone".to_string(), name.clone()));
            }
            Selector::Filter { input, predicate } => {
                input.collect_dependencies(deps);
                predicate.collect_dependencies(deps);
            }
            Selector::Union { selectors } => {
                for s in selectors {
                    s.collect_dependencies(deps);
                }
            }
        }
    }
}
