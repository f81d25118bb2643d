// Copyright 2025 0xjcf
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! C1 State Graph: an immutable tree of states, transitions, and actions,
//! built once and validated once.

use std::collections::HashMap;

use crate::action::{BoxedAction, BoxedGuard};
use crate::error::EngineError;
use crate::event::{EventId, NO_EVENT};

/// Dense integer identifier for a state within one chart. `0` is reserved:
/// no real state may use it, so a transition's `target == 0` unambiguously
/// means "internal transition".
pub type StateId = u32;

/// The reserved "no target" / "no such state" sentinel.
pub const NONE_ID: StateId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Atomic,
    Compound,
    Parallel,
    Final,
    HistoryShallow,
    HistoryDeep,
}

impl StateKind {
    #[must_use]
    pub fn is_history(self) -> bool {
        matches!(self, StateKind::HistoryShallow | StateKind::HistoryDeep)
    }

    #[must_use]
    pub fn is_non_atomic(self) -> bool {
        matches!(self, StateKind::Compound | StateKind::Parallel)
    }
}

/// One outgoing edge of a [`StateNode`]. `target == 0` means an internal
/// transition: the action fires but no exit/entry occurs.
pub struct Transition<Ctx> {
    pub event: EventId,
    pub target: StateId,
    pub guard: Option<BoxedGuard<Ctx>>,
    pub action: Option<BoxedAction<Ctx>>,
}

impl<Ctx> Transition<Ctx> {
    #[must_use]
    pub fn is_internal(&self) -> bool {
        self.target == NONE_ID
    }
}

/// Raw input record for one state, as handed to [`StateGraph::build`] by a
/// front-end builder. Not part of this crate's public surface for
/// constructing fluent DSLs (those are out of scope); it is the literal
/// data shape a caller assembles before calling `build` once.
pub struct StateInput<Ctx> {
    pub id: StateId,
    pub kind: StateKind,
    pub parent: Option<StateId>,
    /// Document-order child ids; empty for atomic/final/history states.
    pub children: Vec<StateId>,
    pub initial: Option<StateId>,
    pub transitions: Vec<Transition<Ctx>>,
    pub entry_action: Option<BoxedAction<Ctx>>,
    pub exit_action: Option<BoxedAction<Ctx>>,
    pub initial_action: Option<BoxedAction<Ctx>>,
    /// For history pseudo-states only: fallback target when no history is
    /// recorded yet.
    pub history_default: Option<StateId>,
    pub final_data: Option<std::sync::Arc<dyn std::any::Any + Send + Sync>>,
}

impl<Ctx> StateInput<Ctx> {
    #[must_use]
    pub fn new(id: StateId, kind: StateKind, parent: Option<StateId>) -> Self {
        Self {
            id,
            kind,
            parent,
            children: Vec::new(),
            initial: None,
            transitions: Vec::new(),
            entry_action: None,
            exit_action: None,
            initial_action: None,
            history_default: None,
            final_data: None,
        }
    }
}

/// A validated, built state node. Same fields as [`StateInput`] plus the
/// resolved `initial` (defaulted to the first document-order child when the
/// input left it unspecified).
pub struct StateNode<Ctx> {
    pub id: StateId,
    pub kind: StateKind,
    pub parent: Option<StateId>,
    pub children: Vec<StateId>,
    pub initial: Option<StateId>,
    pub transitions: Vec<Transition<Ctx>>,
    pub entry_action: Option<BoxedAction<Ctx>>,
    pub exit_action: Option<BoxedAction<Ctx>>,
    pub initial_action: Option<BoxedAction<Ctx>>,
    pub history_default: Option<StateId>,
    pub final_data: Option<std::sync::Arc<dyn std::any::Any + Send + Sync>>,
}

/// Immutable tree of states, transitions, and actions. Built once via
/// [`StateGraph::build`] and shared freely thereafter: the graph is never
/// mutated after build.
pub struct StateGraph<Ctx> {
    nodes: HashMap<StateId, StateNode<Ctx>>,
    root: StateId,
}

impl<Ctx> StateGraph<Ctx> {
    /// Validate and freeze a flat list of state records into a chart.
    ///
    /// # Errors
    /// Returns [`EngineError::MalformedGraph`] if ids collide, a referenced
    /// id is missing, a non-atomic state lacks a resolvable `initial`, or a
    /// history pseudo-state is malformed (has children, or its default does
    /// not name a sibling).
    pub fn build(root: StateId, states: Vec<StateInput<Ctx>>) -> Result<Self, EngineError> {
        let mut nodes: HashMap<StateId, StateNode<Ctx>> = HashMap::with_capacity(states.len());

        for input in states {
            if input.id == NONE_ID {
                return Err(EngineError::MalformedGraph(
                    "state id 0 is reserved and may not be used".into(),
                ));
            }
            tracing::debug!(id = input.id, kind = ?input.kind, "registering state");
            let initial = match input.initial {
                Some(i) => Some(i),
                None => input.children.first().copied(),
            };
            let node = StateNode {
                id: input.id,
                kind: input.kind,
                parent: input.parent,
                children: input.children,
                initial,
                transitions: input.transitions,
                entry_action: input.entry_action,
                exit_action: input.exit_action,
                initial_action: input.initial_action,
                history_default: input.history_default,
                final_data: input.final_data,
            };
            if nodes.insert(node.id, node).is_some() {
                let msg = format!("duplicate state id {}", input.id);
                tracing::warn!("{msg}");
                return Err(EngineError::MalformedGraph(msg));
            }
        }

        if !nodes.contains_key(&root) {
            return Err(EngineError::MalformedGraph(format!(
                "root id {root} is not among the registered states"
            )));
        }

        Self::validate(&nodes, root)?;

        Ok(Self { nodes, root })
    }

    fn validate(nodes: &HashMap<StateId, StateNode<Ctx>>, root: StateId) -> Result<(), EngineError> {
        let missing = |id: StateId| -> EngineError {
            EngineError::MalformedGraph(format!("reference to unknown state id {id}"))
        };

        for node in nodes.values() {
            if let Some(parent) = node.parent {
                if !nodes.contains_key(&parent) {
                    return Err(missing(parent));
                }
            } else if node.id != root {
                return Err(EngineError::MalformedGraph(format!(
                    "state {} has no parent but is not the root",
                    node.id
                )));
            }

            for &child in &node.children {
                let child_node = nodes.get(&child).ok_or_else(|| missing(child))?;
                if child_node.parent != Some(node.id) {
                    return Err(EngineError::MalformedGraph(format!(
                        "state {} lists {} as a child but its parent pointer disagrees",
                        node.id, child
                    )));
                }
            }

            if node.kind.is_history() {
                if !node.children.is_empty() {
                    return Err(EngineError::MalformedGraph(format!(
                        "history state {} may not have children",
                        node.id
                    )));
                }
                if let Some(default) = node.history_default {
                    let parent = node.parent.ok_or_else(|| {
                        EngineError::MalformedGraph(format!(
                            "history state {} has no parent to default within",
                            node.id
                        ))
                    })?;
                    let siblings = &nodes
                        .get(&parent)
                        .ok_or_else(|| missing(parent))?
                        .children;
                    if !siblings.contains(&default) {
                        return Err(EngineError::MalformedGraph(format!(
                            "history_default {default} of state {} is not a sibling under parent {parent}",
                            node.id
                        )));
                    }
                }
                continue;
            }

            match node.kind {
                StateKind::Compound => {
                    if node.children.is_empty() {
                        return Err(EngineError::MalformedGraph(format!(
                            "compound state {} has no children",
                            node.id
                        )));
                    }
                    let initial = node.initial.ok_or_else(|| {
                        EngineError::MalformedGraph(format!(
                            "compound state {} has no resolvable initial",
                            node.id
                        ))
                    })?;
                    if !node.children.contains(&initial) {
                        return Err(EngineError::MalformedGraph(format!(
                            "initial {initial} of state {} is not one of its children",
                            node.id
                        )));
                    }
                }
                StateKind::Parallel => {
                    if node.children.is_empty() {
                        return Err(EngineError::MalformedGraph(format!(
                            "parallel state {} has no regions",
                            node.id
                        )));
                    }
                }
                StateKind::Atomic | StateKind::Final => {
                    if !node.children.is_empty() {
                        return Err(EngineError::MalformedGraph(format!(
                            "atomic/final state {} may not have children",
                            node.id
                        )));
                    }
                }
                StateKind::HistoryShallow | StateKind::HistoryDeep => unreachable!(),
            }

            for t in &node.transitions {
                if !t.is_internal() && !nodes.contains_key(&t.target) {
                    return Err(missing(t.target));
                }
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> StateId {
        self.root
    }

    #[must_use]
    pub fn lookup(&self, id: StateId) -> Option<&StateNode<Ctx>> {
        self.nodes.get(&id)
    }

    /// True iff `ancestor` is a (non-strict) ancestor of `descendant`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: StateId, descendant: StateId) -> bool {
        let mut cur = Some(descendant);
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.lookup(id).and_then(|n| n.parent);
        }
        false
    }
}

/// Minimal internal factory used by tests (and any caller that prefers
/// incremental assembly over hand-building a `Vec<StateInput<Ctx>>`). Not a
/// fluent front-end DSL: it mirrors the raw data model 1:1.
#[derive(Default)]
pub struct GraphBuilder<Ctx> {
    states: Vec<StateInput<Ctx>>,
    root: Option<StateId>,
}

impl<Ctx> GraphBuilder<Ctx> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            states: Vec::new(),
            root: None,
        }
    }

    pub fn root(&mut self, id: StateId) -> &mut Self {
        self.root = Some(id);
        self
    }

    pub fn state(&mut self, input: StateInput<Ctx>) -> &mut Self {
        self.states.push(input);
        self
    }

    /// # Errors
    /// See [`StateGraph::build`].
    pub fn build(self) -> Result<StateGraph<Ctx>, EngineError> {
        let root = self.root.ok_or_else(|| {
            EngineError::MalformedGraph("no root id was registered on the builder".into())
        })?;
        StateGraph::build(root, self.states)
    }
}

#[allow(dead_code)]
const _: EventId = NO_EVENT; // keep NO_EVENT import path documented here
