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

//! C2 LCA / Path Engine: ancestor chains, LCA computation, and the
//! entry/exit path construction used by the macrostep executor.
//!
//! Pure functions over `&StateGraph` only, no mutable state, nothing
//! fallible, so they can be exhaustively property-tested independent of
//! the executor (see `tests/` and the `proptest` suite).

use crate::graph::{StateGraph, StateId};

/// `id`'s ancestor chain, from `id` itself up to and including the root.
#[must_use]
pub fn ancestors<Ctx>(graph: &StateGraph<Ctx>, id: StateId) -> Vec<StateId> {
    let mut chain = Vec::new();
    let mut cur = Some(id);
    while let Some(s) = cur {
        chain.push(s);
        cur = graph.lookup(s).and_then(|n| n.parent);
    }
    chain
}

/// Deepest state that is an ancestor of both `a` and `b`. A self-transition
/// (`a == b`) has `lca == parent(a)`.
#[must_use]
pub fn lca<Ctx>(graph: &StateGraph<Ctx>, a: StateId, b: StateId) -> StateId {
    if a == b {
        return graph
            .lookup(a)
            .and_then(|n| n.parent)
            .unwrap_or(graph.root());
    }
    let a_chain = ancestors(graph, a);
    let b_chain: std::collections::HashSet<StateId> = ancestors(graph, b).into_iter().collect();
    a_chain
        .into_iter()
        .find(|s| b_chain.contains(s))
        .unwrap_or_else(|| graph.root())
}

/// Follow `initial` recursively from `id` until reaching an atomic, final,
/// or parallel state. Parallel states are terminal for this descent: the
/// caller enters the parallel state and lets the Parallel Region Controller
/// handle its regions' own descent.
#[must_use]
pub fn deepest_initial<Ctx>(graph: &StateGraph<Ctx>, id: StateId) -> StateId {
    let mut cur = id;
    loop {
        let Some(node) = graph.lookup(cur) else {
            return cur;
        };
        match node.kind {
            crate::graph::StateKind::Compound => match node.initial {
                Some(next) => cur = next,
                None => return cur,
            },
            _ => return cur,
        }
    }
}

/// Bottom-up list of states to exit when leaving `from` on the way to
/// `boundary` (exclusive). Internal transitions never call this (they have
/// no exit set); callers pass `boundary == lca(from, to)`.
#[must_use]
pub fn exit_path<Ctx>(graph: &StateGraph<Ctx>, from: StateId, boundary: StateId) -> Vec<StateId> {
    let mut path = Vec::new();
    let mut cur = Some(from);
    while let Some(s) = cur {
        if s == boundary {
            break;
        }
        path.push(s);
        cur = graph.lookup(s).and_then(|n| n.parent);
    }
    path
}

/// Top-down list of states to enter from `boundary` (exclusive) down to
/// `to` (inclusive). Does not perform the terminal initial descent past
/// `to`; that is a separate step the executor performs once it lands on
/// `to`, since it differs for parallel targets.
#[must_use]
pub fn entry_path<Ctx>(graph: &StateGraph<Ctx>, boundary: StateId, to: StateId) -> Vec<StateId> {
    let mut path = ancestors(graph, to);
    if let Some(pos) = path.iter().position(|&s| s == boundary) {
        path.truncate(pos);
    }
    path.reverse();
    path
}
