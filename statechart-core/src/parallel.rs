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

//! C5 Parallel Region Controller.
//!
//! Tracks, per active parallel state, the document-ordered list of its
//! region roots. The controller does not duplicate the active-leaf state
//! that [`crate::config::Configuration`] already owns; it only remembers
//! *which* parallel states are currently spread across regions, so the
//! executor can iterate, tear down, and done-check them in document order.

use std::collections::{HashMap, HashSet};

use crate::graph::{StateGraph, StateId, StateKind};

#[derive(Default)]
pub struct RegionRegistry {
    regions: HashMap<StateId, Vec<StateId>>,
}

impl RegionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self, parallel: StateId) -> bool {
        self.regions.contains_key(&parallel)
    }

    #[must_use]
    pub fn get(&self, parallel: StateId) -> Option<&[StateId]> {
        self.regions.get(&parallel).map(Vec::as_slice)
    }

    pub fn insert(&mut self, parallel: StateId, region_roots: Vec<StateId>) {
        self.regions.insert(parallel, region_roots);
    }

    pub fn remove(&mut self, parallel: StateId) -> Option<Vec<StateId>> {
        self.regions.remove(&parallel)
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }
}

/// Collect the currently active atomic/final leaves reachable from `id`, in
/// document order. A compound state contributes its one active child's
/// leaves; a parallel state contributes every region's leaves in turn,
/// recursing through nested parallel regions as needed.
fn collect_leaves<Ctx>(
    graph: &StateGraph<Ctx>,
    active: &HashSet<StateId>,
    regions: &RegionRegistry,
    id: StateId,
    out: &mut Vec<StateId>,
) {
    let Some(node) = graph.lookup(id) else {
        return;
    };
    match node.kind {
        StateKind::Atomic | StateKind::Final => out.push(id),
        StateKind::Compound => {
            if let Some(&child) = node.children.iter().find(|c| active.contains(c)) {
                collect_leaves(graph, active, regions, child, out);
            }
        }
        StateKind::Parallel => {
            if let Some(roots) = regions.get(id) {
                for &root in roots {
                    collect_leaves(graph, active, regions, root, out);
                }
            }
        }
        StateKind::HistoryShallow | StateKind::HistoryDeep => {}
    }
}

/// Every currently active "control point" leaf in the whole chart, document
/// order, computed fresh from the active set and region registry rather
/// than tracked incrementally.
#[must_use]
pub fn compute_leaves<Ctx>(
    graph: &StateGraph<Ctx>,
    active: &HashSet<StateId>,
    regions: &RegionRegistry,
) -> Vec<StateId> {
    let mut out = Vec::new();
    collect_leaves(graph, active, regions, graph.root(), &mut out);
    out
}

/// The leaves reachable under one subtree root, used both for a single
/// region's own leaf set and, during region teardown, to find everything
/// that needs to exit.
#[must_use]
pub fn subtree_leaves<Ctx>(
    graph: &StateGraph<Ctx>,
    active: &HashSet<StateId>,
    regions: &RegionRegistry,
    subtree_root: StateId,
) -> Vec<StateId> {
    let mut out = Vec::new();
    collect_leaves(graph, active, regions, subtree_root, &mut out);
    out
}

/// True iff every region of `parallel` currently has only final leaves.
#[must_use]
pub fn all_regions_final<Ctx>(
    graph: &StateGraph<Ctx>,
    active: &HashSet<StateId>,
    regions: &RegionRegistry,
    parallel: StateId,
) -> bool {
    let Some(roots) = regions.get(parallel) else {
        return false;
    };
    roots.iter().all(|&root| {
        let leaves = subtree_leaves(graph, active, regions, root);
        !leaves.is_empty()
            && leaves
                .iter()
                .all(|&l| graph.lookup(l).map(|n| n.kind) == Some(StateKind::Final))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::StateInput;

    fn graph_with_parallel() -> StateGraph<()> {
        // root(compound) -> PP(parallel) -> { R1 -> {X(final)}, R2 -> {Y(final)} }
        let mut root = StateInput::new(1, StateKind::Compound, None);
        root.children = vec![2];
        let mut pp = StateInput::new(2, StateKind::Parallel, Some(1));
        pp.children = vec![3, 5];
        let mut r1 = StateInput::new(3, StateKind::Compound, Some(2));
        r1.children = vec![4];
        let x = StateInput::new(4, StateKind::Final, Some(3));
        let mut r2 = StateInput::new(5, StateKind::Compound, Some(2));
        r2.children = vec![6];
        let y = StateInput::new(6, StateKind::Final, Some(5));
        StateGraph::build(1, vec![root, pp, r1, x, r2, y]).unwrap()
    }

    #[test]
    fn all_regions_final_requires_both_regions_final() {
        let g = graph_with_parallel();
        let mut regions = RegionRegistry::new();
        regions.insert(2, vec![3, 5]);

        let mut active: HashSet<StateId> = [1, 2, 3, 4, 5].into_iter().collect();
        assert!(!all_regions_final(&g, &active, &regions, 2));

        active.insert(6);
        assert!(all_regions_final(&g, &active, &regions, 2));
    }

    #[test]
    fn compute_leaves_flattens_both_regions_in_document_order() {
        let g = graph_with_parallel();
        let mut regions = RegionRegistry::new();
        regions.insert(2, vec![3, 5]);
        let active: HashSet<StateId> = [1, 2, 3, 4, 5, 6].into_iter().collect();
        assert_eq!(compute_leaves(&g, &active, &regions), vec![4, 6]);
    }
}
