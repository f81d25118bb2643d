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

//! Active Configuration and the Done-pending Set.

use std::collections::HashSet;

use crate::graph::StateId;

/// The set of currently active states: leaves and all their ancestors.
/// Document-ordered "control point" leaves (one per non-parallel branch,
/// one per parallel region) are derived on demand from this set plus the
/// region registry (see [`crate::parallel::compute_leaves`]) rather than
/// tracked incrementally, so entering/exiting parallel regions never
/// requires splicing a parallel leaf list in place.
#[derive(Default)]
pub struct Configuration {
    active: HashSet<StateId>,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self, id: StateId) -> bool {
        self.active.contains(&id)
    }

    #[must_use]
    pub fn active_set(&self) -> &HashSet<StateId> {
        &self.active
    }

    pub(crate) fn activate(&mut self, id: StateId) {
        self.active.insert(id);
    }

    pub(crate) fn deactivate(&mut self, id: StateId) {
        self.active.remove(&id);
    }

    pub(crate) fn clear(&mut self) {
        self.active.clear();
    }
}

/// Set of compound/parallel state ids with a done event enqueued but not
/// yet consumed, used to suppress duplicates.
#[derive(Default)]
pub struct DonePendingSet(HashSet<StateId>);

impl DonePendingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_pending(&self, id: StateId) -> bool {
        self.0.contains(&id)
    }

    pub fn mark(&mut self, id: StateId) {
        self.0.insert(id);
    }

    pub fn clear(&mut self, id: StateId) {
        self.0.remove(&id);
    }
}
