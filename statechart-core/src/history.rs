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

//! History Store: shallow and deep history recorded on exit, consulted on
//! entry of a history pseudo-state.

use std::collections::HashMap;

use crate::graph::StateId;

#[derive(Default)]
pub struct HistoryStore {
    shallow: HashMap<StateId, StateId>,
    deep: HashMap<StateId, Vec<StateId>>,
}

impl HistoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_shallow(&mut self, parent: StateId, child: StateId) {
        self.shallow.insert(parent, child);
    }

    pub fn record_deep(&mut self, anchor: StateId, path: Vec<StateId>) {
        self.deep.insert(anchor, path);
    }

    #[must_use]
    pub fn shallow(&self, parent: StateId) -> Option<StateId> {
        self.shallow.get(&parent).copied()
    }

    #[must_use]
    pub fn deep(&self, anchor: StateId) -> Option<&[StateId]> {
        self.deep.get(&anchor).map(Vec::as_slice)
    }
}
