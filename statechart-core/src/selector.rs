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

//! C3 Transition Selector.
//!
//! Walks from an active leaf upward through ancestors and, in each state,
//! scans its transitions in document order: child transitions preempt
//! parent transitions, and within one state document order wins.

use crate::event::{event_matches, Event};
use crate::graph::{StateGraph, StateId};

/// The result of a successful selection: the state whose transition list
/// contains the winner, and that transition's index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selected {
    pub source: StateId,
    pub index: usize,
}

/// Select the first enabled transition for `event`, searching from `leaf`
/// upward to the graph root. Guard failures are logged and treated as
/// "not enabled"; they never abort selection.
pub fn select<Ctx>(
    graph: &StateGraph<Ctx>,
    leaf: StateId,
    event: &Event,
    ctx: &Ctx,
) -> Option<Selected> {
    let mut cur = Some(leaf);
    while let Some(state_id) = cur {
        let Some(node) = graph.lookup(state_id) else {
            return None;
        };
        for (index, t) in node.transitions.iter().enumerate() {
            if !event_matches(t.event, event.id) {
                continue;
            }
            let enabled = match &t.guard {
                None => true,
                Some(g) => match g(ctx, Some(event), state_id, t.target) {
                    Ok(b) => b,
                    Err(message) => {
                        tracing::warn!(
                            state = state_id,
                            event = event.id,
                            %message,
                            "guard failed, treating transition as not enabled"
                        );
                        false
                    }
                },
            };
            if enabled {
                return Some(Selected {
                    source: state_id,
                    index,
                });
            }
        }
        cur = node.parent;
    }
    None
}
