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

//! C6 Dispatch Runtimes: two front-ends composing the same [`crate::executor::Engine`].
//!
//! [`event_driven`] owns a bounded async queue and a single consumer task;
//! [`tick`] batches events and applies a whole sorted batch per fixed-period
//! tick. Both are built directly in code; this crate has no file-based
//! configuration format of its own, since it is a library embedded by a
//! caller that already owns its own configuration story.

pub mod event_driven;
pub mod tick;

use std::time::Duration;

/// Configuration for [`event_driven::EventDrivenRuntime`]. Defaults mirror
/// the interface contract: a 100-event queue, a 5s region entry/exit
/// deadline, and a 100ms send-to-region deadline.
#[derive(Debug, Clone, Copy)]
pub struct EventDrivenConfig {
    pub queue_capacity: usize,
    pub region_timeout: Duration,
    pub send_to_region_timeout: Duration,
}

impl Default for EventDrivenConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 100,
            region_timeout: Duration::from_secs(5),
            send_to_region_timeout: Duration::from_millis(100),
        }
    }
}

/// Configuration for [`tick::TickRuntime`]. Default tick period is
/// 16.667ms (60 Hz); default batch capacity is 1000 events.
#[derive(Debug, Clone, Copy)]
pub struct TickConfig {
    pub tick_period: Duration,
    pub max_events_per_tick: usize,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs_f64(1.0 / 60.0),
            max_events_per_tick: 1000,
        }
    }
}
