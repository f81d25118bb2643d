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

//! C4 Macrostep Executor: the single-threaded core that both dispatch
//! runtimes drive. Holds the active configuration, history store, region
//! registry, and internal event queue; exposes one entry point per external
//! event and runs it to completion (a macrostep) before returning.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::action::BoxedAction;
use crate::config::{Configuration, DonePendingSet};
use crate::diagnostics::{DiagnosticEvent, Diagnostics, TracingDiagnostics};
use crate::error::{ActionKind, EngineError};
use crate::event::{done_event_id, Event, MAX_MICROSTEPS, NO_EVENT};
use crate::graph::{StateGraph, StateId, StateKind};
use crate::parallel::{self, RegionRegistry};
use crate::path;
use crate::selector::{self, Selected};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Unstarted,
    Running,
    Stopped,
}

/// Outcome of resolving a `HistoryDeep` target: either a full stored
/// configuration to replay, or a single default state when nothing has been
/// recorded yet.
enum DeepHistoryResolution {
    Path(Vec<StateId>),
    Default(StateId),
}

/// The pure, single-threaded statechart core. `Engine` never spawns a task
/// or owns an event queue of its own beyond the internal one used to drain
/// eventless/done transitions within one macrostep; both runtimes decide
/// how external events reach [`Engine::dispatch_external`] /
/// [`Engine::run_macrostep_on_leaf`].
pub struct Engine<Ctx> {
    graph: Arc<StateGraph<Ctx>>,
    config: Configuration,
    history: crate::history::HistoryStore,
    done_pending: DonePendingSet,
    regions: RegionRegistry,
    internal_queue: VecDeque<Event>,
    diagnostics: Arc<dyn Diagnostics>,
    lifecycle: Lifecycle,
}

impl<Ctx> Engine<Ctx> {
    #[must_use]
    pub fn new(graph: Arc<StateGraph<Ctx>>) -> Self {
        Self::with_diagnostics(graph, Arc::new(TracingDiagnostics))
    }

    #[must_use]
    pub fn with_diagnostics(graph: Arc<StateGraph<Ctx>>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            graph,
            config: Configuration::new(),
            history: crate::history::HistoryStore::new(),
            done_pending: DonePendingSet::new(),
            regions: RegionRegistry::new(),
            internal_queue: VecDeque::new(),
            diagnostics,
            lifecycle: Lifecycle::Unstarted,
        }
    }

    #[must_use]
    pub fn graph(&self) -> &StateGraph<Ctx> {
        &self.graph
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    #[must_use]
    pub fn is_in_state(&self, id: StateId) -> bool {
        self.config.is_active(id)
    }

    /// Document-order list of active control-point leaves: one per
    /// non-parallel branch, one per active parallel region.
    #[must_use]
    pub fn leaves(&self) -> Vec<StateId> {
        parallel::compute_leaves(&self.graph, self.config.active_set(), &self.regions)
    }

    #[must_use]
    pub fn current_state(&self) -> Option<StateId> {
        self.leaves().first().copied()
    }

    /// Enter the chart's initial configuration from the root.
    ///
    /// # Errors
    /// [`EngineError::AlreadyStarted`] if already running.
    pub fn start(&mut self, ctx: &mut Ctx) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Unstarted {
            return Err(EngineError::AlreadyStarted);
        }
        let root = self.graph.root();
        self.enter_and_descend(root, None, NONE_FROM, NONE_FROM, ctx)?;
        self.lifecycle = Lifecycle::Running;
        self.drain_to_stable(root, ctx)?;
        Ok(())
    }

    /// Tear down every active region and clear the configuration. Idempotent:
    /// calling `stop` on an unstarted or already-stopped engine is a no-op.
    pub fn stop(&mut self, ctx: &mut Ctx) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Running {
            self.lifecycle = Lifecycle::Stopped;
            return Ok(());
        }
        let root = self.graph.root();
        if let Some(node) = self.graph.lookup(root) {
            if let Some(act) = node.exit_action.clone() {
                self.invoke(&act, ctx, None, NONE_FROM, NONE_FROM, ActionKind::Exit)?;
            }
        }
        self.config.clear();
        self.history = crate::history::HistoryStore::new();
        self.done_pending = DonePendingSet::new();
        self.regions.clear();
        self.internal_queue.clear();
        self.lifecycle = Lifecycle::Stopped;
        Ok(())
    }

    /// Run one external event to completion: apply it to every leaf it
    /// addresses, then drain the internal queue and eventless transitions
    /// once. This is what the event-driven runtime's top-level (non-region)
    /// dispatch and ad-hoc callers use; a runtime batching several events
    /// per tick should use [`Engine::apply_event_no_drain`] per event and
    /// call [`Engine::drain_to_stable`] once at the end of the batch instead;
    /// see `crate::runtime::tick`.
    ///
    /// # Errors
    /// [`EngineError::NotStarted`] if the engine has not been started.
    pub fn dispatch_external(&mut self, event: Event, ctx: &mut Ctx) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Running {
            return Err(EngineError::NotStarted);
        }
        let diag_leaf = self.current_state().unwrap_or(crate::graph::NONE_ID);
        self.apply_event_no_drain(&event, ctx)?;
        self.drain_to_stable(diag_leaf, ctx)
    }

    /// Apply `event`'s initial selected transition to every leaf it
    /// addresses (broadcast for `address == 0`, the owning region's leaf
    /// otherwise), without draining the internal queue or eventless
    /// transitions. Used by the tick runtime to apply a whole sorted batch
    /// before draining once; ordinary callers want [`Engine::dispatch_external`]
    /// or [`Engine::run_macrostep_on_leaf`] instead.
    ///
    /// # Errors
    /// [`EngineError::NotStarted`] if the engine has not been started.
    pub(crate) fn apply_event_no_drain(&mut self, event: &Event, ctx: &mut Ctx) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Running {
            return Err(EngineError::NotStarted);
        }
        let leaves = self.leaves();
        if event.address != 0 {
            if let Some(&leaf) = leaves.iter().find(|&&l| self.graph.is_ancestor(event.address, l)) {
                if let Some(sel) = selector::select(&self.graph, leaf, event, ctx) {
                    self.apply_selected(leaf, sel, event, ctx)?;
                }
            }
            return Ok(());
        }
        for leaf in leaves {
            // A sibling region's macrostep may have already torn this leaf
            // down (e.g. a done event routed the whole parallel ancestor
            // elsewhere); skip anything no longer part of the active set.
            if !self.config.is_active(leaf) {
                continue;
            }
            if let Some(sel) = selector::select(&self.graph, leaf, event, ctx) {
                self.apply_selected(leaf, sel, event, ctx)?;
            }
        }
        Ok(())
    }

    /// Run one external event to completion starting from a specific active
    /// leaf, then drain the internal queue and eventless transitions across
    /// the *whole* configuration (not just this leaf's branch) until stable.
    /// This is the primitive both dispatch runtimes share: the tick runtime
    /// calls it once per region per tick in document order, the event-driven
    /// runtime calls it from each region's own task under its shared mutex.
    ///
    /// # Errors
    /// [`EngineError::NotStarted`] if the engine has not been started, or an
    /// action/guard failure surfaced as [`EngineError::ActionFailure`].
    pub fn run_macrostep_on_leaf(
        &mut self,
        leaf: StateId,
        event: Event,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        if self.lifecycle != Lifecycle::Running {
            return Err(EngineError::NotStarted);
        }
        self.diagnostics.on_event(DiagnosticEvent::MacrostepStarted {
            leaf,
            event_id: event.id,
        });

        if let Some(sel) = selector::select(&self.graph, leaf, &event, ctx) {
            self.apply_selected(leaf, sel, &event, ctx)?;
        }

        self.drain_to_stable(leaf, ctx)
    }

    /// Drain the internal event queue and any eventless transitions, across
    /// the whole current configuration (not just one branch), until stable
    /// or [`MAX_MICROSTEPS`] is hit. Shared by [`Engine::start`] (so a done
    /// event raised by immediate entry into a final state is delivered
    /// before `start` returns) and [`Engine::run_macrostep_on_leaf`].
    pub(crate) fn drain_to_stable(&mut self, leaf_for_diag: StateId, ctx: &mut Ctx) -> Result<(), EngineError> {
        let mut microsteps: u32 = 0;
        loop {
            if microsteps >= MAX_MICROSTEPS {
                self.diagnostics
                    .on_event(DiagnosticEvent::MicrostepLimitExceeded { leaf: leaf_for_diag });
                self.internal_queue.clear();
                break;
            }

            if let Some(queued) = self.internal_queue.pop_front() {
                if let Some((source_leaf, sel)) = self.select_across_active_leaves(&queued, ctx) {
                    self.apply_selected(source_leaf, sel, &queued, ctx)?;
                    microsteps += 1;
                }
                continue;
            }

            let eventless = Event::eventless();
            if let Some((source_leaf, sel)) = self.select_across_active_leaves(&eventless, ctx) {
                self.apply_selected(source_leaf, sel, &eventless, ctx)?;
                microsteps += 1;
                continue;
            }

            break;
        }

        self.diagnostics.on_event(DiagnosticEvent::MacrostepStable {
            leaf: leaf_for_diag,
            microsteps,
        });
        Ok(())
    }

    fn select_across_active_leaves(&self, event: &Event, ctx: &Ctx) -> Option<(StateId, Selected)> {
        for leaf in self.leaves() {
            if let Some(sel) = selector::select(&self.graph, leaf, event, ctx) {
                return Some((leaf, sel));
            }
        }
        None
    }

    fn apply_selected(
        &mut self,
        from: StateId,
        sel: Selected,
        event: &Event,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        let (target, action) = {
            let node = self
                .graph
                .lookup(sel.source)
                .expect("selector returned a source id that is not in the graph");
            let t = &node.transitions[sel.index];
            (t.target, t.action.clone())
        };
        self.apply_transition(from, target, action, Some(event), ctx)
    }

    fn apply_transition(
        &mut self,
        from: StateId,
        target: StateId,
        transition_action: Option<BoxedAction<Ctx>>,
        event: Option<&Event>,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        if target == crate::graph::NONE_ID {
            if let Some(act) = transition_action {
                self.invoke(&act, ctx, event, from, from, ActionKind::Transition)?;
            }
            self.maybe_emit_done_from_final(from);
            return Ok(());
        }

        let mut to = target;
        let mut deep_restore_path: Option<Vec<StateId>> = None;
        if let Some(kind) = self.graph.lookup(to).map(|n| n.kind) {
            match kind {
                StateKind::HistoryShallow => match self.resolve_shallow_history(to) {
                    Some(resolved) => to = resolved,
                    None => {
                        self.diagnostics.on_event(DiagnosticEvent::HistoryUnresolved {
                            history_state: to,
                        });
                        return Err(EngineError::HistoryUnresolved { history_state: to });
                    }
                },
                StateKind::HistoryDeep => match self.resolve_deep_history(to) {
                    Some(DeepHistoryResolution::Path(path)) => {
                        to = self
                            .graph
                            .lookup(to)
                            .and_then(|n| n.parent)
                            .expect("validated: history state has a parent");
                        deep_restore_path = Some(path);
                    }
                    Some(DeepHistoryResolution::Default(default)) => to = default,
                    None => {
                        self.diagnostics.on_event(DiagnosticEvent::HistoryUnresolved {
                            history_state: to,
                        });
                        return Err(EngineError::HistoryUnresolved { history_state: to });
                    }
                },
                _ => {}
            }
        }

        let boundary = path::lca(&self.graph, from, to);

        self.exit_chain(from, boundary, event, from, to, ctx)?;

        if let Some(act) = transition_action {
            self.invoke(&act, ctx, event, from, to, ActionKind::Transition)?;
        }

        let entries = path::entry_path(&self.graph, boundary, to);
        for (i, &s) in entries.iter().enumerate() {
            self.enter_single(s, event, from, to, ctx)?;
            if i + 1 < entries.len() {
                let next = entries[i + 1];
                let (initial, initial_action) = {
                    let node = self.graph.lookup(s).expect("entry_path yielded unknown id");
                    (node.initial, node.initial_action.clone())
                };
                if initial == Some(next) {
                    if let Some(act) = initial_action {
                        self.invoke(&act, ctx, event, from, to, ActionKind::Initial)?;
                    }
                }
            }
        }

        match deep_restore_path {
            Some(path) => self.enter_history_path(&path, event, from, to, ctx)?,
            None => self.descend_from(to, event, from, to, ctx)?,
        }

        Ok(())
    }

    /// Bottom-up exit from `leaf` up to (excluding) `boundary`: records
    /// history, tears down parallel regions encountered along the way, and
    /// fires exit actions. Reused both for the main transition's own exit
    /// path and, recursively, for each sibling region torn down when a
    /// parallel ancestor is exited.
    fn exit_chain(
        &mut self,
        leaf: StateId,
        boundary: StateId,
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        let exits = path::exit_path(&self.graph, leaf, boundary);
        self.snapshot_deep_history(&exits);

        for &s in &exits {
            let (parent, kind, exit_action) = {
                let node = self.graph.lookup(s).expect("exit_path yielded unknown id");
                (node.parent, node.kind, node.exit_action.clone())
            };
            if let Some(p) = parent {
                if p != boundary {
                    self.history.record_shallow(p, s);
                }
            }
            self.done_pending.clear(s);
            if kind == StateKind::Parallel {
                self.exit_parallel_regions(s, event, from_ctx, to_ctx, ctx)?;
            }
            if let Some(act) = exit_action {
                self.invoke(&act, ctx, event, from_ctx, to_ctx, ActionKind::Exit)?;
            }
            self.config.deactivate(s);
        }
        Ok(())
    }

    fn exit_parallel_regions(
        &mut self,
        parallel_id: StateId,
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        let Some(roots) = self.regions.remove(parallel_id) else {
            return Ok(());
        };
        for &root in roots.iter().rev() {
            let leaves = parallel::subtree_leaves(&self.graph, self.config.active_set(), &self.regions, root);
            for leaf in leaves {
                self.exit_chain(leaf, parallel_id, event, from_ctx, to_ctx, ctx)?;
            }
        }
        Ok(())
    }

    fn snapshot_deep_history(&mut self, exits: &[StateId]) {
        for &s in exits {
            let children = match self.graph.lookup(s) {
                Some(node) => node.children.clone(),
                None => continue,
            };
            let has_deep_anchor = children
                .iter()
                .any(|&c| self.graph.lookup(c).map(|n| n.kind) == Some(StateKind::HistoryDeep));
            if has_deep_anchor {
                let path = self.subtree_full_path(s);
                self.history.record_deep(s, path);
            }
        }
    }

    /// Every currently-active descendant of `s`, innermost branch/region
    /// flattened depth-first, used to snapshot deep history.
    fn subtree_full_path(&self, s: StateId) -> Vec<StateId> {
        let mut out = Vec::new();
        let mut cur = s;
        loop {
            let Some(node) = self.graph.lookup(cur) else {
                break;
            };
            match node.kind {
                StateKind::Compound => {
                    match node.children.iter().find(|c| self.config.is_active(**c)) {
                        Some(&child) => {
                            out.push(child);
                            cur = child;
                        }
                        None => break,
                    }
                }
                StateKind::Parallel => {
                    if let Some(roots) = self.regions.get(cur) {
                        for &root in roots {
                            out.push(root);
                            out.extend(self.subtree_full_path(root));
                        }
                    }
                    break;
                }
                _ => break,
            }
        }
        out
    }

    fn resolve_shallow_history(&self, history_state: StateId) -> Option<StateId> {
        let node = self.graph.lookup(history_state)?;
        let parent = node.parent?;
        self.history.shallow(parent).or(node.history_default)
    }

    /// Looks up the stored deep-history path for `history_state`'s anchor
    /// (its parent). A recorded, non-empty path always wins over the
    /// declared default, matching shallow history's precedence.
    fn resolve_deep_history(&self, history_state: StateId) -> Option<DeepHistoryResolution> {
        let node = self.graph.lookup(history_state)?;
        let anchor = node.parent?;
        if let Some(path) = self.history.deep(anchor) {
            if !path.is_empty() {
                return Some(DeepHistoryResolution::Path(path.to_vec()));
            }
        }
        node.history_default.map(DeepHistoryResolution::Default)
    }

    /// Re-enters a stored deep-history path in document order: every state
    /// in `path` gets its entry action run directly, with no initial-action
    /// firing and no default-descent, since a history restore re-enters the
    /// exact configuration that was exited rather than taking a fresh
    /// initial transition. A parallel state encountered along the path has
    /// its region registry rebuilt; the region roots and their own stored
    /// branches are the path entries that immediately follow it.
    fn enter_history_path(
        &mut self,
        path: &[StateId],
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        for &s in path {
            self.enter_single(s, event, from_ctx, to_ctx, ctx)?;
            match self.graph.lookup(s).map(|n| n.kind) {
                Some(StateKind::Parallel) => {
                    let roots = self
                        .graph
                        .lookup(s)
                        .map(|n| n.children.clone())
                        .unwrap_or_default();
                    self.regions.insert(s, roots);
                }
                Some(StateKind::Atomic) | Some(StateKind::Final) => {
                    self.maybe_emit_done_from_final(s);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn enter_single(
        &mut self,
        state: StateId,
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        self.config.activate(state);
        if let Some(act) = self.graph.lookup(state).and_then(|n| n.entry_action.clone()) {
            self.invoke(&act, ctx, event, from_ctx, to_ctx, ActionKind::Entry)?;
        }
        Ok(())
    }

    /// Having already entered `state` itself, descend into its initial
    /// child / spawn its regions / check for immediate completion.
    fn descend_from(
        &mut self,
        state: StateId,
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        let kind = self
            .graph
            .lookup(state)
            .map(|n| n.kind)
            .ok_or_else(|| EngineError::MalformedGraph(format!("unknown state {state}")))?;
        match kind {
            StateKind::Compound => {
                let (initial, initial_action) = {
                    let node = self.graph.lookup(state).expect("checked above");
                    (node.initial, node.initial_action.clone())
                };
                if let Some(init) = initial {
                    if let Some(act) = initial_action {
                        self.invoke(&act, ctx, event, from_ctx, to_ctx, ActionKind::Initial)?;
                    }
                    self.enter_and_descend(init, event, from_ctx, to_ctx, ctx)?;
                }
            }
            StateKind::Parallel => {
                self.enter_parallel(state, event, from_ctx, to_ctx, ctx)?;
            }
            StateKind::Atomic | StateKind::Final => {
                self.maybe_emit_done_from_final(state);
            }
            StateKind::HistoryShallow | StateKind::HistoryDeep => {}
        }
        Ok(())
    }

    fn enter_and_descend(
        &mut self,
        state: StateId,
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        self.enter_single(state, event, from_ctx, to_ctx, ctx)?;
        self.descend_from(state, event, from_ctx, to_ctx, ctx)
    }

    fn enter_parallel(
        &mut self,
        parallel_id: StateId,
        event: Option<&Event>,
        from_ctx: StateId,
        to_ctx: StateId,
        ctx: &mut Ctx,
    ) -> Result<(), EngineError> {
        let roots = self
            .graph
            .lookup(parallel_id)
            .map(|n| n.children.clone())
            .ok_or_else(|| EngineError::MalformedGraph(format!("unknown state {parallel_id}")))?;
        self.regions.insert(parallel_id, roots.clone());
        for root in roots {
            self.enter_and_descend(root, event, from_ctx, to_ctx, ctx)?;
        }
        Ok(())
    }

    /// Walk up from a newly entered final state, enqueuing a done event for
    /// each single-child compound ancestor, and checking region completion
    /// at each parallel ancestor. A compound ancestor with more than one
    /// child stops the cascade without emitting: reaching final in one
    /// child says nothing about the others, so completion there needs an
    /// explicit transition rather than an automatic done event.
    fn maybe_emit_done_from_final(&mut self, state: StateId) {
        if self.graph.lookup(state).map(|n| n.kind) != Some(StateKind::Final) {
            return;
        }
        let mut cur = state;
        loop {
            let Some(parent) = self.graph.lookup(cur).and_then(|n| n.parent) else {
                break;
            };
            let (parent_kind, parent_children_len) = match self.graph.lookup(parent) {
                Some(n) => (n.kind, n.children.len()),
                None => break,
            };
            match parent_kind {
                StateKind::Compound => {
                    if parent_children_len != 1 {
                        break;
                    }
                    if !self.done_pending.is_pending(parent) {
                        self.done_pending.mark(parent);
                        let payload = self.graph.lookup(cur).and_then(|n| n.final_data.clone());
                        let ev = match payload {
                            Some(p) => Event::with_payload(done_event_id(parent), p),
                            None => Event::new(done_event_id(parent)),
                        };
                        self.internal_queue.push_back(ev);
                    }
                    cur = parent;
                }
                StateKind::Parallel => {
                    if !self.done_pending.is_pending(parent)
                        && parallel::all_regions_final(
                            &self.graph,
                            self.config.active_set(),
                            &self.regions,
                            parent,
                        )
                    {
                        self.done_pending.mark(parent);
                        self.internal_queue.push_back(Event::new(done_event_id(parent)));
                        cur = parent;
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    fn invoke(
        &self,
        action: &BoxedAction<Ctx>,
        ctx: &mut Ctx,
        event: Option<&Event>,
        from: StateId,
        to: StateId,
        kind: ActionKind,
    ) -> Result<(), EngineError> {
        action(ctx, event, from, to).map_err(|message| EngineError::ActionFailure {
            state: to,
            kind,
            message,
        })
    }
}

/// Placeholder "no real from/to" id used only for the root enter on
/// [`Engine::start`] and the root exit on [`Engine::stop`], where there is
/// no meaningful transition context to hand to entry/exit actions.
const NONE_FROM: StateId = crate::graph::NONE_ID;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::action;
    use crate::event::Event as Ev;
    use crate::graph::{GraphBuilder, StateInput, Transition};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log(Mutex<Vec<&'static str>>);
    impl Log {
        fn push(&self, s: &'static str) {
            self.0.lock().unwrap().push(s);
        }
        fn snapshot(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().clone()
        }
    }

    fn simple_graph() -> StateGraph<Log> {
        let mut root = StateInput::new(1, StateKind::Compound, None);
        root.children = vec![2, 3];
        let mut off = StateInput::new(2, StateKind::Atomic, Some(1));
        off.exit_action = Some(action(|c: &mut Log, _, _, _| {
            c.push("exit off");
            Ok(())
        }));
        off.transitions.push(Transition {
            event: 10,
            target: 3,
            guard: None,
            action: Some(action(|c: &mut Log, _, _, _| {
                c.push("toggle");
                Ok(())
            })),
        });
        let mut on = StateInput::new(3, StateKind::Atomic, Some(1));
        on.entry_action = Some(action(|c: &mut Log, _, _, _| {
            c.push("enter on");
            Ok(())
        }));
        GraphBuilder::new()
            .root(1)
            .state(root)
            .state(off)
            .state(on)
            .build()
            .unwrap()
    }

    #[test]
    fn simple_transition_runs_exit_action_then_target_action_then_entry_action() {
        let graph = Arc::new(simple_graph());
        let mut engine: Engine<Log> = Engine::new(graph);
        let mut ctx = Log::default();
        engine.start(&mut ctx).unwrap();
        assert!(engine.is_in_state(2));
        engine.dispatch_external(Ev::new(10), &mut ctx).unwrap();
        assert!(engine.is_in_state(3));
        assert_eq!(ctx.snapshot(), vec!["exit off", "toggle", "enter on"]);
    }

    fn hierarchical_graph() -> StateGraph<()> {
        // root -> P(compound) -> {A(initial), B}; A --e--> B
        let mut root = StateInput::new(1, StateKind::Compound, None);
        root.children = vec![2];
        let mut p = StateInput::new(2, StateKind::Compound, Some(1));
        p.children = vec![3, 4];
        let mut a = StateInput::new(3, StateKind::Atomic, Some(2));
        a.transitions.push(Transition {
            event: 5,
            target: 4,
            guard: None,
            action: None,
        });
        let b = StateInput::new(4, StateKind::Atomic, Some(2));
        StateGraph::build(1, vec![root, p, a, b]).unwrap()
    }

    #[test]
    fn hierarchical_transition_lands_on_sibling() {
        let graph = Arc::new(hierarchical_graph());
        let mut engine: Engine<()> = Engine::new(graph);
        let mut ctx = ();
        engine.start(&mut ctx).unwrap();
        assert!(engine.is_in_state(3));
        engine.dispatch_external(Ev::new(5), &mut ctx).unwrap();
        assert!(engine.is_in_state(4));
        assert!(!engine.is_in_state(3));
    }

    fn microstep_chain_graph() -> StateGraph<()> {
        // A --e1(eventless chain)--> B --(eventless)--> C
        let mut root = StateInput::new(1, StateKind::Compound, None);
        root.children = vec![2];
        let mut a = StateInput::new(2, StateKind::Atomic, Some(1));
        a.transitions.push(Transition {
            event: 10,
            target: 3,
            guard: None,
            action: None,
        });
        let mut b = StateInput::new(3, StateKind::Atomic, Some(1));
        b.transitions.push(Transition {
            event: NO_EVENT,
            target: 4,
            guard: None,
            action: None,
        });
        let c = StateInput::new(4, StateKind::Atomic, Some(1));
        StateGraph::build(1, vec![root, a, b, c]).unwrap()
    }

    #[test]
    fn eventless_transition_chains_within_one_macrostep() {
        let graph = Arc::new(microstep_chain_graph());
        let mut engine: Engine<()> = Engine::new(graph);
        let mut ctx = ();
        engine.start(&mut ctx).unwrap();
        engine.dispatch_external(Ev::new(10), &mut ctx).unwrap();
        assert!(engine.is_in_state(4));
    }

    fn shallow_history_graph() -> StateGraph<()> {
        // root -> P(compound) -> { H(history-shallow, default=A), A(initial), B }
        // root -> Q; Q --back--> H
        let mut root = StateInput::new(1, StateKind::Compound, None);
        root.children = vec![2, 6];
        root.transitions.push(Transition {
            event: 40,
            target: 6,
            guard: None,
            action: None,
        });
        let mut p = StateInput::new(2, StateKind::Compound, Some(1));
        p.children = vec![3, 4, 5];
        p.initial = Some(4);
        let mut hist = StateInput::new(3, StateKind::HistoryShallow, Some(2));
        hist.history_default = Some(4);
        let mut a = StateInput::new(4, StateKind::Atomic, Some(2));
        a.transitions.push(Transition {
            event: 20,
            target: 5,
            guard: None,
            action: None,
        });
        let b = StateInput::new(5, StateKind::Atomic, Some(2));
        let mut q = StateInput::new(6, StateKind::Atomic, Some(1));
        q.transitions.push(Transition {
            event: 30,
            target: 3,
            guard: None,
            action: None,
        });
        StateGraph::build(1, vec![root, p, hist, a, b, q]).unwrap()
    }

    #[test]
    fn shallow_history_restores_last_active_child() {
        let graph = Arc::new(shallow_history_graph());
        let mut engine: Engine<()> = Engine::new(graph);
        let mut ctx = ();
        engine.start(&mut ctx).unwrap();
        assert!(engine.is_in_state(4));
        engine.dispatch_external(Ev::new(20), &mut ctx).unwrap();
        assert!(engine.is_in_state(5));
        engine.dispatch_external(Ev::new(40), &mut ctx).unwrap();
        assert!(engine.is_in_state(6));
        engine.dispatch_external(Ev::new(30), &mut ctx).unwrap();
        assert!(engine.is_in_state(5));
    }

    fn parallel_done_graph() -> StateGraph<()> {
        // root -> PP(parallel) -> { R1->X(final) , R2->Y(final) }
        // root: transition on done(PP) -> DONE
        let mut root = StateInput::new(1, StateKind::Compound, None);
        root.children = vec![2, 7];
        root.transitions.push(Transition {
            event: done_event_id(2),
            target: 7,
            guard: None,
            action: None,
        });
        let mut pp = StateInput::new(2, StateKind::Parallel, Some(1));
        pp.children = vec![3, 5];
        let mut r1 = StateInput::new(3, StateKind::Compound, Some(2));
        r1.children = vec![4];
        let x = StateInput::new(4, StateKind::Final, Some(3));
        let mut r2 = StateInput::new(5, StateKind::Compound, Some(2));
        r2.children = vec![6];
        let y = StateInput::new(6, StateKind::Final, Some(5));
        let done = StateInput::new(7, StateKind::Atomic, Some(1));
        StateGraph::build(1, vec![root, pp, r1, x, r2, y, done]).unwrap()
    }

    #[test]
    fn parallel_done_event_fires_once_both_regions_finish() {
        let graph = Arc::new(parallel_done_graph());
        let mut engine: Engine<()> = Engine::new(graph);
        let mut ctx = ();
        engine.start(&mut ctx).unwrap();
        // Both regions reach their final states on entry, in the same
        // macrostep that starts the chart, so the done(PP) transition on
        // root already fires before `start` returns.
        assert!(engine.is_in_state(7));
        assert!(!engine.is_in_state(4));
        assert!(!engine.is_in_state(6));
    }
}
