//! Scenario 6: under the tick runtime, events submitted in one batch are
//! applied in `(priority desc, sequence asc)` order, deterministically
//! across repeated runs.

use std::sync::{Arc, Mutex};

use statechart_core::{action, Event, StateGraph, StateInput, StateKind, TickConfig, TickRuntime, Transition};

type Log = Arc<Mutex<Vec<i64>>>;

fn recorder_graph() -> StateGraph<Log> {
    let mut root = StateInput::new(1, StateKind::Compound, None);
    root.children = vec![2];
    let mut s = StateInput::new(2, StateKind::Atomic, Some(1));
    for event in [1, 2, 3] {
        s.transitions.push(Transition {
            event,
            target: 0, // internal: record arrival order without leaving the state
            guard: None,
            action: Some(action(move |log: &mut Log, _, _, _| {
                log.lock().unwrap().push(event);
                Ok(())
            })),
        });
    }
    StateGraph::build(1, vec![root, s]).unwrap()
}

fn run_once() -> Vec<i64> {
    let graph = Arc::new(recorder_graph());
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let runtime = TickRuntime::new(graph, Arc::clone(&log), TickConfig::default()).unwrap();

    runtime.send_event(Event::new(1), 0).unwrap();
    runtime.send_event(Event::new(2), 10).unwrap();
    runtime.send_event(Event::new(3), 0).unwrap();
    runtime.tick().unwrap();

    assert_eq!(runtime.tick_number(), 1);
    log.lock().unwrap().clone()
}

#[test]
fn tick_applies_events_in_priority_then_arrival_order_every_run() {
    let expected = vec![2i64, 1, 3];
    for _ in 0..5 {
        assert_eq!(run_once(), expected);
    }
}
