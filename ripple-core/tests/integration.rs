//! Integration Tests for Reactive System
//!
//! These tests verify that signals, computeds, and effects work together
//! correctly, and that the engine behaves under a hand-written host.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use ripple_core::graph::{Flags, Graph};
use ripple_core::reactive::{NodeState, Runtime};
use ripple_core::system::{create_reactive_system, Host, ReactiveSystem};
use ripple_core::{ReactiveError, RuntimeConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Test the complete reactive chain: signal -> computed -> effect.
#[test]
fn signal_computed_effect_chain() {
    init_tracing();
    let mut rt = Runtime::new();

    let getter_runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&getter_runs);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let s = rt.signal(1);
    let a = rt.computed(move |rt, _| {
        counter.set(counter.get() + 1);
        s.get(rt) * 2
    });
    rt.effect(move |rt| sink.borrow_mut().push(a.get(rt)));

    assert_eq!(*seen.borrow(), [2]);
    assert_eq!(getter_runs.get(), 1);
    let notifies = rt.stats().notifies;

    s.set(&mut rt, 5).unwrap();

    assert_eq!(rt.stats().notifies - notifies, 1);
    assert_eq!(getter_runs.get(), 2);
    assert_eq!(*seen.borrow(), [2, 10]);
}

/// A diamond recomputes its bottom once and never shows a torn pair.
#[test]
fn diamond_updates_once_and_consistently() {
    init_tracing();
    let mut rt = Runtime::new();

    let pairs = Rc::new(RefCell::new(Vec::new()));
    let record = Rc::clone(&pairs);
    let effect_runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&effect_runs);

    let s = rt.signal(1);
    let left = rt.computed(move |rt, _| s.get(rt) + 1);
    let right = rt.computed(move |rt, _| s.get(rt) * 10);
    let bottom = rt.computed(move |rt, _| {
        let pair = (left.get(rt), right.get(rt));
        record.borrow_mut().push(pair);
        pair.0 + pair.1
    });
    rt.effect(move |rt| {
        bottom.get(rt);
        counter.set(counter.get() + 1);
    });

    s.set(&mut rt, 2).unwrap();

    assert_eq!(*pairs.borrow(), [(2, 10), (3, 20)]);
    assert_eq!(effect_runs.get(), 2);
    assert_eq!(bottom.get(&mut rt), 23);
}

/// A computed that stops reading a dependency stops hearing about it.
#[test]
fn dynamic_dependencies_are_pruned() {
    let mut rt = Runtime::new();

    let use_x = rt.signal(true);
    let x = rt.signal(1);
    let y = rt.signal(2);
    let c = rt.computed(move |rt, _| if use_x.get(rt) { x.get(rt) } else { y.get(rt) });

    assert_eq!(c.get(&mut rt), 1);
    let x_link = rt.graph().subs(x.id()).next().expect("x is read");
    assert!(rt.is_valid_link(x_link, c.id()));

    use_x.set(&mut rt, false).unwrap();
    assert_eq!(c.get(&mut rt), 2);
    assert!(!rt.is_valid_link(x_link, c.id()));
    assert_eq!(x.subscriber_count(&rt), 0);

    x.set(&mut rt, 100).unwrap();
    assert_eq!(c.state(&rt).unwrap(), NodeState::Clean);
    assert_eq!(c.get(&mut rt), 2);
}

/// An unchanged intermediate result stops invalidation.
#[test]
fn equal_recompute_cuts_off_downstream() {
    let mut rt = Runtime::new();

    let downstream_runs = Rc::new(Cell::new(0));
    let counter = Rc::clone(&downstream_runs);
    let effect_runs = Rc::new(Cell::new(0));
    let effect_counter = Rc::clone(&effect_runs);

    let n = rt.signal(2);
    let parity = rt.computed(move |rt, _| n.get(rt) % 2);
    let label = rt.computed(move |rt, _| {
        counter.set(counter.get() + 1);
        if parity.get(rt) == 0 { "even" } else { "odd" }
    });
    rt.effect(move |rt| {
        label.get(rt);
        effect_counter.set(effect_counter.get() + 1);
    });

    n.set(&mut rt, 4).unwrap();
    n.set(&mut rt, 6).unwrap();

    assert_eq!(downstream_runs.get(), 1);
    assert_eq!(effect_runs.get(), 1);

    n.set(&mut rt, 7).unwrap();
    assert_eq!(downstream_runs.get(), 2);
    assert_eq!(effect_runs.get(), 2);
    assert_eq!(label.get(&mut rt), "odd");
}

/// Effects queued by one write run in notification order.
#[test]
fn effects_run_in_notification_order() {
    let mut rt = Runtime::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    let s = rt.signal(0);

    for name in ["first", "second", "third"] {
        let sink = Rc::clone(&order);
        rt.effect(move |rt| {
            if s.get(rt) > 0 {
                sink.borrow_mut().push(name);
            }
        });
    }

    s.set(&mut rt, 1).unwrap();
    assert_eq!(*order.borrow(), ["first", "second", "third"]);
}

/// Runaway effects stop at the configured limit.
#[test]
fn flush_limit_from_config() {
    init_tracing();
    let config = RuntimeConfig::from_json(r#"{ "max_flush_runs": 4 }"#).unwrap();
    let mut rt = Runtime::with_config(config);

    let a = rt.signal(0_u64);
    let b = rt.signal(0_u64);
    rt.effect(move |rt| {
        let next = a.get(rt) + 1;
        b.set(rt, next).ok();
    });
    rt.effect(move |rt| {
        let next = b.get(rt) + 1;
        a.set(rt, next).ok();
    });

    let err = a.set(&mut rt, 1_000).unwrap_err();
    assert!(matches!(err, ReactiveError::FlushLimitExceeded { limit: 4 }));
    assert!(err.to_string().contains("4 runs"));
    assert_eq!(rt.pending_effects(), 0);
}

/// The engine works with any host, not only the runtime.
#[test]
fn callback_host_reports_unwatched_once() {
    let unwatched = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&unwatched);

    let mut system = create_reactive_system(
        Graph::<u8>::new(),
        |_, _| false,
        |_, _| {},
        move |_, node| log.borrow_mut().push(node),
    );

    let dep = system.graph_mut().insert_node(Flags::MUTABLE, 0);
    let first = system.graph_mut().insert_node(Flags::MUTABLE, 1);
    let second = system.graph_mut().insert_node(Flags::MUTABLE, 2);
    system.link(dep, first, 1);
    system.link(dep, second, 2);

    let first_link = system.graph()[first].deps.expect("linked");
    let second_link = system.graph()[second].deps.expect("linked");

    system.unlink(first_link);
    assert!(unwatched.borrow().is_empty());

    system.unlink(second_link);
    assert_eq!(*unwatched.borrow(), [dep]);
    assert!(!system.is_valid_link(second_link, second));
    assert!(system.graph()[dep].subs.is_none());
}

/// Propagation through a callback host notifies watchers once.
#[test]
fn callback_host_notifies_each_watcher_once() {
    let notified = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&notified);

    let mut system = create_reactive_system(
        Graph::<u32>::new(),
        |_, _| true,
        move |_, node| log.borrow_mut().push(node),
        |_, _| {},
    );

    let source = system.graph_mut().insert_node(Flags::MUTABLE, 0);
    let left = system.graph_mut().insert_node(Flags::MUTABLE, 0);
    let right = system.graph_mut().insert_node(Flags::MUTABLE, 0);
    let watcher = system.graph_mut().insert_node(Flags::WATCHING, 0);
    system.link(source, left, 1);
    system.link(source, right, 1);
    system.link(left, watcher, 2);
    system.link(right, watcher, 2);

    let subs = system.graph()[source].subs.expect("has subscribers");
    system.propagate(subs);

    assert_eq!(*notified.borrow(), [watcher]);
    assert!(system.graph()[left].flags.contains(Flags::PENDING));
    assert!(system.graph()[watcher].flags.contains(Flags::PENDING));
}

/// The graph can be dumped as JSON for diagnostics.
#[test]
fn snapshot_serializes_the_graph() {
    let mut rt = Runtime::new();
    let s = rt.signal(1);
    let c = rt.computed(move |rt, _| s.get(rt) + 1);
    rt.effect(move |rt| {
        c.get(rt);
    });

    let snapshot = rt.snapshot();
    assert_eq!(snapshot.nodes.len(), 3);
    assert_eq!(snapshot.edges.len(), 2);

    let json = snapshot.to_json().unwrap();
    assert!(json.contains("\"computed\""));
    assert!(json.contains("\"WATCHING\""));
}
