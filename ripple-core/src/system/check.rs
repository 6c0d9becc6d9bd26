//! Pull-side validation: `check_dirty`.
//!
//! # Algorithm
//!
//! A pending node only knows that something upstream *may* have changed.
//! Before its value is used, the host asks `check_dirty` to settle it:
//!
//! 1. Walk the node's dependencies in order.
//! 2. A dirty mutable dependency is updated right away; if its value
//!    changed, the node is dirty and the walk stops.
//! 3. A pending mutable dependency is settled first, depth first, by walking
//!    its own dependencies the same way.
//! 4. When a level finishes, a dirty level node is updated (and its change,
//!    if any, carried one level up); a clean one just drops `PENDING`.
//!
//! Descending pushes the link to resume from on an explicit stack when the
//! level node has several subscribers. With a single subscriber the way back
//! up is the node's only subscriber link, so nothing needs to be stored.

use smallvec::SmallVec;
use tracing::trace;

use super::propagate::shallow_propagate;
use super::Host;
use crate::graph::{Flags, LinkId, NodeId};

/// Settle whether `sub` must be recomputed, starting from its dependency `link`.
pub(crate) fn check_dirty<H: Host + ?Sized>(host: &mut H, link: LinkId, sub: NodeId) -> bool {
    let mut link = link;
    let mut sub = sub;
    let mut stack: SmallVec<[LinkId; 16]> = SmallVec::new();
    let mut check_depth = 0usize;
    let mut dirty = false;

    'top: loop {
        let graph = host.graph();
        let current = &graph.links[link];
        let dep = current.dep;
        let dep_is_shared = current.next_sub.is_some() || current.prev_sub.is_some();
        let flags = graph.nodes[dep].flags;
        let dep_deps = graph.nodes[dep].deps;

        if graph.nodes[sub].flags.contains(Flags::DIRTY) {
            dirty = true;
        } else if flags.contains(Flags::MUTABLE | Flags::DIRTY) {
            if host.update(dep) {
                let graph = host.graph();
                let fan_out = graph.nodes[dep]
                    .subs
                    .filter(|&subs| graph.links[subs].next_sub.is_some());
                if let Some(subs) = fan_out {
                    shallow_propagate(host, subs);
                }
                dirty = true;
            }
        } else if flags.contains(Flags::MUTABLE | Flags::PENDING) {
            match dep_deps {
                Some(first) => {
                    if dep_is_shared {
                        stack.push(link);
                    }
                    link = first;
                    sub = dep;
                    check_depth += 1;
                    continue;
                }
                // Nothing upstream can have changed.
                None => host.graph_mut().nodes[dep].flags.remove(Flags::PENDING),
            }
        }

        if !dirty {
            if let Some(next_dep) = host.graph().links[link].next_dep {
                link = next_dep;
                continue;
            }
        }

        while check_depth > 0 {
            check_depth -= 1;

            let graph = host.graph();
            let first_sub = graph.nodes[sub].subs;
            debug_assert!(
                first_sub.is_some(),
                "a node under validation is reachable from a subscriber"
            );
            let Some(first_sub) = first_sub else {
                return dirty;
            };
            let has_multiple_subs = graph.links[first_sub].next_sub.is_some();
            let resume = if has_multiple_subs { stack.pop() } else { Some(first_sub) };
            debug_assert!(resume.is_some(), "resume link pushed when descending");
            let Some(resume) = resume else {
                return dirty;
            };
            link = resume;

            if dirty {
                if host.update(sub) {
                    if has_multiple_subs {
                        shallow_propagate(host, first_sub);
                    }
                    sub = host.graph().links[link].sub;
                    continue;
                }
                dirty = false;
            } else {
                host.graph_mut().nodes[sub].flags.remove(Flags::PENDING);
            }

            sub = host.graph().links[link].sub;
            if let Some(next_dep) = host.graph().links[link].next_dep {
                link = next_dep;
                continue 'top;
            }
        }

        trace!(?sub, dirty, "checked");
        return dirty;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use crate::graph::{Flags, Graph, NodeId};
    use crate::system::link::link;
    use crate::system::{create_reactive_system, Host, ReactiveSystem};

    /// A host whose `update` clears the node's stale flags and reports a
    /// change for the nodes listed in `changing`.
    fn system_with_updates(
        changing: Rc<RefCell<HashSet<NodeId>>>,
        updates: Rc<RefCell<Vec<NodeId>>>,
    ) -> impl ReactiveSystem<Payload = &'static str> {
        create_reactive_system(
            Graph::new(),
            move |graph: &mut Graph<&'static str>, node| {
                updates.borrow_mut().push(node);
                graph[node].flags.remove(Flags::DIRTY | Flags::PENDING);
                changing.borrow().contains(&node)
            },
            |_, _| {},
            |_, _| {},
        )
    }

    struct Chain {
        s: NodeId,
        a: NodeId,
        b: NodeId,
        sub: NodeId,
    }

    /// `s -> a -> b -> sub`, with `s` written and the write propagated.
    fn written_chain(system: &mut impl ReactiveSystem<Payload = &'static str>) -> Chain {
        let graph = system.graph_mut();
        let s = graph.insert_node(Flags::MUTABLE, "s");
        let a = graph.insert_node(Flags::MUTABLE, "a");
        let b = graph.insert_node(Flags::MUTABLE, "b");
        let sub = graph.insert_node(Flags::WATCHING, "sub");

        system.link(s, a, 1);
        system.link(a, b, 1);
        system.link(b, sub, 1);

        system.graph_mut()[s].flags.insert(Flags::DIRTY);
        let start = system.graph()[s].subs.expect("subscribed");
        system.propagate(start);

        Chain { s, a, b, sub }
    }

    #[test]
    fn unchanged_source_settles_chain_without_recompute() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));
        let chain = written_chain(&mut system);

        let first = system.graph()[chain.sub].deps.expect("linked");
        let dirty = system.check_dirty(first, chain.sub);

        assert!(!dirty);
        // Only the dirty signal itself is committed.
        assert_eq!(*updates.borrow(), vec![chain.s]);
        assert!(!system.graph()[chain.a].flags.contains(Flags::PENDING));
        assert!(!system.graph()[chain.b].flags.contains(Flags::PENDING));
    }

    #[test]
    fn nothing_dirty_means_no_updates() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));

        let graph = system.graph_mut();
        let s = graph.insert_node(Flags::MUTABLE, "s");
        let a = graph.insert_node(Flags::MUTABLE | Flags::PENDING, "a");
        let sub = graph.insert_node(Flags::WATCHING | Flags::PENDING, "sub");
        system.link(s, a, 1);
        system.link(a, sub, 1);

        let first = system.graph()[sub].deps.expect("linked");
        assert!(!system.check_dirty(first, sub));
        assert!(updates.borrow().is_empty());
        assert!(!system.graph()[a].flags.contains(Flags::PENDING));
    }

    #[test]
    fn changed_source_recomputes_each_level_once() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));
        let chain = written_chain(&mut system);
        changing.borrow_mut().extend([chain.s, chain.a, chain.b]);

        let first = system.graph()[chain.sub].deps.expect("linked");
        let dirty = system.check_dirty(first, chain.sub);

        assert!(dirty);
        assert_eq!(*updates.borrow(), vec![chain.s, chain.a, chain.b]);
    }

    #[test]
    fn change_absorbed_midway_stops_dirtiness() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));
        let chain = written_chain(&mut system);
        // `a` recomputes to the same value it had before.
        changing.borrow_mut().insert(chain.s);

        let first = system.graph()[chain.sub].deps.expect("linked");
        let dirty = system.check_dirty(first, chain.sub);

        assert!(!dirty);
        assert_eq!(*updates.borrow(), vec![chain.s, chain.a]);
        assert!(!system.graph()[chain.b].flags.contains(Flags::PENDING));
    }

    #[test]
    fn already_dirty_subscriber_short_circuits() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));

        let graph = system.graph_mut();
        let s = graph.insert_node(Flags::MUTABLE, "s");
        let sub = graph.insert_node(Flags::WATCHING | Flags::DIRTY, "sub");
        system.link(s, sub, 1);

        let first = system.graph()[sub].deps.expect("linked");
        assert!(system.check_dirty(first, sub));
        assert!(updates.borrow().is_empty());
    }

    #[test]
    fn shared_dependency_marks_siblings_dirty() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));

        let graph = system.graph_mut();
        let s = graph.insert_node(Flags::MUTABLE, "s");
        let a = graph.insert_node(Flags::MUTABLE, "a");
        let left = graph.insert_node(Flags::WATCHING, "left");
        let right = graph.insert_node(Flags::WATCHING, "right");
        system.link(s, a, 1);
        system.link(a, left, 1);
        system.link(a, right, 1);

        system.graph_mut()[s].flags.insert(Flags::DIRTY);
        let start = system.graph()[s].subs.expect("subscribed");
        system.propagate(start);
        changing.borrow_mut().extend([s, a]);

        let first = system.graph()[left].deps.expect("linked");
        assert!(system.check_dirty(first, left));

        // `right` learns about the change without walking the chain again.
        assert!(system.graph()[right].flags.contains(Flags::DIRTY));
        assert_eq!(*updates.borrow(), vec![s, a]);
    }

    #[test]
    fn pending_dependency_without_deps_is_cleared() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));

        let graph = system.graph_mut();
        let a = graph.insert_node(Flags::MUTABLE | Flags::PENDING, "a");
        let sub = graph.insert_node(Flags::WATCHING | Flags::PENDING, "sub");
        system.link(a, sub, 1);

        let first = system.graph()[sub].deps.expect("linked");
        assert!(!system.check_dirty(first, sub));
        assert!(!system.graph()[a].flags.contains(Flags::PENDING));
    }

    #[test]
    fn deep_pending_chain_is_checked_iteratively() {
        let changing = Rc::new(RefCell::new(HashSet::new()));
        let updates = Rc::new(RefCell::new(Vec::new()));
        let mut system = system_with_updates(Rc::clone(&changing), Rc::clone(&updates));

        let source = system.graph_mut().insert_node(Flags::MUTABLE, "source");
        let mut prev = source;
        for _ in 0..50_000 {
            let next = system.graph_mut().insert_node(Flags::MUTABLE, "link");
            system.link(prev, next, 1);
            prev = next;
        }
        let sub = system.graph_mut().insert_node(Flags::WATCHING, "sub");
        system.link(prev, sub, 1);

        let start = system.graph()[source].subs.expect("subscribed");
        system.propagate(start);

        let first = system.graph()[sub].deps.expect("linked");
        assert!(!system.check_dirty(first, sub));
        assert!(updates.borrow().is_empty());
        assert!(!system.graph()[prev].flags.contains(Flags::PENDING));
    }

    /// A host that gives a level node a new subscriber mid-walk leaves no
    /// resume link on the stack; the walk ends with what it knows so far.
    #[test]
    #[cfg_attr(debug_assertions, should_panic(expected = "resume link pushed when descending"))]
    fn subscriber_gained_during_update_ends_the_walk() {
        let mut graph = Graph::new();
        let s = graph.insert_node(Flags::MUTABLE | Flags::DIRTY, "s");
        let c = graph.insert_node(Flags::MUTABLE | Flags::PENDING, "c");
        let sub = graph.insert_node(Flags::WATCHING | Flags::PENDING, "sub");
        let extra = graph.insert_node(Flags::WATCHING, "extra");
        link(&mut graph, s, c, 1);
        link(&mut graph, c, sub, 1);

        let mut system = create_reactive_system(
            graph,
            move |graph: &mut Graph<&'static str>, node| {
                graph[node].flags.remove(Flags::DIRTY | Flags::PENDING);
                if node == s {
                    link(graph, c, extra, 1);
                }
                true
            },
            |_, _| {},
            |_, _| {},
        );

        let first = system.graph()[sub].deps.expect("linked");
        assert!(system.check_dirty(first, sub));
    }
}
