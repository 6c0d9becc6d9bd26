//! Push-side invalidation: `propagate` and `shallow_propagate`.
//!
//! # Algorithm
//!
//! `propagate` walks every subscriber reachable from a changed node, depth
//! first, and marks it `PENDING`. Watching nodes are notified, mutable nodes
//! are descended into. Nothing is recomputed here; whether a pending node
//! really changed is decided later, on read, by `check_dirty`.
//!
//! The walk keeps its own stack of sibling continuations instead of
//! recursing, so the depth of the graph is bounded by memory, not by the
//! call stack.

use smallvec::SmallVec;
use tracing::trace;

use super::Host;
use crate::graph::{Flags, LinkId};

/// Mark everything downstream of `link`'s dependency as pending.
pub(crate) fn propagate<H: Host + ?Sized>(host: &mut H, link: LinkId) {
    let mut link = link;
    let mut next = host.graph().links[link].next_sub;
    let mut stack: SmallVec<[Option<LinkId>; 16]> = SmallVec::new();

    'top: loop {
        let graph = host.graph_mut();
        let sub = graph.links[link].sub;
        let mut flags = graph.nodes[sub].flags;

        if !flags
            .intersects(Flags::RECURSED_CHECK | Flags::RECURSED | Flags::DIRTY | Flags::PENDING)
        {
            graph.nodes[sub].flags = flags | Flags::PENDING;
        } else if !flags.intersects(Flags::RECURSED_CHECK | Flags::RECURSED) {
            flags = Flags::NONE;
        } else if !flags.contains(Flags::RECURSED_CHECK) {
            graph.nodes[sub].flags = (flags - Flags::RECURSED) | Flags::PENDING;
        } else if !flags.intersects(Flags::DIRTY | Flags::PENDING)
            && graph.is_valid_link(link, sub)
        {
            // `sub` is collecting its dependencies right now and has already
            // read this edge: remember it was reached, but never notify it.
            graph.nodes[sub].flags = flags | Flags::RECURSED | Flags::PENDING;
            flags &= Flags::MUTABLE;
        } else {
            flags = Flags::NONE;
        }

        if flags.contains(Flags::WATCHING) {
            trace!(?sub, "notify");
            host.notify(sub);
        }

        if flags.contains(Flags::MUTABLE) {
            let graph = host.graph();
            if let Some(sub_subs) = graph.nodes[sub].subs {
                link = sub_subs;
                let next_sub = graph.links[sub_subs].next_sub;
                if next_sub.is_some() {
                    stack.push(next);
                    next = next_sub;
                }
                continue;
            }
        }

        if let Some(sibling) = next {
            link = sibling;
            next = host.graph().links[sibling].next_sub;
            continue;
        }

        while let Some(resume) = stack.pop() {
            if let Some(resume) = resume {
                link = resume;
                next = host.graph().links[resume].next_sub;
                continue 'top;
            }
        }

        break;
    }
}

/// Promote the pending subscribers in the list starting at `link` to dirty.
///
/// Only one level deep: anything further downstream was already marked by
/// the `propagate` pass that made these nodes pending.
pub(crate) fn shallow_propagate<H: Host + ?Sized>(host: &mut H, link: LinkId) {
    let mut cursor = Some(link);

    while let Some(link) = cursor {
        let graph = host.graph_mut();
        let sub = graph.links[link].sub;
        let flags = graph.nodes[sub].flags;

        if flags & (Flags::PENDING | Flags::DIRTY) == Flags::PENDING {
            graph.nodes[sub].flags = flags | Flags::DIRTY;
            if flags & (Flags::WATCHING | Flags::RECURSED_CHECK) == Flags::WATCHING {
                trace!(?sub, "notify");
                host.notify(sub);
            }
        }

        cursor = host.graph().links[link].next_sub;
    }
}
