//! Edge maintenance: `link` and `unlink`.

use tracing::debug;

use super::Host;
use crate::graph::{Graph, Link, LinkId, NodeId};

/// Record that `sub` read `dep` during the pass tagged `version`.
pub(crate) fn link<P>(graph: &mut Graph<P>, dep: NodeId, sub: NodeId, version: u64) {
    let prev_dep = graph.nodes[sub].deps_tail;
    if let Some(tail) = prev_dep {
        if graph.links[tail].dep == dep {
            return;
        }
    }

    let prev_sub = graph.nodes[dep].subs_tail;
    if let Some(tail) = prev_sub {
        let tail = &graph.links[tail];
        if tail.version == version && tail.sub == sub {
            return;
        }
    }

    let epoch = graph.nodes[sub].deps_epoch;

    // Dependencies are usually read in the same order as last time, so the
    // edge right after the cursor is the one to reuse.
    let next_dep = match prev_dep {
        Some(tail) => graph.links[tail].next_dep,
        None => graph.nodes[sub].deps,
    };
    if let Some(next) = next_dep {
        let candidate = &mut graph.links[next];
        if candidate.dep == dep {
            candidate.version = version;
            candidate.dep_epoch = epoch;
            graph.nodes[sub].deps_tail = Some(next);
            return;
        }
    }

    let new_link = graph.links.insert(Link {
        dep,
        sub,
        prev_sub,
        next_sub: None,
        prev_dep,
        next_dep,
        version,
        dep_epoch: epoch,
    });

    // Splice into the subscriber's list right after the cursor. Stale edges
    // behind it stay in place until the host purges them.
    if let Some(next) = next_dep {
        graph.links[next].prev_dep = Some(new_link);
    }
    match prev_dep {
        Some(tail) => graph.links[tail].next_dep = Some(new_link),
        None => graph.nodes[sub].deps = Some(new_link),
    }
    graph.nodes[sub].deps_tail = Some(new_link);

    match prev_sub {
        Some(tail) => graph.links[tail].next_sub = Some(new_link),
        None => graph.nodes[dep].subs = Some(new_link),
    }
    graph.nodes[dep].subs_tail = Some(new_link);
}

/// Detach `link` from both of its lists and free it.
///
/// Returns the link that followed it in its subscriber's dependency list.
pub(crate) fn unlink<H: Host + ?Sized>(host: &mut H, link: LinkId) -> Option<LinkId> {
    let graph = host.graph_mut();
    let Link {
        dep,
        sub,
        prev_sub,
        next_sub,
        prev_dep,
        next_dep,
        ..
    } = graph.links.remove(link)?;

    match prev_dep {
        Some(prev) => graph.links[prev].next_dep = next_dep,
        None => graph.nodes[sub].deps = next_dep,
    }
    match next_dep {
        Some(next) => graph.links[next].prev_dep = prev_dep,
        None => graph.nodes[sub].deps_tail = prev_dep,
    }
    // The cursor may still point at the edge being removed.
    if graph.nodes[sub].deps_tail == Some(link) {
        graph.nodes[sub].deps_tail = prev_dep;
    }

    match prev_sub {
        Some(prev) => graph.links[prev].next_sub = next_sub,
        None => graph.nodes[dep].subs = next_sub,
    }
    match next_sub {
        Some(next) => graph.links[next].prev_sub = prev_sub,
        None => graph.nodes[dep].subs_tail = prev_sub,
    }

    if graph.nodes[dep].subs.is_none() {
        debug!(?dep, "node lost its last subscriber");
        host.unwatched(dep);
    }

    next_dep
}
