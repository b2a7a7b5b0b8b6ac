// zxpath - ZX-diagram rewriting with traced paths
// Copyright (C) 2021 - Aleks Kissinger
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Growing and shrinking chains of Hadamard edges.

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use super::*;

#[derive(Debug, Clone, Copy)]
struct ExpandMatch {
    ty: EType,
    /// The segment that keeps a normal edge's type, counted from the source.
    keep: usize,
}

fn match_expand_hadamard_edge(
    g: &Diagram,
    e: EdgeId,
    color: VType,
) -> RewriteResult<ExpandMatch> {
    let d = require_edge(g, e)?;
    if !color.is_spider() {
        return invalid(format!("cannot expand into {color:?} vertices"));
    }
    ensure!(
        d.ty == EType::H || g.is_spider(d.s) || g.is_spider(d.t),
        "{e} is a plain wire between non-spiders"
    );
    let keep = if g.is_boundary(d.t) && !g.is_boundary(d.s) {
        2
    } else {
        0
    };
    Ok(ExpandMatch { ty: d.ty, keep })
}

checker!(match_expand_hadamard_edge => check_expand_hadamard_edge(e: EdgeId, color: VType));

/// Replaces `e` by a chain of three Hadamard edges through two new phase-0
/// spiders of the given color.
///
/// A normal edge becomes a chain whose segment next to a boundary (or next
/// to the source, when neither or both ends are boundaries) stays normal.
/// Paths over `e` follow the chain.
pub fn expand_hadamard_edge(
    ops: &mut GraphOps,
    e: EdgeId,
    color: VType,
) -> RewriteResult<Subdivision> {
    let m = match_expand_hadamard_edge(ops, e, color)?;
    let sub = ops.insert_vertices_along_edge(e, 2, Some(EType::H), color)?;
    if m.ty == EType::N {
        ops.set_edge_type(sub.edges[m.keep], EType::N)?;
    }
    debug!("expand_hadamard_edge: {e} into {:?}", sub.vertices);
    Ok(sub)
}

/// How a path touching the vertex merged away is carried over.
#[derive(Debug, Clone, Copy)]
enum FusePath {
    /// The path arrives over `pedge` at the merged-away spider and continues
    /// through the removed degree-2 spider.
    Through { pedge: EdgeId },
    /// The path passes the merged-away spider over `first` and `second`
    /// without visiting the removed one.
    Around { first: EdgeId, second: EdgeId },
}

#[derive(Debug, Clone)]
struct FuseMatch {
    v: VertexId,
    merge: VertexId,
    other: VertexId,
    average_position: bool,
    /// Edges of `other` other than the one to `v`, with their far ends.
    transfers: Vec<(EdgeId, VertexId, EType)>,
    paths: Vec<FusePath>,
    /// The summed phase of `merge` and `other`.
    phase: Angle,
}

fn match_fuse_degree2_spider(
    g: &Diagram,
    v: VertexId,
    starting_edge: Option<EdgeId>,
) -> RewriteResult<FuseMatch> {
    require_vertex(g, v)?;
    ensure!(g.is_spider(v), "{v} is not Z- or X-type");
    ensure!(g.has_phase_zero(v), "{v} has a non-zero phase");
    let es = g.incident_edges(v);
    ensure!(
        es.len() == 2 && g.hadamard_degree(v) == 2,
        "{v} does not have exactly two Hadamard edges"
    );
    let (e0, e1) = (es[0], es[1]);
    let missing = || internal(format!("edges of {v} do not touch it"));
    let n0 = g.other_end(e0, v).ok_or_else(missing)?;
    let n1 = g.other_end(e1, v).ok_or_else(missing)?;
    ensure!(n0 != n1, "multi-edge between {v} and {n0}");
    ensure!(
        g.is_spider(n0) && g.vertex_type(n0) == g.vertex_type(n1),
        "neighbors of {v} are not spiders of the same type"
    );

    let (link, merge, other) = match starting_edge {
        Some(se) if se == e0 => (e0, n1, n0),
        Some(se) if se == e1 => (e1, n0, n1),
        Some(se) => return invalid(format!("{se} is not an edge of {v}")),
        None if n0 < n1 => (e1, n0, n1),
        None => (e0, n1, n0),
    };
    let merge_ty = g.vertex_type(merge);
    let phase = shifted_phase(g, merge, &g.phase(other).cloned().unwrap_or_default())?;

    let mut transfers = Vec::new();
    let mut seen = FxHashSet::default();
    for &e in g.incident_edges(other) {
        if e == link {
            continue;
        }
        let w = g.other_end(e, other).ok_or_else(missing)?;
        let ty = g
            .edge_type(e)
            .ok_or_else(|| internal(format!("{e} vanished")))?;
        ensure!(seen.insert(w), "multi-edge between {other} and {w}");
        if w != merge {
            let existing = g.edges_between(merge, w).len();
            let absorbed = ty == EType::H && g.vertex_type(w) == merge_ty;
            ensure!(
                existing == 0 || (absorbed && existing == 1),
                "merging {other} into {merge} would create a multi-edge to {w}"
            );
        }
        transfers.push((e, w, ty));
    }

    let mut paths = Vec::new();
    for p in g.paths_of_edges(&g.edges_of(&[v, other])) {
        let pes = g.path(p).unwrap_or_default();
        let walk = g
            .path_vertices(p)
            .ok_or_else(|| internal(format!("path {p} is disconnected")))?;
        let k = walk
            .iter()
            .position(|&x| x == other)
            .ok_or_else(|| internal(format!("path {p} misses {other}")))?;
        if k == 0 || k + 1 >= walk.len() {
            return Err(internal(format!("path {p} ends at spider {other}")));
        }
        let (before, after) = (pes[k - 1], pes[k]);
        if walk[k - 1] == v {
            paths.push(FusePath::Through { pedge: after });
        } else if walk[k + 1] == v {
            paths.push(FusePath::Through { pedge: before });
        } else {
            paths.push(FusePath::Around {
                first: before,
                second: after,
            });
        }
    }

    Ok(FuseMatch {
        v,
        merge,
        other,
        average_position: starting_edge.is_none(),
        transfers,
        paths,
        phase,
    })
}

checker!(match_fuse_degree2_spider => check_fuse_degree2_spider(
    v: VertexId,
    starting_edge: Option<EdgeId>
));

fn apply_fuse(ops: &mut GraphOps, m: FuseMatch) -> RewriteResult<VertexId> {
    ops.set_phase(m.merge, m.phase.clone())?;
    // old edge of `other` -> its replacement at `merge`
    let mut moved: FxHashMap<EdgeId, Option<EdgeId>> = FxHashMap::default();
    for &(e, w, ty) in &m.transfers {
        let new = if w == m.merge {
            if ty == EType::H {
                ops.toggle_hadamard_or_self_loop(m.merge, m.merge, true)?;
            }
            None
        } else if ty == EType::H {
            ops.toggle_hadamard_or_self_loop(m.merge, w, true)?
        } else {
            Some(ops.add_edge(m.merge, w, ty)?)
        };
        moved.insert(e, new);
    }
    let moved_to = |e: EdgeId| moved.get(&e).copied().flatten();

    for plan in &m.paths {
        match *plan {
            FusePath::Through { pedge } => match moved_to(pedge) {
                Some(n) => {
                    let consumed = Consumed::toward(ops.diagram(), pedge, m.other, 2);
                    ops.substitute_path_edge(pedge, &[n], consumed)?;
                }
                None => drop_paths(ops, pedge, "its edge collapsed into a self-loop"),
            },
            FusePath::Around { first, second } => {
                let (n1, n2) = (moved_to(first), moved_to(second));
                let run = if ops.other_end(first, m.other) == Some(m.merge) {
                    n2.map(|n| vec![n])
                } else if ops.other_end(second, m.other) == Some(m.merge) {
                    n1.map(|n| vec![n])
                } else {
                    n1.zip(n2).map(|(a, b)| vec![a, b])
                };
                match run {
                    Some(run) => {
                        let consumed = Consumed::toward(ops.diagram(), first, m.other, 1);
                        ops.substitute_path_edge(first, &run, consumed)?;
                    }
                    None => drop_paths(ops, first, "its edges collapsed into a self-loop"),
                }
            }
        }
    }

    if m.average_position {
        if let Some(c) = centroid_of(ops, &[m.merge, m.other]) {
            ops.set_coord(m.merge, c, false)?;
        }
    }
    ops.delete_vertices(&[m.v, m.other])?;
    debug!(
        "fuse_degree2_spider: removed {}, merged {} into {}",
        m.v, m.other, m.merge
    );
    Ok(m.merge)
}

/// Removes a phase-0 spider `v` with exactly two Hadamard edges to spiders of
/// the same type, fusing those two neighbors into one.
///
/// The neighbor across `starting_edge` is merged into the other one. Without
/// a starting edge, the neighbor with the larger id is merged into the other,
/// which moves to their mean position. Returns the surviving neighbor.
pub fn fuse_degree2_spider(
    ops: &mut GraphOps,
    v: VertexId,
    starting_edge: Option<EdgeId>,
) -> RewriteResult<VertexId> {
    let m = match_fuse_degree2_spider(ops, v, starting_edge)?;
    apply_fuse(ops, m)
}

fn match_cancel_hadamard_edge(g: &Diagram, e: EdgeId) -> RewriteResult<FuseMatch> {
    let d = require_edge(g, e)?;
    ensure!(d.ty == EType::H, "{e} is not a Hadamard edge");
    match_fuse_degree2_spider(g, d.s, Some(e))
        .or_else(|_| match_fuse_degree2_spider(g, d.t, Some(e)))
}

checker!(match_cancel_hadamard_edge => check_cancel_hadamard_edge(e: EdgeId));

/// Cancels the Hadamard edge `e` against a neighboring one, by fusing away
/// whichever endpoint of `e` is a removable degree-2 spider (the source is
/// tried first). Returns the surviving spider.
pub fn cancel_hadamard_edge(ops: &mut GraphOps, e: EdgeId) -> RewriteResult<VertexId> {
    let m = match_cancel_hadamard_edge(ops, e)?;
    apply_fuse(ops, m)
}
