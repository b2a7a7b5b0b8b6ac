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

//! Splitting a spider in two.

use log::debug;
use rustc_hash::FxHashMap;

use super::*;

/// Which edges of a spider move over to its split copy.
#[derive(Debug, Clone, PartialEq)]
pub enum Partition {
    /// The listed edges. Edges not touching the spider are ignored.
    Edges(Vec<EdgeId>),
    /// Edges to neighbors left of the spider, ties broken by `y`. A spider
    /// with just two edges on the same side always has them separated.
    ByPosition,
    /// No edges, leaving the split copy as a phase gadget.
    Gadget,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    /// The copy holding the moved edges and the left phase.
    pub split: VertexId,
    /// The degree-2 spider joining the copy to the original.
    pub middle: VertexId,
}

#[derive(Debug, Clone, Copy)]
enum SplitPath {
    Through { pedge: EdgeId },
    Around { first: EdgeId, second: EdgeId },
}

#[derive(Debug, Clone)]
struct SplitMatch {
    v: VertexId,
    ty: VType,
    left: Vec<(EdgeId, VertexId, EType)>,
    /// Positions of the copy, the middle spider and the original.
    positions: Option<(Coord, Coord, Coord)>,
    paths: Vec<SplitPath>,
    /// What the original keeps of its phase.
    phase: Angle,
}

/// The spider most touched by `es`, preferring the right-most (then
/// lowest) one on ties.
fn infer_split_vertex(g: &Diagram, es: &[EdgeId]) -> RewriteResult<VertexId> {
    let mut counts: FxHashMap<VertexId, usize> = FxHashMap::default();
    let mut best: Option<(usize, Coord, VertexId)> = None;
    for &e in es {
        let d = require_edge(g, e)?;
        for n in [d.s, d.t] {
            if !g.is_spider(n) {
                continue;
            }
            let count = counts.entry(n).or_insert(0);
            *count += 1;
            let pos = g.coord_or_default(n);
            let better = match best {
                None => true,
                Some((c, p, _)) => {
                    *count > c
                        || (*count == c && (pos.x > p.x || (pos.x == p.x && pos.y > p.y)))
                }
            };
            if better {
                best = Some((*count, pos, n));
            }
        }
    }
    best.map(|(_, _, v)| v).ok_or_else(|| {
        RewriteError::PreconditionFailed("none of the given edges touches a spider".to_string())
    })
}

fn match_split_spider(
    g: &Diagram,
    v: Option<VertexId>,
    partition: &Partition,
    left_phase: &Angle,
    new_color: VType,
) -> RewriteResult<SplitMatch> {
    if !new_color.is_spider() {
        return invalid(format!("cannot join the halves with a {new_color:?} vertex"));
    }
    let v = match (v, partition) {
        (Some(v), _) => {
            require_vertex(g, v)?;
            v
        }
        (None, Partition::Edges(es)) if !es.is_empty() => infer_split_vertex(g, es)?,
        (None, _) => return invalid("a vertex or a non-empty edge list is required"),
    };
    ensure!(g.is_spider(v), "{v} is not Z- or X-type");
    let ty = g
        .vertex_type(v)
        .ok_or_else(|| internal(format!("{v} vanished")))?;
    let phase = shifted_phase(g, v, &-left_phase.clone())?;

    let mut star = Vec::new();
    for &e in g.incident_edges(v) {
        let n = g
            .other_end(e, v)
            .ok_or_else(|| internal(format!("{e} is listed at {v} but does not touch it")))?;
        let ety = g
            .edge_type(e)
            .ok_or_else(|| internal(format!("{e} vanished")))?;
        star.push((e, n, ety));
    }

    let (mut left, mut right): (Vec<_>, Vec<_>) = match partition {
        Partition::Edges(es) => star.into_iter().partition(|(e, _, _)| es.contains(e)),
        Partition::ByPosition => {
            let c = g.coord_or_default(v);
            star.into_iter().partition(|&(_, n, _)| {
                let p = g.coord_or_default(n);
                p.x < c.x || (p.x == c.x && p.y < c.y)
            })
        }
        Partition::Gadget => (Vec::new(), star),
    };
    if matches!(partition, Partition::ByPosition) {
        if left.is_empty() && right.len() == 2 {
            left.push(right.remove(0));
        } else if right.is_empty() && left.len() == 2 {
            right.push(left.remove(1));
        }
    }

    let positions = g.coord(v).map(|c| {
        let side = |es: &[(EdgeId, VertexId, EType)], shift: f64| {
            let ns = es.iter().map(|&(_, n, _)| g.coord_or_default(n));
            let mut p = Coord::centroid(std::iter::once(c).chain(ns)).unwrap_or(c);
            if p.l1_dist(&c) < 12.5 {
                p.x += shift;
            }
            p
        };
        (side(&left, -25.0), c, side(&right, 25.0))
    });

    let moved: Vec<EdgeId> = left.iter().map(|&(e, _, _)| e).collect();
    let mut paths = Vec::new();
    for p in g.paths_of_edges(&moved) {
        let hits: Vec<EdgeId> = g
            .path(p)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|e| moved.contains(e))
            .collect();
        match *hits.as_slice() {
            [pedge] => paths.push(SplitPath::Through { pedge }),
            [first, second] => paths.push(SplitPath::Around { first, second }),
            _ => return Err(internal(format!("path {p} passes {v} more than once"))),
        }
    }

    Ok(SplitMatch {
        v,
        ty,
        left,
        positions,
        paths,
        phase,
    })
}

checker!(match_split_spider => check_split_spider(
    v: Option<VertexId>,
    partition: &Partition,
    left_phase: &Angle,
    new_color: VType
));

/// Splits a spider in two: a copy of the same type takes over the edges
/// selected by `partition` together with `left_phase`, and is joined back to
/// the original through a new phase-0 spider of `new_color` over two Hadamard
/// edges. The original keeps its remaining edges and the rest of its phase.
///
/// Without `v`, the spider is the one most touched by the listed edges. Paths
/// over moved edges follow them, passing through the new spider when they
/// continue on the original.
pub fn split_spider(
    ops: &mut GraphOps,
    v: Option<VertexId>,
    partition: &Partition,
    left_phase: &Angle,
    new_color: VType,
) -> RewriteResult<Split> {
    let m = match_split_spider(ops, v, partition, left_phase, new_color)?;
    let (lp, mp, rp) = match m.positions {
        Some((l, mid, r)) => (Some(l), Some(mid), Some(r)),
        None => (None, None, None),
    };

    let split = ops.add_vertex(m.ty, lp, left_phase.clone());
    let middle = ops.add_vertex(new_color, mp, Angle::zero());
    if let Some(rp) = rp {
        ops.set_coord(m.v, rp, false)?;
    }
    ops.set_phase(m.v, m.phase)?;
    let e1 = ops.add_edge(split, middle, EType::H)?;
    let e2 = ops.add_edge(middle, m.v, EType::H)?;

    let mut moved = FxHashMap::default();
    for &(e, n, ty) in &m.left {
        moved.insert(e, ops.add_edge(n, split, ty)?);
    }
    let moved_to = |e: EdgeId| {
        moved
            .get(&e)
            .copied()
            .ok_or_else(|| internal(format!("{e} was not moved")))
    };
    for plan in &m.paths {
        match *plan {
            SplitPath::Through { pedge } => {
                let run = [moved_to(pedge)?, e1, e2];
                ops.substitute_path_edge(pedge, &run, Consumed::NONE)?;
            }
            SplitPath::Around { first, second } => {
                let run = [moved_to(first)?, moved_to(second)?];
                let consumed = Consumed::toward(ops.diagram(), first, m.v, 1);
                ops.substitute_path_edge(first, &run, consumed)?;
            }
        }
    }

    let old: Vec<EdgeId> = m.left.iter().map(|&(e, _, _)| e).collect();
    ops.delete_edges(&old)?;
    debug!(
        "split_spider: {} split off {split} with {} edges, joined over {middle}",
        m.v,
        old.len()
    );
    Ok(Split { split, middle })
}
