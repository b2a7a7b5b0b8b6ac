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

//! Traced paths.
//!
//! A path is an ordered run of edges forming a simple walk from one boundary
//! to another through non-boundary vertices. Paths are an overlay on the
//! diagram: they never own edges, and no two paths share an edge or a vertex.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::diagram::Diagram;
use crate::graph::{EdgeId, VertexId};

/// The reason a set of edges does not form a valid path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("empty path")]
    Empty,
    #[error("nonexistent edge {0}")]
    MissingEdge(EdgeId),
    #[error("path overlaps with current edge or node of another path")]
    Overlap,
    #[error("path overlaps with itself or has loops")]
    SelfOverlap,
    #[error("path ends must be boundary nodes")]
    EndNotBoundary,
    #[error("path body must not be boundary nodes")]
    BodyBoundary,
    #[error("path is disconnected or a loop")]
    DisconnectedOrLoop,
    #[error("path is a valid path but with one or more disconnected loops")]
    DisconnectedLoops,
}

/// Checks that `edges` form a valid path and returns them in walk order,
/// starting from the endpoint that occurs first in `edges`.
///
/// Unless `ignore_current` is set, a path sharing an edge or vertex with an
/// existing path is rejected. The outcome does not depend on the order of
/// `edges`, only the orientation of the result does.
pub fn sort_valid_path_edges(
    g: &Diagram,
    edges: &[EdgeId],
    ignore_current: bool,
) -> Result<Vec<EdgeId>, PathError> {
    if edges.is_empty() {
        return Err(PathError::Empty);
    }
    let mut seen = FxHashSet::default();
    for &e in edges {
        if !g.contains_edge(e) {
            return Err(PathError::MissingEdge(e));
        }
        if !seen.insert(e) {
            return Err(PathError::SelfOverlap);
        }
    }
    if !ignore_current && !g.paths_conflicting_with_edges(edges).is_empty() {
        return Err(PathError::Overlap);
    }

    // count vertex occurrences, remembering first-seen order
    let mut counts: FxHashMap<VertexId, usize> = FxHashMap::default();
    let mut order = Vec::new();
    let mut incident: FxHashMap<VertexId, Vec<EdgeId>> = FxHashMap::default();
    for &e in edges {
        let Some(d) = g.edge(e) else {
            return Err(PathError::MissingEdge(e));
        };
        for v in [d.s, d.t] {
            let c = counts.entry(v).or_insert(0);
            if *c == 0 {
                order.push(v);
            }
            *c += 1;
            incident.entry(v).or_default().push(e);
        }
    }

    let mut ends = Vec::new();
    for &v in &order {
        match counts[&v] {
            1 if !g.is_boundary(v) => return Err(PathError::EndNotBoundary),
            1 => ends.push(v),
            2 if g.is_boundary(v) => return Err(PathError::BodyBoundary),
            2 => {}
            _ => return Err(PathError::SelfOverlap),
        }
    }
    if ends.len() != 2 {
        return Err(PathError::DisconnectedOrLoop);
    }

    let mut sorted = Vec::with_capacity(edges.len());
    let mut used = FxHashSet::default();
    let mut current = ends[0];
    while current != ends[1] {
        let next = incident[&current]
            .iter()
            .copied()
            .find(|e| !used.contains(e));
        let Some(e) = next else {
            break;
        };
        used.insert(e);
        sorted.push(e);
        match g.other_end(e, current) {
            Some(v) => current = v,
            None => break,
        }
    }
    if sorted.len() != edges.len() {
        return Err(PathError::DisconnectedLoops);
    }
    Ok(sorted)
}

/// The vertices along an ordered run of edges, or `None` if consecutive edges
/// do not meet. A single edge is walked from its source.
pub fn walk(g: &Diagram, edges: &[EdgeId]) -> Option<Vec<VertexId>> {
    let first = g.edge(*edges.first()?)?;
    let start = match edges.get(1) {
        Some(&e1) => {
            let d1 = g.edge(e1)?;
            if d1.touches(first.t) {
                first.s
            } else if d1.touches(first.s) {
                first.t
            } else {
                return None;
            }
        }
        None => first.s,
    };
    let mut vs = vec![start];
    let mut current = start;
    for &e in edges {
        current = g.other_end(e, current)?;
        vs.push(current);
    }
    Some(vs)
}

/// The number of further path edges taken out by a path substitution, on
/// either side of the substituted edge.
///
/// `before` counts edges on the side of the edge's source vertex, `after`
/// those on the side of its target (see [`crate::graph::EData`] for the
/// canonical orientation).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Consumed {
    pub before: usize,
    pub after: usize,
}

impl Consumed {
    pub const NONE: Consumed = Consumed {
        before: 0,
        after: 0,
    };

    /// Consume `n` further edges on the side of `edge` where `v` lies.
    pub fn toward(g: &Diagram, edge: EdgeId, v: VertexId, n: usize) -> Consumed {
        match g.edge_endpoints(edge) {
            Some((s, _)) if s == v => Consumed { before: n, after: 0 },
            _ => Consumed { before: 0, after: n },
        }
    }
}
