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

//! # Rewrite rules
//!
//! These rules come in pairs of public functions. For a rule X, there is a
//! function `check_X(&g, ...) -> bool` which checks whether the rule applies
//! without touching the diagram, and `X(&mut ops, ...)` which applies it
//! through [`GraphOps`]. Both run the same private `match_X` first, which
//! checks every precondition and plans how traced paths are carried over to
//! the rewritten diagram. Nothing is modified until matching succeeds, so a
//! rule either fails with the diagram untouched or runs to completion.
//!
//! Any error raised by a primitive after matching succeeded means the
//! matcher missed something, and is reported as
//! [`RewriteError::InternalInconsistency`].

use log::warn;
use rustc_hash::FxHashSet;

use crate::angle::Angle;
use crate::diagram::Diagram;
use crate::graph::*;
use crate::ops::{GraphOps, OpError, Subdivision};
use crate::path::Consumed;

/// Fail with [`RewriteError::PreconditionFailed`] unless a condition holds.
macro_rules! ensure {
    ( $cond:expr, $($msg:tt)+ ) => {
        if !$cond {
            return Err($crate::rules::RewriteError::PreconditionFailed(format!($($msg)+)));
        }
    };
}

/// Define the `check_X` function of a rule from its matcher.
macro_rules! checker {
    ( $matcher:ident => $name:ident ( $( $arg:ident : $ty:ty ),* ) ) => {
        /// Checks whether the rule applies. Never modifies the diagram.
        ///
        /// See the rule of the same name without the `check_` prefix.
        pub fn $name(g: &Diagram, $( $arg: $ty ),*) -> bool {
            $matcher(g, $( $arg ),*).is_ok()
        }
    };
}

mod hadamard;
mod local_comp;
mod pivot;
mod split;

pub use hadamard::*;
pub use local_comp::*;
pub use pivot::*;
pub use split::*;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RewriteError {
    /// The rule was called with arguments that make no sense, such as
    /// unknown ids.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The rule does not apply here.
    #[error("rewrite does not apply: {0}")]
    PreconditionFailed(String),
    /// The engine broke one of its own invariants.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(String),
}

impl From<OpError> for RewriteError {
    fn from(e: OpError) -> Self {
        RewriteError::InternalInconsistency(e.to_string())
    }
}

pub type RewriteResult<T> = Result<T, RewriteError>;

fn invalid<T>(msg: impl Into<String>) -> RewriteResult<T> {
    Err(RewriteError::InvalidArgument(msg.into()))
}

fn internal(msg: impl Into<String>) -> RewriteError {
    RewriteError::InternalInconsistency(msg.into())
}

fn require_vertex(g: &Diagram, v: VertexId) -> RewriteResult<()> {
    if g.contains_vertex(v) {
        Ok(())
    } else {
        invalid(format!("no vertex {v}"))
    }
}

fn require_edge(g: &Diagram, e: EdgeId) -> RewriteResult<EData> {
    match g.edge(e) {
        Some(d) => Ok(d),
        None => invalid(format!("no edge {e}")),
    }
}

/// A non-empty list of distinct existing vertices.
fn require_vertex_set(g: &Diagram, vs: &[VertexId]) -> RewriteResult<()> {
    if vs.is_empty() {
        return invalid("vertex set must be non-empty");
    }
    let mut seen = FxHashSet::default();
    for &v in vs {
        require_vertex(g, v)?;
        if !seen.insert(v) {
            return invalid(format!("{v} is listed twice"));
        }
    }
    Ok(())
}

/// The common type of a set of spiders.
fn common_spider_type(g: &Diagram, vs: &[VertexId]) -> RewriteResult<VType> {
    let mut ty = None;
    for &v in vs {
        ensure!(g.is_spider(v), "{v} is not Z- or X-type");
        let t = g.vertex_type(v);
        ensure!(ty.is_none() || ty == t, "{v} is not of the same type as the others");
        ty = t;
    }
    ty.ok_or_else(|| RewriteError::PreconditionFailed("no spiders given".to_string()))
}

/// Every edge of `v` is a single Hadamard edge to a spider of type `ty`.
/// Returns the neighbors in edge order.
fn hadamard_star(g: &Diagram, v: VertexId, ty: VType) -> RewriteResult<Vec<VertexId>> {
    let mut ns = Vec::new();
    let mut seen = FxHashSet::default();
    for &e in g.incident_edges(v) {
        let n = g
            .other_end(e, v)
            .ok_or_else(|| internal(format!("{e} is listed at {v} but does not touch it")))?;
        ensure!(g.edge_type(e) == Some(EType::H), "{e} is not a Hadamard edge");
        ensure!(
            g.vertex_type(n) == Some(ty),
            "{v} is neighbor to {n}, which is not a {ty:?}-spider"
        );
        ensure!(seen.insert(n), "multi-edge between {v} and {n}");
        ns.push(n);
    }
    Ok(ns)
}

/// Every edge among `vs` is Hadamard and no two vertices are joined twice.
fn hadamard_only_among(g: &Diagram, vs: &[VertexId]) -> RewriteResult<()> {
    let mut pairs = FxHashSet::default();
    for e in g.inner_edges_of(vs) {
        let d = g.edge(e).ok_or_else(|| internal(format!("{e} vanished")))?;
        ensure!(d.ty == EType::H, "existing edge {e} is not a Hadamard edge");
        ensure!(pairs.insert((d.s, d.t)), "multi-edge between {} and {}", d.s, d.t);
    }
    Ok(())
}

/// Pairs `(x, y)` with `x` in `a` and `y` in `b` joined by at most one
/// Hadamard edge.
fn hadamard_only_across(g: &Diagram, a: &[VertexId], b: &[VertexId]) -> RewriteResult<()> {
    for &x in a {
        for &y in b {
            let es = g.edges_between(x, y);
            ensure!(es.len() <= 1, "multi-edge between {x} and {y}");
            if let Some(&e) = es.first() {
                ensure!(
                    g.edge_type(e) == Some(EType::H),
                    "existing edge {e} is not a Hadamard edge"
                );
            }
        }
    }
    Ok(())
}

/// The phase of `v` once `delta` is added to it.
fn shifted_phase(g: &Diagram, v: VertexId, delta: &Angle) -> RewriteResult<Angle> {
    let phase = g.phase(v).cloned().unwrap_or_default();
    phase.checked_add(delta).ok_or_else(|| {
        RewriteError::PreconditionFailed(format!("phase of {v} would be out of range"))
    })
}

fn shifted_phases(
    g: &Diagram,
    vs: &[VertexId],
    delta: &Angle,
) -> RewriteResult<Vec<(VertexId, Angle)>> {
    vs.iter()
        .map(|&v| Ok((v, shifted_phase(g, v, delta)?)))
        .collect()
}

fn set_phases(ops: &mut GraphOps, phases: &[(VertexId, Angle)]) -> RewriteResult<()> {
    for (v, phase) in phases {
        ops.set_phase(*v, phase.clone())?;
    }
    Ok(())
}

/// A stretch of a path through vertices that a rewrite removes. The path
/// arrives over `enter` from `from`, first visits `first` inside the removed
/// region, and leaves the region towards `to` after `consumed` more edges.
#[derive(Debug, Clone, PartialEq)]
struct Detour {
    enter: EdgeId,
    from: VertexId,
    first: VertexId,
    to: VertexId,
    consumed: usize,
}

/// Finds every stretch of a path that runs through `region`.
fn plan_detours(g: &Diagram, region: &[VertexId]) -> RewriteResult<Vec<Detour>> {
    let inside: FxHashSet<VertexId> = region.iter().copied().collect();
    let mut detours = Vec::new();
    for p in g.paths_of_edges(&g.edges_of(region)) {
        let es = g.path(p).unwrap_or_default();
        let walk = g
            .path_vertices(p)
            .ok_or_else(|| internal(format!("path {p} is disconnected")))?;
        let mut i = 0;
        while i < walk.len() {
            if !inside.contains(&walk[i]) {
                i += 1;
                continue;
            }
            let start = i;
            while i < walk.len() && inside.contains(&walk[i]) {
                i += 1;
            }
            if start == 0 || i == walk.len() {
                return Err(internal(format!("path {p} ends inside the rewritten region")));
            }
            detours.push(Detour {
                enter: es[start - 1],
                from: walk[start - 1],
                first: walk[start],
                to: walk[i],
                consumed: i - start,
            });
        }
    }
    Ok(detours)
}

/// Reroutes each detour over the edge that now joins its ends. Where there is
/// no such edge, the path is dropped.
fn reroute_detours(ops: &mut GraphOps, detours: &[Detour]) -> RewriteResult<()> {
    for d in detours {
        if !ops.contains_edge(d.enter) {
            continue;
        }
        let between = if d.from == d.to {
            Vec::new()
        } else {
            ops.edges_between(d.from, d.to)
        };
        if let [e] = between.as_slice() {
            let consumed = Consumed::toward(ops.diagram(), d.enter, d.first, d.consumed);
            ops.substitute_path_edge(d.enter, &[*e], consumed)?;
        } else {
            drop_paths(ops, d.enter, "no edge replaces the removed vertices");
        }
    }
    Ok(())
}

/// Reroutes the paths over `old` along `run`, if there are any.
fn reroute_edge(ops: &mut GraphOps, old: EdgeId, run: &[EdgeId]) -> RewriteResult<()> {
    if !ops.paths_of_edges(&[old]).is_empty() {
        ops.substitute_path_edge(old, run, Consumed::NONE)?;
    }
    Ok(())
}

fn drop_paths(ops: &mut GraphOps, e: EdgeId, why: &str) {
    for p in ops.clear_paths_by_edges(&[e]) {
        warn!("dropping path {p}: {why}");
    }
}

/// The centroid of the placed vertices among `vs`.
fn centroid_of(g: &Diagram, vs: &[VertexId]) -> Option<Coord> {
    Coord::centroid(vs.iter().filter_map(|&v| g.coord(v)))
}

/// A rewrite together with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    ExpandHadamardEdge {
        edge: EdgeId,
        color: VType,
    },
    FuseDegree2Spider {
        vertex: VertexId,
        starting_edge: Option<EdgeId>,
    },
    CancelHadamardEdge {
        edge: EdgeId,
    },
    SplitSpider {
        vertex: Option<VertexId>,
        partition: Partition,
        left_phase: Angle,
        new_color: VType,
    },
    LocalComp {
        vertex: VertexId,
    },
    ReverseLocalComp {
        vertices: Vec<VertexId>,
        phase: Angle,
    },
    Pivot {
        edge: EdgeId,
    },
    ReversePivotStart {
        vertices: Vec<VertexId>,
    },
    ReversePivotFinish {
        hub: VertexId,
        vertices: Vec<VertexId>,
        phase_u: Angle,
        phase_v: Angle,
    },
    AbandonReversePivot {
        hub: VertexId,
    },
}

/// What a [`Rewrite`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Expanded(Subdivision),
    Fused(VertexId),
    Split(Split),
    Complemented(Vec<VertexId>),
    Hub(VertexId),
    Pivoted(PivotResult),
    Unpivoted(VertexId, VertexId),
    Abandoned,
}

impl Rewrite {
    pub fn name(&self) -> &'static str {
        match self {
            Rewrite::ExpandHadamardEdge { .. } => "expand_hadamard_edge",
            Rewrite::FuseDegree2Spider { .. } => "fuse_degree2_spider",
            Rewrite::CancelHadamardEdge { .. } => "cancel_hadamard_edge",
            Rewrite::SplitSpider { .. } => "split_spider",
            Rewrite::LocalComp { .. } => "local_comp",
            Rewrite::ReverseLocalComp { .. } => "reverse_local_comp",
            Rewrite::Pivot { .. } => "pivot",
            Rewrite::ReversePivotStart { .. } => "reverse_pivot_start",
            Rewrite::ReversePivotFinish { .. } => "reverse_pivot_finish",
            Rewrite::AbandonReversePivot { .. } => "abandon_reverse_pivot",
        }
    }

    pub fn is_valid(&self, g: &Diagram) -> bool {
        match self {
            Rewrite::ExpandHadamardEdge { edge, color } => {
                check_expand_hadamard_edge(g, *edge, *color)
            }
            Rewrite::FuseDegree2Spider {
                vertex,
                starting_edge,
            } => check_fuse_degree2_spider(g, *vertex, *starting_edge),
            Rewrite::CancelHadamardEdge { edge } => check_cancel_hadamard_edge(g, *edge),
            Rewrite::SplitSpider {
                vertex,
                partition,
                left_phase,
                new_color,
            } => check_split_spider(g, *vertex, partition, left_phase, *new_color),
            Rewrite::LocalComp { vertex } => check_local_comp(g, *vertex),
            Rewrite::ReverseLocalComp { vertices, phase } => {
                check_reverse_local_comp(g, vertices, phase)
            }
            Rewrite::Pivot { edge } => check_pivot(g, *edge),
            Rewrite::ReversePivotStart { vertices } => check_reverse_pivot_start(g, vertices),
            Rewrite::ReversePivotFinish {
                hub,
                vertices,
                phase_u,
                phase_v,
            } => check_reverse_pivot_finish(g, *hub, vertices, phase_u, phase_v),
            Rewrite::AbandonReversePivot { hub } => check_abandon_reverse_pivot(g, *hub),
        }
    }

    pub fn apply(&self, ops: &mut GraphOps) -> RewriteResult<Outcome> {
        match self {
            Rewrite::ExpandHadamardEdge { edge, color } => {
                expand_hadamard_edge(ops, *edge, *color).map(Outcome::Expanded)
            }
            Rewrite::FuseDegree2Spider {
                vertex,
                starting_edge,
            } => fuse_degree2_spider(ops, *vertex, *starting_edge).map(Outcome::Fused),
            Rewrite::CancelHadamardEdge { edge } => {
                cancel_hadamard_edge(ops, *edge).map(Outcome::Fused)
            }
            Rewrite::SplitSpider {
                vertex,
                partition,
                left_phase,
                new_color,
            } => split_spider(ops, *vertex, partition, left_phase, *new_color).map(Outcome::Split),
            Rewrite::LocalComp { vertex } => local_comp(ops, *vertex).map(Outcome::Complemented),
            Rewrite::ReverseLocalComp { vertices, phase } => {
                reverse_local_comp(ops, vertices, phase).map(Outcome::Hub)
            }
            Rewrite::Pivot { edge } => pivot(ops, *edge).map(Outcome::Pivoted),
            Rewrite::ReversePivotStart { vertices } => {
                reverse_pivot_start(ops, vertices).map(Outcome::Hub)
            }
            Rewrite::ReversePivotFinish {
                hub,
                vertices,
                phase_u,
                phase_v,
            } => reverse_pivot_finish(ops, *hub, vertices, phase_u, phase_v)
                .map(|(u, v)| Outcome::Unpivoted(u, v)),
            Rewrite::AbandonReversePivot { hub } => {
                abandon_reverse_pivot(ops, *hub).map(|_| Outcome::Abandoned)
            }
        }
    }
}
