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

//! Graph operations.
//!
//! [`GraphOps`] wraps a mutable [`Diagram`] and offers the mutation
//! primitives rewrites are built from. Every primitive checks its arguments
//! before touching the diagram, and every primitive that removes an edge also
//! removes the paths running over it. Read queries are available through
//! `Deref<Target = Diagram>`.

use std::ops::Deref;

use itertools::Itertools;
use log::{debug, trace, warn};

use crate::angle::Angle;
use crate::diagram::Diagram;
use crate::graph::*;
use crate::path::{self, Consumed, PathError};

/// Errors raised by the mutation primitives.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no vertex {0}")]
    MissingVertex(VertexId),
    #[error("no edge {0}")]
    MissingEdge(EdgeId),
    #[error("invalid path: {0}")]
    InvalidPath(#[from] PathError),
    #[error("path inconsistency: {0}")]
    PathInconsistency(String),
    #[error("phase of {0} is out of range")]
    PhaseOverflow(VertexId),
}

pub type OpResult<T> = Result<T, OpError>;

/// Supplies positions for vertices created or moved by the engine.
///
/// The engine only ever reads the suggestion; returning `None` keeps the
/// position the engine computed, if any.
pub trait Placement {
    fn place(&mut self, g: &Diagram, v: VertexId, hint: Option<Coord>) -> Option<Coord>;
}

/// The vertices and edges created by [`GraphOps::insert_vertices_along_edge`],
/// ordered from the source of the subdivided edge to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdivision {
    pub vertices: Vec<VertexId>,
    pub edges: Vec<EdgeId>,
}

pub struct GraphOps<'a> {
    g: &'a mut Diagram,
    placement: Option<&'a mut dyn Placement>,
}

impl Deref for GraphOps<'_> {
    type Target = Diagram;

    fn deref(&self) -> &Diagram {
        &*self.g
    }
}

impl<'a> GraphOps<'a> {
    pub fn new(g: &'a mut Diagram) -> Self {
        GraphOps { g, placement: None }
    }

    /// Attach a placement service consulted for new and moved vertices.
    pub fn with_placement(mut self, placement: &'a mut dyn Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn diagram(&self) -> &Diagram {
        &*self.g
    }

    fn check_vertex(&self, v: VertexId) -> OpResult<()> {
        if self.g.contains_vertex(v) {
            Ok(())
        } else {
            Err(OpError::MissingVertex(v))
        }
    }

    fn check_edge(&self, e: EdgeId) -> OpResult<()> {
        if self.g.contains_edge(e) {
            Ok(())
        } else {
            Err(OpError::MissingEdge(e))
        }
    }

    fn suggest(&mut self, v: VertexId, hint: Option<Coord>) -> Option<Coord> {
        match self.placement.as_deref_mut() {
            Some(p) => p.place(self.g, v, hint).or(hint),
            None => hint,
        }
    }

    /// Adds a vertex. A position given here may still be overridden by the
    /// placement service.
    pub fn add_vertex(&mut self, ty: VType, pos: Option<Coord>, phase: Angle) -> VertexId {
        let v = self.g.add_vertex_with_data(VData { ty, phase });
        if let Some(c) = self.suggest(v, pos) {
            self.g.set_coord_raw(v, c);
        }
        trace!("add vertex {v} ({ty:?})");
        v
    }

    /// Moves a vertex. Unless `force` is set, the placement service may
    /// override the position.
    pub fn set_coord(&mut self, v: VertexId, c: Coord, force: bool) -> OpResult<()> {
        self.check_vertex(v)?;
        let c = if force {
            c
        } else {
            self.suggest(v, Some(c)).unwrap_or(c)
        };
        self.g.set_coord_raw(v, c);
        Ok(())
    }

    /// Adds an edge between two distinct existing vertices. Parallel edges
    /// are not rejected here.
    pub fn add_edge(&mut self, a: VertexId, b: VertexId, ty: EType) -> OpResult<EdgeId> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b {
            return Err(OpError::InvalidArgument(format!(
                "cannot add a self-loop on {a}"
            )));
        }
        let e = self.g.add_edge_with_data(EData::new(a, b, ty));
        trace!("add edge {e} {a}-{b} ({ty:?})");
        Ok(e)
    }

    /// Deletes edges along with every path running over them.
    pub fn delete_edges(&mut self, es: &[EdgeId]) -> OpResult<()> {
        for &e in es {
            self.check_edge(e)?;
        }
        self.clear_paths_by_edges(es);
        for &e in es {
            self.g.remove_edge(e);
        }
        trace!("delete edges {}", es.iter().join(","));
        Ok(())
    }

    /// Deletes vertices along with their edges and the paths running over
    /// those edges.
    pub fn delete_vertices(&mut self, vs: &[VertexId]) -> OpResult<()> {
        for &v in vs {
            self.check_vertex(v)?;
        }
        let es = self.g.edges_of(vs);
        self.delete_edges(&es)?;
        for &v in vs {
            self.g.remove_vertex(v);
        }
        trace!("delete vertices {}", vs.iter().join(","));
        Ok(())
    }

    /// Removes all paths using any of the edges. Returns the removed ids.
    pub fn clear_paths_by_edges(&mut self, es: &[EdgeId]) -> Vec<PathId> {
        let ps = self.g.paths_of_edges(es);
        for &p in &ps {
            self.g.remove_path(p);
            debug!("cleared path {p}");
        }
        ps
    }

    pub fn set_edge_type(&mut self, e: EdgeId, ty: EType) -> OpResult<()> {
        let d = self.g.edge_data_mut(e).ok_or(OpError::MissingEdge(e))?;
        d.ty = ty;
        Ok(())
    }

    pub fn toggle_edge_type(&mut self, e: EdgeId) -> OpResult<()> {
        let d = self.g.edge_data_mut(e).ok_or(OpError::MissingEdge(e))?;
        d.ty = d.ty.opposite();
        Ok(())
    }

    pub fn set_vertex_type(&mut self, v: VertexId, ty: VType) -> OpResult<()> {
        let d = self.g.vertex_data_mut(v).ok_or(OpError::MissingVertex(v))?;
        d.ty = ty;
        Ok(())
    }

    /// Swaps a spider between Z and X.
    pub fn toggle_vertex_color(&mut self, v: VertexId) -> OpResult<()> {
        let d = self.g.vertex_data_mut(v).ok_or(OpError::MissingVertex(v))?;
        if !d.ty.is_spider() {
            return Err(OpError::InvalidArgument(format!("{v} is not a spider")));
        }
        d.ty = d.ty.toggled_color();
        Ok(())
    }

    pub fn set_phase(&mut self, v: VertexId, phase: Angle) -> OpResult<()> {
        let d = self.g.vertex_data_mut(v).ok_or(OpError::MissingVertex(v))?;
        d.phase = phase;
        Ok(())
    }

    /// Adds `phase` to the phase of `v`. The phase is left alone if the sum
    /// does not fit.
    pub fn add_to_phase(&mut self, v: VertexId, phase: Angle) -> OpResult<()> {
        let d = self.g.vertex_data_mut(v).ok_or(OpError::MissingVertex(v))?;
        d.phase = d
            .phase
            .checked_add(&phase)
            .ok_or(OpError::PhaseOverflow(v))?;
        Ok(())
    }

    pub fn subtract_from_phase(&mut self, v: VertexId, phase: Angle) -> OpResult<()> {
        let d = self.g.vertex_data_mut(v).ok_or(OpError::MissingVertex(v))?;
        d.phase = d
            .phase
            .checked_sub(&phase)
            .ok_or(OpError::PhaseOverflow(v))?;
        Ok(())
    }

    /// Complements the edges among `vs`: every pair that is joined loses all
    /// its edges, every pair that is not gains one.
    ///
    /// With `ty` set, all removed edges must be of that type and new edges get
    /// it. Otherwise new edges are normal when they touch a boundary and
    /// Hadamard elsewhere. Returns the new edges.
    pub fn toggle_edges(&mut self, vs: &[VertexId], ty: Option<EType>) -> OpResult<Vec<EdgeId>> {
        for &v in vs {
            self.check_vertex(v)?;
        }
        let vs: Vec<VertexId> = vs.iter().copied().unique().collect();
        let old = self.g.inner_edges_of(&vs);
        if let Some(ty) = ty {
            if let Some(&e) = old.iter().find(|&&e| self.g.edge_type(e) != Some(ty)) {
                return Err(OpError::InvalidArgument(format!(
                    "cannot toggle {e}, it is not of type {ty:?}"
                )));
            }
        }
        let new_pairs: Vec<(VertexId, VertexId)> = vs
            .iter()
            .copied()
            .tuple_combinations()
            .filter(|&(a, b)| !self.g.connected(a, b))
            .collect();
        self.delete_edges(&old)?;
        let mut added = Vec::with_capacity(new_pairs.len());
        for (a, b) in new_pairs {
            let ety = ty.unwrap_or(if self.g.is_boundary(a) || self.g.is_boundary(b) {
                EType::N
            } else {
                EType::H
            });
            added.push(self.add_edge(a, b, ety)?);
        }
        Ok(added)
    }

    /// Adds (when `toggle` is set) or normalizes a Hadamard edge between `a`
    /// and `b`, following the parity rules of Hadamard edges.
    ///
    /// Let `k` be the number of Hadamard edges already joining `a` and `b`.
    ///
    /// If `a == b`, or a normal edge joins `a` and `b`, and both are spiders
    /// of the same color, the two are effectively one spider: the `k` edges
    /// are deleted and, as each Hadamard self-loop is a π phase, π is added to
    /// `a` when `k + toggle` is odd. The normal edge (or `None` for `a == b`)
    /// is returned.
    ///
    /// Otherwise, parallel Hadamard edges cancel in pairs: when `k + toggle`
    /// is even all of them are deleted and `None` is returned, when it is odd
    /// exactly one remains (the oldest existing one, or a new one if `k == 0`)
    /// and is returned.
    pub fn toggle_hadamard_or_self_loop(
        &mut self,
        a: VertexId,
        b: VertexId,
        toggle: bool,
    ) -> OpResult<Option<EdgeId>> {
        self.check_vertex(a)?;
        self.check_vertex(b)?;
        if a == b && !self.g.is_spider(a) {
            return Err(OpError::InvalidArgument(format!(
                "cannot add a Hadamard self-loop on non-spider {a}"
            )));
        }
        let between = if a == b {
            Vec::new()
        } else {
            self.g.edges_between(a, b)
        };
        let (h, normal): (Vec<EdgeId>, Vec<EdgeId>) = between
            .into_iter()
            .partition(|&e| self.g.edge_type(e) == Some(EType::H));
        let normal = normal.first().copied();
        let odd = (h.len() + usize::from(toggle)) % 2 == 1;
        let same_spiders = self.g.is_spider(a) && self.g.vertex_type(a) == self.g.vertex_type(b);

        if (a == b || normal.is_some()) && same_spiders {
            self.delete_edges(&h)?;
            if odd {
                self.add_to_phase(a, Angle::pi())?;
            }
            Ok(normal)
        } else if odd {
            match h.split_first() {
                Some((&keep, rest)) => {
                    self.delete_edges(rest)?;
                    Ok(Some(keep))
                }
                None => Ok(Some(self.add_edge(a, b, EType::H)?)),
            }
        } else {
            self.delete_edges(&h)?;
            Ok(None)
        }
    }

    /// Adds a path over `es`, which may be given in any order. Paths sharing
    /// an edge or a vertex with the new one are removed.
    pub fn add_path(&mut self, es: &[EdgeId]) -> OpResult<PathId> {
        let sorted = path::sort_valid_path_edges(self.g, es, true)?;
        for p in self.g.paths_conflicting_with_edges(es) {
            self.g.remove_path(p);
            debug!("cleared path {p}");
        }
        let p = self.g.insert_path(sorted);
        debug!("added path {p}");
        Ok(p)
    }

    pub fn remove_path(&mut self, p: PathId) -> OpResult<Vec<EdgeId>> {
        self.g
            .remove_path(p)
            .ok_or_else(|| OpError::InvalidArgument(format!("no path {p}")))
    }

    /// Replaces `old` by the run of edges `run` in every path containing it.
    ///
    /// `consumed` widens the replaced window by further path edges on either
    /// side of `old`, for rewrites that collapse several path edges into
    /// fewer. The run is oriented to continue the path from the edge before
    /// the window. Every modified path is re-keyed, and a path that no longer
    /// forms a valid path after the splice is dropped. Returns the ids of the
    /// rewritten paths.
    pub fn substitute_path_edge(
        &mut self,
        old: EdgeId,
        run: &[EdgeId],
        consumed: Consumed,
    ) -> OpResult<Vec<PathId>> {
        if run.is_empty() {
            return Err(OpError::InvalidArgument(
                "replacement edge run must be non-empty".to_string(),
            ));
        }
        self.check_edge(old)?;
        for &e in run {
            self.check_edge(e)?;
        }
        let Some(od) = self.g.edge(old) else {
            return Err(OpError::MissingEdge(old));
        };

        let mut splices = Vec::new();
        for p in self.g.paths_of_edges(&[old]) {
            let es = self.g.path(p).unwrap_or_default().to_vec();
            let inconsistent = |msg: &str| OpError::PathInconsistency(format!("{p}: {msg}"));
            let walk = path::walk(self.g, &es).ok_or_else(|| inconsistent("broken walk"))?;
            let i = es
                .iter()
                .position(|&e| e == old)
                .ok_or_else(|| inconsistent("edge not found"))?;
            // walk[i] is where the path enters `old`
            let (back, fwd) = if walk[i] == od.s {
                (consumed.before, consumed.after)
            } else {
                (consumed.after, consumed.before)
            };
            if back > i || i + fwd >= es.len() {
                return Err(inconsistent("consumed edges run past the path ends"));
            }
            let (lo, hi) = (i - back, i + fwd);
            let mut r = run.to_vec();
            let anchor = walk[lo];
            if !self.g.edge(r[0]).is_some_and(|d| d.touches(anchor)) {
                r.reverse();
            }
            let spliced: Vec<EdgeId> = es[..lo]
                .iter()
                .chain(r.iter())
                .chain(es[hi + 1..].iter())
                .copied()
                .collect();
            splices.push((p, spliced));
        }

        let mut rekeyed = Vec::new();
        for (p, spliced) in splices {
            self.g.remove_path(p);
            match path::sort_valid_path_edges(self.g, &spliced, false) {
                Ok(sorted) => {
                    let np = self.g.insert_path(sorted);
                    debug!("path {p} rewritten as {np}");
                    rekeyed.push(np);
                }
                Err(err) => warn!("dropping path {p}: {err}"),
            }
        }
        Ok(rekeyed)
    }

    /// Subdivides `e` into `count + 1` edges through `count` new vertices of
    /// type `vty`, spaced evenly between its endpoints. Without `ety`, the new
    /// edges are normal next to a boundary and Hadamard otherwise. Paths over
    /// `e` are rerouted through the new chain and `e` is deleted.
    ///
    /// With `count == 0` nothing changes and the chain is `e` itself.
    pub fn insert_vertices_along_edge(
        &mut self,
        e: EdgeId,
        count: usize,
        ety: Option<EType>,
        vty: VType,
    ) -> OpResult<Subdivision> {
        let d = self.g.edge(e).ok_or(OpError::MissingEdge(e))?;
        if count == 0 {
            return Ok(Subdivision {
                vertices: Vec::new(),
                edges: vec![e],
            });
        }
        let (cs, ct) = (self.g.coord(d.s), self.g.coord(d.t));
        let mut vertices = Vec::with_capacity(count);
        for i in 1..=count {
            let pos = match (cs, ct) {
                (Some(cs), Some(ct)) => Some(cs.lerp(&ct, i as f64 / (count + 1) as f64)),
                _ => None,
            };
            vertices.push(self.add_vertex(vty, pos, Angle::zero()));
        }
        let chain: Vec<VertexId> = std::iter::once(d.s)
            .chain(vertices.iter().copied())
            .chain(std::iter::once(d.t))
            .collect();
        let mut edges = Vec::with_capacity(count + 1);
        for (&a, &b) in chain.iter().tuple_windows() {
            let ty = ety.unwrap_or(if self.g.is_boundary(a) || self.g.is_boundary(b) {
                EType::N
            } else {
                EType::H
            });
            edges.push(self.add_edge(a, b, ty)?);
        }
        self.substitute_path_edge(e, &edges, Consumed::NONE)?;
        self.delete_edges(&[e])?;
        Ok(Subdivision { vertices, edges })
    }
}
