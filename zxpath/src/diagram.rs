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

//! The diagram store.
//!
//! A [`Diagram`] owns the vertices, edges, traced paths and layout of a
//! ZX-diagram. Vertices and edges live in arenas indexed by [`VertexId`] and
//! [`EdgeId`], with deleted slots recycled through a free list. The store only
//! offers read queries publicly; all mutation goes through
//! [`GraphOps`](crate::ops::GraphOps), which keeps the path overlay consistent.

use std::collections::BTreeMap;

use itertools::Itertools;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::angle::Angle;
pub use crate::graph::*;
use crate::path::{self, PathError};

pub type VTab<T> = Vec<Option<T>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    vdata: VTab<VData>,
    adj: VTab<Vec<EdgeId>>,
    edata: VTab<EData>,
    vholes: Vec<VertexId>, // places where a vertex has been deleted
    eholes: Vec<EdgeId>,   // places where an edge has been deleted
    numv: usize,
    nume: usize,
    paths: BTreeMap<PathId, Vec<EdgeId>>,
    next_path: u32,
    coords: FxHashMap<VertexId, Coord>,
}

impl Diagram {
    pub fn new() -> Self {
        Diagram::default()
    }

    pub fn num_vertices(&self) -> usize {
        self.numv
    }

    pub fn num_edges(&self) -> usize {
        self.nume
    }

    pub fn num_paths(&self) -> usize {
        self.paths.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vdata
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|_| VertexId(i as u32)))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, EData)> + '_ {
        self.edata
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.map(|d| (EdgeId(i as u32), d)))
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.vertex_data(v).is_some()
    }

    pub fn contains_edge(&self, e: EdgeId) -> bool {
        self.edge(e).is_some()
    }

    pub fn contains_path(&self, p: PathId) -> bool {
        self.paths.contains_key(&p)
    }

    pub fn vertex_data(&self, v: VertexId) -> Option<&VData> {
        self.vdata.get(v.index()).and_then(Option::as_ref)
    }

    pub fn vertex_type(&self, v: VertexId) -> Option<VType> {
        self.vertex_data(v).map(|d| d.ty)
    }

    pub fn phase(&self, v: VertexId) -> Option<&Angle> {
        self.vertex_data(v).map(|d| &d.phase)
    }

    pub fn coord(&self, v: VertexId) -> Option<Coord> {
        self.coords.get(&v).copied()
    }

    /// The coordinate of `v`, or the origin if it has not been placed.
    pub fn coord_or_default(&self, v: VertexId) -> Coord {
        self.coord(v).unwrap_or_default()
    }

    pub fn edge(&self, e: EdgeId) -> Option<EData> {
        self.edata.get(e.index()).copied().flatten()
    }

    pub fn edge_type(&self, e: EdgeId) -> Option<EType> {
        self.edge(e).map(|d| d.ty)
    }

    /// The endpoints of an edge, in canonical order.
    pub fn edge_endpoints(&self, e: EdgeId) -> Option<(VertexId, VertexId)> {
        self.edge(e).map(|d| (d.s, d.t))
    }

    pub fn other_end(&self, e: EdgeId, v: VertexId) -> Option<VertexId> {
        self.edge(e).and_then(|d| d.other(v))
    }

    /// Edges incident to `v`, in no particular order.
    pub fn incident_edges(&self, v: VertexId) -> &[EdgeId] {
        match self.adj.get(v.index()) {
            Some(Some(es)) => es,
            _ => &[],
        }
    }

    pub fn degree(&self, v: VertexId) -> usize {
        self.incident_edges(v).len()
    }

    pub fn hadamard_degree(&self, v: VertexId) -> usize {
        self.incident_edges(v)
            .iter()
            .filter(|&&e| self.edge_type(e) == Some(EType::H))
            .count()
    }

    pub fn is_boundary(&self, v: VertexId) -> bool {
        self.vertex_type(v) == Some(VType::B)
    }

    /// Returns `true` for Z- and X-spiders.
    pub fn is_spider(&self, v: VertexId) -> bool {
        self.vertex_type(v).is_some_and(VType::is_spider)
    }

    /// Neighbors of a single vertex, once per connecting edge.
    pub fn neighbors(&self, v: VertexId) -> impl Iterator<Item = VertexId> + '_ {
        self.incident_edges(v)
            .iter()
            .filter_map(move |&e| self.other_end(e, v))
    }

    /// Lazily iterates over the vertices adjacent to the set `vs` that are not
    /// themselves in `vs`, once per crossing edge.
    pub fn neighbors_of<'a>(&'a self, vs: &'a [VertexId]) -> impl Iterator<Item = VertexId> + 'a {
        let set: FxHashSet<VertexId> = vs.iter().copied().collect();
        vs.iter()
            .copied()
            .unique()
            .flat_map(move |v| self.neighbors(v))
            .filter(move |n| !set.contains(n))
    }

    /// Distinct neighbors of the set `vs`, sorted by id.
    pub fn neighbor_set(&self, vs: &[VertexId]) -> Vec<VertexId> {
        self.neighbors_of(vs).sorted().dedup().collect()
    }

    /// Edges with at least one endpoint in `vs`, sorted by id.
    pub fn edges_of(&self, vs: &[VertexId]) -> Vec<EdgeId> {
        vs.iter()
            .flat_map(|&v| self.incident_edges(v).iter().copied())
            .sorted()
            .dedup()
            .collect()
    }

    /// Edges with both endpoints in `vs`, sorted by id.
    pub fn inner_edges_of(&self, vs: &[VertexId]) -> Vec<EdgeId> {
        let set: FxHashSet<VertexId> = vs.iter().copied().collect();
        self.edges_of(vs)
            .into_iter()
            .filter(|&e| {
                self.edge(e)
                    .is_some_and(|d| set.contains(&d.s) && set.contains(&d.t))
            })
            .collect()
    }

    /// Edges with one endpoint in `a` and the other in `b`, sorted by id.
    pub fn crossing_edges(&self, a: &[VertexId], b: &[VertexId]) -> Vec<EdgeId> {
        let aset: FxHashSet<VertexId> = a.iter().copied().collect();
        let bset: FxHashSet<VertexId> = b.iter().copied().collect();
        self.edges_of(a)
            .into_iter()
            .filter(|&e| {
                self.edge(e).is_some_and(|d| {
                    (aset.contains(&d.s) && bset.contains(&d.t))
                        || (aset.contains(&d.t) && bset.contains(&d.s))
                })
            })
            .collect()
    }

    /// All edges joining `a` and `b`, sorted by id.
    pub fn edges_between(&self, a: VertexId, b: VertexId) -> Vec<EdgeId> {
        self.incident_edges(a)
            .iter()
            .copied()
            .filter(|&e| self.other_end(e, a) == Some(b))
            .sorted()
            .collect()
    }

    pub fn connected(&self, a: VertexId, b: VertexId) -> bool {
        self.incident_edges(a)
            .iter()
            .any(|&e| self.other_end(e, a) == Some(b))
    }

    pub fn has_phase_zero(&self, v: VertexId) -> bool {
        self.phase(v).is_some_and(Angle::is_zero)
    }

    pub fn has_phase_pi(&self, v: VertexId) -> bool {
        self.phase(v).is_some_and(Angle::is_pi)
    }

    pub fn has_phase_zero_or_pi(&self, v: VertexId) -> bool {
        self.phase(v).is_some_and(Angle::is_zero_or_pi)
    }

    /// Returns `true` if the phase of `v` is ±π/2.
    pub fn has_phase_half_pi(&self, v: VertexId) -> bool {
        self.phase(v).is_some_and(Angle::is_half_pi)
    }

    /// Returns `true` if `v` is adjacent to a boundary.
    pub fn is_near_boundary(&self, v: VertexId) -> bool {
        self.neighbors(v).any(|n| self.is_boundary(n))
    }

    pub fn paths(&self) -> impl Iterator<Item = (PathId, &[EdgeId])> + '_ {
        self.paths.iter().map(|(&p, es)| (p, es.as_slice()))
    }

    pub fn path(&self, p: PathId) -> Option<&[EdgeId]> {
        self.paths.get(&p).map(Vec::as_slice)
    }

    /// The vertices visited by a path, from its first boundary to its last.
    pub fn path_vertices(&self, p: PathId) -> Option<Vec<VertexId>> {
        self.path(p).and_then(|es| path::walk(self, es))
    }

    /// Paths using any of the edges `es`.
    pub fn paths_of_edges(&self, es: &[EdgeId]) -> Vec<PathId> {
        let set: FxHashSet<EdgeId> = es.iter().copied().collect();
        self.paths
            .iter()
            .filter(|(_, pes)| pes.iter().any(|e| set.contains(e)))
            .map(|(&p, _)| p)
            .collect()
    }

    /// Paths sharing an edge or a vertex with the edges `es`.
    pub fn paths_conflicting_with_edges(&self, es: &[EdgeId]) -> Vec<PathId> {
        let eset: FxHashSet<EdgeId> = es.iter().copied().collect();
        let vset: FxHashSet<VertexId> = es
            .iter()
            .filter_map(|&e| self.edge(e))
            .flat_map(|d| [d.s, d.t])
            .collect();
        self.paths
            .iter()
            .filter(|(_, pes)| {
                pes.iter().any(|e| {
                    eset.contains(e)
                        || self
                            .edge(*e)
                            .is_some_and(|d| vset.contains(&d.s) || vset.contains(&d.t))
                })
            })
            .map(|(&p, _)| p)
            .collect()
    }

    /// Returns `true` if `es` form a valid path, disregarding existing paths.
    pub fn is_valid_path(&self, es: &[EdgeId]) -> bool {
        path::sort_valid_path_edges(self, es, true).is_ok()
    }

    /// See [`path::sort_valid_path_edges`].
    pub fn sort_valid_path_edges(
        &self,
        es: &[EdgeId],
        ignore_current: bool,
    ) -> Result<Vec<EdgeId>, PathError> {
        path::sort_valid_path_edges(self, es, ignore_current)
    }

    /// Explains whether `es` could be added as a new path.
    pub fn path_validity_reason(&self, es: &[EdgeId]) -> String {
        match path::sort_valid_path_edges(self, es, false) {
            Ok(_) => "valid path".to_string(),
            Err(err) => err.to_string(),
        }
    }

    /// Paths passing through the vertex `v`.
    pub fn paths_of_vertex(&self, v: VertexId) -> Vec<PathId> {
        self.paths_of_edges(self.incident_edges(v))
    }

    pub(crate) fn add_vertex_with_data(&mut self, d: VData) -> VertexId {
        self.numv += 1;
        if let Some(v) = self.vholes.pop() {
            self.vdata[v.index()] = Some(d);
            self.adj[v.index()] = Some(Vec::new());
            v
        } else {
            self.vdata.push(Some(d));
            self.adj.push(Some(Vec::new()));
            VertexId((self.vdata.len() - 1) as u32)
        }
    }

    /// Removes a vertex, its incident edges and its coordinate. Paths are
    /// left alone.
    pub(crate) fn remove_vertex(&mut self, v: VertexId) {
        if !self.contains_vertex(v) {
            return;
        }
        for e in self.incident_edges(v).to_vec() {
            self.remove_edge(e);
        }
        self.numv -= 1;
        self.vdata[v.index()] = None;
        self.adj[v.index()] = None;
        self.coords.remove(&v);
        self.vholes.push(v);
    }

    pub(crate) fn add_edge_with_data(&mut self, d: EData) -> EdgeId {
        self.nume += 1;
        let e = if let Some(e) = self.eholes.pop() {
            self.edata[e.index()] = Some(d);
            e
        } else {
            self.edata.push(Some(d));
            EdgeId((self.edata.len() - 1) as u32)
        };
        for v in [d.s, d.t] {
            if let Some(Some(es)) = self.adj.get_mut(v.index()) {
                es.push(e);
            }
        }
        e
    }

    /// Removes an edge from the store. Paths are left alone.
    pub(crate) fn remove_edge(&mut self, e: EdgeId) -> Option<EData> {
        let d = self.edata.get_mut(e.index())?.take()?;
        for v in [d.s, d.t] {
            if let Some(Some(es)) = self.adj.get_mut(v.index()) {
                if let Some(i) = es.iter().position(|&e1| e1 == e) {
                    es.swap_remove(i);
                }
            }
        }
        self.nume -= 1;
        self.eholes.push(e);
        Some(d)
    }

    pub(crate) fn vertex_data_mut(&mut self, v: VertexId) -> Option<&mut VData> {
        self.vdata.get_mut(v.index()).and_then(Option::as_mut)
    }

    pub(crate) fn edge_data_mut(&mut self, e: EdgeId) -> Option<&mut EData> {
        self.edata.get_mut(e.index()).and_then(Option::as_mut)
    }

    pub(crate) fn set_coord_raw(&mut self, v: VertexId, c: Coord) {
        self.coords.insert(v, c);
    }

    /// Stores an already validated and ordered path under a fresh id.
    pub(crate) fn insert_path(&mut self, es: Vec<EdgeId>) -> PathId {
        let p = PathId(self.next_path);
        self.next_path += 1;
        self.paths.insert(p, es);
        p
    }

    pub(crate) fn remove_path(&mut self, p: PathId) -> Option<Vec<EdgeId>> {
        self.paths.remove(&p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn vd(ty: VType) -> VData {
        VData {
            ty,
            phase: Angle::zero(),
        }
    }

    /// A star around a Z-spider with two boundaries and an X-spider.
    #[fixture]
    fn star() -> Diagram {
        let mut g = Diagram::new();
        let b0 = g.add_vertex_with_data(vd(VType::B));
        let z = g.add_vertex_with_data(vd(VType::Z));
        let b1 = g.add_vertex_with_data(vd(VType::B));
        let x = g.add_vertex_with_data(vd(VType::X));
        g.add_edge_with_data(EData::new(b0, z, EType::N));
        g.add_edge_with_data(EData::new(z, b1, EType::N));
        g.add_edge_with_data(EData::new(z, x, EType::H));
        g
    }

    #[rstest]
    fn create_simple_graph(star: Diagram) {
        assert_eq!(star.num_vertices(), 4);
        assert_eq!(star.num_edges(), 3);
        assert_eq!(star.degree(VertexId(1)), 3);
        assert_eq!(star.hadamard_degree(VertexId(1)), 1);
        assert!(star.is_near_boundary(VertexId(1)));
        assert!(!star.is_near_boundary(VertexId(3)));
        assert!(star.is_spider(VertexId(3)));
        assert!(!star.is_spider(VertexId(0)));
    }

    #[rstest]
    fn edge_queries(star: Diagram) {
        let (z, x) = (VertexId(1), VertexId(3));
        assert_eq!(star.edges_between(x, z), vec![EdgeId(2)]);
        assert_eq!(star.edge_endpoints(EdgeId(2)), Some((z, x)));
        assert_eq!(star.other_end(EdgeId(2), x), Some(z));
        assert_eq!(star.edges_of(&[z]), vec![EdgeId(0), EdgeId(1), EdgeId(2)]);
        assert_eq!(star.inner_edges_of(&[z, x]), vec![EdgeId(2)]);
        assert_eq!(
            star.crossing_edges(&[z], &[VertexId(0), VertexId(2)]),
            vec![EdgeId(0), EdgeId(1)]
        );
    }

    #[rstest]
    fn neighbors_exclude_the_set(star: Diagram) {
        let (z, x) = (VertexId(1), VertexId(3));
        let ns: Vec<_> = star.neighbors_of(&[z, x]).sorted().collect();
        assert_eq!(ns, vec![VertexId(0), VertexId(2)]);
        assert_eq!(star.neighbor_set(&[x]), vec![z]);
    }

    #[rstest]
    fn ids_are_recycled(mut star: Diagram) {
        star.remove_vertex(VertexId(3));
        assert_eq!(star.num_vertices(), 3);
        assert_eq!(star.num_edges(), 2);
        assert!(!star.contains_edge(EdgeId(2)));
        let v = star.add_vertex_with_data(vd(VType::X));
        assert_eq!(v, VertexId(3));
        let e = star.add_edge_with_data(EData::new(VertexId(1), v, EType::N));
        assert_eq!(e, EdgeId(2));
    }

    #[rstest]
    fn path_ids_are_fresh(mut star: Diagram) {
        let p0 = star.insert_path(vec![EdgeId(0), EdgeId(1)]);
        star.remove_path(p0);
        let p1 = star.insert_path(vec![EdgeId(0), EdgeId(1)]);
        assert_ne!(p0, p1);
        assert_eq!(star.paths_of_edges(&[EdgeId(1)]), vec![p1]);
        assert_eq!(star.paths_conflicting_with_edges(&[EdgeId(2)]), vec![p1]);
        assert_eq!(
            star.path_vertices(p1),
            Some(vec![VertexId(0), VertexId(1), VertexId(2)])
        );
    }
}
