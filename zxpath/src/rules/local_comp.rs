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

//! Local complementation and its inverse.

use log::debug;
use rustc_hash::FxHashMap;

use super::*;

#[derive(Debug, Clone)]
struct LocalCompMatch {
    neighbors: Vec<VertexId>,
    detours: Vec<Detour>,
    phases: Vec<(VertexId, Angle)>,
}

fn match_local_comp(g: &Diagram, v: VertexId) -> RewriteResult<LocalCompMatch> {
    require_vertex(g, v)?;
    ensure!(
        g.is_spider(v) && g.has_phase_half_pi(v),
        "{v} is not Z- or X-type or has a phase other than ±π/2"
    );
    let ty = common_spider_type(g, &[v])?;
    let neighbors = hadamard_star(g, v, ty)?;
    hadamard_only_among(g, &neighbors)?;
    let detours = plan_detours(g, &[v])?;
    let phase = g.phase(v).cloned().unwrap_or_default();
    let phases = shifted_phases(g, &neighbors, &-phase)?;
    Ok(LocalCompMatch {
        neighbors,
        detours,
        phases,
    })
}

checker!(match_local_comp => check_local_comp(v: VertexId));

/// Removes a ±π/2 spider `v`, complementing the edges among its neighbors
/// and subtracting its phase from each of them.
///
/// `v` may only have Hadamard edges, to spiders of its own type, and the
/// edges among those must be Hadamard as well. A path through `v` moves to
/// the new edge joining the neighbors it ran through, and is dropped when
/// those neighbors were already joined. Returns the neighbors.
pub fn local_comp(ops: &mut GraphOps, v: VertexId) -> RewriteResult<Vec<VertexId>> {
    let m = match_local_comp(ops, v)?;
    ops.toggle_edges(&m.neighbors, Some(EType::H))?;
    reroute_detours(ops, &m.detours)?;
    set_phases(ops, &m.phases)?;
    ops.delete_vertices(&[v])?;
    debug!("local_comp: removed {v}, complemented {:?}", m.neighbors);
    Ok(m.neighbors)
}

#[derive(Debug, Clone)]
struct ReverseLocalCompMatch {
    ty: VType,
    /// Edges among the vertices carrying paths, with their endpoints.
    rerouted: Vec<(EdgeId, VertexId, VertexId)>,
    phases: Vec<(VertexId, Angle)>,
}

fn match_reverse_local_comp(
    g: &Diagram,
    vs: &[VertexId],
    phase: &Angle,
) -> RewriteResult<ReverseLocalCompMatch> {
    require_vertex_set(g, vs)?;
    if !phase.is_half_pi() {
        return invalid(format!("phase {phase} is not ±π/2"));
    }
    let ty = common_spider_type(g, vs)?;
    hadamard_only_among(g, vs)?;
    let mut rerouted = Vec::new();
    for e in g.inner_edges_of(vs) {
        if g.paths_of_edges(&[e]).is_empty() {
            continue;
        }
        let d = g.edge(e).ok_or_else(|| internal(format!("{e} vanished")))?;
        rerouted.push((e, d.s, d.t));
    }
    let phases = shifted_phases(g, vs, phase)?;
    Ok(ReverseLocalCompMatch {
        ty,
        rerouted,
        phases,
    })
}

checker!(match_reverse_local_comp => check_reverse_local_comp(vs: &[VertexId], phase: &Angle));

/// Undoes a local complementation: complements the edges among `vs`, adds
/// `phase` to each of them and adds a new spider with `phase`, joined to all
/// of `vs` by Hadamard edges. A path over a removed edge is rerouted through
/// the new spider, as long as the spider is not taken by another path.
/// Returns the new spider.
pub fn reverse_local_comp(
    ops: &mut GraphOps,
    vs: &[VertexId],
    phase: &Angle,
) -> RewriteResult<VertexId> {
    let m = match_reverse_local_comp(ops, vs, phase)?;
    let pos = centroid_of(ops, vs);
    let hub = ops.add_vertex(m.ty, pos, phase.clone());
    let mut spokes = FxHashMap::default();
    for &a in vs {
        spokes.insert(a, ops.add_edge(hub, a, EType::H)?);
    }
    for &(e, a, b) in &m.rerouted {
        match (spokes.get(&a), spokes.get(&b)) {
            (Some(&ea), Some(&eb)) => reroute_edge(ops, e, &[ea, eb])?,
            _ => return Err(internal(format!("{e} does not join two of the vertices"))),
        }
    }
    ops.toggle_edges(vs, Some(EType::H))?;
    set_phases(ops, &m.phases)?;
    debug!("reverse_local_comp: added {hub} over {vs:?}");
    Ok(hub)
}
