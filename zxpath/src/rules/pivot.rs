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

//! Pivoting along a Hadamard edge, and the two-step reverse pivot.
//!
//! A reverse pivot first places a [`VType::TempPivot`] placeholder joined to
//! the neighbors of the first pivot vertex ([`reverse_pivot_start`]). Picking
//! the neighbors of the second one then turns the placeholder back into a
//! spider ([`reverse_pivot_finish`]), or the placeholder is discarded
//! ([`abandon_reverse_pivot`]).

use itertools::Itertools;
use log::debug;
use rustc_hash::FxHashMap;

use super::*;

/// The neighborhood of a pivot, as needed to undo it.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotResult {
    /// Former neighbors of the edge's source only.
    pub a: Vec<VertexId>,
    /// Former neighbors of the edge's target only.
    pub b: Vec<VertexId>,
    /// Former neighbors of both.
    pub c: Vec<VertexId>,
    pub phase_u: Angle,
    pub phase_v: Angle,
}

impl PivotResult {
    /// The former neighbors of the source, to start a reverse pivot with.
    pub fn u_side(&self) -> Vec<VertexId> {
        self.a.iter().chain(self.c.iter()).copied().collect()
    }

    /// The former neighbors of the target, to finish a reverse pivot with.
    pub fn v_side(&self) -> Vec<VertexId> {
        self.b.iter().chain(self.c.iter()).copied().collect()
    }
}

/// Splits two neighborhoods into the vertices only in `nu`, only in `nv`,
/// and in both.
fn groups(
    nu: &[VertexId],
    nv: &[VertexId],
) -> (Vec<VertexId>, Vec<VertexId>, Vec<VertexId>) {
    let a = nu.iter().copied().filter(|n| !nv.contains(n)).collect();
    let b = nv.iter().copied().filter(|n| !nu.contains(n)).collect();
    let c = nu.iter().copied().filter(|n| nv.contains(n)).collect();
    (a, b, c)
}

fn cross_pairs<'a>(
    a: &'a [VertexId],
    b: &'a [VertexId],
    c: &'a [VertexId],
) -> impl Iterator<Item = (VertexId, VertexId)> + 'a {
    let ab = a.iter().copied().cartesian_product(b.iter().copied());
    let ac = a.iter().copied().cartesian_product(c.iter().copied());
    let bc = b.iter().copied().cartesian_product(c.iter().copied());
    ab.chain(ac).chain(bc)
}

fn check_cross_edges(
    g: &Diagram,
    a: &[VertexId],
    b: &[VertexId],
    c: &[VertexId],
) -> RewriteResult<()> {
    hadamard_only_across(g, a, b)?;
    hadamard_only_across(g, a, c)?;
    hadamard_only_across(g, b, c)
}

/// The phases the groups end up with when `A` gains `shift_a`, `B` gains
/// `shift_b` and `C` gains both plus π.
fn group_phases(
    g: &Diagram,
    sides: [&[VertexId]; 3],
    shift_a: &Angle,
    shift_b: &Angle,
) -> RewriteResult<Vec<(VertexId, Angle)>> {
    let shift_c = shift_a
        .checked_add(shift_b)
        .and_then(|s| s.checked_add(&Angle::pi()))
        .ok_or_else(|| {
            RewriteError::PreconditionFailed(format!(
                "phases {shift_a} and {shift_b} cannot be added"
            ))
        })?;
    let [a, b, c] = sides;
    let mut phases = shifted_phases(g, a, shift_a)?;
    phases.extend(shifted_phases(g, b, shift_b)?);
    phases.extend(shifted_phases(g, c, &shift_c)?);
    Ok(phases)
}

/// Complements the edges between the groups.
fn toggle_cross_edges(
    ops: &mut GraphOps,
    a: &[VertexId],
    b: &[VertexId],
    c: &[VertexId],
) -> RewriteResult<()> {
    for (x, y) in cross_pairs(a, b, c) {
        ops.toggle_hadamard_or_self_loop(x, y, true)?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct PivotMatch {
    u: VertexId,
    v: VertexId,
    result: PivotResult,
    detours: Vec<Detour>,
    phases: Vec<(VertexId, Angle)>,
}

fn match_pivot(g: &Diagram, e: EdgeId) -> RewriteResult<PivotMatch> {
    let d = require_edge(g, e)?;
    ensure!(d.ty == EType::H, "{e} is not a Hadamard edge");
    let (u, v) = (d.s, d.t);
    let ty = common_spider_type(g, &[u, v])?;
    ensure!(
        g.has_phase_zero_or_pi(u) && g.has_phase_zero_or_pi(v),
        "{u} or {v} has a phase other than 0 or π"
    );
    let nu: Vec<VertexId> = hadamard_star(g, u, ty)?
        .into_iter()
        .filter(|&n| n != v)
        .collect();
    let nv: Vec<VertexId> = hadamard_star(g, v, ty)?
        .into_iter()
        .filter(|&n| n != u)
        .collect();
    let (a, b, c) = groups(&nu, &nv);
    check_cross_edges(g, &a, &b, &c)?;
    let detours = plan_detours(g, &[u, v])?;
    let phase = |x| g.phase(x).cloned().unwrap_or_default();
    let (phase_u, phase_v) = (phase(u), phase(v));
    let phases = group_phases(g, [&a, &b, &c], &phase_v, &phase_u)?;
    Ok(PivotMatch {
        u,
        v,
        result: PivotResult {
            a,
            b,
            c,
            phase_u,
            phase_v,
        },
        detours,
        phases,
    })
}

checker!(match_pivot => check_pivot(e: EdgeId));

/// Pivots along the Hadamard edge `e` between spiders `u` and `v` with
/// phases 0 or π.
///
/// Both vertices are removed. Their neighbors fall in three groups, `A`
/// (only next to `u`), `B` (only next to `v`) and `C` (next to both), and
/// the edges between different groups are complemented. `A` gains the phase
/// of `v`, `B` that of `u`, and `C` both plus π. A path through `u` or `v`
/// moves to the edge that now joins the vertices around them, and is dropped
/// when there is none.
pub fn pivot(ops: &mut GraphOps, e: EdgeId) -> RewriteResult<PivotResult> {
    let m = match_pivot(ops, e)?;
    let r = &m.result;
    toggle_cross_edges(ops, &r.a, &r.b, &r.c)?;
    reroute_detours(ops, &m.detours)?;
    set_phases(ops, &m.phases)?;
    ops.delete_vertices(&[m.u, m.v])?;
    debug!(
        "pivot: removed {} and {}, groups {:?} {:?} {:?}",
        m.u, m.v, r.a, r.b, r.c
    );
    Ok(m.result)
}

fn match_reverse_pivot_start(g: &Diagram, vs: &[VertexId]) -> RewriteResult<VType> {
    require_vertex_set(g, vs)?;
    common_spider_type(g, vs)
}

checker!(match_reverse_pivot_start => check_reverse_pivot_start(vs: &[VertexId]));

/// Starts a reverse pivot by joining a new placeholder vertex to `vs` with
/// Hadamard edges. Returns the placeholder.
pub fn reverse_pivot_start(ops: &mut GraphOps, vs: &[VertexId]) -> RewriteResult<VertexId> {
    match_reverse_pivot_start(ops, vs)?;
    let pos = centroid_of(ops, vs);
    let hub = ops.add_vertex(VType::TempPivot, pos, Angle::zero());
    for &x in vs {
        ops.add_edge(hub, x, EType::H)?;
    }
    debug!("reverse_pivot_start: placeholder {hub} over {vs:?}");
    Ok(hub)
}

/// How a path over an edge removed by a reverse pivot is carried over.
#[derive(Debug, Clone, Copy)]
enum Route {
    /// From `A` to `B` over both restored vertices.
    ViaBoth(VertexId, VertexId),
    /// Between `A` and `C` over the first restored vertex.
    ViaU(VertexId, VertexId),
    /// Between `B` and `C` over the second restored vertex.
    ViaV(VertexId, VertexId),
}

#[derive(Debug, Clone)]
struct FinishMatch {
    ty: VType,
    a: Vec<VertexId>,
    b: Vec<VertexId>,
    c: Vec<VertexId>,
    rerouted: Vec<(EdgeId, Route)>,
    phases: Vec<(VertexId, Angle)>,
}

fn match_reverse_pivot_finish(
    g: &Diagram,
    hub: VertexId,
    vs: &[VertexId],
    phase_u: &Angle,
    phase_v: &Angle,
) -> RewriteResult<FinishMatch> {
    require_vertex(g, hub)?;
    require_vertex_set(g, vs)?;
    if vs.contains(&hub) {
        return invalid(format!("{hub} cannot be its own neighbor"));
    }
    if !phase_u.is_zero_or_pi() || !phase_v.is_zero_or_pi() {
        return invalid(format!("phases {phase_u} and {phase_v} must be 0 or π"));
    }
    ensure!(
        g.vertex_type(hub) == Some(VType::TempPivot),
        "{hub} is not a pivot placeholder"
    );
    let ty = common_spider_type(g, vs)?;
    let nu = hadamard_star(g, hub, ty)?;
    let (a, b, c) = groups(&nu, vs);
    check_cross_edges(g, &a, &b, &c)?;

    let mut rerouted = Vec::new();
    for (x, y) in cross_pairs(&a, &b, &c) {
        for e in g.edges_between(x, y) {
            if g.paths_of_edges(&[e]).is_empty() {
                continue;
            }
            let route = if c.contains(&y) {
                if a.contains(&x) {
                    Route::ViaU(x, y)
                } else {
                    Route::ViaV(x, y)
                }
            } else {
                Route::ViaBoth(x, y)
            };
            rerouted.push((e, route));
        }
    }
    let phases = group_phases(g, [&a, &b, &c], &-phase_v.clone(), &-phase_u.clone())?;
    Ok(FinishMatch {
        ty,
        a,
        b,
        c,
        rerouted,
        phases,
    })
}

checker!(match_reverse_pivot_finish => check_reverse_pivot_finish(
    hub: VertexId,
    vs: &[VertexId],
    phase_u: &Angle,
    phase_v: &Angle
));

/// Finishes a reverse pivot: the placeholder `hub` becomes a spider with
/// `phase_u`, a second spider with `phase_v` is joined to it and to `vs`, the
/// edges between the resulting groups are complemented and the phases
/// [`pivot`] adds are taken away again. Paths over removed edges are
/// rerouted through the restored spiders where those are free.
///
/// Returns the two restored spiders, the former placeholder first.
pub fn reverse_pivot_finish(
    ops: &mut GraphOps,
    hub: VertexId,
    vs: &[VertexId],
    phase_u: &Angle,
    phase_v: &Angle,
) -> RewriteResult<(VertexId, VertexId)> {
    let m = match_reverse_pivot_finish(ops, hub, vs, phase_u, phase_v)?;
    set_phases(ops, &m.phases)?;

    let u = hub;
    let mut spokes_u = FxHashMap::default();
    for &e in ops.incident_edges(u) {
        if let Some(x) = ops.other_end(e, u) {
            spokes_u.insert(x, e);
        }
    }
    ops.set_vertex_type(u, m.ty)?;
    ops.set_phase(u, phase_u.clone())?;
    let pos = centroid_of(ops, vs);
    let v = ops.add_vertex(m.ty, pos, phase_v.clone());
    let uv = ops.add_edge(u, v, EType::H)?;
    let mut spokes_v = FxHashMap::default();
    for &y in vs {
        spokes_v.insert(y, ops.add_edge(v, y, EType::H)?);
    }

    let spoke = |spokes: &FxHashMap<VertexId, EdgeId>, x: VertexId| {
        spokes
            .get(&x)
            .copied()
            .ok_or_else(|| internal(format!("no spoke to {x}")))
    };
    for &(e, route) in &m.rerouted {
        let run = match route {
            Route::ViaBoth(x, y) => vec![spoke(&spokes_u, x)?, uv, spoke(&spokes_v, y)?],
            Route::ViaU(x, y) => vec![spoke(&spokes_u, x)?, spoke(&spokes_u, y)?],
            Route::ViaV(x, y) => vec![spoke(&spokes_v, x)?, spoke(&spokes_v, y)?],
        };
        reroute_edge(ops, e, &run)?;
    }
    toggle_cross_edges(ops, &m.a, &m.b, &m.c)?;
    debug!("reverse_pivot_finish: restored {u} and {v}");
    Ok((u, v))
}

fn match_abandon_reverse_pivot(g: &Diagram, hub: VertexId) -> RewriteResult<()> {
    require_vertex(g, hub)?;
    ensure!(
        g.vertex_type(hub) == Some(VType::TempPivot),
        "{hub} is not a pivot placeholder"
    );
    Ok(())
}

checker!(match_abandon_reverse_pivot => check_abandon_reverse_pivot(hub: VertexId));

/// Discards the placeholder of an unfinished reverse pivot.
pub fn abandon_reverse_pivot(ops: &mut GraphOps, hub: VertexId) -> RewriteResult<()> {
    match_abandon_reverse_pivot(ops, hub)?;
    ops.delete_vertices(&[hub])?;
    debug!("abandon_reverse_pivot: removed {hub}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn angle(s: &str) -> Angle {
        s.parse().unwrap()
    }

    fn v(i: u32) -> VertexId {
        VertexId(i)
    }

    fn e(i: u32) -> EdgeId {
        EdgeId(i)
    }

    /// Pivot edge `e0` between `z0` (phase π) and `z1`. `z2` hangs off `z0`
    /// only, `z3` off `z1` only and `z4` off both. Boundaries `b5` and `b6`
    /// hold a path `b5 - z2 - z0 - z1 - z3 - b6`.
    #[fixture]
    fn pair() -> Diagram {
        let mut g = Diagram::new();
        let mut ops = GraphOps::new(&mut g);
        let phases = ["π", "0", "π/4", "π/2", "0"];
        for (i, p) in phases.iter().enumerate() {
            let pos = Coord::new(i as f64, 0.0);
            ops.add_vertex(VType::Z, Some(pos), angle(p));
        }
        ops.add_vertex(VType::B, None, Angle::zero());
        ops.add_vertex(VType::B, None, Angle::zero());
        for (s, t) in [(0, 1), (0, 2), (1, 3), (0, 4), (1, 4)] {
            ops.add_edge(v(s), v(t), EType::H).unwrap();
        }
        let e5 = ops.add_edge(v(2), v(5), EType::N).unwrap();
        let e6 = ops.add_edge(v(3), v(6), EType::N).unwrap();
        ops.add_path(&[e5, e(1), e(0), e(2), e6]).unwrap();
        g
    }

    fn only_path_vertices(g: &Diagram) -> Vec<VertexId> {
        assert_eq!(g.num_paths(), 1);
        let (p, _) = g.paths().next().unwrap();
        g.path_vertices(p).unwrap()
    }

    #[rstest]
    fn pivot_groups_and_phases(mut pair: Diagram) {
        let mut ops = GraphOps::new(&mut pair);
        let r = pivot(&mut ops, e(0)).unwrap();
        assert_eq!(r.a, vec![v(2)]);
        assert_eq!(r.b, vec![v(3)]);
        assert_eq!(r.c, vec![v(4)]);
        assert_eq!(r.phase_u, Angle::pi());
        assert!(r.phase_v.is_zero());

        assert!(!ops.contains_vertex(v(0)));
        assert!(!ops.contains_vertex(v(1)));
        for (x, y) in [(2, 3), (2, 4), (3, 4)] {
            let es = ops.edges_between(v(x), v(y));
            assert_eq!(es.len(), 1);
            assert_eq!(ops.edge_type(es[0]), Some(EType::H));
        }
        assert_eq!(ops.num_edges(), 5);

        assert_eq!(ops.phase(v(2)), Some(&angle("π/4")));
        assert_eq!(ops.phase(v(3)), Some(&angle("-π/2")));
        assert!(ops.has_phase_zero(v(4)));
        assert_eq!(only_path_vertices(&ops), vec![v(5), v(2), v(3), v(6)]);
    }

    #[rstest]
    fn pivot_removes_existing_cross_edges(mut pair: Diagram) {
        let mut ops = GraphOps::new(&mut pair);
        ops.add_edge(v(2), v(3), EType::H).unwrap();
        pivot(&mut ops, e(0)).unwrap();
        assert!(!ops.connected(v(2), v(3)));
        assert_eq!(ops.num_paths(), 0);
    }

    fn spoil_phase(ops: &mut GraphOps) {
        ops.set_phase(v(1), Angle::half_pi()).unwrap();
    }

    fn spoil_boundary_neighbor(ops: &mut GraphOps) {
        let b = ops.add_vertex(VType::B, None, Angle::zero());
        ops.add_edge(v(0), b, EType::N).unwrap();
    }

    fn spoil_pivot_edge(ops: &mut GraphOps) {
        ops.set_edge_type(e(0), EType::N).unwrap();
    }

    fn spoil_cross_edge(ops: &mut GraphOps) {
        ops.add_edge(v(2), v(4), EType::N).unwrap();
    }

    fn spoil_color(ops: &mut GraphOps) {
        ops.toggle_vertex_color(v(3)).unwrap();
    }

    #[rstest]
    #[case::phase(spoil_phase)]
    #[case::boundary_neighbor(spoil_boundary_neighbor)]
    #[case::pivot_edge(spoil_pivot_edge)]
    #[case::cross_edge(spoil_cross_edge)]
    #[case::color(spoil_color)]
    fn pivot_preconditions(mut pair: Diagram, #[case] spoil: fn(&mut GraphOps)) {
        let mut ops = GraphOps::new(&mut pair);
        spoil(&mut ops);
        let before = ops.diagram().clone();
        assert!(!check_pivot(&ops, e(0)));
        assert!(matches!(
            pivot(&mut ops, e(0)),
            Err(RewriteError::PreconditionFailed(_))
        ));
        assert_eq!(ops.diagram(), &before);
    }

    #[rstest]
    fn reverse_pivot_restores(mut pair: Diagram) {
        let before = pair.clone();
        let mut ops = GraphOps::new(&mut pair);
        let r = pivot(&mut ops, e(0)).unwrap();

        let hub = reverse_pivot_start(&mut ops, &r.u_side()).unwrap();
        assert_eq!(ops.vertex_type(hub), Some(VType::TempPivot));
        assert!(check_abandon_reverse_pivot(&ops, hub));
        let (u, w) =
            reverse_pivot_finish(&mut ops, hub, &r.v_side(), &r.phase_u, &r.phase_v).unwrap();

        assert_eq!(u, hub);
        assert_eq!(ops.num_vertices(), before.num_vertices());
        assert_eq!(ops.num_edges(), before.num_edges());
        assert_eq!(ops.vertex_type(u), Some(VType::Z));
        assert_eq!(ops.phase(u), before.phase(v(0)));
        assert_eq!(ops.phase(w), before.phase(v(1)));
        for i in 2..5 {
            assert_eq!(ops.phase(v(i)), before.phase(v(i)));
        }
        for (x, y) in [(u, w), (u, v(2)), (u, v(4)), (w, v(3)), (w, v(4))] {
            let es = ops.edges_between(x, y);
            assert_eq!(es.len(), 1);
            assert_eq!(ops.edge_type(es[0]), Some(EType::H));
        }
        assert!(!ops.connected(v(2), v(3)));
        assert!(!ops.connected(v(2), v(4)));
        assert!(!ops.connected(v(3), v(4)));
        assert_eq!(
            only_path_vertices(&ops),
            vec![v(5), v(2), u, w, v(3), v(6)]
        );
    }

    #[rstest]
    fn abandon_removes_placeholder(mut pair: Diagram) {
        let (nv, ne) = (pair.num_vertices(), pair.num_edges());
        let mut ops = GraphOps::new(&mut pair);
        let hub = reverse_pivot_start(&mut ops, &[v(2), v(3)]).unwrap();
        assert_eq!(ops.degree(hub), 2);
        abandon_reverse_pivot(&mut ops, hub).unwrap();
        assert_eq!(ops.num_vertices(), nv);
        assert_eq!(ops.num_edges(), ne);
        assert!(!check_abandon_reverse_pivot(&ops, v(0)));
    }

    #[rstest]
    fn finish_rejects_bad_arguments(mut pair: Diagram) {
        let mut ops = GraphOps::new(&mut pair);
        let hub = reverse_pivot_start(&mut ops, &[v(2)]).unwrap();
        let zero = Angle::zero();
        let err = |r: RewriteResult<FinishMatch>| match r {
            Err(RewriteError::InvalidArgument(_)) => "argument",
            Err(RewriteError::PreconditionFailed(_)) => "precondition",
            _ => "other",
        };
        let g = ops.diagram();
        assert_eq!(
            err(match_reverse_pivot_finish(g, hub, &[v(3)], &Angle::half_pi(), &zero)),
            "argument"
        );
        assert_eq!(
            err(match_reverse_pivot_finish(g, hub, &[hub], &zero, &zero)),
            "argument"
        );
        assert_eq!(
            err(match_reverse_pivot_finish(g, v(0), &[v(3)], &zero, &zero)),
            "precondition"
        );
        assert_eq!(
            err(match_reverse_pivot_finish(g, hub, &[v(5)], &zero, &zero)),
            "precondition"
        );
        assert!(check_reverse_pivot_finish(g, hub, &[v(3)], &zero, &zero));
    }

    #[rstest]
    fn start_rejects_mixed_types(pair: Diagram) {
        assert!(!check_reverse_pivot_start(&pair, &[v(2), v(5)]));
        assert!(!check_reverse_pivot_start(&pair, &[]));
        assert!(check_reverse_pivot_start(&pair, &[v(2), v(3)]));
    }
}
