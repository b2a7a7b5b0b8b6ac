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

//! Conversion between a [`Diagram`] and the json representation.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use itertools::Itertools;

use super::{
    DiagramNames, EdgeAttrs, JsonDiagram, JsonError, Layouts, NodeAttrs, PathAttrs, Position,
};
use crate::angle::Angle;
use crate::diagram::Diagram;
use crate::graph::{Coord, EdgeId};
use crate::ops::GraphOps;

impl JsonDiagram {
    /// Encode a diagram using the json representation.
    ///
    /// Items are named after their ids, so the names of an encoded diagram
    /// match the ids printed by the engine.
    pub fn from_diagram(g: &Diagram) -> Self {
        let mut nodes = BTreeMap::new();
        let mut layout = BTreeMap::new();
        for v in g.vertices() {
            let Some(data) = g.vertex_data(v) else {
                continue;
            };
            let angle = match data.phase.is_zero() {
                true => String::new(),
                false => data.phase.to_string(),
            };
            nodes.insert(v.to_string(), NodeAttrs { typ: data.ty, angle });
            if let Some(c) = g.coord(v) {
                layout.insert(v.to_string(), Position { x: c.x, y: c.y });
            }
        }

        let edges = g
            .edges()
            .map(|(e, d)| {
                let attrs = EdgeAttrs {
                    source: d.s.to_string(),
                    target: d.t.to_string(),
                    typ: d.ty,
                };
                (e.to_string(), attrs)
            })
            .collect();

        let paths = g
            .paths()
            .map(|(p, es)| {
                let edges = es.iter().map(|e| e.to_string()).collect();
                (p.to_string(), PathAttrs { edges })
            })
            .collect();

        JsonDiagram {
            nodes,
            edges,
            paths,
            layouts: Layouts { nodes: layout },
        }
    }

    /// Decode a diagram from the json representation.
    ///
    /// Items are inserted in natural name order, so that `v2` comes before
    /// `v10`. Paths are checked with the usual path validity rules and
    /// reordered into walk order.
    pub fn to_diagram(&self) -> Result<(Diagram, DiagramNames), JsonError> {
        let mut g = Diagram::new();
        let mut names = DiagramNames::default();
        let mut ops = GraphOps::new(&mut g);

        let nodes = self.nodes.iter().sorted_by(|(a, _), (b, _)| natural_order(a, b));
        for (name, attrs) in nodes {
            let phase: Angle = attrs
                .angle
                .parse()
                .map_err(|source| JsonError::InvalidNodePhase {
                    name: name.to_string(),
                    phase: attrs.angle.clone(),
                    source,
                })?;
            let v = ops.add_vertex(attrs.typ, None, phase);
            names.nodes.insert(name.to_string(), v);
        }

        for (name, pos) in &self.layouts.nodes {
            let v = names
                .vertex(name)
                .ok_or_else(|| JsonError::UnknownLayoutNode {
                    node: name.to_string(),
                })?;
            ops.set_coord(v, Coord::new(pos.x, pos.y), true)?;
        }

        let edges = self.edges.iter().sorted_by(|(a, _), (b, _)| natural_order(a, b));
        for (name, attrs) in edges {
            let endpoint = |node: &str| {
                names.vertex(node).ok_or_else(|| JsonError::UnknownNode {
                    edge: name.to_string(),
                    node: node.to_string(),
                })
            };
            let s = endpoint(&attrs.source)?;
            let t = endpoint(&attrs.target)?;
            if s == t {
                return Err(JsonError::SelfLoop {
                    edge: name.to_string(),
                });
            }
            if ops.connected(s, t) {
                return Err(JsonError::DuplicateEdge {
                    edge: name.to_string(),
                });
            }
            let e = ops.add_edge(s, t, attrs.typ)?;
            names.edges.insert(name.to_string(), e);
        }

        let paths = self.paths.iter().sorted_by(|(a, _), (b, _)| natural_order(a, b));
        for (name, attrs) in paths {
            let es = attrs
                .edges
                .iter()
                .map(|edge| {
                    names.edge(edge).ok_or_else(|| JsonError::UnknownEdge {
                        path: name.to_string(),
                        edge: edge.to_string(),
                    })
                })
                .collect::<Result<Vec<EdgeId>, _>>()?;
            ops.sort_valid_path_edges(&es, false)
                .map_err(|source| JsonError::InvalidPath {
                    path: name.to_string(),
                    source,
                })?;
            let p = ops.add_path(&es)?;
            names.paths.insert(name.to_string(), p);
        }

        Ok((g, names))
    }
}

/// Orders names by length first, which sorts numbered names numerically.
fn natural_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
