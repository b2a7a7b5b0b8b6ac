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

//! Json encoding of the editor's diagram store.
//!
//! A diagram is stored as four tables keyed by name: `nodes`, `edges`,
//! `paths` and `layouts`. Names are only meaningful inside one file; decoding
//! assigns fresh ids and reports the mapping in a [`DiagramNames`].

mod diagram;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::angle::AngleError;
use crate::diagram::Diagram;
use crate::graph::{EType, EdgeId, PathId, VType, VertexId};
use crate::ops::OpError;
use crate::path::PathError;

/// Errors raised while converting between a [`Diagram`] and its json form.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    #[error("edge {edge} refers to unknown node {node}")]
    UnknownNode { edge: String, node: String },
    #[error("edge {edge} is a self-loop")]
    SelfLoop { edge: String },
    #[error("edge {edge} duplicates an earlier edge between the same nodes")]
    DuplicateEdge { edge: String },
    #[error("node {name} has an invalid angle {phase:?}: {source}")]
    InvalidNodePhase {
        name: String,
        phase: String,
        source: AngleError,
    },
    #[error("path {path} refers to unknown edge {edge}")]
    UnknownEdge { path: String, edge: String },
    #[error("path {path} is invalid: {source}")]
    InvalidPath { path: String, source: PathError },
    #[error("layout refers to unknown node {node}")]
    UnknownLayoutNode { node: String },
    #[error(transparent)]
    Op(#[from] OpError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Returns the json-encoded representation of a diagram.
pub fn encode_diagram(g: &Diagram) -> Result<String, JsonError> {
    let jd = JsonDiagram::from_diagram(g);
    Ok(serde_json::to_string_pretty(&jd)?)
}

/// Writes the json-encoded representation of a diagram to a file.
pub fn write_diagram(g: &Diagram, filename: &Path) -> Result<(), JsonError> {
    let jd = JsonDiagram::from_diagram(g);
    let file = std::fs::File::create(filename)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &jd)?;
    Ok(())
}

/// Reads a diagram from its json-encoded representation.
pub fn decode_diagram(s: &str) -> Result<(Diagram, DiagramNames), JsonError> {
    let jd: JsonDiagram = serde_json::from_str(s)?;
    jd.to_diagram()
}

/// Reads a diagram from a json-encoded file.
pub fn read_diagram(filename: &Path) -> Result<(Diagram, DiagramNames), JsonError> {
    let file = std::fs::File::open(filename)?;
    let reader = std::io::BufReader::new(file);
    let jd: JsonDiagram = serde_json::from_reader(reader)?;
    jd.to_diagram()
}

/// Identifier for an encoded node.
pub type NodeName = String;
/// Identifier for an encoded edge.
pub type EdgeName = String;
/// Identifier for an encoded path.
pub type PathName = String;

/// The ids assigned to each name while decoding.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiagramNames {
    pub nodes: HashMap<NodeName, VertexId>,
    pub edges: HashMap<EdgeName, EdgeId>,
    pub paths: HashMap<PathName, PathId>,
}

impl DiagramNames {
    pub fn vertex(&self, name: &str) -> Option<VertexId> {
        self.nodes.get(name).copied()
    }

    pub fn edge(&self, name: &str) -> Option<EdgeId> {
        self.edges.get(name).copied()
    }

    /// The name a vertex was decoded from.
    pub fn vertex_name(&self, v: VertexId) -> Option<&str> {
        self.nodes
            .iter()
            .find(|(_, &w)| w == v)
            .map(|(name, _)| name.as_str())
    }
}

/// The json-encoded store format.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
pub struct JsonDiagram {
    #[serde(default)]
    nodes: BTreeMap<NodeName, NodeAttrs>,
    #[serde(default)]
    edges: BTreeMap<EdgeName, EdgeAttrs>,
    #[serde(default)]
    paths: BTreeMap<PathName, PathAttrs>,
    #[serde(skip_serializing_if = "is_default")]
    #[serde(default)]
    layouts: Layouts,
}

/// Attributes for a node in the json-encoded diagram.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct NodeAttrs {
    #[serde(rename = "zxType")]
    typ: VType,
    /// The phase, as a pretty-printed angle. Zero phases are left out.
    #[serde(rename = "zxAngle")]
    #[serde(skip_serializing_if = "is_default")]
    #[serde(default)]
    angle: String,
}

/// Attributes for an edge in the json-encoded diagram.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct EdgeAttrs {
    source: NodeName,
    target: NodeName,
    #[serde(rename = "zxType")]
    #[serde(default)]
    typ: EType,
}

/// A path, as its edges in walk order.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct PathAttrs {
    edges: Vec<EdgeName>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct Layouts {
    #[serde(default)]
    nodes: BTreeMap<NodeName, Position>,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

/// Helper method to skip serialization of default values in serde.
///
/// From https://github.com/serde-rs/serde/issues/818.
pub(crate) fn is_default<T: Default + PartialEq>(t: &T) -> bool {
    *t == Default::default()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::angle::Angle;
    use crate::graph::Coord;
    use crate::ops::GraphOps;

    use rstest::{fixture, rstest};

    fn angle(s: &str) -> Angle {
        s.parse().unwrap()
    }

    /// A wire `b0 - z1 = x2 - b3` with a Hadamard edge in the middle, a
    /// path along it and positions for every vertex.
    #[fixture]
    fn wire() -> Diagram {
        let mut g = Diagram::new();
        let mut ops = GraphOps::new(&mut g);
        let b0 = ops.add_vertex(VType::B, Some(Coord::new(0.0, 0.0)), Angle::zero());
        let z1 = ops.add_vertex(VType::Z, Some(Coord::new(1.0, 0.0)), angle("π/2"));
        let x2 = ops.add_vertex(VType::X, Some(Coord::new(2.0, 0.0)), angle("α+π"));
        let b3 = ops.add_vertex(VType::B, Some(Coord::new(3.0, 0.0)), Angle::zero());
        let es = vec![
            ops.add_edge(b0, z1, EType::N).unwrap(),
            ops.add_edge(z1, x2, EType::H).unwrap(),
            ops.add_edge(x2, b3, EType::N).unwrap(),
        ];
        ops.add_path(&es).unwrap();
        g
    }

    /// A diagram whose ids have holes in them.
    #[fixture]
    fn holes() -> Diagram {
        let mut g = Diagram::new();
        let mut ops = GraphOps::new(&mut g);
        let gone = ops.add_vertex(VType::Z, None, Angle::zero());
        let z = ops.add_vertex(VType::Z, None, Angle::pi());
        let x = ops.add_vertex(VType::TempPivot, None, Angle::zero());
        ops.add_edge(z, x, EType::H).unwrap();
        ops.delete_vertices(&[gone]).unwrap();
        g
    }

    const TEST_JSON: &str = r#"{
        "nodes": {
            "node1": { "zxType": "boundary" },
            "node2": { "zxType": "z", "zxAngle": "π/2" },
            "node3": { "zxType": "boundary" }
        },
        "edges": {
            "edge1": { "source": "node1", "target": "node2", "zxType": "normal" },
            "edge2": { "source": "node3", "target": "node2", "zxType": "hadamard" }
        },
        "paths": { "path1": { "edges": ["edge2", "edge1"] } },
        "layouts": { "nodes": { "node2": { "x": 1.5, "y": -2.0 } } }
    }"#;

    #[rstest]
    #[case::wire(wire())]
    #[case::holes(holes())]
    fn json_roundtrip(#[case] g: Diagram) {
        let s = encode_diagram(&g).unwrap();
        let (g2, names) = decode_diagram(&s).unwrap();

        assert_eq!(g.num_vertices(), g2.num_vertices());
        assert_eq!(g.num_edges(), g2.num_edges());
        assert_eq!(g.num_paths(), g2.num_paths());

        for v in g.vertices() {
            let v2 = names.vertex(&v.to_string()).unwrap();
            assert_eq!(g.vertex_type(v), g2.vertex_type(v2));
            assert_eq!(g.phase(v), g2.phase(v2));
            assert_eq!(g.coord(v), g2.coord(v2));
        }
        for (e, d) in g.edges() {
            let e2 = names.edge(&e.to_string()).unwrap();
            let d2 = g2.edge(e2).unwrap();
            assert_eq!(d.ty, d2.ty);
            assert_eq!(names.vertex(&d.s.to_string()), Some(d2.s));
            assert_eq!(names.vertex(&d.t.to_string()), Some(d2.t));
        }
        for (p, es) in g.paths() {
            let p2 = names.paths[&p.to_string()];
            let mapped: Vec<EdgeId> = es
                .iter()
                .map(|e| names.edge(&e.to_string()).unwrap())
                .collect();
            assert_eq!(g2.path(p2).unwrap(), &mapped[..]);
        }
    }

    #[test]
    fn zero_phases_left_out() {
        let s = encode_diagram(&wire()).unwrap();
        let jd: serde_json::Value = serde_json::from_str(&s).unwrap();
        assert!(jd["nodes"]["v0"].get("zxAngle").is_none());
        assert_eq!(jd["nodes"]["v1"]["zxAngle"], "π/2");
        assert_eq!(jd["nodes"]["v1"]["zxType"], "z");
        assert_eq!(jd["edges"]["e1"]["zxType"], "hadamard");
    }

    #[test]
    fn json_decode() {
        let (g, names) = decode_diagram(TEST_JSON).unwrap();

        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 2);
        assert_eq!(g.num_paths(), 1);

        let n2 = names.vertex("node2").unwrap();
        assert_eq!(g.vertex_type(n2), Some(VType::Z));
        assert_eq!(g.phase(n2), Some(&Angle::half_pi()));
        assert_eq!(g.coord(n2), Some(Coord::new(1.5, -2.0)));
        assert_eq!(g.coord(names.vertex("node1").unwrap()), None);

        // the path is reordered to start from the first endpoint listed
        let (_, es) = g.paths().next().unwrap();
        assert_eq!(es, &[names.edge("edge2").unwrap(), names.edge("edge1").unwrap()]);
    }

    #[test]
    fn names_decode_in_numeric_order() {
        let mut g = Diagram::new();
        let mut ops = GraphOps::new(&mut g);
        for _ in 0..12 {
            ops.add_vertex(VType::Z, None, Angle::zero());
        }
        let (_, names) = decode_diagram(&encode_diagram(&g).unwrap()).unwrap();
        assert_eq!(names.vertex("v10"), Some(VertexId(10)));
        assert_eq!(names.vertex("v2"), Some(VertexId(2)));
    }

    #[rstest]
    #[case::unknown_node(
        r#"{"nodes": {"a": {"zxType": "z"}},
            "edges": {"e": {"source": "a", "target": "b"}}}"#,
        "unknown node b"
    )]
    #[case::self_loop(
        r#"{"nodes": {"a": {"zxType": "z"}},
            "edges": {"e": {"source": "a", "target": "a"}}}"#,
        "self-loop"
    )]
    #[case::duplicate(
        r#"{"nodes": {"a": {"zxType": "z"}, "b": {"zxType": "x"}},
            "edges": {"e": {"source": "a", "target": "b"},
                      "f": {"source": "b", "target": "a", "zxType": "hadamard"}}}"#,
        "duplicates"
    )]
    #[case::bad_angle(
        r#"{"nodes": {"a": {"zxType": "z", "zxAngle": "π@2"}}}"#,
        "invalid angle"
    )]
    #[case::unknown_edge(
        r#"{"nodes": {"a": {"zxType": "boundary"}},
            "paths": {"p": {"edges": ["e"]}}}"#,
        "unknown edge e"
    )]
    #[case::invalid_path(
        r#"{"nodes": {"a": {"zxType": "boundary"}, "b": {"zxType": "z"}},
            "edges": {"e": {"source": "a", "target": "b"}},
            "paths": {"p": {"edges": ["e"]}}}"#,
        "path ends must be boundary nodes"
    )]
    #[case::overlapping_paths(
        r#"{"nodes": {"a": {"zxType": "boundary"}, "b": {"zxType": "boundary"}},
            "edges": {"e": {"source": "a", "target": "b"}},
            "paths": {"p": {"edges": ["e"]}, "q": {"edges": ["e"]}}}"#,
        "overlaps"
    )]
    #[case::unknown_layout(
        r#"{"nodes": {}, "layouts": {"nodes": {"a": {"x": 0.0, "y": 0.0}}}}"#,
        "unknown node a"
    )]
    #[case::bad_type(r#"{"nodes": {"a": {"zxType": "h"}}}"#, "unknown variant")]
    fn decode_errors(#[case] json: &str, #[case] message: &str) {
        let err = decode_diagram(json).unwrap_err();
        assert!(
            err.to_string().contains(message),
            "{err} does not mention {message:?}"
        );
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("wire.json");
        let g = wire();
        write_diagram(&g, &file).unwrap();
        let (g2, _) = read_diagram(&file).unwrap();
        assert_eq!(g2.num_edges(), g.num_edges());
        assert!(matches!(
            read_diagram(&dir.path().join("missing.json")),
            Err(JsonError::Io(_))
        ));
    }
}
