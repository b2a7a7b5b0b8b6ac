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

//! Identifiers and per-item data of a ZX-diagram.

use crate::angle::Angle;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// A vertex identifier. Ids of deleted vertices may be handed out again.
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
#[display("v{_0}")]
pub struct VertexId(pub u32);

/// An edge identifier. Ids of deleted edges may be handed out again.
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
#[display("e{_0}")]
pub struct EdgeId(pub u32);

/// A path identifier. Path ids are never reused within a diagram, so a
/// rewritten path always receives a fresh id.
#[derive(Display, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, From)]
#[display("p{_0}")]
pub struct PathId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The type of a vertex in a diagram.
///
/// The serialized names follow the editor's store format.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VType {
    #[serde(rename = "boundary")]
    B, // Boundary
    #[default]
    #[serde(rename = "z")]
    Z, // Z-spider
    #[serde(rename = "x")]
    X, // X-spider
    /// Placeholder hub living between the two steps of a reverse pivot.
    #[serde(rename = "pivotA")]
    TempPivot,
}

impl VType {
    /// Z- and X-spiders.
    pub fn is_spider(self) -> bool {
        matches!(self, VType::Z | VType::X)
    }

    /// Swaps Z and X, leaving other types alone.
    pub fn toggled_color(self) -> VType {
        match self {
            VType::Z => VType::X,
            VType::X => VType::Z,
            t => t,
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EType {
    /// Normal edge.
    #[default]
    #[serde(rename = "normal")]
    N,
    /// Hadamard edge.
    #[serde(rename = "hadamard")]
    H,
}

impl EType {
    pub fn opposite(&self) -> EType {
        match self {
            EType::N => EType::H,
            EType::H => EType::N,
        }
    }
}

/// Coordinates for rendering a vertex.
#[derive(Display, Debug, Default, Clone, Copy, PartialEq, PartialOrd, From)]
#[display("({},{})", x, y)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    /// Create a new coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Coord { x, y }
    }

    /// Linear interpolation, `t = 0` gives `self` and `t = 1` gives `other`.
    pub fn lerp(&self, other: &Coord, t: f64) -> Coord {
        Coord::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// The mean of a set of coordinates, or `None` for an empty set.
    pub fn centroid(coords: impl IntoIterator<Item = Coord>) -> Option<Coord> {
        let mut n = 0;
        let mut sum = Coord::default();
        for c in coords {
            sum.x += c.x;
            sum.y += c.y;
            n += 1;
        }
        (n > 0).then(|| Coord::new(sum.x / n as f64, sum.y / n as f64))
    }

    /// Manhattan distance.
    pub fn l1_dist(&self, other: &Coord) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VData {
    pub ty: VType,
    pub phase: Angle,
}

/// An edge between `s` and `t`, stored with `s <= t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EData {
    pub s: VertexId,
    pub t: VertexId,
    pub ty: EType,
}

impl EData {
    pub fn new(a: VertexId, b: VertexId, ty: EType) -> Self {
        let (s, t) = if a <= b { (a, b) } else { (b, a) };
        EData { s, t, ty }
    }

    pub fn touches(&self, v: VertexId) -> bool {
        self.s == v || self.t == v
    }

    /// The endpoint opposite to `v`, or `None` if `v` is not an endpoint.
    pub fn other(&self, v: VertexId) -> Option<VertexId> {
        if self.s == v {
            Some(self.t)
        } else if self.t == v {
            Some(self.s)
        } else {
            None
        }
    }

    /// Returns a shared endpoint of two edges, if any.
    pub fn shared_vertex(&self, other: &EData) -> Option<VertexId> {
        if other.touches(self.s) {
            Some(self.s)
        } else if other.touches(self.t) {
            Some(self.t)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_canonical_order() {
        let e = EData::new(VertexId(5), VertexId(2), EType::H);
        assert_eq!(e.s, VertexId(2));
        assert_eq!(e.t, VertexId(5));
        assert_eq!(e.other(VertexId(2)), Some(VertexId(5)));
        assert_eq!(e.other(VertexId(3)), None);
    }

    #[test]
    fn serialized_names() {
        assert_eq!(serde_json::to_string(&VType::B).unwrap(), "\"boundary\"");
        assert_eq!(serde_json::to_string(&VType::TempPivot).unwrap(), "\"pivotA\"");
        assert_eq!(serde_json::to_string(&EType::H).unwrap(), "\"hadamard\"");
        let t: EType = serde_json::from_str("\"normal\"").unwrap();
        assert_eq!(t, EType::N);
    }

    #[test]
    fn coords() {
        let a = Coord::new(0.0, 0.0);
        let b = Coord::new(3.0, 6.0);
        assert_eq!(a.lerp(&b, 0.5), Coord::new(1.5, 3.0));
        assert_eq!(Coord::centroid([a, b]), Some(Coord::new(1.5, 3.0)));
        assert_eq!(Coord::centroid(Vec::new()), None);
        assert_eq!(a.l1_dist(&b), 9.0);
    }
}
