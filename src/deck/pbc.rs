use anyhow::{Context, Result, bail};
use std::fmt::Write;

use crate::mesh::{NodeId, PbcSets};

pub const LEFT_TO_RIGHT: &str = "LeftToRight.inp";
pub const BOTTOM_TO_TOP: &str = "BottomToTop.inp";
pub const FRONT_TO_REAR: &str = "FrontToRear.inp";
pub const EDGES: &str = "Edges.inp";
pub const CORNERS: &str = "Corners.inp";
pub const VERTEX_SETS: &str = "VerticeSets.inp";

/// Abaqus instance the vertex sets are defined on.
pub const INSTANCE: &str = "TESS-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Abaqus degree of freedom.
    pub fn dof(self) -> u8 {
        match self {
            Axis::X => 1,
            Axis::Y => 2,
            Axis::Z => 3,
        }
    }

    pub fn label(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }
}

/// `u(pos) - u(neg) = u(v_pos) - u(v_neg)` along `axis`.
pub fn equation(out: &mut String, pos: NodeId, neg: NodeId, v_pos: NodeId, v_neg: NodeId, axis: Axis) {
    let d = axis.dof();
    let _ = write!(
        out,
        "*Equation \n4 \n{pos},{d},1 \n{neg},{d},-1 \n{v_neg},{d},-1 \n{v_pos},{d},1 \n"
    );
}

/// One periodic face pair: the sets that are tied and the reference vertices.
#[derive(Debug, Clone, Copy)]
pub struct FacePair {
    pub file: &'static str,
    pub pos: &'static str,
    pub neg: &'static str,
    pub v_pos: &'static str,
    pub v_neg: &'static str,
}

pub const FACE_PAIRS: [FacePair; 3] = [
    FacePair {
        file: LEFT_TO_RIGHT,
        pos: "x1",
        neg: "x0",
        v_pos: "V1",
        v_neg: "V2",
    },
    FacePair {
        file: BOTTOM_TO_TOP,
        pos: "y0",
        neg: "y1",
        v_pos: "V4",
        v_neg: "V1",
    },
    FacePair {
        file: FRONT_TO_REAR,
        pos: "z1",
        neg: "z0",
        v_pos: "H1",
        v_neg: "V1",
    },
];

/// Edge pairs per plane: (tied edge, partner edge, negative reference vertex).
/// The positive reference is always `V1`.
const EDGE_PAIRS: [(&str, [(&str, &str, &str); 3]); 3] = [
    (
        "X-Y",
        [("x1-y1", "x0-y1", "V2"), ("x1-y0", "x0-y0", "V2"), ("x0-y1", "x0-y0", "V4")],
    ),
    (
        "Y-Z",
        [("y1-z0", "y1-z1", "H1"), ("y0-z0", "y0-z1", "H1"), ("y1-z1", "y0-z1", "V4")],
    ),
    (
        "Z-X",
        [("x1-z0", "x0-z0", "V2"), ("x1-z1", "x0-z1", "V2"), ("x0-z0", "x0-z1", "H1")],
    ),
];

const CORNER_PAIRS: [(&str, &str, &str); 4] = [
    ("V3", "V4", "V2"),
    ("H4", "V4", "H1"),
    ("H3", "V3", "H1"),
    ("H2", "V2", "H1"),
];

fn vertex(sets: &PbcSets, name: &str) -> Result<NodeId> {
    sets.vertex(name).with_context(|| format!("vertex set {name} is empty"))
}

fn paired<'a>(a: (&str, Option<&'a [NodeId]>), b: (&str, Option<&'a [NodeId]>)) -> Result<(&'a [NodeId], &'a [NodeId])> {
    let pos = a.1.with_context(|| format!("missing node set {}", a.0))?;
    let neg = b.1.with_context(|| format!("missing node set {}", b.0))?;
    if pos.len() != neg.len() {
        bail!("node sets {} and {} differ in size ({} vs {})", a.0, b.0, pos.len(), neg.len());
    }
    Ok((pos, neg))
}

pub fn render_face_pair(sets: &PbcSets, pair: &FacePair) -> Result<String> {
    let (pos, neg) = paired((pair.pos, sets.face(pair.pos)), (pair.neg, sets.face(pair.neg)))?;
    let v_pos = vertex(sets, pair.v_pos)?;
    let v_neg = vertex(sets, pair.v_neg)?;

    let mut out = String::with_capacity(pos.len() * 3 * 48);
    for axis in Axis::ALL {
        if axis == Axis::X {
            let _ = write!(out, "**** {}-DIR \n", axis.label());
        } else {
            let _ = write!(out, "**** \n**** {}-DIR \n", axis.label());
        }
        for (&p, &n) in pos.iter().zip(neg) {
            equation(&mut out, p, n, v_pos, v_neg, axis);
        }
    }
    Ok(out)
}

pub fn render_edges(sets: &PbcSets) -> Result<String> {
    let v_pos = vertex(sets, "V1")?;
    let mut out = String::new();
    for (_plane, pairs) in EDGE_PAIRS {
        for (a, b, v) in pairs {
            let (pos, neg) = paired((a, sets.edge(a)), (b, sets.edge(b)))?;
            let v_neg = vertex(sets, v)?;
            for axis in Axis::ALL {
                let _ = write!(out, "**** {}-DIR \n", axis.label());
                for (&p, &n) in pos.iter().zip(neg) {
                    equation(&mut out, p, n, v_pos, v_neg, axis);
                }
            }
        }
    }
    Ok(out)
}

pub fn render_corners(sets: &PbcSets) -> Result<String> {
    let v_pos = vertex(sets, "V1")?;
    let mut out = String::new();
    for (a, b, v) in CORNER_PAIRS {
        let (p, n, v_neg) = (vertex(sets, a)?, vertex(sets, b)?, vertex(sets, v)?);
        for axis in Axis::ALL {
            let _ = write!(out, "**** {}-DIR \n", axis.label());
            equation(&mut out, p, n, v_pos, v_neg, axis);
        }
    }
    Ok(out)
}

pub fn render_vertex_sets(sets: &PbcSets) -> Result<String> {
    let mut out = String::new();
    for (name, _) in &sets.vertices {
        let node = vertex(sets, name)?;
        let _ = write!(out, "*Nset, nset={name}, instance={INSTANCE} \n{node}\n");
    }
    Ok(out)
}
