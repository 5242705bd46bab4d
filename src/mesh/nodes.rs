use ahash::{AHashMap, AHashSet};
use anyhow::{Context, Result, bail};
use itertools::Itertools;
use ndarray::Array2;
use rayon::prelude::*;
use smallvec::SmallVec;
use std::path::Path;

pub type NodeId = u64;

/// Boundary faces of the cubic RVE, `<axis><0|1>`.
pub const FACES: [&str; 6] = ["x0", "x1", "y0", "y1", "z0", "z1"];

/// Node coordinates, one row per node, looked up by Abaqus node id.
#[derive(Debug, Clone)]
pub struct NodeTable {
    rows: AHashMap<NodeId, usize>,
    coords: Array2<f64>,
}

impl NodeTable {
    pub fn from_nodes(nodes: &[(NodeId, [f64; 3])]) -> Self {
        let mut coords = Array2::<f64>::zeros((nodes.len(), 3));
        let mut rows = AHashMap::with_capacity(nodes.len());
        for (row, (id, xyz)) in nodes.iter().enumerate() {
            coords.row_mut(row).assign(&ndarray::arr1(xyz));
            rows.insert(*id, row);
        }
        Self { rows, coords }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn coords(&self, id: NodeId) -> Option<[f64; 3]> {
        let row = self.coords.row(*self.rows.get(&id)?);
        Some([row[0], row[1], row[2]])
    }
}

/// Periodic-boundary node sets of a cubic domain.
///
/// Faces exclude their edge nodes and edges exclude vertex nodes; face and
/// edge sets are sorted by (x, y, z) so opposite sets pair up by position.
#[derive(Debug, Clone, Default)]
pub struct PbcSets {
    pub faces: Vec<(String, Vec<NodeId>)>,
    pub edges: Vec<(String, Vec<NodeId>)>,
    pub vertices: Vec<(String, SmallVec<[NodeId; 2]>)>,
}

fn lookup<'a, T>(sets: &'a [(String, T)], name: &str) -> Option<&'a T> {
    sets.iter().find(|(n, _)| n == name).map(|(_, s)| s)
}

impl PbcSets {
    pub fn face(&self, name: &str) -> Option<&[NodeId]> {
        lookup(&self.faces, name).map(Vec::as_slice)
    }

    pub fn edge(&self, name: &str) -> Option<&[NodeId]> {
        lookup(&self.edges, name).map(Vec::as_slice)
    }

    /// First node of vertex set `name`.
    pub fn vertex(&self, name: &str) -> Option<NodeId> {
        lookup(&self.vertices, name).and_then(|v| v.first().copied())
    }

    /// True when every face, edge and vertex set holds at least one node.
    pub fn is_complete(&self) -> bool {
        !self.faces.is_empty()
            && !self.edges.is_empty()
            && !self.vertices.is_empty()
            && self.faces.iter().all(|(_, s)| !s.is_empty())
            && self.edges.iter().all(|(_, s)| !s.is_empty())
            && self.vertices.iter().all(|(_, s)| !s.is_empty())
    }
}

fn is_keyword(line: &str) -> bool {
    line.starts_with('*') && !line.starts_with("**")
}

fn keyword_is(line: &str, name: &str) -> bool {
    let head = line.split(',').next().unwrap_or("").trim();
    head.eq_ignore_ascii_case(name)
}

fn keyword_param<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split(',').skip(1).find_map(|part| {
        let (k, v) = part.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then(|| v.trim())
    })
}

fn has_flag(line: &str, flag: &str) -> bool {
    line.split(',').skip(1).any(|p| p.trim().eq_ignore_ascii_case(flag))
}

fn parse_ids(line: &str, lineno: usize) -> Result<Vec<NodeId>> {
    line.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<NodeId>()
                .with_context(|| format!("line {lineno}: bad node id {t:?}"))
        })
        .collect()
}

/// Read the first `*Node` block and the face node sets from Abaqus input text.
pub fn parse_mesh(text: &str) -> Result<(NodeTable, Vec<(String, Vec<NodeId>)>)> {
    #[derive(Clone, Copy)]
    enum Block {
        None,
        Nodes,
        Set(usize, bool),
    }

    let mut nodes: Vec<(NodeId, [f64; 3])> = Vec::new();
    let mut node_block_seen = false;
    let mut faces: Vec<(String, Vec<NodeId>)> = FACES.iter().map(|f| (f.to_string(), Vec::new())).collect();
    let mut faces_seen = [false; FACES.len()];
    let mut block = Block::None;

    for (i, raw) in text.lines().enumerate() {
        let lineno = i + 1;
        let line = raw.trim();
        if line.starts_with("**") {
            continue;
        }
        if is_keyword(line) {
            block = Block::None;
            if keyword_is(line, "*Node") && !node_block_seen {
                node_block_seen = true;
                block = Block::Nodes;
            } else if keyword_is(line, "*Nset") {
                let name = keyword_param(line, "nset").unwrap_or("");
                if let Some(slot) = FACES.iter().position(|f| f.eq_ignore_ascii_case(name)) {
                    if !faces_seen[slot] {
                        faces_seen[slot] = true;
                        block = Block::Set(slot, has_flag(line, "generate"));
                    }
                }
            }
            continue;
        }

        match block {
            Block::None => {}
            Block::Nodes => {
                if line.is_empty() {
                    continue;
                }
                let fields: Vec<&str> = line.split(',').map(str::trim).collect();
                if fields.len() < 4 {
                    bail!("line {lineno}: node line needs `id, x, y, z`");
                }
                let id: NodeId = fields[0]
                    .parse()
                    .with_context(|| format!("line {lineno}: bad node id {:?}", fields[0]))?;
                let mut xyz = [0.0f64; 3];
                for (slot, field) in xyz.iter_mut().zip(&fields[1..4]) {
                    *slot = field
                        .parse()
                        .with_context(|| format!("line {lineno}: bad coordinate {field:?}"))?;
                }
                nodes.push((id, xyz));
            }
            Block::Set(slot, generate) => {
                if line.is_empty() {
                    block = Block::None;
                    continue;
                }
                let ids = parse_ids(line, lineno)?;
                if generate {
                    let (start, end, step) = match ids.as_slice() {
                        [a, b] => (*a, *b, 1),
                        [a, b, s] if *s > 0 => (*a, *b, *s),
                        _ => bail!("line {lineno}: generate needs `first, last[, step]`"),
                    };
                    faces[slot].1.extend((start..=end).step_by(step as usize));
                } else {
                    faces[slot].1.extend(ids);
                }
            }
        }
    }

    if !node_block_seen {
        bail!("no *Node block");
    }
    if let Some(missing) = FACES.iter().zip(faces_seen).find(|(_, seen)| !seen) {
        bail!("missing node set {}", missing.0);
    }
    Ok((NodeTable::from_nodes(&nodes), faces))
}

fn intersect(a: &[NodeId], b: &[NodeId]) -> Vec<NodeId> {
    let other: AHashSet<NodeId> = b.iter().copied().collect();
    a.iter().copied().filter(|id| other.contains(id)).unique().collect()
}

fn remove_all(from: &mut Vec<NodeId>, drop: &[NodeId]) {
    let drop: AHashSet<NodeId> = drop.iter().copied().collect();
    from.retain(|id| !drop.contains(id));
}

fn sort_by_coords(nodes: &NodeTable, set_name: &str, set: &[NodeId]) -> Result<Vec<NodeId>> {
    let mut keyed: Vec<([f64; 3], NodeId)> = set
        .iter()
        .map(|&id| {
            nodes
                .coords(id)
                .map(|c| (c, id))
                .with_context(|| format!("node {id} of set {set_name} has no coordinates"))
        })
        .collect::<Result<_>>()?;
    keyed.par_sort_by(|(a, _), (b, _)| {
        a[0].total_cmp(&b[0])
            .then(a[1].total_cmp(&b[1]))
            .then(a[2].total_cmp(&b[2]))
    });
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
}

/// Vertex name for the corner at (x, y, z) face indices: `H` on z0, `V` on z1,
/// numbered 1 = (x0, y0), 2 = (x1, y0), 3 = (x1, y1), 4 = (x0, y1).
fn vertex_name(x: u8, y: u8, z: u8) -> String {
    let prefix = if z == 0 { 'H' } else { 'V' };
    let number = match (x, y) {
        (0, 0) => 1,
        (1, 0) => 2,
        (1, 1) => 3,
        _ => 4,
    };
    format!("{prefix}{number}")
}

/// Derive edge and vertex sets from the six face sets, strip shared nodes
/// and order everything by coordinates.
pub fn derive_pbc_sets(nodes: &NodeTable, faces: Vec<(String, Vec<NodeId>)>) -> Result<PbcSets> {
    let mut faces = faces;
    for name in FACES {
        if lookup(&faces, name).is_none() {
            bail!("missing face set {name}");
        }
    }
    let face = |faces: &[(String, Vec<NodeId>)], name: &str| -> Vec<NodeId> {
        lookup(faces, name).cloned().unwrap_or_default()
    };

    let mut edges: Vec<(String, Vec<NodeId>)> = FACES
        .iter()
        .tuple_combinations()
        .filter(|(a, b)| a.as_bytes()[0] != b.as_bytes()[0])
        .map(|(a, b)| (format!("{a}-{b}"), intersect(&face(&faces, a), &face(&faces, b))))
        .collect();

    let mut vertices: Vec<(String, SmallVec<[NodeId; 2]>)> = Vec::with_capacity(8);
    for z in 0..2u8 {
        for x in 0..2u8 {
            for y in 0..2u8 {
                let zx = intersect(&face(&faces, &format!("z{z}")), &face(&faces, &format!("x{x}")));
                let corner = intersect(&zx, &face(&faces, &format!("y{y}")));
                vertices.push((vertex_name(x, y, z), SmallVec::from_vec(corner)));
            }
        }
    }

    for (edge_name, edge_set) in &edges {
        for face_name in edge_name.split('-') {
            if let Some((_, set)) = faces.iter_mut().find(|(n, _)| n == face_name) {
                remove_all(set, edge_set);
            }
        }
    }
    for (_, corner) in &vertices {
        for (_, edge_set) in edges.iter_mut() {
            remove_all(edge_set, corner);
        }
    }

    for (name, set) in faces.iter_mut().chain(edges.iter_mut()) {
        *set = sort_by_coords(nodes, name, set)?;
    }

    tracing::debug!(
        face_nodes = faces.iter().map(|(_, s)| s.len()).sum::<usize>(),
        edge_nodes = edges.iter().map(|(_, s)| s.len()).sum::<usize>(),
        vertices = vertices.iter().filter(|(_, v)| !v.is_empty()).count(),
        "derived periodic node sets"
    );

    Ok(PbcSets {
        faces,
        edges,
        vertices,
    })
}

/// Parse an Abaqus mesh file and derive its periodic node sets.
pub fn read_pbc_sets(path: &Path) -> Result<(NodeTable, PbcSets)> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let (nodes, faces) = parse_mesh(&text).with_context(|| format!("parse {}", path.display()))?;
    let sets = derive_pbc_sets(&nodes, faces).with_context(|| format!("node sets of {}", path.display()))?;
    tracing::info!(path = %path.display(), nodes = nodes.len(), "parsed mesh nodes");
    Ok((nodes, sets))
}
