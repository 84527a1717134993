use itertools::Itertools;
use tracing::warn;

use crate::{elements::springs::Edge, util::equal_edges};

/// Vertices below this height are considered to be on the ground
pub const GROUND_THRESHOLD: f64 = 1e-5;

/// Returns the rightmost vertex on the ground, where the boundary walk starts.
///
/// Falls back to vertex 0 when no vertex touches the ground.
pub fn find_origin(positions: &[[f64; 2]]) -> usize {
    let origin = positions
        .iter()
        .enumerate()
        .filter(|(_, p)| p[1] < GROUND_THRESHOLD)
        .fold(None, |best: Option<(usize, f64)>, (i, p)| match best {
            Some((_, x)) if x >= p[0] => best,
            _ => Some((i, p[0])),
        });
    match origin {
        Some((i, _)) => i,
        None => {
            warn!("no vertex on the ground, starting boundary walk at vertex 0");
            0
        }
    }
}

/// Edges reordered for the water-line classifier.
///
/// `edges` holds the boundary walk, then springs the walk did not reach,
/// then every rope in input order.
#[derive(Debug, Clone)]
pub struct Topology {
    pub edges: Vec<Edge>,
    /// Number of edges in the boundary walk
    pub n_walk: usize,
    /// Number of springs not on the walk
    pub n_detached: usize,
    /// Vertex where the walk starts
    pub origin: usize,
}

impl Topology {
    /// Contiguous spring walk starting at the origin, each edge oriented along it
    pub fn walk(&self) -> &[Edge] {
        &self.edges[..self.n_walk]
    }

    pub fn detached(&self) -> &[Edge] {
        &self.edges[self.n_walk..self.n_walk + self.n_detached]
    }

    pub fn ropes(&self) -> &[Edge] {
        &self.edges[self.n_walk + self.n_detached..]
    }
}

/// Orders the edge set into a boundary walk starting at [`find_origin`].
///
/// At each vertex the first untraversed spring incident to it, in input order,
/// is taken and oriented to start there. A spring joining the same vertices as
/// the one just walked is never taken back. The walk ends at a vertex with no
/// such spring.
pub fn reorder(positions: &[[f64; 2]], edges: &[Edge]) -> Topology {
    let origin = find_origin(positions);

    let mut traversed = vec![false; edges.len()];
    let mut walk = vec![];
    let mut current = origin;

    loop {
        let last = walk.last().map(|e: &Edge| e.node_ids);
        let Some(i) = edges.iter().enumerate().position(|(i, e)| {
            !traversed[i]
                && !e.is_rope()
                && e.node_ids.contains(&current)
                && !last.is_some_and(|l| equal_edges(l, e.node_ids))
        }) else {
            break;
        };
        traversed[i] = true;
        let edge = if edges[i].node_ids[0] == current {
            edges[i].clone()
        } else {
            edges[i].reversed()
        };
        current = edge.node_ids[1];
        walk.push(edge);
    }

    let detached = edges
        .iter()
        .enumerate()
        .filter(|&(i, e)| !traversed[i] && !e.is_rope())
        .map(|(_, e)| e.clone())
        .collect_vec();
    if !detached.is_empty() {
        warn!(
            "{} spring(s) not reachable from vertex {origin}, excluded from the water line",
            detached.len()
        );
    }

    let n_walk = walk.len();
    let n_detached = detached.len();
    let edges = walk
        .into_iter()
        .chain(detached)
        .chain(edges.iter().filter(|e| e.is_rope()).cloned())
        .collect_vec();

    Topology {
        edges,
        n_walk,
        n_detached,
        origin,
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
