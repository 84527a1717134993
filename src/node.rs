use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Whether a vertex is a solver unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mobility {
    Free,
    Fixed,
}

impl Mobility {
    /// Vertex type code used by the scenario schema (0 = free, 1 = fixed)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Mobility::Free),
            1 => Some(Mobility::Fixed),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Mobility::Free => 0,
            Mobility::Fixed => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub id: usize,
    /// Initial position (x, y)
    pub x: [f64; 2],
    pub mobility: Mobility,
    /// Radius of the circular float attached to this vertex, 0 if not buoyant
    pub buoyant_radius: f64,
}

impl Vertex {
    pub fn is_free(&self) -> bool {
        self.mobility == Mobility::Free
    }
}

//------------------------------------------------------------------------------
// Degrees of freedom
//------------------------------------------------------------------------------

/// Number of unknowns per free vertex: x, y, vx, vy
pub const DOFS_PER_VERTEX: usize = 4;

/// Map between global vertex indices and the reduced set of free vertices.
///
/// Fixed vertices have no entry in the state vector.
#[derive(Debug, Clone)]
pub struct NodeFreedomMap {
    /// Global vertex index of each free vertex
    pub free_vertices: Vec<usize>,
    /// Free index of each vertex, `None` for fixed vertices
    pub vertex_to_free: Vec<Option<usize>>,
}

impl NodeFreedomMap {
    pub fn new(vertices: &[Vertex]) -> Self {
        let free_vertices = vertices
            .iter()
            .filter(|v| v.is_free())
            .map(|v| v.id)
            .collect_vec();
        let mut vertex_to_free = vec![None; vertices.len()];
        free_vertices
            .iter()
            .enumerate()
            .for_each(|(i, &v)| vertex_to_free[v] = Some(i));
        Self {
            free_vertices,
            vertex_to_free,
        }
    }

    pub fn n_vertices(&self) -> usize {
        self.vertex_to_free.len()
    }

    pub fn n_free(&self) -> usize {
        self.free_vertices.len()
    }

    /// Length of the state vector
    pub fn n_dofs(&self) -> usize {
        DOFS_PER_VERTEX * self.n_free()
    }

    /// Index of the vertex's x coordinate in the state vector
    pub fn first_dof_index(&self, vertex: usize) -> Option<usize> {
        self.vertex_to_free[vertex].map(|i| DOFS_PER_VERTEX * i)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    fn vertex(id: usize, mobility: Mobility) -> Vertex {
        Vertex {
            id,
            x: [id as f64, 0.],
            mobility,
            buoyant_radius: 0.,
        }
    }

    #[test]
    fn test_freedom_map() {
        let nfm = NodeFreedomMap::new(&[
            vertex(0, Mobility::Fixed),
            vertex(1, Mobility::Free),
            vertex(2, Mobility::Fixed),
            vertex(3, Mobility::Free),
        ]);
        assert_eq!(nfm.free_vertices, vec![1, 3]);
        assert_eq!(nfm.vertex_to_free, vec![None, Some(0), None, Some(1)]);
        assert_eq!(nfm.n_dofs(), 8);
        assert_eq!(nfm.first_dof_index(3), Some(4));
        assert_eq!(nfm.first_dof_index(2), None);
    }

    #[test]
    fn test_mobility_codes() {
        assert_eq!(Mobility::from_code(0), Some(Mobility::Free));
        assert_eq!(Mobility::from_code(1), Some(Mobility::Fixed));
        assert_eq!(Mobility::from_code(2), None);
        assert_eq!(Mobility::Fixed.code(), 1);
    }
}
