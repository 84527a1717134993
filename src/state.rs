use faer::prelude::*;

use crate::node::{NodeFreedomMap, Vertex};

/// Simulation state: initial vertex positions and the packed unknowns of free vertices
#[derive(Debug, Clone)]
pub struct State {
    /// Initial positions of all vertices `[2][n_vertices]`
    pub x0: Mat<f64>,
    /// `[x, y, vx, vy]` per free vertex `[4 * n_free]`
    pub u: Col<f64>,
}

impl State {
    /// Starts every free vertex at rest at its initial position
    pub fn new(vertices: &[Vertex], nfm: &NodeFreedomMap) -> Self {
        let x0 = Mat::from_fn(2, vertices.len(), |i, j| vertices[j].x[i]);
        let mut u = Col::zeros(nfm.n_dofs());
        nfm.free_vertices.iter().enumerate().for_each(|(k, &v)| {
            u[4 * k] = x0[(0, v)];
            u[4 * k + 1] = x0[(1, v)];
        });
        Self { x0, u }
    }

    /// Current positions of all vertices `[2][n_vertices]`
    pub fn positions(&self, nfm: &NodeFreedomMap) -> Mat<f64> {
        let mut x = Mat::zeros(2, self.x0.ncols());
        calc_positions(x.as_mut(), self.x0.as_ref(), self.u.as_ref(), nfm);
        x
    }
}

/// Writes vertex positions: fixed vertices from `x0`, free vertices from `u`
pub fn calc_positions(
    mut x: MatMut<f64>,
    x0: MatRef<f64>,
    u: ColRef<f64>,
    nfm: &NodeFreedomMap,
) {
    x.copy_from(x0);
    nfm.free_vertices.iter().enumerate().for_each(|(k, &v)| {
        x[(0, v)] = u[4 * k];
        x[(1, v)] = u[4 * k + 1];
    });
}

/// Scales the velocity components of a packed state or system function
pub fn damp_velocities(mut u: ColMut<f64>, damping: f64) {
    (0..u.nrows() / 4).for_each(|k| {
        u[4 * k + 2] *= damping;
        u[4 * k + 3] *= damping;
    });
}

/// Maximum absolute entry, 0 for an empty vector
pub fn norm_inf(u: ColRef<f64>) -> f64 {
    u.iter().fold(0., |m: f64, v| m.max(v.abs()))
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::node::Mobility;

    fn vertices() -> Vec<Vertex> {
        [(0., 0., Mobility::Fixed), (1., 2., Mobility::Free), (3., 4., Mobility::Free)]
            .iter()
            .enumerate()
            .map(|(id, &(x, y, mobility))| Vertex {
                id,
                x: [x, y],
                mobility,
                buoyant_radius: 0.,
            })
            .collect()
    }

    #[test]
    fn test_state_packs_free_vertices() {
        let v = vertices();
        let nfm = NodeFreedomMap::new(&v);
        let mut state = State::new(&v, &nfm);
        assert_eq!(state.u.nrows(), 8);
        assert_eq!([state.u[0], state.u[1], state.u[4], state.u[5]], [1., 2., 3., 4.]);

        state.u[1] = -2.;
        let x = state.positions(&nfm);
        assert_eq!(x[(0, 0)], 0.);
        assert_eq!(x[(1, 1)], -2.);
        assert_eq!(x[(0, 2)], 3.);
    }

    #[test]
    fn test_damp_velocities() {
        let mut u = Col::from_fn(8, |i| (i + 1) as f64);
        damp_velocities(u.as_mut(), 0.5);
        assert_eq!(u[0], 1.);
        assert_eq!(u[2], 1.5);
        assert_eq!(u[3], 2.);
        assert_eq!(u[7], 4.);
        assert_eq!(norm_inf(u.as_ref()), 6.);
    }
}
