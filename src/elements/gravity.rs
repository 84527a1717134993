use faer::prelude::*;

use crate::config::PhysicsConfig;

use super::springs::Edge;

/// Edge self-weight lumped onto the end vertices
pub struct Gravity {
    /// Constant gravity force `[2][n_vertices]`
    pub fg: Mat<f64>,
}

impl Gravity {
    pub fn new(edges: &[Edge], n_vertices: usize, physics: &PhysicsConfig) -> Self {
        let mut fg = Mat::zeros(2, n_vertices);
        edges.iter().for_each(|e| {
            let w = 0.5 * e.rest_length * physics.linear_density * physics.g;
            e.node_ids.iter().for_each(|&i| fg[(1, i)] -= w);
        });
        Self { fg }
    }

    pub fn assemble_forces(&self, mut out: MatMut<f64>) {
        out += self.fg.as_ref();
    }
}
