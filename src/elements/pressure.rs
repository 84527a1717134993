use faer::prelude::*;
use itertools::Itertools;

use crate::{config::PhysicsConfig, node::NodeFreedomMap, util::column_xy};

use super::add_position_block;

/// Integral of the depth below the surface, `hw * y - y^2 / 2`
#[inline]
fn depth_integral(y: f64, hw: f64) -> f64 {
    hw * y - 0.5 * y * y
}

/// Hydrostatic force on the edge `p1 -> p2` for water height `hw`.
///
/// `kw` is `rho * g * W`. The portion of the edge above the surface carries no load.
pub fn edge_pressure_force(p1: [f64; 2], p2: [f64; 2], hw: f64, kw: f64) -> [f64; 2] {
    let (dx, dy) = (p2[0] - p1[0], p2[1] - p1[1]);

    // Horizontal or fully submerged, pressure at the midpoint times the edge normal
    if dy == 0. || (p1[1] <= hw && p2[1] <= hw) {
        let p = kw * (hw - 0.5 * (p1[1] + p2[1]));
        return [-p * dy, p * dx];
    }

    // Crossing the surface, only the wet part is loaded
    let a = p1[1].min(hw);
    let b = p2[1].min(hw);
    let fx = -kw * (depth_integral(b, hw) - depth_integral(a, hw));
    [fx, -fx * dx / dy]
}

/// Derivatives of [`edge_pressure_force`], rows `(Fx, Fy)`, columns `(x1, y1, x2, y2)`
pub fn edge_pressure_jacobian(p1: [f64; 2], p2: [f64; 2], hw: f64, kw: f64) -> [[f64; 4]; 2] {
    let (dx, dy) = (p2[0] - p1[0], p2[1] - p1[1]);

    // Fully submerged, F = kw * (hw - y_mid) * (-dy, dx)
    if dy == 0. || (p1[1] <= hw && p2[1] <= hw) {
        let p = hw - 0.5 * (p1[1] + p2[1]);
        return [
            [0., kw * (0.5 * dy + p), 0., kw * (0.5 * dy - p)],
            [-kw * p, -0.5 * kw * dx, kw * p, -0.5 * kw * dx],
        ];
    }

    // Crossing the surface
    let [fx, _] = edge_pressure_force(p1, p2, hw, kw);
    let q = dx / dy;
    let dq = [-1. / dy, dx / (dy * dy), 1. / dy, -dx / (dy * dy)];
    let dfx = [
        0.,
        if p1[1] < hw { kw * (hw - p1[1]) } else { 0. },
        0.,
        if p2[1] < hw { -kw * (hw - p2[1]) } else { 0. },
    ];
    let mut dfy = [0.; 4];
    (0..4).for_each(|k| dfy[k] = -dfx[k] * q - fx * dq[k]);
    [dfx, dfy]
}

/// Hydrostatic pressure on the wetted boundary edges
pub struct WaterPressure {
    kw: f64,
    /// Wetted edges, oriented along the boundary walk
    pub elem_node_ids: Vec<[usize; 2]>,
    /// Total force on each edge `[2][n_wet]`
    pub f: Mat<f64>,
    /// Edge force derivatives
    pub df: Vec<[[f64; 4]; 2]>,
}

impl WaterPressure {
    pub fn new(physics: &PhysicsConfig) -> Self {
        Self {
            kw: physics.kw(),
            elem_node_ids: vec![],
            f: Mat::zeros(2, 0),
            df: vec![],
        }
    }

    pub fn calculate(&mut self, x: MatRef<f64>, hw: f64, wetted: &[[usize; 2]]) {
        let kw = self.kw;
        self.elem_node_ids = wetted.to_vec();
        let ends = wetted
            .iter()
            .map(|ids| (column_xy(x, ids[0]), column_xy(x, ids[1])))
            .collect_vec();
        self.f = Mat::from_fn(2, ends.len(), |i, j| {
            edge_pressure_force(ends[j].0, ends[j].1, hw, kw)[i]
        });
        self.df = ends
            .iter()
            .map(|&(p1, p2)| edge_pressure_jacobian(p1, p2, hw, kw))
            .collect_vec();
    }

    /// Splits each edge force equally between its end vertices
    pub fn assemble_forces(&self, mut out: MatMut<f64>) {
        self.elem_node_ids
            .iter()
            .zip(self.f.col_iter())
            .for_each(|(ids, f)| {
                ids.iter().for_each(|&i| {
                    out[(0, i)] += 0.5 * f[0];
                    out[(1, i)] += 0.5 * f[1];
                });
            });
    }

    pub fn assemble_jacobian(&self, nfm: &NodeFreedomMap, scale: f64, mut jf: MatMut<f64>) {
        self.elem_node_ids
            .iter()
            .zip(self.df.iter())
            .for_each(|(ids, df)| {
                ids.iter().enumerate().for_each(|(k, &j)| {
                    let block = [
                        [df[0][2 * k], df[0][2 * k + 1]],
                        [df[1][2 * k], df[1][2 * k + 1]],
                    ];
                    ids.iter().for_each(|&i| {
                        add_position_block(jf.rb_mut(), nfm, i, j, &block, 0.5 * scale);
                    });
                });
            });
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
