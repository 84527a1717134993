use faer::prelude::*;

use itertools::{izip, Itertools};
use serde::{Deserialize, Serialize};

use crate::node::NodeFreedomMap;

use super::add_position_block;

/// Connector behavior of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Bidirectional, carries tension and compression
    Spring,
    /// Unilateral, carries tension only when stretched past its rest length
    Rope,
}

impl EdgeKind {
    /// Edge type code used by the scenario schema (0 = spring, 2 = rope)
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(EdgeKind::Spring),
            2 => Some(EdgeKind::Rope),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            EdgeKind::Spring => 0,
            EdgeKind::Rope => 2,
        }
    }
}

/// Edge definition
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: usize,
    pub node_ids: [usize; 2],
    pub kind: EdgeKind,
    pub rest_length: f64,
    /// Subdivision count, only meaningful to scenario generators
    pub splits: usize,
}

impl Edge {
    /// Same edge traversed from its second vertex to its first
    pub fn reversed(&self) -> Self {
        Self {
            node_ids: [self.node_ids[1], self.node_ids[0]],
            ..self.clone()
        }
    }

    pub fn is_rope(&self) -> bool {
        self.kind == EdgeKind::Rope
    }
}

/// Elastic tension in springs and ropes
pub struct Springs {
    /// Number of elements
    pub n_elem: usize,
    /// Node ID for each element
    pub elem_node_ids: Vec<[usize; 2]>,
    /// Connector behavior of each element
    pub kind: Vec<EdgeKind>,
    /// Stiffness
    kappa: f64,
    /// Rest length `[n_elem]`
    pub l_ref: Col<f64>,
    /// Current difference in node locations, node 2 minus node 1 `[2][n_elem]`
    pub r: Mat<f64>,
    /// Current distance between nodes `[n_elem]`
    pub l: Col<f64>,
    pub c1: Col<f64>,
    pub c2: Col<f64>,
    /// False for slack ropes
    pub active: Vec<bool>,
    /// Force on node 2, node 1 receives the opposite `[2][n_elem]`
    pub f: Mat<f64>,
    /// Derivative of the node 2 force w.r.t. node 2 position, column major `[4][n_elem]`
    pub a: Mat<f64>,
}

impl Springs {
    pub fn new(edges: &[Edge], kappa: f64) -> Self {
        let n_elem = edges.len();
        Self {
            n_elem,
            elem_node_ids: edges.iter().map(|e| e.node_ids).collect_vec(),
            kind: edges.iter().map(|e| e.kind).collect_vec(),
            kappa,
            l_ref: Col::from_fn(n_elem, |i| edges[i].rest_length),
            r: Mat::zeros(2, n_elem),
            l: Col::zeros(n_elem),
            c1: Col::zeros(n_elem),
            c2: Col::zeros(n_elem),
            active: vec![false; n_elem],
            f: Mat::zeros(2, n_elem),
            a: Mat::zeros(4, n_elem),
        }
    }

    /// Calculates element forces and stiffness blocks from vertex positions `[2][n_vertices]`
    pub fn calculate(&mut self, x: MatRef<f64>) {
        let kappa = self.kappa;
        izip!(
            self.elem_node_ids.iter(),
            self.kind.iter(),
            self.l_ref.iter(),
            self.r.col_iter_mut(),
            self.l.iter_mut(),
            self.c1.iter_mut(),
            self.c2.iter_mut(),
            self.active.iter_mut(),
            self.f.col_iter_mut(),
            self.a.col_iter_mut(),
        )
        .for_each(
            |(ids, kind, &l_ref, mut r, l, c1, c2, active, mut f, mut a)| {
                r[0] = x[(0, ids[1])] - x[(0, ids[0])];
                r[1] = x[(1, ids[1])] - x[(1, ids[0])];
                *l = (r[0] * r[0] + r[1] * r[1]).sqrt();

                *active = match kind {
                    EdgeKind::Spring => true,
                    EdgeKind::Rope => *l > l_ref,
                };

                if !*active {
                    *c1 = 0.;
                    *c2 = 0.;
                    f.fill(0.);
                    a.fill(0.);
                    return;
                }

                *c1 = kappa * (l_ref / *l - 1.);
                *c2 = kappa * l_ref / (*l).powi(3);

                f[0] = *c1 * r[0];
                f[1] = *c1 * r[1];

                // c1 * I - c2 * r * r^T
                a[0] = *c1 - *c2 * r[0] * r[0];
                a[1] = -*c2 * r[1] * r[0];
                a[2] = -*c2 * r[0] * r[1];
                a[3] = *c1 - *c2 * r[1] * r[1];
            },
        );
    }

    /// Adds element forces to the per-vertex tension matrix `[2][n_vertices]`
    pub fn assemble_forces(&self, mut t: MatMut<f64>) {
        izip!(self.elem_node_ids.iter(), self.f.col_iter()).for_each(|(ids, f)| {
            t[(0, ids[0])] -= f[0];
            t[(1, ids[0])] -= f[1];
            t[(0, ids[1])] += f[0];
            t[(1, ids[1])] += f[1];
        });
    }

    /// Adds `scale` times the force derivatives to the force Jacobian
    pub fn assemble_jacobian(&self, nfm: &NodeFreedomMap, scale: f64, mut jf: MatMut<f64>) {
        izip!(
            self.elem_node_ids.iter(),
            self.active.iter(),
            self.a.col_iter()
        )
        .filter(|(_, active, _)| **active)
        .for_each(|(ids, _, a)| {
            let block = [[a[0], a[2]], [a[1], a[3]]];
            ids.iter()
                .cartesian_product(ids.iter())
                .for_each(|(&i, &j)| {
                    let sign = if i == j { 1. } else { -1. };
                    add_position_block(jf.rb_mut(), nfm, i, j, &block, sign * scale);
                });
        });
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
