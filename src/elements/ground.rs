use faer::prelude::*;
use itertools::{izip, Itertools};

use crate::{config::PhysicsConfig, node::NodeFreedomMap};

use super::add_position_block;

/// Penalty force pushing vertices out of the ground
pub struct Ground {
    kappa: f64,
    epsilon: f64,
    /// Vertical contact force `[n_vertices]`
    pub fc: Col<f64>,
    pub in_contact: Vec<bool>,
}

impl Ground {
    pub fn new(n_vertices: usize, physics: &PhysicsConfig) -> Self {
        Self {
            kappa: physics.kappa_ground,
            epsilon: physics.epsilon_ground,
            fc: Col::zeros(n_vertices),
            in_contact: vec![false; n_vertices],
        }
    }

    pub fn calculate(&mut self, x: MatRef<f64>) {
        let (kappa, epsilon) = (self.kappa, self.epsilon);
        izip!(x.col_iter(), self.fc.iter_mut(), self.in_contact.iter_mut()).for_each(
            |(x, fc, contact)| {
                *contact = x[1] < epsilon;
                *fc = if *contact {
                    -kappa * (x[1] - epsilon)
                } else {
                    0.
                };
            },
        );
    }

    pub fn assemble_forces(&self, mut out: MatMut<f64>) {
        self.fc
            .iter()
            .enumerate()
            .for_each(|(i, &fc)| out[(1, i)] += fc);
    }

    pub fn assemble_jacobian(&self, nfm: &NodeFreedomMap, scale: f64, mut jf: MatMut<f64>) {
        let block = [[0., 0.], [0., -self.kappa]];
        self.in_contact
            .iter()
            .positions(|&c| c)
            .for_each(|i| add_position_block(jf.rb_mut(), nfm, i, i, &block, scale));
    }
}
