pub mod buoyancy;
pub mod gravity;
pub mod ground;
pub mod pressure;
pub mod springs;

use faer::prelude::*;
use itertools::Itertools;

use crate::{
    config::PhysicsConfig,
    node::{NodeFreedomMap, Vertex},
    topology::Topology,
    waterline::edges_touching_water,
};
use buoyancy::Buoyancy;
use gravity::Gravity;
use ground::Ground;
use pressure::WaterPressure;
use springs::Springs;

/// Adds `scale * block` to the force Jacobian rows of `row_vertex` and the
/// position columns of `col_vertex`. Nothing is added unless both are free.
pub fn add_position_block(
    mut jf: MatMut<f64>,
    nfm: &NodeFreedomMap,
    row_vertex: usize,
    col_vertex: usize,
    block: &[[f64; 2]; 2],
    scale: f64,
) {
    let (Some(rdof), Some(cdof)) = (
        nfm.first_dof_index(row_vertex),
        nfm.first_dof_index(col_vertex),
    ) else {
        return;
    };
    (0..2).cartesian_product(0..2).for_each(|(i, j)| {
        jf[(rdof + 2 + i, cdof + j)] += scale * block[i][j];
    });
}

/// Per-vertex force accumulators, each `[2][n_vertices]`
#[derive(Debug, Clone)]
pub struct Forces {
    pub gravity: Mat<f64>,
    pub buoyancy: Mat<f64>,
    pub pressure: Mat<f64>,
    pub tension: Mat<f64>,
    pub ground: Mat<f64>,
    /// Sum of all terms
    pub total: Mat<f64>,
}

impl Forces {
    pub fn zeros(n_vertices: usize) -> Self {
        Self {
            gravity: Mat::zeros(2, n_vertices),
            buoyancy: Mat::zeros(2, n_vertices),
            pressure: Mat::zeros(2, n_vertices),
            tension: Mat::zeros(2, n_vertices),
            ground: Mat::zeros(2, n_vertices),
            total: Mat::zeros(2, n_vertices),
        }
    }

    fn reset(&mut self) {
        self.gravity.fill(0.);
        self.buoyancy.fill(0.);
        self.pressure.fill(0.);
        self.tension.fill(0.);
        self.ground.fill(0.);
        self.total.fill(0.);
    }
}

pub struct Elements {
    pub physics: PhysicsConfig,
    pub topology: Topology,
    /// Buoyant radius of each vertex
    pub radii: Vec<f64>,
    pub gravity: Gravity,
    pub buoyancy: Buoyancy,
    pub pressure: WaterPressure,
    pub springs: Springs,
    pub ground: Ground,
    /// Wetted edges found by the last call to `calculate`
    pub wetted: Vec<[usize; 2]>,
}

impl Elements {
    pub fn new(topology: Topology, vertices: &[Vertex], physics: PhysicsConfig) -> Self {
        let n_vertices = vertices.len();
        let radii = vertices.iter().map(|v| v.buoyant_radius).collect_vec();
        Self {
            gravity: Gravity::new(&topology.edges, n_vertices, &physics),
            buoyancy: Buoyancy::new(&radii, &physics),
            pressure: WaterPressure::new(&physics),
            springs: Springs::new(&topology.edges, physics.kappa),
            ground: Ground::new(n_vertices, &physics),
            wetted: vec![],
            radii,
            topology,
            physics,
        }
    }

    /// Wetted edges of the boundary walk for the given positions `[2][n_vertices]`
    pub fn classify(&self, x: MatRef<f64>, hw: f64) -> Vec<[usize; 2]> {
        edges_touching_water(
            self.topology.walk(),
            x,
            &self.radii,
            hw,
            self.physics.entry_position_guard,
        )
    }

    /// Evaluates every force term at positions `x` `[2][n_vertices]` and water height `hw`
    pub fn calculate(&mut self, x: MatRef<f64>, hw: f64, forces: &mut Forces) {
        forces.reset();

        self.wetted = self.classify(x, hw);

        self.buoyancy.calculate(x, hw);
        self.pressure.calculate(x, hw, &self.wetted);
        self.springs.calculate(x);
        self.ground.calculate(x);

        self.gravity.assemble_forces(forces.gravity.as_mut());
        self.buoyancy.assemble_forces(forces.buoyancy.as_mut());
        self.pressure.assemble_forces(forces.pressure.as_mut());
        self.springs.assemble_forces(forces.tension.as_mut());
        self.ground.assemble_forces(forces.ground.as_mut());

        zip!(
            &mut forces.total,
            &forces.gravity,
            &forces.buoyancy,
            &forces.pressure,
            &forces.tension,
            &forces.ground
        )
        .for_each(|unzip!(r, g, b, p, t, c)| *r = *g + *b + *p + *t + *c);
    }

    /// Adds `scale` times the position derivatives of the resultant force to
    /// `jf`. Uses the element state of the last call to `calculate`.
    pub fn assemble_jacobian(&self, nfm: &NodeFreedomMap, scale: f64, mut jf: MatMut<f64>) {
        self.buoyancy.assemble_jacobian(nfm, scale, jf.rb_mut());
        self.pressure.assemble_jacobian(nfm, scale, jf.rb_mut());
        self.springs.assemble_jacobian(nfm, scale, jf.rb_mut());
        self.ground.assemble_jacobian(nfm, scale, jf.rb_mut());
    }
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
