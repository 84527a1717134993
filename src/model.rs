use itertools::Itertools;

use crate::config::PhysicsConfig;
use crate::elements::springs::{Edge, EdgeKind};
use crate::elements::Elements;
use crate::error::ScenarioError;
use crate::node::{Mobility, NodeFreedomMap, Vertex};
use crate::scenario::Scenario;
use crate::simulation::{Simulation, SimulationParameters};
use crate::solver::{Solver, StepParameters};
use crate::state::State;
use crate::topology::{reorder, Topology};
use crate::util::distance_between;

pub struct Model {
    water_level: f64,
    h: f64,
    damping: f64,
    max_iter: usize,
    solver_abs_tol: f64,
    solver_rel_tol: f64,
    physics: PhysicsConfig,
    pub vertices: Vec<Vertex>,
    pub edges: Vec<Edge>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Creates and initializes a model
    pub fn new() -> Model {
        Model {
            water_level: 0.,
            h: 0.01,
            damping: 0.8,
            max_iter: 50,
            solver_abs_tol: 1e-8,
            solver_rel_tol: 1e-9,
            physics: PhysicsConfig::default(),
            vertices: vec![],
            edges: vec![],
        }
    }

    /// Builds a model from a validated scenario
    pub fn from_scenario(scenario: &Scenario, physics: PhysicsConfig) -> Result<Model, ScenarioError> {
        scenario.validate()?;
        let mut model = Model::new();
        model.set_physics(physics);
        model.set_water_level(scenario.water_level);

        for (vertex, (p, &code, &r)) in scenario
            .vertices
            .iter()
            .zip(scenario.vertex_types.iter())
            .zip(scenario.vertex_boyant_radiai.iter())
            .map(|((p, c), r)| (p, c, r))
            .enumerate()
        {
            let mobility =
                Mobility::from_code(code).ok_or(ScenarioError::UnknownVertexType { vertex, code })?;
            let builder = model.add_vertex().position(p[0], p[1]).buoyant_radius(r);
            match mobility {
                Mobility::Fixed => builder.fixed().build(),
                Mobility::Free => builder.build(),
            };
        }

        for (edge, (ids, &code, &l0)) in scenario
            .edges
            .iter()
            .zip(scenario.edge_types.iter())
            .zip(scenario.edge_lengths.iter())
            .map(|((e, c), l)| (e, c, l))
            .enumerate()
        {
            let id = match EdgeKind::from_code(code) {
                Some(EdgeKind::Spring) => model.add_spring_element(ids[0], ids[1], Some(l0)),
                Some(EdgeKind::Rope) => model.add_rope_element(ids[0], ids[1], l0),
                None => return Err(ScenarioError::UnknownEdgeType { edge, code }),
            };
            model.edges[id].splits = scenario.edge_splits.get(edge).copied().unwrap_or(0);
        }

        Ok(model)
    }

    pub fn set_water_level(&mut self, hw: f64) {
        self.water_level = hw;
    }

    pub fn water_level(&self) -> f64 {
        self.water_level
    }

    pub fn set_time_step(&mut self, h: f64) {
        self.h = h;
    }

    /// Set the factor applied to velocities every step
    pub fn set_damping(&mut self, damping: f64) {
        self.damping = damping;
    }

    pub fn set_max_iter(&mut self, max_iter: usize) {
        self.max_iter = max_iter;
    }

    pub fn set_solver_tolerance(&mut self, abs_tol: f64, rel_tol: f64) {
        self.solver_abs_tol = abs_tol;
        self.solver_rel_tol = rel_tol;
    }

    pub fn set_physics(&mut self, physics: PhysicsConfig) {
        self.physics = physics;
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Initial positions of all vertices
    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.vertices.iter().map(|v| v.x).collect_vec()
    }

    pub fn create_node_freedom_map(&self) -> NodeFreedomMap {
        NodeFreedomMap::new(&self.vertices)
    }

    /// Orders the edges into the boundary walk and trailing ropes
    pub fn create_topology(&self) -> Topology {
        reorder(&self.positions(), &self.edges)
    }

    /// Create elements
    pub fn create_elements(&self) -> Elements {
        Elements::new(self.create_topology(), &self.vertices, self.physics.clone())
    }

    /// Creates and returns state object
    pub fn create_state(&self) -> State {
        State::new(&self.vertices, &self.create_node_freedom_map())
    }

    /// Create solver
    pub fn create_solver(&self) -> Solver {
        let step_parameters = StepParameters::new(
            self.h,
            self.damping,
            self.solver_abs_tol,
            self.solver_rel_tol,
            self.max_iter,
        );
        let state = self.create_state();
        Solver::new(
            step_parameters,
            self.create_node_freedom_map(),
            self.create_elements(),
            state.x0,
        )
    }

    /// Creates a simulation run, the time step is taken from `params`
    pub fn create_simulation(&mut self, params: SimulationParameters) -> Simulation {
        self.set_time_step(params.time_step);
        Simulation::new(
            params,
            self.create_solver(),
            self.create_state(),
            self.water_level,
        )
    }

    /// Creates and returns a vertex builder for adding a new vertex to the model
    pub fn add_vertex(&mut self) -> VertexBuilder<'_> {
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            id,
            x: [0., 0.],
            mobility: Mobility::Free,
            buoyant_radius: 0.,
        });
        VertexBuilder {
            vertex: &mut self.vertices[id],
        }
    }

    fn add_edge(&mut self, node_1_id: usize, node_2_id: usize, kind: EdgeKind, rest_length: f64) -> usize {
        let id = self.edges.len();
        self.edges.push(Edge {
            id,
            node_ids: [node_1_id, node_2_id],
            kind,
            rest_length,
            splits: 0,
        });
        id
    }

    /// Adds a spring, `None` uses the current distance between the vertices as rest length
    pub fn add_spring_element(
        &mut self,
        node_1_id: usize,
        node_2_id: usize,
        undeformed_length: Option<f64>,
    ) -> usize {
        let l0 = undeformed_length.unwrap_or_else(|| {
            distance_between(self.vertices[node_1_id].x, self.vertices[node_2_id].x)
        });
        self.add_edge(node_1_id, node_2_id, EdgeKind::Spring, l0)
    }

    pub fn add_rope_element(&mut self, node_1_id: usize, node_2_id: usize, length: f64) -> usize {
        self.add_edge(node_1_id, node_2_id, EdgeKind::Rope, length)
    }
}

//------------------------------------------------------------------------------
// Builder
//------------------------------------------------------------------------------

pub struct VertexBuilder<'a> {
    vertex: &'a mut Vertex,
}

impl VertexBuilder<'_> {
    /// Sets initial position
    pub fn position(self, x: f64, y: f64) -> Self {
        self.vertex.x = [x, y];
        self
    }

    /// Excludes the vertex from the unknowns
    pub fn fixed(self) -> Self {
        self.vertex.mobility = Mobility::Fixed;
        self
    }

    pub fn buoyant_radius(self, r: f64) -> Self {
        self.vertex.buoyant_radius = r;
        self
    }

    pub fn build(self) -> usize {
        self.vertex.id
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_builder() {
        let mut model = Model::new();
        let a = model.add_vertex().position(0., 0.).fixed().build();
        let b = model.add_vertex().position(3., 4.).buoyant_radius(0.5).build();
        let s = model.add_spring_element(a, b, None);
        let r = model.add_rope_element(a, b, 6.);
        assert_eq!((a, b, s, r), (0, 1, 0, 1));
        assert_relative_eq!(model.edges[s].rest_length, 5.);
        assert!(model.edges[r].is_rope());
        assert!(!model.vertices[a].is_free());
        assert_eq!(model.vertices[b].buoyant_radius, 0.5);

        let nfm = model.create_node_freedom_map();
        assert_eq!(nfm.n_dofs(), 4);
        let topology = model.create_topology();
        assert_eq!(topology.n_walk, 1);
        assert_eq!(topology.ropes().len(), 1);
    }
}
