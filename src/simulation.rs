use std::{
    fmt,
    str::FromStr,
    time::{Duration, Instant},
};

use faer::prelude::*;
use tracing::{debug, info};

use crate::{
    error::ScenarioError,
    output_writer::{Batch, OutputWriter},
    solver::{Solver, StepResults},
    state::{damp_velocities, norm_inf, State},
};

/// Time integration scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    ForwardEuler,
    BackwardEuler,
}

impl FromStr for Method {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Forward Euler" => Ok(Method::ForwardEuler),
            "Backward Euler" => Ok(Method::BackwardEuler),
            _ => Err(ScenarioError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::ForwardEuler => write!(f, "Forward Euler"),
            Method::BackwardEuler => write!(f, "Backward Euler"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationParameters {
    /// Water rise rate while the structure is in equilibrium (m/s)
    pub water_speed: f64,
    pub time_step: f64,
    /// Number of steps to run
    pub max_iterations: usize,
    pub method: Method,
    /// Wall-clock time between emitted batches
    pub batch_duration: Duration,
    /// The water rises only while the system function norm is below this value
    pub equilibrium_tolerance: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            water_speed: 0.,
            time_step: 0.01,
            max_iterations: 1000,
            method: Method::BackwardEuler,
            batch_duration: Duration::from_secs(1),
            equilibrium_tolerance: 100.,
        }
    }
}

/// One simulation run, yielding batches of recorded steps.
///
/// Each call to `next` runs steps until the batch duration has elapsed or the
/// last step is reached. The run stops early after [`Simulation::cancel`].
pub struct Simulation {
    pub params: SimulationParameters,
    pub solver: Solver,
    pub state: State,
    water_level: f64,
    step: usize,
    cancelled: bool,
    writer: OutputWriter,
    last_emit: Instant,
    fu: Col<f64>,     // System function at the current state
    u_prev: Col<f64>, // Damped current state
}

impl Simulation {
    pub fn new(params: SimulationParameters, solver: Solver, state: State, water_level: f64) -> Self {
        let n = solver.n_system;
        Self {
            writer: OutputWriter::new(params.max_iterations),
            params,
            solver,
            state,
            water_level,
            step: 0,
            cancelled: false,
            last_emit: Instant::now(),
            fu: Col::zeros(n),
            u_prev: Col::zeros(n),
        }
    }

    pub fn water_level(&self) -> f64 {
        self.water_level
    }

    /// Number of steps taken so far
    pub fn steps_taken(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.cancelled || self.step >= self.params.max_iterations
    }

    /// Stops the run, no further batches are produced
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Records the current state and advances it by one time step.
    ///
    /// Returns the Newton results for implicit steps.
    pub fn step(&mut self) -> Option<StepResults> {
        let h = self.params.time_step;
        let hw = self.water_level;
        let damping = self.solver.p.damping;

        // Forces at the current state
        self.solver
            .system_function(self.state.u.as_ref(), hw, self.fu.as_mut());
        self.writer
            .record(self.step, self.solver.positions(), &self.solver.forces, hw);
        let in_equilibrium = norm_inf(self.fu.as_ref()) < self.params.equilibrium_tolerance;

        self.u_prev.copy_from(&self.state.u);
        damp_velocities(self.u_prev.as_mut(), damping);
        damp_velocities(self.fu.as_mut(), damping);

        let res = match self.params.method {
            Method::ForwardEuler => {
                zip!(&mut self.state.u, &self.u_prev, &self.fu)
                    .for_each(|unzip!(u, u_prev, fu)| *u = *u_prev + h * *fu);
                None
            }
            Method::BackwardEuler => {
                let alpha = self.solver.p.guess_fraction;
                zip!(&mut self.state.u, &self.u_prev, &self.fu)
                    .for_each(|unzip!(u, u_prev, fu)| *u = *u_prev + alpha * h * *fu);
                Some(
                    self.solver
                        .solve(&mut self.state.u, self.u_prev.as_ref(), hw),
                )
            }
        };

        if in_equilibrium {
            self.water_level += self.params.water_speed * h;
        }

        debug!(
            "step {}: water level {:.4}, in equilibrium: {in_equilibrium}",
            self.step, hw
        );
        self.step += 1;
        res
    }
}

impl Iterator for Simulation {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        while !self.is_finished() {
            self.step();
            if self.step >= self.params.max_iterations
                || self.last_emit.elapsed() >= self.params.batch_duration
            {
                self.last_emit = Instant::now();
                let batch = self.writer.take_batch();
                if let Some(b) = &batch {
                    info!(
                        "batch of {} steps from step {} (water level {:.4})",
                        b.n_steps(),
                        b.first_step,
                        self.water_level
                    );
                }
                return batch;
            }
        }
        None
    }
}
