use faer::{linalg::solvers::Solve, prelude::*};
use tracing::{debug, warn};

use crate::{
    elements::{Elements, Forces},
    node::NodeFreedomMap,
    state::{calc_positions, damp_velocities, norm_inf},
};

pub struct StepParameters {
    pub h: f64, // time step
    /// Velocity damping factor applied every step
    pub damping: f64,
    /// Fraction of the explicit step used as the Newton initial guess
    pub guess_fraction: f64,
    pub max_iter: usize,
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// Perturbation for the finite-difference Jacobian
    pub fd_step: f64,
}

impl StepParameters {
    pub fn new(h: f64, damping: f64, atol: f64, rtol: f64, max_iter: usize) -> Self {
        Self {
            h,
            damping,
            guess_fraction: 0.2,
            max_iter,
            abs_tol: atol,
            rel_tol: rtol,
            fd_step: 1e-7,
        }
    }
}

#[derive(Debug)]
pub struct StepResults {
    pub err: f64,
    pub iter: usize,
    pub converged: bool,
}

pub struct Solver {
    pub p: StepParameters,
    pub nfm: NodeFreedomMap,
    pub elements: Elements,
    pub n_system: usize,
    x0: Mat<f64>,       // [2][n_vertices] Initial positions
    x: Mat<f64>,        // [2][n_vertices] Positions of the last evaluation
    pub forces: Forces, // Forces of the last evaluation
    g: Col<f64>,        // Residual
    jac: Mat<f64>,      // Residual Jacobian
}

impl Solver {
    pub fn new(
        step_parameters: StepParameters,
        nfm: NodeFreedomMap,
        elements: Elements,
        x0: Mat<f64>,
    ) -> Self {
        let n_system = nfm.n_dofs();
        let n_vertices = x0.ncols();
        Solver {
            p: step_parameters,
            nfm,
            elements,
            n_system,
            x: x0.clone(),
            x0,
            forces: Forces::zeros(n_vertices),
            g: Col::zeros(n_system),
            jac: Mat::zeros(n_system, n_system),
        }
    }

    /// Positions of the last evaluation `[2][n_vertices]`
    pub fn positions(&self) -> MatRef<'_, f64> {
        self.x.as_ref()
    }

    fn update_forces(&mut self, u: ColRef<f64>, hw: f64) {
        calc_positions(self.x.as_mut(), self.x0.as_ref(), u, &self.nfm);
        self.elements
            .calculate(self.x.as_ref(), hw, &mut self.forces);
    }

    /// System function `[vx, vy, Rx, Ry]` per free vertex, undamped
    pub fn system_function(&mut self, u: ColRef<f64>, hw: f64, mut out: ColMut<f64>) {
        self.update_forces(u, hw);
        let total = self.forces.total.as_ref();
        self.nfm
            .free_vertices
            .iter()
            .enumerate()
            .for_each(|(k, &v)| {
                let i = 4 * k;
                out[i] = u[i + 2];
                out[i + 1] = u[i + 3];
                out[i + 2] = total[(0, v)];
                out[i + 3] = total[(1, v)];
            });
    }

    /// Backward-Euler residual `u - u_prev - h * damp(F(u))`
    pub fn residual(&mut self, u: ColRef<f64>, u_prev: ColRef<f64>, hw: f64, mut g: ColMut<f64>) {
        self.system_function(u, hw, g.rb_mut());
        damp_velocities(g.rb_mut(), self.p.damping);
        let h = self.p.h;
        zip!(g.rb_mut(), u, u_prev).for_each(|unzip!(g, u, u_prev)| *g = *u - *u_prev - h * *g);
    }

    /// Closed-form derivative of the residual w.r.t. `u`
    pub fn analytic_jacobian(&mut self, u: ColRef<f64>, hw: f64, mut jac: MatMut<f64>) {
        self.update_forces(u, hw);

        // Force Jacobian
        jac.fill(0.);
        (0..self.nfm.n_free()).for_each(|k| {
            jac[(4 * k, 4 * k + 2)] = 1.;
            jac[(4 * k + 1, 4 * k + 3)] = 1.;
        });
        self.elements
            .assemble_jacobian(&self.nfm, self.p.damping, jac.rb_mut());

        // I - h * J_F
        let h = self.p.h;
        zip!(jac.rb_mut()).for_each(|unzip!(j)| *j *= -h);
        (0..self.n_system).for_each(|i| jac[(i, i)] += 1.);
    }

    /// Central-difference derivative of the residual w.r.t. `u`
    pub fn finite_difference_jacobian(
        &mut self,
        u: ColRef<f64>,
        u_prev: ColRef<f64>,
        hw: f64,
        mut jac: MatMut<f64>,
    ) {
        let delta = self.p.fd_step;
        let mut up = u.to_owned();
        let mut gp = Col::<f64>::zeros(self.n_system);
        let mut gm = Col::<f64>::zeros(self.n_system);
        (0..self.n_system).for_each(|j| {
            up[j] = u[j] + delta;
            self.residual(up.as_ref(), u_prev, hw, gp.as_mut());
            up[j] = u[j] - delta;
            self.residual(up.as_ref(), u_prev, hw, gm.as_mut());
            up[j] = u[j];
            zip!(jac.rb_mut().col_mut(j), &gp, &gm)
                .for_each(|unzip!(d, gp, gm)| *d = (*gp - *gm) / (2. * delta));
        });
    }

    /// Newton solve of the backward-Euler residual.
    ///
    /// `u` holds the initial guess on entry. If the iteration fails to
    /// converge, `u` is restored to the guess.
    pub fn solve(&mut self, u: &mut Col<f64>, u_prev: ColRef<f64>, hw: f64) -> StepResults {
        let guess = u.clone();
        let mut g = std::mem::replace(&mut self.g, Col::zeros(0));
        let mut jac = std::mem::replace(&mut self.jac, Mat::zeros(0, 0));

        let mut res = StepResults {
            err: f64::INFINITY,
            iter: 0,
            converged: false,
        };

        while res.iter < self.p.max_iter {
            self.residual(u.as_ref(), u_prev, hw, g.as_mut());
            res.err = norm_inf(g.as_ref());
            if !res.err.is_finite() {
                break;
            }
            if res.err <= self.p.abs_tol {
                res.converged = true;
                break;
            }

            self.analytic_jacobian(u.as_ref(), hw, jac.as_mut());

            // Solve J * dx = -G
            let lu = jac.partial_piv_lu();
            zip!(&mut g).for_each(|unzip!(g)| *g = -*g);
            lu.solve_in_place(g.as_mut());
            zip!(&mut *u, &g).for_each(|unzip!(u, g)| *u += *g);
            res.iter += 1;

            let step = norm_inf(g.as_ref());
            if !step.is_finite() {
                break;
            }
            if step <= self.p.rel_tol * norm_inf(u.as_ref()).max(1.) {
                res.converged = true;
                break;
            }
        }

        self.g = g;
        self.jac = jac;

        if res.converged {
            debug!("newton converged in {} iterations (err={:e})", res.iter, res.err);
        } else {
            warn!(
                "newton failed to converge after {} iterations (err={:e}), keeping initial guess",
                res.iter, res.err
            );
            u.copy_from(&guess);
        }
        res
    }
}
