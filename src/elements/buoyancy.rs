use std::f64::consts::PI;

use faer::prelude::*;
use itertools::{izip, Itertools};

use crate::{config::PhysicsConfig, node::NodeFreedomMap};

use super::add_position_block;

/// Position of a float relative to the water surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immersion {
    /// Entirely above the surface
    Dry,
    /// Cut by the surface
    Partial,
    /// Entirely below the surface
    Submerged,
}

impl Immersion {
    pub fn of(y: f64, r: f64, hw: f64) -> Self {
        if y + r <= hw {
            Immersion::Submerged
        } else if y - r >= hw {
            Immersion::Dry
        } else {
            Immersion::Partial
        }
    }
}

/// Area of the circular segment of radius `r` above the water.
/// `h` is the height of the cap, `0 <= h <= 2r`.
pub fn dry_segment_area(r: f64, h: f64) -> f64 {
    let theta = 2. * ((r - h) / r).clamp(-1., 1.).acos();
    0.5 * r * r * (theta - theta.sin())
}

/// Submerged cross section of a float centered at height `y`
pub fn submerged_area(y: f64, r: f64, hw: f64) -> f64 {
    match Immersion::of(y, r, hw) {
        Immersion::Dry => 0.,
        Immersion::Submerged => PI * r * r,
        Immersion::Partial => PI * r * r - dry_segment_area(r, y + r - hw),
    }
}

/// Upward force on circular floats attached to vertices
pub struct Buoyancy {
    /// Float radius of each vertex
    pub radius: Vec<f64>,
    rho_g: f64,
    pub immersion: Vec<Immersion>,
    /// Vertical force `[n_vertices]`
    pub fb: Col<f64>,
    /// Derivative of the vertical force w.r.t. the vertex height `[n_vertices]`
    pub dfb: Col<f64>,
}

impl Buoyancy {
    pub fn new(radius: &[f64], physics: &PhysicsConfig) -> Self {
        let n = radius.len();
        Self {
            radius: radius.to_vec(),
            rho_g: physics.rho * physics.g,
            immersion: vec![Immersion::Dry; n],
            fb: Col::zeros(n),
            dfb: Col::zeros(n),
        }
    }

    pub fn calculate(&mut self, x: MatRef<f64>, hw: f64) {
        let rho_g = self.rho_g;
        izip!(
            self.radius.iter(),
            x.col_iter(),
            self.immersion.iter_mut(),
            self.fb.iter_mut(),
            self.dfb.iter_mut(),
        )
        .for_each(|(&r, x, immersion, fb, dfb)| {
            if r <= 0. {
                *immersion = Immersion::Dry;
                *fb = 0.;
                *dfb = 0.;
                return;
            }
            let y = x[1];
            *immersion = Immersion::of(y, r, hw);
            *fb = rho_g * submerged_area(y, r, hw);
            *dfb = match immersion {
                Immersion::Partial => {
                    let d = hw - y;
                    -2. * rho_g * (r * r - d * d).max(0.).sqrt()
                }
                _ => 0.,
            };
        });
    }

    pub fn assemble_forces(&self, mut out: MatMut<f64>) {
        self.fb
            .iter()
            .enumerate()
            .for_each(|(i, &fb)| out[(1, i)] += fb);
    }

    pub fn assemble_jacobian(&self, nfm: &NodeFreedomMap, scale: f64, mut jf: MatMut<f64>) {
        self.immersion
            .iter()
            .positions(|&im| im == Immersion::Partial)
            .for_each(|i| {
                let block = [[0., 0.], [0., self.dfb[i]]];
                add_position_block(jf.rb_mut(), nfm, i, i, &block, scale);
            });
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;
    use faer::mat;

    #[test]
    fn test_area_limits() {
        assert_eq!(submerged_area(5., 1., 3.), 0.);
        assert_relative_eq!(submerged_area(1., 1., 3.), PI);
        assert_relative_eq!(submerged_area(3., 1., 3.), PI / 2.);
    }

    #[test]
    fn test_area_is_continuous() {
        let (r, hw) = (0.5, 2.);
        let eps = 1e-9;
        assert_relative_eq!(
            submerged_area(hw - r - eps, r, hw),
            submerged_area(hw - r + eps, r, hw),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            submerged_area(hw + r - eps, r, hw),
            submerged_area(hw + r + eps, r, hw),
            epsilon = 1e-6
        );

        // Monotonically decreasing as the float rises
        let areas = (0..=20)
            .map(|i| submerged_area(hw - r + i as f64 * r / 10., r, hw))
            .collect_vec();
        areas.windows(2).for_each(|w| assert!(w[1] <= w[0]));
    }

    #[test]
    fn test_buoyancy_force() {
        let physics = PhysicsConfig::default();
        let mut b = Buoyancy::new(&[0., 2., 1.], &physics);
        b.calculate(mat![[0., 0., 0.], [0., -5., 10.]].as_ref(), 1.);
        let mut out = Mat::zeros(2, 3);
        b.assemble_forces(out.as_mut());
        assert_eq!(out[(1, 0)], 0.);
        assert_relative_eq!(out[(1, 1)], 1000. * 9.81 * PI * 4.);
        assert_eq!(out[(1, 2)], 0.);
        assert_eq!(b.immersion, vec![Immersion::Dry, Immersion::Submerged, Immersion::Dry]);
    }

    #[test]
    fn test_derivative_matches_difference() {
        let physics = PhysicsConfig::default();
        let (r, hw, y) = (1., 2., 2.3);
        let mut b = Buoyancy::new(&[r], &physics);
        b.calculate(mat![[0.], [y]].as_ref(), hw);
        let h = 1e-6;
        let fd = 1000. * 9.81 * (submerged_area(y + h, r, hw) - submerged_area(y - h, r, hw))
            / (2. * h);
        assert_relative_eq!(b.dfb[0], fd, max_relative = 1e-6);
    }
}
