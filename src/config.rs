use serde::Deserialize;

use crate::error::ScenarioError;

/// Physical constants of the force model.
///
/// One value is built per run and shared by the force terms and the solver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Water density (kg/m^3)
    pub rho: f64,
    /// Gravitational acceleration (m/s^2)
    pub g: f64,
    /// Out-of-plane width of the structure (m)
    pub width: f64,
    /// Mass per meter of edge (kg/m)
    pub linear_density: f64,
    /// Spring and rope stiffness (N/m)
    pub kappa: f64,
    /// Ground penalty stiffness (N/m)
    pub kappa_ground: f64,
    /// Height below which a vertex is in contact with the ground (m)
    pub epsilon_ground: f64,
    /// Reject wet runs that re-enter the water behind the last exit point
    pub entry_position_guard: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            rho: 1000.,
            g: 9.81,
            width: 1.,
            linear_density: 1.,
            kappa: 1e6,
            kappa_ground: 1e5,
            epsilon_ground: 1e-2,
            entry_position_guard: true,
        }
    }
}

impl PhysicsConfig {
    /// Pressure coefficient `rho * g * W`
    #[inline]
    pub fn kw(&self) -> f64 {
        self.rho * self.g * self.width
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_file(file_path: &str) -> Result<Self, ScenarioError> {
        let yaml_file = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&yaml_file)
    }
}
