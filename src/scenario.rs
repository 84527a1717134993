use std::time::Duration;

use serde::Deserialize;

use crate::{
    elements::springs::EdgeKind,
    error::ScenarioError,
    node::Mobility,
    simulation::{Method, SimulationParameters},
};

/// Structure and initial water height
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub water_level: f64,
    #[serde(alias = "verteces")]
    pub vertices: Vec<[f64; 2]>,
    /// 0 = free, 1 = fixed
    pub vertex_types: Vec<u8>,
    pub vertex_boyant_radiai: Vec<f64>,
    pub edges: Vec<[usize; 2]>,
    /// 0 = spring, 2 = rope
    pub edge_types: Vec<u8>,
    pub edge_lengths: Vec<f64>,
    #[serde(default)]
    pub edge_splits: Vec<usize>,
}

fn check_len(field: &'static str, found: usize, expected: usize) -> Result<(), ScenarioError> {
    if found == expected {
        Ok(())
    } else {
        Err(ScenarioError::LengthMismatch {
            field,
            expected,
            found,
        })
    }
}

fn check_finite<'a>(
    field: &'static str,
    values: impl IntoIterator<Item = &'a f64>,
) -> Result<(), ScenarioError> {
    if values.into_iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ScenarioError::NonFinite { field })
    }
}

impl Scenario {
    /// Parses a YAML or JSON document
    pub fn from_yaml_str(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_file(file_path: &str) -> Result<Self, ScenarioError> {
        let yaml_file = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&yaml_file)
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Checks array shapes, codes, ranges and finiteness
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let n_vertices = self.n_vertices();
        let n_edges = self.n_edges();

        check_len("vertexTypes", self.vertex_types.len(), n_vertices)?;
        check_len("vertexBoyantRadiai", self.vertex_boyant_radiai.len(), n_vertices)?;
        check_len("edgeTypes", self.edge_types.len(), n_edges)?;
        check_len("edgeLengths", self.edge_lengths.len(), n_edges)?;
        if !self.edge_splits.is_empty() {
            check_len("edgeSplits", self.edge_splits.len(), n_edges)?;
        }

        check_finite("waterLevel", [&self.water_level])?;
        check_finite("vertices", self.vertices.iter().flatten())?;
        check_finite("vertexBoyantRadiai", &self.vertex_boyant_radiai)?;
        check_finite("edgeLengths", &self.edge_lengths)?;

        for (vertex, &code) in self.vertex_types.iter().enumerate() {
            if Mobility::from_code(code).is_none() {
                return Err(ScenarioError::UnknownVertexType { vertex, code });
            }
        }
        for (vertex, &radius) in self.vertex_boyant_radiai.iter().enumerate() {
            if radius < 0. {
                return Err(ScenarioError::NegativeRadius { vertex, radius });
            }
        }
        for (edge, ids) in self.edges.iter().enumerate() {
            if let Some(&vertex) = ids.iter().find(|&&v| v >= n_vertices) {
                return Err(ScenarioError::VertexOutOfRange {
                    edge,
                    vertex,
                    n_vertices,
                });
            }
            if ids[0] == ids[1] {
                return Err(ScenarioError::SelfLoop {
                    edge,
                    vertex: ids[0],
                });
            }
        }
        for (edge, &code) in self.edge_types.iter().enumerate() {
            if EdgeKind::from_code(code).is_none() {
                return Err(ScenarioError::UnknownEdgeType { edge, code });
            }
        }
        for (edge, &length) in self.edge_lengths.iter().enumerate() {
            if length < 0. {
                return Err(ScenarioError::NegativeLength { edge, length });
            }
        }
        Ok(())
    }
}

/// Run settings sent alongside a scenario
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationRequest {
    pub water_level_raise_rate: f64,
    pub time_step: f64,
    pub max_iterations: usize,
    pub simulation_method: String,
    /// Seconds between emitted batches
    pub batch_duration: f64,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            water_level_raise_rate: 0.,
            time_step: 0.01,
            max_iterations: 1000,
            simulation_method: Method::BackwardEuler.to_string(),
            batch_duration: 1.,
        }
    }
}

impl SimulationRequest {
    pub fn to_parameters(&self) -> Result<SimulationParameters, ScenarioError> {
        check_finite("waterLevelRaiseRate", [&self.water_level_raise_rate])?;
        if !(self.time_step.is_finite() && self.time_step > 0.) {
            return Err(ScenarioError::NonFinite { field: "timeStep" });
        }
        let batch_duration = Duration::try_from_secs_f64(self.batch_duration)
            .map_err(|_| ScenarioError::NonFinite {
                field: "batchDuration",
            })?;
        Ok(SimulationParameters {
            water_speed: self.water_level_raise_rate,
            time_step: self.time_step,
            max_iterations: self.max_iterations,
            method: self.simulation_method.parse()?,
            batch_duration,
            ..Default::default()
        })
    }
}

/// A scenario and its run settings in a single document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioInput {
    #[serde(flatten)]
    pub scenario: Scenario,
    #[serde(flatten)]
    pub request: SimulationRequest,
}

impl ScenarioInput {
    pub fn from_yaml_str(s: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_file(file_path: &str) -> Result<Self, ScenarioError> {
        let yaml_file = std::fs::read_to_string(file_path)?;
        Self::from_yaml_str(&yaml_file)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    const WATERGATE: &str = r#"{
        "waterLevel": 0.8,
        "verteces": [[0, 0], [-1, 0], [-2, 0], [-1.3, 0.5], [-0.6, 1.0]],
        "vertexTypes": [1, 1, 1, 0, 0],
        "vertexBoyantRadiai": [0, 0, 0, 0, 0],
        "edges": [[0, 1], [1, 2], [2, 3], [3, 4], [1, 3]],
        "edgeTypes": [0, 0, 0, 0, 2],
        "edgeLengths": [1, 1, 0.86, 0.86, 0.8],
        "timeStep": 0.005,
        "simulationMethod": "Forward Euler"
    }"#;

    #[test]
    fn test_parse_json_with_request() {
        let input = ScenarioInput::from_yaml_str(WATERGATE).unwrap();
        assert_eq!(input.scenario.n_vertices(), 5);
        assert_eq!(input.scenario.vertices[3], [-1.3, 0.5]);
        assert!(input.scenario.edge_splits.is_empty());
        input.scenario.validate().unwrap();

        let params = input.request.to_parameters().unwrap();
        assert_eq!(params.time_step, 0.005);
        assert_eq!(params.max_iterations, 1000);
        assert_eq!(params.method, Method::ForwardEuler);
        assert_eq!(params.batch_duration, Duration::from_secs(1));
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = "
waterLevel: 2.0
vertices: [[0, 0], [1, 1]]
vertexTypes: [1, 0]
vertexBoyantRadiai: [0, 0.5]
edges: [[0, 1]]
edgeTypes: [2]
edgeLengths: [1.5]
edgeSplits: [3]
";
        let scenario = Scenario::from_yaml_str(yaml).unwrap();
        scenario.validate().unwrap();
        assert_eq!(scenario.edge_splits, vec![3]);
    }

    fn watergate() -> Scenario {
        ScenarioInput::from_yaml_str(WATERGATE).unwrap().scenario
    }

    #[test]
    fn test_validation_errors() {
        let mut s = watergate();
        s.vertex_types.pop();
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::LengthMismatch {
                field: "vertexTypes",
                expected: 5,
                found: 4
            })
        ));

        let mut s = watergate();
        s.edges[2] = [2, 7];
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::VertexOutOfRange { edge: 2, vertex: 7, .. })
        ));

        let mut s = watergate();
        s.edge_types[0] = 1;
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::UnknownEdgeType { edge: 0, code: 1 })
        ));

        let mut s = watergate();
        s.vertex_types[4] = 3;
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::UnknownVertexType { vertex: 4, code: 3 })
        ));

        let mut s = watergate();
        s.vertex_boyant_radiai[1] = -0.1;
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::NegativeRadius { vertex: 1, .. })
        ));

        let mut s = watergate();
        s.edges[0] = [1, 1];
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::SelfLoop { edge: 0, vertex: 1 })
        ));

        let mut s = watergate();
        s.vertices[0][1] = f64::NAN;
        assert!(matches!(
            s.validate(),
            Err(ScenarioError::NonFinite { field: "vertices" })
        ));
    }

    #[test]
    fn test_request_errors() {
        let mut r = SimulationRequest::default();
        r.simulation_method = "Midpoint".to_string();
        assert!(matches!(
            r.to_parameters(),
            Err(ScenarioError::UnknownMethod(_))
        ));

        let mut r = SimulationRequest::default();
        r.batch_duration = -1.;
        assert!(r.to_parameters().is_err());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            Scenario::from_yaml_str("waterLevel: [1]"),
            Err(ScenarioError::Parse(_))
        ));
    }
}
