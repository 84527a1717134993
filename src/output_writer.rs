use faer::MatRef;
use serde::Serialize;

use crate::{elements::Forces, util::column_xy};

/// Force terms acting on one vertex
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexForces {
    pub total: [f64; 2],
    pub water_pressure: [f64; 2],
    pub tension: [f64; 2],
    pub gravity: [f64; 2],
    pub buoyancy: [f64; 2],
}

/// Consecutive simulation steps emitted together
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Index of the first step in this batch
    pub first_step: usize,
    /// Positions of all vertices, per step
    pub vertex_positions: Vec<Vec<[f64; 2]>>,
    /// Forces on all vertices, per step
    pub forces: Vec<Vec<VertexForces>>,
    /// Water height, per step
    pub water_level: Vec<f64>,
    pub total_steps: usize,
}

impl Batch {
    pub fn n_steps(&self) -> usize {
        self.water_level.len()
    }
}

/// Buffers per-step results until the next batch is taken
pub struct OutputWriter {
    total_steps: usize,
    first_step: usize,
    vertex_positions: Vec<Vec<[f64; 2]>>,
    forces: Vec<Vec<VertexForces>>,
    water_level: Vec<f64>,
}

impl OutputWriter {
    pub fn new(total_steps: usize) -> Self {
        Self {
            total_steps,
            first_step: 0,
            vertex_positions: vec![],
            forces: vec![],
            water_level: vec![],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.water_level.is_empty()
    }

    /// Appends one step: positions `[2][n_vertices]`, forces and water height
    pub fn record(&mut self, step: usize, x: MatRef<f64>, forces: &Forces, hw: f64) {
        if self.is_empty() {
            self.first_step = step;
        }
        let n = x.ncols();
        self.vertex_positions
            .push((0..n).map(|i| column_xy(x, i)).collect());
        self.forces.push(
            (0..n)
                .map(|i| VertexForces {
                    total: column_xy(forces.total.as_ref(), i),
                    water_pressure: column_xy(forces.pressure.as_ref(), i),
                    tension: column_xy(forces.tension.as_ref(), i),
                    gravity: column_xy(forces.gravity.as_ref(), i),
                    buoyancy: column_xy(forces.buoyancy.as_ref(), i),
                })
                .collect(),
        );
        self.water_level.push(hw);
    }

    /// Returns the buffered steps and clears the buffer, `None` if nothing was recorded
    pub fn take_batch(&mut self) -> Option<Batch> {
        if self.is_empty() {
            return None;
        }
        Some(Batch {
            first_step: self.first_step,
            vertex_positions: std::mem::take(&mut self.vertex_positions),
            forces: std::mem::take(&mut self.forces),
            water_level: std::mem::take(&mut self.water_level),
            total_steps: self.total_steps,
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use faer::mat;

    #[test]
    fn test_batches_partition_steps() {
        let mut writer = OutputWriter::new(3);
        let x = mat![[1., 2.], [3., 4.]];
        let mut forces = Forces::zeros(2);
        forces.tension[(1, 1)] = 5.;

        assert!(writer.take_batch().is_none());
        writer.record(0, x.as_ref(), &forces, 0.5);
        writer.record(1, x.as_ref(), &forces, 0.6);
        let batch = writer.take_batch().unwrap();
        assert_eq!(batch.first_step, 0);
        assert_eq!(batch.n_steps(), 2);
        assert_eq!(batch.vertex_positions[1], vec![[1., 3.], [2., 4.]]);
        assert_eq!(batch.forces[0][1].tension, [0., 5.]);
        assert_eq!(batch.total_steps, 3);

        writer.record(2, x.as_ref(), &forces, 0.7);
        let batch = writer.take_batch().unwrap();
        assert_eq!(batch.first_step, 2);
        assert_eq!(batch.water_level, vec![0.7]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let mut writer = OutputWriter::new(1);
        writer.record(0, mat![[0.], [0.]].as_ref(), &Forces::zeros(1), 1.);
        let json = serde_json::to_string(&writer.take_batch().unwrap()).unwrap();
        assert!(json.contains("\"firstStep\":0"));
        assert!(json.contains("\"vertexPositions\""));
        assert!(json.contains("\"waterPressure\""));
        assert!(json.contains("\"totalSteps\":1"));
    }
}
