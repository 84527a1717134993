use faer::MatRef;

use crate::{elements::springs::Edge, util::column_xy};

/// x coordinate where the segment `p1 -> p2` crosses the height `hw`
#[inline]
fn crossing(p1: [f64; 2], p2: [f64; 2], hw: f64) -> f64 {
    p2[0] - (p2[1] - hw) * (p2[0] - p1[0]) / (p2[1] - p1[1])
}

/// Returns the wetted edges of the boundary walk, in walk order and orientation.
///
/// The walk starts under water. Edges are collected into a run until the walk
/// rises above `hw` (a float on the leading vertex counts as reaching the
/// surface), and the run is kept if it leaves the water no further left than
/// the previous run did. Once out of the water, the walk re-enters only at or
/// to the right of the last exit point. With `entry_position_guard` off, every
/// run and re-entry is accepted. A run that never leaves the water is dropped.
pub fn edges_touching_water(
    walk: &[Edge],
    x: MatRef<f64>,
    radii: &[f64],
    hw: f64,
    entry_position_guard: bool,
) -> Vec<[usize; 2]> {
    let mut wetted = vec![];
    let mut run = vec![];
    let mut in_water = true;
    let mut exit_position = f64::NEG_INFINITY;

    for edge in walk {
        let [trailing, leading] = edge.node_ids;
        let p1 = column_xy(x, trailing);
        let p2 = column_xy(x, leading);

        if in_water {
            if p1[1] < hw || p2[1] < hw {
                run.push(edge.node_ids);
            }

            if p1[1] < hw && hw <= p2[1] + radii[leading] {
                in_water = false;
                let exit = if hw > p2[1] {
                    p2[0]
                } else {
                    crossing(p1, p2, hw)
                };
                if !entry_position_guard || exit >= exit_position {
                    wetted.append(&mut run);
                }
                run.clear();
                exit_position = exit;
            }
        } else if p2[1] < hw {
            let entry = if hw > p1[1] {
                p2[0]
            } else {
                crossing(p1, p2, hw)
            };
            if !entry_position_guard || entry >= exit_position {
                run.push(edge.node_ids);
                in_water = true;
            }
        }
    }

    wetted
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
