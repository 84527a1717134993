pub mod config;
pub mod elements;
pub mod error;
pub mod model;
pub mod node;
pub mod output_writer;
pub mod scenario;
pub mod simulation;
pub mod solver;
pub mod state;
pub mod topology;
pub mod util;
pub mod waterline;
