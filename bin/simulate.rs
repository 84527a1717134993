use std::{
    env,
    io::{self, BufWriter, Write},
    process,
};

use tracing::{error, info};
use watergate::{
    config::PhysicsConfig, model::Model, scenario::ScenarioInput,
};

fn run(scenario_path: &str, physics_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let input = ScenarioInput::from_file(scenario_path)?;
    let physics = match physics_path {
        Some(path) => PhysicsConfig::from_file(path)?,
        None => PhysicsConfig::default(),
    };
    let params = input.request.to_parameters()?;
    let mut model = Model::from_scenario(&input.scenario, physics)?;

    info!(
        "simulating {} vertices, {} edges with {} for {} steps",
        model.n_vertices(),
        model.edges.len(),
        params.method,
        params.max_iterations
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for batch in model.create_simulation(params) {
        serde_json::to_writer(&mut out, &batch)?;
        writeln!(out)?;
        out.flush()?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("usage: simulate <scenario-file> [physics-config.yaml]");
        process::exit(2);
    }

    if let Err(e) = run(&args[1], args.get(2).map(String::as_str)) {
        error!("{e}");
        process::exit(1);
    }
}
