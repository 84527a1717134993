use approx::assert_relative_eq;
use faer::prelude::*;
use watergate::model::Model;

/// Fixed ground vertices 0..3 and free vertices above them
fn watergate(
    positions: &[[f64; 2]],
    radii: &[f64],
    springs: &[[usize; 2]],
    ropes: &[([usize; 2], f64)],
) -> Model {
    let mut model = Model::new();
    model.set_water_level(0.8);
    model.set_time_step(0.01);
    positions.iter().zip(radii).enumerate().for_each(|(i, (p, &r))| {
        let builder = model.add_vertex().position(p[0], p[1]).buoyant_radius(r);
        if i < 3 {
            builder.fixed().build();
        } else {
            builder.build();
        }
    });

    // Edge order follows the scenario: walk springs, ropes, then the remaining springs
    springs[..4].iter().for_each(|e| {
        model.add_spring_element(e[0], e[1], None);
    });
    ropes.iter().for_each(|&(e, l0)| {
        model.add_rope_element(e[0], e[1], l0);
    });
    springs[4..].iter().for_each(|e| {
        model.add_spring_element(e[0], e[1], None);
    });
    model
}

const BASE: [[f64; 2]; 5] = [[0., 0.], [-1., 0.], [-2., 0.], [-1.3, 0.5], [-0.6, 1.0]];

const SMALL_PERTURBATION: [f64; 20] = [
    0.0181108641, 0.0319165332, 0.0624289746, 0.0783594813, 0.0940039611, 0.0711717461,
    0.0691116627, 0.0685818088, 0.092633199, 0.0120143, 0.054602247, 0.032370617, 0.051127654,
    0.018950587, 0.042475961, 0.087075558, 0.091899879, 0.056347778, 0.042607064, 0.043844895,
];

const LARGE_PERTURBATION: [f64; 8] = [
    1.81108641, 3.19165332, 6.24289746, 7.83594813, 9.40039611, 7.11717461, 6.91116627,
    6.85818088,
];

fn compare_jacobians(model: &Model, perturbation: &[f64]) {
    let mut solver = model.create_solver();
    let state = model.create_state();
    let hw = model.water_level();
    let n = solver.n_system;
    assert_eq!(n, perturbation.len());

    let u = Col::from_fn(n, |i| state.u[i] + perturbation[i]);
    let u_prev = state.u.clone();

    let mut analytic = Mat::<f64>::zeros(n, n);
    let mut approximate = Mat::<f64>::zeros(n, n);
    solver.analytic_jacobian(u.as_ref(), hw, analytic.as_mut());
    solver.finite_difference_jacobian(u.as_ref(), u_prev.as_ref(), hw, approximate.as_mut());

    (0..n).for_each(|i| {
        (0..n).for_each(|j| {
            assert_relative_eq!(
                analytic[(i, j)],
                approximate[(i, j)],
                epsilon = 1e-2,
                max_relative = 1e-3
            );
        });
    });
}

#[test]
fn test_jacobian_two_ropes() {
    let model = watergate(
        &BASE,
        &[0.; 5],
        &[[0, 1], [1, 2], [2, 3], [3, 4]],
        &[([1, 3], 0.8), ([0, 4], 1.2)],
    );
    compare_jacobians(&model, &LARGE_PERTURBATION);
}

#[test]
fn test_jacobian_buoyancy() {
    let mut positions = BASE;
    positions[3] = [-1.3, 0.7];
    let model = watergate(
        &positions,
        &[0., 0., 0., 3., 5.],
        &[[0, 1], [1, 2], [2, 3], [3, 4]],
        &[([1, 3], 0.8), ([0, 4], 1.2)],
    );
    let perturbation = LARGE_PERTURBATION.map(|p| p / 10.);
    compare_jacobians(&model, &perturbation);
}

#[test]
fn test_jacobian_edges_returning_to_water() {
    let positions = [
        [0., 0.],
        [-1., 0.],
        [-2., 0.],
        [-1.3, 0.7],
        [-0.6, 1.0],
        [-0.3, 1.0],
        [0.0, 0.3],
        [0.5, 0.9],
    ];
    let model = watergate(
        &positions,
        &[0.; 8],
        &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 6], [6, 7]],
        &[([1, 3], 0.8), ([0, 4], 1.2)],
    );
    compare_jacobians(&model, &SMALL_PERTURBATION);
}

#[test]
fn test_jacobian_edges_underground() {
    let positions = [
        [0., 0.],
        [-1., 0.],
        [-2., 0.],
        [-1.3, -0.7],
        [-0.6, -1.0],
        [-0.3, 1.0],
        [0.0, 0.3],
        [0.5, 0.9],
    ];
    let model = watergate(
        &positions,
        &[0.; 8],
        &[[0, 1], [1, 2], [2, 3], [3, 4], [4, 5], [5, 6], [6, 7]],
        &[([1, 3], 0.8), ([0, 4], 1.2)],
    );
    compare_jacobians(&model, &SMALL_PERTURBATION);
}

#[test]
fn test_jacobian_submerged_horizontal_edge() {
    // Two free vertices joined by a horizontal edge well below the surface
    let mut model = Model::new();
    model.set_water_level(10.);
    model.set_time_step(0.01);
    model.add_vertex().position(0., 0.).fixed().build();
    model.add_vertex().position(0., 3.).build();
    model.add_vertex().position(-5., 3.).build();
    model.add_vertex().position(-5., 12.).build();
    model.add_spring_element(0, 1, None);
    model.add_spring_element(1, 2, None);
    model.add_spring_element(2, 3, None);
    compare_jacobians(&model, &SMALL_PERTURBATION[..12]);
}

#[test]
fn test_solve_without_free_vertices() {
    let mut model = Model::new();
    model.add_vertex().position(0., 0.).fixed().build();
    model.add_vertex().position(-1., 0.).fixed().build();
    model.add_spring_element(0, 1, None);
    let mut solver = model.create_solver();
    let mut u = Col::<f64>::zeros(0);
    let res = solver.solve(&mut u, Col::<f64>::zeros(0).as_ref(), 0.5);
    assert!(res.converged);
    assert_eq!(res.iter, 0);
}
