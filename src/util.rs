use faer::MatRef;

/// Returns the (x, y) coordinates of column `i` of a `[2][n]` matrix
#[inline]
pub fn column_xy(m: MatRef<f64>, i: usize) -> [f64; 2] {
    [m[(0, i)], m[(1, i)]]
}

/// Euclidean distance between two points
#[inline]
pub fn distance_between(v1: [f64; 2], v2: [f64; 2]) -> f64 {
    let d = [v2[0] - v1[0], v2[1] - v1[1]];
    (d[0] * d[0] + d[1] * d[1]).sqrt()
}

/// True if both edges connect the same pair of vertices, in either direction
#[inline]
pub fn equal_edges(e1: [usize; 2], e2: [usize; 2]) -> bool {
    (e1[0] == e2[0] && e1[1] == e2[1]) || (e1[1] == e2[0] && e1[0] == e2[1])
}

//------------------------------------------------------------------------------
// Testing
//------------------------------------------------------------------------------
