//! Data-Oriented Vector Kernel
//!
//! Pure functions over `f32` slices. Output slices are written, never resized;
//! every routine works over the shortest of its operands.

/// Copy `src` into `dst`
/// Pure function - element-wise copy
pub fn copy(dst: &mut [f32], src: &[f32]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d = *s;
    }
}

/// Dot product of two vectors
/// Pure function - reduces two vectors to a scalar
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Element-wise product `out = a * b`
pub fn mul(out: &mut [f32], a: &[f32], b: &[f32]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x * y;
    }
}

/// Element-wise sum `out = a + b`
pub fn add(out: &mut [f32], a: &[f32], b: &[f32]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x + y;
    }
}

/// Scaled accumulate `out = x + y * s`
/// Pure function - the explicit Euler step is exactly this
pub fn add_scaled(out: &mut [f32], x: &[f32], y: &[f32], s: f32) {
    for ((o, a), b) in out.iter_mut().zip(x).zip(y) {
        *o = a + b * s;
    }
}

/// Linear combination `out = x * sx + y * sy`
pub fn lin_comb(out: &mut [f32], x: &[f32], sx: f32, y: &[f32], sy: f32) {
    for ((o, a), b) in out.iter_mut().zip(x).zip(y) {
        *o = a * sx + b * sy;
    }
}

/// Row-major matrix-vector product `out = m * v`
///
/// `m` holds `out.len()` rows of `v.len()` columns.
pub fn mat_vec(out: &mut [f32], m: &[f32], v: &[f32]) {
    let columns = v.len();
    if columns == 0 {
        out.iter_mut().for_each(|o| *o = 0.0);
        return;
    }
    for (o, row) in out.iter_mut().zip(m.chunks(columns)) {
        *o = dot(row, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dot_and_copy() {
        let a = [1.0, 2.0, 3.0];
        let mut b = [0.0; 3];
        copy(&mut b, &a);
        assert_eq!(b, a);
        assert_relative_eq!(dot(&a, &b), 14.0);
    }

    #[test]
    fn test_add_scaled_is_euler_step() {
        let x = [1.0, -1.0];
        let dxdt = [2.0, 4.0];
        let mut out = [0.0; 2];
        add_scaled(&mut out, &x, &dxdt, 0.5);
        assert_eq!(out, [2.0, 1.0]);
    }

    #[test]
    fn test_elementwise_ops() {
        let mut out = [0.0; 3];
        mul(&mut out, &[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_eq!(out, [4.0, 10.0, 18.0]);
        add(&mut out, &[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert_eq!(out, [5.0, 7.0, 9.0]);
        lin_comb(&mut out, &[1.0, 2.0, 3.0], 2.0, &[1.0, 1.0, 1.0], -1.0);
        assert_eq!(out, [1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_mat_vec() {
        // [[1 2 3], [4 5 6]] * [1 0 -1]
        let m = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let mut out = [0.0; 2];
        mat_vec(&mut out, &m, &[1.0, 0.0, -1.0]);
        assert_eq!(out, [-2.0, -2.0]);
    }
}
