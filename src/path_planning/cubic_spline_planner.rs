// Cubic spline planner
//
// Natural cubic spline per axis against chord length, adapted from the
// PythonRobotics / CppRobotics cubic spline planner.
//
// Author: Atsushi Sakai(@Atsushi_twi)
//         TAI Lei
//         Ryohei Sasaki(@rsasaki0109)

use nalgebra::{DMatrix, DVector};

use crate::common::{cumulative_distances, MotionError, MotionResult, Point3D};

/// Minimum spacing between consecutive spline knots
pub const KNOT_EPSILON: f64 = 1e-5;

/// 1D natural cubic spline `y(x)`
#[derive(Debug, Clone)]
pub struct Spline {
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
    d: Vec<f64>,
    x: Vec<f64>,
}

impl Spline {
    /// Fit through `(x[i], y[i])`; `x` must be strictly increasing
    pub fn new(x: &[f64], y: &[f64]) -> MotionResult<Spline> {
        let nx = x.len();
        if nx < 2 || nx != y.len() {
            return Err(MotionError::InvalidParameter(format!(
                "spline needs at least 2 matching knots, got {} x and {} y",
                nx,
                y.len()
            )));
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        if h.iter().any(|&hi| !(hi > 0.0) || !hi.is_finite()) {
            return Err(MotionError::NumericalError("spline knots are not strictly increasing".to_string()));
        }

        let a = y.to_vec();
        let a_mat = Spline::calc_a(&h);
        let b_mat = Spline::calc_b(&h, &a);

        let c_na = a_mat
            .lu()
            .solve(&b_mat)
            .ok_or_else(|| MotionError::NumericalError("singular spline system".to_string()))?;
        let c: Vec<f64> = c_na.iter().copied().collect();
        if c.iter().any(|v| !v.is_finite()) {
            return Err(MotionError::NumericalError("non-finite spline coefficients".to_string()));
        }

        let mut b = Vec::with_capacity(nx - 1);
        let mut d = Vec::with_capacity(nx - 1);
        for i in 0..nx - 1 {
            d.push((c[i + 1] - c[i]) / (3.0 * h[i]));
            b.push((a[i + 1] - a[i]) / h[i] - h[i] * (c[i + 1] + 2.0 * c[i]) / 3.0);
        }

        Ok(Spline { a, b, c, d, x: x.to_vec() })
    }

    pub fn calc(&self, t: f64) -> f64 {
        let i = self.search_index(t);
        let dx = t - self.x[i];
        self.a[i] + self.b[i] * dx + self.c[i] * dx.powi(2) + self.d[i] * dx.powi(3)
    }

    /// Interval index `i` with `x[i] <= t`, clamped to the valid range
    fn search_index(&self, t: f64) -> usize {
        let last_interval = self.x.len() - 2;
        self.x.partition_point(|&xi| xi <= t).saturating_sub(1).min(last_interval)
    }

    // Natural boundary: c[0] = c[n-1] = 0
    fn calc_a(h: &[f64]) -> DMatrix<f64> {
        let nx = h.len() + 1;
        let mut a = DMatrix::zeros(nx, nx);
        a[(0, 0)] = 1.0;
        for i in 0..nx - 1 {
            if i != nx - 2 {
                a[(i + 1, i + 1)] = 2.0 * (h[i] + h[i + 1]);
            }
            a[(i + 1, i)] = h[i];
            a[(i, i + 1)] = h[i];
        }
        a[(0, 1)] = 0.0;
        a[(nx - 1, nx - 2)] = 0.0;
        a[(nx - 1, nx - 1)] = 1.0;
        a
    }

    fn calc_b(h: &[f64], a: &[f64]) -> DVector<f64> {
        let nx = h.len() + 1;
        let mut b = DVector::zeros(nx);
        for i in 0..nx - 2 {
            b[i + 1] = 3.0 * (a[i + 2] - a[i + 1]) / h[i + 1] - 3.0 * (a[i + 1] - a[i]) / h[i];
        }
        b
    }
}

/// Chord-length parameterized spline through 3D points
#[derive(Debug, Clone)]
pub struct Spline3D {
    pub s: Vec<f64>,
    sx: Spline,
    sy: Spline,
    sz: Spline,
}

impl Spline3D {
    pub fn new(points: &[Point3D]) -> MotionResult<Spline3D> {
        let s = Spline3D::calc_s(points);
        let xs: Vec<f64> = points.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        let zs: Vec<f64> = points.iter().map(|p| p.z).collect();

        Ok(Spline3D {
            sx: Spline::new(&s, &xs)?,
            sy: Spline::new(&s, &ys)?,
            sz: Spline::new(&s, &zs)?,
            s,
        })
    }

    /// Cumulative 3D distance, nudged by `i * KNOT_EPSILON` when any two
    /// knots are closer than `KNOT_EPSILON`
    fn calc_s(points: &[Point3D]) -> Vec<f64> {
        let mut s = cumulative_distances(points);
        if s.windows(2).any(|w| w[1] - w[0] < KNOT_EPSILON) {
            for (i, si) in s.iter_mut().enumerate() {
                *si += i as f64 * KNOT_EPSILON;
            }
        }
        s
    }

    pub fn total_length(&self) -> f64 {
        self.s.last().copied().unwrap_or(0.0)
    }

    pub fn calc_position(&self, is: f64) -> Point3D {
        Point3D::new(self.sx.calc(is), self.sy.calc(is), self.sz.calc(is))
    }
}
