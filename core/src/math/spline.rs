//! Closed (periodic) interpolating cubic splines.
//!
//! A periodic cubic spline with knots at the data parameters is the
//! zero-smoothing periodic B-spline fit through the same data, so curves are
//! stored here in second-derivative form and solved with a cyclic tridiagonal
//! system.

use crate::prelude::{Point, ScanError, ScanResult};

#[derive(Debug, Clone)]
pub struct PeriodicSpline {
    knots: Vec<f64>,
    values: Vec<f64>,
    second: Vec<f64>,
}

impl PeriodicSpline {
    /// Fit through `values[i]` at `knots[i]`. `knots` has one more entry than
    /// `values`; the last knot closes the loop back onto `values[0]`.
    pub fn fit(knots: &[f64], values: &[f64]) -> ScanResult<Self> {
        let n = values.len();
        if n < 3 || knots.len() != n + 1 {
            return Err(ScanError::InvalidInput(format!(
                "periodic spline needs at least 3 values and one closing knot (got {} values, {} knots)",
                n,
                knots.len()
            )));
        }

        let widths: Vec<f64> = knots.windows(2).map(|w| w[1] - w[0]).collect();
        if widths.iter().any(|h| !(*h > 0.0)) {
            return Err(ScanError::InvalidInput(
                "spline knots must be strictly increasing".into(),
            ));
        }

        let value = |i: usize| values[i % n];
        let mut sub = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut sup = vec![0.0; n];
        let mut rhs = vec![0.0; n];
        for i in 0..n {
            let prev = widths[(i + n - 1) % n];
            let next = widths[i];
            sub[i] = prev;
            diag[i] = 2.0 * (prev + next);
            sup[i] = next;
            rhs[i] = 6.0
                * ((value(i + 1) - value(i)) / next - (value(i) - value(i + n - 1)) / prev);
        }

        let mut second = solve_cyclic(&sub, &diag, &sup, &rhs)?;
        second.push(second[0]);
        let mut closed = values.to_vec();
        closed.push(values[0]);

        Ok(Self {
            knots: knots.to_vec(),
            values: closed,
            second,
        })
    }

    pub fn period(&self) -> (f64, f64) {
        (self.knots[0], self.knots[self.knots.len() - 1])
    }

    pub fn evaluate(&self, t: f64) -> f64 {
        let (start, end) = self.period();
        let span = end - start;
        let mut t = start + (t - start).rem_euclid(span);
        // rounding in rem_euclid can land exactly on the period end
        if t >= end {
            t = end;
        }

        let upper = self.knots.partition_point(|k| *k <= t).clamp(1, self.knots.len() - 1);
        let i = upper - 1;
        let h = self.knots[upper] - self.knots[i];
        let a = (self.knots[upper] - t) / h;
        let b = (t - self.knots[i]) / h;
        a * self.values[i]
            + b * self.values[upper]
            + ((a * a * a - a) * self.second[i] + (b * b * b - b) * self.second[upper]) * h * h
                / 6.0
    }
}

/// Closed planar curve through a polygon, parameterized by normalized chord
/// length over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ClosedCurve {
    x: PeriodicSpline,
    y: PeriodicSpline,
}

impl ClosedCurve {
    pub fn through(points: &[Point]) -> ScanResult<Self> {
        let mut vertices = points.to_vec();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        let knots = chord_length_parameters(&vertices)?;
        let xs: Vec<f64> = vertices.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = vertices.iter().map(|p| p.y).collect();
        Ok(Self {
            x: PeriodicSpline::fit(&knots, &xs)?,
            y: PeriodicSpline::fit(&knots, &ys)?,
        })
    }

    pub fn at(&self, t: f64) -> Point {
        Point::new(self.x.evaluate(t), self.y.evaluate(t))
    }
}

fn chord_length_parameters(vertices: &[Point]) -> ScanResult<Vec<f64>> {
    let mut knots = Vec::with_capacity(vertices.len() + 1);
    knots.push(0.0);
    let mut total = 0.0;
    for (i, vertex) in vertices.iter().enumerate() {
        let next = &vertices[(i + 1) % vertices.len()];
        total += vertex.distance(next);
        knots.push(total);
    }
    if !(total > 0.0) {
        return Err(ScanError::InvalidInput(
            "closed curve has zero length".into(),
        ));
    }
    for knot in knots.iter_mut() {
        *knot /= total;
    }
    Ok(knots)
}

fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> ScanResult<Vec<f64>> {
    let n = diag.len();
    let mut c_prime = vec![0.0; n];
    let mut d_prime = vec![0.0; n];

    for i in 0..n {
        let lower = if i == 0 { 0.0 } else { sub[i] };
        let denom = diag[i] - if i == 0 { 0.0 } else { lower * c_prime[i - 1] };
        if denom.abs() < f64::EPSILON {
            return Err(ScanError::InvalidInput(
                "singular spline system (repeated handles?)".into(),
            ));
        }
        c_prime[i] = if i + 1 < n { sup[i] / denom } else { 0.0 };
        let carried = if i == 0 { 0.0 } else { lower * d_prime[i - 1] };
        d_prime[i] = (rhs[i] - carried) / denom;
    }

    let mut solution = vec![0.0; n];
    solution[n - 1] = d_prime[n - 1];
    for i in (0..n - 1).rev() {
        solution[i] = d_prime[i] - c_prime[i] * solution[i + 1];
    }
    Ok(solution)
}

/// Tridiagonal solve with the two wrap-around corners (`sub[0]` in the top
/// right, `sup[n-1]` in the bottom left), via Sherman-Morrison.
fn solve_cyclic(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> ScanResult<Vec<f64>> {
    let n = diag.len();
    let top_right = sub[0];
    let bottom_left = sup[n - 1];
    let gamma = -diag[0];

    let mut modified = diag.to_vec();
    modified[0] = diag[0] - gamma;
    modified[n - 1] = diag[n - 1] - bottom_left * top_right / gamma;

    let x = solve_tridiagonal(sub, &modified, sup, rhs)?;
    let mut u = vec![0.0; n];
    u[0] = gamma;
    u[n - 1] = bottom_left;
    let z = solve_tridiagonal(sub, &modified, sup, &u)?;

    let fact = (x[0] + top_right * x[n - 1] / gamma)
        / (1.0 + z[0] + top_right * z[n - 1] / gamma);
    Ok(x.iter().zip(&z).map(|(xi, zi)| xi - fact * zi).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn curve_interpolates_vertices_at_their_knots() {
        let curve = ClosedCurve::through(&square()).unwrap();
        for (i, vertex) in square().iter().enumerate() {
            let point = curve.at(i as f64 * 0.25);
            assert_abs_diff_eq!(point.x, vertex.x, epsilon = 1e-9);
            assert_abs_diff_eq!(point.y, vertex.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn curve_closes_on_itself() {
        let curve = ClosedCurve::through(&square()).unwrap();
        let start = curve.at(0.0);
        let end = curve.at(1.0);
        assert_abs_diff_eq!(start.x, end.x, epsilon = 1e-9);
        assert_abs_diff_eq!(start.y, end.y, epsilon = 1e-9);
    }

    #[test]
    fn spline_is_smooth_across_the_seam() {
        let knots = [0.0, 0.25, 0.5, 0.75, 1.0];
        let spline = PeriodicSpline::fit(&knots, &[0.0, 1.0, 0.0, -1.0]).unwrap();
        let eps = 1e-6;
        let left = (spline.evaluate(1.0) - spline.evaluate(1.0 - eps)) / eps;
        let right = (spline.evaluate(eps) - spline.evaluate(0.0)) / eps;
        assert_abs_diff_eq!(left, right, epsilon = 1e-3);
    }

    #[test]
    fn repeated_vertices_are_rejected() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(5.0, 5.0),
            Point::new(5.0, 0.0),
        ];
        assert!(ClosedCurve::through(&points).is_err());
    }
}
