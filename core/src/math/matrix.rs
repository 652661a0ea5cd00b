use ndarray::{arr2, Array2, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    pub fn rotation(angle: f64) -> Array2<f64> {
        let (sin, cos) = angle.sin_cos();
        arr2(&[[cos, -sin], [sin, cos]])
    }

    pub fn rotate_about(signals: ArrayView2<f64>, center: [f64; 2], angle_deg: f64) -> Array2<f64> {
        let mut shifted = signals.to_owned();
        for (mut row, offset) in shifted.rows_mut().into_iter().zip(center) {
            row -= offset;
        }
        let mut rotated = Self::rotation(angle_deg.to_radians()).dot(&shifted);
        for (mut row, offset) in rotated.rows_mut().into_iter().zip(center) {
            row += offset;
        }
        rotated
    }

    /// Solve a 3x3 linear system by Cramer's rule. Returns `None` when singular.
    pub fn solve3(matrix: [[f64; 3]; 3], rhs: [f64; 3]) -> Option<[f64; 3]> {
        let det = Self::det3(&matrix);
        if det.abs() < 1e-12 {
            return None;
        }
        let mut solution = [0.0; 3];
        for (col, value) in solution.iter_mut().enumerate() {
            let mut replaced = matrix;
            for (row, entry) in replaced.iter_mut().enumerate() {
                entry[col] = rhs[row];
            }
            *value = Self::det3(&replaced) / det;
        }
        Some(solution)
    }

    fn det3(m: &[[f64; 3]; 3]) -> f64 {
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn quarter_turn_about_center() {
        let signals = arr2(&[[2.0], [1.0]]);
        let rotated = MatrixHelper::rotate_about(signals.view(), [1.0, 1.0], 90.0);
        assert_abs_diff_eq!(rotated[[0, 0]], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(rotated[[1, 0]], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn solve3_recovers_known_solution() {
        let matrix = [[2.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 1.0, 1.0]];
        let solution = MatrixHelper::solve3(matrix, [5.0, 2.0, 6.0]).unwrap();
        assert_abs_diff_eq!(solution[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(solution[1], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(solution[2], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn solve3_detects_singular_system() {
        let matrix = [[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [0.0, 1.0, 1.0]];
        assert!(MatrixHelper::solve3(matrix, [1.0, 2.0, 3.0]).is_none());
    }
}
