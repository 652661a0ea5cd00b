use serde::{Deserialize, Serialize};

use crate::math::MatrixHelper;
use crate::prelude::{Point, ScanError, ScanResult};

/// Affine transform from camera pixel space into the scanner's pixel frame,
/// solved from three corresponding vertices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineRegistration {
    /// Row-major 2x3 matrix `[[a, b, tx], [c, d, ty]]`.
    pub matrix: [[f64; 3]; 2],
}

impl AffineRegistration {
    pub fn identity() -> Self {
        Self {
            matrix: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }

    pub fn from_vertices(camera: &[Point], scanner: &[Point]) -> ScanResult<Self> {
        if camera.len() != 3 || scanner.len() != 3 {
            return Err(ScanError::InvalidInput(format!(
                "registration needs exactly 3 vertex pairs (camera {}, scanner {})",
                camera.len(),
                scanner.len()
            )));
        }

        let system = [
            [camera[0].x, camera[0].y, 1.0],
            [camera[1].x, camera[1].y, 1.0],
            [camera[2].x, camera[2].y, 1.0],
        ];
        let singular = || ScanError::InvalidInput("registration vertices are collinear".into());
        let row_x = MatrixHelper::solve3(system, [scanner[0].x, scanner[1].x, scanner[2].x])
            .ok_or_else(singular)?;
        let row_y = MatrixHelper::solve3(system, [scanner[0].y, scanner[1].y, scanner[2].y])
            .ok_or_else(singular)?;

        let registration = Self {
            matrix: [row_x, row_y],
        };
        let exact = camera
            .iter()
            .zip(scanner)
            .all(|(c, s)| registration.apply(*c).distance(s) < 1e-8);
        if !exact {
            log::warn!("affine registration does not reproduce the scanner vertices exactly");
        }
        Ok(registration)
    }

    pub fn apply(&self, point: Point) -> Point {
        let [a, b, tx] = self.matrix[0];
        let [c, d, ty] = self.matrix[1];
        Point::new(a * point.x + b * point.y + tx, c * point.x + d * point.y + ty)
    }

    pub fn transform(&self, contour: &[Point]) -> Vec<Point> {
        contour.iter().map(|p| self.apply(*p)).collect()
    }
}

impl Default for AffineRegistration {
    fn default() -> Self {
        Self::identity()
    }
}
