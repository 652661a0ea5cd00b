use anyhow::Context;
use galvocore::contour::HandleSet;
use galvocore::prelude::Point;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for generating synthetic ROIs in scanner pixel space.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sides: usize,
    pub radius: f64,
    pub center: Point,
    /// Maximum radial jitter in pixels.
    pub jitter: f64,
    pub seed: u64,
    /// Samples in a synthetic camera contour.
    pub contour_points: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sides: 6,
            radius: 60.0,
            center: Point::new(250.0, 250.0),
            jitter: 0.5,
            seed: 0,
            contour_points: 200,
        }
    }
}

impl GeneratorConfig {
    fn normalized_sides(&self) -> usize {
        self.sides.max(3)
    }
}

fn ring(config: &GeneratorConfig, count: usize, radius: f64) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * 2.0 * PI;
            let jitter = if config.jitter > 0.0 {
                rng.gen_range(-config.jitter..config.jitter)
            } else {
                0.0
            };
            Point::new(
                config.center.x + (radius + jitter) * angle.cos(),
                config.center.y + (radius + jitter) * angle.sin(),
            )
        })
        .collect()
}

/// Regular polygon handles, as if drawn by the user.
pub fn polygon_handles(config: &GeneratorConfig) -> anyhow::Result<HandleSet> {
    HandleSet::new(ring(config, config.normalized_sides(), config.radius))
        .context("building synthetic polygon handles")
}

/// Dense closed outline, as if segmented from a camera image.
pub fn camera_contour(config: &GeneratorConfig) -> Vec<Point> {
    ring(config, config.contour_points.max(3), config.radius * 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_has_requested_sides() {
        let handles = polygon_handles(&GeneratorConfig {
            sides: 5,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(handles.len(), 5);
    }

    #[test]
    fn degenerate_sides_are_raised_to_triangle() {
        let handles = polygon_handles(&GeneratorConfig {
            sides: 1,
            jitter: 0.0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(handles.len(), 3);
        assert_eq!(handles.points()[0], Point::new(310.0, 250.0));
    }

    #[test]
    fn same_seed_gives_same_contour() {
        let config = GeneratorConfig {
            seed: 7,
            ..Default::default()
        };
        let first = camera_contour(&config);
        assert_eq!(first.len(), 200);
        assert_eq!(first, camera_contour(&config));
    }
}
