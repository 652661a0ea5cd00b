use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::math::{MatrixHelper, StatsHelper};
use crate::prelude::{HardwareLimits, TracePair};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    pub sample_rate: u32,
    pub volt_x_min: f64,
    pub volt_x_max: f64,
    pub volt_y_min: f64,
    pub volt_y_max: f64,
    pub x_pixels: usize,
    pub y_pixels: usize,
    /// Frame rotation about its center, in degrees.
    pub angle_deg: f64,
    /// Sawtooth (fast fly-back) when true, triangle (bidirectional) otherwise.
    pub sawtooth: bool,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self::square(250_000, 3.0, 500)
    }
}

impl RasterConfig {
    /// Square frame spanning `[-half_range, half_range]` on both axes.
    pub fn square(sample_rate: u32, half_range: f64, pixels: usize) -> Self {
        Self {
            sample_rate,
            volt_x_min: -half_range,
            volt_x_max: half_range,
            volt_y_min: -half_range,
            volt_y_max: half_range,
            x_pixels: pixels,
            y_pixels: pixels,
            angle_deg: 0.0,
            sawtooth: true,
        }
    }

    fn center(&self) -> [f64; 2] {
        [
            (self.volt_x_max - self.volt_x_min) / 2.0 + self.volt_x_min,
            (self.volt_y_max - self.volt_y_min) / 2.0 + self.volt_y_min,
        ]
    }
}

#[derive(Debug, Clone)]
pub struct SinglePeriod {
    pub x: Vec<f64>,
    /// Samples per raster line: the full period for sawtooth, ramp plus first
    /// turnaround for triangle.
    pub line_size: usize,
    pub ramp_up_speed: f64,
    /// Volts per sample actually used on the ramp-down.
    pub ramp_down_speed: f64,
    /// Time steps spent in each turnaround.
    pub inertial_steps: usize,
}

#[derive(Debug, Clone)]
pub struct RasterFrame {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub line_size: usize,
}

impl RasterFrame {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Seconds needed to output the whole frame.
    pub fn frame_duration(&self, sample_rate: u32) -> f64 {
        self.x.len() as f64 / sample_rate as f64
    }

    pub fn into_traces(self) -> TracePair {
        TracePair {
            x: self.x,
            y: self.y,
        }
    }
}

/// Constant-acceleration segment continuing from `start` at `speed` volts per
/// sample. The `t = 0` sample belongs to the previous segment and is skipped.
fn inertial_segment(start: f64, speed: f64, accel: f64, steps: usize) -> impl Iterator<Item = f64> {
    (1..steps).map(move |t| {
        let t = t as f64;
        0.5 * accel * t * t + speed * t + start
    })
}

/// Builds one period of the x trace: ramp up, turnaround, ramp down,
/// turnaround. Both turnarounds run at the galvo's maximum acceleration so the
/// trace stays velocity-continuous across segments and across periods.
pub fn x_values_single_period(
    sample_rate: u32,
    volt_x_min: f64,
    volt_x_max: f64,
    x_pixels: usize,
    sawtooth: bool,
    limits: &HardwareLimits,
) -> SinglePeriod {
    debug_assert!(x_pixels > 0, "raster lines need at least one pixel");
    let rate = sample_rate as f64;
    let accel = limits.max_galvo_accel / (rate * rate);
    let ramp_up_speed = (volt_x_max - volt_x_min) / x_pixels as f64;
    let mut ramp_down_speed = if sawtooth {
        -limits.max_galvo_speed / rate
    } else {
        -ramp_up_speed
    };

    let mut x = StatsHelper::linspace(volt_x_min, volt_x_max, x_pixels);

    let inertial_steps = ((ramp_down_speed - ramp_up_speed) / -accel).floor().abs() as usize;
    let ramp_top = x.last().copied().unwrap_or(volt_x_max);
    x.extend(inertial_segment(ramp_top, ramp_up_speed, -accel, inertial_steps));

    let mut line_size = x.len();

    let start_voltage = x.last().copied().unwrap_or(ramp_top) + ramp_down_speed;
    let steps = inertial_steps as f64;
    let end_voltage = 0.5 * accel * steps * steps - ramp_up_speed * steps + volt_x_min;

    let ramp_down_len = if sawtooth {
        let len = ((end_voltage - start_voltage) / ramp_down_speed).ceil().abs() as usize;
        let len = len.max(1);
        ramp_down_speed = (end_voltage - start_voltage) / len as f64;
        len
    } else {
        x_pixels
    };
    x.extend(StatsHelper::linspace(start_voltage, end_voltage, ramp_down_len));

    let ramp_bottom = x.last().copied().unwrap_or(end_voltage);
    x.extend(inertial_segment(ramp_bottom, ramp_down_speed, accel, inertial_steps));

    if sawtooth {
        line_size = x.len();
    }

    SinglePeriod {
        x,
        line_size,
        ramp_up_speed,
        ramp_down_speed,
        inertial_steps,
    }
}

/// Full-frame y staircase. The first line is only `x_pixels` long so the
/// step happens at the start of the turnaround; the tail is padded so the
/// result has exactly `line_size * y_pixels` samples.
pub fn y_values_staircase(
    volt_y_min: f64,
    volt_y_max: f64,
    x_pixels: usize,
    y_pixels: usize,
    line_size: usize,
) -> Vec<f64> {
    let step = (volt_y_max - volt_y_min) / y_pixels as f64;
    let total = line_size * y_pixels;
    let mut y = Vec::with_capacity(total);
    y.extend(std::iter::repeat(volt_y_min).take(x_pixels));
    for line in 1..y_pixels {
        let level = line as f64 * step + volt_y_min;
        y.extend(std::iter::repeat(level).take(line_size));
    }
    let padding = total.saturating_sub(y.len());
    y.extend(std::iter::repeat(volt_y_min).take(padding));
    y
}

pub fn repeat_wave(wave: &[f64], repeats: usize) -> Vec<f64> {
    wave.repeat(repeats)
}

pub fn rotate_x_and_y(x: &[f64], y: &[f64], center: [f64; 2], angle_deg: f64) -> (Vec<f64>, Vec<f64>) {
    let len = x.len().min(y.len());
    let stacked = Array2::from_shape_fn((2, len), |(row, col)| if row == 0 { x[col] } else { y[col] });
    let rotated = MatrixHelper::rotate_about(stacked.view(), center, angle_deg);
    (rotated.row(0).to_vec(), rotated.row(1).to_vec())
}

/// Tiles the single period into a whole frame and applies the frame rotation.
pub fn raster_frame(config: &RasterConfig, limits: &HardwareLimits) -> RasterFrame {
    let period = x_values_single_period(
        config.sample_rate,
        config.volt_x_min,
        config.volt_x_max,
        config.x_pixels,
        config.sawtooth,
        limits,
    );
    let y = y_values_staircase(
        config.volt_y_min,
        config.volt_y_max,
        config.x_pixels,
        config.y_pixels,
        period.line_size,
    );

    let x = if config.sawtooth {
        repeat_wave(&period.x, config.y_pixels)
    } else {
        // each triangle period sweeps two lines
        let mut x = repeat_wave(&period.x, config.y_pixels.div_ceil(2));
        if config.y_pixels % 2 == 1 {
            x.truncate(x.len().saturating_sub(period.line_size));
        }
        x
    };
    debug_assert_eq!(x.len(), y.len());

    let (x, y) = if config.angle_deg == 0.0 {
        (x, y)
    } else {
        rotate_x_and_y(&x, &y, config.center(), config.angle_deg)
    };

    log::debug!(
        "raster frame {}x{} ({}) -> {} samples, line size {}",
        config.x_pixels,
        config.y_pixels,
        if config.sawtooth { "sawtooth" } else { "triangle" },
        x.len(),
        period.line_size
    );

    RasterFrame {
        x,
        y,
        line_size: period.line_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn limits() -> HardwareLimits {
        HardwareLimits::default()
    }

    #[test]
    fn ramp_up_is_exact_linspace() {
        for &(rate, pixels) in &[(100_000, 100), (250_000, 500), (1_000, 7)] {
            let period = x_values_single_period(rate, -2.0, 2.0, pixels, true, &limits());
            let expected = StatsHelper::linspace(-2.0, 2.0, pixels);
            assert_eq!(&period.x[..pixels], expected.as_slice());
        }
    }

    #[test]
    fn triangle_ramps_have_matching_slopes() {
        let period = x_values_single_period(100_000, -1.0, 1.0, 100, false, &limits());
        assert_eq!(period.x.len(), 2 * period.line_size);

        // linspace endpoints make the sampled slopes differ slightly from
        // the nominal speed
        let up = period.x[1] - period.x[0];
        let down_start = period.line_size;
        let down = period.x[down_start + 1] - period.x[down_start];
        assert!(down < 0.0);
        assert_abs_diff_eq!(down / up, -1.0, epsilon = 2e-3);
    }

    #[test]
    fn turnaround_runs_at_max_acceleration() {
        let rate = 250_000u32;
        let period = x_values_single_period(rate, -3.0, 3.0, 500, true, &limits());
        let accel = limits().max_galvo_accel / (rate as f64 * rate as f64);
        // 0.092 V/sample velocity change at 0.002464 V/sample^2
        assert_eq!(period.inertial_steps, 37);

        let start = 499;
        for i in start..start + period.inertial_steps - 2 {
            let second_diff = period.x[i + 2] - 2.0 * period.x[i + 1] + period.x[i];
            assert_abs_diff_eq!(second_diff, -accel, epsilon = 1e-9);
        }
        let exit_speed = period.x[500] - period.x[499];
        assert_abs_diff_eq!(exit_speed, period.ramp_up_speed - 0.5 * accel, epsilon = 1e-12);
    }

    #[test]
    fn sawtooth_returns_near_start() {
        let period = x_values_single_period(250_000, -3.0, 3.0, 500, true, &limits());
        let last = *period.x.last().unwrap();
        let tolerance = period.ramp_up_speed + period.ramp_down_speed.abs();
        assert!(period.ramp_down_speed < 0.0);
        assert!((last + period.ramp_up_speed + 3.0).abs() < tolerance);
        assert_eq!(period.line_size, period.x.len());
    }

    #[test]
    fn staircase_matches_frame_length() {
        let y = y_values_staircase(0.0, 4.0, 10, 4, 16);
        assert_eq!(y.len(), 64);
        assert!(y[..10].iter().all(|v| *v == 0.0));
        assert!(y[10..26].iter().all(|v| *v == 1.0));
        assert!(y[58..].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn sawtooth_frame_tiles_every_line() {
        let config = RasterConfig {
            y_pixels: 5,
            ..RasterConfig::square(250_000, 3.0, 500)
        };
        let frame = raster_frame(&config, &limits());
        assert_eq!(frame.len(), 5 * frame.line_size);
        assert_eq!(frame.y.len(), frame.x.len());
    }

    #[test]
    fn odd_triangle_frame_drops_last_return_sweep() {
        let config = RasterConfig {
            sawtooth: false,
            y_pixels: 3,
            ..RasterConfig::square(100_000, 1.0, 100)
        };
        let frame = raster_frame(&config, &limits());
        assert_eq!(frame.len(), 3 * frame.line_size);
        assert_eq!(frame.y.len(), frame.x.len());
        assert_abs_diff_eq!(frame.frame_duration(100_000), frame.len() as f64 / 1e5);
    }

    #[test]
    fn rotation_keeps_center_fixed() {
        let (x, y) = rotate_x_and_y(&[0.0, 1.0], &[0.0, 0.0], [0.0, 0.0], 180.0);
        assert_abs_diff_eq!(x[1], -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[0], 0.0, epsilon = 1e-12);
    }
}
