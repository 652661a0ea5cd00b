use crate::prelude::{ScanError, ScanResult};

/// One period of a block (pulse) wave: `ceil(wavelength * duty_cycle)` samples
/// at `volt_max` followed by `floor(wavelength * (1 - duty_cycle))` samples at
/// `volt_min`.
pub fn block_wave(
    sample_rate: u32,
    frequency: f64,
    volt_min: f64,
    volt_max: f64,
    duty_cycle: f64,
) -> ScanResult<Vec<f64>> {
    if !(frequency > 0.0) {
        return Err(ScanError::InvalidInput(format!(
            "block wave frequency must be positive, got {}",
            frequency
        )));
    }
    if !(0.0..=1.0).contains(&duty_cycle) {
        return Err(ScanError::InvalidInput(format!(
            "duty cycle must lie in [0, 1], got {}",
            duty_cycle
        )));
    }

    let wavelength = (sample_rate as f64 / frequency).trunc();
    let high = (wavelength * duty_cycle).ceil() as usize;
    let low = (wavelength * (1.0 - duty_cycle)).floor() as usize;

    let mut wave = vec![volt_max; high];
    wave.extend(std::iter::repeat(volt_min).take(low));
    Ok(wave)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_wave_splits_period_by_duty_cycle() {
        let wave = block_wave(800, 100.0, 0.0, 5.0, 0.25).unwrap();
        assert_eq!(wave.len(), 8);
        assert_eq!(wave.iter().filter(|v| **v == 5.0).count(), 2);
        assert_eq!(wave[7], 0.0);
    }

    #[test]
    fn block_wave_rejects_bad_duty_cycle() {
        assert!(block_wave(1_000, 100.0, 0.0, 5.0, 1.5).is_err());
        assert!(block_wave(1_000, 0.0, 0.0, 5.0, 0.5).is_err());
    }
}
