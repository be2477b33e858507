//! Temperature-scaled sampling.
//!
//! Given probabilities `p` and temperature `T`, the resampling distribution
//! is `exp(ln(p_i) / T)` renormalized. `T = 1` leaves `p` unchanged, small
//! `T` concentrates mass on the most likely entry, and large `T` flattens
//! towards uniform. Log probabilities are shifted by their maximum before
//! the division by `T`, so the most likely entry always keeps weight 1.

use crate::error::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

fn check_temperature(temperature: f64) -> Result<()> {
    if temperature.is_finite() && temperature > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidTemperature(temperature))
    }
}

/// Returns the temperature-adjusted distribution.
///
/// Entries with zero probability stay at zero.
///
/// # Errors
///
/// - `InvalidTemperature` if `temperature` is not finite and positive
/// - `InvalidDistribution` if an entry is negative, NaN or infinite, or no
///   entry is positive
pub fn reweight(probabilities: &[f64], temperature: f64) -> Result<Vec<f64>> {
    check_temperature(temperature)?;

    if let Some(&p) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0)
    {
        return Err(Error::InvalidDistribution(format!(
            "probability {} is not a finite non-negative number",
            p
        )));
    }

    let ln_max = probabilities
        .iter()
        .map(|p| p.ln())
        .fold(f64::NEG_INFINITY, f64::max);
    if !ln_max.is_finite() {
        return Err(Error::InvalidDistribution(
            "no entry has positive probability".to_string(),
        ));
    }

    let weights: Vec<f64> = probabilities
        .iter()
        .map(|p| ((p.ln() - ln_max) / temperature).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    Ok(weights.into_iter().map(|w| w / total).collect())
}

/// Draws one index from `probabilities` after temperature adjustment.
///
/// This is a stochastic draw, not an argmax.
pub fn sample_with_temperature<R: Rng + ?Sized>(
    probabilities: &[f64],
    temperature: f64,
    rng: &mut R,
) -> Result<usize> {
    let weights = reweight(probabilities, temperature)?;
    let distribution =
        WeightedIndex::new(&weights).map_err(|e| Error::InvalidDistribution(e.to_string()))?;
    Ok(distribution.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PROBS: [f64; 4] = [0.1, 0.2, 0.1, 0.6];

    #[test]
    fn test_unit_temperature_is_identity() {
        let weights = reweight(&PROBS, 1.0).unwrap();
        for (w, p) in weights.iter().zip(PROBS) {
            assert!((w - p).abs() < 1e-12);
        }
    }

    #[test]
    fn test_low_temperature_sharpens() {
        let weights = reweight(&PROBS, 0.01).unwrap();
        assert!(weights[3] > 0.999999);

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(sample_with_temperature(&PROBS, 0.01, &mut rng).unwrap(), 3);
        }
    }

    #[test]
    fn test_vanishing_temperature_picks_argmax() {
        assert_eq!(reweight(&[0.4, 0.6], 1e-310).unwrap(), vec![0.0, 1.0]);
        assert_eq!(reweight(&[0.0, 0.3, 0.7], 1e-310).unwrap(), vec![0.0, 0.0, 1.0]);
        assert_eq!(reweight(&[0.5, 0.5], 1e-310).unwrap(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_high_temperature_flattens() {
        let weights = reweight(&PROBS, 1000.0).unwrap();
        for w in weights {
            assert!((w - 0.25).abs() < 0.01);
        }
    }

    #[test]
    fn test_zero_probability_never_drawn() {
        let probs = [0.0, 0.5, 0.0, 0.5];
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..200 {
            let index = sample_with_temperature(&probs, 2.0, &mut rng).unwrap();
            assert!(index == 1 || index == 3);
        }
    }

    #[test]
    fn test_sampling_follows_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = [0usize; 4];
        for _ in 0..10_000 {
            counts[sample_with_temperature(&PROBS, 1.0, &mut rng).unwrap()] += 1;
        }
        // 0.6 expected for index 3
        assert!((5_600..6_400).contains(&counts[3]), "{:?}", counts);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            reweight(&PROBS, 0.0),
            Err(Error::InvalidTemperature(_))
        ));
        assert!(matches!(
            reweight(&PROBS, -1.0),
            Err(Error::InvalidTemperature(_))
        ));
        assert!(matches!(
            reweight(&PROBS, f64::NAN),
            Err(Error::InvalidTemperature(_))
        ));
        assert!(matches!(
            reweight(&[0.0, 0.0], 1.0),
            Err(Error::InvalidDistribution(_))
        ));
        assert!(matches!(
            reweight(&[0.5, -0.1], 1.0),
            Err(Error::InvalidDistribution(_))
        ));
        assert!(matches!(
            reweight(&[], 1.0),
            Err(Error::InvalidDistribution(_))
        ));
    }
}
