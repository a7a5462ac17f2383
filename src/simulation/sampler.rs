//! Turning a win probability into a match result.

use rand::Rng;

/// Draws one uniform variate; `true` means side A won.
pub fn sample<R: Rng + ?Sized>(p: f64, rng: &mut R) -> bool {
    rng.random::<f64>() < p
}

/// Deterministic pick: A wins iff `p >= 0.5`, so an exact coin flip goes to A.
pub fn most_likely(p: f64) -> bool {
    p >= 0.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_certain_outcomes() {
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert!(sample(1.0, &mut rng));
            assert!(!sample(0.0, &mut rng));
        }
    }

    #[test]
    fn test_sample_frequency_tracks_probability() {
        let mut rng = SmallRng::seed_from_u64(42);
        let wins = (0..20_000).filter(|_| sample(0.3, &mut rng)).count();
        let rate = wins as f64 / 20_000.0;
        assert!((rate - 0.3).abs() < 0.02, "rate={rate}");
    }

    #[test]
    fn test_most_likely_breaks_ties_toward_a() {
        assert!(most_likely(0.5));
        assert!(most_likely(0.51));
        assert!(!most_likely(0.49));
    }
}
