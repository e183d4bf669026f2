//! Random key/value payload generation
//!
//! Sizes are drawn from an exponential distribution around a configured
//! mean, which models the long tail of real key-value payload sizes.
//! Generated payloads are never empty.

use bytes::Bytes;
use rand::Rng;

/// Generate a random payload with an exponentially distributed size around
/// `mean_size`, using the caller's RNG.
pub fn random_bytes_with<R: Rng + ?Sized>(rng: &mut R, mean_size: usize) -> Bytes {
    // Inverse-CDF sample: -mean * ln(1 - U) for uniform U in [0, 1).
    let u: f64 = rng.gen();
    let size = (mean_size as f64 * -(1.0 - u).ln()).round() as usize;

    let mut buf = vec![0u8; 1 + size];
    rng.fill_bytes(&mut buf);
    Bytes::from(buf)
}

/// Generate a random payload with an exponentially distributed size around
/// `mean_size`.
pub fn random_bytes(mean_size: usize) -> Bytes {
    random_bytes_with(&mut rand::thread_rng(), mean_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_payloads_never_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert!(!random_bytes_with(&mut rng, 1).is_empty());
        }
    }

    #[test]
    fn test_empirical_mean_tracks_configured_mean() {
        let mut rng = StdRng::seed_from_u64(42);
        let mean = 64usize;
        let samples = 20_000;

        let total: usize = (0..samples)
            .map(|_| random_bytes_with(&mut rng, mean).len())
            .sum();
        let empirical = total as f64 / samples as f64;

        // Lengths are 1 + Exp(mean), so the expected length is mean + 1.
        // The standard error at this sample count is well under one byte.
        let expected = mean as f64 + 1.0;
        assert!(
            (empirical - expected).abs() < 3.0,
            "empirical mean {} too far from {}",
            empirical,
            expected
        );
    }

    #[test]
    fn test_sizes_vary() {
        let mut rng = StdRng::seed_from_u64(3);
        let lens: Vec<usize> = (0..100)
            .map(|_| random_bytes_with(&mut rng, 1024).len())
            .collect();
        let min = lens.iter().min().unwrap();
        let max = lens.iter().max().unwrap();
        assert!(max > min, "exponential sizes should not be constant");
    }
}
