//! Small RNG helpers shared by the grid shuffle and the cluster sampler.
//!
//! Everything draws from [`RngCore`] directly so sessions stay reproducible for a
//! given seed regardless of which distribution helpers `rand` ships.
use rand::RngCore;

/// Generate a random float in the range [0, 1).
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}

/// Uniform index in `0..len`. `len` must be non-zero.
#[inline]
pub(crate) fn rand_index(rng: &mut dyn RngCore, len: usize) -> usize {
    debug_assert!(len > 0, "rand_index requires a non-empty range");
    ((rand01(rng) * len as f64) as usize).min(len - 1)
}

/// Uniform integer in `min..=max`.
#[inline]
pub(crate) fn rand_range_inclusive(rng: &mut dyn RngCore, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    let span = (max - min) as usize + 1;
    min + rand_index(rng, span) as u32
}

/// In-place Fisher–Yates shuffle.
pub(crate) fn shuffle<T>(items: &mut [T], rng: &mut dyn RngCore) {
    for i in (1..items.len()).rev() {
        let j = rand_index(rng, i + 1);
        items.swap(i, j);
    }
}

/// Derives a well-mixed session seed from a base seed and a session counter.
pub fn seed_for_session(base_seed: u64, session: u64) -> u64 {
    mix_u64(base_seed ^ session.wrapping_mul(0x9E3779B97F4A7C15))
}

#[inline]
fn mix_u64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    struct FixedRng {
        value: u64,
    }

    impl RngCore for FixedRng {
        fn next_u32(&mut self) -> u32 {
            self.value as u32
        }

        fn next_u64(&mut self) -> u64 {
            self.value
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 8];
            }
        }
    }

    #[test]
    fn rand01_returns_zero_for_zero_input() {
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand01(&mut rng), 0.0);
    }

    #[test]
    fn rand01_stays_below_one_for_max_input() {
        let mut rng = FixedRng { value: u64::MAX };
        let result = rand01(&mut rng);
        assert!(result < 1.0);
        assert!(result > 0.999);
    }

    #[test]
    fn rand_index_never_reaches_len() {
        let mut rng = FixedRng { value: u64::MAX };
        assert_eq!(rand_index(&mut rng, 7), 6);
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand_index(&mut rng, 7), 0);
    }

    #[test]
    fn rand_range_inclusive_covers_both_ends() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = [false; 3];
        for _ in 0..500 {
            let v = rand_range_inclusive(&mut rng, 1, 3);
            assert!((1..=3).contains(&v));
            seen[(v - 1) as usize] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn rand_range_inclusive_collapses_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(rand_range_inclusive(&mut rng, 4, 4), 4);
        assert_eq!(rand_range_inclusive(&mut rng, 4, 2), 4);
    }

    #[test]
    fn shuffle_is_a_permutation_and_deterministic() {
        let mut a: Vec<u32> = (0..64).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(99));
        shuffle(&mut b, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);

        let mut sorted = a.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..64).collect::<Vec<_>>());
        assert_ne!(a, sorted);
    }

    #[test]
    fn session_seeds_differ_per_session() {
        let s0 = seed_for_session(42, 0);
        let s1 = seed_for_session(42, 1);
        assert_ne!(s0, s1);
        assert_eq!(s0, seed_for_session(42, 0));
    }
}
