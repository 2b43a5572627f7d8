//! The process-wide random source.
//!
//! One generator is created at startup and handed to the engine, which owns
//! it for the lifetime of the bot. Every command draws from the same stream,
//! so replies are reproducible given a fixed seed and message order.
//! Not suitable for anything security-sensitive.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

pub type RandomSource = StdRng;

/// Build the random source, seeded from `seed` when given, otherwise from OS entropy.
pub fn random_source(seed: Option<u64>) -> RandomSource {
    match seed {
        Some(seed) => {
            info!("Random source seeded with fixed seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}
