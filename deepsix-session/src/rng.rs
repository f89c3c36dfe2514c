//! Deterministic RNG streams segregated by roll severity.
//!
//! Each severity draws from its own seeded stream so a stress roll never
//! perturbs the panic sequence; replaying a session from the same seed
//! reproduces every die.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::cell::{RefCell, RefMut};

use crate::data::Severity;

/// Deterministic bundle of RNG streams, one per roll severity.
#[derive(Debug, Clone)]
pub struct RngBundle {
    stress: RefCell<CountingRng<SmallRng>>,
    panic: RefCell<CountingRng<SmallRng>>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        let stress = CountingRng::new(derive_stream_seed(seed, b"stress"));
        let panic = CountingRng::new(derive_stream_seed(seed, b"panic"));
        Self {
            stress: RefCell::new(stress),
            panic: RefCell::new(panic),
        }
    }

    /// Access the stream for a roll severity.
    #[must_use]
    pub fn stream(&self, severity: Severity) -> RefMut<'_, CountingRng<SmallRng>> {
        match severity {
            Severity::Stress => self.stress.borrow_mut(),
            Severity::Panic => self.panic.borrow_mut(),
        }
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<SmallRng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: rand::RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: rand::RngCore> rand::RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
