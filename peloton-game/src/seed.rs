//! Deterministic seed derivation for rider decks.
//!
//! Every deck gets its own ChaCha stream so that registering an extra player
//! never perturbs the shuffles of riders already in the race.

use crate::constants::SEED_DOMAIN;
use crate::rider::{Color, RiderKind};

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Mix the race seed with a rider's identity into a deck seed.
#[must_use]
pub fn rider_seed(race_seed: u64, color: Color, kind: RiderKind) -> u64 {
    let mut buf = [0u8; 16];
    buf[..6].copy_from_slice(SEED_DOMAIN);
    buf[6] = color.index();
    buf[7] = kind.index();
    buf[8..].copy_from_slice(&race_seed.to_be_bytes());
    fnv1a64(&buf)
}

/// Expand a 64-bit seed into the 32-byte ChaCha key.
#[must_use]
pub fn seed_bytes(seed: u64) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    let mut lane = seed;
    for chunk in bytes.chunks_exact_mut(8) {
        chunk.copy_from_slice(&lane.to_be_bytes());
        lane = fnv1a64(&lane.to_le_bytes());
    }
    bytes
}
