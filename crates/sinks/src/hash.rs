//! Key hashing for cluster routing
//!
//! `jump` and `lb` clusters pick a host from the 64-bit FNV-1a hash of the
//! record path. `jump` then maps the hash onto the host ring with Lamping &
//! Veach's jump consistent hash, so growing a ring from N to N+1 hosts moves
//! only 1/(N+1) of the keys.

use std::hash::Hasher;

use fnv::FnvHasher;

/// 64-bit FNV-1a of `bytes`
#[inline]
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

/// Jump consistent hash: map `key` onto `[0, buckets)`
///
/// Returns 0 when `buckets` is 0 or 1.
#[inline]
pub fn jump_hash(mut key: u64, buckets: usize) -> usize {
    if buckets <= 1 {
        return 0;
    }

    let mut b: i64 = -1;
    let mut j: i64 = 0;
    while j < buckets as i64 {
        b = j;
        key = key.wrapping_mul(2_862_933_555_777_941_757).wrapping_add(1);
        j = ((b + 1) as f64 * ((1u64 << 31) as f64 / ((key >> 33) + 1) as f64)) as i64;
    }
    b as usize
}
