//! Random index selection for shuffle mode
//!
//! Shuffle never reorders the queue; it only picks where to go next.
//! Picks are independent, so the same index can come up twice in a row.

use rand::Rng;

/// Uniform random index in `[0, len)`, `None` for an empty queue
pub fn random_index(len: usize) -> Option<usize> {
    random_index_with(&mut rand::thread_rng(), len)
}

/// Same as [`random_index`] with a caller-supplied RNG
pub fn random_index_with<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(rng.gen_range(0..len))
    }
}
