use rand::{Rng, SeedableRng, rngs::StdRng};

/// Uniform choice over a non-empty ordered collection.
///
/// The chooser is the only source of nondeterminism in the crate; injecting a
/// seeded one makes a whole traversal reproducible, and tests can wrap one to
/// count how many picks a time jump performs.
pub trait Chooser {
    /// Returns an index in `0..len`. `len` is never zero.
    fn choose(&mut self, len: usize) -> usize;
}

/// Adapter from any `rand` RNG to [`Chooser`].
pub struct RngChooser<R>(pub R);

impl<R: rand::RngCore> Chooser for RngChooser<R> {
    fn choose(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}

/// Deterministic chooser for reproducible traversals.
pub fn seeded(seed: u64) -> RngChooser<StdRng> {
    RngChooser(StdRng::seed_from_u64(seed))
}

/// OS-seeded chooser, the default for [`crate::Machine::new`].
pub fn system() -> RngChooser<StdRng> {
    RngChooser(StdRng::from_os_rng())
}
