use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Randomness used by curation, injectable so tests can script it.
///
/// Every `rand::Rng` is a `RandomSource`.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn draw(&mut self) -> f64;

    fn shuffle<T>(&mut self, items: &mut [T]);

    /// Up to `amount` distinct elements, sampled without replacement.
    fn choose_many<T: Clone>(&mut self, items: &[T], amount: usize) -> Vec<T>;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn draw(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(self);
    }

    fn choose_many<T: Clone>(&mut self, items: &[T], amount: usize) -> Vec<T> {
        items.choose_multiple(self, amount).cloned().collect()
    }
}
