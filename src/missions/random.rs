//! Random source for mission selection

use rand::RngCore;

/// Picks indices for mission sampling
pub trait RandomSource: Send {
    /// Uniform index in `0..upper`. `upper` is never zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

impl<R: RngCore + Send> RandomSource for R {
    fn next_index(&mut self, upper: usize) -> usize {
        rand::Rng::gen_range(self, 0..upper)
    }
}

/// Replays a fixed list of indices, wrapping each into range.
///
/// Useful for asserting exact mission sets; cycles when exhausted.
#[derive(Debug, Clone)]
pub struct FixedSequence {
    values: Vec<usize>,
    pos: usize,
}

impl FixedSequence {
    pub fn new(values: impl Into<Vec<usize>>) -> Self {
        Self {
            values: values.into(),
            pos: 0,
        }
    }
}

impl RandomSource for FixedSequence {
    fn next_index(&mut self, upper: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.pos % self.values.len()];
        self.pos += 1;
        value % upper
    }
}

/// Pick `count` distinct items uniformly without replacement.
///
/// Partial Fisher-Yates: position `i` is swapped with a random position in
/// `i..len`, so the result order is the draw order.
pub fn sample<'a, T>(items: &[&'a T], count: usize, rng: &mut dyn RandomSource) -> Vec<&'a T> {
    let mut pool = items.to_vec();
    let count = count.min(pool.len());
    for i in 0..count {
        let j = i + rng.next_index(pool.len() - i);
        pool.swap(i, j);
    }
    pool.truncate(count);
    pool
}
