//! Shuffle pool for randomized traversal
//!
//! A shuffle cycle visits every track other than the one playing when the
//! cycle started, each exactly once, in a uniformly random order
//! (Fisher-Yates via `SliceRandom::shuffle`). The pool refills lazily when
//! it runs dry.

use rand::seq::SliceRandom;
use rand::Rng;

/// Shuffle mode together with its pool
///
/// The pool only exists while shuffle is on.
#[derive(Debug, Clone, Default)]
pub enum ShuffleState {
    #[default]
    Off,
    On(ShufflePool),
}

impl ShuffleState {
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On(_))
    }

    /// Flip between off and an empty pool
    pub fn toggle(&mut self) {
        *self = match self {
            Self::Off => Self::On(ShufflePool::new()),
            Self::On(_) => Self::Off,
        };
    }

    /// Indices still to visit this cycle (empty when off)
    pub fn remaining(&self) -> &[usize] {
        match self {
            Self::Off => &[],
            Self::On(pool) => pool.remaining(),
        }
    }
}

/// Not-yet-visited track indices of the current shuffle cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShufflePool {
    /// Drawn from the back
    remaining: Vec<usize>,
}

impl ShufflePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> &[usize] {
        &self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.remaining.contains(&index)
    }

    /// Drop an index that became current outside of `draw`
    pub fn remove(&mut self, index: usize) {
        self.remaining.retain(|&i| i != index);
    }

    /// Take the next index to visit
    ///
    /// Refills with a random permutation of every index except `current`
    /// when empty. Returns `None` only for single-track playlists.
    pub fn draw<R: Rng + ?Sized>(
        &mut self,
        current: usize,
        track_count: usize,
        rng: &mut R,
    ) -> Option<usize> {
        if self.remaining.is_empty() {
            self.refill(current, track_count, rng);
        }

        self.remaining.pop()
    }

    fn refill<R: Rng + ?Sized>(&mut self, current: usize, track_count: usize, rng: &mut R) {
        self.remaining = (0..track_count).filter(|&i| i != current).collect();
        self.remaining.shuffle(rng);
    }
}
