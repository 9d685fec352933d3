use std::collections::VecDeque;

/// Bounded window of recent (S, I, R) means, oldest first. Pushing past capacity
/// drops the oldest sample.
#[derive(Debug, Clone)]
pub struct MeansHistory {
    capacity: usize,
    samples: VecDeque<(f32, f32, f32)>,
}

impl MeansHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { capacity, samples: VecDeque::with_capacity(capacity) }
    }

    pub fn push(&mut self, means: (f32, f32, f32)) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(means);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<(f32, f32, f32)> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(f32, f32, f32)> {
        self.samples.iter()
    }

    /// Highest mean infected fraction in the window.
    pub fn peak_infected(&self) -> Option<f32> {
        self.samples.iter().map(|&(_, i, _)| i).reduce(f32::max)
    }
}
