//! Rolling history of learning episodes

use std::collections::VecDeque;

use oomdp_core::EpisodeAnalysis;

/// Fixed-capacity FIFO of completed episodes
#[derive(Debug, Clone)]
pub struct EpisodeHistory {
    /// Buffer storage
    episodes: VecDeque<EpisodeAnalysis>,
    /// Maximum capacity, at least 1
    capacity: usize,
}

impl EpisodeHistory {
    /// Create a history; a zero capacity is raised to 1
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            episodes: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add an episode, evicting the oldest when full
    pub fn push(&mut self, episode: EpisodeAnalysis) {
        if self.episodes.len() >= self.capacity {
            self.episodes.pop_front();
        }
        self.episodes.push_back(episode);
    }

    /// Change the capacity; a zero capacity is raised to 1 and surplus
    /// episodes are dropped oldest first
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.episodes.len() > self.capacity {
            self.episodes.pop_front();
        }
    }

    /// Current capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recently added episode
    #[must_use]
    pub fn last(&self) -> Option<&EpisodeAnalysis> {
        self.episodes.back()
    }

    /// Episodes from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &EpisodeAnalysis> {
        self.episodes.iter()
    }

    /// Get the current size of the history
    #[must_use]
    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    /// Check if history is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// Clear the history
    pub fn clear(&mut self) {
        self.episodes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oomdp_core::State;

    fn episodes(n: usize) -> Vec<EpisodeAnalysis> {
        (0..n).map(|_| EpisodeAnalysis::new(State::new())).collect()
    }

    #[test]
    fn evicts_oldest_first() {
        let eps = episodes(3);
        let ids: Vec<_> = eps.iter().map(|e| e.id).collect();
        let mut history = EpisodeHistory::new(2);
        for e in eps {
            history.push(e);
        }
        assert_eq!(history.len(), 2);
        let kept: Vec<_> = history.iter().map(|e| e.id).collect();
        assert_eq!(kept, vec![ids[1], ids[2]]);
        assert_eq!(history.last().map(|e| e.id), Some(ids[2]));
    }

    #[test]
    fn zero_capacity_clamps_to_one() {
        let mut history = EpisodeHistory::new(0);
        assert_eq!(history.capacity(), 1);
        for e in episodes(2) {
            history.push(e);
        }
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn shrinking_trims_oldest() {
        let eps = episodes(4);
        let newest = eps[3].id;
        let mut history = EpisodeHistory::new(4);
        for e in eps {
            history.push(e);
        }
        history.set_capacity(1);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().map(|e| e.id), Some(newest));
    }
}
