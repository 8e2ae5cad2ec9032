use serde::{Deserialize, Serialize};

pub const DEFAULT_REWARD_THRESHOLD: u32 = 50;

/// Grants one credit per multiple of `threshold` the score crosses. A
/// multiple is paid at most once until [`RewardTracker::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardTracker {
    threshold: u32,
    granted: u32,
}

impl RewardTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            granted: 0,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Credits granted so far in this game.
    pub fn granted(&self) -> u32 {
        self.granted
    }

    /// Returns the credits newly earned at `score`.
    pub fn observe(&mut self, score: u32) -> u32 {
        let earned = score / self.threshold;
        let fresh = earned.saturating_sub(self.granted);
        self.granted = self.granted.max(earned);
        fresh
    }

    pub fn reset(&mut self) {
        self.granted = 0;
    }
}

impl Default for RewardTracker {
    fn default() -> Self {
        Self::new(DEFAULT_REWARD_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_each_multiple_pays_once() {
        let mut rewards = RewardTracker::default();
        assert_eq!(rewards.observe(40), 0);
        assert_eq!(rewards.observe(50), 1);
        assert_eq!(rewards.observe(50), 0);
        assert_eq!(rewards.observe(99), 0);
        assert_eq!(rewards.observe(100), 1);
        assert_eq!(rewards.granted(), 2);
    }

    #[test]
    fn jumping_several_multiples_pays_each() {
        let mut rewards = RewardTracker::new(10);
        assert_eq!(rewards.observe(35), 3);
        assert_eq!(rewards.observe(20), 0);
    }

    #[test]
    fn reset_starts_a_new_game() {
        let mut rewards = RewardTracker::default();
        rewards.observe(60);
        rewards.reset();
        assert_eq!(rewards.observe(50), 1);
    }
}
