/// Target run counts per slot for one polyphase level.
///
/// Holds `file_count + 1` slots. The first `file_count` slots are the
/// auxiliary files in distribution order, the last one is the merge sink
/// and is always zero. Growing follows the generalized Fibonacci recurrence
/// `next[i] = cur[0] + cur[i + 1]`; shrinking is its exact inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionLevel {
    slots: Vec<u64>,
}

impl DistributionLevel {
    /// The first level: one run in slot 0, nothing elsewhere.
    pub fn initial(file_count: usize) -> Self {
        let mut slots = vec![0; file_count + 1];
        slots[0] = 1;
        Self { slots }
    }

    pub fn from_slots(slots: Vec<u64>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[u64] {
        &self.slots
    }

    pub fn file_count(&self) -> usize {
        self.slots.len() - 1
    }

    pub fn target(&self, slot: usize) -> u64 {
        self.slots[slot]
    }

    pub fn total_runs(&self) -> u64 {
        self.slots.iter().sum()
    }

    pub fn is_terminal(&self) -> bool {
        self.total_runs() == 1
    }

    pub fn grow(&mut self) {
        let current = self.slots.clone();
        let aux = self.file_count();
        for i in 0..aux {
            self.slots[i] = current[0] + current[i + 1];
        }
    }

    /// Steps back to the previous level. Returns `false` (and leaves the level
    /// untouched) when there is nothing smaller to step back to.
    pub fn shrink(&mut self) -> bool {
        let aux = self.file_count();
        let last = self.slots[aux - 1];
        if last == 0 {
            return false;
        }

        let current = self.slots.clone();
        self.slots[0] = last;
        for i in 0..aux - 1 {
            self.slots[i + 1] = current[i] - last;
        }
        true
    }

    /// Smallest non-zero auxiliary target; the number of runs merged at this level.
    pub fn min_nonzero(&self) -> Option<u64> {
        self.slots[..self.file_count()]
            .iter()
            .copied()
            .filter(|&runs| runs > 0)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_files_follow_fibonacci() {
        let mut level = DistributionLevel::initial(2);
        let mut seen = Vec::new();
        for _ in 0..6 {
            level.grow();
            seen.push(level.slots().to_vec());
        }

        assert_eq!(
            seen,
            vec![
                vec![1, 1, 0],
                vec![2, 1, 0],
                vec![3, 2, 0],
                vec![5, 3, 0],
                vec![8, 5, 0],
                vec![13, 8, 0],
            ]
        );
    }

    #[test]
    fn test_three_files_growth() {
        let mut level = DistributionLevel::initial(3);
        level.grow();
        assert_eq!(level.slots(), &[1, 1, 1, 0]);
        level.grow();
        assert_eq!(level.slots(), &[2, 2, 1, 0]);
        level.grow();
        assert_eq!(level.slots(), &[4, 3, 2, 0]);
        level.grow();
        assert_eq!(level.slots(), &[7, 6, 4, 0]);
        assert_eq!(level.total_runs(), 17);
    }

    #[test]
    fn test_shrink_reverses_every_grow_step() {
        for file_count in [2usize, 3, 5, 24] {
            let mut level = DistributionLevel::initial(file_count);
            let mut history = vec![level.clone()];
            for _ in 0..12 {
                level.grow();
                history.push(level.clone());
            }

            history.pop();
            while let Some(previous) = history.pop() {
                assert!(level.shrink());
                assert_eq!(level, previous, "file_count={}", file_count);
            }
            assert!(level.is_terminal());
        }
    }

    #[test]
    fn test_initial_level_cannot_shrink() {
        let mut level = DistributionLevel::initial(4);
        assert!(level.is_terminal());
        assert!(!level.shrink());
        assert_eq!(level, DistributionLevel::initial(4));
    }

    #[test]
    fn test_min_nonzero_ignores_sink_slot() {
        let level = DistributionLevel::from_slots(vec![4, 3, 2, 0]);
        assert_eq!(level.min_nonzero(), Some(2));
        assert_eq!(DistributionLevel::from_slots(vec![0, 0, 0]).min_nonzero(), None);
    }
}
