use rand::Rng;
use rand::seq::SliceRandom;

use super::corpus::QueryId;

/// Ordering strategy, chosen by the loop and random flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    SequentialOnce,
    SequentialLoop,
    RandomWithReplacement,
    ShuffleOnce,
}

impl ScheduleMode {
    #[must_use]
    pub const fn from_flags(loop_mode: bool, random: bool) -> Self {
        match (loop_mode, random) {
            (false, false) => ScheduleMode::SequentialOnce,
            (true, false) => ScheduleMode::SequentialLoop,
            (true, true) => ScheduleMode::RandomWithReplacement,
            (false, true) => ScheduleMode::ShuffleOnce,
        }
    }

    /// Whether the schedule ends after one pass over the corpus.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        matches!(self, ScheduleMode::SequentialOnce | ScheduleMode::ShuffleOnce)
    }
}

/// Hands out corpus indices in the order the mode asks for.
#[derive(Debug)]
pub struct QueryScheduler {
    mode: ScheduleMode,
    len: usize,
    order: Vec<QueryId>,
    cursor: usize,
}

impl QueryScheduler {
    /// Builds a scheduler over `len` queries. Shuffle-once permutes here,
    /// before the run starts.
    pub fn new<R: Rng + ?Sized>(mode: ScheduleMode, len: usize, rng: &mut R) -> Self {
        let order = match mode {
            ScheduleMode::ShuffleOnce => {
                let mut order: Vec<QueryId> = (0..len).collect();
                order.shuffle(rng);
                order
            }
            ScheduleMode::SequentialOnce
            | ScheduleMode::SequentialLoop
            | ScheduleMode::RandomWithReplacement => Vec::new(),
        };
        Self {
            mode,
            len,
            order,
            cursor: 0,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ScheduleMode {
        self.mode
    }

    /// Whether a single-pass schedule has handed out every query.
    #[must_use]
    pub fn is_spent(&self) -> bool {
        match self.mode {
            ScheduleMode::SequentialOnce => self.cursor >= self.len,
            ScheduleMode::ShuffleOnce => self.cursor >= self.order.len(),
            ScheduleMode::SequentialLoop | ScheduleMode::RandomWithReplacement => self.len == 0,
        }
    }

    /// Next query to send, or `None` once a single-pass schedule is spent.
    pub fn next_query<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<QueryId> {
        if self.len == 0 {
            return None;
        }
        match self.mode {
            ScheduleMode::SequentialOnce => {
                let id = (self.cursor < self.len).then_some(self.cursor)?;
                self.cursor = self.cursor.saturating_add(1);
                Some(id)
            }
            ScheduleMode::SequentialLoop => {
                let id = self.cursor;
                let next = self.cursor.saturating_add(1);
                self.cursor = if next >= self.len { 0 } else { next };
                Some(id)
            }
            ScheduleMode::RandomWithReplacement => Some(rng.gen_range(0..self.len)),
            ScheduleMode::ShuffleOnce => {
                let id = self.order.get(self.cursor).copied()?;
                self.cursor = self.cursor.saturating_add(1);
                Some(id)
            }
        }
    }
}
