use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::PlayerId;

/// Default wait before a blank name goes back to "Player N".
pub const NAME_RESET_DELAY_MS: i64 = 3000;

/// Pending "restore the default name" tasks, at most one per player.
///
/// The table only stores deadlines; whoever drives the clock calls
/// [`NameResetSchedule::take_due`] and applies the resets.
#[derive(Debug, Clone)]
pub struct NameResetSchedule {
    delay: Duration,
    pending: BTreeMap<PlayerId, DateTime<Utc>>,
}

impl NameResetSchedule {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    /// Schedule (or reschedule) the reset for `id`, replacing any earlier one.
    pub fn schedule(&mut self, id: PlayerId, now: DateTime<Utc>) -> DateTime<Utc> {
        let deadline = now + self.delay;
        self.pending.insert(id, deadline);
        deadline
    }

    pub fn cancel(&mut self, id: PlayerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    /// Drop the tasks of players that are no longer seated.
    pub fn retain_players(&mut self, seated: &[PlayerId]) {
        self.pending.retain(|id, _| seated.contains(id));
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Remove and return every player whose deadline has passed.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<PlayerId> {
        let due: Vec<PlayerId> = self
            .pending
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| *id)
            .collect();

        for id in &due {
            self.pending.remove(id);
        }
        due
    }

    pub fn is_pending(&self, id: PlayerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn deadline(&self, id: PlayerId) -> Option<DateTime<Utc>> {
        self.pending.get(&id).copied()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.values().min().copied()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for NameResetSchedule {
    fn default() -> Self {
        Self::new(Duration::milliseconds(NAME_RESET_DELAY_MS))
    }
}
