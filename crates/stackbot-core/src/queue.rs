//! Unit queue manager: stack members, the active window, and level-ups.
//!
//! The manager keeps two collections:
//!
//! - **Stack members** -- catalog units admitted into play, each bound to a
//!   side with a per-side `order`. The number of members is the window
//!   capacity.
//! - **Active window** -- the units the player must sort, head first. Each
//!   slot is drawn from the stack members, so a unit's correct direction is
//!   the side of its member.
//!
//! Between calls the window always holds exactly `capacity` units once the
//! session has started. Removal of the head and the refill happen inside a
//! single [`UnitQueueManager::remove_and_refilled`] call.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use stackbot_types::{Direction, QueuedUnit};
use tracing::debug;

use crate::catalog::UnitCatalog;
use crate::config::{QueueConfig, ScoringConfig};

/// Owner of the active window and unit generation for one session.
#[derive(Debug)]
pub struct UnitQueueManager {
    catalog: UnitCatalog,
    config: QueueConfig,
    scoring: ScoringConfig,
    members: Vec<QueuedUnit>,
    window: VecDeque<QueuedUnit>,
    answer_count: u32,
    rng: SmallRng,
}

impl UnitQueueManager {
    /// Create an empty manager. Seeds from `config.seed` when set.
    pub fn new(catalog: UnitCatalog, config: QueueConfig, scoring: ScoringConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Self {
            catalog,
            config,
            scoring,
            members: Vec::new(),
            window: VecDeque::new(),
            answer_count: 0,
            rng,
        }
    }

    /// Clear members, window, and the answer tally. Idempotent.
    pub fn reset_all(&mut self) {
        self.members.clear();
        self.window.clear();
        self.answer_count = 0;
    }

    /// Admit the starting members and fill the window.
    ///
    /// Tops up the stack members to the starting capacity if the caller
    /// has not already admitted them, then fills every window slot.
    /// Returns the window, head first.
    pub fn startings(&mut self) -> Vec<QueuedUnit> {
        let target = self.starting_capacity();
        while self.members.len() < target {
            if self.new_member().is_none() {
                break;
            }
        }
        self.refill();
        self.window_snapshot()
    }

    /// Admit one new stack member.
    ///
    /// Picks a catalog unit not already in play, binds it to a random side
    /// at the tail of that side's stack, and returns it. Returns `None`
    /// without changing anything when the member cap is reached.
    pub fn new_member(&mut self) -> Option<QueuedUnit> {
        if self.members.len() >= self.max_capacity() {
            debug!(
                members = self.members.len(),
                max = self.max_capacity(),
                "Member cap reached, not admitting"
            );
            return None;
        }

        let candidates: Vec<usize> = (0..self.catalog.len())
            .filter(|&idx| {
                self.catalog.get(idx).is_some_and(|unit| {
                    !self.members.iter().any(|member| member.unit.id == unit.id)
                })
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let pick = self.rng.random_range(0..candidates.len());
        let unit = candidates
            .get(pick)
            .and_then(|&idx| self.catalog.get(idx))?
            .clone();
        let direction = if self.rng.random_bool(0.5) {
            Direction::Left
        } else {
            Direction::Right
        };
        let order = self.side_len(direction);

        let member = QueuedUnit {
            unit,
            direction,
            order,
        };
        debug!(
            unit_id = %member.unit.id,
            kind = %member.unit.kind,
            %direction,
            order,
            "Stack member admitted"
        );
        self.members.push(member.clone());
        Some(member)
    }

    /// Point value of the head unit, or `None` if the window is empty.
    pub fn current_head_unit_score(&self) -> Option<u64> {
        self.window
            .front()
            .map(|head| self.scoring.points_for_level(head.unit.level))
    }

    /// Whether `direction` is the head unit's side. Does not mutate.
    pub fn is_move_action_correct(&self, direction: Direction) -> bool {
        self.window
            .front()
            .is_some_and(|head| head.direction == direction)
    }

    /// Count one confirmed correct answer toward the next level-up.
    pub const fn raise_answer_count(&mut self) {
        self.answer_count = self.answer_count.saturating_add(1);
    }

    /// Whether the tally has reached the level-up threshold.
    ///
    /// Resets the tally when it returns `true`, so each crossing fires once.
    /// A threshold of 0 never fires.
    pub const fn is_time_to_level_up(&mut self) -> bool {
        let threshold = self.config.level_up_threshold;
        if threshold == 0 || self.answer_count < threshold {
            return false;
        }
        self.answer_count = 0;
        true
    }

    /// Remove the resolved head and refill the window to capacity.
    ///
    /// Returns the window, head first.
    pub fn remove_and_refilled(&mut self) -> Vec<QueuedUnit> {
        let _ = self.window.pop_front();
        self.refill();
        self.window_snapshot()
    }

    /// The unit that must be answered next.
    pub fn head(&self) -> Option<&QueuedUnit> {
        self.window.front()
    }

    /// Current window capacity (number of stack members).
    pub fn capacity(&self) -> usize {
        self.members.len()
    }

    /// Highest capacity level-ups can reach.
    pub fn max_capacity(&self) -> usize {
        usize::try_from(self.config.max_capacity)
            .unwrap_or(usize::MAX)
            .min(self.catalog.len())
    }

    /// Correct answers counted since the last level-up.
    pub const fn answer_count(&self) -> u32 {
        self.answer_count
    }

    /// Stack members in admission order.
    pub fn members(&self) -> &[QueuedUnit] {
        &self.members
    }

    /// Owned copy of the window, head first.
    pub fn window_snapshot(&self) -> Vec<QueuedUnit> {
        self.window.iter().cloned().collect()
    }

    fn starting_capacity(&self) -> usize {
        usize::try_from(self.config.starting_capacity)
            .unwrap_or(usize::MAX)
            .min(self.max_capacity())
    }

    fn side_len(&self, direction: Direction) -> u32 {
        let count = self
            .members
            .iter()
            .filter(|member| member.direction == direction)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn refill(&mut self) {
        if self.members.is_empty() {
            return;
        }
        while self.window.len() < self.members.len() {
            let pick = self.rng.random_range(0..self.members.len());
            let Some(member) = self.members.get(pick) else {
                break;
            };
            self.window.push_back(member.clone());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use stackbot_types::Unit;

    use super::*;

    fn catalog(size: usize) -> UnitCatalog {
        let kinds = ["swift", "kotlin", "rust", "go", "java", "ruby", "elixir", "zig"];
        let units = kinds
            .iter()
            .take(size)
            .map(|kind| Unit::new(*kind))
            .collect();
        UnitCatalog::new(units).unwrap()
    }

    fn manager(starting: u32, max: u32, threshold: u32) -> UnitQueueManager {
        UnitQueueManager::new(
            catalog(8),
            QueueConfig {
                starting_capacity: starting,
                max_capacity: max,
                level_up_threshold: threshold,
                seed: Some(42),
            },
            ScoringConfig::default(),
        )
    }

    #[test]
    fn startings_fills_window_to_starting_capacity() {
        let mut queue = manager(3, 8, 5);
        let window = queue.startings();
        assert_eq!(window.len(), 3);
        assert_eq!(queue.capacity(), 3);
        assert_eq!(queue.head(), window.first());
    }

    #[test]
    fn window_units_carry_their_member_side() {
        let mut queue = manager(4, 8, 5);
        let window = queue.startings();
        for slot in &window {
            let member = queue
                .members()
                .iter()
                .find(|m| m.unit.id == slot.unit.id)
                .unwrap();
            assert_eq!(member.direction, slot.direction);
            assert_eq!(member.order, slot.order);
        }
    }

    #[test]
    fn member_orders_are_contiguous_per_side() {
        let mut queue = manager(8, 8, 5);
        let _ = queue.startings();
        for side in Direction::ALL {
            let orders: Vec<u32> = queue
                .members()
                .iter()
                .filter(|m| m.direction == side)
                .map(|m| m.order)
                .collect();
            let expected: Vec<u32> = (0..u32::try_from(orders.len()).unwrap()).collect();
            assert_eq!(orders, expected);
        }
    }

    #[test]
    fn members_are_distinct_units() {
        let mut queue = manager(8, 8, 5);
        let _ = queue.startings();
        let mut ids: Vec<_> = queue.members().iter().map(|m| m.unit.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn new_member_is_noop_at_cap() {
        let mut queue = manager(2, 2, 5);
        let _ = queue.startings();
        let before = queue.members().to_vec();
        assert!(queue.new_member().is_none());
        assert_eq!(queue.members(), before.as_slice());
    }

    #[test]
    fn cap_is_bounded_by_catalog_size() {
        let mut queue = UnitQueueManager::new(
            catalog(2),
            QueueConfig {
                starting_capacity: 2,
                max_capacity: 10,
                level_up_threshold: 1,
                seed: Some(1),
            },
            ScoringConfig::default(),
        );
        assert_eq!(queue.max_capacity(), 2);
        let _ = queue.startings();
        assert!(queue.new_member().is_none());
    }

    #[test]
    fn correctness_check_does_not_mutate() {
        let mut queue = manager(3, 8, 5);
        let window = queue.startings();
        let head = window.first().unwrap().clone();
        assert!(queue.is_move_action_correct(head.direction));
        assert!(!queue.is_move_action_correct(head.direction.opposite()));
        assert_eq!(queue.window_snapshot(), window);
    }

    #[test]
    fn remove_and_refilled_keeps_size_constant() {
        let mut queue = manager(3, 8, 5);
        let _ = queue.startings();
        for _ in 0..20 {
            let window = queue.remove_and_refilled();
            assert_eq!(window.len(), 3);
        }
    }

    #[test]
    fn remaining_units_shift_toward_head() {
        let mut queue = manager(3, 8, 5);
        let before = queue.startings();
        let after = queue.remove_and_refilled();
        assert_eq!(after.first(), before.get(1));
        assert_eq!(after.get(1), before.get(2));
    }

    #[test]
    fn level_up_is_edge_triggered() {
        let mut queue = manager(3, 8, 5);
        let _ = queue.startings();
        for _ in 0..4 {
            queue.raise_answer_count();
            assert!(!queue.is_time_to_level_up());
        }
        queue.raise_answer_count();
        assert!(queue.is_time_to_level_up());
        assert!(!queue.is_time_to_level_up());
        assert_eq!(queue.answer_count(), 0);
    }

    #[test]
    fn zero_threshold_never_levels_up() {
        let mut queue = manager(3, 8, 0);
        for _ in 0..50 {
            queue.raise_answer_count();
        }
        assert!(!queue.is_time_to_level_up());
    }

    #[test]
    fn level_up_member_grows_window_by_one() {
        let mut queue = manager(3, 8, 5);
        let _ = queue.startings();
        assert!(queue.new_member().is_some());
        let window = queue.remove_and_refilled();
        assert_eq!(window.len(), 4);
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn head_score_tracks_level() {
        let unit = Unit::new("swift").leveled_up().leveled_up();
        let mut queue = UnitQueueManager::new(
            UnitCatalog::new(vec![unit]).unwrap(),
            QueueConfig {
                starting_capacity: 1,
                max_capacity: 1,
                level_up_threshold: 5,
                seed: Some(3),
            },
            ScoringConfig::default(),
        );
        assert_eq!(queue.current_head_unit_score(), None);
        let _ = queue.startings();
        assert_eq!(queue.current_head_unit_score(), Some(20));
    }

    #[test]
    fn reset_all_is_idempotent() {
        let mut queue = manager(3, 8, 5);
        let _ = queue.startings();
        queue.raise_answer_count();
        queue.reset_all();
        queue.reset_all();
        assert_eq!(queue.capacity(), 0);
        assert!(queue.head().is_none());
        assert_eq!(queue.answer_count(), 0);
    }
}
