//! Integer order keys for sibling ordering
//!
//! Keys are spaced `ORDER_KEY_STEP` apart when generated at either end of a
//! sibling list and bisected when inserting between two siblings. Once two
//! neighbours are numerically adjacent there is no room left and the caller
//! renumbers the sibling list with `OrderKey::evenly_spaced`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spacing between freshly generated keys
pub const ORDER_KEY_STEP: i64 = 1024;

/// Totally ordered sort key among siblings sharing a parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(i64);

impl OrderKey {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    /// Generate a key strictly between two optional bounds
    ///
    /// An absent `lower` means "start of the list" and an absent `upper`
    /// means "end of the list". Returns `None` when no integer fits between
    /// the bounds (or the key space is exhausted at either end).
    pub fn between(lower: Option<OrderKey>, upper: Option<OrderKey>) -> Option<OrderKey> {
        match (lower, upper) {
            (None, None) => Some(OrderKey(ORDER_KEY_STEP)),
            (Some(lo), None) => lo.0.checked_add(ORDER_KEY_STEP).map(OrderKey),
            (None, Some(hi)) => hi.0.checked_sub(ORDER_KEY_STEP).map(OrderKey),
            (Some(lo), Some(hi)) => {
                let gap = (hi.0 as i128) - (lo.0 as i128);
                if gap < 2 {
                    return None;
                }
                Some(OrderKey(((lo.0 as i128) + gap / 2) as i64))
            }
        }
    }

    /// Generate a key that sorts after `self`
    pub fn after(self) -> Option<OrderKey> {
        Self::between(Some(self), None)
    }

    /// Generate `count` evenly spaced, strictly increasing keys
    ///
    /// Used when rebalancing a sibling list whose gaps are exhausted.
    pub fn evenly_spaced(count: usize) -> Vec<OrderKey> {
        (1..=count as i64)
            .map(|i| OrderKey(i * ORDER_KEY_STEP))
            .collect()
    }
}

impl Default for OrderKey {
    fn default() -> Self {
        OrderKey(ORDER_KEY_STEP)
    }
}

impl From<i64> for OrderKey {
    fn from(value: i64) -> Self {
        OrderKey(value)
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_empty() {
        assert_eq!(OrderKey::between(None, None), Some(OrderKey::new(ORDER_KEY_STEP)));
    }

    #[test]
    fn test_between_at_beginning() {
        let next = OrderKey::new(1024);
        let key = OrderKey::between(None, Some(next)).unwrap();
        assert!(key < next);
    }

    #[test]
    fn test_between_at_end() {
        let prev = OrderKey::new(1024);
        let key = OrderKey::between(Some(prev), None).unwrap();
        assert!(key > prev);
        assert_eq!(prev.after(), Some(key));
    }

    #[test]
    fn test_between_middle() {
        let lo = OrderKey::new(1024);
        let hi = OrderKey::new(2048);
        let mid = OrderKey::between(Some(lo), Some(hi)).unwrap();
        assert!(lo < mid && mid < hi);
    }

    #[test]
    fn test_between_adjacent_has_no_room() {
        let lo = OrderKey::new(7);
        assert_eq!(OrderKey::between(Some(lo), Some(OrderKey::new(8))), None);
        assert_eq!(OrderKey::between(Some(lo), Some(lo)), None);
    }

    #[test]
    fn test_between_extremes() {
        assert_eq!(OrderKey::between(Some(OrderKey::new(i64::MAX)), None), None);
        assert_eq!(OrderKey::between(None, Some(OrderKey::new(i64::MIN))), None);
        let mid = OrderKey::between(Some(OrderKey::new(i64::MIN)), Some(OrderKey::new(i64::MAX)));
        assert!(mid.is_some());
    }

    #[test]
    fn test_repeated_bisection_exhausts_gap() {
        let lo = OrderKey::new(1024);
        let mut hi = OrderKey::new(2048);
        let mut inserted = 0;
        while let Some(key) = OrderKey::between(Some(lo), Some(hi)) {
            assert!(lo < key && key < hi);
            hi = key;
            inserted += 1;
        }
        assert_eq!(inserted, 10);
    }

    #[test]
    fn test_evenly_spaced() {
        let keys = OrderKey::evenly_spaced(5);
        assert_eq!(keys.len(), 5);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert!(OrderKey::evenly_spaced(0).is_empty());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&OrderKey::new(42)).unwrap();
        assert_eq!(json, "42");
        let key: OrderKey = serde_json::from_str("2048").unwrap();
        assert_eq!(key.value(), 2048);
    }
}
