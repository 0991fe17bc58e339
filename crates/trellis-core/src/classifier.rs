//! Pointer → drop zone classification
//!
//! The upper half of a hovered row means "drop before it", the lower half
//! "drop after it". A horizontal offset from the row's left edge of at least
//! the indent threshold requests nesting. There is no hysteresis beyond the
//! single threshold, so a pointer resting on a boundary may flicker between
//! classifications.

use trellis_api::{Point, Rect};

/// Default horizontal distance (logical units) that requests nesting
pub const DEFAULT_INDENT_THRESHOLD: f64 = 36.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zone {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub zone: Zone,
    pub indent_requested: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionClassifier {
    indent_threshold: f64,
}

impl Default for PositionClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_INDENT_THRESHOLD)
    }
}

impl PositionClassifier {
    pub fn new(indent_threshold: f64) -> Self {
        Self { indent_threshold }
    }

    pub fn indent_threshold(&self) -> f64 {
        self.indent_threshold
    }

    pub fn classify(&self, pointer: Point, row: Rect) -> Classification {
        let zone = if pointer.y < row.mid_y() {
            Zone::Before
        } else {
            Zone::After
        };
        Classification {
            zone,
            indent_requested: pointer.x - row.left >= self.indent_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: Rect = Rect::new(100.0, 20.0, 300.0, 30.0);

    #[test]
    fn upper_half_is_before() {
        let c = PositionClassifier::default().classify(Point::new(25.0, 105.0), ROW);
        assert_eq!(c.zone, Zone::Before);
        assert!(!c.indent_requested);
    }

    #[test]
    fn midpoint_and_below_is_after() {
        let classifier = PositionClassifier::default();
        assert_eq!(classifier.classify(Point::new(25.0, 115.0), ROW).zone, Zone::After);
        assert_eq!(classifier.classify(Point::new(25.0, 129.0), ROW).zone, Zone::After);
    }

    #[test]
    fn indent_threshold_is_inclusive() {
        let classifier = PositionClassifier::default();
        assert!(!classifier.classify(Point::new(55.9, 105.0), ROW).indent_requested);
        assert!(classifier.classify(Point::new(56.0, 105.0), ROW).indent_requested);
    }

    #[test]
    fn custom_threshold() {
        let classifier = PositionClassifier::new(10.0);
        assert!(classifier.classify(Point::new(30.0, 105.0), ROW).indent_requested);
    }
}
