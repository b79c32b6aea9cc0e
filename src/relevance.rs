//! Relevance scores with a one-way raw-to-finalized transition.
//!
//! A relevance accumulates raw location weights during search, then is
//! finalized exactly once into a percentage of the query's total weight.
//! Re-finalizing, or setting a raw value after finalization, is an
//! invalid-state error; multiplicative normalization is allowed only after
//! finalization.

use crate::error::IndexError;

/// A search result's score.
///
/// Raw accumulated weight until [`finalize`](Relevance::finalize) turns it
/// into a percentage of the query total. The transition is irreversible.
#[derive(Debug, Clone, PartialEq)]
pub struct Relevance {
    value: f32,
    finalized: bool,
}

impl Default for Relevance {
    fn default() -> Self {
        Self {
            value: 0.0,
            finalized: false,
        }
    }
}

impl Relevance {
    /// Create a relevance with an initial raw value.
    pub fn new(value: f32) -> Result<Self, IndexError> {
        if value < 0.0 {
            return Err(IndexError::NegativeRelevance);
        }
        Ok(Self {
            value,
            finalized: false,
        })
    }

    /// Current value: raw weight before finalization, percentage after.
    #[inline]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Whether the raw-to-finalized transition has happened.
    #[inline]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Replace the raw value. Fails after finalization.
    pub fn set_value(&mut self, value: f32) -> Result<(), IndexError> {
        if self.finalized {
            return Err(IndexError::RelevanceAlreadyFinalized);
        }
        if value < 0.0 {
            return Err(IndexError::NegativeRelevance);
        }
        self.value = value;
        Ok(())
    }

    /// Accumulate raw weight. Fails after finalization.
    pub fn add(&mut self, amount: f32) -> Result<(), IndexError> {
        if self.finalized {
            return Err(IndexError::RelevanceAlreadyFinalized);
        }
        let next = self.value + amount;
        if next < 0.0 {
            return Err(IndexError::NegativeRelevance);
        }
        self.value = next;
        Ok(())
    }

    /// Finalize into `(value / total) * 100`. One-time and irreversible.
    /// The total must be positive, or the percentage would be NaN/Inf.
    pub fn finalize(&mut self, total: f32) -> Result<(), IndexError> {
        if self.finalized {
            return Err(IndexError::RelevanceAlreadyFinalized);
        }
        if total.is_nan() || total <= 0.0 {
            return Err(IndexError::NonPositiveTotal);
        }
        self.value = self.value / total * 100.0;
        self.finalized = true;
        Ok(())
    }

    /// Multiply the finalized value by `factor`. Fails before finalization.
    pub fn normalize_after_finalization(&mut self, factor: f32) -> Result<(), IndexError> {
        if !self.finalized {
            return Err(IndexError::RelevanceNotFinalized);
        }
        if factor < 0.0 {
            return Err(IndexError::NegativeRelevance);
        }
        self.value *= factor;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_and_finalizes() {
        let mut rel = Relevance::default();
        rel.add(2.0).unwrap();
        rel.add(1.5).unwrap();
        assert_eq!(rel.value(), 3.5);
        assert!(!rel.is_finalized());

        rel.finalize(7.0).unwrap();
        assert!(rel.is_finalized());
        assert!((rel.value() - 50.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_negative_initial_value() {
        assert_eq!(
            Relevance::new(-1.0).unwrap_err(),
            IndexError::NegativeRelevance
        );
    }

    #[test]
    fn finalize_rejects_non_positive_totals() {
        for total in [0.0, -3.0, f32::NAN] {
            let mut rel = Relevance::new(1.0).unwrap();
            assert_eq!(
                rel.finalize(total).unwrap_err(),
                IndexError::NonPositiveTotal
            );
            // The failed call must not consume the one-time transition.
            assert!(!rel.is_finalized());
        }
    }

    #[test]
    fn finalize_twice_fails() {
        let mut rel = Relevance::new(1.0).unwrap();
        rel.finalize(2.0).unwrap();
        assert_eq!(
            rel.finalize(2.0).unwrap_err(),
            IndexError::RelevanceAlreadyFinalized
        );
    }

    #[test]
    fn set_value_after_finalize_fails() {
        let mut rel = Relevance::new(1.0).unwrap();
        rel.finalize(2.0).unwrap();
        assert_eq!(
            rel.set_value(3.0).unwrap_err(),
            IndexError::RelevanceAlreadyFinalized
        );
        assert_eq!(
            rel.add(3.0).unwrap_err(),
            IndexError::RelevanceAlreadyFinalized
        );
    }

    #[test]
    fn normalize_before_finalize_fails() {
        let mut rel = Relevance::new(1.0).unwrap();
        assert_eq!(
            rel.normalize_after_finalization(0.5).unwrap_err(),
            IndexError::RelevanceNotFinalized
        );

        rel.finalize(4.0).unwrap();
        rel.normalize_after_finalization(0.5).unwrap();
        assert!((rel.value() - 12.5).abs() < f32::EPSILON);
    }
}
