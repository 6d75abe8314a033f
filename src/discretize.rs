//! Discretization of continuous risk probabilities into ordinal triage
//! categories.
//!
//! A `Breaks` vector holds five strictly increasing cut-points defining four
//! half-open-right intervals. The lowest bound is itself excluded, so a
//! probability equal to `b0` maps to no category.

use serde::{Deserialize, Serialize};

use crate::error::StackError;

/// Five ordered cut-points partitioning `(b0, b4]` into the four triage
/// categories `{0, 1, 2, 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 5]", into = "[f64; 5]")]
pub struct Breaks([f64; 5]);

impl Breaks {
    /// Validate and build a cut-point vector. The points must be strictly
    /// increasing; NaN fails the ordering check.
    pub fn new(points: [f64; 5]) -> Result<Self, StackError> {
        if points.windows(2).any(|w| !(w[0] < w[1])) {
            return Err(StackError::InvalidHyperparameter(format!(
                "cut-points must be strictly increasing, got {:?}",
                points
            )));
        }
        Ok(Breaks(points))
    }

    pub fn points(&self) -> &[f64; 5] {
        &self.0
    }

    /// Map a probability to its category.
    ///
    /// Intervals are left-open and right-closed: category `c` covers
    /// `(b_c, b_{c+1}]`. Values at or below `b0`, above `b4`, or NaN map to
    /// no category and are rejected.
    pub fn cut(&self, p: f64) -> Result<u8, StackError> {
        if !(p > self.0[0] && p <= self.0[4]) {
            return Err(StackError::UndefinedCategory(p));
        }
        let category = self.0[1..4].iter().take_while(|&&b| p > b).count();
        Ok(category as u8)
    }

    /// Discretize a probability vector, failing on the first value that maps
    /// to no category.
    pub fn cut_slice(&self, probabilities: &[f32]) -> Result<Vec<u8>, StackError> {
        probabilities
            .iter()
            .map(|&p| self.cut(f64::from(p)))
            .collect()
    }
}

impl Default for Breaks {
    /// Quartile cut-points over the unit interval.
    fn default() -> Self {
        Breaks([0.0, 0.25, 0.5, 0.75, 1.0])
    }
}

impl TryFrom<[f64; 5]> for Breaks {
    type Error = StackError;

    fn try_from(points: [f64; 5]) -> Result<Self, Self::Error> {
        Breaks::new(points)
    }
}

impl From<Breaks> for [f64; 5] {
    fn from(breaks: Breaks) -> Self {
        breaks.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_assigns_each_interval() {
        let breaks = Breaks::default();
        assert_eq!(breaks.cut(0.1).unwrap(), 0);
        assert_eq!(breaks.cut(0.25).unwrap(), 0);
        assert_eq!(breaks.cut(0.26).unwrap(), 1);
        assert_eq!(breaks.cut(0.5).unwrap(), 1);
        assert_eq!(breaks.cut(0.51).unwrap(), 2);
        assert_eq!(breaks.cut(0.75).unwrap(), 2);
        assert_eq!(breaks.cut(0.76).unwrap(), 3);
        assert_eq!(breaks.cut(1.0).unwrap(), 3);
    }

    #[test]
    fn cut_is_total_on_the_open_interval() {
        let breaks = Breaks::new([0.0, 0.2, 0.4, 0.8, 1.0]).unwrap();
        // every probability strictly above b0 and up to b4 gets exactly one
        // category, and category boundaries are monotone
        let mut last = 0;
        for i in 1..=1000 {
            let p = i as f64 / 1000.0;
            let c = breaks.cut(p).unwrap();
            assert!(c <= 3);
            assert!(c >= last, "categories must be non-decreasing in p");
            last = c;
        }
        assert_eq!(last, 3);
    }

    #[test]
    fn lowest_bound_is_excluded() {
        let breaks = Breaks::default();
        assert!(matches!(
            breaks.cut(0.0),
            Err(StackError::UndefinedCategory(_))
        ));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let breaks = Breaks::new([0.1, 0.3, 0.5, 0.7, 0.9]).unwrap();
        assert!(breaks.cut(0.05).is_err());
        assert!(breaks.cut(0.95).is_err());
        assert!(breaks.cut(f64::NAN).is_err());
        assert_eq!(breaks.cut(0.9).unwrap(), 3);
    }

    #[test]
    fn non_increasing_points_are_rejected() {
        assert!(Breaks::new([0.0, 0.5, 0.5, 0.75, 1.0]).is_err());
        assert!(Breaks::new([0.0, 0.5, 0.25, 0.75, 1.0]).is_err());
        assert!(Breaks::new([0.0, f64::NAN, 0.5, 0.75, 1.0]).is_err());
    }

    #[test]
    fn serde_round_trip_revalidates() {
        let breaks = Breaks::new([0.0, 0.2, 0.4, 0.6, 1.0]).unwrap();
        let json = serde_json::to_string(&breaks).unwrap();
        let back: Breaks = serde_json::from_str(&json).unwrap();
        assert_eq!(breaks, back);

        let bad: Result<Breaks, _> = serde_json::from_str("[0.0, 0.5, 0.5, 0.75, 1.0]");
        assert!(bad.is_err());
    }
}
