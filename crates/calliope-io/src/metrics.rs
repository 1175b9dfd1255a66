//! Binary confusion counts and precision/recall/F1 for one code.

use std::fmt;

/// Confusion counts for a single binary code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct BinaryConfusion {
    /// Predicted positive, gold positive.
    pub true_positive: usize,
    /// Predicted positive, gold negative.
    pub false_positive: usize,
    /// Predicted negative, gold positive.
    pub false_negative: usize,
    /// Predicted negative, gold negative.
    pub true_negative: usize,
}

impl BinaryConfusion {
    /// Count outcomes over aligned prediction and gold vectors.
    ///
    /// Pairs beyond the shorter input are ignored.
    #[must_use]
    pub fn from_pairs(predicted: &[bool], gold: &[bool]) -> Self {
        let mut cm = Self::default();
        for (&p, &g) in predicted.iter().zip(gold) {
            match (p, g) {
                (true, true) => cm.true_positive += 1,
                (true, false) => cm.false_positive += 1,
                (false, true) => cm.false_negative += 1,
                (false, false) => cm.true_negative += 1,
            }
        }
        cm
    }

    /// Total number of pairs.
    #[must_use]
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    /// Pairs where prediction equals gold.
    #[must_use]
    pub fn matches(&self) -> usize {
        self.true_positive + self.true_negative
    }

    /// Gold positives.
    #[must_use]
    pub fn support(&self) -> usize {
        self.true_positive + self.false_negative
    }

    /// TP / (TP + FP). 0.0 if nothing was predicted positive.
    #[must_use]
    pub fn precision(&self) -> f64 {
        let predicted = self.true_positive + self.false_positive;
        if predicted == 0 {
            0.0
        } else {
            self.true_positive as f64 / predicted as f64
        }
    }

    /// TP / (TP + FN). 0.0 if there are no gold positives.
    #[must_use]
    pub fn recall(&self) -> f64 {
        let support = self.support();
        if support == 0 {
            0.0
        } else {
            self.true_positive as f64 / support as f64
        }
    }

    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

impl fmt::Display for BinaryConfusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>9} {:>7} {:>7}", "", "pred_1", "pred_0")?;
        writeln!(
            f,
            "{:>9} {:>7} {:>7}",
            "gold_1", self.true_positive, self.false_negative
        )?;
        writeln!(
            f,
            "{:>9} {:>7} {:>7}",
            "gold_0", self.false_positive, self.true_negative
        )
    }
}
