//! Patience-based early stopping on a validation metric

use serde::{Deserialize, Serialize};

/// Tracks the best value of a lower-is-better metric and signals a stop
/// once `patience` consecutive rounds pass without improvement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarlyStopping {
    patience: usize,
    best_value: Option<f64>,
    best_round: usize,
    rounds_seen: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_value: None,
            best_round: 0,
            rounds_seen: 0,
        }
    }

    /// Record the metric of the next round; `true` means training should halt
    pub fn update(&mut self, value: f64) -> bool {
        let improved = self.best_value.map_or(true, |best| value < best);
        if improved {
            self.best_value = Some(value);
            self.best_round = self.rounds_seen;
        }
        self.rounds_seen += 1;
        self.rounds_seen - 1 - self.best_round >= self.patience
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    /// Zero-based index of the best round
    pub fn best_round(&self) -> usize {
        self.best_round
    }

    pub fn rounds_seen(&self) -> usize {
        self.rounds_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_going_while_improving() {
        let mut es = EarlyStopping::new(2);
        for v in [1.0, 0.9, 0.8, 0.7] {
            assert!(!es.update(v));
        }
        assert_eq!(es.best_round(), 3);
        assert_eq!(es.best_value(), Some(0.7));
    }

    #[test]
    fn test_stops_after_patience_rounds_without_improvement() {
        let mut es = EarlyStopping::new(2);
        assert!(!es.update(0.5));
        assert!(!es.update(0.6));
        assert!(es.update(0.6));
        assert_eq!(es.best_round(), 0);
        assert_eq!(es.rounds_seen(), 3);
    }

    #[test]
    fn test_equal_value_is_not_an_improvement() {
        let mut es = EarlyStopping::new(1);
        assert!(!es.update(0.5));
        assert!(es.update(0.5));
    }

    #[test]
    fn test_improvement_resets_the_window() {
        let mut es = EarlyStopping::new(2);
        assert!(!es.update(1.0));
        assert!(!es.update(1.1));
        assert!(!es.update(0.9));
        assert!(!es.update(1.0));
        assert!(es.update(1.0));
        assert_eq!(es.best_round(), 2);
    }
}
