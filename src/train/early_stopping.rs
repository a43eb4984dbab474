//! Early stopping on the monitored validation metric
//!
//! A two-state machine: `Training` until the metric fails to improve for
//! `patience` consecutive observed epochs, then `Stopped` forever. Epochs
//! below `min_epochs` are ignored entirely. The improvement direction is an
//! explicit property of the monitored metric, never inferred.

use serde::{Deserialize, Serialize};

use crate::config::{Direction, EarlyStopSection};

/// Monitor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    /// Observations are being evaluated
    Training,
    /// Terminal; further observations are no-ops
    Stopped,
}

/// Outcome of one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// The observed value improved on the best so far
    pub improved: bool,
    /// The monitor is (now) in the terminal state
    pub stopped: bool,
}

/// Improvement-tracking state machine, serialized into every checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyStoppingMonitor {
    metric: String,
    direction: Direction,
    patience: usize,
    min_epochs: usize,
    best_value: Option<f64>,
    epochs_since_improvement: usize,
    state: MonitorState,
}

impl EarlyStoppingMonitor {
    pub fn new(metric: impl Into<String>, direction: Direction, patience: usize, min_epochs: usize) -> Self {
        Self {
            metric: metric.into(),
            direction,
            patience,
            min_epochs,
            best_value: None,
            epochs_since_improvement: 0,
            state: MonitorState::Training,
        }
    }

    pub fn from_config(section: &EarlyStopSection) -> Self {
        Self::new(
            section.monitor.clone(),
            section.direction,
            section.patience,
            section.min_epochs,
        )
    }

    /// Feed one epoch's metric value
    ///
    /// Below `min_epochs` this is a no-op; once `Stopped`, every call is a
    /// no-op reporting `stopped: true`.
    pub fn observe(&mut self, epoch: usize, value: f64) -> Verdict {
        if self.state == MonitorState::Stopped {
            return Verdict { improved: false, stopped: true };
        }
        if epoch < self.min_epochs {
            return Verdict { improved: false, stopped: false };
        }

        let best = self.best_value.unwrap_or_else(|| self.direction.worst());
        if self.direction.improves(value, best) {
            self.best_value = Some(value);
            self.epochs_since_improvement = 0;
            return Verdict { improved: true, stopped: false };
        }

        self.epochs_since_improvement += 1;
        if self.epochs_since_improvement >= self.patience {
            self.state = MonitorState::Stopped;
        }
        Verdict { improved: false, stopped: self.state == MonitorState::Stopped }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stopped(&self) -> bool {
        self.state == MonitorState::Stopped
    }

    pub fn best_value(&self) -> Option<f64> {
        self.best_value
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn patience(&self) -> usize {
        self.patience
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor(patience: usize, min_epochs: usize) -> EarlyStoppingMonitor {
        EarlyStoppingMonitor::new("seg_loss", Direction::Min, patience, min_epochs)
    }

    #[test]
    fn test_flat_metric_stops_at_min_epochs_plus_patience() {
        // Scenario: min_epochs=15, patience=10, flat from epoch 15 onward
        let mut m = monitor(10, 15);
        for epoch in 0..25 {
            let v = m.observe(epoch, 1.0);
            assert!(!v.stopped, "stopped early at epoch {epoch}");
        }
        let v = m.observe(25, 1.0);
        assert!(v.stopped);
        assert_eq!(m.state(), MonitorState::Stopped);
    }

    #[test]
    fn test_observations_below_min_epochs_are_ignored() {
        let mut m = monitor(2, 5);
        // Improving values below min_epochs must not seed best_value
        for epoch in 0..5 {
            m.observe(epoch, 0.1);
        }
        assert_eq!(m.best_value(), None);
        // First counted epoch establishes the best even with a worse value
        let v = m.observe(5, 10.0);
        assert!(v.improved);
        assert_eq!(m.best_value(), Some(10.0));
    }

    #[test]
    fn test_improvement_resets_the_counter() {
        let mut m = monitor(3, 0);
        m.observe(0, 1.0);
        m.observe(1, 1.0);
        m.observe(2, 1.0);
        // One step from stopping; an improvement resets
        let v = m.observe(3, 0.5);
        assert!(v.improved);
        for epoch in 4..6 {
            assert!(!m.observe(epoch, 0.5).stopped);
        }
        assert!(m.observe(6, 0.5).stopped);
    }

    #[test]
    fn test_direction_max_improves_upward() {
        let mut m = EarlyStoppingMonitor::new("seg_loss", Direction::Max, 2, 0);
        assert!(m.observe(0, 0.5).improved);
        assert!(m.observe(1, 0.7).improved);
        assert!(!m.observe(2, 0.6).improved);
    }

    #[test]
    fn test_stopped_is_terminal_and_idempotent() {
        let mut m = monitor(1, 0);
        m.observe(0, 1.0);
        assert!(m.observe(1, 1.0).stopped);
        let snapshot = m.clone();
        // A huge improvement after stop changes nothing
        let v = m.observe(2, 0.0);
        assert!(v.stopped);
        assert!(!v.improved);
        assert_eq!(m, snapshot);
    }

    #[test]
    fn test_equal_value_is_not_improvement() {
        let mut m = monitor(2, 0);
        m.observe(0, 1.0);
        assert!(!m.observe(1, 1.0).improved);
    }

    #[test]
    fn test_serde_roundtrip_preserves_state() {
        let mut m = monitor(5, 2);
        for epoch in 0..6 {
            m.observe(epoch, 1.0 - epoch as f64 * 0.01);
        }
        let json = serde_json::to_string(&m).unwrap();
        let back: EarlyStoppingMonitor = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
