use std::collections::{HashSet, VecDeque};

use crate::config::MonitorConfig;
use crate::types::{MonitoringReport, TrackedWallet};

/// Bounded, insertion-ordered set of processed transaction signatures.
///
/// Membership stops a signature from ever being re-fetched or re-logged.
/// Once the set grows past `cap` it is trimmed to the most recent `keep`
/// entries, oldest first, so memory stays flat across an unbounded run.
pub struct SeenSignatures {
    order: VecDeque<String>,
    set: HashSet<String>,
    cap: usize,
    keep: usize,
}

impl SeenSignatures {
    pub fn new(cap: usize, keep: usize) -> Self {
        Self {
            order: VecDeque::new(),
            set: HashSet::new(),
            cap,
            keep: keep.min(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.set.contains(signature)
    }

    /// Record a signature. Returns `true` when it was not seen before.
    pub fn insert(&mut self, signature: &str) -> bool {
        if !self.set.insert(signature.to_string()) {
            return false;
        }
        self.order.push_back(signature.to_string());
        if self.order.len() > self.cap {
            self.trim();
        }
        true
    }

    fn trim(&mut self) {
        while self.order.len() > self.keep {
            if let Some(old) = self.order.pop_front() {
                self.set.remove(&old);
            }
        }
    }
}

/// Run-scoped monitoring bookkeeping: the dedup set plus counters for the
/// shutdown report.
pub struct MonitorState {
    pub seen: SeenSignatures,
    pub cycles_completed: u64,
    pub trades_detected: u64,
}

impl MonitorState {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            seen: SeenSignatures::new(config.processed_cap, config.processed_keep),
            cycles_completed: 0,
            trades_detected: 0,
        }
    }

    pub fn report(
        &self,
        wallets: &[TrackedWallet],
        config: &MonitorConfig,
    ) -> MonitoringReport {
        MonitoringReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            monitored_wallets: wallets.to_vec(),
            processed_signatures: self.seen.len(),
            cycles_completed: self.cycles_completed,
            trades_detected: self.trades_detected,
            monitoring_interval_secs: config.cycle_interval_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_reports_novelty() {
        let mut seen = SeenSignatures::new(10, 5);
        assert!(seen.insert("sig1"));
        assert!(!seen.insert("sig1"));
        assert!(seen.contains("sig1"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn duplicate_never_reappears_across_cycles() {
        let mut seen = SeenSignatures::new(10, 5);
        seen.insert("sig1");
        for _ in 0..3 {
            // Later cycles fetch the same batch again.
            assert!(!seen.insert("sig1"));
        }
    }

    #[test]
    fn trims_to_most_recent_keep_when_cap_exceeded() {
        let mut seen = SeenSignatures::new(1000, 500);
        for i in 0..1001 {
            seen.insert(&format!("sig{i}"));
        }
        assert_eq!(seen.len(), 500);
        // Most recent survives, oldest are gone.
        assert!(seen.contains("sig1000"));
        assert!(seen.contains("sig501"));
        assert!(!seen.contains("sig500"));
        assert!(!seen.contains("sig0"));
    }

    #[test]
    fn trimmed_signatures_can_be_reinserted() {
        let mut seen = SeenSignatures::new(4, 2);
        for i in 0..5 {
            seen.insert(&format!("sig{i}"));
        }
        assert!(!seen.contains("sig0"));
        // Eviction forgets the signature entirely; a re-fetch would re-log it,
        // which is the accepted cost of bounded memory.
        assert!(seen.insert("sig0"));
    }

    #[test]
    fn keep_larger_than_cap_is_clamped() {
        let mut seen = SeenSignatures::new(3, 10);
        for i in 0..10 {
            seen.insert(&format!("sig{i}"));
        }
        assert!(seen.len() <= 3);
        assert!(seen.contains("sig9"));
    }

    #[test]
    fn state_report_carries_counters() {
        let config = MonitorConfig::default();
        let mut state = MonitorState::new(&config);
        state.seen.insert("sig1");
        state.cycles_completed = 4;
        state.trades_detected = 2;
        let wallets = vec![TrackedWallet::new("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU")];
        let report = state.report(&wallets, &config);
        assert_eq!(report.processed_signatures, 1);
        assert_eq!(report.cycles_completed, 4);
        assert_eq!(report.trades_detected, 2);
        assert_eq!(report.monitored_wallets.len(), 1);
        assert_eq!(report.monitoring_interval_secs, 60);
    }
}
