//! Sanity checks for the two threshold maps.

use rebalance_core::{ResourceName, ResourceThresholds};
use tracing::info;

/// Low thresholds must name at least one of cpu, memory or pods.
pub fn validate_thresholds(thresholds: &ResourceThresholds) -> bool {
    if thresholds.is_empty() {
        info!("no resource threshold is configured");
        return false;
    }
    if !thresholds.keys().any(ResourceName::is_tracked) {
        info!("one of cpu, memory, or pods resource threshold must be configured");
        return false;
    }
    true
}

/// Target thresholds must include pods: the eviction budget is always
/// partly expressed as a pod count.
pub fn validate_target_thresholds(target_thresholds: &ResourceThresholds) -> bool {
    if target_thresholds.is_empty() {
        info!("no target resource threshold is configured");
        return false;
    }
    if !target_thresholds.contains_key(&ResourceName::Pods) {
        info!("no target resource threshold for pods is configured");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds(entries: &[(&str, f64)]) -> ResourceThresholds {
        entries
            .iter()
            .map(|(k, v)| (ResourceName::from(*k), *v))
            .collect()
    }

    #[test]
    fn empty_low_thresholds_are_invalid() {
        assert!(!validate_thresholds(&ResourceThresholds::new()));
    }

    #[test]
    fn low_thresholds_need_a_tracked_resource() {
        assert!(!validate_thresholds(&thresholds(&[("storage", 10.0)])));
        assert!(validate_thresholds(&thresholds(&[("storage", 10.0), ("memory", 20.0)])));
        assert!(validate_thresholds(&thresholds(&[("pods", 20.0)])));
    }

    #[test]
    fn target_thresholds_need_pods() {
        assert!(!validate_target_thresholds(&ResourceThresholds::new()));
        assert!(!validate_target_thresholds(&thresholds(&[("cpu", 50.0), ("memory", 50.0)])));
        assert!(validate_target_thresholds(&thresholds(&[("pods", 50.0)])));
    }
}
