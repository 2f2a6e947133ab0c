//! Goal progress calculation.
//!
//! Progress is an integer percentage in `[0, 100]`. Goals with a positive
//! target are measured by `current / target`; goals without one are measured
//! by how much of their checklist is done.

/// Percentage of `target_value` reached by `current_value`.
///
/// Returns 0 when there is no positive target.
pub fn calculate_progress(target_value: Option<f64>, current_value: f64) -> i64 {
    match target_value {
        Some(target) if target > 0.0 && target.is_finite() && current_value.is_finite() => {
            let ratio = (current_value / target * 100.0).min(100.0).floor();
            (ratio as i64).clamp(0, 100)
        }
        _ => 0,
    }
}

/// Percentage of checklist items completed
pub fn checklist_progress(completed: usize, total: usize) -> i64 {
    if total == 0 {
        return 0;
    }
    let ratio = (completed as f64 / total as f64 * 100.0).floor() as i64;
    ratio.clamp(0, 100)
}

pub fn is_complete(progress: i64) -> bool {
    progress >= 100
}

/// True when the target ratio, not the checklist, drives this goal's progress
pub fn has_measurable_target(target_value: Option<f64>) -> bool {
    matches!(target_value, Some(t) if t > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_from_target() {
        assert_eq!(calculate_progress(Some(200.0), 50.0), 25);
        assert_eq!(calculate_progress(Some(200.0), 200.0), 100);
        assert_eq!(calculate_progress(Some(3.0), 1.0), 33);
        assert_eq!(calculate_progress(Some(10.0), 9.99), 99);
    }

    #[test]
    fn test_progress_is_capped_and_floored() {
        assert_eq!(calculate_progress(Some(100.0), 250.0), 100);
        assert_eq!(calculate_progress(Some(100.0), -5.0), 0);
    }

    #[test]
    fn test_progress_without_positive_target_is_zero() {
        for current in [0.0, 1.0, 1_000_000.0, -3.0] {
            assert_eq!(calculate_progress(None, current), 0);
            assert_eq!(calculate_progress(Some(0.0), current), 0);
            assert_eq!(calculate_progress(Some(-10.0), current), 0);
        }
    }

    #[test]
    fn test_progress_always_in_range() {
        let targets = [0.5, 1.0, 7.0, 99.0, 1000.0];
        let currents = [0.0, 0.1, 3.0, 50.0, 999.0, 1e9];
        for t in targets {
            for c in currents {
                let p = calculate_progress(Some(t), c);
                assert!((0..=100).contains(&p), "target {} current {} gave {}", t, c, p);
                let expected = ((c / t * 100.0).floor() as i64).min(100);
                assert_eq!(p, expected);
            }
        }
    }

    #[test]
    fn test_checklist_progress() {
        assert_eq!(checklist_progress(0, 0), 0);
        assert_eq!(checklist_progress(1, 3), 33);
        assert_eq!(checklist_progress(3, 3), 100);
        assert!(is_complete(checklist_progress(4, 4)));
        assert!(!is_complete(99));
    }

    #[test]
    fn test_measurable_target() {
        assert!(has_measurable_target(Some(1.0)));
        assert!(!has_measurable_target(Some(0.0)));
        assert!(!has_measurable_target(None));
    }
}
