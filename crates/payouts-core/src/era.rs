//! Era window arithmetic.

use payouts_types::{EraIndex, EraWindow};

use crate::ConfigError;

/// Number of eras checked before the most recent one.
pub const DEFAULT_ERA_DEPTH: i64 = 0;

/// Number of newest eras skipped. 1 skips the era still in progress.
pub const DEFAULT_ERA_STOP: i64 = 1;

/// Reject negative offsets.
///
/// # Errors
///
/// - [`ConfigError::NegativeDepth`] if `depth < 0`
/// - [`ConfigError::NegativeStop`] if `stop < 0`
pub fn check_offsets(depth: i64, stop: i64) -> Result<(), ConfigError> {
    if depth < 0 {
        return Err(ConfigError::NegativeDepth(depth));
    }
    if stop < 0 {
        return Err(ConfigError::NegativeStop(stop));
    }
    Ok(())
}

/// Eras to check given the active era and the configured offsets.
///
/// The newest era checked is `current - stop`; `depth` more eras before it
/// are included, so the window is `[current - stop - depth, current - stop + 1)`.
/// A start below era 0 is clamped to 0. If `stop` reaches past era 0 the
/// window is empty.
///
/// # Errors
///
/// Returns [`ConfigError`] if `depth` or `stop` is negative.
pub fn compute_window(current: EraIndex, depth: i64, stop: i64) -> Result<EraWindow, ConfigError> {
    check_offsets(depth, stop)?;

    let last = i64::from(current).saturating_sub(stop);
    if last < 0 {
        return Ok(EraWindow::empty_at(0));
    }
    let start = last.saturating_sub(depth).max(0);

    // 0 <= start <= last <= current, so both fit back into an era index.
    let start = EraIndex::try_from(start).unwrap_or(0);
    let end = EraIndex::try_from(last)
        .unwrap_or(current)
        .saturating_add(1);
    Ok(EraWindow::new(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_check_last_completed_era() {
        let window =
            compute_window(100, DEFAULT_ERA_DEPTH, DEFAULT_ERA_STOP).expect("window");
        assert_eq!((window.start(), window.end()), (99, 100));
        assert_eq!(window.eras().collect::<Vec<_>>(), vec![99]);
    }

    #[test]
    fn test_depth_extends_backwards() {
        let window = compute_window(100, 3, 1).expect("window");
        assert_eq!(window.eras().collect::<Vec<_>>(), vec![96, 97, 98, 99]);
    }

    #[test]
    fn test_stop_zero_includes_current() {
        let window = compute_window(100, 0, 0).expect("window");
        assert!(window.contains(100));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn test_oversized_depth_clamps_to_zero() {
        let window = compute_window(5, 84, 1).expect("window");
        assert_eq!((window.start(), window.end()), (0, 5));
    }

    #[test]
    fn test_oversized_stop_is_empty() {
        let window = compute_window(2, 0, 10).expect("window");
        assert!(window.is_empty());
        assert_eq!(window.start(), window.end());
    }

    #[test]
    fn test_extreme_offsets_do_not_overflow() {
        let window = compute_window(EraIndex::MAX, i64::MAX, 0).expect("window");
        assert_eq!(window.start(), 0);
        assert!(compute_window(0, i64::MAX, i64::MAX)
            .expect("window")
            .is_empty());
    }

    #[test]
    fn test_window_is_ordered_for_all_inputs() {
        for current in [0u32, 1, 2, 50, 100] {
            for depth in 0..8 {
                for stop in 0..8 {
                    let w = compute_window(current, depth, stop).expect("window");
                    assert!(w.start() <= w.end());
                    assert!(w.end() <= current.saturating_add(1));
                }
            }
        }
    }

    #[test]
    fn test_negative_offsets_rejected() {
        assert_eq!(
            compute_window(100, -1, 1),
            Err(ConfigError::NegativeDepth(-1))
        );
        assert_eq!(
            compute_window(100, 0, -2),
            Err(ConfigError::NegativeStop(-2))
        );
    }
}
