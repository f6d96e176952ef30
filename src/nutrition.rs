//! Nutrition adherence scoring
//!
//! Adherence is a small additive bonus, not a blended sub-score: landing
//! within ±20% of the daily calorie target earns a flat +5 on top of the
//! readiness blend. An athlete with nothing logged earns nothing; absence
//! of data is not adherence.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback daily calorie target when no plan (or an unparsable one) exists
pub const DEFAULT_TARGET_CALORIES: u32 = 2500;

/// Bonus points for logging within the adherence window
pub const ADHERENCE_BONUS: u8 = 5;

/// Adherence window around the target, as ratios of logged / target
pub const ADHERENCE_WINDOW: (f64, f64) = (0.8, 1.2);

/// Sum today's logged calories
pub fn total_logged(calories: &[u32]) -> u32 {
    calories.iter().copied().sum()
}

/// Adherence bonus for today's logged calories against a plan target
///
/// Returns `ADHERENCE_BONUS` when something was logged and the total falls
/// within [0.8, 1.2] × target; 0 otherwise. A missing target falls back to
/// `DEFAULT_TARGET_CALORIES`.
pub fn adherence_bonus(logged: &[u32], target: Option<u32>) -> u8 {
    let total = total_logged(logged);
    if total == 0 {
        return 0;
    }

    let target = target.unwrap_or(DEFAULT_TARGET_CALORIES);
    if target == 0 {
        return 0;
    }

    let ratio = f64::from(total) / f64::from(target);
    let (low, high) = ADHERENCE_WINDOW;
    if ratio >= low && ratio <= high {
        ADHERENCE_BONUS
    } else {
        0
    }
}

/// Display banding for today's intake against the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdherenceBand {
    /// Within the ±20% window
    OnTarget,
    /// Below 80% of target
    Under,
    /// Above 120% of target
    Over,
    /// Nothing logged today
    NotLogged,
}

impl AdherenceBand {
    /// Band logged calories against a target
    pub fn from_logged(logged: &[u32], target: Option<u32>) -> Self {
        let total = total_logged(logged);
        if total == 0 {
            return AdherenceBand::NotLogged;
        }

        let target = target.unwrap_or(DEFAULT_TARGET_CALORIES);
        if target == 0 {
            return AdherenceBand::NotLogged;
        }

        let ratio = f64::from(total) / f64::from(target);
        let (low, high) = ADHERENCE_WINDOW;
        if ratio < low {
            AdherenceBand::Under
        } else if ratio > high {
            AdherenceBand::Over
        } else {
            AdherenceBand::OnTarget
        }
    }
}

impl fmt::Display for AdherenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdherenceBand::OnTarget => write!(f, "On Target"),
            AdherenceBand::Under => write!(f, "Under"),
            AdherenceBand::Over => write!(f, "Over"),
            AdherenceBand::NotLogged => write!(f, "Not Logged"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_logged_no_bonus() {
        assert_eq!(adherence_bonus(&[], Some(2500)), 0);
        assert_eq!(adherence_bonus(&[0, 0], Some(2500)), 0);
    }

    #[test]
    fn test_on_target_earns_bonus() {
        assert_eq!(adherence_bonus(&[800, 700, 900], Some(2500)), 5); // 2400 / 2500 = 0.96
    }

    #[test]
    fn test_window_boundaries() {
        assert_eq!(adherence_bonus(&[2000], Some(2500)), 5); // exactly 0.8
        assert_eq!(adherence_bonus(&[3000], Some(2500)), 5); // exactly 1.2
        assert_eq!(adherence_bonus(&[1999], Some(2500)), 0);
        assert_eq!(adherence_bonus(&[3001], Some(2500)), 0);
    }

    #[test]
    fn test_default_target() {
        // 2400 / 2500 default = 0.96
        assert_eq!(adherence_bonus(&[2400], None), 5);
        // 1500 / 2500 default = 0.6
        assert_eq!(adherence_bonus(&[1500], None), 0);
    }

    #[test]
    fn test_zero_target_no_bonus() {
        assert_eq!(adherence_bonus(&[2400], Some(0)), 0);
    }

    #[test]
    fn test_banding() {
        assert_eq!(AdherenceBand::from_logged(&[], Some(2500)), AdherenceBand::NotLogged);
        assert_eq!(AdherenceBand::from_logged(&[1000], Some(2500)), AdherenceBand::Under);
        assert_eq!(AdherenceBand::from_logged(&[2400], Some(2500)), AdherenceBand::OnTarget);
        assert_eq!(AdherenceBand::from_logged(&[4000], Some(2500)), AdherenceBand::Over);
    }

    #[test]
    fn test_band_display() {
        assert_eq!(format!("{}", AdherenceBand::OnTarget), "On Target");
        assert_eq!(format!("{}", AdherenceBand::NotLogged), "Not Logged");
    }
}
