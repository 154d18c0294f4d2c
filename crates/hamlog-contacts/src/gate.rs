//! Error-rate gate between validation and the expensive stages.

pub const DEFAULT_MAX_INVALID_PERCENT: u64 = 10;

/// Gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateVerdict {
    Proceed,
    Abort { invalid: u64, valid: u64 },
}

impl GateVerdict {
    pub fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

/// Proceed iff `invalid < max_invalid_percent% of valid`.
///
/// Integer-only: `invalid * 100 < max_invalid_percent * valid`. With no
/// valid tokens the gate always aborts.
pub fn check_gate(valid: u64, invalid: u64, max_invalid_percent: u64) -> GateVerdict {
    let lhs = u128::from(invalid) * 100;
    let rhs = u128::from(max_invalid_percent) * u128::from(valid);
    if lhs < rhs {
        GateVerdict::Proceed
    } else {
        GateVerdict::Abort { invalid, valid }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_proceeds() {
        assert_eq!(check_gate(100, 9, 10), GateVerdict::Proceed);
        assert_eq!(check_gate(100, 0, 10), GateVerdict::Proceed);
    }

    #[test]
    fn above_threshold_aborts() {
        assert_eq!(
            check_gate(100, 11, 10),
            GateVerdict::Abort {
                invalid: 11,
                valid: 100
            }
        );
    }

    #[test]
    fn exactly_at_threshold_aborts() {
        assert!(!check_gate(100, 10, 10).is_proceed());
    }

    #[test]
    fn no_valid_tokens_aborts() {
        assert!(!check_gate(0, 0, 10).is_proceed());
    }

    #[test]
    fn custom_percent() {
        assert!(check_gate(10, 4, 50).is_proceed());
        assert!(!check_gate(10, 5, 50).is_proceed());
    }

    #[test]
    fn large_counts_do_not_overflow() {
        assert!(check_gate(u64::MAX, u64::MAX / 20, 10).is_proceed());
    }
}
