//! Line-derivation policies.
//!
//! The source hardware exposes two output lines per head (red and green, no
//! dedicated yellow line), so how yellow is rendered depends on the wiring.
//! The derivation is a swappable policy rather than a hard-coded branch.

use embedded_hal::digital::PinState;

use crate::Signal;

/// Target levels for the two lines of one light head.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLevels {
    pub red: PinState,
    pub green: PinState,
}

impl LineLevels {
    pub const fn new(red: PinState, green: PinState) -> Self {
        Self { red, green }
    }
}

/// Maps a signal to the levels of the red and green lines.
pub trait LinePolicy {
    fn levels(&self, signal: Signal) -> LineLevels;
}

/// Yellow synthesized by driving both lines at once (bicolor LED heads).
pub struct YellowBothLines;

impl LinePolicy for YellowBothLines {
    fn levels(&self, signal: Signal) -> LineLevels {
        match signal {
            Signal::Red => LineLevels::new(PinState::High, PinState::Low),
            Signal::Yellow => LineLevels::new(PinState::High, PinState::High),
            Signal::Green => LineLevels::new(PinState::Low, PinState::High),
            Signal::Off => LineLevels::new(PinState::Low, PinState::Low),
        }
    }
}

/// Yellow shown as red, for rigs where driving both lines is not valid.
pub struct YellowAsRed;

impl LinePolicy for YellowAsRed {
    fn levels(&self, signal: Signal) -> LineLevels {
        match signal {
            Signal::Yellow => LineLevels::new(PinState::High, PinState::Low),
            other => YellowBothLines.levels(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_lines_policy_matches_wiring_table() {
        let policy = YellowBothLines;
        assert_eq!(
            policy.levels(Signal::Red),
            LineLevels::new(PinState::High, PinState::Low)
        );
        assert_eq!(
            policy.levels(Signal::Green),
            LineLevels::new(PinState::Low, PinState::High)
        );
        assert_eq!(
            policy.levels(Signal::Yellow),
            LineLevels::new(PinState::High, PinState::High)
        );
        assert_eq!(
            policy.levels(Signal::Off),
            LineLevels::new(PinState::Low, PinState::Low)
        );
    }

    #[test]
    fn red_fallback_policy_differs_only_for_yellow() {
        let fallback = YellowAsRed;
        assert_eq!(
            fallback.levels(Signal::Yellow),
            LineLevels::new(PinState::High, PinState::Low)
        );
        for signal in [Signal::Red, Signal::Green, Signal::Off] {
            assert_eq!(fallback.levels(signal), YellowBothLines.levels(signal));
        }
    }
}
