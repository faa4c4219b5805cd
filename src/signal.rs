#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Red,
    Yellow,
    Green,
    Off,
}

impl Signal {
    /// Next signal in the normal cycle. `Off` never cycles; it is only
    /// entered and left by explicit control.
    pub fn next_in_cycle(self) -> Self {
        match self {
            Self::Green => Self::Yellow,
            Self::Yellow => Self::Red,
            Self::Red => Self::Green,
            Self::Off => Self::Off,
        }
    }

    /// Whether this signal grants right of way. The mutual-exclusion
    /// invariant ranges over permissive signals only.
    pub fn is_permissive(self) -> bool {
        matches!(self, Self::Green | Self::Yellow)
    }
}

#[cfg(test)]
mod tests {
    use super::Signal;

    #[test]
    fn cycle_closes_over_three_signals() {
        let mut signal = Signal::Green;
        signal = signal.next_in_cycle();
        assert_eq!(signal, Signal::Yellow);
        signal = signal.next_in_cycle();
        assert_eq!(signal, Signal::Red);
        signal = signal.next_in_cycle();
        assert_eq!(signal, Signal::Green);
    }

    #[test]
    fn off_is_absorbing() {
        assert_eq!(Signal::Off.next_in_cycle(), Signal::Off);
    }

    #[test]
    fn only_green_and_yellow_are_permissive() {
        assert!(Signal::Green.is_permissive());
        assert!(Signal::Yellow.is_permissive());
        assert!(!Signal::Red.is_permissive());
        assert!(!Signal::Off.is_permissive());
    }
}
