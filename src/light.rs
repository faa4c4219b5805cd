use embassy_time::Instant;

use crate::Signal;

/// Per-light health, observable by external monitoring.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightStatus {
    Ok,
    /// A pin write failed; the light sits in its fail-safe signal and is no
    /// longer cycled.
    Faulted,
}

/// Runtime record of one light. Owned and mutated only by the controller.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Light {
    pub(crate) signal: Signal,
    pub(crate) since: Instant,
    pub(crate) status: LightStatus,
}

impl Light {
    pub(crate) fn new() -> Self {
        Self {
            signal: Signal::Off,
            since: Instant::from_ticks(0),
            status: LightStatus::Ok,
        }
    }
}
