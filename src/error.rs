use core::fmt;

use crate::pins::LineId;
use crate::ConflictGroup;

/// Error type for controller operations, generic over the HAL pin error.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// Light index outside the configured set.
    NoSuchLight(usize),
    /// A physical line is bound to more than one color or light.
    DuplicatePin(LineId),
    /// A conflict group names a light index outside the configured set.
    InvalidGroup(ConflictGroup),
    /// Operation requires `set_initial_state` to have run first.
    NotLive,
    /// `set_initial_state` called on a live controller.
    AlreadyLive,
    /// The initial assignment would put two conflicting lights in a
    /// permissive signal.
    UnsafeAssignment(usize),
    /// The requested transition would violate a conflict group.
    PolicyViolation(usize),
    /// A pin write failed; the light has been forced to fail-safe.
    Hardware { light: usize, source: E },
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoSuchLight(light) => write!(f, "no light with index {}", light),
            Error::DuplicatePin(id) => write!(f, "line {} bound more than once", id),
            Error::InvalidGroup(group) => {
                write!(f, "conflict group {:#b} names an unknown light", group)
            }
            Error::NotLive => write!(f, "controller has no initial state yet"),
            Error::AlreadyLive => write!(f, "initial state already set"),
            Error::UnsafeAssignment(light) => {
                write!(f, "initial assignment conflicts at light {}", light)
            }
            Error::PolicyViolation(light) => {
                write!(f, "transition of light {} violates a conflict group", light)
            }
            Error::Hardware { light, source } => {
                write!(f, "pin write failed on light {}: {:?}", light, source)
            }
        }
    }
}
