//! Static binding from logical light index to physical output lines.

use embedded_hal::digital::{OutputPin, PinState};

use crate::{Error, LineLevels};

/// Physical line identifier, as printed on the board. Only used to detect
/// wiring mistakes and to tag diagnostics; actuation goes through the owned
/// pin objects.
pub type LineId = u8;

/// The two output lines implementing one light head.
pub struct PinEntry<P> {
    red_id: LineId,
    green_id: LineId,
    red: P,
    green: P,
}

impl<P: OutputPin> PinEntry<P> {
    pub fn new(red_id: LineId, red: P, green_id: LineId, green: P) -> Self {
        Self {
            red_id,
            green_id,
            red,
            green,
        }
    }

    pub fn red_id(&self) -> LineId {
        self.red_id
    }

    pub fn green_id(&self) -> LineId {
        self.green_id
    }

    /// Writes both lines, treating the pair as one actuation. Lines going
    /// low are written before lines going high, so no intermediate level
    /// pair is brighter than the target.
    pub(crate) fn apply(&mut self, levels: LineLevels) -> Result<(), P::Error> {
        if levels.red == PinState::Low {
            self.red.set_low()?;
        }
        if levels.green == PinState::Low {
            self.green.set_low()?;
        }
        if levels.red == PinState::High {
            self.red.set_high()?;
        }
        if levels.green == PinState::High {
            self.green.set_high()?;
        }
        Ok(())
    }

    /// Like `apply`, but drives each line independently so one broken line
    /// cannot leave the other lit. Same low-before-high order; returns the
    /// first error after attempting every line. Used on fault and shutdown
    /// paths.
    pub(crate) fn apply_each(&mut self, levels: LineLevels) -> Result<(), P::Error> {
        let mut first_err = None;
        for target in [PinState::Low, PinState::High] {
            if levels.red == target {
                if let Err(err) = self.red.set_state(target) {
                    first_err.get_or_insert(err);
                }
            }
            if levels.green == target {
                if let Err(err) = self.green.set_state(target) {
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

/// Immutable association from light index to its output lines. Coverage of
/// `0..N` is guaranteed by construction; line uniqueness is validated.
pub struct PinMap<P, const N: usize> {
    entries: [PinEntry<P>; N],
}

impl<P: OutputPin, const N: usize> PinMap<P, N> {
    pub fn new(entries: [PinEntry<P>; N]) -> Result<Self, Error<P::Error>> {
        for i in 0..N {
            let entry = &entries[i];
            if entry.red_id == entry.green_id {
                return Err(Error::DuplicatePin(entry.red_id));
            }
            for other in &entries[i + 1..] {
                for id in [entry.red_id, entry.green_id] {
                    if id == other.red_id || id == other.green_id {
                        return Err(Error::DuplicatePin(id));
                    }
                }
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn entry_mut(&mut self, light: usize) -> Option<&mut PinEntry<P>> {
        self.entries.get_mut(light)
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}
