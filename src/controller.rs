use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;

use crate::light::Light;
use crate::{Error, LightStatus, LinePolicy, PinMap, Signal, MAX_LIGHTS};

/// Bitmask of light indices that must never be simultaneously permissive.
pub type ConflictGroup = u32;

/// Builds a conflict group from a list of light indices.
///
/// Panics if an index cannot be represented in the mask; in const context
/// that is a compile error.
pub const fn conflict_group(lights: &[usize]) -> ConflictGroup {
    let mut mask = 0;
    let mut i = 0;
    while i < lights.len() {
        assert!(
            lights[i] < MAX_LIGHTS,
            "light index out of range for a conflict group"
        );
        mask |= 1 << lights[i];
        i += 1;
    }
    mask
}

fn group_contains(group: ConflictGroup, light: usize) -> bool {
    light < MAX_LIGHTS && group & (1 << light) != 0
}

/// Dwell durations for the cycling signals, plus the all-red overlap a light
/// must observe on its conflicting peers before it may turn green.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    pub green: Duration,
    pub yellow: Duration,
    pub red: Duration,
    pub all_red: Duration,
}

impl Timings {
    pub const fn new(green: Duration, yellow: Duration, red: Duration, all_red: Duration) -> Self {
        Self {
            green,
            yellow,
            red,
            all_red,
        }
    }

    /// Minimum time in state before a light is eligible to advance. `Off`
    /// has no dwell; it never advances by cycling.
    fn dwell(&self, signal: Signal) -> Option<Duration> {
        match signal {
            Signal::Green => Some(self.green),
            Signal::Yellow => Some(self.yellow),
            Signal::Red => Some(self.red),
            Signal::Off => None,
        }
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(30),
            Duration::from_secs(5),
            Duration::from_secs(30),
            Duration::from_secs(2),
        )
    }
}

/// Drives a fixed set of lights through the signal cycle and enforces the
/// mutual-exclusion invariant across conflict groups.
///
/// The controller owns the pins outright; nothing else may write them. It
/// never reads the clock itself: the external periodic scheduler passes
/// `now` into every call.
pub struct Controller<'c, P, PL, const N: usize> {
    pins: PinMap<P, N>,
    policy: PL,
    timings: Timings,
    groups: &'c [ConflictGroup],
    lights: [Light; N],
    live: bool,
}

impl<'c, P: OutputPin, PL: LinePolicy, const N: usize> Controller<'c, P, PL, N> {
    /// Validates the conflict groups and builds the controller. No hardware
    /// is touched; every light stays unset until `set_initial_state`.
    pub fn new(
        pins: PinMap<P, N>,
        policy: PL,
        timings: Timings,
        groups: &'c [ConflictGroup],
    ) -> Result<Self, Error<P::Error>> {
        let addressable: ConflictGroup = if N >= MAX_LIGHTS {
            ConflictGroup::MAX
        } else {
            (1 << N) - 1
        };
        for &group in groups {
            if group & !addressable != 0 {
                return Err(Error::InvalidGroup(group));
            }
        }
        Ok(Self {
            pins,
            policy,
            timings,
            groups,
            lights: [Light::new(); N],
            live: false,
        })
    }

    /// Applies an explicit signal to every light, without dwell logic, and
    /// makes the controller live. The array makes the assignment total by
    /// construction; an assignment that violates a conflict group is
    /// rejected before anything is written.
    pub fn set_initial_state(
        &mut self,
        states: [Signal; N],
        now: Instant,
    ) -> Result<(), Error<P::Error>> {
        if self.live {
            return Err(Error::AlreadyLive);
        }
        for &group in self.groups {
            let mut claimed = false;
            for (light, state) in states.iter().enumerate() {
                if group_contains(group, light) && state.is_permissive() {
                    if claimed {
                        return Err(Error::UnsafeAssignment(light));
                    }
                    claimed = true;
                }
            }
        }

        self.live = true;
        let mut first_fault = None;
        for (light, &state) in states.iter().enumerate() {
            // A fault cascade from an earlier light may already have forced
            // this one to fail-safe; its assignment no longer applies.
            if self.lights[light].status == LightStatus::Faulted {
                continue;
            }
            match self.write_lines(light, state) {
                Ok(()) => {
                    self.lights[light] = Light {
                        signal: state,
                        since: now,
                        status: LightStatus::Ok,
                    };
                }
                Err(err) => {
                    self.enter_fail_safe(light, now);
                    if first_fault.is_none() {
                        first_fault = Some(err);
                    }
                }
            }
        }
        match first_fault {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Advances every eligible light one step through the cycle.
    ///
    /// Lights are evaluated in index order and the safety check sees
    /// transitions already committed earlier in the same call. A light whose
    /// advance would violate a conflict group, or whose conflicting peers
    /// have not yet been red for the all-red overlap, is deferred and
    /// re-evaluated on the next tick.
    ///
    /// Returns the first hardware fault encountered; the affected lights are
    /// already forced to fail-safe and the remaining lights still advance.
    pub fn update(&mut self, now: Instant) -> Result<(), Error<P::Error>> {
        if !self.live {
            return Err(Error::NotLive);
        }
        let mut first_fault = None;
        for light in 0..N {
            let record = self.lights[light];
            if record.status == LightStatus::Faulted {
                continue;
            }
            let Some(dwell) = self.timings.dwell(record.signal) else {
                continue;
            };
            if now < record.since || now - record.since < dwell {
                continue;
            }
            let next = record.signal.next_in_cycle();
            if next.is_permissive()
                && !record.signal.is_permissive()
                && !self.cleared_to_release(light, now)
            {
                continue;
            }
            match self.commit(light, next, now) {
                Ok(()) => {}
                Err(err @ Error::Hardware { .. }) => {
                    if first_fault.is_none() {
                        first_fault = Some(err);
                    }
                }
                // Lost the race against an earlier commit this tick; retry
                // next tick.
                Err(_) => {}
            }
        }
        match first_fault {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    /// Manual override; bypasses dwell timing but never the safety check.
    pub fn set_red(&mut self, light: usize, now: Instant) -> Result<(), Error<P::Error>> {
        self.commit(light, Signal::Red, now)
    }

    /// Manual override; bypasses dwell timing but never the safety check.
    pub fn set_yellow(&mut self, light: usize, now: Instant) -> Result<(), Error<P::Error>> {
        self.commit(light, Signal::Yellow, now)
    }

    /// Manual override; bypasses dwell timing but never the safety check.
    pub fn set_green(&mut self, light: usize, now: Instant) -> Result<(), Error<P::Error>> {
        self.commit(light, Signal::Green, now)
    }

    /// Disables both lines of a light. Used for fault and shutdown paths.
    pub fn set_off(&mut self, light: usize, now: Instant) -> Result<(), Error<P::Error>> {
        self.commit(light, Signal::Off, now)
    }

    /// Leaves every line dark. The controller is no longer live afterwards.
    pub fn shutdown(&mut self, now: Instant) -> Result<(), Error<P::Error>> {
        let mut first_fault = None;
        for light in 0..N {
            match self.force_lines(light, Signal::Off) {
                Ok(()) => {
                    self.lights[light].signal = Signal::Off;
                    self.lights[light].since = now;
                }
                Err(err) => {
                    // Lines in an unknown state; monitoring must see it.
                    self.lights[light].status = LightStatus::Faulted;
                    if first_fault.is_none() {
                        first_fault = Some(err);
                    }
                }
            }
        }
        self.live = false;
        match first_fault {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }

    pub fn signal(&self, light: usize) -> Option<Signal> {
        self.lights.get(light).map(|l| l.signal)
    }

    pub fn status(&self, light: usize) -> Option<LightStatus> {
        self.lights.get(light).map(|l| l.status)
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub const fn num_lights(&self) -> usize {
        N
    }

    /// Single commit path for every transition: direct control and the
    /// timed cycle both land here, so no signal reaches the pins without
    /// the safety check.
    fn commit(&mut self, light: usize, target: Signal, now: Instant) -> Result<(), Error<P::Error>> {
        if !self.live {
            return Err(Error::NotLive);
        }
        let current = self.lights.get(light).ok_or(Error::NoSuchLight(light))?;
        if current.signal == target && current.status == LightStatus::Ok {
            return Ok(());
        }
        if target.is_permissive() && self.conflicting_peer_permissive(light) {
            return Err(Error::PolicyViolation(light));
        }
        match self.write_lines(light, target) {
            Ok(()) => {
                #[cfg(feature = "defmt")]
                defmt::info!("light {} -> {}", light, target);
                self.lights[light] = Light {
                    signal: target,
                    since: now,
                    status: LightStatus::Ok,
                };
                Ok(())
            }
            Err(err) => {
                self.enter_fail_safe(light, now);
                Err(err)
            }
        }
    }

    fn write_lines(&mut self, light: usize, signal: Signal) -> Result<(), Error<P::Error>> {
        let levels = self.policy.levels(signal);
        let entry = self
            .pins
            .entry_mut(light)
            .ok_or(Error::NoSuchLight(light))?;
        entry
            .apply(levels)
            .map_err(|source| Error::Hardware { light, source })
    }

    /// Fault-path variant of `write_lines`: every line is attempted even if
    /// one fails, so a broken line cannot leave a working one lit.
    fn force_lines(&mut self, light: usize, signal: Signal) -> Result<(), Error<P::Error>> {
        let levels = self.policy.levels(signal);
        let entry = self
            .pins
            .entry_mut(light)
            .ok_or(Error::NoSuchLight(light))?;
        entry
            .apply_each(levels)
            .map_err(|source| Error::Hardware { light, source })
    }

    fn conflicting_peer_permissive(&self, light: usize) -> bool {
        self.groups.iter().any(|&group| {
            group_contains(group, light)
                && (0..N).any(|peer| {
                    peer != light
                        && group_contains(group, peer)
                        && self.lights[peer].signal.is_permissive()
                })
        })
    }

    /// True once every conflicting peer is dark or has been red for at
    /// least the all-red overlap.
    fn cleared_to_release(&self, light: usize, now: Instant) -> bool {
        for &group in self.groups {
            if !group_contains(group, light) {
                continue;
            }
            for peer in 0..N {
                if peer == light || !group_contains(group, peer) {
                    continue;
                }
                match self.lights[peer].signal {
                    Signal::Off => {}
                    Signal::Red => {
                        let since = self.lights[peer].since;
                        if now < since || now - since < self.timings.all_red {
                            return false;
                        }
                    }
                    Signal::Green | Signal::Yellow => return false,
                }
            }
        }
        true
    }

    /// Forces a light that failed actuation toward dark and stops every
    /// conflicting peer. Secondary write errors cannot be reported further;
    /// the records still end up Faulted so monitoring sees them.
    fn enter_fail_safe(&mut self, light: usize, now: Instant) {
        #[cfg(feature = "defmt")]
        defmt::warn!("light {} faulted, forcing fail-safe", light);
        let _ = self.force_lines(light, Signal::Off);
        self.lights[light] = Light {
            signal: Signal::Off,
            since: now,
            status: LightStatus::Faulted,
        };
        for group_index in 0..self.groups.len() {
            let group = self.groups[group_index];
            if !group_contains(group, light) {
                continue;
            }
            for peer in 0..N {
                if peer == light
                    || !group_contains(group, peer)
                    || self.lights[peer].status == LightStatus::Faulted
                {
                    continue;
                }
                let parked = if self.force_lines(peer, Signal::Red).is_ok() {
                    Signal::Red
                } else {
                    let _ = self.force_lines(peer, Signal::Off);
                    Signal::Off
                };
                self.lights[peer] = Light {
                    signal: parked,
                    since: now,
                    status: LightStatus::Faulted,
                };
            }
        }
    }
}
