//! Crowd sector state machine.

use std::time::Duration;

use stadium_wave_core::{SectorIndex, SectorSnapshot, SectorState, READINESS_THRESHOLD};
use tracing::debug;

/// Energy restored by a player boost when no explicit amount is given.
pub const DEFAULT_BOOST: f32 = 0.3;
/// Distraction added by an external event when no explicit amount is given.
pub const DEFAULT_DISTRACTION: f32 = 0.2;
/// Energy every sector starts a session with.
pub const INITIAL_ENERGY: f32 = 0.5;

const ANTICIPATION_TIMEOUT: Duration = Duration::from_millis(500);
const STAND_DURATION: Duration = Duration::from_millis(1_500);
const FATIGUE_PER_STAND: f32 = 0.1;
const FATIGUE_RECOVERY_PER_SECOND: f32 = 0.05;
const ENERGY_RECOVERY_PER_SECOND: f32 = 0.1;
const BOOST_FOCUS: f32 = 0.1;

/// One segment of the crowd and its participation in the wave.
///
/// Every bounded attribute lives in `0.0..=1.0`; all mutators clamp.
#[derive(Clone, Debug, PartialEq)]
pub struct Sector {
    index: SectorIndex,
    state: SectorState,
    energy: f32,
    fatigue: f32,
    enthusiasm: f32,
    distraction: f32,
    phase_timer: Duration,
    stand_energy_cost: f32,
    crowd_size: u32,
}

impl Sector {
    /// Creates an idle sector with fixed enthusiasm and a venue-derived stand cost.
    #[must_use]
    pub fn new(
        index: SectorIndex,
        enthusiasm: f32,
        stand_energy_cost: f32,
        crowd_size: u32,
    ) -> Self {
        Self {
            index,
            state: SectorState::Idle,
            energy: INITIAL_ENERGY,
            fatigue: 0.0,
            enthusiasm: unit(enthusiasm),
            distraction: 0.0,
            phase_timer: Duration::ZERO,
            stand_energy_cost: unit(stand_energy_cost),
            crowd_size,
        }
    }

    /// Position of the sector in the ring.
    #[must_use]
    pub const fn index(&self) -> SectorIndex {
        self.index
    }

    /// Current state machine phase.
    #[must_use]
    pub const fn state(&self) -> SectorState {
        self.state
    }

    /// Stamina available for standing.
    #[must_use]
    pub const fn energy(&self) -> f32 {
        self.energy
    }

    /// Tiredness accumulated from standing.
    #[must_use]
    pub const fn fatigue(&self) -> f32 {
        self.fatigue
    }

    /// Fixed eagerness to join a wave.
    #[must_use]
    pub const fn enthusiasm(&self) -> f32 {
        self.enthusiasm
    }

    /// Attention lost to external events.
    #[must_use]
    pub const fn distraction(&self) -> f32 {
        self.distraction
    }

    /// Time spent in the current state.
    #[must_use]
    pub const fn phase_timer(&self) -> Duration {
        self.phase_timer
    }

    /// Number of spectators seated in the sector.
    #[must_use]
    pub const fn crowd_size(&self) -> u32 {
        self.crowd_size
    }

    /// Willingness to join a wave: `energy * enthusiasm - (fatigue + distraction)`.
    #[must_use]
    pub fn readiness(&self) -> f32 {
        self.energy * self.enthusiasm - (self.fatigue + self.distraction)
    }

    /// Reports whether [`Sector::try_start_wave`] would succeed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SectorState::Idle | SectorState::Seated)
            && self.readiness() > READINESS_THRESHOLD
    }

    /// Moves an idle or seated sector into anticipation when it is ready.
    ///
    /// Returns `false` without touching the sector otherwise.
    pub fn try_start_wave(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.enter(SectorState::Anticipating);
        true
    }

    /// Stands an anticipating sector up, spending energy and gaining fatigue.
    pub fn try_stand_up(&mut self) -> bool {
        if self.state != SectorState::Anticipating {
            return false;
        }
        self.enter(SectorState::Standing);
        self.energy = unit(self.energy - self.stand_energy_cost);
        self.fatigue = unit(self.fatigue + FATIGUE_PER_STAND);
        true
    }

    /// Applies recovery and then the timed state transitions.
    pub fn update(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        self.fatigue = unit(self.fatigue - seconds * FATIGUE_RECOVERY_PER_SECOND);
        self.energy = unit(self.energy + seconds * ENERGY_RECOVERY_PER_SECOND);

        self.phase_timer = self.phase_timer.saturating_add(dt);
        match self.state {
            SectorState::Anticipating if self.phase_timer > ANTICIPATION_TIMEOUT => {
                debug!(sector = self.index.get(), "anticipation timed out");
                self.enter(SectorState::Idle);
            }
            SectorState::Standing if self.phase_timer > STAND_DURATION => {
                debug!(sector = self.index.get(), "sector seated");
                self.enter(SectorState::Seated);
            }
            _ => {}
        }
    }

    /// Raises energy and pulls a little attention back from distractions.
    pub fn boost_energy(&mut self, amount: f32) {
        self.energy = unit(self.energy + amount);
        self.distraction = unit(self.distraction - BOOST_FOCUS);
    }

    /// Adds distraction caused by an external event.
    pub fn add_distraction(&mut self, amount: f32) {
        self.distraction = unit(self.distraction + amount);
    }

    /// Overrides the sector's energy, clamped to `0.0..=1.0`.
    pub fn set_energy(&mut self, energy: f32) {
        self.energy = unit(energy);
    }

    /// Overrides the sector's fatigue, clamped to `0.0..=1.0`.
    pub fn set_fatigue(&mut self, fatigue: f32) {
        self.fatigue = unit(fatigue);
    }

    /// Overrides the sector's distraction, clamped to `0.0..=1.0`.
    pub fn set_distraction(&mut self, distraction: f32) {
        self.distraction = unit(distraction);
    }

    /// Captures an immutable view of the sector.
    #[must_use]
    pub fn snapshot(&self) -> SectorSnapshot {
        SectorSnapshot {
            index: self.index,
            state: self.state,
            energy: self.energy,
            fatigue: self.fatigue,
            enthusiasm: self.enthusiasm,
            distraction: self.distraction,
            crowd_size: self.crowd_size,
        }
    }

    fn enter(&mut self, state: SectorState) {
        self.state = state;
        self.phase_timer = Duration::ZERO;
    }
}

// NaN collapses to zero so the bounds hold for any input.
fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_sector() -> Sector {
        let mut sector = Sector::new(SectorIndex::new(0), 0.8, 0.2, 100);
        sector.set_energy(0.8);
        sector
    }

    #[test]
    fn new_sector_starts_idle_with_default_energy() {
        let sector = Sector::new(SectorIndex::new(3), 0.7, 0.2, 90);
        assert_eq!(sector.state(), SectorState::Idle);
        assert_eq!(sector.energy(), INITIAL_ENERGY);
        assert_eq!(sector.fatigue(), 0.0);
        assert_eq!(sector.distraction(), 0.0);
        assert_eq!(sector.index(), SectorIndex::new(3));
    }

    #[test]
    fn enthusiasm_is_clamped_at_creation() {
        assert_eq!(
            Sector::new(SectorIndex::new(0), 1.4, 0.2, 100).enthusiasm(),
            1.0
        );
        assert_eq!(
            Sector::new(SectorIndex::new(0), -0.2, 0.2, 100).enthusiasm(),
            0.0
        );
    }

    #[test]
    fn ready_sector_starts_wave() {
        let mut sector = ready_sector();
        assert!((sector.readiness() - 0.64).abs() < 1e-6);
        assert!(sector.try_start_wave());
        assert_eq!(sector.state(), SectorState::Anticipating);
        assert_eq!(sector.phase_timer(), Duration::ZERO);
    }

    #[test]
    fn fatigued_sector_refuses_wave() {
        let mut sector = ready_sector();
        sector.set_fatigue(0.9);
        assert!(!sector.try_start_wave());
        assert_eq!(sector.state(), SectorState::Idle);
    }

    #[test]
    fn anticipating_sector_cannot_restart() {
        let mut sector = ready_sector();
        assert!(sector.try_start_wave());
        assert!(!sector.try_start_wave());
    }

    #[test]
    fn standing_costs_energy_and_adds_fatigue() {
        let mut sector = ready_sector();
        assert!(sector.try_start_wave());
        assert!(sector.try_stand_up());
        assert_eq!(sector.state(), SectorState::Standing);
        assert!((sector.energy() - 0.6).abs() < 1e-6);
        assert!((sector.fatigue() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn stand_up_requires_anticipation() {
        let mut sector = ready_sector();
        assert!(!sector.try_stand_up());
        assert_eq!(sector.state(), SectorState::Idle);
        assert!((sector.energy() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn anticipation_times_out_to_idle() {
        let mut sector = ready_sector();
        assert!(sector.try_start_wave());
        sector.update(Duration::from_millis(500));
        assert_eq!(sector.state(), SectorState::Anticipating);
        sector.update(Duration::from_millis(10));
        assert_eq!(sector.state(), SectorState::Idle);
    }

    #[test]
    fn standing_sits_down_after_two_seconds_of_ticks() {
        let mut sector = ready_sector();
        assert!(sector.try_start_wave());
        assert!(sector.try_stand_up());
        sector.update(Duration::from_secs(1));
        assert_eq!(sector.state(), SectorState::Standing);
        sector.update(Duration::from_secs(1));
        assert_eq!(sector.state(), SectorState::Seated);
    }

    #[test]
    fn seated_sector_can_rejoin() {
        let mut sector = ready_sector();
        assert!(sector.try_start_wave());
        assert!(sector.try_stand_up());
        sector.update(Duration::from_secs(2));
        sector.set_energy(1.0);
        assert!(sector.try_start_wave());
    }

    #[test]
    fn recovery_applies_in_every_state() {
        let mut sector = ready_sector();
        sector.set_fatigue(0.5);
        sector.update(Duration::from_secs(2));
        assert!((sector.energy() - 1.0).abs() < 1e-6);
        assert!((sector.fatigue() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn boost_raises_energy_and_reduces_distraction() {
        let mut sector = ready_sector();
        sector.set_distraction(0.05);
        sector.boost_energy(DEFAULT_BOOST);
        assert_eq!(sector.energy(), 1.0);
        assert_eq!(sector.distraction(), 0.0);
    }

    #[test]
    fn distraction_saturates() {
        let mut sector = ready_sector();
        for _ in 0..10 {
            sector.add_distraction(DEFAULT_DISTRACTION);
        }
        assert_eq!(sector.distraction(), 1.0);
    }

    #[test]
    fn setters_clamp_non_finite_input() {
        let mut sector = ready_sector();
        sector.set_energy(f32::NAN);
        sector.set_fatigue(f32::INFINITY);
        assert_eq!(sector.energy(), 0.0);
        assert_eq!(sector.fatigue(), 1.0);
    }
}
