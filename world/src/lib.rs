#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative session state for Stadium Wave.
//!
//! A [`Session`] owns the ring of crowd [`Sector`]s and the wave controller
//! that carries a wave around it. Hosts drive it with [`apply`] (or the
//! equivalent methods), read it through the [`query`] module, and drain the
//! recorded events whenever they like.

mod sector;

use std::time::Duration;

use rand::Rng;
use stadium_wave_core::{
    Command, CrowdEvent, Event, Progress, SectorIndex, SessionError, TimedEvent, VenueProfile,
};
use tracing::{debug, info};

pub use sector::{Sector, DEFAULT_BOOST, DEFAULT_DISTRACTION, INITIAL_ENERGY};

/// Time a sector must anticipate before the controller stands it up.
const STAND_DELAY: Duration = Duration::from_millis(200);
const POINTS_PER_COMBO_STEP: u64 = 10;
const COMPLETION_BASE_BONUS: u64 = 100;
// 100 * combo * 0.5, kept in integers so the bonus is exact.
const COMPLETION_BONUS_PER_COMBO: u64 = 50;
const MASCOT_DISTRACTION: f32 = 0.3;
const SCOREBOARD_BOOST: f32 = 0.2;
const CROWD_SIZE_MIN: u32 = 80;
const CROWD_SIZE_MAX: u32 = 120;

/// Behavioural switches that are not part of the venue tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionOptions {
    reset_combo_on_complete: bool,
}

impl SessionOptions {
    /// Selects whether a completed wave clears the combo.
    ///
    /// Disabled by default, so the combo carries into the next wave.
    #[must_use]
    pub const fn with_reset_combo_on_complete(mut self, reset: bool) -> Self {
        self.reset_combo_on_complete = reset;
        self
    }

    /// Reports whether a completed wave clears the combo.
    #[must_use]
    pub const fn reset_combo_on_complete(&self) -> bool {
        self.reset_combo_on_complete
    }
}

/// Per-sector values drawn once when a session is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrowdSeed {
    /// Fixed enthusiasm of the sector.
    pub enthusiasm: f32,
    /// Number of spectators in the sector.
    pub crowd_size: u32,
}

impl CrowdSeed {
    /// Draws a seed for the provided venue from the supplied random source.
    pub fn sample<R: Rng + ?Sized>(venue: &VenueProfile, rng: &mut R) -> Self {
        let (low, high) = venue.enthusiasm_band();
        Self {
            enthusiasm: rng.gen_range(low..=high),
            crowd_size: rng.gen_range(CROWD_SIZE_MIN..=CROWD_SIZE_MAX),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ActiveWave {
    start: SectorIndex,
    current: SectorIndex,
    elapsed: Duration,
}

/// Represents one Stadium Wave play session.
#[derive(Clone, Debug)]
pub struct Session {
    venue: VenueProfile,
    options: SessionOptions,
    sectors: Vec<Sector>,
    wave: Option<ActiveWave>,
    score: u64,
    combo: u32,
    max_combo: u32,
    successful_waves: u32,
    failed_waves: u32,
    stadium_level: u32,
    unlocks: Vec<String>,
    clock: Duration,
    events: Vec<TimedEvent>,
}

// Hosts hand sessions to worker threads.
const _: fn() = || {
    fn assert_send<T: Send>() {}
    assert_send::<Session>();
};

impl Session {
    /// Creates a session whose crowd is sampled from `rng`.
    pub fn new<R: Rng + ?Sized>(venue: VenueProfile, rng: &mut R) -> Self {
        Self::with_options(venue, SessionOptions::default(), rng)
    }

    /// Creates a session with explicit options whose crowd is sampled from `rng`.
    pub fn with_options<R: Rng + ?Sized>(
        venue: VenueProfile,
        options: SessionOptions,
        rng: &mut R,
    ) -> Self {
        let seeds: Vec<CrowdSeed> = (0..venue.sector_count())
            .map(|_| CrowdSeed::sample(&venue, &mut *rng))
            .collect();
        Self::build(venue, options, seeds)
    }

    /// Creates a session from prebuilt crowd seeds, one per venue sector.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SectorCountMismatch`] when the number of seeds
    /// differs from the venue's sector count.
    pub fn from_crowd(
        venue: VenueProfile,
        options: SessionOptions,
        crowd: Vec<CrowdSeed>,
    ) -> Result<Self, SessionError> {
        if crowd.len() != venue.sector_count() as usize {
            return Err(SessionError::SectorCountMismatch {
                expected: venue.sector_count(),
                actual: crowd.len(),
            });
        }
        Ok(Self::build(venue, options, crowd))
    }

    fn build(venue: VenueProfile, options: SessionOptions, crowd: Vec<CrowdSeed>) -> Self {
        let drain = venue.energy_drain();
        let sectors = crowd
            .into_iter()
            .zip(0..)
            .map(|(seed, index)| {
                Sector::new(
                    SectorIndex::new(index),
                    seed.enthusiasm,
                    drain,
                    seed.crowd_size,
                )
            })
            .collect();
        info!(
            venue = venue.name(),
            sectors = venue.sector_count(),
            difficulty = venue.difficulty().label(),
            "session created"
        );
        Self {
            venue,
            options,
            sectors,
            wave: None,
            score: 0,
            combo: 0,
            max_combo: 0,
            successful_waves: 0,
            failed_waves: 0,
            stadium_level: Progress::default().stadium_level,
            unlocks: Vec::new(),
            clock: Duration::ZERO,
            events: Vec::new(),
        }
    }

    /// Provides mutable access to a sector for host-side tuning.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidIndex`] when the sector does not exist.
    pub fn sector_mut(&mut self, index: SectorIndex) -> Result<&mut Sector, SessionError> {
        self.check_index(index)?;
        let sector_count = self.venue.sector_count();
        self.sectors
            .get_mut(index.get() as usize)
            .ok_or(SessionError::InvalidIndex {
                index,
                sector_count,
            })
    }

    /// Attempts to start a wave at the provided sector.
    ///
    /// Returns `Ok(false)` without changing anything when a wave is already
    /// travelling or the sector is not ready.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidIndex`] when the sector does not exist.
    pub fn start_wave(&mut self, index: SectorIndex) -> Result<bool, SessionError> {
        self.check_index(index)?;
        if self.wave.is_some() {
            debug!(
                sector = index.get(),
                "wave start rejected: wave already active"
            );
            return Ok(false);
        }
        if !self.sector_mut(index)?.try_start_wave() {
            debug!(
                sector = index.get(),
                "wave start rejected: sector not ready"
            );
            return Ok(false);
        }

        self.wave = Some(ActiveWave {
            start: index,
            current: index,
            elapsed: Duration::ZERO,
        });
        info!(sector = index.get(), "wave started");
        self.record(Event::WaveStarted { sector: index });
        Ok(true)
    }

    /// Advances the simulation by `dt`.
    ///
    /// Every sector recovers and applies its timed transitions before the
    /// active wave, if any, is examined.
    pub fn tick(&mut self, dt: Duration) {
        self.clock = self.clock.saturating_add(dt);
        for sector in &mut self.sectors {
            sector.update(dt);
        }
        self.propagate(dt);
    }

    /// Boosts the energy of a single sector.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidIndex`] when the sector does not exist.
    pub fn boost_sector(&mut self, index: SectorIndex) -> Result<(), SessionError> {
        self.sector_mut(index)?.boost_energy(DEFAULT_BOOST);
        Ok(())
    }

    /// Applies an external crowd event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidIndex`] when a mascot event targets a
    /// sector that does not exist.
    pub fn trigger_event(&mut self, event: CrowdEvent) -> Result<(), SessionError> {
        match event {
            CrowdEvent::Mascot { sector } => {
                self.check_index(sector)?;
                let count = self.venue.sector_count();
                for delta in -1..=1 {
                    let neighbour = sector.wrapping_offset(delta, count);
                    self.sector_mut(neighbour)?.add_distraction(MASCOT_DISTRACTION);
                }
            }
            CrowdEvent::Scoreboard => {
                for sector in &mut self.sectors {
                    sector.boost_energy(SCOREBOARD_BOOST);
                }
            }
        }
        debug!(?event, "crowd event applied");
        Ok(())
    }

    /// Removes and returns every event recorded since the previous drain.
    pub fn drain_events(&mut self) -> Vec<TimedEvent> {
        std::mem::take(&mut self.events)
    }

    /// Overwrites the persistent progress fields, leaving the crowd untouched.
    pub fn restore_progress(&mut self, progress: Progress) {
        self.score = progress.score;
        self.max_combo = progress.max_combo;
        self.successful_waves = progress.successful_waves;
        self.stadium_level = progress.stadium_level;
        self.unlocks = progress.unlocks;
    }

    fn check_index(&self, index: SectorIndex) -> Result<(), SessionError> {
        let sector_count = self.venue.sector_count();
        if index.get() < sector_count {
            return Ok(());
        }
        debug!(
            sector = index.get(),
            sector_count,
            "command rejected: sector out of range"
        );
        Err(SessionError::InvalidIndex {
            index,
            sector_count,
        })
    }

    fn propagate(&mut self, dt: Duration) {
        let Some(mut wave) = self.wave else {
            return;
        };
        wave.elapsed = wave.elapsed.saturating_add(dt);

        if wave.elapsed > STAND_DELAY {
            let current = &mut self.sectors[wave.current.get() as usize];
            if current.try_stand_up() {
                self.combo = self.combo.saturating_add(1);
                let points = POINTS_PER_COMBO_STEP.saturating_mul(u64::from(self.combo));
                self.score = self.score.saturating_add(points);
                debug!(
                    sector = wave.current.get(),
                    combo = self.combo,
                    points,
                    "sector stood"
                );
            }
        }

        if wave.elapsed < self.venue.propagation_interval() {
            self.wave = Some(wave);
            return;
        }

        let next = wave.current.wrapping_offset(1, self.venue.sector_count());
        if next == wave.start {
            self.complete_wave();
        } else if self.sectors[next.get() as usize].try_start_wave() {
            wave.current = next;
            wave.elapsed = Duration::ZERO;
            self.wave = Some(wave);
        } else {
            self.fail_wave(next, wave.current);
        }
    }

    fn complete_wave(&mut self) {
        self.wave = None;
        self.successful_waves = self.successful_waves.saturating_add(1);
        let bonus = COMPLETION_BASE_BONUS + COMPLETION_BONUS_PER_COMBO * u64::from(self.combo);
        self.score = self.score.saturating_add(bonus);
        self.max_combo = self.max_combo.max(self.combo);
        info!(
            combo = self.combo,
            bonus,
            score = self.score,
            "wave completed"
        );
        self.record(Event::WaveCompleted {
            combo: self.combo,
            bonus,
        });
        if self.options.reset_combo_on_complete {
            self.combo = 0;
        }
    }

    fn fail_wave(&mut self, stalled: SectorIndex, last_reached: SectorIndex) {
        self.wave = None;
        self.failed_waves = self.failed_waves.saturating_add(1);
        self.combo = 0;
        info!(
            sector = stalled.get(),
            last_reached = last_reached.get(),
            "wave failed"
        );
        self.record(Event::WaveFailed {
            sector: stalled,
            last_reached,
        });
    }

    fn record(&mut self, event: Event) {
        self.events.push(TimedEvent {
            event,
            timestamp: self.clock,
        });
    }
}

/// Applies the provided command to the session.
///
/// Returns whether the command took effect; only [`Command::StartWave`] can
/// report `false`.
///
/// # Errors
///
/// Propagates [`SessionError`] when a command references a missing sector.
pub fn apply(session: &mut Session, command: Command) -> Result<bool, SessionError> {
    match command {
        Command::Tick { dt } => {
            session.tick(dt);
            Ok(true)
        }
        Command::StartWave { sector } => session.start_wave(sector),
        Command::BoostSector { sector } => session.boost_sector(sector).map(|()| true),
        Command::TriggerCrowdEvent { event } => session.trigger_event(event).map(|()| true),
    }
}

/// Query functions that provide read-only access to the session state.
pub mod query {
    use stadium_wave_core::{Progress, SectorIndex, SessionSnapshot, TimedEvent, VenueProfile};

    use super::{Sector, Session, SessionOptions};

    /// Captures a read-only snapshot of the whole session.
    #[must_use]
    pub fn snapshot(session: &Session) -> SessionSnapshot {
        SessionSnapshot {
            sectors: session.sectors.iter().map(Sector::snapshot).collect(),
            score: session.score,
            combo: session.combo,
            max_combo: session.max_combo,
            wave_active: session.wave.is_some(),
            wave_start: session.wave.map(|wave| wave.start),
            current_wave: session.wave.map(|wave| wave.current),
            successful_waves: session.successful_waves,
            failed_waves: session.failed_waves,
            stadium_level: session.stadium_level,
            session_clock: session.clock,
            venue_name: session.venue.name().to_owned(),
            venue_difficulty: session.venue.difficulty(),
        }
    }

    /// Provides read-only access to the venue the session was created with.
    #[must_use]
    pub fn venue(session: &Session) -> &VenueProfile {
        &session.venue
    }

    /// Provides read-only access to the session options.
    #[must_use]
    pub fn options(session: &Session) -> SessionOptions {
        session.options
    }

    /// Provides read-only access to the sectors in ring order.
    #[must_use]
    pub fn sectors(session: &Session) -> &[Sector] {
        &session.sectors
    }

    /// Retrieves a single sector, if it exists.
    #[must_use]
    pub fn sector(session: &Session, index: SectorIndex) -> Option<&Sector> {
        session.sectors.get(index.get() as usize)
    }

    /// Enumerates the sectors that would accept a new wave right now.
    #[must_use]
    pub fn ready_sectors(session: &Session) -> Vec<SectorIndex> {
        session
            .sectors
            .iter()
            .filter(|sector| sector.is_ready())
            .map(Sector::index)
            .collect()
    }

    /// Events recorded since the previous drain, oldest first.
    #[must_use]
    pub fn pending_events(session: &Session) -> &[TimedEvent] {
        &session.events
    }

    /// Extracts the persistent progress fields.
    #[must_use]
    pub fn progress(session: &Session) -> Progress {
        Progress {
            score: session.score,
            max_combo: session.max_combo,
            successful_waves: session.successful_waves,
            stadium_level: session.stadium_level,
            unlocks: session.unlocks.clone(),
        }
    }
}
