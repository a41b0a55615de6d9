#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Stadium Wave engine.
//!
//! This crate defines the message surface that connects hosts, the
//! authoritative session, and pure systems. Hosts submit [`Command`] values
//! describing desired mutations, the session executes those commands, and
//! records [`Event`] values that hosts drain at their own pace. Systems consume
//! drained events, query immutable snapshots, and respond exclusively with new
//! command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Stadium Wave.";

/// Readiness a sector must exceed before it agrees to anticipate a wave.
pub const READINESS_THRESHOLD: f32 = 0.3;

/// Half-width of the enthusiasm band drawn around a venue's base enthusiasm.
pub const ENTHUSIASM_SPREAD: f32 = 0.15;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that a wave begin at the provided sector.
    StartWave {
        /// Sector where the wave should originate.
        sector: SectorIndex,
    },
    /// Requests a player energy boost for a single sector.
    BoostSector {
        /// Sector receiving the boost.
        sector: SectorIndex,
    },
    /// Requests that an external crowd event perturbs the stadium.
    TriggerCrowdEvent {
        /// Event applied to the crowd.
        event: CrowdEvent,
    },
}

/// Events recorded by the session while processing commands and ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a wave started at the provided sector.
    WaveStarted {
        /// Sector where the wave began.
        sector: SectorIndex,
    },
    /// Announces that a wave travelled the full ring back to its origin.
    WaveCompleted {
        /// Combo held when the wave completed.
        combo: u32,
        /// Bonus points awarded for the completion.
        bonus: u64,
    },
    /// Announces that a wave could not propagate any further.
    WaveFailed {
        /// Sector that was not ready to receive the wave.
        sector: SectorIndex,
        /// Last sector the wave reached before stalling.
        last_reached: SectorIndex,
    },
}

impl Event {
    /// Stable, lower-case identifier of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::WaveStarted { .. } => "wave_started",
            Self::WaveCompleted { .. } => "wave_completed",
            Self::WaveFailed { .. } => "wave_failed",
        }
    }
}

/// Event paired with the session clock reading at which it was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedEvent {
    /// Recorded event.
    pub event: Event,
    /// Session clock value when the event was recorded.
    pub timestamp: Duration,
}

/// External happenings that perturb the crowd.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrowdEvent {
    /// The mascot wanders past and distracts the sectors around it.
    Mascot {
        /// Sector at the centre of the distraction.
        sector: SectorIndex,
    },
    /// The scoreboard hypes the whole stadium.
    Scoreboard,
}

/// Zero-based index of a sector within the stadium ring.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SectorIndex(u32);

impl SectorIndex {
    /// Creates a new sector index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the index offset by `delta` positions around a ring of `count` sectors.
    ///
    /// A `count` of zero yields the index unchanged.
    #[must_use]
    pub fn wrapping_offset(self, delta: i64, count: u32) -> Self {
        if count == 0 {
            return self;
        }
        let ring = i64::from(count);
        let wrapped = (i64::from(self.0) + delta).rem_euclid(ring);
        Self(wrapped as u32)
    }
}

impl fmt::Display for SectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Discrete phases of a sector's participation in the wave.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorState {
    /// Seated and not involved in a wave.
    #[default]
    Idle,
    /// Bracing to stand as the wave approaches.
    Anticipating,
    /// On their feet carrying the wave.
    Standing,
    /// Back in their seats after standing.
    Seated,
}

impl SectorState {
    /// Stable, lower-case label of the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Anticipating => "anticipating",
            Self::Standing => "standing",
            Self::Seated => "seated",
        }
    }
}

/// Difficulty label attached to a venue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Forgiving timing and enthusiastic crowds.
    Easy,
    /// Balanced tuning.
    Medium,
    /// Fast waves and tired crowds.
    Hard,
}

impl Difficulty {
    /// Human readable label of the difficulty.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// Immutable tuning preset selected once per session.
#[derive(Clone, Debug, PartialEq)]
pub struct VenueProfile {
    name: String,
    description: String,
    sector_count: u32,
    propagation_interval: Duration,
    energy_drain: f32,
    base_enthusiasm: f32,
    difficulty: Difficulty,
}

impl VenueProfile {
    /// Validates and creates a new venue profile.
    ///
    /// # Errors
    ///
    /// Returns [`VenueError`] when the sector count is zero or when the energy
    /// drain or base enthusiasm fall outside `0.0..=1.0`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sector_count: u32,
        propagation_interval: Duration,
        energy_drain: f32,
        base_enthusiasm: f32,
        difficulty: Difficulty,
    ) -> Result<Self, VenueError> {
        if sector_count == 0 {
            return Err(VenueError::ZeroSectors);
        }
        if !(0.0..=1.0).contains(&energy_drain) {
            return Err(VenueError::OutOfRange {
                field: "energy_drain",
                value: energy_drain,
            });
        }
        if !(0.0..=1.0).contains(&base_enthusiasm) {
            return Err(VenueError::OutOfRange {
                field: "base_enthusiasm",
                value: base_enthusiasm,
            });
        }

        Ok(Self {
            name: name.into(),
            description: description.into(),
            sector_count,
            propagation_interval,
            energy_drain,
            base_enthusiasm,
            difficulty,
        })
    }

    /// Display name of the venue.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short flavour text describing the venue.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Number of sectors forming the stadium ring.
    #[must_use]
    pub const fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Time the wave lingers on a sector before hopping to the next one.
    #[must_use]
    pub const fn propagation_interval(&self) -> Duration {
        self.propagation_interval
    }

    /// Energy a sector spends each time it stands.
    #[must_use]
    pub const fn energy_drain(&self) -> f32 {
        self.energy_drain
    }

    /// Midpoint of the enthusiasm band sectors are drawn from.
    #[must_use]
    pub const fn base_enthusiasm(&self) -> f32 {
        self.base_enthusiasm
    }

    /// Difficulty label of the venue.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Returns a copy of the profile with a different sector count.
    ///
    /// # Errors
    ///
    /// Returns [`VenueError::ZeroSectors`] when `sector_count` is zero.
    pub fn with_sector_count(&self, sector_count: u32) -> Result<Self, VenueError> {
        if sector_count == 0 {
            return Err(VenueError::ZeroSectors);
        }
        Ok(Self {
            sector_count,
            ..self.clone()
        })
    }

    /// Inclusive enthusiasm range that sectors are sampled from, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn enthusiasm_band(&self) -> (f32, f32) {
        let low = (self.base_enthusiasm - ENTHUSIASM_SPREAD).clamp(0.0, 1.0);
        let high = (self.base_enthusiasm + ENTHUSIASM_SPREAD).clamp(0.0, 1.0);
        (low, high)
    }
}

/// Reasons a venue profile may be rejected.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum VenueError {
    /// A stadium ring needs at least one sector.
    #[error("a venue needs at least one sector")]
    ZeroSectors,
    /// A tuning value fell outside its permitted range.
    #[error("{field} must lie within 0.0..=1.0, got {value}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was supplied.
        value: f32,
    },
    /// The requested venue identifier is not part of the preset table.
    #[error("unknown venue `{0}`")]
    UnknownVenue(String),
}

/// Reasons a session may reject a command outright.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The referenced sector does not exist in the stadium ring.
    #[error("sector {index} is out of range for a ring of {sector_count} sectors")]
    InvalidIndex {
        /// Index supplied by the caller.
        index: SectorIndex,
        /// Number of sectors in the ring.
        sector_count: u32,
    },
    /// A prebuilt crowd does not match the venue's sector count.
    #[error("venue expects {expected} sectors but {actual} were supplied")]
    SectorCountMismatch {
        /// Sector count declared by the venue.
        expected: u32,
        /// Number of sectors supplied.
        actual: usize,
    },
}

/// Persistent progress carried across sessions by save files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    /// Accumulated score.
    pub score: u64,
    /// Highest combo held when a wave completed.
    pub max_combo: u32,
    /// Number of waves that travelled the whole ring.
    pub successful_waves: u32,
    /// Stadium upgrade level.
    pub stadium_level: u32,
    /// Identifiers of unlocked cosmetics and venues.
    pub unlocks: Vec<String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            score: 0,
            max_combo: 0,
            successful_waves: 0,
            stadium_level: 1,
            unlocks: Vec::new(),
        }
    }
}

/// Immutable representation of a single sector used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorSnapshot {
    /// Position of the sector in the ring.
    pub index: SectorIndex,
    /// Current state machine phase.
    pub state: SectorState,
    /// Stamina available for standing.
    pub energy: f32,
    /// Tiredness accumulated from standing.
    pub fatigue: f32,
    /// Fixed eagerness to join a wave.
    pub enthusiasm: f32,
    /// Attention lost to external events.
    pub distraction: f32,
    /// Number of spectators seated in the sector.
    pub crowd_size: u32,
}

impl SectorSnapshot {
    /// Willingness to join a wave: `energy * enthusiasm - (fatigue + distraction)`.
    #[must_use]
    pub fn readiness(&self) -> f32 {
        self.energy * self.enthusiasm - (self.fatigue + self.distraction)
    }

    /// Reports whether the sector would accept a new wave.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SectorState::Idle | SectorState::Seated)
            && self.readiness() > READINESS_THRESHOLD
    }
}

/// Read-only snapshot describing the full session.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Sectors in ring order.
    pub sectors: Vec<SectorSnapshot>,
    /// Accumulated score.
    pub score: u64,
    /// Current combo.
    pub combo: u32,
    /// Highest combo held when a wave completed.
    pub max_combo: u32,
    /// Whether a wave is currently travelling.
    pub wave_active: bool,
    /// Sector where the active wave began.
    pub wave_start: Option<SectorIndex>,
    /// Sector the active wave currently occupies.
    pub current_wave: Option<SectorIndex>,
    /// Waves that travelled the whole ring.
    pub successful_waves: u32,
    /// Waves that stalled.
    pub failed_waves: u32,
    /// Stadium upgrade level.
    pub stadium_level: u32,
    /// Total simulated time.
    pub session_clock: Duration,
    /// Display name of the venue.
    pub venue_name: String,
    /// Difficulty label of the venue.
    pub venue_difficulty: Difficulty,
}

impl SessionSnapshot {
    /// Returns the snapshot of the provided sector, if it exists.
    #[must_use]
    pub fn sector(&self, index: SectorIndex) -> Option<&SectorSnapshot> {
        self.sectors.get(index.get() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_profile() -> VenueProfile {
        VenueProfile::new(
            "Test Park",
            "",
            8,
            Duration::from_millis(300),
            0.2,
            0.7,
            Difficulty::Medium,
        )
        .expect("valid profile")
    }

    #[test]
    fn wrapping_offset_wraps_in_both_directions() {
        let first = SectorIndex::new(0);
        assert_eq!(first.wrapping_offset(-1, 8), SectorIndex::new(7));
        assert_eq!(SectorIndex::new(7).wrapping_offset(1, 8), first);
        let middle = SectorIndex::new(3);
        assert_eq!(middle.wrapping_offset(0, 8), middle);
    }

    #[test]
    fn wrapping_offset_ignores_empty_ring() {
        let index = SectorIndex::new(2);
        assert_eq!(index.wrapping_offset(5, 0), index);
    }

    #[test]
    fn venue_rejects_zero_sectors() {
        let error = VenueProfile::new(
            "Empty",
            "",
            0,
            Duration::from_millis(300),
            0.2,
            0.7,
            Difficulty::Easy,
        )
        .unwrap_err();
        assert_eq!(error, VenueError::ZeroSectors);
    }

    #[test]
    fn venue_rejects_out_of_range_enthusiasm() {
        let error = VenueProfile::new(
            "Loud",
            "",
            4,
            Duration::from_millis(300),
            0.2,
            1.5,
            Difficulty::Easy,
        )
        .unwrap_err();
        assert!(matches!(
            error,
            VenueError::OutOfRange {
                field: "base_enthusiasm",
                ..
            }
        ));
    }

    #[test]
    fn enthusiasm_band_is_centred_and_clamped() {
        let (low, high) = sample_profile().enthusiasm_band();
        assert!((low - 0.55).abs() < 1e-6);
        assert!((high - 0.85).abs() < 1e-6);

        let eager = VenueProfile::new(
            "Eager",
            "",
            4,
            Duration::from_millis(300),
            0.2,
            0.95,
            Difficulty::Easy,
        )
        .expect("valid profile");
        assert_eq!(eager.enthusiasm_band().1, 1.0);
    }

    #[test]
    fn with_sector_count_keeps_tuning() {
        let resized = sample_profile().with_sector_count(12).expect("resized");
        assert_eq!(resized.sector_count(), 12);
        assert_eq!(resized.name(), "Test Park");
        assert!(sample_profile().with_sector_count(0).is_err());
    }

    #[test]
    fn progress_defaults_to_first_stadium_level() {
        let progress = Progress::default();
        assert_eq!(progress.stadium_level, 1);
        assert!(progress.unlocks.is_empty());
    }

    #[test]
    fn progress_round_trips_through_bincode() {
        let progress = Progress {
            score: 1_250,
            max_combo: 7,
            successful_waves: 3,
            stadium_level: 2,
            unlocks: vec!["foam_finger".to_owned()],
        };
        let bytes = bincode::serialize(&progress).expect("serialize");
        let restored: Progress = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(restored, progress);
    }

    #[test]
    fn event_kinds_are_stable() {
        let sector = SectorIndex::new(1);
        assert_eq!(Event::WaveStarted { sector }.kind(), "wave_started");
        assert_eq!(
            Event::WaveCompleted {
                combo: 1,
                bonus: 150
            }
            .kind(),
            "wave_completed"
        );
        assert_eq!(
            Event::WaveFailed {
                sector,
                last_reached: sector
            }
            .kind(),
            "wave_failed"
        );
    }
}
