#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Function-call bridge between Stadium Wave and a hosting UI.
//!
//! A [`Bridge`] owns exactly one session and speaks JSON: every call returns a
//! document the host can hand straight to its renderer. The host keeps the
//! bridge alive for as long as the match lasts and replaces it to start over.

pub mod save;

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use serde_json::{json, Value};
use stadium_wave_core::{
    CrowdEvent, Event, SectorIndex, SessionError, SessionSnapshot, TimedEvent, VenueError,
    VenueProfile,
};
use stadium_wave_venues::VenueId;
use stadium_wave_world::{query, Session};
use tracing::warn;

pub use save::{SaveError, SAVE_HEADER};

const CUSTOM_VENUE_KEY: &str = "custom";

/// Errors reported to the host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The requested venue could not be built.
    #[error(transparent)]
    Venue(#[from] VenueError),
    /// The session rejected the command.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// The time step was negative, not finite, or too large.
    #[error("time step {0} is not a valid number of seconds")]
    InvalidDelta(f64),
    /// A mascot event was requested without a sector.
    #[error("mascot events need a sector")]
    MissingMascotSector,
    /// The requested crowd event is unknown.
    #[error("unknown crowd event `{0}`")]
    UnknownCrowdEvent(String),
    /// A response document could not be serialised.
    #[error("could not encode response: {0}")]
    Encode(#[from] serde_json::Error),
    /// The save string could not be decoded or encoded.
    #[error(transparent)]
    Save(#[from] SaveError),
}

#[derive(Serialize)]
struct InitResponse<'a> {
    status: &'static str,
    sectors: u32,
    venue: &'a str,
    venue_name: &'a str,
    difficulty: &'static str,
}

#[derive(Serialize)]
struct SectorView {
    id: u32,
    state: &'static str,
    energy: f32,
    fatigue: f32,
    enthusiasm: f32,
    distractions: f32,
    crowd_size: u32,
}

#[derive(Serialize)]
struct StateView<'a> {
    sectors: Vec<SectorView>,
    score: u64,
    combo: u32,
    max_combo: u32,
    wave_active: bool,
    current_wave_sector: i64,
    successful_waves: u32,
    failed_waves: u32,
    stadium_level: u32,
    time_elapsed: f64,
    venue: &'a str,
    venue_name: String,
    venue_difficulty: &'static str,
}

#[derive(Serialize)]
struct EventView {
    #[serde(rename = "type")]
    kind: &'static str,
    data: Value,
    time: f64,
}

#[derive(Serialize)]
struct LoadResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

/// Host-facing handle that owns one play session.
#[derive(Debug)]
pub struct Bridge {
    session: Session,
    venue_key: String,
}

impl Bridge {
    /// Creates a session at the named built-in venue.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Venue`] when the venue name is unknown.
    pub fn new(venue: &str, seed: u64) -> Result<Self, BridgeError> {
        let id: VenueId = venue.parse()?;
        let profile = id.profile()?;
        Ok(Self::with_profile(profile, id.as_str(), seed))
    }

    /// Creates a session with the default venue tuning and a custom sector count.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Venue`] when `sector_count` is zero.
    pub fn with_sector_count(sector_count: u32, seed: u64) -> Result<Self, BridgeError> {
        let profile = stadium_wave_venues::with_sector_count(sector_count)?;
        let venue_key = VenueId::default().as_str();
        Ok(Self::with_profile(profile, venue_key, seed))
    }

    /// Creates a session at an arbitrary venue.
    #[must_use]
    pub fn with_profile(profile: VenueProfile, venue_key: &str, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self {
            session: Session::new(profile, &mut rng),
            venue_key: venue_key.to_owned(),
        }
    }

    /// Wraps an existing session, reporting its venue as custom.
    #[must_use]
    pub fn from_session(session: Session) -> Self {
        Self {
            session,
            venue_key: CUSTOM_VENUE_KEY.to_owned(),
        }
    }

    /// Read-only access to the owned session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the owned session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Describes the freshly created session.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encode`] if the document cannot be serialised.
    pub fn init_response(&self) -> Result<String, BridgeError> {
        let venue = query::venue(&self.session);
        let response = InitResponse {
            status: "initialized",
            sectors: venue.sector_count(),
            venue: &self.venue_key,
            venue_name: venue.name(),
            difficulty: venue.difficulty().label(),
        };
        Ok(serde_json::to_string(&response)?)
    }

    /// Advances the simulation by `dt` seconds and returns the new state.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidDelta`] for negative or non-finite steps.
    pub fn update(&mut self, dt: f64) -> Result<String, BridgeError> {
        let step = Duration::try_from_secs_f64(dt).map_err(|_| BridgeError::InvalidDelta(dt))?;
        self.session.tick(step);
        self.state()
    }

    /// Starts a wave at the provided sector.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Session`] when the sector does not exist.
    pub fn start_wave_at(&mut self, sector: u32) -> Result<String, BridgeError> {
        let success = self.session.start_wave(SectorIndex::new(sector))?;
        Ok(json!({ "success": success, "sector": sector }).to_string())
    }

    /// Boosts the energy of the provided sector.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Session`] when the sector does not exist.
    pub fn boost_sector_energy(&mut self, sector: u32) -> Result<String, BridgeError> {
        self.session.boost_sector(SectorIndex::new(sector))?;
        Ok(json!({ "boosted": sector }).to_string())
    }

    /// Triggers a named crowd event (`mascot` or `scoreboard`).
    ///
    /// # Errors
    ///
    /// Fails for unknown event names, mascots without a sector, and sectors
    /// that do not exist.
    pub fn trigger_event(
        &mut self,
        kind: &str,
        sector: Option<u32>,
    ) -> Result<String, BridgeError> {
        let event = match kind {
            "mascot" => CrowdEvent::Mascot {
                sector: SectorIndex::new(sector.ok_or(BridgeError::MissingMascotSector)?),
            },
            "scoreboard" => CrowdEvent::Scoreboard,
            other => return Err(BridgeError::UnknownCrowdEvent(other.to_owned())),
        };
        self.session.trigger_event(event)?;
        Ok(json!({ "triggered": kind, "sector": sector }).to_string())
    }

    /// Returns the full session state.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encode`] if the document cannot be serialised.
    pub fn state(&self) -> Result<String, BridgeError> {
        let snapshot = query::snapshot(&self.session);
        let view = state_view(&snapshot, &self.venue_key);
        Ok(serde_json::to_string(&view)?)
    }

    /// Drains pending events.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Encode`] if the document cannot be serialised.
    pub fn events(&mut self) -> Result<String, BridgeError> {
        let events = self.session.drain_events();
        let views: Vec<EventView> = events.iter().map(event_view).collect();
        Ok(serde_json::to_string(&views)?)
    }

    /// Encodes the persistent progress as an opaque save string.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Save`] if the progress cannot be encoded.
    pub fn save(&self) -> Result<String, BridgeError> {
        Ok(save::encode(&query::progress(&self.session))?)
    }

    /// Restores persistent progress from a save string.
    ///
    /// The crowd and venue are never touched; on failure nothing changes.
    ///
    /// # Errors
    ///
    /// Returns the [`SaveError`] describing the malformed save.
    pub fn import_save(&mut self, blob: &str) -> Result<(), SaveError> {
        let progress = save::decode(blob)?;
        self.session.restore_progress(progress);
        Ok(())
    }

    /// Restores progress and reports the outcome as a status document.
    #[must_use]
    pub fn load(&mut self, blob: &str) -> String {
        let response = match self.import_save(blob) {
            Ok(()) => LoadResponse {
                status: "loaded",
                message: None,
            },
            Err(error) => {
                warn!(%error, "rejected malformed save");
                LoadResponse {
                    status: "error",
                    message: Some(error.to_string()),
                }
            }
        };
        serde_json::to_string(&response).unwrap_or_else(|_| r#"{"status":"error"}"#.to_owned())
    }
}

fn state_view<'a>(snapshot: &SessionSnapshot, venue_key: &'a str) -> StateView<'a> {
    StateView {
        sectors: snapshot
            .sectors
            .iter()
            .map(|sector| SectorView {
                id: sector.index.get(),
                state: sector.state.as_str(),
                energy: sector.energy,
                fatigue: sector.fatigue,
                enthusiasm: sector.enthusiasm,
                distractions: sector.distraction,
                crowd_size: sector.crowd_size,
            })
            .collect(),
        score: snapshot.score,
        combo: snapshot.combo,
        max_combo: snapshot.max_combo,
        wave_active: snapshot.wave_active,
        current_wave_sector: snapshot
            .current_wave
            .map_or(-1, |sector| i64::from(sector.get())),
        successful_waves: snapshot.successful_waves,
        failed_waves: snapshot.failed_waves,
        stadium_level: snapshot.stadium_level,
        time_elapsed: snapshot.session_clock.as_secs_f64(),
        venue: venue_key,
        venue_name: snapshot.venue_name.clone(),
        venue_difficulty: snapshot.venue_difficulty.label(),
    }
}

fn event_view(timed: &TimedEvent) -> EventView {
    let data = match timed.event {
        Event::WaveStarted { sector } => json!(sector.get()),
        Event::WaveCompleted { combo, bonus } => json!({ "combo": combo, "bonus": bonus }),
        Event::WaveFailed {
            sector,
            last_reached,
        } => json!({ "sector": sector.get(), "last_reached": last_reached.get() }),
    };
    EventView {
        kind: timed.event.kind(),
        data,
        time: timed.timestamp.as_secs_f64(),
    }
}
