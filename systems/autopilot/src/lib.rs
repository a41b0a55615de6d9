#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic autopilot that plays Stadium Wave without a human.
//!
//! The autopilot consumes drained session events and an immutable snapshot,
//! then emits the commands a player would issue: starting waves on the most
//! eager sector, boosting the sector the wave is about to reach, and rolling
//! the stadium's mascot and scoreboard events.

use std::time::Duration;

use stadium_wave_core::{
    Command, CrowdEvent, Event, SectorIndex, SectorSnapshot, SectorState, SessionSnapshot,
    TimedEvent, READINESS_THRESHOLD,
};

const RNG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const RNG_INCREMENT: u64 = 1;
const MASCOT_ODDS: u64 = 3;
const SUPPORT_MARGIN: f32 = 0.1;

/// Configuration parameters required to construct the autopilot.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    boost_cooldown: Duration,
    restart_delay: Duration,
    crowd_event_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration with default pacing and the provided seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self {
            boost_cooldown: Duration::from_millis(400),
            restart_delay: Duration::from_secs(2),
            crowd_event_interval: Duration::from_secs(5),
            rng_seed,
        }
    }

    /// Minimum simulated time between two boosts.
    #[must_use]
    pub const fn with_boost_cooldown(mut self, cooldown: Duration) -> Self {
        self.boost_cooldown = cooldown;
        self
    }

    /// Time to let the crowd rest after a wave ends before starting another.
    #[must_use]
    pub const fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.restart_delay = delay;
        self
    }

    /// Cadence of random crowd events; zero disables them.
    #[must_use]
    pub const fn with_crowd_event_interval(mut self, interval: Duration) -> Self {
        self.crowd_event_interval = interval;
        self
    }
}

/// Pure system that emits player commands from session snapshots.
#[derive(Debug)]
pub struct Autopilot {
    config: Config,
    rng_state: u64,
    next_boost_at: Duration,
    resume_at: Duration,
    next_crowd_event_at: Duration,
}

impl Autopilot {
    /// Creates a new autopilot using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng_state: config.rng_seed,
            next_boost_at: Duration::ZERO,
            resume_at: Duration::ZERO,
            next_crowd_event_at: config.crowd_event_interval,
        }
    }

    /// Consumes drained events and the current snapshot to emit commands.
    pub fn handle(
        &mut self,
        events: &[TimedEvent],
        snapshot: &SessionSnapshot,
        out: &mut Vec<Command>,
    ) {
        for timed in events {
            if let Event::WaveCompleted { .. } | Event::WaveFailed { .. } = timed.event {
                self.resume_at = timed.timestamp.saturating_add(self.config.restart_delay);
            }
        }

        let now = snapshot.session_clock;
        if snapshot.sectors.is_empty() {
            return;
        }

        if let Some(current) = snapshot.current_wave {
            self.support_wave(snapshot, current, now, out);
        } else if now >= self.resume_at {
            self.launch_wave(snapshot, now, out);
        }

        self.roll_crowd_event(snapshot, now, out);
    }

    fn support_wave(
        &mut self,
        snapshot: &SessionSnapshot,
        current: SectorIndex,
        now: Duration,
        out: &mut Vec<Command>,
    ) {
        let ring = snapshot.sectors.len() as u32;
        let next = current.wrapping_offset(1, ring);
        if Some(next) == snapshot.wave_start {
            return;
        }
        let Some(sector) = snapshot.sector(next) else {
            return;
        };
        if sector.readiness() <= READINESS_THRESHOLD + SUPPORT_MARGIN {
            self.boost(next, now, out);
        }
    }

    fn launch_wave(&mut self, snapshot: &SessionSnapshot, now: Duration, out: &mut Vec<Command>) {
        let best = snapshot
            .sectors
            .iter()
            .filter(|sector| sector.is_ready())
            .max_by(|a, b| a.readiness().total_cmp(&b.readiness()));
        if let Some(sector) = best {
            out.push(Command::StartWave {
                sector: sector.index,
            });
            return;
        }

        if let Some(sector) = most_promising(&snapshot.sectors) {
            self.boost(sector.index, now, out);
        }
    }

    fn boost(&mut self, sector: SectorIndex, now: Duration, out: &mut Vec<Command>) {
        if now < self.next_boost_at {
            return;
        }
        self.next_boost_at = now.saturating_add(self.config.boost_cooldown);
        out.push(Command::BoostSector { sector });
    }

    fn roll_crowd_event(
        &mut self,
        snapshot: &SessionSnapshot,
        now: Duration,
        out: &mut Vec<Command>,
    ) {
        let interval = self.config.crowd_event_interval;
        if interval.is_zero() {
            return;
        }

        while now >= self.next_crowd_event_at {
            self.next_crowd_event_at = self.next_crowd_event_at.saturating_add(interval);
            let roll = self.advance_rng();
            let event = if roll % MASCOT_ODDS == 0 {
                let index = (roll >> 32) % snapshot.sectors.len() as u64;
                CrowdEvent::Mascot {
                    sector: SectorIndex::new(index as u32),
                }
            } else {
                CrowdEvent::Scoreboard
            };
            out.push(Command::TriggerCrowdEvent { event });
        }
    }

    fn advance_rng(&mut self) -> u64 {
        self.rng_state = self
            .rng_state
            .wrapping_mul(RNG_MULTIPLIER)
            .wrapping_add(RNG_INCREMENT);
        self.rng_state
    }
}

/// Idle or seated sector closest to readiness.
fn most_promising(sectors: &[SectorSnapshot]) -> Option<&SectorSnapshot> {
    sectors
        .iter()
        .filter(|sector| is_resting(sector.state))
        .max_by(|a, b| a.readiness().total_cmp(&b.readiness()))
}

fn is_resting(state: SectorState) -> bool {
    matches!(state, SectorState::Idle | SectorState::Seated)
}
