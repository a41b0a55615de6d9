use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use stadium_wave_core::{
    Command, CrowdEvent, Difficulty, Event, SectorIndex, SectorState, SessionError, VenueProfile,
};
use stadium_wave_world::{self as world, query, CrowdSeed, Session, SessionOptions};

const INTERVAL: Duration = Duration::from_millis(350);

fn venue(sectors: u32) -> VenueProfile {
    VenueProfile::new(
        "Test Ballpark",
        "Deterministic test venue",
        sectors,
        INTERVAL,
        0.15,
        0.75,
        Difficulty::Easy,
    )
    .expect("valid venue")
}

/// Builds a ring where every sector has enthusiasm 0.8 and energy 0.8.
fn primed_session(sectors: u32) -> Session {
    let crowd = (0..sectors)
        .map(|_| CrowdSeed {
            enthusiasm: 0.8,
            crowd_size: 100,
        })
        .collect();
    let mut session =
        Session::from_crowd(venue(sectors), SessionOptions::default(), crowd).expect("session");
    for index in 0..sectors {
        session
            .sector_mut(SectorIndex::new(index))
            .expect("sector exists")
            .set_energy(0.8);
    }
    session
}

fn start(session: &mut Session, index: u32) -> bool {
    session
        .start_wave(SectorIndex::new(index))
        .expect("valid index")
}

#[test]
fn full_circuit_completes_and_awards_bonus() {
    let mut session = primed_session(8);
    assert!(start(&mut session, 0));

    let mut ticks = 0;
    while query::snapshot(&session).wave_active {
        session.tick(INTERVAL);
        ticks += 1;
        assert!(ticks <= 8, "wave should finish within one lap");
    }

    let snapshot = query::snapshot(&session);
    assert_eq!(ticks, 8);
    assert_eq!(snapshot.successful_waves, 1);
    assert_eq!(snapshot.failed_waves, 0);
    assert_eq!(snapshot.combo, 8, "combo carries over a completed wave");
    assert_eq!(snapshot.max_combo, 8);
    assert_eq!(snapshot.current_wave, None);

    let stand_points: u64 = (1..=8).map(|combo| 10 * combo).sum();
    let bonus = 100 + 50 * 8;
    assert_eq!(snapshot.score, stand_points + bonus);

    let events: Vec<Event> = session
        .drain_events()
        .into_iter()
        .map(|timed| timed.event)
        .collect();
    assert_eq!(
        events,
        vec![
            Event::WaveStarted {
                sector: SectorIndex::new(0)
            },
            Event::WaveCompleted { combo: 8, bonus },
        ]
    );
}

#[test]
fn wave_visits_sectors_in_ring_order() {
    let mut session = primed_session(8);
    assert!(start(&mut session, 5));

    let mut visited = Vec::new();
    while let Some(current) = query::snapshot(&session).current_wave {
        if visited.last() != Some(&current) {
            visited.push(current);
        }
        session.tick(INTERVAL);
    }

    let expected: Vec<SectorIndex> = [5, 6, 7, 0, 1, 2, 3, 4]
        .into_iter()
        .map(SectorIndex::new)
        .collect();
    assert_eq!(visited, expected);
}

#[test]
fn unready_sector_fails_the_wave() {
    let mut session = primed_session(8);
    session
        .sector_mut(SectorIndex::new(3))
        .expect("sector exists")
        .set_energy(0.0);
    assert!(start(&mut session, 0));

    for _ in 0..3 {
        session.tick(INTERVAL);
    }

    let snapshot = query::snapshot(&session);
    assert!(!snapshot.wave_active);
    assert_eq!(snapshot.combo, 0);
    assert_eq!(snapshot.failed_waves, 1);
    assert_eq!(snapshot.successful_waves, 0);
    assert_eq!(snapshot.max_combo, 0);

    let events = session.drain_events();
    let failure = events.last().expect("failure recorded");
    assert_eq!(
        failure.event,
        Event::WaveFailed {
            sector: SectorIndex::new(3),
            last_reached: SectorIndex::new(2),
        }
    );
    assert_eq!(failure.timestamp, INTERVAL * 3);
}

#[test]
fn second_start_while_active_changes_nothing() {
    let mut session = primed_session(8);
    assert!(start(&mut session, 0));
    let before = query::snapshot(&session);
    let pending = query::pending_events(&session).to_vec();

    assert!(!start(&mut session, 4));

    assert_eq!(query::snapshot(&session), before);
    assert_eq!(query::pending_events(&session), pending.as_slice());
    let sector = query::sector(&session, SectorIndex::new(4)).expect("sector exists");
    assert_eq!(sector.state(), SectorState::Idle);
}

#[test]
fn unready_sector_cannot_start_a_wave() {
    let mut session = primed_session(4);
    session
        .sector_mut(SectorIndex::new(1))
        .expect("sector exists")
        .set_fatigue(0.9);

    assert!(!start(&mut session, 1));
    assert!(!query::snapshot(&session).wave_active);
    assert!(query::pending_events(&session).is_empty());
}

#[test]
fn draining_empties_the_queue() {
    let mut session = primed_session(4);
    assert!(start(&mut session, 2));

    let first = session.drain_events();
    let second = session.drain_events();
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn mascot_distracts_three_wrapped_sectors() {
    let mut session = primed_session(8);
    session
        .trigger_event(CrowdEvent::Mascot {
            sector: SectorIndex::new(0),
        })
        .expect("valid index");

    let snapshot = query::snapshot(&session);
    for sector in &snapshot.sectors {
        let expected = match sector.index.get() {
            7 | 0 | 1 => 0.3,
            _ => 0.0,
        };
        assert!(
            (sector.distraction - expected).abs() < 1e-6,
            "sector {} distraction {}",
            sector.index,
            sector.distraction
        );
    }
}

#[test]
fn scoreboard_boosts_every_sector() {
    let mut session = primed_session(4);
    session
        .sector_mut(SectorIndex::new(2))
        .expect("sector exists")
        .set_distraction(0.5);
    session
        .trigger_event(CrowdEvent::Scoreboard)
        .expect("scoreboard ignores indices");

    let snapshot = query::snapshot(&session);
    for sector in &snapshot.sectors {
        assert!((sector.energy - 1.0).abs() < 1e-6);
    }
    assert!((snapshot.sectors[2].distraction - 0.4).abs() < 1e-6);
}

#[test]
fn out_of_range_indices_are_reported_consistently() {
    let mut session = primed_session(4);
    let before = query::snapshot(&session);
    let missing = SectorIndex::new(4);
    let expected = SessionError::InvalidIndex {
        index: missing,
        sector_count: 4,
    };

    assert_eq!(session.start_wave(missing), Err(expected));
    assert_eq!(session.boost_sector(missing), Err(expected));
    assert_eq!(
        session.trigger_event(CrowdEvent::Mascot { sector: missing }),
        Err(expected)
    );
    assert_eq!(query::snapshot(&session), before);
}

#[test]
fn apply_routes_commands() {
    let mut session = primed_session(4);
    let sector = SectorIndex::new(1);

    let mut apply = |command: Command| world::apply(&mut session, command).expect("valid");

    assert!(apply(Command::BoostSector { sector }));
    assert!(apply(Command::StartWave { sector }));
    assert!(!apply(Command::StartWave { sector }));
    assert!(apply(Command::Tick { dt: INTERVAL }));

    let snapshot = query::snapshot(&session);
    assert_eq!(snapshot.session_clock, INTERVAL);
    assert_eq!(snapshot.current_wave, Some(SectorIndex::new(2)));
    assert_eq!(snapshot.wave_start, Some(sector));
}

#[test]
fn random_play_keeps_every_invariant() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed_cafe);
    let mut session = Session::new(venue(12), &mut rng);

    for _ in 0..2_000 {
        let sector = SectorIndex::new(rng.gen_range(0..12));
        let command = match rng.gen_range(0..10) {
            0 => Command::StartWave { sector },
            1 => Command::BoostSector { sector },
            2 => Command::TriggerCrowdEvent {
                event: CrowdEvent::Mascot { sector },
            },
            3 => Command::TriggerCrowdEvent {
                event: CrowdEvent::Scoreboard,
            },
            _ => Command::Tick {
                dt: Duration::from_millis(rng.gen_range(0..400)),
            },
        };
        let score_before = query::snapshot(&session).score;
        let _ = world::apply(&mut session, command).expect("indices are in range");

        let snapshot = query::snapshot(&session);
        assert!(snapshot.score >= score_before, "score never decreases");
        assert_eq!(snapshot.wave_active, snapshot.current_wave.is_some());
        assert_eq!(snapshot.wave_active, snapshot.wave_start.is_some());
        if let Some(current) = snapshot.current_wave {
            assert!(current.get() < 12);
        }
        for sector in &snapshot.sectors {
            for value in [
                sector.energy,
                sector.fatigue,
                sector.enthusiasm,
                sector.distraction,
            ] {
                assert!((0.0..=1.0).contains(&value), "{sector:?} out of bounds");
            }
        }
    }
}
