#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Stadium Wave session under the autopilot.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stadium_wave_bridge::save;
use stadium_wave_core::{Command, Event, TimedEvent, VenueProfile, WELCOME_BANNER};
use stadium_wave_system_autopilot::{Autopilot, Config};
use stadium_wave_venues::VenueId;
use stadium_wave_world::{self as world, query, Session, SessionOptions};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for a headless Stadium Wave session.
#[derive(Debug, Parser)]
#[command(
    name = "stadium-wave",
    about = "Plays a Stadium Wave session with the autopilot and prints the result."
)]
struct CliArgs {
    /// Built-in venue to play at (baseball, soccer or cricket).
    #[arg(long, default_value_t = VenueId::Baseball)]
    venue: VenueId,
    /// Overrides the number of sectors around the ring.
    #[arg(long)]
    sectors: Option<u32>,
    /// Loads a custom venue from a TOML file instead of a built-in one.
    #[arg(long, value_name = "PATH", conflicts_with = "venue")]
    venue_file: Option<PathBuf>,
    /// Seed for the crowd and the autopilot.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Number of simulation ticks to run.
    #[arg(long, default_value_t = 2_400)]
    ticks: u32,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    dt_ms: u64,
    /// Clears the combo after every completed wave.
    #[arg(long)]
    reset_combo: bool,
}

/// Entry point for the Stadium Wave command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let profile = resolve_profile(&args)?;
    let options = SessionOptions::default().with_reset_combo_on_complete(args.reset_combo);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut session = Session::with_options(profile, options, &mut rng);

    println!("{WELCOME_BANNER}");
    run(&mut session, &args)?;
    print_summary(&session);

    let blob = save::encode(&query::progress(&session)).context("failed to export save")?;
    println!("save: {blob}");
    Ok(())
}

fn resolve_profile(args: &CliArgs) -> Result<VenueProfile> {
    let profile = match &args.venue_file {
        Some(path) => stadium_wave_venues::load_profile_file(path)?,
        None => args
            .venue
            .profile()
            .with_context(|| format!("failed to build venue `{}`", args.venue))?,
    };
    match args.sectors {
        Some(count) => profile
            .with_sector_count(count)
            .with_context(|| format!("cannot play with {count} sectors")),
        None => Ok(profile),
    }
}

fn run(session: &mut Session, args: &CliArgs) -> Result<()> {
    let dt = Duration::from_millis(args.dt_ms);
    let mut autopilot = Autopilot::new(Config::new(args.seed));
    let mut commands = Vec::new();

    for _ in 0..args.ticks {
        let _ = world::apply(session, Command::Tick { dt })?;
        let events = session.drain_events();
        for timed in &events {
            print_event(timed);
        }

        autopilot.handle(&events, &query::snapshot(session), &mut commands);
        for command in commands.drain(..) {
            debug!(?command, "autopilot command");
            let description = format!("{command:?}");
            let _ = world::apply(session, command)
                .with_context(|| format!("autopilot issued an invalid command: {description}"))?;
        }
    }
    Ok(())
}

fn print_event(timed: &TimedEvent) {
    let at = timed.timestamp.as_secs_f64();
    match timed.event {
        Event::WaveStarted { sector } => println!("[{at:>8.2}s] wave started at sector {sector}"),
        Event::WaveCompleted { combo, bonus } => {
            println!("[{at:>8.2}s] wave completed with combo {combo} (+{bonus})");
        }
        Event::WaveFailed {
            sector,
            last_reached,
        } => println!("[{at:>8.2}s] wave stalled at sector {sector} after {last_reached}"),
    }
}

fn print_summary(session: &Session) {
    let snapshot = query::snapshot(session);
    println!(
        "{} ({}) after {:.1}s",
        snapshot.venue_name,
        snapshot.venue_difficulty.label(),
        snapshot.session_clock.as_secs_f64()
    );
    println!("score:      {}", snapshot.score);
    println!("max combo:  {}", snapshot.max_combo);
    println!(
        "waves:      {} completed, {} failed",
        snapshot.successful_waves, snapshot.failed_waves
    );
}
