#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Venue presets and custom venue loading for Stadium Wave.
//!
//! Sessions only ever see a validated [`VenueProfile`]. This crate maps the
//! closed set of built-in venues onto profiles, synthesizes profiles for hosts
//! that only know a sector count, and parses custom venues from TOML.

use std::{fmt, fs, path::Path, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use serde::Deserialize;
use stadium_wave_core::{Difficulty, VenueError, VenueProfile};

/// Built-in venues shipped with the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VenueId {
    /// Classic ballpark; the easiest venue.
    #[default]
    Baseball,
    /// International football arena.
    Soccer,
    /// Traditional cricket oval; the hardest venue.
    Cricket,
}

struct Preset {
    name: &'static str,
    description: &'static str,
    sector_count: u32,
    interval_ms: u64,
    energy_drain: f32,
    base_enthusiasm: f32,
    difficulty: Difficulty,
}

const BASEBALL: Preset = Preset {
    name: "Baseball Stadium",
    description: "Classic American ballpark - Easy difficulty",
    sector_count: 16,
    interval_ms: 350,
    energy_drain: 0.15,
    base_enthusiasm: 0.75,
    difficulty: Difficulty::Easy,
};

const SOCCER: Preset = Preset {
    name: "Soccer Stadium",
    description: "International football arena - Medium difficulty",
    sector_count: 20,
    interval_ms: 300,
    energy_drain: 0.2,
    base_enthusiasm: 0.70,
    difficulty: Difficulty::Medium,
};

const CRICKET: Preset = Preset {
    name: "Cricket Ground",
    description: "Traditional cricket oval - Hard difficulty",
    sector_count: 24,
    interval_ms: 250,
    energy_drain: 0.25,
    base_enthusiasm: 0.65,
    difficulty: Difficulty::Hard,
};

impl VenueId {
    /// Every built-in venue, easiest first.
    pub const ALL: [VenueId; 3] = [Self::Baseball, Self::Soccer, Self::Cricket];

    /// Stable lower-case identifier of the venue.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Baseball => "baseball",
            Self::Soccer => "soccer",
            Self::Cricket => "cricket",
        }
    }

    /// Builds the tuning profile of the venue.
    ///
    /// # Errors
    ///
    /// Returns [`VenueError`] if the preset table holds an invalid entry.
    pub fn profile(self) -> Result<VenueProfile, VenueError> {
        let preset = self.preset();
        VenueProfile::new(
            preset.name,
            preset.description,
            preset.sector_count,
            Duration::from_millis(preset.interval_ms),
            preset.energy_drain,
            preset.base_enthusiasm,
            preset.difficulty,
        )
    }

    const fn preset(self) -> &'static Preset {
        match self {
            Self::Baseball => &BASEBALL,
            Self::Soccer => &SOCCER,
            Self::Cricket => &CRICKET,
        }
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VenueId {
    type Err = VenueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|venue| venue.as_str() == normalized)
            .ok_or_else(|| VenueError::UnknownVenue(value.to_owned()))
    }
}

/// Synthesizes a profile with the default venue's tuning and a custom sector count.
///
/// # Errors
///
/// Returns [`VenueError::ZeroSectors`] when `sector_count` is zero.
pub fn with_sector_count(sector_count: u32) -> Result<VenueProfile, VenueError> {
    VenueId::default().profile()?.with_sector_count(sector_count)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VenueFile {
    name: String,
    #[serde(default)]
    description: String,
    sector_count: u32,
    propagation_interval_ms: u64,
    energy_drain: f32,
    base_enthusiasm: f32,
    difficulty: Difficulty,
}

/// Parses a custom venue from TOML contents.
///
/// # Errors
///
/// Fails when the document is not valid TOML, misses a field, or describes
/// an invalid venue.
pub fn load_profile_toml(contents: &str) -> Result<VenueProfile> {
    let file: VenueFile =
        toml::from_str(contents).context("failed to parse venue toml contents")?;
    let name = file.name.clone();
    VenueProfile::new(
        file.name,
        file.description,
        file.sector_count,
        Duration::from_millis(file.propagation_interval_ms),
        file.energy_drain,
        file.base_enthusiasm,
        file.difficulty,
    )
    .with_context(|| format!("venue `{name}` is invalid"))
}

/// Reads and parses a custom venue TOML file.
///
/// # Errors
///
/// Fails when the file cannot be read or [`load_profile_toml`] rejects it.
pub fn load_profile_file(path: &Path) -> Result<VenueProfile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read venue file at {}", path.display()))?;
    load_profile_toml(&contents)
}
