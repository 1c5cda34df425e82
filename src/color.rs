//! Metadata color mapping
//!
//! Hue encodes change frequency, saturation encodes recency:
//! - Standard palette: 240 (blue, quiet) → 0 (red, hot)
//! - Color-blind palette: 270 (purple) → 30 (orange)
//! - Saturation: 70 for code touched today, fading to 20 after a year
//!
//! All functions are pure; `now` is always supplied by the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{CityData, GitMetadata};

pub const DEFAULT_HUE: f64 = 200.0;
pub const DEFAULT_SATURATION: f64 = 70.0;
pub const BASE_LIGHTNESS: f64 = 50.0;
pub const SHADE_STEP: f64 = 20.0;
pub const DEFAULT_RECENT_DAYS: f64 = 7.0;

const HUE_SPAN: f64 = 240.0;
const STANDARD_HUE_START: f64 = 240.0;
const COLOR_BLIND_HUE_START: f64 = 270.0;
const MIN_SATURATION: f64 = 20.0;
const SATURATION_SPAN: f64 = 50.0;
const DAYS_PER_YEAR: f64 = 365.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// HSL color; hue in degrees, saturation and lightness in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hsl {
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl Hsl {
    pub const fn new(hue: f64, saturation: f64, lightness: f64) -> Self {
        Self { hue, saturation, lightness }
    }

    /// Same hue and saturation, lightness shifted (not clamped)
    pub fn lighten(self, delta: f64) -> Self {
        Self { lightness: self.lightness + delta, ..self }
    }

    /// CSS color string. Out-of-range lightness is passed through as-is.
    pub fn to_css(self) -> String {
        format!(
            "hsl({}, {}%, {}%)",
            round2(self.hue),
            round2(self.saturation),
            round2(self.lightness)
        )
    }

    /// 8-bit sRGB; saturation and lightness saturate at [0, 100] here
    pub fn to_rgb(self) -> [u8; 3] {
        let h = self.hue.rem_euclid(360.0) / 360.0;
        let s = (self.saturation / 100.0).clamp(0.0, 1.0);
        let l = (self.lightness / 100.0).clamp(0.0, 1.0);

        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
        let m = l - c / 2.0;

        let (r, g, b) = match (h * 6.0) as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        let to_byte = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        [to_byte(r), to_byte(g), to_byte(b)]
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Face colors of an isometric box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Shades {
    pub top: Hsl,
    pub right: Hsl,
    pub left: Hsl,
}

/// Three-face shading: top lighter, right as-is, left darker
pub fn shades_of(color: Hsl) -> Shades {
    Shades {
        top: color.lighten(SHADE_STEP),
        right: color,
        left: color.lighten(-SHADE_STEP),
    }
}

/// User toggles that drive the mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorOptions {
    pub frequency: bool,
    pub age: bool,
    pub color_blind: bool,
}

impl Default for ColorOptions {
    fn default() -> Self {
        Self {
            frequency: true,
            age: true,
            color_blind: false,
        }
    }
}

/// Dataset-wide bounds used to normalize raw metrics
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NormalizationBounds {
    pub max_commits: u64,
    pub max_authors: u64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

impl NormalizationBounds {
    pub fn from_data(data: &CityData) -> Self {
        let mut bounds = Self::default();
        for (_, _, class) in data.classes() {
            let Some(meta) = &class.git_metadata else {
                continue;
            };
            bounds.max_commits = bounds.max_commits.max(meta.commits);
            bounds.max_authors = bounds.max_authors.max(meta.authors);
            if let Some(ts) = meta.last_modified {
                bounds.oldest = Some(bounds.oldest.map_or(ts, |o| o.min(ts)));
                bounds.newest = Some(bounds.newest.map_or(ts, |n| n.max(ts)));
            }
        }
        bounds
    }
}

/// Maps git metadata to colors; built once per dataset load
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorMapper {
    bounds: NormalizationBounds,
}

impl ColorMapper {
    pub fn new(bounds: NormalizationBounds) -> Self {
        Self { bounds }
    }

    pub fn from_data(data: &CityData) -> Self {
        Self::new(NormalizationBounds::from_data(data))
    }

    pub fn bounds(&self) -> &NormalizationBounds {
        &self.bounds
    }

    /// Base color for a class
    pub fn color_for(
        &self,
        metadata: Option<&GitMetadata>,
        options: ColorOptions,
        now: DateTime<Utc>,
    ) -> Hsl {
        let hue = match metadata {
            Some(meta) if options.frequency => self.hue_for(meta.commits, options.color_blind),
            _ => DEFAULT_HUE,
        };

        let saturation = match metadata.and_then(|m| m.last_modified) {
            Some(ts) if options.age => saturation_for_age(age_in_days(ts, now)),
            _ => DEFAULT_SATURATION,
        };

        Hsl::new(hue, saturation, BASE_LIGHTNESS)
    }

    /// Heat-map hue for a commit count
    pub fn hue_for(&self, commits: u64, color_blind: bool) -> f64 {
        let normalized = if self.bounds.max_commits == 0 {
            0.0
        } else {
            (commits as f64 / self.bounds.max_commits as f64).clamp(0.0, 1.0)
        };
        hue_start(color_blind) - normalized * HUE_SPAN
    }
}

fn hue_start(color_blind: bool) -> f64 {
    if color_blind {
        COLOR_BLIND_HUE_START
    } else {
        STANDARD_HUE_START
    }
}

/// Hue endpoints (fewest commits, most commits) of the active palette
pub fn hue_range(color_blind: bool) -> (f64, f64) {
    let start = hue_start(color_blind);
    (start, start - HUE_SPAN)
}

/// Fractional days between `ts` and `now`
pub fn age_in_days(ts: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (now - ts).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// 70 for age 0, linearly down to 20 at one year and beyond
pub fn saturation_for_age(age_days: f64) -> f64 {
    let factor = (1.0 - age_days / DAYS_PER_YEAR).clamp(0.0, 1.0);
    MIN_SATURATION + factor * SATURATION_SPAN
}

/// True iff modified within `days`; false without a timestamp
pub fn is_recent(metadata: Option<&GitMetadata>, days: f64, now: DateTime<Utc>) -> bool {
    metadata
        .and_then(|m| m.last_modified)
        .is_some_and(|ts| age_in_days(ts, now) <= days)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FrequencyLabel {
    NoChanges,
    SingleChange,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl FrequencyLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyLabel::NoChanges => "No changes",
            FrequencyLabel::SingleChange => "Single change",
            FrequencyLabel::Low => "Low activity",
            FrequencyLabel::Moderate => "Moderate activity",
            FrequencyLabel::High => "High activity",
            FrequencyLabel::VeryHigh => "Very high activity",
        }
    }
}

impl fmt::Display for FrequencyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn frequency_label(commits: u64) -> FrequencyLabel {
    match commits {
        0 => FrequencyLabel::NoChanges,
        1 => FrequencyLabel::SingleChange,
        2..=4 => FrequencyLabel::Low,
        5..=14 => FrequencyLabel::Moderate,
        15..=49 => FrequencyLabel::High,
        _ => FrequencyLabel::VeryHigh,
    }
}

/// Human-friendly age, floor-divided on whole days
pub fn format_relative_date(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - ts).num_days().max(0);
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        d if d < 7 => format!("{} days ago", d),
        d if d < 30 => format!("{} weeks ago", d / 7),
        d if d < 365 => format!("{} months ago", d / 30),
        d => format!("{} years ago", d / 365),
    }
}
