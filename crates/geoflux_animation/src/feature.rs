//! Per-feature layer animations
//!
//! A layer animates style properties (radius, height, opacity, ...) as a
//! factor in [0, 1] of the configured style value. Each style key carries one
//! [`FeatureTrack`]. Without `random` every feature shares one clock and the
//! track stores O(1) state; with `random` each feature gets a phase offset
//! (and optionally its own duration) drawn once per configuration from a
//! seeded generator.

use crate::easing::Easing;
use crate::samples::ValueSamples;
use crate::tween::validate_duration;
use geoflux_core::{Completion, ConfigError, FeatureStyleSink, LayerId, Result, StyleKey};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use rustc_hash::FxHashMap;
use serde::{de, Deserialize, Deserializer};
use std::fmt;

/// A half-open millisecond range
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "TimeRangeRepr")]
pub struct TimeRange {
    pub start: f32,
    pub end: f32,
}

impl TimeRange {
    pub fn new(start: f32, end: f32) -> Result<Self> {
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end < start {
            return Err(ConfigError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Range `[0, end)`
    pub fn upto(end: f32) -> Result<Self> {
        Self::new(0.0, end)
    }

    /// The single value `ms`
    pub fn fixed(ms: f32) -> Result<Self> {
        Self::new(ms, ms)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    fn draw(&self, rng: &mut Xoshiro256StarStar) -> f32 {
        if self.is_empty() {
            self.start
        } else {
            rng.random_range(self.start..self.end)
        }
    }
}

/// `2000` means `[0, 2000)`, `[500, 2000]` is taken as is
#[derive(Deserialize)]
#[serde(untagged)]
enum TimeRangeRepr {
    Upto(f32),
    Bounds([f32; 2]),
}

impl TryFrom<TimeRangeRepr> for TimeRange {
    type Error = ConfigError;

    fn try_from(repr: TimeRangeRepr) -> Result<Self> {
        match repr {
            TimeRangeRepr::Upto(end) => TimeRange::upto(end),
            TimeRangeRepr::Bounds([start, end]) => TimeRange::new(start, end),
        }
    }
}

/// Per-feature run time: `1000` is exactly 1000ms, `[300, 600]` a range
fn deserialize_run_time<'de, D>(deserializer: D) -> std::result::Result<Option<TimeRange>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(repr) = Option::<TimeRangeRepr>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let range = match repr {
        TimeRangeRepr::Upto(ms) => TimeRange::fixed(ms),
        TimeRangeRepr::Bounds([start, end]) => TimeRange::new(start, end),
    };
    range.map(Some).map_err(de::Error::custom)
}

/// Layer animation configuration
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAnimateConfig {
    pub key: StyleKey,
    /// Factors of the configured style value, evenly spaced over the curve
    pub value: Vec<f32>,
    /// Duration in milliseconds
    pub duration: f32,
    #[serde(default)]
    pub easing: Easing,
    /// Fraction of the duration the animation begins at
    #[serde(default)]
    pub start_at: f32,
    #[serde(default)]
    pub yoyo: bool,
    /// Desynchronize features with a per-feature phase offset
    #[serde(default)]
    pub random: bool,
    /// Phase offset range; defaults to `[0, duration)`
    #[serde(default)]
    pub delay: Option<TimeRange>,
    /// Per-feature duration; a plain number fixes it for every feature
    #[serde(default, deserialize_with = "deserialize_run_time")]
    pub transform: Option<TimeRange>,
}

impl FeatureAnimateConfig {
    pub fn new(key: StyleKey, value: Vec<f32>, duration: f32) -> Self {
        Self {
            key,
            value,
            duration,
            easing: Easing::Linear,
            start_at: 0.0,
            yoyo: false,
            random: false,
            delay: None,
            transform: None,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn start_at(mut self, start_at: f32) -> Self {
        self.start_at = start_at;
        self
    }

    pub fn yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn random(mut self, delay: Option<TimeRange>, transform: Option<TimeRange>) -> Self {
        self.random = true;
        self.delay = delay;
        self.transform = transform;
        self
    }
}

/// Per-feature phase data drawn at configuration time
#[derive(Clone, Debug)]
struct PhaseTable {
    offsets: Vec<f32>,
    durations: Option<Vec<f32>>,
}

/// One style key's animation across all features of a layer
pub struct FeatureTrack {
    samples: ValueSamples,
    easing: Easing,
    duration_ms: f32,
    start_offset_ms: f32,
    yoyo: bool,
    feature_count: usize,
    phases: Option<PhaseTable>,
    elapsed_ms: f32,
    /// Elapsed time at which every feature reached its end
    finish_at_ms: f32,
    generation: u64,
    completed: bool,
    on_complete: Option<Completion>,
}

impl FeatureTrack {
    fn new(
        config: &FeatureAnimateConfig,
        feature_count: usize,
        generation: u64,
        seed: u64,
        on_complete: Option<Completion>,
    ) -> Result<Self> {
        let duration_ms = validate_duration(config.duration)?;
        let samples = ValueSamples::new(&config.value)?;
        if !(0.0..1.0).contains(&config.start_at) {
            return Err(ConfigError::InvalidStartAt(config.start_at));
        }
        if let Some(transform) = config.transform {
            validate_duration(transform.start)?;
        }

        let phases = config
            .random
            .then(|| draw_phases(config, duration_ms, feature_count, phase_seed(seed, generation)))
            .transpose()?;

        let start_offset_ms = config.start_at * duration_ms;
        let finish_at_ms = match &phases {
            None => duration_ms - start_offset_ms,
            Some(table) => {
                let longest = (0..feature_count)
                    .map(|i| table.offsets[i] + table.duration(i, duration_ms))
                    .fold(0.0f32, f32::max);
                (longest - start_offset_ms).max(0.0)
            }
        };

        Ok(Self {
            samples,
            easing: config.easing,
            duration_ms,
            start_offset_ms,
            yoyo: config.yoyo,
            feature_count,
            phases,
            elapsed_ms: 0.0,
            finish_at_ms,
            generation,
            completed: false,
            on_complete,
        })
    }

    /// Advance the track clock; true exactly once when a finite track ends
    fn advance(&mut self, dt_ms: f32) -> bool {
        if self.completed {
            return false;
        }
        self.elapsed_ms += dt_ms.max(0.0);
        if !self.yoyo && self.elapsed_ms >= self.finish_at_ms {
            self.completed = true;
            return true;
        }
        false
    }

    /// Animation factor for a feature, `None` past the configured count
    pub fn value_for(&self, index: usize) -> Option<f32> {
        if index >= self.feature_count {
            return None;
        }
        let (offset, duration) = match &self.phases {
            None => (0.0, self.duration_ms),
            Some(table) => (table.offsets[index], table.duration(index, self.duration_ms)),
        };
        Some(self.value_at(self.elapsed_ms + self.start_offset_ms - offset, duration))
    }

    /// Shared value when all features run on one clock
    pub fn shared_value(&self) -> Option<f32> {
        match self.phases {
            None => Some(self.value_at(self.elapsed_ms + self.start_offset_ms, self.duration_ms)),
            Some(_) => None,
        }
    }

    fn value_at(&self, local_ms: f32, duration_ms: f32) -> f32 {
        if local_ms <= 0.0 {
            return self.samples.sample(self.easing.apply(0.0));
        }
        let t = if self.yoyo {
            let cycle = (local_ms / duration_ms).floor();
            let fraction = (local_ms - cycle * duration_ms) / duration_ms;
            if cycle as u64 % 2 == 1 {
                1.0 - fraction
            } else {
                fraction
            }
        } else {
            (local_ms / duration_ms).min(1.0)
        };
        self.samples.sample(self.easing.apply(t))
    }

    /// Phase offset of a feature (0 on the shared clock)
    pub fn phase_offset(&self, index: usize) -> Option<f32> {
        if index >= self.feature_count {
            return None;
        }
        Some(self.phases.as_ref().map_or(0.0, |table| table.offsets[index]))
    }

    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_random(&self) -> bool {
        self.phases.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.elapsed_ms
    }
}

impl fmt::Debug for FeatureTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureTrack")
            .field("duration_ms", &self.duration_ms)
            .field("yoyo", &self.yoyo)
            .field("random", &self.is_random())
            .field("feature_count", &self.feature_count)
            .field("elapsed_ms", &self.elapsed_ms)
            .field("generation", &self.generation)
            .field("completed", &self.completed)
            .finish()
    }
}

impl PhaseTable {
    fn duration(&self, index: usize, fallback: f32) -> f32 {
        self.durations.as_ref().map_or(fallback, |d| d[index])
    }
}

fn phase_seed(seed: u64, generation: u64) -> u64 {
    seed ^ generation.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn draw_phases(
    config: &FeatureAnimateConfig,
    duration_ms: f32,
    feature_count: usize,
    seed: u64,
) -> Result<PhaseTable> {
    let delay = match config.delay {
        Some(delay) => delay,
        None => TimeRange::upto(duration_ms)?,
    };
    let mut rng = Xoshiro256StarStar::seed_from_u64(seed);

    let offsets = (0..feature_count).map(|_| delay.draw(&mut rng)).collect();
    let durations = config.transform.map(|transform| {
        (0..feature_count)
            .map(|_| {
                if transform.is_empty() {
                    transform.start
                } else {
                    rng.random_range(transform.start..=transform.end)
                }
            })
            .collect()
    });

    Ok(PhaseTable { offsets, durations })
}

/// All style-key tracks of one layer
pub struct FeatureAnimationSet {
    tracks: FxHashMap<StyleKey, FeatureTrack>,
    seed: u64,
    generation: u64,
    paused: bool,
}

impl FeatureAnimationSet {
    pub fn new(seed: u64) -> Self {
        Self {
            tracks: FxHashMap::default(),
            seed,
            generation: 0,
            paused: false,
        }
    }

    /// Install or replace the track for `config.key`.
    ///
    /// A replaced track is dropped with its callback, which never runs.
    pub fn configure(
        &mut self,
        config: &FeatureAnimateConfig,
        feature_count: usize,
        on_complete: Option<Completion>,
    ) -> Result<()> {
        let generation = self.generation + 1;
        let track = FeatureTrack::new(config, feature_count, generation, self.seed, on_complete)?;
        self.generation = generation;

        tracing::debug!(
            key = %config.key,
            features = feature_count,
            duration_ms = config.duration,
            random = config.random,
            yoyo = config.yoyo,
            generation,
            "layer animation configured"
        );

        if self.tracks.insert(config.key, track).is_some() {
            tracing::debug!(key = %config.key, "replaced previous layer animation");
        }
        Ok(())
    }

    /// Advance every track, collecting the keys that completed in this call
    pub fn advance(&mut self, dt_ms: f32, completed: &mut Vec<StyleKey>) {
        if self.paused {
            return;
        }
        for (key, track) in self.tracks.iter_mut() {
            if track.advance(dt_ms) {
                completed.push(*key);
            }
        }
    }

    /// Push every track's current values to the sink.
    ///
    /// Indices at or beyond the sink's current feature count are skipped.
    pub fn push<S: FeatureStyleSink + ?Sized>(&self, layer: LayerId, sink: &mut S) {
        let Some(available) = sink.feature_count(layer) else {
            tracing::trace!(?layer, "layer gone, skipping feature styles");
            return;
        };

        for (key, track) in &self.tracks {
            let count = track.feature_count.min(available);
            if count < track.feature_count {
                tracing::trace!(
                    ?layer,
                    key = %key,
                    configured = track.feature_count,
                    available,
                    "ignoring out-of-range feature indices"
                );
            }

            if let Some(value) = track.shared_value() {
                for index in 0..count {
                    sink.set_feature_style(layer, index, *key, value);
                }
            } else {
                for index in 0..count {
                    if let Some(value) = track.value_for(index) {
                        sink.set_feature_style(layer, index, *key, value);
                    }
                }
            }
        }
    }

    pub fn value_for(&self, key: StyleKey, index: usize) -> Option<f32> {
        self.tracks.get(&key)?.value_for(index)
    }

    pub fn track(&self, key: StyleKey) -> Option<&FeatureTrack> {
        self.tracks.get(&key)
    }

    /// Remove a finished track and hand out its callback
    pub fn take_completed(&mut self, key: StyleKey) -> Option<Completion> {
        if !self.tracks.get(&key)?.completed {
            return None;
        }
        self.tracks.remove(&key)?.on_complete
    }

    pub fn remove(&mut self, key: StyleKey) -> bool {
        self.tracks.remove(&key).is_some()
    }

    /// Drop every track without running callbacks
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether some track still produces changing values
    pub fn is_active(&self) -> bool {
        !self.paused && self.tracks.values().any(|t| !t.completed)
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl fmt::Debug for FeatureAnimationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureAnimationSet")
            .field("tracks", &self.tracks)
            .field("generation", &self.generation)
            .field("paused", &self.paused)
            .finish()
    }
}
