//! Stable Set Extraction
//!
//! Derives one canonical, ordered and grouped resource set from repeated,
//! independently captured page loads. Captures are folded strictly in attempt
//! order; empty captures are skipped without aborting the run.

pub mod vote;

use crate::error::{CaptureError, PushError, ResourceError};
use crate::resource::{PushGroup, Resource};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

pub use vote::VoteTally;

/// Default number of capture attempts per extraction.
pub const DEFAULT_STABLE_SET_RUNS: usize = 10;

/// Stable set configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StableSetConfig {
    /// Capture attempts per extraction
    #[serde(default = "default_runs")]
    pub runs: usize,
}

fn default_runs() -> usize {
    DEFAULT_STABLE_SET_RUNS
}

impl Default for StableSetConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
        }
    }
}

impl StableSetConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.runs == 0 {
            return Err("runs must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Load timing for one resource within a capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceTiming {
    /// Url of the resource that initiated this request, if known
    #[serde(default)]
    pub initiator: Option<String>,
    #[serde(default)]
    pub started_ms: Option<f64>,
    #[serde(default)]
    pub finished_ms: Option<f64>,
}

/// Per-url timing metadata of one capture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaptureTiming {
    entries: BTreeMap<String, ResourceTiming>,
}

impl CaptureTiming {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, timing: ResourceTiming) {
        self.entries.insert(url.into(), timing);
    }

    pub fn get(&self, url: &str) -> Option<&ResourceTiming> {
        self.entries.get(url)
    }

    /// Url of the resource that initiated `url`, if recorded.
    pub fn initiator(&self, url: &str) -> Option<&str> {
        self.entries.get(url).and_then(|t| t.initiator.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One page load: resources in per-run discovery order plus their timing.
///
/// A capture with no resources signals a failed or empty load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capture {
    pub resources: Vec<Resource>,
    #[serde(default, skip_serializing_if = "CaptureTiming::is_empty")]
    pub timings: CaptureTiming,
}

impl Capture {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self {
            resources,
            timings: CaptureTiming::default(),
        }
    }

    pub fn with_timings(mut self, timings: CaptureTiming) -> Self {
        self.timings = timings;
        self
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Read a capture document from disk.
    pub fn load(path: &Path) -> Result<Self, CaptureError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Source of repeated page-load captures.
///
/// Implementations block until the attempt finishes. Returning an empty
/// capture marks the attempt as failed; returning `Err` aborts extraction.
pub trait CaptureSource {
    fn capture(&mut self, attempt: usize) -> Result<Capture, CaptureError>;
}

impl<F> CaptureSource for F
where
    F: FnMut(usize) -> Result<Capture, CaptureError>,
{
    fn capture(&mut self, attempt: usize) -> Result<Capture, CaptureError> {
        self(attempt)
    }
}

/// Replays a fixed list of captures, then reports empty captures.
#[derive(Debug, Clone, Default)]
pub struct ReplayCaptureSource {
    captures: VecDeque<Capture>,
}

impl ReplayCaptureSource {
    pub fn new(captures: impl IntoIterator<Item = Capture>) -> Self {
        Self {
            captures: captures.into_iter().collect(),
        }
    }

    /// Load one capture per file, in the given order.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, CaptureError> {
        let captures = paths
            .iter()
            .map(|p| Capture::load(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(captures))
    }

    pub fn remaining(&self) -> usize {
        self.captures.len()
    }
}

impl CaptureSource for ReplayCaptureSource {
    fn capture(&mut self, _attempt: usize) -> Result<Capture, CaptureError> {
        Ok(self.captures.pop_front().unwrap_or_default())
    }
}

/// Turns a ranked resource list into ordered push groups.
pub trait GroupBuilder {
    /// `ranked` is sorted by ascending, dense `order`; `reference` is the
    /// timing of one successful capture.
    fn build_groups(
        &self,
        ranked: Vec<Resource>,
        reference: &CaptureTiming,
    ) -> Result<Vec<PushGroup>, ResourceError>;
}

/// Result of one extraction.
#[derive(Debug, Clone, Default)]
pub struct StableSet {
    /// Common resources in consensus order, `order` reassigned to 0..n-1
    pub ranked: Vec<Resource>,
    /// Groups produced by the group builder
    pub groups: Vec<PushGroup>,
    /// Attempts that produced resources
    pub successful_runs: usize,
    /// Attempts made
    pub attempted_runs: usize,
}

impl StableSet {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<PushGroup> {
        self.groups
    }
}

/// Consensus extractor over repeated captures.
#[derive(Debug, Clone)]
pub struct StableSetExtractor<B> {
    runs: usize,
    builder: B,
}

impl<B: GroupBuilder> StableSetExtractor<B> {
    /// Create an extractor making `runs` attempts (at least one).
    pub fn new(runs: usize, builder: B) -> Self {
        Self {
            runs: runs.max(1),
            builder,
        }
    }

    pub fn from_config(config: &StableSetConfig, builder: B) -> Self {
        Self::new(config.runs, builder)
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Capture, tally, intersect, rank and group.
    ///
    /// Returns an empty set when no capture succeeded or when no resource
    /// appears in every successful capture.
    #[instrument(skip(self, source), fields(runs = self.runs))]
    pub fn extract<S>(&self, source: &mut S) -> Result<StableSet, PushError>
    where
        S: CaptureSource + ?Sized,
    {
        let start = Instant::now();
        let mut tally = VoteTally::new();
        let mut seen_sets: Vec<BTreeSet<usize>> = Vec::new();
        let mut reference: Option<CaptureTiming> = None;

        for attempt in 0..self.runs {
            debug!(run = attempt + 1, total = self.runs, "Capturing page load");
            let capture = source.capture(attempt)?;
            if capture.is_empty() {
                warn!(run = attempt + 1, "No resources received, skipping capture");
                continue;
            }
            debug!(run = attempt + 1, total = capture.resources.len(), "Received resources");

            seen_sets.push(tally.record(&capture.resources));
            if reference.is_none() {
                reference = Some(capture.timings);
            }
        }

        debug!(
            resource_set_lengths = ?seen_sets.iter().map(|s| s.len()).collect::<Vec<_>>(),
            "Collected resource sets"
        );

        let mut result = StableSet {
            successful_runs: seen_sets.len(),
            attempted_runs: self.runs,
            ..StableSet::default()
        };

        let Some((first, rest)) = seen_sets.split_first() else {
            warn!("All captures were empty, no stable set");
            return Ok(result);
        };
        let mut common = first.clone();
        for set in rest {
            common.retain(|idx| set.contains(idx));
        }
        if common.is_empty() {
            info!(
                successful_runs = result.successful_runs,
                "No resource common to every capture"
            );
            return Ok(result);
        }

        let ranked: Vec<Resource> = tally
            .rank(&common)
            .into_iter()
            .enumerate()
            .map(|(order, idx)| tally.resource(idx).clone().with_order(order as u32))
            .collect();

        let reference = reference.unwrap_or_default();
        result.groups = self.builder.build_groups(ranked.clone(), &reference)?;
        result.ranked = ranked;

        info!(
            successful_runs = result.successful_runs,
            common = result.ranked.len(),
            groups = result.groups.len(),
            duration_ms = start.elapsed().as_millis(),
            "Stable set extracted"
        );
        Ok(result)
    }
}
