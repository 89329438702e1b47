//! Per-test comparison record.
//!
//! A record holds, for each reference source that was available, the
//! elastic and fracture regime statistics of a fitted model against that
//! source plus their pooled combination. It serializes to one flat JSON
//! object (scalars and lists of scalars) so the log stays greppable.

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::compare::pool::{combine, PooledStats};
use crate::domain::MseStats;
use crate::error::Result;

/// Reference data source a model is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Experimental,
    Simulated,
    Analytical,
}

impl Source {
    pub fn label(self) -> &'static str {
        match self {
            Source::Experimental => "experimental",
            Source::Simulated => "simulated",
            Source::Analytical => "analytical",
        }
    }

    fn key_prefix(self) -> &'static str {
        match self {
            Source::Experimental => "exp",
            Source::Simulated => "sim",
            Source::Analytical => "ana",
        }
    }
}

/// Regime statistics against one source and their pooled value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceComparison {
    pub elastic: MseStats,
    pub fracture: MseStats,
    pub pooled: PooledStats,
}

impl SourceComparison {
    pub fn from_regimes(elastic: MseStats, fracture: MseStats) -> Result<Self> {
        let pooled = combine(&elastic, &fracture)?;
        Ok(Self {
            elastic,
            fracture,
            pooled,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRecord {
    pub name: String,
    pub recorded_at: DateTime<Utc>,
    pub experimental: Option<SourceComparison>,
    pub simulated: Option<SourceComparison>,
    pub analytical: Option<SourceComparison>,
}

impl ComparisonRecord {
    /// Empty record stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self::at(name, Utc::now())
    }

    pub fn at(name: impl Into<String>, recorded_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            recorded_at,
            experimental: None,
            simulated: None,
            analytical: None,
        }
    }

    pub fn set(&mut self, source: Source, comparison: SourceComparison) {
        *self.slot_mut(source) = Some(comparison);
    }

    pub fn get(&self, source: Source) -> Option<&SourceComparison> {
        match source {
            Source::Experimental => self.experimental.as_ref(),
            Source::Simulated => self.simulated.as_ref(),
            Source::Analytical => self.analytical.as_ref(),
        }
    }

    /// Present sources in a fixed order.
    pub fn sources(&self) -> impl Iterator<Item = (Source, &SourceComparison)> {
        [Source::Experimental, Source::Simulated, Source::Analytical]
            .into_iter()
            .filter_map(|s| self.get(s).map(|c| (s, c)))
    }

    fn slot_mut(&mut self, source: Source) -> &mut Option<SourceComparison> {
        match source {
            Source::Experimental => &mut self.experimental,
            Source::Simulated => &mut self.simulated,
            Source::Analytical => &mut self.analytical,
        }
    }
}

impl Serialize for ComparisonRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("recorded_at", &self.recorded_at.to_rfc3339())?;

        for (source, c) in self.sources() {
            let prefix = source.key_prefix();
            map.serialize_entry(&format!("{prefix}_mse"), &c.pooled.mse)?;
            map.serialize_entry(&format!("{prefix}_mean"), &c.pooled.mean)?;
            map.serialize_entry(&format!("{prefix}_std"), &c.pooled.std)?;
            map.serialize_entry(&format!("{prefix}_n"), &[c.elastic.n, c.fracture.n])?;
            map.serialize_entry(&format!("{prefix}_mse_regimes"), &[c.elastic.mse, c.fracture.mse])?;
            map.serialize_entry(&format!("{prefix}_mean_regimes"), &[c.elastic.mean, c.fracture.mean])?;
            map.serialize_entry(&format!("{prefix}_std_regimes"), &[c.elastic.std, c.fracture.std])?;
        }

        map.end()
    }
}
