//! Series store: validated records grouped by period.
//!
//! A [`Series`] is built once from loaded records and is read-only afterwards;
//! reloading a dataset replaces the whole series.

use crate::error::LoadError;
use crate::models::{EntityId, Metrics, Period, Record};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

/// All records of one period, keyed by entity.
pub type PeriodFrame<M> = BTreeMap<EntityId, M>;

#[derive(Debug, Clone, PartialEq)]
pub struct Series<M> {
    periods: Vec<Period>,
    frames: BTreeMap<Period, PeriodFrame<M>>,
}

impl<M: Metrics> Series<M> {
    /// Build a series from loose records.
    ///
    /// Non-finite records are dropped, the first record wins for a duplicated
    /// `(entity, period)`. Fails when nothing usable remains or when yearly and
    /// quarterly periods are mixed.
    pub fn from_records<I>(records: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = Record<M>>,
    {
        let mut frames: BTreeMap<Period, PeriodFrame<M>> = BTreeMap::new();
        let mut dropped = 0usize;
        for r in records {
            if r.entity.is_empty() {
                debug!("skipping record without entity at {}", r.period);
                dropped += 1;
                continue;
            }
            if !r.metrics.is_finite() {
                debug!("skipping non-finite record {} @ {}", r.entity, r.period);
                dropped += 1;
                continue;
            }
            let frame = frames.entry(r.period).or_default();
            if frame.contains_key(&r.entity) {
                warn!("duplicate record {} @ {}; keeping the first", r.entity, r.period);
                dropped += 1;
                continue;
            }
            frame.insert(r.entity, r.metrics);
        }

        frames.retain(|_, f| !f.is_empty());
        if frames.is_empty() {
            return Err(LoadError::NoData);
        }

        let periods: Vec<Period> = frames.keys().copied().collect();
        if let Some(first) = periods.first()
            && let Some(other) = periods.iter().find(|p| p.kind() != first.kind())
        {
            return Err(LoadError::MixedPeriods(first.to_string(), other.to_string()));
        }

        let series = Self { periods, frames };
        info!(
            "loaded series: {} periods, {} entities, {} records ({} dropped)",
            series.periods.len(),
            series.entities().len(),
            series.len(),
            dropped
        );
        Ok(series)
    }

    /// Distinct periods in ascending order.
    pub fn periods_sorted(&self) -> &[Period] {
        &self.periods
    }

    pub fn num_periods(&self) -> usize {
        self.periods.len()
    }

    pub fn period_index(&self, period: Period) -> Option<usize> {
        self.periods.binary_search(&period).ok()
    }

    /// Borrowed view of every entity with data at `period`.
    pub fn frame(&self, period: Period) -> Option<&PeriodFrame<M>> {
        self.frames.get(&period)
    }

    /// All records at `period` (empty when the period is unknown).
    pub fn records_for(&self, period: Period) -> Vec<Record<M>> {
        self.frames
            .get(&period)
            .map(|f| {
                f.iter()
                    .map(|(e, m)| Record {
                        entity: e.clone(),
                        period,
                        metrics: m.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get(&self, entity: &EntityId, period: Period) -> Option<&M> {
        self.frames.get(&period)?.get(entity)
    }

    /// Every entity that appears in at least one period, sorted.
    pub fn entities(&self) -> BTreeSet<EntityId> {
        self.frames
            .values()
            .flat_map(|f| f.keys().cloned())
            .collect()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.frames.values().map(|f| f.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All records in `(period, entity)` order.
    pub fn iter(&self) -> impl Iterator<Item = (Period, &EntityId, &M)> {
        self.frames
            .iter()
            .flat_map(|(p, f)| f.iter().map(move |(e, m)| (*p, e, m)))
    }
}
