//! Blend two adjacent periods into a ranked snapshot.
//!
//! Entities present on both sides are interpolated with the configured
//! [`Ease`]. Entities present on one side only follow the [`FadePolicy`]:
//!
//! - disappearing (only in `from`): full value while `t <= hold`, then a
//!   linear ramp down to zero at `t = 1`;
//! - appearing (only in `to`): invisible while `t <= 1 - hold`, then an eased
//!   rise to full value at `t = 1`.
//!
//! Entries whose fade factor reaches zero are left out of the snapshot.

use crate::ease::Ease;
use crate::models::{EntityId, Metrics, Period};
use crate::selection::Selection;
use crate::store::PeriodFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How one-sided entities behave during a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FadePolicy {
    /// Show one-sided entities only at the endpoint that has their data.
    Snap,
    /// Fade out after `hold`, fade in during the last `hold` of the transition.
    Fade { hold: f64 },
}

impl Default for FadePolicy {
    fn default() -> Self {
        FadePolicy::Fade { hold: 0.7 }
    }
}

impl FadePolicy {
    /// Factor applied to an entity that only exists in the `from` period.
    pub fn fade_out(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadePolicy::Snap => {
                if t <= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            FadePolicy::Fade { hold } => {
                if t >= 1.0 {
                    0.0
                } else if t <= hold {
                    1.0
                } else {
                    ((1.0 - t) / (1.0 - hold)).clamp(0.0, 1.0)
                }
            }
        }
    }

    /// Factor applied to an entity that only exists in the `to` period.
    pub fn fade_in(self, t: f64, ease: Ease) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadePolicy::Snap => {
                if t >= 1.0 {
                    1.0
                } else {
                    0.0
                }
            }
            FadePolicy::Fade { hold } => {
                let start = 1.0 - hold;
                // Endpoints win over any hold, including 0 and 1.
                if t >= 1.0 {
                    1.0
                } else if t <= start {
                    0.0
                } else {
                    ease.apply((t - start) / hold)
                }
            }
        }
    }
}

/// One side of a transition: a period and its records.
#[derive(Debug, Clone, Copy)]
pub struct FrameRef<'a, M> {
    pub period: Period,
    pub records: &'a PeriodFrame<M>,
}

impl<'a, M> FrameRef<'a, M> {
    pub fn new(period: Period, records: &'a PeriodFrame<M>) -> Self {
        Self { period, records }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry<M> {
    pub entity: EntityId,
    pub metrics: M,
    /// Fade factor in `[0, 1]`; 1 for entities present on both sides.
    pub presence: f64,
    /// 0-based position after ranking.
    pub rank: usize,
}

/// Interpolated values at one animation instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot<M> {
    pub from: Period,
    pub to: Period,
    /// Raw (un-eased) transition progress in `[0, 1]`.
    pub progress: f64,
    /// Fractional index into the series' period list.
    pub position: f64,
    pub entries: Vec<SnapshotEntry<M>>,
}

impl<M: Metrics> Snapshot<M> {
    /// Label of the period being left.
    pub fn label(&self) -> String {
        self.from.to_string()
    }

    pub fn get(&self, entity: &EntityId) -> Option<&SnapshotEntry<M>> {
        self.entries.iter().find(|e| &e.entity == entity)
    }

    pub fn entities(&self) -> BTreeSet<EntityId> {
        self.entries.iter().map(|e| e.entity.clone()).collect()
    }

    /// Drop unselected entities and re-rank the remainder.
    pub fn retain(&mut self, selection: &Selection) {
        if matches!(selection, Selection::All) {
            return;
        }
        self.entries.retain(|e| selection.contains(&e.entity));
        for (i, e) in self.entries.iter_mut().enumerate() {
            e.rank = i;
        }
    }

    fn rank(&mut self) {
        self.entries.sort_by(|a, b| {
            b.metrics
                .rank_value()
                .total_cmp(&a.metrics.rank_value())
                .then_with(|| a.entity.cmp(&b.entity))
        });
        for (i, e) in self.entries.iter_mut().enumerate() {
            e.rank = i;
        }
    }
}

/// Interpolation settings; constant for one playback run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Interpolator {
    pub ease: Ease,
    pub fade: FadePolicy,
}

impl Interpolator {
    pub fn new(ease: Ease, fade: FadePolicy) -> Self {
        Self { ease, fade }
    }

    /// Blend `from` toward `to` at progress `t` (clamped to `[0, 1]`).
    ///
    /// Interpolating a period against itself returns its values unchanged.
    pub fn interpolate<M: Metrics>(
        &self,
        from: FrameRef<'_, M>,
        to: FrameRef<'_, M>,
        t: f64,
    ) -> Snapshot<M> {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let mut snap = Snapshot {
            from: from.period,
            to: to.period,
            progress: t,
            position: 0.0,
            entries: Vec::with_capacity(from.records.len().max(to.records.len())),
        };

        if from.period == to.period {
            snap.entries.extend(from.records.iter().map(|(e, m)| SnapshotEntry {
                entity: e.clone(),
                metrics: m.clone(),
                presence: 1.0,
                rank: 0,
            }));
            snap.rank();
            return snap;
        }

        let eased = self.ease.apply(t);
        for (entity, a) in from.records {
            match to.records.get(entity) {
                Some(b) => {
                    let metrics = if eased <= 0.0 {
                        a.clone()
                    } else if eased >= 1.0 {
                        b.clone()
                    } else {
                        M::lerp(a, b, eased)
                    };
                    snap.entries.push(SnapshotEntry {
                        entity: entity.clone(),
                        metrics,
                        presence: 1.0,
                        rank: 0,
                    });
                }
                None => {
                    let f = self.fade.fade_out(t);
                    if f > 0.0 {
                        snap.entries.push(SnapshotEntry {
                            entity: entity.clone(),
                            metrics: if f >= 1.0 { a.clone() } else { a.scaled(f) },
                            presence: f,
                            rank: 0,
                        });
                    }
                }
            }
        }
        for (entity, b) in to.records {
            if from.records.contains_key(entity) {
                continue;
            }
            let f = self.fade.fade_in(t, self.ease);
            if f > 0.0 {
                snap.entries.push(SnapshotEntry {
                    entity: entity.clone(),
                    metrics: if f >= 1.0 { b.clone() } else { b.scaled(f) },
                    presence: f,
                    rank: 0,
                });
            }
        }
        snap.rank();
        snap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn frame(pairs: &[(&str, f64)]) -> PeriodFrame<f64> {
        pairs.iter().map(|(e, v)| (EntityId::new(e), *v)).collect::<BTreeMap<_, _>>()
    }

    #[test]
    fn fade_out_holds_then_ramps() {
        let p = FadePolicy::default();
        assert_eq!(p.fade_out(0.0), 1.0);
        assert_eq!(p.fade_out(0.7), 1.0);
        assert!((p.fade_out(0.85) - 0.5).abs() < 1e-9);
        assert_eq!(p.fade_out(1.0), 0.0);
    }

    #[test]
    fn fade_in_waits_then_rises() {
        let p = FadePolicy::default();
        assert_eq!(p.fade_in(0.0, Ease::Linear), 0.0);
        assert_eq!(p.fade_in(0.3, Ease::Linear), 0.0);
        assert_eq!(p.fade_in(1.0, Ease::InOutCubic), 1.0);
        let mid = p.fade_in(0.65, Ease::Linear);
        assert!((mid - 0.5).abs() < 1e-9);
    }

    #[test]
    fn boundary_holds_still_reach_the_endpoints() {
        let a = frame(&[("Gone", 4.0)]);
        let b = frame(&[("New", 30.0)]);
        for hold in [0.0, 1.0] {
            let i = Interpolator::new(Ease::Linear, FadePolicy::Fade { hold });
            let from = FrameRef::new(Period::Year(1), &a);
            let to = FrameRef::new(Period::Year(2), &b);
            let end = i.interpolate(from, to, 1.0);
            assert_eq!(end.entries.len(), 1, "hold {hold}");
            assert_eq!(end.get(&"New".into()).map(|e| e.metrics), Some(30.0));
            let start = i.interpolate(from, to, 0.0);
            assert_eq!(start.entries.len(), 1, "hold {hold}");
            assert_eq!(start.get(&"Gone".into()).map(|e| e.metrics), Some(4.0));
        }
    }

    #[test]
    fn snap_policy_only_shows_endpoints() {
        let a = frame(&[("A", 10.0), ("Gone", 5.0)]);
        let b = frame(&[("A", 20.0), ("New", 7.0)]);
        let i = Interpolator::new(Ease::Linear, FadePolicy::Snap);
        let s0 = i.interpolate(FrameRef::new(Period::Year(1), &a), FrameRef::new(Period::Year(2), &b), 0.0);
        assert!(s0.get(&"Gone".into()).is_some());
        assert!(s0.get(&"New".into()).is_none());
        let mid = i.interpolate(FrameRef::new(Period::Year(1), &a), FrameRef::new(Period::Year(2), &b), 0.5);
        assert_eq!(mid.entries.len(), 1);
        let s1 = i.interpolate(FrameRef::new(Period::Year(1), &a), FrameRef::new(Period::Year(2), &b), 1.0);
        assert_eq!(s1.get(&"New".into()).map(|e| e.metrics), Some(7.0));
        assert!(s1.get(&"Gone".into()).is_none());
    }

    #[test]
    fn entries_are_ranked_descending() {
        let a = frame(&[("A", 1.0), ("B", 3.0), ("C", 2.0)]);
        let i = Interpolator::default();
        let s = i.interpolate(FrameRef::new(Period::Year(1), &a), FrameRef::new(Period::Year(1), &a), 0.4);
        let names: Vec<&str> = s.entries.iter().map(|e| e.entity.as_str()).collect();
        assert_eq!(names, ["B", "C", "A"]);
        assert_eq!(s.entries[2].rank, 2);
    }

    #[test]
    fn retain_reranks() {
        let a = frame(&[("A", 1.0), ("B", 3.0), ("C", 2.0)]);
        let i = Interpolator::default();
        let mut s = i.interpolate(FrameRef::new(Period::Year(1), &a), FrameRef::new(Period::Year(1), &a), 0.0);
        s.retain(&Selection::only(["A", "C"]));
        assert_eq!(s.entries.len(), 2);
        assert_eq!(s.entries[0].entity.as_str(), "C");
        assert_eq!(s.entries[1].rank, 1);
    }
}
