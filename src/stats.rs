use crate::models::{EntityId, Metrics};
use crate::store::Series;
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary statistics of one entity's ranking metric over the series.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Summary {
    pub entity: EntityId,
    pub count: usize,
    /// Periods of the series without an observation for this entity.
    pub missing: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

/// Per-entity statistics, ordered by entity.
pub fn entity_summary<M: Metrics>(series: &Series<M>) -> Vec<Summary> {
    let mut groups: BTreeMap<&EntityId, Vec<f64>> = BTreeMap::new();
    for (_, entity, m) in series.iter() {
        groups.entry(entity).or_default().push(m.rank_value());
    }

    let periods = series.num_periods();
    let mut out = Vec::with_capacity(groups.len());
    for (entity, mut vals) in groups {
        vals.sort_by(|a, b| a.total_cmp(b));
        let count = vals.len();
        let min = vals.first().copied();
        let max = vals.last().copied();
        let mean = (count > 0).then(|| vals.iter().sum::<f64>() / count as f64);
        let median = if count == 0 {
            None
        } else if count % 2 == 1 {
            Some(vals[count / 2])
        } else {
            Some((vals[count / 2 - 1] + vals[count / 2]) / 2.0)
        };
        out.push(Summary {
            entity: entity.clone(),
            count,
            missing: periods.saturating_sub(count),
            min,
            max,
            mean,
            median,
        });
    }
    out
}

/// `(min, max)` of metric `field` across every record, for fixed chart axes.
///
/// `None` when the field is unknown for `M` or the series is empty.
pub fn value_domain<M: Metrics>(series: &Series<M>, field: &str) -> Option<(f64, f64)> {
    let idx = M::FIELDS.iter().position(|f| *f == field)?;
    series
        .iter()
        .filter_map(|(_, _, m)| m.values().get(idx).copied())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BubbleMetrics, Period, Record};

    fn series() -> Series<f64> {
        Series::from_records(vec![
            Record::new("A", Period::Year(2020), 10.0),
            Record::new("A", Period::Year(2021), 30.0),
            Record::new("A", Period::Year(2022), 20.0),
            Record::new("B", Period::Year(2021), 5.0),
        ])
        .unwrap()
    }

    #[test]
    fn summary_per_entity() {
        let s = entity_summary(&series());
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].entity.as_str(), "A");
        assert_eq!(s[0].count, 3);
        assert_eq!(s[0].missing, 0);
        assert_eq!(s[0].median, Some(20.0));
        assert_eq!(s[0].mean, Some(20.0));
        assert_eq!(s[1].missing, 2);
        assert_eq!((s[1].min, s[1].max), (Some(5.0), Some(5.0)));
    }

    #[test]
    fn domain_by_field_name() {
        assert_eq!(value_domain(&series(), "value"), Some((5.0, 30.0)));
        assert_eq!(value_domain(&series(), "growth"), None);

        let b = Series::from_records(vec![
            Record::new("X", Period::Year(1), BubbleMetrics { growth: -3.0, margin: 4.0, revenue: 9.0 }),
            Record::new("Y", Period::Year(1), BubbleMetrics { growth: 7.0, margin: 1.0, revenue: 2.0 }),
        ])
        .unwrap();
        assert_eq!(value_domain(&b, "growth"), Some((-3.0, 7.0)));
        assert_eq!(value_domain(&b, "margin"), Some((1.0, 4.0)));
    }
}
