use crate::config::VizConfig;
use crate::interp::Snapshot;
use crate::models::{EntityId, Metrics, Period, Record};
use crate::store::Series;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Prefix text cells a spreadsheet would evaluate as a formula.
fn guard_cell(s: &str) -> String {
    match s.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{s}"),
        _ => s.to_string(),
    }
}

/// Save the series as tidy CSV: `entity,period,<metric fields...>`.
pub fn save_csv<M: Metrics, P: AsRef<Path>>(series: &Series<M>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    let mut header = vec!["entity".to_string(), "period".to_string()];
    header.extend(M::FIELDS.iter().map(|f| f.to_string()));
    wtr.write_record(&header)?;
    for (period, entity, m) in series.iter() {
        let mut row = vec![guard_cell(entity.as_str()), period.to_string()];
        row.extend(m.values().iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save the series as a pretty JSON array of records.
pub fn save_json<M, P>(series: &Series<M>, path: P) -> Result<()>
where
    M: Metrics + Serialize,
    P: AsRef<Path>,
{
    let records: Vec<Record<M>> = series
        .iter()
        .map(|(p, e, m)| Record::new(e.clone(), p, m.clone()))
        .collect();
    write_pretty(&records, path.as_ref())
}

#[derive(Debug, Serialize)]
struct SnapshotExport<'a, M> {
    title: Option<&'a str>,
    period: String,
    from: Period,
    to: Period,
    progress: f64,
    position: f64,
    entries: Vec<EntryExport<'a, M>>,
}

#[derive(Debug, Serialize)]
struct EntryExport<'a, M> {
    rank: usize,
    entity: &'a EntityId,
    metrics: &'a M,
    presence: f64,
    color: String,
    logo: Option<PathBuf>,
}

/// Save one snapshot for a front-end, each entry annotated with its display
/// color and logo path.
pub fn save_snapshot_json<M, P>(snapshot: &Snapshot<M>, config: &VizConfig, path: P) -> Result<()>
where
    M: Metrics + Serialize,
    P: AsRef<Path>,
{
    let palette = config.palette()?;
    let logos = config.logos();
    let export = SnapshotExport {
        title: config.title.as_deref(),
        period: snapshot.label(),
        from: snapshot.from,
        to: snapshot.to,
        progress: snapshot.progress,
        position: snapshot.position,
        entries: snapshot
            .entries
            .iter()
            .map(|e| EntryExport {
                rank: e.rank,
                entity: &e.entity,
                metrics: &e.metrics,
                presence: e.presence,
                color: palette.color_for(&e.entity).to_hex(),
                logo: logos.logo_for(&e.entity).map(Path::to_path_buf),
            })
            .collect(),
    };
    write_pretty(&export, path.as_ref())
}

fn write_pretty<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let s = serde_json::to_string_pretty(value)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.json");
        let s = Series::from_records(vec![
            Record::new("=cmd", Period::Year(2020), 1.5),
            Record::new("Plain", Period::Year(2021), -2.0),
        ])
        .unwrap();
        save_csv(&s, &csvp).unwrap();
        save_json(&s, &jsonp).unwrap();
        let text = std::fs::read_to_string(&csvp).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "entity,period,value");
        assert_eq!(lines[1], "'=cmd,2020,1.5");
        assert_eq!(lines[2], "Plain,2021,-2");
        let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&jsonp).unwrap()).unwrap();
        assert_eq!(v.as_array().unwrap().len(), 2);
    }

    #[test]
    fn guard_only_touches_formula_starters() {
        assert_eq!(guard_cell("@x"), "'@x");
        assert_eq!(guard_cell("a-b"), "a-b");
        assert_eq!(guard_cell(""), "");
    }
}
