//! Turn raw tabular rows (CSV or a spreadsheet sheet) into a [`Series`].
//!
//! Three layouts are understood:
//! - **wide**: a header row of entity names, one row per period label
//!   (optionally located by a marker label in its first cell);
//! - **bubble**: three stacked wide sections (growth, margin, revenue) in one
//!   sheet, merged per `(entity, period)`;
//! - **long**: one observation per row with named entity/period/value columns.
//!
//! Structural problems (missing marker, header or column) fail the load. Cell
//! problems never do: the cell is skipped and logged.

use crate::error::LoadError;
use crate::models::{BubbleMetrics, EntityId, Period, Record};
use crate::store::Series;
use calamine::{open_workbook, DataType, Reader, Xlsx};
use chrono::{Days, NaiveDate};
use csv::ReaderBuilder;
use log::debug;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

/// Rows of text cells, as read from the source.
pub type RawRows = Vec<Vec<String>>;

/// Read headerless CSV; rows may have different lengths.
pub fn read_csv<R: Read>(reader: R) -> Result<RawRows, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut rows = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        rows.push(rec.iter().map(|c| c.to_string()).collect());
    }
    Ok(rows)
}

pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<RawRows, LoadError> {
    let f = std::fs::File::open(path)?;
    read_csv(f)
}

/// Read one worksheet of an `.xlsx` workbook (the first one when `sheet` is `None`).
pub fn read_xlsx<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<RawRows, LoadError> {
    let path = path.as_ref();
    debug!("read_xlsx: path: {:?} sheet: {:?}", path, sheet);
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e| LoadError::Spreadsheet(format!("{e}")))?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .ok_or_else(|| LoadError::MissingSheet(name.to_string()))?
            .map_err(|e| LoadError::Spreadsheet(format!("{e}")))?,
        None => workbook
            .worksheets()
            .into_iter()
            .next()
            .map(|(_, r)| r)
            .ok_or_else(|| LoadError::MissingSheet("<first>".to_string()))?,
    };

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) => f.to_string(),
        DataType::DateTime(f) => excel_date(*f).unwrap_or_else(|| f.to_string()),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Date-formatted cell serial (days since 1899-12-30) as `YYYY-MM-DD`.
fn excel_date(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let date = NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial as u64))?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Undo the formula guard written by `storage::save_csv`.
fn unguard(cell: &str) -> &str {
    match cell.strip_prefix('\'') {
        Some(rest) if rest.starts_with(['=', '+', '-', '@']) => rest,
        _ => cell,
    }
}

/// Parse a numeric cell.
///
/// Accepts thousands separators, a trailing `%`, a leading currency sign and
/// accounting negatives `(12.5)`. Empty, `-` and `n/a` cells are absent.
pub fn parse_number(cell: &str) -> Option<f64> {
    let mut s = cell.trim();
    if s.is_empty() || s == "-" || s.eq_ignore_ascii_case("n/a") || s.eq_ignore_ascii_case("na")
    {
        return None;
    }
    let mut negative = false;
    if s.starts_with('(') && s.ends_with(')') {
        negative = true;
        s = &s[1..s.len() - 1];
    }
    let s = s.trim().trim_end_matches('%').trim_start_matches(['$', '€', '£']);
    let cleaned: String = s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    let v = cleaned.parse::<f64>().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(if negative { -v } else { v })
}

fn first_cell(row: &[String]) -> &str {
    row.first().map(|s| s.trim()).unwrap_or("")
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

/// Wide layout: header of entity names, one row per period.
#[derive(Debug, Clone, Default)]
pub struct WideLayout {
    /// Label contained in the first cell of the header row. When set, the
    /// section ends at the first row that is not a period row.
    pub marker: Option<String>,
}

impl WideLayout {
    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: Some(marker.into()),
        }
    }
}

/// Parse one wide section into `(entity, period, value)` observations.
fn wide_observations(
    rows: &[Vec<String>],
    layout: &WideLayout,
) -> Result<Vec<Record<f64>>, LoadError> {
    let header_idx = match &layout.marker {
        Some(marker) => {
            let needle = marker.to_lowercase();
            rows.iter()
                .position(|r| first_cell(r).to_lowercase().contains(&needle))
                .ok_or_else(|| LoadError::MissingMarker(marker.clone()))?
        }
        None => rows
            .iter()
            .position(|r| !is_blank(r))
            .ok_or(LoadError::MissingHeader)?,
    };

    let header = &rows[header_idx];
    let entities: Vec<Option<EntityId>> = header
        .iter()
        .skip(1)
        .map(|h| {
            let e = EntityId::new(h);
            (!e.is_empty()).then_some(e)
        })
        .collect();
    debug!("wide section {:?}: {} entity columns", layout.marker, entities.len());

    let mut out = Vec::new();
    for (offset, row) in rows[header_idx + 1..].iter().enumerate() {
        let lineno = header_idx + offset + 2;
        let Some(period) = Period::parse(first_cell(row)) else {
            if layout.marker.is_some() {
                // End of the marked section.
                break;
            }
            if !is_blank(row) {
                debug!("line {lineno}: skipping row with label {:?}", first_cell(row));
            }
            continue;
        };
        for (col, entity) in entities.iter().enumerate() {
            let Some(entity) = entity else { continue };
            let Some(cell) = row.get(col + 1) else { continue };
            match parse_number(cell) {
                Some(v) => out.push(Record {
                    entity: entity.clone(),
                    period,
                    metrics: v,
                }),
                None if cell.trim().is_empty() => {}
                None => debug!("line {lineno}: skipping unparseable cell {cell:?} for {entity}"),
            }
        }
    }
    Ok(out)
}

/// Load a single-metric series from the wide layout.
pub fn wide(rows: &[Vec<String>], layout: &WideLayout) -> Result<Series<f64>, LoadError> {
    Series::from_records(wide_observations(rows, layout)?)
}

/// Marker labels of the three stacked sections of a bubble sheet.
#[derive(Debug, Clone)]
pub struct BubbleLayout {
    pub growth: String,
    pub margin: String,
    pub revenue: String,
}

impl Default for BubbleLayout {
    fn default() -> Self {
        Self {
            growth: "Growth".to_string(),
            margin: "Margin".to_string(),
            revenue: "Revenue".to_string(),
        }
    }
}

/// Load bubble metrics from three marked sections of one sheet.
///
/// An `(entity, period)` becomes a record only when all three sections have a
/// value for it.
pub fn bubble(rows: &[Vec<String>], layout: &BubbleLayout) -> Result<Series<BubbleMetrics>, LoadError> {
    let growth = wide_observations(rows, &WideLayout::with_marker(&layout.growth))?;
    let margin = wide_observations(rows, &WideLayout::with_marker(&layout.margin))?;
    let revenue = wide_observations(rows, &WideLayout::with_marker(&layout.revenue))?;

    type Partial = (Option<f64>, Option<f64>, Option<f64>);
    let mut merged: BTreeMap<(EntityId, Period), Partial> = BTreeMap::new();
    for r in growth {
        merged.entry((r.entity, r.period)).or_default().0 = Some(r.metrics);
    }
    for r in margin {
        merged.entry((r.entity, r.period)).or_default().1 = Some(r.metrics);
    }
    for r in revenue {
        merged.entry((r.entity, r.period)).or_default().2 = Some(r.metrics);
    }

    let records = merged.into_iter().filter_map(|((entity, period), parts)| match parts {
        (Some(growth), Some(margin), Some(revenue)) => Some(Record {
            entity,
            period,
            metrics: BubbleMetrics {
                growth,
                margin,
                revenue,
            },
        }),
        _ => {
            debug!("skipping incomplete bubble record {entity} @ {period}: {parts:?}");
            None
        }
    });
    Series::from_records(records)
}

/// Long (tidy) layout: named columns in a header row.
#[derive(Debug, Clone)]
pub struct LongLayout {
    pub entity: String,
    pub period: String,
    pub value: String,
}

impl Default for LongLayout {
    fn default() -> Self {
        Self {
            entity: "entity".to_string(),
            period: "period".to_string(),
            value: "value".to_string(),
        }
    }
}

/// Load a single-metric series from one-observation-per-row data.
pub fn long(rows: &[Vec<String>], layout: &LongLayout) -> Result<Series<f64>, LoadError> {
    let header_idx = rows
        .iter()
        .position(|r| !is_blank(r))
        .ok_or(LoadError::MissingHeader)?;
    let header = &rows[header_idx];
    let col = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };
    let (ei, pi, vi) = (col(&layout.entity)?, col(&layout.period)?, col(&layout.value)?);

    let mut out = Vec::new();
    for (offset, row) in rows[header_idx + 1..].iter().enumerate() {
        let lineno = header_idx + offset + 2;
        let cell = |i: usize| row.get(i).map(|s| s.as_str()).unwrap_or("");
        // Text cells may carry the spreadsheet-formula guard written on export.
        let entity = EntityId::new(unguard(cell(ei)));
        let Some(period) = Period::parse(cell(pi)) else {
            debug!("line {lineno}: skipping row with period {:?}", cell(pi));
            continue;
        };
        let Some(value) = parse_number(cell(vi)) else {
            debug!("line {lineno}: skipping row with value {:?}", cell(vi));
            continue;
        };
        out.push(Record {
            entity,
            period,
            metrics: value,
        });
    }
    Series::from_records(out)
}
