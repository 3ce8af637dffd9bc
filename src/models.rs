use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

/// Discrete time bucket a record belongs to.
///
/// Yearly and quarterly periods share one ordering key `(year, quarter)` where a
/// plain year counts as quarter 0, so sorting is total even for mixed input
/// (series construction rejects mixed kinds anyway).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Calendar year like 2020
    Year(i32),
    /// Year and quarter (1..=4), rendered as `2020'Q3`
    Quarter { year: i32, quarter: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    Yearly,
    Quarterly,
}

impl Period {
    pub fn year(&self) -> i32 {
        match *self {
            Period::Year(y) => y,
            Period::Quarter { year, .. } => year,
        }
    }

    pub fn kind(&self) -> PeriodKind {
        match self {
            Period::Year(_) => PeriodKind::Yearly,
            Period::Quarter { .. } => PeriodKind::Quarterly,
        }
    }

    fn sort_key(&self) -> (i32, u8) {
        match *self {
            Period::Year(y) => (y, 0),
            Period::Quarter { year, quarter } => (year, quarter),
        }
    }

    /// Parse a period label as found in the first column of a sheet.
    ///
    /// Accepted forms: `2020`, `2020.0` (numeric spreadsheet cells), `2020'Q3`,
    /// `2020 Q3`, `2020-Q3`, `Q3 2020`, `Q3'20`, and ISO dates (`2020-08-15`,
    /// mapped to the quarter containing the date).
    pub fn parse(label: &str) -> Option<Period> {
        let s = label.trim();
        if s.is_empty() {
            return None;
        }

        if let Some(caps) = year_quarter_re().captures(s) {
            let year = caps[1].parse::<i32>().ok()?;
            let quarter = caps[2].parse::<u8>().ok()?;
            return Some(Period::Quarter { year, quarter });
        }
        if let Some(caps) = quarter_year_re().captures(s) {
            let quarter = caps[1].parse::<u8>().ok()?;
            let year = expand_year(&caps[2])?;
            return Some(Period::Quarter { year, quarter });
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let quarter = (date.month0() / 3 + 1) as u8;
            return Some(Period::Quarter {
                year: date.year(),
                quarter,
            });
        }
        if let Some(caps) = year_re().captures(s) {
            return caps[1].parse::<i32>().ok().map(Period::Year);
        }
        None
    }
}

fn expand_year(digits: &str) -> Option<i32> {
    let y = digits.parse::<i32>().ok()?;
    if digits.len() == 2 { Some(2000 + y) } else { Some(y) }
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})(?:\.0+)?$").expect("static regex"))
}

fn year_quarter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})\s*['’\-_/ ]?\s*[Qq]([1-4])$").expect("static regex")
    })
}

fn quarter_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[Qq]([1-4])\s*['’\-_/ ]?\s*(\d{4}|\d{2})$").expect("static regex")
    })
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Period::Year(y) => write!(f, "{y}"),
            Period::Quarter { year, quarter } => write!(f, "{year}'Q{quarter}"),
        }
    }
}

/// Canonical entity identity (company, country, region...).
///
/// Names are trimmed and inner whitespace is collapsed once at ingest. Equality,
/// ordering and hashing use a case-folded key; the display name keeps the
/// spelling it was created with.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EntityId {
    name: String,
    key: String,
}

impl EntityId {
    pub fn new(raw: &str) -> Self {
        let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let key = name.to_lowercase();
        Self { name, key }
    }

    /// Display name.
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// Case-folded lookup key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::new(s)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId::new(&s)
    }
}

impl From<EntityId> for String {
    fn from(e: EntityId) -> Self {
        e.name
    }
}

impl PartialEq for EntityId {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for EntityId {}

impl Hash for EntityId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl Ord for EntityId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl PartialOrd for EntityId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.name)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Metric schema of a dataset.
///
/// One implementation is chosen per dataset and validated at load time; every
/// stored value satisfies [`Metrics::is_finite`].
pub trait Metrics: Clone + fmt::Debug + PartialEq {
    /// Column names, in the order returned by [`Metrics::values`].
    const FIELDS: &'static [&'static str];

    /// Blend `a` toward `b`; `t` is already eased.
    fn lerp(a: &Self, b: &Self, t: f64) -> Self;

    /// Scale toward zero for fade-in/fade-out (`factor` in `[0, 1]`).
    fn scaled(&self, factor: f64) -> Self;

    fn is_finite(&self) -> bool;

    /// Metric used to rank entities (descending) in a snapshot.
    fn rank_value(&self) -> f64;

    fn values(&self) -> Vec<f64>;
}

impl Metrics for f64 {
    const FIELDS: &'static [&'static str] = &["value"];

    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        a + (b - a) * t
    }

    fn scaled(&self, factor: f64) -> Self {
        self * factor
    }

    fn is_finite(&self) -> bool {
        f64::is_finite(*self)
    }

    fn rank_value(&self) -> f64 {
        *self
    }

    fn values(&self) -> Vec<f64> {
        vec![*self]
    }
}

/// Bubble chart metrics: position from growth/margin, size from revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BubbleMetrics {
    /// Growth in percent (x axis)
    pub growth: f64,
    /// Margin in percent (y axis)
    pub margin: f64,
    /// Revenue (bubble area); also the ranking metric
    pub revenue: f64,
}

impl Metrics for BubbleMetrics {
    const FIELDS: &'static [&'static str] = &["growth", "margin", "revenue"];

    fn lerp(a: &Self, b: &Self, t: f64) -> Self {
        Self {
            growth: a.growth + (b.growth - a.growth) * t,
            margin: a.margin + (b.margin - a.margin) * t,
            revenue: a.revenue + (b.revenue - a.revenue) * t,
        }
    }

    // Fading shrinks the bubble in place.
    fn scaled(&self, factor: f64) -> Self {
        Self {
            revenue: self.revenue * factor,
            ..*self
        }
    }

    fn is_finite(&self) -> bool {
        self.growth.is_finite() && self.margin.is_finite() && self.revenue.is_finite()
    }

    fn rank_value(&self) -> f64 {
        self.revenue
    }

    fn values(&self) -> Vec<f64> {
        vec![self.growth, self.margin, self.revenue]
    }
}

/// One observation: entity, period and the dataset's metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<M> {
    pub entity: EntityId,
    pub period: Period,
    pub metrics: M,
}

impl<M> Record<M> {
    pub fn new(entity: impl Into<EntityId>, period: Period, metrics: M) -> Self {
        Self {
            entity: entity.into(),
            period,
            metrics,
        }
    }
}
