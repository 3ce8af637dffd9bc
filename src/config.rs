//! Per-deployment configuration (JSON).
//!
//! ```json
//! {
//!   "title": "Streaming revenue",
//!   "colors": { "Netflix": "#E50914" },
//!   "logos": { "Netflix": "logos/netflix.png" },
//!   "default_selected": ["Netflix", "Disney"],
//!   "top_n": 10,
//!   "locale": "en",
//!   "animation": { "period_ms": 1500, "ease": "in-out-cubic", "fade": { "mode": "fade", "hold": 0.7 } },
//!   "axes": { "value_max": 40000, "x": [-20, 60], "y": [-30, 50] }
//! }
//! ```
//!
//! Every field is optional. Entity keys are canonicalized like [`EntityId`],
//! so `"netflix "` and `"Netflix"` address the same entity.

use crate::ease::Ease;
use crate::error::ConfigError;
use crate::interp::{FadePolicy, Interpolator};
use crate::models::EntityId;
use crate::scheduler::SchedulerConfig;
use crate::selection::Selection;
use crate::style::{Palette, Rgb8};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub title: Option<String>,
    pub colors: BTreeMap<String, String>,
    pub logos: BTreeMap<String, PathBuf>,
    pub default_selected: Vec<String>,
    /// Bars shown by the ranked bar chart.
    pub top_n: usize,
    /// Number formatting locale tag (`en`, `de`, `fr`...).
    pub locale: String,
    pub animation: AnimationConfig,
    pub axes: AxesConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            title: None,
            colors: BTreeMap::new(),
            logos: BTreeMap::new(),
            default_selected: Vec::new(),
            top_n: 10,
            locale: "en".to_string(),
            animation: AnimationConfig::default(),
            axes: AxesConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub period_ms: u64,
    pub min_frame_interval_ms: u64,
    pub startup_delay_ms: u64,
    #[serde(deserialize_with = "de_ease")]
    pub ease: Ease,
    pub fade: FadePolicy,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        let s = SchedulerConfig::default();
        Self {
            period_ms: s.period_duration.as_millis() as u64,
            min_frame_interval_ms: s.min_frame_interval.as_millis() as u64,
            startup_delay_ms: s.startup_delay.as_millis() as u64,
            ease: Ease::default(),
            fade: FadePolicy::default(),
        }
    }
}

/// Fixed axis ranges; `None` means "derive from the data".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    /// Upper bound of the ranked bar value axis.
    pub value_max: Option<f64>,
    /// Bubble chart x range (growth).
    pub x: Option<[f64; 2]>,
    /// Bubble chart y range (margin).
    pub y: Option<[f64; 2]>,
    /// Radius in pixels of the largest bubble.
    pub radius_max: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            value_max: None,
            x: None,
            y: None,
            radius_max: 40.0,
        }
    }
}

/// Serde helper: accept any spelling understood by [`Ease::from_name`].
fn de_ease<'de, D>(deserializer: D) -> Result<Ease, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let name = String::deserialize(deserializer)?;
    Ease::from_name(&name).ok_or_else(|| D::Error::custom(format!("unknown ease {name:?}")))
}

/// Entity -> logo path lookup. Missing entities have no logo.
#[derive(Debug, Clone, Default)]
pub struct LogoMap {
    paths: AHashMap<EntityId, PathBuf>,
}

impl LogoMap {
    pub fn logo_for(&self, entity: &EntityId) -> Option<&Path> {
        self.paths.get(entity).map(|p| p.as_path())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl VizConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: VizConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// `periodviz/config.json` in the user's config directory, if present.
    pub fn discover() -> Option<PathBuf> {
        let p = dirs::config_dir()?.join("periodviz").join("config.json");
        p.is_file().then_some(p)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.palette()?;
        if let FadePolicy::Fade { hold } = self.animation.fade
            && !(hold > 0.0 && hold < 1.0)
        {
            return Err(ConfigError::InvalidFade(hold));
        }
        Ok(())
    }

    pub fn palette(&self) -> Result<Palette, ConfigError> {
        let mut palette = Palette::new();
        for (entity, value) in &self.colors {
            let color = Rgb8::from_hex(value).ok_or_else(|| ConfigError::InvalidColor {
                entity: entity.clone(),
                value: value.clone(),
            })?;
            palette.insert(EntityId::new(entity), color);
        }
        Ok(palette)
    }

    pub fn logos(&self) -> LogoMap {
        LogoMap {
            paths: self
                .logos
                .iter()
                .map(|(e, p)| (EntityId::new(e), p.clone()))
                .collect(),
        }
    }

    /// `default_selected`, or everything when the list is empty.
    pub fn selection(&self) -> Selection {
        if self.default_selected.is_empty() {
            Selection::All
        } else {
            Selection::only(self.default_selected.iter().map(|s| s.as_str()))
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            period_duration: Duration::from_millis(self.animation.period_ms.max(1)),
            min_frame_interval: Duration::from_millis(self.animation.min_frame_interval_ms),
            startup_delay: Duration::from_millis(self.animation.startup_delay_ms),
        }
    }

    pub fn interpolator(&self) -> Interpolator {
        Interpolator::new(self.animation.ease, self.animation.fade)
    }
}
