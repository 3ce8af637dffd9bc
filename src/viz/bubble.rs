//! Bubble chart: x = growth, y = margin, bubble area proportional to revenue.
//!
//! Axis ranges and the revenue reference are fixed for the whole run (from
//! configuration or from the series' domain), so bubbles move smoothly
//! instead of the axes rescaling under them. Fading entities keep their
//! position and shrink; their opacity follows `presence`.

use super::text::truncate_to_width;
use super::util::pad_range;
use super::{Scene, emit, plot_err};
use crate::config::VizConfig;
use crate::error::ConfigError;
use crate::interp::Snapshot;
use crate::models::BubbleMetrics;
use crate::render::{FrameSink, Renderer};
use crate::stats::value_domain;
use crate::store::Series;
use crate::style::Palette;
use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

pub struct BubbleChart {
    sink: FrameSink,
    palette: Palette,
    title: Option<String>,
    x_range: (f64, f64),
    y_range: (f64, f64),
    radius_max: f64,
    revenue_max: f64,
    size: (u32, u32),
    frames: usize,
}

impl BubbleChart {
    pub fn new(sink: FrameSink) -> Self {
        Self {
            sink,
            palette: Palette::new(),
            title: None,
            x_range: (-10.0, 50.0),
            y_range: (-30.0, 50.0),
            radius_max: 40.0,
            revenue_max: 1.0,
            size: (960, 720),
            frames: 0,
        }
    }

    /// Axes from `config.axes` where set, otherwise from the series' domain
    /// padded by 10%.
    pub fn for_series(
        series: &Series<BubbleMetrics>,
        config: &VizConfig,
        sink: FrameSink,
    ) -> Result<Self, ConfigError> {
        let padded = |field: &str, fallback: (f64, f64)| {
            value_domain(series, field)
                .map(|(lo, hi)| pad_range(lo, hi, 0.1))
                .unwrap_or(fallback)
        };
        let base = Self::new(sink);
        let x_range = config
            .axes
            .x
            .map(|[lo, hi]| (lo, hi))
            .unwrap_or_else(|| padded("growth", base.x_range));
        let y_range = config
            .axes
            .y
            .map(|[lo, hi]| (lo, hi))
            .unwrap_or_else(|| padded("margin", base.y_range));
        let revenue_max = value_domain(series, "revenue")
            .map(|(_, hi)| hi)
            .filter(|hi| *hi > 0.0)
            .unwrap_or(1.0);
        Ok(Self {
            palette: config.palette()?,
            title: config.title.clone(),
            radius_max: config.axes.radius_max.max(1.0),
            ..base
        }
        .with_axes(x_range, y_range, revenue_max))
    }

    pub fn with_axes(mut self, x: (f64, f64), y: (f64, f64), revenue_max: f64) -> Self {
        let fix = |(lo, hi): (f64, f64)| if hi > lo { (lo, hi) } else { pad_range(lo, lo, 0.0) };
        self.x_range = fix(x);
        self.y_range = fix(y);
        self.revenue_max = if revenue_max > 0.0 { revenue_max } else { 1.0 };
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(200), height.max(200));
        self
    }

    pub fn sink(&self) -> &FrameSink {
        &self.sink
    }

    /// Pixel radius for `revenue` (area-proportional, square-root scaled).
    pub fn radius(&self, revenue: f64) -> f64 {
        let r = (revenue.max(0.0) / self.revenue_max).sqrt() * self.radius_max;
        r.min(self.radius_max * 1.5)
    }
}

struct Bubble {
    name: String,
    x: f64,
    y: f64,
    radius: i32,
    color: RGBAColor,
}

struct BubbleScene<'a> {
    title: Option<&'a str>,
    period: &'a str,
    x_range: (f64, f64),
    y_range: (f64, f64),
    bubbles: Vec<Bubble>,
}

impl Scene for BubbleScene<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let mut builder = ChartBuilder::on(root);
        builder
            .margin(16)
            .set_label_area_size(LabelAreaPosition::Left, 56)
            .set_label_area_size(LabelAreaPosition::Bottom, 48);
        if let Some(t) = self.title {
            builder.caption(t, (FontFamily::SansSerif, 24));
        }
        let mut chart = builder
            .build_cartesian_2d(
                self.x_range.0..self.x_range.1,
                self.y_range.0..self.y_range.1,
            )
            .map_err(plot_err)?;
        let pct = |v: &f64| format!("{v:.0}%");
        chart
            .configure_mesh()
            .x_desc("Growth")
            .y_desc("Margin")
            .x_label_formatter(&pct)
            .y_label_formatter(&pct)
            .label_style((FontFamily::SansSerif, 12))
            .axis_desc_style((FontFamily::SansSerif, 16))
            .draw()
            .map_err(plot_err)?;

        // Entries arrive largest first, so small bubbles are drawn on top.
        chart
            .draw_series(
                self.bubbles
                    .iter()
                    .map(|b| Circle::new((b.x, b.y), b.radius, b.color.filled())),
            )
            .map_err(plot_err)?;

        let label_style = (FontFamily::SansSerif, 12.0)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        for b in &self.bubbles {
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((b.x, b.y))
                        + Text::new(b.name.clone(), (0, 0), label_style.clone()),
                ))
                .map_err(plot_err)?;
        }

        let (w, h) = root.dim_in_pixel();
        let period_style = (FontFamily::SansSerif, 40.0)
            .into_font()
            .color(&RGBColor(120, 120, 120))
            .pos(Pos::new(HPos::Right, VPos::Bottom));
        root.draw(&Text::new(
            self.period.to_string(),
            (w as i32 - 30, h as i32 - 70),
            period_style,
        ))
        .map_err(plot_err)?;
        Ok(())
    }
}

impl Renderer<BubbleMetrics> for BubbleChart {
    fn name(&self) -> &str {
        "bubbles"
    }

    fn render(&mut self, snapshot: &Snapshot<BubbleMetrics>, period_label: &str) -> Result<()> {
        let bubbles = snapshot
            .entries
            .iter()
            .map(|e| Bubble {
                name: truncate_to_width(e.entity.as_str(), 12, 110),
                x: e.metrics.growth,
                y: e.metrics.margin,
                radius: self.radius(e.metrics.revenue).round() as i32,
                color: self
                    .palette
                    .color_for(&e.entity)
                    .to_plotters()
                    .mix(0.75 * e.presence.clamp(0.0, 1.0)),
            })
            .collect();
        let scene = BubbleScene {
            title: self.title.as_deref(),
            period: period_label,
            x_range: self.x_range,
            y_range: self.y_range,
            bubbles,
        };
        let index = self.frames;
        emit(&scene, &mut self.sink, index, self.size)?;
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{FrameRef, Interpolator};
    use crate::models::{EntityId, Period, Record};
    use crate::store::PeriodFrame;

    fn bm(growth: f64, margin: f64, revenue: f64) -> BubbleMetrics {
        BubbleMetrics {
            growth,
            margin,
            revenue,
        }
    }

    #[test]
    fn radius_is_square_root_scaled() {
        let c = BubbleChart::new(FrameSink::memory()).with_axes((0.0, 1.0), (0.0, 1.0), 100.0);
        assert_eq!(c.radius(100.0), 40.0);
        assert_eq!(c.radius(25.0), 20.0);
        assert_eq!(c.radius(-5.0), 0.0);
    }

    #[test]
    fn axes_follow_config_then_data() {
        let series = Series::from_records(vec![
            Record::new("A", Period::Year(2020), bm(0.0, 10.0, 50.0)),
            Record::new("B", Period::Year(2020), bm(20.0, 30.0, 200.0)),
        ])
        .unwrap();
        let cfg = VizConfig::from_json(r#"{"axes": {"x": [-5, 5]}}"#).unwrap();
        let c = BubbleChart::for_series(&series, &cfg, FrameSink::memory()).unwrap();
        assert_eq!(c.x_range, (-5.0, 5.0));
        assert_eq!(c.y_range, (8.0, 32.0));
        assert_eq!(c.revenue_max, 200.0);
    }

    #[test]
    fn renders_entities_and_period() {
        let f: PeriodFrame<BubbleMetrics> = [
            (EntityId::new("Netflix"), bm(10.0, 20.0, 30.0)),
            (EntityId::new("Roku"), bm(-5.0, -10.0, 3.0)),
        ]
        .into_iter()
        .collect();
        let p = Period::Quarter {
            year: 2021,
            quarter: 2,
        };
        let s = Interpolator::default().interpolate(FrameRef::new(p, &f), FrameRef::new(p, &f), 0.0);
        let mut c = BubbleChart::new(FrameSink::memory()).with_axes((-20.0, 40.0), (-20.0, 40.0), 30.0);
        c.render(&s, &s.label()).unwrap();
        let svg = &c.sink().frames()[0];
        assert!(svg.contains("Netflix"));
        assert!(svg.contains("Roku"));
        assert!(svg.contains("2021"));
        assert!(svg.contains("<circle"));
    }
}
