//! Ranked horizontal bar chart ("bar chart race").
//!
//! The top `top_n` entries of a snapshot are drawn as horizontal bars ordered
//! by rank, each labeled with the entity name on the left and its formatted
//! value at the bar's end. The value axis maximum never shrinks during a run
//! (unless fixed by configuration), so bars do not jump when the leader drops.

use super::text::truncate_to_width;
use super::util::{choose_axis_scale, format_value, map_locale, nice_ceiling};
use super::{Scene, emit, plot_err};
use crate::config::VizConfig;
use crate::error::ConfigError;
use crate::interp::Snapshot;
use crate::models::Metrics;
use crate::render::{FrameSink, Renderer};
use crate::style::Palette;
use anyhow::Result;
use num_format::{Locale, ToFormattedString};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const LABEL_PX: u32 = 13;
const NAME_AREA_PX: u32 = 150;

pub struct RankedBars {
    sink: FrameSink,
    palette: Palette,
    title: Option<String>,
    top_n: usize,
    locale: &'static Locale,
    dec_sep: char,
    value_max: Option<f64>,
    running_max: f64,
    size: (u32, u32),
    frames: usize,
}

impl RankedBars {
    pub fn new(sink: FrameSink) -> Self {
        let (locale, dec_sep) = map_locale("en");
        Self {
            sink,
            palette: Palette::new(),
            title: None,
            top_n: 10,
            locale,
            dec_sep,
            value_max: None,
            running_max: 0.0,
            size: (960, 540),
            frames: 0,
        }
    }

    /// Palette, title, `top_n`, locale and fixed axis maximum from `config`.
    pub fn from_config(config: &VizConfig, sink: FrameSink) -> Result<Self, ConfigError> {
        let (locale, dec_sep) = map_locale(&config.locale);
        Ok(Self {
            palette: config.palette()?,
            title: config.title.clone(),
            top_n: config.top_n.max(1),
            locale,
            dec_sep,
            value_max: config.axes.value_max.filter(|v| v.is_finite() && *v > 0.0),
            ..Self::new(sink)
        })
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(200), height.max(120));
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn sink(&self) -> &FrameSink {
        &self.sink
    }

    /// Axis maximum for a frame whose largest shown value is `frame_max`.
    fn axis_max(&mut self, frame_max: f64) -> f64 {
        if let Some(fixed) = self.value_max {
            return fixed;
        }
        if frame_max.is_finite() && frame_max > self.running_max {
            self.running_max = frame_max;
        }
        nice_ceiling(self.running_max)
    }
}

struct Bar {
    name: String,
    value: f64,
    label: String,
    color: RGBAColor,
}

struct BarsScene<'a> {
    title: Option<&'a str>,
    period: &'a str,
    bars: Vec<Bar>,
    slots: usize,
    axis_max: f64,
    locale: &'static Locale,
}

impl Scene for BarsScene<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let (scale, scale_label) = choose_axis_scale(self.axis_max);
        let slots = self.slots.max(1) as f64;
        let mut builder = ChartBuilder::on(root);
        builder
            .margin(16)
            .set_label_area_size(LabelAreaPosition::Left, NAME_AREA_PX)
            .set_label_area_size(LabelAreaPosition::Bottom, 40);
        if let Some(t) = self.title {
            builder.caption(t, (FontFamily::SansSerif, 24));
        }
        let mut chart = builder
            .build_cartesian_2d(0.0..self.axis_max / scale, 0.0..slots)
            .map_err(plot_err)?;

        let locale = self.locale;
        let x_fmt = |v: &f64| ((v.round()) as i64).to_formatted_string(locale);
        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(0)
            .x_labels(6)
            .x_desc(scale_label)
            .x_label_formatter(&x_fmt)
            .label_style((FontFamily::SansSerif, 12))
            .draw()
            .map_err(plot_err)?;

        let font = (FontFamily::SansSerif, LABEL_PX as f64).into_font();
        let name_style = font.color(&BLACK).pos(Pos::new(HPos::Right, VPos::Center));
        let value_style = font.color(&BLACK).pos(Pos::new(HPos::Left, VPos::Center));

        for (i, bar) in self.bars.iter().enumerate() {
            // rank 0 at the top
            let y_top = slots - i as f64 - 0.1;
            let y_bottom = slots - i as f64 - 0.9;
            let y_mid = slots - i as f64 - 0.5;
            let v = bar.value.max(0.0) / scale;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(0.0, y_bottom), (v, y_top)],
                    bar.color.filled(),
                )))
                .map_err(plot_err)?;
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((0.0, y_mid))
                        + Text::new(bar.name.clone(), (-6, 0), name_style.clone()),
                ))
                .map_err(plot_err)?;
            chart
                .draw_series(std::iter::once(
                    EmptyElement::at((v, y_mid))
                        + Text::new(bar.label.clone(), (6, 0), value_style.clone()),
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
            (w as i32 - 30, h as i32 - 60),
            period_style,
        ))
        .map_err(plot_err)?;
        Ok(())
    }
}

impl<M: Metrics> Renderer<M> for RankedBars {
    fn name(&self) -> &str {
        "bars"
    }

    fn render(&mut self, snapshot: &Snapshot<M>, period_label: &str) -> Result<()> {
        let shown: Vec<_> = snapshot.entries.iter().take(self.top_n).collect();
        let frame_max = shown
            .iter()
            .map(|e| e.metrics.rank_value())
            .fold(0.0, f64::max);
        let axis_max = self.axis_max(frame_max);

        let bars = shown
            .iter()
            .map(|e| {
                let v = e.metrics.rank_value();
                Bar {
                    name: truncate_to_width(e.entity.as_str(), LABEL_PX, NAME_AREA_PX - 12),
                    value: v.min(axis_max),
                    label: format_value(v, self.locale, self.dec_sep),
                    color: self
                        .palette
                        .color_for(&e.entity)
                        .to_plotters()
                        .mix(0.35 + 0.65 * e.presence),
                }
            })
            .collect();

        let scene = BarsScene {
            title: self.title.as_deref(),
            period: period_label,
            bars,
            slots: self.top_n,
            axis_max,
            locale: self.locale,
        };
        let index = self.frames;
        emit(&scene, &mut self.sink, index, self.size)?;
        self.frames += 1;
        Ok(())
    }
}
