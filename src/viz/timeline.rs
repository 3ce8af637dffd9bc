//! Period axis with a marker at the animation's fractional position.

use super::{Scene, emit, plot_err};
use crate::interp::Snapshot;
use crate::models::{Metrics, Period};
use crate::render::{FrameSink, Renderer};
use anyhow::Result;
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

const MARGIN_PX: i32 = 30;

pub struct TimelineMarker {
    sink: FrameSink,
    labels: Vec<String>,
    size: (u32, u32),
    frames: usize,
}

impl TimelineMarker {
    pub fn new(periods: &[Period], sink: FrameSink) -> Self {
        Self {
            sink,
            labels: periods.iter().map(|p| p.to_string()).collect(),
            size: (960, 80),
            frames: 0,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(100), height.max(40));
        self
    }

    pub fn sink(&self) -> &FrameSink {
        &self.sink
    }

    /// Show every `k`-th tick label so labels never overlap.
    fn label_step(&self) -> usize {
        let width = (self.size.0 as i32 - 2 * MARGIN_PX).max(1) as usize;
        let widest = self.labels.iter().map(|l| l.chars().count()).max().unwrap_or(4);
        let per_label = widest * 7 + 12;
        let fit = (width / per_label).max(1);
        self.labels.len().div_ceil(fit).max(1)
    }
}

struct TimelineScene<'a> {
    labels: &'a [String],
    position: f64,
    label_step: usize,
}

impl Scene for TimelineScene<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        let (w, h) = root.dim_in_pixel();
        let (w, h) = (w as i32, h as i32);
        let axis_y = h / 2;
        let span = (w - 2 * MARGIN_PX).max(1);
        let last = self.labels.len().saturating_sub(1).max(1) as f64;
        let x_at = |idx: f64| MARGIN_PX + (idx / last * span as f64).round() as i32;
        let grey = RGBColor(150, 150, 150);

        root.draw(&PathElement::new(
            vec![(MARGIN_PX, axis_y), (w - MARGIN_PX, axis_y)],
            grey.stroke_width(2),
        ))
        .map_err(plot_err)?;

        let tick_style = (FontFamily::SansSerif, 11.0)
            .into_font()
            .color(&RGBColor(90, 90, 90))
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (i, label) in self.labels.iter().enumerate() {
            let x = x_at(i as f64);
            root.draw(&PathElement::new(vec![(x, axis_y - 5), (x, axis_y + 5)], grey))
                .map_err(plot_err)?;
            if i % self.label_step == 0 || i + 1 == self.labels.len() {
                root.draw(&Text::new(label.clone(), (x, axis_y + 9), tick_style.clone()))
                    .map_err(plot_err)?;
            }
        }

        let mx = x_at(self.position.clamp(0.0, last));
        root.draw(&Circle::new((mx, axis_y), 7, RGBColor(68, 114, 196).filled()))
            .map_err(plot_err)?;
        Ok(())
    }
}

impl<M: Metrics> Renderer<M> for TimelineMarker {
    fn name(&self) -> &str {
        "timeline"
    }

    fn render(&mut self, snapshot: &Snapshot<M>, _period_label: &str) -> Result<()> {
        let scene = TimelineScene {
            labels: &self.labels,
            position: snapshot.position,
            label_step: self.label_step(),
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
    use crate::store::PeriodFrame;

    #[test]
    fn draws_ticks_and_marker() {
        let periods: Vec<Period> = (2019..=2022).map(Period::Year).collect();
        let mut t = TimelineMarker::new(&periods, FrameSink::memory());
        let f: PeriodFrame<f64> = PeriodFrame::new();
        let mut s = Interpolator::default().interpolate(
            FrameRef::new(periods[1], &f),
            FrameRef::new(periods[2], &f),
            0.5,
        );
        s.position = 1.5;
        t.render(&s, "2020").unwrap();
        let svg = &t.sink().frames()[0];
        for y in ["2019", "2020", "2021", "2022"] {
            assert!(svg.contains(y), "missing tick {y}");
        }
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn thins_labels_when_crowded() {
        let periods: Vec<Period> = (0..80)
            .map(|i| Period::Quarter {
                year: 2000 + i / 4,
                quarter: (i % 4 + 1) as u8,
            })
            .collect();
        let t = TimelineMarker::new(&periods, FrameSink::memory());
        assert!(t.label_step() > 1);
        let few = TimelineMarker::new(&periods[..4], FrameSink::memory());
        assert_eq!(few.label_step(), 1);
    }
}
