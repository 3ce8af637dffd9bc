//! Chart renderers: draw snapshots to **SVG** or **PNG** frames with plotters.
//!
//! - [`bars::RankedBars`]: top-N horizontal bar chart race
//! - [`bubble::BubbleChart`]: growth/margin scatter with revenue-sized bubbles
//! - [`timeline::TimelineMarker`]: period axis with a moving marker
//! - [`table::TableRenderer`]: text leaderboard for terminals
//!
//! Numbers are formatted with locale-aware thousands separators (`30,000` vs `30.000`).

pub mod bars;
pub mod bubble;
pub mod table;
pub mod text;
pub mod timeline;
pub mod util;

pub use bars::RankedBars;
pub use bubble::BubbleChart;
pub use table::TableRenderer;
pub use timeline::TimelineMarker;

use crate::render::{FrameFormat, FrameSink};
use anyhow::{Context, Result, anyhow};
use plotters::backend::DrawingBackend;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use plotters_svg::SVGBackend;
use std::fmt::Debug;
use std::sync::Once;

/// One-time registration for a fallback "sans-serif" font when using the `ab_glyph` text path.
/// Required because `ab_glyph` doesn't discover OS fonts.
static INIT_FONTS: Once = Once::new();

fn ensure_fonts_registered() {
    INIT_FONTS.call_once(|| {
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            include_bytes!("../../assets/DejaVuSans.ttf"),
        );
    });
}

/// Plotters errors carry the backend error type; flatten them for `anyhow`.
pub(crate) fn plot_err<E: Debug>(e: E) -> anyhow::Error {
    anyhow!("{:?}", e)
}

/// Something that can draw itself onto any plotters backend.
pub(crate) trait Scene {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>;
}

/// Draw `scene` as frame `index` of `sink`.
pub(crate) fn emit<S: Scene>(
    scene: &S,
    sink: &mut FrameSink,
    index: usize,
    size: (u32, u32),
) -> Result<()> {
    ensure_fonts_registered();
    match sink.format() {
        FrameFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                root.fill(&WHITE).map_err(plot_err)?;
                scene.draw(&root)?;
                root.present().map_err(plot_err)?;
            }
            sink.push_svg(index, svg)
        }
        FrameFormat::Png => {
            let path = sink
                .frame_path(index)
                .context("bitmap frames need a directory sink")?;
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("create frame dir {}", dir.display()))?;
            }
            let root = BitMapBackend::new(&path, size).into_drawing_area();
            root.fill(&WHITE).map_err(plot_err)?;
            scene.draw(&root)?;
            root.present().map_err(plot_err)?;
            Ok(())
        }
    }
}
