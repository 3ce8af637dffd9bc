//! Plain-text leaderboard, for terminal playback and quick inspection.

use super::util::{format_value, map_locale};
use crate::interp::Snapshot;
use crate::models::Metrics;
use crate::render::Renderer;
use anyhow::{Context, Result};
use num_format::Locale;
use std::io::Write;

pub struct TableRenderer<W: Write> {
    out: W,
    top_n: usize,
    locale: &'static Locale,
    dec_sep: char,
    /// Clear the terminal before each frame.
    clear: bool,
}

impl<W: Write> TableRenderer<W> {
    pub fn new(out: W) -> Self {
        let (locale, dec_sep) = map_locale("en");
        Self {
            out,
            top_n: 10,
            locale,
            dec_sep,
            clear: false,
        }
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_locale(mut self, tag: &str) -> Self {
        (self.locale, self.dec_sep) = map_locale(tag);
        self
    }

    pub fn clearing(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<M: Metrics, W: Write> Renderer<M> for TableRenderer<W> {
    fn name(&self) -> &str {
        "table"
    }

    fn render(&mut self, snapshot: &Snapshot<M>, period_label: &str) -> Result<()> {
        let mut buf = String::new();
        if self.clear {
            buf.push_str("\x1b[2J\x1b[H");
        }
        buf.push_str(&format!("== {period_label} ==\n"));
        let width = snapshot
            .entries
            .iter()
            .take(self.top_n)
            .map(|e| e.entity.as_str().chars().count())
            .max()
            .unwrap_or(6)
            .max(6);
        buf.push_str(&format!("{:>3}  {:<width$}", "#", "entity"));
        for f in M::FIELDS {
            buf.push_str(&format!("  {f:>12}"));
        }
        buf.push('\n');
        for e in snapshot.entries.iter().take(self.top_n) {
            buf.push_str(&format!("{:>3}  {:<width$}", e.rank + 1, e.entity.as_str()));
            for v in e.metrics.values() {
                let s = format_value(v, self.locale, self.dec_sep);
                buf.push_str(&format!("  {s:>12}"));
            }
            buf.push('\n');
        }
        self.out
            .write_all(buf.as_bytes())
            .and_then(|_| self.out.flush())
            .context("write table frame")
    }
}
