//! Renderer contract and frame output.

use crate::interp::Snapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Consumer of interpolated snapshots (bar chart, bubble chart, timeline...).
///
/// Called once per scheduler tick; must not block for long. Errors are logged
/// by the player and do not stop the other renderers.
pub trait Renderer<M> {
    fn name(&self) -> &str;

    fn render(&mut self, snapshot: &Snapshot<M>, period_label: &str) -> Result<()>;
}

/// Output image format of a chart frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Svg,
    Png,
}

impl FrameFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FrameFormat::Svg => "svg",
            FrameFormat::Png => "png",
        }
    }
}

/// Where drawn frames go.
#[derive(Debug, Clone)]
pub enum FrameSink {
    /// Numbered files `<prefix>_00000.<ext>` in `dir`.
    Directory {
        dir: PathBuf,
        prefix: String,
        format: FrameFormat,
    },
    /// SVG documents kept in memory.
    Memory(Vec<String>),
}

impl FrameSink {
    pub fn directory(dir: impl Into<PathBuf>, prefix: &str, format: FrameFormat) -> Self {
        FrameSink::Directory {
            dir: dir.into(),
            prefix: prefix.to_string(),
            format,
        }
    }

    pub fn memory() -> Self {
        FrameSink::Memory(Vec::new())
    }

    pub fn format(&self) -> FrameFormat {
        match self {
            FrameSink::Directory { format, .. } => *format,
            FrameSink::Memory(_) => FrameFormat::Svg,
        }
    }

    /// Target path of frame `index` for bitmap output (`None` for memory sinks).
    pub fn frame_path(&self, index: usize) -> Option<PathBuf> {
        match self {
            FrameSink::Directory {
                dir,
                prefix,
                format,
            } => Some(dir.join(format!("{prefix}_{index:05}.{}", format.extension()))),
            FrameSink::Memory(_) => None,
        }
    }

    /// Store an SVG document as frame `index`.
    pub fn push_svg(&mut self, index: usize, svg: String) -> Result<()> {
        match self {
            FrameSink::Memory(frames) => {
                frames.push(svg);
                Ok(())
            }
            FrameSink::Directory { dir, .. } => {
                fs::create_dir_all(&*dir)
                    .with_context(|| format!("create frame dir {}", dir.display()))?;
                let path = self
                    .frame_path(index)
                    .context("directory sink has a frame path")?;
                fs::write(&path, svg).with_context(|| format!("write {}", path.display()))
            }
        }
    }

    /// Frames kept by a memory sink.
    pub fn frames(&self) -> &[String] {
        match self {
            FrameSink::Memory(frames) => frames,
            FrameSink::Directory { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn directory_sink_numbers_frames() {
        let dir = tempdir().unwrap();
        let mut sink = FrameSink::directory(dir.path().join("out"), "bars", FrameFormat::Svg);
        sink.push_svg(3, "<svg/>".into()).unwrap();
        let p = dir.path().join("out").join("bars_00003.svg");
        assert_eq!(std::fs::read_to_string(p).unwrap(), "<svg/>");
    }

    #[test]
    fn memory_sink_keeps_frames() {
        let mut sink = FrameSink::memory();
        sink.push_svg(0, "a".into()).unwrap();
        sink.push_svg(1, "b".into()).unwrap();
        assert_eq!(sink.frames(), ["a", "b"]);
        assert!(sink.frame_path(0).is_none());
    }
}
