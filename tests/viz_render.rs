use periodviz::render::{FrameFormat, FrameSink};
use periodviz::viz::{BubbleChart, RankedBars, TimelineMarker};
use periodviz::{
    BubbleMetrics, Interpolator, Period, Player, Record, Renderer, SchedulerConfig, Series,
    VizConfig,
};
use std::fs;
use std::path::Path;

fn values() -> Series<f64> {
    Series::from_records(vec![
        Record::new("Germany", Period::Year(2019), 1.0),
        Record::new("Germany", Period::Year(2020), 2.0),
        Record::new("Germany", Period::Year(2021), 3.0),
        Record::new("United States", Period::Year(2019), 2.0),
        Record::new("United States", Period::Year(2020), 2.5),
        Record::new("United States", Period::Year(2021), 3.5),
    ])
    .unwrap()
}

fn bubbles() -> Series<BubbleMetrics> {
    let m = |growth, margin, revenue| BubbleMetrics {
        growth,
        margin,
        revenue,
    };
    Series::from_records(vec![
        Record::new("Netflix", Period::Year(2020), m(24.0, 18.0, 25_000.0)),
        Record::new("Netflix", Period::Year(2021), m(18.8, 20.9, 29_700.0)),
        Record::new("Roku", Period::Year(2021), m(55.0, -2.0, 2_700.0)),
    ])
    .unwrap()
}

fn assert_non_empty(path: &Path) {
    let meta = fs::metadata(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    assert!(meta.len() > 0, "{} is empty", path.display());
}

fn render_positions<M, R>(series: &Series<M>, renderer: &mut R, positions: &[f64])
where
    M: periodviz::Metrics,
    R: Renderer<M>,
{
    let player = Player::new(series.clone(), Interpolator::default(), SchedulerConfig::default());
    for &pos in positions {
        let snap = player.snapshot_at(pos).unwrap();
        renderer.render(&snap, &snap.label()).unwrap();
    }
}

#[test]
fn bars_write_numbered_svg_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut bars = RankedBars::new(FrameSink::directory(dir.path(), "bars", FrameFormat::Svg));
    render_positions(&values(), &mut bars, &[0.0, 0.5, 1.0]);
    for i in 0..3 {
        let path = bars.sink().frame_path(i).unwrap();
        assert_non_empty(&path);
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Germany"));
    }
    assert!(!dir.path().join("bars_00003.svg").exists());
}

#[test]
fn bars_write_png_frames() {
    let dir = tempfile::tempdir().unwrap();
    let mut bars = RankedBars::new(FrameSink::directory(dir.path(), "bars", FrameFormat::Png))
        .with_size(320, 180);
    render_positions(&values(), &mut bars, &[1.25]);
    assert_non_empty(&dir.path().join("bars_00000.png"));
}

#[test]
fn bubble_chart_draws_every_visible_entity() {
    let series = bubbles();
    let mut chart = BubbleChart::for_series(&series, &VizConfig::default(), FrameSink::memory())
        .unwrap()
        .with_size(480, 360);
    render_positions(&series, &mut chart, &[0.9]);
    let frames = chart.sink().frames();
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("Netflix"));
    assert!(frames[0].contains("Roku"));
}

#[test]
fn timeline_frames_follow_the_position() {
    let series = values();
    let mut marker = TimelineMarker::new(series.periods_sorted(), FrameSink::memory());
    render_positions(&series, &mut marker, &[0.0, 2.0]);
    let frames = marker.sink().frames();
    assert_eq!(frames.len(), 2);
    assert_ne!(frames[0], frames[1]);
    assert!(frames[0].contains("2019"));
    assert!(frames[0].contains("2021"));
}
