use anyhow::bail;
use periodviz::render::FrameSink;
use periodviz::viz::RankedBars;
use periodviz::{Interpolator, Period, Player, Record, Renderer, SchedulerConfig, Series, Snapshot};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

struct Broken;

impl Renderer<f64> for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn render(&mut self, _snapshot: &Snapshot<f64>, label: &str) -> anyhow::Result<()> {
        bail!("cannot draw {label}")
    }
}

struct Counter(Rc<Cell<usize>>);

impl Renderer<f64> for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn render(&mut self, _snapshot: &Snapshot<f64>, _label: &str) -> anyhow::Result<()> {
        self.0.set(self.0.get() + 1);
        Ok(())
    }
}

fn series() -> Series<f64> {
    Series::from_records(vec![
        Record::new("A", Period::Year(2020), 1.0),
        Record::new("A", Period::Year(2021), 2.0),
    ])
    .unwrap()
}

#[test]
fn failing_renderer_does_not_stop_the_others() {
    let count = Rc::new(Cell::new(0));
    let cfg = SchedulerConfig {
        startup_delay: Duration::ZERO,
        ..SchedulerConfig::default()
    };
    let mut p = Player::new(series(), Interpolator::default(), cfg);
    p.add_renderer(Box::new(Broken));
    p.add_renderer(Box::new(Counter(count.clone())));
    p.play(Duration::ZERO);

    for k in 0..5u64 {
        assert!(p.on_frame(Duration::from_millis(k * 100)).is_some());
    }
    assert_eq!(count.get(), 5);
    assert_eq!(p.frames_pushed(), 5);
    assert!(p.is_playing());
}

#[test]
fn chart_renderers_run_alongside_a_broken_one() {
    let mut p = Player::new(series(), Interpolator::default(), SchedulerConfig::default());
    p.add_renderer(Box::new(Broken));
    p.add_renderer(Box::new(RankedBars::new(FrameSink::memory())));
    assert!(p.render_at(0.5).is_some());
    assert!(p.render_at(1.0).is_some());
    assert_eq!(p.frames_pushed(), 2);
}
