//! Frame scheduler: a `Stopped`/`Playing` state machine over wall-clock time.
//!
//! [`tick`] is pure: given the current state and a timestamp it returns the
//! next state and, when a frame is due, where on the timeline that frame sits.
//! [`Player`] wires the tick to a series, the interpolator and the renderers.
//! Timestamps are [`Duration`]s since an arbitrary monotonic origin.

use crate::interp::{FrameRef, Interpolator, Snapshot};
use crate::models::Metrics;
use crate::render::Renderer;
use crate::selection::Selection;
use crate::store::{PeriodFrame, Series};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Time spent transitioning from one period to the next.
    pub period_duration: Duration,
    /// Callbacks closer together than this are dropped.
    pub min_frame_interval: Duration,
    /// Grace period between a play command and the first frame.
    pub startup_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            period_duration: Duration::from_millis(1500),
            min_frame_interval: Duration::from_millis(16),
            startup_delay: Duration::from_millis(300),
        }
    }
}

impl SchedulerConfig {
    /// Length of one full loop over `num_periods` periods.
    pub fn total_duration(&self, num_periods: usize) -> Duration {
        let steps = num_periods.saturating_sub(1).max(1) as u32;
        self.period_duration * steps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Stopped,
    Playing {
        /// First instant frames are produced for (play time + startup delay).
        started_at: Duration,
        last_frame_at: Option<Duration>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationState {
    pub playback: Playback,
    /// Elapsed animation time accumulated before `started_at`.
    pub offset: Duration,
    pub current_period_index: usize,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            playback: Playback::Stopped,
            offset: Duration::ZERO,
            current_period_index: 0,
        }
    }
}

impl AnimationState {
    pub fn is_playing(&self) -> bool {
        matches!(self.playback, Playback::Playing { .. })
    }

    /// Animation time at `now` (frozen while stopped).
    pub fn elapsed(&self, now: Duration) -> Duration {
        match self.playback {
            Playback::Stopped => self.offset,
            Playback::Playing { started_at, .. } => self.offset + now.saturating_sub(started_at),
        }
    }

    /// Stopped -> Playing. No-op while already playing.
    pub fn play(&mut self, now: Duration, config: &SchedulerConfig) {
        if self.is_playing() {
            return;
        }
        self.playback = Playback::Playing {
            started_at: now + config.startup_delay,
            last_frame_at: None,
        };
    }

    /// Playing -> Stopped, keeping the position so `play` resumes from it.
    pub fn pause(&mut self, now: Duration) {
        if self.is_playing() {
            self.offset = self.elapsed(now);
            self.playback = Playback::Stopped;
        }
    }

    /// Stop and rewind to the first period.
    pub fn stop(&mut self) {
        *self = AnimationState::default();
    }

    /// Jump to a fractional period index (scrubber).
    pub fn seek(
        &mut self,
        position: f64,
        now: Duration,
        config: &SchedulerConfig,
        num_periods: usize,
    ) {
        let last = num_periods.saturating_sub(1) as f64;
        let position = if position.is_finite() { position.clamp(0.0, last) } else { 0.0 };
        let frac = if last > 0.0 { position / last } else { 0.0 };
        self.offset = config.total_duration(num_periods).mul_f64(frac);
        self.current_period_index = position.floor() as usize;
        if let Playback::Playing { .. } = self.playback {
            self.playback = Playback::Playing {
                started_at: now,
                last_frame_at: None,
            };
        }
    }
}

/// Where a frame sits on the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePosition {
    /// Fraction of the loop in `[0, 1)`.
    pub cycle: f64,
    /// Fractional period index in `[0, n - 1]`.
    pub index: f64,
    pub current: usize,
    pub next: usize,
    /// Progress between `current` and `next`.
    pub t: f64,
}

impl FramePosition {
    /// Position of a fractional period index, independent of time.
    pub fn at_index(index: f64, num_periods: usize) -> Option<Self> {
        if num_periods == 0 {
            return None;
        }
        let last = num_periods - 1;
        let index = if index.is_finite() { index.clamp(0.0, last as f64) } else { 0.0 };
        let current = (index.floor() as usize).min(last);
        let next = (current + 1).min(last);
        let t = if next == current { 0.0 } else { index - current as f64 };
        let cycle = if last == 0 { 0.0 } else { index / last as f64 };
        Some(Self {
            cycle,
            index,
            current,
            next,
            t,
        })
    }

    /// Position after `elapsed` animation time. The loop wraps on integer
    /// nanoseconds, so long sessions do not drift.
    pub fn at_elapsed(elapsed: Duration, config: &SchedulerConfig, num_periods: usize) -> Option<Self> {
        if num_periods == 0 {
            return None;
        }
        let total = config.total_duration(num_periods).as_nanos();
        if total == 0 {
            return Self::at_index(0.0, num_periods);
        }
        let cycle = (elapsed.as_nanos() % total) as f64 / total as f64;
        let mut pos = Self::at_index(cycle * (num_periods - 1) as f64, num_periods)?;
        pos.cycle = cycle;
        Some(pos)
    }
}

/// One scheduler callback.
///
/// Returns the next state and the frame position when a frame is due. While
/// stopped, inside the startup grace period, or closer than
/// `min_frame_interval` to the last frame, no frame is produced.
pub fn tick(
    state: &AnimationState,
    config: &SchedulerConfig,
    num_periods: usize,
    now: Duration,
) -> (AnimationState, Option<FramePosition>) {
    let Playback::Playing {
        started_at,
        last_frame_at,
    } = state.playback
    else {
        return (*state, None);
    };
    if now < started_at || num_periods == 0 {
        return (*state, None);
    }
    if let Some(last) = last_frame_at
        && now.saturating_sub(last) < config.min_frame_interval
    {
        return (*state, None);
    }

    let Some(pos) = FramePosition::at_elapsed(state.elapsed(now), config, num_periods) else {
        return (*state, None);
    };
    let next = AnimationState {
        playback: Playback::Playing {
            started_at,
            last_frame_at: Some(now),
        },
        offset: state.offset,
        current_period_index: pos.current,
    };
    (next, Some(pos))
}

/// One animated chart instance: series, interpolation, selection, renderers.
pub struct Player<M: Metrics> {
    series: Series<M>,
    interpolator: Interpolator,
    config: SchedulerConfig,
    state: AnimationState,
    selection: Selection,
    renderers: Vec<Box<dyn Renderer<M>>>,
    frames_pushed: u64,
}

impl<M: Metrics> Player<M> {
    pub fn new(series: Series<M>, interpolator: Interpolator, config: SchedulerConfig) -> Self {
        Self {
            series,
            interpolator,
            config,
            state: AnimationState::default(),
            selection: Selection::All,
            renderers: Vec::new(),
            frames_pushed: 0,
        }
    }

    pub fn add_renderer(&mut self, renderer: Box<dyn Renderer<M>>) {
        self.renderers.push(renderer);
    }

    pub fn series(&self) -> &Series<M> {
        &self.series
    }

    pub fn state(&self) -> &AnimationState {
        &self.state
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Snapshots pushed to renderers so far.
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn play(&mut self, now: Duration) {
        self.state.play(now, &self.config);
    }

    pub fn pause(&mut self, now: Duration) {
        self.state.pause(now);
    }

    pub fn toggle(&mut self, now: Duration) {
        if self.is_playing() {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    pub fn stop(&mut self) {
        self.state.stop();
    }

    pub fn seek(&mut self, position: f64, now: Duration) {
        let n = self.series.num_periods();
        self.state.seek(position, now, &self.config, n);
    }

    /// Fractional period index of the animation at `now`.
    pub fn position(&self, now: Duration) -> f64 {
        FramePosition::at_elapsed(self.state.elapsed(now), &self.config, self.series.num_periods())
            .map(|p| p.index)
            .unwrap_or(0.0)
    }

    /// Scheduler callback: produce and push a snapshot if a frame is due.
    pub fn on_frame(&mut self, now: Duration) -> Option<Snapshot<M>> {
        let (next, pos) = tick(&self.state, &self.config, self.series.num_periods(), now);
        self.state = next;
        let snapshot = self.snapshot_for(pos?)?;
        self.push(&snapshot);
        Some(snapshot)
    }

    /// Snapshot at a fractional period index without touching playback state.
    pub fn snapshot_at(&self, position: f64) -> Option<Snapshot<M>> {
        let pos = FramePosition::at_index(position, self.series.num_periods())?;
        self.snapshot_for(pos)
    }

    /// Snapshot at `position`, pushed to every renderer (paused scrubbing).
    pub fn render_at(&mut self, position: f64) -> Option<Snapshot<M>> {
        let snapshot = self.snapshot_at(position)?;
        self.push(&snapshot);
        Some(snapshot)
    }

    fn snapshot_for(&self, pos: FramePosition) -> Option<Snapshot<M>> {
        let periods = self.series.periods_sorted();
        let (from, to) = (*periods.get(pos.current)?, *periods.get(pos.next)?);
        let empty: PeriodFrame<M> = BTreeMap::new();
        let a = self.series.frame(from).unwrap_or(&empty);
        let b = self.series.frame(to).unwrap_or(&empty);
        let mut snapshot =
            self.interpolator
                .interpolate(FrameRef::new(from, a), FrameRef::new(to, b), pos.t);
        snapshot.position = pos.index;
        snapshot.retain(&self.selection);
        Some(snapshot)
    }

    fn push(&mut self, snapshot: &Snapshot<M>) {
        let label = snapshot.label();
        for r in self.renderers.iter_mut() {
            if let Err(err) = r.render(snapshot, &label) {
                warn!("renderer {} failed at {}: {err:#}", r.name(), label);
            }
        }
        self.frames_pushed += 1;
        debug!(
            "frame {} pushed at position {:.3} ({} entries)",
            self.frames_pushed,
            snapshot.position,
            snapshot.entries.len()
        );
    }
}
