//! Thin scheduling shim around [`Player::on_frame`].
//!
//! Everything runs on the calling thread: one callback completes (snapshot and
//! all renderers) before the next one is considered.

use crate::models::Metrics;
use crate::scheduler::Player;
use std::cell::Cell;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock measured from its creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock advanced by hand (tests, offline frame export).
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Call `on_frame` every `cadence` until `keep_going` returns false.
///
/// `keep_going` is checked before each callback and receives the player, so a
/// caller can stop after a number of frames or once playback was paused.
/// Returns the number of callbacks issued.
pub fn run<M, C, F>(player: &mut Player<M>, clock: &C, cadence: Duration, mut keep_going: F) -> u64
where
    M: Metrics,
    C: Clock,
    F: FnMut(&Player<M>) -> bool,
{
    let mut callbacks = 0u64;
    while keep_going(player) {
        let started = Instant::now();
        player.on_frame(clock.now());
        callbacks += 1;
        if let Some(rest) = cadence.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
    callbacks
}

/// Render `loops` full loops at a fixed frame rate on a virtual clock.
///
/// Starts playback at time zero with no startup delay, so frame `k` shows the
/// animation at `k / fps` seconds. Frames closer together than the player's
/// `min_frame_interval` are still dropped, so `fps` above its inverse yields
/// fewer frames. Returns the number of frames pushed.
pub fn render_offline<M: Metrics>(player: &mut Player<M>, fps: u32, loops: u32) -> u64 {
    let fps = fps.max(1);
    let step = Duration::from_secs(1) / fps;
    let total = player.config().total_duration(player.series().num_periods()) * loops.max(1);
    let frames = (total.as_nanos() / step.as_nanos().max(1)) as u64;

    let clock = ManualClock::new();
    player.stop();
    player.play(clock.now());
    // Frames are exported from the first instant on; the startup grace period
    // only matters for live playback.
    player.seek(0.0, clock.now());

    let before = player.frames_pushed();
    for _ in 0..frames {
        player.on_frame(clock.now());
        clock.advance(step);
    }
    // Land exactly on the final period so the export ends on real data.
    let last = player.series().num_periods().saturating_sub(1) as f64;
    player.render_at(last);
    player.pause(clock.now());
    player.frames_pushed() - before
}
