//! periodviz
//!
//! Load period-indexed datasets (yearly or quarterly values per entity),
//! interpolate smoothly between adjacent periods, and drive animated charts
//! from a frame scheduler. Pairs with the `pviz` CLI and the `pviz-gui`
//! desktop player.
//!
//! ### Features
//! - Read wide, long or stacked "bubble" layouts from CSV, XLSX or a URL
//! - Eased interpolation with fade-in/fade-out for entities that come and go
//! - Play/pause/seek state machine with rate limiting and seamless looping
//! - Ranked bar, bubble and timeline frames as SVG/PNG; text leaderboards
//! - Quick per-entity summary statistics and tidy CSV/JSON export
//!
//! ### Example
//! ```no_run
//! use periodviz::{load, Interpolator, Player, SchedulerConfig};
//! use periodviz::render::FrameSink;
//! use periodviz::viz::RankedBars;
//!
//! let rows = load::read_csv_path("revenue.csv")?;
//! let series = load::wide(&rows, &load::WideLayout::default())?;
//! let mut player = Player::new(series, Interpolator::default(), SchedulerConfig::default());
//! player.add_renderer(Box::new(RankedBars::new(FrameSink::memory())));
//! let frames = periodviz::driver::render_offline(&mut player, 30, 1);
//! println!("{frames} frames");
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod driver;
pub mod ease;
pub mod error;
pub mod fetch;
pub mod interp;
pub mod load;
pub mod models;
pub mod render;
pub mod scheduler;
pub mod selection;
pub mod stats;
pub mod storage;
pub mod store;
pub mod style;
pub mod viz;

pub use config::VizConfig;
pub use ease::Ease;
pub use interp::{FadePolicy, Interpolator, Snapshot};
pub use models::{BubbleMetrics, EntityId, Metrics, Period, Record};
pub use render::Renderer;
pub use scheduler::{Player, SchedulerConfig};
pub use selection::Selection;
pub use store::Series;
