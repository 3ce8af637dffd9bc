use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use periodviz::driver::{self, Clock, SystemClock};
use periodviz::fetch::{self, Source};
use periodviz::load::{self, BubbleLayout, LongLayout, WideLayout};
use periodviz::render::{FrameFormat, FrameSink};
use periodviz::viz::{BubbleChart, RankedBars, TableRenderer, TimelineMarker};
use periodviz::{
    BubbleMetrics, Metrics, Player, Renderer, SchedulerConfig, Selection, Series, VizConfig,
    stats, storage,
};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "pviz",
    version,
    about = "Animate period-indexed data as race bar, bubble and timeline charts"
)]
struct Cli {
    /// JSON configuration (default: periodviz/config.json in the user config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export one loop of animation frames.
    Render(RenderArgs),
    /// Print the interpolated values at a fractional period position.
    Snapshot(SnapshotArgs),
    /// Live leaderboard playback in the terminal.
    Play(PlayArgs),
    /// Per-entity summary statistics.
    Stats(InputArgs),
    /// Save the loaded series as tidy CSV or JSON.
    Export(ExportArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// Header of entity names, one row per period.
    Wide,
    /// Three stacked wide sections: Growth, Margin, Revenue.
    Bubble,
    /// One observation per row: entity, period, value.
    Long,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Chart {
    Bars,
    Bubble,
    Timeline,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ImageFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// CSV/XLSX path, http(s) URL, or sheet:<id>[/<sheet name>]
    #[arg(short, long)]
    source: String,
    #[arg(long, value_enum, default_value_t = Layout::Wide)]
    layout: Layout,
    /// First-cell label of the header row (wide layout).
    #[arg(long)]
    marker: Option<String>,
    /// Worksheet name for .xlsx sources.
    #[arg(long)]
    sheet: Option<String>,
    /// Entities to show, separated by comma or semicolon (default: config or all).
    #[arg(long)]
    select: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Output directory for numbered frames.
    #[arg(short, long)]
    out: PathBuf,
    /// Charts to render (repeatable).
    #[arg(long = "chart", value_enum, default_values_t = [Chart::Bars])]
    charts: Vec<Chart>,
    #[arg(long, value_enum, default_value_t = ImageFormat::Svg)]
    format: ImageFormat,
    #[arg(long, default_value_t = 30)]
    fps: u32,
    #[arg(long, default_value_t = 1)]
    loops: u32,
    #[arg(long, default_value_t = 960)]
    width: u32,
    #[arg(long, default_value_t = 540)]
    height: u32,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Fractional period index (0 = first period, 1.5 = halfway between 2nd and 3rd).
    #[arg(short, long, default_value_t = 0.0)]
    position: f64,
    /// Print JSON instead of a table.
    #[arg(long, default_value_t = false)]
    json: bool,
    /// Save the snapshot as JSON (with colors and logos) to this path.
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Seconds to play; default is one full loop.
    #[arg(long)]
    duration: Option<f64>,
    #[arg(long, default_value_t = 10)]
    fps: u32,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,
    #[arg(short, long)]
    out: PathBuf,
    /// Output format (csv or json). If omitted, inferred from --out extension.
    #[arg(long, value_enum)]
    format: Option<OutFormat>,
}

enum Dataset {
    Values(Series<f64>),
    Bubbles(Series<BubbleMetrics>),
}

fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => {
            let s = format!("{:.4}", x);
            s.trim_end_matches('0').trim_end_matches('.').to_string()
        }
        _ => "NA".to_string(),
    }
}

fn parse_list(s: &str) -> Vec<String> {
    s.split([',', ';'])
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn load_config(path: Option<&PathBuf>) -> Result<VizConfig> {
    let path = path.cloned().or_else(VizConfig::discover);
    match path {
        Some(p) => {
            info!("using config {}", p.display());
            VizConfig::from_path(&p).with_context(|| format!("load config {}", p.display()))
        }
        None => Ok(VizConfig::default()),
    }
}

fn load_dataset(input: &InputArgs) -> Result<Dataset> {
    let source = Source::parse(&input.source)?;
    let rows = fetch::fetch_rows(&source, input.sheet.as_deref())
        .with_context(|| format!("read {}", input.source))?;
    let data = match input.layout {
        Layout::Wide => Dataset::Values(load::wide(
            &rows,
            &WideLayout {
                marker: input.marker.clone(),
            },
        )?),
        Layout::Long => Dataset::Values(load::long(&rows, &LongLayout::default())?),
        Layout::Bubble => Dataset::Bubbles(load::bubble(&rows, &BubbleLayout::default())?),
    };
    Ok(data)
}

fn selection(input: &InputArgs, cfg: &VizConfig) -> Selection {
    match input.select.as_deref().map(parse_list) {
        Some(list) if !list.is_empty() => Selection::only(list),
        _ => cfg.selection(),
    }
}

fn player<M: Metrics>(series: Series<M>, cfg: &VizConfig, input: &InputArgs) -> Player<M> {
    let mut p = Player::new(series, cfg.interpolator(), cfg.scheduler());
    p.set_selection(selection(input, cfg));
    p
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;
    match cli.cmd {
        Command::Render(args) => cmd_render(args, &cfg),
        Command::Snapshot(args) => cmd_snapshot(args, &cfg),
        Command::Play(args) => cmd_play(args, &cfg),
        Command::Stats(args) => cmd_stats(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn cmd_render(args: RenderArgs, cfg: &VizConfig) -> Result<()> {
    let format = match args.format {
        ImageFormat::Svg => FrameFormat::Svg,
        ImageFormat::Png => FrameFormat::Png,
    };
    let sink = |prefix: &str| FrameSink::directory(&args.out, prefix, format);
    match load_dataset(&args.input)? {
        Dataset::Values(series) => {
            if args.charts.contains(&Chart::Bubble) {
                bail!("bubble charts need --layout bubble");
            }
            let renderers = common_renderers(&series, cfg, &args, &sink)?;
            render_frames(series, renderers, cfg, &args)
        }
        Dataset::Bubbles(series) => {
            let mut renderers = common_renderers(&series, cfg, &args, &sink)?;
            if args.charts.contains(&Chart::Bubble) {
                let chart = BubbleChart::for_series(&series, cfg, sink("bubble"))?
                    .with_size(args.width, args.height);
                renderers.push(Box::new(chart));
            }
            render_frames(series, renderers, cfg, &args)
        }
    }
}

fn common_renderers<M: Metrics + 'static>(
    series: &Series<M>,
    cfg: &VizConfig,
    args: &RenderArgs,
    sink: &dyn Fn(&str) -> FrameSink,
) -> Result<Vec<Box<dyn Renderer<M>>>> {
    let mut out: Vec<Box<dyn Renderer<M>>> = Vec::new();
    if args.charts.contains(&Chart::Bars) {
        let bars = RankedBars::from_config(cfg, sink("bars"))?.with_size(args.width, args.height);
        out.push(Box::new(bars));
    }
    if args.charts.contains(&Chart::Timeline) {
        let timeline = TimelineMarker::new(series.periods_sorted(), sink("timeline"))
            .with_size(args.width, 80);
        out.push(Box::new(timeline));
    }
    Ok(out)
}

fn render_frames<M: Metrics>(
    series: Series<M>,
    renderers: Vec<Box<dyn Renderer<M>>>,
    cfg: &VizConfig,
    args: &RenderArgs,
) -> Result<()> {
    if renderers.is_empty() {
        bail!("no charts selected");
    }
    let fps = args.fps.max(1);
    // Offline export is paced by --fps, not by the live rate limit.
    let mut sched: SchedulerConfig = cfg.scheduler();
    sched.min_frame_interval = sched.min_frame_interval.min(Duration::from_secs(1) / fps);
    let mut p = Player::new(series, cfg.interpolator(), sched);
    p.set_selection(selection(&args.input, cfg));
    for r in renderers {
        p.add_renderer(r);
    }
    let frames = driver::render_offline(&mut p, fps, args.loops);
    eprintln!("Wrote {} frames to {}", frames, args.out.display());
    Ok(())
}

fn cmd_snapshot(args: SnapshotArgs, cfg: &VizConfig) -> Result<()> {
    match load_dataset(&args.input)? {
        Dataset::Values(s) => print_snapshot(player(s, cfg, &args.input), cfg, &args),
        Dataset::Bubbles(s) => print_snapshot(player(s, cfg, &args.input), cfg, &args),
    }
}

fn print_snapshot<M: Metrics + Serialize>(
    player: Player<M>,
    cfg: &VizConfig,
    args: &SnapshotArgs,
) -> Result<()> {
    let snapshot = player
        .snapshot_at(args.position)
        .context("series has no periods")?;
    if let Some(path) = args.out.as_ref() {
        storage::save_snapshot_json(&snapshot, cfg, path)?;
        eprintln!("Saved snapshot to {}", path.display());
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        let mut table = TableRenderer::new(std::io::stdout())
            .with_top_n(cfg.top_n)
            .with_locale(&cfg.locale);
        table.render(&snapshot, &snapshot.label())?;
    }
    Ok(())
}

fn cmd_play(args: PlayArgs, cfg: &VizConfig) -> Result<()> {
    match load_dataset(&args.input)? {
        Dataset::Values(s) => play(player(s, cfg, &args.input), cfg, &args),
        Dataset::Bubbles(s) => play(player(s, cfg, &args.input), cfg, &args),
    }
}

fn play<M: Metrics + 'static>(mut player: Player<M>, cfg: &VizConfig, args: &PlayArgs) -> Result<()> {
    let table = TableRenderer::new(std::io::stdout())
        .with_top_n(cfg.top_n)
        .with_locale(&cfg.locale)
        .clearing(true);
    player.add_renderer(Box::new(table));

    let limit = match args.duration {
        Some(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs)
            .with_context(|| format!("invalid --duration {secs}"))?,
        _ => {
            player.config().startup_delay
                + player.config().total_duration(player.series().num_periods())
        }
    };
    let clock = SystemClock::new();
    player.play(clock.now());
    let cadence = Duration::from_secs(1) / args.fps.max(1);
    driver::run(&mut player, &clock, cadence, |_| clock.now() < limit);
    player.pause(clock.now());
    Ok(())
}

fn cmd_stats(input: InputArgs) -> Result<()> {
    let summaries = match load_dataset(&input)? {
        Dataset::Values(s) => stats::entity_summary(&s),
        Dataset::Bubbles(s) => stats::entity_summary(&s),
    };
    for s in summaries {
        println!(
            "{}  count={} missing={}  min={} max={} mean={} median={}",
            s.entity,
            s.count,
            s.missing,
            fmt_opt(s.min),
            fmt_opt(s.max),
            fmt_opt(s.mean),
            fmt_opt(s.median)
        );
    }
    Ok(())
}

fn cmd_export(args: ExportArgs) -> Result<()> {
    let fmt = match args.format {
        Some(OutFormat::Csv) => "csv",
        Some(OutFormat::Json) => "json",
        None => args.out.extension().and_then(|e| e.to_str()).unwrap_or("csv"),
    }
    .to_ascii_lowercase();
    let data = load_dataset(&args.input)?;
    let rows = match (&data, fmt.as_str()) {
        (Dataset::Values(s), "csv") => storage::save_csv(s, &args.out).map(|_| s.len()),
        (Dataset::Values(s), "json") => storage::save_json(s, &args.out).map(|_| s.len()),
        (Dataset::Bubbles(s), "csv") => storage::save_csv(s, &args.out).map(|_| s.len()),
        (Dataset::Bubbles(s), "json") => storage::save_json(s, &args.out).map(|_| s.len()),
        (_, other) => bail!("unsupported format: {}", other),
    }?;
    eprintln!("Saved {} rows to {}", rows, args.out.display());
    Ok(())
}
