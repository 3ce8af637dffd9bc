/*!
 * Desktop player for periodviz: open a dataset and watch it animate.
 *
 * - Open CSV/XLSX files (or type a URL / sheet:<id> source)
 * - Play/pause and a period scrubber
 * - Entity checkboxes with a search box
 * - Ranked bars painted every display frame
 */

use eframe::egui;
use periodviz::driver::{Clock, SystemClock};
use periodviz::fetch::{self, Source};
use periodviz::load::{self, BubbleLayout, WideLayout};
use periodviz::selection::matches_search;
use periodviz::style::Palette;
use periodviz::viz::util::{format_value, map_locale};
use periodviz::{
    BubbleMetrics, EntityId, Metrics, Player, Selection, Series, Snapshot, VizConfig,
};
use std::collections::BTreeSet;
use std::sync::mpsc;
use std::thread;

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let config = match VizConfig::discover().map(VizConfig::from_path) {
        Some(Ok(cfg)) => cfg,
        Some(Err(err)) => {
            log::warn!("ignoring config: {err}");
            VizConfig::default()
        }
        None => VizConfig::default(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([700.0, 450.0])
            .with_title("periodviz"),
        ..Default::default()
    };

    eframe::run_native(
        "periodviz",
        options,
        Box::new(|_cc| Ok(Box::new(PvizApp::new(config)))),
    )
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LayoutOption {
    Wide,
    Bubble,
}

enum Dataset {
    Values(Series<f64>),
    Bubbles(Series<BubbleMetrics>),
}

/// A loaded dataset and its playback state.
struct View<M: Metrics> {
    player: Player<M>,
    snapshot: Option<Snapshot<M>>,
    entities: BTreeSet<EntityId>,
    position: f64,
}

impl<M: Metrics> View<M> {
    fn new(series: Series<M>, config: &VizConfig) -> Self {
        let entities = series.entities();
        let mut player = Player::new(series, config.interpolator(), config.scheduler());
        player.set_selection(config.selection());
        let snapshot = player.snapshot_at(0.0);
        Self {
            player,
            snapshot,
            entities,
            position: 0.0,
        }
    }
}

enum Loaded {
    Values(View<f64>),
    Bubbles(View<BubbleMetrics>),
}

struct PvizApp {
    config: VizConfig,
    palette: Palette,
    clock: SystemClock,

    source: String,
    layout: LayoutOption,
    marker: String,
    search: String,

    loaded: Option<Loaded>,
    is_loading: bool,
    status_message: String,
    error_message: String,
    load_receiver: Option<mpsc::Receiver<Result<Dataset, String>>>,
}

impl PvizApp {
    fn new(config: VizConfig) -> Self {
        let palette = config.palette().unwrap_or_default();
        Self {
            config,
            palette,
            clock: SystemClock::new(),
            source: String::new(),
            layout: LayoutOption::Wide,
            marker: String::new(),
            search: String::new(),
            loaded: None,
            is_loading: false,
            status_message: String::new(),
            error_message: String::new(),
            load_receiver: None,
        }
    }

    fn start_load(&mut self) {
        let source_text = self.source.trim().to_string();
        if source_text.is_empty() {
            self.error_message = "Please choose a file or enter a source".to_string();
            return;
        }
        self.is_loading = true;
        self.error_message.clear();
        self.status_message = format!("Loading {source_text}...");

        let (sender, receiver) = mpsc::channel();
        self.load_receiver = Some(receiver);
        let layout = self.layout;
        let marker = Some(self.marker.trim().to_string()).filter(|m| !m.is_empty());

        // Network sources block; keep the UI responsive.
        thread::spawn(move || {
            let _ = sender.send(load_dataset(&source_text, layout, marker).map_err(|e| format!("{e:#}")));
        });
    }

    fn check_load_result(&mut self) {
        if let Some(receiver) = &self.load_receiver
            && let Ok(result) = receiver.try_recv()
        {
            self.is_loading = false;
            self.load_receiver = None;
            match result {
                Ok(data) => {
                    let (loaded, summary) = match data {
                        Dataset::Values(s) => {
                            let summary = describe(&s);
                            (Loaded::Values(View::new(s, &self.config)), summary)
                        }
                        Dataset::Bubbles(s) => {
                            let summary = describe(&s);
                            (Loaded::Bubbles(View::new(s, &self.config)), summary)
                        }
                    };
                    self.loaded = Some(loaded);
                    self.status_message = summary;
                    self.error_message.clear();
                }
                Err(err) => {
                    self.error_message = err;
                    self.status_message.clear();
                }
            }
        }
    }
}

fn load_dataset(source_text: &str, layout: LayoutOption, marker: Option<String>) -> anyhow::Result<Dataset> {
    let source = Source::parse(source_text)?;
    let rows = fetch::fetch_rows(&source, None)?;
    Ok(match layout {
        LayoutOption::Wide => Dataset::Values(load::wide(&rows, &WideLayout { marker })?),
        LayoutOption::Bubble => Dataset::Bubbles(load::bubble(&rows, &BubbleLayout::default())?),
    })
}

fn describe<M: Metrics>(series: &Series<M>) -> String {
    let periods = series.periods_sorted();
    match (periods.first(), periods.last()) {
        (Some(a), Some(b)) => format!(
            "{} entities, {} periods ({a} to {b})",
            series.entities().len(),
            periods.len()
        ),
        _ => "empty series".to_string(),
    }
}

impl eframe::App for PvizApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_result();
        if self.is_loading {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("source").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Source:");
                ui.text_edit_singleline(&mut self.source)
                    .on_hover_text("CSV/XLSX path, http(s) URL, or sheet:<id>/<sheet name>");
                if ui.button("Browse").clicked()
                    && let Some(path) = rfd::FileDialog::new()
                        .add_filter("Data", &["csv", "xlsx"])
                        .pick_file()
                {
                    self.source = path.to_string_lossy().to_string();
                }
                ui.radio_value(&mut self.layout, LayoutOption::Wide, "Wide");
                ui.radio_value(&mut self.layout, LayoutOption::Bubble, "Bubble");
                ui.label("Marker:");
                ui.add(egui::TextEdit::singleline(&mut self.marker).desired_width(80.0));
                let load = ui.add_enabled(!self.is_loading, egui::Button::new("Load"));
                if load.clicked() {
                    self.start_load();
                }
                if self.is_loading {
                    ui.spinner();
                }
            });
            if !self.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &self.error_message);
            } else if !self.status_message.is_empty() {
                ui.label(&self.status_message);
            }
        });

        let now = self.clock.now();
        let palette = &self.palette;
        let config = &self.config;
        let search = &mut self.search;
        match self.loaded.as_mut() {
            Some(Loaded::Values(view)) => show_view(ctx, view, now, palette, config, search),
            Some(Loaded::Bubbles(view)) => show_view(ctx, view, now, palette, config, search),
            None => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.centered_and_justified(|ui| ui.label("Open a dataset to start"));
                });
            }
        }
    }
}

fn show_view<M: Metrics>(
    ctx: &egui::Context,
    view: &mut View<M>,
    now: std::time::Duration,
    palette: &Palette,
    config: &VizConfig,
    search: &mut String,
) {
    if view.player.is_playing() {
        if let Some(snapshot) = view.player.on_frame(now) {
            view.snapshot = Some(snapshot);
        }
        view.position = view.player.position(now);
        ctx.request_repaint();
    }

    egui::SidePanel::left("entities")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            ui.heading("Entities");
            ui.horizontal(|ui| {
                ui.label("Search:");
                ui.text_edit_singleline(search);
            });
            let mut changed = false;
            ui.horizontal(|ui| {
                if ui.button("All").clicked() {
                    view.player.set_selection(Selection::All);
                    changed = true;
                }
                if ui.button("None").clicked() {
                    view.player.set_selection(Selection::Only(BTreeSet::new()));
                    changed = true;
                }
            });
            let query = search.as_str();
            egui::ScrollArea::vertical().show(ui, |ui| {
                for entity in view.entities.iter().filter(|e| matches_search(e, query)) {
                    let mut on = view.player.selection().contains(entity);
                    if ui.checkbox(&mut on, entity.as_str()).changed() {
                        view.player.selection_mut().toggle(entity, &view.entities);
                        changed = true;
                    }
                }
            });
            if changed && !view.player.is_playing() {
                view.snapshot = view.player.snapshot_at(view.position);
            }
        });

    egui::TopBottomPanel::bottom("transport").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let label = if view.player.is_playing() { "Pause" } else { "Play" };
            if ui.button(label).clicked() {
                view.player.toggle(now);
            }
            let periods = view.player.series().periods_sorted();
            let last = periods.len().saturating_sub(1) as f64;
            let current = periods
                .get(view.position.floor() as usize)
                .map(|p| p.to_string())
                .unwrap_or_default();
            let slider = egui::Slider::new(&mut view.position, 0.0..=last)
                .show_value(false)
                .text(current);
            if ui.add(slider).changed() {
                view.player.seek(view.position, now);
                view.snapshot = view.player.snapshot_at(view.position);
            }
        });
    });

    egui::CentralPanel::default().show(ctx, |ui| {
        if let Some(title) = config.title.as_deref() {
            ui.heading(title);
        }
        match view.snapshot.as_ref() {
            Some(snapshot) => paint_bars(ui, snapshot, palette, config),
            None => {
                ui.label("No data for this period");
            }
        }
    });
}

/// Share of the bar area covered by `value`; values above the axis cap stop at the edge.
fn bar_fraction(value: f64, max: f64) -> f32 {
    (value.max(0.0).min(max) / max) as f32
}

fn paint_bars<M: Metrics>(ui: &mut egui::Ui, snapshot: &Snapshot<M>, palette: &Palette, config: &VizConfig) {
    let (locale, dec_sep) = map_locale(&config.locale);
    let rect = ui.available_rect_before_wrap();
    let painter = ui.painter_at(rect);
    let top_n = config.top_n.max(1);
    let shown: Vec<_> = snapshot.entries.iter().take(top_n).collect();
    let max = config
        .axes
        .value_max
        .unwrap_or_else(|| shown.iter().map(|e| e.metrics.rank_value()).fold(0.0, f64::max))
        .max(f64::EPSILON);

    let name_w = 160.0;
    let row_h = (rect.height() / top_n as f32).min(48.0);
    let bar_area = (rect.width() - name_w - 90.0).max(10.0);
    let font = egui::FontId::proportional((row_h * 0.45).clamp(10.0, 18.0));
    let text_color = ui.visuals().text_color();

    for (i, e) in shown.iter().enumerate() {
        let y = rect.top() + i as f32 * row_h;
        let v = e.metrics.rank_value().max(0.0);
        let w = bar_fraction(v, max) * bar_area;
        let c = palette.color_for(&e.entity);
        let alpha = (255.0 * (0.35 + 0.65 * e.presence)).round() as u8;
        let color = egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, alpha);
        let bar = egui::Rect::from_min_size(
            egui::pos2(rect.left() + name_w, y + row_h * 0.1),
            egui::vec2(w.max(1.0), row_h * 0.8),
        );
        painter.rect_filled(bar, 3.0, color);
        painter.text(
            egui::pos2(rect.left() + name_w - 8.0, y + row_h * 0.5),
            egui::Align2::RIGHT_CENTER,
            e.entity.as_str(),
            font.clone(),
            text_color,
        );
        painter.text(
            egui::pos2(bar.right() + 6.0, y + row_h * 0.5),
            egui::Align2::LEFT_CENTER,
            format_value(e.metrics.rank_value(), locale, dec_sep),
            font.clone(),
            text_color,
        );
    }

    painter.text(
        rect.right_bottom() - egui::vec2(20.0, 20.0),
        egui::Align2::RIGHT_BOTTOM,
        snapshot.label(),
        egui::FontId::proportional(48.0),
        egui::Color32::from_gray(140),
    );
}
