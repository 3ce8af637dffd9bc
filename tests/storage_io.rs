use periodviz::load::{self, LongLayout};
use periodviz::stats;
use periodviz::storage::{save_csv, save_json, save_snapshot_json};
use periodviz::{Interpolator, Period, Player, Record, SchedulerConfig, Series, VizConfig};
use serde_json::Value;

fn series() -> Series<f64> {
    Series::from_records(vec![
        Record::new("Netflix", Period::Year(2020), 25_000.0),
        Record::new("Netflix", Period::Year(2021), 29_700.0),
        Record::new("-Minus", Period::Year(2020), 3.5),
        Record::new("Hulu", Period::Year(2021), 12.25),
    ])
    .unwrap()
}

#[test]
fn exported_csv_loads_back_as_the_same_series() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("series.csv");
    let original = series();
    save_csv(&original, &path).unwrap();

    let rows = load::read_csv_path(&path).unwrap();
    let back = load::long(&rows, &LongLayout::default()).unwrap();
    assert_eq!(back.periods_sorted(), original.periods_sorted());
    assert_eq!(back.entities(), original.entities());
    for (period, entity, value) in original.iter() {
        assert_eq!(back.get(entity, period), Some(value));
    }
}

#[test]
fn leading_apostrophes_survive_an_export_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("names.csv");
    let original = Series::from_records(vec![
        Record::new("'t Hooft Inc", Period::Year(2020), 1.0),
        Record::new("=SUM(A1)", Period::Year(2020), 2.0),
    ])
    .unwrap();
    save_csv(&original, &path).unwrap();

    let rows = load::read_csv_path(&path).unwrap();
    let back = load::long(&rows, &LongLayout::default()).unwrap();
    let names: Vec<String> = back.entities().iter().map(|e| e.as_str().to_string()).collect();
    assert!(names.contains(&"'t Hooft Inc".to_string()), "{names:?}");
    assert!(names.contains(&"=SUM(A1)".to_string()), "{names:?}");
}

#[test]
fn json_export_lists_every_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("series.json");
    save_json(&series(), &path).unwrap();

    let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let arr = v.as_array().unwrap();
    assert_eq!(arr.len(), 4);
    assert!(arr.iter().any(|r| r["entity"] == "Hulu"));
}

#[test]
fn snapshot_json_carries_colors_and_logos() {
    let cfg = VizConfig::from_json(
        r##"{
            "title": "Revenue",
            "colors": { "Netflix": "#E50914" },
            "logos": { "netflix": "logos/netflix.png" }
        }"##,
    )
    .unwrap();
    let player = Player::new(series(), Interpolator::default(), SchedulerConfig::default());
    let snap = player.snapshot_at(0.0).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.json");
    save_snapshot_json(&snap, &cfg, &path).unwrap();

    let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(v["title"], "Revenue");
    assert_eq!(v["period"], "2020");
    let entries = v["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    let top = &entries[0];
    assert_eq!(top["rank"], 0);
    assert_eq!(top["entity"], "Netflix");
    assert_eq!(top["color"], "#E50914");
    assert_eq!(top["logo"], "logos/netflix.png");
    // no configured color: a stable fallback, no logo
    let other = &entries[1];
    assert!(other["color"].as_str().unwrap().starts_with('#'));
    assert!(other["logo"].is_null());
}

#[test]
fn summary_counts_gaps_against_all_periods() {
    let sums = stats::entity_summary(&series());
    let hulu = sums.iter().find(|s| s.entity.as_str() == "Hulu").unwrap();
    assert_eq!((hulu.count, hulu.missing), (1, 1));
    let netflix = sums.iter().find(|s| s.entity.as_str() == "Netflix").unwrap();
    assert_eq!(netflix.min, Some(25_000.0));
    assert_eq!(netflix.median, Some(27_350.0));
    assert_eq!(
        stats::value_domain(&series(), "value"),
        Some((3.5, 29_700.0))
    );
    assert_eq!(stats::value_domain(&series(), "revenue"), None);
}
