use std::io::Write;

use fleet_usage_dashboard::portfolio::{consolidate, CompanyFilter};
use fleet_usage_dashboard::{build_view, score, FileSource, HealthScore, RecordSource};

const EXPORT: &str = "\
nome_empresa,codigo_empresa,ano,mes,total_servicos,total_veiculos,total_tripulantes,total_alteracoes_escala
VIOP,1,2025,10,100,10,20,0
VIOP,1,2025,11,0,10,20,0
VIOP,1,2025,12,150,12,22,0
PASSARO VERDE,2,2025,11,0,4,8,0
PASSARO VERDE,2,2025,12,0,4,8,0
PLANALTO,,2026,1,90,9,18,6
";

fn export_file() -> (tempfile::TempDir, FileSource) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(EXPORT.as_bytes()).unwrap();
    (dir, FileSource::new(path))
}

#[test]
fn december_view_from_csv_export() {
    let (_dir, source) = export_file();
    let records = source.fetch_all_records();
    assert_eq!(records.len(), 6);

    let views = build_view(&records, 2025, 12);
    assert_eq!(views.len(), 3);

    let viop = views.iter().find(|v| v.name == "VIOP").unwrap();
    let labels: Vec<&str> = viop.display_periods.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["Out", "Nov", "Dez"]);

    let december = viop.metrics.last().unwrap();
    assert_eq!(december.trips, [0, 150]);
    let expected = 60.0 + 30.0 * (-0.3f64).exp();
    match december.usage[1] {
        HealthScore::Score(value) => assert!((value - expected).abs() < 1e-9),
        HealthScore::NotStarted => panic!("VIOP should be scored in December"),
    }
    // November had zero activity after October's 100 trips.
    assert_eq!(december.usage[0], HealthScore::Score(0.0));

    let passaro = views.iter().find(|v| v.name == "PASSARO VERDE").unwrap();
    assert!(passaro
        .metrics
        .iter()
        .all(|m| m.usage == [HealthScore::NotStarted, HealthScore::NotStarted]));

    let planalto = views.iter().find(|v| v.name == "PLANALTO").unwrap();
    assert_eq!(planalto.code, "---");
}

#[test]
fn january_window_crosses_year_and_feeds_kpis() {
    let (_dir, source) = export_file();
    let records = source.fetch_all_records();

    let views = build_view(&records, 2026, 1);
    let viop = views.iter().find(|v| v.name == "VIOP").unwrap();
    let keys: Vec<(i32, u32)> = viop.display_periods.iter().map(|p| (p.year, p.month)).collect();
    assert_eq!(keys, vec![(2025, 11), (2025, 12), (2026, 1)]);

    let planalto = views.iter().find(|v| v.name == "PLANALTO").unwrap();
    assert_eq!(planalto.metrics[2].usage[1], score(&planalto.history, 2026, 1));

    let summary = consolidate(&views, &CompanyFilter::all());
    assert_eq!(summary.total_trips, 90);
    assert_eq!(summary.previous_trips, 150);
}

#[test]
fn rebuilding_is_idempotent() {
    let (_dir, source) = export_file();
    let records = source.fetch_all_records();
    let first = serde_json::to_string(&build_view(&records, 2025, 12)).unwrap();
    let second = serde_json::to_string(&build_view(&records, 2025, 12)).unwrap();
    assert_eq!(first, second);
}
