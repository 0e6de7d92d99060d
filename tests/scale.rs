//! Filtering and projecting a table of realistic size stays interactive.

use std::time::{Duration, Instant};

use op_explorer::data::condition::Condition;
use op_explorer::data::filter::FilteredView;
use op_explorer::data::model::{Column, OperatingPointTable};
use op_explorer::data::projection::{DisplayOptions, PlotConfig, Projection};

const ROWS: usize = 900_000;

fn large_table() -> OperatingPointTable {
    let vsb = (0..ROWS).map(|i| (i % 5) as f64 * 0.1).collect();
    let vgs = (0..ROWS).map(|i| 0.3 + (i % 300) as f64 * 0.005).collect();
    let id = (0..ROWS).map(|i| 1e-6 * (1 + i % 1000) as f64).collect();
    let area = (0..ROWS).map(|i| 1e-12 * (1 + i % 48) as f64).collect();
    OperatingPointTable::from_columns(vec![
        Column::numeric("VSB", vsb),
        Column::numeric("VGS", vgs),
        Column::numeric("id", id),
        Column::numeric("area", area),
    ])
    .unwrap()
}

#[test]
fn filters_and_projects_900k_rows() {
    let t = large_table();
    let conditions = [
        Condition::parse(&t, "VSB", "==", "0.2").unwrap(),
        Condition::parse(&t, "VGS", ">", "0.5").unwrap(),
    ];

    let start = Instant::now();
    let view = FilteredView::compute(&t, &conditions, 1.0);
    let config = PlotConfig {
        x: "area".into(),
        y: "id".into(),
        hue: Some("VGS".into()),
    };
    let projection = Projection::build(&t, &view, &config, &DisplayOptions::default()).unwrap();
    let elapsed = start.elapsed();

    assert_eq!(view.mask.len(), ROWS);
    assert!(!view.is_empty());
    assert_eq!(projection.len(), view.len());
    assert!(
        elapsed < Duration::from_secs(5),
        "filter + projection took {elapsed:?}"
    );
}
