//! Integration tests for Gerber outline reading.

use pcbcam_wasm::config::ProcessConfig;
use pcbcam_wasm::geometry::Panel;
use pcbcam_wasm::outline;
use pcbcam_wasm::processor::{DrillProcessor, PolygonProcessor};

const BOARD_OUTLINE: &[u8] = include_bytes!("fixtures/board_outline.gbr");

#[test]
#[allow(clippy::expect_used)]
fn segment_per_draw_outline_is_one_polygon() {
    let layer = outline::read(BOARD_OUTLINE).expect("fixture should parse");

    assert!(layer.warnings.is_empty(), "warnings: {:?}", layer.warnings);
    assert_eq!(layer.draw_count, 8);
    assert_eq!(layer.polygons.len(), 2);

    let board = layer.polygons.first().expect("board outline expected");
    assert_eq!(board.len(), 5);
    assert!(board.is_closed());
    assert!((board.size().x - 50.0).abs() < 1e-9);
    assert!((board.size().y - 30.0).abs() < 1e-9);

    let cutout = layer.polygons.last().expect("cutout expected");
    assert!(cutout.is_closed());
    assert!((cutout.size().x - 10.0).abs() < 1e-9);
}

#[test]
#[allow(clippy::expect_used)]
fn outline_layer_feeds_the_panel() {
    let layer = outline::read(BOARD_OUTLINE).expect("fixture should parse");
    let mut panel = Panel::new(layer.polygons, Vec::new());
    let config = ProcessConfig::default();
    panel.process(
        &PolygonProcessor::new(&config),
        &DrillProcessor::new(&config),
    );

    assert_eq!(panel.outlines().len(), 2);
    assert_eq!(panel.outlines().iter().filter(|p| p.is_inner()).count(), 1);
    assert!(
        panel.drills().iter().any(|g| g.id() == "MouseBites"),
        "outer edge should carry tabs"
    );
}
