use linebot_config::{Surface, SurfaceRow, Thresholds, read_surface_csv};
use std::io::Write;

fn row(surface: Surface, brightness: u16) -> SurfaceRow {
    SurfaceRow {
        surface,
        brightness,
    }
}

#[test]
fn fit_splits_gap_into_thirds() {
    let rows = vec![
        row(Surface::Line, 300),
        row(Surface::Line, 330),
        row(Surface::Floor, 600),
        row(Surface::Floor, 630),
    ];
    let t = Thresholds::from_rows(&rows).expect("fit");
    // gap = 600 - 330 = 270; low = 330 + 90, high = 600 - 90
    assert_eq!(t.low, 420);
    assert_eq!(t.high, 510);
    assert!(t.low < t.high);
}

#[test]
fn fit_requires_both_surfaces() {
    let only_line = vec![row(Surface::Line, 300)];
    let err = Thresholds::from_rows(&only_line).expect_err("must reject");
    assert!(format!("{err}").contains("floor"));

    let only_floor = vec![row(Surface::Floor, 600)];
    let err = Thresholds::from_rows(&only_floor).expect_err("must reject");
    assert!(format!("{err}").contains("line"));
}

#[test]
fn fit_rejects_overlapping_surfaces() {
    let rows = vec![row(Surface::Line, 500), row(Surface::Floor, 480)];
    let err = Thresholds::from_rows(&rows).expect_err("must reject");
    assert!(format!("{err}").contains("overlap"));
}

#[test]
fn fit_rejects_tiny_separation() {
    let rows = vec![row(Surface::Line, 500), row(Surface::Floor, 502)];
    let err = Thresholds::from_rows(&rows).expect_err("must reject");
    assert!(format!("{err}").contains("separation"));
}

#[test]
fn csv_roundtrip_with_headers() {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "surface,brightness").expect("write");
    writeln!(f, "line, 310").expect("write");
    writeln!(f, "line, 290").expect("write");
    writeln!(f, "floor, 610").expect("write");
    writeln!(f, "floor, 640").expect("write");
    f.flush().expect("flush");

    let rows = read_surface_csv(f.path()).expect("read csv");
    assert_eq!(rows.len(), 4);
    let t = Thresholds::from_rows(&rows).expect("fit");
    // gap = 610 - 310 = 300
    assert_eq!(t.low, 410);
    assert_eq!(t.high, 510);
}

#[test]
fn empty_csv_is_rejected() {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "surface,brightness").expect("write");
    f.flush().expect("flush");
    let err = read_surface_csv(f.path()).expect_err("must reject");
    assert!(format!("{err}").contains("no rows"));
}
