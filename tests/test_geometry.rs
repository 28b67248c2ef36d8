use shooting_gallery::geometry::{Rect, Vec2, Viewport};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

// ── Rect ──────────────────────────────────────────────────────────────────────

#[test]
fn rect_contains_interior_point() {
    let r = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert!(r.contains(Vec2::new(25.0, 40.0)));
}

#[test]
fn rect_contains_is_closed_on_edges() {
    let r = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert!(r.contains(Vec2::new(10.0, 20.0))); // top-left corner
    assert!(r.contains(Vec2::new(40.0, 60.0))); // bottom-right corner
    assert!(r.contains(Vec2::new(10.0, 40.0))); // left edge
}

#[test]
fn rect_excludes_outside_points() {
    let r = Rect::new(10.0, 20.0, 30.0, 40.0);
    assert!(!r.contains(Vec2::new(9.9, 40.0)));
    assert!(!r.contains(Vec2::new(40.1, 40.0)));
    assert!(!r.contains(Vec2::new(25.0, 19.9)));
    assert!(!r.contains(Vec2::new(25.0, 60.1)));
}

#[test]
fn rect_centered_places_the_center() {
    let r = Rect::centered(Vec2::new(100.0, 50.0), 20.0, 10.0);
    assert!(close(r.x, 90.0));
    assert!(close(r.y, 45.0));
    assert!(close(r.center().x, 100.0));
    assert!(close(r.center().y, 50.0));
}

// ── Viewport transform ────────────────────────────────────────────────────────

const LOGICAL: Vec2 = Vec2::new(480.0, 320.0);

#[test]
fn exact_fit_doubles_without_offset() {
    let vp = Viewport::fit(LOGICAL, Vec2::new(960.0, 640.0));
    assert!(close(vp.scale, 2.0));
    assert!(close(vp.offset.x, 0.0));
    assert!(close(vp.offset.y, 0.0));

    let d = vp.to_device(Vec2::new(10.0, 10.0));
    assert!(close(d.x, 20.0));
    assert!(close(d.y, 20.0));
}

#[test]
fn wide_device_letterboxes_horizontally() {
    let vp = Viewport::fit(LOGICAL, Vec2::new(1000.0, 640.0));
    assert!(close(vp.scale, 2.0));
    assert!(close(vp.offset.x, 20.0));
    assert!(close(vp.offset.y, 0.0));

    // Device corners of the letterboxed playfield map to logical corners
    let top_left = vp.to_logical(Vec2::new(20.0, 0.0));
    assert!(close(top_left.x, 0.0));
    assert!(close(top_left.y, 0.0));
    let bottom_right = vp.to_logical(Vec2::new(980.0, 640.0));
    assert!(close(bottom_right.x, 480.0));
    assert!(close(bottom_right.y, 320.0));
}

#[test]
fn tall_device_letterboxes_vertically() {
    let vp = Viewport::fit(LOGICAL, Vec2::new(480.0, 500.0));
    assert!(close(vp.scale, 1.0));
    assert!(close(vp.offset.x, 0.0));
    assert!(close(vp.offset.y, 90.0));
}

#[test]
fn transform_round_trips() {
    let vp = Viewport::fit(LOGICAL, Vec2::new(731.0, 407.0));
    for p in [
        Vec2::new(0.0, 0.0),
        Vec2::new(240.0, 160.0),
        Vec2::new(480.0, 320.0),
        Vec2::new(75.0, 220.0),
    ] {
        let back = vp.to_logical(vp.to_device(p));
        assert!(close(back.x, p.x), "x drifted: {} vs {}", back.x, p.x);
        assert!(close(back.y, p.y), "y drifted: {} vs {}", back.y, p.y);
    }
}
