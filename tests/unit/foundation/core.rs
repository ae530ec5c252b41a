use super::*;

#[test]
fn union_ignores_empty_and_grows() {
    let a = PixelRect::new(2, 3, 4, 5);
    assert_eq!(a.union(PixelRect::new(0, 0, 0, 0)), a);
    assert_eq!(
        a.union(PixelRect::new(10, 1, 2, 2)),
        PixelRect::new(2, 1, 10, 7)
    );
}

#[test]
fn intersect_disjoint_is_none() {
    let a = PixelRect::new(0, 0, 4, 4);
    assert_eq!(a.intersect(PixelRect::new(4, 0, 4, 4)), None);
    assert_eq!(
        a.intersect(PixelRect::new(2, 2, 4, 4)),
        Some(PixelRect::new(2, 2, 2, 2))
    );
}

#[test]
fn canvas_rect_is_normalized_truncated_and_clipped() {
    let r = Rect::new(30.7, 20.2, 10.9, 5.5);
    assert_eq!(
        PixelRect::from_canvas_rect(r, 100, 100),
        Some(PixelRect::new(10, 5, 19, 14))
    );

    let spill = Rect::new(-4.0, -4.0, 12.0, 12.0);
    assert_eq!(
        PixelRect::from_canvas_rect(spill, 10, 10),
        Some(PixelRect::new(0, 0, 10, 10))
    );

    let outside = Rect::new(50.0, 50.0, 60.0, 60.0);
    assert_eq!(PixelRect::from_canvas_rect(outside, 10, 10), None);
}

#[test]
fn opacity_bounds_are_enforced() {
    assert_eq!(check_opacity(0.0).unwrap(), 0.0);
    assert_eq!(check_opacity(1.0).unwrap(), 1.0);
    assert!(check_opacity(1.01).is_err());
    assert!(check_opacity(f64::NAN).is_err());
}
