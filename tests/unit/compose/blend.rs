use super::*;

#[test]
fn zero_opacity_is_noop() {
    assert_eq!(over_opaque([1, 2, 3], [200, 200, 200, 255], 0.0), [1, 2, 3]);
}

#[test]
fn transparent_source_is_noop() {
    assert_eq!(over_opaque([10, 20, 30], [255, 255, 255, 0], 1.0), [10, 20, 30]);
}

#[test]
fn opaque_source_replaces_destination() {
    assert_eq!(over_opaque([0, 0, 0], [255, 9, 1, 255], 1.0), [255, 9, 1]);
}

#[test]
fn opacity_mixes_linearly() {
    assert_eq!(over_opaque([50, 50, 50], [200, 100, 0, 255], 0.7), [155, 85, 15]);
}

#[test]
fn source_alpha_and_opacity_multiply() {
    assert_eq!(over_opaque([0, 0, 0], [255, 255, 255, 102], 0.5), [51, 51, 51]);
}

#[test]
fn rows_blend_and_accumulate() {
    let mut color = vec![0u8, 0, 0, 100, 100, 100];
    over_row(&mut color, &[255, 255, 255, 255, 0, 0, 0, 0], 1.0);
    assert_eq!(color, vec![255, 255, 255, 100, 100, 100]);

    let mut mask = vec![10u8, 200, 0];
    max_row(&mut mask, &[50, 100, 0]);
    assert_eq!(mask, vec![50, 200, 0]);
}
