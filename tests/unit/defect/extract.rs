use image::{Luma, Rgba};

use super::*;

#[test]
fn extract_keeps_masked_pixels_and_crops() {
    let image = RgbaImage::from_pixel(40, 30, Rgba([90, 80, 70, 255]));
    let mask = GrayImage::from_fn(40, 30, |x, y| {
        Luma([if (10..14).contains(&x) && (12..15).contains(&y) { 255 } else { 0 }])
    });

    let cut = extract_defect(&image, &mask, CROP_MARGIN).unwrap();
    assert_eq!(cut.crop, Some(PixelRect::new(5, 7, 14, 13)));
    assert_eq!(cut.color.dimensions(), cut.mask.dimensions());
    assert_eq!(cut.color.get_pixel(5, 5).0, [90, 80, 70, 255]);
    assert_eq!(cut.color.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(cut.mask.get_pixel(5, 5).0, [255]);
}

#[test]
fn empty_mask_keeps_full_size() {
    let image = RgbaImage::from_pixel(12, 9, Rgba([1, 1, 1, 255]));
    let mask = GrayImage::new(12, 9);
    let cut = extract_defect(&image, &mask, CROP_MARGIN).unwrap();
    assert_eq!(cut.crop, None);
    assert_eq!(cut.color.dimensions(), (12, 9));
    assert!(cut.color.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn size_mismatch_is_a_validation_error() {
    let image = RgbaImage::new(5, 5);
    let mask = GrayImage::new(6, 5);
    assert!(matches!(
        extract_defect(&image, &mask, CROP_MARGIN),
        Err(DefectPasteError::Validation(_))
    ));
}
