use image::{Luma, Rgba};

use super::*;

fn pair_with_block(w: u32, h: u32, block: PixelRect) -> (RgbaImage, GrayImage) {
    let mask = GrayImage::from_fn(w, h, |x, y| {
        let inside = x >= block.x && x < block.right() && y >= block.y && y < block.bottom();
        Luma([if inside { 255 } else { 0 }])
    });
    let color = RgbaImage::from_fn(w, h, |x, y| Rgba([x as u8, y as u8, 7, 255]));
    (color, mask)
}

#[test]
fn empty_mask_returns_inputs_unchanged() {
    let color = RgbaImage::from_pixel(8, 6, Rgba([1, 2, 3, 255]));
    let mask = GrayImage::new(8, 6);
    let out = crop_to_content(&color, &mask, CROP_MARGIN).unwrap();
    assert_eq!(out.bounds, None);
    assert_eq!(out.color, color);
    assert_eq!(out.mask, mask);
}

#[test]
fn faint_mask_below_half_is_not_content() {
    let color = RgbaImage::new(4, 4);
    let mask = GrayImage::from_pixel(4, 4, Luma([100]));
    let out = crop_to_content(&color, &mask, CROP_MARGIN).unwrap();
    assert_eq!(out.bounds, None);
    assert_eq!(out.mask.dimensions(), (4, 4));
}

#[test]
fn crop_pads_tight_box_by_margin() {
    let (color, mask) = pair_with_block(100, 100, PixelRect::new(20, 40, 10, 5));
    assert_eq!(content_bounds(&mask), Some(PixelRect::new(20, 40, 10, 5)));

    let out = crop_to_content(&color, &mask, CROP_MARGIN).unwrap();
    assert_eq!(out.bounds, Some(PixelRect::new(15, 35, 20, 15)));
    assert_eq!(out.color.dimensions(), (20, 15));
    assert_eq!(out.mask.dimensions(), (20, 15));
    assert_eq!(out.color.get_pixel(0, 0).0, [15, 35, 7, 255]);
    assert_eq!(out.mask.get_pixel(5, 5).0, [255]);
    assert_eq!(out.mask.get_pixel(4, 5).0, [0]);
}

#[test]
fn crop_margin_clamps_at_raster_edges() {
    let (color, mask) = pair_with_block(10, 10, PixelRect::new(1, 7, 2, 3));
    let out = crop_to_content(&color, &mask, CROP_MARGIN).unwrap();
    assert_eq!(out.bounds, Some(PixelRect::new(0, 2, 8, 8)));
}

#[test]
fn cropping_twice_does_not_shrink() {
    let (color, mask) = pair_with_block(64, 48, PixelRect::new(30, 12, 9, 4));
    let first = crop_to_content(&color, &mask, CROP_MARGIN).unwrap();
    let second = crop_to_content(&first.color, &first.mask, CROP_MARGIN).unwrap();
    let (w, h) = first.mask.dimensions();
    assert_eq!(second.bounds, Some(PixelRect::full(w, h)));
    assert_eq!(second.color, first.color);
    assert_eq!(second.mask, first.mask);
}

#[test]
fn mismatched_sizes_are_rejected() {
    let color = RgbaImage::new(3, 3);
    let mask = GrayImage::new(3, 4);
    assert!(crop_to_content(&color, &mask, CROP_MARGIN).is_err());
}
