use image::{Luma, Rgba};

use super::*;

fn defect_source() -> LayerSource {
    LayerSource::Defect(DefectSource {
        defect_type: "scratch".to_string(),
        source: "000_mask.png".to_string(),
        mask_path: None,
        defect_image_path: None,
    })
}

fn square_layer(size: u32) -> Layer {
    let color = RgbaImage::from_pixel(size, size, Rgba([200, 10, 10, 255]));
    let mask = GrayImage::from_pixel(size, size, Luma([255]));
    Layer::new(
        LayerId(1),
        defect_source(),
        color,
        mask,
        Point::new(3.0, 4.0),
        0.7,
    )
    .unwrap()
}

#[test]
fn mismatched_mask_is_rejected() {
    let color = RgbaImage::new(4, 4);
    let mask = GrayImage::new(4, 5);
    let err = Layer::new(LayerId(0), defect_source(), color, mask, Point::ZERO, 1.0);
    assert!(matches!(err, Err(DefectPasteError::Validation(_))));
}

#[test]
fn update_transform_recomputes_from_originals() {
    let mut layer = square_layer(10);
    layer.update_transform(2.0, 0.0, 0.5).unwrap();
    assert_eq!(layer.color().dimensions(), (20, 20));

    layer.update_transform(0.5, 0.0, 0.5).unwrap();
    assert_eq!(layer.color().dimensions(), (5, 5));

    layer.update_transform(1.0, 0.0, 0.5).unwrap();
    assert_eq!(layer.color(), layer.original_color());
    assert_eq!(layer.mask(), layer.original_mask());
}

#[test]
fn update_transform_is_idempotent() {
    let mut layer = square_layer(9);
    layer.update_transform(1.4, 37.0, 0.9).unwrap();
    let (c1, m1) = (layer.color().clone(), layer.mask().clone());
    layer.update_transform(1.4, 37.0, 0.9).unwrap();
    assert_eq!(layer.color(), &c1);
    assert_eq!(layer.mask(), &m1);

    layer.update_transform(0.8, -10.0, 0.9).unwrap();
    layer.update_transform(1.4, 37.0, 0.9).unwrap();
    assert_eq!(layer.color(), &c1);
    assert_eq!(layer.mask(), &m1);
}

#[test]
fn update_transform_keeps_position_and_records_fields() {
    let mut layer = square_layer(6);
    layer.update_transform(1.5, 90.0, 0.25).unwrap();
    assert_eq!(layer.position(), Point::new(3.0, 4.0));
    assert_eq!(
        layer.transform(),
        LayerTransform {
            scale: 1.5,
            rotation_deg: 90.0,
            opacity: 0.25
        }
    );
}

#[test]
fn invalid_transform_leaves_layer_untouched() {
    let mut layer = square_layer(6);
    assert!(layer.update_transform(0.0, 0.0, 0.5).is_err());
    assert!(layer.update_transform(1.0, f64::INFINITY, 0.5).is_err());
    assert!(layer.update_transform(1.0, 0.0, 1.5).is_err());
    assert_eq!(layer.transform().opacity, 0.7);
    assert_eq!(layer.color().dimensions(), (6, 6));
}

#[test]
fn oversized_scale_is_rejected_before_resampling() {
    let mut layer = square_layer(100);
    let err = layer.update_transform(200.0, 0.0, 0.7);
    assert!(matches!(err, Err(DefectPasteError::Validation(_))));
    assert!(layer.update_transform(1e12, 45.0, 0.7).is_err());
    assert_eq!(layer.transform(), LayerTransform::with_opacity(0.7));
    assert_eq!(layer.color().dimensions(), (100, 100));
}

#[test]
fn kind_labels_follow_source() {
    let layer = square_layer(2);
    assert_eq!(layer.kind(), LayerKind::Defect);
    assert_eq!(layer.source().type_label(), "scratch");

    let region = LayerSource::Region(RegionSource {
        kind: RegionKind::FreehandRegion,
        source: "freehand_region_0".to_string(),
        origin: PixelRect::new(0, 0, 8, 8),
        freehand_points: None,
    });
    assert_eq!(region.kind(), LayerKind::FreehandRegion);
    assert_eq!(region.type_label(), "freehand_region");
    assert!(region.kind().is_region());
}
