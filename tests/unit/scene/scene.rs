use image::{GrayImage, Luma, Rgba};

use super::*;
use crate::foundation::core::PixelRect;

fn scene_with_bg(w: u32, h: u32) -> Scene {
    let mut scene = Scene::default();
    scene
        .set_background(RgbaImage::from_pixel(w, h, Rgba([50, 60, 70, 255])))
        .unwrap();
    scene
}

fn cut(w: u32, h: u32) -> DefectCut {
    DefectCut {
        color: RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255])),
        mask: GrayImage::from_pixel(w, h, Luma([255])),
        crop: None,
    }
}

fn source() -> DefectSource {
    DefectSource {
        defect_type: "scratch".to_owned(),
        source: "s.png".to_owned(),
        mask_path: None,
        defect_image_path: None,
    }
}

#[test]
fn commands_need_a_background() {
    let mut scene = Scene::default();
    assert!(scene.add_defect(cut(4, 4), source(), None, None).is_err());
    assert!(
        scene
            .begin_selection(SelectionMode::Rectangle, Point::ZERO)
            .is_err()
    );
    assert!(scene.set_background(RgbaImage::new(0, 3)).is_err());
}

#[test]
fn defect_is_centered_with_default_opacity_and_selected() {
    let mut scene = scene_with_bg(200, 150);
    let event = scene.add_defect(cut(40, 30), source(), None, None).unwrap();
    let SceneEvent::Placed { id, kind, position } = event.clone() else {
        panic!("expected Placed, got {event:?}");
    };
    assert_eq!(kind, LayerKind::Defect);
    assert_eq!(position, Point::new(80.0, 60.0));
    assert_eq!(scene.selected(), Some(id));
    assert_eq!(scene.layer(id).unwrap().opacity(), 0.7);
}

#[test]
fn explicit_position_and_opacity_are_kept() {
    let mut scene = scene_with_bg(50, 50);
    scene
        .add_defect(cut(4, 4), source(), Some(Point::new(3.5, -2.0)), Some(0.25))
        .unwrap();
    let layer = &scene.defects()[0];
    assert_eq!(layer.position(), Point::new(3.5, -2.0));
    assert_eq!(layer.opacity(), 0.25);
}

#[test]
fn tiny_rectangle_selection_places_nothing() {
    let mut scene = scene_with_bg(100, 80);
    scene
        .begin_selection(SelectionMode::Rectangle, Point::new(10.0, 10.0))
        .unwrap();
    scene.update_selection(Point::new(14.0, 14.0)).unwrap();
    let event = scene.commit_selection().unwrap();
    assert_eq!(
        event,
        SceneEvent::Selection {
            has_selection: false
        }
    );
    assert!(scene.regions().is_empty());
    assert!(scene.selection_draft().is_none());
}

#[test]
fn six_pixel_selection_becomes_a_centered_region() {
    let mut scene = scene_with_bg(100, 80);
    scene
        .begin_selection(SelectionMode::Rectangle, Point::new(10.0, 10.0))
        .unwrap();
    scene.update_selection(Point::new(16.0, 16.0)).unwrap();
    let event = scene.commit_selection().unwrap();

    assert_eq!(scene.regions().len(), 1);
    let region = &scene.regions()[0];
    assert_eq!(region.kind(), LayerKind::SelectedRegion);
    assert_eq!(region.position(), Point::new(47.0, 37.0));
    assert_eq!(region.opacity(), 0.8);
    assert_eq!(scene.selected(), Some(region.id()));
    assert!(matches!(event, SceneEvent::Placed { .. }));

    let LayerSource::Region(src) = region.source() else {
        panic!("region layer without region provenance");
    };
    assert_eq!(src.source, "region_0");
    assert_eq!(src.origin, PixelRect::new(10, 10, 6, 6));
}

#[test]
fn freehand_label_counts_existing_regions() {
    let mut scene = scene_with_bg(100, 100);
    scene
        .begin_selection(SelectionMode::Rectangle, Point::new(0.0, 0.0))
        .unwrap();
    scene.update_selection(Point::new(20.0, 20.0)).unwrap();
    scene.commit_selection().unwrap();

    scene
        .begin_selection(SelectionMode::Freehand, Point::new(30.0, 30.0))
        .unwrap();
    for p in [(60.0, 30.0), (60.0, 60.0), (30.0, 60.0)] {
        scene.update_selection(Point::new(p.0, p.1)).unwrap();
    }
    scene.commit_selection().unwrap();

    let LayerSource::Region(src) = scene.regions()[1].source() else {
        panic!("region layer without region provenance");
    };
    assert_eq!(src.source, "freehand_region_1");
    assert_eq!(src.kind, RegionKind::FreehandRegion);
}

#[test]
fn cancel_discards_the_draft() {
    let mut scene = scene_with_bg(40, 40);
    scene
        .begin_selection(SelectionMode::Freehand, Point::new(1.0, 1.0))
        .unwrap();
    assert_eq!(
        scene.cancel_selection(),
        SceneEvent::Selection {
            has_selection: false
        }
    );
    assert!(scene.update_selection(Point::new(2.0, 2.0)).is_err());
    assert_eq!(
        scene.commit_selection().unwrap(),
        SceneEvent::Selection {
            has_selection: false
        }
    );
}

#[test]
fn transform_move_and_remove() {
    let mut scene = scene_with_bg(64, 64);
    let SceneEvent::Placed { id, .. } = scene.add_defect(cut(8, 4), source(), None, None).unwrap()
    else {
        panic!("expected Placed");
    };

    let event = scene.update_transform(id, 2.0, 0.0, 0.5).unwrap();
    assert!(matches!(event, SceneEvent::Transformed { .. }));
    assert_eq!(scene.layer(id).unwrap().color().dimensions(), (16, 8));

    scene.move_layer(id, Point::new(1.0, 2.0)).unwrap();
    assert_eq!(scene.layer(id).unwrap().position(), Point::new(1.0, 2.0));

    assert!(
        scene
            .update_transform(LayerId(999), 1.0, 0.0, 1.0)
            .is_err()
    );
    assert!(scene.update_transform(id, 0.0, 0.0, 1.0).is_err());

    let removed = scene.remove_selected().unwrap();
    assert_eq!(
        removed,
        SceneEvent::Removed {
            id,
            kind: LayerKind::Defect
        }
    );
    assert!(scene.defects().is_empty());
    assert_eq!(scene.selected(), None);
    assert!(scene.remove_selected().is_none());
}

#[test]
fn layers_iterate_defects_below_regions() {
    let mut scene = scene_with_bg(64, 64);
    scene
        .begin_selection(SelectionMode::Rectangle, Point::new(0.0, 0.0))
        .unwrap();
    scene.update_selection(Point::new(10.0, 10.0)).unwrap();
    scene.commit_selection().unwrap();
    scene.add_defect(cut(4, 4), source(), None, None).unwrap();

    let kinds: Vec<LayerKind> = scene.layers().map(Layer::kind).collect();
    assert_eq!(kinds, vec![LayerKind::Defect, LayerKind::SelectedRegion]);
}

#[test]
fn clears_and_new_background_reset_state() {
    let mut scene = scene_with_bg(32, 32);
    scene.add_defect(cut(4, 4), source(), None, None).unwrap();
    scene
        .paint_stroke(Point::new(2.0, 2.0), Point::new(10.0, 2.0), &Brush::default())
        .unwrap();
    assert!(scene.paint().has_content());

    scene.clear_defects();
    assert!(scene.defects().is_empty());
    assert_eq!(scene.selected(), None);
    scene.clear_paint();
    assert!(!scene.paint().has_content());

    scene.add_defect(cut(4, 4), source(), None, None).unwrap();
    scene
        .set_background(RgbaImage::from_pixel(10, 12, Rgba([0, 0, 0, 255])))
        .unwrap();
    assert!(scene.defects().is_empty());
    assert_eq!(scene.paint().width(), 10);
    assert_eq!(scene.dimensions(), Some((10, 12)));
}

#[test]
fn select_rejects_unknown_layers() {
    let mut scene = scene_with_bg(16, 16);
    assert!(scene.select(Some(LayerId(7))).is_err());
    scene.select(None).unwrap();
}
