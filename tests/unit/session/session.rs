use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use image::{GrayImage, Luma, Rgb, RgbImage};

use super::*;

struct Fixture {
    dir: PathBuf,
    targets: [PathBuf; 2],
    mask: PathBuf,
    library: DefectLibrary,
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn fixture(tag: &str) -> Fixture {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "defectpaste_session_{tag}_{}_{nanos}",
        std::process::id()
    ));
    let masks = dir.join("masks/crack");
    let images = dir.join("images");
    let targets = dir.join("targets");
    for d in [&masks, &images, &targets] {
        std::fs::create_dir_all(d).unwrap();
    }

    let mask = masks.join("c1.png");
    GrayImage::from_fn(20, 20, |x, y| {
        Luma([if (5..15).contains(&x) && (5..15).contains(&y) { 255 } else { 0 }])
    })
    .save(&mask)
    .unwrap();
    RgbImage::from_pixel(20, 20, Rgb([250, 0, 0]))
        .save(images.join("c1.png"))
        .unwrap();

    let a = targets.join("a.png");
    let b = targets.join("b.png");
    RgbImage::from_pixel(60, 40, Rgb([20, 40, 60])).save(&a).unwrap();
    RgbImage::from_pixel(50, 50, Rgb([90, 90, 90])).save(&b).unwrap();

    let library = DefectLibrary::scan(&dir.join("masks"), &images).unwrap();
    Fixture {
        dir,
        targets: [a, b],
        mask,
        library,
    }
}

#[test]
fn commands_mark_the_session_dirty() {
    let fx = fixture("dirty");
    let mut session = EditorSession::new(SessionOpts::default(), fx.library.clone());
    assert!(!session.is_dirty());
    assert!(session.save(&fx.dir.join("out.png")).is_err());

    session.switch_image(&fx.targets[0]).unwrap();
    assert!(!session.is_dirty());
    let event = session.add_defect_from_mask(&fx.mask).unwrap();
    assert!(matches!(event, SceneEvent::Placed { .. }));
    assert!(session.is_dirty());

    let layer = &session.scene().defects()[0];
    let crate::layer::LayerSource::Defect(src) = layer.source() else {
        panic!("defect layer without defect provenance");
    };
    assert_eq!(src.defect_type, "crack");
    assert_eq!(src.source, "c1.png");
    assert_eq!(layer.opacity(), 0.7);

    let paths = session.save(&fx.dir.join("out.png")).unwrap();
    assert!(paths.color.exists() && paths.mask.exists() && paths.metadata.exists());
    assert!(!session.is_dirty());
}

#[test]
fn switching_images_keeps_each_images_edits() {
    let fx = fixture("switch");
    let mut session = EditorSession::new(SessionOpts::default(), fx.library.clone());

    session.switch_image(&fx.targets[0]).unwrap();
    session.add_defect_from_mask(&fx.mask).unwrap();
    let id = session.scene().defects()[0].id();
    session.update_transform(id, 1.5, 10.0, 0.9).unwrap();
    let a_before = session.composite().unwrap();

    session.switch_image(&fx.targets[1]).unwrap();
    assert!(session.scene().defects().is_empty());
    assert_eq!(session.scene().dimensions(), Some((50, 50)));

    let report = session.switch_image(&fx.targets[0]).unwrap();
    assert_eq!(report.defects, 1);
    assert_eq!(session.composite().unwrap(), a_before);
    assert_eq!(session.cache().len(), 2);
}

#[test]
fn save_all_exports_and_returns_to_current_image() {
    let fx = fixture("saveall");
    let mut session = EditorSession::new(SessionOpts::default(), fx.library.clone());
    for target in &fx.targets {
        session.switch_image(target).unwrap();
        session.add_defect_from_mask(&fx.mask).unwrap();
    }
    session
        .paint_stroke(Point::new(1.0, 1.0), Point::new(8.0, 8.0), &Brush::default())
        .unwrap();
    let current_before = session.composite().unwrap();

    let out = fx.dir.join("out");
    let report = session.save_all(&out, Some("aug")).unwrap();
    assert_eq!(report.exported.len(), 2);
    assert_eq!(
        report.exported.iter().map(|e| e.index).collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert!(out.join("aug_2_metadata.json").exists());
    assert_eq!(session.current(), Some(&ImageKey::from(fx.targets[1].as_path())));
    assert_eq!(session.composite().unwrap(), current_before);
    assert!(!session.is_dirty());
}

#[test]
fn degenerate_selection_keeps_the_session_clean() {
    let fx = fixture("select");
    let mut session = EditorSession::new(SessionOpts::default(), fx.library.clone());
    session.switch_image(&fx.targets[0]).unwrap();
    session
        .begin_selection(SelectionMode::Rectangle, Point::new(1.0, 1.0))
        .unwrap();
    session.update_selection(Point::new(3.0, 3.0)).unwrap();
    assert_eq!(
        session.commit_selection().unwrap(),
        SceneEvent::Selection {
            has_selection: false
        }
    );
    assert!(!session.is_dirty());
    assert!(session.remove_selected().is_none());
}

#[test]
fn failed_resume_keeps_cached_edits_of_the_current_image() {
    let fx = fixture("resume");
    let mut session = EditorSession::new(SessionOpts::default(), fx.library.clone());
    let [a, b] = &fx.targets;
    session.switch_image(a).unwrap();
    session.add_defect_from_mask(&fx.mask).unwrap();
    session.switch_image(b).unwrap();
    session.add_defect_from_mask(&fx.mask).unwrap();
    session.add_defect_from_mask(&fx.mask).unwrap();

    let b_bytes = std::fs::read(b).unwrap();
    std::fs::remove_file(b).unwrap();
    let out = fx.dir.join("out");
    let report = session.save_all(&out, Some("aug")).unwrap();
    assert_eq!(report.exported.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.resume_error.is_some());
    assert!(out.join("aug_1.png").exists());
    assert_eq!(session.current(), None);
    assert!(session.scene().background().is_none());

    std::fs::write(b, b_bytes).unwrap();
    session.switch_image(a).unwrap();
    assert_eq!(session.cache().get(&ImageKey::from(b.as_path())).unwrap().defects.len(), 2);
    let report = session.switch_image(b).unwrap();
    assert_eq!(report.defects, 2);
}
