use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use leafmatch::{
    LeafMatchError, MemoryImageSource, PlantParams, PlantPreprocessor, Point, PreparedPlant,
    SegmentationConfig, Segmenter,
};
use std::path::PathBuf;

fn silhouette_with_blocks(blocks: &[(u32, u32, u32)]) -> GrayImage {
    GrayImage::from_fn(80, 80, |x, y| {
        let hit = blocks
            .iter()
            .any(|&(bx, by, side)| x >= bx && x < bx + side && y >= by && y < by + side);
        if hit {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

fn config(shapes: &[&str]) -> SegmentationConfig {
    SegmentationConfig {
        reduction_factor: 1,
        plant_padding: 0.25,
        edge_threshold: 50.0,
        num_rotation_steps: 1,
        template_sizes: vec![1.0],
        template_shape_paths: shapes.iter().map(PathBuf::from).collect(),
        plant_center_size: 2.0,
        max_template_plant_ratio: 1.5,
        max_stem_length_ratio: 0.0,
        min_match_threshold: 0.0,
        max_match_threshold: 0.05,
        outside_mask_ratio: 0.1,
        ..SegmentationConfig::default()
    }
}

fn square_plant(cfg: &SegmentationConfig) -> PreparedPlant {
    let seg = GrayImage::from_fn(120, 120, |x, y| {
        if (40..70).contains(&x) && (40..70).contains(&y) {
            Luma([200])
        } else {
            Luma([0])
        }
    });
    let mask = GrayImage::from_pixel(120, 120, Luma([255]));
    PlantPreprocessor::new(cfg.preprocess_config())
        .unwrap()
        .prepare_segmentation(seg, &mask, Point::new(55, 55))
        .unwrap()
}

fn source() -> MemoryImageSource {
    let mut source = MemoryImageSource::new();
    source.insert(
        "square.png",
        DynamicImage::ImageLuma8(silhouette_with_blocks(&[(20, 20, 40)])),
    );
    source.insert(
        "two_blobs.png",
        DynamicImage::ImageLuma8(silhouette_with_blocks(&[(5, 5, 25), (50, 50, 25)])),
    );
    source.insert(
        "blank.png",
        DynamicImage::ImageLuma8(GrayImage::from_pixel(40, 40, Luma([255]))),
    );
    source
}

#[test]
fn missing_mask_aborts_and_leaves_results_untouched() {
    let mut source = source();
    source.insert(
        "plant.png",
        DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([40, 160, 40]))),
    );
    let params = PlantParams {
        image_path: "plant.png".into(),
        mask_path: "missing_mask.png".into(),
        center: Point::new(32, 32),
    };
    let mut segmenter = Segmenter::new(config(&["square.png"]), params)
        .unwrap()
        .with_source(source);

    let err = segmenter.run_segmentation().err().unwrap();
    assert_eq!(
        err,
        LeafMatchError::FileMissing {
            path: "missing_mask.png".to_string()
        }
    );
    assert_eq!(segmenter.indicator().count_set(), 0);
    assert!(segmenter.matches().is_empty());
    assert!(segmenter.accumulation().is_none());
    assert!(segmenter.prepared_plant().is_none());
}

#[test]
fn missing_file_on_disk_is_reported_as_missing() {
    let params = PlantParams {
        image_path: "/nonexistent/leafmatch/plant.png".into(),
        mask_path: "/nonexistent/leafmatch/mask.png".into(),
        center: Point::new(0, 0),
    };
    let mut segmenter = Segmenter::new(config(&[]), params).unwrap();
    assert!(matches!(
        segmenter.run_segmentation(),
        Err(LeafMatchError::FileMissing { .. })
    ));
}

#[test]
fn ambiguous_shape_is_skipped_without_failing_the_run() {
    let cfg = config(&["two_blobs.png"]);
    let plant = square_plant(&cfg);
    let mut segmenter = Segmenter::new(cfg, PlantParams::default())
        .unwrap()
        .with_source(source());
    segmenter.run_prepared(plant).unwrap();

    assert_eq!(segmenter.indicator().len(), 1);
    assert_eq!(segmenter.indicator().count_set(), 0);
    assert!(segmenter.matches().is_empty());
}

#[test]
fn bad_shapes_do_not_disturb_other_slots() {
    let cfg = config(&["two_blobs.png", "missing.png", "square.png", "blank.png"]);
    let plant = square_plant(&cfg);
    let mut segmenter = Segmenter::new(cfg, PlantParams::default())
        .unwrap()
        .with_source(source());
    segmenter.run_prepared(plant).unwrap();

    let indicator = segmenter.indicator();
    assert_eq!(indicator.len(), 4);
    assert_eq!(indicator.values(), &[0.0, 0.0, 1.0, 0.0]);
    assert_eq!(segmenter.matches()[0].shape_id, 2);
}

#[test]
fn oversized_templates_are_skipped() {
    let cfg = SegmentationConfig {
        template_sizes: vec![3.0, 1.0],
        ..config(&["square.png"])
    };
    let plant = square_plant(&cfg);
    let mut segmenter = Segmenter::new(cfg, PlantParams::default())
        .unwrap()
        .with_source(source());
    segmenter.run_prepared(plant).unwrap();

    assert_eq!(segmenter.indicator().values(), &[0.0, 1.0]);
}

#[test]
fn huge_center_size_searches_the_whole_crop() {
    let cfg = SegmentationConfig {
        plant_center_size: 1.0e9,
        ..config(&["square.png"])
    };
    assert!(cfg.validate().is_ok());
    let plant = square_plant(&cfg);
    let mut segmenter = Segmenter::new(cfg, PlantParams::default())
        .unwrap()
        .with_source(source());
    segmenter.run_prepared(plant).unwrap();

    assert_eq!(segmenter.indicator().values(), &[1.0]);
}

#[test]
fn invalid_config_is_rejected_before_any_work() {
    let cfg = SegmentationConfig {
        num_rotation_steps: 0,
        ..SegmentationConfig::default()
    };
    assert!(matches!(
        Segmenter::new(cfg, PlantParams::default()),
        Err(LeafMatchError::InvalidConfig { .. })
    ));
}
