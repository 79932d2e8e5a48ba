use image::{DynamicImage, GrayImage, Luma};
use leafmatch::lowlevel::gray_view;
use leafmatch::{
    ChamferScorer, MemoryImageSource, OwnedImage, PlantParams, PlantPreprocessor,
    Point, SegmentationConfig, Segmenter, TemplateGenerator,
};
use std::hint::black_box;
use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, Criterion};

fn make_segmentation(size: u32) -> GrayImage {
    GrayImage::from_fn(size, size, |x, y| {
        let dx = x as f32 - size as f32 / 2.0;
        let dy = y as f32 - size as f32 / 2.0;
        let blob = dx * dx / 900.0 + dy * dy / 400.0 <= 1.0;
        let leaf = (x + y) % 37 < 20 && dx.abs() < 60.0 && dy.abs() < 60.0;
        if blob || leaf {
            Luma([150 + ((x * 7 + y * 3) % 60) as u8])
        } else {
            Luma([0])
        }
    })
}

fn make_silhouette() -> GrayImage {
    GrayImage::from_fn(80, 60, |x, y| {
        let dx = (x as f32 - 40.0) / 30.0;
        let dy = (y as f32 - 30.0) / 18.0;
        if dx * dx + dy * dy <= 1.0 {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

fn bench_segmenter(c: &mut Criterion) {
    let size = 256;
    let mask = GrayImage::from_pixel(size, size, Luma([255]));
    let cfg = SegmentationConfig {
        reduction_factor: 1,
        template_sizes: vec![0.2, 0.3, 0.4],
        template_shape_paths: vec![PathBuf::from("leaf.png")],
        num_rotation_steps: 24,
        ..SegmentationConfig::default()
    };
    let plant = PlantPreprocessor::new(cfg.preprocess_config())
        .unwrap()
        .prepare_segmentation(make_segmentation(size), &mask, Point::new(128, 128))
        .unwrap();

    let mut source = MemoryImageSource::new();
    source.insert("leaf.png", DynamicImage::ImageLuma8(make_silhouette()));
    let mut segmenter = Segmenter::new(cfg.clone(), PlantParams::default())
        .unwrap()
        .with_source(source.clone());

    c.bench_function("sweep_24_rotations_3_sizes", |b| {
        b.iter(|| black_box(segmenter.run_prepared(plant.clone()).unwrap()));
    });

    #[cfg(feature = "rayon")]
    {
        let shapes = vec![PathBuf::from("leaf.png"); 4];
        let par_cfg = SegmentationConfig {
            template_shape_paths: shapes,
            parallel: true,
            ..cfg
        };
        let mut par = Segmenter::new(par_cfg, PlantParams::default())
            .unwrap()
            .with_source(source);
        c.bench_function("sweep_4_shapes_parallel", |b| {
            b.iter(|| black_box(par.run_prepared(plant.clone()).unwrap()));
        });
    }
}

fn bench_chamfer(c: &mut Criterion) {
    let size = 256;
    let mask = GrayImage::from_pixel(size, size, Luma([255]));
    let plant = PlantPreprocessor::default()
        .prepare_segmentation(make_segmentation(size), &mask, Point::new(128, 128))
        .unwrap();

    c.bench_function("distance_map", |b| {
        b.iter(|| black_box(ChamferScorer::new(&plant.edges).unwrap()));
    });

    let scorer = ChamferScorer::new(&plant.edges).unwrap();
    let mask_view = gray_view(&plant.mask).unwrap();
    let mut gen = TemplateGenerator::new(
        SegmentationConfig::default().generator_config(plant.extent),
        mask_view,
        plant.reference,
        plant.bounds(),
    )
    .unwrap();
    gen.load_shape_image(&make_silhouette()).unwrap();
    gen.set_size(0.4 * plant.extent).unwrap();
    gen.set_rotation_step(0).unwrap();

    let rect = gen.matching_rect().unwrap();
    let (rw, rh) = gen.result_size().unwrap();
    let contour = gen.template_contour().unwrap().to_vec();
    let mut result = OwnedImage::filled(rw, rh, 0.0f32).unwrap();
    c.bench_function("run_matching", |b| {
        b.iter(|| {
            let mut view = result.view_mut();
            view.fill(0.0);
            scorer
                .run_matching(black_box(&contour), rect.top_left(), &mut view)
                .unwrap();
        });
    });
}

criterion_group!(benches, bench_segmenter, bench_chamfer);
criterion_main!(benches);
