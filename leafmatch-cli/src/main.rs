use clap::Parser;
use image::{GrayImage, Luma};
use leafmatch::{
    ImageView, LeafMatch, PlantParams, Point, RenderSink, ScatterPoint, SegmentationConfig,
    Segmenter,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "leafmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PlantJson {
    image_path: String,
    mask_path: String,
    /// Stem reference point `[x, y]` in photograph pixels.
    center: [i32; 2],
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SegmentationConfigJson {
    reduction_factor: u32,
    plant_padding: f32,
    edge_threshold: f32,
    num_rotation_steps: usize,
    template_sizes: Vec<f32>,
    generate_template_sizes: Option<usize>,
    template_shape_paths: Vec<String>,
    plant_center_size: f32,
    max_template_plant_ratio: f32,
    max_stem_length_ratio: f32,
    min_match_threshold: f32,
    max_match_threshold: f32,
    outside_mask_ratio: f32,
    parallel: bool,
}

impl Default for SegmentationConfigJson {
    fn default() -> Self {
        let cfg = SegmentationConfig::default();
        Self {
            reduction_factor: cfg.reduction_factor,
            plant_padding: cfg.plant_padding,
            edge_threshold: cfg.edge_threshold,
            num_rotation_steps: cfg.num_rotation_steps,
            template_sizes: cfg.template_sizes,
            generate_template_sizes: cfg.generate_template_sizes,
            template_shape_paths: Vec::new(),
            plant_center_size: cfg.plant_center_size,
            max_template_plant_ratio: cfg.max_template_plant_ratio,
            max_stem_length_ratio: cfg.max_stem_length_ratio,
            min_match_threshold: cfg.min_match_threshold,
            max_match_threshold: cfg.max_match_threshold,
            outside_mask_ratio: cfg.outside_mask_ratio,
            parallel: cfg.parallel,
        }
    }
}

impl From<SegmentationConfigJson> for SegmentationConfig {
    fn from(value: SegmentationConfigJson) -> Self {
        Self {
            reduction_factor: value.reduction_factor,
            plant_padding: value.plant_padding,
            edge_threshold: value.edge_threshold,
            num_rotation_steps: value.num_rotation_steps,
            template_sizes: value.template_sizes,
            generate_template_sizes: value.generate_template_sizes,
            template_shape_paths: value
                .template_shape_paths
                .into_iter()
                .map(PathBuf::from)
                .collect(),
            plant_center_size: value.plant_center_size,
            max_template_plant_ratio: value.max_template_plant_ratio,
            max_stem_length_ratio: value.max_stem_length_ratio,
            min_match_threshold: value.min_match_threshold,
            max_match_threshold: value.max_match_threshold,
            outside_mask_ratio: value.outside_mask_ratio,
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ScatterJson {
    columns: usize,
    rows: usize,
}

impl Default for ScatterJson {
    fn default() -> Self {
        Self {
            columns: 24,
            rows: 16,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    plant: PlantJson,
    segmentation: SegmentationConfigJson,
    scatter: ScatterJson,
    output_path: Option<String>,
    /// Directory receiving PNGs of the intermediate images.
    debug_dir: Option<String>,
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    shape_id: usize,
    size_id: usize,
    rotation_id: usize,
    x: i32,
    y: i32,
    size_px: f32,
    angle_deg: f32,
    score: f32,
}

impl From<&LeafMatch> for MatchRecord {
    fn from(value: &LeafMatch) -> Self {
        Self {
            shape_id: value.shape_id,
            size_id: value.size_id,
            rotation_id: value.rotation_id,
            x: value.position.x,
            y: value.position.y,
            size_px: value.size_px,
            angle_deg: value.angle_deg,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct ScatterRecord {
    name: String,
    column: usize,
    row: usize,
    set: bool,
}

impl From<ScatterPoint> for ScatterRecord {
    fn from(value: ScatterPoint) -> Self {
        Self {
            name: value.name,
            column: value.column,
            row: value.row,
            set: value.set,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    /// Indicator dimensions: shapes, sizes, rotations.
    dims: [usize; 3],
    template_sizes: Vec<f32>,
    indicator: Vec<f32>,
    matches: Vec<MatchRecord>,
    scatter: Vec<ScatterRecord>,
}

/// Writes every shown image as `<dir>/<name>.png`.
struct DirSink {
    dir: PathBuf,
}

impl RenderSink for DirSink {
    fn show(&mut self, name: &str, view: ImageView<'_, u8>) {
        let img = GrayImage::from_fn(view.width() as u32, view.height() as u32, |x, y| {
            Luma([view.get(x as usize, y as usize).copied().unwrap_or(0)])
        });
        let path = self.dir.join(format!("{name}.png"));
        if let Err(err) = img.save(&path) {
            tracing::warn!(path = %path.display(), error = %err, "failed to write debug image");
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("leafmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.plant.image_path.is_empty() || config.plant.mask_path.is_empty() {
        return Err("plant.image_path and plant.mask_path must be set in the config".into());
    }
    if config.segmentation.template_shape_paths.is_empty() {
        return Err("segmentation.template_shape_paths must list at least one shape".into());
    }

    let params = PlantParams {
        image_path: config.plant.image_path.into(),
        mask_path: config.plant.mask_path.into(),
        center: Point::new(config.plant.center[0], config.plant.center[1]),
    };
    let mut segmenter = Segmenter::new(config.segmentation.into(), params)?;
    if let Some(dir) = config.debug_dir {
        fs::create_dir_all(&dir)?;
        segmenter = segmenter.with_sink(DirSink { dir: dir.into() });
    }
    segmenter.run_segmentation()?;

    let indicator = segmenter.indicator();
    let (shapes, sizes, rotations) = indicator.dims();
    let output = Output {
        dims: [shapes, sizes, rotations],
        template_sizes: segmenter.template_sizes().to_vec(),
        indicator: indicator.values().to_vec(),
        matches: segmenter.matches().iter().map(MatchRecord::from).collect(),
        scatter: indicator
            .scatter_points(config.scatter.columns, config.scatter.rows)
            .into_iter()
            .map(ScatterRecord::from)
            .collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
