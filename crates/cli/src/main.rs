use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use facesort_core::extraction::domain::descriptor_extractor::DescriptorExtractor;
use facesort_core::extraction::infrastructure::arcface_embedder::ArcFaceEmbedder;
use facesort_core::extraction::infrastructure::descriptor_file::JsonDescriptorSource;
use facesort_core::extraction::infrastructure::face_descriptor_extractor::FaceDescriptorExtractor;
use facesort_core::extraction::infrastructure::onnx_yolo_face_detector::{
    OnnxYoloFaceDetector, DEFAULT_CONFIDENCE,
};
use facesort_core::grouping::domain::grouping_config::{ThresholdTiers, TieBreak, TierStrategy};
use facesort_core::organize::domain::group_materializer::GroupMaterializer;
use facesort_core::organize::infrastructure::directory_materializer::DirectoryMaterializer;
use facesort_core::organize::infrastructure::dry_run_materializer::DryRunMaterializer;
use facesort_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facesort_core::pipeline::resize_images_use_case::ResizeImagesUseCase;
use facesort_core::pipeline::sort_config::{FaceLimit, SortConfig};
use facesort_core::pipeline::sort_photos_use_case::{ProgressCallback, SortPhotosUseCase};
use facesort_core::shared::constants::{
    DEFAULT_OUTPUT_DIR, DEFAULT_RESIZE_HEIGHT, DEFAULT_RESIZE_PREFIX, DEFAULT_RESIZE_WIDTH,
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};
use facesort_core::shared::image_files::list_images;
use facesort_core::shared::model_resolver::ModelResolver;

/// Sort photos into per-person folders by face similarity.
#[derive(Parser)]
#[command(name = "facesort", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Group photos by the person pictured and copy each group to its own folder.
    Sort(SortArgs),
    /// Write resized copies of every image in a directory.
    Resize(ResizeArgs),
}

#[derive(Args)]
struct SortArgs {
    /// Directory of photos to sort.
    input: PathBuf,

    /// Directory that receives the person_<n> folders.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// JSON config file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Comma-separated distance thresholds, tried in order.
    #[arg(long)]
    thresholds: Option<ThresholdTiers>,

    /// Tier strategy: full-pass-per-tier or first-match-per-group.
    #[arg(long)]
    strategy: Option<TierStrategy>,

    /// Tie-break between matching groups: first-encountered or nearest.
    #[arg(long)]
    tie_break: Option<TieBreak>,

    /// Use every detected face instead of only the most confident one.
    #[arg(long)]
    all_faces: bool,

    /// Smallest group that gets its own folder.
    #[arg(long)]
    min_group_size: Option<usize>,

    /// Read precomputed descriptors from a JSON file instead of running the models.
    #[arg(long)]
    descriptors: Option<PathBuf>,

    /// Write the extracted descriptors to a JSON file.
    #[arg(long)]
    dump_descriptors: Option<PathBuf>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Separator for the filename identity report.
    #[arg(long)]
    identity_separator: Option<char>,

    /// Directory checked for model files before downloading them.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Report the folders that would be written without copying anything.
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct ResizeArgs {
    /// Directory of images to resize.
    input: PathBuf,

    #[arg(long, default_value_t = DEFAULT_RESIZE_WIDTH)]
    width: u32,

    #[arg(long, default_value_t = DEFAULT_RESIZE_HEIGHT)]
    height: u32,

    /// Prefix for the resized copies.
    #[arg(long, default_value = DEFAULT_RESIZE_PREFIX)]
    prefix: String,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Sort(args) => run_sort(args),
        Command::Resize(args) => run_resize(args),
    }
}

fn run_sort(args: SortArgs) -> Result<(), Box<dyn std::error::Error>> {
    validate_sort(&args)?;

    let config = build_config(&args)?;
    let images = list_images(&args.input)?;
    if images.is_empty() {
        return Err(format!("No images found in {}", args.input.display()).into());
    }
    log::info!("Found {} images in {}", images.len(), args.input.display());

    let extractor = build_extractor(&args)?;
    let materializer: Box<dyn GroupMaterializer> = if args.dry_run {
        Box::new(DryRunMaterializer::new(&args.output))
    } else {
        Box::new(DirectoryMaterializer::new(&args.output))
    };

    let progress: ProgressCallback = Box::new(|current, total| {
        eprint!("\rScanning image {current}/{total}");
        true
    });

    let mut use_case = SortPhotosUseCase::new(
        extractor,
        materializer,
        Box::new(StdoutPipelineLogger::default().without_progress()),
        config,
        Some(progress),
    );
    if let Some(path) = &args.dump_descriptors {
        use_case = use_case.with_descriptor_dump(path);
    }

    let report = use_case.execute(&images)?;
    eprintln!();

    if report.images_skipped > 0 {
        log::warn!("{} images could not be read", report.images_skipped);
    }
    for group in &report.materialized {
        println!("{} ({} faces)", group.dir.display(), group.size);
    }
    log::info!(
        "{} of {} groups written to {}",
        report.materialized.len(),
        report.groups.len(),
        args.output.display()
    );
    Ok(())
}

fn run_resize(args: ResizeArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.is_dir() {
        return Err(format!("Input directory not found: {}", args.input.display()).into());
    }
    let written = ResizeImagesUseCase::new(args.width, args.height, args.prefix)
        .execute(&args.input)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Defaults for the chosen extractor, then config file values, then flags.
/// ArcFace embeddings are unit length and need wider tiers than face-api
/// descriptors read with `--descriptors`.
fn build_config(args: &SortArgs) -> Result<SortConfig, Box<dyn std::error::Error>> {
    let base = if args.descriptors.is_some() {
        SortConfig::default()
    } else {
        SortConfig::for_unit_embeddings()
    };
    let mut config = match &args.config {
        Some(path) => SortConfig::load_over(path, base)?,
        None => base,
    };

    if let Some(tiers) = &args.thresholds {
        config.grouping.threshold_tiers = tiers.clone();
    }
    if let Some(strategy) = args.strategy {
        config.grouping.tier_strategy = strategy;
    }
    if let Some(tie_break) = args.tie_break {
        config.grouping.tie_break = tie_break;
    }
    if args.all_faces {
        config.max_faces_per_image = FaceLimit::Unbounded;
    }
    if let Some(min) = args.min_group_size {
        config.min_group_size = min;
    }
    if let Some(separator) = args.identity_separator {
        config.identity_separator = Some(separator);
    }

    config.validate()?;
    Ok(config)
}

fn build_extractor(
    args: &SortArgs,
) -> Result<Box<dyn DescriptorExtractor>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.descriptors {
        log::info!("Reading descriptors from {}", path.display());
        return Ok(Box::new(JsonDescriptorSource::from_file(path)?));
    }

    let mut resolver = ModelResolver::new()?;
    if let Some(dir) = &args.models_dir {
        resolver = resolver.with_bundled_dir(dir);
    }

    log::info!("Resolving model: {YOLO_MODEL_NAME}");
    let detector_path = resolve_model(&resolver, YOLO_MODEL_NAME, YOLO_MODEL_URL, "face detection")?;
    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedder_path = resolve_model(
        &resolver,
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        "face embedding",
    )?;

    let detector = OnnxYoloFaceDetector::new(&detector_path, args.confidence)?;
    let embedder = ArcFaceEmbedder::new(&embedder_path)?;
    Ok(Box::new(FaceDescriptorExtractor::new(
        Box::new(detector),
        Box::new(embedder),
    )))
}

fn resolve_model(
    resolver: &ModelResolver,
    name: &str,
    url: &str,
    label: &'static str,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = resolver.resolve(
        name,
        url,
        Some(Box::new(move |downloaded, total| {
            download_progress(label, downloaded, total)
        })),
    )?;
    eprintln!();
    Ok(path)
}

fn validate_sort(args: &SortArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !args.input.is_dir() {
        return Err(format!("Input directory not found: {}", args.input.display()).into());
    }
    if !(0.0..=1.0).contains(&args.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            args.confidence
        )
        .into());
    }
    if let Some(path) = &args.descriptors {
        if !path.is_file() {
            return Err(format!("Descriptor file not found: {}", path.display()).into());
        }
    }
    if same_dir(&args.input, &args.output) {
        return Err("Output directory must differ from the input directory".into());
    }
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn download_progress(label: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {label} model... {pct}%");
    } else {
        eprint!("\rDownloading {label} model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use facesort_core::grouping::domain::online_grouper::OnlineGrouper;
    use facesort_core::shared::descriptor::Descriptor;

    fn sort_args(extra: &[&str]) -> SortArgs {
        let mut argv = vec!["facesort", "sort", "photos"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Sort(args) => args,
            Command::Resize(_) => panic!("expected sort"),
        }
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = build_config(&sort_args(&[])).unwrap();
        assert_eq!(config, SortConfig::for_unit_embeddings());
    }

    #[test]
    fn test_default_model_config_groups_arcface_pair_at_cosine_0_6() {
        let config = build_config(&sort_args(&[])).unwrap();
        let pair = vec![
            Descriptor::new("a.jpg", vec![1.0, 0.0]),
            Descriptor::new("b.jpg", vec![0.6, 0.8]),
        ];

        let groups = OnlineGrouper::new(config.grouping).group(&pair).unwrap();

        assert_eq!(groups.to_index_lists(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_descriptor_file_keeps_face_api_tiers() {
        let config = build_config(&sort_args(&["--descriptors", "faces.json"])).unwrap();
        assert_eq!(config, SortConfig::default());
    }

    #[test]
    fn test_config_file_without_tiers_keeps_model_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facesort.json");
        fs::write(&path, r#"{"min_group_size": 2}"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = build_config(&sort_args(&["--config", &path_arg])).unwrap();

        assert_eq!(
            config.grouping.threshold_tiers,
            ThresholdTiers::unit_embedding()
        );
        assert_eq!(config.min_group_size, 2);
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = sort_args(&[
            "--thresholds",
            "0.5,0.9",
            "--strategy",
            "first-match-per-group",
            "--tie-break",
            "nearest",
            "--all-faces",
            "--min-group-size",
            "4",
        ]);
        let config = build_config(&args).unwrap();

        assert_eq!(config.grouping.threshold_tiers.as_slice(), &[0.5, 0.9]);
        assert_eq!(config.grouping.tier_strategy, TierStrategy::FirstMatchPerGroup);
        assert_eq!(config.grouping.tie_break, TieBreak::Nearest);
        assert_eq!(config.max_faces_per_image, FaceLimit::Unbounded);
        assert_eq!(config.min_group_size, 4);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("facesort.json");
        fs::write(&path, r#"{"min_group_size": 7, "tie_break": "nearest"}"#).unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = build_config(&sort_args(&["--config", &path_arg, "--min-group-size", "3"]))
            .unwrap();

        assert_eq!(config.min_group_size, 3);
        assert_eq!(config.grouping.tie_break, TieBreak::Nearest);
    }

    #[test]
    fn test_invalid_strategy_rejected_by_parser() {
        assert!(Cli::try_parse_from(["facesort", "sort", "photos", "--strategy", "best"]).is_err());
    }

    #[test]
    fn test_zero_min_group_size_rejected() {
        assert!(build_config(&sort_args(&["--min-group-size", "0"])).is_err());
    }

    #[test]
    fn test_output_inside_input_is_allowed_but_same_dir_is_not() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().to_string_lossy().into_owned();
        let nested = dir.path().join("sorted").to_string_lossy().into_owned();

        let mut argv = vec!["facesort", "sort", input.as_str(), "--output", input.as_str()];
        let Command::Sort(same) = Cli::try_parse_from(&argv).unwrap().command else {
            panic!("expected sort");
        };
        assert!(validate_sort(&same).is_err());

        argv[4] = nested.as_str();
        let Command::Sort(nested) = Cli::try_parse_from(&argv).unwrap().command else {
            panic!("expected sort");
        };
        assert!(validate_sort(&nested).is_ok());
    }
}
