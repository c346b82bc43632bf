//! Labelport: normalize annotation exports onto a loaded image set.
//!
//! Labelport ingests heterogeneous object-detection annotation exports
//! (COCO JSON, YOLO per-image text, flat CSV, Pascal VOC XML) and
//! normalizes them into one canonical in-memory model attached to a
//! previously loaded collection of images. It is a pure function of
//! (existing images, raw annotation payload, declared format): no image
//! decoding, no persistence, no rendering.
//!
//! # Modules
//!
//! - [`model`]: the canonical model (ImageRecord, Annotation, BBox)
//! - [`ingest`]: format decoders, image matching and the orchestrator
//! - [`palette`]: deterministic class-to-color assignment
//! - [`error`]: error types for labelport operations
//!
//! # Example
//!
//! ```
//! use labelport::{ingest, AnnotationFormat, ClassRegistry, ImageRecord, SourceFile};
//!
//! let mut images = vec![ImageRecord::new(1u64, "img1.jpg", 640, 480)];
//! let mut registry = ClassRegistry::new();
//! let files = [SourceFile::new(
//!     "anns.csv",
//!     &b"filename,class,x,y,width,height\nimg1.jpg,cat,10,20,30,40\n"[..],
//! )];
//!
//! let report = ingest(AnnotationFormat::Csv, &files, &mut images, &mut registry);
//! assert_eq!(report.accepted, 1);
//! assert_eq!(images[0].annotations[0].label, "cat");
//! ```

pub mod error;
pub mod ingest;
pub mod model;
pub mod palette;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use walkdir::WalkDir;

pub use error::LabelportError;
pub use ingest::diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticContext, IngestionReport, Severity,
};
pub use ingest::{ingest, AnnotationFormat, SourceFile};
pub use model::{Annotation, BBox, BoxGeometry, ImageId, ImageRecord};
pub use palette::{ClassRegistry, Color};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "png", "jpeg", "bmp", "webp"];

/// The labelport CLI application.
#[derive(Parser)]
#[command(name = "labelport")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest annotation files against a directory of images.
    Ingest(IngestArgs),
}

/// Arguments for the ingest subcommand.
#[derive(clap::Args)]
struct IngestArgs {
    /// Annotation files to ingest.
    files: Vec<PathBuf>,

    /// Annotation format ('coco', 'yolo', 'csv', or 'pascal').
    #[arg(long)]
    format: String,

    /// Directory containing the images the annotations refer to.
    #[arg(long)]
    images: PathBuf,

    /// Exit non-zero if any record was skipped (not just on batch failures).
    #[arg(long)]
    strict: bool,
}

/// Run the labelport CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LabelportError> {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ingest(args)) => run_ingest(args),
        None => {
            // No subcommand: just print a banner and exit successfully
            println!("labelport {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Normalize annotation exports onto a loaded image set.");
            println!();
            println!("Run 'labelport --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the ingest subcommand.
fn run_ingest(args: IngestArgs) -> Result<(), LabelportError> {
    let format: AnnotationFormat = args.format.parse()?;

    let mut images = load_images(&args.images)?;
    let files = args
        .files
        .iter()
        .map(|path| SourceFile::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let mut registry = ClassRegistry::new();
    let report = ingest(format, &files, &mut images, &mut registry);

    print!("{}", report);

    if !registry.is_empty() {
        println!();
        println!("Classes:");
        for (name, color) in registry.iter() {
            println!("  {}: {}", name, color);
        }
    }

    let failed = !report.is_ok() || (args.strict && !report.is_clean());
    if failed {
        Err(LabelportError::IngestFailed {
            accepted: report.accepted,
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Collects the images under `dir` into records with known dimensions.
///
/// Files are taken recursively, filtered by extension, and sorted by their
/// path relative to `dir` so id assignment is deterministic. Dimensions come
/// from image headers; a file whose header cannot be read fails the load.
fn load_images(dir: &Path) -> Result<Vec<ImageRecord>, LabelportError> {
    if !dir.is_dir() {
        return Err(LabelportError::ImageDirInvalid {
            path: dir.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut image_paths = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry.map_err(|source| LabelportError::ImageDirInvalid {
            path: dir.to_path_buf(),
            message: format!("failed while traversing directory: {}", source),
        })?;

        if entry.file_type().is_file() && has_image_extension(entry.path()) {
            image_paths.push(entry.path().to_path_buf());
        }
    }
    image_paths.sort_by_cached_key(|path| rel_string(dir, path));

    let mut images = Vec::with_capacity(image_paths.len());
    for (index, path) in image_paths.iter().enumerate() {
        let (width, height) = read_image_dimensions(path)?;
        images.push(ImageRecord::new(
            (index + 1) as u64,
            rel_string(dir, path),
            width,
            height,
        ));
    }

    Ok(images)
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), LabelportError> {
    let size = imagesize::size(path).map_err(|source| LabelportError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| LabelportError::ImageDirInvalid {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| LabelportError::ImageDirInvalid {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}

fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
