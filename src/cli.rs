//! Command-line surface: argument parsing and pipeline wiring.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::domain::DocumentStatus;
use crate::error::Result;
use crate::extract::codes::RegexCodeExtractor;
use crate::extract::DocumentTextExtractor;
use crate::fsops::{DiskFileRepository, SafeFileManager};
use crate::manifest::XlsxManifestRepository;
use crate::organize::{LotOrganizer, OrganizeOptions};
use crate::ports::{CodeExtractor, ContentExtractor, FileSystemManager};
use crate::resolve::profiles::ExtractionProfiles;
use crate::resolve::{ExceptionResolver, ResolutionPolicy};
use crate::template::XlsxTemplateFiller;
use crate::validate::{BatchValidation, BatchValidator};

#[derive(Debug, Parser)]
#[command(
    name = "doclot",
    version,
    about = "Validates document batches against a manifest and organizes them into lots"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check which files in a directory match the manifest
    Validate(ValidateArgs),
    /// Validate, resolve exceptions by content, and assemble output lots
    Organize(OrganizeArgs),
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Manifest workbook (.xlsx)
    #[arg(long)]
    pub manifest: PathBuf,

    /// Directory holding the incoming files
    #[arg(long)]
    pub source: PathBuf,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Manifest workbook (.xlsx)
    #[arg(long)]
    pub manifest: PathBuf,

    /// Directory holding the incoming files
    #[arg(long)]
    pub source: PathBuf,

    /// Directory that will receive the lot folders
    #[arg(long)]
    pub output: PathBuf,

    /// Master template copied into every lot
    #[arg(long)]
    pub template: PathBuf,

    /// Document groups per lot; 0 puts everything in one lot
    #[arg(long, default_value_t = 10)]
    pub max_docs_per_lot: usize,

    /// Sequence number of the first lot
    #[arg(long, default_value_t = 1)]
    pub start_sequence: u32,

    /// Lot directory name; XXXX becomes the zero-padded sequence
    #[arg(long, default_value = "LOTE_XXXX")]
    pub lot_name_pattern: String,

    /// Extraction profile for content-based resolution
    #[arg(long, default_value = "RIR")]
    pub profile: String,

    /// JSON file with extraction profiles, replacing the built-in set
    #[arg(long)]
    pub profiles_file: Option<PathBuf>,

    /// What to do when an extracted code has no manifest row
    #[arg(long, value_enum, default_value_t = PolicyArg::Permissive)]
    pub policy: PolicyArg,

    /// Skip content-based resolution of unrecognized files
    #[arg(long)]
    pub no_resolve: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    /// Fail resolution when the extracted code has no manifest row
    Strict,
    /// Accept containment matches and unmatched extracted codes
    Permissive,
}

impl From<PolicyArg> for ResolutionPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Strict => ResolutionPolicy::Strict,
            PolicyArg::Permissive => ResolutionPolicy::Permissive,
        }
    }
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Validate(args) => cmd_validate(args),
        Command::Organize(args) => cmd_organize(args),
    }
}

#[derive(Serialize)]
struct ValidationSummary {
    manifest_items: usize,
    validated: usize,
    unrecognized: usize,
    unrecognized_files: Vec<String>,
}

fn summarize(validation: &BatchValidation) -> ValidationSummary {
    ValidationSummary {
        manifest_items: validation.manifest.len(),
        validated: validation.validated.len(),
        unrecognized: validation.unrecognized.len(),
        unrecognized_files: validation
            .unrecognized
            .iter()
            .map(|file| file.file_name())
            .collect(),
    }
}

fn cmd_validate(args: ValidateArgs) -> Result<ExitCode> {
    let validator = BatchValidator::new(XlsxManifestRepository::new(), DiskFileRepository::new());
    let validation = validator.execute(&args.manifest, &args.source)?;
    let summary = summarize(&validation);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_default()
        );
    } else {
        println!("manifest items: {}", summary.manifest_items);
        println!("validated:      {}", summary.validated);
        println!("unrecognized:   {}", summary.unrecognized);
        for name in &summary.unrecognized_files {
            println!("  {name}");
        }
    }

    Ok(if summary.unrecognized == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_organize(args: OrganizeArgs) -> Result<ExitCode> {
    let validator = BatchValidator::new(XlsxManifestRepository::new(), DiskFileRepository::new());
    let mut validation = validator.execute(&args.manifest, &args.source)?;

    if !args.no_resolve && !validation.unrecognized.is_empty() {
        let profiles = match &args.profiles_file {
            Some(path) => ExtractionProfiles::load(path)?,
            None => ExtractionProfiles::load_default_or_builtin(),
        };
        let resolver = ExceptionResolver::new(
            DocumentTextExtractor::new(),
            RegexCodeExtractor::new(profiles),
            SafeFileManager::new(),
        )
        .with_policy(args.policy.into());

        resolve_concurrently(&resolver, &mut validation, &args.profile);
    }

    let organizer = LotOrganizer::new(
        SafeFileManager::new(),
        XlsxTemplateFiller::new(SafeFileManager::new()),
    );
    let options = OrganizeOptions {
        max_docs_per_lot: args.max_docs_per_lot,
        start_sequence: args.start_sequence,
        lot_name_pattern: args.lot_name_pattern.clone(),
    };
    let result = organizer.organize(validation.validated, &args.output, &args.template, &options);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).unwrap_or_default()
        );
    } else {
        println!("{}", result.message);
        if !validation.unrecognized.is_empty() {
            println!(
                "left unresolved in the source directory: {}",
                validation.unrecognized.len()
            );
            for file in &validation.unrecognized {
                println!("  {}", file.file_name());
            }
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Resolves every unrecognized file on its own thread, then graduates the
/// ones that now carry a status the organizer accepts.
fn resolve_concurrently<C, X, F>(
    resolver: &ExceptionResolver<C, X, F>,
    validation: &mut BatchValidation,
    profile: &str,
) where
    C: ContentExtractor + Sync,
    X: CodeExtractor + Sync,
    F: FileSystemManager + Sync,
{
    let manifest = &validation.manifest;
    std::thread::scope(|scope| {
        for file in validation.unrecognized.iter_mut() {
            scope.spawn(move || {
                if let Err(e) = resolver.resolve(file, profile, manifest) {
                    tracing::warn!(file = %file.file_name(), error = %e, "resolution failed");
                }
            });
        }
    });

    let files = std::mem::take(&mut validation.unrecognized);
    let (resolved, unresolved): (Vec<_>, Vec<_>) = files.into_iter().partition(|file| {
        matches!(
            file.status,
            DocumentStatus::Validated | DocumentStatus::Recognized
        )
    });
    validation.validated.extend(resolved);
    validation.unrecognized = unresolved;
}
