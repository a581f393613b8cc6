pub mod cell;
pub mod cli;
pub mod codec;
pub mod dataset;
pub mod dataset_merge;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod io_utils;
pub mod policy;
pub mod record_merge;
pub mod strategy;
pub mod table;
pub mod validation;

use std::{env, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, error, info};
use sha2::{Digest, Sha256};

use crate::{
    cli::{Cli, Commands, InputArgs},
    dataset::Dataset,
    diagnostics::MergeDiagnostics,
    error::MergerError,
    policy::PolicyRegistry,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("record_merge", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Merge(args) => handle_merge(&args),
        Commands::Validate(args) => handle_validate(&args),
        Commands::Policies(args) => handle_policies(&args),
    };
    if let Err(err) = &result {
        if let Some(merge_err) = err.chain().find_map(|e| e.downcast_ref::<MergerError>()) {
            error!("Merge aborted [{}]", merge_err.code());
        }
    }
    result
}

struct LoadedInputs {
    base: Dataset,
    followup: Dataset,
    base_path: PathBuf,
    base_delimiter: u8,
}

fn load_inputs(args: &InputArgs) -> Result<LoadedInputs> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let base_path = discovery::resolve_input(&args.base, &args.base_prefix)
        .with_context(|| format!("Resolving base input {:?}", args.base))?;
    let followup_path = discovery::resolve_input(&args.followup, &args.followup_prefix)
        .with_context(|| format!("Resolving followup input {:?}", args.followup))?;

    let base_delimiter = io_utils::resolve_input_delimiter(&base_path, args.delimiter);
    let followup_delimiter = io_utils::resolve_input_delimiter(&followup_path, args.delimiter);
    info!(
        "Loading base {:?} and followup {:?} with delimiter '{}'",
        base_path,
        followup_path,
        printable_delimiter(base_delimiter)
    );

    let base = Dataset::load(&base_path, base_delimiter, encoding)
        .with_context(|| format!("Loading base dataset {base_path:?}"))?;
    let followup = Dataset::load(&followup_path, followup_delimiter, encoding)
        .with_context(|| format!("Loading followup dataset {followup_path:?}"))?;
    Ok(LoadedInputs {
        base,
        followup,
        base_path,
        base_delimiter,
    })
}

fn load_registry(path: Option<&PathBuf>) -> Result<PolicyRegistry> {
    match path {
        Some(path) => PolicyRegistry::load_with_overrides(path),
        None => Ok(PolicyRegistry::builtin()),
    }
}

fn handle_merge(args: &cli::MergeArgs) -> Result<()> {
    let registry = load_registry(args.policies.as_ref())?;
    debug!("Using {} field policies", registry.len());
    let inputs = load_inputs(&args.inputs)?;

    let label = inputs
        .base_path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merge".to_string());
    let mut diagnostics = MergeDiagnostics::new(label);
    let merged = dataset_merge::merge_datasets(
        &inputs.base,
        &inputs.followup,
        &registry,
        &mut diagnostics,
    )?;
    diagnostics.log_summary();

    if args.dry_run {
        info!(
            "Dry run: {} merged row(s) not written",
            merged.row_count()
        );
        return Ok(());
    }

    let output = args
        .output
        .as_deref()
        .filter(|path| !io_utils::is_dash(path))
        .map(|path| discovery::resolve_output(path, chrono::Local::now().naive_local()));
    let delimiter = io_utils::resolve_output_delimiter(output.as_deref(), inputs.base_delimiter);
    let bytes = merged.to_csv_bytes(delimiter)?;
    let digest = Sha256::digest(&bytes);
    io_utils::write_output(output.as_deref(), &bytes)?;

    let destination = output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!(
        "Wrote {} merged row(s) to {} (sha256 {:x})",
        merged.row_count(),
        destination,
        digest
    );
    Ok(())
}

fn handle_validate(args: &cli::ValidateArgs) -> Result<()> {
    let inputs = load_inputs(&args.inputs)?;
    dataset_merge::validate_datasets(&inputs.base, &inputs.followup)?;
    info!(
        "✓ {} followup row(s) can be merged into {} base row(s)",
        inputs.followup.row_count(),
        inputs.base.row_count()
    );
    Ok(())
}

fn handle_policies(args: &cli::PoliciesArgs) -> Result<()> {
    let registry = load_registry(args.policies.as_ref())?;
    print!("{}", table::render_policy_table(&registry));
    info!("Listed {} field policies", registry.len());
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
