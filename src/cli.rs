use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Reconcile base and follow-up record datasets field by field",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Merge a follow-up dataset into a base dataset
    Merge(MergeArgs),
    /// Run the pre-merge dataset checks without merging
    Validate(ValidateArgs),
    /// List the effective merge policy for every known field
    Policies(PoliciesArgs),
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Base dataset (a file, or a directory searched for the newest run)
    #[arg(short = 'b', long = "base")]
    pub base: PathBuf,
    /// Follow-up dataset (a file, or a directory searched for the newest run)
    #[arg(short = 'f', long = "followup")]
    pub followup: PathBuf,
    /// File name prefix used when --base is a directory
    #[arg(long = "base-prefix", default_value = "base")]
    pub base_prefix: String,
    /// File name prefix used when --followup is a directory
    #[arg(long = "followup-prefix", default_value = "followup")]
    pub followup_prefix: String,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct MergeArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    /// Output file or directory (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// YAML file overriding or extending the built-in field policies
    #[arg(short = 'p', long = "policies")]
    pub policies: Option<PathBuf>,
    /// Merge but do not write any output
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
}

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    /// YAML file overriding or extending the built-in field policies
    #[arg(short = 'p', long = "policies")]
    pub policies: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
