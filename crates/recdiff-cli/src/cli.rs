use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use recdiff_diff::{ArrayStrategy, ErrorPolicyKind, GeneratorKind};
use recdiff_report::ReportShape;
use recdiff_types::FieldKind;

#[derive(Parser)]
#[command(
    name = "recdiff",
    about = "Structural diff for keyed record catalogs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compare two catalog files
    Diff(DiffArgs),
    /// Show which fields are common, added and removed
    Plan(PlanArgs),
    /// Print the equality digest of every record
    Digest(DigestArgs),
}

/// How catalog files are read.
#[derive(Args, Clone, Debug, Default)]
pub struct LoadArgs {
    /// Key field for array-form catalogs
    #[arg(long)]
    pub key_field: Option<String>,
    /// Force a field kind, e.g. `--kind Tags=sequence`
    #[arg(long = "kind", value_parser = parse_kind_hint)]
    pub kinds: Vec<(String, FieldKind)>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub previous: PathBuf,
    pub current: PathBuf,
    #[command(flatten)]
    pub load: LoadArgs,
    #[arg(long, default_value = "simple")]
    pub shape: ShapeArg,
    #[arg(long)]
    pub strategy: Option<StrategyArg>,
    #[arg(long)]
    pub generator: Option<GeneratorArg>,
    /// Always run the full field diff
    #[arg(long)]
    pub no_shortcut: bool,
    /// Fail keys whose fields switch between scalar and sequence
    #[arg(long)]
    pub reject_shape_changes: bool,
    #[arg(long)]
    pub on_error: Option<ErrorArg>,
    #[arg(long)]
    pub threads: Option<usize>,
    /// TOML file with diff settings; flags take precedence
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    pub previous: PathBuf,
    pub current: PathBuf,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Args)]
pub struct DigestArgs {
    pub file: PathBuf,
    #[command(flatten)]
    pub load: LoadArgs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ShapeArg {
    Simple,
    Extended,
    Flat,
}

impl From<ShapeArg> for ReportShape {
    fn from(arg: ShapeArg) -> Self {
        match arg {
            ShapeArg::Simple => ReportShape::Simple,
            ShapeArg::Extended => ReportShape::Extended,
            ShapeArg::Flat => ReportShape::Flat,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    Ordinal,
    Lcs,
}

impl From<StrategyArg> for ArrayStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Ordinal => ArrayStrategy::Ordinal,
            StrategyArg::Lcs => ArrayStrategy::Lcs,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum GeneratorArg {
    Accessor,
    Token,
}

impl From<GeneratorArg> for GeneratorKind {
    fn from(arg: GeneratorArg) -> Self {
        match arg {
            GeneratorArg::Accessor => GeneratorKind::Accessor,
            GeneratorArg::Token => GeneratorKind::Token,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ErrorArg {
    Abort,
    Skip,
}

impl From<ErrorArg> for ErrorPolicyKind {
    fn from(arg: ErrorArg) -> Self {
        match arg {
            ErrorArg::Abort => ErrorPolicyKind::Abort,
            ErrorArg::Skip => ErrorPolicyKind::Skip,
        }
    }
}

fn parse_kind_hint(s: &str) -> Result<(String, FieldKind), String> {
    let (name, kind) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=KIND, got '{s}'"))?;
    if name.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    let kind = kind.parse::<FieldKind>().map_err(|e| e.to_string())?;
    Ok((name.to_string(), kind))
}
