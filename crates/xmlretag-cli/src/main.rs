use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use xmlretag::{
    Category, DeclarationMode, Error, MappingLoader, OverwritePolicy, PipelineConfig, RenameMode,
    TagMapping, WriterConfig, XmlPipeline,
};

#[derive(Debug, Parser)]
#[command(
    name = "xmlretag",
    version,
    about = "Rename XML element tags using a two-column mapping file"
)]
struct Args {
    /// XML file to retag; the result is written next to it as <name>_modified.<ext>
    #[arg(value_name = "XML")]
    xml: Option<PathBuf>,
    /// Mapping file with one `old,new` rule per line
    #[arg(value_name = "MAPPING")]
    mapping: Option<PathBuf>,
    /// What to do when the output file already exists
    #[arg(long, value_enum, default_value_t = OnExisting::Overwrite)]
    on_existing: OnExisting,
    /// Report matching tags without writing anything
    #[arg(long)]
    dry_run: bool,
    /// Fail on mapping lines that are not `old,new` instead of skipping them
    #[arg(long)]
    strict_mapping: bool,
    /// Print the loaded mapping before retagging (included in the report with --json)
    #[arg(long)]
    show_mapping: bool,
    /// Handling of the <?xml ...?> declaration in the output
    #[arg(long, value_enum, default_value_t = DeclarationArg::Preserve)]
    declaration: DeclarationArg,
    /// Print a JSON report instead of the output path
    #[arg(long)]
    json: bool,
    /// More log output (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OnExisting {
    Overwrite,
    Reject,
    Version,
}

impl From<OnExisting> for OverwritePolicy {
    fn from(value: OnExisting) -> Self {
        match value {
            OnExisting::Overwrite => Self::Overwrite,
            OnExisting::Reject => Self::Reject,
            OnExisting::Version => Self::Version,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeclarationArg {
    Preserve,
    Always,
    Omit,
}

impl From<DeclarationArg> for DeclarationMode {
    fn from(value: DeclarationArg) -> Self {
        match value {
            DeclarationArg::Preserve => Self::Preserve,
            DeclarationArg::Always => Self::Always,
            DeclarationArg::Omit => Self::Omit,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_tracing(args: &Args) {
    let default_level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<()> {
    let xml_path = args
        .xml
        .as_deref()
        .ok_or_else(|| Error::input_missing("XML file"))?;
    let mapping_path = args
        .mapping
        .as_deref()
        .ok_or_else(|| Error::input_missing("mapping file"))?;

    let loader = if args.strict_mapping {
        MappingLoader::strict()
    } else {
        MappingLoader::new()
    };
    let (mapping, report) = loader
        .load_with_report(mapping_path)
        .with_context(|| format!("failed to load mapping file {}", mapping_path.display()))?;
    if mapping.is_empty() {
        warn!("mapping file contains no rules, output will match the input");
    }
    if args.show_mapping && !args.json {
        print_mapping(&mapping)?;
    }

    let pipeline = XmlPipeline::with_config(PipelineConfig {
        writer: WriterConfig {
            declaration: args.declaration.into(),
        },
        rename_mode: if args.dry_run {
            RenameMode::DryRun
        } else {
            RenameMode::Apply
        },
        overwrite: args.on_existing.into(),
        ..PipelineConfig::default()
    });
    let outcome = pipeline
        .process_with_report(xml_path, &mapping)
        .with_context(|| format!("failed to retag {}", xml_path.display()))?;

    let mut stdout = io::stdout().lock();
    if args.json {
        let mut mapping_report = serde_json::json!({
            "rules": mapping.len(),
            "skipped_lines": report.skipped,
        });
        if let Some(fields) = mapping_report.as_object_mut().filter(|_| args.show_mapping) {
            fields.insert("entries".to_string(), serde_json::json!(mapping));
        }
        let report = serde_json::json!({
            "output": outcome.output_path,
            "written": outcome.written,
            "stats": outcome.stats,
            "mapping": mapping_report,
        });
        serde_json::to_writer_pretty(&mut stdout, &report).context("failed to write report")?;
        writeln!(stdout).context("failed to write stdout")?;
    } else if outcome.written {
        writeln!(stdout, "{}", outcome.output_path.display()).context("failed to write stdout")?;
    } else {
        writeln!(
            stdout,
            "dry run: {} element(s) would be renamed in {}",
            outcome.stats.renamed,
            outcome.output_path.display()
        )
        .context("failed to write stdout")?;
    }
    Ok(())
}

fn print_mapping(mapping: &TagMapping) -> Result<()> {
    const OLD: &str = "old tag";
    const NEW: &str = "new tag";

    let width = mapping
        .iter()
        .map(|(old, _)| old.chars().count())
        .chain([OLD.len()])
        .max()
        .unwrap_or(OLD.len());

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{OLD:<width$}  {NEW}")?;
    for (old, new) in mapping {
        writeln!(stdout, "{old:<width$}  {new}")?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> u8 {
    let Some(err) = err.downcast_ref::<Error>() else {
        return 1;
    };
    match err.category() {
        Category::Read => 3,
        Category::Parse => 4,
        Category::Write => 5,
        Category::Mapping => 6,
        // 2 is taken by clap for usage errors
        Category::InputMissing => 7,
    }
}
