//! ragsheet - spreadsheet to retrieval chunk converter

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{error, info, warn};
use rag_sheets::prelude::*;
use rag_sheets::TableAssembler;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ragsheet")]
#[command(
    author,
    version,
    about = "Normalize spreadsheets and split them into retrieval chunks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert spreadsheets into a normalized table and chunk files
    Convert(ConvertArgs),

    /// Show how each sheet normalizes
    Info {
        /// Input spreadsheet file
        input: PathBuf,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Input spreadsheet file
        input: PathBuf,
    },
}

#[derive(Args)]
struct ConvertArgs {
    /// Input files (xlsx, xlsm, csv)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output markup
    #[arg(
        short,
        long,
        value_enum,
        default_value_t = FormatArg::Html,
        env = "RAG_SHEETS_FORMAT"
    )]
    format: FormatArg,

    /// Directory for output files (default: next to each input)
    #[arg(short, long, env = "RAG_SHEETS_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Retrieval keywords for the caption, comma separated
    #[arg(short, long, value_delimiter = ',', env = "RAG_SHEETS_KEYWORDS")]
    keywords: Vec<String>,

    #[command(flatten)]
    chunking: ChunkingArgs,

    /// Leave the generation time out of the context banner
    #[arg(long)]
    no_timestamp: bool,

    /// Print per-sheet chunk statistics as JSON
    #[arg(long)]
    stats: bool,
}

#[derive(Args)]
struct ChunkingArgs {
    /// Maximum data rows per chunk (default 8 when no budget is given)
    #[arg(long, conflicts_with = "max_tokens", env = "RAG_SHEETS_MAX_ROWS")]
    max_rows: Option<usize>,

    /// Maximum estimated tokens per chunk, shared assets included
    #[arg(long, env = "RAG_SHEETS_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Minimum tokens per chunk (token budget only)
    #[arg(long, requires = "max_tokens", env = "RAG_SHEETS_MIN_TOKENS")]
    min_tokens: Option<usize>,

    /// How a chunk with a minimum is filled
    #[arg(
        long,
        value_enum,
        default_value_t = StrategyArg::PreferMax,
        env = "RAG_SHEETS_STRATEGY"
    )]
    strategy: StrategyArg,

    /// Characters per estimated token
    #[arg(
        long,
        default_value_t = rag_sheets::options::DEFAULT_TOKEN_RATIO,
        env = "RAG_SHEETS_TOKEN_RATIO"
    )]
    token_ratio: f64,

    /// Token counting backend
    #[arg(
        long,
        value_enum,
        default_value_t = TokenizerArg::Chars,
        env = "RAG_SHEETS_TOKENIZER"
    )]
    tokenizer: TokenizerArg,

    /// Line placed between chunks in the chunk file
    #[arg(
        long,
        default_value = rag_sheets::options::DEFAULT_SEPARATOR,
        env = "RAG_SHEETS_SEPARATOR"
    )]
    separator: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    #[value(alias = "htm")]
    Html,
    #[value(alias = "md")]
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    PreferMax,
    PreferMin,
}

impl From<StrategyArg> for TokenStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::PreferMax => TokenStrategy::PreferMax,
            StrategyArg::PreferMin => TokenStrategy::PreferMin,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum TokenizerArg {
    /// Character-ratio heuristic
    Chars,
    /// cl100k_base BPE (needs the `tiktoken` feature)
    Cl100k,
}

impl ChunkingArgs {
    fn options(&self) -> ChunkOptions {
        ChunkOptions {
            max_rows: self.max_rows,
            max_tokens: self.max_tokens,
            min_tokens: self.min_tokens,
            strategy: self.strategy.into(),
            token_ratio: self.token_ratio,
            separator: self.separator.clone(),
            ..Default::default()
        }
    }

    fn pipeline(&self, format: OutputFormat) -> Result<Pipeline> {
        let pipeline = Pipeline::new(self.options())
            .context("Invalid chunking options")?
            .with_format(format);

        match self.tokenizer {
            TokenizerArg::Chars => Ok(pipeline),
            #[cfg(feature = "tiktoken")]
            TokenizerArg::Cl100k => {
                let estimator = rag_sheets::TiktokenEstimator::cl100k()
                    .context("Failed to load cl100k tokenizer")?;
                Ok(pipeline.with_estimator(estimator))
            }
            #[cfg(not(feature = "tiktoken"))]
            TokenizerArg::Cl100k => bail!("ragsheet was built without the `tiktoken` feature"),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Convert(args) => convert(&args),
        Commands::Info { input } => show_info(&input),
        Commands::Sheets { input } => list_sheets(&input),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn convert(args: &ConvertArgs) -> Result<()> {
    let pipeline = args.chunking.pipeline(args.format.into())?;

    let mut failed = 0;
    for input in &args.inputs {
        if let Err(err) = convert_one(&pipeline, input, args) {
            error!("{}: {:#}", input.display(), err);
            failed += 1;
        }
    }

    if failed > 0 {
        bail!("{} of {} inputs failed", failed, args.inputs.len());
    }
    Ok(())
}

fn convert_one(pipeline: &Pipeline, input: &Path, args: &ConvertArgs) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut context =
        ConversionContext::new(file_name).with_keywords(args.keywords.iter().cloned());
    if !args.no_timestamp {
        context = context.stamped_now();
    }

    let output = pipeline.run(&workbook, &context);
    if output.sheets.is_empty() {
        warn!("{}: no non-empty sheets", input.display());
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .with_context(|| format!("No file name in '{}'", input.display()))?;
    let dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;

    let ext = output.format.extension();
    let normalized_path = dir.join(format!("{stem}_middle.{ext}"));
    let chunks_path = dir.join(format!("{stem}.{ext}"));

    fs::write(&normalized_path, output.normalized_text())
        .with_context(|| format!("Failed to write '{}'", normalized_path.display()))?;
    fs::write(&chunks_path, output.joined_chunks(&pipeline.options().separator))
        .with_context(|| format!("Failed to write '{}'", chunks_path.display()))?;

    let summary = output.summary();
    info!(
        "Wrote {} chunks from {} sheets to '{}'",
        summary.chunks,
        summary.sheets,
        chunks_path.display()
    );

    if args.stats {
        let sheets: Vec<_> = output
            .sheets
            .iter()
            .map(|sheet| {
                serde_json::json!({
                    "sheet": sheet.sheet_name,
                    "stats": sheet.stats,
                    "warnings": sheet.warnings,
                })
            })
            .collect();
        let report = serde_json::json!({
            "input": input.display().to_string(),
            "summary": summary,
            "sheets": sheets,
            "failures": output.failures,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if !output.failures.is_empty() {
        let names: Vec<&str> = output
            .failures
            .iter()
            .map(|f| f.sheet_name.as_str())
            .collect();
        bail!("Failed sheets: {}", names.join(", "));
    }

    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    println!("File: {}", input.display());
    println!("Sheets: {}", workbook.sheet_count());

    let assembler = TableAssembler::default();
    for (i, sheet) in workbook.worksheets().enumerate() {
        println!();
        println!("  Sheet {}: \"{}\"", i, sheet.name());

        let (rows, cols) = sheet.dimensions();
        println!("    Used range: {} rows x {} columns", rows, cols);
        println!("    Merged regions: {}", sheet.merged_regions().len());

        match assembler.assemble(sheet) {
            Ok(Some(table)) => {
                println!("    Header rows: {}", table.header_row_count);
                println!("    Columns: {}", table.columns.join(" | "));
                println!("    Data rows: {}", table.rows.len());
                println!("    Notes: {}", table.notes.len());
            }
            Ok(None) => println!("    Empty"),
            Err(err) => println!("    Error: {}", err),
        }
    }

    Ok(())
}

fn list_sheets(input: &Path) -> Result<()> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;

    for (i, name) in workbook.sheet_names().iter().enumerate() {
        println!("{}\t{}", i, name);
    }

    Ok(())
}
