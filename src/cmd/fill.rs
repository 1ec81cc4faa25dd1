//! Fill command - generate rows for a schema and write them out.

use super::FillArgs;
use crate::config::{Provider, SeederConfig};
use crate::engine::DuckDbEngine;
use crate::filler::{create_schema, fill_schema, insert_data};
use crate::oracle::{ollama, openai, FakeOracle, OllamaOracle, OpenAiOracle, RowOracle};
use crate::progress::FillProgress;
use crate::schema::Schema;
use crate::statement::parse_insert_statements;
use crate::writer::{OutputSink, TableWriter, WriterPool};
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::time::{Duration, Instant};

const DEFAULT_ROWS: u64 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub fn run(args: FillArgs) -> Result<()> {
    if !args.schema.exists() {
        bail!("schema file does not exist: {}", args.schema.display());
    }

    let mut config = match &args.config {
        Some(path) => SeederConfig::load(path)?,
        None => SeederConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let schema_text = fs::read_to_string(&args.schema)
        .with_context(|| format!("Failed to read schema file: {}", args.schema.display()))?;
    let schema = Schema::parse(&schema_text).context("Failed to parse schema")?;
    eprintln!("Parsed {} tables from {}", schema.len(), args.schema.display());

    let mut engine = match &args.database {
        Some(path) => DuckDbEngine::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?,
        None => DuckDbEngine::open_in_memory().context("Failed to open in-memory database")?,
    };
    create_schema(&schema, &mut engine).context("Failed to create schema")?;

    if let Some(path) = &args.example_data {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read example data: {}", path.display()))?;
        let statements = parse_insert_statements(&schema, &text)
            .with_context(|| format!("Failed to parse example data: {}", path.display()))?;
        insert_data(&schema, &statements, &mut engine).context("Failed to load example data")?;
        eprintln!("Loaded {} example statements", statements.len());
    }

    let mut oracle = build_oracle(&config)?;
    let targets = config.targets(DEFAULT_ROWS);
    let options = config.fill_options();

    let pb = if args.progress {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows {msg}",
            )
            .unwrap()
            .progress_chars("█▓▒░  ")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let mut progress = match &pb {
        Some(pb) => {
            let pb = pb.clone();
            FillProgress::with_callback(move |snapshot| {
                pb.set_length(snapshot.rows_target);
                pb.set_position(snapshot.rows_generated);
                pb.set_message(format!(
                    "{} (table {}/{})",
                    snapshot.table, snapshot.tables_completed, snapshot.tables_total
                ));
            })
        }
        None => FillProgress::new(),
    };

    let start_time = Instant::now();
    let generated = fill_schema(
        &schema,
        &mut engine,
        oracle.as_mut(),
        &targets,
        &options,
        &mut progress,
    )
    .context("Failed to fill schema")?;

    if let Some(pb) = &pb {
        pb.finish_with_message("done");
    }

    let mut sink = match (&args.output_dir, &args.output) {
        (Some(dir), _) => {
            let pool = WriterPool::new(dir.clone());
            pool.ensure_output_dir()
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            OutputSink::PerTable(pool)
        }
        (None, Some(path)) => OutputSink::Single(
            TableWriter::new(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?,
        ),
        (None, None) => OutputSink::Single(TableWriter::stdout()),
    };
    let tables_written = sink.write_generated(&generated).context("Failed to write output")?;

    let rows: usize = generated
        .iter()
        .flat_map(|(_, statements)| statements.iter())
        .map(|stmt| stmt.len())
        .sum();

    eprintln!(
        "\nGenerated {} rows for {} tables in {:.3?}",
        rows,
        tables_written,
        start_time.elapsed()
    );
    if let Some(dir) = &args.output_dir {
        eprintln!("Output written to: {}", dir.display());
    } else if let Some(path) = &args.output {
        eprintln!("Output written to: {}", path.display());
    }

    Ok(())
}

/// Command line values win over the config file
fn apply_overrides(config: &mut SeederConfig, args: &FillArgs) {
    if args.rows.is_some() {
        config.default.rows = args.rows;
    }
    if args.examples_per_table.is_some() {
        config.default.examples_per_table = args.examples_per_table;
    }
    if args.max_failures.is_some() {
        config.default.max_consecutive_failures = args.max_failures;
    }
    if args.provider.is_some() {
        config.oracle.provider = args.provider;
    }
    if args.url.is_some() {
        config.oracle.url = args.url.clone();
    }
    if args.model.is_some() {
        config.oracle.model = args.model.clone();
    }
    if args.timeout.is_some() {
        config.oracle.timeout_secs = args.timeout;
    }
    if args.seed.is_some() {
        config.oracle.seed = args.seed;
    }
}

fn build_oracle(config: &SeederConfig) -> Result<Box<dyn RowOracle>> {
    let oracle = &config.oracle;
    let timeout = Duration::from_secs(oracle.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let provider = oracle.provider.unwrap_or_default();

    let boxed: Box<dyn RowOracle> = match provider {
        Provider::Ollama => Box::new(OllamaOracle::new(
            oracle.url.as_deref().unwrap_or(ollama::DEFAULT_URL),
            oracle.model.as_deref().unwrap_or(ollama::DEFAULT_MODEL),
            timeout,
        )),
        Provider::OpenAi => Box::new(OpenAiOracle::from_env(
            oracle.url.as_deref().unwrap_or(openai::DEFAULT_URL),
            oracle.model.as_deref().unwrap_or(openai::DEFAULT_MODEL),
            timeout,
        )?),
        Provider::Fake => Box::new(FakeOracle::new(oracle.seed)),
    };

    eprintln!("Using {} oracle", provider);
    Ok(boxed)
}
