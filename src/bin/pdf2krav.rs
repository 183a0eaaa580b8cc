//! CLI binary for pdf2krav.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, prints extracted questions, and optionally drives the
//! streaming answering API behind a progress bar.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2krav::{
    answer_questions, answer_stream, extract, inspect, write_questions_file, AnswerResult,
    ExtractionConfig, ExtractionOutput,
};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract questions to stdout
  pdf2krav upphandling.pdf

  # Write the question file
  pdf2krav upphandling.pdf -o fragor.txt

  # Extract straight from a tender-portal URL
  pdf2krav https://example.com/ffu-2024-112.pdf -o fragor.txt

  # Inspect PDF metadata (no API key needed)
  pdf2krav --inspect-only upphandling.pdf

  # Answer the first 6 questions as your company
  pdf2krav upphandling.pdf --answer --company-file foretag.txt --limit 6

  # Answer everything with a specific model
  pdf2krav upphandling.pdf --answer --company-file foretag.txt \
      --provider openai --model gpt-4.1-mini

  # JSON output for downstream tooling
  pdf2krav --json upphandling.pdf > fragor.json

SUPPORTED PROVIDERS:
  openai, anthropic, gemini, azure, ollama, and any OpenAI-compatible
  endpoint supported by edgequake-llm. API keys are read from the
  environment (OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, ...).

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Directory holding the pdfium dynamic library

SETUP:
  1. Install pdfium:  download a release from bblanchon/pdfium-binaries
                      and point PDFIUM_LIB_PATH at its directory
  2. Extract:         pdf2krav upphandling.pdf -o fragor.txt
  3. Answer:          export OPENAI_API_KEY=sk-...
                      pdf2krav upphandling.pdf --answer --company-file foretag.txt
"#;

/// Extract requirement questions from procurement PDFs, optionally answering
/// them with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2krav",
    version,
    about = "Extract requirement questions from procurement PDFs and answer them with an LLM",
    long_about = "Extract the requirement questions buried in procurement questionnaire PDFs \
(local files or URLs): recurring page headers/footers are stripped, right-margin category \
markers are lifted onto their own lines, and the text is segmented into question blocks. \
Optionally answer each question as a representative of your company via OpenAI, Anthropic, \
Google Gemini, Azure, or any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Write the question file here instead of printing questions to stdout.
    #[arg(short, long, env = "PDF2KRAV_OUTPUT")]
    output: Option<PathBuf>,

    /// Answer the extracted questions with an LLM.
    #[arg(long, env = "PDF2KRAV_ANSWER")]
    answer: bool,

    /// Path to a text file describing your company (for --answer).
    #[arg(
        long,
        env = "PDF2KRAV_COMPANY_FILE",
        long_help = "Free-form text describing the answering company: services, certifications, \
          staffing, anything the tender answers should draw on. At least 50 characters."
    )]
    company_file: Option<PathBuf>,

    /// Answer only the first N questions.
    #[arg(long, env = "PDF2KRAV_LIMIT")]
    limit: Option<usize>,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, mistral-small-latest).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Number of concurrent LLM calls.
    #[arg(short, long, env = "PDF2KRAV_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2KRAV_PASSWORD")]
    password: Option<String>,

    /// Path to a text file replacing the company-representative system prompt.
    #[arg(long, env = "PDF2KRAV_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Max LLM output tokens per answer.
    #[arg(long, env = "PDF2KRAV_MAX_TOKENS", default_value_t = 1024)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF2KRAV_TEMPERATURE", default_value_t = 0.01)]
    temperature: f32,

    /// Retries per question on LLM failure.
    #[arg(long, env = "PDF2KRAV_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Output structured JSON instead of text.
    #[arg(long, env = "PDF2KRAV_JSON")]
    json: bool,

    /// Disable the answering progress bar.
    #[arg(long, env = "PDF2KRAV_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2KRAV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and results.
    #[arg(short, long, env = "PDF2KRAV_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2KRAV_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Per-question LLM call timeout in seconds.
    #[arg(long = "timeout", env = "PDF2KRAV_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = cli.answer && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            if let Some(ref v) = meta.pdf_version {
                println!("PDF Version:  {}", v);
            }
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Extract ──────────────────────────────────────────────────────────
    let config = build_config(&cli).await?;
    let output = extract(&cli.input, &config)
        .await
        .context("Extraction failed")?;

    if output.questions.is_empty() && !cli.json {
        eprintln!(
            "{} No questions found in {}",
            cyan("⚠"),
            bold(&cli.input)
        );
    }

    if let Some(ref path) = cli.output {
        write_questions_file(&output, path)
            .await
            .context("Failed to write question file")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} questions  {}ms  →  {}",
                green("✔"),
                bold(&output.stats.questions_found.to_string()),
                output.stats.total_duration_ms,
                bold(&path.display().to_string()),
            );
        }
    }

    // ── Answer / print ───────────────────────────────────────────────────
    if cli.answer {
        run_answering(&cli, &config, &output, show_progress).await?;
    } else if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialise output")?
        );
    } else if cli.output.is_none() {
        let text = output.to_text();
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
        if !text.is_empty() && !text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
        if !cli.quiet {
            eprintln!(
                "{} questions from {} pages in {}ms",
                output.stats.questions_found,
                output.stats.total_pages,
                output.stats.total_duration_ms
            );
        }
    }

    Ok(())
}

/// Drive the answering stage: streaming with a progress bar for terminals,
/// eager with combined JSON for `--json`.
async fn run_answering(
    cli: &Cli,
    config: &ExtractionConfig,
    extraction: &ExtractionOutput,
    show_progress: bool,
) -> Result<()> {
    let profile = load_company_profile(cli).await?;

    if cli.json {
        let answers = answer_questions(&extraction.questions, &profile, config)
            .await
            .context("Answering failed")?;
        let combined = serde_json::json!({
            "extraction": extraction,
            "answers": answers,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&combined).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if extraction.questions.is_empty() {
        return Ok(());
    }

    let selected_count = config
        .answer_limit
        .map_or(extraction.questions.len(), |n| {
            n.min(extraction.questions.len())
        });
    let bar = show_progress.then(|| answer_bar(selected_count));

    let mut answers = answer_stream(&extraction.questions, &profile, config)
        .await
        .context("Answering failed")?;

    let mut answered: HashMap<usize, AnswerResult> = HashMap::new();
    let mut failures: HashMap<usize, String> = HashMap::new();

    while let Some(item) = answers.next().await {
        match item {
            Ok(a) => {
                if let Some(ref bar) = bar {
                    let note = if a.skipped {
                        dim("attachment, skipped")
                    } else {
                        dim(&format!("{:>5} chars", a.answer.chars().count()))
                    };
                    bar.println(format!(
                        "  {} Question {:>3}/{:<3}  {}  {}",
                        green("✓"),
                        a.question_index,
                        selected_count,
                        note,
                        dim(&format!("{:.1}s", a.duration_ms as f64 / 1000.0)),
                    ));
                    bar.inc(1);
                }
                answered.insert(a.question_index, a);
            }
            Err(e) => {
                let idx = e.question_index();
                let msg = truncate_msg(&e.to_string(), 80);
                if let Some(ref bar) = bar {
                    bar.println(format!(
                        "  {} Question {:>3}/{:<3}  {}",
                        red("✗"),
                        idx,
                        selected_count,
                        red(&msg),
                    ));
                    bar.inc(1);
                } else {
                    eprintln!("Question {idx} failed: {msg}");
                }
                failures.insert(idx, e.to_string());
            }
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    // Answers in document order, regardless of completion order.
    println!();
    for question in extraction.questions.iter().take(selected_count) {
        println!("{}", bold(question.title()));
        match answered.get(&question.index) {
            Some(a) => println!("{}\n", a.answer),
            None => {
                let reason = failures
                    .get(&question.index)
                    .map(String::as_str)
                    .unwrap_or("(no answer)");
                println!("{}\n", red(reason));
            }
        }
    }

    if !cli.quiet {
        let skipped = answered.values().filter(|a| a.skipped).count();
        let ok = answered.len() - skipped;
        let tokens_in: u64 = answered.values().map(|a| a.input_tokens as u64).sum();
        let tokens_out: u64 = answered.values().map(|a| a.output_tokens as u64).sum();
        let tick = if failures.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        };
        eprintln!(
            "{} {} answered, {} skipped, {} failed",
            tick,
            bold(&ok.to_string()),
            skipped,
            failures.len(),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&tokens_in.to_string()),
            dim(&tokens_out.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {:?}", path))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .concurrency(cli.concurrency)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_retries(cli.max_retries)
        .download_timeout_secs(cli.download_timeout)
        .api_timeout_secs(cli.api_timeout);

    if let Some(n) = cli.limit {
        builder = builder.answer_limit(n);
    }

    let mut config = builder.build().context("Invalid configuration")?;

    // Apply fields the builder doesn't have setters for (or that need special handling)
    config.model = cli.model.clone();
    config.provider_name = cli.provider.clone();
    config.password = cli.password.clone();
    config.system_prompt = system_prompt;

    Ok(config)
}

/// Read the company profile for `--answer`.
async fn load_company_profile(cli: &Cli) -> Result<String> {
    match cli.company_file {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read company profile from {:?}", path)),
        None if cli.system_prompt.is_some() => Ok(String::new()),
        None => anyhow::bail!(
            "--answer needs --company-file (text describing your company) \
             or --system-prompt (full prompt override)"
        ),
    }
}

/// Progress bar for the answering run.
fn answer_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  \
         [{bar:42.green/238}] {pos:>3}/{len} questions  \
         ⏱ {elapsed_precise}  ETA {eta_precise}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix("Answering");
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Truncate a message to `max` characters, appending an ellipsis.
fn truncate_msg(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max - 1).collect();
    format!("{cut}\u{2026}")
}
