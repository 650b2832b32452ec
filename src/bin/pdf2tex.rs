//! CLI binary for edgequake-pdf2tex.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2tex::{
    convert, ConversionConfig, ConversionOutput, ConversionProgressCallback, Pdf2TexError,
    ProgressCallback, RunMode, Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner naming the running stage, and one
/// log line per finished stage.
struct CliProgressCallback {
    spinner: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        spinner.set_style(style);
        spinner.set_prefix("Preparing");
        spinner.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            spinner,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage, engine: &str) {
        if let Ok(mut t) = self.started.lock() {
            *t = Some(Instant::now());
        }
        self.spinner.reset_elapsed();
        self.spinner.set_prefix(stage_title(stage));
        self.spinner.set_message(engine.to_string());
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        self.spinner.println(format!(
            "  {} {:<10}  {:<12}  {}",
            green("✓"),
            stage_title(stage),
            dim(&format!("{output_len:>7} bytes")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // The full error is printed once by main; keep this line short.
        let first_line = error.lines().next().unwrap_or("");
        self.spinner.println(format!(
            "  {} {:<10}  {}  {}",
            red("✗"),
            stage_title(stage),
            red(first_line),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
    }
}

fn stage_title(stage: Stage) -> &'static str {
    match stage {
        Stage::Extract => "Extracting",
        Stage::SaveText => "Saving",
        Stage::Model => "Generating",
        Stage::Typeset => "Compiling",
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PDF → build/report_SOW.tex → build/report_SOW.pdf
  pdf2tex report.pdf

  # Only generate the .tex, do not compile
  pdf2tex --no-typeset report.pdf

  # Save the extracted text as report.txt and show the model's reply
  pdf2tex --mode text report.pdf

  # Another model, another engine, non-interactive compile
  pdf2tex --model llama3.1 --typesetter lualatex \
          --typesetter-arg=-interaction=nonstopmode report.pdf

  # Convert from URL, machine-readable report
  pdf2tex --json https://arxiv.org/pdf/1706.03762 > run.json

EXTERNAL PROGRAMS:
  Stage      Default     Invocation
  ─────────  ──────────  ─────────────────────────────────────────
  extract    pdftotext   pdftotext <input.pdf> -
  model      ollama      ollama run <model>        (text on stdin)
  typeset    pdflatex    pdflatex <stem>_SOW.tex   (run inside build/)

  On success the typesetter's output is printed to stdout (hidden by -q).

  The default model name `pdf` is expected to be a custom Ollama model
  (ollama create pdf -f Modelfile) whose system prompt asks for LaTeX.

SETUP:
  1. Install poppler-utils, Ollama and a TeX distribution (TeX Live, MiKTeX).
  2. Create the model:  ollama create pdf -f Modelfile
  3. Convert:           pdf2tex report.pdf
"#;

/// Convert PDF files to LaTeX with a local language model.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2tex",
    version,
    about = "Convert a PDF to a LaTeX file using pdftotext and Ollama",
    long_about = "Extract the text of a PDF with pdftotext, turn it into LaTeX with a model \
served by the Ollama CLI, write it to build/<name>_SOW.tex and compile it with pdflatex. \
In text mode, save the extracted text next to the PDF and show the model's reply instead.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the input PDF file (or an HTTP/HTTPS URL).
    pdf_path: String,

    /// Run mode: latex (generate + compile) or text (save text + show reply).
    #[arg(long, env = "PDF2TEX_MODE", value_enum, default_value = "latex")]
    mode: ModeArg,

    /// Model name passed to `<llm-cli> run`.
    #[arg(long, env = "PDF2TEX_MODEL", default_value = "pdf")]
    model: String,

    /// Text-extraction program (pdftotext-compatible).
    #[arg(long, env = "PDF2TEX_EXTRACTOR", default_value = "pdftotext")]
    extractor: String,

    /// Language-model CLI (ollama-compatible).
    #[arg(long, env = "PDF2TEX_LLM_CLI", default_value = "ollama")]
    llm_cli: String,

    /// Typesetting program (pdflatex-compatible).
    #[arg(long, env = "PDF2TEX_TYPESETTER", default_value = "pdflatex")]
    typesetter: String,

    /// Extra argument for the typesetter, placed before the file name. Repeatable.
    #[arg(long = "typesetter-arg", allow_hyphen_values = true)]
    typesetter_args: Vec<String>,

    /// Directory for the generated .tex and the compiler's output.
    #[arg(long, env = "PDF2TEX_BUILD_DIR", default_value = "build")]
    build_dir: PathBuf,

    /// Suffix appended to the PDF's name for the .tex file.
    #[arg(long, env = "PDF2TEX_SUFFIX", default_value = "_SOW")]
    suffix: String,

    /// Language tag whose ```<tag> fence is stripped. Repeatable.
    #[arg(long = "fence-tag", default_values_t = vec!["latex".to_string()])]
    fence_tags: Vec<String>,

    /// Write the .tex but do not run the typesetter.
    #[arg(long, env = "PDF2TEX_NO_TYPESET")]
    no_typeset: bool,

    /// Print the run report as JSON instead of human-readable output.
    #[arg(long, env = "PDF2TEX_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the model reply.
    #[arg(short, long, env = "PDF2TEX_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds (URL inputs).
    #[arg(long, env = "PDF2TEX_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Latex,
    Text,
}

impl From<ModeArg> for RunMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Latex => RunMode::Latex,
            ModeArg::Text => RunMode::Text,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner already reports each stage, so library INFO logs would
    // only interleave with it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build config ─────────────────────────────────────────────────────
    let progress = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress
            .clone()
            .map(|cb| cb as Arc<dyn ConversionProgressCallback>),
    )?;

    // ── Run conversion ───────────────────────────────────────────────────
    let result = convert(&cli.pdf_path, &config).await;
    if let Some(ref cb) = progress {
        cb.finish();
    }

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Pdf2TexError::TypesetFailed { ref stdout, .. } = e {
                // pdflatex reports most errors on stdout; show the tail.
                if !cli.quiet && !stdout.is_empty() {
                    eprintln!("{}", dim(&tail(stdout, 20)));
                }
            }
            return Err(e).context("Conversion failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    match output.mode {
        RunMode::Latex => {
            let (mut out, mut err) = (io::stdout().lock(), io::stderr().lock());
            print_latex_summary(&cli, &output, &mut out, &mut err)
                .context("Failed to write summary")?
        }
        RunMode::Text => print_text_result(&cli, &output)?,
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .mode(cli.mode.into())
        .model(&cli.model)
        .extractor_program(&cli.extractor)
        .model_program(&cli.llm_cli)
        .typesetter_program(&cli.typesetter)
        .typesetter_args(cli.typesetter_args.iter().cloned())
        .build_dir(&cli.build_dir)
        .artifact_suffix(&cli.suffix)
        .fence_tags(cli.fence_tags.iter().cloned())
        .typeset(!cli.no_typeset)
        .download_timeout_secs(cli.download_timeout);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// On success the typesetter's transcript goes to stdout and the summary to
/// stderr. `--quiet` suppresses both.
fn print_latex_summary(
    cli: &Cli,
    output: &ConversionOutput,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<()> {
    if cli.quiet {
        return Ok(());
    }
    if let Some(ref report) = output.typeset {
        writeln!(out, "Output: {}", report.stdout)?;
        writeln!(
            err,
            "{} {} ran successfully  →  {}",
            green("✔"),
            report.engine,
            bold(&output.artifact.with_extension("pdf").display().to_string()),
        )?;
    }
    writeln!(
        err,
        "   {} chars extracted  /  {} bytes of LaTeX  -  {}ms total  →  {}",
        dim(&output.stats.extracted_chars.to_string()),
        dim(&output.stats.artifact_bytes.to_string()),
        output.stats.total_duration_ms,
        bold(&output.artifact.display().to_string()),
    )
}

fn print_text_result(cli: &Cli, output: &ConversionOutput) -> Result<()> {
    if !cli.quiet {
        eprintln!(
            "{} Extracted text saved to {}",
            green("✔"),
            bold(&output.artifact.display().to_string())
        );
    }

    // The model reply is the product of text mode: always on stdout.
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.model_output.as_bytes())
        .context("Failed to write to stdout")?;
    if !output.model_output.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Last `n` lines of `s`.
fn tail(s: &str, n: usize) -> String {
    let lines: Vec<&str> = s.lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}
