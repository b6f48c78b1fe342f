//! CLI binary for edgequake-pdf2quiz.
//!
//! A thin shim over the library crate: maps CLI flags to `GenerationConfig`,
//! drives an `Orchestrator` for one document and prints the quiz.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf2quiz::pipeline::input::load_document;
use edgequake_pdf2quiz::{
    render, write_quiz, GeminiClient, GenerationConfig, NoopObserver, Orchestrator,
    OutputFormat, PdfiumExtractor, PipelineFailure, PipelineObserver, QuizData, Screen,
    SessionCredentialStore, SharedObserver, StateKind,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
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

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a spinner while the document is being processed.
///
/// The spinner stays hidden until extraction starts so it never draws over
/// the API key prompt. Each run gets a fresh spinner, since a finished bar
/// does not draw again after a key re-entry.
struct CliObserver {
    bar: Mutex<ProgressBar>,
}

impl CliObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(Self::spinner()),
        })
    }

    fn spinner() -> ProgressBar {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar
    }

    /// Handle to the current spinner.
    fn bar(&self) -> ProgressBar {
        self.bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PipelineObserver for CliObserver {
    fn on_transition(&self, _from: StateKind, to: StateKind) {
        match to {
            StateKind::Extracting => {
                let bar = Self::spinner();
                *self.bar.lock().unwrap_or_else(PoisonError::into_inner) = bar.clone();
                bar.enable_steady_tick(Duration::from_millis(80));
                bar.set_prefix("Extracting");
                bar.set_message("reading PDF text…");
            }
            StateKind::Generating => {
                let bar = self.bar();
                bar.set_prefix("Generating");
                bar.set_message("waiting for Gemini…");
            }
            StateKind::Complete | StateKind::Failed => {
                self.bar().finish_and_clear();
            }
            StateKind::CredentialNeeded | StateKind::Ready => {}
        }
    }

    fn on_text_extracted(&self, chars: usize, clipped: bool) {
        let note = if clipped { "  (clipped)" } else { "" };
        self.bar().println(format!(
            "  {} Extracted {}{}",
            green("✓"),
            dim(&format!("{chars} chars")),
            dim(note)
        ));
    }

    fn on_quiz_generated(&self, quiz: &QuizData) {
        self.bar().println(format!(
            "  {} Generated {} items",
            green("✓"),
            bold(&quiz.total_items().to_string())
        ));
    }

    fn on_failure(&self, failure: &PipelineFailure) {
        self.bar().println(format!("  {} {}", red("✗"), red(&failure.detail)));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Quiz to stdout
  pdf2quiz lecture.pdf

  # Save the text export
  pdf2quiz lecture.pdf -o lecture-quiz.txt

  # JSON output, more questions
  pdf2quiz --json --mc 10 --tf 10 --sa 5 notes.pdf > quiz.json

  # From a URL
  pdf2quiz https://arxiv.org/pdf/1706.03762 -o attention.txt

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (prompted for when missing)
  PDF2QUIZ_MODEL          Override model ID (default: gemini-2.5-flash)
  PDF2QUIZ_BASE_URL       Override the Gemini endpoint base URL
  PDFIUM_LIB_PATH         Path to an existing libpdfium
"#;

/// Generate quizzes and topic summaries from PDF files with Gemini.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2quiz",
    version,
    about = "Generate quizzes and topic summaries from PDF files with Gemini",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Gemini API key. Prompted for interactively when missing.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Write the quiz to this file instead of stdout.
    #[arg(short, long, env = "PDF2QUIZ_OUTPUT")]
    output: Option<PathBuf>,

    /// Gemini model ID.
    #[arg(long, env = "PDF2QUIZ_MODEL")]
    model: Option<String>,

    /// Service base URL.
    #[arg(long, env = "PDF2QUIZ_BASE_URL")]
    base_url: Option<String>,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "PDF2QUIZ_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Characters of document text sent to the model.
    #[arg(long, env = "PDF2QUIZ_MAX_CHARS", default_value_t = 30_000)]
    max_chars: usize,

    /// Number of multiple-choice questions.
    #[arg(long = "mc", env = "PDF2QUIZ_MC", default_value_t = 5)]
    multiple_choice: usize,

    /// Number of true/false questions.
    #[arg(long = "tf", env = "PDF2QUIZ_TF", default_value_t = 5)]
    true_false: usize,

    /// Number of short-answer questions.
    #[arg(long = "sa", env = "PDF2QUIZ_SA", default_value_t = 3)]
    short_answer: usize,

    /// Generation request timeout in seconds (none by default).
    #[arg(long, env = "PDF2QUIZ_TIMEOUT")]
    timeout: Option<u64>,

    /// HTTP download timeout in seconds for URL input.
    #[arg(long, env = "PDF2QUIZ_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Output QuizData JSON instead of the text export.
    #[arg(long, env = "PDF2QUIZ_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2QUIZ_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2QUIZ_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2QUIZ_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out
    // of its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && io::stderr().is_terminal();
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

    let config = build_config(&cli)?;
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let document = load_document(&cli.input, config.download_timeout_secs)
        .await
        .with_context(|| format!("Failed to read {}", cli.input))?;

    let observer: SharedObserver = if show_progress {
        CliObserver::new() as SharedObserver
    } else {
        Arc::new(NoopObserver)
    };

    let store = match cli.api_key.as_deref() {
        Some(key) => SessionCredentialStore::with_credential(key),
        None => SessionCredentialStore::new(),
    };
    let generator =
        Arc::new(GeminiClient::new(config.clone()).context("Failed to create Gemini client")?);
    let mut orchestrator = Orchestrator::new(store, Arc::new(PdfiumExtractor::new()), generator)
        .with_observer(observer);

    let interactive = io::stdin().is_terminal();

    // ── Drive the state machine ──────────────────────────────────────────
    loop {
        match orchestrator.state().kind() {
            StateKind::CredentialNeeded => {
                if !interactive {
                    anyhow::bail!(
                        "API Key is missing. Pass --api-key or set GEMINI_API_KEY."
                    );
                }
                let key = prompt_for_key()?;
                if let Err(e) = orchestrator.submit_credential(key) {
                    eprintln!("{}", red(&e.to_string()));
                }
            }
            StateKind::Ready => {
                orchestrator
                    .select_file(document.clone())
                    .context("Failed to select document")?;
            }
            StateKind::Extracting | StateKind::Generating => {
                orchestrator.run().await;
            }
            StateKind::Failed => {
                let rejected = orchestrator
                    .state()
                    .failure()
                    .map(|f| f.credential_rejected)
                    .unwrap_or(false);
                if !(rejected && interactive) {
                    break;
                }
                if let Screen::Error { message, .. } = orchestrator.state().screen() {
                    eprintln!("{} {}", cyan("⚠"), message);
                }
                orchestrator
                    .retry_credential()
                    .context("Failed to reset the API key")?;
            }
            StateKind::Complete => break,
        }
    }

    // ── Present the result ───────────────────────────────────────────────
    let error = orchestrator.take_error();
    match orchestrator.state().screen() {
        Screen::Results(quiz) => {
            let quiz = quiz.clone();
            emit(&cli, &quiz, format).await?;
            if !cli.quiet {
                print_summary(&quiz);
            }
            Ok(())
        }
        Screen::NoContent => {
            anyhow::bail!("content could not be generated from this document")
        }
        Screen::Error { message, .. } => {
            let message = message.to_string();
            match error {
                Some(err) => Err(anyhow::Error::new(err).context(message)),
                None => Err(anyhow::anyhow!(message)),
            }
        }
        other => anyhow::bail!("pipeline stopped unexpectedly: {:?}", other),
    }
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .temperature(cli.temperature)
        .max_input_chars(cli.max_chars)
        .multiple_choice_count(cli.multiple_choice)
        .true_false_count(cli.true_false)
        .short_answer_count(cli.short_answer)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(url);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }

    builder.build().context("Invalid configuration")
}

/// Ask for the API key on stderr and read one line from stdin.
fn prompt_for_key() -> Result<String> {
    eprint!("{} ", bold("Gemini API Key:"));
    io::stderr().flush().ok();
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read API key from stdin")?;
    if read == 0 {
        anyhow::bail!("API Key is missing. Please provide a valid key.");
    }
    Ok(line.trim().to_string())
}

async fn emit(cli: &Cli, quiz: &QuizData, format: OutputFormat) -> Result<()> {
    if let Some(ref path) = cli.output {
        write_quiz(quiz, path, format)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if !cli.quiet {
            eprintln!("{} Saved to {}", green("✔"), bold(&path.display().to_string()));
        }
        return Ok(());
    }

    let body = render(quiz, format).context("Failed to render quiz")?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(body.as_bytes())
        .context("Failed to write to stdout")?;
    if !body.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn print_summary(quiz: &QuizData) {
    eprintln!(
        "{} {} multiple choice · {} true/false · {} short answer · {} topics",
        green("✔"),
        bold(&quiz.multiple_choice.len().to_string()),
        bold(&quiz.true_false.len().to_string()),
        bold(&quiz.short_answer.len().to_string()),
        bold(&quiz.topic_summaries.len().to_string()),
    );
    let issues = quiz.integrity_issues();
    if !issues.is_empty() {
        eprintln!("{}", dim(&format!("   {} item(s) look inconsistent:", issues.len())));
        for issue in issues {
            eprintln!("   {}", dim(&issue));
        }
    }
}
