//! CLI binary for drg-figures.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints the extraction summary.

use anyhow::{Context, Result};
use clap::Parser;
use drg_figures::{
    extract, format_bytes, ExtractionConfig, ExtractionOutcome, ExtractionProgressCallback,
    ProgressCallback, SkipReason,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── Terminal styling ─────────────────────────────────────────────────────────

/// SGR styles used in status lines. Plain text when stderr is not a terminal.
#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Warn,
    Note,
    Faint,
    Strong,
}

impl Tone {
    fn sgr(self) -> &'static str {
        match self {
            Tone::Ok => "32",
            Tone::Warn => "33",
            Tone::Note => "36",
            Tone::Faint => "2",
            Tone::Strong => "1",
        }
    }

    fn paint(self, text: impl std::fmt::Display) -> String {
        if io::stderr().is_terminal() {
            format!("\x1b[{}m{text}\x1b[0m", self.sgr())
        } else {
            text.to_string()
        }
    }
}

// ── Figure progress bar ──────────────────────────────────────────────────────

/// Progress over figure nodes, with one line per written or skipped figure
/// printed above the bar.
struct CliProgressCallback {
    bar: ProgressBar,
    skipped: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_extraction_start` reports the figure count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Reading document…");
        bar.enable_steady_tick(Duration::from_millis(100));

        Arc::new(Self {
            bar,
            skipped: AtomicUsize::new(0),
        })
    }

    fn show_count(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_style(
            ProgressStyle::with_template("{prefix:.bold} {wide_bar:.cyan/blue} {pos}/{len}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        self.bar.set_prefix("Figures");
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, total_figures: usize) {
        self.show_count(total_figures);
        self.bar.println(format!(
            "{} {} figure nodes",
            Tone::Note.paint("»"),
            Tone::Strong.paint(total_figures)
        ));
    }

    fn on_figure_accepted(&self, _index: usize, autonum: &str, format: &str) {
        self.bar.set_message(format!("{autonum} [{format}]"));
        self.bar.inc(1);
    }

    fn on_figure_skipped(&self, reason: &SkipReason) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
        self.bar.println(format!(
            "  {} {}",
            Tone::Warn.paint("skip"),
            Tone::Faint.paint(reason)
        ));
        self.bar.inc(1);
    }

    fn on_figure_written(&self, autonum: &str, filename: &str, bytes: usize) {
        self.bar.println(format!(
            "  {} {filename} {}",
            Tone::Ok.paint("wrote"),
            Tone::Faint.paint(format!("(figure {autonum}, {})", format_bytes(bytes as u64))),
        ));
    }

    fn on_extraction_complete(&self, total_figures: usize, extracted: usize) {
        self.bar.finish_and_clear();
        match self.skipped.load(Ordering::Relaxed) {
            0 => eprintln!(
                "{} {} figures extracted",
                Tone::Ok.paint("done"),
                Tone::Strong.paint(extracted)
            ),
            skipped => eprintln!(
                "{} {}/{total_figures} figures extracted, {} skipped",
                Tone::Warn.paint("done"),
                Tone::Strong.paint(extracted),
                Tone::Warn.paint(skipped),
            ),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract into a directory named after the document (e.g. 17301_dis_ed3/)
  drg-figures document.presentation.xml

  # Explicit output directory and prefix
  drg-figures document.xml -o figures -p iso17301_

  # One ZIP archive in the current directory
  drg-figures document.xml --zip

  # Keep the original image names as a suffix
  drg-figures document.xml --retain-original-filenames

  # Machine-readable report
  drg-figures document.xml --json > report.json

NAMING:
  With a complete bibliographic block (number, edition, stage) figures are
  named per ISO DRG, e.g. 17301_dis_ed3figA1.png. Otherwise the fallback
  {prefix}fig{autonum}.{ext} is used, e.g. figurefigA1.png.

ENVIRONMENT VARIABLES:
  RUST_LOG                Override the log filter (e.g. drg_figures=debug)
  DRG_FIGURES_*           Every flag has an alias, e.g. DRG_FIGURES_ZIP=true
"#;

/// Extract figures from Metanorma XML with ISO DRG filenames.
#[derive(Parser, Debug)]
#[command(
    name = "drg-figures",
    version,
    about = "Extract figures from Metanorma XML with ISO DRG-compliant filenames",
    long_about = "Extract embedded figures (base64 data URIs and inline SVG) from a Metanorma \
XML document and write them as individual files or one ZIP archive, named according to the \
ISO DRG graphic-file naming convention.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Metanorma XML document.
    #[arg(value_name = "INPUT_XML")]
    input: PathBuf,

    /// Output directory. Default: a directory named after the prefix, or the
    /// current directory with --zip.
    #[arg(short, long = "output-dir", env = "DRG_FIGURES_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Filename prefix. Default: derived from document metadata, else "figure".
    #[arg(short, long, env = "DRG_FIGURES_PREFIX")]
    prefix: Option<String>,

    /// Package the figures as {prefix}.zip instead of loose files.
    #[arg(long, env = "DRG_FIGURES_ZIP")]
    zip: bool,

    /// Report skipped figures as warnings and enable DEBUG-level logs.
    #[arg(short, long, env = "DRG_FIGURES_VERBOSE")]
    verbose: bool,

    /// Do not derive the prefix from document metadata.
    #[arg(long, env = "DRG_FIGURES_NO_AUTO_PREFIX")]
    no_auto_prefix: bool,

    /// Append the original image filename to each generated name.
    #[arg(long, env = "DRG_FIGURES_RETAIN_ORIGINAL_FILENAMES")]
    retain_original_filenames: bool,

    /// Print the report as JSON instead of the summary block.
    #[arg(long, env = "DRG_FIGURES_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DRG_FIGURES_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DRG_FIGURES_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level milestones; warnings still show.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.verbose;
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else if show_progress {
        "warn"
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
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run extraction ───────────────────────────────────────────────────
    let outcome = extract(
        &cli.input,
        cli.output_dir.as_deref(),
        cli.prefix.as_deref(),
        &config,
    )
    .with_context(|| format!("Extraction failed for {}", cli.input.display()))?;

    if cli.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to serialise report")?;
        println!("{json}");
        return Ok(());
    }
    if cli.quiet {
        return Ok(());
    }

    match outcome {
        ExtractionOutcome::NoFigures => {
            eprintln!("{} No figures found in the document", Tone::Note.paint("»"));
        }
        ExtractionOutcome::Extracted(report) => {
            println!("\n{report}");
            println!(
                "\nSuccessfully extracted {} figures to {}",
                report.total_figures,
                report.output_location().display()
            );
        }
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .archive(cli.zip)
        .verbose(cli.verbose)
        .auto_prefix(!cli.no_auto_prefix)
        .retain_original_filenames(cli.retain_original_filenames);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
