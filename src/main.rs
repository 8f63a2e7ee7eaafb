use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use regex::Regex;
use tracing::info;
use url::Url;

use block_importer::blocks::{self, Pattern};
use block_importer::dom::{self, Document};
use block_importer::importer::{self, ImportOutcome};
use block_importer::settings::Settings;
use block_importer::table::{CellSnapshot, MatrixSnapshot};

static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[derive(Parser)]
#[command(name = "block_importer", about = "Convert legacy page fragments into block tables")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert saved pages using the configured rules
    Import {
        /// HTML files to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Rules file (TOML, YAML or JSON)
        #[arg(short, long)]
        rules: Option<PathBuf>,
        /// Output directory (default: print to stdout, single file only)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Page URL that relative links and images resolve against
        #[arg(long)]
        base_url: Option<String>,
        /// Also emit a JSON report per page
        #[arg(long)]
        report: bool,
    },
    /// Show the tables a pattern would produce, without converting anything
    Inspect {
        file: PathBuf,
        #[arg(short, long)]
        pattern: Pattern,
        /// Fragment selector (default: the pattern's usual location)
        #[arg(short, long)]
        selector: Option<String>,
        #[arg(long)]
        base_url: Option<String>,
        /// Print matrices as JSON
        #[arg(long)]
        json: bool,
    },
    /// List known patterns
    Patterns,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Import {
            files,
            rules,
            out,
            base_url,
            report,
        } => {
            let mut settings = Settings::load(rules.as_deref())?;
            if base_url.is_some() {
                settings.base_url = base_url;
                settings.parsed_base_url()?;
            }
            if settings.rules.is_empty() {
                println!("No rules configured. Pass --rules FILE; see `patterns` for selectors.");
                return Ok(());
            }
            info!(rules = settings.rules.len(), files = files.len(), "starting import");

            match out {
                None if files.len() == 1 => {
                    let html = fs::read_to_string(&files[0])
                        .with_context(|| format!("reading {}", files[0].display()))?;
                    let outcome = importer::import_html(&html, &settings)?;
                    println!("{}", outcome.html);
                    if report {
                        eprintln!("{}", serde_json::to_string_pretty(&outcome.report)?);
                    }
                    Ok(())
                }
                None => bail!("--out is required when converting more than one file"),
                Some(dir) => import_pages(&files, &dir, &settings, report),
            }
        }
        Commands::Inspect {
            file,
            pattern,
            selector,
            base_url,
            json,
        } => inspect(&file, pattern, selector.as_deref(), base_url.as_deref(), json),
        Commands::Patterns => {
            println!("{:<16} | {:<8} | {}", "Pattern", "Header", "Usual selector");
            println!("{}", "-".repeat(48));
            for pattern in Pattern::ALL {
                println!(
                    "{:<16} | {:<8} | {}",
                    pattern.name(),
                    pattern.kind().header(),
                    pattern.default_selector()
                );
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

struct ImportCounts {
    pages: usize,
    page_errors: usize,
    converted: usize,
    skipped: usize,
    failed: usize,
}

impl ImportCounts {
    fn print(&self) {
        println!(
            "Wrote {} pages ({} errored): {} blocks converted, {} skipped, {} failed.",
            self.pages, self.page_errors, self.converted, self.skipped, self.failed,
        );
    }
}

/// Where each input lands under `out`: its path below the deepest directory
/// all inputs share, so `a/index.html` and `b/index.html` stay apart.
fn output_paths(files: &[PathBuf], out: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let parents: Vec<Vec<Component>> = files
        .iter()
        .map(|file| file.parent().unwrap_or(Path::new("")).components().collect())
        .collect();
    let shared = match parents.split_first() {
        Some((first, rest)) => rest.iter().fold(first.len(), |len, other| {
            first
                .iter()
                .zip(other)
                .take(len)
                .take_while(|(a, b)| a == b)
                .count()
        }),
        None => 0,
    };

    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    files
        .iter()
        .map(|file| {
            let relative: PathBuf = file
                .components()
                .skip(shared)
                .filter(|c| matches!(c, Component::Normal(_)))
                .collect();
            if relative.as_os_str().is_empty() {
                bail!("{} has no file name", file.display());
            }
            let target = out.join(relative);
            if let Some(previous) = claimed.insert(target.clone(), file.as_path()) {
                bail!(
                    "{} and {} would both be written to {}",
                    previous.display(),
                    file.display(),
                    target.display()
                );
            }
            Ok(target)
        })
        .collect()
}

/// Pages are independent documents, so each one is parsed, converted and
/// serialized on its own worker.
fn import_pages(files: &[PathBuf], out: &Path, settings: &Settings, report: bool) -> anyhow::Result<()> {
    let targets = output_paths(files, out)?;
    fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let results: Vec<(&PathBuf, anyhow::Result<ImportOutcome>)> = files
        .par_iter()
        .map(|path| {
            let outcome = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))
                .and_then(|html| importer::import_html(&html, settings));
            pb.inc(1);
            (path, outcome)
        })
        .collect();
    pb.finish_and_clear();

    let mut counts = ImportCounts {
        pages: 0,
        page_errors: 0,
        converted: 0,
        skipped: 0,
        failed: 0,
    };

    for ((path, outcome), target) in results.into_iter().zip(targets) {
        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("{}: {:#}", path.display(), e);
                counts.page_errors += 1;
                continue;
            }
        };
        if let Some(dir) = target.parent() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        fs::write(&target, &outcome.html).with_context(|| format!("writing {}", target.display()))?;
        if report {
            let report_path = target.with_extension("report.json");
            fs::write(&report_path, serde_json::to_string_pretty(&outcome.report)?)
                .with_context(|| format!("writing {}", report_path.display()))?;
        }
        counts.pages += 1;
        counts.converted += outcome.report.converted();
        counts.skipped += outcome.report.skipped();
        counts.failed += outcome.report.failed();
    }

    counts.print();
    Ok(())
}

fn inspect(
    file: &Path,
    pattern: Pattern,
    selector: Option<&str>,
    base_url: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let html = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let base_url = base_url.map(Url::parse).transpose().context("invalid --base-url")?;
    let doc = Document::parse(&html).with_base_url(base_url);
    let selector = selector.unwrap_or(pattern.default_selector());

    let fragments = dom::query_all(doc.root(), selector)?;
    if fragments.is_empty() {
        println!("No fragments match `{}`.", selector);
        return Ok(());
    }

    let snapshots = fragments
        .iter()
        .map(|fragment| blocks::extract(pattern, fragment, &doc).map(|m| m.snapshot()))
        .collect::<Result<Vec<MatrixSnapshot>, _>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshots)?);
        return Ok(());
    }

    for (i, snapshot) in snapshots.iter().enumerate() {
        println!(
            "#{} {} ({} data rows)",
            i + 1,
            snapshot.header,
            snapshot.rows.len()
        );
        for row in &snapshot.rows {
            let cells: Vec<String> = row.iter().map(|cell| truncate(&cell_text(cell), 40)).collect();
            println!("  | {} |", cells.join(" | "));
        }
    }
    Ok(())
}

fn cell_text(cell: &CellSnapshot) -> String {
    match cell {
        CellSnapshot::Text { text } => WS_RE.replace_all(text, " ").into_owned(),
        CellSnapshot::Markup { html } | CellSnapshot::Node { html } => {
            WS_RE.replace_all(html.trim(), " ").into_owned()
        }
        CellSnapshot::Empty => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
