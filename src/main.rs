mod report;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use futures::future::join_all;
use geolens_core::{
    AnalysisReport, Analyzer, Capabilities, HttpFetcher, Settings, create_comparison_payload,
};
use tracing_subscriber::EnvFilter;
use url::Url;

use report::{OutputFormat, render_check_line, render_comparison, render_report};

const APP_NAME: &str = "geolens";
const VERSION: &str = env!("CARGO_PKG_VERSION");
const MAX_COMPARE_URLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Analyze,
    Check,
    Compare,
}

#[derive(Debug)]
struct CliOptions {
    mode: Mode,
    urls: Vec<String>,
    format: OutputFormat,
    save_target: Option<PathBuf>,
    draft: bool,
    verbose: bool,
}

#[derive(Debug)]
enum CliCommand {
    Run(CliOptions),
    Help,
    Version,
}

fn parse_arguments(args: &[String]) -> Result<CliCommand> {
    if args.is_empty() {
        return Ok(CliCommand::Help);
    }

    let mut mode = Mode::Analyze;
    let mut urls: Vec<String> = Vec::new();
    let mut format: Option<OutputFormat> = None;
    let mut save_target: Option<PathBuf> = None;
    let mut draft = false;
    let mut verbose = false;
    let mut i = 0;

    match args[0].as_str() {
        "check" => {
            mode = Mode::Check;
            i = 1;
        }
        "compare" => {
            mode = Mode::Compare;
            i = 1;
        }
        _ => {}
    }

    while i < args.len() {
        let arg = &args[i];

        if matches!(arg.as_str(), "-h" | "--help") {
            return Ok(CliCommand::Help);
        }

        if matches!(arg.as_str(), "-v" | "--version") {
            return Ok(CliCommand::Version);
        }

        if matches!(arg.as_str(), "-V" | "--verbose") {
            verbose = true;
            i += 1;
            continue;
        }

        if arg == "--draft" {
            draft = true;
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-o" | "--output") {
            if format.is_some() {
                return Err(anyhow!("--output specified multiple times"));
            }
            let value = args
                .get(i + 1)
                .ok_or_else(|| anyhow!("{arg} requires a value: cli, json or markdown"))?;
            format = Some(value.parse()?);
            i += 2;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--output=") {
            if format.is_some() {
                return Err(anyhow!("--output specified multiple times"));
            }
            format = Some(value.parse()?);
            i += 1;
            continue;
        }

        if let Some(value) = arg.strip_prefix("--save=") {
            if save_target.is_some() {
                return Err(anyhow!("--save specified multiple times"));
            }
            save_target = Some(save_path(value));
            i += 1;
            continue;
        }

        if matches!(arg.as_str(), "-s" | "--save") {
            if save_target.is_some() {
                return Err(anyhow!("--save specified multiple times"));
            }
            let next_is_path = !urls.is_empty()
                && args
                    .get(i + 1)
                    .map(|next| !next.starts_with('-'))
                    .unwrap_or(false);

            if next_is_path {
                save_target = Some(PathBuf::from(args[i + 1].clone()));
                i += 2;
            } else {
                save_target = Some(PathBuf::from("."));
                i += 1;
            }
            continue;
        }

        if arg.starts_with('-') {
            return Err(anyhow!("unknown flag: {arg}"));
        }

        let single_url = mode != Mode::Compare;
        if (single_url && !urls.is_empty()) || urls.len() == MAX_COMPARE_URLS {
            return Err(anyhow!("unexpected additional argument: {arg}"));
        }
        urls.push(arg.clone());
        i += 1;
    }

    match mode {
        Mode::Compare if urls.len() < 2 => {
            return Err(anyhow!("compare needs at least two URLs"));
        }
        _ if urls.is_empty() => return Err(anyhow!("missing <url> argument")),
        _ => {}
    }

    for url in &urls {
        Url::parse(url).with_context(|| format!("invalid URL: {url}"))?;
    }

    Ok(CliCommand::Run(CliOptions {
        mode,
        urls,
        format: format.unwrap_or(OutputFormat::Cli),
        save_target,
        draft,
        verbose,
    }))
}

fn save_path(value: &str) -> PathBuf {
    if value.is_empty() {
        PathBuf::from(".")
    } else {
        PathBuf::from(value)
    }
}

fn print_help() {
    println!("{APP_NAME} - GEO and SEO scoring for web pages");
    println!("Usage: {APP_NAME} [OPTIONS] <URL>");
    println!("       {APP_NAME} check <URL>");
    println!("       {APP_NAME} compare <URL> <URL> [URL]\n");
    println!("Options:");
    println!("  -o, --output FORMAT     Output format: cli (default), json, markdown");
    println!("  -s, --save [PATH]       Save the report to a file or directory");
    println!("      --draft             Skip AI crawler accessibility checks");
    println!("  -V, --verbose           Log progress to stderr");
    println!("  -v, --version           Show version information");
    println!("  -h, --help              Show this help message\n");
    println!("Exits with status 1 when the grade is D or F.");
}

fn print_version() {
    println!("{APP_NAME} {VERSION}");
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("geolens=debug,geolens_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("geolens=warn,geolens_core=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw_args = env::args().skip(1).collect::<Vec<_>>();
    let options = match parse_arguments(&raw_args)? {
        CliCommand::Run(options) => options,
        CliCommand::Help => {
            print_help();
            return Ok(());
        }
        CliCommand::Version => {
            print_version();
            return Ok(());
        }
    };

    init_tracing(options.verbose);
    tracing::debug!(mode = ?options.mode, urls = options.urls.len(), "starting");

    let settings = Settings::from_env();
    let capabilities = Capabilities::probe(&settings);
    let fetcher = HttpFetcher::new(&settings.fetcher, &settings.access)
        .context("failed to build HTTP client")?;
    let analyzer = Analyzer::new(settings, capabilities, fetcher);

    let failing = match options.mode {
        Mode::Analyze => run_analyze(&analyzer, &options).await?,
        Mode::Check => run_check(&analyzer, &options).await?,
        Mode::Compare => run_compare(&analyzer, &options).await?,
    };

    if failing {
        std::process::exit(1);
    }

    Ok(())
}

async fn analyze_one(
    analyzer: &Analyzer<HttpFetcher>,
    url: &str,
    draft: bool,
) -> Result<AnalysisReport> {
    analyzer
        .analyze(url, draft)
        .await
        .with_context(|| format!("failed to analyze {url}"))
}

async fn run_analyze(analyzer: &Analyzer<HttpFetcher>, options: &CliOptions) -> Result<bool> {
    let url = &options.urls[0];
    let report = analyze_one(analyzer, url, options.draft).await?;
    let output = render_report(&report, options.format)?;

    print!("{output}");
    if let Some(save_base) = options.save_target.as_ref() {
        save_output(save_base, url, "", options.format, &output)?;
    }

    Ok(report.geo.geo_score.grade.is_failing())
}

async fn run_check(analyzer: &Analyzer<HttpFetcher>, options: &CliOptions) -> Result<bool> {
    let report = analyze_one(analyzer, &options.urls[0], options.draft).await?;
    println!("{}", render_check_line(&report));
    Ok(report.geo.geo_score.grade.is_failing())
}

async fn run_compare(analyzer: &Analyzer<HttpFetcher>, options: &CliOptions) -> Result<bool> {
    let ids: Vec<String> = (1..=options.urls.len()).map(|n| format!("u{n}")).collect();

    let analyses = join_all(
        options
            .urls
            .iter()
            .map(|url| analyze_one(analyzer, url, options.draft)),
    )
    .await;

    let mut urls = Vec::with_capacity(ids.len());
    let mut results = Vec::with_capacity(ids.len());
    for ((id, url), analysis) in ids.iter().zip(&options.urls).zip(analyses) {
        let report = analysis?;
        urls.push((id.clone(), url.clone()));
        results.push((
            id.clone(),
            serde_json::to_value(&report).context("failed to serialize report")?,
        ));
    }

    let payload = create_comparison_payload(&urls, &results)?;
    let output = render_comparison(&payload, options.format)?;

    print!("{output}");
    if let Some(save_base) = options.save_target.as_ref() {
        save_output(save_base, &options.urls[0], "compare", options.format, &output)?;
    }

    let failing = payload
        .comparison
        .summary
        .winner
        .as_ref()
        .and_then(|winner| payload.comparison.summary.grades.get(winner))
        .map(|grade| matches!(grade.as_str(), "D" | "F"))
        .unwrap_or(true);

    Ok(failing)
}

fn save_output(
    save_base: &Path,
    url: &str,
    prefix: &str,
    format: OutputFormat,
    output: &str,
) -> Result<()> {
    let parsed_url = Url::parse(url).context("invalid URL")?;
    let output_path = build_output_path(save_base, &parsed_url, prefix, format);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }

    fs::write(&output_path, output.as_bytes())
        .with_context(|| format!("failed to write output file {}", output_path.display()))?;

    eprintln!("Wrote output to {}", output_path.display());
    Ok(())
}

fn build_output_path(base: &Path, url: &Url, prefix: &str, format: OutputFormat) -> PathBuf {
    let has_extension = base
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case(format.extension()))
        .unwrap_or(false);

    if has_extension {
        base.to_path_buf()
    } else {
        base.join(derive_output_filename(url, prefix, format))
    }
}

fn derive_output_filename(url: &Url, prefix: &str, format: OutputFormat) -> String {
    let host = url.host_str().unwrap_or("page");
    let mut path_component = url.path().trim_matches('/').replace('/', "_");
    if path_component.is_empty() {
        path_component = "index".to_string();
    }

    let mut parts = Vec::new();
    if !prefix.is_empty() {
        parts.push(prefix.to_string());
    }
    parts.push(sanitize_for_filename(host));
    parts.push(sanitize_for_filename(&path_component));

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        parts.push(sanitize_for_filename(query));
    }

    format!("{}.{}", parts.join("__"), format.extension())
}

fn sanitize_for_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
