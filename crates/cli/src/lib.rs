use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use refdoc_navigator::{format_toc, Navigator, TopicView};
use refdoc_protocol::{config_schema, serialize_json_pretty, AppConfig};
use std::io;
use std::path::PathBuf;

mod app;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "refdoc")]
#[command(about = "Reference reader with inline term popovers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: $REFDOC_CONFIG, then ./refdoc.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override content.base_path (directory or http(s) URL prefix)
    #[arg(long, global = true)]
    base_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, render and decorate a topic
    Show(ShowArgs),

    /// Print a topic's table of contents (h2/h3)
    Toc(TocArgs),

    /// List configured topics
    Topics(JsonFlag),

    /// Load topics concurrently and report completion order
    Preload(PreloadArgs),

    /// Find term occurrences in a piece of text
    Scan(ScanArgs),

    /// Print the JSON schema of the config file
    #[command(name = "config-schema")]
    ConfigSchema,
}

#[derive(Args)]
struct ShowArgs {
    /// Topic key
    key: String,

    /// Bypass cache and snapshots
    #[arg(long)]
    no_cache: bool,

    /// Emit JSON (TOC, decoration report and HTML)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TocArgs {
    /// Topic key
    key: String,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct JsonFlag {
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct PreloadArgs {
    /// Keys to load (default: every configured topic)
    keys: Vec<String>,

    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ScanArgs {
    /// Text to scan
    text: String,

    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers.
    let json_output = match &cli.command {
        Commands::Show(args) => args.json,
        Commands::Toc(args) => args.json,
        Commands::Topics(args) => args.json,
        Commands::Preload(args) => args.json,
        Commands::Scan(args) => args.json,
        Commands::ConfigSchema => true,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    if matches!(cli.command, Commands::ConfigSchema) {
        return print_stdout(&config_schema()?);
    }

    let config_path = app::resolve_config_path(cli.config.clone());
    let config = app::load_config(config_path.as_deref(), cli.base_path.as_deref())?;

    match cli.command {
        Commands::Show(args) => {
            let mut nav = app::build_navigator(&config, !args.no_cache).await?;
            run_show(&mut nav, args).await?
        }
        Commands::Toc(args) => {
            let mut nav = app::build_navigator(&config, true).await?;
            run_toc(&mut nav, args).await?
        }
        Commands::Topics(args) => {
            let nav = app::build_navigator(&config, false).await?;
            run_topics(&nav, args)?
        }
        Commands::Preload(args) => run_preload(&config, args).await?,
        Commands::Scan(args) => run_scan(&config, args)?,
        Commands::ConfigSchema => {}
    }

    Ok(())
}

async fn open_topic(nav: &mut Navigator, key: &str, no_cache: bool) -> Result<TopicView> {
    let view = if no_cache {
        nav.retry(key).await?
    } else {
        nav.switch_to(key).await?
    };
    Ok(view)
}

async fn run_show(nav: &mut Navigator, args: ShowArgs) -> Result<()> {
    let view = open_topic(nav, &args.key, args.no_cache).await?;

    if args.json {
        print_stdout(&serialize_json_pretty(&view.summary())?)?;
    } else {
        print_stdout(&view.html())?;
    }

    if view.is_fallback() {
        anyhow::bail!(
            "Topic '{}' unavailable: {}",
            view.key,
            view.error.as_deref().unwrap_or("unknown error")
        );
    }
    log::info!(
        "{}: {} sections, {} term markers",
        view.title,
        view.toc.len(),
        view.decoration.markers
    );
    Ok(())
}

async fn run_toc(nav: &mut Navigator, args: TocArgs) -> Result<()> {
    let view = open_topic(nav, &args.key, false).await?;
    if view.is_fallback() {
        anyhow::bail!(
            "Topic '{}' unavailable: {}",
            view.key,
            view.error.as_deref().unwrap_or("unknown error")
        );
    }

    if args.json {
        print_stdout(&serialize_json_pretty(&view.toc)?)?;
    } else if view.toc.is_empty() {
        eprintln!("No sections in '{}'", view.key);
    } else {
        print_stdout(format_toc(&view.toc).trim_end())?;
    }
    Ok(())
}

fn run_topics(nav: &Navigator, args: JsonFlag) -> Result<()> {
    let tabs = nav.tabs();
    if args.json {
        print_stdout(&serialize_json_pretty(&tabs)?)?;
        return Ok(());
    }
    if tabs.is_empty() {
        eprintln!("No topics configured");
    }
    for tab in &tabs {
        print_stdout(&format!("{:<24} {}", tab.key, tab.title))?;
    }
    Ok(())
}

async fn run_preload(config: &AppConfig, args: PreloadArgs) -> Result<()> {
    let loader = app::build_loader(config)?;
    let keys = if args.keys.is_empty() {
        config.topic_keys()
    } else {
        args.keys
    };
    if keys.is_empty() {
        anyhow::bail!("Nothing to preload: no topics configured");
    }

    let report = loader.preload(&keys).await;

    if args.json {
        print_stdout(&serialize_json_pretty(&report)?)?;
    } else {
        for key in &report.completed {
            let suffix = if report.fallbacks.contains(key) {
                " (fallback)"
            } else {
                ""
            };
            print_stdout(&format!("{key}{suffix}"))?;
        }
        for key in &report.rejected {
            eprintln!("Unknown topic: {key}");
        }
    }

    if !report.rejected.is_empty() || !report.fallbacks.is_empty() {
        anyhow::bail!(
            "Preload incomplete: {} unavailable, {} unknown",
            report.fallbacks.len(),
            report.rejected.len()
        );
    }
    Ok(())
}

fn run_scan(config: &AppConfig, args: ScanArgs) -> Result<()> {
    let registry = app::build_registry(config)?;
    let matches = registry.find_matches(&args.text);

    if args.json {
        print_stdout(&serialize_json_pretty(&matches)?)?;
        return Ok(());
    }
    if matches.is_empty() {
        eprintln!("No terms found");
    }
    for found in &matches {
        let title = registry
            .get(&found.definition_id)
            .map(|def| def.title.as_str())
            .unwrap_or_default();
        print_stdout(&format!(
            "{}..{}\t{}\t{}\t{}",
            found.start, found.end, found.definition_id, found.matched_text, title
        ))?;
    }
    Ok(())
}
