//! ebangla-epub - eBangla Library to EPUB converter

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ebangla_epub::{ConvertConfig, Converter, Inspection};

#[derive(Parser)]
#[command(name = "ebangla-epub")]
#[command(version, about = "Convert eBangla Library books to EPUB", long_about = None)]
#[command(after_help = "EXAMPLES:
    ebangla-epub https://www.ebanglalibrary.com/books/some-book/
    ebangla-epub https://www.ebanglalibrary.com/books/some-book/ -o book.epub
    ebangla-epub -i --json https://www.ebanglalibrary.com/books/some-book/")]
struct Cli {
    /// URL of the book on ebanglalibrary.com
    #[arg(value_name = "URL")]
    url: String,

    /// Output file (default: derived from the book title)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    timeout: u64,

    /// User-Agent header for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Show book metadata and chapter list without converting
    #[arg(short, long)]
    info: bool,

    /// Print --info output as JSON
    #[arg(long, requires = "info")]
    json: bool,

    /// Only print warnings and errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print debug output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "warn"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> ebangla_epub::Result<()> {
    let mut config = ConvertConfig::default().with_timeout(Duration::from_secs(cli.timeout));
    if let Some(ua) = &cli.user_agent {
        config = config.with_user_agent(ua);
    }
    let converter = Converter::new(config)?;

    if cli.info {
        let inspection = converter.inspect(&cli.url)?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&inspection)?);
        } else {
            show_info(&inspection);
        }
        return Ok(());
    }

    let path = converter.convert(&cli.url, cli.output.as_deref())?;
    println!("EPUB created: {}", path.display());
    Ok(())
}

fn show_info(inspection: &Inspection) {
    let meta = &inspection.metadata;
    println!("URL: {}", meta.source_url);
    println!("Title: {}", meta.title);
    if let Some(subtitle) = &meta.subtitle {
        println!("Subtitle: {subtitle}");
    }
    if let Some(editors) = &meta.editors {
        println!("Editors: {editors}");
    }
    if let Some(ack) = &meta.acknowledgments {
        println!("Acknowledgments: {ack}");
    }
    if let Some(cover) = &meta.cover_image_url {
        println!("Cover: {cover}");
    }
    println!("Layout: {:?}", inspection.layout);
    println!("Chapters: {}", inspection.chapters.len());
    for (i, chapter) in inspection.chapters.iter().enumerate() {
        match chapter.url() {
            Some(url) => println!("  {:>3}. {} <{url}>", i + 1, chapter.title),
            None => println!("  {:>3}. {}", i + 1, chapter.title),
        }
    }
}
