use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use quill::core::config;
use quill::term;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "quill", about = "Chat widget core, driven from the terminal")]
struct Args {
    /// Base URL of the query service (overrides QUILL_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// First line the bot types out
    #[arg(long)]
    greeting: Option<String>,

    /// Config file to use instead of ~/.quill/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to quill.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("quill.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = match args.config.as_deref() {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    }
    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let resolved = config::resolve(
        &file_config,
        args.base_url.as_deref(),
        args.greeting.as_deref(),
    );
    log::info!("Quill starting up against {}", resolved.base_url);

    term::run(resolved).await
}
