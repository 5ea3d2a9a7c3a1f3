//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the configured store and print its reference-table sizes.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `filmorate_cli [config.toml]` (defaults to `filmorate.toml`).

use filmorate_core::{
    init_logging, open_store, GenreRepository, RatingRepository, RepoResult,
    SqliteReferenceRepository, StoreConfig, StoreHandle,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;

const DEFAULT_CONFIG_PATH: &str = "filmorate.toml";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("filmorate_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = StoreConfig::load(&config_path)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.effective_log_level(), log_dir)?;
    }

    println!("filmorate_core version={}", filmorate_core::core_version());
    let (genres, ratings) = match open_store(&config)? {
        StoreHandle::Sqlite(conn) => reference_counts(&SqliteReferenceRepository::new(&conn))?,
        StoreHandle::Memory(store) => reference_counts(&store)?,
    };
    info!("event=cli_probe module=cli status=ok genres={genres} ratings={ratings}");
    println!("backend={:?} genres={genres} ratings={ratings}", config.backend);
    Ok(())
}

fn reference_counts<S>(store: &S) -> RepoResult<(usize, usize)>
where
    S: GenreRepository + RatingRepository,
{
    Ok((store.list_genres()?.len(), store.list_ratings()?.len()))
}
