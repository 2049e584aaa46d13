// SPDX-FileCopyrightText: 2026 FasalDrishti Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FasalDrishti - crop disease diagnosis for Indian farmers.
//!
//! This is the binary entry point for the server and its one-shot tools.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod diagnose;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fasal_config::FasalConfig;

/// FasalDrishti - crop disease diagnosis for Indian farmers.
#[derive(Parser, Debug)]
#[command(name = "fasal", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API and WhatsApp webhook.
    Serve,
    /// Validate configuration and print which backends are enabled.
    CheckConfig,
    /// Diagnose one image and print the JSON result.
    Diagnose {
        /// Path to a JPEG, PNG or WebP photo.
        image: PathBuf,
        /// Reply language code (en, hi, ta, te, kn, bn, mr, pa, gu).
        #[arg(long, default_value = "en")]
        language: String,
        /// Crop the farmer says this is.
        #[arg(long)]
        crop: Option<String>,
    },
}

fn load_config(path: Option<&std::path::Path>) -> FasalConfig {
    let loaded = match path {
        Some(path) => fasal_config::load_and_validate_path(path),
        None => fasal_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            fasal_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::CheckConfig) => {
            serve::print_config_summary(&config);
            Ok(())
        }
        Some(Commands::Diagnose {
            image,
            language,
            crop,
        }) => diagnose::run_diagnose(&config, &image, &language, crop).await,
    };

    if let Err(e) = result {
        eprintln!("fasal: {e}");
        std::process::exit(1);
    }
}
