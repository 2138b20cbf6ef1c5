// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Build automation and offline tools for the Vesta workspace.
//! Run with: cargo xtask <command>

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask", version, about = "Vesta build automation", long_about = None)]
struct Cli {
    /// Print debug logs.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build all crates in the workspace
    Build,
    /// Run all tests in the workspace
    Test,
    /// Run `cargo check` on all crates
    Check,
    /// Format all code in the workspace
    #[command(alias = "format")]
    Fmt {
        /// Only verify formatting
        #[arg(long)]
        check: bool,
    },
    /// Run clippy with warnings as errors
    Clippy,
    /// Run build, test, check, fmt and clippy
    All,
    /// Shader cache tools
    ShaderCache {
        #[command(subcommand)]
        command: ShaderCacheCommands,
    },
}

#[derive(Subcommand)]
enum ShaderCacheCommands {
    /// List the entries of a persisted shader cache
    Inspect {
        /// Path to the cache file
        file: PathBuf,
    },
    /// Compile every shader under an asset root into its cache
    Warm {
        /// The asset root
        asset_root: PathBuf,
        /// Cache location, relative to the asset root
        #[arg(long, default_value = "cache/shaders.bin")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Build => commands::ci::build(),
        Commands::Test => commands::ci::test(),
        Commands::Check => commands::ci::check(),
        Commands::Fmt { check } => commands::ci::format(check),
        Commands::Clippy => commands::ci::clippy(),
        Commands::All => commands::ci::all(),
        Commands::ShaderCache { command } => match command {
            ShaderCacheCommands::Inspect { file } => commands::shader_cache::inspect(&file),
            ShaderCacheCommands::Warm { asset_root, output } => {
                commands::shader_cache::warm(&asset_root, &output)
            }
        },
    }
}
