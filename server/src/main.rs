// Snippets
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Command line entry point to the snippets service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use clap::{Parser, Subcommand};
use snippets_server::{Config, StoreConfig, create_user, serve};
use std::error::Error;
use std::io::{self, BufRead};
use std::process::ExitCode;

/// Code snippets REST service with syntax highlighting.
///
/// The service is configured via `SNIPPETS_*` environment variables.
#[derive(Debug, Parser)]
#[command(version)]
struct Cli {
    /// Command to run; defaults to `serve`.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Subcommands of the program.
#[derive(Debug, Subcommand)]
enum Command {
    /// Runs the HTTP service.
    Serve,

    /// Creates a user account, reading its password from the first line of stdin.
    CreateUser {
        /// Name of the user to create.
        username: String,
    },
}

/// Reads the first line of stdin without its line terminator.
fn read_password() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Runs the `command` and returns any error to the caller.
async fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Serve => serve(Config::from_env()?).await,
        Command::CreateUser { username } => {
            let store = StoreConfig::from_env()?;
            let password = read_password()?;
            create_user(store, &username, password).await
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli.command.unwrap_or(Command::Serve)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("snippets-server: {}", e);
            ExitCode::FAILURE
        }
    }
}
