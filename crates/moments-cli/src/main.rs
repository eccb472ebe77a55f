//! Moments CLI - share photo moments with a group from the terminal.
//!
//! Every subcommand is a stateless render over the sync core: it reads the
//! remote folder tree, applies one action, and prints the result.

use std::io::{self, Write};
use std::path::Path;

use clap::{CommandFactory, Parser};
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};
use moments_core::auth::SessionPersistence;

mod cli;
mod commands;
mod error;
mod session;

use cli::{Cli, Commands, CompletionShell};
use session::SessionStore;
use commands::auth_cmd::{run_login, run_logout, run_whoami};
use commands::common::CliContext;
use commands::groups::{run_groups, run_members};
use commands::posts::{run_caption, run_delete_post, run_post, run_posts};
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("moments=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let context = CliContext::from_cli(cli.demo, cli.store_path)?;

    let result = dispatch(cli.command, &context).await;

    if let Err(error) = &result {
        if let Ok(store) = context.session_store() {
            if clear_session_on_unauthorized(error, &store) {
                eprintln!("Session cleared; sign in again with `moments login`.");
            }
        }
    }

    result
}

/// A rejected credential invalidates the whole session: clear the remembered
/// identity so the next invocation starts from auth. Returns whether the
/// session was cleared.
fn clear_session_on_unauthorized(error: &CliError, store: &SessionStore) -> bool {
    if !error.is_unauthorized() {
        return false;
    }
    tracing::warn!("credential rejected by the provider; clearing the remembered session");
    let _ = store.clear();
    true
}

async fn dispatch(command: Commands, context: &CliContext) -> Result<(), CliError> {
    match command {
        Commands::Login { token, remember } => run_login(token, remember, context).await,
        Commands::Logout => run_logout(context),
        Commands::Whoami { json } => run_whoami(json, context),
        Commands::Groups { command } => run_groups(command, context).await,
        Commands::Members { command } => run_members(command, context).await,
        Commands::Posts { command } => run_posts(command, context).await,
        Commands::Post {
            group,
            images,
            caption,
        } => run_post(&group, &images, &caption, context).await,
        Commands::Caption {
            group,
            post,
            caption,
        } => run_caption(&group, &post, &caption, context).await,
        Commands::DeletePost { group, post } => run_delete_post(&group, &post, context).await,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref()),
    }
}

fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let mut command = Cli::command();
    let mut buffer = Vec::new();

    match shell {
        CompletionShell::Bash => generate_for_shell(shells::Bash, &mut command, &mut buffer),
        CompletionShell::Zsh => generate_for_shell(shells::Zsh, &mut command, &mut buffer),
        CompletionShell::Fish => generate_for_shell(shells::Fish, &mut command, &mut buffer),
    }

    if let Some(path) = output_path {
        std::fs::write(path, &buffer)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(&buffer)?;
    }

    Ok(())
}

fn generate_for_shell<G: Generator>(
    generator: G,
    command: &mut clap::Command,
    buffer: &mut Vec<u8>,
) {
    generate(generator, command, "moments", buffer);
}
