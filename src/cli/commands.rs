//! Command dispatch: maps CLI commands onto the config service.

use std::io::{self, Read};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::IoResultExt;
use crate::cli::args::{Cli, Commands, ConfigCommands, EncodingArgs, WriteArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        Some(Commands::Config { command }) => run_config(cli, command),
        Some(command) => {
            let container = ServiceContainer::new(load_settings(cli)?);
            match command {
                Commands::Get { path, encoding } => cmd_get(&container, path.as_deref(), encoding),
                Commands::Put(args) => cmd_write(&container, args, false),
                Commands::Post(args) => cmd_write(&container, args, true),
                Commands::Delete { path } => cmd_delete(&container, path.as_deref()),
                Commands::Tree { path } => cmd_tree(&container, path.as_deref()),
                Commands::Config { .. } | Commands::Completion { .. } => Ok(()),
            }
        }
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(store) = &cli.store {
        settings.store_path = store.clone();
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

#[instrument(skip(container))]
fn cmd_get(container: &ServiceContainer, path: Option<&str>, encoding: &EncodingArgs) -> CliResult<()> {
    let format = encoding.resolve(container.settings.default_format)?;
    let text = container.config.get(path.unwrap_or_default(), format)?;
    output::info(text.trim_end());
    Ok(())
}

#[instrument(skip(container))]
fn cmd_write(container: &ServiceContainer, args: &WriteArgs, post: bool) -> CliResult<()> {
    let format = args.encoding.resolve(container.settings.default_format)?;
    let body = read_body(args.input.as_deref())?;
    let path = args.path.as_deref().unwrap_or_default();
    if post {
        container.config.post(path, format, &body)?;
    } else {
        container.config.put(path, format, &body)?;
    }
    output::success(&format!("stored /{}", path.trim_start_matches('/')));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_delete(container: &ServiceContainer, path: Option<&str>) -> CliResult<()> {
    let path = path.unwrap_or_default();
    container.config.delete(path)?;
    output::success(&format!("deleted /{}", path.trim_start_matches('/')));
    Ok(())
}

#[instrument(skip(container))]
fn cmd_tree(container: &ServiceContainer, path: Option<&str>) -> CliResult<()> {
    let tree = container.config.tree(path.unwrap_or_default())?;
    output::info(&tree);
    Ok(())
}

fn run_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(settings.to_toml()?.trim_end());
        }
        ConfigCommands::Template => output::info(Settings::template().trim_end()),
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::action("global", &path.display()),
            None => {
                return Err(CliError::Usage(
                    "no config directory available on this platform".to_string(),
                ))
            }
        },
    }
    Ok(())
}

/// Request body from a file or, without one, from stdin.
fn read_body(input: Option<&Path>) -> CliResult<String> {
    match input {
        Some(path) => Ok(std::fs::read_to_string(path).with_path_context("read input", path)?),
        None => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .map_err(|e| InfraError::io("read stdin", e))?;
            Ok(body)
        }
    }
}
