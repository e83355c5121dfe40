//! Command dispatch

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::application::services::RenderOptions;
use crate::cli::args::{Cli, Commands, ConfigCommands, FormatArg};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::UserInfo;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the parsed command against the wired services.
///
/// Returns the process exit code for commands that can partially succeed.
pub fn execute(cli: &Cli, container: &ServiceContainer) -> CliResult<i32> {
    match &cli.command {
        Some(Commands::Build {
            input,
            output,
            format,
            user_id,
            name,
            collapsed,
        }) => {
            let identity = (user_id.is_some() || name.is_some())
                .then(|| UserInfo::new(user_id.as_deref(), name.as_deref()));
            let options = render_options(container, *format, *collapsed);
            cmd_build(container, input, output.as_deref(), identity.as_ref(), options)?;
            Ok(crate::exitcode::OK)
        }
        Some(Commands::Batch {
            dir,
            out_dir,
            format,
        }) => {
            let options = render_options(container, *format, false);
            let out_dir = out_dir
                .clone()
                .or_else(|| container.settings.output.dir.clone());
            cmd_batch(container, dir, out_dir.as_deref(), options)
        }
        Some(Commands::Config { command }) => {
            cmd_config(container, command, &config_dir(cli))?;
            Ok(crate::exitcode::OK)
        }
        Some(Commands::Completion { .. }) => Err(CliError::Usage(
            "completion is handled before services are wired".to_string(),
        )),
        None => Err(CliError::Usage(
            "no command given, see --help".to_string(),
        )),
    }
}

/// Directory searched for the local config file.
pub fn config_dir(cli: &Cli) -> PathBuf {
    cli.config_dir
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn render_options(
    container: &ServiceContainer,
    format: Option<FormatArg>,
    collapsed: bool,
) -> RenderOptions {
    RenderOptions {
        format: format
            .map(Into::into)
            .unwrap_or(container.settings.output.format),
        respect_collapse: collapsed || container.settings.output.respect_collapse,
    }
}

#[instrument(level = "debug", skip(container, identity))]
fn cmd_build(
    container: &ServiceContainer,
    input: &Path,
    output: Option<&Path>,
    identity: Option<&UserInfo>,
    options: RenderOptions,
) -> CliResult<()> {
    let conversion = container.mindmap.convert(input, identity, options)?;

    match output {
        Some(path) => {
            container.mindmap.write(path, &conversion.rendered)?;
            info!(nodes = conversion.root.count(), "wrote {}", path.display());
            output::action("Wrote", &path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", conversion.rendered.trim_end())
                .map_err(InfraError::Stdout)?;
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip(container))]
fn cmd_batch(
    container: &ServiceContainer,
    dir: &Path,
    out_dir: Option<&Path>,
    options: RenderOptions,
) -> CliResult<i32> {
    let outcomes = container.batch.convert_dir(dir, out_dir, options)?;
    if outcomes.is_empty() {
        output::warning(&format!("no input documents in {}", dir.display()));
        return Ok(crate::exitcode::OK);
    }

    output::header(&format!("Converted {}", dir.display()));
    let mut failed = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(nodes) => output::success_detail(&format!(
                "{} -> {} ({} nodes)",
                outcome.input.display(),
                outcome.output.display(),
                nodes
            )),
            Err(message) => {
                failed += 1;
                output::failure(&format!("{}: {}", outcome.input.display(), message));
            }
        }
    }

    let converted = outcomes.len() - failed;
    debug!(converted, failed, "batch finished");
    if failed == 0 {
        output::success(&format!("{} documents converted", converted));
        Ok(crate::exitcode::OK)
    } else {
        output::warning(&format!(
            "{} of {} documents failed",
            failed,
            outcomes.len()
        ));
        Ok(crate::exitcode::PARTIAL)
    }
}

fn cmd_config(
    container: &ServiceContainer,
    command: &ConfigCommands,
    local_dir: &Path,
) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!(
                    "global: {}{}",
                    path.display(),
                    existence(&path)
                )),
                None => output::info("global: (no config directory on this platform)"),
            }
            let local = local_config_path(local_dir);
            output::info(&format!("local:  {}{}", local.display(), existence(&local)));
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no config directory on this platform".to_string())
                })?
            } else {
                local_config_path(local_dir)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .and_then(|()| container.fs.write(&path, &Settings::template()))
                .map_err(|source| InfraError::ConfigInit {
                    path: path.clone(),
                    source,
                })?;
            output::action("Created", &path.display());
        }
    }
    Ok(())
}

fn existence(path: &Path) -> &'static str {
    if path.exists() {
        ""
    } else {
        " (not present)"
    }
}
