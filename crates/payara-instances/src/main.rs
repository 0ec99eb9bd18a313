use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, bail};
use env_flags::env_flags;

use payara_instances::config::load_user_config;
use payara_instances::logging::{LogSettings, init_tracing};
use payara_instances::{InstanceRegistry, PayaraServerInstance, ServerInstance};

const USAGE: &str = "usage: payara-instances <list | show NAME | add NAME PATH DOMAIN | remove NAME>";

enum Command {
    List,
    Show(String),
    Add {
        name: String,
        path: PathBuf,
        domain: String,
    },
    Remove(String),
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    Ok(match args.as_slice() {
        [] | ["list"] => Command::List,
        ["show", name] => Command::Show(name.to_string()),
        ["add", name, path, domain] => Command::Add {
            name: name.to_string(),
            path: PathBuf::from(path),
            domain: domain.to_string(),
        },
        ["remove", name] => Command::Remove(name.to_string()),
        _ => bail!("{}", USAGE),
    })
}

fn print_instance(out: &mut impl Write, s: &PayaraServerInstance) -> std::io::Result<()> {
    writeln!(out, "{}\t{}\t{}", s.name(), s.path().display(), s.domain_name())
}

/// Apply one command. Listing output goes to `out`; misses are reported on
/// stderr with a failing exit code.
async fn run(
    command: Command,
    registry: &mut InstanceRegistry,
    out: &mut impl Write,
) -> anyhow::Result<ExitCode> {
    match command {
        Command::List => {
            for s in registry.servers() {
                print_instance(out, s)?;
            }
        }
        Command::Show(name) => match registry.server_by_name(&name) {
            Some(s) => print_instance(out, &s)?,
            None => {
                eprintln!("no server named '{}'", name);
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Add { name, path, domain } => {
            let instance = Arc::new(PayaraServerInstance::new(name, path, domain));
            registry.add_server(instance).await;
        }
        Command::Remove(name) => {
            let Some(existing) = registry.server_by_name(&name) else {
                eprintln!("no server named '{}'", name);
                return Ok(ExitCode::FAILURE);
            };
            registry.remove_server(&existing);
            registry.flush().await;
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_flags! {
        /// Home for config.toml and logs. Defaults to $HOME/.payara-instances
        PAYARA_HOME: &str = "";
        /// Per-workspace storage directory for servers.json
        PAYARA_STORAGE_DIR: &str = "";
    }

    let home = if !(*PAYARA_HOME).is_empty() {
        PathBuf::from((*PAYARA_HOME).to_string())
    } else if let Ok(h) = std::env::var("HOME") {
        PathBuf::from(h).join(".payara-instances")
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".payara-instances")
    };

    let user_cfg = load_user_config(&home)?;
    init_tracing(&LogSettings::resolve(
        &home,
        user_cfg.as_ref().and_then(|c| c.logging.as_ref()),
    ));

    let storage_dir = if !(*PAYARA_STORAGE_DIR).is_empty() {
        Some(PathBuf::from((*PAYARA_STORAGE_DIR).to_string()))
    } else {
        user_cfg.as_ref().and_then(|c| c.storage_dir())
    };
    tracing::debug!(
        "storage_dir={}",
        storage_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<temp fallback>".to_string())
    );

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let mut registry = InstanceRegistry::load(storage_dir.as_deref())
        .context("loading server registry")?;

    run(command, &mut registry, &mut std::io::stdout().lock()).await
}
