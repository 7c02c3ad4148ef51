use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::component::{MetricsComponent, TracingComponent};
use crate::config::{AppConfig, RuntimeConfig};
use crate::dispatcher::{Dispatcher, DispatcherBuilder};
use crate::logging::{init_logging, LogConfig};
use crate::server::{AppService, HttpServer};

/// Command-line interface of an actionwire application
///
/// The binary supplies its controllers; the CLI supplies configuration,
/// logging, the runtime and the server.
#[derive(Parser)]
#[command(name = "actionwire")]
#[command(about = "actionwire application server", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Serve the application over HTTP
    Serve {
        /// YAML configuration file
        #[arg(short, long, env = "ACTIONWIRE_CONFIG")]
        config: Option<PathBuf>,

        /// Listen address; overrides `server.addr`
        #[arg(long, env = "ACTIONWIRE_ADDR")]
        addr: Option<String>,

        /// Template directory; overrides `templates.dir`
        #[arg(long)]
        templates: Option<PathBuf>,
    },
    /// Validate the configuration and templates, print the mounted
    /// controllers, then exit
    Check {
        /// YAML configuration file
        #[arg(short, long, env = "ACTIONWIRE_CONFIG")]
        config: Option<PathBuf>,

        /// Template directory; overrides `templates.dir`
        #[arg(long)]
        templates: Option<PathBuf>,
    },
}

/// Load the config file (or defaults) and apply command-line overrides.
pub(crate) fn load_config(path: Option<&Path>, templates: Option<&Path>) -> anyhow::Result<AppConfig> {
    let mut config = match path {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = templates {
        config.templates.dir = Some(dir.to_path_buf());
    }
    Ok(config)
}

/// Builder carrying the built-in global components and the config file.
fn base_builder(config: &AppConfig, metrics: &Arc<MetricsComponent>) -> anyhow::Result<DispatcherBuilder> {
    let builder = Dispatcher::builder()
        .global_component(Arc::new(TracingComponent))
        .global_component(Arc::clone(metrics) as Arc<dyn crate::component::Component>)
        .apply_config(config)?;
    Ok(builder)
}

/// Run the parsed CLI. `install` mounts the application's controllers and
/// registers its own components and views on the builder.
pub fn run_cli<F>(cli: Cli, install: F) -> anyhow::Result<()>
where
    F: FnOnce(DispatcherBuilder) -> anyhow::Result<DispatcherBuilder>,
{
    match cli.command {
        Commands::Serve {
            config,
            addr,
            templates,
        } => {
            let config = load_config(config.as_deref(), templates.as_deref())?;
            let _log_guard = init_logging(&LogConfig::from_env())?;

            let mut runtime = RuntimeConfig::from_env();
            if let Some(stack_size) = config.server.stack_size {
                runtime.stack_size = stack_size;
            }
            runtime.apply();
            info!(stack_size = runtime.stack_size, "Coroutine runtime configured");

            let metrics = Arc::new(MetricsComponent::new());
            let dispatcher = install(base_builder(&config, &metrics)?)?.build()?;
            let service = AppService::new(Arc::new(dispatcher)).with_metrics(metrics);

            let addr = addr.unwrap_or_else(|| config.server.addr.clone());
            let handle = HttpServer(service)
                .start(addr.as_str())
                .with_context(|| format!("failed to bind {addr}"))?;
            handle.wait_ready()?;
            info!(addr = %handle.addr(), "Server listening");

            wait_for_shutdown(handle)
        }
        Commands::Check { config, templates } => {
            let config = load_config(config.as_deref(), templates.as_deref())?;
            let metrics = Arc::new(MetricsComponent::new());
            let dispatcher = install(base_builder(&config, &metrics)?)?.build()?;

            println!("templates: {}", dispatcher.templates().template_names().len());
            println!("views: {}", dispatcher.views().names().join(", "));
            println!("default layout: {}", dispatcher.default_layout().unwrap_or("-"));
            for mount in dispatcher.mounts() {
                let chain = dispatcher.chain_for(mount).unwrap_or_default();
                println!("{mount} -> [{}]", chain.join(", "));
            }
            Ok(())
        }
    }
}

#[cfg(unix)]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        warn!(signal = signal, "Shutdown signal received");
    }
    handle.stop();
    info!("Server stopped");
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: crate::server::ServerHandle) -> anyhow::Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server coroutine panicked: {e:?}"))
}
