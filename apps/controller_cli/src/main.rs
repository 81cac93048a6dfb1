use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{ControlChannelClient, NetworkSetupSession, StdoutSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Talk to an M Squared EMM controller over its WebSocket pages")]
struct Cli {
    /// TOML settings file; `controller.toml` is read when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ControllerArgs {
    #[arg(long)]
    host: Option<String>,
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send the tune command once and print every message the controller sends back.
    Tune {
        #[command(flatten)]
        controller: ControllerArgs,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        wavelength: Option<f64>,
        #[arg(long)]
        step: Option<f64>,
    },
    /// Register this computer's address in the controller's network settings.
    SetRemoteIp {
        #[command(flatten)]
        controller: ControllerArgs,
        #[arg(long)]
        ip: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    init_tracing(&settings.log_filter);

    match cli.command {
        Command::Tune {
            controller,
            path,
            wavelength,
            step,
        } => {
            controller.apply(&mut settings);
            if let Some(v) = path {
                settings.control_path = v;
            }
            if let Some(v) = wavelength {
                settings.wavelength_nm = v;
            }
            if let Some(v) = step {
                settings.wavelength_step_nm = v;
            }
            tune(&settings).await
        }
        Command::SetRemoteIp { controller, ip } => {
            controller.apply(&mut settings);
            if let Some(v) = ip {
                settings.remote_ip_address = Some(v);
            }
            set_remote_ip(&settings).await
        }
    }
}

impl ControllerArgs {
    fn apply(self, settings: &mut Settings) {
        if let Some(v) = self.host {
            settings.controller_host = v;
        }
        if let Some(v) = self.port {
            settings.controller_port = v;
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn tune(settings: &Settings) -> Result<()> {
    let endpoint = settings.control_endpoint()?;
    let client = ControlChannelClient::new(settings.tune_command()?, Arc::new(StdoutSink));
    info!(
        %endpoint,
        wavelength_nm = client.command().wavelength_nm,
        wavelength_step_nm = client.command().wavelength_step_nm,
        "connecting to controller"
    );
    let state = client.connect(endpoint).finished().await;
    info!(?state, "control channel finished");
    Ok(())
}

async fn set_remote_ip(settings: &Settings) -> Result<()> {
    let remote_ip = settings
        .remote_ip_address
        .as_deref()
        .context("no remote ip address configured; pass --ip or set APP__REMOTE_IP_ADDRESS")?;
    let session = NetworkSetupSession::new(settings.network_endpoint()?);
    session
        .register_remote_ip(remote_ip)
        .await
        .with_context(|| format!("failed to register {remote_ip} with {}", session.endpoint()))?;
    println!(
        "registered remote_ip_address={remote_ip} at {}",
        session.endpoint()
    );
    Ok(())
}
