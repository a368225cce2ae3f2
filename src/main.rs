use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use icingawatch::adapters::icinga::{IcingaApi, IcingaClient};
use icingawatch::adapters::pihole::{DnsFilterApi, PiholeAdapter};
use icingawatch::{Output, OutputTarget, Poller, Profile, SnapshotBuilder};

#[derive(Parser, Debug)]
#[command(name = "icingawatch")]
#[command(about = "Publish Icinga 2 health metrics to a dashboard")]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long, default_value = "config/icinga2.json")]
    config: PathBuf,

    /// Where to send events: stdout, file:PATH, tcp:ADDR or dashing
    #[arg(short, long = "output", default_value = "stdout")]
    outputs: Vec<OutputTarget>,

    /// Run a single tick and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let profile = Profile::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    tracing::info!(
        host = %profile.api.host,
        port = profile.api.port,
        interval = ?profile.interval,
        timezone = %profile.timezone,
        icingaweb2 = %profile.icingaweb2_url,
        "Starting icingawatch"
    );

    let api = icinga_client(&profile)?;
    let dns_filter = dns_filter(&profile)?;
    let outputs = build_outputs(&args.outputs, &profile)?;

    let builder = SnapshotBuilder::from_profile(&profile, api, dns_filter);
    let mut poller = Poller::new(builder, outputs, profile.interval);

    if args.once {
        poller.tick().await;
        return Ok(());
    }

    poller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            }
        })
        .await;

    Ok(())
}

fn icinga_client(profile: &Profile) -> Result<Arc<dyn IcingaApi>> {
    let settings = &profile.api;
    let mut builder = IcingaClient::builder()
        .host(&settings.host)
        .port(settings.port)
        .credentials(&settings.user, &settings.password)
        .pki_path(&settings.pki_path);

    if let Some(node_name) = &settings.node_name {
        builder = builder.node_name(node_name);
    }

    let client = builder.build().context("Failed to create Icinga 2 API client")?;
    tracing::info!(
        url = client.base_url(),
        client_certificate = client.uses_client_certificate(),
        "Icinga 2 API client ready"
    );
    Ok(Arc::new(client))
}

fn dns_filter(profile: &Profile) -> Result<Option<Arc<dyn DnsFilterApi>>> {
    let Some(source) = &profile.dns_filter else {
        return Ok(None);
    };

    let adapter = PiholeAdapter::builder()
        .endpoint(&source.url)
        .token(&source.token)
        .build()
        .context("Failed to create DNS filter client")?;
    Ok(Some(Arc::new(adapter)))
}

fn build_outputs(targets: &[OutputTarget], profile: &Profile) -> Result<Vec<Output>> {
    targets
        .iter()
        .map(|target| {
            Ok(match target {
                OutputTarget::Stdout => Output::Stdout,
                OutputTarget::File(path) => Output::file(path),
                OutputTarget::Tcp(addr) => Output::tcp(addr),
                OutputTarget::Dashing => {
                    let Some(dashing) = &profile.dashing else {
                        bail!("--output dashing requires dashboard.dashing_url in the config");
                    };
                    Output::dashing(&dashing.url, &dashing.auth_token)
                        .context("Failed to create Dashing client")?
                }
            })
        })
        .collect()
}
