use anyhow::{Context, bail};
use clap::Parser;
use log_relay::app::{self, App, Config};
use log_relay::domain::Payload;
use log_relay::reliability::DeliveryOutcome;

/// Submit one log record through the remote collector, falling back to disk.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    /// Record severity (debug, info, warn, error)
    #[arg(long, short = 's', default_value = "info")]
    severity: String,

    /// Record message
    #[arg(long, short = 'm')]
    message: String,

    /// Structured payload as a JSON object
    #[arg(long, short = 'p')]
    payload: Option<String>,
}

fn parse_payload(raw: Option<&str>) -> anyhow::Result<Option<Payload>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    match serde_json::from_str::<serde_json::Value>(raw).context("payload is not valid JSON")? {
        serde_json::Value::Object(map) => Ok(Some(map)),
        other => bail!("payload must be a JSON object, got {other}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    cli.config.post_process()?;
    cli.config.validate()?;

    app::setup_logging(cli.config.log_level, cli.config.log_format)?;

    let payload = parse_payload(cli.payload.as_deref())?;
    let app = App::from_config(cli.config)?;
    let orchestrator = app.orchestrator();

    let record = orchestrator
        .factory()
        .build_raw(&cli.severity, cli.message, payload)?;

    match orchestrator.submit(record).await? {
        DeliveryOutcome::Delivered { attempts } => {
            println!("delivered to {} (attempts: {attempts})", app.config().endpoint);
        }
        DeliveryOutcome::DegradedDelivered { remote_error } => {
            println!(
                "stored in {} after remote failure: {remote_error}",
                orchestrator.local().file_path().display()
            );
        }
    }

    Ok(())
}
