mod cli;

use clap::Parser;
use localwx_core::{AppError, Config, ConfigError, DisplayConfig};
use localwx_weather::{Coordinates, LocationProvider, NwsClient, WeatherSession};
use std::error::Error;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

use cli::{Args, Command, OutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Config errors can happen before the configured subscriber is up
            let _ = localwx_core::init_tracing("error");
            tracing::error!("{}", error_chain(&e));
            eprintln!("localwx: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = localwx_core::with_bootstrap_tracing(|| load_config(&args))?;
    localwx_core::init_tracing(&config.log_level)?;
    config.ensure_valid()?;

    tracing::info!("localwx {} starting", env!("CARGO_PKG_VERSION"));

    let mut provider = LocationProvider::from_config(&config.location)?;
    if let Some((lat, lon)) = args.manual_coordinates() {
        provider = provider.with_manual(Coordinates::new(lat, lon)?);
    }
    let location = provider.locate().await;

    let client = NwsClient::new(&config.api)?;
    let mut session = WeatherSession::new(location, config.display.temperature_unit);
    session.run(&client).await?;

    render(&session, &config.display, args.format)?;

    if args.interactive {
        interactive(&mut session, &config.display, args.format).await?;
    }

    Ok(())
}

/// Load the config file and fold in command line overrides.
fn load_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    args.apply_to(&mut config);
    Ok(config)
}

fn render(
    session: &WeatherSession,
    display: &DisplayConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let report = session
        .report(display)
        .ok_or_else(|| anyhow::anyhow!("Weather session is {}, nothing to show", session.state()))?;

    match format {
        OutputFormat::Text => println!("{}", report),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
    }

    Ok(())
}

/// Switch units from stdin and re-render the fetched data. No new requests.
async fn interactive(
    session: &mut WeatherSession,
    display: &DisplayConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("Enter c, f or a to switch units, q to quit");

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Some(Command::Quit) => break,
            Some(Command::Unit(unit)) => {
                session.set_unit(unit);
                render(session, display, format)?;
            }
            None if line.trim().is_empty() => {}
            None => eprintln!("Unknown command '{}'; use c, f, a or q", line.trim()),
        }
    }

    Ok(())
}

/// "outer: inner: innermost"
fn error_chain(e: &AppError) -> String {
    let mut chain = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
