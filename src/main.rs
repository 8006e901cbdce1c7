//! copilot-metrics - Fetch and normalize GitHub Copilot usage metrics

use clap::Parser;
use copilot_metrics::{
    aggregation::{normalize, normalize_json, normalize_json_with},
    cli::{Cli, Command, parse_date_filter},
    filters::DayFilter,
    output::get_formatter,
    synthetic::Synthetic,
};
use copilot_metrics_core::error::Result;
use copilot_metrics_core::metrics::UsageTotals;
use copilot_metrics_github::oauth::{OAuthClient, generate_state};
use copilot_metrics_github::source_from_config;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Spinner shown while waiting on GitHub, only on an interactive terminal
fn spinner(show: bool, message: &'static str) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // The --quiet flag overrides RUST_LOG
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("copilot_metrics=info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let formatter = get_formatter(cli.json);
    let interactive = !cli.json && is_terminal::is_terminal(std::io::stdout());

    match &cli.command {
        Command::Usage { since, until, .. } => {
            let config = cli.app_config();
            let source = source_from_config(&config)?;

            let mut day_filter = DayFilter::new();
            if let Some(since) = since {
                day_filter = day_filter.with_since(parse_date_filter(since)?);
            }
            if let Some(until) = until {
                day_filter = day_filter.with_until(parse_date_filter(until)?);
            }

            let progress = spinner(interactive, "Fetching Copilot usage");
            let raw = match config.github.team.as_deref() {
                Some(team) => {
                    info!("Fetching usage of team {}", team);
                    source.team_usage(team).await
                }
                None => source.usage().await,
            };
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }

            let days = day_filter.apply(normalize(&raw?));
            let totals = UsageTotals::from_days(&days);
            println!("{}", formatter.format_usage(&days, &totals));
        }
        Command::Convert {
            input,
            output,
            synthetic,
        } => {
            let body = std::fs::read_to_string(input)?;
            let days = if *synthetic {
                normalize_json_with(&body, &mut Synthetic::new())?
            } else {
                normalize_json(&body)?
            };
            let json = serde_json::to_string_pretty(&days)?;
            match output {
                Some(path) => {
                    std::fs::write(path, json)?;
                    info!("Wrote {} days to {}", days.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Orgs => {
            let source = source_from_config(&cli.app_config())?;
            let orgs = source.organizations().await?;
            println!("{}", formatter.format_organizations(&orgs));
        }
        Command::Teams => {
            let source = source_from_config(&cli.app_config())?;
            let progress = spinner(interactive, "Fetching teams");
            let teams = source.teams().await;
            if let Some(pb) = progress {
                pb.finish_and_clear();
            }
            print!("{}", formatter.format_teams(&teams?));
        }
        Command::LoginUrl { host, .. } => {
            let oauth = OAuthClient::from_config(&cli.app_config())?;
            println!("{}", oauth.authorize_url(host, &generate_state())?);
        }
    }

    Ok(())
}
