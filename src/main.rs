use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use couloir::agents::{AgentContext, HazardAgent, IntelAgent, WeatherAgent};
use couloir::orchestrator::{EvaluationRequest, Orchestrator, OrchestratorError};
use couloir::providers::{
    DuckDuckGoProvider, LlmProvider, LwdBulletinSource, OllamaProvider, OpenMeteoProvider,
};
use couloir::types::{Coordinates, Route};
use couloir::Config;

#[derive(Parser)]
#[command(name = "couloir")]
#[command(about = "Backcountry route condition aggregation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate current conditions for a region and optional route list
    Evaluate {
        #[arg(long, help = "Region name, e.g. allgäu")]
        region: String,
        #[arg(long, help = "Latitude of the weather point")]
        lat: Option<f64>,
        #[arg(long, help = "Longitude of the weather point")]
        lon: Option<f64>,
        #[arg(long, help = "Skip the avalanche bulletin fetch")]
        no_hazard: bool,
        #[arg(long, help = "Gather web intel reports")]
        intel: bool,
        #[arg(long, help = "Target location for intel queries")]
        location: Vec<String>,
        #[arg(long, help = "JSON file with the route list to score")]
        routes: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            region,
            lat,
            lon,
            no_hazard,
            intel,
            location,
            routes,
        } => {
            let route_list = match routes {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    Some(serde_json::from_str::<Vec<Route>>(&raw)?)
                }
                None => None,
            };

            let request = EvaluationRequest {
                location: match (lat, lon) {
                    (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
                    _ => None,
                },
                include_hazard: !no_hazard,
                include_intel: intel,
                locations: location,
                routes: route_list,
                ..EvaluationRequest::default()
            };

            evaluate(&region, request).await?;
        }
    }

    Ok(())
}

async fn evaluate(region: &str, request: EvaluationRequest) -> Result<()> {
    let config = Config::from_env();
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.fetch_timeout_secs))
        .user_agent("couloir/1.0")
        .build()?;

    let llm: Option<Arc<dyn LlmProvider>> = config.ollama_base_url.clone().map(|url| {
        Arc::new(OllamaProvider::new(Some(url), config.ollama_model.clone()))
            as Arc<dyn LlmProvider>
    });

    let orchestrator = Orchestrator::new(
        WeatherAgent::new(Arc::new(OpenMeteoProvider::new(
            config.weather_base_url.clone(),
            client.clone(),
        ))),
        HazardAgent::new(Arc::new(LwdBulletinSource::new(
            config.bulletin_base_url.clone(),
            client.clone(),
        ))),
        IntelAgent::new(
            Arc::new(DuckDuckGoProvider::new(
                config.search_base_url.clone(),
                client,
            )),
            llm.clone(),
        ),
    );

    let mut ctx = AgentContext::new(region);
    ctx.capabilities.llm_extraction = llm.is_some();

    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    match orchestrator.evaluate(request, &ctx).await {
        Ok(output) => {
            for info in orchestrator.agent_infos() {
                log::debug!("agent {} finished with status {}", info.id, info.status.as_str());
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(OrchestratorError::Cancelled) => {
            eprintln!("evaluation cancelled");
            std::process::exit(130);
        }
    }
}
