use anyhow::Context;
use ane_app::models::routes::parse_page;
use ane_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Operator tool for the ANE catalog proxy.
#[derive(Debug, Parser)]
#[command(name = "ane", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Print one page of popular models as JSON
    Popular {
        /// 1-based page number; anything else means page 1
        #[arg(long)]
        page: Option<String>,
    },
    /// Print a single model with its gallery as JSON
    Model {
        /// Upstream item identifier
        id: String,
    },
    /// Report whether the catalog credential is configured
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load ANE settings")?;
    ane_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => ane_app::app::run(settings).await,
        Command::Popular { page } => {
            let page = parse_page(page.as_deref());
            let service = ane_app::models::create_service(&settings.catalog)?;
            let models = service
                .list_popular(page)
                .await
                .context("failed to fetch popular models")?;
            tracing::info!(page, count = models.len(), "popular page printed");
            println!("{}", serde_json::to_string_pretty(&models)?);
            Ok(())
        }
        Command::Model { id } => {
            let service = ane_app::models::create_service(&settings.catalog)?;
            let model = service
                .get_detail(&id)
                .await
                .with_context(|| format!("failed to fetch model '{id}'"))?;
            tracing::info!(id = %id, images = model.images.len(), "model printed");
            println!("{}", serde_json::to_string_pretty(&model)?);
            Ok(())
        }
        Command::Check => check(&settings),
    }
}

fn check(settings: &Settings) -> anyhow::Result<()> {
    println!("environment: {:?}", settings.environment);
    println!("upstream:    {}", settings.catalog.base_url);

    match &settings.catalog.token {
        Some(token) => {
            println!("token:       configured ({})", token.preview());
            Ok(())
        }
        None => {
            println!("token:       missing");
            anyhow::bail!("Thingiverse Token is missing; set ANE_CATALOG__TOKEN or THINGIVERSE_TOKEN")
        }
    }
}
