mod catalog;
mod token;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "optisell-cli")]
#[command(about = "OptiSell Shopify integration command line")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check an Admin API token against a store's /shop.json
    CheckToken {
        /// Store handle or domain (e.g., optisell-3 or optisell-3.myshopify.com)
        store: String,
        /// Admin API access token (shpat_ or shpca_)
        token: String,
    },
    /// List stored integrations
    Integrations,
    /// Import every product of an integration into the local catalogue
    Import {
        /// Integration id
        integration_id: String,
    },
    /// Push a local product to Shopify
    Sync {
        /// Local product id
        product_id: String,
        /// Integration to push to
        #[arg(long)]
        integration: String,
        /// Match an existing Shopify product by SKU before creating
        #[arg(long)]
        intelligent: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = optisell_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::CheckToken { store, token } => {
            token::run_check_token(&config, &store, &token).await?;
        }
        Commands::Integrations => {
            let store = optisell_store::JsonStore::open(config.data_dir.clone()).await?;
            catalog::run_list_integrations(&store).await?;
        }
        Commands::Import { integration_id } => {
            let store = optisell_store::JsonStore::open(config.data_dir.clone()).await?;
            catalog::run_import(&store, &config, &integration_id).await?;
        }
        Commands::Sync {
            product_id,
            integration,
            intelligent,
        } => {
            let store = optisell_store::JsonStore::open(config.data_dir.clone()).await?;
            catalog::run_sync(&store, &config, &product_id, &integration, intelligent).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
