use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "consommation")]
#[command(version)]
#[command(about = "Building energy use and GHG emissions prediction service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, <CONSO_ENV>.toml)
    #[arg(short, long, default_value = "config", global = true)]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the model and serve the prediction API (default)
    Serve {
        /// Override server.port
        #[arg(short, long)]
        port: Option<u16>,
        /// Override model.tag (e.g. "consommation_model:latest")
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Post the sample building to a running service and print the reply
    Smoke {
        /// Prediction endpoint URL (defaults to smoke.url)
        #[arg(short, long)]
        url: Option<String>,
    },
    /// Load a model from the registry and print its metadata
    Inspect {
        /// Model tag (defaults to model.tag)
        #[arg(short, long)]
        model: Option<String>,
    },
}
