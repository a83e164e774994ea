use crate::config::toml_config::{ProjectConfig, DEFAULT_CONFIG_FILE};
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "personal-project")]
#[command(about = "Car price data tooling: cleaning, EDA reports, model training and dataset download")]
pub struct CliConfig {
    /// Path to TOML configuration file (optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: String,

    /// Override the project root from the configuration
    #[arg(long, global = true)]
    pub root: Option<String>,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per pipeline phase")]
    pub monitor: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print a friendly greeting
    Greet {
        #[arg(default_value = "World")]
        name: String,
    },
    /// Play the number guessing game
    Guess,
    /// Print the first rows of the sample CSV
    Head {
        #[arg(short = 'n', long, default_value_t = 7)]
        rows: usize,
        /// Read this file instead of searching for the sample CSV
        #[arg(long)]
        file: Option<String>,
    },
    /// Compute exploratory statistics for the cars dataset
    Eda {
        /// Bundle the report files into eda_report.zip
        #[arg(long)]
        compress: bool,
    },
    /// Train the car price model
    Train {
        #[arg(long)]
        n_estimators: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Score one car with a saved model
    Predict(PredictArgs),
    /// Download a Kaggle dataset into the data directory
    Download {
        /// Dataset slug, e.g. owner/dataset-name
        dataset: String,
        #[arg(long)]
        dest: Option<String>,
        /// Keep the downloaded archive instead of extracting it
        #[arg(long)]
        no_unzip: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PredictArgs {
    /// Model file; defaults to the configured models directory
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub fuel_type: Option<String>,
    #[arg(long)]
    pub horsepower: Option<f64>,
    #[arg(long)]
    pub cc: Option<f64>,
    #[arg(long)]
    pub perf_sec: Option<f64>,
    #[arg(long)]
    pub torque: Option<f64>,
    #[arg(long)]
    pub seats: Option<f64>,
}

impl CliConfig {
    /// Command-line settings take precedence over the file.
    pub fn apply_overrides(&self, config: &mut ProjectConfig) {
        if let Some(root) = &self.root {
            config.paths.project_root = root.clone();
        }
        match &self.command {
            Command::Eda { compress: true } => config.eda.compress = true,
            Command::Train { n_estimators, seed } => {
                if let Some(n) = n_estimators {
                    config.model.n_estimators = *n;
                }
                if let Some(seed) = seed {
                    config.model.random_state = *seed;
                }
            }
            _ => {}
        }
    }
}
