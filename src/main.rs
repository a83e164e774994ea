use anyhow::Context;
use clap::Parser;
use personal_project::config::cli::{Command, LogFormat, PredictArgs};
use personal_project::core::dataset::{find_sample_csv, read_head};
use personal_project::core::eda::format_currency;
use personal_project::core::game::{play, GuessingGame};
use personal_project::utils::{logger, validation::Validate};
use personal_project::{
    greet, CarPriceModel, CarRecord, CliConfig, EdaPipeline, KaggleClient, KaggleCredentials,
    LocalStorage, PipelineEngine, ProjectConfig, ProjectError, TrainPipeline,
};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
        LogFormat::Json => logger::init_json_logger(cli.verbose),
    }
    tracing::debug!("CLI arguments: {:?}", cli);

    let mut config = match ProjectConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let cwd = std::env::current_dir().context("cannot determine the working directory")?;

    if let Err(e) = run(&cli, config, &cwd).await {
        tracing::error!(
            "❌ {} failed: {} (Category: {:?}, Severity: {:?})",
            command_name(&cli.command),
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Greet { .. } => "greet",
        Command::Guess => "guess",
        Command::Head { .. } => "head",
        Command::Eda { .. } => "eda",
        Command::Train { .. } => "train",
        Command::Predict(_) => "predict",
        Command::Download { .. } => "download",
    }
}

async fn run(cli: &CliConfig, config: ProjectConfig, cwd: &Path) -> personal_project::Result<()> {
    match &cli.command {
        Command::Greet { name } => {
            println!("{}", greet(name));
        }
        Command::Guess => {
            let mut game = GuessingGame::random(&mut rand::rng(), config.game.low, config.game.high);
            let stdin = std::io::stdin();
            play(&mut game, stdin.lock(), std::io::stdout())?;
        }
        Command::Head { rows, file } => {
            let path = match file {
                Some(file) => PathBuf::from(file),
                None => find_sample_csv(
                    &config.project_root(),
                    &config.paths.data_dir,
                    &config.paths.sample_file,
                    cwd,
                )?,
            };
            let head = read_head(&path, *rows)?;
            println!("Using: {}", path.display());
            println!("First rows:");
            for row in head {
                let fields: Vec<String> = row.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                println!("{{{}}}", fields.join(", "));
            }
        }
        Command::Eda { .. } => {
            let storage = LocalStorage::new(config.project_root());
            let engine = PipelineEngine::new_with_monitoring(EdaPipeline::new(storage, config), cli.monitor);
            let location = engine.run().await?;
            println!("Reports saved to {}", location);
            println!("Done");
        }
        Command::Train { .. } => {
            let storage = LocalStorage::new(config.project_root());
            let engine = PipelineEngine::new_with_monitoring(TrainPipeline::new(storage, config), cli.monitor);
            let location = engine.run().await?;
            println!("Saved model to {}", location);
        }
        Command::Predict(args) => predict(args, &config)?,
        Command::Download {
            dataset,
            dest,
            no_unzip,
        } => {
            let credentials_path =
                config
                    .kaggle_credentials_path()
                    .ok_or_else(|| ProjectError::MissingConfigError {
                        field: "kaggle.credentials_path".to_string(),
                    })?;
            let credentials = KaggleCredentials::from_file(&credentials_path)?;
            let client = KaggleClient::new(&config.kaggle.base_url, credentials)?;

            let dest = dest.as_ref().map(PathBuf::from).unwrap_or_else(|| config.data_dir());
            let files = client.download_dataset(dataset, &dest, !no_unzip).await?;
            for file in &files {
                println!("  {}", file.display());
            }
            println!("Done.");
        }
    }
    Ok(())
}

fn predict(args: &PredictArgs, config: &ProjectConfig) -> personal_project::Result<()> {
    let path = args
        .model
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(|| config.models_dir().join(&config.model.model_file));
    let model = CarPriceModel::load(&path)?;
    tracing::debug!(
        "Loaded model trained at {} (test RMSE {:.2})",
        model.trained_at,
        model.metrics.test_rmse
    );

    let car = CarRecord {
        company: args.company.clone(),
        fuel_type: args.fuel_type.clone(),
        horsepower: args.horsepower,
        cc: args.cc,
        perf_sec: args.perf_sec,
        torque: args.torque,
        seats: args.seats,
        ..Default::default()
    };
    println!("Predicted price: ${}", format_currency(model.predict(&car)));
    Ok(())
}
