use std::path::{Path, PathBuf};

use action_flow::{FlowVerifier, Scenario, Suite};
use anyhow::{Context, Result};
use cdp_adapter::{detect_chrome_executable, ChromiumPort};
use clap::{Args, Parser, Subcommand};
use flowcheck_cli::report::redacted_value;
use flowcheck_cli::{
    load_suite, render_report, render_scenario, scenarios, FileFormat, FixtureStore,
    FlowcheckConfig, OutputFormat,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// flowcheck - declarative UI-flow verifier
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    debug: bool,

    /// Log line format
    #[arg(long, value_enum, default_value = "human", global = true)]
    log_format: LogFormat,

    /// Output format
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum LogFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against a live application (all built-ins when none are given)
    Run(RunArgs),

    /// List built-in scenarios
    List,

    /// Print the steps of a built-in scenario or scenario file
    Show(ShowArgs),

    /// Parse and validate scenario files
    Validate(ValidateArgs),

    /// Show version and environment information
    Info,
}

#[derive(Args)]
struct RunArgs {
    /// Scenario files (YAML or JSON)
    #[arg(value_name = "SCENARIO_FILE")]
    files: Vec<PathBuf>,

    /// Built-in scenario to run; repeatable
    #[arg(long = "builtin", value_name = "NAME")]
    builtins: Vec<String>,

    /// Application origin, overrides configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Fixtures directory, overrides configuration
    #[arg(long, value_name = "DIR")]
    fixtures: Option<PathBuf>,

    /// Write the redacted run record as JSON
    #[arg(long, value_name = "FILE")]
    record: Option<PathBuf>,
}

#[derive(Args)]
struct ShowArgs {
    /// Built-in scenario name or scenario file
    target: String,
}

#[derive(Args)]
struct ValidateArgs {
    #[arg(required = true, value_name = "SCENARIO_FILE")]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;
    info!("Starting flowcheck v{}", env!("CARGO_PKG_VERSION"));

    let config = FlowcheckConfig::load(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args, &config, cli.output).await,
        Commands::List => cmd_list(cli.output),
        Commands::Show(args) => cmd_show(args, &config, cli.output),
        Commands::Validate(args) => cmd_validate(args, &config, cli.output),
        Commands::Info => cmd_info(cli.config.as_deref(), &config),
    };

    match result {
        Ok(true) => {
            info!("Command completed successfully");
            Ok(())
        }
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = flowcheck_cli::logging::env_filter(&level.to_string(), rust_log.as_deref())
        .context("Invalid log filter")?;
    let registry = tracing_subscriber::registry().with(filter);

    // Reports go to stdout, so logs stay on stderr.
    let installed = match format {
        LogFormat::Human => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    installed.context("Failed to initialise logging")
}

async fn cmd_run(args: RunArgs, config: &FlowcheckConfig, output: OutputFormat) -> Result<bool> {
    let mut config = config.clone();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if args.headed {
        config.browser.headless = false;
    }
    if let Some(dir) = args.fixtures {
        config.fixtures_dir = dir;
    }
    config.validate()?;

    let fixtures = FixtureStore::new(&config.fixtures_dir);
    let mut suite = Suite::new("flowcheck");
    for scenario in collect_scenarios(&args.files, &args.builtins, &fixtures)? {
        suite = suite.with_scenario(scenario);
    }
    let secrets: Vec<&str> = suite
        .scenarios
        .iter()
        .flat_map(|scenario| scenario.secrets())
        .collect();
    let mask = config.privacy.sensitive_mask.as_str();

    info!(
        scenarios = suite.scenarios.len(),
        base_url = %config.base_url,
        "Running scenarios"
    );
    let port = ChromiumPort::launch(config.cdp_config())
        .await
        .context("Failed to start the browser")?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            interrupt.cancel();
        }
    });

    let verifier = FlowVerifier::new(config.verifier_options());
    let report = verifier.run_suite(&suite, &port, &cancel).await;
    if let Err(err) = port.shutdown().await {
        warn!("Browser did not shut down cleanly: {}", err);
    }

    println!("{}", render_report(&report, output, &secrets, mask)?);

    if let Some(path) = args.record {
        let value = redacted_value(&report, &secrets, mask)?;
        let bytes = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write run record {}", path.display()))?;
        info!("Run record written to: {}", path.display());
    }

    Ok(report.all_passed())
}

fn collect_scenarios(
    files: &[PathBuf],
    builtins: &[String],
    fixtures: &FixtureStore,
) -> Result<Vec<Scenario>> {
    if files.is_empty() && builtins.is_empty() {
        return Ok(scenarios::builtin_suite(fixtures)?.scenarios);
    }

    let mut collected = Vec::new();
    for file in files {
        let suite = load_suite(file, fixtures)?;
        info!("Loaded {} scenario(s) from {}", suite.scenarios.len(), file.display());
        collected.extend(suite.scenarios);
    }
    for name in builtins {
        collected.push(scenarios::builtin(name, fixtures)?);
    }
    Ok(collected)
}

fn cmd_list(output: OutputFormat) -> Result<bool> {
    let names = scenarios::builtin_names();
    match output {
        OutputFormat::Human => {
            for name in &names {
                println!("{}", name);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&names)?),
    }
    Ok(true)
}

fn cmd_show(args: ShowArgs, config: &FlowcheckConfig, output: OutputFormat) -> Result<bool> {
    let fixtures = FixtureStore::new(&config.fixtures_dir);
    let path = Path::new(&args.target);
    let scenarios = if FileFormat::from_path(path).is_some() {
        load_suite(path, &fixtures)?.scenarios
    } else {
        vec![scenarios::builtin(&args.target, &fixtures)?]
    };

    for scenario in &scenarios {
        print!("{}", render_scenario(scenario, &config.privacy, output)?);
    }
    Ok(true)
}

fn cmd_validate(args: ValidateArgs, config: &FlowcheckConfig, output: OutputFormat) -> Result<bool> {
    let fixtures = FixtureStore::new(&config.fixtures_dir);
    let mut results = Vec::new();
    for file in &args.files {
        let outcome = load_suite(file, &fixtures);
        if let Err(err) = &outcome {
            warn!("{}", err);
        }
        results.push(serde_json::json!({
            "file": file.display().to_string(),
            "valid": outcome.is_ok(),
            "scenarios": outcome.as_ref().map(|suite| suite.scenarios.len()).unwrap_or(0),
            "error": outcome.as_ref().err().map(|err| err.to_string()),
        }));
        if output == OutputFormat::Human {
            match &outcome {
                Ok(suite) => println!(
                    "ok    {} ({} scenario(s))",
                    file.display(),
                    suite.scenarios.len()
                ),
                Err(err) => println!("error {}", err),
            }
        }
    }

    match output {
        OutputFormat::Human => {}
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&results)?),
    }
    Ok(results.iter().all(|entry| entry["valid"] == true))
}

fn cmd_info(config_path: Option<&Path>, config: &FlowcheckConfig) -> Result<bool> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .or_else(FlowcheckConfig::default_path);
    let chrome = config
        .browser
        .executable
        .clone()
        .filter(|path| path.exists())
        .or_else(detect_chrome_executable);

    println!("flowcheck {}", env!("CARGO_PKG_VERSION"));
    println!("  build date: {}", env!("BUILD_DATE"));
    println!("  git:        {} ({})", env!("GIT_HASH"), env!("GIT_BRANCH"));
    println!(
        "  config:     {}",
        config_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    );
    println!("  base url:   {}", config.base_url);
    println!("  fixtures:   {}", config.fixtures_dir.display());
    println!(
        "  browser:    {}",
        chrome
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "not found".to_string())
    );
    Ok(true)
}
