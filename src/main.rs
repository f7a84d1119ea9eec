use clap::{Args, Parser, Subcommand, ValueEnum};
use feasibility::api::{self, FeasibilityArgs};
use feasibility::config::AppConfig;
use feasibility::error::AppError;
use feasibility::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "feasibility",
    about = "Property development feasibility calculator (costs, profit, ROE, IRR)",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP API (default command)
    Serve(ServeArgs),
    /// Evaluate one project from command-line flags and print a report
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct EvaluateArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[command(flatten)]
    project: FeasibilityArgs,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Evaluate(args) => run_evaluate(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let addr = config.server.socket_addr()?;
    info!(log_level = %config.telemetry.log_level, "configuration loaded");
    api::run_http_server(addr).await?;
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let request = api::build_request(&args.project).map_err(AppError::Arguments)?;
    let report = api::run_evaluation(&request)?;

    let output = match args.format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Csv => report.to_csv()?,
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(&report)?),
    };
    print!("{output}");
    Ok(())
}
