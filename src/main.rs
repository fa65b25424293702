use std::path::PathBuf;

use clap::{Parser, Subcommand};
use indicator_tools::catalog::IndicatorCatalogs;
use indicator_tools::config::ProcessorConfig;
use indicator_tools::logging;
use indicator_tools::model::ApiKind;
use indicator_tools::pipeline::Processor;
use indicator_tools::progress::TracingObserver;
use indicator_tools::Result;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = logging::init_logging(cli.verbose) {
        eprintln!("warning: {error}");
    }
    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => ProcessorConfig::from_file(path)?,
        None => ProcessorConfig::default(),
    };

    match cli.command {
        Command::Process(args) => {
            if let Some(dir) = args.output_dir {
                config.athena_output_dir = dir.join("WHO_Athena");
                config.dhs_output_dir = dir.join("DHS_Program");
            }
            let processor = Processor::from_config(config)?;
            let outcome =
                processor.unified_data_processor(&args.api, &args.indicators, &TracingObserver);
            println!("{}", outcome.message());
            Ok(outcome.is_done())
        }
        Command::Indicators(args) => {
            let api: ApiKind = args.api.parse()?;
            let catalogs = IndicatorCatalogs::load(&config);
            for warning in &catalogs.warnings {
                eprintln!("warning: {warning}");
            }
            for indicator in catalogs.for_api(api) {
                println!("{indicator}");
            }
            Ok(true)
        }
        Command::CheckConfig(args) => {
            let config = ProcessorConfig::from_file(&args.path)?;
            println!("{config:#?}");
            Ok(true)
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Fetch WHO Athena and DHS Program indicators into Excel workbooks."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Optional JSON configuration file overriding endpoints and paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the selected indicators and write the resulting workbook.
    Process(ProcessArgs),
    /// List the selectable indicators for an API.
    Indicators(IndicatorsArgs),
    /// Validate and print a configuration file.
    CheckConfig(CheckConfigArgs),
}

#[derive(clap::Args)]
struct ProcessArgs {
    /// Source API: "WHO Athena" or "DHS Program".
    #[arg(long, default_value = "WHO Athena")]
    api: String,

    /// Indicator identifier; repeat or comma-separate for several.
    #[arg(long = "indicator", value_delimiter = ',')]
    indicators: Vec<String>,

    /// Root directory for output workbooks.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

#[derive(clap::Args)]
struct IndicatorsArgs {
    /// Source API: "WHO Athena" or "DHS Program".
    #[arg(long, default_value = "WHO Athena")]
    api: String,
}

#[derive(clap::Args)]
struct CheckConfigArgs {
    /// Configuration file to validate.
    path: PathBuf,
}
