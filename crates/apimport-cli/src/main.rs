use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::debug;

use apimport_core::config::{self, CONFIG_FILE_NAME, ImportConfig};
use apimport_core::load::HttpFetcher;
use apimport_core::model::{ApiModel, ImportRequest};
use apimport_core::parse;
use apimport_core::transform::{self, ConvertOptions};

#[derive(Parser)]
#[command(
    name = "apimport",
    about = "Convert Swagger 1.x / 2.0 and OpenAPI 3.x descriptors into an API model",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a descriptor and print the resulting model
    Convert {
        /// Path to the descriptor file (YAML or JSON)
        #[arg(short, long, conflicts_with = "url")]
        input: Option<PathBuf>,

        /// Fetch the descriptor from an http(s) or file:// URL
        #[arg(short, long)]
        url: Option<String>,

        /// Synthesize a response example for every verb
        #[arg(long)]
        mocks: bool,

        /// Emit paths without their verbs
        #[arg(long)]
        no_verbs: bool,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Validate a descriptor
    Validate {
        /// Path to the descriptor file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Initialize a new apimport configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            url,
            mocks,
            no_verbs,
            format,
        } => cmd_convert(input, url, mocks, no_verbs, format),

        Commands::Validate { input } => cmd_validate(input),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "apimport", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Try to load the project config file from the current directory.
fn try_load_config() -> Result<Option<ImportConfig>> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);
    config::load_config(&config_path).map_err(|e| anyhow::anyhow!(e))
}

fn cmd_convert(
    input: Option<PathBuf>,
    url: Option<String>,
    mocks: bool,
    no_verbs: bool,
    format: OutputFormat,
) -> Result<()> {
    let mut cfg = try_load_config()?.unwrap_or_default();
    if no_verbs {
        cfg.extract_verbs = false;
    }

    let location = match (input, url) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(url)) => url,
        (None, None) => anyhow::bail!("either --input or --url is required"),
    };
    debug!("converting {location}");

    let request = ImportRequest::url(location.clone()).with_mocks(mocks || cfg.generate_mocks);
    let fetcher = HttpFetcher::new(&cfg.fetch);
    let model = apimport_core::import(&request, &cfg, &fetcher)
        .with_context(|| format!("failed to import {location}"))?;

    print_model(&model, format)?;
    eprintln!(
        "Converted {}: {} paths, {} endpoints",
        model.name,
        model.paths.len(),
        model.endpoints.len()
    );
    Ok(())
}

fn print_model(model: &ApiModel, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => {
            let yaml = serde_yaml_ng::to_string(model)?;
            print!("{}", yaml);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(model)?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn cmd_validate(input: PathBuf) -> Result<()> {
    let content = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let parsed = parse::parse_descriptor(&content)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    let model = transform::convert_with_options(&parsed, &ConvertOptions::default());

    eprintln!("Valid {} descriptor: {}", parsed.dialect, model.name);
    eprintln!("  Version: {}", model.version);
    eprintln!("  Context path: {}", model.context_path);
    eprintln!("  Endpoints: {}", model.endpoints.len());
    eprintln!("  Paths: {}", model.paths.len());

    let verbs: usize = model
        .paths
        .iter()
        .filter_map(|p| p.verbs.as_ref())
        .map(Vec::len)
        .sum();
    eprintln!("  Verbs: {}", verbs);

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
