//! Command line front end of the registry.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result, miette};
use pidr_config::Config;
use pidr_provider::Provider;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pidr", version, about = "Persistent identifier registry for article XML packages")]
struct Cli {
    /// Configuration file (TOML, YAML or JSON).
    #[arg(long, global = true, env = "PIDR_CONFIG")]
    config: Option<PathBuf>,

    /// Registry store URI, overriding the configuration.
    #[arg(long, global = true)]
    store_uri: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Identify every document of a package and write the identified package.
    Request {
        /// Package to identify: a zip archive of XML documents, or a single XML file.
        source: PathBuf,
        /// Path of the zip package to write.
        output: PathBuf,
        /// Recorded as the creator/updater of the registrations.
        #[arg(long)]
        requester: Option<String>,
    },
    /// Print the registered XML of a document.
    GetXml { v3: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).map_err(|err| miette!("{err:?}"))?;
    if let Some(uri) = cli.store_uri {
        config.store.uri = uri;
    }
    let provider = Provider::from_config(&config);

    match cli.command {
        Command::Request { source, output, requester } => {
            let requester = requester.unwrap_or_else(|| config.requester.clone());
            // Writing over the source would truncate it while it is still being read.
            let (_scratch, source) = if source == output {
                let (dir, copy) = pidr_archive::copy_to_temp(&source).map_err(|err| miette!("{err:?}"))?;
                (Some(dir), copy)
            } else {
                (None, source)
            };
            let manifest = provider
                .request_document_id(&source, &output, &requester)
                .await
                .map_err(|err| miette!("{err:?}"))?;
            for entry in &manifest.entries {
                println!("{entry}");
            }
            for failure in &manifest.failures {
                eprintln!("{}\tfailed: {}", failure.name, *failure.error);
            }
            tracing::info!(output = %manifest.output.display(), entries = manifest.entries.len(), "package written");
            if !manifest.failures.is_empty() {
                return Err(miette!("{} of the package's documents could not be identified", manifest.failures.len()));
            }
        },
        Command::GetXml { v3 } => {
            let xml = provider.get_xml(&v3).await.map_err(|err| miette!("{err:?}"))?;
            std::io::Write::write_all(&mut std::io::stdout(), xml.as_bytes()).into_diagnostic()?;
        },
    }
    Ok(())
}
