mod monitor;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use quill_core::{
    config::{self, shellexpand},
    traits::Provider,
};
use quill_providers::{deepseek::DeepSeekProvider, openai::OpenAiProvider};
use quill_transcript::{
    detect::{detect, Detection},
    parse::parse,
    writer, Session, TickOutcome,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "quill",
    version,
    about = "Quill: chat with a language model from inside a text file"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "quill.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the document and answer every completed message.
    Watch,
    /// Append a message to the document and wait for the reply.
    Ask {
        /// The message to send.
        #[arg(trailing_var_arg = true)]
        message: Vec<String>,
    },
    /// Show configuration, document state and provider availability.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // A missing .env file is fine; the key may come from the real environment.
    dotenvy::dotenv().ok();

    let config_found = Path::new(&cli.config).exists();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.quill.log_level)),
        )
        .init();

    if !config_found {
        info!("config: {} not found, using defaults", cli.config);
    }

    let document = PathBuf::from(shellexpand(&cfg.quill.document));
    let format = cfg.quill.format;

    match cli.command {
        Commands::Watch => {
            let provider = build_provider(&cfg)?;
            ensure_document(&document)?;

            let session = Session::open(document.clone(), format)
                .await?
                .with_system_prompt(&cfg.quill.system_prompt);
            info!(
                "load: {} ({} bytes)",
                document.display(),
                session.previous().len()
            );

            println!("Monitoring {} for new messages...", document.display());
            println!("Type your message and press Enter twice to send.");
            monitor::Monitor::new(session, provider, cfg.watch.clone())
                .run()
                .await?;
        }
        Commands::Ask { message } => {
            if message.is_empty() {
                anyhow::bail!("no message provided. Usage: quill ask <message>");
            }

            let prompt = message.join(" ");
            let provider = build_provider(&cfg)?;
            ensure_document(&document)?;

            let mut session = Session::open(document.clone(), format)
                .await?
                .with_system_prompt(&cfg.quill.system_prompt);
            writer::append_user_turn(&document, format, &prompt).await?;

            match session.tick(provider.as_ref()).await? {
                TickOutcome::Replied { reply, .. } => println!("{}", reply.text),
                other => anyhow::bail!("message was not sent: {other:?}"),
            }
        }
        Commands::Status => {
            println!("Quill status\n");
            println!("Config: {}", config_label(&cli.config, config_found));
            println!(
                "Document: {} ({} format)",
                document.display(),
                format.display_name()
            );
            println!("Provider: {}", cfg.provider.default);
            println!();

            match std::fs::read_to_string(&document) {
                Ok(content) => {
                    let turns = parse(format, &content);
                    let pending = matches!(detect(format, "", &content), Detection::NewUserTurn(_));
                    println!("  turns: {}", turns.len());
                    println!(
                        "  pending message: {}",
                        if pending { "yes" } else { "no" }
                    );
                }
                Err(_) => println!("  document: not created yet"),
            }

            match build_provider(&cfg) {
                Ok(provider) => {
                    let available = provider.is_available().await;
                    println!(
                        "  {}: {}",
                        provider.name(),
                        if available { "available" } else { "unreachable" }
                    );
                }
                Err(e) => println!("  provider: {e}"),
            }
        }
    }

    Ok(())
}

/// Build the configured provider. A missing credential is fatal.
fn build_provider(cfg: &config::Config) -> anyhow::Result<Box<dyn Provider>> {
    match cfg.provider.default.as_str() {
        "deepseek" => {
            let ds = cfg.provider.deepseek.clone().unwrap_or_default();
            let api_key = ds.resolve_api_key().with_context(|| {
                format!(
                    "DeepSeek API key not found. Set provider.deepseek.api_key in the config or the {} env var.",
                    ds.api_key_env
                )
            })?;
            Ok(Box::new(DeepSeekProvider::from_config(
                ds.base_url,
                api_key,
                ds.model,
                Duration::from_secs(ds.timeout_secs),
            )?))
        }
        "openai" => {
            let oa = cfg.provider.openai.clone().unwrap_or_default();
            let api_key = oa.resolve_api_key().with_context(|| {
                format!(
                    "OpenAI API key not found. Set provider.openai.api_key in the config or the {} env var.",
                    oa.api_key_env
                )
            })?;
            Ok(Box::new(OpenAiProvider::from_config(
                oa.base_url,
                api_key,
                oa.model,
                Duration::from_secs(oa.timeout_secs),
            )?))
        }
        other => anyhow::bail!("unsupported provider: {other}"),
    }
}

fn config_label(path: &str, found: bool) -> String {
    if found {
        path.to_string()
    } else {
        format!("{path} (not found, using defaults)")
    }
}

/// Create the document (and its directory) if it does not exist yet.
fn ensure_document(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, "").with_context(|| format!("failed to create {}", path.display()))?;
    info!("init: created empty document {}", path.display());
    Ok(())
}
