mod settings;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use nidam_proto::{
    render_transcript, ContainerParts, Conversation, ConversationSealer, EncryptedConversation,
    ShareError,
};
use std::path::{Path, PathBuf};
use tracing::info;
use zeroize::Zeroizing;

use crate::settings::ShareSettings;

/// Shown for both a wrong passphrase and a damaged export.
const UNOPENABLE: &str = "could not open conversation";

#[derive(Parser)]
#[command(name = "nidam")]
#[command(about = "Seal and open exported NIDAM conversations", long_about = None)]
struct Cli {
    /// Settings file (defaults to the per-user config directory)
    #[arg(long, global = true, env = "NIDAM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt a conversation (JSON array of messages) into a share container
    Seal {
        #[arg(long)]
        input: PathBuf,
        /// Write the container here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Read the passphrase from this environment variable instead of prompting
        #[arg(long)]
        passphrase_env: Option<String>,
    },

    /// Decrypt a share container back into the conversation
    Open {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Emit a plain-text transcript instead of JSON
        #[arg(long)]
        transcript: bool,
        #[arg(long)]
        passphrase_env: Option<String>,
    },

    /// Show container metadata without decrypting
    Inspect {
        #[arg(long)]
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nidam=info,nidam_proto=info,nidam_crypto=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = ShareSettings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Seal {
            input,
            output,
            passphrase_env,
        } => seal_command(&settings, &input, output.as_deref(), passphrase_env.as_deref()).await,
        Commands::Open {
            input,
            output,
            transcript,
            passphrase_env,
        } => {
            open_command(
                &settings,
                &input,
                output.as_deref(),
                transcript,
                passphrase_env.as_deref(),
            )
            .await
        }
        Commands::Inspect { input } => inspect_command(&input),
    }
}

async fn seal_command(
    settings: &ShareSettings,
    input: &Path,
    output: Option<&Path>,
    passphrase_env: Option<&str>,
) -> Result<()> {
    let raw = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let conversation = Conversation::from_slice(&raw)
        .with_context(|| format!("{} is not a conversation export", input.display()))?;

    let passphrase = read_passphrase(passphrase_env, true)?;
    let sealer = ConversationSealer::new(settings.kdf_params());
    let container = sealer.seal_async(conversation, passphrase).await?;

    write_output(output, &container.to_json_pretty()?)?;
    info!(id = %container.id(), "conversation sealed");
    Ok(())
}

async fn open_command(
    settings: &ShareSettings,
    input: &Path,
    output: Option<&Path>,
    transcript: bool,
    passphrase_env: Option<&str>,
) -> Result<()> {
    let container = read_container(input)?;
    let passphrase = read_passphrase(passphrase_env, false)?;
    let sealer = ConversationSealer::new(settings.kdf_params());
    let id = container.id().to_string();

    let conversation = match sealer.open_async(container, passphrase).await {
        Ok(conversation) => conversation,
        Err(err) if err.is_unopenable() => bail!(UNOPENABLE),
        Err(err) => return Err(err.into()),
    };

    let rendered = if transcript {
        render_transcript(&conversation, &settings.transcript)
    } else {
        serde_json::to_string_pretty(&conversation)?
    };
    write_output(output, &rendered)?;
    info!(id = %id, messages = conversation.len(), "conversation opened");
    Ok(())
}

fn inspect_command(input: &Path) -> Result<()> {
    let container = read_container(input)?;
    let parts = container.parts()?;
    println!("id:          {}", container.id());
    println!("salt:        {} bytes", parts.salt.len());
    println!("iv:          {} bytes", parts.nonce.len());
    println!(
        "ciphertext:  {} bytes (payload {} + tag {})",
        parts.ciphertext.len(),
        parts.payload_len(),
        ContainerParts::TAG_LEN
    );
    Ok(())
}

fn read_container(path: &Path) -> Result<EncryptedConversation> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let container = EncryptedConversation::from_json(&raw)?;
    Ok(container)
}

fn read_passphrase(from_env: Option<&str>, confirm: bool) -> Result<Zeroizing<String>> {
    let passphrase = match from_env {
        Some(var) => Zeroizing::new(
            std::env::var(var).map_err(|_| anyhow!("environment variable {var} is not set"))?,
        ),
        None => {
            let first = Zeroizing::new(rpassword::prompt_password("Passphrase: ")?);
            if confirm {
                let second = Zeroizing::new(rpassword::prompt_password("Repeat passphrase: ")?);
                if *first != *second {
                    bail!("passphrases do not match");
                }
            }
            first
        }
    };
    if passphrase.is_empty() {
        return Err(ShareError::InvalidInput("passphrase must not be empty".into()).into());
    }
    Ok(passphrase)
}

fn write_output(path: Option<&Path>, contents: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}
