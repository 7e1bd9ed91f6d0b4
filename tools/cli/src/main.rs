//! Secretary CLI - Command line interface for text encryption and hashing.
//!
//! Text is encrypted under a passphrase taken from a key source: a literal
//! passphrase, an environment variable, or no encryption at all.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use secretary_common::Descriptor;
use secretary_vault::KeySourceRegistry;

#[derive(Parser)]
#[command(name = "secretary")]
#[command(about = "Secretary - Passphrase-keyed text encryption and hashing")]
#[command(version)]
struct Cli {
    /// Show verbose messages.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the digest of a text.
    Hash {
        /// Text to hash.
        text: String,
    },

    /// Encrypt a text and print it as hex.
    Encrypt {
        /// Text to encrypt.
        text: String,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Decrypt a hex text.
    Decrypt {
        /// Hex text to decrypt.
        text: String,

        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where the passphrase comes from.
///
/// `--passwd` and `--vault` are mutually exclusive. Either one takes
/// precedence over `--descriptor` and `SECRETARY_DESCRIPTOR`, so an exported
/// default descriptor can be overridden per call.
#[derive(Args)]
struct SourceArgs {
    /// Literal passphrase (same as `--descriptor passwd://PASSPHRASE`).
    #[arg(long, value_name = "PASSPHRASE", conflicts_with = "vault")]
    passwd: Option<String>,

    /// Environment variable holding the passphrase (same as `--descriptor env://NAME`).
    #[arg(long, value_name = "NAME")]
    vault: Option<String>,

    /// Key source descriptor: env://NAME, passwd://PASSPHRASE or plain://.
    #[arg(short, long, env = "SECRETARY_DESCRIPTOR", hide_env_values = true)]
    descriptor: Option<String>,
}

impl SourceArgs {
    /// Build the descriptor string the registry resolves.
    fn descriptor(&self) -> Result<String> {
        if let Some(passphrase) = &self.passwd {
            if passphrase.is_empty() {
                anyhow::bail!("Passphrase must not be empty");
            }
            let descriptor = Descriptor::passwd(passphrase).context("Invalid passphrase")?;
            return Ok(descriptor.as_str().to_string());
        }
        if let Some(variable) = &self.vault {
            if variable.is_empty() {
                anyhow::bail!("Environment variable name must not be empty");
            }
            let descriptor = Descriptor::env(variable).context("Invalid variable name")?;
            return Ok(descriptor.as_str().to_string());
        }
        match &self.descriptor {
            Some(descriptor) => Ok(descriptor.clone()),
            None => anyhow::bail!("No key source given. Use --passwd, --vault or --descriptor"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let registry = KeySourceRegistry::new();

    match cli.command {
        Commands::Hash { text } => cmd_hash(&text),

        Commands::Encrypt { text, source } => {
            cmd_encrypt(&registry, &text, &source.descriptor()?, cli.verbose)
        }

        Commands::Decrypt { text, source } => {
            cmd_decrypt(&registry, &text, &source.descriptor()?, cli.verbose)
        }
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over `--verbose` when set.
fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

/// Print the digest of a text.
fn cmd_hash(text: &str) -> Result<()> {
    println!("{}", secretary_crypto::digest(text));
    Ok(())
}

/// Encrypt a text with the given key source.
fn cmd_encrypt(
    registry: &KeySourceRegistry,
    text: &str,
    descriptor: &str,
    verbose: bool,
) -> Result<()> {
    let source = registry
        .resolve(descriptor)
        .context("Failed to resolve key source")?;
    debug!(source = %source, "Encrypting text");

    let encrypted = registry
        .encrypt_text(descriptor, text)
        .context("Failed to encrypt text")?;

    if verbose {
        eprintln!("{:?} encrypted with {} is {:?}", text, source, encrypted);
    }
    println!("{}", encrypted);

    Ok(())
}

/// Decrypt a text with the given key source.
fn cmd_decrypt(
    registry: &KeySourceRegistry,
    text: &str,
    descriptor: &str,
    verbose: bool,
) -> Result<()> {
    let source = registry
        .resolve(descriptor)
        .context("Failed to resolve key source")?;
    debug!(source = %source, "Decrypting text");

    let decrypted = registry
        .decrypt_text(descriptor, text)
        .context("Failed to decrypt text")?;

    if verbose {
        eprintln!("{:?} decrypted with {} is {:?}", text, source, decrypted);
    }
    println!("{}", decrypted);

    Ok(())
}
