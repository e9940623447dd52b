use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

use kodegen_bundler_cert::config::{CertConfig, ConfigFile, ConfigOverrides};
use kodegen_bundler_cert::keychain::ensure_keychain_accessible;
use kodegen_bundler_cert::validation::{check_dependencies, validate_p8_file};
use kodegen_bundler_cert::{AppleAPIClient, Runner, SecurityKeychain, SelectedCertificate};

// Critical I/O (files, commands, API calls) is propagated with `?`.
// Decorative terminal output ignores errors with `let _ =`.

#[derive(Parser)]
#[command(name = "kodegen_cert")]
#[command(version, about = "Find or create a code-signing certificate and install it locally")]
struct Cli {
    /// Path to config file (TOML), defaults to ~/.config/kodegen/cert.toml
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// App Store Connect issuer ID
    #[arg(long, visible_alias = "issuer-id")]
    username: Option<String>,

    /// App Store Connect API key ID
    #[arg(long)]
    key_id: Option<String>,

    /// Path to the .p8 API key
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// Directory for .cer, .p12 and .certSigningRequest files
    #[arg(long, short = 'o')]
    output_path: Option<PathBuf>,

    /// Create a new certificate even if a usable one exists
    #[arg(long)]
    force: bool,

    /// Use a development certificate instead of a distribution one
    #[arg(long)]
    development: bool,

    /// The account is an Apple Developer Enterprise Program account
    #[arg(long)]
    in_house: bool,

    /// Keychain to import into (default: login.keychain-db)
    #[arg(long)]
    keychain: Option<String>,

    /// Common name for new certificate signing requests
    #[arg(long)]
    common_name: Option<String>,

    /// Append CER_CERTIFICATE_ID and CER_FILE_PATH to this file (e.g. $GITHUB_ENV)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// List expired certificates of the selected type and exit
    #[arg(long, conflicts_with_all = ["force", "env_file"])]
    list_expired: bool,

    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            username: self.username.clone(),
            key_id: self.key_id.clone(),
            private_key_path: self.private_key.clone(),
            output_path: self.output_path.clone(),
            force: self.force,
            development: self.development,
            in_house: self.in_house,
            keychain: self.keychain.clone(),
            common_name: self.common_name.clone(),
            verbose: self.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        let bufwtr = BufferWriter::stderr(ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
        let _ = writeln!(&mut buffer, "❌ {e:#}");
        let _ = buffer.reset();
        let _ = bufwtr.print(&buffer);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            ConfigFile::load(path).await?
        }
        None => match ConfigFile::default_path() {
            Some(path) => ConfigFile::load(&path).await?,
            None => ConfigFile::default(),
        },
    };

    let config = CertConfig::resolve(file, cli.overrides(), |key| std::env::var(key).ok())?;

    validate_p8_file(&config.private_key_path).await?;
    check_dependencies().await?;
    ensure_keychain_accessible(&config.keychain).await?;

    let client = AppleAPIClient::new(
        &config.key_id,
        &config.username,
        &config.private_key_path,
        config.in_house,
    )
    .await?
    .with_verbose(config.verbose);
    let keychain = SecurityKeychain::new(config.keychain.clone()).with_verbose(config.verbose);

    let mut runner = Runner::new(config, client, keychain)?;

    if cli.list_expired {
        return list_expired(&mut runner).await;
    }

    let selected = runner.launch().await?;
    publish(&selected, cli.env_file.as_deref()).await
}

async fn list_expired(runner: &mut Runner<AppleAPIClient, SecurityKeychain>) -> Result<()> {
    runner.login().await?;
    let expired = runner.expired_certs().await?;

    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    if expired.is_empty() {
        let _ = writeln!(&mut buffer, "No expired certificates");
    }
    for certificate in expired {
        let _ = writeln!(
            &mut buffer,
            "{}  {}  expired {}",
            certificate.id,
            certificate.name,
            certificate.expires.format("%Y-%m-%d")
        );
    }
    let _ = bufwtr.print(&buffer);
    Ok(())
}

/// Print the result as shell assignments and optionally append it to an env file.
async fn publish(selected: &SelectedCertificate, env_file: Option<&Path>) -> Result<()> {
    let lines = format!(
        "CER_CERTIFICATE_ID={}\nCER_FILE_PATH={}\n",
        selected.id,
        selected.path.display()
    );
    print!("{lines}");
    std::io::stdout().flush()?;

    if let Some(path) = env_file {
        use tokio::io::AsyncWriteExt;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open env file: {}", path.display()))?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;
    }

    Ok(())
}
