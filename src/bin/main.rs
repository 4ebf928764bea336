//! KMS asymmetric key CLI
//!
//! Command-line front end for encrypting, decrypting, signing and verifying
//! with asymmetric keys held by a remote key-management service.

use clap::{Parser, Subcommand};
use kms_asymmetric::{
    decrypt_rsa, encrypt_rsa, resolve_public_key, sign_asymmetric, verify_signature,
    verify_signature_ec, verify_signature_rsa, ConfigManager, InMemoryKeyService, KeyPath,
    KmsConfiguration, KmsError, PublicKey, RemoteKeyService,
};
use miette::{Context, Result};
use rand::rngs::OsRng;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kms-asym")]
#[command(about = "Asymmetric encrypt, decrypt, sign and verify with remote KMS keys")]
#[command(long_about = "
KMS asymmetric key tool - local envelope handling for remotely held keys

EXAMPLES:
    # Show the public key of a key version
    kms-asym public-key projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1

    # Encrypt locally, decrypt remotely
    kms-asym encrypt -k <KEY> \"my message\"
    kms-asym decrypt -k <KEY> <BASE64_CIPHERTEXT>

    # Sign remotely, verify locally
    kms-asym sign -k <KEY> \"my message\"
    kms-asym verify -k <KEY> -s <BASE64_SIGNATURE> \"my message\"

    # Exercise every operation against locally generated keys
    kms-asym self-test

ENVIRONMENT VARIABLES:
    KMS_ACCESS_TOKEN    OAuth2 bearer token (variable name is configurable)
    RUST_LOG            Logging level (debug, info, warn, error)
")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the key service endpoint
    #[arg(long, global = true, value_name = "URL")]
    endpoint: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and display the public key of a key version
    PublicKey {
        /// Key version path (defaults to the configured key)
        key: Option<String>,
    },

    /// Encrypt a message locally with the key's RSA public key
    Encrypt {
        /// Message to encrypt
        message: String,
        /// Key version path
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Decrypt base64 ciphertext with the key service
    Decrypt {
        /// Base64 ciphertext
        ciphertext: String,
        /// Key version path
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Sign the SHA-256 digest of a message with the key service
    Sign {
        /// Message to sign
        message: String,
        /// Key version path
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Verify a signature using the scheme matching the key type
    Verify {
        /// Signed message
        message: String,
        /// Base64 signature
        #[arg(short, long)]
        signature: String,
        /// Key version path
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Verify an RSA-PSS SHA-256 signature
    VerifyRsa {
        /// Signed message
        message: String,
        /// Base64 signature
        #[arg(short, long)]
        signature: String,
        /// Key version path
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Verify a DER-encoded ECDSA SHA-256 signature
    VerifyEc {
        /// Signed message
        message: String,
        /// Base64 signature
        #[arg(short, long)]
        signature: String,
        /// Key version path
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Run every operation against locally generated keys
    SelfTest,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Create the configuration file with defaults
    Init,
    /// Show the current configuration
    Show,
    /// Print the configuration file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };

    match cli.command {
        Commands::Config(config_cmd) => handle_config_command(&config_manager, config_cmd),
        Commands::SelfTest => handle_self_test().await,
        command => {
            let config = config_manager.load_or_default()?;
            let config = with_endpoint_override(config, cli.endpoint)?;
            handle_key_command(&config, command).await
        }
    }
}

/// Apply `--endpoint`, validating the result like a configured endpoint.
fn with_endpoint_override(
    mut config: KmsConfiguration,
    endpoint: Option<String>,
) -> Result<KmsConfiguration> {
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
        config.validate()?;
    }
    Ok(config)
}

/// Pick the key named on the command line, falling back to the configured default.
fn select_key(config: &KmsConfiguration, key: Option<String>) -> Result<KeyPath> {
    match key {
        Some(key) => Ok(KeyPath::new(key)?),
        None => config.default_key()?.ok_or_else(|| {
            miette::miette!("No key given: pass --key or set default_key in the configuration")
        }),
    }
}

async fn handle_key_command(config: &KmsConfiguration, command: Commands) -> Result<()> {
    let service = RemoteKeyService::new(config.remote_config()?)?;

    match command {
        Commands::PublicKey { key } => {
            let key = select_key(config, key)?;
            let public_key = resolve_public_key(&service, &key).await?;
            print_public_key(&public_key)?;
        }

        Commands::Encrypt { message, key } => {
            let key = select_key(config, key)?;
            let ciphertext = encrypt_rsa(&service, &mut OsRng, message.as_bytes(), &key).await?;
            println!("{ciphertext}");
        }

        Commands::Decrypt { ciphertext, key } => {
            let key = select_key(config, key)?;
            let plaintext = decrypt_rsa(&service, &ciphertext, &key).await?;
            println!("{plaintext}");
        }

        Commands::Sign { message, key } => {
            let key = select_key(config, key)?;
            let signature = sign_asymmetric(&service, message.as_bytes(), &key).await?;
            println!("{signature}");
        }

        Commands::Verify {
            message,
            signature,
            key,
        } => {
            let key = select_key(config, key)?;
            report_verification(
                verify_signature(&service, &signature, message.as_bytes(), &key).await,
            )?;
        }

        Commands::VerifyRsa {
            message,
            signature,
            key,
        } => {
            let key = select_key(config, key)?;
            report_verification(
                verify_signature_rsa(&service, &signature, message.as_bytes(), &key).await,
            )?;
        }

        Commands::VerifyEc {
            message,
            signature,
            key,
        } => {
            let key = select_key(config, key)?;
            report_verification(
                verify_signature_ec(&service, &signature, message.as_bytes(), &key).await,
            )?;
        }

        Commands::SelfTest | Commands::Config(_) => unreachable!("handled in main"),
    }

    Ok(())
}

fn print_public_key(public_key: &PublicKey) -> Result<()> {
    match public_key {
        PublicKey::Rsa(key) => {
            use rsa::traits::PublicKeyParts;
            println!("🔑 RSA public key ({} bits)", key.size() * 8);
        }
        PublicKey::Ec(key) => println!("🔑 EC public key ({})", key.curve()),
    }
    print!("{}", public_key.to_pem()?);
    Ok(())
}

/// Print the outcome of a verification; a negative outcome exits with status 1.
fn report_verification(outcome: kms_asymmetric::KmsResult<()>) -> Result<()> {
    match outcome {
        Ok(()) => {
            println!("✅ Signature is valid");
            Ok(())
        }
        Err(KmsError::VerificationFailed { scheme }) => {
            println!("❌ {scheme} signature is NOT valid");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn handle_self_test() -> Result<()> {
    let mut rng = OsRng;
    let mut service = InMemoryKeyService::new();

    let decrypt_key = KeyPath::new("local/rsa-decrypt")?;
    let rsa_sign_key = KeyPath::new("local/rsa-sign")?;
    let p256_key = KeyPath::new("local/ec-p256")?;
    let p384_key = KeyPath::new("local/ec-p384")?;

    println!("🔐 Generating local keys...");
    service.generate_rsa_decrypt_key(decrypt_key.clone(), 2048, &mut rng)?;
    service.generate_rsa_sign_key(rsa_sign_key.clone(), 2048, &mut rng)?;
    service.generate_p256_sign_key(p256_key.clone(), &mut rng);
    service.generate_p384_sign_key(p384_key.clone(), &mut rng);

    let message = "my message";

    let ciphertext = encrypt_rsa(&service, &mut rng, message.as_bytes(), &decrypt_key).await?;
    let plaintext = decrypt_rsa(&service, &ciphertext, &decrypt_key)
        .await
        .wrap_err("RSA-OAEP round trip")?;
    if plaintext != message {
        miette::bail!("RSA-OAEP round trip returned {plaintext:?}");
    }
    println!("✅ RSA-OAEP encrypt/decrypt");

    let signature = sign_asymmetric(&service, message.as_bytes(), &rsa_sign_key).await?;
    verify_signature_rsa(&service, &signature, message.as_bytes(), &rsa_sign_key)
        .await
        .wrap_err("RSA-PSS sign/verify")?;
    println!("✅ RSA-PSS sign/verify");

    for key in [&p256_key, &p384_key] {
        let signature = sign_asymmetric(&service, message.as_bytes(), key).await?;
        verify_signature_ec(&service, &signature, message.as_bytes(), key)
            .await
            .wrap_err_with(|| format!("ECDSA sign/verify with {key}"))?;
        println!("✅ ECDSA sign/verify ({key})");
    }

    let signature = sign_asymmetric(&service, message.as_bytes(), &p256_key).await?;
    match verify_signature_ec(&service, &signature, b"my messagE", &p256_key).await {
        Err(KmsError::VerificationFailed { .. }) => println!("✅ Tampered message rejected"),
        Ok(()) => miette::bail!("tampered message was accepted"),
        Err(e) => return Err(e.into()),
    }

    println!("🎉 All checks passed");
    Ok(())
}

fn handle_config_command(config_manager: &ConfigManager, config_cmd: ConfigCommands) -> Result<()> {
    match config_cmd {
        ConfigCommands::Show => {
            if !config_manager.exists() {
                println!("📋 No configuration file found. Use 'config init' to create one.");
                return Ok(());
            }
            let config = config_manager.load()?;
            println!("📋 Current Configuration:");
            println!("  Endpoint: {}", config.endpoint);
            println!("  Timeout: {}s", config.timeout_seconds);
            println!("  Verify TLS: {}", config.verify_tls);
            println!("  Access token variable: {}", config.access_token_env);
            println!(
                "  Default key: {}",
                config.default_key.as_deref().unwrap_or("(none)")
            );
            println!(
                "  Configuration file: {}",
                config_manager.config_path().display()
            );
        }

        ConfigCommands::Init => {
            config_manager.load_or_create_default()?;
            println!(
                "✅ Configuration initialized: {}",
                config_manager.config_path().display()
            );
        }

        ConfigCommands::Path => {
            println!("{}", config_manager.config_path().display());
        }
    }

    Ok(())
}
