//! sharkey: threshold-shared age identities
//!
//! Commands:
//!   generate   - create a master seed, print its age keypair and N shares
//!   combine    - enter T shares interactively to recover the age keypair

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use sharkey_core::config::{default_config_path, ShareDisplay, SharkeyConfig};
use sharkey_core::{SharkeyError, ThresholdScheme};
use sharkey_crypto::{
    combine, identity_from_seed, split_seed, AgeIdentity, CollectInput, CollectSession, CollectState,
    FinishPolicy, MasterSeed, ShareFormat, ShareIdentifier,
};

use output::{format_timestamp, render_key_file, write_key_file};

/// Exit status after the user interrupts share entry (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

const MASK: &str = "********";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "sharkey",
    version,
    about = "Threshold-shared age identities",
    long_about = "sharkey: split an age X25519 identity into N shares, any T of which recover it"
)]
struct Cli {
    /// Path to config.toml (default: ~/.config/sharkey/config.toml)
    #[arg(long, short = 'c', env = "SHARKEY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "SHARKEY_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "SHARKEY_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new age keypair and split its seed into shares
    Generate {
        /// Shares required to recover the keypair
        #[arg(long, short = 't')]
        threshold: u8,

        /// Total shares to create (at most 255)
        #[arg(long, short = 's')]
        shares: u8,

        /// Reuse an existing base64 master seed (48 bytes) instead of a random one
        #[arg(long, env = "SEED", hide_env_values = true)]
        seed: Option<String>,

        /// Mask the seed in the SECRET section
        #[arg(long)]
        no_display_seed: bool,

        /// Mask the age secret key in the SECRET section
        #[arg(long)]
        no_display_secret_key: bool,

        /// Share text encoding (overrides config generate.share_format)
        #[arg(long, short = 'f', value_enum)]
        format: Option<FormatArg>,
    },

    /// Interactively combine shares to recover the age keypair
    ///
    /// The keypair is written to stdout unless --output is given, in which
    /// case the public key goes to stderr.
    Combine {
        /// Write the keypair to this file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Overwrite an existing --output file
        #[arg(long, short = 'f', requires = "output")]
        force: bool,

        /// Let an empty line end share entry before the threshold is reached
        #[arg(long)]
        allow_early_finish: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Symbolic,
    Words,
    Both,
}

impl From<FormatArg> for ShareDisplay {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Symbolic => ShareDisplay::Symbolic,
            FormatArg::Words => ShareDisplay::Words,
            FormatArg::Both => ShareDisplay::Both,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let config = match &config_path {
        Some(path) => SharkeyConfig::load(path).with_context(|| format!("loading config: {}", path.display()))?,
        None => SharkeyConfig::default(),
    };

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match cli.log_format {
        Some(format) => format,
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("config log.format: {e}"))?,
    };
    init_logging(&level, format);

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?config_path,
        "sharkey starting"
    );

    let result = match cli.command {
        Commands::Generate {
            threshold,
            shares,
            seed,
            no_display_seed,
            no_display_secret_key,
            format,
        } => {
            let args = GenerateArgs {
                threshold,
                shares,
                seed: seed.map(SecretString::from),
                display_seed: config.generate.display_seed && !no_display_seed,
                display_secret_key: config.generate.display_secret_key && !no_display_secret_key,
                share_display: format.map(Into::into).unwrap_or(config.generate.share_format),
            };
            cmd_generate(args).await
        }
        Commands::Combine {
            output,
            force,
            allow_early_finish,
        } => {
            let policy = if allow_early_finish || config.combine.allow_early_finish {
                FinishPolicy::AllowEarlyFinish
            } else {
                FinishPolicy::ThresholdOnly
            };
            cmd_combine(policy, config.combine.hide_input, output, force).await
        }
    };

    // A blocked prompt thread would hold up runtime shutdown, so leave directly.
    if let Err(e) = &result {
        if matches!(e.downcast_ref::<SharkeyError>(), Some(SharkeyError::Aborted)) {
            eprintln!();
            eprintln!("aborted");
            std::process::exit(EXIT_INTERRUPTED);
        }
    }
    result
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout is reserved for keys and shares
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn make_spinner(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} {spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_prefix(prefix.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Run scrypt + X25519 off the async runtime. Hands the seed back so the
/// caller decides when it is dropped.
async fn derive_identity_blocking(seed: MasterSeed) -> Result<(MasterSeed, AgeIdentity)> {
    let pb = make_spinner("scrypt");
    pb.set_message("stretching seed (N=2^20, r=8, p=1)");

    let task = tokio::task::spawn_blocking(move || {
        let identity = identity_from_seed(&seed)?;
        Ok::<_, SharkeyError>((seed, identity))
    });

    let joined = tokio::select! {
        joined = task => joined,
        _ = tokio::signal::ctrl_c() => {
            pb.finish_and_clear();
            return Err(SharkeyError::Aborted.into());
        }
    };
    pb.finish_and_clear();

    let derived = joined
        .context("key stretching task failed")?
        .context("deriving age identity")?;
    Ok(derived)
}

// ── `sharkey generate` ────────────────────────────────────────────────────────

struct GenerateArgs {
    threshold: u8,
    shares: u8,
    seed: Option<SecretString>,
    display_seed: bool,
    display_secret_key: bool,
    share_display: ShareDisplay,
}

async fn cmd_generate(args: GenerateArgs) -> Result<()> {
    let scheme = ThresholdScheme::new(args.threshold, args.shares)?;

    let seed = match &args.seed {
        Some(encoded) => MasterSeed::from_base64(encoded.expose_secret())
            .context("--seed / SEED must be base64 of exactly 48 bytes")?,
        None => MasterSeed::generate(),
    };

    let created_at = SystemTime::now();
    let identifier = ShareIdentifier::new(created_at);
    let shares = split_seed(&seed, scheme, &identifier)?;

    let (seed, identity) = derive_identity_blocking(seed).await?;

    let seed_text = if args.display_seed {
        seed.to_base64()
    } else {
        SecretString::from(MASK.to_string())
    };
    drop(seed);
    let secret_key_text = if args.display_secret_key {
        identity.secret_key().expose_secret()
    } else {
        MASK
    };

    println!();
    println!("SECRET");
    println!("-------------");
    println!();
    println!("seed             {}", seed_text.expose_secret());
    println!("age secretKey    {secret_key_text}");
    println!();
    println!("PUBLIC");
    println!("-------------");
    println!();
    println!("threshold        {scheme}");
    // identifiers carry whole seconds; show what `combine` will report
    println!("created at       {}", format_timestamp(identifier.created_at()));
    println!("age publicKey    {}", identity.public_key());
    println!();
    println!("SHARES");
    println!("-------------");
    println!();

    let formats: &[ShareFormat] = match args.share_display {
        ShareDisplay::Symbolic => &[ShareFormat::Symbolic],
        ShareDisplay::Words => &[ShareFormat::Words],
        ShareDisplay::Both => &[ShareFormat::Symbolic, ShareFormat::Words],
    };
    for (i, share) in shares.iter().enumerate() {
        println!("Share {} of {}:", i + 1, scheme.total());
        println!("--");
        for format in formats {
            let text = SecretString::from(format.encode(share.as_bytes()));
            println!("{}", text.expose_secret());
        }
        println!();
    }

    tracing::info!(%scheme, "keypair generated");
    Ok(())
}

// ── `sharkey combine` ─────────────────────────────────────────────────────────

enum Prompted {
    Line(SecretString),
    Eof,
    Interrupted,
}

/// Read one line, racing the blocking read against Ctrl-C.
async fn read_share(prompt: String, hide: bool) -> Result<Prompted> {
    let read = tokio::task::spawn_blocking(move || -> std::io::Result<Option<String>> {
        if hide {
            return rpassword::prompt_password(prompt).map(Some);
        }
        eprint!("{prompt}");
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    });

    tokio::select! {
        joined = read => {
            let line = joined.context("share prompt task failed")?.context("reading share")?;
            Ok(line.map_or(Prompted::Eof, |l| Prompted::Line(SecretString::from(l))))
        }
        _ = tokio::signal::ctrl_c() => Ok(Prompted::Interrupted),
    }
}

fn print_banner(policy: FinishPolicy) {
    eprintln!("Welcome to SharKey!");
    eprintln!();
    eprintln!("Enter your shares at the prompts below, one per line, as base32");
    eprintln!("or words. Once the required number of shares has been entered");
    match policy {
        FinishPolicy::ThresholdOnly => eprintln!("they are combined into your age keypair."),
        FinishPolicy::AllowEarlyFinish => {
            eprintln!("(or an empty line is submitted) they are combined into your");
            eprintln!("age keypair.");
        }
    }
    eprintln!("Invalid shares are reported and you can try again. Ctrl-C exits.");
    eprintln!();
}

/// Prompt until the session is ready. Bad input is reported and re-prompted.
async fn collect_shares(session: &mut CollectSession, hide: bool) -> Result<()> {
    loop {
        let prompt = match session.remaining() {
            Some(n) => format!("share {} ({n} more needed): ", session.accepted() + 1),
            None => "share: ".to_string(),
        };

        let line = read_share(prompt, hide).await?;
        let input = match &line {
            Prompted::Line(text) => CollectInput::Candidate(text.expose_secret()),
            Prompted::Eof => CollectInput::Finish,
            Prompted::Interrupted => CollectInput::Abort,
        };

        match session.step(input) {
            Ok(CollectState::Collecting) => {
                eprintln!(
                    "  accepted ({} of {})",
                    session.accepted(),
                    session.threshold().unwrap_or(0)
                );
            }
            Ok(CollectState::Ready) => return Ok(()),
            Ok(CollectState::Aborted) => return Err(SharkeyError::Aborted.into()),
            Err(e) if e.is_recoverable() && !matches!(line, Prompted::Eof) => {
                tracing::debug!(kind = ?e.kind(), "share rejected");
                eprintln!("  {e}");
            }
            Err(e) if matches!(line, Prompted::Eof) => {
                return Err(e).context("input closed before enough shares were entered")
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn cmd_combine(
    policy: FinishPolicy,
    hide_input: bool,
    output: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    print_banner(policy);

    let mut session = CollectSession::new(policy);
    collect_shares(&mut session, hide_input).await?;

    let identifier = session
        .identifier()
        .ok_or_else(|| SharkeyError::Validation("no shares were entered".into()))?;
    let shares = session.into_shares()?;
    let seed = combine(&shares).context("unable to combine shares")?;
    drop(shares);

    let created_at = identifier.created_at();
    tracing::info!(created_at = %format_timestamp(created_at), "seed recovered");

    let (seed, identity) = derive_identity_blocking(seed).await?;
    drop(seed);

    let contents = render_key_file(created_at, &identity);
    match output {
        Some(path) => {
            write_key_file(&path, &contents, force).await?;
            eprintln!("Public key: {}", identity.public_key());
        }
        None => {
            println!();
            print!("{}", contents.expose_secret());
        }
    }
    Ok(())
}
