use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use pdp_setup_config::sections::{self, ConfigSection, PasswordStrength};
use pdp_setup_config::{ConfigDocumentSet, SetupProgress, SetupSession, SourceDiscovery};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod input;

use input::ValueType;

#[derive(Parser)]
#[command(name = "pdp-setup")]
#[command(about = "Inspect and edit PDP server configuration files", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file; repeat for several, the first one receives new paths
    #[arg(
        short,
        long = "config",
        global = true,
        env = "PDP_SETUP_CONFIG",
        value_delimiter = ','
    )]
    config: Vec<String>,

    /// Log filter, e.g. `info` or `pdp_setup_config=debug`
    #[arg(long, global = true, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a path
    Get {
        /// Slash separated path, e.g. server/ssl/enabled
        path: String,
    },

    /// Set the value at a path and save the affected files
    Set {
        path: String,
        value: String,
        #[arg(short = 't', long = "type", value_enum, default_value = "string")]
        value_type: ValueType,
    },

    /// Show validity and save state of every setup section
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that a keystore opens and contains an alias
    Keystore {
        #[arg(short, long)]
        path: String,
        #[arg(short = 't', long = "type", default_value = "PKCS12")]
        store_type: String,
        #[arg(short = 'p', long)]
        password: String,
        #[arg(short, long)]
        alias: String,
    },

    /// Print an Argon2 hash for the admin password (read from stdin if omitted)
    HashPassword { password: Option<String> },

    /// Rate a password
    Strength { password: String },
}

#[derive(Serialize)]
struct SectionStatus {
    name: &'static str,
    valid: bool,
    saved: bool,
}

#[derive(Serialize)]
struct StatusReport {
    sources: Vec<PathBuf>,
    sections: Vec<SectionStatus>,
    progress: SetupProgress,
    ready_for_restart: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let discovery = cli
        .config
        .iter()
        .fold(SourceDiscovery::new().without_env(), |discovery, location| {
            discovery.with_location(location.as_str())
        });

    let result = match cli.command {
        Commands::Get { path } => cmd_get(&discovery, &path),
        Commands::Set {
            path,
            value,
            value_type,
        } => cmd_set(&discovery, &path, &value, value_type),
        Commands::Status { json } => cmd_status(&discovery, json),
        Commands::Keystore {
            path,
            store_type,
            password,
            alias,
        } => cmd_keystore(&path, &store_type, &password, &alias),
        Commands::HashPassword { password } => cmd_hash_password(password),
        Commands::Strength { password } => {
            println!("{}", strength_label(&password));
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}

fn open_documents(discovery: &SourceDiscovery) -> Result<ConfigDocumentSet, String> {
    ConfigDocumentSet::from_sources(discovery.discover()).map_err(|e| e.to_string())
}

fn cmd_get(discovery: &SourceDiscovery, path: &str) -> Result<(), String> {
    let docs = open_documents(discovery)?;
    match docs.get_at(path) {
        Some(value) => println!("{value}"),
        None => println!("{}", "(not set)".yellow()),
    }
    Ok(())
}

fn cmd_set(
    discovery: &SourceDiscovery,
    path: &str,
    raw: &str,
    value_type: ValueType,
) -> Result<(), String> {
    let value = input::parse_value(raw, value_type)?;
    let mut docs = open_documents(discovery)?;
    docs.set_at(path, value.clone()).map_err(|e| e.to_string())?;
    let written = docs.persist_all().map_err(|e| e.to_string())?;

    if written == 0 {
        println!("{} {} already {}", "✓".green(), path.cyan(), value);
    } else {
        println!(
            "{} Set {} = {} ({} file(s) written)",
            "✓".green(),
            path.cyan(),
            value,
            written
        );
    }
    Ok(())
}

fn section_status(section: &dyn ConfigSection) -> SectionStatus {
    SectionStatus {
        name: section.name(),
        valid: section.is_valid_config(),
        saved: section.is_saved(),
    }
}

fn cmd_status(discovery: &SourceDiscovery, json: bool) -> Result<(), String> {
    let session = SetupSession::open(discovery.discover()).map_err(|e| e.to_string())?;
    let report = StatusReport {
        sources: session
            .documents()
            .documents()
            .iter()
            .map(|doc| doc.source().to_path_buf())
            .collect(),
        sections: vec![
            section_status(session.dbms()),
            section_status(session.admin_user()),
            section_status(session.http_endpoint()),
            section_status(session.rsocket_endpoint()),
            section_status(session.api_authentication()),
        ],
        progress: session.progress(),
        ready_for_restart: session.ready_for_restart(),
    };

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Failed to render status: {e}"))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("{}", "Sources:".bold());
    for source in &report.sources {
        let marker = if source.exists() { "•".cyan() } else { "•".yellow() };
        println!("  {} {}", marker, source.display());
    }
    println!();
    println!("{}", "Sections:".bold());
    for section in &report.sections {
        let valid = if section.valid { "valid".green() } else { "invalid".red() };
        println!("  {:<20} {}", section.name, valid);
    }
    println!();
    let http = session.http_endpoint();
    println!(
        "  HTTP:    {}:{} (TLS {})",
        http.address().cyan(),
        http.port(),
        if http.tls_enabled() { "on" } else { "off" }
    );
    if !http.port_matches_protocol() {
        println!(
            "  {} port {} is unusual for this protocol",
            "Warning:".yellow().bold(),
            http.port()
        );
    }
    let rsocket = session.rsocket_endpoint();
    println!(
        "  RSocket: {}:{} (TLS {})",
        rsocket.address().cyan(),
        rsocket.port(),
        if rsocket.tls_enabled() { "on" } else { "off" }
    );
    println!();

    let progress = &report.progress;
    let endpoints_configured = progress.http_address_configured
        && progress.http_port_configured
        && progress.rsocket_port_configured;
    println!(
        "  Endpoint paths: {}",
        if endpoints_configured {
            "present".green()
        } else {
            "missing".yellow()
        }
    );
    if report.ready_for_restart {
        println!("{} Ready for restart", "✓".green());
    } else {
        println!("{} Not ready for restart", "✗".yellow());
    }
    Ok(())
}

fn cmd_keystore(path: &str, store_type: &str, password: &str, alias: &str) -> Result<(), String> {
    pdp_setup_config::keystore::verify_alias(path, store_type, password, alias)
        .map_err(|e| format!("{e} [{}]", e.category()))?;
    println!("{} Keystore {} contains alias {}", "✓".green(), path.cyan(), alias.cyan());
    Ok(())
}

fn cmd_hash_password(password: Option<String>) -> Result<(), String> {
    let password = match password {
        Some(password) => password,
        None => {
            let mut line = String::new();
            std::io::stdin()
                .read_line(&mut line)
                .map_err(|e| format!("Failed to read password: {e}"))?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };
    if password.is_empty() {
        return Err("Password must not be empty".to_string());
    }

    eprintln!("Password strength: {}", strength_label(&password));
    let hash = sections::hash_password(&password).map_err(|e| e.to_string())?;
    println!("{hash}");
    Ok(())
}

fn strength_label(password: &str) -> ColoredString {
    match sections::password_strength(password) {
        PasswordStrength::Weak => "weak".red(),
        PasswordStrength::Moderate => "moderate".yellow(),
        PasswordStrength::Strong => "strong".green(),
    }
}
