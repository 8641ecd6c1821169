//! FGP daemon for GitHub contribution calendars.
//!
//! Builds a year-long contribution heat map for a GitHub user, with quartile
//! intensity levels and current/longest streaks. When the API is unavailable
//! a simulated calendar is served instead, flagged as such.
//!
//! # Usage
//! ```bash
//! fgp-contributions start           # Start daemon in background
//! fgp-contributions start -f        # Start in foreground
//! fgp-contributions stop            # Stop daemon
//! fgp-contributions status          # Check daemon status
//! fgp-contributions show octocat    # One-shot fetch, no daemon
//! fgp-contributions demo --seed 7   # Simulated calendar
//! ```
//!
//! # Authentication
//! Token resolution order:
//! 1. GITHUB_TOKEN environment variable
//! 2. GH_TOKEN environment variable
//! 3. gh CLI config (~/.config/gh/hosts.yml)
//!
//! With a token the GraphQL contribution calendar is used. Without one the
//! public event log (last 100 events) is tallied per day.
//!
//! # Methods
//! - `contributions.calendar` - Calendar, levels and streaks for a user
//! - `contributions.synthetic` - Simulated calendar for demos
//!
//! # Test
//! ```bash
//! fgp call contributions.calendar -p '{"username": "octocat"}'
//! fgp call contributions.synthetic -p '{"seed": 7, "layout": true}'
//! ```
//!
//! CHANGELOG (recent first, max 5 entries)
//! 10/16/2026 - Contribution calendar daemon with show/demo commands

mod api;
mod cache;
mod calendar;
mod models;
mod service;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fgp_daemon::{cleanup_socket, FgpServer};
use std::path::Path;
use std::process::Command;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::calendar::CalendarLayout;
use crate::models::ContributionReport;
use crate::service::ContributionsService;

const DEFAULT_SOCKET: &str = "~/.fgp/services/contributions/daemon.sock";
const DEFAULT_CACHE_TTL_SECS: u64 = 600;

#[derive(Parser)]
#[command(name = "fgp-contributions")]
#[command(about = "FGP daemon for GitHub contribution calendars and streaks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the FGP daemon
    Start {
        /// Socket path (default: ~/.fgp/services/contributions/daemon.sock)
        #[arg(short, long, default_value = DEFAULT_SOCKET)]
        socket: String,

        /// Run in foreground (don't daemonize)
        #[arg(short, long)]
        foreground: bool,

        /// Seconds to reuse a fetched calendar (0 disables caching)
        #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
        cache_ttl: u64,
    },

    /// Stop the running daemon
    Stop {
        /// Socket path
        #[arg(short, long, default_value = DEFAULT_SOCKET)]
        socket: String,
    },

    /// Check daemon status
    Status {
        /// Socket path
        #[arg(short, long, default_value = DEFAULT_SOCKET)]
        socket: String,
    },

    /// Fetch and print a user's contribution calendar
    Show {
        /// GitHub username
        username: String,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Fail instead of showing simulated data
        #[arg(long)]
        no_fallback: bool,

        /// Include the week grid (heat map in text mode)
        #[arg(long)]
        grid: bool,
    },

    /// Print a simulated contribution calendar
    Demo {
        /// Seed for a reproducible calendar
        #[arg(long)]
        seed: Option<u64>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Include the week grid (heat map in text mode)
        #[arg(long)]
        grid: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            socket,
            foreground,
            cache_ttl,
        } => cmd_start(socket, foreground, Duration::from_secs(cache_ttl)),
        Commands::Stop { socket } => cmd_stop(socket),
        Commands::Status { socket } => cmd_status(socket),
        Commands::Show {
            username,
            json,
            no_fallback,
            grid,
        } => cmd_show(&username, json, !no_fallback, grid),
        Commands::Demo { seed, json, grid } => cmd_demo(seed, json, grid),
    }
}

/// Logging for one-shot commands: RUST_LOG, else warnings only, on stderr.
fn init_cli_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

fn serve(socket_path: &str, cache_ttl: Duration) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("fgp_contributions=debug,fgp_daemon=debug")
        .init();

    // Token is resolved inside ContributionsService::new
    let service = ContributionsService::new(None, cache_ttl)
        .context("Failed to create ContributionsService")?;
    let server = FgpServer::new(service, socket_path).context("Failed to create FGP server")?;
    server.serve().context("Server error")?;
    Ok(())
}

fn cmd_start(socket: String, foreground: bool, cache_ttl: Duration) -> Result<()> {
    let socket_path = shellexpand::tilde(&socket).to_string();

    // Create parent directory
    if let Some(parent) = Path::new(&socket_path).parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    let pid_file = format!("{}.pid", socket_path);

    println!("Starting fgp-contributions daemon...");
    println!("Socket: {}", socket_path);
    println!("Cache TTL: {}s", cache_ttl.as_secs());
    println!();
    println!("Available methods:");
    println!("  contributions.calendar   - Calendar, levels and streaks for a user");
    println!("  contributions.synthetic  - Simulated calendar for demos");
    println!();
    println!("Test with:");
    println!("  fgp call contributions.calendar -p '{{\"username\": \"octocat\"}}'");
    println!("  fgp call contributions.synthetic -p '{{\"seed\": 7}}'");
    println!();

    if foreground {
        serve(&socket_path, cache_ttl)?;
    } else {
        // Background mode - daemonize first, THEN create service
        // Tokio runtime must be created AFTER fork
        use daemonize::Daemonize;

        let daemonize = Daemonize::new()
            .pid_file(&pid_file)
            .working_directory("/tmp");

        match daemonize.start() {
            Ok(_) => serve(&socket_path, cache_ttl)?,
            Err(e) => {
                eprintln!("Failed to daemonize: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn cmd_stop(socket: String) -> Result<()> {
    let socket_path = shellexpand::tilde(&socket).to_string();
    let pid_file = format!("{}.pid", socket_path);

    if Path::new(&socket_path).exists() {
        if let Ok(client) = fgp_daemon::FgpClient::new(&socket_path) {
            if let Ok(response) = client.stop() {
                if response.ok {
                    println!("Daemon stopped.");
                    return Ok(());
                }
            }
        }
    }

    // Read PID
    let pid_str = std::fs::read_to_string(&pid_file)
        .context("Failed to read PID file - daemon may not be running")?;
    let pid: i32 = pid_str.trim().parse().context("Invalid PID in file")?;

    if !pid_matches_process(pid, "fgp-contributions") {
        anyhow::bail!("Refusing to stop PID {}: unexpected process", pid);
    }

    println!("Stopping fgp-contributions daemon (PID: {})...", pid);

    // Send SIGTERM
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }

    // Wait a moment for cleanup
    std::thread::sleep(std::time::Duration::from_millis(500));

    // Cleanup files
    let _ = cleanup_socket(&socket_path, Some(Path::new(&pid_file)));
    let _ = std::fs::remove_file(&pid_file);

    println!("Daemon stopped.");

    Ok(())
}

fn pid_matches_process(pid: i32, expected_name: &str) -> bool {
    let output = Command::new("ps")
        .args(["-p", &pid.to_string(), "-o", "comm="])
        .output();

    match output {
        // comm is truncated to 15 characters on Linux
        Ok(output) if output.status.success() => {
            let command = String::from_utf8_lossy(&output.stdout);
            let command = command.trim();
            (!command.is_empty() && expected_name.starts_with(command))
                || command.contains(expected_name)
        }
        _ => false,
    }
}

fn cmd_status(socket: String) -> Result<()> {
    let socket_path = shellexpand::tilde(&socket).to_string();

    // Check if socket exists
    if !Path::new(&socket_path).exists() {
        println!("Status: NOT RUNNING");
        println!("Socket {} does not exist", socket_path);
        return Ok(());
    }

    // Try to connect and send health check
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixStream;

    match UnixStream::connect(&socket_path) {
        Ok(mut stream) => {
            // Send health request
            let request = r#"{"id":"status","v":1,"method":"health","params":{}}"#;
            writeln!(stream, "{}", request)?;
            stream.flush()?;

            // Read response
            let mut reader = BufReader::new(stream);
            let mut response = String::new();
            reader.read_line(&mut response)?;

            println!("Status: RUNNING");
            println!("Socket: {}", socket_path);
            println!("Health: {}", response.trim());
        }
        Err(e) => {
            println!("Status: NOT RESPONDING");
            println!("Socket exists but connection failed: {}", e);
        }
    }

    Ok(())
}

fn cmd_show(username: &str, json: bool, fallback: bool, grid: bool) -> Result<()> {
    init_cli_logging();

    // No cache for a single request
    let service = ContributionsService::new(None, Duration::ZERO)
        .context("Failed to create ContributionsService")?;
    let report = service.calendar_report(username, fallback)?;

    print_report(report, json, grid)
}

fn cmd_demo(seed: Option<u64>, json: bool, grid: bool) -> Result<()> {
    init_cli_logging();
    print_report(ContributionsService::synthetic_report(seed), json, grid)
}

fn print_report(report: ContributionReport, json: bool, grid: bool) -> Result<()> {
    if json {
        let report = if grid { report.with_layout() } else { report };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    let stats = &report.summary.stats;
    match &report.username {
        Some(username) => println!(
            "{} contributions in the last year ({})",
            stats.total, username
        ),
        None => println!("{} contributions in the last year", stats.total),
    }
    println!("Current streak: {} days", stats.current_streak);
    println!("Longest streak: {} days", stats.longest_streak);

    if let Some(notice) = &report.notice {
        println!();
        println!("Demo mode - {}", notice);
    } else if report.simulated {
        println!("Demo mode - simulated data");
    }

    if grid {
        println!();
        print!(
            "{}",
            CalendarLayout::from_calendar(&report.summary.contributions).render()
        );
        println!("    Less · ░ ▒ ▓ █ More");
    }

    Ok(())
}
