//! Command-line entry point.
//!
//! ```bash
//! checkstack switches.txt
//! checkstack --jump-host bastion.example.net --output-dir captures switches.txt
//! RUST_LOG=debug checkstack --reachability skip switches.txt
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use checkstack::capture::ArtifactStore;
use checkstack::credentials::{self, TerminalPrompter};
use checkstack::reachability::{ReachabilityMode, ReachabilityStrategy};
use checkstack::transport::HostKeyVerification;
use checkstack::{JumpHostSession, RunConfig, RunSummary, Runner, hostlist};

/// Some hosts could not be captured.
const EXIT_HOSTS_FAILED: u8 = 3;

/// Collect StackWise cabling error counters from switch stacks behind a
/// jump host.
#[derive(Parser, Debug)]
#[command(name = "checkstack", version, about)]
struct Args {
    /// Host list: one `<label> <hostname>` pair per line
    hostfile: PathBuf,

    /// Jump host to relay through
    #[arg(long, env = "CHECKSTACK_JUMP_HOST", default_value = checkstack::config::DEFAULT_JUMP_HOST)]
    jump_host: String,

    /// Jump host SSH port
    #[arg(long, env = "CHECKSTACK_JUMP_PORT", default_value_t = 22)]
    jump_port: u16,

    /// Private key for the jump host (asks for its passphrase instead of a password)
    #[arg(long, env = "CHECKSTACK_JUMP_KEY")]
    jump_key: Option<PathBuf>,

    /// Jump host key checking: strict, accept-new or off
    #[arg(long, default_value_t = HostKeyVerification::AcceptNew)]
    host_key_checking: HostKeyVerification,

    /// known_hosts file (default: ~/.ssh/known_hosts)
    #[arg(long)]
    known_hosts: Option<PathBuf>,

    /// Seconds to wait for each prompt
    #[arg(long, env = "CHECKSTACK_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// Directory for host logs and member register files
    #[arg(long, env = "CHECKSTACK_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Reachability check: auto, windows, unix or skip
    #[arg(long, default_value_t = ReachabilityMode::Auto)]
    reachability: ReachabilityMode,

    /// Answer "yes" when the jump host does not know a switch's host key
    #[arg(long)]
    accept_new_switch_keys: bool,

    /// Stop at the first switch that fails
    #[arg(long)]
    fail_fast: bool,

    /// Copy the whole session, passwords included, to the terminal
    #[arg(long)]
    echo_session: bool,
}

impl Args {
    fn run_config(&self) -> checkstack::Result<RunConfig> {
        let mut builder = RunConfig::builder()
            .jump_host(&self.jump_host)
            .jump_port(self.jump_port)
            .host_key_verification(self.host_key_checking)
            .timeout(Duration::from_secs(self.timeout))
            .output_dir(&self.output_dir)
            .reachability(self.reachability)
            .accept_new_switch_keys(self.accept_new_switch_keys)
            .fail_fast(self.fail_fast)
            .echo_session(self.echo_session);

        if let Some(key) = &self.jump_key {
            builder = builder.jump_key(key);
        }
        if let Some(path) = &self.known_hosts {
            builder = builder.known_hosts_path(path);
        }

        builder.build()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Usage errors exit with status 2 before any network activity
    let args = Args::parse();

    match run(&args).await {
        Ok(summary) if summary.has_failures() => {
            eprintln!(
                "{} of {} host(s) failed",
                summary.failed(),
                summary.hosts.len()
            );
            ExitCode::from(EXIT_HOSTS_FAILED)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> checkstack::Result<RunSummary> {
    let config = args.run_config()?;
    let hosts = hostlist::read(&args.hostfile)?;

    let creds = credentials::collect(
        &mut TerminalPrompter,
        &config.jump_host,
        config.jump_key.is_some(),
    )?;

    println!("Opening connection to {}.", config.jump_host);
    let mut session = JumpHostSession::open(&config, &creds).await?;

    let probe = ReachabilityStrategy::from_mode(config.reachability);
    let store = ArtifactStore::new(&config.output_dir);

    let result = Runner::new(&mut session, &probe, &store, &creds.switch)
        .failure_policy(config.failure_policy)
        .accept_new_switch_keys(config.accept_new_switch_keys)
        .run(&hosts)
        .await;

    if let Err(e) = session.close().await {
        log::debug!("closing jump host session: {}", e);
    }
    result
}
