//! StackWise diagnostics capture for one logged-in switch.

use std::path::PathBuf;

use chrono::Local;
use log::{debug, info};

use super::artifacts::{ArtifactStore, HostLog};
use super::inventory::stack_members;
use crate::channel::ShellIo;
use crate::error::Result;
use crate::session::JumpHostSession;

/// Written at the top of every run's section in the host log.
pub const SEPARATOR: &str = "\n\n\n\n=======================================\n";

/// Stack-wide summaries captured before the per-member registers.
pub const SUMMARY_COMMANDS: [&str; 4] = [
    "show clock",
    "show switch",
    "show switch stack-ports",
    "show switch stack-ports summ",
];

/// ASIC register counting CRC errors on the stack ring.
pub const REGISTER_READ: &str = "show platform port-asic 0 read register SifRacRwCrcErrorCnt";

/// Register read for one stack member.
pub fn register_read_command(member: &str) -> String {
    format!("{} switch {}", REGISTER_READ, member)
}

/// Files written for one switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureReport {
    pub host: String,
    pub host_log: PathBuf,
    pub member_files: Vec<PathBuf>,
}

/// Capture summaries and per-member registers from the switch the
/// session is logged into, then log out of it.
///
/// Everything the switch printed is appended to the host log as it
/// arrives. On error the switch shell is left open for the caller to
/// resync.
pub async fn capture_host<S: ShellIo>(
    session: &mut JumpHostSession<S>,
    store: &ArtifactStore,
    host: &str,
) -> Result<CaptureReport> {
    session.discover_prompt().await?;

    let mut log = store.open_host_log(host).await?;
    log.append(SEPARATOR).await?;

    info!("{}: capturing stack summaries", host);
    for command in SUMMARY_COMMANDS {
        run_logged(session, &mut log, command).await?;
    }

    let members = stack_members(session).await?;
    // One timestamp per run names every member file of that run
    let at = Local::now();

    let mut member_files = Vec::with_capacity(members.len());
    for member in &members {
        debug!("{}: reading registers of member {}", host, member);
        let output = run_logged(session, &mut log, &register_read_command(member)).await?;
        let path = store.write_member_file(host, member, &output, &at).await?;
        member_files.push(path);
    }

    session.logout_switch().await?;

    info!(
        "{}: captured {} member register dump(s) to {}",
        host,
        member_files.len(),
        store.dir().display()
    );
    Ok(CaptureReport {
        host: host.to_string(),
        host_log: log.path().to_path_buf(),
        member_files,
    })
}

async fn run_logged<S: ShellIo>(
    session: &mut JumpHostSession<S>,
    log: &mut HostLog,
    command: &str,
) -> Result<String> {
    let output = session.run_command(command).await?;
    log.append(&output.before).await?;
    Ok(output.before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNetwork, FakeShell, FakeSwitch, switch_credentials, test_expect_config};

    async fn logged_in(network: FakeNetwork, host: &str) -> JumpHostSession<FakeShell> {
        let mut session = JumpHostSession::establish(network.into_shell(), "jump", test_expect_config())
            .await
            .unwrap();
        session
            .login_switch(host, &switch_credentials(), false)
            .await
            .unwrap();
        session
    }

    #[test]
    fn test_separator_shape() {
        assert!(SEPARATOR.starts_with("\n\n\n\n="));
        assert_eq!(SEPARATOR.matches('=').count(), 39);
        assert!(SEPARATOR.ends_with("=\n"));
    }

    #[test]
    fn test_register_read_command() {
        assert_eq!(
            register_read_command("2"),
            "show platform port-asic 0 read register SifRacRwCrcErrorCnt switch 2"
        );
    }

    #[tokio::test]
    async fn test_capture_writes_log_and_member_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let network = FakeNetwork::new().with_switch(FakeSwitch::new("sw-b", &["1", "2"]));
        let mut session = logged_in(network, "sw-b").await;

        let report = capture_host(&mut session, &store, "sw-b").await.unwrap();

        assert_eq!(report.host_log, dir.path().join("sw-b.output"));
        assert_eq!(report.member_files.len(), 2);
        let names: Vec<String> = report
            .member_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names[0].starts_with("sw-b_1_"));
        assert!(names[1].starts_with("sw-b_2_"));
        // sw-b_1_YYYYMMDDTHHMMSS
        assert_eq!(names[0].len(), "sw-b_1_".len() + 15);

        let member_two = std::fs::read_to_string(&report.member_files[1]).unwrap();
        assert!(member_two.contains("SifRacRwCrcErrorCnt switch 2"));
        assert!(member_two.contains("0x0000002a"));
        assert!(!member_two.contains("switch 1"));

        let log = std::fs::read_to_string(&report.host_log).unwrap();
        assert!(log.starts_with(SEPARATOR));
        for command in SUMMARY_COMMANDS {
            assert!(log.contains(command), "{command} missing from host log");
        }
        assert!(log.contains(&member_two));

        // Logged out again, back at the jump host
        assert!(session.nested().is_none());
    }

    #[tokio::test]
    async fn test_commands_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let network = FakeNetwork::new().with_switch(FakeSwitch::new("sw-b", &["1", "2"]));
        let mut session = logged_in(network, "sw-b").await;
        let already_sent = session.channel.io_mut().written().len();

        capture_host(&mut session, &store, "sw-b").await.unwrap();

        let written = String::from_utf8_lossy(&session.channel.io_mut().written()[already_sent..])
            .into_owned();
        let commands: Vec<&str> = written.lines().collect();
        assert_eq!(
            commands,
            vec![
                "",
                "show clock",
                "show switch",
                "show switch stack-ports",
                "show switch stack-ports summ",
                "",
                "show switch",
                "show platform port-asic 0 read register SifRacRwCrcErrorCnt switch 1",
                "show platform port-asic 0 read register SifRacRwCrcErrorCnt switch 2",
                "exit",
            ]
        );
    }

    #[tokio::test]
    async fn test_second_run_appends_to_host_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let network = FakeNetwork::new().with_switch(FakeSwitch::new("sw-b", &["1"]));
        let mut session = logged_in(network, "sw-b").await;

        let first = capture_host(&mut session, &store, "sw-b").await.unwrap();
        let once = std::fs::read_to_string(&first.host_log).unwrap();

        session
            .login_switch("sw-b", &switch_credentials(), false)
            .await
            .unwrap();
        capture_host(&mut session, &store, "sw-b").await.unwrap();
        let twice = std::fs::read_to_string(&first.host_log).unwrap();

        assert_eq!(twice.matches(SEPARATOR).count(), 2);
        assert_eq!(twice.len(), once.len() * 2);
    }

    #[tokio::test]
    async fn test_hanging_command_keeps_partial_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let network = FakeNetwork::new()
            .with_switch(FakeSwitch::new("sw-b", &["1"]).hang_on("show switch stack-ports"));
        let mut session = logged_in(network, "sw-b").await;

        let err = capture_host(&mut session, &store, "sw-b").await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Channel(crate::error::ChannelError::PatternTimeout { .. })
        ));

        let log = std::fs::read_to_string(store.host_log_path("sw-b")).unwrap();
        assert!(log.contains("show clock"));
        assert!(!log.contains("stack-ports"));
        // Still inside the switch; the caller resyncs
        assert!(session.nested().is_some());
    }
}
