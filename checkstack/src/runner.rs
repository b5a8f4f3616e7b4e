//! Host list driver: visits every switch in order over one jump-host
//! session.

use log::{error, info, warn};

use crate::capture::{ArtifactStore, CaptureReport, capture_host};
use crate::channel::ShellIo;
use crate::config::FailurePolicy;
use crate::credentials::SwitchCredentials;
use crate::error::Result;
use crate::hostlist::HostEntry;
use crate::reachability::ReachabilityProbe;
use crate::session::JumpHostSession;

/// What happened to one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOutcome {
    Captured(CaptureReport),
    /// The reachability check said no; nothing was attempted.
    Unreachable,
    /// Login or capture failed; the message is the error that stopped it.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostResult {
    pub host: String,
    pub outcome: HostOutcome,
}

/// Per-host outcomes of a completed run, in host list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub hosts: Vec<HostResult>,
}

impl RunSummary {
    pub fn captured(&self) -> usize {
        self.count(|o| matches!(o, HostOutcome::Captured(_)))
    }

    pub fn unreachable(&self) -> usize {
        self.count(|o| matches!(o, HostOutcome::Unreachable))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, HostOutcome::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&HostOutcome) -> bool) -> usize {
        self.hosts.iter().filter(|h| pred(&h.outcome)).count()
    }
}

/// Drives the per-host sequence: ping, log in, capture, log out.
pub struct Runner<'a, S, P> {
    session: &'a mut JumpHostSession<S>,
    probe: &'a P,
    store: &'a ArtifactStore,
    credentials: &'a SwitchCredentials,
    policy: FailurePolicy,
    accept_new_switch_keys: bool,
}

impl<'a, S: ShellIo, P: ReachabilityProbe> Runner<'a, S, P> {
    pub fn new(
        session: &'a mut JumpHostSession<S>,
        probe: &'a P,
        store: &'a ArtifactStore,
        credentials: &'a SwitchCredentials,
    ) -> Self {
        Self {
            session,
            probe,
            store,
            credentials,
            policy: FailurePolicy::default(),
            accept_new_switch_keys: false,
        }
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn accept_new_switch_keys(mut self, accept: bool) -> Self {
        self.accept_new_switch_keys = accept;
        self
    }

    /// Visit every host in order.
    ///
    /// Returns `Err` only when the run had to stop: a dead jump-host
    /// transport, a failed resync, or any host failure under
    /// [`FailurePolicy::AbortRun`].
    pub async fn run(mut self, hosts: &[HostEntry]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for entry in hosts {
            let host = entry.hostname.as_str();
            println!("trying host: {}", host);

            let outcome = self.visit(host).await?;
            summary.hosts.push(HostResult {
                host: host.to_string(),
                outcome,
            });
        }

        info!(
            "run finished: {} captured, {} unreachable, {} failed",
            summary.captured(),
            summary.unreachable(),
            summary.failed()
        );
        Ok(summary)
    }

    async fn visit(&mut self, host: &str) -> Result<HostOutcome> {
        if !self.probe.is_reachable(host).await {
            println!("Could not ping {}", host);
            return Ok(HostOutcome::Unreachable);
        }

        println!("Logging into switch {}", host);
        match self.capture(host).await {
            Ok(report) => Ok(HostOutcome::Captured(report)),
            Err(e) if e.is_transport_fatal() || self.policy == FailurePolicy::AbortRun => Err(e),
            Err(e) => {
                error!("{}: {}", host, e);
                warn!(
                    "{}: skipping host, returning to the {} prompt",
                    host,
                    self.session.host()
                );
                self.session.resync().await?;
                Ok(HostOutcome::Failed(e.to_string()))
            }
        }
    }

    async fn capture(&mut self, host: &str) -> Result<CaptureReport> {
        self.session
            .login_switch(host, self.credentials, self.accept_new_switch_keys)
            .await?;
        capture_host(self.session, self.store, host).await
    }
}
