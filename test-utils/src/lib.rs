//! Test helpers for vboxmon.
//!
//! [`FakeHypervisor`] is an in-memory [`ProcessRunner`] that understands the
//! hypervisor commands vboxmon issues and answers them from scripted
//! machine state. Every call is recorded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tempfile::TempDir;
use vboxmon::{
    CredentialStore, MetricKind, ProcessOutcome, ProcessOutput, ProcessRunner, VBoxManage,
    VboxError, VboxResult,
};

/// Scripted answer to `metrics query <id> <counter>`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricReply {
    /// Value text printed after the counter name.
    Value(String),
    /// Counter line present with nothing after it.
    Empty,
    /// Invocation fails to spawn.
    SpawnError,
}

#[derive(Debug, Clone)]
struct FakeMachine {
    id: String,
    name: String,
    state: String,
    os_type: Option<String>,
    metrics: HashMap<MetricKind, MetricReply>,
    /// Lifecycle commands succeed but change nothing.
    frozen: bool,
    /// Lifecycle commands exit nonzero.
    reject_lifecycle: bool,
    /// `showvminfo` exits nonzero.
    info_fails: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    machines: Vec<FakeMachine>,
    calls: Vec<Vec<String>>,
    listing_fails: bool,
    collect_hangs: bool,
    setup_fails: bool,
}

impl FakeState {
    fn machine(&self, id: &str) -> Option<&FakeMachine> {
        self.machines.iter().find(|m| m.id == id)
    }

    fn machine_mut(&mut self, id: &str) -> Option<&mut FakeMachine> {
        self.machines.iter_mut().find(|m| m.id == id)
    }
}

/// In-memory hypervisor.
#[derive(Debug, Default)]
pub struct FakeHypervisor {
    state: Mutex<FakeState>,
}

impl FakeHypervisor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Facade routed through this fake.
    pub fn manage(self: &Arc<Self>) -> VBoxManage {
        VBoxManage::new(self.clone())
    }

    /// Register a machine in `state` (raw `VMState` text).
    pub fn add_machine(&self, id: &str, name: &str, state: &str) {
        self.state.lock().machines.push(FakeMachine {
            id: id.to_string(),
            name: name.to_string(),
            state: state.to_string(),
            os_type: Some("Linux_64".to_string()),
            metrics: HashMap::new(),
            frozen: false,
            reject_lifecycle: false,
            info_fails: false,
        });
    }

    pub fn set_state(&self, id: &str, state: &str) {
        self.update(id, |m| m.state = state.to_string());
    }

    pub fn set_os_type(&self, id: &str, os_type: Option<&str>) {
        self.update(id, |m| m.os_type = os_type.map(str::to_string));
    }

    pub fn set_metric(&self, id: &str, kind: MetricKind, value: &str) {
        self.set_metric_reply(id, kind, MetricReply::Value(value.to_string()));
    }

    pub fn set_metric_reply(&self, id: &str, kind: MetricKind, reply: MetricReply) {
        self.update(id, |m| {
            m.metrics.insert(kind, reply);
        });
    }

    /// Answer every counter of `id` with the same reply.
    pub fn set_all_metrics(&self, id: &str, reply: MetricReply) {
        for kind in MetricKind::ALL {
            self.set_metric_reply(id, kind, reply.clone());
        }
    }

    pub fn freeze(&self, id: &str, frozen: bool) {
        self.update(id, |m| m.frozen = frozen);
    }

    pub fn reject_lifecycle(&self, id: &str, reject: bool) {
        self.update(id, |m| m.reject_lifecycle = reject);
    }

    pub fn fail_info(&self, id: &str, fails: bool) {
        self.update(id, |m| m.info_fails = fails);
    }

    pub fn fail_listing(&self, fails: bool) {
        self.state.lock().listing_fails = fails;
    }

    /// `metrics collect` never finishes within any timeout.
    pub fn hang_collect(&self, hangs: bool) {
        self.state.lock().collect_hangs = hangs;
    }

    pub fn fail_setup(&self, fails: bool) {
        self.state.lock().setup_fails = fails;
    }

    pub fn state_of(&self, id: &str) -> Option<String> {
        self.state.lock().machine(id).map(|m| m.state.clone())
    }

    /// Every recorded invocation, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded invocations starting with `prefix`.
    pub fn count_calls(&self, prefix: &[&str]) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| {
                call.len() >= prefix.len() && call.iter().zip(prefix).all(|(a, b)| a == b)
            })
            .count()
    }

    fn update(&self, id: &str, apply: impl FnOnce(&mut FakeMachine)) {
        let mut state = self.state.lock();
        let machine = state
            .machine_mut(id)
            .unwrap_or_else(|| panic!("unknown fake machine {}", id));
        apply(machine);
    }

    fn respond(&self, args: &[String], timeout: Option<Duration>) -> VboxResult<ProcessOutcome> {
        let mut state = self.state.lock();
        state.calls.push(args.to_vec());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = match args.as_slice() {
            ["list", "vms"] => {
                if state.listing_fails {
                    ProcessOutput::failed(1, "VBoxManage: error: Failed to create the VirtualBox object!")
                } else {
                    let listing: String = state
                        .machines
                        .iter()
                        .map(|m| format!("\"{}\" {{{}}}\n", m.name, m.id))
                        .collect();
                    ProcessOutput::ok(listing)
                }
            }
            ["showvminfo", id, "--machinereadable"] => match state.machine(id) {
                Some(m) if !m.info_fails => {
                    let mut dump = format!("name=\"{}\"\nUUID=\"{}\"\n", m.name, m.id);
                    if let Some(os) = &m.os_type {
                        dump.push_str(&format!("ostype=\"{}\"\n", os));
                    }
                    dump.push_str(&format!("VMState=\"{}\"\nmemory=2048\n", m.state));
                    ProcessOutput::ok(dump)
                }
                _ => ProcessOutput::failed(
                    1,
                    format!("VBoxManage: error: Could not find a registered machine named '{}'", id),
                ),
            },
            ["metrics", "enable"] => ProcessOutput::ok(""),
            ["metrics", "collect"] => {
                if state.collect_hangs && timeout.is_some() {
                    return Ok(ProcessOutcome::TimedOut);
                }
                ProcessOutput::ok("")
            }
            ["metrics", "setup", ..] => {
                if state.setup_fails {
                    ProcessOutput::failed(1, "setup rejected")
                } else {
                    ProcessOutput::ok("")
                }
            }
            ["metrics", "query", id, counter] => {
                let Some(machine) = state.machine(id) else {
                    return Ok(ProcessOutcome::Completed(ProcessOutput::failed(1, "no such machine")));
                };
                let reply = MetricKind::from_raw_name(counter)
                    .and_then(|kind| machine.metrics.get(&kind).cloned());
                let header = "Object          Metric                   Values\n\
                              --------------- ----------------------   ------\n";
                match reply {
                    None => ProcessOutput::ok(header),
                    Some(MetricReply::Empty) => {
                        ProcessOutput::ok(format!("{}{} {}\n", header, machine.name, counter))
                    }
                    Some(MetricReply::Value(value)) => ProcessOutput::ok(format!(
                        "{}{} {} {}\n",
                        header, machine.name, counter, value
                    )),
                    Some(MetricReply::SpawnError) => {
                        return Err(VboxError::Process("failed to spawn fake".to_string()));
                    }
                }
            }
            ["startvm", id, ..] => apply_lifecycle(&mut state, id, "running"),
            ["controlvm", id, action] => {
                let target = match *action {
                    "acpipowerbutton" | "poweroff" => "poweroff",
                    "pause" => "paused",
                    "savestate" => "saved",
                    "resume" => "running",
                    other => {
                        return Ok(ProcessOutcome::Completed(ProcessOutput::failed(
                            2,
                            format!("unknown controlvm action {}", other),
                        )));
                    }
                };
                apply_lifecycle(&mut state, id, target)
            }
            ["guestcontrol", id, "run", ..] => match state.machine(id) {
                Some(_) => ProcessOutput::ok(format!(
                    "ran {}\n",
                    args.get(8..).unwrap_or_default().join(" ")
                )),
                None => ProcessOutput::failed(1, "no such machine"),
            },
            _ => ProcessOutput::failed(2, format!("unsupported command: {}", args.join(" "))),
        };

        Ok(ProcessOutcome::Completed(output))
    }
}

fn apply_lifecycle(state: &mut FakeState, id: &str, target: &str) -> ProcessOutput {
    match state.machine_mut(id) {
        Some(m) if m.reject_lifecycle => {
            ProcessOutput::failed(1, format!("VBoxManage: error: Machine '{}' is locked", m.name))
        }
        Some(m) => {
            if !m.frozen {
                m.state = target.to_string();
            }
            ProcessOutput::ok("")
        }
        None => ProcessOutput::failed(1, "no such machine"),
    }
}

#[async_trait]
impl ProcessRunner for FakeHypervisor {
    async fn execute(
        &self,
        args: &[String],
        timeout: Option<Duration>,
    ) -> VboxResult<ProcessOutcome> {
        self.respond(args, timeout)
    }
}

/// Credential store loaded from a throwaway document.
///
/// Keep the returned directory alive as long as the store's source path
/// matters.
pub fn credentials_from_json(json: &str) -> (CredentialStore, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("users.json");
    std::fs::write(&path, json).expect("Failed to write credential document");
    let store = CredentialStore::from_file(&path).expect("Failed to load credential document");
    (store, dir)
}
