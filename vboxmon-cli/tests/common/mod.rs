#![allow(dead_code)]

use assert_cmd::Command;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::time::Duration;
use tempfile::TempDir;

// Writing an executable while another test forks can fail with ETXTBSY,
// so tests run one at a time.
static TEST_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Stand-in for VBoxManage. Machine state lives in files next to the
/// script: `vms.txt` holds the listing, `<id>.state` / `<id>.name` the
/// per-machine attributes, and `<id>.locked` makes lifecycle commands fail.
const FAKE_VBOXMANAGE: &str = r#"#!/bin/sh
DIR="$(dirname "$0")"
echo "$*" >> "$DIR/calls.log"

case "$1" in
  list)
    if [ -f "$DIR/listing.broken" ]; then
      echo "VBoxManage: error: Failed to create the VirtualBox object!" >&2
      exit 1
    fi
    cat "$DIR/vms.txt"
    ;;
  showvminfo)
    if [ ! -f "$DIR/$2.state" ]; then
      echo "VBoxManage: error: Could not find a registered machine named '$2'" >&2
      exit 1
    fi
    echo "name=\"$(cat "$DIR/$2.name")\""
    echo "ostype=\"Ubuntu_64\""
    echo "VMState=\"$(cat "$DIR/$2.state")\""
    echo "memory=2048"
    ;;
  startvm|controlvm)
    if [ -f "$DIR/$2.locked" ]; then
      echo "VBoxManage: error: The machine '$2' is already locked for a session" >&2
      exit 1
    fi
    if [ "$1" = "startvm" ]; then
      target=running
    else
      case "$3" in
        acpipowerbutton|poweroff) target=poweroff ;;
        pause) target=paused ;;
        savestate) target=saved ;;
        resume) target=running ;;
        *) echo "unknown action $3" >&2; exit 2 ;;
      esac
    fi
    echo "$target" > "$DIR/$2.state"
    ;;
  metrics)
    case "$2" in
      query)
        echo "Object          Metric                   Values"
        case "$4" in
          Guest/CPU/Load/User) echo "vm $4 12.5%" ;;
          Guest/CPU/Load/Kernel) echo "vm $4 2.5%" ;;
          Guest/RAM/Usage/Total) echo "vm $4 2048 kB" ;;
          Guest/RAM/Usage/Free) echo "vm $4 1024 kB" ;;
          Disk/Usage/Used) echo "vm $4 1 GB" ;;
        esac
        ;;
    esac
    ;;
  *)
    echo "unsupported: $*" >&2
    exit 2
    ;;
esac
"#;

pub struct TestContext {
    pub dir: TempDir,
    pub script: PathBuf,
    // Hold the lock until the test is done
    pub _guard: MutexGuard<'static, ()>,
}

impl TestContext {
    /// Command for the CLI binary wired to the fake hypervisor.
    pub fn new_cmd(&self) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_vboxmon");
        let mut cmd = Command::new(bin_path);
        cmd.timeout(Duration::from_secs(30));
        cmd.current_dir(self.dir.path());
        cmd.env("VBOXMON_VBOXMANAGE", &self.script);
        cmd.env("VBOXMON_SETTLE_MS", "0");
        cmd.env("VBOXMON_INTERVAL_MS", "20");
        cmd.env("HOME", self.dir.path());
        cmd.env("XDG_CONFIG_HOME", self.dir.path().join("config"));
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn add_machine(&self, id: &str, name: &str, state: &str) {
        let listing = self.path("vms.txt");
        let mut content = std::fs::read_to_string(&listing).unwrap_or_default();
        content.push_str(&format!("\"{}\" {{{}}}\n", name, id));
        std::fs::write(&listing, content).unwrap();
        std::fs::write(self.path(&format!("{}.name", id)), name).unwrap();
        self.set_state(id, state);
    }

    pub fn set_state(&self, id: &str, state: &str) {
        std::fs::write(self.path(&format!("{}.state", id)), format!("{}\n", state)).unwrap();
    }

    pub fn state(&self, id: &str) -> String {
        std::fs::read_to_string(self.path(&format!("{}.state", id)))
            .unwrap()
            .trim()
            .to_string()
    }

    pub fn lock_machine(&self, id: &str) {
        std::fs::write(self.path(&format!("{}.locked", id)), "").unwrap();
    }

    pub fn break_listing(&self) {
        std::fs::write(self.path("listing.broken"), "").unwrap();
    }

    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.path("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn write_script(dir: &Path) -> PathBuf {
    let script = dir.join("vboxmanage");
    std::fs::write(&script, FAKE_VBOXMANAGE).unwrap();
    let mut permissions = std::fs::metadata(&script).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&script, permissions).unwrap();
    script
}

pub fn vboxmon() -> TestContext {
    let lock = TEST_LOCK.get_or_init(|| Mutex::new(()));
    let guard = lock.lock().unwrap_or_else(|e| e.into_inner());

    let dir = TempDir::new().expect("Failed to create temp dir");
    let script = write_script(dir.path());
    std::fs::write(dir.path().join("vms.txt"), "").unwrap();

    TestContext {
        dir,
        script,
        _guard: guard,
    }
}
