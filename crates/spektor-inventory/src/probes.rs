//! Inventory probes
//!
//! Each probe maps to one or a few commands run through the
//! [`CommandRunner`] seam and returns the facts for its section. A probe
//! fails with a reason string; the collector turns that into a placeholder
//! section plus a validation issue.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value, json};
use spektor_exec::{CommandResult, CommandRunner};
use tracing::{debug, warn};

use crate::parsers;

/// Maximum number of package entries kept in the software section
pub const PACKAGE_LIMIT: usize = 2000;

/// Shared state handed to every probe
pub struct ProbeContext<'a> {
    runner: &'a dyn CommandRunner,
    timeout: Duration,
    raw_dir: Option<&'a Path>,
}

impl<'a> ProbeContext<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        timeout: Duration,
        raw_dir: Option<&'a Path>,
    ) -> Self {
        Self {
            runner,
            timeout,
            raw_dir,
        }
    }

    /// Run one command, writing a raw-capture artifact when enabled
    pub async fn run(&self, label: &str, command: &str, args: &[&str]) -> CommandResult {
        let result = self.runner.run(command, args, self.timeout).await;
        if let Some(dir) = self.raw_dir {
            self.write_artifact(dir, label, &result);
        }
        result
    }

    /// Capture never alters collection: artifact write failures are logged
    /// and ignored.
    fn write_artifact(&self, dir: &Path, label: &str, result: &CommandResult) {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{label}_{timestamp}.json"));
        let write = fs::create_dir_all(dir).and_then(|()| {
            let mut json = serde_json::to_string_pretty(result).unwrap_or_default();
            json.push('\n');
            fs::write(&path, json)
        });
        match write {
            Ok(()) => debug!(path = %path.display(), "raw artifact written"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write raw artifact"),
        }
    }
}

/// CPU facts via `lscpu -J`, falling back to `/proc/cpuinfo`
pub async fn cpu(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let result = ctx.run("lscpu", "lscpu", &["-J"]).await;
    if result.success() {
        let fields = parsers::parse_lscpu(&result.stdout);
        if !fields.is_empty() {
            return Ok(parsers::cpu_section(&fields));
        }
    }

    let fallback = ctx.run("cpuinfo", "cat", &["/proc/cpuinfo"]).await;
    if fallback.success() && !fallback.stdout.trim().is_empty() {
        return Ok(parsers::cpu_section(&parsers::parse_cpuinfo(
            &fallback.stdout,
        )));
    }

    Err(format!("lscpu {}", result.failure_reason()))
}

/// Memory totals from `/proc/meminfo`
pub async fn memory(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let result = ctx.run("meminfo", "cat", &["/proc/meminfo"]).await;
    if !result.success() {
        return Err(format!("meminfo {}", result.failure_reason()));
    }

    let meminfo = parsers::parse_meminfo(&result.stdout);
    if meminfo.is_empty() {
        return Err("meminfo produced no parseable entries".to_string());
    }

    Ok(json!({
        "total_bytes": meminfo.get("MemTotal"),
        "swap_bytes": meminfo.get("SwapTotal"),
    }))
}

/// Block device inventory via `lsblk -J -O`
pub async fn storage(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let result = ctx.run("lsblk", "lsblk", &["-J", "-O"]).await;
    if !result.success() {
        return Err(format!("lsblk {}", result.failure_reason()));
    }

    let Some(devices) = parsers::parse_lsblk(&result.stdout) else {
        return Err("lsblk output was not parseable JSON".to_string());
    };

    Ok(json!({ "devices": devices }))
}

/// Platform hardware facts: BIOS, baseboard, and PCIe slots via dmidecode,
/// PCI and USB bus listings (with GPUs derived from PCI classes), TPM
/// presence, Secure Boot state via mokutil
///
/// Fails only when none of the hardware listing commands respond; a host
/// without dmidecode still yields its bus inventory.
pub async fn firmware(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let bios = ctx.run("dmidecode_bios", "dmidecode", &["-t", "bios"]).await;
    let mut any_source = bios.success();
    let mut section = if bios.success() {
        match parsers::parse_dmidecode_bios(&bios.stdout) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    } else {
        Map::new()
    };

    let board = ctx
        .run("dmidecode_baseboard", "dmidecode", &["-t", "baseboard"])
        .await;
    if board.success() {
        any_source = true;
        section.insert(
            "board".to_string(),
            parsers::parse_dmidecode_baseboard(&board.stdout),
        );
    }

    let pci = ctx.run("lspci", "lspci", &["-mm"]).await;
    if pci.success() {
        any_source = true;
        let entries = parsers::parse_lspci(&pci.stdout);
        section.insert("gpu".to_string(), json!(parsers::gpu_entries(&entries)));
        section.insert("pci".to_string(), json!(entries));
    }

    let usb = ctx.run("lsusb", "lsusb", &[]).await;
    if usb.success() {
        any_source = true;
        section.insert("usb".to_string(), json!(parsers::parse_lsusb(&usb.stdout)));
    }

    let slots = ctx.run("dmidecode_slots", "dmidecode", &["-t", "slot"]).await;
    if slots.success() {
        any_source = true;
        section.insert(
            "slots".to_string(),
            json!(parsers::parse_dmidecode_slots(&slots.stdout)),
        );
    }

    if !any_source {
        return Err(format!("dmidecode {}", bios.failure_reason()));
    }

    section.insert("tpm_present".to_string(), json!(tpm_present(ctx).await));
    section.insert(
        "secure_boot".to_string(),
        json!(secure_boot_state(ctx).await),
    );

    Ok(Value::Object(section))
}

async fn tpm_present(ctx: &ProbeContext<'_>) -> bool {
    let in_sysfs = fs::read_dir("/sys/class/tpm")
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if in_sysfs {
        return true;
    }
    // Some platforms expose the TPM only in the boot log
    let result = ctx.run("dmesg", "dmesg", &["--ctime"]).await;
    result.success() && result.stdout.to_ascii_lowercase().contains("tpm")
}

async fn secure_boot_state(ctx: &ProbeContext<'_>) -> &'static str {
    let result = ctx.run("mokutil", "mokutil", &["--sb-state"]).await;
    if !result.success() {
        return "unknown";
    }
    let text = result.stdout.to_ascii_lowercase();
    if text.contains("enabled") {
        "enabled"
    } else if text.contains("disabled") {
        "disabled"
    } else {
        "unknown"
    }
}

/// Software facts: OS identity, init system, installed packages, runtimes,
/// network interfaces
///
/// Composed of many independent lookups; a missing piece is left null. The
/// probe fails only when no command-backed lookup responds at all, so a
/// wholly unavailable toolchain is reported instead of silently yielding an
/// empty section.
pub async fn software(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let mut os = match parsers::parse_os_release(&read_file_or_empty("/etc/os-release")) {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut any_command = false;
    let kernel = ctx.run("uname_r", "uname", &["-r"]).await;
    if kernel.success() {
        any_command = true;
        os.insert("kernel".to_string(), json!(kernel.stdout.trim()));
    }
    let arch = ctx.run("uname_m", "uname", &["-m"]).await;
    if arch.success() {
        any_command = true;
        os.insert("architecture".to_string(), json!(arch.stdout.trim()));
    }
    let hostname = ctx.run("uname_n", "uname", &["-n"]).await;
    if hostname.success() {
        any_command = true;
        os.insert("hostname".to_string(), json!(hostname.stdout.trim()));
    }

    let init = fs::read_to_string("/proc/1/comm")
        .ok()
        .map(|s| s.trim().to_string());

    let packages = collect_packages(ctx).await;
    if !packages["manager"].is_null() {
        any_command = true;
    }
    let runtimes = collect_runtimes(ctx).await;
    if runtimes.as_object().is_some_and(|r| !r.is_empty()) {
        any_command = true;
    }
    let network = collect_network(ctx).await;
    if network.is_some() {
        any_command = true;
    }

    if !any_command {
        return Err(format!(
            "uname {}, and no package manager or runtime responded",
            kernel.failure_reason()
        ));
    }

    let mut section = Map::new();
    section.insert("os".to_string(), Value::Object(os));
    section.insert("init".to_string(), json!(init));
    section.insert("packages".to_string(), packages);
    section.insert("runtimes".to_string(), runtimes);
    if let Some(interfaces) = network {
        section.insert("network".to_string(), json!(interfaces));
    }
    Ok(Value::Object(section))
}

async fn collect_network(ctx: &ProbeContext<'_>) -> Option<Vec<Value>> {
    let result = ctx.run("ip_addr", "ip", &["-j", "address"]).await;
    if !result.success() {
        return None;
    }
    Some(parsers::parse_ip_addresses(&result.stdout))
}

fn read_file_or_empty(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

async fn collect_packages(ctx: &ProbeContext<'_>) -> Value {
    let managers: [(&str, &str, &[&str]); 3] = [
        ("dpkg", "dpkg", &["-l"]),
        ("rpm", "rpm", &["-qa"]),
        ("pacman", "pacman", &["-Q"]),
    ];

    for (name, command, args) in managers {
        let result = ctx.run(&format!("packages_{name}"), command, args).await;
        if !result.success() || result.stdout.trim().is_empty() {
            continue;
        }

        let mut items: Vec<String> = if name == "dpkg" {
            parsers::parse_dpkg_list(&result.stdout)
        } else {
            result
                .stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        };

        let truncated = items.len() > PACKAGE_LIMIT;
        if truncated {
            items.truncate(PACKAGE_LIMIT);
        }
        return json!({
            "manager": name,
            "items": items,
            "truncated": truncated,
        });
    }

    json!({ "manager": null, "items": [], "truncated": false })
}

async fn collect_runtimes(ctx: &ProbeContext<'_>) -> Value {
    let commands: [(&str, &str, &[&str]); 6] = [
        ("python", "python3", &["--version"]),
        ("python", "python", &["--version"]),
        ("node", "node", &["-v"]),
        ("java", "java", &["-version"]),
        ("docker", "docker", &["--version"]),
        ("podman", "podman", &["--version"]),
    ];

    let mut runtimes = Map::new();
    for (key, command, args) in commands {
        if runtimes.contains_key(key) {
            continue;
        }
        let result = ctx.run(command, command, args).await;
        if !result.success() {
            continue;
        }
        // java prints its version banner to stderr
        let text = if result.stdout.trim().is_empty() {
            result.stderr.trim().to_string()
        } else {
            result.stdout.trim().to_string()
        };
        if let Some(first_line) = text.lines().next() {
            runtimes.insert(key.to_string(), json!(first_line));
        }
    }
    Value::Object(runtimes)
}

/// Extra: Docker containers and images
pub async fn docker(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let ps = ctx
        .run(
            "docker_ps",
            "docker",
            &["ps", "-a", "--format", "{{json .}}"],
        )
        .await;
    if !ps.success() {
        return Err(format!("docker {}", ps.failure_reason()));
    }

    let containers = json_lines(&ps.stdout);

    let images = ctx
        .run("docker_images", "docker", &["images", "--format", "{{json .}}"])
        .await;
    let images = if images.success() {
        json_lines(&images.stdout)
    } else {
        Vec::new()
    };

    Ok(json!({
        "containers": containers,
        "images": images,
    }))
}

fn json_lines(output: &str) -> Vec<Value> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|_| json!(l)))
        .collect()
}

/// Extra: systemd unit files
pub async fn systemd(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let result = ctx
        .run("systemctl", "systemctl", &["list-unit-files"])
        .await;
    if !result.success() {
        return Err(format!("systemctl {}", result.failure_reason()));
    }
    let units: Vec<&str> = result.stdout.lines().collect();
    Ok(json!({ "unit_files": units }))
}

/// Extra: KVM guests via virsh
pub async fn kvm(ctx: &ProbeContext<'_>) -> Result<Value, String> {
    let result = ctx.run("virsh", "virsh", &["list", "--all"]).await;
    if !result.success() {
        return Err(format!("virsh {}", result.failure_reason()));
    }
    let guests: Vec<&str> = result.stdout.lines().collect();
    Ok(json!({ "guests": guests }))
}
