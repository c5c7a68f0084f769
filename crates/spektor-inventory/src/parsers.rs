//! Parsers for raw inventory command output
//!
//! Pure text-to-JSON functions, kept separate from probe orchestration so
//! they can be tested against captured command output.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

/// Parse `/etc/os-release` content into name/version/id/pretty_name
#[must_use]
pub fn parse_os_release(content: &str) -> Value {
    let mut name = None;
    let mut version: Option<String> = None;
    let mut id = None;
    let mut pretty_name = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().trim_matches('"').to_string();
        match key.to_ascii_lowercase().as_str() {
            "name" => name = Some(value),
            "version" | "version_id" => {
                if version.is_none() {
                    version = Some(value);
                }
            }
            "id" => id = Some(value),
            "pretty_name" => pretty_name = Some(value),
            _ => {}
        }
    }

    json!({
        "name": name,
        "version": version,
        "id": id,
        "pretty_name": pretty_name,
    })
}

/// Parse `lscpu -J` output into a field-name to data map
#[must_use]
pub fn parse_lscpu(output: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let Ok(payload) = serde_json::from_str::<Value>(output) else {
        return fields;
    };
    let Some(entries) = payload.get("lscpu").and_then(Value::as_array) else {
        return fields;
    };
    for entry in entries {
        let field = entry
            .get("field")
            .and_then(Value::as_str)
            .map(|f| f.trim().trim_end_matches(':').to_string());
        let data = entry.get("data").and_then(Value::as_str);
        if let (Some(field), Some(data)) = (field, data)
            && !field.is_empty()
        {
            fields.insert(field, data.to_string());
        }
    }
    fields
}

/// Parse `/proc/cpuinfo`, returning the first processor block's key/value
/// pairs plus a `processor_count` entry
#[must_use]
pub fn parse_cpuinfo(output: &str) -> BTreeMap<String, String> {
    let mut info = BTreeMap::new();
    let blocks: Vec<&str> = output
        .trim()
        .split("\n\n")
        .filter(|b| !b.trim().is_empty())
        .collect();

    if let Some(first) = blocks.first() {
        for line in first.lines() {
            if let Some((key, value)) = line.split_once(':') {
                info.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }
    info.insert("processor_count".to_string(), blocks.len().to_string());
    info
}

/// Build the cpu section from lscpu-style fields
#[must_use]
pub fn cpu_section(fields: &BTreeMap<String, String>) -> Value {
    let get = |keys: &[&str]| -> Option<String> {
        keys.iter().find_map(|k| fields.get(*k).cloned())
    };
    // lscpu values may carry annotations like "8 (4 per socket)"
    let int_of = |value: Option<String>| -> Option<u64> {
        value.and_then(|v| v.split_whitespace().next().and_then(|n| n.parse().ok()))
    };

    let sockets = int_of(get(&["Socket(s)"]));
    let cores_per_socket = int_of(get(&["Core(s) per socket"]));
    let threads_per_core = int_of(get(&["Thread(s) per core"]));
    let logical = int_of(get(&["CPU(s)", "processor_count"]));

    let cores = match (sockets, cores_per_socket) {
        (Some(s), Some(c)) => Some(s * c),
        _ => cores_per_socket.or(logical),
    };

    let flags: Vec<String> = get(&["Flags", "flags"])
        .map(|f| f.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    json!({
        "model": get(&["Model name", "model name"]),
        "vendor": get(&["Vendor ID", "vendor_id"]),
        "sockets": sockets,
        "cores": cores,
        "threads_per_core": threads_per_core,
        "logical_processors": logical,
        "flags": flags,
    })
}

/// Parse `/proc/meminfo` into byte counts keyed by field name
#[must_use]
pub fn parse_meminfo(output: &str) -> BTreeMap<String, u64> {
    let mut result = BTreeMap::new();
    for line in output.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let mut parts = rest.split_whitespace();
        let Some(value) = parts.next().and_then(|v| v.parse::<u64>().ok()) else {
            continue;
        };
        let multiplier = match parts.next().map(str::to_ascii_uppercase).as_deref() {
            Some("KB") => 1024,
            Some("MB") => 1024 * 1024,
            Some("GB") => 1024 * 1024 * 1024,
            _ => 1,
        };
        result.insert(key.trim().to_string(), value * multiplier);
    }
    result
}

/// Parse `lsblk -J -O` output into a flat device list
///
/// Children are flattened depth-first, matching the nesting order of the
/// device tree. Returns `None` when the output is not valid lsblk JSON.
#[must_use]
pub fn parse_lsblk(output: &str) -> Option<Vec<Value>> {
    let data = serde_json::from_str::<Value>(output).ok()?;
    let devices = data.get("blockdevices").and_then(Value::as_array)?;

    fn flatten(device: &Value, out: &mut Vec<Value>) {
        if let Some(children) = device.get("children").and_then(Value::as_array) {
            for child in children {
                flatten(child, out);
            }
        }
        let mountpoints: Vec<Value> = device
            .get("mountpoints")
            .and_then(Value::as_array)
            .map(|mps| mps.iter().filter(|mp| !mp.is_null()).cloned().collect())
            .unwrap_or_default();
        out.push(json!({
            "name": device.get("name").cloned().unwrap_or(Value::Null),
            "size_bytes": device.get("size").cloned().unwrap_or(Value::Null),
            "rota": device.get("rota").cloned().unwrap_or(Value::Null),
            "tran": device.get("tran").cloned().unwrap_or(Value::Null),
            "model": device.get("model").cloned().unwrap_or(Value::Null),
            "serial": device.get("serial").cloned().unwrap_or(Value::Null),
            "mountpoints": mountpoints,
        }));
    }

    let mut entries = Vec::new();
    for device in devices {
        flatten(device, &mut entries);
    }
    Some(entries)
}

fn dmidecode_field<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let value = line.trim().strip_prefix(label)?.trim();
    if value.is_empty() { None } else { Some(value) }
}

/// Parse `dmidecode -t bios` output
#[must_use]
pub fn parse_dmidecode_bios(output: &str) -> Value {
    let mut vendor = None;
    let mut version = None;
    let mut date = None;
    for line in output.lines() {
        if let Some(v) = dmidecode_field(line, "Vendor:") {
            vendor = Some(v.to_string());
        } else if let Some(v) = dmidecode_field(line, "Version:") {
            version = Some(v.to_string());
        } else if let Some(v) = dmidecode_field(line, "Release Date:") {
            date = Some(v.to_string());
        }
    }
    json!({
        "bios_vendor": vendor,
        "bios_version": version,
        "bios_date": date,
    })
}

/// Parse `dmidecode -t baseboard` output
#[must_use]
pub fn parse_dmidecode_baseboard(output: &str) -> Value {
    let mut vendor = None;
    let mut product = None;
    let mut serial = None;
    for line in output.lines() {
        if let Some(v) = dmidecode_field(line, "Manufacturer:") {
            vendor = Some(v.to_string());
        } else if let Some(v) = dmidecode_field(line, "Product Name:") {
            product = Some(v.to_string());
        } else if let Some(v) = dmidecode_field(line, "Serial Number:") {
            serial = Some(v.to_string());
        }
    }
    json!({
        "vendor": vendor,
        "product": product,
        "serial": serial,
    })
}

/// Split a line into fields, honouring double-quoted sections
fn split_quoted(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    fields.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

/// Parse `lspci -mm` output into slot/class/vendor/device entries
#[must_use]
pub fn parse_lspci(output: &str) -> Vec<Value> {
    let mut entries = Vec::new();
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts = split_quoted(line);
        if parts.len() < 3 {
            continue;
        }
        entries.push(json!({
            "slot": parts[0],
            "class": parts[1],
            "vendor": parts[2],
            "device": parts.get(3),
        }));
    }
    entries
}

/// Derive GPU entries from parsed PCI entries (VGA and 3D controller classes)
#[must_use]
pub fn gpu_entries(pci: &[Value]) -> Vec<Value> {
    pci.iter()
        .filter(|entry| {
            let class = entry
                .get("class")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_ascii_lowercase();
            class.contains("vga") || class.contains("3d")
        })
        .map(|entry| {
            json!({
                "name": entry.get("device"),
                "vendor": entry.get("vendor"),
                "bus": entry.get("slot"),
            })
        })
        .collect()
}

/// Parse `lsusb` output lines of the form
/// `Bus 001 Device 002: ID 1d6b:0002 Linux Foundation 2.0 root hub`
#[must_use]
pub fn parse_lsusb(output: &str) -> Vec<Value> {
    let mut entries = Vec::new();
    for line in output.lines() {
        let Some(rest) = line.trim().strip_prefix("Bus ") else {
            continue;
        };
        let Some((bus, rest)) = rest.split_once(" Device ") else {
            continue;
        };
        let Some((device, rest)) = rest.split_once(": ID ") else {
            continue;
        };
        let (id, description) = match rest.split_once(' ') {
            Some((id, desc)) => (id, desc.trim()),
            None => (rest, ""),
        };
        if !is_numeric_triplet(bus) || !is_numeric_triplet(device) || !is_usb_id(id) {
            continue;
        }
        entries.push(json!({
            "bus": bus,
            "device": device,
            "id": id,
            "description": if description.is_empty() { None } else { Some(description) },
        }));
    }
    entries
}

fn is_numeric_triplet(s: &str) -> bool {
    s.len() == 3 && s.chars().all(|c| c.is_ascii_digit())
}

fn is_usb_id(s: &str) -> bool {
    let Some((vendor, product)) = s.split_once(':') else {
        return false;
    };
    vendor.len() == 4
        && product.len() == 4
        && vendor.chars().all(|c| c.is_ascii_hexdigit())
        && product.chars().all(|c| c.is_ascii_hexdigit())
}

/// Parse `ip -j address` output into per-interface entries
///
/// Invalid JSON yields an empty list; the command succeeded, there is just
/// nothing usable in it.
#[must_use]
pub fn parse_ip_addresses(output: &str) -> Vec<Value> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(output) else {
        return Vec::new();
    };
    items
        .iter()
        .map(|item| {
            let addresses: Vec<Value> = item
                .get("addr_info")
                .and_then(Value::as_array)
                .map(|infos| {
                    infos
                        .iter()
                        .filter_map(|info| info.get("local"))
                        .filter(|local| !local.is_null())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            json!({
                "ifname": item.get("ifname"),
                "addresses": addresses,
                "mac": item.get("address"),
                "state": item.get("operstate"),
            })
        })
        .collect()
}

/// Parse `dmidecode -t slot` output into PCIe slot entries
#[must_use]
pub fn parse_dmidecode_slots(output: &str) -> Vec<Value> {
    let mut slots = Vec::new();
    let mut current: Option<Map<String, Value>> = None;

    for line in output.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        let is_header = !line.starts_with('\t')
            && (stripped.starts_with("Slot") || stripped.ends_with("Slot Information"));
        if is_header {
            if let Some(slot) = current.take() {
                slots.push(Value::Object(slot));
            }
            current = Some(Map::new());
            continue;
        }
        let Some(slot) = current.as_mut() else {
            continue;
        };
        if let Some(v) = dmidecode_field(line, "Designation:") {
            slot.insert("designation".to_string(), json!(v));
        } else if let Some(v) = dmidecode_field(line, "Type:") {
            slot.insert("type".to_string(), json!(v));
        } else if let Some(v) = dmidecode_field(line, "Current Usage:") {
            let usage = v.to_ascii_lowercase();
            slot.insert(
                "occupied".to_string(),
                json!(usage != "available" && usage != "unavailable"),
            );
        } else if let Some(v) = dmidecode_field(line, "Bus Address:") {
            slot.insert("bus_address".to_string(), json!(v));
        } else if let Some(v) = dmidecode_field(line, "Data Bus Width:") {
            slot.insert("lanes".to_string(), json!(v));
        } else if let Some(v) = dmidecode_field(line, "Length:") {
            let length = v.to_ascii_lowercase();
            let class = if length.contains("long") || length.contains("full") {
                "full"
            } else if length.contains("short") || length.contains("half") {
                "short"
            } else {
                "unknown"
            };
            slot.insert("length".to_string(), json!(class));
        } else if let Some(v) = dmidecode_field(line, "Installed Device:") {
            slot.insert("device".to_string(), json!(v));
        }
    }
    if let Some(slot) = current {
        slots.push(Value::Object(slot));
    }
    slots
}

/// Extract `name version` pairs from `dpkg -l` output
#[must_use]
pub fn parse_dpkg_list(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("Desired=")
                && !line.starts_with("||/")
                && !line.starts_with("+++")
        })
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() >= 3 {
                Some(format!("{} {}", parts[1], parts[2]))
            } else {
                None
            }
        })
        .collect()
}
