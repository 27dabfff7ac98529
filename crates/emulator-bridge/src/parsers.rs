//! Tool Output Parsers
//!
//! Every assumption about the text printed by emulator, adb, avdmanager and
//! sdkmanager lives here. All functions are total: malformed input yields
//! placeholders, `None`, or fewer records, never an error or a panic.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::device::{
    DeviceInfo, EmulatorDescriptor, SdkPackageListing, SystemImagePackage, UNKNOWN,
};

const AVD_BLOCK_MARKER: &str = "Name:";
const TARGET_LABEL: &str = "Target:";
const ABI_LABEL: &str = "ABI:";

const INSTALLED_HEADER: &str = "Installed packages:";
const AVAILABLE_HEADER: &str = "Available Packages:";
const UPDATES_HEADER: &str = "Available Updates:";
const COLUMN_DELIMITER: char = '|';

const EMULATOR_SERIAL_PREFIX: &str = "emulator-";

/// Properties read by [`parse_device_info`]
pub const PROP_ANDROID_VERSION: &str = "ro.build.version.release";
pub const PROP_API_LEVEL: &str = "ro.build.version.sdk";
pub const PROP_MODEL: &str = "ro.product.model";
pub const PROP_MANUFACTURER: &str = "ro.product.manufacturer";
pub const PROP_ABI: &str = "ro.product.cpu.abi";

/// Parse `avdmanager list avd` output.
///
/// Each `Name:` starts a block that runs until the next one. Target and ABI
/// are read from the first block line containing their label; missing labels
/// become `"Unknown"`. A name seen twice keeps its first position and the
/// fields of its last block.
pub fn parse_avd_list(output: &str) -> Vec<EmulatorDescriptor> {
    let mut descriptors: IndexMap<String, EmulatorDescriptor> = IndexMap::new();

    for block in output.split(AVD_BLOCK_MARKER).skip(1) {
        let mut lines = block.lines();
        let name = lines
            .next()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();
        let fields: Vec<&str> = lines.collect();

        let target = labelled_value(&fields, TARGET_LABEL);
        let abi = labelled_value(&fields, ABI_LABEL);

        descriptors.insert(
            name.clone(),
            EmulatorDescriptor {
                name,
                sdk: target.clone(),
                target,
                abi,
            },
        );
    }

    descriptors.into_values().collect()
}

fn labelled_value(lines: &[&str], label: &str) -> String {
    lines
        .iter()
        .find_map(|line| line.split_once(label))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Installed,
    Available,
    Ignored,
}

/// Parse `sdkmanager --list` output into installed and available packages.
///
/// Whether a row is installed depends only on the section header above it.
/// Rows need at least a path and a version column; anything shorter is
/// dropped.
pub fn parse_sdk_list(output: &str) -> SdkPackageListing {
    let mut listing = SdkPackageListing::default();
    let mut section = Section::Preamble;

    for line in output.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        if line.starts_with(INSTALLED_HEADER) {
            section = Section::Installed;
            continue;
        }
        if line.starts_with(AVAILABLE_HEADER) {
            section = Section::Available;
            continue;
        }
        if line.starts_with(UPDATES_HEADER) {
            section = Section::Ignored;
            continue;
        }

        let installed = match section {
            Section::Installed => true,
            Section::Available => false,
            Section::Preamble | Section::Ignored => continue,
        };

        if let Some(package) = parse_package_row(line, installed) {
            match installed {
                true => listing.installed.push(package),
                false => listing.available.push(package),
            }
        }
    }

    listing
}

fn parse_package_row(line: &str, installed: bool) -> Option<SystemImagePackage> {
    let tokens: Vec<&str> = line
        .split(COLUMN_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.len() < 2 || is_table_chrome(tokens[0]) {
        return None;
    }

    Some(SystemImagePackage {
        path: tokens[0].to_string(),
        version: tokens[1].to_string(),
        description: tokens.get(2).map(|d| d.to_string()),
        installed,
    })
}

/// Column header (`Path`) or separator (`-------`)
fn is_table_chrome(first_column: &str) -> bool {
    first_column == "Path" || first_column.chars().all(|c| c == '-')
}

/// Parse `getprop` output (`[key]: [value]` per line) into a map.
///
/// Lines that do not have that shape are skipped. Empty values are kept out
/// so callers fall back to their placeholder.
pub fn parse_getprop(output: &str) -> HashMap<String, String> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix('[')?;
            let (key, value) = rest.split_once("]:")?;
            let value = value.trim().trim_start_matches('[').trim_end_matches(']').trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

/// Build [`DeviceInfo`] from a `getprop` dump; each absent property is
/// `"Unknown"` on its own.
pub fn parse_device_info(port: u16, output: &str) -> DeviceInfo {
    let props = parse_getprop(output);
    let prop = |key: &str| props.get(key).cloned().unwrap_or_else(|| UNKNOWN.to_string());

    DeviceInfo {
        port,
        android_version: prop(PROP_ANDROID_VERSION),
        api_level: prop(PROP_API_LEVEL),
        model: prop(PROP_MODEL),
        manufacturer: prop(PROP_MANUFACTURER),
        abi: prop(PROP_ABI),
    }
}

/// An emulator line from `adb devices`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmulatorEntry {
    pub serial: String,
    pub port: u16,
    pub state: String,
}

/// Parse `adb devices` output, keeping emulator lines only.
pub fn parse_adb_devices(output: &str) -> Vec<EmulatorEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let serial = parts.next()?;
            let port = serial.strip_prefix(EMULATOR_SERIAL_PREFIX)?.parse().ok()?;
            let state = parts.next().unwrap_or(UNKNOWN);
            Some(EmulatorEntry {
                serial: serial.to_string(),
                port,
                state: state.to_string(),
            })
        })
        .collect()
}

/// Parse the reply to `emu avd name`: the first line that is not the
/// console's `OK` acknowledgement.
pub fn parse_avd_name(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && *line != "OK")
        .filter(|line| !line.starts_with("KO"))
        .map(str::to_string)
}

/// The console's `KO: ...` rejection, if the reply contains one
pub fn console_rejection(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("KO"))
        .map(str::to_string)
}

/// Parse `wm size`. An override size wins over the physical size.
pub fn parse_wm_size(output: &str) -> Option<(u32, u32)> {
    let value = |prefix: &str| {
        output.lines().find_map(|line| {
            let (w, h) = line.trim().strip_prefix(prefix)?.trim().split_once('x')?;
            Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
        })
    };

    value("Override size:").or_else(|| value("Physical size:"))
}

/// Parse `wm density`. An override density wins over the physical one.
pub fn parse_wm_density(output: &str) -> Option<u32> {
    let value = |prefix: &str| {
        output
            .lines()
            .find_map(|line| line.trim().strip_prefix(prefix)?.trim().parse().ok())
    };

    value("Override density:").or_else(|| value("Physical density:"))
}

/// Parse `pm list packages` into package names
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `cmd package resolve-activity --brief`: the component is the last
/// line of the form `package/activity`.
pub fn parse_resolved_activity(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .filter(|line| {
            !line.contains(char::is_whitespace)
                && line
                    .split_once('/')
                    .map(|(pkg, activity)| !pkg.is_empty() && !activity.is_empty())
                    .unwrap_or(false)
        })
        .map(str::to_string)
}

/// `am start` exits 0 on many failures; the error is in its output.
pub fn activity_start_error(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("Error") || line.contains("Exception"))
        .map(str::to_string)
}
