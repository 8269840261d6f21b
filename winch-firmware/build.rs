//! Build script for winch-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates winch.toml at compile time and embeds it as postcard bytes

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use winch_core::config::WinchConfig;

fn main() {
    setup_linker();
    let config = load_config();
    write_config(&config);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse and validate winch.toml
fn load_config() -> WinchConfig {
    println!("cargo:rerun-if-changed=winch.toml");

    let config_path = Path::new("winch.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: winch.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a winch.toml configuration file.          ║\n\
            ║  Please create one in the winch-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read winch.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Unknown keys are rejected so a typo cannot silently fall back to a default
    check_known_keys(&config_content);

    let config: WinchConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid winch.toml                                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: winch.toml failed validation                             ║\n\
            ║                                                                  ║\n\
            ║  {:<64} ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format!("{:?}", e)
        );
    }

    println!("cargo:warning=winch.toml validated successfully");
    config
}

/// Serialize the validated configuration for include_bytes!
fn write_config(config: &WinchConfig) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let bytes = postcard::to_stdvec(config).unwrap();
    fs::write(out_dir.join("winch_config.bin"), bytes).unwrap();
}

const SECTIONS: &[(&str, &[&str])] = &[
    ("geometry", &["gear_ratio", "pulses_per_motor_rev", "drum_diameter_m"]),
    ("wind", MOVE_KEYS),
    ("unwind", MOVE_KEYS),
    (
        "hold",
        &[
            "duration_ms",
            "tow_up",
            "nudge_speed",
            "deadband_pulses",
            "nudge_pulses",
            "min_nudge_gap_ms",
            "nudge_timeout_ms",
            "nudge_ramp_rate",
            "brake_rate",
            "settle_ms",
        ],
    ),
    (
        "cycle",
        &[
            "startup_delay_ms",
            "unwind_m",
            "unwind_speed",
            "wind_m",
            "wind_speed",
            "pause_ms",
        ],
    ),
];

const MOVE_KEYS: &[&str] = &[
    "cruise_speed",
    "timeout_ms",
    "padding_distance_m",
    "padding_speed",
    "stall_window_ms",
    "stall_bands",
    "ramp_rate",
    "brake_rate",
    "settle_ms",
];

/// Reject keys the firmware does not know about
fn check_known_keys(content: &str) {
    let value: toml::Value = match toml::from_str(content) {
        Ok(value) => value,
        // Syntax errors are reported by the typed parse
        Err(_) => return,
    };
    let Some(root) = value.as_table() else {
        return;
    };

    let mut errors = Vec::new();

    for (key, item) in root {
        if key == "wind_direction" {
            continue;
        }
        let Some((_, known)) = SECTIONS.iter().find(|(name, _)| *name == key.as_str()) else {
            errors.push(format!("Unknown section [{}]", key));
            continue;
        };
        let Some(table) = item.as_table() else {
            errors.push(format!("[{}] must be a table", key));
            continue;
        };
        for field in table.keys() {
            if !known.contains(&field.as_str()) {
                errors.push(format!("Unknown key {}.{}", key, field));
            }
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Unknown entries in winch.toml                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
