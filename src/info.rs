//! Environment diagnostics for bug reports (`use-pkg-version info`)

use colored::*;
use std::fmt;
use std::path::Path;
use std::process::Command;

const NOT_FOUND: &str = "Not Found";

/// Binaries reported under "Binaries": (label, executable)
const BINARIES: &[(&str, &str)] = &[
    ("Node", "node"),
    ("Yarn", "yarn"),
    ("npm", "npm"),
    ("Cargo", "cargo"),
];

/// Browsers reported under "Browsers": (label, candidate executables)
const BROWSERS: &[(&str, &[&str])] = &[
    (
        "Chrome",
        &["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"],
    ),
    ("Edge", &["microsoft-edge", "microsoft-edge-stable", "msedge"]),
    ("Firefox", &["firefox"]),
    ("Safari", &["safari"]),
];

/// One reported line, `None` when the item could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub label: String,
    pub value: Option<String>,
}

impl Entry {
    fn new(label: &str, value: Option<String>) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// Collected environment information, grouped by section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvInfo {
    pub system: Vec<Entry>,
    pub binaries: Vec<Entry>,
    pub browsers: Vec<Entry>,
}

impl EnvInfo {
    /// Probe the current machine.
    pub fn collect() -> Self {
        let system = vec![
            Entry::new("OS", Some(os_description())),
            Entry::new("CPU", Some(cpu_description())),
        ];

        let binaries = BINARIES
            .iter()
            .map(|(label, exe)| Entry::new(label, probe_binary(exe)))
            .collect();

        let browsers = BROWSERS
            .iter()
            .map(|(label, candidates)| {
                let found = candidates
                    .iter()
                    .find_map(|exe| which::which(exe).ok())
                    .map(|path| path.display().to_string());
                Entry::new(label, found)
            })
            .collect();

        EnvInfo {
            system,
            binaries,
            browsers,
        }
    }
}

impl fmt::Display for EnvInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("System", &self.system),
            ("Binaries", &self.binaries),
            ("Browsers", &self.browsers),
        ];

        for (title, entries) in sections {
            writeln!(f, "  {}:", title)?;
            for entry in entries.iter() {
                writeln!(
                    f,
                    "    {}: {}",
                    entry.label,
                    entry.value.as_deref().unwrap_or(NOT_FOUND)
                )?;
            }
        }

        Ok(())
    }
}

/// Print the environment report to stdout.
pub fn print_info() {
    println!("{}", "\nEnvironment Info:".bold());
    println!();
    print!("{}", EnvInfo::collect());
}

/// `<version> - <path>` for an executable on PATH.
pub fn probe_binary(exe: &str) -> Option<String> {
    let path = which::which(exe).ok()?;
    match binary_version(&path) {
        Some(version) => Some(format!("{} - {}", version, path.display())),
        None => Some(path.display().to_string()),
    }
}

/// First line of `<exe> --version`, without a leading `v`.
fn binary_version(path: &Path) -> Option<String> {
    let output = Command::new(path).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_version_line(&stdout)
}

fn parse_version_line(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|l| !l.is_empty())?;
    Some(line.strip_prefix('v').unwrap_or(line).to_string())
}

fn os_description() -> String {
    let name = match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        other => other,
    };

    match kernel_release() {
        Some(release) => format!("{} {} {}", name, release, std::env::consts::ARCH),
        None => format!("{} {}", name, std::env::consts::ARCH),
    }
}

fn cpu_description() -> String {
    let count = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    match cpu_model() {
        Some(model) => format!("({}) {}", count, model),
        None => format!("({}) {}", count, std::env::consts::ARCH),
    }
}

#[cfg(target_os = "linux")]
fn cpu_model() -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    cpuinfo
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, model)| model.trim().to_string())
}

#[cfg(not(target_os = "linux"))]
fn cpu_model() -> Option<String> {
    None
}

/// Kernel release as reported by `uname(2)`
#[cfg(unix)]
fn kernel_release() -> Option<String> {
    use std::ffi::CStr;

    // # Safety
    //
    // `libc::utsname` only holds fixed-size char arrays, so a zeroed value is
    // valid. `uname` fills it in and the return value is checked. Every field
    // is NUL terminated on success.
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return None;
    }
    let release = unsafe { CStr::from_ptr(uts.release.as_ptr()) };

    Some(release.to_string_lossy().into_owned())
}

#[cfg(not(unix))]
fn kernel_release() -> Option<String> {
    None
}
