//! Policy file loading. Ported from gsandbox's `policy.go`/`sandbox.go`
//! embedded-default-plus-YAML-load shape, re-expressed with `serde_yaml`
//! and `deny_unknown_fields` in place of gsandbox's permissive `yaml.v3`
//! decode.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::error::{SandboxError, SandboxResult};
use crate::limits::Limits;

const DEFAULT_POLICY_YAML: &str = include_str!("../policy.default.yml");

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawLimits {
    #[serde(default)]
    r#as: Option<String>,
    #[serde(default)]
    core: Option<String>,
    #[serde(default)]
    cpu: Option<String>,
    #[serde(default)]
    fsize: Option<String>,
    #[serde(default)]
    nofile: Option<u64>,
    #[serde(default)]
    wallclock: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawFs {
    #[serde(default)]
    rd_files: Vec<String>,
    #[serde(default)]
    wr_files: Vec<String>,
    #[serde(default)]
    ex_files: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawPolicy {
    #[serde(default)]
    share_net: Option<String>,
    #[serde(default)]
    env: Option<String>,
    #[serde(default)]
    work_dir: Option<String>,
    #[serde(default)]
    limits: RawLimits,
    #[serde(default)]
    syscalls: Vec<String>,
    #[serde(default)]
    fs: RawFs,
}

#[derive(Debug, Clone, Default)]
pub struct FsPolicy {
    pub rd_files: Vec<String>,
    pub wr_files: Vec<String>,
    pub ex_files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Policy {
    pub share_net: bool,
    pub env: bool,
    pub work_dir: Option<String>,
    pub limits: Limits,
    pub syscalls: HashSet<String>,
    pub fs: FsPolicy,
}

fn parse_toggle(raw: &Option<String>, default: bool, field: &str) -> SandboxResult<bool> {
    match raw.as_deref() {
        None => Ok(default),
        Some("enabled") => Ok(true),
        Some("disabled") => Ok(false),
        Some(other) => Err(SandboxError::sandbox_failure(format!("{}: invalid value {:?}, want enabled|disabled", field, other))),
    }
}

fn split_byte_suffix(raw: &str) -> (&str, u64) {
    const UNITS: [(&str, u64); 8] = [
        ("Ki", 1024),
        ("Mi", 1024 * 1024),
        ("Gi", 1024 * 1024 * 1024),
        ("Ti", 1024 * 1024 * 1024 * 1024),
        ("K", 1024),
        ("M", 1024 * 1024),
        ("G", 1024 * 1024 * 1024),
        ("T", 1024 * 1024 * 1024 * 1024),
    ];
    for (suffix, multiplier) in UNITS {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            return (stripped, multiplier);
        }
    }
    (raw, 1)
}

/// Parses a byte quantity: a bare integer or one with a `K/M/G/T` or
/// `Ki/Mi/Gi/Ti` suffix, binary (1024-based) in both cases.
pub fn parse_bytes(raw: &str) -> SandboxResult<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = split_byte_suffix(raw);
    let n: u64 = digits
        .trim()
        .parse()
        .map_err(|_| SandboxError::sandbox_failure(format!("invalid byte quantity: {:?}", raw)))?;
    Ok(n * multiplier)
}

/// Parses a duration: a bare integer (seconds) or a suffixed form
/// (`500ms`, `30s`, `2m`, `1h`).
pub fn parse_duration(raw: &str) -> SandboxResult<Duration> {
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    const UNITS: [(&str, u64); 4] = [("ms", 1), ("s", 1000), ("m", 60_000), ("h", 3_600_000)];
    for (suffix, millis_per_unit) in UNITS {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            let n: u64 = stripped
                .trim()
                .parse()
                .map_err(|_| SandboxError::sandbox_failure(format!("invalid duration: {:?}", raw)))?;
            return Ok(Duration::from_millis(n * millis_per_unit));
        }
    }
    Err(SandboxError::sandbox_failure(format!("invalid duration: {:?}", raw)))
}

fn parse_limits(raw: RawLimits) -> SandboxResult<Limits> {
    Ok(Limits {
        as_bytes: raw.r#as.as_deref().map(parse_bytes).transpose()?,
        core_bytes: raw.core.as_deref().map(parse_bytes).transpose()?,
        cpu_seconds: raw.cpu.as_deref().map(parse_duration).transpose()?.map(|d| d.as_secs()),
        fsize_bytes: raw.fsize.as_deref().map(parse_bytes).transpose()?,
        nofile: raw.nofile,
        wallclock: raw.wallclock.as_deref().map(parse_duration).transpose()?,
    })
}

fn from_raw(raw: RawPolicy) -> SandboxResult<Policy> {
    Ok(Policy {
        share_net: parse_toggle(&raw.share_net, false, "share-net")?,
        env: parse_toggle(&raw.env, true, "env")?,
        work_dir: raw.work_dir,
        limits: parse_limits(raw.limits)?,
        syscalls: raw.syscalls.into_iter().collect(),
        fs: FsPolicy { rd_files: raw.fs.rd_files, wr_files: raw.fs.wr_files, ex_files: raw.fs.ex_files },
    })
}

fn parse(yaml: &str) -> SandboxResult<Policy> {
    let raw: RawPolicy = serde_yaml::from_str(yaml)
        .map_err(|e| SandboxError::sandbox_failure(format!("parsing policy file: {}", e)))?;
    from_raw(raw)
}

/// Loads the policy from `path`, or the embedded default when `path` is
/// `None`.
pub fn load(path: Option<&Path>) -> SandboxResult<Policy> {
    match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .map_err(|e| SandboxError::sandbox_failure(format!("reading policy file {}: {}", p.display(), e)))?;
            parse(&text)
        }
        None => parse(DEFAULT_POLICY_YAML),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_binary_byte_suffixes() {
        assert_eq!(parse_bytes("512").unwrap(), 512);
        assert_eq!(parse_bytes("4Ki").unwrap(), 4096);
        assert_eq!(parse_bytes("2M").unwrap(), 2 * 1024 * 1024);
        assert_eq!(parse_bytes("1Gi").unwrap(), 1024 * 1024 * 1024);
    }

    #[test]
    fn parses_durations() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn default_policy_loads() {
        let policy = load(None).expect("embedded default policy must parse");
        assert!(!policy.syscalls.is_empty());
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let err = parse("bogus-key: 1\n");
        assert!(err.is_err());
    }

    #[test]
    fn share_net_defaults_to_disabled() {
        let policy = parse("syscalls: [read]\n").unwrap();
        assert!(!policy.share_net);
        assert!(policy.env);
    }
}
