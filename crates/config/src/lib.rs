// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default watchdog budget for a run check.
fn default_wall_time_ms() -> u64 {
    10_000
}

/// Machine class a manifest may assert on an inspected artifact.
///
/// The toolchain profile names (`cortex-m0`, `cortex-m3`, `cortex-m4f`) are
/// accepted as aliases so a manifest can speak the same dialect as the build
/// profiles that produced the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineExpect {
    #[serde(alias = "cortex-m0", alias = "cortex-m3", alias = "cortex-m4f")]
    Arm,
    #[serde(alias = "riscv32", alias = "rv32i")]
    RiscV,
    #[serde(alias = "x86-64", alias = "amd64")]
    X86_64,
    #[serde(alias = "arm64")]
    Aarch64,
}

/// Why a run check's child process stopped.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStop {
    /// Child ran to completion on its own.
    Exited,
    /// Watchdog killed the child once `wall_time_ms` elapsed.
    WallTime,
    /// Child could not be spawned at all.
    LaunchError,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct RunExpect {
    /// Exact stdout, compared byte for byte.
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stdout_contains: Vec<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    /// Expected stop reason. When omitted, only `exited` passes.
    #[serde(default)]
    pub stop_reason: Option<RunStop>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunLimits {
    #[serde(default = "default_wall_time_ms")]
    pub wall_time_ms: u64,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            wall_time_ms: default_wall_time_ms(),
        }
    }
}

/// Execute a program and judge its stdout, exit code, and stop reason.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunCheck {
    /// Program path, resolved against the manifest's directory when relative.
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub expect: RunExpect,
    #[serde(default)]
    pub limits: RunLimits,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct InspectExpect {
    #[serde(default)]
    pub machine: Option<MachineExpect>,
    /// Symbols the artifact must define (not merely import).
    #[serde(default)]
    pub defined_symbols: Vec<String>,
    /// Symbols the artifact must not define.
    #[serde(default)]
    pub absent_symbols: Vec<String>,
}

/// Parse an ELF artifact and judge its machine and symbol table.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct InspectCheck {
    /// Artifact path, resolved against the manifest's directory when relative.
    pub artifact: String,
    #[serde(default)]
    pub expect: InspectExpect,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunCheckSpec {
    pub name: String,
    pub run: RunCheck,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct InspectCheckSpec {
    pub name: String,
    pub inspect: InspectCheck,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum CheckSpec {
    Run(RunCheckSpec),
    Inspect(InspectCheckSpec),
}

impl CheckSpec {
    pub fn name(&self) -> &str {
        match self {
            CheckSpec::Run(spec) => &spec.name,
            CheckSpec::Inspect(spec) => &spec.name,
        }
    }
}

/// A smoke manifest: the checks one toolchain/target pairing must pass.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SmokeManifest {
    pub schema_version: String,
    pub name: String,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

impl SmokeManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read smoke manifest at {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Smoke Manifest YAML")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != "1.0" {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '1.0'",
                self.schema_version
            );
        }

        if self.name.trim().is_empty() {
            anyhow::bail!("Manifest 'name' cannot be empty");
        }

        if self.checks.is_empty() {
            anyhow::bail!("Manifest must declare at least one check");
        }

        let mut seen = HashSet::new();
        for check in &self.checks {
            let name = check.name();
            if name.trim().is_empty() {
                anyhow::bail!("Check names cannot be empty");
            }
            if !seen.insert(name) {
                anyhow::bail!("Duplicate check name '{}'", name);
            }

            match check {
                CheckSpec::Run(spec) => {
                    if spec.run.program.trim().is_empty() {
                        anyhow::bail!("Check '{}': 'program' path cannot be empty", name);
                    }
                    if spec.run.limits.wall_time_ms == 0 {
                        anyhow::bail!("Check '{}': 'wall_time_ms' must be greater than zero", name);
                    }
                }
                CheckSpec::Inspect(spec) => {
                    if spec.inspect.artifact.trim().is_empty() {
                        anyhow::bail!("Check '{}': 'artifact' path cannot be empty", name);
                    }
                }
            }
        }

        Ok(())
    }
}
