// Linkproof - Cross-Toolchain Smoke Kit
// Copyright (C) 2026 The Linkproof Contributors
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! ELF artifact inspection: which machine a binary targets and which symbols
//! it defines, so smoke checks can tell a cross-built image from a hosted one.

use goblin::elf::{header, section_header, sym, Elf};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while summarizing an artifact.
#[derive(Error, Debug)]
pub enum InspectError {
    #[error("Failed to read artifact {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse ELF: {0}")]
    Parse(#[from] goblin::error::Error),
}

pub type Result<T> = std::result::Result<T, InspectError>;

/// Machine class decoded from the ELF header's `e_machine` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
    Arm,
    RiscV,
    X86_64,
    Aarch64,
    Other(u16),
}

impl Machine {
    pub fn from_e_machine(value: u16) -> Self {
        match value {
            header::EM_ARM => Machine::Arm,
            header::EM_RISCV => Machine::RiscV,
            header::EM_X86_64 => Machine::X86_64,
            header::EM_AARCH64 => Machine::Aarch64,
            other => Machine::Other(other),
        }
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Machine::Arm => write!(f, "arm"),
            Machine::RiscV => write!(f, "riscv"),
            Machine::X86_64 => write!(f, "x86_64"),
            Machine::Aarch64 => write!(f, "aarch64"),
            Machine::Other(value) => write!(f, "unknown({:#06x})", value),
        }
    }
}

/// What a smoke check needs to know about one ELF artifact.
///
/// A symbol counts as *defined* only when its section index is not
/// `SHN_UNDEF`; a dynamically linked hosted binary that merely imports
/// `isatty` from libc therefore does not report it as defined.
#[derive(Debug, Clone)]
pub struct ElfSummary {
    pub machine: Machine,
    pub entry: u64,
    pub little_endian: bool,
    pub is_64: bool,
    pub defined: BTreeSet<String>,
    pub undefined: BTreeSet<String>,
}

impl ElfSummary {
    pub fn has_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn has_undefined(&self, name: &str) -> bool {
        self.undefined.contains(name)
    }
}

pub fn summarize(path: &Path) -> Result<ElfSummary> {
    let buffer = fs::read(path).map_err(|source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    summarize_bytes(&buffer)
}

pub fn summarize_bytes(buffer: &[u8]) -> Result<ElfSummary> {
    let elf = Elf::parse(buffer)?;

    debug!("ELF entry point: {:#x}", elf.entry);

    let machine = Machine::from_e_machine(elf.header.e_machine);
    if let Machine::Other(value) = machine {
        warn!("Unrecognized ELF machine type: {}", value);
    }

    let mut defined = BTreeSet::new();
    let mut undefined = BTreeSet::new();
    collect_symbols(&elf.syms, &elf.strtab, &mut defined, &mut undefined);
    collect_symbols(&elf.dynsyms, &elf.dynstrtab, &mut defined, &mut undefined);

    Ok(ElfSummary {
        machine,
        entry: elf.entry,
        little_endian: elf.little_endian,
        is_64: elf.is_64,
        defined,
        undefined,
    })
}

fn collect_symbols(
    syms: &sym::Symtab,
    strtab: &goblin::strtab::Strtab,
    defined: &mut BTreeSet<String>,
    undefined: &mut BTreeSet<String>,
) {
    for s in syms.iter() {
        if s.st_name == 0 {
            continue;
        }
        // FILE entries name source files, not link-visible definitions.
        if s.st_type() == sym::STT_FILE {
            continue;
        }
        let Some(name) = strtab.get_at(s.st_name) else {
            continue;
        };
        if name.is_empty() {
            continue;
        }

        if s.st_shndx == section_header::SHN_UNDEF as usize {
            undefined.insert(name.to_string());
        } else {
            defined.insert(name.to_string());
        }
    }
}
