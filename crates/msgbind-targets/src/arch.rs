//! CPU architectures and their struct-return conventions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TargetError;

/// A CPU architecture a binding may execute on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit ARM devices (armv7, armv7s).
    #[serde(rename = "arm")]
    Arm,
    /// 32-bit ARM watch devices (armv7k).
    #[serde(rename = "armv7k")]
    ArmV7k,
    /// 64-bit ARM devices.
    #[serde(rename = "arm64")]
    Arm64,
    /// 32-bit Intel simulators and desktops.
    #[serde(rename = "x86")]
    X86,
    /// 64-bit Intel simulators and desktops.
    #[serde(rename = "x86_64")]
    X86_64,
}

/// When an architecture returns a value type through a hidden out pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StretRule {
    /// Value types are always returned in registers.
    Never,
    /// Every aggregate goes through the struct-return path.
    AnyAggregate,
    /// Aggregates strictly larger than the threshold (in bytes) use it.
    LargerThan(u64),
}

impl Arch {
    /// All architectures, in a stable order.
    pub const ALL: [Arch; 5] = [Arch::Arm, Arch::ArmV7k, Arch::Arm64, Arch::X86, Arch::X86_64];

    /// Whether pointers (and `nint`/`nuint`/`nfloat`) are 8 bytes wide.
    pub fn is_64_bit(self) -> bool {
        matches!(self, Arch::Arm64 | Arch::X86_64)
    }

    /// Pointer width in bytes.
    pub fn pointer_size(self) -> u64 {
        if self.is_64_bit() {
            8
        } else {
            4
        }
    }

    /// Whether this is a device (ARM) architecture rather than a simulator.
    pub fn is_device(self) -> bool {
        matches!(self, Arch::Arm | Arch::ArmV7k | Arch::Arm64)
    }

    /// The struct-return rule for aggregate (non-enum, non-builtin) returns.
    pub fn stret_rule(self) -> StretRule {
        match self {
            Arch::Arm => StretRule::AnyAggregate,
            // armv7k passes aggregates above 16 bytes by reference
            Arch::ArmV7k => StretRule::LargerThan(16),
            Arch::Arm64 => StretRule::Never,
            Arch::X86 => StretRule::LargerThan(8),
            Arch::X86_64 => StretRule::LargerThan(16),
        }
    }

    /// Inline-return threshold in bytes, if the rule is size based.
    ///
    /// `AnyAggregate` reports a threshold of 0 and `Never` reports `None`.
    pub fn stret_threshold(self) -> Option<u64> {
        match self.stret_rule() {
            StretRule::Never => None,
            StretRule::AnyAggregate => Some(0),
            StretRule::LargerThan(n) => Some(n),
        }
    }

    /// Whether an aggregate of `size` bytes is returned via `_stret`.
    pub fn aggregate_needs_stret(self, size: u64) -> bool {
        match self.stret_rule() {
            StretRule::Never => false,
            StretRule::AnyAggregate => true,
            StretRule::LargerThan(n) => size > n,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Arch::Arm => "arm",
            Arch::ArmV7k => "armv7k",
            Arch::Arm64 => "arm64",
            Arch::X86 => "x86",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Arch {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "arm" | "armv7" | "armv7s" => Ok(Arch::Arm),
            "armv7k" => Ok(Arch::ArmV7k),
            "arm64" | "aarch64" => Ok(Arch::Arm64),
            "x86" | "i386" => Ok(Arch::X86),
            "x86_64" | "x64" => Ok(Arch::X86_64),
            _ => Err(TargetError::UnknownArch {
                name: s.to_string(),
            }),
        }
    }
}
