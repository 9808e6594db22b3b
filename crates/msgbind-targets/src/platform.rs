//! Apple platforms a binding can target.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arch::Arch;
use crate::error::TargetError;

/// The operating system family the generated binding is compiled for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplePlatform {
    #[default]
    Ios,
    TvOs,
    WatchOs,
    MacOs,
}

impl ApplePlatform {
    /// Desktop platforms only run on Intel, so the ARM paths are never emitted.
    pub fn is_desktop(self) -> bool {
        matches!(self, ApplePlatform::MacOs)
    }

    /// The 32-bit ARM flavour used by devices of this platform.
    pub fn device_arm32(self) -> Option<Arch> {
        match self {
            ApplePlatform::Ios | ApplePlatform::TvOs => Some(Arch::Arm),
            ApplePlatform::WatchOs => Some(Arch::ArmV7k),
            ApplePlatform::MacOs => None,
        }
    }

    /// Every architecture a binding for this platform may run on.
    pub fn architectures(self) -> Vec<Arch> {
        let mut archs = Vec::with_capacity(4);
        if let Some(arm) = self.device_arm32() {
            archs.push(arm);
            archs.push(Arch::Arm64);
        }
        archs.push(Arch::X86);
        archs.push(Arch::X86_64);
        archs
    }

    /// The UI framework namespace whose members require a main-thread check.
    pub fn ui_namespace(self) -> &'static str {
        if self.is_desktop() {
            "AppKit"
        } else {
            "UIKit"
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            ApplePlatform::Ios => "ios",
            ApplePlatform::TvOs => "tvos",
            ApplePlatform::WatchOs => "watchos",
            ApplePlatform::MacOs => "macos",
        }
    }
}

impl fmt::Display for ApplePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ApplePlatform {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(ApplePlatform::Ios),
            "tvos" => Ok(ApplePlatform::TvOs),
            "watchos" | "watch" => Ok(ApplePlatform::WatchOs),
            "macos" | "mac" | "osx" => Ok(ApplePlatform::MacOs),
            _ => Err(TargetError::UnknownPlatform {
                name: s.to_string(),
            }),
        }
    }
}
