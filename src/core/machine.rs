//! Emulated machine options: machine type, TOS image, screen mode, memory

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AssetError;

/// TOS images bundled with the wrapper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tos {
    Etos512cz,
    Etos512de,
    Etos512es,
    Etos512fi,
    Etos512fr,
    Etos512gr,
    Etos512hu,
    Etos512it,
    Etos512nl,
    Etos512no,
    Etos512pl,
    Etos512ru,
    Etos512se,
    Etos512sg,
    Etos512tr,
    Etos512uk,
    Etos512us,
    Tos100,
    Tos102,
    Tos104,
    Tos106,
    Tos205,
    Tos206,
    Tos306,
    Tos402,
    Tos404,
}

impl Tos {
    pub fn all() -> &'static [Tos] {
        use Tos::*;
        &[
            Etos512cz, Etos512de, Etos512es, Etos512fi, Etos512fr, Etos512gr, Etos512hu,
            Etos512it, Etos512nl, Etos512no, Etos512pl, Etos512ru, Etos512se, Etos512sg,
            Etos512tr, Etos512uk, Etos512us, Tos100, Tos102, Tos104, Tos106, Tos205, Tos206,
            Tos306, Tos402, Tos404,
        ]
    }

    /// Image name, also the resource file stem (`tos/<name>.img`)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Etos512cz => "etos512cz",
            Self::Etos512de => "etos512de",
            Self::Etos512es => "etos512es",
            Self::Etos512fi => "etos512fi",
            Self::Etos512fr => "etos512fr",
            Self::Etos512gr => "etos512gr",
            Self::Etos512hu => "etos512hu",
            Self::Etos512it => "etos512it",
            Self::Etos512nl => "etos512nl",
            Self::Etos512no => "etos512no",
            Self::Etos512pl => "etos512pl",
            Self::Etos512ru => "etos512ru",
            Self::Etos512se => "etos512se",
            Self::Etos512sg => "etos512sg",
            Self::Etos512tr => "etos512tr",
            Self::Etos512uk => "etos512uk",
            Self::Etos512us => "etos512us",
            Self::Tos100 => "tos100",
            Self::Tos102 => "tos102",
            Self::Tos104 => "tos104",
            Self::Tos106 => "tos106",
            Self::Tos205 => "tos205",
            Self::Tos206 => "tos206",
            Self::Tos306 => "tos306",
            Self::Tos402 => "tos402",
            Self::Tos404 => "tos404",
        }
    }

    /// Resource path of the image inside the bundle
    pub fn resource_name(&self) -> String {
        format!("tos/{}.img", self.name())
    }

    pub fn is_emutos(&self) -> bool {
        self.name().starts_with("etos")
    }

    /// EmuTOS image for a 2-letter language or country code such as
    /// "de" or "uk". `Ok(None)` when no localized image exists.
    pub fn for_code(code: &str) -> Result<Option<Tos>, AssetError> {
        let code = code.trim();
        if code.chars().count() != 2 {
            return Err(AssetError::InvalidLocaleCode(code.to_string()));
        }
        let name = format!("etos512{}", code.to_lowercase());
        Ok(name.parse().ok())
    }

    /// EmuTOS image matching the host locale: language first, then
    /// country, falling back to the US image
    pub fn for_locale() -> Tos {
        let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.is_empty())
            .unwrap_or_default();
        Self::for_locale_string(&locale)
    }

    /// Same as [`Tos::for_locale`] for an explicit POSIX locale string
    /// like `de_CH.UTF-8`
    pub fn for_locale_string(locale: &str) -> Tos {
        let tag = locale.split(['.', '@']).next().unwrap_or_default();
        let mut parts = tag.split(['_', '-']);
        let language = parts.next().unwrap_or_default();
        let country = parts.next().unwrap_or_default();

        [language, country]
            .iter()
            .filter_map(|code| Self::for_code(code).ok().flatten())
            .next()
            .unwrap_or(Tos::Etos512us)
    }
}

impl fmt::Display for Tos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tos {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|tos| tos.name() == lower)
            .ok_or_else(|| format!("Unknown TOS image '{}'", s))
    }
}

/// Possible values to use for the memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Memory {
    Kb512,
    Mb1,
    Mb2,
    Mb4,
    Mb8,
}

impl Memory {
    pub fn all() -> &'static [Memory] {
        &[
            Memory::Kb512,
            Memory::Mb1,
            Memory::Mb2,
            Memory::Mb4,
            Memory::Mb8,
        ]
    }

    pub fn kilobytes(&self) -> u32 {
        match self {
            Self::Kb512 => 512,
            Self::Mb1 => 1024,
            Self::Mb2 => 2 * 1024,
            Self::Mb4 => 4 * 1024,
            Self::Mb8 => 8 * 1024,
        }
    }

    pub fn from_kilobytes(kb: u32) -> Option<Memory> {
        Self::all().iter().copied().find(|m| m.kilobytes() == kb)
    }
}

impl FromStr for Memory {
    type Err = String;

    /// Accepts a kilobyte count ("1024") or a megabyte count with suffix ("4mb")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let kb = match lower.strip_suffix("mb") {
            Some(mb) => mb.trim().parse::<u32>().map(|mb| mb * 1024),
            None => lower.trim_end_matches("kb").trim().parse::<u32>(),
        };
        kb.ok()
            .and_then(Self::from_kilobytes)
            .ok_or_else(|| format!("Unsupported memory size '{}'", s))
    }
}

/// Atari ST screen mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenMode {
    /// 320x200, 16 colors
    Low,
    /// 640x200, 4 colors
    Medium,
    /// 640x400, monochrome
    High,
}

impl ScreenMode {
    /// Value of the emulator's `--tos-res` option
    pub fn resolution(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "med",
            Self::High => "high",
        }
    }

    /// Value of the emulator's `--monitor` option; only high resolution
    /// needs the monochrome monitor
    pub fn monitor(&self) -> &'static str {
        match self {
            Self::High => "mono",
            Self::Low | Self::Medium => "tv",
        }
    }
}

impl FromStr for ScreenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "med" | "mid" | "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("Unknown screen mode '{}'", other)),
        }
    }
}

/// Which Atari system to emulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineType {
    /// Standard ST
    St,
    /// Mega ST (blitter)
    MegaSt,
    /// STE (hardware scrolling, DMA audio, 4 ports)
    Ste,
}

impl MachineType {
    /// Value of the emulator's `--machine` option
    pub fn token(&self) -> &'static str {
        match self {
            Self::St => "st",
            Self::MegaSt => "megast",
            Self::Ste => "ste",
        }
    }

    pub fn default_tos(&self) -> Tos {
        match self {
            Self::St => Tos::Tos100,
            Self::MegaSt => Tos::Tos102,
            Self::Ste => Tos::Tos106,
        }
    }

    pub fn default_memory(&self) -> Memory {
        match self {
            Self::St => Memory::Kb512,
            Self::MegaSt => Memory::Mb1,
            Self::Ste => Memory::Kb512,
        }
    }

    pub fn has_blitter(&self) -> bool {
        !matches!(self, Self::St)
    }
}

impl FromStr for MachineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "st" => Ok(Self::St),
            "megast" | "mega-st" => Ok(Self::MegaSt),
            "ste" => Ok(Self::Ste),
            other => Err(format!("Unknown machine type '{}'", other)),
        }
    }
}
