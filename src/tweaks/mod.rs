// src/tweaks/mod.rs

pub mod loader;

use indexmap::IndexMap;
use strum_macros::{Display, EnumIter, EnumString};

/// Grouping used to present tweaks and to apply them in bulk.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum TweakCategory {
    #[strum(serialize = "NVIDIA")]
    Nvidia,
    #[strum(serialize = "AMD")]
    Amd,
    Intel,
    #[strum(serialize = "CPU")]
    Cpu,
    Power,
    Network,
    Cleanup,
    System,
}

impl TweakCategory {
    /// Picks the category from keywords in the title, then the script.
    /// The first matching rule wins; anything unmatched is `System`.
    pub fn classify(title: &str, script: &str) -> Self {
        let title = title.to_lowercase();
        let script = script.to_lowercase();
        let either = |keyword: &str| title.contains(keyword) || script.contains(keyword);

        if either("nvidia") {
            TweakCategory::Nvidia
        } else if either("amd") {
            TweakCategory::Amd
        } else if either("intel") {
            TweakCategory::Intel
        } else if title.contains("processor") || either("cpu") {
            TweakCategory::Cpu
        } else if title.contains("energia") || either("power") {
            TweakCategory::Power
        } else if title.contains("tcp") || either("network") {
            TweakCategory::Network
        } else if title.contains("temp") || either("clean") {
            TweakCategory::Cleanup
        } else {
            TweakCategory::System
        }
    }
}

/// Hardware vendor a tweak targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum HardwareTag {
    #[strum(serialize = "NVIDIA")]
    Nvidia,
    #[strum(serialize = "AMD")]
    Amd,
    Intel,
    Universal,
}

impl HardwareTag {
    pub fn classify(title: &str, script: &str) -> Vec<Self> {
        let text = format!("{}\n{}", title, script).to_lowercase();
        let tag = if text.contains("nvidia") {
            HardwareTag::Nvidia
        } else if text.contains("amd") {
            HardwareTag::Amd
        } else if text.contains("intel") {
            HardwareTag::Intel
        } else {
            HardwareTag::Universal
        };
        vec![tag]
    }
}

const RESTART_KEYWORDS: [&str; 4] = ["restart", "reboot", "reiniciar", "shutdown"];

/// Represents a single tweak loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tweak {
    /// Stable identifier, the source file name.
    pub id: String,
    pub title: String,
    /// Raw script text as shipped; sanitized right before running.
    pub script: String,
    pub category: TweakCategory,
    pub compatible_hardware: Vec<HardwareTag>,
    /// Whether the script reboots or asks for a restart.
    pub requires_restart: bool,
    /// Set once the script has run successfully in this session.
    pub applied: bool,
    /// Toggle state, seeded from the state file.
    pub enabled: bool,
}

impl Tweak {
    pub fn new(id: impl Into<String>, title: impl Into<String>, script: impl Into<String>) -> Self {
        let title = title.into();
        let script = script.into();
        let requires_restart = {
            let lower = script.to_lowercase();
            RESTART_KEYWORDS.iter().any(|k| lower.contains(k))
        };

        Self {
            id: id.into(),
            category: TweakCategory::classify(&title, &script),
            compatible_hardware: HardwareTag::classify(&title, &script),
            requires_restart,
            title,
            script,
            applied: false,
            enabled: false,
        }
    }
}

/// Groups tweaks by category, keeping load order inside each group.
pub fn group_by_category(tweaks: &[Tweak]) -> IndexMap<TweakCategory, Vec<&Tweak>> {
    let mut groups: IndexMap<TweakCategory, Vec<&Tweak>> = IndexMap::new();
    for tweak in tweaks {
        groups.entry(tweak.category).or_default().push(tweak);
    }
    groups.sort_keys();
    groups
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_category_prefers_title_keywords_in_rule_order() {
        assert_eq!(
            TweakCategory::classify("NVIDIA Low Latency", ""),
            TweakCategory::Nvidia
        );
        assert_eq!(
            TweakCategory::classify("Processor scheduling", "REG ADD HKLM\\X /v Y /d 1"),
            TweakCategory::Cpu
        );
        assert_eq!(
            TweakCategory::classify("Plano de energia", ""),
            TweakCategory::Power
        );
        assert_eq!(TweakCategory::classify("TCP Ack", ""), TweakCategory::Network);
        assert_eq!(TweakCategory::classify("Clear temp", ""), TweakCategory::Cleanup);
        assert_eq!(TweakCategory::classify("Misc", "echo hi"), TweakCategory::System);
    }

    #[test]
    fn test_category_falls_back_to_script_keywords() {
        assert_eq!(
            TweakCategory::classify("Latency", "powercfg -setactive scheme_min"),
            TweakCategory::Power
        );
        assert_eq!(
            TweakCategory::classify("Latency", "REG ADD HKLM\\SOFTWARE\\Intel\\GMM /v X /d 1"),
            TweakCategory::Intel
        );
    }

    #[test]
    fn test_category_names_parse_back() {
        for category in TweakCategory::iter() {
            let name = category.to_string();
            assert_eq!(TweakCategory::from_str(&name).unwrap(), category);
            assert_eq!(
                TweakCategory::from_str(&name.to_lowercase()).unwrap(),
                category
            );
        }
    }

    #[test]
    fn test_new_tweak_derives_metadata() {
        let tweak = Tweak::new("gpu", "NVIDIA Tweak", "REG ADD HKLM\\X /v Y /d 1\r\nshutdown /r");
        assert_eq!(tweak.category, TweakCategory::Nvidia);
        assert_eq!(tweak.compatible_hardware, vec![HardwareTag::Nvidia]);
        assert!(tweak.requires_restart);
        assert!(!tweak.applied);
        assert!(!tweak.enabled);

        let plain = Tweak::new("x", "Menu delay", "REG ADD HKCU\\X /v Y /d 0");
        assert_eq!(plain.compatible_hardware, vec![HardwareTag::Universal]);
        assert!(!plain.requires_restart);
    }

    #[test]
    fn test_group_by_category_orders_groups() {
        let tweaks = vec![
            Tweak::new("a", "Misc", ""),
            Tweak::new("b", "Power saver", ""),
            Tweak::new("c", "Other", ""),
        ];
        let groups = group_by_category(&tweaks);

        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![TweakCategory::Power, TweakCategory::System]);
        assert_eq!(groups[&TweakCategory::System].len(), 2);
        assert_eq!(groups[&TweakCategory::System][1].id, "c");
    }
}
