//! Static lookup tables used when composing posts.
//!
//! Loaded once at startup (built-in defaults or a TOML file) and never
//! mutated afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Institution names and their social handles.
const DEFAULT_HANDLES: &[(&str, &str)] = &[
    (
        "Agencji Restrukturyzacji i Modernizacji Rolnictwa",
        "@ARiMR_GOV_PL",
    ),
    ("Centralnego Biura Antykorupcyjnego", "@CBAgovPL"),
    ("Centralnym Biurze Antykorupcyjnym", "@CBAgovPL"),
    ("Głównego Inspektora Transportu Drogowego", "@ITD_gov"),
    ("Ministra Aktywów Państwowych", "@MAPgovPL"),
    ("Ministra Edukacji i Nauki", "@Nauka_gov_PL"),
    ("Ministra Finansów ", "@MF_gov_PL "),
    (
        "Ministra Finansów, Funduszy i Polityki Regionalnej",
        "@MF_gov_PL",
    ),
    ("Ministra Funduszy i Polityki Regionalnej", "@MFiPR_gov_PL"),
    ("Ministra Infrastruktury", "@MI_gov_PL"),
    ("Ministra Klimatu i Środowiska", "@MKiS_gov_PL"),
    ("Ministra Klimatu", "@MKiS_gov_PL"),
    ("Ministra Kultury i Dziedzictwa Narodowego", "@kultura_gov_pl"),
    (
        "Ministra Kultury, Dziedzictwa Narodowego i Sportu",
        "@kultura_gov_pl",
    ),
    ("Ministra Nauki i Szkolnictwa Wyższego", "@Nauka_gov_PL"),
    ("Ministra Obrony Narodowej", "@MON_gov_PL"),
    ("Ministra Rodziny i Polityki Społecznej", "@MRiPS_gov_PL"),
    ("Ministra Rolnictwa i Rozwoju Wsi", "@MRiRW_gov_PL"),
    ("Ministra Rozwoju i Technologii", "@MRiTGOVPL"),
    ("Ministra Rozwoju, Pracy i Technologii", "@MRiTGOVPL"),
    ("Ministra Sportu", "@Sport_gov_PL"),
    ("Ministra Spraw Wewnętrznych i Administracji", "@MSWiA_gov_PL"),
    ("Ministra Spraw Zagranicznych", "@MSZ_RP"),
    ("Ministra Sprawiedliwości", "@MS_gov_PL"),
    ("Ministra Zdrowia", "@MZ_gov_PL"),
    ("Państwowej Komisji Wyborczej", "@PanstwKomWyb"),
    ("Państwowej Straży Pożarnej", "@KGPSP"),
    ("Prezesa Rady Ministrów", "@PremierRP"),
    ("Prezydenta Rzeczypospolitej Polskiej", "@PrezydentPL"),
    ("Sejmu Rzeczypospolitej Polskiej", "@KancelariaSejmu"),
    ("Straży Granicznej", "@Straz_Graniczna"),
    ("Trybunału Konstytucyjnego", "@TK_gov_PL"),
];

/// Leading keywords and the emoji prepended to titles starting with them.
const DEFAULT_EMOJIS: &[(&str, &str)] = &[
    ("Obwieszczenie", "📢"),
    ("Umowa", "🤝"),
    ("Porozumienie", "🤝"),
];

/// A position rendered as a glyph in the citation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Position that triggers the glyph.
    pub position: u32,
    /// Replacement text for the position number.
    pub glyph: String,
}

/// Lookup tables for title transformation and citation rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tables {
    /// Institution name to handle.
    #[serde(default = "default_handles")]
    pub handles: BTreeMap<String, String>,
    /// Title prefix keyword to emoji.
    #[serde(default = "default_emojis")]
    pub emojis: BTreeMap<String, String>,
    /// Positions rendered as glyphs.
    #[serde(default = "default_milestones")]
    pub milestones: Vec<Milestone>,
}

fn default_handles() -> BTreeMap<String, String> {
    to_map(DEFAULT_HANDLES)
}

fn default_emojis() -> BTreeMap<String, String> {
    to_map(DEFAULT_EMOJIS)
}

fn default_milestones() -> Vec<Milestone> {
    vec![Milestone {
        position: 100,
        glyph: "💯".to_string(),
    }]
}

fn to_map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            handles: default_handles(),
            emojis: default_emojis(),
            milestones: default_milestones(),
        }
    }
}

impl Tables {
    /// Empty tables: no substitutions, no emoji, no milestones.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            handles: BTreeMap::new(),
            emojis: BTreeMap::new(),
            milestones: Vec::new(),
        }
    }

    /// Load tables from a TOML file. Missing sections keep the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tables from {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse tables in {}", path.display()))
    }

    /// Parse tables from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Add or replace a handle substitution.
    #[must_use]
    pub fn with_handle(mut self, name: impl Into<String>, handle: impl Into<String>) -> Self {
        self.handles.insert(name.into(), handle.into());
        self
    }

    /// Add or replace an emoji prefix rule.
    #[must_use]
    pub fn with_emoji(mut self, keyword: impl Into<String>, emoji: impl Into<String>) -> Self {
        self.emojis.insert(keyword.into(), emoji.into());
        self
    }

    /// Handle substitutions, longest name first.
    ///
    /// Longer names win so that `Ministra Klimatu i Środowiska` is not
    /// rewritten through its prefix `Ministra Klimatu`.
    pub fn handles_longest_first(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .handles
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Glyph for a milestone position.
    #[must_use]
    pub fn milestone_glyph(&self, position: u32) -> Option<&str> {
        self.milestones
            .iter()
            .find(|m| m.position == position)
            .map(|m| m.glyph.as_str())
    }

    /// Position for a milestone glyph.
    #[must_use]
    pub fn milestone_position(&self, glyph: &str) -> Option<u32> {
        self.milestones
            .iter()
            .find(|m| m.glyph == glyph)
            .map(|m| m.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_contain_known_entries() {
        let tables = Tables::default();
        assert_eq!(
            tables.handles.get("Ministra Zdrowia").map(String::as_str),
            Some("@MZ_gov_PL")
        );
        assert_eq!(
            tables.emojis.get("Obwieszczenie").map(String::as_str),
            Some("📢")
        );
        assert_eq!(tables.milestone_glyph(100), Some("💯"));
        assert_eq!(tables.milestone_position("💯"), Some(100));
        assert_eq!(tables.milestone_glyph(101), None);
    }

    #[test]
    fn test_longest_first_ordering() {
        let tables = Tables::default();
        let ordered = tables.handles_longest_first();
        let long = ordered
            .iter()
            .position(|(k, _)| *k == "Ministra Klimatu i Środowiska")
            .unwrap();
        let short = ordered
            .iter()
            .position(|(k, _)| *k == "Ministra Klimatu")
            .unwrap();
        assert!(long < short);
    }

    #[test]
    fn test_from_toml_overrides_sections() {
        let tables = Tables::from_toml(
            r#"
[handles]
"Ministra Zdrowia" = "@zdrowie"

[[milestones]]
position = 1000
glyph = "🎉"
"#,
        )
        .unwrap();

        assert_eq!(tables.handles.len(), 1);
        assert_eq!(tables.milestone_glyph(1000), Some("🎉"));
        assert_eq!(tables.milestone_glyph(100), None);
        // Emoji section was not given, defaults stay
        assert_eq!(tables.emojis.len(), 3);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Tables::load(Path::new("/nonexistent/tables.toml"));
        assert!(result.is_err());
    }
}
