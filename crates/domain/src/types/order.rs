//! Production order records
//!
//! An [`OrderRecord`] is created by the file parser and never mutated once it
//! is inside the record store. Field names serialize in camelCase so exported
//! loadplan JSON can be read back directly.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::impl_domain_status_conversions;
use crate::types::filter::DateMode;

/// Producing factory. `Unknown` marks rows whose factory could not be
/// attributed; the sync merge step fills it from the file name.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub enum Factory {
    A,
    B,
    C,
    D,
    #[default]
    Unknown,
}

impl Factory {
    pub const KNOWN: [Factory; 4] = [Factory::A, Factory::B, Factory::C, Factory::D];

    pub const fn code(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::Unknown => "Unknown",
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    /// Infer the factory from a loadplan file name.
    ///
    /// Recognises `"... FACTORY A ..."`, `"Factory_B.xlsx"`, a leading
    /// `"C- LOADPLAN ..."` prefix, and bare `"D.csv"` style names.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let stem = upper.rsplit_once('.').map_or(upper.as_str(), |(stem, _)| stem);

        if let Some(idx) = stem.find("FACTORY") {
            let rest = stem[idx + "FACTORY".len()..].trim_start_matches([' ', '_', '-']);
            let mut chars = rest.chars();
            if let Some(letter) = chars.next() {
                let boundary = chars.next().map_or(true, |c| !c.is_ascii_alphanumeric());
                if boundary {
                    if let Some(factory) = Self::from_letter(letter) {
                        return Some(factory);
                    }
                }
            }
        }

        let mut chars = stem.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Self::from_letter(letter),
            (Some(letter), Some(sep)) if matches!(sep, ' ' | '-' | '_' | '.') => {
                Self::from_letter(letter)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Factory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let code = trimmed
            .strip_prefix("FACTORY ")
            .or_else(|| trimmed.strip_prefix("Factory "))
            .unwrap_or(trimmed);
        if code.eq_ignore_ascii_case("unknown") || code.is_empty() {
            return Ok(Self::Unknown);
        }
        let mut chars = code.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Self::from_letter(letter),
            _ => None,
        }
        .ok_or_else(|| format!("Invalid Factory: {s}"))
    }
}

/// Process stages in production order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    SerializeDisplay,
    DeserializeFromStr,
)]
pub enum Stage {
    SCut,
    PreSew,
    SewInput,
    SewBal,
    SFit,
    AssBal,
    WhIn,
    WhOut,
}

impl_domain_status_conversions!(Stage {
    SCut => "s_cut",
    PreSew => "pre_sew",
    SewInput => "sew_input",
    SewBal => "sew_bal",
    SFit => "s_fit",
    AssBal => "ass_bal",
    WhIn => "wh_in",
    WhOut => "wh_out",
});

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::SCut,
        Stage::PreSew,
        Stage::SewInput,
        Stage::SewBal,
        Stage::SFit,
        Stage::AssBal,
        Stage::WhIn,
        Stage::WhOut,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub enum StageStatus {
    #[default]
    #[serde(alias = "unknown")]
    Pending,
    Partial,
    Completed,
}

impl_domain_status_conversions!(StageStatus {
    Pending => "pending",
    Partial => "partial",
    Completed => "completed",
});

/// Progress of one order through one stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct StageProgress {
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub status: StageStatus,
}

impl StageProgress {
    pub fn pending_all(quantity: u64) -> Self {
        Self { completed: 0, pending: quantity, status: StageStatus::Pending }
    }

    pub fn completed_all(quantity: u64) -> Self {
        Self { completed: quantity, pending: 0, status: StageStatus::Completed }
    }

    /// Progress from a remaining-quantity reading
    pub fn from_remaining(quantity: u64, remaining: u64) -> Self {
        let status = if remaining == 0 {
            StageStatus::Completed
        } else if remaining >= quantity {
            StageStatus::Pending
        } else {
            StageStatus::Partial
        };
        Self { completed: quantity.saturating_sub(remaining), pending: remaining, status }
    }
}

/// Ordered stage -> progress mapping
pub type Production = BTreeMap<Stage, StageProgress>;

/// One production order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct OrderRecord {
    pub po_number: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts-gen", ts(type = "string"))]
    pub factory: Factory,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub destination: String,
    /// Outsole vendor
    #[serde(default, alias = "outsoleVendor")]
    pub vendor: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub quantity: u64,
    /// Customer-required date
    #[serde(default)]
    pub crd: String,
    /// Scheduled delivery date
    #[serde(default)]
    pub sdd_value: String,
    /// Approval marker for a moved SDD; suppresses delay classification
    #[serde(default)]
    pub code04: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "ts-gen", ts(type = "Record<string, StageProgress>"))]
    pub production: Production,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub season: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub aql: bool,
    #[serde(default)]
    pub inspection: Option<String>,
}

impl OrderRecord {
    /// Date string driving month/range/quick filters for the given mode
    pub fn date_for(&self, mode: DateMode) -> &str {
        match mode {
            DateMode::Sdd => &self.sdd_value,
            DateMode::Crd => &self.crd,
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageProgress> {
        self.production.get(&stage)
    }

    /// Completed quantity for a stage; missing stages count as zero
    pub fn stage_completed(&self, stage: Stage) -> u64 {
        self.stage(stage).map_or(0, |progress| progress.completed)
    }

    /// Any non-empty `code04` marker approves a late SDD
    pub fn has_approval_override(&self) -> bool {
        self.code04.as_deref().is_some_and(|code| !code.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_from_file_name_variants() {
        assert_eq!(
            Factory::from_file_name("A- LOADPLAN ASSEMBLY OF RACHGIA FACTORY A  12.20.2025.xlsx"),
            Some(Factory::A)
        );
        assert_eq!(Factory::from_file_name("Factory_B.xlsx"), Some(Factory::B));
        assert_eq!(Factory::from_file_name("C- loadplan.csv"), Some(Factory::C));
        assert_eq!(Factory::from_file_name("D.xlsx"), Some(Factory::D));
        assert_eq!(Factory::from_file_name("summary.xlsx"), None);
        assert_eq!(Factory::from_file_name("FACTORY ZONE.xlsx"), None);
    }

    #[test]
    fn factory_parses_codes() {
        assert_eq!("b".parse::<Factory>(), Ok(Factory::B));
        assert_eq!("FACTORY C".parse::<Factory>(), Ok(Factory::C));
        assert_eq!("".parse::<Factory>(), Ok(Factory::Unknown));
        assert!("E".parse::<Factory>().is_err());
    }

    #[test]
    fn stage_progress_from_remaining() {
        assert_eq!(StageProgress::from_remaining(100, 0).status, StageStatus::Completed);
        assert_eq!(StageProgress::from_remaining(100, 100).status, StageStatus::Pending);
        let partial = StageProgress::from_remaining(100, 30);
        assert_eq!(partial.status, StageStatus::Partial);
        assert_eq!(partial.completed, 70);
    }

    #[test]
    fn deserializes_exported_camel_case_record() {
        let json = r#"{
            "poNumber": "PO-1",
            "factory": "A",
            "destination": "Germany",
            "outsoleVendor": "VN-OS",
            "quantity": 120,
            "crd": "2025-03-01",
            "sddValue": "2025-03-05",
            "code04": null,
            "production": {
                "wh_out": {"completed": 0, "pending": 120, "status": "pending"},
                "s_cut": {"completed": 120, "pending": 0, "status": "completed"}
            }
        }"#;
        let record: OrderRecord = serde_json::from_str(json).expect("valid record");

        assert_eq!(record.vendor, "VN-OS");
        assert_eq!(record.date_for(DateMode::Sdd), "2025-03-05");
        assert_eq!(record.stage_completed(Stage::SCut), 120);
        assert_eq!(record.stage_completed(Stage::WhIn), 0);
        let stages: Vec<_> = record.production.keys().copied().collect();
        assert_eq!(stages, vec![Stage::SCut, Stage::WhOut]);
        assert!(!record.has_approval_override());
    }

    /// Validates which `code04` values approve a late SDD.
    ///
    /// Assertions:
    /// - Missing and empty markers do not approve
    /// - Any other marker approves, including whitespace-only text
    #[test]
    fn any_non_empty_code04_is_an_approval() {
        let with_code = |code: Option<&str>| OrderRecord {
            code04: code.map(str::to_string),
            ..OrderRecord::default()
        };

        assert!(!with_code(None).has_approval_override());
        assert!(!with_code(Some("")).has_approval_override());
        assert!(with_code(Some("APPROVED")).has_approval_override());
        assert!(with_code(Some(" ")).has_approval_override());
    }
}
