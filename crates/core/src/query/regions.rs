//! Regional destination groups
//!
//! A destination filter of the form `region:<name>` matches every
//! destination country belonging to that region.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix that turns a destination filter into a regional match
pub const REGION_PREFIX: &str = "region:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    Europe,
    Asia,
    Americas,
    Oceania,
    MiddleEastAfrica,
}

const EUROPE: &[&str] = &[
    "austria", "belgium", "bulgaria", "croatia", "czech republic", "czechia", "denmark",
    "estonia", "finland", "france", "germany", "greece", "hungary", "iceland", "ireland",
    "italy", "latvia", "lithuania", "luxembourg", "netherlands", "norway", "poland",
    "portugal", "romania", "russia", "serbia", "slovakia", "slovenia", "spain", "sweden",
    "switzerland", "ukraine", "united kingdom", "uk", "england", "eu",
];

const ASIA: &[&str] = &[
    "bangladesh", "cambodia", "china", "hong kong", "india", "indonesia", "japan", "korea",
    "south korea", "malaysia", "myanmar", "pakistan", "philippines", "singapore", "sri lanka",
    "taiwan", "thailand", "vietnam", "viet nam", "kazakhstan",
];

const AMERICAS: &[&str] = &[
    "argentina", "brazil", "canada", "chile", "colombia", "costa rica", "ecuador",
    "guatemala", "mexico", "panama", "peru", "united states", "usa", "us", "uruguay",
    "venezuela",
];

const OCEANIA: &[&str] = &["australia", "new zealand", "fiji", "papua new guinea"];

const MIDDLE_EAST_AFRICA: &[&str] = &[
    "algeria", "bahrain", "egypt", "israel", "jordan", "kenya", "kuwait", "lebanon",
    "morocco", "nigeria", "oman", "qatar", "saudi arabia", "south africa", "tunisia",
    "turkey", "turkiye", "united arab emirates", "uae",
];

impl Region {
    pub const ALL: [Region; 5] = [
        Region::Europe,
        Region::Asia,
        Region::Americas,
        Region::Oceania,
        Region::MiddleEastAfrica,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Europe => "Europe",
            Self::Asia => "Asia",
            Self::Americas => "Americas",
            Self::Oceania => "Oceania",
            Self::MiddleEastAfrica => "Middle East & Africa",
        }
    }

    fn countries(self) -> &'static [&'static str] {
        match self {
            Self::Europe => EUROPE,
            Self::Asia => ASIA,
            Self::Americas => AMERICAS,
            Self::Oceania => OCEANIA,
            Self::MiddleEastAfrica => MIDDLE_EAST_AFRICA,
        }
    }

    /// Region a destination belongs to, if it is in the table
    pub fn of(destination: &str) -> Option<Self> {
        let normalized = destination.trim().to_lowercase();
        Self::ALL.into_iter().find(|region| region.countries().contains(&normalized.as_str()))
    }

    pub fn contains(self, destination: &str) -> bool {
        Self::of(destination) == Some(self)
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "europe" | "eu" => Ok(Self::Europe),
            "asia" => Ok(Self::Asia),
            "americas" | "america" => Ok(Self::Americas),
            "oceania" => Ok(Self::Oceania),
            "middleeastafrica" | "middleeast" | "mea" => Ok(Self::MiddleEastAfrica),
            _ => Err(format!("Invalid Region: {s}")),
        }
    }
}

/// Split a `region:<name>` destination filter
pub fn parse_region_filter(destination: &str) -> Option<Result<Region, String>> {
    let trimmed = destination.trim();
    let prefix = trimmed.get(..REGION_PREFIX.len())?;
    prefix
        .eq_ignore_ascii_case(REGION_PREFIX)
        .then(|| trimmed[REGION_PREFIX.len()..].parse())
}
