//! Prayer time calculation conventions.
//!
//! The timing source receives the method's integer code verbatim; the engine
//! itself treats it as opaque.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CalculationMethod {
    Jafari,
    Karachi,
    Isna,
    MuslimWorldLeague,
    UmmAlQura,
    Egyptian,
    Tehran,
    Gulf,
    Kuwait,
    Qatar,
    Singapore,
    France,
    Turkey,
    Russia,
}

impl CalculationMethod {
    pub const ALL: [CalculationMethod; 14] = [
        CalculationMethod::MuslimWorldLeague,
        CalculationMethod::Isna,
        CalculationMethod::Egyptian,
        CalculationMethod::UmmAlQura,
        CalculationMethod::Karachi,
        CalculationMethod::Tehran,
        CalculationMethod::Jafari,
        CalculationMethod::Gulf,
        CalculationMethod::Kuwait,
        CalculationMethod::Qatar,
        CalculationMethod::Singapore,
        CalculationMethod::France,
        CalculationMethod::Turkey,
        CalculationMethod::Russia,
    ];

    /// Stable identifier sent as the `method` query parameter.
    pub fn code(self) -> u8 {
        match self {
            CalculationMethod::Jafari => 0,
            CalculationMethod::Karachi => 1,
            CalculationMethod::Isna => 2,
            CalculationMethod::MuslimWorldLeague => 3,
            CalculationMethod::UmmAlQura => 4,
            CalculationMethod::Egyptian => 5,
            CalculationMethod::Tehran => 7,
            CalculationMethod::Gulf => 8,
            CalculationMethod::Kuwait => 9,
            CalculationMethod::Qatar => 10,
            CalculationMethod::Singapore => 11,
            CalculationMethod::France => 12,
            CalculationMethod::Turkey => 13,
            CalculationMethod::Russia => 14,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or(ValidationError::UnknownCalculationMethod(code))
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Muslim World League",
            CalculationMethod::Isna => "Islamic Society of North America (ISNA)",
            CalculationMethod::Egyptian => "Egyptian General Authority of Survey",
            CalculationMethod::UmmAlQura => "Umm Al-Qura University, Makkah",
            CalculationMethod::Karachi => "University of Islamic Sciences, Karachi",
            CalculationMethod::Tehran => "Institute of Geophysics, University of Tehran",
            CalculationMethod::Jafari => "Shia Ithna-Ashari, Leva Institute, Qum",
            CalculationMethod::Gulf => "Gulf Region",
            CalculationMethod::Kuwait => "Kuwait",
            CalculationMethod::Qatar => "Qatar",
            CalculationMethod::Singapore => "Majlis Ugama Islam Singapura, Singapore",
            CalculationMethod::France => "Union Organization Islamic de France",
            CalculationMethod::Turkey => "Diyanet İşleri Başkanlığı, Turkey",
            CalculationMethod::Russia => "Spiritual Administration of Muslims of Russia",
        }
    }

    pub fn short_name(self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "MWL",
            CalculationMethod::Isna => "ISNA",
            CalculationMethod::Egyptian => "Egyptian",
            CalculationMethod::UmmAlQura => "Umm Al-Qura",
            CalculationMethod::Karachi => "Karachi",
            CalculationMethod::Tehran => "Tehran",
            CalculationMethod::Jafari => "Jafari",
            CalculationMethod::Gulf => "Gulf",
            CalculationMethod::Kuwait => "Kuwait",
            CalculationMethod::Qatar => "Qatar",
            CalculationMethod::Singapore => "Singapore",
            CalculationMethod::France => "France",
            CalculationMethod::Turkey => "Turkey",
            CalculationMethod::Russia => "Russia",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CalculationMethod::MuslimWorldLeague => "Widely used globally, moderate approach",
            CalculationMethod::Isna => "Used primarily in North America",
            CalculationMethod::Egyptian => "Used in Egypt and surrounding regions",
            CalculationMethod::UmmAlQura => "Official method used in Saudi Arabia",
            CalculationMethod::Karachi => "Used in Pakistan and parts of South Asia",
            CalculationMethod::Tehran => "Used in Iran",
            CalculationMethod::Jafari => "Used by Shia communities",
            CalculationMethod::Gulf => "Used in Gulf countries",
            CalculationMethod::Kuwait => "Official method for Kuwait",
            CalculationMethod::Qatar => "Official method for Qatar",
            CalculationMethod::Singapore => "Official method for Singapore",
            CalculationMethod::France => "Official method for France",
            CalculationMethod::Turkey => "Official method for Turkey",
            CalculationMethod::Russia => "Official method for Russia",
        }
    }

    /// Recommended method for a 2-letter country code (case-insensitive).
    /// Unmapped codes fall back to the default.
    pub fn recommended(country_code: &str) -> Self {
        match country_code.trim().to_ascii_uppercase().as_str() {
            "US" | "CA" => CalculationMethod::Isna,
            "EG" => CalculationMethod::Egyptian,
            "SA" => CalculationMethod::UmmAlQura,
            "PK" | "IN" | "BD" => CalculationMethod::Karachi,
            "IR" => CalculationMethod::Tehran,
            "KW" => CalculationMethod::Kuwait,
            "QA" => CalculationMethod::Qatar,
            "SG" => CalculationMethod::Singapore,
            "FR" => CalculationMethod::France,
            "TR" => CalculationMethod::Turkey,
            "RU" => CalculationMethod::Russia,
            "AE" | "OM" | "BH" => CalculationMethod::Gulf,
            _ => CalculationMethod::default(),
        }
    }
}

impl Default for CalculationMethod {
    fn default() -> Self {
        CalculationMethod::MuslimWorldLeague
    }
}

impl TryFrom<u8> for CalculationMethod {
    type Error = ValidationError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<CalculationMethod> for u8 {
    fn from(method: CalculationMethod) -> Self {
        method.code()
    }
}

impl std::fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
