//! Blood glucose units and conversion

use serde::{Deserialize, Serialize};

/// Factor between mmol/L and mg/dL
pub const MMOL_TO_MGDL: f64 = 18.02;

/// Units the user reads glucose values in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Units {
    #[serde(rename = "mg/dL")]
    #[default]
    MgDl,
    #[serde(rename = "mmol/L")]
    MmolL,
}

impl Units {
    /// Convert a displayed value into mg/dL.
    ///
    /// Values that do not parse as a finite number (e.g. `"---"` or an empty
    /// string) convert to `0.0`, which callers treat as "no valid value".
    pub fn to_mgdl(&self, value: &str) -> f64 {
        let parsed = value.trim().replace(',', ".").parse::<f64>();
        let number = match parsed {
            Ok(n) if n.is_finite() => n,
            _ => return 0.0,
        };

        match self {
            Units::MgDl => number,
            Units::MmolL => number * MMOL_TO_MGDL,
        }
    }

    /// Format a mg/dL value for display in these units
    pub fn format_mgdl(&self, mgdl: f64) -> String {
        match self {
            Units::MgDl => format!("{:.0}", mgdl),
            Units::MmolL => format!("{:.1}", mgdl / MMOL_TO_MGDL),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Units::MgDl => "mg/dL",
            Units::MmolL => "mmol/L",
        }
    }
}
