use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// One value inside a primary-source `printouts` list. Cross-referenced
/// entities (manufacturers, series) arrive as `{fulltext, fullurl}` maps;
/// plain attributes arrive as strings or numbers. The `Other` arm keeps a
/// single odd value from poisoning the whole dataset load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrintoutValue {
    CrossRef {
        fulltext: String,
        #[serde(default)]
        fullurl: Option<String>,
    },
    Text(String),
    Number(f64),
    Other(serde_json::Value),
}

impl PrintoutValue {
    pub fn as_text(&self) -> Option<String> {
        match self {
            PrintoutValue::CrossRef { fulltext, .. } => Some(fulltext.clone()),
            PrintoutValue::Text(s) => Some(s.clone()),
            PrintoutValue::Number(n) => Some(n.to_string()),
            PrintoutValue::Other(_) => None,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            PrintoutValue::CrossRef { fullurl, .. } => fullurl.as_deref(),
            _ => None,
        }
    }
}

/// Primary structured dataset entry: raw attribute printouts plus the
/// entity's canonical wiki URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawShipRecord {
    #[serde(default)]
    pub printouts: HashMap<String, Vec<PrintoutValue>>,
    #[serde(default)]
    pub fullurl: Option<String>,
}

impl RawShipRecord {
    pub fn manufacturer_text(&self) -> Option<String> {
        self.printouts
            .get("Manufacturer")
            .and_then(|values| values.first())
            .and_then(PrintoutValue::as_text)
    }

    pub fn manufacturer_url(&self) -> Option<String> {
        self.printouts
            .get("Manufacturer")
            .and_then(|values| values.first())
            .and_then(|v| v.url().map(str::to_string))
    }

    pub fn roles(&self) -> Vec<String> {
        self.printouts
            .get("Role")
            .map(|values| values.iter().filter_map(PrintoutValue::as_text).collect())
            .unwrap_or_default()
    }

    /// True when the named printout exists and carries at least one value.
    pub fn has_printout(&self, field: &str) -> bool {
        self.printouts
            .get(field)
            .is_some_and(|values| !values.is_empty())
    }
}

/// Secondary enrichment dataset entry with normalized fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedShip {
    pub name: String,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub cargo_capacity: Option<f64>,
    #[serde(default)]
    pub crew_size: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One ship as the store holds it: whichever of the two sources knows about
/// it. At least one side is always populated; `new` refuses the empty pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipRecord {
    pub primary: Option<RawShipRecord>,
    pub secondary: Option<NormalizedShip>,
}

impl ShipRecord {
    pub fn new(
        primary: Option<RawShipRecord>,
        secondary: Option<NormalizedShip>,
    ) -> Result<Self, AppError> {
        if primary.is_none() && secondary.is_none() {
            return Err(AppError::InvalidInput(
                "ship record must have at least one source".to_string(),
            ));
        }
        Ok(Self { primary, secondary })
    }

    pub fn from_primary(primary: RawShipRecord) -> Self {
        Self {
            primary: Some(primary),
            secondary: None,
        }
    }

    pub fn from_secondary(secondary: NormalizedShip) -> Self {
        Self {
            primary: None,
            secondary: Some(secondary),
        }
    }

    pub fn detail_url(&self) -> Option<String> {
        self.primary.as_ref().and_then(|p| p.fullurl.clone())
    }

    pub fn manufacturer_url(&self) -> Option<String> {
        self.primary.as_ref().and_then(RawShipRecord::manufacturer_url)
    }

    /// Canonical single-record view. The secondary source wins for the
    /// normalized fields (price, manufacturer, size, cargo, crew, role);
    /// the primary source supplies everything else, including the URLs and
    /// the raw attribute printouts.
    pub fn merged_view(&self) -> MergedShip {
        let primary = self.primary.as_ref();
        let secondary = self.secondary.as_ref();

        let roles = secondary
            .and_then(|s| s.role.clone())
            .map(|role| vec![role])
            .or_else(|| primary.map(RawShipRecord::roles))
            .unwrap_or_default();

        MergedShip {
            price: secondary.and_then(|s| s.price),
            manufacturer: secondary
                .and_then(|s| s.manufacturer.clone())
                .or_else(|| primary.and_then(RawShipRecord::manufacturer_text)),
            size: secondary.and_then(|s| s.size.clone()),
            cargo_capacity: secondary.and_then(|s| s.cargo_capacity),
            crew: secondary.and_then(|s| s.crew_size.clone()),
            roles,
            detail_url: primary.and_then(|p| p.fullurl.clone()),
            manufacturer_url: primary.and_then(RawShipRecord::manufacturer_url),
            printouts: primary.map(|p| p.printouts.clone()).unwrap_or_default(),
        }
    }
}

/// The merged, payload-ready view of one ship record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedShip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cargo_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crew: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer_url: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub printouts: HashMap<String, Vec<PrintoutValue>>,
}
