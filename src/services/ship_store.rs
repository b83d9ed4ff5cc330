use std::path::Path;

use indexmap::IndexMap;
use tracing::{error, info};

use crate::models::ships::{NormalizedShip, RawShipRecord, ShipRecord};

/// Price below which a ship counts as inexpensive for "cheap" queries,
/// in aUEC.
pub const CHEAP_PRICE_CEILING: i64 = 1_000_000;

/// Query tokens that make cargo capacity itself a match signal.
const TRANSPORT_TOKENS: &[&str] = &["cargo", "transport", "hauling"];

/// In-memory store of every known ship, keyed by display name in source
/// order. Loaded once at startup, read for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ShipStore {
    ships: IndexMap<String, ShipRecord>,
}

impl ShipStore {
    /// Loads and merges both datasets. Either file being missing or
    /// malformed logs an error and contributes nothing; lookups against
    /// the resulting (possibly empty) store return empty results rather
    /// than failing.
    pub fn load(primary_path: impl AsRef<Path>, secondary_path: impl AsRef<Path>) -> Self {
        let primary = Self::read_primary(primary_path.as_ref());
        let secondary = Self::read_secondary(secondary_path.as_ref());

        let mut ships: IndexMap<String, ShipRecord> = IndexMap::new();
        for (name, record) in primary {
            ships.insert(name, ShipRecord::from_primary(record));
        }
        for normalized in secondary {
            match ships.get_mut(&normalized.name) {
                Some(existing) => existing.secondary = Some(normalized),
                None => {
                    ships.insert(
                        normalized.name.clone(),
                        ShipRecord::from_secondary(normalized),
                    );
                }
            }
        }

        info!(ship_count = ships.len(), "Ship store loaded");
        Self { ships }
    }

    fn read_primary(path: &Path) -> IndexMap<String, RawShipRecord> {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    error!(path = %path.display(), "Error parsing ship data: {}", e);
                    IndexMap::new()
                }
            },
            Err(e) => {
                error!(path = %path.display(), "Error loading ship data: {}", e);
                IndexMap::new()
            }
        }
    }

    fn read_secondary(path: &Path) -> Vec<NormalizedShip> {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(e) => {
                    error!(path = %path.display(), "Error parsing enriched ship data: {}", e);
                    Vec::new()
                }
            },
            Err(e) => {
                error!(path = %path.display(), "Error loading enriched ship data: {}", e);
                Vec::new()
            }
        }
    }

    /// Builds a store directly from records, in the given order.
    pub fn from_records(records: impl IntoIterator<Item = (String, ShipRecord)>) -> Self {
        Self {
            ships: records.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ships.len()
    }

    /// All known ship names, source order.
    pub fn list_identities(&self) -> Vec<String> {
        self.ships.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&ShipRecord> {
        self.ships.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ShipRecord)> {
        self.ships.iter()
    }

    /// Ships relevant to the query, store order. Exact tier first: every
    /// qualifying token (longer than 2 chars, lowercased) must appear in
    /// the ship name, so "manufacturer + model" queries stay precise.
    /// Only when that yields nothing does the broad tier run, accepting a
    /// single token hit on the name or an attribute match.
    pub fn find_relevant(&self, query: &str) -> IndexMap<String, ShipRecord> {
        let tokens = query_tokens(query);
        let mut relevant: IndexMap<String, ShipRecord> = IndexMap::new();

        if tokens.is_empty() {
            return relevant;
        }

        for (name, record) in &self.ships {
            let name_lower = name.to_lowercase();
            if tokens.iter().all(|t| name_lower.contains(t.as_str())) {
                relevant.insert(name.clone(), record.clone());
            }
        }

        if relevant.is_empty() {
            for (name, record) in &self.ships {
                let name_lower = name.to_lowercase();
                if tokens.iter().any(|t| name_lower.contains(t.as_str()))
                    || attributes_match(record, &tokens)
                {
                    relevant.insert(name.clone(), record.clone());
                }
            }
        }

        relevant
    }

    pub fn get_url(&self, name: &str) -> Option<String> {
        self.ships.get(name).and_then(ShipRecord::detail_url)
    }

    pub fn get_manufacturer_url(&self, name: &str) -> Option<String> {
        self.ships.get(name).and_then(ShipRecord::manufacturer_url)
    }

    /// Normalized price from the enrichment source, when present.
    pub fn get_price(&self, name: &str) -> Option<i64> {
        self.ships
            .get(name)
            .and_then(|r| r.secondary.as_ref())
            .and_then(|s| s.price)
    }

    /// Detail URLs for the given candidates, deduplicated, for enrichment
    /// scraping. Pledge-store URLs are deliberately excluded.
    pub fn get_relevant_urls(&self, candidates: &IndexMap<String, ShipRecord>) -> Vec<String> {
        let mut urls = Vec::new();
        for record in candidates.values() {
            if let Some(url) = record.detail_url() {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }
        urls
    }

    /// Citation URLs for the given candidates: each ship's detail URL plus
    /// its manufacturer URL, deduplicated. Used by the legacy answer mode.
    pub fn get_data_sources(&self, candidates: &IndexMap<String, ShipRecord>) -> Vec<String> {
        let mut sources = Vec::new();
        for name in candidates.keys() {
            if let Some(record) = self.ships.get(name) {
                if let Some(url) = record.detail_url() {
                    if !sources.contains(&url) {
                        sources.push(url);
                    }
                }
                if let Some(url) = record.manufacturer_url() {
                    if !sources.contains(&url) {
                        sources.push(url);
                    }
                }
            }
        }
        sources
    }
}

/// Lowercased whitespace tokens longer than 2 characters.
pub fn query_tokens(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Attribute-level match: manufacturer or role text from either source,
/// price for a "cheap" token, cargo capacity presence for transport
/// tokens.
fn attributes_match(record: &ShipRecord, tokens: &[String]) -> bool {
    if let Some(primary) = &record.primary {
        if let Some(manufacturer) = primary.manufacturer_text() {
            let manufacturer = manufacturer.to_lowercase();
            if tokens.iter().any(|t| manufacturer.contains(t.as_str())) {
                return true;
            }
        }
        for role in primary.roles() {
            let role = role.to_lowercase();
            if tokens.iter().any(|t| role.contains(t.as_str())) {
                return true;
            }
        }
    }

    if let Some(secondary) = &record.secondary {
        if let Some(manufacturer) = &secondary.manufacturer {
            let manufacturer = manufacturer.to_lowercase();
            if tokens.iter().any(|t| manufacturer.contains(t.as_str())) {
                return true;
            }
        }
        if let Some(role) = &secondary.role {
            let role = role.to_lowercase();
            if tokens.iter().any(|t| role.contains(t.as_str())) {
                return true;
            }
        }
        if tokens.iter().any(|t| t == "cheap") {
            if let Some(price) = secondary.price {
                if price < CHEAP_PRICE_CEILING {
                    return true;
                }
            }
        }
        if secondary.cargo_capacity.is_some()
            && tokens
                .iter()
                .any(|t| TRANSPORT_TOKENS.contains(&t.as_str()))
        {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ships::PrintoutValue;
    use std::collections::HashMap as StdHashMap;

    fn raw(manufacturer: &str, roles: &[&str], url: &str) -> RawShipRecord {
        let mut printouts: StdHashMap<String, Vec<PrintoutValue>> = StdHashMap::new();
        printouts.insert(
            "Manufacturer".to_string(),
            vec![PrintoutValue::CrossRef {
                fulltext: manufacturer.to_string(),
                fullurl: Some(format!(
                    "https://starcitizen.tools/{}",
                    manufacturer.replace(' ', "_")
                )),
            }],
        );
        printouts.insert(
            "Role".to_string(),
            roles
                .iter()
                .map(|r| PrintoutValue::Text((*r).to_string()))
                .collect(),
        );
        RawShipRecord {
            printouts,
            fullurl: Some(url.to_string()),
        }
    }

    fn normalized(name: &str, price: Option<i64>, cargo: Option<f64>) -> NormalizedShip {
        NormalizedShip {
            name: name.to_string(),
            price,
            manufacturer: None,
            size: None,
            cargo_capacity: cargo,
            crew_size: None,
            role: None,
        }
    }

    fn test_store() -> ShipStore {
        ShipStore::from_records(vec![
            (
                "Drake Caterpillar".to_string(),
                ShipRecord::new(
                    Some(raw(
                        "Drake Interplanetary",
                        &["Medium Freight"],
                        "https://starcitizen.tools/Caterpillar",
                    )),
                    Some(normalized("Drake Caterpillar", Some(4_729_100), Some(576.0))),
                )
                .unwrap(),
            ),
            (
                "Aurora MR".to_string(),
                ShipRecord::new(
                    Some(raw(
                        "Roberts Space Industries",
                        &["Starter", "Light Fighter"],
                        "https://starcitizen.tools/Aurora_MR",
                    )),
                    Some(normalized("Aurora MR", Some(220_000), None)),
                )
                .unwrap(),
            ),
            (
                "Freelancer".to_string(),
                ShipRecord::new(
                    Some(raw(
                        "Musashi Industrial and Starflight Concern",
                        &["Medium Freight"],
                        "https://starcitizen.tools/Freelancer",
                    )),
                    Some(normalized("Freelancer", Some(1_475_600), Some(66.0))),
                )
                .unwrap(),
            ),
        ])
    }

    #[test]
    fn exact_tier_requires_every_token() {
        let store = test_store();
        let matches = store.find_relevant("Drake Caterpillar");
        assert_eq!(matches.len(), 1);
        assert!(matches.contains_key("Drake Caterpillar"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let store = test_store();
        let matches = store.find_relevant("dRaKe CATERPILLAR");
        assert!(matches.contains_key("Drake Caterpillar"));
    }

    #[test]
    fn broad_tier_only_runs_when_exact_tier_is_empty() {
        // "Aurora" hits the exact tier, so role matches never dilute it.
        let store = test_store();
        let exact = store.find_relevant("Aurora");
        assert_eq!(exact.len(), 1);
        assert!(exact.contains_key("Aurora MR"));

        // No name carries both tokens, so the broad tier takes over and
        // role matches join the name match.
        let broad = store.find_relevant("Aurora freight");
        assert!(broad.contains_key("Aurora MR"));
        assert!(broad.contains_key("Drake Caterpillar"));
    }

    #[test]
    fn broad_tier_matches_roles() {
        let store = test_store();
        let matches = store.find_relevant("best freight ship");
        assert!(matches.contains_key("Drake Caterpillar"));
        assert!(matches.contains_key("Freelancer"));
        assert!(!matches.contains_key("Aurora MR"));
    }

    #[test]
    fn cheap_token_matches_on_price_ceiling() {
        let store = test_store();
        let matches = store.find_relevant("cheap beginner vessel");
        assert!(matches.contains_key("Aurora MR"));
        assert!(!matches.contains_key("Drake Caterpillar"));
    }

    #[test]
    fn cargo_token_matches_on_cargo_presence() {
        let store = test_store();
        let matches = store.find_relevant("good hauling option");
        assert!(matches.contains_key("Drake Caterpillar"));
        assert!(matches.contains_key("Freelancer"));
        assert!(!matches.contains_key("Aurora MR"));
    }

    #[test]
    fn short_tokens_are_ignored() {
        let tokens = query_tokens("is a MR ok");
        assert_eq!(tokens, Vec::<String>::new());
    }

    #[test]
    fn missing_files_yield_empty_store() {
        let store = ShipStore::load("does/not/exist.json", "also/missing.json");
        assert!(store.is_empty());
        assert!(store.find_relevant("Caterpillar").is_empty());
        assert!(store.list_identities().is_empty());
    }

    #[test]
    fn data_sources_include_manufacturer_urls() {
        let store = test_store();
        let candidates = store.find_relevant("Drake Caterpillar");
        let sources = store.get_data_sources(&candidates);
        assert!(sources.contains(&"https://starcitizen.tools/Caterpillar".to_string()));
        assert!(sources.contains(&"https://starcitizen.tools/Drake_Interplanetary".to_string()));
        assert_eq!(
            store.get_manufacturer_url("Drake Caterpillar").as_deref(),
            Some("https://starcitizen.tools/Drake_Interplanetary")
        );
    }

    #[test]
    fn relevant_urls_are_deduplicated_detail_urls() {
        let store = test_store();
        let candidates = store.find_relevant("freight");
        let urls = store.get_relevant_urls(&candidates);
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"https://starcitizen.tools/Caterpillar".to_string()));
    }
}
