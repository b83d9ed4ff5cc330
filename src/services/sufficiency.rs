use indexmap::IndexMap;

use crate::models::ships::ShipRecord;

/// Whether locally held structured data is adequate for a question, or
/// external enrichment (scraping) is warranted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sufficiency {
    Sufficient,
    NeedsEnrichment,
}

/// Keyword-to-field mappings for common query topics.
const FIELD_MAPPINGS: &[(&str, &[&str])] = &[
    ("cargo", &["Cargo capacity"]),
    ("speed", &["SCM speed", "Quantum speed"]),
    ("fuel", &["Hydrogen fuel capacity", "Quantum fuel capacity"]),
    ("price", &["Pledge price", "In-game price"]),
    ("crew", &["Crew"]),
    ("role", &["Role"]),
    ("manufacturer", &["Manufacturer"]),
];

/// Fields checked when no topic keyword is recognized.
const DEFAULT_FIELDS: &[&str] = &["Manufacturer", "Role"];

/// Decides whether the candidates' structured fields cover what the query
/// appears to ask about. Any candidate missing any required field means
/// enrichment; an empty candidate set is trivially sufficient (nothing to
/// enrich, not a reason to skip the answer).
pub fn assess(query: &str, candidates: &IndexMap<String, ShipRecord>) -> Sufficiency {
    let query = query.to_lowercase();

    let mut required_fields: Vec<&str> = Vec::new();
    for (keyword, fields) in FIELD_MAPPINGS {
        if query.contains(keyword) {
            required_fields.extend_from_slice(fields);
        }
    }
    if required_fields.is_empty() {
        required_fields.extend_from_slice(DEFAULT_FIELDS);
    }

    for record in candidates.values() {
        let missing = required_fields
            .iter()
            .any(|field| !field_present(record, field));
        if missing {
            return Sufficiency::NeedsEnrichment;
        }
    }

    Sufficiency::Sufficient
}

/// A field counts as present when the primary printout carries a value, or
/// the enrichment source covers the same concern.
fn field_present(record: &ShipRecord, field: &str) -> bool {
    if let Some(primary) = &record.primary {
        if primary.has_printout(field) {
            return true;
        }
    }
    if let Some(secondary) = &record.secondary {
        match field {
            "Cargo capacity" => secondary.cargo_capacity.is_some(),
            "Pledge price" | "In-game price" => secondary.price.is_some(),
            "Crew" => secondary.crew_size.is_some(),
            "Role" => secondary.role.is_some(),
            "Manufacturer" => secondary.manufacturer.is_some(),
            _ => false,
        }
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ships::{NormalizedShip, PrintoutValue, RawShipRecord};
    use std::collections::HashMap;

    fn record_with_printouts(fields: &[(&str, &str)]) -> ShipRecord {
        let mut printouts: HashMap<String, Vec<PrintoutValue>> = HashMap::new();
        for (field, value) in fields {
            printouts.insert(
                (*field).to_string(),
                vec![PrintoutValue::Text((*value).to_string())],
            );
        }
        ShipRecord::from_primary(RawShipRecord {
            printouts,
            fullurl: None,
        })
    }

    fn candidates(records: Vec<(&str, ShipRecord)>) -> IndexMap<String, ShipRecord> {
        records
            .into_iter()
            .map(|(name, record)| (name.to_string(), record))
            .collect()
    }

    #[test]
    fn empty_candidate_set_is_sufficient() {
        assert_eq!(
            assess("how much cargo fits", &IndexMap::new()),
            Sufficiency::Sufficient
        );
    }

    #[test]
    fn cargo_query_against_cargoless_record_needs_enrichment() {
        let set = candidates(vec![(
            "Aurora MR",
            record_with_printouts(&[("Manufacturer", "RSI"), ("Role", "Starter")]),
        )]);
        assert_eq!(
            assess("What cargo capacity does it have?", &set),
            Sufficiency::NeedsEnrichment
        );
    }

    #[test]
    fn cargo_query_with_cargo_field_is_sufficient() {
        let set = candidates(vec![(
            "Freelancer",
            record_with_printouts(&[("Cargo capacity", "66 SCU")]),
        )]);
        assert_eq!(
            assess("What cargo capacity does it have?", &set),
            Sufficiency::Sufficient
        );
    }

    #[test]
    fn no_keyword_falls_back_to_manufacturer_and_role() {
        let with_both = candidates(vec![(
            "Aurora MR",
            record_with_printouts(&[("Manufacturer", "RSI"), ("Role", "Starter")]),
        )]);
        assert_eq!(assess("tell me about it", &with_both), Sufficiency::Sufficient);

        let missing_role = candidates(vec![(
            "Aurora MR",
            record_with_printouts(&[("Manufacturer", "RSI")]),
        )]);
        assert_eq!(
            assess("tell me about it", &missing_role),
            Sufficiency::NeedsEnrichment
        );
    }

    #[test]
    fn secondary_source_covers_required_fields() {
        let record = ShipRecord::from_secondary(NormalizedShip {
            name: "Aurora MR".to_string(),
            price: Some(220_000),
            manufacturer: Some("RSI".to_string()),
            size: None,
            cargo_capacity: None,
            crew_size: None,
            role: Some("Starter".to_string()),
        });
        let set = candidates(vec![("Aurora MR", record)]);
        assert_eq!(
            assess("what's the price of this thing", &set),
            Sufficiency::Sufficient
        );
    }
}
