use tracing::debug;

use crate::llm::AiClient;

/// Outcome of mapping a question to one known ship name. `Unresolved` is a
/// normal result (the caller reports a client error), not a fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

/// Sentinel the closed-vocabulary prompt uses for "no match". Translated
/// to `Resolution` immediately at the boundary; it never travels further.
const NONE_SENTINEL: &str = "NONE";

/// Connector phrases that typically precede the ship name in a question.
const CONNECTORS: &[&str] = &["of the", "about the", "is the", "for the"];

/// Resolves a question to a single known ship name by trying, in order:
/// connector-phrase extraction, a whole-query scan, and a closed-vocabulary
/// delegation to the generation service. Stops at the first success.
pub async fn resolve(
    client: &dyn AiClient,
    model_name: &str,
    query: &str,
    known_names: &[String],
) -> Resolution {
    if let Some(name) = extract_after_connector(query, known_names) {
        debug!(%name, "Resolved via connector phrase");
        return Resolution::Resolved(name);
    }
    if let Some(name) = scan_whole_query(query, known_names) {
        debug!(%name, "Resolved via whole-query scan");
        return Resolution::Resolved(name);
    }
    match resolve_with_llm(client, model_name, query, known_names).await {
        Some(name) => {
            debug!(%name, "Resolved via LLM delegation");
            Resolution::Resolved(name)
        }
        None => Resolution::Unresolved,
    }
}

/// Scans for a connector phrase and matches the trailing text against the
/// known names, longest first, so "Drake Caterpillar" beats "Caterpillar".
pub fn extract_after_connector(query: &str, known_names: &[String]) -> Option<String> {
    let query_lower = query.to_lowercase();
    let names = names_longest_first(known_names);

    for connector in CONNECTORS {
        let Some(idx) = query_lower.find(connector) else {
            continue;
        };
        let tail = query_lower[idx + connector.len()..]
            .trim()
            .trim_end_matches(['?', '.', '!', ','])
            .trim();
        if tail.is_empty() {
            continue;
        }
        // First pass: a known name contained in the tail (the tail may
        // carry extra words). Second pass: the tail naming part of a
        // longer known name.
        for name in &names {
            if tail.contains(&name.to_lowercase()) {
                return Some((*name).clone());
            }
        }
        for name in &names {
            if name.to_lowercase().contains(tail) {
                return Some((*name).clone());
            }
        }
    }
    None
}

/// Falls back to scanning the whole question for a known name, longest
/// name first.
pub fn scan_whole_query(query: &str, known_names: &[String]) -> Option<String> {
    let query_lower = query.to_lowercase();
    names_longest_first(known_names)
        .into_iter()
        .find(|name| query_lower.contains(&name.to_lowercase()))
        .cloned()
}

/// Delegates resolution to the generation service with a closed vocabulary.
/// Only an exact, case-sensitive member of the known list counts; anything
/// else, including the NONE sentinel and call failures, is no match.
pub async fn resolve_with_llm(
    client: &dyn AiClient,
    model_name: &str,
    query: &str,
    known_names: &[String],
) -> Option<String> {
    if known_names.is_empty() {
        return None;
    }

    let prompt = format!(
        "You match questions to ship names. Given the question and the exact \
         list of known ship names below, reply with the one name from the \
         list the question is about, copied exactly, or with {NONE_SENTINEL} \
         if none applies. Reply with nothing else.\n\n\
         Question: {query}\n\nKnown ship names:\n{}",
        known_names.join("\n")
    );

    let reply = match client.generate(model_name, &prompt).await {
        Ok(text) => text,
        Err(e) => {
            debug!("LLM resolution call failed: {}", e);
            return None;
        }
    };

    let candidate = reply.trim();
    if candidate == NONE_SENTINEL {
        return None;
    }
    known_names
        .iter()
        .find(|name| name.as_str() == candidate)
        .cloned()
}

fn names_longest_first(known_names: &[String]) -> Vec<&String> {
    let mut names: Vec<&String> = known_names.iter().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    names
}
