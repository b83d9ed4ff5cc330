use serde_json::{json, Map, Value};
use tracing::debug;

use crate::llm::AiClient;
use crate::models::scrape::{PageContent, ScrapeResult};
use crate::models::ships::MergedShip;

/// Classified question type, driving template choice and the answer flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryCategory {
    /// Comparisons and recommendations across many ships.
    General,
    /// Price/purchase question about one ship.
    Price,
    /// Descriptive question about one ship.
    Descriptive,
}

/// Request-scoped aggregate handed to the assembler. Built fresh per
/// request, dropped with the response.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub question: String,
    pub category: QueryCategory,
    pub matched: Vec<String>,
    pub records: Vec<(String, MergedShip)>,
    pub scraped: Option<Vec<ScrapeResult>>,
    pub cached_price: Option<i64>,
}

const PRICE_KEYWORDS: &[&str] = &["cost", "price", "buy"];
const GENERAL_KEYWORDS: &[&str] = &["best", "compare", "recommend", "which", "top"];

/// Cheap substring test for price/purchase intent.
pub fn has_price_intent(query: &str) -> bool {
    let query = query.to_lowercase();
    PRICE_KEYWORDS.iter().any(|kw| query.contains(kw))
}

/// Whether the question spans many ships (General) or targets one
/// (Specific, i.e. Descriptive here). Delegated to the generation service
/// with a closed vocabulary; a failed call or an off-vocabulary reply
/// falls back to the keyword heuristic.
pub async fn classify_scope(client: &dyn AiClient, model_name: &str, query: &str) -> QueryCategory {
    let prompt = format!(
        "Classify this question about spacecraft. Reply with exactly GENERAL \
         if it compares ships or asks for recommendations across many ships, \
         or exactly SPECIFIC if it is about one particular ship. Reply with \
         nothing else.\n\nQuestion: {query}"
    );
    match client.generate(model_name, &prompt).await {
        Ok(reply) => match reply.trim() {
            "GENERAL" => QueryCategory::General,
            "SPECIFIC" => QueryCategory::Descriptive,
            other => {
                debug!(reply = %other, "Off-vocabulary scope reply, using keyword heuristic");
                keyword_scope(query)
            }
        },
        Err(e) => {
            debug!("Scope classification call failed: {}", e);
            keyword_scope(query)
        }
    }
}

fn keyword_scope(query: &str) -> QueryCategory {
    let query = query.to_lowercase();
    if GENERAL_KEYWORDS.iter().any(|kw| query.contains(kw)) {
        QueryCategory::General
    } else {
        QueryCategory::Descriptive
    }
}

const PRICE_TEMPLATE: &str = "\
You answer questions about in-game ship prices using the data payload \
provided. Format the answer in markdown with exactly these four sections: \
## Pledge Store Price, ## In-Game Price, ## Purchase Locations, and \
## Additional Context. Put every price in **bold**. If there are multiple \
purchase locations, list them as bullets. If a field is not available in \
the data, state so in *italics* rather than leaving the section out.";

const DESCRIPTIVE_TEMPLATE: &str = "\
You describe one in-game ship using the data payload provided. Format the \
answer in markdown: level 2 headings (##), bullet lists for enumerations, \
**bold** for key facts, and *italics* for supplementary details or data \
stated as missing. If a detail is not in the data, say so in *italics* \
rather than guessing.";

const DESCRIPTIVE_SCRAPED_ADDENDUM: &str = "\
 The payload includes scraped page content with named sections. Where the \
scraped \"weapons\" or \"specifications\" sections conflict with the \
structured attributes, prefer the scraped sections. When weapon hardpoints \
appear, describe their size, count, and mounting location.";

const GENERAL_TEMPLATE: &str = "\
You compare and recommend in-game ships using the data payload provided, \
cross-referencing both the structured dataset and the enrichment dataset. \
Format prices under 1,000,000 as \"NNN,NNN aUEC\" and prices of 1,000,000 \
or more as \"X.XX million aUEC\". Give cargo capacity as \"N SCU\". \
Structure the markdown answer into ## Overview, ## Top Recommendations, \
## Additional Options, and ## Summary sections.";

/// Merges the context into one bounded payload plus the instruction
/// template for its category. Absent optional fields are omitted from the
/// payload; the template tells the generator how to phrase gaps.
pub fn assemble(ctx: &QueryContext) -> (Value, String) {
    let mut payload = Map::new();
    payload.insert("question".to_string(), json!(ctx.question));
    if !ctx.matched.is_empty() {
        payload.insert("matched_ships".to_string(), json!(ctx.matched));
    }
    if !ctx.records.is_empty() {
        let ships: Map<String, Value> = ctx
            .records
            .iter()
            .map(|(name, merged)| {
                (
                    name.clone(),
                    serde_json::to_value(merged).unwrap_or(Value::Null),
                )
            })
            .collect();
        payload.insert("ships".to_string(), Value::Object(ships));
    }
    if let Some(scraped) = &ctx.scraped {
        if !scraped.is_empty() {
            payload.insert(
                "scraped_pages".to_string(),
                serde_json::to_value(scraped).unwrap_or(Value::Null),
            );
        }
    }
    if let Some(price) = ctx.cached_price {
        payload.insert("cached_in_game_price".to_string(), json!(price));
    }

    let instruction = match ctx.category {
        QueryCategory::Price => PRICE_TEMPLATE.to_string(),
        QueryCategory::Descriptive => {
            if has_structured_scrape(ctx) {
                format!("{DESCRIPTIVE_TEMPLATE}{DESCRIPTIVE_SCRAPED_ADDENDUM}")
            } else {
                DESCRIPTIVE_TEMPLATE.to_string()
            }
        }
        QueryCategory::General => GENERAL_TEMPLATE.to_string(),
    };

    (Value::Object(payload), instruction)
}

/// Builds the final prompt handed to the generation service.
pub fn build_prompt(instruction: &str, payload: &Value) -> String {
    let data = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    format!("{instruction}\n\nData payload:\n{data}")
}

fn has_structured_scrape(ctx: &QueryContext) -> bool {
    ctx.scraped
        .as_ref()
        .is_some_and(|results| {
            results
                .iter()
                .any(|r| matches!(r.content, PageContent::Structured { .. }))
        })
}
