use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::llm::AiClient;
use crate::services::context::{self, QueryCategory, QueryContext};
use crate::services::price_cache::{PriceCache, PRICE_LIST_URL};
use crate::services::resolver::{self, Resolution};
use crate::services::scraper::WebScraper;
use crate::services::ship_store::ShipStore;
use crate::services::sufficiency::{self, Sufficiency};

/// Fixed ships-index reference, cited alongside the price list on
/// general answers.
pub const SHIP_INDEX_URL: &str = "https://starcitizen.tools/List_of_Ship_and_ground_vehicle_prices";

/// Literal the legacy mode scans generated text for before deciding on a
/// second round. Kept only at this boundary.
const INSUFFICIENT_SENTINEL: &str = "insufficient information";

const NOT_ENOUGH_INFO_MESSAGE: &str =
    "Not enough information is available to answer that question.";

/// A finished answer: generated markdown plus the citation URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub response: String,
    pub sources: Vec<String>,
}

/// Drives a question end to end: resolve, classify, optionally enrich,
/// assemble, generate, cite.
pub struct AnswerOrchestrator {
    store: Arc<ShipStore>,
    prices: Arc<PriceCache>,
    scraper: Arc<dyn WebScraper>,
    ai: Arc<dyn AiClient>,
    config: Arc<Config>,
}

impl AnswerOrchestrator {
    pub fn new(
        store: Arc<ShipStore>,
        prices: Arc<PriceCache>,
        scraper: Arc<dyn WebScraper>,
        ai: Arc<dyn AiClient>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            prices,
            scraper,
            ai,
            config,
        }
    }

    /// Answers one question. Empty input and unresolvable ships are
    /// expected client errors; collaborator failures degrade the context
    /// instead of failing the request.
    #[instrument(skip(self), fields(query_len = query.len()))]
    pub async fn answer(&self, query: &str) -> Result<Answer, AppError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::BadRequest("No query provided".to_string()));
        }

        if self.config.legacy_fallback {
            return self.answer_legacy(query).await;
        }

        let category = if context::has_price_intent(query) {
            QueryCategory::Price
        } else {
            context::classify_scope(self.ai.as_ref(), &self.config.fast_model, query).await
        };
        info!(?category, "Query classified");

        match category {
            QueryCategory::Price => self.answer_price(query).await,
            QueryCategory::General => self.answer_general(query).await,
            QueryCategory::Descriptive => self.answer_descriptive(query).await,
        }
    }

    async fn answer_price(&self, query: &str) -> Result<Answer, AppError> {
        let name = self.resolve_target(query).await?;
        let detail_url = self.store.get_url(&name);
        let cached_price = self.prices.get_price(&name).await;

        let scraped = match &detail_url {
            Some(url) => Some(self.scraper.scrape_multiple_urls(&[url.clone()]).await),
            None => None,
        };

        let records = self.merged_records(std::iter::once(name.clone()));
        let ctx = QueryContext {
            question: query.to_string(),
            category: QueryCategory::Price,
            matched: vec![name],
            records,
            scraped,
            cached_price,
        };
        let response = self.generate(&ctx).await;

        let mut sources = Vec::new();
        if let Some(url) = detail_url {
            sources.push(url);
        }
        if cached_price.is_some() {
            sources.push(PRICE_LIST_URL.to_string());
        }
        Ok(Answer { response, sources })
    }

    async fn answer_general(&self, query: &str) -> Result<Answer, AppError> {
        // No scraping here: the general payload comes straight from the
        // store's raw and merged views.
        let candidates = self.store.find_relevant(query);
        let names: Vec<String> = if candidates.is_empty() {
            self.store.list_identities()
        } else {
            candidates.keys().cloned().collect()
        };

        let ctx = QueryContext {
            question: query.to_string(),
            category: QueryCategory::General,
            matched: names.clone(),
            records: self.merged_records(names.into_iter()),
            scraped: None,
            cached_price: None,
        };
        let response = self.generate(&ctx).await;

        Ok(Answer {
            response,
            sources: vec![PRICE_LIST_URL.to_string(), SHIP_INDEX_URL.to_string()],
        })
    }

    async fn answer_descriptive(&self, query: &str) -> Result<Answer, AppError> {
        let name = self.resolve_target(query).await?;
        if self.store.get(&name).is_none() {
            return Err(AppError::NotFound(format!("Ship '{name}' not found")));
        }

        let detail_url = self.store.get_url(&name);
        let scraped = match &detail_url {
            Some(url) => Some(self.scraper.scrape_multiple_urls(&[url.clone()]).await),
            None => None,
        };

        let ctx = QueryContext {
            question: query.to_string(),
            category: QueryCategory::Descriptive,
            matched: vec![name.clone()],
            records: self.merged_records(std::iter::once(name)),
            scraped,
            cached_price: None,
        };
        let response = self.generate(&ctx).await;

        Ok(Answer {
            response,
            sources: detail_url.into_iter().collect(),
        })
    }

    /// Legacy two-round mode: one structured-only generation; a response
    /// carrying the insufficiency sentinel consults the sufficiency
    /// policy, and only an agreeing policy buys a scrape plus a second
    /// generation call.
    async fn answer_legacy(&self, query: &str) -> Result<Answer, AppError> {
        let candidates = self.store.find_relevant(query);
        let names: Vec<String> = candidates.keys().cloned().collect();
        let sources = self.store.get_data_sources(&candidates);

        let mut ctx = QueryContext {
            question: query.to_string(),
            category: QueryCategory::Descriptive,
            matched: names.clone(),
            records: self.merged_records(names.into_iter()),
            scraped: None,
            cached_price: None,
        };
        let first = self.generate(&ctx).await;

        if !first.to_lowercase().contains(INSUFFICIENT_SENTINEL) {
            return Ok(Answer {
                response: first,
                sources,
            });
        }

        match sufficiency::assess(query, &candidates) {
            Sufficiency::NeedsEnrichment => {
                let urls = self.store.get_relevant_urls(&candidates);
                info!(url_count = urls.len(), "First round insufficient; scraping");
                ctx.scraped = Some(self.scraper.scrape_multiple_urls(&urls).await);
                let second = self.generate(&ctx).await;
                Ok(Answer {
                    response: second,
                    sources,
                })
            }
            Sufficiency::Sufficient => Ok(Answer {
                response: NOT_ENOUGH_INFO_MESSAGE.to_string(),
                sources,
            }),
        }
    }

    /// Narrows a question to one known ship name. The strategy chain runs
    /// against the full name list; when it fails but the tier matching
    /// still found candidates, the first candidate in store order wins.
    async fn resolve_target(&self, query: &str) -> Result<String, AppError> {
        let known = self.store.list_identities();
        let resolution =
            resolver::resolve(self.ai.as_ref(), &self.config.fast_model, query, &known).await;
        match resolution {
            Resolution::Resolved(name) => Ok(name),
            Resolution::Unresolved => {
                let candidates = self.store.find_relevant(query);
                match candidates.keys().next() {
                    Some(first) => {
                        warn!(fallback = %first, "Resolver unresolved; using first candidate");
                        Ok(first.clone())
                    }
                    None => Err(AppError::BadRequest(
                        "Could not identify which ship the question is about. \
                         Please name the ship more specifically."
                            .to_string(),
                    )),
                }
            }
        }
    }

    fn merged_records(
        &self,
        names: impl Iterator<Item = String>,
    ) -> Vec<(String, crate::models::ships::MergedShip)> {
        names
            .filter_map(|name| {
                self.store
                    .get(&name)
                    .map(|record| (name.clone(), record.merged_view()))
            })
            .collect()
    }

    /// Generation failures degrade to an inline marker; a partial answer
    /// beats a hard failure.
    async fn generate(&self, ctx: &QueryContext) -> String {
        let (payload, instruction) = context::assemble(ctx);
        let prompt = context::build_prompt(&instruction, &payload);
        match self.ai.generate(&self.config.chat_model, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Generation call failed: {}", e);
                format!("Error processing query: {e}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ships::{NormalizedShip, PrintoutValue, RawShipRecord, ShipRecord};
    use crate::services::price_cache::{PriceSource, PriceTable};
    use crate::services::resolver::test_support::CannedAiClient;
    use crate::services::scraper::{PageFetcher, PageScraper};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct EmptySource;

    #[async_trait]
    impl PriceSource for EmptySource {
        async fn fetch_prices(&self) -> Result<HashMap<String, i64>, AppError> {
            Ok(HashMap::new())
        }
    }

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, AppError> {
            Ok("<html><body><h2>Specifications</h2><p>SCM 190</p></body></html>".to_string())
        }
    }

    fn test_store() -> Arc<ShipStore> {
        let mut printouts: HashMap<String, Vec<PrintoutValue>> = HashMap::new();
        printouts.insert(
            "Manufacturer".to_string(),
            vec![PrintoutValue::CrossRef {
                fulltext: "Roberts Space Industries".to_string(),
                fullurl: Some("https://starcitizen.tools/RSI".to_string()),
            }],
        );
        printouts.insert(
            "Role".to_string(),
            vec![PrintoutValue::Text("Starter".to_string())],
        );
        let record = ShipRecord::new(
            Some(RawShipRecord {
                printouts,
                fullurl: Some("https://starcitizen.tools/Aurora_MR".to_string()),
            }),
            Some(NormalizedShip {
                name: "Aurora MR".to_string(),
                price: Some(220_000),
                manufacturer: Some("RSI".to_string()),
                size: Some("Small".to_string()),
                cargo_capacity: None,
                crew_size: Some("1".to_string()),
                role: Some("Starter".to_string()),
            }),
        )
        .unwrap();
        Arc::new(ShipStore::from_records(vec![(
            "Aurora MR".to_string(),
            record,
        )]))
    }

    fn orchestrator_with(
        ai: Arc<CannedAiClient>,
        prices: HashMap<String, i64>,
        legacy: bool,
    ) -> (AnswerOrchestrator, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let table = PriceTable {
            prices,
            last_update: chrono::Utc::now(),
        };
        let path = dir.path().join("price_data.json");
        std::fs::write(&path, serde_json::to_string(&table).unwrap()).unwrap();

        let config = Arc::new(Config {
            legacy_fallback: legacy,
            ..Config::default()
        });
        let orchestrator = AnswerOrchestrator::new(
            test_store(),
            Arc::new(PriceCache::load(&path, 24, Arc::new(EmptySource))),
            Arc::new(PageScraper::new(Arc::new(StaticFetcher), 2)),
            ai,
            config,
        );
        (orchestrator, dir)
    }

    fn aurora_price() -> HashMap<String, i64> {
        let mut prices = HashMap::new();
        prices.insert("Aurora MR".to_string(), 24_000);
        prices
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_generation() {
        let ai = Arc::new(CannedAiClient::new(vec![]));
        let (orchestrator, _dir) = orchestrator_with(ai.clone(), HashMap::new(), false);
        let err = orchestrator.answer("   ").await.unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "No query provided"),
            other => panic!("expected BadRequest, got {other:?}"),
        }
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn price_answer_cites_detail_then_price_list() {
        let ai = Arc::new(CannedAiClient::new(vec![Ok("## Pledge Store Price".to_string())]));
        let (orchestrator, _dir) = orchestrator_with(ai.clone(), aurora_price(), false);
        let answer = orchestrator
            .answer("How much does the Aurora MR cost?")
            .await
            .unwrap();
        assert_eq!(
            answer.sources,
            vec![
                "https://starcitizen.tools/Aurora_MR".to_string(),
                PRICE_LIST_URL.to_string(),
            ]
        );
        // Resolved heuristically, so the single call is the generation.
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn price_answer_without_cached_price_omits_reference() {
        let ai = Arc::new(CannedAiClient::new(vec![Ok("answer".to_string())]));
        let (orchestrator, _dir) = orchestrator_with(ai, HashMap::new(), false);
        let answer = orchestrator
            .answer("How much does the Aurora MR cost?")
            .await
            .unwrap();
        assert_eq!(
            answer.sources,
            vec!["https://starcitizen.tools/Aurora_MR".to_string()]
        );
    }

    #[tokio::test]
    async fn unknown_ship_price_query_is_a_client_error() {
        // Resolver heuristics fail, the LLM strategy says NONE, and no
        // candidates match, so the request ends as a client error.
        let ai = Arc::new(CannedAiClient::new(vec![Ok("NONE".to_string())]));
        let (orchestrator, _dir) = orchestrator_with(ai.clone(), HashMap::new(), false);
        let err = orchestrator
            .answer("How much does the Zeus cost?")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        // Only the resolver delegation ran, never the generation.
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn general_answer_cites_both_reference_urls() {
        let ai = Arc::new(CannedAiClient::new(vec![
            Ok("GENERAL".to_string()),
            Ok("## Overview".to_string()),
        ]));
        let (orchestrator, _dir) = orchestrator_with(ai, HashMap::new(), false);
        let answer = orchestrator
            .answer("Which starter ship is best?")
            .await
            .unwrap();
        assert_eq!(
            answer.sources,
            vec![PRICE_LIST_URL.to_string(), SHIP_INDEX_URL.to_string()]
        );
    }

    #[tokio::test]
    async fn descriptive_answer_cites_detail_url() {
        let ai = Arc::new(CannedAiClient::new(vec![
            Ok("SPECIFIC".to_string()),
            Ok("## Aurora MR".to_string()),
        ]));
        let (orchestrator, _dir) = orchestrator_with(ai, HashMap::new(), false);
        let answer = orchestrator
            .answer("Tell me about the Aurora MR")
            .await
            .unwrap();
        assert_eq!(
            answer.sources,
            vec!["https://starcitizen.tools/Aurora_MR".to_string()]
        );
    }

    #[tokio::test]
    async fn legacy_mode_regenerates_when_policy_agrees() {
        // The cargo query against a record with no cargo field makes the
        // sufficiency policy agree with the sentinel.
        let ai = Arc::new(CannedAiClient::new(vec![
            Ok("There is insufficient information to answer.".to_string()),
            Ok("Second round answer".to_string()),
        ]));
        let (orchestrator, _dir) = orchestrator_with(ai.clone(), HashMap::new(), true);
        let answer = orchestrator
            .answer("What cargo can the Aurora haul?")
            .await
            .unwrap();
        assert_eq!(answer.response, "Second round answer");
        assert_eq!(ai.call_count(), 2);
        assert!(answer
            .sources
            .contains(&"https://starcitizen.tools/Aurora_MR".to_string()));
        assert!(answer
            .sources
            .contains(&"https://starcitizen.tools/RSI".to_string()));
    }

    #[tokio::test]
    async fn legacy_mode_returns_fixed_message_when_policy_disagrees() {
        // Role/manufacturer are present, so the policy sees the data as
        // sufficient and no second generation call happens.
        let ai = Arc::new(CannedAiClient::new(vec![Ok(
            "insufficient information".to_string(),
        )]));
        let (orchestrator, _dir) = orchestrator_with(ai.clone(), HashMap::new(), true);
        let answer = orchestrator.answer("who makes the Aurora").await.unwrap();
        assert_eq!(answer.response, NOT_ENOUGH_INFO_MESSAGE);
        assert_eq!(ai.call_count(), 1);
    }

    #[tokio::test]
    async fn legacy_mode_passes_through_a_confident_answer() {
        let ai = Arc::new(CannedAiClient::new(vec![Ok("The Aurora MR is a starter."
            .to_string())]));
        let (orchestrator, _dir) = orchestrator_with(ai.clone(), HashMap::new(), true);
        let answer = orchestrator.answer("Aurora MR").await.unwrap();
        assert_eq!(answer.response, "The Aurora MR is a starter.");
        assert_eq!(ai.call_count(), 1);
    }
}
