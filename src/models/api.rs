use serde::{Deserialize, Serialize};

/// Body of `POST /api/query`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Success envelope for `POST /api/query`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub response: String,
    pub sources: Vec<String>,
}

impl QueryResponse {
    pub fn new(response: String, sources: Vec<String>) -> Self {
        Self {
            success: true,
            response,
            sources,
        }
    }
}

/// Success envelope for `GET /api/ships`.
#[derive(Debug, Clone, Serialize)]
pub struct ShipListResponse {
    pub success: bool,
    pub ships: Vec<String>,
}

impl ShipListResponse {
    pub fn new(ships: Vec<String>) -> Self {
        Self {
            success: true,
            ships,
        }
    }
}
