use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub keywords: Option<String>,
    pub location: Option<String>,
}

/// Normalized listing returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Job {
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub salary: Option<String>,
    pub contract_type: Option<String>,
    pub created: Option<String>,
    pub redirect_url: Option<String>,
}

// ---- upstream (Adzuna) payloads ----

#[derive(Debug, Deserialize)]
pub(crate) struct AdzunaResponse {
    #[serde(default)]
    pub results: Vec<AdzunaJob>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AdzunaJob {
    pub id: Option<serde_json::Value>,
    pub title: Option<String>,
    pub company: Option<DisplayName>,
    pub location: Option<DisplayName>,
    pub description: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub contract_type: Option<String>,
    pub created: Option<String>,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DisplayName {
    pub display_name: Option<String>,
}
