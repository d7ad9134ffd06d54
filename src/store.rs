use serde::{Deserialize, Serialize};

use crate::triage::SymptomFlags;

/// Errors talking to the scan persistence service.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

/// The record a completed assessment is persisted as.
///
/// Field names are the service's wire format; `status_label` and
/// `status_color` are denormalized from the tier so stored scans render
/// without re-running the policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRecord {
    pub image_url: String,
    pub symptoms: SymptomFlags,
    pub ai_prediction: String,
    pub ai_base_risk: f64,
    pub risk_score: f64,
    pub status: String,
    pub status_label: String,
    pub status_color: String,
}

/// A record as returned by the service, with its server-assigned identity.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredScan {
    pub id: String,
    pub created_at: String,
    #[serde(flatten)]
    pub record: ScanRecord,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> Envelope<T> {
    fn into_result(self) -> Result<T, StoreError> {
        match (self.success, self.data, self.error) {
            (true, Some(data), _) => Ok(data),
            (_, _, Some(error)) => Err(StoreError::Rejected(error)),
            _ => Err(StoreError::Rejected("malformed response envelope".to_string())),
        }
    }
}

/// Thin client for the scan persistence service.
///
/// The core produces [`ScanRecord`]s; this client only transmits them.
#[derive(Debug, Clone)]
pub struct ScanStore {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl ScanStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            token: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(format!("{}{path}", self.base_url)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Persists a completed scan and returns it with its assigned id.
    pub async fn create_scan(&self, record: &ScanRecord) -> Result<StoredScan, StoreError> {
        log::info!("saving scan record to {}", self.base_url);
        let request = self.client.post(format!("{}/scans", self.base_url));
        let envelope: Envelope<StoredScan> = self
            .authorize(request)
            .json(record)
            .send()
            .await?
            .json()
            .await?;
        envelope.into_result()
    }

    /// All stored scans, newest first.
    pub async fn list_scans(&self) -> Result<Vec<StoredScan>, StoreError> {
        let envelope: Envelope<Vec<StoredScan>> =
            self.get("/scans").send().await?.json().await?;
        envelope.into_result()
    }

    pub async fn get_scan(&self, id: &str) -> Result<StoredScan, StoreError> {
        let envelope: Envelope<StoredScan> = self
            .get(&format!("/scans/{id}"))
            .send()
            .await?
            .json()
            .await?;
        envelope.into_result()
    }
}
