use crate::clients::models::requests::CreateExerciseRequest;
use crate::clients::models::responses::{CreatedExerciseRows, RestErrorResponse};
use crate::config::Config;
use crate::models::exercise::ExerciseRecord;
use crate::services::registration::ExerciseStore;
use anyhow::Result;
use reqwest::{Client, Response, Url};

const EXERCISES_ENDPOINT: &str = "/rest/v1/exercises";

/// REST client for the hosted exercise library table.
#[derive(Clone)]
pub struct LibraryClient {
    http: Client,
    base: Url,
    api_key: String,
}

impl LibraryClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base: Url::parse(&config.library_api_url)?,
            api_key: config.library_api_key.clone(),
        })
    }

    pub async fn get_active_exercises(&self) -> Result<Vec<ExerciseRecord>> {
        let mut url = self.base.join(EXERCISES_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("is_active", "eq.true")
            .append_pair("order", "created_at.desc");

        let response = self
            .http
            .get(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body = ensure_success(response).await?;

        let records: Vec<ExerciseRecord> = serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("Failed to parse exercise list response: {}", e))?;

        Ok(records)
    }

    pub async fn insert_exercise(&self, request: &CreateExerciseRequest) -> Result<ExerciseRecord> {
        let url = self.base.join(EXERCISES_ENDPOINT)?;
        let json_body = serde_json::to_string(request)?;

        tracing::debug!(
            name = %request.name,
            request_body = %json_body,
            "library.insert_exercise.request"
        );

        let response = self
            .http
            .post(url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .body(json_body)
            .send()
            .await?;

        let body = ensure_success(response).await?;

        tracing::debug!(
            name = %request.name,
            response_body = %body,
            "library.insert_exercise.response"
        );

        let created: CreatedExerciseRows = serde_json::from_str(&body)
            .map_err(|e| anyhow::anyhow!("Failed to parse created exercise response: {}", e))?;

        created
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("API returned empty exercise array"))
    }
}

impl ExerciseStore for LibraryClient {
    async fn fetch_active_exercises(&self) -> Result<Vec<ExerciseRecord>> {
        self.get_active_exercises().await
    }

    async fn create_exercise(&self, request: &CreateExerciseRequest) -> Result<ExerciseRecord> {
        self.insert_exercise(request).await
    }
}

async fn ensure_success(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<RestErrorResponse>(&body)
            .ok()
            .and_then(|error| {
                let message = error.message?;
                Some(match (error.code, error.details) {
                    (Some(code), Some(details)) => format!("{} ({}): {}", message, code, details),
                    (Some(code), None) => format!("{} ({})", message, code),
                    _ => message,
                })
            })
            .unwrap_or(body);

        return Err(anyhow::anyhow!(
            "API request failed with status {}: {}",
            status,
            message
        ));
    }

    Ok(body)
}
