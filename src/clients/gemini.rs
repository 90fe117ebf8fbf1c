use anyhow::Result;
use gemini_rust::Gemini;

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self { api_key, model }
    }

    pub async fn generate_text(&self, prompt: &str) -> Result<String> {
        let client = Gemini::with_model(self.api_key.clone(), format!("models/{}", self.model))
            .map_err(|e| anyhow::anyhow!("Failed to build Gemini client: {}", e))?;

        let response = client
            .generate_content()
            .with_user_message(prompt)
            .execute()
            .await
            .map_err(|e| anyhow::anyhow!("Gemini request failed: {}", e))?;

        Ok(response.text())
    }
}
