use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{AnalysisError, AnalysisResult};
use crate::config::VisionConfig;

/// Client for an OpenAI-style chat-completions endpoint with vision input.
///
/// One POST per analysis; no internal retries and no request timeout —
/// retry policy belongs to the caller.
pub struct OpenAiVision {
    http: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiVision {
    pub fn new(http: Client, cfg: &VisionConfig) -> Self {
        info!(model = %cfg.model, max_tokens = cfg.max_tokens, "vision client initialized");
        Self {
            http,
            api_url: cfg.api_url.clone(),
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
        }
    }

    /// Analyze a `data:image/jpeg;base64,…` payload, optionally with the
    /// user's own description as extra context.
    pub async fn analyze_image(
        &self,
        image_data_uri: &str,
        user_description: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let content = json!([
            { "type": "text", "text": image_prompt(user_description) },
            { "type": "image_url", "image_url": { "url": image_data_uri } },
        ]);
        self.complete(content).await
    }

    /// Estimate nutrition from a text description alone.
    pub async fn analyze_text_only(
        &self,
        description: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        self.complete(Value::String(text_only_prompt(description)))
            .await
    }

    async fn complete(&self, content: Value) -> Result<AnalysisResult, AnalysisError> {
        let body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [{ "role": "user", "content": content }],
        });

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnalysisError::Service(format!("vision request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::Service(format!(
                "vision endpoint returned {status}"
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::Service(format!("unreadable vision response: {e}")))?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| AnalysisError::Service("no choices in vision response".into()))?;

        debug!(len = content.len(), "vision response received");
        parse_content(content)
    }
}

/// Decodes the model's reply into an [`AnalysisResult`].
///
/// Strips a surrounding markdown code fence if the model added one, then
/// parses strict JSON. The `{"error": …}` sentinel becomes
/// [`AnalysisError::NotFood`]; anything else unparseable is a hard
/// [`AnalysisError::Parse`], never a partial result.
pub fn parse_content(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let cleaned = strip_code_fences(content);
    let value: Value =
        serde_json::from_str(cleaned).map_err(|e| AnalysisError::Parse(e.to_string()))?;

    if let Some(err) = value.get("error") {
        let reason = err.as_str().unwrap_or("unrecognized input").to_string();
        return Err(AnalysisError::NotFood(reason));
    }

    serde_json::from_value(value).map_err(|e| AnalysisError::Parse(e.to_string()))
}

fn strip_code_fences(content: &str) -> &str {
    let mut s = content.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

const RESPONSE_SCHEMA: &str = r#"CRITICAL: Return ONLY a valid JSON object. No markdown, no code blocks, no explanation - just pure JSON.

Required JSON structure:
{
  "serving_size": "estimated serving size (e.g. '1 plate', '2 slices', '300g')",
  "calories": 0,
  "protein_g": 0.0,
  "fat_g": 0.0,
  "saturated_fat_g": 0.0,
  "carbohydrates_g": 0.0,
  "fiber_g": 0.0,
  "sugar_g": 0.0,
  "sodium_mg": 0.0,
  "cholesterol_mg": 0.0,
  "ingredients": ["main ingredient 1", "ingredient 2"],
  "allergens": ["potential allergen 1", "allergen 2"],
  "health_notes": "brief health insights (high protein, low carb, etc.)",
  "confidence": 0.85
}

Rules:
- All numeric fields must be numbers (not strings)
- Use 0 for unknown values (never use null or omit required fields)
- serving_size must be a string describing the portion
- ingredients should list the main components you can identify
- allergens should list common allergens (dairy, nuts, gluten, etc.)
- health_notes should be 1-2 sentences about nutritional highlights"#;

fn image_prompt(user_description: Option<&str>) -> String {
    let user_context = match user_description {
        Some(d) if !d.trim().is_empty() => format!(
            "\n\nUSER'S DESCRIPTION: \"{d}\"\n\
             Use this description to better understand the food. It may describe preparation, \
             ingredients or portions that are not visible in the image.\n"
        ),
        _ => String::new(),
    };
    format!(
        "You are a nutrition analysis expert. Analyze the food in this image and provide \
         detailed nutritional information.{user_context}\n\n{RESPONSE_SCHEMA}\n\
         - confidence should be 0.0-1.0 based on image clarity and food recognition\n\n\
         If this is NOT a food image, return exactly:\n{{\"error\": \"Not a food item\"}}\n\n\
         Remember: Return ONLY the JSON object, nothing else. If unsure about exact values, \
         provide approximate estimates based on similar foods rather than leaving fields empty."
    )
}

fn text_only_prompt(description: &str) -> String {
    format!(
        "You are a nutrition analysis expert. Based on the text description provided by the \
         user, estimate the nutritional information for the meal.\n\n\
         USER'S MEAL DESCRIPTION: \"{description}\"\n\n\
         Analyze this description and provide your best estimate of the nutritional content. \
         Consider typical portion sizes and preparation methods.\n\n{RESPONSE_SCHEMA}\n\
         - confidence should be 0.0-1.0 (use lower values like 0.5-0.7 for text-only estimates)\n\n\
         Remember: Return ONLY the JSON object, nothing else. Provide reasonable estimates \
         based on typical nutritional values for similar foods."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let result = parse_content(
            r#"{
                "serving_size": "1 plate",
                "calories": 540,
                "protein_g": 22.5,
                "fat_g": 18.0,
                "carbohydrates_g": 64.0,
                "ingredients": ["rice", "chicken"],
                "allergens": [],
                "health_notes": "High protein.",
                "confidence": 0.9
            }"#,
        )
        .expect("should parse");
        assert_eq!(result.serving_size.as_deref(), Some("1 plate"));
        assert_eq!(result.calories, Some(540));
        assert_eq!(result.protein_g, Some(22.5));
        assert_eq!(result.ingredients, vec!["rice", "chicken"]);
        assert!(result.allergens.is_empty());
        assert_eq!(result.confidence, Some(0.9));
        // Fields the model left out stay unknown.
        assert_eq!(result.saturated_fat_g, None);
        assert_eq!(result.sodium_mg, None);
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = "```json\n{\"calories\": 120}\n```";
        let result = parse_content(fenced).expect("should parse fenced json");
        assert_eq!(result.calories, Some(120));

        let bare_fence = "```\n{\"calories\": 80}\n```";
        let result = parse_content(bare_fence).expect("should parse bare fence");
        assert_eq!(result.calories, Some(80));
    }

    #[test]
    fn null_and_absent_both_map_to_none() {
        let result =
            parse_content(r#"{"calories": null, "protein_g": null, "ingredients": null}"#)
                .expect("nulls are tolerated");
        assert_eq!(result.calories, None);
        assert_eq!(result.protein_g, None);
        assert!(result.ingredients.is_empty());
    }

    #[test]
    fn error_sentinel_is_not_food() {
        match parse_content(r#"{"error": "Not a food item"}"#) {
            Err(AnalysisError::NotFood(reason)) => assert_eq!(reason, "Not a food item"),
            other => panic!("expected NotFood, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        match parse_content("the meal looks tasty") {
            Err(AnalysisError::Parse(_)) => {}
            other => panic!("expected Parse, got {other:?}"),
        }
        match parse_content(r#"{"calories": "lots"}"#) {
            Err(AnalysisError::Parse(_)) => {}
            other => panic!("expected Parse on mistyped field, got {other:?}"),
        }
    }

    #[test]
    fn image_prompt_includes_user_context() {
        let prompt = image_prompt(Some("black coffee, no sugar"));
        assert!(prompt.contains("black coffee, no sugar"));
        assert!(prompt.contains("Not a food item"));

        let without = image_prompt(None);
        assert!(!without.contains("USER'S DESCRIPTION"));
    }

    #[test]
    fn text_prompt_embeds_description() {
        let prompt = text_only_prompt("two slices of rye bread");
        assert!(prompt.contains("two slices of rye bread"));
        assert!(prompt.contains("0.5-0.7"));
    }
}
