use crate::config::ScrapeConfig;
use crate::error::ExtractionError;
use crate::ExtractedFields;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const SYSTEM_PROMPT: &str = "Responde exclusivamente con JSON válido.";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Turns the flattened text of a museum page into the nine record fields.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, page_text: &str) -> Result<ExtractedFields, ExtractionError>;
}

pub struct AIExtractor {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    timeout: Duration,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AIExtractor {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            endpoint: format!("{}/v1/messages", config.api_base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout: config.model_timeout,
        }
    }

    async fn complete(&self, prompt: &str) -> Result<String, ExtractionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| ExtractionError::InvalidApiKey)?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": 0,
            "system": SYSTEM_PROMPT,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        let response = self
            .client
            .post(&self.endpoint)
            .headers(headers)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Api { status, body });
        }

        let result = response.json::<MessagesResponse>().await?;
        result
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or(ExtractionError::EmptyResponse)
    }
}

#[async_trait]
impl Extractor for AIExtractor {
    async fn extract(&self, page_text: &str) -> Result<ExtractedFields, ExtractionError> {
        let answer = self.complete(&build_prompt(page_text)).await?;
        debug!(chars = answer.len(), "extraction answer received");
        parse_response(&answer)
    }
}

/// User prompt for one page. The caller is expected to have truncated the text.
pub fn build_prompt(page_text: &str) -> String {
    format!(
        "Eres un asistente experto en extracción de datos (scraping).
Analiza el siguiente texto extraído de la página web de un museo mexicano.

Tu objetivo es extraer la información y devolver SOLO un objeto JSON válido (sin markdown, sin explicaciones).

Campos requeridos en el JSON:
- calle: (La calle y número. Si dice s/n pon s/n).
- colonia: (Solo la colonia).
- cp: (Código postal de 5 dígitos).
- alcaldia: (El municipio o alcaldía, ej: Coyoacán, Cuauhtémoc).
- telefonos: (String con los teléfonos encontrados).
- horarios: (String con días y horas).
- costos: (String con precios o si es entrada libre).
- resumen: (Un resumen de máximo 2 oraciones sobre qué es el museo).
- fundacion: (Fecha de fundación si existe).

Si no encuentras un dato, pon null o string vacío.

TEXTO WEB:
{page_text}"
    )
}

/// Parses the model answer into record fields.
///
/// The answer is parsed as-is first; if that fails, Markdown code fences are
/// removed and it is parsed once more.
pub fn parse_response(answer: &str) -> Result<ExtractedFields, ExtractionError> {
    let value = match serde_json::from_str::<Value>(answer.trim()) {
        Ok(value) => value,
        Err(_) => serde_json::from_str::<Value>(&strip_fences(answer))
            .map_err(ExtractionError::InvalidJson)?,
    };

    match value {
        Value::Object(object) => Ok(ExtractedFields::from_object(&object)),
        _ => Err(ExtractionError::NotAnObject),
    }
}

fn strip_fences(answer: &str) -> String {
    answer.replace("```json", "").replace("```", "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_answer() {
        let fields = parse_response(r#"{"calle": "Moneda 13", "colonia": "Centro", "cp": "06060"}"#)
            .unwrap();
        assert_eq!(fields.calle.as_deref(), Some("Moneda 13"));
        assert_eq!(fields.cp.as_deref(), Some("06060"));
        assert_eq!(fields.resumen, None);
    }

    #[test]
    fn fenced_answer() {
        let answer = "```json\n{\"alcaldia\": \"Coyoacán\", \"costos\": \"Entrada libre\"}\n```";
        let fields = parse_response(answer).unwrap();
        assert_eq!(fields.alcaldia.as_deref(), Some("Coyoacán"));
        assert_eq!(fields.costos.as_deref(), Some("Entrada libre"));
    }

    #[test]
    fn prose_is_rejected() {
        let err = parse_response("Claro, aquí está el JSON: {\"calle\": \"x\"}").unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidJson(_)));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = parse_response("```\n[1, 2]\n```").unwrap_err();
        assert!(matches!(err, ExtractionError::NotAnObject));
    }

    #[test]
    fn prompt_names_every_field() {
        let prompt = build_prompt("Museo Nacional de Antropología");
        for key in ExtractedFields::KEYS {
            assert!(prompt.contains(&format!("- {key}:")), "missing {key}");
        }
        assert!(prompt.ends_with("Museo Nacional de Antropología"));
    }

    mod http {
        use super::*;
        use crate::config::ScrapeConfig;
        use crate::test_support::spawn;
        use axum::extract::State;
        use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
        use axum::{routing::post, Json, Router};
        use std::path::PathBuf;
        use std::sync::{Arc, Mutex};

        type Seen = Arc<Mutex<Vec<(AxumHeaders, Value)>>>;

        async fn messages(
            State(seen): State<Seen>,
            headers: AxumHeaders,
            Json(body): Json<Value>,
        ) -> (AxumStatus, Json<Value>) {
            let key = headers
                .get("x-api-key")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            seen.lock().unwrap().push((headers, body));

            match key.as_str() {
                "clave-invalida" => (
                    AxumStatus::UNAUTHORIZED,
                    Json(json!({"type": "error", "error": {"type": "authentication_error"}})),
                ),
                "sin-texto" => (
                    AxumStatus::OK,
                    Json(json!({"content": [{"type": "tool_use", "id": "t1"}]})),
                ),
                _ => (
                    AxumStatus::OK,
                    Json(json!({"content": [{
                        "type": "text",
                        "text": "```json\n{\"calle\": \"Paseo de la Reforma 51\", \"cp\": \"11580\"}\n```"
                    }]})),
                ),
            }
        }

        async fn extractor(api_key: &str) -> (AIExtractor, Seen) {
            let seen = Seen::default();
            let app = Router::new()
                .route("/v1/messages", post(messages))
                .with_state(seen.clone());
            let base = spawn(app).await;

            let config = ScrapeConfig {
                base_url: base.clone(),
                list_path: "/lista.php".into(),
                api_key: api_key.into(),
                api_base_url: base,
                model: "claude-3-haiku-20240307".into(),
                max_tokens: 1000,
                page_timeout: Duration::from_secs(5),
                model_timeout: Duration::from_secs(5),
                max_text_chars: 5000,
                request_delay: Duration::ZERO,
                output: PathBuf::from("museos_cdmx_ia.csv"),
            };
            (AIExtractor::new(&config), seen)
        }

        #[tokio::test]
        async fn request_carries_key_version_and_prompt() {
            let (extractor, seen) = extractor("sk-ant-prueba").await;

            let fields = extractor.extract("Museo Tamayo").await.unwrap();

            assert_eq!(fields.calle.as_deref(), Some("Paseo de la Reforma 51"));
            assert_eq!(fields.cp.as_deref(), Some("11580"));

            let seen = seen.lock().unwrap();
            let (headers, body) = &seen[0];
            assert_eq!(headers["x-api-key"], "sk-ant-prueba");
            assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
            assert_eq!(body["model"], "claude-3-haiku-20240307");
            assert_eq!(body["max_tokens"], 1000);
            assert_eq!(body["temperature"], 0);
            assert_eq!(body["system"], SYSTEM_PROMPT);
            assert_eq!(body["messages"][0]["role"], "user");
            assert_eq!(
                body["messages"][0]["content"].as_str().unwrap(),
                build_prompt("Museo Tamayo")
            );
        }

        #[tokio::test]
        async fn rejected_key_is_an_api_error() {
            let (extractor, _) = extractor("clave-invalida").await;

            let err = extractor.extract("Museo Tamayo").await.unwrap_err();

            match err {
                ExtractionError::Api { status, body } => {
                    assert_eq!(status, reqwest::StatusCode::UNAUTHORIZED);
                    assert!(body.contains("authentication_error"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn answer_without_text_block_is_empty() {
            let (extractor, _) = extractor("sin-texto").await;

            let err = extractor.extract("Museo Tamayo").await.unwrap_err();

            assert!(matches!(err, ExtractionError::EmptyResponse));
        }
    }
}
