//! A transport for the Gemini `generateContent` API.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::sync::Arc;

use mime::Mime;
use parley_model::{
    AssistantText, Transport, TransportError, TransportRequest,
};
use reqwest::{Client, header};

pub use config::{GeminiConfig, GeminiConfigBuilder};
use proto::GenerateContentResponse;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini transport.
#[derive(Clone, Debug)]
pub struct GeminiTransport {
    client: Client,
    config: Arc<GeminiConfig>,
}

impl GeminiTransport {
    /// Creates a new `GeminiTransport` with the given configuration.
    #[inline]
    pub fn new(config: GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl Transport for GeminiTransport {
    fn send(
        &self,
        req: &TransportRequest,
    ) -> impl Future<Output = Result<AssistantText, TransportError>> + Send + 'static
    {
        let body = proto::create_request(req, &self.config);
        debug!(
            model = %self.config.model,
            "sending {} messages",
            req.messages.len()
        );
        let resp_fut = self
            .client
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .timeout(self.config.timeout)
            .json(&body)
            .send();

        async move {
            let resp = resp_fut.await.map_err(classify_reqwest_error)?;

            let status = resp.status();
            if !status.is_success() {
                let detail = resp.text().await.unwrap_or_default();
                return Err(TransportError::non_success_status(status.as_u16())
                    .with_detail(detail));
            }

            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            if let Some(content_type) = &content_type {
                if !is_json_content_type(content_type) {
                    return Err(TransportError::malformed_response()
                        .with_detail(format!(
                            "unexpected content type: {content_type}"
                        )));
                }
            }

            let text = resp.text().await.map_err(classify_reqwest_error)?;
            trace!("got response body: {text}");

            let parsed: GenerateContentResponse = serde_json::from_str(&text)
                .map_err(|err| {
                    TransportError::malformed_response()
                        .with_detail(format!("{err}"))
                })?;
            parsed.into_text().ok_or_else(|| {
                TransportError::malformed_response()
                    .with_detail("no text at candidates[0].content.parts[0]")
            })
        }
    }
}

#[inline]
fn is_json_content_type(content_type: &str) -> bool {
    content_type
        .parse::<Mime>()
        .map(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        .unwrap_or(false)
}

fn classify_reqwest_error(err: reqwest::Error) -> TransportError {
    let detail = format!("{err}");
    if err.is_timeout() {
        TransportError::timeout().with_detail(detail)
    } else if err.is_decode() {
        TransportError::malformed_response().with_detail(detail)
    } else {
        TransportError::network_failure().with_detail(detail)
    }
}
