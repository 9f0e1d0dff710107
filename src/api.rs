use crate::error::CrosswordError;
use crate::model::{PuzzleDoc, SolutionDoc, SubmitResponseDoc};
use crate::submit::SubmissionPayload;

pub const BACKEND_BASE: &str = "https://crosswordbackend.onrender.com";

/// The remote crossword service as the client sees it. Implemented over
/// browser `fetch` in production and by recording fakes in tests.
pub trait CrosswordBackend {
    async fn fetch_puzzle(&self) -> Result<PuzzleDoc, CrosswordError>;
    async fn submit_answers(&self, payload: &SubmissionPayload) -> Result<String, CrosswordError>;
    async fn fetch_solution(&self, crossword_id: u32) -> Result<SolutionDoc, CrosswordError>;
}

/// `fetch`-backed client for the crossword REST service. Only functional in
/// the browser; on the server every call reports a network error.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    base: String,
}

impl Default for HttpBackend {
    fn default() -> Self {
        Self {
            base: BACKEND_BASE.to_string(),
        }
    }
}

impl HttpBackend {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    #[cfg(feature = "hydrate")]
    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
    ) -> Result<(u16, String), CrosswordError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let init = web_sys::RequestInit::new();
        init.set_method(method);
        if let Some(body) = body {
            init.set_body(&wasm_bindgen::JsValue::from_str(&body));
        }

        let url = format!("{}{}", self.base, path);
        let request = web_sys::Request::new_with_str_and_init(&url, &init)
            .map_err(|_| CrosswordError::Network(format!("failed to build request for {}", url)))?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(|_| CrosswordError::Network("failed to set request headers".to_string()))?;

        let window = leptos::leptos_dom::helpers::window();
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|_| CrosswordError::Network(format!("could not reach {}", url)))?;
        let response: web_sys::Response = response
            .dyn_into()
            .map_err(|_| CrosswordError::Network("fetch returned a non-response".to_string()))?;

        let text = response
            .text()
            .map_err(|_| CrosswordError::Network("response body unavailable".to_string()))?;
        let text = JsFuture::from(text)
            .await
            .map_err(|_| CrosswordError::Network("failed to read response body".to_string()))?;
        Ok((response.status(), text.as_string().unwrap_or_default()))
    }

    #[cfg(not(feature = "hydrate"))]
    async fn request(
        &self,
        _method: &str,
        _path: &str,
        _body: Option<String>,
    ) -> Result<(u16, String), CrosswordError> {
        Err(CrosswordError::Network(
            "the crossword service is only reachable from the browser".to_string(),
        ))
    }
}

impl CrosswordBackend for HttpBackend {
    async fn fetch_puzzle(&self) -> Result<PuzzleDoc, CrosswordError> {
        let (status, text) = self.request("GET", "/crossword", None).await?;
        if !(200..300).contains(&status) {
            return Err(CrosswordError::Network(format!(
                "puzzle fetch failed with HTTP {}",
                status
            )));
        }
        serde_json::from_str(&text)
            .map_err(|err| CrosswordError::InvalidLayout(format!("unexpected puzzle shape: {}", err)))
    }

    async fn submit_answers(&self, payload: &SubmissionPayload) -> Result<String, CrosswordError> {
        let body = serde_json::to_string(payload)
            .map_err(|err| CrosswordError::Network(format!("could not encode answers: {}", err)))?;
        let (status, text) = self
            .request("POST", "/submitcrossword", Some(body))
            .await?;

        // The server always answers with a message; fall back to the raw
        // body when it is not JSON.
        let message = serde_json::from_str::<SubmitResponseDoc>(&text)
            .map(|doc| doc.message)
            .unwrap_or(text);
        if (200..300).contains(&status) {
            Ok(if message.is_empty() {
                "Your answers were submitted.".to_string()
            } else {
                message
            })
        } else {
            Err(CrosswordError::Rejected(if message.is_empty() {
                "Server rejected the submission.".to_string()
            } else {
                message
            }))
        }
    }

    async fn fetch_solution(&self, crossword_id: u32) -> Result<SolutionDoc, CrosswordError> {
        let body = format!("{{\"crossword_id\":{}}}", crossword_id);
        let (status, text) = self.request("POST", "/getsolution", Some(body)).await?;
        if !(200..300).contains(&status) {
            return Err(CrosswordError::Network(format!(
                "solution fetch failed with HTTP {}",
                status
            )));
        }
        serde_json::from_str(&text).map_err(|err| {
            CrosswordError::InvalidLayout(format!("unexpected solution shape: {}", err))
        })
    }
}
