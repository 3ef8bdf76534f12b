//! [`ChatAdapter`] backed by the Gemini `streamGenerateContent` endpoint.

use futures_util::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error};

use crate::api::GenerateContentRequest;
use crate::core::chat_stream::{format_api_error, sse_fragments};
use crate::core::constants::{API_KEY_ENV, API_KEY_FALLBACK_ENV, DEFAULT_BASE_URL};
use crate::core::models::ModelId;
use crate::core::session::{record_on_success, ChatAdapter, ChatError, ChatSession, FragmentStream};
use crate::utils::url::construct_api_url;

/// Read the API key from the environment.
///
/// A missing key is logged and replaced by an empty one; the first request
/// then fails like any other transport error.
pub fn api_key_from_env() -> String {
    let key = [API_KEY_ENV, API_KEY_FALLBACK_ENV]
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|value| !value.trim().is_empty()));

    match key {
        Some(key) => key,
        None => {
            error!("{API_KEY_ENV} is missing from environment variables; requests will fail");
            String::new()
        }
    }
}

pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    session: Option<ChatSession>,
}

impl GeminiAdapter {
    pub fn new(client: reqwest::Client, base_url: Option<String>, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            session: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    fn stream_url(&self, model: ModelId) -> String {
        let endpoint = format!("models/{}:streamGenerateContent?alt=sse", model.as_str());
        construct_api_url(&self.base_url, &endpoint)
    }
}

async fn open_stream(
    client: reqwest::Client,
    url: String,
    api_key: String,
    request: GenerateContentRequest,
) -> Result<reqwest::Response, ChatError> {
    let response = client
        .post(url)
        .header("Content-Type", "application/json")
        .header("x-goog-api-key", api_key)
        .json(&request)
        .send()
        .await
        .map_err(|err| ChatError::transport(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(ChatError::transport(format_api_error(
            Some(status.as_u16()),
            &error_text,
        )));
    }

    Ok(response)
}

impl ChatAdapter for GeminiAdapter {
    fn start(&mut self, model: ModelId) {
        debug!(model = %model, "starting chat session");
        self.session = Some(ChatSession::new(model));
    }

    fn stream_reply(&mut self, user_text: &str) -> Result<FragmentStream, ChatError> {
        let session = self.session.as_ref().ok_or(ChatError::SessionNotInitialized)?;

        let request = session.build_request(user_text);
        let url = self.stream_url(session.model());
        debug!(
            model = %session.model(),
            history_len = session.history().len(),
            "dispatching streamGenerateContent"
        );

        let fragments = stream::once(open_stream(
            self.client.clone(),
            url,
            self.api_key.clone(),
            request,
        ))
        .map_ok(|response| sse_fragments(response.bytes_stream()).boxed())
        .try_flatten()
        .boxed();

        Ok(record_on_success(
            fragments,
            session.history().clone(),
            user_text.to_string(),
        ))
    }

    fn model(&self) -> Option<ModelId> {
        self.session.as_ref().map(ChatSession::model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::SYSTEM_INSTRUCTION;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FLASH_PATH: &str = "/v1beta/models/gemini-2.5-flash:streamGenerateContent";

    fn sse_body(fragments: &[&str]) -> String {
        fragments
            .iter()
            .map(|text| {
                let payload = serde_json::json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
                });
                format!("data: {payload}\r\n\r\n")
            })
            .collect()
    }

    fn adapter_for(server: &MockServer) -> GeminiAdapter {
        GeminiAdapter::new(
            reqwest::Client::new(),
            Some(format!("{}/v1beta/", server.uri())),
            "test-key".to_string(),
        )
    }

    async fn drain(stream: FragmentStream) -> Vec<Result<String, ChatError>> {
        stream.collect().await
    }

    #[test]
    fn stream_reply_requires_a_session() {
        let mut adapter = GeminiAdapter::new(reqwest::Client::new(), None, String::new());
        assert_eq!(adapter.model(), None);
        assert!(matches!(
            adapter.stream_reply("hello"),
            Err(ChatError::SessionNotInitialized)
        ));
    }

    #[test]
    fn reset_replaces_the_session() {
        let mut adapter = GeminiAdapter::new(reqwest::Client::new(), None, String::new());
        adapter.start(ModelId::Flash);
        adapter
            .session()
            .expect("session")
            .history()
            .record_exchange(crate::api::Content::user("a"), crate::api::Content::model("b"));

        adapter.reset(ModelId::Pro);
        let session = adapter.session().expect("session");
        assert_eq!(session.model(), ModelId::Pro);
        assert!(session.history().is_empty());
        assert_eq!(adapter.base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn streams_fragments_and_sends_key_and_instruction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FLASH_PATH))
            .and(query_param("alt", "sse"))
            .and(header("x-goog-api-key", "test-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&["Hi", " there"])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut adapter = adapter_for(&server);
        adapter.start(ModelId::Flash);
        let items = drain(adapter.stream_reply("Hello").expect("stream")).await;
        assert_eq!(items, vec![Ok("Hi".to_string()), Ok(" there".to_string())]);

        let requests = server.received_requests().await.expect("recorded");
        let body: serde_json::Value = requests[0].body_json().expect("json body");
        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            SYSTEM_INSTRUCTION
        );
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[tokio::test]
    async fn history_is_replayed_after_a_successful_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FLASH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(sse_body(&["Hi"])))
            .mount(&server)
            .await;

        let mut adapter = adapter_for(&server);
        adapter.start(ModelId::Flash);
        drain(adapter.stream_reply("first").expect("stream")).await;
        drain(adapter.stream_reply("second").expect("stream")).await;

        let requests = server.received_requests().await.expect("recorded");
        assert_eq!(requests.len(), 2);
        let body: serde_json::Value = requests[1].body_json().expect("json body");
        let contents = body["contents"].as_array().expect("contents");
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "first");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "Hi");
        assert_eq!(contents[2]["parts"][0]["text"], "second");
    }

    #[tokio::test]
    async fn error_status_becomes_transport_error_and_skips_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FLASH_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string(
                r#"{"error":{"code":403,"message":"API key not valid.","status":"PERMISSION_DENIED"}}"#,
            ))
            .mount(&server)
            .await;

        let mut adapter = adapter_for(&server);
        adapter.start(ModelId::Flash);
        let items = drain(adapter.stream_reply("Hello").expect("stream")).await;
        assert_eq!(
            items,
            vec![Err(ChatError::transport("HTTP 403: API key not valid."))]
        );
        assert!(adapter.session().expect("session").history().is_empty());
    }

    #[tokio::test]
    async fn nothing_is_sent_until_the_stream_is_polled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(sse_body(&["x"])))
            .expect(0)
            .mount(&server)
            .await;

        let mut adapter = adapter_for(&server);
        adapter.start(ModelId::Pro);
        let stream = adapter.stream_reply("Hello").expect("stream");
        drop(stream);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let mut adapter = GeminiAdapter::new(
            reqwest::Client::new(),
            Some("http://127.0.0.1:9".to_string()),
            "k".to_string(),
        );
        adapter.start(ModelId::Flash);
        let items = drain(adapter.stream_reply("Hello").expect("stream")).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(ChatError::Transport(_))));
    }
}
