use reqwest::Client;
use serde::Serialize;
use anyhow::Result;

/// Request body for the chat backend. The backend expects camelCase keys
/// (`sessionId`), matching what its web frontend sends.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    pub model: String,
    pub message: String,
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST a prompt to `/api/chat` and extract the reply text.
    ///
    /// The recognized response shape is `{"reply": "..."}`. Any other JSON
    /// body is accepted and rendered via its full serialization. The HTTP
    /// status is not inspected: the backend reports its own failures inside
    /// the JSON body, and a transport error or non-JSON body is the only
    /// failure this client distinguishes.
    pub async fn send(&self, request: &ChatRequest) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await?;

        let body: serde_json::Value = response.json().await?;

        match body.get("reply").and_then(|r| r.as_str()) {
            Some(reply) => Ok(reply.to_string()),
            None => Ok(body.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            session_id: "default".to_string(),
            model: "mistral".to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn send_posts_json_and_returns_reply() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "sessionId": "default",
                "model": "mistral",
                "message": "Hello"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "reply": "Hi there"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri());
        let reply = client.send(&request("Hello")).await.unwrap();
        assert_eq!(reply, "Hi there");
    }

    #[tokio::test]
    async fn send_falls_back_to_serialized_body_without_reply_field() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok"
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri());
        let reply = client.send(&request("anything")).await.unwrap();
        assert_eq!(reply, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn send_accepts_error_status_with_json_body() {
        // The backend wraps its own failures in a JSON reply with a 500
        // status. The frontend renders those like any other reply.
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "reply": "error: model unavailable"
            })))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri());
        let reply = client.send(&request("anything")).await.unwrap();
        assert_eq!(reply, "error: model unavailable");
    }

    #[tokio::test]
    async fn send_errors_on_non_json_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = ChatClient::new(&server.uri());
        assert!(client.send(&request("anything")).await.is_err());
    }

    #[tokio::test]
    async fn send_errors_when_backend_is_unreachable() {
        // Port 1 is never listening.
        let client = ChatClient::new("http://127.0.0.1:1");
        assert!(client.send(&request("anything")).await.is_err());
    }
}
