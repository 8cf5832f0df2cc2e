use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use tracing::debug;

use super::http_errors::api_request_error;
use super::{CompletionTransport, RawResponse, TransportFuture};
use crate::config::Config;
use crate::request::CompletionRequest;

/// Issues one chat-completion POST per call. No retries.
pub struct DeepSeekClient<'a> {
    client: &'a Client,
    cfg: &'a Config,
}

impl<'a> DeepSeekClient<'a> {
    pub fn new(client: &'a Client, cfg: &'a Config) -> Self {
        Self { client, cfg }
    }

    async fn post(&self, request: &CompletionRequest) -> Result<RawResponse> {
        let api_url = &self.cfg.api_url;
        let body =
            serde_json::to_vec(request).context("Failed to serialize chat completion request")?;
        debug!(
            api_url = %api_url,
            model = %request.model,
            message_count = request.messages.len(),
            body = %String::from_utf8_lossy(&body),
            "sending chat completion request"
        );

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", self.cfg.api_key))
            .context("DEEPSEEK_API_KEY contains characters not allowed in an HTTP header")?;
        auth_value.set_sensitive(true);

        let response = self
            .client
            .post(api_url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, auth_value)
            .body(body)
            .send()
            .await
            .map_err(|err| {
                debug!(api_url = %api_url, error = %err, "chat completion request failed");
                api_request_error(err, api_url, self.cfg.request_timeout_secs)
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .context("Failed to read DeepSeek API response body")?
            .to_vec();

        debug!(
            status = %status,
            success = status.is_success(),
            response_len = body.len(),
            "received chat completion response"
        );
        debug!(body = %String::from_utf8_lossy(&body), "raw response body");

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

impl CompletionTransport for DeepSeekClient<'_> {
    fn send<'b>(&'b self, request: &'b CompletionRequest) -> TransportFuture<'b> {
        Box::pin(self.post(request))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;
    use serde_json::Value;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::DeepSeekClient;
    use crate::config::Config;
    use crate::providers::CompletionTransport;
    use crate::request::{CompletionRequest, SamplingOptions};

    fn read_http_request(stream: &mut std::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = stream.read(&mut chunk).expect("read should succeed");
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept should succeed");
            let request = read_http_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream
                .write_all(response.as_bytes())
                .expect("write should succeed");
            request
        });
        (format!("http://{addr}/v1/chat/completions"), handle)
    }

    fn test_config(api_url: String) -> Config {
        Config {
            api_key: "sk-test".to_string(),
            api_url,
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn posts_json_with_bearer_auth_and_returns_raw_body() {
        let (api_url, server) = serve_once("200 OK", r#"{"choices":[]}"#);
        let client = Client::new();
        let cfg = test_config(api_url);
        let transport = DeepSeekClient::new(&client, &cfg);
        let request = CompletionRequest::build("ctx", "explain", SamplingOptions::default())
            .expect("request should build");

        let response = transport.send(&request).await.expect("send should succeed");
        assert_eq!(response.status, 200);
        assert_eq!(response.body, br#"{"choices":[]}"#.to_vec());

        let raw_request = server.join().expect("server thread should join");
        let lower = raw_request.to_ascii_lowercase();
        assert!(raw_request.starts_with("POST /v1/chat/completions "));
        assert!(lower.contains("content-type: application/json"));
        assert!(lower.contains("authorization: bearer sk-test"));

        let (_, body) = raw_request
            .split_once("\r\n\r\n")
            .expect("request should have a body");
        let json: Value = serde_json::from_str(body).expect("body should be JSON");
        assert_eq!(json["model"], "deepseek-chat");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"].as_array().map(Vec::len), Some(3));
        assert_eq!(json["messages"][2]["content"], "explain");
    }

    #[tokio::test]
    async fn passes_non_success_status_through() {
        let body = r#"{"error":{"message":"rate limited"}}"#;
        let (api_url, server) = serve_once("429 Too Many Requests", body);
        let client = Client::new();
        let cfg = test_config(api_url);
        let transport = DeepSeekClient::new(&client, &cfg);
        let request = CompletionRequest::build("", "hi", SamplingOptions::default())
            .expect("request should build");

        let response = transport.send(&request).await.expect("send should succeed");
        assert_eq!(response.status, 429);
        assert_eq!(response.body, body.as_bytes().to_vec());

        server.join().expect("server thread should join");
    }
}
