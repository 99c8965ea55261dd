//! Test helpers for the console API

use mockito::{Matcher, Mock, ServerGuard};
use url::Url;

use super::{Client, ClientOptions, Endpoint};

pub const TEST_USER: &str = "admin";
pub const TEST_PASSWORD: &str = "s3cret";

/// Client for a mockito server. Mockito speaks plain HTTP, so this skips the
/// `https` check that `Client::new` applies.
pub fn create_test_client(server_url: &str) -> Client {
    create_test_client_with(server_url, ClientOptions::new(TEST_USER, TEST_PASSWORD))
}

pub fn create_test_client_with(server_url: &str, options: ClientOptions) -> Client {
    let url = Url::parse(&format!("{}/api", server_url)).unwrap();
    Client::with_endpoint(Endpoint::from_url(url).unwrap(), options).unwrap()
}

/// Test client that already holds session `token`.
pub async fn logged_on_test_client(server_url: &str, token: &str) -> Client {
    let client = create_test_client(server_url);
    client.set_session_token(token).await;
    client
}

/// Logon mock answering with session `token`, expected `hits` times.
pub async fn mock_logon(server: &mut ServerGuard, token: &str, hits: usize) -> Mock {
    server
        .mock("POST", "/api/sessions")
        .match_header("x-api-session", Matcher::Missing)
        .match_body(Matcher::PartialJson(serde_json::json!({
            "userid": TEST_USER,
            "password": TEST_PASSWORD,
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "api-session": token,
                "notif-topic": "obj-topic",
                "job-notif-topic": "job-topic",
                "api-major-version": 4,
                "api-minor-version": 10,
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::request::Transport;

    #[tokio::test]
    async fn test_client_targets_api_prefix() {
        let client = create_test_client("http://127.0.0.1:1");
        assert_eq!(client.endpoint().base_path(), "/api");
        assert_eq!(
            client.endpoint().resource_url("/cpcs").as_str(),
            "http://127.0.0.1:1/api/cpcs"
        );
        assert!(!client.is_logged_on(false).await);
    }

    #[tokio::test]
    async fn logged_on_client_holds_token() {
        let client = logged_on_test_client("http://127.0.0.1:1", "T1").await;
        assert!(client.is_logged_on(false).await);
        assert_eq!(client.session_id().await.as_deref(), Some("T1"));
    }

    #[test]
    fn user_agent_names_platform_and_library() {
        let agent = crate::api::user_agent();
        assert!(agent.starts_with("ZHMC ("));
        assert!(agent.contains(std::env::consts::OS));
        assert!(agent.contains(std::env::consts::ARCH));
        assert!(agent.ends_with(&format!("zhmc/{}", env!("CARGO_PKG_VERSION"))));
    }
}
