//! Discord API HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, header};
use tracing::{debug, warn};

use super::dto::{
    AllowedMentions, CreateMessageRequest, EditFlagsRequest, ErrorResponse, MessageReference,
    MessageResponse, RateLimitResponse, UserResponse,
};
use crate::domain::entities::{BotToken, ChannelId, MessageFlags, MessageId, User, UserId};
use crate::domain::errors::DeliveryError;
use crate::domain::ports::{ChatPort, ReplyRequest};

const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/linuxmobile/oxilinks, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_RETRY_AFTER_MS: u64 = 5000;

/// Discord REST client authenticated as a bot.
pub struct DiscordClient {
    client: Client,
    base_url: String,
    token: BotToken,
}

impl DiscordClient {
    /// Creates new client with default base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(token: BotToken) -> Result<Self, DeliveryError> {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// Creates client with custom base URL.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn with_base_url(
        token: BotToken,
        base_url: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                DeliveryError::unexpected(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::AUTHORIZATION, self.token.authorization())
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, DeliveryError> {
        let response = self.authorized(request).send().await.map_err(|e| {
            warn!(error = %e, "Failed to reach Discord API");
            if e.is_timeout() {
                DeliveryError::network("request timed out")
            } else if e.is_connect() {
                DeliveryError::network("failed to connect to Discord")
            } else {
                DeliveryError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(Self::handle_error_response(status, response).await)
        }
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> DeliveryError {
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_ms = response
                .json::<RateLimitResponse>()
                .await
                .map_or(DEFAULT_RETRY_AFTER_MS, |body| {
                    Duration::from_secs_f64(body.retry_after.max(0.0))
                        .as_millis()
                        .try_into()
                        .unwrap_or(u64::MAX)
                });
            return DeliveryError::RateLimited { retry_after_ms };
        }

        let error_message = match response.json::<ErrorResponse>().await {
            Ok(error) => error.message,
            Err(_) => format!("HTTP {status}"),
        };

        match status {
            StatusCode::UNAUTHORIZED => DeliveryError::rejected("invalid or expired token"),
            StatusCode::FORBIDDEN => {
                DeliveryError::rejected(format!("missing permissions: {error_message}"))
            }
            StatusCode::NOT_FOUND => DeliveryError::not_found(error_message),
            s if s.is_server_error() => {
                DeliveryError::network("Discord API is temporarily unavailable")
            }
            _ => DeliveryError::unexpected(format!(
                "unexpected response: {status} - {error_message}"
            )),
        }
    }
}

#[async_trait]
impl ChatPort for DiscordClient {
    async fn current_user(&self) -> Result<User, DeliveryError> {
        let url = format!("{}/users/@me", self.base_url);

        let user: UserResponse = self
            .send(self.client.get(&url))
            .await?
            .json()
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to parse user response");
                DeliveryError::unexpected(format!("failed to parse response: {e}"))
            })?;

        let id = user
            .id
            .parse::<u64>()
            .map_err(|e| DeliveryError::unexpected(format!("invalid user id '{}': {e}", user.id)))?;

        Ok(User::new(UserId(id), user.username, user.bot))
    }

    async fn suppress_embeds(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        current_flags: MessageFlags,
    ) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/channels/{channel_id}/messages/{message_id}",
            self.base_url
        );
        let body = EditFlagsRequest {
            flags: (current_flags | MessageFlags::SUPPRESS_EMBEDS).bits(),
        };

        debug!(%channel_id, %message_id, "Suppressing embeds");
        self.send(self.client.patch(&url).json(&body)).await?;
        Ok(())
    }

    async fn send_reply(&self, request: ReplyRequest) -> Result<MessageId, DeliveryError> {
        let url = format!("{}/channels/{}/messages", self.base_url, request.channel_id);
        let body = CreateMessageRequest {
            content: &request.content,
            message_reference: MessageReference {
                message_id: request.reply_to.to_string(),
                fail_if_not_exists: false,
            },
            allowed_mentions: AllowedMentions::default(),
        };

        let created: MessageResponse = self
            .send(self.client.post(&url).json(&body))
            .await?
            .json()
            .await
            .map_err(|e| DeliveryError::unexpected(format!("failed to parse response: {e}")))?;

        debug!(channel_id = %request.channel_id, reply_id = %created.id, "Reply sent");
        Ok(MessageId::from(created.id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn make_client(server: &MockServer) -> DiscordClient {
        let token = BotToken::new("MTIz.abc.def").unwrap();
        DiscordClient::with_base_url(token, server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .and(header("authorization", "Bot MTIz.abc.def"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "1234",
                "username": "oxilinks",
                "bot": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let user = make_client(&server).current_user().await.unwrap();

        assert_eq!(user.id(), UserId(1234));
        assert!(user.is_bot());
    }

    #[tokio::test]
    async fn test_unauthorized_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({ "message": "401: Unauthorized" })),
            )
            .mount(&server)
            .await;

        let result = make_client(&server).current_user().await;

        assert!(matches!(result, Err(DeliveryError::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_suppress_embeds_keeps_flags() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/channels/10/messages/20"))
            .and(body_json(json!({ "flags": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "20" })))
            .expect(1)
            .mount(&server)
            .await;

        make_client(&server)
            .suppress_embeds(ChannelId(10), MessageId(20), MessageFlags::CROSSPOSTED)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_reply_disables_mentions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/10/messages"))
            .and(body_json(json!({
                "content": "https://vxtwitter.com/a/status/1",
                "message_reference": { "message_id": "20", "fail_if_not_exists": false },
                "allowed_mentions": { "parse": [], "replied_user": false }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "30" })))
            .expect(1)
            .mount(&server)
            .await;

        let reply_id = make_client(&server)
            .send_reply(ReplyRequest::new(
                ChannelId(10),
                MessageId(20),
                "https://vxtwitter.com/a/status/1",
            ))
            .await
            .unwrap();

        assert_eq!(reply_id, MessageId(30));
    }

    #[tokio::test]
    async fn test_rate_limit_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/channels/10/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "message": "You are being rate limited.",
                "retry_after": 1.5,
                "global": false
            })))
            .mount(&server)
            .await;

        let result = make_client(&server)
            .send_reply(ReplyRequest::new(ChannelId(10), MessageId(20), "x"))
            .await;

        assert!(matches!(
            result,
            Err(DeliveryError::RateLimited {
                retry_after_ms: 1500
            })
        ));
    }

    #[tokio::test]
    async fn test_missing_message_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({ "message": "Unknown Message" })),
            )
            .mount(&server)
            .await;

        let result = make_client(&server)
            .suppress_embeds(ChannelId(1), MessageId(2), MessageFlags::empty())
            .await;

        assert!(matches!(result, Err(DeliveryError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_server_error_is_recoverable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let error = make_client(&server).current_user().await.unwrap_err();

        assert!(error.is_recoverable());
    }
}
