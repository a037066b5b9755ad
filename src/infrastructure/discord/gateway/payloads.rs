use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::constants::{
    ACTIVITY_COMPETING, CLIENT_PROPERTIES_BROWSER, CLIENT_PROPERTIES_DEVICE, CLIENT_PROPERTIES_OS,
    GatewayOpcode, LARGE_THRESHOLD,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    fn new(opcode: GatewayOpcode, d: Value) -> Self {
        Self {
            op: opcode.as_u8(),
            d,
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self::new(
            GatewayOpcode::Heartbeat,
            sequence.map_or(Value::Null, |s| Value::Number(s.into())),
        )
    }

    #[must_use]
    pub fn identify(token: &str, intents: u32, activity: &str) -> Self {
        let identify = IdentifyData {
            token,
            properties: IdentifyProperties {
                os: CLIENT_PROPERTIES_OS,
                browser: CLIENT_PROPERTIES_BROWSER,
                device: CLIENT_PROPERTIES_DEVICE,
            },
            compress: false,
            large_threshold: LARGE_THRESHOLD,
            intents,
            presence: PresenceData {
                since: None,
                activities: vec![ActivityData {
                    name: activity,
                    kind: ACTIVITY_COMPETING,
                }],
                status: "online",
                afk: false,
            },
        };

        Self::new(
            GatewayOpcode::Identify,
            serde_json::to_value(identify).unwrap_or(Value::Null),
        )
    }

    #[must_use]
    pub fn resume(token: &str, session_id: &str, sequence: u64) -> Self {
        let resume = ResumeData {
            token,
            session_id,
            seq: sequence,
        };

        Self::new(
            GatewayOpcode::Resume,
            serde_json::to_value(resume).unwrap_or(Value::Null),
        )
    }
}

#[derive(Debug, Serialize)]
struct IdentifyData<'a> {
    token: &'a str,
    properties: IdentifyProperties,
    compress: bool,
    large_threshold: u16,
    intents: u32,
    presence: PresenceData<'a>,
}

#[derive(Debug, Serialize)]
struct IdentifyProperties {
    os: &'static str,
    browser: &'static str,
    device: &'static str,
}

#[derive(Debug, Serialize)]
struct PresenceData<'a> {
    since: Option<u64>,
    activities: Vec<ActivityData<'a>>,
    status: &'static str,
    afk: bool,
}

#[derive(Debug, Serialize)]
struct ActivityData<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: u8,
}

#[derive(Debug, Serialize)]
struct ResumeData<'a> {
    token: &'a str,
    session_id: &'a str,
    seq: u64,
}

#[derive(Debug, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    pub d: Option<Value>,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user: ReadyUser,
}

#[derive(Debug, Deserialize)]
pub struct ReadyUser {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    pub id: String,
    pub channel_id: String,
    pub guild_id: Option<String>,
    pub author: AuthorPayload,
    #[serde(default)]
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub flags: u64,
}

#[derive(Debug, Deserialize)]
pub struct AuthorPayload {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}
