use chrono::{DateTime, Utc};
use flate2::{Decompress, FlushDecompress, Status};
use serde::de::DeserializeOwned;

use super::constants::ZLIB_SUFFIX;
use super::error::{GatewayError, GatewayResult};
use super::payloads::{GatewayMessage, HelloPayload, MessagePayload, ReadyPayload};

use crate::domain::entities::{
    ChannelId, GuildId, Message, MessageAuthor, MessageFlags, MessageId, UserId,
};

const INITIAL_BUFFER_SIZE: usize = 32 * 1024;
const MAX_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Inflates a `zlib-stream` transport; one zlib context spans the whole connection.
pub struct GatewayCodec {
    inflater: Decompress,
    compressed_buffer: Vec<u8>,
}

impl GatewayCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            compressed_buffer: Vec::with_capacity(4096),
        }
    }

    /// Buffers a binary frame; returns the JSON text once a full message has arrived.
    pub fn decode_binary(&mut self, data: &[u8]) -> GatewayResult<Option<String>> {
        self.compressed_buffer.extend_from_slice(data);

        if !self.compressed_buffer.ends_with(&ZLIB_SUFFIX) {
            return Ok(None);
        }

        let result = self.decompress();
        self.compressed_buffer.clear();
        result.map(Some)
    }

    fn decompress(&mut self) -> GatewayResult<String> {
        let mut output = Vec::with_capacity(INITIAL_BUFFER_SIZE);
        let mut consumed = 0;

        loop {
            if output.len() == output.capacity() {
                if output.capacity() >= MAX_BUFFER_SIZE {
                    return Err(GatewayError::compression(
                        "decompressed data exceeds maximum size",
                    ));
                }
                output.reserve(output.capacity());
            }

            let in_before = self.inflater.total_in();
            let out_before = self.inflater.total_out();

            let status = self
                .inflater
                .decompress_vec(
                    &self.compressed_buffer[consumed..],
                    &mut output,
                    FlushDecompress::Sync,
                )
                .map_err(|e| GatewayError::compression(e.to_string()))?;

            let read = usize::try_from(self.inflater.total_in() - in_before).unwrap_or(0);
            let written = self.inflater.total_out() - out_before;
            consumed += read;

            let input_done = consumed >= self.compressed_buffer.len();
            let output_has_room = output.len() < output.capacity();

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError if input_done && output_has_room => break,
                Status::Ok | Status::BufError if read == 0 && written == 0 && output_has_room => {
                    return Err(GatewayError::compression("inflate made no progress"));
                }
                Status::Ok | Status::BufError => {}
            }
        }

        String::from_utf8(output).map_err(|e| GatewayError::compression(format!("invalid UTF-8: {e}")))
    }

    pub fn reset(&mut self) {
        self.inflater.reset(true);
        self.compressed_buffer.clear();
    }
}

impl Default for GatewayCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Dispatch events the bot acts on.
#[derive(Debug)]
pub enum Dispatch {
    Ready {
        session_id: String,
        resume_gateway_url: Option<String>,
        user_id: UserId,
    },
    Resumed,
    MessageCreate(Message),
    Ignored,
}

pub struct EventParser;

impl EventParser {
    pub fn parse_message(json: &str) -> GatewayResult<GatewayMessage> {
        serde_json::from_str(json).map_err(|e| GatewayError::serialization(e.to_string()))
    }

    pub fn parse_hello(data: serde_json::Value) -> GatewayResult<HelloPayload> {
        Self::from_value(data, "Hello")
    }

    pub fn parse_dispatch(
        event_type: &str,
        data: Option<serde_json::Value>,
    ) -> GatewayResult<Dispatch> {
        match event_type {
            "RESUMED" => Ok(Dispatch::Resumed),
            "READY" => Self::parse_ready(Self::require(data)?),
            "MESSAGE_CREATE" => Self::parse_message_create(Self::require(data)?),
            _ => Ok(Dispatch::Ignored),
        }
    }

    fn require(data: Option<serde_json::Value>) -> GatewayResult<serde_json::Value> {
        data.ok_or_else(|| GatewayError::protocol("Missing dispatch data"))
    }

    fn from_value<T: DeserializeOwned>(data: serde_json::Value, name: &str) -> GatewayResult<T> {
        serde_json::from_value(data)
            .map_err(|e| GatewayError::serialization(format!("Failed to parse {name}: {e}")))
    }

    fn parse_ready(data: serde_json::Value) -> GatewayResult<Dispatch> {
        let ready: ReadyPayload = Self::from_value(data, "Ready")?;

        Ok(Dispatch::Ready {
            session_id: ready.session_id,
            resume_gateway_url: ready.resume_gateway_url,
            user_id: UserId(snowflake(&ready.user.id, "user")?),
        })
    }

    fn parse_message_create(data: serde_json::Value) -> GatewayResult<Dispatch> {
        let payload: MessagePayload = Self::from_value(data, "MessageCreate")?;

        let timestamp: DateTime<Utc> = payload
            .timestamp
            .parse()
            .map_err(|_| GatewayError::protocol("Invalid timestamp"))?;

        let author = MessageAuthor::new(
            UserId(snowflake(&payload.author.id, "author")?),
            payload.author.username,
            payload.author.bot,
        );

        let mut message = Message::new(
            MessageId(snowflake(&payload.id, "message")?),
            ChannelId(snowflake(&payload.channel_id, "channel")?),
            author,
            payload.content,
            timestamp,
        )
        .with_flags(MessageFlags::from_bits_truncate(payload.flags));

        if let Some(guild_id) = payload.guild_id {
            message = message.with_guild_id(GuildId(snowflake(&guild_id, "guild")?));
        }

        Ok(Dispatch::MessageCreate(message))
    }
}

fn snowflake(value: &str, kind: &str) -> GatewayResult<u64> {
    value
        .parse()
        .map_err(|_| GatewayError::protocol(format!("Invalid {kind} ID: {value}")))
}
