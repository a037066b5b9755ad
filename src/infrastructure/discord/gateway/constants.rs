use std::time::Duration;

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json&compress=zlib-stream";
pub const ZLIB_SUFFIX: [u8; 4] = [0x00, 0x00, 0xff, 0xff];

pub const HEARTBEAT_JITTER_PERCENT: f64 = 0.05;

pub const RECONNECT_DELAY_BASE: Duration = Duration::from_secs(1);
pub const RECONNECT_DELAY_MAX: Duration = Duration::from_secs(60);
pub const RECONNECT_JITTER_MAX: Duration = Duration::from_millis(500);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 10;

pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const HELLO_TIMEOUT: Duration = Duration::from_secs(10);
pub const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway events buffered ahead of the consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

pub const CLIENT_PROPERTIES_OS: &str = std::env::consts::OS;
pub const CLIENT_PROPERTIES_BROWSER: &str = "oxilinks";
pub const CLIENT_PROPERTIES_DEVICE: &str = "oxilinks";

pub const LARGE_THRESHOLD: u16 = 50;

/// Activity type shown as "Competing in ...".
pub const ACTIVITY_COMPETING: u8 = 5;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOpcode {
    Dispatch = 0,
    Heartbeat = 1,
    Identify = 2,
    PresenceUpdate = 3,
    Resume = 6,
    Reconnect = 7,
    InvalidSession = 9,
    Hello = 10,
    HeartbeatAck = 11,
}

impl GatewayOpcode {
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            9 => Some(Self::InvalidSession),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl From<GatewayOpcode> for u8 {
    fn from(opcode: GatewayOpcode) -> Self {
        opcode.as_u8()
    }
}

/// Single gateway intent bit.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayIntent {
    /// Guild lifecycle events.
    Guilds = 1 << 0,
    /// Member joins and updates. Privileged.
    GuildMembers = 1 << 1,
    /// Presence updates. Privileged.
    GuildPresences = 1 << 8,
    /// Messages in guild channels.
    GuildMessages = 1 << 9,
    /// Messages in DMs.
    DirectMessages = 1 << 12,
    /// Message text. Privileged.
    MessageContent = 1 << 15,
}

impl GatewayIntent {
    /// Returns the intent bit.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

/// Set of gateway intents sent with Identify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatewayIntents(u32);

impl GatewayIntents {
    /// Returns an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Adds `intent`.
    #[must_use]
    pub const fn with(mut self, intent: GatewayIntent) -> Self {
        self.0 |= intent.as_u32();
        self
    }

    /// Returns whether `intent` is in the set.
    #[must_use]
    pub const fn has(self, intent: GatewayIntent) -> bool {
        (self.0 & intent.as_u32()) != 0
    }

    /// Returns the bitfield.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Intents needed to read message text in guilds and DMs.
    #[must_use]
    pub const fn bot() -> Self {
        Self::new()
            .with(GatewayIntent::Guilds)
            .with(GatewayIntent::GuildMessages)
            .with(GatewayIntent::DirectMessages)
            .with(GatewayIntent::MessageContent)
    }
}

impl From<GatewayIntents> for u32 {
    fn from(intents: GatewayIntents) -> Self {
        intents.as_u32()
    }
}
