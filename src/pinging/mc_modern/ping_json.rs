use serde::{Deserialize, Serialize};

pub const UNKNOWN_VERSION: &str = "Unknown";
pub const DEFAULT_MOTD: &str = "A Minecraft Server";


#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PingVersion {
    pub name: Option<String>,
    pub protocol: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlayerSample {
    pub name: String,
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct PingPlayerInfo {
    #[serde(default)]
    pub max: u32,
    #[serde(default)]
    pub online: u32,
    #[serde(default)]
    pub sample: Vec<PlayerSample>,
}

/// The `description` field, either a bare string or a chat component.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Motd {
    Plain(String),
    Component {
        #[serde(default)]
        text: String,
        #[serde(default)]
        extra: Vec<Motd>,
    },
}

impl Motd {
    /// Resolves a raw `description` value, giving `None` for shapes that are
    /// neither a string nor a chat component.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Concatenates the component tree into plain text, in order.
    pub fn flatten(&self) -> String {
        let mut out = String::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(&self, out: &mut String) {
        match self {
            Motd::Plain(text) => out.push_str(text),
            Motd::Component { text, extra } => {
                out.push_str(text);
                for part in extra {
                    part.flatten_into(out);
                }
            }
        }
    }
}

/// Flattens a raw `description`, falling back to [`DEFAULT_MOTD`].
pub fn flatten_description(description: Option<serde_json::Value>) -> String {
    description
        .and_then(Motd::from_value)
        .map(|motd| motd.flatten())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| DEFAULT_MOTD.to_string())
}

#[derive(Deserialize, Debug)]
pub struct PingResponse {
    #[serde(default)]
    pub version: PingVersion,
    #[serde(default)]
    pub players: PingPlayerInfo,
    #[serde(default)]
    pub description: Option<serde_json::Value>,
    pub favicon: Option<String>,
}

/// The outcome of one status ping.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct StatusResult {
    pub online: bool,
    pub players_online: u32,
    pub players_max: u32,
    pub version: Option<String>,
    pub protocol: Option<i32>,
    pub motd: Option<String>,
    pub favicon: Option<String>,
    pub sample: Vec<PlayerSample>,
    pub latency_ms: u32,
}

impl StatusResult {
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn from_response(response: PingResponse, latency_ms: u32) -> Self {
        Self {
            online: true,
            players_online: response.players.online,
            players_max: response.players.max,
            version: Some(
                response
                    .version
                    .name
                    .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            ),
            protocol: response.version.protocol,
            motd: Some(flatten_description(response.description)),
            favicon: response.favicon,
            sample: response.players.sample,
            latency_ms,
        }
    }
}
