// Hostname-based environment detection: which base URL / relay strategy
// reaches the Screeps API from a given hosting environment. The mapping is
// pure; only the manual override touches storage.

use serde::{Deserialize, Serialize};

use crate::credentials::{KEY_ENVIRONMENT_OVERRIDE, Storage};

/// Canonical Screeps API base.
pub const DIRECT_API_URL: &str = "https://screeps.com/api";

/// Local forwarding process used during development.
pub const LOCAL_RELAY_URL: &str = "http://127.0.0.1:3080/relay";

/// Public third-party forwarder used from static hosting.
pub const PUBLIC_FORWARDER_URL: &str = "https://api.allorigins.win/raw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvironmentClass {
    Local,
    ManagedHosting,
    StaticHosting,
    Direct,
}

impl EnvironmentClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::ManagedHosting => "managedHosting",
            Self::StaticHosting => "staticHosting",
            Self::Direct => "direct",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "managedHosting" => Some(Self::ManagedHosting),
            "staticHosting" => Some(Self::StaticHosting),
            "direct" => Some(Self::Direct),
            _ => None,
        }
    }
}

/// How requests reach the API from this environment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum RelayStrategy {
    /// Straight to the configured base URL.
    Direct,
    /// Through a local forwarding process; target selected by `path` query.
    LocalRelay { relay_url: String },
    /// Through the serverless function co-located with the hosting platform.
    ServerlessRelay { relay_url: String },
    /// Through a public forwarder that takes the absolute target URL.
    PublicRelay { forward_url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentConfig {
    pub class: EnvironmentClass,
    pub relay: RelayStrategy,
}

/// Maps a hostname to its environment. Unrecognized hostnames fall through
/// to the direct-connection default; there is no error path.
pub fn classify(hostname: &str) -> EnvironmentConfig {
    let class = match hostname {
        "localhost" | "127.0.0.1" | "::1" | "[::1]" => EnvironmentClass::Local,
        h if h.ends_with(".vercel.app") || h.ends_with(".netlify.app") => {
            EnvironmentClass::ManagedHosting
        }
        h if h.ends_with(".github.io") => EnvironmentClass::StaticHosting,
        _ => EnvironmentClass::Direct,
    };
    for_class(class, hostname)
}

/// Like [`classify`], but a persisted manual override wins.
pub fn resolve(hostname: &str, storage: &dyn Storage) -> EnvironmentConfig {
    if let Some(class) = storage
        .get(KEY_ENVIRONMENT_OVERRIDE)
        .as_deref()
        .and_then(EnvironmentClass::parse)
    {
        return for_class(class, hostname);
    }
    classify(hostname)
}

/// Persists a manual override for future sessions.
pub fn set_override(class: EnvironmentClass, storage: &mut dyn Storage) -> anyhow::Result<()> {
    storage.set(KEY_ENVIRONMENT_OVERRIDE, class.as_str())
}

fn for_class(class: EnvironmentClass, hostname: &str) -> EnvironmentConfig {
    let relay = match class {
        EnvironmentClass::Local => RelayStrategy::LocalRelay {
            relay_url: LOCAL_RELAY_URL.to_string(),
        },
        EnvironmentClass::ManagedHosting => RelayStrategy::ServerlessRelay {
            relay_url: format!("https://{hostname}/api/relay"),
        },
        EnvironmentClass::StaticHosting => RelayStrategy::PublicRelay {
            forward_url: PUBLIC_FORWARDER_URL.to_string(),
        },
        EnvironmentClass::Direct => RelayStrategy::Direct,
    };
    EnvironmentConfig { class, relay }
}
