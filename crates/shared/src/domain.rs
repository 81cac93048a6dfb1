use std::{fmt, str::FromStr};

use url::Url;

use crate::error::EndpointError;

/// Port the EMM/SolsTiS web interface serves its WebSocket pages on.
pub const DEFAULT_CONTROLLER_PORT: u16 = 8088;
pub const CONTROL_PATH: &str = "control.htm";
pub const NETWORK_PATH: &str = "network.htm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Ws,
    Wss,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }
}

impl FromStr for Scheme {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ws" => Ok(Self::Ws),
            "wss" => Ok(Self::Wss),
            other => Err(EndpointError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Address of a controller page. Validated once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEndpoint {
    url: Url,
}

impl ConnectionEndpoint {
    pub fn new(scheme: Scheme, host: &str, port: u16, path: &str) -> Result<Self, EndpointError> {
        let host = host.trim();
        if host.is_empty() {
            return Err(EndpointError::EmptyHost);
        }
        let path = path.trim().trim_start_matches('/');
        // IPv6 literals need brackets in the authority; accept them either way.
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        Self::parse(&format!("{}://{host}:{port}/{path}", scheme.as_str()))
    }

    /// `ws://<host>:8088/control.htm`, the page that accepts tuning commands.
    pub fn control(host: &str) -> Result<Self, EndpointError> {
        Self::new(Scheme::Ws, host, DEFAULT_CONTROLLER_PORT, CONTROL_PATH)
    }

    /// `ws://<host>:8088/network.htm`, the page holding network device settings.
    pub fn network(host: &str) -> Result<Self, EndpointError> {
        Self::new(Scheme::Ws, host, DEFAULT_CONTROLLER_PORT, NETWORK_PATH)
    }

    fn parse(raw: &str) -> Result<Self, EndpointError> {
        let url = Url::parse(raw).map_err(|err| EndpointError::InvalidUrl {
            url: raw.to_string(),
            reason: err.to_string(),
        })?;
        Scheme::from_str(url.scheme())?;
        if url.host_str().map_or(true, str::is_empty) {
            return Err(EndpointError::EmptyHost);
        }
        Ok(Self { url })
    }

    pub fn scheme(&self) -> Scheme {
        if self.url.scheme() == "wss" {
            Scheme::Wss
        } else {
            Scheme::Ws
        }
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> u16 {
        self.url
            .port_or_known_default()
            .unwrap_or(DEFAULT_CONTROLLER_PORT)
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl FromStr for ConnectionEndpoint {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.trim())
    }
}

impl fmt::Display for ConnectionEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

#[cfg(test)]
#[path = "tests/domain_tests.rs"]
mod tests;
