// ABOUTME: Deployment host address parsing.
// ABOUTME: Parses formats like "host", "user@host", "host:port", "user@host:port".

/// Where to connect, as written in the `host` option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: Option<u16>,
    pub user: Option<String>,
}

impl ServerAddress {
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("host cannot be empty".to_string());
        }

        let (user, rest) = match s.split_once('@') {
            Some(("", _)) => return Err("user before '@' cannot be empty".to_string()),
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, s),
        };

        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port_str)) => {
                let port = port_str
                    .parse::<u16>()
                    .map_err(|_| format!("invalid port: {}", port_str))?;
                (host, Some(port))
            }
            None => (rest, None),
        };

        if host.is_empty() {
            return Err("hostname cannot be empty".to_string());
        }

        Ok(ServerAddress {
            host: host.to_string(),
            port,
            user,
        })
    }
}
