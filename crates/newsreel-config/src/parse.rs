use std::collections::HashMap;
use std::str::FromStr;

use newsreel_nntp::{Encryption, NewsServer};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 119;
pub const DEFAULT_TLS_PORT: u16 = 563;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub fn parse_config(content: &str) -> Result<HashMap<String, String>, ConfigError> {
    let mut values: HashMap<String, String> = HashMap::new();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, raw_value) = line.split_once('=').ok_or(ConfigError::SyntaxError {
            line: line_num + 1,
            message: "expected Key=Value".into(),
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::SyntaxError {
                line: line_num + 1,
                message: "empty key".into(),
            });
        }
        let value = interpolate(raw_value.trim(), &values)?;
        values.insert(key.to_string(), value);
    }

    Ok(values)
}

/// Expands `${Name}` references to earlier keys and a leading `~`.
pub fn interpolate(value: &str, resolved: &HashMap<String, String>) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '~' && result.is_empty() {
            match dirs::home_dir() {
                Some(home) => result.push_str(&home.to_string_lossy()),
                None => result.push(ch),
            }
        } else if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let var_name: String = chars.by_ref().take_while(|&c| c != '}').collect();
            match resolved.get(&var_name) {
                Some(var_value) => result.push_str(var_value),
                None => return Err(ConfigError::UnknownVariable(var_name)),
            }
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Reads `Server1.*`, `Server2.*`, ... until the first id without a host.
pub fn extract_servers(raw: &HashMap<String, String>) -> Result<Vec<NewsServer>, ConfigError> {
    let mut servers = Vec::new();

    for id in 1u32.. {
        let prefix = format!("Server{id}.");
        let option = |name: &str| format!("{prefix}{name}");

        let host = match raw.get(&option("Host")) {
            Some(host) if !host.is_empty() => host.clone(),
            _ => break,
        };

        let encryption = if parse_bool(raw, &option("Encryption"), false)? {
            Encryption::Tls
        } else {
            Encryption::None
        };
        let default_port = match encryption {
            Encryption::Tls => DEFAULT_TLS_PORT,
            Encryption::None => DEFAULT_PORT,
        };

        servers.push(NewsServer {
            id,
            name: raw
                .get(&option("Name"))
                .cloned()
                .unwrap_or_else(|| host.clone()),
            host,
            port: parse_number(raw, &option("Port"), default_port)?,
            username: non_empty(raw.get(&option("Username"))),
            password: non_empty(raw.get(&option("Password"))),
            encryption,
            timeout: parse_number(raw, &option("Timeout"), DEFAULT_TIMEOUT_SECS)?,
        });
    }

    Ok(servers)
}

pub fn parse_bool(
    raw: &HashMap<String, String>,
    option: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match raw.get(option).map(|s| s.to_lowercase()).as_deref() {
        None | Some("") => Ok(default),
        Some("yes" | "true" | "1") => Ok(true),
        Some("no" | "false" | "0") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            option: option.to_string(),
            value: other.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(
    raw: &HashMap<String, String>,
    option: &str,
    default: T,
) -> Result<T, ConfigError> {
    match raw.get(option) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            option: option.to_string(),
            value: value.clone(),
        }),
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.is_empty()).cloned()
}
