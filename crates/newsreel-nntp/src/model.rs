use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsServer {
    pub id: u32,
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub encryption: Encryption,
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encryption {
    None,
    Tls,
}

/// One parsed server reply.
///
/// Response codes are defined in [RFC 3977 §3.2](https://datatracker.ietf.org/doc/html/rfc3977#section-3.2).
/// `lines` is `Some` only when the reply came through the multi-line path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub message: String,
    pub lines: Option<Vec<String>>,
}

impl Response {
    pub fn into_lines(self) -> Vec<String> {
        self.lines.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub number: u64,
    pub message_id: String,
    pub headers: Vec<String>,
    pub body: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleHead {
    pub number: u64,
    pub message_id: String,
    pub headers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleStat {
    pub number: u64,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    pub name: String,
    pub count: u64,
    pub first: u64,
    pub last: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverviewField {
    pub name: String,
    pub full: bool,
}

/// Server declaration of the fields in each overview line
/// ([RFC 3977 §8.4](https://datatracker.ietf.org/doc/html/rfc3977#section-8.4)).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewFormat {
    fields: Vec<OverviewField>,
}

impl OverviewFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, replacing the flag of an existing field of the same name.
    pub fn push(&mut self, name: &str, full: bool) {
        let name = name.to_ascii_lowercase();
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => field.full = full,
            None => self.fields.push(OverviewField { name, full }),
        }
    }

    /// Copy of this format led by a short `number` field, matching the
    /// article number that starts every overview line
    /// ([RFC 3977 §8.3](https://datatracker.ietf.org/doc/html/rfc3977#section-8.3)).
    pub fn numbered(&self) -> Self {
        let mut fields = vec![OverviewField {
            name: "number".to_string(),
            full: false,
        }];
        fields.extend(self.fields.iter().filter(|f| f.name != "number").cloned());
        Self { fields }
    }

    pub fn is_full(&self, name: &str) -> Option<bool> {
        let name = name.to_ascii_lowercase();
        self.fields.iter().find(|f| f.name == name).map(|f| f.full)
    }

    pub fn fields(&self) -> &[OverviewField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, bool)> for OverviewFormat {
    fn from_iter<I: IntoIterator<Item = (S, bool)>>(iter: I) -> Self {
        let mut format = OverviewFormat::new();
        for (name, full) in iter {
            format.push(name.as_ref(), full);
        }
        format
    }
}

/// Field values of one overview line, in format order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewRow {
    fields: Vec<(String, String)>,
}

impl OverviewRow {
    pub fn insert(&mut self, name: String, value: String) {
        self.fields.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
