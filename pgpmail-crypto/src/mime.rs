//! Top-level split of a decrypted MIME entity.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use pgpmail_openpgp::Verification;

/// Header fields of one MIME entity, in the order they appeared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    /// Parses a header block. Folded lines are unfolded and lines without
    /// a colon are dropped. Parsing stops at the first empty line.
    pub fn parse(text: &str) -> Self {
        let mut fields: Vec<(String, String)> = Vec::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = fields.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                fields.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        Self { fields }
    }

    /// First value of `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
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

/// A `Content-Type` value: lowercased type and subtype plus parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentType {
    pub main_type: String,
    pub sub_type: String,
    /// Parameter names are lowercased; quoted values are unquoted.
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// The type assumed when an entity has no usable `Content-Type`.
    pub fn text_plain() -> Self {
        Self {
            main_type: "text".to_string(),
            sub_type: "plain".to_string(),
            parameters: HashMap::from([("charset".to_string(), "us-ascii".to_string())]),
        }
    }

    /// Parses `type/subtype; name=value; ...`. Returns `None` when the
    /// type or subtype is missing.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(';');
        let (main_type, sub_type) = parts.next()?.trim().split_once('/')?;
        let (main_type, sub_type) = (main_type.trim(), sub_type.trim());
        if main_type.is_empty() || sub_type.is_empty() {
            return None;
        }

        let parameters = parts
            .filter_map(|param| param.split_once('='))
            .map(|(name, value)| {
                (
                    name.trim().to_ascii_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                )
            })
            .collect();

        Some(Self {
            main_type: main_type.to_ascii_lowercase(),
            sub_type: sub_type.to_ascii_lowercase(),
            parameters,
        })
    }

    /// `type/subtype` without parameters.
    pub fn mime_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)
    }
}

/// A decrypted PGP/MIME body: the entity's header fields and raw body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimeDecryption {
    headers: Headers,
    body: String,
    verification: Verification,
}

impl MimeDecryption {
    /// Splits `entity` at its first empty line, whether that line ends in
    /// CRLF or LF. Text without a header block is all body.
    pub fn parse(entity: &str, verification: Verification) -> Self {
        let (head, body) = split_entity(entity);
        Self {
            headers: Headers::parse(head),
            body: body.to_string(),
            verification,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Parsed `Content-Type`, falling back to `text/plain`.
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("Content-Type")
            .and_then(ContentType::parse)
            .unwrap_or_else(ContentType::text_plain)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn verification(&self) -> Verification {
        self.verification
    }

    pub fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.verification.signed_at()
    }
}

fn split_entity(entity: &str) -> (&str, &str) {
    let first_line = entity.lines().next().unwrap_or_default();
    let looks_like_header = first_line
        .split_once(':')
        .is_some_and(|(name, _)| !name.is_empty() && !name.contains(char::is_whitespace));
    if !looks_like_header {
        return ("", entity);
    }

    let mut offset = 0;
    for line in entity.split_inclusive('\n') {
        if line.trim_end_matches('\n').trim_end_matches('\r').is_empty() {
            let head = entity[..offset].trim_end_matches(['\r', '\n']);
            return (head, &entity[offset + line.len()..]);
        }
        offset += line.len();
    }
    (entity, "")
}
