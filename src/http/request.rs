//! Request parsing.
//!
//! # Responsibilities
//! - Split the request line into method, target and version
//! - Collect headers up to the first blank line
//! - Expose the path and query string parts of the target
//!
//! # Design Decisions
//! - Header names keep their case as received
//! - Values are trimmed of leading spaces/tabs; the last duplicate wins
//! - The protocol version is recorded but never checked
//! - Lines without a `:` are ignored rather than rejected

use std::collections::BTreeMap;
use std::net::SocketAddr;

use thiserror::Error;

use crate::http::query::QueryParams;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,

    #[error("malformed request line")]
    MalformedRequestLine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Path plus optional `?query`.
    pub target: String,
    pub version: String,
    pub headers: BTreeMap<String, String>,
    pub peer: SocketAddr,
}

impl Request {
    pub fn parse(raw: &str, peer: SocketAddr) -> Result<Self, ParseError> {
        let mut lines = raw.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));

        let request_line = lines.next().filter(|l| !l.trim().is_empty()).ok_or(ParseError::Empty)?;
        let mut parts = request_line.split_whitespace();
        let method = parts.next().ok_or(ParseError::MalformedRequestLine)?;
        let target = parts.next().ok_or(ParseError::MalformedRequestLine)?;
        let version = parts.next().unwrap_or_default();

        let mut headers = BTreeMap::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(
                    name.to_string(),
                    value.trim_start_matches([' ', '\t']).to_string(),
                );
            }
        }

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
            headers,
            peer,
        })
    }

    /// Target without the query string.
    pub fn path(&self) -> &str {
        self.target.split_once('?').map_or(self.target.as_str(), |(path, _)| path)
    }

    /// Everything after the first `?`, or "".
    pub fn query_string(&self) -> &str {
        self.target.split_once('?').map_or("", |(_, query)| query)
    }

    pub fn query(&self) -> QueryParams {
        QueryParams::parse(self.query_string())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Method and target of a raw request, for logging before full parsing.
pub fn request_line_summary(raw: &str) -> (&str, &str) {
    let mut parts = raw.lines().next().unwrap_or_default().split_whitespace();
    (parts.next().unwrap_or("-"), parts.next().unwrap_or("-"))
}
