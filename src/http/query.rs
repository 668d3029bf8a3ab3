//! Query string decoding.
//!
//! `key=value` pairs are split on `&`; pairs without `=` are skipped. Keys and
//! values are percent-decoded (`%XX` → byte, `+` → space) and the bytes read
//! as UTF-8, lossily. On duplicate keys the last occurrence wins.

use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid integer for '{name}': {value:?}")]
pub struct InvalidParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: HashMap<String, String>,
}

impl QueryParams {
    pub fn parse(query_string: &str) -> Self {
        let mut params = HashMap::new();
        for pair in query_string.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            params.insert(percent_decode(key), percent_decode(value));
        }
        Self { params }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Integer parameter. Absent or empty values are `Ok(None)`.
    pub fn get_int(&self, name: &str) -> Result<Option<i64>, InvalidParam> {
        match self.get(name) {
            None | Some("") => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| InvalidParam {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Decode `%XX` escapes and `+`. A `%` not followed by two hex digits is kept
/// as-is.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push((hi << 4) | lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b'+' => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_escapes_and_plus() {
        assert_eq!(percent_decode("Apple+Watch"), "Apple Watch");
        assert_eq!(percent_decode("a%20b%2Bc"), "a b+c");
        assert_eq!(percent_decode("%E6%89%8B%E6%9C%BA"), "手机");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%4"), "%4");
    }

    #[test]
    fn parses_pairs_last_wins() {
        let params = QueryParams::parse("q=first&limit=5&flag&q=second&offset=");
        assert_eq!(params.get("q"), Some("second"));
        assert_eq!(params.get("flag"), None);
        assert_eq!(params.get_int("limit"), Ok(Some(5)));
        assert_eq!(params.get_int("offset"), Ok(None));
        assert_eq!(params.get_int("missing"), Ok(None));
        assert_eq!(params.get("offset"), Some(""));
    }

    #[test]
    fn rejects_non_integers() {
        let params = QueryParams::parse("limit=abc&offset=-3");
        assert_eq!(
            params.get_int("limit"),
            Err(InvalidParam { name: "limit".into(), value: "abc".into() })
        );
        assert_eq!(params.get_int("offset"), Ok(Some(-3)));
    }

    #[test]
    fn empty_query_string() {
        let params = QueryParams::parse("");
        assert_eq!(params.get(""), None);
        assert_eq!(params.get_int("limit"), Ok(None));
    }
}
