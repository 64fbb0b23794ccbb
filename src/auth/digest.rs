//! HTTP Digest challenge construction and response verification (RFC 2617).

use std::io::BufRead;

use crate::auth::htpasswd::parse_user_realm;
use crate::auth::md5_hex;

/// Build the `WWW-Authenticate` value for a 401. Each challenge carries a
/// fresh random nonce.
pub fn challenge(realm: &str) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("Digest realm=\"{realm}\", qop=\"auth\", nonce=\"{nonce}\"")
}

/// The parsed fields of an `Authorization: Digest ...` header.
#[derive(Debug, Default)]
struct DigestResponse {
    username: String,
    nonce: String,
    uri: String,
    response: String,
    qop: Option<String>,
    nc: Option<String>,
    cnonce: Option<String>,
}

impl DigestResponse {
    fn parse(header: &str) -> Option<Self> {
        let params = header
            .strip_prefix("Digest ")
            .or_else(|| header.strip_prefix("digest "))?;

        let mut parsed = DigestResponse::default();
        for param in split_outside_quotes(params) {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_string();
            match key.trim() {
                "username" => parsed.username = value,
                "nonce" => parsed.nonce = value,
                "uri" => parsed.uri = value,
                "response" => parsed.response = value,
                "qop" => parsed.qop = Some(value),
                "nc" => parsed.nc = Some(value),
                "cnonce" => parsed.cnonce = Some(value),
                _ => {}
            }
        }

        if parsed.username.is_empty()
            || parsed.nonce.is_empty()
            || parsed.uri.is_empty()
            || parsed.response.is_empty()
        {
            return None;
        }
        Some(parsed)
    }

    /// Check the client's response hash against a stored A1 value.
    fn matches(&self, ha1: &str, method: &str) -> bool {
        let ha2 = md5_hex([method, ":", &self.uri]);
        let expected = match (&self.qop, &self.nc, &self.cnonce) {
            (Some(qop), Some(nc), Some(cnonce)) => md5_hex([
                ha1,
                ":",
                &self.nonce,
                ":",
                nc,
                ":",
                cnonce,
                ":",
                qop,
                ":",
                &ha2,
            ]),
            _ => md5_hex([ha1, ":", &self.nonce, ":", &ha2]),
        };
        expected == self.response.to_ascii_lowercase()
    }
}

/// Split a parameter list on commas that sit outside quoted values.
fn split_outside_quotes(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in input.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(input[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(input[start..].trim());
    parts
}

/// Verify an `Authorization` header against the credential lines in
/// `credentials`. The header's uri must match the request target, the
/// username must have a record for `realm`, and the response hash must match
/// (with or without `qop=auth`).
pub fn verify<R: BufRead>(
    credentials: R,
    realm: &str,
    method: &str,
    uri: &str,
    header: &str,
) -> bool {
    let Some(parsed) = DigestResponse::parse(header) else {
        return false;
    };
    if parsed.uri != uri {
        return false;
    }

    for line in credentials.lines() {
        let Ok(line) = line else {
            return false;
        };
        let line = line.trim_end_matches('\r');
        let Some((user, line_realm)) = parse_user_realm(line) else {
            continue;
        };
        if user != parsed.username || line_realm != realm {
            continue;
        }
        // Third field is the stored A1 hash.
        let Some(ha1) = line.splitn(3, ':').nth(2) else {
            continue;
        };
        return parsed.matches(ha1, method);
    }
    false
}
