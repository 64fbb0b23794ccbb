//! Request authorization against the digest credential file.

pub mod digest;
pub mod htpasswd;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use md5::{Digest, Md5};

/// MD5 over a sequence of string fragments, 32 lower-case hex chars.
pub(crate) fn md5_hex<'a, I>(fragments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Md5::new();
    for fragment in fragments {
        hasher.update(fragment.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Decides whether a request may pass, for one fixed realm backed by one
/// credential file. The file is opened fresh on every request, so admin-mode
/// edits take effect without a restart.
pub struct AuthGate {
    htpasswd: PathBuf,
    realm: String,
}

impl AuthGate {
    pub fn new(htpasswd: PathBuf, realm: String) -> Self {
        AuthGate { htpasswd, realm }
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// True when `authorization` carries a Digest response matching a stored
    /// credential. An absent header, or a credential file that cannot be
    /// opened, denies the request rather than failing the pipeline.
    pub fn authorize(&self, method: &str, uri: &str, authorization: Option<&str>) -> bool {
        let Some(header) = authorization else {
            return false;
        };
        let file = match File::open(&self.htpasswd) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!("cannot open {}: {}, denying", self.htpasswd.display(), e);
                return false;
            }
        };
        digest::verify(BufReader::new(file), &self.realm, method, uri, header)
    }

    /// A fresh `WWW-Authenticate` challenge value for a 401 response.
    pub fn challenge(&self) -> String {
        digest::challenge(&self.realm)
    }
}
