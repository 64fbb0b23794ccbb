//! Digest credential file maintenance.
//!
//! The file holds one `user:realm:ha1` record per line, where `ha1` is the
//! RFC 2617 A1 hash (`md5(user:realm:password)` in lower-case hex). Updates
//! are all-or-nothing: the new contents are written to a sibling `.tmp` path
//! and renamed over the original, so a concurrent reader never observes a
//! partially written file. There is no writer-side locking; updates are
//! expected to come from the one-shot `-A` admin mode, not the running
//! daemon.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::auth::md5_hex;

#[derive(Debug, thiserror::Error)]
pub enum HtpasswdError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot rewrite {path}: {source}")]
    Rewrite {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// RFC 2617 A1 hash: `md5("user:realm:password")`, 32 lower-case hex chars.
/// This is the value a digest challenge evaluator consumes directly.
pub fn ha1(user: &str, realm: &str, password: &str) -> String {
    md5_hex([user, ":", realm, ":", password])
}

/// Split a credential line into its `(user, realm)` key. Lines without two
/// leading non-empty colon-delimited fields do not parse.
pub(crate) fn parse_user_realm(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.splitn(3, ':');
    let user = fields.next()?;
    let realm = fields.next()?;
    if user.is_empty() || realm.is_empty() {
        return None;
    }
    Some((user, realm))
}

/// Insert, replace, or remove the record for `(user, realm)` in `path`.
///
/// An empty `password` means removal. The file is created when missing.
/// Lines that do not parse as `user:realm:...` are dropped from the
/// rewritten file. This keeps the file canonical but eats comments, so
/// don't put any in there.
pub fn update(path: &Path, realm: &str, user: &str, password: &str) -> Result<(), HtpasswdError> {
    let remove = password.is_empty();
    let tmp_path = {
        let mut os = path.as_os_str().to_os_string();
        os.push(".tmp");
        PathBuf::from(os)
    };

    let open_err = |source| HtpasswdError::Open {
        path: path.to_owned(),
        source,
    };
    let rewrite_err = |source| HtpasswdError::Rewrite {
        path: tmp_path.clone(),
        source,
    };

    // Create the file when missing; an existing file is untouched.
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(open_err)?;

    let original = File::open(path).map_err(open_err)?;
    let tmp = File::create(&tmp_path).map_err(|source| HtpasswdError::Open {
        path: tmp_path.clone(),
        source,
    })?;

    let reader = BufReader::new(original);
    let mut writer = BufWriter::new(tmp);
    let mut found = false;

    for line in reader.lines() {
        let line = line.map_err(open_err)?;
        let line = line.trim_end_matches('\r');
        let Some((line_user, line_realm)) = parse_user_realm(line) else {
            continue;
        };
        if line_user == user && line_realm == realm {
            found = true;
            if !remove {
                writeln!(writer, "{}:{}:{}", user, realm, ha1(user, realm, password))
                    .map_err(rewrite_err)?;
            }
        } else {
            writeln!(writer, "{line}").map_err(rewrite_err)?;
        }
    }

    if !found && !remove {
        writeln!(writer, "{}:{}:{}", user, realm, ha1(user, realm, password))
            .map_err(rewrite_err)?;
    }

    writer.flush().map_err(rewrite_err)?;
    drop(writer);

    // Atomic replace: on POSIX, rename over the original in one step.
    std::fs::rename(&tmp_path, path).map_err(rewrite_err)
}
