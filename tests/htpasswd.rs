use std::fs;
use std::path::Path;

use tempfile::tempdir;
use umpd::auth::htpasswd::{ha1, update};

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("credential file should be readable")
}

// ── record creation ───────────────────────────────────────────────────────────

#[test]
fn creates_file_and_first_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");

    update(&path, "music", "alice", "opensesame").unwrap();

    assert_eq!(
        read(&path),
        "alice:music:1b4aab2545cfe509e2d9cea46f6147bd\n"
    );
}

#[test]
fn hash_matches_rfc2617_a1() {
    // md5("admin:example.com:secret"), computed independently
    assert_eq!(
        ha1("admin", "example.com", "secret"),
        "6790be6bddb5a476d78662b749fe896f"
    );

    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    update(&path, "example.com", "admin", "secret").unwrap();
    assert_eq!(
        read(&path),
        "admin:example.com:6790be6bddb5a476d78662b749fe896f\n"
    );
}

#[test]
fn existing_file_contents_survive_creation_step() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    fs::write(&path, "carol:music:b556069584d2b76806de3099a2236a96\n").unwrap();

    update(&path, "music", "alice", "opensesame").unwrap();

    let contents = read(&path);
    assert!(contents.contains("carol:music:b556069584d2b76806de3099a2236a96"));
    assert!(contents.contains("alice:music:1b4aab2545cfe509e2d9cea46f6147bd"));
}

// ── idempotence & isolation ───────────────────────────────────────────────────

#[test]
fn repeated_update_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");

    update(&path, "music", "alice", "opensesame").unwrap();
    let first = read(&path);
    update(&path, "music", "alice", "opensesame").unwrap();
    let second = read(&path);

    assert_eq!(first, second);
    assert_eq!(second.lines().count(), 1);
}

#[test]
fn updating_one_record_leaves_others_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    update(&path, "music", "carol", "xyzzy").unwrap();
    update(&path, "music", "alice", "opensesame").unwrap();
    update(&path, "other", "alice", "opensesame").unwrap();
    let before = read(&path);

    update(&path, "music", "alice", "changed").unwrap();
    let after = read(&path);

    // carol's line and alice's other-realm line are byte-identical
    for line in before.lines() {
        if !line.starts_with("alice:music:") {
            assert!(after.contains(line), "expected untouched line {line:?}");
        }
    }
    // line order is preserved
    assert_eq!(
        before.lines().position(|l| l.starts_with("carol:music:")),
        after.lines().position(|l| l.starts_with("carol:music:")),
    );
    assert_eq!(after.lines().count(), 3);
}

#[test]
fn same_user_different_realm_is_a_distinct_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    update(&path, "music", "alice", "pw-a").unwrap();
    update(&path, "files", "alice", "pw-b").unwrap();

    update(&path, "music", "alice", "").unwrap();

    let contents = read(&path);
    assert!(!contents.contains("alice:music:"));
    assert!(contents.contains("alice:files:"));
}

// ── removal ──────────────────────────────────────────────────────────────────

#[test]
fn empty_password_removes_exactly_the_matching_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    update(&path, "music", "alice", "opensesame").unwrap();
    update(&path, "music", "carol", "xyzzy").unwrap();

    update(&path, "music", "alice", "").unwrap();

    assert_eq!(read(&path), "carol:music:b556069584d2b76806de3099a2236a96\n");
}

#[test]
fn removing_missing_user_leaves_wellformed_file_identical() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    update(&path, "music", "alice", "opensesame").unwrap();
    update(&path, "music", "carol", "xyzzy").unwrap();
    let before = read(&path);

    update(&path, "music", "nobody", "").unwrap();

    assert_eq!(read(&path), before);
}

// ── malformed lines ──────────────────────────────────────────────────────────

// Lines that do not parse as user:realm:... are dropped on rewrite rather
// than passed through. Deliberate fidelity to the historical behavior; a
// comment or blank line does not survive the next -A invocation.
#[test]
fn malformed_lines_are_dropped_on_rewrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    fs::write(
        &path,
        "# a comment\n\ncarol:music:b556069584d2b76806de3099a2236a96\nnocolonhere\n:empty:user\n",
    )
    .unwrap();

    update(&path, "music", "nobody", "").unwrap();

    assert_eq!(read(&path), "carol:music:b556069584d2b76806de3099a2236a96\n");
}

// ── failure atomicity ────────────────────────────────────────────────────────

#[test]
fn uncreatable_temp_file_fails_and_preserves_original() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");
    update(&path, "music", "alice", "opensesame").unwrap();
    let before = read(&path);

    // A directory squatting on the sibling .tmp path makes the temp file
    // impossible to create, regardless of who runs the test.
    fs::create_dir(dir.path().join("htpasswd.tmp")).unwrap();
    let result = update(&path, "music", "alice", "changed");

    assert!(result.is_err(), "update without a writable temp path must fail");
    assert_eq!(read(&path), before, "original file must be untouched");
}

// ── end to end ───────────────────────────────────────────────────────────────

#[test]
fn upsert_update_remove_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("htpasswd");

    update(&path, "r", "bob", "pw1").unwrap();
    assert_eq!(read(&path), "bob:r:1a6dd604f91209a4d3f5d8a8dad8b8a4\n");

    update(&path, "r", "bob", "pw2").unwrap();
    assert_eq!(read(&path), "bob:r:a0f7bd4d230cb1d73ad377a01cd6d9d0\n");

    update(&path, "r", "bob", "").unwrap();
    assert_eq!(read(&path), "");
}
