use std::net::{IpAddr, Ipv4Addr};

use umpd::cli::Args;
use umpd::config::{parse_bind_spec, Config, FileConfig};

fn make_args(host: Option<String>, port: Option<u16>, webport: Option<String>) -> Args {
    Args {
        host,
        port,
        webport,
        user: None,
        config: None,
        htpasswd: None,
        help: None,
    }
}

#[test]
fn test_defaults_when_nothing_set() {
    let args = make_args(None, None, None);
    let config = Config::resolve(None, &args).unwrap();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 6600);
    assert_eq!(config.web_bind.port(), 8080);
    assert_eq!(config.web_bind.ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(config.realm, "umpd");
    assert!(config.htpasswd.is_none());
}

#[test]
fn test_cli_flag_overrides_default() {
    let args = make_args(Some("jukebox.local".into()), Some(6601), None);
    let config = Config::resolve(None, &args).unwrap();
    assert_eq!(config.host, "jukebox.local");
    assert_eq!(config.port, 6601);
}

#[test]
fn test_toml_overrides_default() {
    let file = FileConfig {
        webport: Some("127.0.0.1:9000".into()),
        ..Default::default()
    };
    let args = make_args(None, None, None);
    let config = Config::resolve(Some(file), &args).unwrap();
    assert_eq!(config.web_bind.to_string(), "127.0.0.1:9000");
}

#[test]
fn test_cli_overrides_toml() {
    let file = FileConfig {
        port: Some(7777),
        ..Default::default()
    };
    let args = make_args(None, Some(6601), None);
    let config = Config::resolve(Some(file), &args).unwrap();
    assert_eq!(config.port, 6601); // CLI wins
}

#[test]
fn test_toml_parse() {
    let toml_str = "port = 6601\nhtpasswd = \"/etc/umpd/htpasswd\"\nrealm = \"jukebox\"\n";
    let parsed: FileConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(parsed.port, Some(6601));
    assert_eq!(parsed.realm.as_deref(), Some("jukebox"));
    assert!(parsed.htpasswd.is_some());
}

#[test]
fn test_toml_unknown_fields_ignored() {
    // Future keys must not break parsing
    let toml_str = "port = 6601\nunknown_future_key = true\n";
    let parsed: Result<FileConfig, _> = toml::from_str(toml_str);
    assert!(parsed.is_ok());
}

// ── webport spec parsing ─────────────────────────────────────────────────────

#[test]
fn bare_port_binds_all_interfaces() {
    let addr = parse_bind_spec("8080").unwrap();
    assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    assert_eq!(addr.port(), 8080);
}

#[test]
fn ip_and_port_bind_one_interface() {
    let addr = parse_bind_spec("192.168.1.5:8200").unwrap();
    assert_eq!(addr.to_string(), "192.168.1.5:8200");
}

#[test]
fn garbage_specs_are_rejected() {
    for spec in ["", "not-a-port", "localhost:8080", "1.2.3.4:", "1.2.3.4:99999"] {
        assert!(parse_bind_spec(spec).is_err(), "expected rejection: {spec:?}");
    }
}
