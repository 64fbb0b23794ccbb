use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "umpd",
    about = "Minimal web client for MPD — serve a browser UI and relay it to your music daemon",
    long_about = None,
    version = env!("GIT_VERSION"),
    disable_help_flag = true,
)]
pub struct Args {
    /// Connect to MPD at this host [default: 127.0.0.1]
    #[arg(short = 'h', long)]
    pub host: Option<String>,

    /// Connect to MPD at this port [default: 6600]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Web server listen spec, "[ip:]port" [default: 8080]
    #[arg(short, long, value_name = "[IP:]PORT")]
    pub webport: Option<String>,

    /// Drop privileges to this user after the listen socket is bound
    #[arg(short, long)]
    pub user: Option<String>,

    /// Path to TOML config file (overrides default search: ./umpd.toml, ~/.config/umpd/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Update FILE, setting USER's digest credentials for REALM; an empty
    /// PASSWORD removes the record
    #[arg(
        short = 'A',
        long = "htpasswd",
        num_args = 4,
        value_names = ["FILE", "REALM", "USER", "PASSWORD"]
    )]
    pub htpasswd: Option<Vec<String>>,

    /// Print help (-h connects to a host instead)
    #[arg(long, action = clap::ArgAction::Help)]
    pub help: Option<bool>,
}
