use std::path::Path;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use clap::Parser;

use umpd::{auth, cli, config, mpd, relay, web};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Runs for the whole daemon lifetime. The relay loop notices the flag on
/// its next bounded poll; a second Ctrl+C during that window force-exits.
async fn watch_for_shutdown() {
    loop {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
        if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
            eprintln!("\numpd: forced exit");
            std::process::exit(1);
        }
        tracing::info!("shutdown requested");
    }
}

/// One-shot `-A <file> <realm> <user> <password>` credential update.
fn run_admin(values: &[String]) -> ExitCode {
    let (file, realm, user, password) = (&values[0], &values[1], &values[2], &values[3]);
    match auth::htpasswd::update(Path::new(file), realm, user, password) {
        Ok(()) => {
            println!("{file} updated.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("failed to update {file}: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(unix)]
fn drop_privileges(user: &str) -> Result<(), String> {
    use std::ffi::CString;

    let name = CString::new(user).map_err(|_| format!("invalid user name: {user}"))?;
    // SAFETY: getpwnam returns a pointer into libc's static storage; uid and
    // gid are copied out before any other passwd call can run.
    unsafe {
        let pw = libc::getpwnam(name.as_ptr());
        if pw.is_null() {
            return Err(format!("unknown user: {user}"));
        }
        let (uid, gid) = ((*pw).pw_uid, (*pw).pw_gid);
        if libc::setgid(gid) != 0 {
            return Err(format!(
                "setgid({gid}) failed: {}",
                std::io::Error::last_os_error()
            ));
        }
        if libc::setuid(uid) != 0 {
            return Err(format!(
                "setuid({uid}) failed: {}",
                std::io::Error::last_os_error()
            ));
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn drop_privileges(_user: &str) -> Result<(), String> {
    Err("privilege drop is only supported on unix".to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::Args::parse();

    if let Some(values) = &args.htpasswd {
        return run_admin(values);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = match config::Config::resolve(file_config, &args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let listener = match tokio::net::TcpListener::bind(config.web_bind).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("error: failed to bind {}: {}", config.web_bind, e);
            return ExitCode::FAILURE;
        }
    };

    // Privileges drop last so the listen socket can claim a low port.
    if let Some(user) = &config.run_as_user {
        if let Err(e) = drop_privileges(user) {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
        tracing::info!("running as {}", user);
    }

    tracing::info!(
        "umpd on http://{} relaying to mpd at {}:{}",
        config.web_bind,
        config.host,
        config.port
    );
    if let Some(path) = &config.htpasswd {
        tracing::info!(
            "digest auth enabled (realm \"{}\", credentials {})",
            config.realm,
            path.display()
        );
    }

    let (event_tx, event_rx) = tokio::sync::mpsc::channel(1024);
    let state = web::state::AppState {
        events: event_tx,
        auth: config
            .htpasswd
            .as_ref()
            .map(|path| Arc::new(auth::AuthGate::new(path.clone(), config.realm.clone()))),
        next_conn_id: Arc::new(AtomicU64::new(1)),
    };
    let app = web::build_router(state);

    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let mut http_rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = http_rx.recv().await;
            })
            .await
            .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));
    });

    tokio::spawn(watch_for_shutdown());

    // The relay loop is the daemon's foreground; it returns once the
    // shutdown flag is up, with the bridge already disconnected.
    let mut bridge = mpd::MpdBridge::new(&config.host, config.port);
    relay::run(event_rx, &mut bridge, &SHUTTING_DOWN).await;

    // Bridge is down; now release the web layer.
    let _ = shutdown_tx.send(());
    tracing::info!("Goodbye.");
    ExitCode::SUCCESS
}
