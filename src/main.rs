//!
//! content-suite binary
//! --------------------
//! Interactive terminal client for the Content Suite backend. Resolves the
//! configuration from the environment and flags, restores any persisted
//! session, then hands over to the shell.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use content_suite::cli::{run_repl, Command, Shell};
use content_suite::client::ApiClient;
use content_suite::config::ClientConfig;
use content_suite::identity::{FileSessionStore, SessionProvider};
use content_suite::routes::Route;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--session-file <path>] [--login <email> --password <p>]\n\nFlags:\n  --api <url>              Backend base URL (default: $CONTENT_SUITE_API_URL, $NEXT_PUBLIC_API_URL or http://localhost:8000)\n  --session-file <path>    Where the access token is kept (default: ~/.content-suite/session.json)\n  --login <email>          Sign in before the prompt opens\n  --password <p>           Password for --login\n  -h, --help               Show this help\n\nEnvironment:\n  RUST_LOG                        log filter (default: info)\n  CONTENT_SUITE_SESSION_TTL_SECS  token lifetime in seconds (default: 86400)"
    );
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    let _ = fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();

    let mut args: Vec<String> = env::args().collect();
    let program = args.remove(0);

    let mut api: Option<String> = None;
    let mut session_file: Option<String> = None;
    let mut login: Option<String> = None;
    let mut password: Option<String> = None;

    let mut i = 0;
    while i < args.len() {
        let needs_value = |flag: &str| {
            if i + 1 >= args.len() {
                eprintln!("{} requires a value", flag);
                print_usage(&program);
                std::process::exit(2);
            }
        };
        match args[i].as_str() {
            "--api" => { needs_value("--api"); api = Some(args[i + 1].clone()); i += 2; }
            "--session-file" => { needs_value("--session-file"); session_file = Some(args[i + 1].clone()); i += 2; }
            "--login" => { needs_value("--login"); login = Some(args[i + 1].clone()); i += 2; }
            "--password" => { needs_value("--password"); password = Some(args[i + 1].clone()); i += 2; }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            unk => {
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api.as_deref() {
        config = config.with_api_url(url)?;
    }
    if let Some(path) = session_file {
        config = config.with_session_path(path);
    }
    info!(target: "content_suite", "api={} session_file={}", config.api_url, config.session_path.display());

    let store = Arc::new(FileSessionStore::new(config.session_path.clone()));
    let session = SessionProvider::new(store, config.session_ttl);
    let client = ApiClient::new(config.api_url.clone(), session)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let mut shell = Shell::new(client);
    if let Some(email) = login {
        if password.is_none() {
            eprintln!("--login requires --password");
            std::process::exit(2);
        }
        match rt.block_on(shell.execute(Command::Login { email, password })) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("login failed: {}", e.message()),
        }
    } else {
        rt.block_on(shell.navigate(Route::Login));
    }

    run_repl(rt, shell)
}
