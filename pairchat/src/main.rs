//! `PairChat` — two-party chat client over a document change feed.
//!
//! Signs in against the user collection, opens a conversation with one
//! peer, and renders it in a terminal UI fed by the conversation engine's
//! render instructions. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/pairchat/config.toml`).
//!
//! ```bash
//! # Self-contained demo with a scripted peer
//! cargo run --bin pairchat -- --demo
//!
//! # Sign in against a persisted store and chat with a specific peer
//! cargo run --bin pairchat -- --store-file ~/.local/share/pairchat/store.bin \
//!     --email ada@example.com --password "correct horse" --peer <user-id>
//! ```

use std::io;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use uuid::Uuid;

use pairchat::app::App;
use pairchat::auth::{self, NewUser};
use pairchat::compose::Composer;
use pairchat::config::{CliArgs, ClientConfig};
use pairchat::convo::{ConversationEvent, ConversationHandle};
use pairchat::directory;
use pairchat::notify::{self, StaticProvider};
use pairchat::session::{Session, SessionStore};
use pairchat::ui;
use pairchat_proto::change::Filter;
use pairchat_proto::document::UserId;
use pairchat_proto::user::UserProfile;
use pairchat_store::{MemoryStore, persist};

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Initialize logging before terminal setup (logs go to file, not stdout).
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("pairchat starting");

    // Open the document store, restoring a snapshot when configured.
    let store = match config.snapshot_path.as_deref() {
        Some(path) => persist::load(path, config.subscription_buffer).map_err(io::Error::other)?,
        None => MemoryStore::with_subscription_capacity(config.subscription_buffer),
    };

    let session_store = SessionStore::new(match SessionStore::default_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Warning: no config directory, session will not persist: {e}");
            std::env::temp_dir().join("pairchat-session.toml")
        }
    });

    let Some(session) = resolve_session(&cli, &store, &session_store) else {
        eprintln!("Not signed in.");
        eprintln!("Provide --email and --password, or run with --demo.");
        return Ok(());
    };

    // Register a push token for this device. Chatting works without one,
    // so failure is only logged.
    let token_provider = StaticProvider::new(format!("term-{}", Uuid::now_v7()));
    if let Err(e) = notify::register(&store, &token_provider, &session.user_id) {
        tracing::warn!(error = %e, "push token registration failed");
    }

    let Some(peer) = resolve_peer(&cli, &store, &session.user_id) else {
        eprintln!("No peer available to chat with.");
        eprintln!("Sign up another user against the same store, or run with --demo.");
        return Ok(());
    };

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app.
    let result = run_app(&mut terminal, &config, &store, &session, &peer, cli.demo).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Persist the store when a snapshot path is configured.
    if let Some(path) = config.snapshot_path.as_deref()
        && let Err(e) = persist::save(&store, path)
    {
        eprintln!("Warning: failed to save store snapshot: {e}");
    }

    tracing::info!("pairchat exiting");
    result
}

/// Initialize file-based logging.
///
/// Logs are written to a file (never stdout, since ratatui owns the
/// terminal). Returns a [`WorkerGuard`] that must be held until shutdown
/// to ensure all buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("pairchat.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Work out who is signed in: demo identity, explicit credentials, or the
/// persisted session from a previous run.
fn resolve_session(
    cli: &CliArgs,
    store: &MemoryStore,
    session_store: &SessionStore,
) -> Option<Session> {
    if cli.demo {
        return ensure_demo_users(store);
    }

    if let (Some(email), Some(password)) = (cli.email.as_deref(), cli.password.as_deref()) {
        match auth::sign_in(store, email, password) {
            Ok(session) => {
                if let Err(e) = session_store.save(&session) {
                    tracing::warn!(error = %e, "could not persist session");
                }
                return Some(session);
            }
            Err(e) => {
                eprintln!("Sign-in failed: {e}");
                return None;
            }
        }
    }

    match session_store.load() {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(error = %e, "could not load persisted session");
            None
        }
    }
}

/// Seed the demo accounts (idempotently) and return Ada's session.
fn ensure_demo_users(store: &MemoryStore) -> Option<Session> {
    let ada = NewUser {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@demo.chat".to_string(),
        password: "demo-password".to_string(),
        avatar: None,
    };
    let grace = NewUser {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: "grace@demo.chat".to_string(),
        password: "demo-password".to_string(),
        avatar: None,
    };
    let _ = auth::sign_up(store, grace);
    match auth::sign_up(store, ada) {
        Ok(session) => Some(session),
        // Already seeded (persisted store): fall back to signing in.
        Err(_) => auth::sign_in(store, "ada@demo.chat", "demo-password").ok(),
    }
}

/// Pick the conversation peer: `--peer <id>` or the first directory entry.
fn resolve_peer(cli: &CliArgs, store: &MemoryStore, me: &UserId) -> Option<UserProfile> {
    if let Some(id) = cli.peer.as_deref() {
        return directory::find_peer(store, &UserId::new(id));
    }
    directory::list_peers(store, me).into_iter().next()
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
    store: &MemoryStore,
    session: &Session,
    peer: &UserProfile,
    demo: bool,
) -> io::Result<()> {
    let (handle, mut events) =
        ConversationHandle::open(store, &session.user_id, &peer.id, config.event_buffer)
            .map_err(io::Error::other)?;
    let composer = Composer::new(store.clone(), session.user_id.clone());

    let demo_task = if demo {
        spawn_demo_peer(store, peer, &session.user_id)
    } else {
        None
    };

    let mut app = App::new(
        session.user_id.clone(),
        session.display_name(),
        peer.display_name(),
        config.timestamp_format.clone(),
    );

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending conversation events (non-blocking).
        drain_conversation_events(&mut app, &mut events);

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(body) = app.handle_key_event(key)
                && let Err(e) = composer.send(&peer.id, &body)
            {
                app.push_notice(format!("Send failed: {e}"));
            }
        }

        if app.should_quit {
            break;
        }
    }

    handle.close().await;
    if let Some(task) = demo_task {
        task.abort();
    }
    Ok(())
}

/// Drain pending conversation events and apply them to the view.
///
/// Render instructions update the list; channel failures become transient
/// notices — the conversation keeps running on the surviving channel.
fn drain_conversation_events(app: &mut App, rx: &mut mpsc::Receiver<ConversationEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            ConversationEvent::Render(instruction) => app.apply_render(instruction),
            ConversationEvent::ChannelFailed { channel, reason } => {
                app.push_notice(format!("{channel} channel failed: {reason}"));
            }
        }
    }
}

/// Spawn a scripted peer that answers each message after a short delay.
///
/// The peer watches the local-to-peer query exactly like a second client
/// would, skips the historical snapshot, and replies to incremental
/// arrivals through its own composer.
fn spawn_demo_peer(
    store: &MemoryStore,
    peer: &UserProfile,
    local: &UserId,
) -> Option<tokio::task::JoinHandle<()>> {
    let sub = store.subscribe(Filter::direction(local, &peer.id)).ok()?;
    let composer = Composer::new(store.clone(), peer.id.clone());
    let local = local.clone();

    Some(tokio::spawn(async move {
        let mut rx = sub.rx;
        let replies = [
            "Hey! Good to hear from you.",
            "The change feed delivered that instantly.",
            "Tell me more.",
            "Sounds good to me.",
        ];
        let mut saw_snapshot = false;
        let mut next = 0;
        while let Some(batch) = rx.recv().await {
            if !saw_snapshot {
                saw_snapshot = true;
                continue;
            }
            if batch.is_empty() {
                continue;
            }
            tokio::time::sleep(Duration::from_millis(600)).await;
            let reply = replies[next % replies.len()];
            next += 1;
            if composer.send(&local, reply).is_err() {
                break;
            }
        }
    }))
}
