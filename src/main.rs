//! Movie Code Bot - Console Harness
//!
//! Drives the full bot core (wizard, gate, delivery, ratings, broadcast)
//! against an in-memory store and a transport that prints to stdout instead
//! of talking to a messaging network. Useful for exercising flows end to
//! end without credentials.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use movie_code_bot::broadcast::BroadcastDispatcher;
use movie_code_bot::catalog::{CatalogStore, FileRef, MemoryStore};
use movie_code_bot::config::BotConfig;
use movie_code_bot::delivery::{ContentDelivery, DeliveryOutcome};
use movie_code_bot::format;
use movie_code_bot::gate::SubscriptionGate;
use movie_code_bot::rating;
use movie_code_bot::transport::{
    Button, ButtonAction, ChatRef, Keyboard, MembershipStatus, MessageRef, Transport,
    TransportError,
};
use movie_code_bot::wizard::{IntakeWizard, StepOutcome, WizardInput, WizardStep};

/// Offline console harness for the movie code bot.
#[derive(Parser, Debug)]
#[command(name = "movie_code_bot")]
#[command(about = "Exercise the movie-code bot core from a console session")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// JSON snapshot file to load on start and save on exit.
    #[arg(short, long)]
    snapshot: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let config = BotConfig::from_env().unwrap_or_else(|e| {
        debug!("Falling back to default configuration: {}", e);
        BotConfig {
            admin_id: 1,
            ..BotConfig::default()
        }
    });

    let store = match &args.snapshot {
        Some(path) => Arc::new(MemoryStore::load(path)),
        None => Arc::new(MemoryStore::new()),
    };
    let transport = Arc::new(ConsoleTransport::default());

    info!(
        "Harness ready (admin {}, {} catalog entries)",
        config.admin_id,
        store.entry_count().await?
    );

    let gate = Arc::new(SubscriptionGate::new(store.clone(), transport.clone()));
    let wizard = IntakeWizard::new(store.clone(), transport.clone(), &config);
    let delivery = ContentDelivery::new(store.clone(), transport.clone(), gate.clone());
    let dispatcher = BroadcastDispatcher::new(
        store.clone(),
        transport.clone(),
        config.broadcast_delay(),
    );

    let session = Session {
        config,
        store,
        transport,
        gate,
        wizard,
        delivery,
        dispatcher,
        actor_id: 0,
    };
    run_repl(session, args.snapshot.as_deref()).await
}

fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Everything one console session holds.
struct Session {
    config: BotConfig,
    store: Arc<MemoryStore>,
    transport: Arc<ConsoleTransport>,
    gate: Arc<SubscriptionGate>,
    wizard: IntakeWizard,
    delivery: ContentDelivery,
    dispatcher: BroadcastDispatcher,
    /// The actor the next command acts as; switched with `actor <id>`.
    actor_id: i64,
}

async fn run_repl(mut session: Session, snapshot: Option<&str>) -> Result<()> {
    session.actor_id = session.config.admin_id;

    println!("movie_code_bot console harness. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout
            .write_all(format!("[actor {}]> ", session.actor_id).as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        session
            .store
            .upsert_actor(session.actor_id, None, None)
            .await?;

        // A live wizard run captures every line as step input.
        if session.wizard.is_active(session.actor_id).await && line != "cancel" {
            handle_wizard_input(&session, line).await?;
            continue;
        }

        if let Err(e) = dispatch(&mut session, line).await {
            println!("error: {e:#}");
        }
    }

    if let Some(path) = snapshot {
        session
            .store
            .save(path)
            .await
            .context("Failed to save catalog snapshot")?;
        info!("Snapshot saved to {}", path);
    }
    Ok(())
}

async fn dispatch(session: &mut Session, line: &str) -> Result<()> {
    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let rest: Vec<&str> = parts.collect();

    match command {
        "help" => print_help(),
        "actor" => {
            let id: i64 = parse_arg(rest.first(), "actor <id>")?;
            session.actor_id = id;
        }
        "add" => {
            require_admin(session)?;
            let step = session.wizard.start(session.actor_id).await;
            println!("[1/{}] {}", WizardStep::COUNT, step.prompt());
        }
        "cancel" => {
            session.wizard.cancel(session.actor_id).await;
            println!("Wizard cancelled.");
        }
        "get" => {
            let code: i64 = parse_arg(rest.first(), "get <code>")?;
            let outcome = session.delivery.deliver(session.actor_id, code).await?;
            print_delivery(session, outcome).await;
        }
        "start" => {
            let param = rest.first().copied().unwrap_or_default();
            match session.delivery.deliver_start(session.actor_id, param).await? {
                Some(outcome) => print_delivery(session, outcome).await,
                None => println!("{}", session.config.welcome_message),
            }
        }
        "rate" => {
            let code: i64 = parse_arg(rest.first(), "rate <code> <1-5> [review]")?;
            let score: u8 = parse_arg(rest.get(1), "rate <code> <1-5> [review]")?;
            let review = (rest.len() > 2).then(|| rest[2..].join(" "));
            let summary = rating::rate(
                session.store.as_ref(),
                session.actor_id,
                code,
                score,
                review.as_deref(),
            )
            .await?;
            println!(
                "Thanks! {} now averages {}/5 over {} votes.",
                code, summary.average, summary.count
            );
        }
        "search" => {
            let query = rest.join(" ");
            for entry in session.store.search_entries(&query, 10).await? {
                println!(
                    "  {} - {} ({} views)",
                    entry.code,
                    entry.title,
                    format::format_number(entry.views)
                );
            }
        }
        "top" => {
            for entry in session.store.top_entries(10).await? {
                println!(
                    "  {} - {} ({} views)",
                    entry.code,
                    entry.title,
                    format::format_number(entry.views)
                );
            }
        }
        "new" => {
            for entry in session.store.recent_entries(10).await? {
                println!("  {} - {}", entry.code, entry.title);
            }
        }
        "del" => {
            require_admin(session)?;
            let code: i64 = parse_arg(rest.first(), "del <code>")?;
            session.store.deactivate_entry(code).await?;
            println!("Entry {code} deactivated.");
        }
        "stats" => {
            require_admin(session)?;
            let stats = session.store.global_stats().await?;
            let active = session.store.active_actor_count(7).await?;
            println!(
                "👥 Users: {} ({} active this week)\n🎬 Movies: {}\n👁 Views: {}",
                format::format_number(stats.actors),
                format::format_number(active),
                format::format_number(stats.entries),
                format::format_number(stats.total_views)
            );
        }
        "mystats" => {
            let stats = session.store.actor_stats(session.actor_id).await?;
            println!("👁 Views: {}  ⭐ Ratings: {}", stats.views, stats.ratings);
        }
        "channels" => {
            for channel in session.store.required_channels().await? {
                println!(
                    "  {} - {} (priority {})",
                    channel.channel_id, channel.title, channel.priority
                );
            }
        }
        "channel" => handle_channel(session, &rest).await?,
        "broadcast" => {
            require_admin(session)?;
            let text = rest.join(" ");
            let source = session
                .transport
                .send_text(&ChatRef::Id(session.actor_id), &text, None)
                .await
                .map_err(anyhow::Error::from)?;
            let report = session.dispatcher.broadcast(source, session.actor_id).await?;
            println!("{}", report.summary());
        }
        "join" => {
            let channel_id: i64 = parse_arg(rest.first(), "join <channel_id>")?;
            session.transport.join(channel_id, session.actor_id).await;
            println!("Joined channel {channel_id}.");
        }
        "leave" => {
            let channel_id: i64 = parse_arg(rest.first(), "leave <channel_id>")?;
            session.transport.leave(channel_id, session.actor_id).await;
            println!("Left channel {channel_id}.");
        }
        "block" => {
            session.transport.block(session.actor_id).await;
            println!("Actor {} now blocks the bot.", session.actor_id);
        }
        "unblock" => {
            session.transport.unblock(session.actor_id).await;
            println!("Actor {} unblocked the bot.", session.actor_id);
        }
        other => println!("Unknown command: {other}. Type `help`."),
    }
    Ok(())
}

async fn handle_channel(session: &Session, rest: &[&str]) -> Result<()> {
    require_admin(session)?;
    match rest.first().copied() {
        Some("add") => {
            let count = session.store.count_required_channels().await?;
            if count as usize >= session.config.max_channels {
                println!(
                    "Channel cap reached ({} of {}).",
                    count, session.config.max_channels
                );
                return Ok(());
            }
            let channel_id: i64 = parse_arg(rest.get(1), "channel add <id> <title> [priority]")?;
            let title = rest
                .get(2)
                .copied()
                .context("usage: channel add <id> <title> [priority]")?;
            let priority: i32 = rest.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);
            session
                .store
                .add_required_channel(channel_id, title, priority)
                .await?;
            println!("Channel {channel_id} added.");
        }
        Some("del") => {
            let channel_id: i64 = parse_arg(rest.get(1), "channel del <id>")?;
            session.store.remove_required_channel(channel_id).await?;
            println!("Channel {channel_id} removed.");
        }
        _ => println!("usage: channel add <id> <title> [priority] | channel del <id>"),
    }
    Ok(())
}

/// Routes a console line into the wizard, mapping attachment prefixes onto
/// the input kinds a real chat update would carry.
async fn handle_wizard_input(session: &Session, line: &str) -> Result<()> {
    let input = if let Some(id) = line.strip_prefix("video:") {
        WizardInput::Video(FileRef::new(id))
    } else if let Some(id) = line.strip_prefix("doc:") {
        WizardInput::Document(FileRef::new(id))
    } else if let Some(id) = line.strip_prefix("photo:") {
        WizardInput::Photo(FileRef::new(id))
    } else {
        WizardInput::Text(line.to_owned())
    };

    match session.wizard.submit(session.actor_id, input).await? {
        StepOutcome::Advance(step) => {
            println!("[{}/{}] {}", step.ordinal(), WizardStep::COUNT, step.prompt());
        }
        StepOutcome::Reject(reason) => println!("❌ {reason}"),
        StepOutcome::Complete {
            entry,
            announcement,
        } => {
            println!("✅ Added {} with code {}.", entry.title, entry.code);
            if announcement.is_err() {
                println!("⚠️ Channel announcement failed; the entry is live anyway.");
            }
        }
    }
    Ok(())
}

async fn print_delivery(session: &Session, outcome: DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Delivered(entry) => {
            info!("Delivered code {} to actor {}", entry.code, session.actor_id);
        }
        DeliveryOutcome::NotSubscribed(check) => {
            println!("🔒 Join the required channels first:");
            let keyboard = session.gate.join_keyboard(&check).await;
            print_keyboard(&keyboard);
        }
        DeliveryOutcome::NotFound(code) => {
            println!("😕 No movie found for code {code}.");
        }
    }
}

fn print_keyboard(keyboard: &Keyboard) {
    for row in &keyboard.rows {
        let cells: Vec<String> = row.iter().map(render_button).collect();
        println!("  {}", cells.join("  "));
    }
}

fn render_button(button: &Button) -> String {
    match &button.action {
        ButtonAction::Url(url) => format!("[{} -> {}]", button.label, url),
        ButtonAction::Callback(payload) => format!("[{} ({})]", button.label, payload),
    }
}

fn parse_arg<T: std::str::FromStr>(arg: Option<&&str>, usage: &str) -> Result<T> {
    arg.and_then(|s| s.parse().ok())
        .with_context(|| format!("usage: {usage}"))
}

fn require_admin(session: &Session) -> Result<()> {
    if session.config.is_admin(session.actor_id) {
        Ok(())
    } else {
        anyhow::bail!("admin only; switch with `actor {}`", session.config.admin_id)
    }
}

fn print_help() {
    println!(
        "\
Commands:
  actor <id>                    act as another user
  start [code_<n>]              simulate /start, optionally with a deep link
  get <code>                    request a movie by code
  rate <code> <1-5> [review]    rate a movie
  search <text> | top | new     browse the catalog
  mystats                       your own view/rating counts
  join/leave <channel_id>       simulate channel membership
  block | unblock               simulate blocking the bot

Admin:
  add | cancel                  run the content-intake wizard
  del <code>                    soft-delete an entry
  channel add/del ...           manage required channels
  broadcast <text>              relay a message to every user
  stats                         global totals

  quit"
    );
}

/// Transport that renders outbound traffic to stdout.
///
/// Membership and blocked state are simulated so gate and broadcast flows
/// can be walked through interactively.
#[derive(Debug, Default)]
struct ConsoleTransport {
    state: Mutex<ConsoleState>,
}

#[derive(Debug, Default)]
struct ConsoleState {
    next_message_id: i64,
    /// Actors that currently block the bot.
    blocked: HashSet<i64>,
    /// (channel, actor) pairs that joined.
    joined: HashSet<(i64, i64)>,
    handles: HashMap<i64, String>,
}

impl ConsoleTransport {
    async fn join(&self, channel_id: i64, actor_id: i64) {
        self.state.lock().await.joined.insert((channel_id, actor_id));
    }

    async fn leave(&self, channel_id: i64, actor_id: i64) {
        self.state.lock().await.joined.remove(&(channel_id, actor_id));
    }

    async fn block(&self, actor_id: i64) {
        self.state.lock().await.blocked.insert(actor_id);
    }

    async fn unblock(&self, actor_id: i64) {
        self.state.lock().await.blocked.remove(&actor_id);
    }

    async fn deliver(
        &self,
        to: &ChatRef,
        kind: &str,
        body: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let mut state = self.state.lock().await;
        let chat_id = match to {
            ChatRef::Id(id) => {
                if state.blocked.contains(id) {
                    return Err(TransportError::Forbidden);
                }
                *id
            }
            ChatRef::Handle(_) => 0,
        };

        state.next_message_id += 1;
        println!("--- {kind} to {to:?} ---");
        println!("{body}");
        if let Some(keyboard) = &keyboard {
            print_keyboard(keyboard);
        }
        println!("---");

        Ok(MessageRef {
            chat_id,
            message_id: state.next_message_id,
        })
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn send_text(
        &self,
        to: &ChatRef,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.deliver(to, "message", text, keyboard).await
    }

    async fn send_photo(
        &self,
        to: &ChatRef,
        photo: &FileRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.deliver(to, &format!("photo {}", photo.0), caption, keyboard)
            .await
    }

    async fn send_video(
        &self,
        to: &ChatRef,
        video: &FileRef,
        _thumbnail: Option<&FileRef>,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.deliver(to, &format!("video {}", video.0), caption, keyboard)
            .await
    }

    async fn send_document(
        &self,
        to: &ChatRef,
        document: &FileRef,
        caption: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.deliver(to, &format!("document {}", document.0), caption, keyboard)
            .await
    }

    async fn copy_message(&self, to: i64, source: MessageRef) -> Result<(), TransportError> {
        let state = self.state.lock().await;
        if state.blocked.contains(&to) {
            return Err(TransportError::Forbidden);
        }
        println!(
            "--- relay of message {} to actor {to} ---",
            source.message_id
        );
        Ok(())
    }

    async fn edit_text(&self, message: MessageRef, text: &str) -> Result<(), TransportError> {
        println!("--- edit of message {} ---", message.message_id);
        println!("{text}");
        println!("---");
        Ok(())
    }

    async fn member_status(
        &self,
        channel_id: i64,
        actor_id: i64,
    ) -> Result<MembershipStatus, TransportError> {
        let state = self.state.lock().await;
        if state.joined.contains(&(channel_id, actor_id)) {
            Ok(MembershipStatus::Member)
        } else {
            Ok(MembershipStatus::Left)
        }
    }

    async fn channel_handle(&self, channel_id: i64) -> Result<Option<String>, TransportError> {
        let state = self.state.lock().await;
        Ok(state.handles.get(&channel_id).cloned())
    }
}
