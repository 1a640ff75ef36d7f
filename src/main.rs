//! roomwarden console driver.
//!
//! Runs the engine against the in-memory platform, reading one event per line
//! from stdin:
//!
//! ```text
//! <actor_id> <room_id> <text>              message (commands start with '/')
//! !join <room_id> <participant_id>...      participants joined a room
//! !leave <room_id> <participant_id>        participant left a room
//! !role <room_id> <participant_id> <role>  creator | admin | member | banned
//! ```
//!
//! Negative room ids are group rooms; positive ids are private conversations.

use anyhow::{Context as _, bail};
use roomwarden::commands::{Invocation, Registry};
use roomwarden::config::{Config, DEFAULT_CONFIG_PATH, validation};
use roomwarden::db::Database;
use roomwarden::engine::Engine;
use roomwarden::model::{Participant, ParticipantId, Room, RoomId};
use roomwarden::pipeline::{Flow, Interaction, MembershipEvent, MembershipHandler, Pipeline};
use roomwarden::platform::{LocalPlatform, RoomRole};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Replies go to stdout, logs to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if Path::new(&config_path).exists() {
        Config::load(&config_path).map_err(|e| {
            error!(path = %config_path, error = %e, "Failed to load config");
            e
        })?
    } else {
        warn!(path = %config_path, "Config file not found, using defaults and environment");
        Config::default()
    };
    config.apply_env_overrides()?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        bail!("refusing to start with {} configuration error(s)", errors.len());
    }
    config.log_disabled_features();

    // One inbound event is fully processed before the next.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;

    runtime.block_on(run(config))
}

/// Everything the read loop needs.
struct Console {
    engine: Engine,
    platform: Arc<LocalPlatform>,
    pipeline: Pipeline,
    membership: MembershipHandler,
    registry: Registry,
    assistant_handle: Option<String>,
    next_message_id: i64,
}

async fn run(config: Config) -> anyhow::Result<()> {
    let db = Database::new(&config.database.path).await?;

    let platform = Arc::new(LocalPlatform::new(config.assistant_id()));
    let mut assistant = Participant::new(config.assistant_id(), "roomwarden").automated();
    assistant.handle = config.assistant.handle.clone();
    platform.add_participant(assistant);

    let assistant_handle = config.assistant.handle.clone();
    let engine = Engine::new(Arc::new(config), Arc::new(db), platform.clone());

    info!(
        owner = engine.owner_id(),
        assistant = engine.assistant_id(),
        "Starting roomwarden"
    );

    let pipeline = Pipeline::standard();
    let membership = MembershipHandler::new();
    let mut console = Console {
        engine,
        platform,
        pipeline,
        membership,
        registry: Registry::new(),
        assistant_handle,
        next_message_id: 1,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let result = match line.strip_prefix('!') {
            Some(directive) => console.directive(directive).await,
            None => console.message(line).await,
        };
        if let Err(e) = result {
            eprintln!("! {e:#}");
        }
        console.flush_notices();
    }

    console.engine.join_background().await;
    console.flush_notices();

    let stats = console.registry.get_command_stats();
    if !stats.is_empty() {
        info!(?stats, "Command usage");
    }
    info!("Input closed, shutting down");
    Ok(())
}

impl Console {
    async fn message(&mut self, line: &str) -> anyhow::Result<()> {
        let mut parts = line.splitn(3, char::is_whitespace);
        let actor: ParticipantId = parse_id(parts.next(), "actor id")?;
        let room: RoomId = parse_id(parts.next(), "room id")?;
        let text = parts.next().unwrap_or_default().trim();

        let actor = self.participant(actor);
        let room = room_for(room);
        let message_id = self.next_message_id;
        self.next_message_id += 1;

        let interaction = Interaction::new(actor.clone(), room.clone()).with_message(message_id);
        if self.pipeline.run(&self.engine, &interaction).await == Flow::Stop {
            return Ok(());
        }

        let Some(inv) = Invocation::parse(actor, room, text, self.assistant_handle.as_deref())
        else {
            return Ok(());
        };
        // Unknown commands may belong to another bot in the room.
        if !self.registry.knows(&inv.command) {
            return Ok(());
        }

        match self.registry.dispatch(&self.engine, &inv).await {
            Ok(outcome) => println!("{outcome}"),
            Err(e) => println!("Error: {e}"),
        }
        Ok(())
    }

    async fn directive(&mut self, directive: &str) -> anyhow::Result<()> {
        let mut parts = directive.split_whitespace();
        let verb = parts.next().unwrap_or_default();
        let room: RoomId = parse_id(parts.next(), "room id")?;

        match verb {
            "join" => {
                let mut members = Vec::new();
                for token in parts {
                    let id = parse_id(Some(token), "participant id")?;
                    if self.platform.role(room, id).is_none() {
                        self.platform.set_role(room, id, RoomRole::Member);
                    }
                    members.push(self.participant(id));
                }
                let event = MembershipEvent::Joined {
                    room: room_for(room),
                    members,
                };
                self.membership.handle(&self.engine, &event).await;
            }
            "leave" => {
                let id = parse_id(parts.next(), "participant id")?;
                self.platform.set_role(room, id, RoomRole::Left);
                let event = MembershipEvent::Left {
                    room: room_for(room),
                    member: self.participant(id),
                };
                self.membership.handle(&self.engine, &event).await;
            }
            "role" => {
                let id = parse_id(parts.next(), "participant id")?;
                let role = match parts.next() {
                    Some("creator") => RoomRole::Creator,
                    Some("admin") => RoomRole::full_admin(),
                    Some("member") => RoomRole::Member,
                    Some("banned") => RoomRole::Banned,
                    other => bail!("unknown role: {}", other.unwrap_or_default()),
                };
                self.platform.set_role(room, id, role);
            }
            other => bail!("unknown directive: {other}"),
        }
        Ok(())
    }

    /// The directory entry for `id`, registering a placeholder on first sight.
    fn participant(&self, id: ParticipantId) -> Participant {
        self.platform.participant(id).unwrap_or_else(|| {
            let participant = Participant::new(id, format!("user{id}"));
            self.platform.add_participant(participant.clone());
            participant
        })
    }

    fn flush_notices(&self) {
        for (destination, notice) in self.platform.take_notices() {
            println!("[{destination}] {notice}");
        }
    }
}

fn parse_id(token: Option<&str>, what: &str) -> anyhow::Result<i64> {
    let token = token.with_context(|| format!("missing {what}"))?;
    token
        .parse()
        .with_context(|| format!("bad {what}: {token}"))
}

fn room_for(id: RoomId) -> Room {
    if id < 0 {
        Room::group(id, &format!("Room {id}"))
    } else {
        Room::private(id)
    }
}
