//! Test engine: one owner, one assistant, three group rooms.

#![allow(dead_code)]

use roomwarden::authority::Denial;
use roomwarden::commands::{Invocation, Outcome, Registry};
use roomwarden::config::Config;
use roomwarden::db::Database;
use roomwarden::engine::Engine;
use roomwarden::error::{CommandError, CommandResult};
use roomwarden::model::{Entity, Participant, ParticipantId, Room, RoomId};
use roomwarden::pipeline::{Flow, Interaction, MembershipEvent, MembershipHandler, Pipeline};
use roomwarden::platform::{AdminCapability, LocalPlatform, RoomRole};
use roomwarden::store::Store;
use std::sync::Arc;

/// Fixed identities used across the suites.
pub mod ids {
    use roomwarden::model::{ParticipantId, RoomId};

    pub const OWNER: ParticipantId = 1;
    pub const ASSISTANT: ParticipantId = 2;
    /// Granted operator in most scenarios.
    pub const ALICE: ParticipantId = 10;
    pub const BOB: ParticipantId = 11;
    /// Creator of `ROOM`.
    pub const CAROL: ParticipantId = 20;
    /// Administrator of `ROOM` with restrict rights only.
    pub const DAVE: ParticipantId = 21;
    pub const MALLORY: ParticipantId = 66;
    pub const SPAMBOT: ParticipantId = 77;

    pub const ROOM: RoomId = -100;
    pub const OTHER_ROOM: RoomId = -200;
    pub const THIRD_ROOM: RoomId = -300;
    pub const LOG_ROOM: RoomId = -900;
}

use ids::*;

pub const ASSISTANT_HANDLE: &str = "warden_bot";

pub struct TestEngine {
    pub engine: Engine,
    pub platform: Arc<LocalPlatform>,
    pub db: Database,
    pub pipeline: Pipeline,
    pub membership: MembershipHandler,
    pub registry: Registry,
}

impl TestEngine {
    /// Operational logs go to the owner.
    pub async fn new() -> Self {
        Self::with_log_destination(None).await
    }

    pub async fn with_log_destination(destination: Option<i64>) -> Self {
        let mut toml = format!(
            r#"
            [owner]
            id = {OWNER}

            [assistant]
            id = {ASSISTANT}
            handle = "{ASSISTANT_HANDLE}"

            [database]
            path = ":memory:"

            [propagation]
            start_delay_ms = 0
            room_delay_ms = 0
            "#
        );
        if let Some(destination) = destination {
            toml.push_str(&format!("\n[logging]\ndestination = {destination}\n"));
        }
        let config = Config::parse(&toml).expect("test config parses");

        let db = Database::new(":memory:").await.expect("in-memory database");
        let platform = Arc::new(LocalPlatform::new(ASSISTANT));

        platform.add_participant(Participant::new(OWNER, "Owner").with_handle("owner"));
        platform.add_participant(
            Participant::new(ASSISTANT, "Warden")
                .with_handle(ASSISTANT_HANDLE)
                .automated(),
        );
        platform.add_participant(Participant::new(ALICE, "Alice").with_handle("alice"));
        platform.add_participant(Participant::new(BOB, "Bob").with_handle("bob"));
        platform.add_participant(Participant::new(CAROL, "Carol").with_handle("carol"));
        platform.add_participant(Participant::new(DAVE, "Dave").with_handle("dave"));
        platform.add_participant(Participant::new(MALLORY, "Mallory").with_handle("mallory"));
        platform.add_participant(
            Participant::new(SPAMBOT, "Spam")
                .with_handle("spambot")
                .automated(),
        );

        for room in [ROOM, OTHER_ROOM, THIRD_ROOM] {
            platform.add_room(Room::group(room, &format!("Room {room}")));
            platform.set_role(room, ASSISTANT, RoomRole::full_admin());
            for member in [ALICE, BOB, MALLORY] {
                platform.set_role(room, member, RoomRole::Member);
            }
        }
        platform.set_role(ROOM, CAROL, RoomRole::Creator);
        platform.set_role(
            ROOM,
            DAVE,
            RoomRole::admin_with([AdminCapability::RestrictMembers]),
        );

        let engine = Engine::new(Arc::new(config), Arc::new(db.clone()), platform.clone());
        let pipeline = Pipeline::standard();
        let membership = MembershipHandler::new();

        Self {
            engine,
            platform,
            db,
            pipeline,
            membership,
            registry: Registry::new(),
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.engine.store()
    }

    pub fn participant(&self, id: ParticipantId) -> Participant {
        self.platform
            .participant(id)
            .unwrap_or_else(|| Participant::new(id, format!("user{id}")))
    }

    pub fn room(id: RoomId) -> Room {
        if id < 0 {
            Room::group(id, &format!("Room {id}"))
        } else {
            Room::private(id)
        }
    }

    /// Pass a plain message through the guards.
    pub async fn speak(&self, actor: ParticipantId, room: RoomId) -> Flow {
        let interaction =
            Interaction::new(self.participant(actor), Self::room(room)).with_message(1000 + actor);
        self.pipeline.run(&self.engine, &interaction).await
    }

    /// Run a command line through the guards, then the registry.
    pub async fn command(
        &self,
        actor: ParticipantId,
        room: RoomId,
        line: &str,
    ) -> CommandResult<Outcome> {
        self.dispatch(actor, room, line, None).await
    }

    /// Same as [`command`](Self::command), replying to `replied`'s message.
    pub async fn reply_command(
        &self,
        actor: ParticipantId,
        room: RoomId,
        replied: ParticipantId,
        line: &str,
    ) -> CommandResult<Outcome> {
        let replied = Entity::Participant(self.participant(replied));
        self.dispatch(actor, room, line, Some(replied)).await
    }

    async fn dispatch(
        &self,
        actor: ParticipantId,
        room: RoomId,
        line: &str,
        reply_to: Option<Entity>,
    ) -> CommandResult<Outcome> {
        let mut interaction = Interaction::new(self.participant(actor), Self::room(room));
        if let Some(entity) = &reply_to {
            interaction = interaction.replying_to(entity.clone());
        }
        let flow = self.pipeline.run(&self.engine, &interaction).await;
        assert_eq!(flow, Flow::Continue, "guards stopped {line:?} from {actor}");

        let mut inv = Invocation::parse(
            self.participant(actor),
            Self::room(room),
            line,
            Some(ASSISTANT_HANDLE),
        )
        .expect("command line parses");
        if let Some(entity) = reply_to {
            inv = inv.replying_to(entity);
        }

        self.registry.dispatch(&self.engine, &inv).await
    }

    pub async fn joined(&self, room: RoomId, members: &[ParticipantId]) {
        let event = MembershipEvent::Joined {
            room: Self::room(room),
            members: members.iter().map(|&id| self.participant(id)).collect(),
        };
        self.membership.handle(&self.engine, &event).await;
    }

    pub async fn left(&self, room: RoomId, member: ParticipantId) {
        let event = MembershipEvent::Left {
            room: Self::room(room),
            member: self.participant(member),
        };
        self.membership.handle(&self.engine, &event).await;
    }

    /// Grant `id` operator status as the owner.
    pub async fn make_operator(&self, id: ParticipantId) {
        self.store()
            .grant(id, OWNER)
            .await
            .expect("grant operator");
    }
}

/// The denial carried by a failed command.
pub fn denial(result: CommandResult<Outcome>) -> Denial {
    match result {
        Err(CommandError::Denied { denial, .. }) => denial,
        other => panic!("expected a denial, got {other:?}"),
    }
}
