// tests/moderation.rs
//! Integration tests for room moderation: ban, mute, kick, promote, demote.

mod common;
use chrono::{Duration, Utc};
use common::ids::*;
use common::{TestEngine, denial};
use roomwarden::authority::{Action, Denial, Protection};
use roomwarden::commands::Outcome;
use roomwarden::db::DEFAULT_REASON;
use roomwarden::error::CommandError;
use roomwarden::platform::{AdminCapability, PlatformCall, RoomRole};

#[tokio::test]
async fn test_admin_bans_with_duration() {
    let t = TestEngine::new().await;

    let before = Utc::now();
    let out = t
        .command(DAVE, ROOM, "/ban @mallory 2h flooding")
        .await
        .expect("ban");
    let Outcome::Banned {
        target,
        until,
        duration,
        reason,
    } = out
    else {
        panic!("expected a ban");
    };
    assert_eq!(target.id, MALLORY);
    assert_eq!(reason, "flooding");
    assert_eq!(duration.as_deref(), Some("2h"));

    let until = until.expect("temporary ban");
    assert!(until >= before + Duration::hours(2));
    assert!(until <= Utc::now() + Duration::hours(2));

    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Banned));
    assert!(t.platform.calls().contains(&PlatformCall::Ban {
        room: ROOM,
        participant: MALLORY,
        until: Some(until),
    }));
}

#[tokio::test]
async fn test_duration_past_calendar_refused() {
    let t = TestEngine::new().await;

    for line in ["/ban @mallory 20000000w spam", "/mute @mallory 20000000w spam"] {
        let result = t.command(DAVE, ROOM, line).await;
        assert!(
            matches!(result, Err(CommandError::InvalidArgument(ref m)) if m.contains("20000000w")),
            "{line}"
        );
    }
    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Member));
    assert!(t.platform.calls().is_empty());
}

#[tokio::test]
async fn test_operator_bans_permanently() {
    let t = TestEngine::new().await;
    t.make_operator(ALICE).await;

    let out = t.command(ALICE, OTHER_ROOM, "/ban @bob").await.expect("ban");
    assert!(matches!(
        out,
        Outcome::Banned { until: None, duration: None, ref reason, .. } if reason == DEFAULT_REASON
    ));
    assert!(out.to_string().contains("banned permanently"));
    assert_eq!(t.platform.role(OTHER_ROOM, BOB), Some(RoomRole::Banned));
}

#[tokio::test]
async fn test_ban_by_reply() {
    let t = TestEngine::new().await;

    let out = t
        .reply_command(DAVE, ROOM, MALLORY, "/ban 1d raiding")
        .await
        .expect("ban by reply");
    assert!(matches!(
        out,
        Outcome::Banned { ref target, ref duration, ref reason, .. }
            if target.id == MALLORY && duration.as_deref() == Some("1d") && reason == "raiding"
    ));
}

#[tokio::test]
async fn test_unprivileged_actors_denied() {
    let t = TestEngine::new().await;

    let result = t.command(BOB, ROOM, "/ban @mallory").await;
    assert_eq!(denial(result), Denial::NotPrivileged);

    // Administrator without the restrict right.
    t.platform.set_role(
        ROOM,
        BOB,
        RoomRole::admin_with([AdminCapability::PinMessages]),
    );
    let result = t.command(BOB, ROOM, "/mute @mallory").await;
    assert_eq!(denial(result), Denial::NotPrivileged);

    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Member));
    assert!(t.platform.calls().is_empty());
}

#[tokio::test]
async fn test_target_protections() {
    let t = TestEngine::new().await;

    let result = t.command(DAVE, ROOM, "/ban @carol").await;
    assert_eq!(denial(result), Denial::TargetProtected(Protection::RoomCreator));

    let result = t.command(DAVE, ROOM, &format!("/kick {OWNER}")).await;
    assert_eq!(denial(result), Denial::TargetProtected(Protection::Owner));

    let result = t.command(DAVE, ROOM, "/mute @warden_bot").await;
    assert_eq!(denial(result), Denial::TargetProtected(Protection::Assistant));

    let result = t.command(DAVE, ROOM, "/ban @dave").await;
    assert_eq!(denial(result), Denial::TargetProtected(Protection::SelfTarget));

    // Administrators are only targetable by the creator or the owner.
    t.platform.set_role(ROOM, BOB, RoomRole::full_admin());
    let result = t.command(DAVE, ROOM, "/ban @bob").await;
    assert_eq!(
        denial(result),
        Denial::TargetProtected(Protection::RoomAdministrator)
    );

    t.command(CAROL, ROOM, "/ban @bob").await.expect("creator bans admin");
    assert_eq!(t.platform.role(ROOM, BOB), Some(RoomRole::Banned));
}

#[tokio::test]
async fn test_room_commands_refused_in_private() {
    let t = TestEngine::new().await;

    for line in ["/ban @mallory", "/kick @mallory", "/kickme", "/promote @bob"] {
        let result = t.command(OWNER, OWNER, line).await;
        assert!(matches!(result, Err(CommandError::PrivateRoom)), "{line}");
    }
}

#[tokio::test]
async fn test_assistant_without_rights() {
    let t = TestEngine::new().await;
    t.platform.set_role(OTHER_ROOM, ASSISTANT, RoomRole::Member);

    let result = t.command(OWNER, OTHER_ROOM, "/ban @mallory").await;
    assert!(matches!(
        result,
        Err(CommandError::AssistantLacksRights(Action::Ban))
    ));
    assert_eq!(t.platform.role(OTHER_ROOM, MALLORY), Some(RoomRole::Member));

    t.platform.set_role(
        ROOM,
        ASSISTANT,
        RoomRole::admin_with([AdminCapability::RestrictMembers]),
    );
    let result = t.command(CAROL, ROOM, "/promote @bob").await;
    assert!(matches!(
        result,
        Err(CommandError::AssistantLacksRights(Action::Promote))
    ));
}

#[tokio::test]
async fn test_mute_unmute_unban() {
    let t = TestEngine::new().await;

    let out = t.command(DAVE, ROOM, "/mute @mallory 30m").await.expect("mute");
    assert!(matches!(out, Outcome::Muted { until: Some(_), .. }));
    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Restricted));

    let out = t.command(DAVE, ROOM, "/unmute @mallory").await.expect("unmute");
    assert!(matches!(out, Outcome::Unmuted(ref p) if p.id == MALLORY));
    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Member));

    t.command(DAVE, ROOM, "/ban @mallory").await.expect("ban");
    let out = t.command(DAVE, ROOM, "/unban @mallory").await.expect("unban");
    assert!(matches!(out, Outcome::Unbanned(ref p) if p.id == MALLORY));
    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Left));
}

#[tokio::test]
async fn test_kick_and_kickme() {
    let t = TestEngine::new().await;

    let out = t
        .command(DAVE, ROOM, "/kick @mallory off topic")
        .await
        .expect("kick");
    assert!(matches!(out, Outcome::Kicked { ref reason, .. } if reason == "off topic"));
    assert_eq!(t.platform.role(ROOM, MALLORY), Some(RoomRole::Left));

    let out = t.command(BOB, ROOM, "/kickme").await.expect("kickme");
    assert!(matches!(out, Outcome::LeftRoom(ref p) if p.id == BOB));
    assert_eq!(t.platform.role(ROOM, BOB), Some(RoomRole::Left));

    let result = t.command(DAVE, ROOM, "/kickme").await;
    assert!(matches!(result, Err(CommandError::InvalidArgument(_))));
    assert!(t.platform.role(ROOM, DAVE).is_some_and(|r| r.is_administrator()));
}

#[tokio::test]
async fn test_promote_and_demote() {
    let t = TestEngine::new().await;

    let out = t
        .command(CAROL, ROOM, "/promote @bob Night Shift Moderator")
        .await
        .expect("promote");
    assert!(matches!(
        out,
        Outcome::Promoted { ref target, ref title } if target.id == BOB && title == "Night Shift Mode"
    ));
    assert!(t.platform.role(ROOM, BOB).is_some_and(|r| r.is_administrator()));

    let out = t.command(CAROL, ROOM, "/promote @bob").await.expect("again");
    assert!(matches!(out, Outcome::AlreadyAdministrator(_)));

    let out = t.command(CAROL, ROOM, "/promote @bob Senior").await.expect("retitle");
    assert!(matches!(out, Outcome::TitleUpdated { ref title, .. } if title == "Senior"));

    let out = t.command(CAROL, ROOM, "/demote @bob").await.expect("demote");
    assert!(matches!(out, Outcome::Demoted(ref p) if p.id == BOB));
    assert_eq!(t.platform.role(ROOM, BOB), Some(RoomRole::Member));

    let out = t.command(CAROL, ROOM, "/demote @bob").await.expect("demote again");
    assert!(matches!(out, Outcome::NotAdministrator(_)));

    let out = t.command(CAROL, ROOM, "/promote @alice").await.expect("default title");
    assert!(matches!(out, Outcome::Promoted { ref title, .. } if title == "Admin"));

    let out = t.command(CAROL, ROOM, "/promote @carol").await.expect("self");
    assert!(matches!(out, Outcome::AlreadyCreator(_)));
}

#[tokio::test]
async fn test_promotion_authority() {
    let t = TestEngine::new().await;
    t.make_operator(ALICE).await;

    // Operator grants do not reach promotion.
    let result = t.command(ALICE, ROOM, "/promote @bob").await;
    assert_eq!(denial(result), Denial::NotPrivileged);

    // Restrict-only administrators cannot promote either.
    let result = t.command(DAVE, ROOM, "/promote @bob").await;
    assert_eq!(denial(result), Denial::NotPrivileged);

    let out = t.command(OWNER, ROOM, "/promote @bob").await.expect("owner promotes");
    assert!(matches!(out, Outcome::Promoted { .. }));

    let result = t.command(CAROL, ROOM, "/promote @spambot").await;
    assert!(matches!(result, Err(CommandError::InvalidArgument(_))));

    let result = t.command(OWNER, ROOM, "/demote @carol").await;
    assert_eq!(denial(result), Denial::TargetProtected(Protection::RoomCreator));
}
