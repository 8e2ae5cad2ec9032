use promptos::backend::fixtures::{DEMO_CREDITS, DEMO_EMAIL, DEMO_PASSWORD, DEMO_TOKEN};
use promptos::backend::memory::MemorySnapshot;
use promptos::{
    Backend, DAILY_CREDIT_LIMIT, Error, MemoryBackend, NotificationKind, PromptDraft, PromptPatch,
    Role, SpaceKind,
};

async fn signed_in_newcomer(backend: &MemoryBackend) -> String {
    let session = backend
        .register("Ada", "ada@example.com", "hunter2")
        .await
        .expect("register should succeed");
    backend.set_token(Some(session.token.clone()));
    session.user.id
}

#[tokio::test]
async fn demo_login_returns_root_admin() {
    let backend = MemoryBackend::new(MemorySnapshot::demo());
    let session = backend
        .login(DEMO_EMAIL, DEMO_PASSWORD)
        .await
        .expect("demo credentials");
    assert_eq!(session.token, DEMO_TOKEN);
    assert_eq!(session.user.name, "Root Admin");
    assert_eq!(session.user.ai_credits, DEMO_CREDITS);
}

#[tokio::test]
async fn wrong_password_is_rejected() {
    let backend = MemoryBackend::demo();
    let err = backend
        .login(DEMO_EMAIL, "nope")
        .await
        .expect_err("bad password");
    assert!(matches!(err, Error::Api { status: 400, .. }));
}

#[tokio::test]
async fn calls_without_token_are_not_signed_in() {
    let backend = MemoryBackend::new(MemorySnapshot::demo());
    let err = backend.my_spaces().await.expect_err("no token");
    assert!(matches!(err, Error::NotSignedIn));
}

#[tokio::test]
async fn demo_session_sees_three_spaces_and_their_prompts() {
    let backend = MemoryBackend::demo();
    let spaces = backend.my_spaces().await.expect("spaces");
    assert_eq!(spaces.len(), 3);

    let dev = backend.prompts_in_space("s3").await.expect("prompts");
    assert_eq!(dev.len(), 1);
    assert_eq!(dev[0].variables, vec!["COMPONENT_NAME"]);
    assert!(dev[0].is_favorite);
}

#[tokio::test]
async fn registered_users_hit_the_daily_cap() {
    let backend = MemoryBackend::new(MemorySnapshot::demo());
    signed_in_newcomer(&backend).await;

    for expected in (0..DAILY_CREDIT_LIMIT).rev() {
        let receipt = backend.deduct_credit().await.expect("deduct");
        assert!(receipt.success);
        assert_eq!(receipt.ai_credits, expected);
    }
    let blocked = backend.deduct_credit().await.expect("deduct");
    assert!(!blocked.success);
    assert_eq!(blocked.ai_credits, 0);
}

#[tokio::test]
async fn daily_cap_applies_even_with_rewarded_balance() {
    let backend = MemoryBackend::new(MemorySnapshot::demo());
    signed_in_newcomer(&backend).await;
    backend.reward_credits(100).await.expect("reward");

    for _ in 0..DAILY_CREDIT_LIMIT {
        assert!(backend.deduct_credit().await.expect("deduct").success);
    }
    let blocked = backend.deduct_credit().await.expect("deduct");
    assert!(!blocked.success);
    assert_eq!(blocked.ai_credits, 100);
}

#[tokio::test]
async fn join_requires_a_real_code_and_notifies() {
    let backend = MemoryBackend::new(MemorySnapshot::demo());
    let user_id = signed_in_newcomer(&backend).await;

    let short = backend.join_space("MKT").await.expect_err("short code");
    assert!(matches!(short, Error::Api { status: 400, .. }));

    let unknown = backend.join_space("ZZZZZZ").await.expect_err("unknown");
    assert!(matches!(unknown, Error::NotFound { .. }));

    let joined = backend.join_space("MKT2024").await.expect("join");
    assert_eq!(joined.id, "s2");
    assert_eq!(joined.role, Role::Member);

    let notes = backend.notifications().await.expect("notifications");
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Join);
    assert_eq!(notes[0].recipient, user_id);
    assert!(!notes[0].read);

    backend
        .mark_notification_read(&notes[0].id)
        .await
        .expect("mark read");
    assert!(backend.notifications().await.expect("list")[0].read);
}

#[tokio::test]
async fn members_cannot_delete_or_edit_spaces() {
    let backend = MemoryBackend::new(MemorySnapshot::demo());
    signed_in_newcomer(&backend).await;
    backend.join_space("MKT2024").await.expect("join");

    let err = backend.delete_space("s2").await.expect_err("member delete");
    assert!(matches!(err, Error::Api { status: 403, .. }));
    let err = backend
        .update_space("s2", "Renamed", "")
        .await
        .expect_err("member edit");
    assert!(matches!(err, Error::Api { status: 403, .. }));
}

#[tokio::test]
async fn team_spaces_get_a_join_code() {
    let backend = MemoryBackend::demo();
    let team = backend
        .create_space("Growth", SpaceKind::Team)
        .await
        .expect("create");
    let code = team.join_code.expect("team code");
    assert!(code.len() >= 5);
    assert_eq!(team.role, Role::Owner);

    let private = backend
        .create_space("Notes", SpaceKind::Private)
        .await
        .expect("create");
    assert!(private.join_code.is_none());
}

#[tokio::test]
async fn deleting_a_space_drops_its_prompts() {
    let backend = MemoryBackend::demo();
    let space = backend
        .create_space("Scratch", SpaceKind::Private)
        .await
        .expect("create");
    let prompt = backend
        .create_prompt(&PromptDraft::new("T", "Body [X]", &space.id))
        .await
        .expect("prompt");
    backend.toggle_favorite(&prompt.id).await.expect("favorite");

    backend.delete_space(&space.id).await.expect("delete");

    let snapshot = backend.snapshot();
    assert!(snapshot.prompts.iter().all(|p| p.space_id != space.id));
    assert!(snapshot.favorites.iter().all(|f| f.prompt_id != prompt.id));
}

#[tokio::test]
async fn content_patch_recomputes_variables() {
    let backend = MemoryBackend::demo();
    let patch = PromptPatch {
        content: Some("Shot of [PLACE] at [TIME]".to_string()),
        ..PromptPatch::default()
    };
    let updated = backend.update_prompt("p3", &patch).await.expect("update");
    assert_eq!(updated.variables, vec!["PLACE", "TIME"]);
    assert_eq!(updated.version, 1);
}

#[tokio::test]
async fn toggle_favorite_flips_per_user() {
    let backend = MemoryBackend::demo();
    assert!(!backend.toggle_favorite("p1").await.expect("toggle"));
    assert!(backend.toggle_favorite("p1").await.expect("toggle"));
}

#[tokio::test]
async fn snapshot_survives_serde() {
    let backend = MemoryBackend::demo();
    backend
        .create_prompt(&PromptDraft::new("Saved", "Keep [ME]", "s1"))
        .await
        .expect("create");

    let json = serde_json::to_string(&backend.snapshot()).expect("serialize");
    let restored: MemorySnapshot = serde_json::from_str(&json).expect("deserialize");
    let reloaded = MemoryBackend::new(restored);
    reloaded.set_token(Some(DEMO_TOKEN.to_string()));

    let prompts = reloaded.prompts_in_space("s1").await.expect("prompts");
    assert!(prompts.iter().any(|p| p.title == "Saved"));
}
