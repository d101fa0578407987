//! End-to-end tests through the assembled handler chain (logging → wizard → FAQ → AI) with a
//! mock transport, plus the wizard expiry sweep.

mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::mock_bot::MockBot;
use common::{private_chat, text_message, user};
use faq_bot::config::{AiSettings, BaseConfig, StreamSettings, WizardSettings};
use faq_bot::wizard::{spawn_wizard_sweeper, sweep_and_notify, WizardStore, WIZARD_EXPIRED_TEXT};
use faq_bot::{build_bot_components, Bot, BotConfig, Chat, FaqBot, HandlerResponse, Message};
use llm_client::LlmConfig;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ADMIN: i64 = 1;
const GUEST: i64 = 2;
const GROUP: i64 = -100;

fn seed_file() -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    write!(
        f,
        r#"[
            {{"id": 1, "key": "opening hours", "value": "9 to 5", "classification": "general"}},
            {{"id": 2, "key": "refunds", "value": "Within 30 days"}}
        ]"#
    )
    .unwrap();
    f
}

fn config(seed: &tempfile::NamedTempFile) -> BotConfig {
    BotConfig {
        base: BaseConfig {
            bot_token: "123456:test-token".to_string(),
            telegram_api_url: None,
            log_file: "logs/test.log".to_string(),
            admin_ids: vec![ADMIN],
            faq_seed_file: Some(seed.path().to_string_lossy().into_owned()),
        },
        llm: LlmConfig::default(),
        ai: AiSettings::default(),
        stream: StreamSettings::default(),
        wizard: WizardSettings::default(),
    }
}

async fn bot_under_test() -> (FaqBot, Arc<MockBot>, tempfile::NamedTempFile) {
    let seed = seed_file();
    let (mock, _edits) = MockBot::with_receiver();
    let config = config(&seed);
    let components = build_bot_components(&config, Some(mock.clone() as Arc<dyn Bot>))
        .await
        .unwrap();
    (FaqBot::new(config, components), mock, seed)
}

async fn send(bot: &FaqBot, user: i64, text: &str) -> HandlerResponse {
    bot.handler_chain
        .handle(&text_message(user, "10", text))
        .await
        .unwrap()
}

async fn send_in_group(bot: &FaqBot, user_id: i64, text: &str) -> HandlerResponse {
    let message = Message::incoming_text("10", user(user_id), Chat::new(GROUP, "group"), text);
    bot.handler_chain.handle(&message).await.unwrap()
}

/// **Test: FAQ keys are answered case-insensitively; other text falls through.**
#[tokio::test]
async fn test_faq_lookup() {
    let (bot, mock, _seed) = bot_under_test().await;

    assert_eq!(
        send(&bot, GUEST, "  Opening Hours ").await,
        HandlerResponse::Reply("9 to 5".to_string())
    );
    // No AI provider is enabled, so unknown text gets no answer.
    assert_eq!(send(&bot, GUEST, "what is this").await, HandlerResponse::Continue);
    assert_eq!(mock.sent_texts(), vec!["9 to 5".to_string()]);
}

/// **Test: admin walks the wizard to completion and the FAQ answer changes.**
#[tokio::test]
async fn test_wizard_updates_entry() {
    let (bot, mock, _seed) = bot_under_test().await;

    let HandlerResponse::Reply(prompt) = send(&bot, ADMIN, "/update 1").await else {
        panic!("expected a prompt");
    };
    assert!(prompt.contains("current type is \"general\""), "{}", prompt);

    // Text matching an FAQ key goes to the wizard, not the lookup.
    let HandlerResponse::Reply(prompt) = send(&bot, ADMIN, "opening hours").await else {
        panic!("expected a prompt");
    };
    assert!(prompt.contains("type will be \"opening hours\""), "{}", prompt);

    assert_eq!(
        send(&bot, ADMIN, "8 to 6 on weekdays").await,
        HandlerResponse::Reply("Entry 1 updated.".to_string())
    );
    assert!(!bot.components.wizards.is_active(ADMIN).await);

    let entry = bot.components.faq.get(1).await.unwrap().unwrap();
    assert_eq!(entry.classification, "opening hours");
    assert_eq!(entry.value, "8 to 6 on weekdays");
    assert_eq!(
        send(&bot, GUEST, "opening hours").await,
        HandlerResponse::Reply("8 to 6 on weekdays".to_string())
    );
    assert_eq!(mock.sent().len(), 4);
}

/// **Test: /back returns to the type stage and /cancel ends the wizard.**
#[tokio::test]
async fn test_wizard_back_and_cancel() {
    let (bot, _mock, _seed) = bot_under_test().await;

    send(&bot, ADMIN, "/update 2").await;
    send(&bot, ADMIN, "billing").await;
    let HandlerResponse::Reply(prompt) = send(&bot, ADMIN, "/back").await else {
        panic!("expected a prompt");
    };
    assert!(prompt.contains("Send the new type"), "{}", prompt);

    assert_eq!(
        send(&bot, ADMIN, "/cancel").await,
        HandlerResponse::Reply("Update cancelled.".to_string())
    );
    assert!(!bot.components.wizards.is_active(ADMIN).await);
    assert_eq!(
        bot.components.faq.get(2).await.unwrap().unwrap().value,
        "Within 30 days"
    );
}

/// **Test: in a group chat only the admin who started the wizard can drive it; other
/// members' messages are swallowed without a reply.**
#[tokio::test]
async fn test_wizard_ignores_other_users_in_group() {
    let (bot, mock, _seed) = bot_under_test().await;

    let HandlerResponse::Reply(_) = send_in_group(&bot, ADMIN, "/update 1").await else {
        panic!("expected a prompt");
    };
    let replies_after_start = mock.sent().len();

    for text in ["spam", "/cancel", "/back", "refunds"] {
        assert_eq!(send_in_group(&bot, GUEST, text).await, HandlerResponse::Stop, "{}", text);
    }
    assert_eq!(mock.sent().len(), replies_after_start);
    let state = bot.components.wizards.get(GROUP).await.unwrap();
    assert_eq!(state.started_by, ADMIN);
    assert!(state.new_classification.is_none());

    send_in_group(&bot, ADMIN, "hours").await;
    assert_eq!(send_in_group(&bot, GUEST, "guest value").await, HandlerResponse::Stop);
    assert_eq!(
        send_in_group(&bot, ADMIN, "9 to 6").await,
        HandlerResponse::Reply("Entry 1 updated.".to_string())
    );

    let entry = bot.components.faq.get(1).await.unwrap().unwrap();
    assert_eq!(entry.classification, "hours");
    assert_eq!(entry.value, "9 to 6");
    assert!(!bot.components.wizards.is_active(GROUP).await);

    // Once the wizard is gone the guest is answered normally again.
    assert_eq!(
        send_in_group(&bot, GUEST, "refunds").await,
        HandlerResponse::Reply("Within 30 days".to_string())
    );
}

/// **Test: /update is refused for non-admins, bad ids and unknown entries.**
#[tokio::test]
async fn test_wizard_start_guards() {
    let (bot, _mock, _seed) = bot_under_test().await;

    assert_eq!(
        send(&bot, GUEST, "/update 1").await,
        HandlerResponse::Reply("Only admins can update FAQ entries.".to_string())
    );
    assert_eq!(
        send(&bot, ADMIN, "/update abc").await,
        HandlerResponse::Reply("Usage: /update <entry id>".to_string())
    );
    assert_eq!(
        send(&bot, ADMIN, "/update 99").await,
        HandlerResponse::Reply("Entry 99 not found.".to_string())
    );
    assert!(!bot.components.wizards.is_active(ADMIN).await);
}

/// **Test: one sweep removes expired wizards and tells their chats.**
#[tokio::test]
async fn test_sweep_notifies_expired_chats() {
    let (mock, _edits) = MockBot::with_receiver();
    let bot: Arc<dyn Bot> = mock.clone();
    let store = WizardStore::new(Duration::from_secs(300));
    let t0 = Utc::now();
    store.start_at(&private_chat(5), 5, 1, "general", "10", t0).await;
    store
        .start_at(&private_chat(6), 6, 2, "general", "11", t0 + ChronoDuration::seconds(120))
        .await;

    assert_eq!(sweep_and_notify(&store, &bot, t0 + ChronoDuration::seconds(299)).await, 0);
    assert_eq!(sweep_and_notify(&store, &bot, t0 + ChronoDuration::seconds(300)).await, 1);

    let sent = mock.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].chat_id, 5);
    assert_eq!(sent[0].text, WIZARD_EXPIRED_TEXT);
    assert!(store.is_active(6).await);
}

/// **Test: the background sweeper runs until cancelled.**
#[tokio::test]
async fn test_background_sweeper_stops_on_cancel() {
    let (mock, _edits) = MockBot::with_receiver();
    let store = Arc::new(WizardStore::new(Duration::ZERO));
    store.start(&private_chat(5), 5, 1, "general", "10").await;

    let cancel = CancellationToken::new();
    let handle = spawn_wizard_sweeper(
        store.clone(),
        mock.clone(),
        Duration::from_millis(10),
        cancel.clone(),
    );

    for _ in 0..100 {
        if !mock.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(mock.sent_texts(), vec![WIZARD_EXPIRED_TEXT.to_string()]);
    assert!(!store.is_active(5).await);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
}
