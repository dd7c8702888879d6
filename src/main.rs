use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::dispatching::UpdateHandler;
use teloxide::error_handlers::IgnoringErrorHandlerSafe;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use teloxide::update_listeners::webhooks::{self, Options};
use tracing::{instrument, level_filters};
use tracing_subscriber::fmt::format::FmtSpan;
use url::Url;

pub mod audit;
pub mod bank;
pub mod commands;
pub mod engine;
pub mod intent;
pub mod keyboard;
pub mod runner;
pub mod state;

use audit::AuditLog;
use bank::QuestionBank;
use commands::{cancel, help, start, Command};
use state::QuizState;

type UserDialogue = Dialogue<QuizState, InMemStorage<QuizState>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>;

#[tokio::main]
async fn main() {
    dotenv().ok();
    let rust_log = std::env::var("LOG_LEVEL").unwrap_or("error".into());
    tracing_subscriber::fmt()
        .with_max_level(level_filters::LevelFilter::from_level(
            rust_log.parse().expect("LOG_LEVEL can't be parsed."),
        ))
        .json()
        .with_span_events(FmtSpan::ENTER)
        .log_internal_errors(true)
        .with_ansi(true)
        .with_line_number(true)
        .with_target(false)
        .init();

    let questions_path = std::env::var("QUESTIONS_PATH").unwrap_or("questions.json".into());
    let bank = Arc::new(
        QuestionBank::load(&questions_path).expect("Failed to load the question bank."),
    );
    log::info!(
        "Loaded {} sections from '{}'",
        bank.sections().len(),
        questions_path
    );

    let teloxide_token = std::env::var("TELOXIDE_TOKEN").expect("TELOXIDE_TOKEN should be set.");
    let bot = Bot::new(teloxide_token);
    log::info!("Starting bot...");

    let audit_path =
        PathBuf::from(std::env::var("AUDIT_LOG_PATH").unwrap_or("quiz_audit.log".into()));
    let admin_chat = std::env::var("ADMIN_CHAT_ID")
        .ok()
        .map(|id| ChatId(id.parse().expect("ADMIN_CHAT_ID can't be parsed.")));
    let audit = AuditLog::spawn(bot.clone(), audit_path, admin_chat);

    let ngrok_url = std::env::var("NGROK_URL").map(|d| d.parse::<Url>().unwrap()).ok();
    let ngrok_addr = std::env::var("NGROK_ADDR")
        .map(|d| d.parse::<SocketAddr>().expect("NGROK_ADDR can't be parsed."))
        .ok();

    let mut dispatcher = Dispatcher::builder(bot.clone(), schema())
        .dependencies(dptree::deps![InMemStorage::<QuizState>::new(), bank, audit])
        .enable_ctrlc_handler()
        .build();

    if let (Some(ngrok_url), Some(ngrok_addr)) = (ngrok_url, ngrok_addr) {
        let listener = webhooks::axum(bot, Options::new(ngrok_addr, ngrok_url))
            .await
            .expect("Failed to build a listener.");
        dispatcher
            .dispatch_with_listener(listener, Arc::new(IgnoringErrorHandlerSafe))
            .await
    } else {
        dispatcher.dispatch().await
    }
}

#[instrument(level = "debug")]
fn schema() -> UpdateHandler<Box<dyn Error + Send + Sync + 'static>> {
    use dptree::case;

    let command_handler = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Help].endpoint(help))
        .branch(case![Command::Start].endpoint(start))
        .branch(case![Command::Cancel].endpoint(cancel));

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(case![QuizState::Start].endpoint(runner::pick_section))
        .endpoint(invalid_state);

    let callback_handler = Update::filter_callback_query()
        .branch(case![QuizState::Answering { session }].endpoint(runner::take_answer))
        .branch(case![QuizState::Reporting { report }].endpoint(runner::report_action));

    dialogue::enter::<Update, InMemStorage<QuizState>, QuizState, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

#[instrument(level = "info")]
async fn invalid_state(bot: Bot, msg: Message) -> HandlerResult {
    log::info!("chat {}: invalid input '{:?}'", msg.chat.id, msg.text());
    bot.send_message(
        msg.chat.id,
        "Unable to handle the message. Enter /help to see usages.",
    )
    .await?;
    Ok(())
}
