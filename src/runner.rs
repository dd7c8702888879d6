use std::collections::BTreeSet;
use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::GetChatId,
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    types::{CallbackQuery, ChatId, InputFile, Message, ReplyMarkup},
    Bot,
};
use tracing::instrument;
use url::Url;

use crate::{
    audit::{AuditEvent, AuditLog},
    bank::QuestionBank,
    engine::{QuestionView, QuizSession, Report, Step, View},
    intent::Intent,
    keyboard::{options_keyboard, report_keyboard, sections_keyboard},
    state::QuizState,
    HandlerResult, UserDialogue,
};

#[instrument(level = "info", skip(bank, audit))]
pub(crate) async fn pick_section(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    bank: Arc<QuestionBank>,
    audit: AuditLog,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "Please choose a section from the keyboard.")
            .await?;
        return Ok(());
    };

    match bank.get(text) {
        Some(section) if section.questions().is_empty() => {
            log::info!(
                "{} picked empty section '{}'",
                message_user(&msg),
                section.name()
            );
            bot.send_message(
                msg.chat.id,
                format!("Sorry, no questions in '{}' yet.", section.name()),
            )
            .await?;
        }
        Some(section) => {
            let user = message_user(&msg);
            log::info!("{} starts section '{}'", user, section.name());
            audit.record(AuditEvent::SessionStarted {
                user,
                section: section.name().to_owned(),
            });

            let session = QuizSession::start(section.name());

            bot.send_message(msg.chat.id, "Let's begin!")
                .reply_markup(ReplyMarkup::kb_remove())
                .await?;
            if let View::Question(view) = session.next_view(section) {
                send_question(&bot, msg.chat.id, &view).await?;
            }
            dialogue.update(QuizState::Answering { session }).await?;
        }
        None => {
            log::info!("{}: unknown section '{}'", message_user(&msg), text);
            bot.send_message(
                msg.chat.id,
                "Invalid input. Please choose a section from the keyboard.",
            )
            .await?;
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bank, audit))]
pub(crate) async fn take_answer(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    session: QuizSession,
    bank: Arc<QuestionBank>,
    audit: AuditLog,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };
    let Some(section) = bank.get(session.category()) else {
        log::error!("section '{}' is missing from the bank", session.category());
        dialogue.update(QuizState::Start).await?;
        return Ok(());
    };

    match q.data.as_deref().and_then(Intent::parse) {
        Some(Intent::Toggle(index)) => {
            let mut session = session;
            let option_count = section
                .questions()
                .get(session.question_index())
                .map(|question| question.options().len())
                .unwrap_or(0);

            if !session.toggle(index, option_count) {
                log::warn!(
                    "{}: toggle index {} out of range",
                    callback_user(&q),
                    index
                );
                return Ok(());
            }

            if let (Some(message), View::Question(view)) = (&q.message, session.next_view(section))
            {
                bot.edit_message_text(chat_id, message.id(), question_text(&view))
                    .reply_markup(options_keyboard(&view))
                    .await?;
            }
            dialogue.update(QuizState::Answering { session }).await?;
        }
        Some(Intent::Confirm) => match session.confirm(section) {
            Step::Next(session) => {
                if let View::Question(view) = session.next_view(section) {
                    present_next(&bot, chat_id, &q, &view).await?;
                }
                dialogue.update(QuizState::Answering { session }).await?;
            }
            Step::Done(report) => {
                let user = callback_user(&q);
                log::info!(
                    "{} finished '{}' with {}/{} ({}%, {})",
                    user,
                    report.section,
                    report.score,
                    report.total,
                    report.percent,
                    report.grade
                );
                audit.record(AuditEvent::SessionCompleted {
                    user,
                    section: report.section.clone(),
                    score: report.score,
                    total: report.total,
                });

                let summary = report_text(&report);
                let keyboard = report_keyboard(!report.missed.is_empty());
                match &q.message {
                    Some(message) => {
                        bot.edit_message_text(chat_id, message.id(), summary)
                            .reply_markup(keyboard)
                            .await?;
                    }
                    None => {
                        bot.send_message(chat_id, summary)
                            .reply_markup(keyboard)
                            .await?;
                    }
                }
                dialogue.update(QuizState::Reporting { report }).await?;
            }
        },
        other => {
            log::info!(
                "{}: unexpected callback {:?} while answering",
                callback_user(&q),
                other
            );
        }
    }

    Ok(())
}

#[instrument(level = "info", skip(bank))]
pub(crate) async fn report_action(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
    report: Report,
    bank: Arc<QuestionBank>,
) -> HandlerResult {
    bot.answer_callback_query(&q.id).await?;

    let Some(chat_id) = q.chat_id() else {
        return Ok(());
    };

    match q.data.as_deref().and_then(Intent::parse) {
        Some(Intent::Details) => {
            log::info!(
                "{} views details for '{}'",
                callback_user(&q),
                report.section
            );
            bot.send_message(chat_id, details_text(&report))
                .reply_markup(report_keyboard(false))
                .await?;
        }
        Some(Intent::Restart) => {
            log::info!("{} restarts after '{}'", callback_user(&q), report.section);
            dialogue.update(QuizState::Start).await?;
            bot.send_message(chat_id, "Choose a section to test yourself in:")
                .reply_markup(sections_keyboard(&bank.section_names()))
                .await?;
        }
        other => {
            log::info!(
                "{}: unexpected callback {:?} on the report",
                callback_user(&q),
                other
            );
        }
    }

    Ok(())
}

async fn send_question(bot: &Bot, chat_id: ChatId, view: &QuestionView<'_>) -> HandlerResult {
    if let Some(image) = view.question.image() {
        // the picture is decoration, the question must go out either way
        if let Err(e) = bot.send_photo(chat_id, photo_input(image)).await {
            log::warn!("failed to send question image: {e}");
        }
    }

    bot.send_message(chat_id, question_text(view))
        .reply_markup(options_keyboard(view))
        .await?;
    Ok(())
}

/// Advances the chat to the next question: edits in place when it can, falls
/// back to a fresh send (clearing the stale keyboard first) when the next
/// question carries an image.
async fn present_next(
    bot: &Bot,
    chat_id: ChatId,
    q: &CallbackQuery,
    view: &QuestionView<'_>,
) -> HandlerResult {
    match &q.message {
        Some(message) if view.question.image().is_none() => {
            bot.edit_message_text(chat_id, message.id(), question_text(view))
                .reply_markup(options_keyboard(view))
                .await?;
        }
        maybe_message => {
            if let Some(message) = maybe_message {
                if let Err(e) = bot.edit_message_reply_markup(chat_id, message.id()).await {
                    log::debug!("failed to clear stale keyboard: {e}");
                }
            }
            send_question(bot, chat_id, view).await?;
        }
    }
    Ok(())
}

fn question_text(view: &QuestionView<'_>) -> String {
    format!(
        "Question #{} of {}\n{}",
        view.index + 1,
        view.total,
        view.question.text()
    )
}

fn report_text(report: &Report) -> String {
    format!(
        "✅ Correct answers: {} of {} ({}%)\nGrade: {}",
        report.score, report.total, report.percent, report.grade
    )
}

fn details_text(report: &Report) -> String {
    let blocks: Vec<String> = report
        .missed
        .iter()
        .map(|missed| {
            format!(
                "❓ {}\nYour answer: {}\nCorrect answer: {}",
                missed.text,
                labels(&missed.options, &missed.selected),
                labels(&missed.options, &missed.correct)
            )
        })
        .collect();

    blocks.join("\n\n")
}

fn labels(options: &[String], picked: &BTreeSet<usize>) -> String {
    if picked.is_empty() {
        return "nothing".to_owned();
    }

    picked
        .iter()
        .filter_map(|&index| options.get(index))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn photo_input(image: &str) -> InputFile {
    match Url::parse(image) {
        Ok(url) => InputFile::url(url),
        Err(_) => InputFile::file_id(image),
    }
}

fn message_user(msg: &Message) -> String {
    match msg.chat.username() {
        Some(name) => name.to_owned(),
        None => msg.chat.id.to_string(),
    }
}

fn callback_user(q: &CallbackQuery) -> String {
    match &q.from.username {
        Some(name) => name.clone(),
        None => q.from.full_name(),
    }
}
