use std::sync::Arc;

use teloxide::{
    payloads::SendMessageSetters, prelude::Requester, types::Message, utils::command::BotCommands,
    Bot,
};

use crate::{
    bank::QuestionBank, keyboard::sections_keyboard, state::QuizState, HandlerResult, UserDialogue,
};

#[derive(Debug, Clone, BotCommands)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "display help.")]
    Help,
    #[command(description = "choose a section to test yourself in")]
    Start,
    #[command(description = "abandon the current test")]
    Cancel,
}

pub(crate) async fn help(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, Command::descriptions().to_string())
        .await?;
    Ok(())
}

pub(crate) async fn start(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    bank: Arc<QuestionBank>,
) -> HandlerResult {
    bot.send_message(msg.chat.id, "Choose a section to test yourself in:")
        .reply_markup(sections_keyboard(&bank.section_names()))
        .await?;
    dialogue.update(QuizState::Start).await?;
    Ok(())
}

pub(crate) async fn cancel(
    bot: Bot,
    dialogue: UserDialogue,
    msg: Message,
    bank: Arc<QuestionBank>,
) -> HandlerResult {
    dialogue.update(QuizState::Start).await?;
    bot.send_message(msg.chat.id, "Cancelled. Choose a section to try again:")
        .reply_markup(sections_keyboard(&bank.section_names()))
        .await?;
    Ok(())
}
