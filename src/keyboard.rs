use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::engine::QuestionView;
use crate::intent::Intent;

pub(crate) fn sections_keyboard(sections: &[&str]) -> KeyboardMarkup {
    let keyboard = sections
        .iter()
        .map(|section| vec![KeyboardButton::new(*section)]);

    KeyboardMarkup::new(keyboard)
}

/// One button per option in display order, prefixed with its toggle mark,
/// plus a confirm row. Payloads carry canonical indices.
pub(crate) fn options_keyboard(view: &QuestionView<'_>) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = view
        .order
        .iter()
        .map(|&index| {
            let option = &view.question.options()[index];
            let mark = if view.pending.contains(&index) {
                "✅"
            } else {
                "▫️"
            };
            vec![InlineKeyboardButton::callback(
                format!("{} {}", mark, option.label()),
                Intent::Toggle(index).data(),
            )]
        })
        .collect();

    keyboard.push(vec![InlineKeyboardButton::callback(
        "✅ Confirm",
        Intent::Confirm.data(),
    )]);

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn report_keyboard(with_details: bool) -> InlineKeyboardMarkup {
    let mut keyboard = Vec::new();

    if with_details {
        keyboard.push(vec![InlineKeyboardButton::callback(
            "📋 Details",
            Intent::Details.data(),
        )]);
    }
    keyboard.push(vec![InlineKeyboardButton::callback(
        "🔄 Restart",
        Intent::Restart.data(),
    )]);

    InlineKeyboardMarkup::new(keyboard)
}
