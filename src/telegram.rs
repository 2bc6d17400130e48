//! Mirrors a [`Board`] into a Telegram chat.
//!
//! The question text region is the latest question message, the answers
//! region is its inline keyboard, and the score region is one message that
//! gets edited in place. Notices and container errors go out as plain
//! messages.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use teloxide::RequestError;

use crate::quiz::surface::{Board, Change, Control, Mark};

/// Callback payload of a disabled button.
const INERT_CALLBACK: &str = "-";
const SCORE_LABEL: &str = "Điểm: ";

/// Ids of the messages standing in for the board's regions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatView {
    question_message: Option<MessageId>,
    score_message: Option<MessageId>,
    shown_score: Option<u32>,
}

/// Option buttons carry the question index so a click on an old message
/// cannot answer the current question. The option is referred to by its
/// position, since keys can be longer than Telegram's 64-byte payload limit.
pub fn callback_data(question_index: usize, position: usize) -> String {
    format!("{}:{}", question_index, position)
}

pub fn parse_callback(data: &str) -> Option<(usize, usize)> {
    let (index, position) = data.split_once(':')?;
    Some((index.parse().ok()?, position.parse().ok()?))
}

pub fn question_body(board: &Board) -> String {
    let mut body = board.question_text().to_string();
    for control in board.controls() {
        if let Control::TextInput {
            placeholder,
            disabled: false,
        } = control
        {
            body.push_str("\n\n");
            body.push_str(placeholder);
        }
    }
    body
}

pub fn keyboard(board: &Board, question_index: usize) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = board
        .controls()
        .iter()
        .filter_map(|control| match control {
            Control::Option {
                label,
                mark,
                disabled,
                ..
            } => {
                let text = match mark {
                    Some(Mark::Correct) => format!("✅ {}", label),
                    Some(Mark::Wrong) => format!("❌ {}", label),
                    None => label.clone(),
                };
                Some((text, *disabled))
            }
            _ => None,
        })
        .enumerate()
        .map(|(position, (text, disabled))| {
            let data = if disabled {
                INERT_CALLBACK.to_string()
            } else {
                callback_data(question_index, position)
            };
            vec![InlineKeyboardButton::callback(text, data)]
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(rows))
    }
}

/// Replays the board's pending changes into the chat.
pub async fn sync(
    bot: &Bot,
    chat_id: ChatId,
    board: &mut Board,
    view: &mut ChatView,
    question_index: usize,
) -> Result<(), RequestError> {
    let mut question_changed = false;
    let mut answers_changed = false;
    let mut score_changed = false;
    let mut notices = Vec::new();

    for change in board.take_changes() {
        match change {
            Change::ContainerError(message) => {
                bot.send_message(chat_id, message).await?;
            }
            Change::QuestionText | Change::AnswersReplaced => question_changed = true,
            Change::AnswersUpdated => answers_changed = true,
            Change::Score => score_changed = true,
            Change::Notice(message) => notices.push(message),
        }
    }

    if question_changed {
        send_question(bot, chat_id, board, view, question_index).await?;
    } else if answers_changed {
        if let (Some(message_id), Some(markup)) =
            (view.question_message, keyboard(board, question_index))
        {
            bot.edit_message_reply_markup(chat_id, message_id)
                .reply_markup(markup)
                .await?;
        }
    }

    for notice in notices {
        bot.send_message(chat_id, notice).await?;
    }

    if score_changed {
        update_score(bot, chat_id, board, view).await?;
    }
    Ok(())
}

/// Strips the keyboard from the last question so it can't be clicked after
/// a restart.
pub async fn retire(bot: &Bot, chat_id: ChatId, view: &ChatView) {
    let Some(message_id) = view.question_message else {
        return;
    };
    if let Err(err) = bot.edit_message_reply_markup(chat_id, message_id).await {
        log::debug!("Could not clear old keyboard: {}", err);
    }
}

async fn send_question(
    bot: &Bot,
    chat_id: ChatId,
    board: &Board,
    view: &mut ChatView,
    question_index: usize,
) -> Result<(), RequestError> {
    let body = question_body(board);
    if body.is_empty() {
        return Ok(());
    }

    let mut request = bot.send_message(chat_id, body);
    if let Some(markup) = keyboard(board, question_index) {
        request = request.reply_markup(markup);
    }
    let message = request.await?;
    view.question_message = Some(message.id);
    Ok(())
}

async fn update_score(
    bot: &Bot,
    chat_id: ChatId,
    board: &Board,
    view: &mut ChatView,
) -> Result<(), RequestError> {
    let Some(score) = board.score() else {
        return Ok(());
    };
    // Telegram refuses edits that leave the text unchanged.
    if view.shown_score == Some(score) {
        return Ok(());
    }

    let text = format!("{}{}", SCORE_LABEL, score);
    match view.score_message {
        Some(message_id) => {
            bot.edit_message_text(chat_id, message_id, text).await?;
        }
        None => {
            let message = bot.send_message(chat_id, text).await?;
            view.score_message = Some(message.id);
        }
    }
    view.shown_score = Some(score);
    Ok(())
}
