mod chat_lock;
mod config;
mod quiz;
mod telegram;

use std::sync::Arc;

use dotenv::dotenv;
use teloxide::{dispatching::dialogue::InMemStorage, prelude::*, utils::command::BotCommands};

use chat_lock::ChatLocks;
use config::Config;
use quiz::{Board, Delays, HttpQuestionSource, QuestionSource, QuizController, ScheduledAdvance};
use telegram::ChatView;

type QuizDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, Debug)]
pub enum State {
    #[default]
    Idle,
    Quiz {
        controller: QuizController,
        board: Board,
        view: ChatView,
    },
}

#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Các lệnh được hỗ trợ:")]
enum Command {
    #[command(description = "bắt đầu bài kiểm tra.")]
    Start,
    #[command(description = "làm lại bài kiểm tra từ đầu.")]
    Restart,
    #[command(description = "hiển thị danh sách lệnh.")]
    Help,
}

const IDLE_HINT_TEXT: &str = "Gõ /start để bắt đầu bài kiểm tra.";

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting quiz bot...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            return;
        }
    };

    let source: Arc<dyn QuestionSource> =
        match HttpQuestionSource::new(config.questions_url.clone(), config.fetch_timeout) {
            Ok(source) => Arc::new(source),
            Err(err) => {
                log::error!("Unable to build the HTTP client: {}", err);
                return;
            }
        };
    log::info!("Questions will be fetched from {}", config.questions_url);

    let bot = Bot::from_env();

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .enter_dialogue::<Message, InMemStorage<State>, State>()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(command),
                )
                .branch(
                    dptree::case![State::Quiz {
                        controller,
                        board,
                        view
                    }]
                    .endpoint(short_answer),
                )
                .branch(dptree::endpoint(idle_message)),
        )
        .branch(
            Update::filter_callback_query()
                .enter_dialogue::<CallbackQuery, InMemStorage<State>, State>()
                .branch(
                    dptree::case![State::Quiz {
                        controller,
                        board,
                        view
                    }]
                    .endpoint(option_selected),
                )
                .branch(dptree::endpoint(stale_callback)),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![
            InMemStorage::<State>::new(),
            source,
            config.delays,
            ChatLocks::default()
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    cmd: Command,
    source: Arc<dyn QuestionSource>,
    delays: Delays,
    locks: ChatLocks,
) -> HandlerResult {
    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Start | Command::Restart => {
            start_quiz(bot, dialogue, source.as_ref(), delays, &locks).await?;
        }
    }
    Ok(())
}

/// The chat's running quiz, read fresh from storage. Callers hold the chat's
/// lock, so nothing else writes it until they store it back.
async fn running_quiz(
    dialogue: &QuizDialogue,
) -> Result<Option<(QuizController, Board, ChatView)>, Box<dyn std::error::Error + Send + Sync>> {
    match dialogue.get().await? {
        Some(State::Quiz {
            controller,
            board,
            view,
        }) => Ok(Some((controller, board, view))),
        _ => Ok(None),
    }
}

/// Starts a fresh quiz. A running one is reset first, so its pending
/// advance becomes stale.
async fn start_quiz(
    bot: Bot,
    dialogue: QuizDialogue,
    source: &dyn QuestionSource,
    delays: Delays,
    locks: &ChatLocks,
) -> HandlerResult {
    let chat_id = dialogue.chat_id();
    let _guard = locks.lock(chat_id).await;

    let mut controller = match running_quiz(&dialogue).await? {
        Some((mut controller, _, view)) => {
            telegram::retire(&bot, chat_id, &view).await;
            controller.reset();
            controller
        }
        None => QuizController::new(delays),
    };
    let mut board = Board::new();
    let mut view = ChatView::default();

    if controller.mount(&mut board).is_ok() {
        controller.load(source, &mut board).await?;
    }

    telegram::sync(
        &bot,
        chat_id,
        &mut board,
        &mut view,
        controller.session().current_index(),
    )
    .await?;
    dialogue
        .update(State::Quiz {
            controller,
            board,
            view,
        })
        .await?;
    Ok(())
}

async fn short_answer(
    bot: Bot,
    dialogue: QuizDialogue,
    locks: ChatLocks,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let _guard = locks.lock(msg.chat.id).await;
    let Some((mut controller, mut board, mut view)) = running_quiz(&dialogue).await? else {
        return Ok(());
    };

    let ticket = match controller.submit_short_answer(text, &mut board) {
        Ok(ticket) => ticket,
        Err(err) => {
            log::debug!("Ignoring message in chat {}: {}", msg.chat.id, err);
            return Ok(());
        }
    };

    telegram::sync(
        &bot,
        msg.chat.id,
        &mut board,
        &mut view,
        controller.session().current_index(),
    )
    .await?;
    dialogue
        .update(State::Quiz {
            controller,
            board,
            view,
        })
        .await?;
    schedule_advance(bot, dialogue, locks.clone(), ticket);
    Ok(())
}

async fn option_selected(
    bot: Bot,
    dialogue: QuizDialogue,
    locks: ChatLocks,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    // Disabled buttons carry a payload that doesn't parse.
    let Some((index, position)) = q.data.as_deref().and_then(telegram::parse_callback) else {
        return Ok(());
    };

    let chat_id = dialogue.chat_id();
    let _guard = locks.lock(chat_id).await;
    let Some((mut controller, mut board, mut view)) = running_quiz(&dialogue).await? else {
        return Ok(());
    };
    if index != controller.session().current_index() {
        log::debug!(
            "Ignoring click on question {} (current {})",
            index,
            controller.session().current_index()
        );
        return Ok(());
    }
    let Some(key) = board.option_key(position).map(str::to_owned) else {
        log::debug!("Ignoring click on missing option {}", position);
        return Ok(());
    };

    let ticket = match controller.select_option(&key, &mut board) {
        Ok(ticket) => ticket,
        Err(err) => {
            log::debug!("Ignoring click in chat {}: {}", chat_id, err);
            return Ok(());
        }
    };

    telegram::sync(
        &bot,
        chat_id,
        &mut board,
        &mut view,
        controller.session().current_index(),
    )
    .await?;
    dialogue
        .update(State::Quiz {
            controller,
            board,
            view,
        })
        .await?;
    schedule_advance(bot, dialogue, locks.clone(), ticket);
    Ok(())
}

async fn idle_message(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, IDLE_HINT_TEXT).await?;
    Ok(())
}

async fn stale_callback(bot: Bot, q: CallbackQuery) -> HandlerResult {
    bot.answer_callback_query(q.id).await?;
    Ok(())
}

/// Waits out the feedback delay on its own task, then moves the chat's quiz
/// forward unless the ticket went stale in the meantime.
fn schedule_advance(bot: Bot, dialogue: QuizDialogue, locks: ChatLocks, ticket: ScheduledAdvance) {
    tokio::spawn(async move {
        let ticket = ticket.elapsed().await;
        if let Err(err) = advance(&bot, &dialogue, &locks, ticket).await {
            log::error!(
                "Failed to advance the quiz in chat {}: {}",
                dialogue.chat_id(),
                err
            );
        }
    });
}

async fn advance(
    bot: &Bot,
    dialogue: &QuizDialogue,
    locks: &ChatLocks,
    ticket: ScheduledAdvance,
) -> HandlerResult {
    let _guard = locks.lock(dialogue.chat_id()).await;
    let Some((mut controller, mut board, mut view)) = running_quiz(dialogue).await? else {
        return Ok(());
    };
    if !controller.advance(ticket, &mut board) {
        return Ok(());
    }

    telegram::sync(
        bot,
        dialogue.chat_id(),
        &mut board,
        &mut view,
        controller.session().current_index(),
    )
    .await?;
    dialogue
        .update(State::Quiz {
            controller,
            board,
            view,
        })
        .await?;
    Ok(())
}
