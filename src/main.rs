mod config;
mod quiz;

use std::sync::Arc;

use config::Config;
use dotenv::dotenv;
use quiz::{
    generator::QuizGenerator,
    loader,
    render::{self, Screen},
    session::{Advance, QuizSession},
    QuizError,
};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode, ReplyMarkup},
    utils::command::BotCommands,
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Per-chat dialogue state. Each chat owns its own session.
#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    ReceiveTopic {
        session: QuizSession,
    },
    Quiz {
        session: QuizSession,
    },
}

impl State {
    fn into_session(self) -> QuizSession {
        match self {
            State::Start => QuizSession::new(),
            State::ReceiveTopic { session } | State::Quiz { session } => session,
        }
    }

    /// A chat that has not been greeted yet should read its next message as a topic.
    fn awaiting_topic(self) -> Self {
        match self {
            State::Start => State::ReceiveTopic {
                session: QuizSession::new(),
            },
            other => other,
        }
    }
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
enum Command {
    #[command(description = "start over.")]
    Start,
    #[command(description = "show this text.")]
    Help,
    #[command(description = "drop the current quiz and pick a new topic.")]
    Restart,
    #[command(description = "write a new quiz about a topic, e.g. /topic volcanoes")]
    Topic(String),
}

type QuizStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv().is_ok();

    pretty_env_logger::init();
    log::info!("Starting quiz bot...");
    if !dotenv_loaded {
        log::debug!("No .env file found, reading settings from the environment only");
    }

    let config = Config::from_env()?;
    log::info!(
        "Using {} with {} questions per quiz",
        config.engine,
        config.question_count
    );

    let bot = Bot::new(&config.telegram_token);
    let storage: QuizStorage = InMemStorage::<State>::new().erase();
    let generator = Arc::new(QuizGenerator::new(config.chat_gpt()?, config.question_count));

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::entry().filter_command::<Command>().endpoint(command))
            .branch(dptree::case![State::Start].endpoint(start))
            .branch(dptree::case![State::ReceiveTopic { session }].endpoint(receive_topic))
            .branch(dptree::case![State::Quiz { session }].endpoint(quiz_step)),
    )
    .dependencies(dptree::deps![storage, generator])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;

    Ok(())
}

async fn start(bot: Bot, dialogue: QuizDialogue, msg: Message) -> HandlerResult {
    send_screen(&bot, msg.chat.id, render::welcome()).await?;

    dialogue
        .update(State::ReceiveTopic {
            session: QuizSession::new(),
        })
        .await?;
    Ok(())
}

async fn command(
    bot: Bot,
    dialogue: QuizDialogue,
    generator: Arc<QuizGenerator>,
    cmd: Command,
    msg: Message,
) -> HandlerResult {
    let state = dialogue.get_or_default().await?;

    match cmd {
        Command::Start => start(bot, dialogue, msg).await,
        Command::Help => {
            let session = state.into_session();
            let help = Screen {
                text: Command::descriptions().to_string(),
                buttons: render::current(&session).buttons,
            };
            send_screen(&bot, msg.chat.id, help).await
        }
        Command::Restart => restart(&bot, &dialogue, state.into_session(), msg.chat.id).await,
        Command::Topic(topic) => {
            let topic = topic.trim();
            if topic.is_empty() {
                bot.send_message(msg.chat.id, "Usage: /topic <quiz topic>")
                    .await?;
                return Ok(());
            }
            // A failed load leaves this state in place
            let state = state.awaiting_topic();
            let session = state.clone().into_session();
            dialogue.update(state).await?;
            load_topic(&bot, &dialogue, &generator, session, topic, msg.chat.id).await
        }
    }
}

async fn receive_topic(
    bot: Bot,
    dialogue: QuizDialogue,
    generator: Arc<QuizGenerator>,
    session: QuizSession,
    msg: Message,
) -> HandlerResult {
    match msg.text().and_then(render::parse_topic) {
        Some(topic) => load_topic(&bot, &dialogue, &generator, session, topic, msg.chat.id).await,
        None => send_screen(&bot, msg.chat.id, render::topic_prompt()).await,
    }
}

/// Generates and loads a new question set. On any failure the chat keeps
/// its previous session and state.
async fn load_topic(
    bot: &Bot,
    dialogue: &QuizDialogue,
    generator: &QuizGenerator,
    mut session: QuizSession,
    topic: &str,
    chat_id: ChatId,
) -> HandlerResult {
    send_screen(bot, chat_id, render::generating(topic)).await?;
    // Only cosmetic, so a failure here is not worth aborting the load
    let _ = bot.send_chat_action(chat_id, ChatAction::Typing).await;

    let raw = match generator.generate(topic).await {
        Ok(raw) => raw,
        Err(err) => {
            log::error!("Quiz generation failed for {:?}: {}", topic, err);
            return send_screen(bot, chat_id, render::generation_failed(&session)).await;
        }
    };

    let loaded = loader::load(&raw).and_then(|questions| session.load(questions));
    if let Err(err) = loaded {
        log::warn!("Could not load a quiz about {:?}: {}", topic, err);
        if let QuizError::MalformedQuestionSet { raw, .. } = &err {
            log::debug!("Generator output: {}", raw);
        }
        return send_screen(bot, chat_id, render::load_failed(&err, &session)).await;
    }

    log::info!("Loaded {} questions about {:?}", session.total(), topic);
    send_screen(bot, chat_id, render::loaded(&session)).await?;
    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn quiz_step(
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: QuizSession,
    msg: Message,
) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim) else {
        return send_screen(&bot, msg.chat.id, render::hint(&session)).await;
    };

    match text {
        render::START_BUTTON | render::NEXT_BUTTON | render::FINISH_BUTTON => {
            match session.advance()? {
                Advance::Question(question) => log::debug!("Next question: {:?}", question.text()),
                Advance::Finished(summary) => {
                    log::info!("Quiz finished with {}/{}", summary.score, summary.total)
                }
            }
            send_screen(&bot, msg.chat.id, render::current(&session)).await?;
        }
        render::RESTART_BUTTON => {
            return restart(&bot, &dialogue, session, msg.chat.id).await;
        }
        answer => {
            let option = session
                .current_question()
                .and_then(|question| render::parse_option(question, answer));
            let Some(option) = option else {
                return send_screen(&bot, msg.chat.id, render::hint(&session)).await;
            };

            let verdict = session.submit_answer(option)?;
            send_screen(&bot, msg.chat.id, render::verdict(&session, verdict)).await?;
        }
    }

    dialogue.update(State::Quiz { session }).await?;
    Ok(())
}

async fn restart(
    bot: &Bot,
    dialogue: &QuizDialogue,
    mut session: QuizSession,
    chat_id: ChatId,
) -> HandlerResult {
    session.restart();
    send_screen(bot, chat_id, render::topic_prompt()).await?;

    dialogue.update(State::ReceiveTopic { session }).await?;
    Ok(())
}

async fn send_screen(bot: &Bot, chat_id: ChatId, screen: Screen) -> HandlerResult {
    let markup = if screen.buttons.is_empty() {
        ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
    } else {
        let rows = screen
            .buttons
            .into_iter()
            .map(|row| row.into_iter().map(KeyboardButton::new).collect::<Vec<_>>());
        ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard(true))
    };

    bot.send_message(chat_id, screen.text)
        .parse_mode(ParseMode::Html)
        .reply_markup(markup)
        .await?;
    Ok(())
}
