use dotenvy::dotenv;
use flipbook::config::Settings;
use flipbook::pager::{Book, ExecMode, PageLayout, Session, TextPager};
use flipbook::transport::telegram::{EventHub, TelegramTransport};
use flipbook::transport::{ChannelId, MessageId, MessageRef, ReplyEvent, TriggerEvent, UserId};
use flipbook::Document;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{Me, User};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Paginated viewer commands:")]
enum Command {
    #[command(description = "show this help")]
    Start,
    #[command(description = "show this help")]
    Help,
    #[command(description = "open a small demo book")]
    Demo,
    #[command(description = "read the given text as a paginated book")]
    Read(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::new()?;
    let bot = Bot::new(settings.telegram_token.clone());
    let hub = Arc::new(EventHub::new(64));
    let transport = Arc::new(TelegramTransport::new(bot.clone(), Arc::clone(&hub)));

    info!("starting flipbook bot");

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(on_callback))
        .branch(Update::filter_message().endpoint(on_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![hub, transport, Arc::new(settings)])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Answers the callback query and forwards it to the hub as a trigger event.
async fn on_callback(bot: Bot, query: CallbackQuery, hub: Arc<EventHub>) -> ResponseResult<()> {
    bot.answer_callback_query(query.id.clone()).await?;

    if let (Some(symbol), Some(message)) = (query.data, query.message) {
        hub.publish_trigger(TriggerEvent {
            symbol,
            message: MessageRef {
                channel: ChannelId(message.chat().id.0),
                id: MessageId(message.id().0),
            },
            user: UserId(query.from.id.0),
        });
    }
    Ok(())
}

/// Feeds every text message to the hub (open prompts may be waiting for it),
/// then handles bot commands.
async fn on_message(
    bot: Bot,
    me: Me,
    msg: Message,
    hub: Arc<EventHub>,
    transport: Arc<TelegramTransport>,
    settings: Arc<Settings>,
) -> ResponseResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    hub.publish_reply(ReplyEvent {
        message: MessageRef {
            channel: ChannelId(msg.chat.id.0),
            id: MessageId(msg.id.0),
        },
        user: UserId(user.id.0),
        text: text.to_owned(),
    });

    let Ok(command) = Command::parse(text, me.username()) else {
        return Ok(());
    };

    match command {
        Command::Start | Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Demo => match demo_book(&settings) {
            Ok(book) => spawn_session(transport, &settings, &msg, &user, book),
            Err(err) => warn!(error = %err, "could not build demo book"),
        },
        Command::Read(text) => {
            if text.trim().is_empty() {
                bot.send_message(msg.chat.id, "Usage: /read <some text to paginate>")
                    .await?;
                return Ok(());
            }
            match read_book(&settings, &text) {
                Ok(book) => spawn_session(transport, &settings, &msg, &user, book),
                Err(err) => {
                    bot.send_message(msg.chat.id, format!("Cannot paginate that: {err}"))
                        .await?;
                }
            }
        }
    }
    Ok(())
}

fn demo_book(settings: &Settings) -> anyhow::Result<Book> {
    let mut book = Book::new(settings.session_timeout())?;
    book.append(
        Document::new()
            .title("Welcome")
            .body("Navigate with the buttons below.")
            .field("tip", "🔢 jumps to a page number or offset", false),
    );
    book.append(Document::new().title("Second page").body("Not much here."));
    book.append(
        Document::new()
            .title("The end")
            .body("Close with ✅, or 🗑 to delete the whole thing.")
            .footer("flipbook demo"),
    );
    Ok(book)
}

fn read_book(settings: &Settings, text: &str) -> anyhow::Result<Book> {
    let mut pager = TextPager::new(
        "Reading",
        settings.session_timeout(),
        PageLayout {
            max_size: settings.page_max_size,
            ..PageLayout::default()
        },
    )?;
    pager.add_lines(text)?;
    Ok(pager.into_book())
}

fn spawn_session(
    transport: Arc<TelegramTransport>,
    settings: &Settings,
    msg: &Message,
    user: &User,
    book: Book,
) {
    let channel = ChannelId(msg.chat.id.0);
    let session = Session::new(transport, channel, UserId(user.id.0), book)
        .request(MessageRef {
            channel,
            id: MessageId(msg.id.0),
        })
        .prompt_timeout(settings.prompt_timeout())
        .mode(if settings.strict_handlers {
            ExecMode::Strict
        } else {
            ExecMode::Detached
        });

    tokio::spawn(async move {
        if let Err(err) = session.run().await {
            error!(error = %err, "viewer session failed");
        }
    });
}
