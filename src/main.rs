mod config;
mod formatter;
mod gateway;
mod handlers;
mod prompt;
mod providers;
mod reveal;
mod runner;
mod session;
mod text;

use std::sync::Arc;

use anyhow::Result;
use config::Config;
use gateway::ModelGateway;
use handlers::{
    copy_handler, edit_handler, export_handler, generate_handler, help_handler, message_handler,
    options_handler, set_handler, start_handler, status_handler, tools_handler, use_handler,
};
use session::AppState;
use teloxide::prelude::*;
use teloxide::types::Me;
use teloxide::utils::command::BotCommands;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Load configuration
    let config = Config::from_file("config.toml")?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filter)
        .init();
    log::info!("Starting Cutverse bot...");
    log::info!("Configuration loaded successfully");

    // Ensure output directories exist
    config.ensure_directories()?;
    log::info!("Output directories verified");

    let gateway = ModelGateway::from_config(&config)?;
    log::info!(
        "Model gateway ready (text: {}, image: {})",
        gateway.text_provider(),
        gateway.image_provider().unwrap_or("disabled")
    );

    // Create bot instance
    let bot = Bot::new(&config.telegram.bot_token);
    log::info!("Bot instance created");

    // Get bot info
    let me = bot.get_me().await?;
    log::info!("Bot started as @{}", me.username());

    // Print startup info
    println!("🤖 Cutverse bot is running!");
    println!("   Username: @{}", me.username());
    println!("   Press Ctrl+C to stop");

    let state = Arc::new(AppState::new(config, gateway));

    let handler = dptree::entry()
        // Handle commands
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        // Everything else is tool input
        .branch(Update::filter_message().endpoint(message_handler));

    // Start the dispatcher
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    log::info!("Bot stopped");
    Ok(())
}

/// Command enumeration
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Show bot status")]
    Status,
    #[command(description = "List all tools")]
    Tools,
    #[command(description = "Select a tool: /use <tool-id>")]
    Use(String),
    #[command(description = "Show the active tool's fields")]
    Options,
    #[command(description = "Set a field: /set <field> <value>")]
    Set(String),
    #[command(description = "Run the active tool again")]
    Generate,
    #[command(description = "Edit the result: /edit [text]")]
    Edit(String),
    #[command(description = "Send the result as plain text")]
    Copy,
    #[command(description = "Download the generated image")]
    Export,
}

/// Command handler that routes to specific command functions
async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    me: Me,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => start_handler(bot, msg, me).await,
        Command::Help => help_handler(bot, msg).await,
        Command::Status => status_handler(bot, msg, state).await,
        Command::Tools => tools_handler(bot, msg).await,
        Command::Use(id) => use_handler(bot, msg, state, id).await,
        Command::Options => options_handler(bot, msg, state).await,
        Command::Set(args) => set_handler(bot, msg, state, args).await,
        Command::Generate => generate_handler(bot, msg, state).await,
        Command::Edit(text) => edit_handler(bot, msg, state, text).await,
        Command::Copy => copy_handler(bot, msg, state).await,
        Command::Export => export_handler(bot, msg, state).await,
    }
}
