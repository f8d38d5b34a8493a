use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Me, MessageId, ParseMode};

use crate::prompt::{all_tools, Category, FieldKind, ParsedOutput, PromptFields, ToolTemplate};
use crate::reveal::{Reveal, RevealSettings, RevealSink};
use crate::runner::{export_file_name, Completion};
use crate::session::{AppState, Session};

/// Telegram rejects longer messages.
const MESSAGE_LIMIT: usize = 4096;
/// Plain chunks stay below the limit with some headroom.
const CHUNK_LIMIT: usize = 4000;

/// Handler for /start command
pub async fn start_handler(bot: Bot, msg: Message, me: Me) -> ResponseResult<()> {
    let text = format!(
        "👋 Hi! I'm {}, your AI writing and image assistant.\n\n\
        Pick a tool, send me a topic and I'll write it for you.\n\n\
        Commands:\n\
        /tools - List all tools\n\
        /use <tool-id> - Select a tool\n\
        /options - Show the tool's fields\n\
        /set <field> <value> - Change a field\n\
        /generate - Generate again\n\
        /edit [text] - Edit the result\n\
        /copy - Get the result as plain text\n\
        /export - Download the generated image\n\
        /status - Bot status\n\
        /help - How to use me",
        me.username()
    );

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handler for /help command
pub async fn help_handler(bot: Bot, msg: Message) -> ResponseResult<()> {
    let text = "📖 How to use me:\n\n\
        1️⃣ /tools to see what I can do\n\
        2️⃣ /use essay-writer (or any other tool id)\n\
        3️⃣ Optionally tune it: /options, then e.g. /set word_count 500\n\
        4️⃣ Send the topic as a normal message\n\n\
        💡 After a result:\n\
        - /generate writes a new version with the same inputs\n\
        - /edit shows the text so you can send back a corrected version\n\
        - /copy sends it as plain text\n\
        - /export sends a generated image as a PNG file\n\n\
        Choice fields accept the value or its label, e.g. /set class_level \"Class 8\".";

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handler for /status command
pub async fn status_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let config = &state.config;
    let image = match &config.image_model {
        Some(model) => format!("{} ({})", model.provider, model.model),
        None => "disabled".to_string(),
    };

    let session = state.session(msg.chat.id).await;
    let active = session_summary(&*session.lock().await);

    let text = format!(
        "🤖 Bot status\n\n\
        ✅ Online\n\
        📝 Text model: {} ({})\n\
        🎨 Image model: {}\n\
        ✨ Typewriter reveal: {}\n\
        🛠 Active tool: {}",
        config.text_model.provider,
        config.text_model.model,
        image,
        if config.reveal.enabled { "on" } else { "off" },
        active
    );

    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handler for /tools command
pub async fn tools_handler(bot: Bot, msg: Message) -> ResponseResult<()> {
    for chunk in split_message(&catalog_text(), CHUNK_LIMIT) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

/// Handler for /use command
pub async fn use_handler(bot: Bot, msg: Message, state: Arc<AppState>, id: String) -> ResponseResult<()> {
    if id.trim().is_empty() {
        bot.send_message(msg.chat.id, "Usage: /use <tool-id>. See /tools for the list.")
            .await?;
        return Ok(());
    }

    let session = state.session(msg.chat.id).await;
    let reply = {
        let mut session = session.lock().await;
        match session.select(&id) {
            Ok(template) => format!(
                "{}\n\nSend me the {} as a message to start.",
                options_text(template, session.fields()),
                template.primary_field().label.to_lowercase()
            ),
            Err(e) => format!("❌ {}", e),
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handler for /options command
pub async fn options_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let session = state.session(msg.chat.id).await;
    let reply = {
        let session = session.lock().await;
        match session.runner() {
            Some(runner) => options_text(runner.template(), session.fields()),
            None => "No tool selected. Use /use <tool-id> first.".to_string(),
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handler for /set command
pub async fn set_handler(bot: Bot, msg: Message, state: Arc<AppState>, args: String) -> ResponseResult<()> {
    let Some((field, value)) = args.trim().split_once(char::is_whitespace) else {
        bot.send_message(msg.chat.id, "Usage: /set <field> <value>. See /options for the fields.")
            .await?;
        return Ok(());
    };
    let value = value.trim().trim_matches('"');

    let session = state.session(msg.chat.id).await;
    let reply = {
        let mut session = session.lock().await;
        match session.set_field(field, value) {
            Ok(spec) => format!(
                "✅ {} set to {}",
                spec.label,
                session.fields().get(spec.name).unwrap_or(value)
            ),
            Err(e) => format!("❌ {}", e),
        }
    };

    bot.send_message(msg.chat.id, reply).await?;
    Ok(())
}

/// Handler for /generate command
pub async fn generate_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    run_tool(&bot, msg.chat.id, &state).await
}

/// Handler for /edit command
pub async fn edit_handler(bot: Bot, msg: Message, state: Arc<AppState>, text: String) -> ResponseResult<()> {
    if text.trim().is_empty() {
        let session = state.session(msg.chat.id).await;
        let current = session.lock().await.start_edit();
        match current {
            Ok(Some(current)) => {
                bot.send_message(
                    msg.chat.id,
                    "✏️ Send the corrected text as your next message. Current text:",
                )
                .await?;
                for chunk in split_message(&current, CHUNK_LIMIT) {
                    bot.send_message(msg.chat.id, chunk).await?;
                }
            }
            Ok(None) => {
                bot.send_message(msg.chat.id, "Nothing to edit yet.").await?;
            }
            Err(e) => {
                bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
            }
        }
        return Ok(());
    }

    save_edit(&bot, msg.chat.id, &state, &text).await
}

/// Handler for /copy command
pub async fn copy_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let session = state.session(msg.chat.id).await;
    let text = session.lock().await.runner().and_then(|r| r.copy_text());

    match text {
        Some(text) => {
            for chunk in split_message(&text, CHUNK_LIMIT) {
                bot.send_message(msg.chat.id, chunk).await?;
            }
        }
        None => {
            bot.send_message(msg.chat.id, "Nothing to copy yet.").await?;
        }
    }
    Ok(())
}

/// Handler for /export command
pub async fn export_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let session = state.session(msg.chat.id).await;
    let source = session.lock().await.runner().and_then(|r| r.image());
    let loaded = match source {
        Some(source) => Some(state.gateway.load_image(&source).await),
        None => None,
    };

    match loaded {
        Some(Ok(bytes)) => {
            let file_name = export_file_name(Utc::now());
            log::info!("Exporting {} for chat {}", file_name, msg.chat.id);
            bot.send_document(msg.chat.id, InputFile::memory(bytes).file_name(file_name))
                .await?;
        }
        Some(Err(e)) => {
            log::error!("Export failed: {:#}", e);
            bot.send_message(msg.chat.id, "❌ The image is no longer available. Try /generate.")
                .await?;
        }
        None => {
            bot.send_message(msg.chat.id, "No image to export yet.").await?;
        }
    }
    Ok(())
}

/// Handler for plain text messages: the tool's main input, or a pending edit
pub async fn message_handler(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "📝 Please send text. Use /help for instructions.")
            .await?;
        return Ok(());
    };

    let session = state.session(msg.chat.id).await;
    let editing = session.lock().await.is_editing();
    if editing {
        return save_edit(&bot, msg.chat.id, &state, text).await;
    }

    let assigned = session.lock().await.set_primary(text);
    if let Err(e) = assigned {
        bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
        return Ok(());
    }

    run_tool(&bot, msg.chat.id, &state).await
}

async fn save_edit(bot: &Bot, chat_id: ChatId, state: &AppState, text: &str) -> ResponseResult<()> {
    let session = state.session(chat_id).await;
    let saved = {
        let mut session = session.lock().await;
        session
            .save_edit(text)
            .map(|saved| saved.then(|| session.runner().and_then(|r| r.display_text())).flatten())
    };

    match saved {
        Err(e) => {
            bot.send_message(chat_id, format!("❌ {}", e)).await?;
        }
        Ok(Some(display)) => {
            bot.send_message(chat_id, "✅ Edit saved. /copy now uses your version.")
                .await?;
            send_html(bot, chat_id, &display, text).await?;
        }
        Ok(None) => {
            bot.send_message(chat_id, "Nothing to edit yet.").await?;
        }
    }
    Ok(())
}

/// Build the prompt, call the model and show the result.
async fn run_tool(bot: &Bot, chat_id: ChatId, state: &AppState) -> ResponseResult<()> {
    let session = state.session(chat_id).await;

    let begun = {
        let mut session = session.lock().await;
        match session.begin() {
            Ok(Some(pending)) => Ok(pending),
            Ok(None) => {
                let label = session
                    .runner()
                    .map(|r| r.template().primary_field().label.to_lowercase())
                    .unwrap_or_default();
                Err(format!("✍️ Please enter the {} first.", label))
            }
            Err(e) => Err(format!("❌ {}", e)),
        }
    };
    let pending = match begun {
        Ok(pending) => pending,
        Err(reply) => {
            bot.send_message(chat_id, reply).await?;
            return Ok(());
        }
    };

    let status_text = if pending.is_image {
        "🎨 Generating image..."
    } else {
        "⏳ Generating..."
    };
    let status = bot.send_message(chat_id, status_text).await?;

    // No lock is held while the request is in flight.
    let result = pending.send(&state.gateway).await;

    let mut guard = session.lock().await;
    let completion = guard.complete(pending.ticket, result);
    match completion {
        Completion::Stale => {
            drop(guard);
            let _ = bot.delete_message(chat_id, status.id).await;
        }
        Completion::Failed(message) => {
            drop(guard);
            let text = format!("❌ {}", message);
            if bot.edit_message_text(chat_id, status.id, text.clone()).await.is_err() {
                bot.send_message(chat_id, text).await?;
            }
        }
        Completion::Succeeded if pending.is_image => {
            let source = guard.runner().and_then(|r| r.image());
            drop(guard);
            let Some(source) = source else {
                return Ok(());
            };

            match state.gateway.load_image(&source).await {
                Ok(bytes) => {
                    bot.send_photo(chat_id, InputFile::memory(bytes).file_name("image.png"))
                        .caption("🎨 Done! Use /export to download it as a PNG file.")
                        .await?;
                    let _ = bot.delete_message(chat_id, status.id).await;
                }
                Err(e) => {
                    log::error!("Failed to load generated image: {:#}", e);
                    let _ = bot
                        .edit_message_text(chat_id, status.id, "❌ Failed to load the generated image")
                        .await;
                }
            }
        }
        Completion::Succeeded => {
            let Some(runner) = guard.runner() else {
                return Ok(());
            };
            let display = runner.display_text().unwrap_or_default();
            let plain = runner.copy_text().unwrap_or_default();
            let reveal = state.config.reveal.enabled && runner.reveal_enabled();

            if reveal && display.chars().count() <= MESSAGE_LIMIT {
                let sink = Arc::new(MessageReveal {
                    bot: bot.clone(),
                    chat_id,
                    message_id: status.id,
                    plain,
                });
                let settings = RevealSettings::from_config(&state.config.reveal);
                guard.start_reveal(Reveal::start(&display, settings, sink));
                return Ok(());
            }
            drop(guard);

            let _ = bot.delete_message(chat_id, status.id).await;
            send_html(bot, chat_id, &display, &plain).await?;
        }
    }
    Ok(())
}

/// Send display markup, falling back to plain chunks when it is too long or rejected.
async fn send_html(bot: &Bot, chat_id: ChatId, display: &str, plain: &str) -> ResponseResult<()> {
    if display.chars().count() <= MESSAGE_LIMIT {
        let sent = bot
            .send_message(chat_id, display)
            .parse_mode(ParseMode::Html)
            .await;
        match sent {
            Ok(_) => return Ok(()),
            Err(e) => log::warn!("HTML message rejected, sending plain text: {}", e),
        }
    }

    for chunk in split_message(plain, CHUNK_LIMIT) {
        bot.send_message(chat_id, chunk).await?;
    }
    Ok(())
}

/// Reveal frames shown by editing one message in place.
struct MessageReveal {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
    /// Used when the final frame cannot be shown as HTML.
    plain: String,
}

#[async_trait]
impl RevealSink for MessageReveal {
    async fn show(&self, frame: String) -> bool {
        match self
            .bot
            .edit_message_text(self.chat_id, self.message_id, frame)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Reveal frame not shown in chat {}: {}", self.chat_id, e);
                false
            }
        }
    }

    async fn show_final(&self, frame: String) {
        let _ = self.bot.delete_message(self.chat_id, self.message_id).await;
        if let Err(e) = send_html(&self.bot, self.chat_id, &frame, &self.plain).await {
            log::error!("Failed to deliver result to chat {}: {}", self.chat_id, e);
        }
    }
}

/// Active tool line of /status: tool, state, result and reveal.
fn session_summary(session: &Session) -> String {
    let Some(runner) = session.runner() else {
        return "none".to_string();
    };

    let mut text = format!("{} ({:?})", runner.template().id(), runner.state());
    match runner.output() {
        Some(ParsedOutput::Text(text_output)) => {
            text.push_str(&format!(", result: {} chars", text_output.chars().count()))
        }
        Some(ParsedOutput::Lines(lines)) => text.push_str(&format!(", result: {} lines", lines.len())),
        Some(ParsedOutput::Tags(tags)) => text.push_str(&format!(", result: {} tags", tags.len())),
        Some(ParsedOutput::Image(_)) => text.push_str(", result: image"),
        None => {}
    }
    if let Some(error) = runner.error() {
        text.push_str(&format!(", last error: {}", error));
    }
    if session.is_revealing() {
        text.push_str(", revealing");
    }
    text
}

/// Tool catalog grouped by category.
pub fn catalog_text() -> String {
    let mut text = String::from("🧰 Available tools\n");
    for category in Category::ALL {
        text.push_str(&format!("\n{} ({})\n", category.title(), category));
        for tool in all_tools().iter().filter(|t| t.descriptor.category == category) {
            text.push_str(&format!(
                "• {} - {}: {}\n",
                tool.id(),
                tool.descriptor.title,
                tool.descriptor.description
            ));
        }
    }
    text.push_str("\nPick one with /use <tool-id>");
    text
}

/// A tool's fields with their current values and allowed options.
pub fn options_text(template: &ToolTemplate, fields: &PromptFields) -> String {
    let mut text = format!(
        "🛠 {} ({})\n{}\n\nFields:\n",
        template.descriptor.title,
        template.id(),
        template.descriptor.description
    );

    for spec in template.fields {
        let current = template.current_value(fields, spec);
        match spec.kind {
            FieldKind::Text { required } => {
                let current = if current.is_empty() { "-" } else { current };
                text.push_str(&format!(
                    "• {} ({}{}): {}\n",
                    spec.name,
                    spec.label,
                    if required { ", required" } else { "" },
                    current
                ));
            }
            FieldKind::Choice { options, .. } => {
                let allowed = options
                    .iter()
                    .map(|c| if c.value.is_empty() { "\"\"" } else { c.value })
                    .collect::<Vec<_>>()
                    .join(", ");
                let current = options
                    .iter()
                    .find(|c| c.value == current)
                    .map(|c| c.label)
                    .unwrap_or(current);
                text.push_str(&format!(
                    "• {} ({}): {}\n    options: {}\n",
                    spec.name, spec.label, current, allowed
                ));
            }
        }
    }
    text
}

/// Split plain text into message-sized chunks, preferring line breaks.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();

        if current_len > 0 && current_len + 1 + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                if current_len > 0 {
                    chunks.push(std::mem::take(&mut current));
                }
                current = piece.iter().collect();
                current_len = piece.len();
            }
            continue;
        }

        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GenerationError, GenerationResult};
    use crate::prompt::find_tool;

    #[test]
    fn test_split_message_prefers_lines() {
        assert_eq!(split_message("abc\ndef", 5), vec!["abc", "def"]);
        assert_eq!(split_message("ab\ncd", 5), vec!["ab\ncd"]);
        assert_eq!(split_message("a\n\nb", 10), vec!["a\n\nb"]);
    }

    #[test]
    fn test_split_message_long_line() {
        assert_eq!(split_message("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(split_message("x\nabcdefg", 3), vec!["x", "abc", "def", "g"]);
        assert_eq!(split_message("ééééé", 2), vec!["éé", "éé", "é"]);
    }

    #[test]
    fn test_split_message_limit_respected() {
        let text = "line of text\n".repeat(1000);
        for chunk in split_message(&text, CHUNK_LIMIT) {
            assert!(chunk.chars().count() <= CHUNK_LIMIT);
        }
    }

    #[test]
    fn test_catalog_lists_every_tool() {
        let catalog = catalog_text();
        for tool in all_tools() {
            assert!(catalog.contains(tool.id()), "{} missing", tool.id());
        }
        for category in Category::ALL {
            assert!(catalog.contains(category.title()));
        }
    }

    #[test]
    fn test_session_summary() {
        let mut session = Session::default();
        assert_eq!(session_summary(&session), "none");

        session.select("youtube-tags").unwrap();
        session.set_primary("pasta").unwrap();
        let pending = session.begin().unwrap().unwrap();
        session.complete(pending.ticket, GenerationResult::text("pasta, cooking"));
        assert_eq!(session_summary(&session), "youtube-tags (Succeeded), result: 2 tags");

        let pending = session.begin().unwrap().unwrap();
        session.complete(pending.ticket, GenerationResult::failure(GenerationError::TextTransport));
        assert_eq!(
            session_summary(&session),
            "youtube-tags (Failed), last error: Failed to generate text"
        );
    }

    #[test]
    fn test_options_text_shows_defaults_and_values() {
        let template = find_tool("paragraph-writer").unwrap();
        let fields = PromptFields::new().with("topic", "My Best Friend");
        let text = options_text(template, &fields);

        assert!(text.contains("• topic (Topic and Details, required): My Best Friend"));
        assert!(text.contains("word_count"));
        assert!(text.contains("options: "));
    }
}
