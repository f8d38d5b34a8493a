//! Per-tool controller: prompt building, request bookkeeping and the result
//! shown to the user.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::formatter::format_output_html;
use crate::gateway::{GenerationError, GenerationResult, ImageSource, ModelGateway, TransientImage};
use crate::prompt::{ParsedOutput, PromptError, PromptFields, ToolTemplate};
use crate::text::{escape_markup, strip_markup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Requesting,
    Succeeded,
    Failed,
}

/// Identifies one request of one runner. Only the latest ticket is honoured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    runner: Uuid,
    generation: u64,
}

/// A built prompt waiting to be sent. Holds no borrow of the runner, so the
/// caller can release its lock while the request is in flight.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub prompt: String,
    pub system: Option<&'static str>,
    pub is_image: bool,
}

impl PendingRequest {
    pub async fn send(&self, gateway: &ModelGateway) -> GenerationResult {
        if self.is_image {
            gateway.generate_image(&self.prompt).await
        } else {
            gateway.generate_text(&self.prompt, self.system).await
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A newer request superseded this one; the result was dropped.
    Stale,
    Succeeded,
    Failed(String),
}

#[derive(Debug, Default)]
struct EditState {
    raw: String,
    is_editing: bool,
    saved: bool,
}

pub struct ToolRunner {
    id: Uuid,
    template: &'static ToolTemplate,
    state: RunState,
    generation: u64,
    output: Option<ParsedOutput>,
    error: Option<String>,
    edit: EditState,
    resource: Option<TransientImage>,
}

impl ToolRunner {
    pub fn new(template: &'static ToolTemplate) -> Self {
        Self {
            id: Uuid::new_v4(),
            template,
            state: RunState::Idle,
            generation: 0,
            output: None,
            error: None,
            edit: EditState::default(),
            resource: None,
        }
    }

    pub fn template(&self) -> &'static ToolTemplate {
        self.template
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn output(&self) -> Option<&ParsedOutput> {
        self.output.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.edit.is_editing
    }

    /// Start a new request. Returns `None` when the primary field is empty.
    ///
    /// Any earlier request still in flight becomes stale.
    pub fn begin(&mut self, fields: &PromptFields) -> Result<Option<PendingRequest>, PromptError> {
        if !self.template.is_ready(fields) {
            log::info!(
                "Runner: {} skipped, '{}' is empty",
                self.template.id(),
                self.template.primary_field().name
            );
            return Ok(None);
        }

        let prompt = self.template.build(fields)?;

        self.generation += 1;
        self.state = RunState::Requesting;
        self.clear_result();

        log::info!(
            "Runner: {} request #{} ({} chars)",
            self.template.id(),
            self.generation,
            prompt.len()
        );

        Ok(Some(PendingRequest {
            ticket: Ticket {
                runner: self.id,
                generation: self.generation,
            },
            prompt,
            system: self.template.system,
            is_image: self.template.is_image(),
        }))
    }

    /// Apply a finished request. Results for anything but the latest ticket are dropped.
    pub fn complete(&mut self, ticket: Ticket, result: GenerationResult) -> Completion {
        if ticket.runner != self.id
            || ticket.generation != self.generation
            || self.state != RunState::Requesting
        {
            log::info!(
                "Runner: discarding stale result #{} for {} (current #{})",
                ticket.generation,
                self.template.id(),
                self.generation
            );
            return Completion::Stale;
        }

        match result.into_parts() {
            (Ok(output), resource) => {
                let parsed = self.template.output.parse(&output);
                if parsed.is_empty() {
                    log::warn!(
                        "Runner: {} reply had no usable items after parsing",
                        self.template.id()
                    );
                    return self.fail(GenerationError::EmptyText);
                }
                self.output = Some(parsed);
                self.resource = resource;
                self.state = RunState::Succeeded;
                Completion::Succeeded
            }
            (Err(e), _) => self.fail(e),
        }
    }

    fn fail(&mut self, error: GenerationError) -> Completion {
        let message = error.to_string();
        self.error = Some(message.clone());
        self.state = RunState::Failed;
        Completion::Failed(message)
    }

    fn clear_result(&mut self) {
        self.output = None;
        self.error = None;
        self.edit = EditState::default();
        if let Some(resource) = self.resource.take() {
            resource.release();
        }
    }

    /// Plain text of the current result; a saved edit replaces the generated text.
    pub fn plain_text(&self) -> Option<String> {
        if self.edit.saved {
            return Some(self.edit.raw.clone());
        }
        match self.output.as_ref()? {
            ParsedOutput::Text(text) => Some(text.clone()),
            ParsedOutput::Lines(lines) => Some(lines.join("\n")),
            ParsedOutput::Tags(tags) => Some(tags.join(", ")),
            ParsedOutput::Image(_) => None,
        }
    }

    /// Result as Telegram HTML, or `None` for image results.
    pub fn display_text(&self) -> Option<String> {
        if self.edit.saved {
            return Some(format_output_html(&self.edit.raw));
        }
        match self.output.as_ref()? {
            ParsedOutput::Text(text) => Some(format_output_html(text)),
            ParsedOutput::Lines(lines) => Some(escape_markup(&numbered(lines))),
            ParsedOutput::Tags(tags) => Some(escape_markup(&tags.join(", "))),
            ParsedOutput::Image(_) => None,
        }
    }

    /// Text for the clipboard, with any markup removed.
    pub fn copy_text(&self) -> Option<String> {
        self.plain_text().map(|text| strip_markup(&text))
    }

    /// Whether the current result should be revealed incrementally.
    pub fn reveal_enabled(&self) -> bool {
        self.state == RunState::Succeeded
            && !self.edit.saved
            && !matches!(self.output, Some(ParsedOutput::Image(_)) | None)
    }

    /// Enter edit mode, returning the text to edit.
    pub fn start_edit(&mut self) -> Option<String> {
        let text = self.plain_text()?;
        self.edit.raw = text.clone();
        self.edit.is_editing = true;
        Some(text)
    }

    /// Save a manual edit. It becomes the source for copy and display.
    pub fn save_edit(&mut self, text: &str) -> bool {
        if self.state != RunState::Succeeded || self.plain_text().is_none() {
            return false;
        }
        self.edit = EditState {
            raw: text.to_string(),
            is_editing: false,
            saved: true,
        };
        log::info!("Runner: saved edit for {} ({} chars)", self.template.id(), text.len());
        true
    }

    /// Where the current image lives, detached from the runner.
    pub fn image(&self) -> Option<ImageSource> {
        match self.output.as_ref()? {
            ParsedOutput::Image(reference) => Some(ImageSource::new(reference, self.resource.as_ref())),
            _ => None,
        }
    }
}

fn numbered(lines: &[String]) -> String {
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// File name offered when exporting a generated image.
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("cutverse-image-{}.png", now.timestamp_millis())
}
