pub mod registry;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub use registry::{all_tools, find_tool};

/// Constraint bullets appended to every text prompt.
pub const CONSTRAINT_BLOCK: &str = "- Do NOT use hash symbols, asterisks, backticks, or single quotes\n\
- Do not add any preamble, explanation, or closing remarks of your own";

static NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+[.)]\s*").expect("numbering pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool '{tool}' has no field named '{field}'")]
    UnknownField { tool: String, field: String },

    #[error("'{value}' is not a valid {field}. Choose one of: {allowed}")]
    InvalidChoice {
        field: String,
        value: String,
        allowed: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Student,
    Writer,
    Image,
    Social,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Student,
        Category::Writer,
        Category::Image,
        Category::Social,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Category::Student => "Student AI Tools",
            Category::Writer => "AI Writing Tools",
            Category::Image => "AI Image Tools",
            Category::Social => "Social Media Tools",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Student => "student",
            Category::Writer => "writer",
            Category::Image => "image",
            Category::Social => "social",
        };
        f.write_str(name)
    }
}

/// Catalog entry for one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text { required: bool },
    Choice {
        options: &'static [Choice],
        default: &'static str,
    },
}

/// How a field's value is spelled inside the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Value,
    Label,
    /// `class-10` becomes `Class 10`.
    ClassLevel,
    Stance,
    /// Prefix is only added when the value is non-empty.
    Prefixed(&'static str),
    Orientation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub render: Render,
}

impl FieldSpec {
    fn choices(&self) -> &'static [Choice] {
        match self.kind {
            FieldKind::Choice { options, .. } => options,
            FieldKind::Text { .. } => &[],
        }
    }

    /// Match user input against option values first, then labels.
    fn find_choice(&self, input: &str) -> Option<&'static Choice> {
        let input = input.trim();
        let options = self.choices();
        options
            .iter()
            .find(|c| c.value.eq_ignore_ascii_case(input))
            .or_else(|| options.iter().find(|c| c.label.eq_ignore_ascii_case(input)))
    }

    fn invalid_choice(&self, value: &str) -> PromptError {
        let allowed = self
            .choices()
            .iter()
            .map(|c| {
                if c.value.is_empty() {
                    format!("\"\" ({})", c.label)
                } else {
                    c.value.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        PromptError::InvalidChoice {
            field: self.name.to_string(),
            value: value.to_string(),
            allowed,
        }
    }

    fn render_value(&self, fields: &PromptFields) -> Result<String, PromptError> {
        match self.kind {
            FieldKind::Text { .. } => {
                let text = fields.get(self.name).unwrap_or("").trim();
                Ok(match self.render {
                    Render::Prefixed(prefix) if !text.is_empty() => format!("{}{}", prefix, text),
                    Render::Prefixed(_) => String::new(),
                    _ => text.to_string(),
                })
            }
            FieldKind::Choice { default, .. } => {
                let selected = fields.get(self.name).unwrap_or(default);
                let choice = self
                    .choices()
                    .iter()
                    .find(|c| c.value == selected)
                    .ok_or_else(|| self.invalid_choice(selected))?;
                Ok(render_choice(self.render, choice))
            }
        }
    }
}

fn render_choice(render: Render, choice: &Choice) -> String {
    match render {
        Render::Value => choice.value.to_string(),
        Render::Label => choice.label.to_string(),
        Render::ClassLevel => level_text(choice),
        Render::Stance => match choice.value {
            "for" => "in favor of".to_string(),
            "against" => "against".to_string(),
            _ => "presenting both sides of".to_string(),
        },
        Render::Prefixed(prefix) if !choice.value.is_empty() => {
            format!("{}{}", prefix, choice.value)
        }
        Render::Prefixed(_) => String::new(),
        Render::Orientation => match choice.value {
            "3:4" | "9:16" => ", portrait orientation".to_string(),
            "4:3" | "16:9" => ", landscape orientation".to_string(),
            _ => String::new(),
        },
    }
}

/// `class-10` becomes `Class 10`; other levels keep their value.
fn level_text(choice: &Choice) -> String {
    choice.value.replacen('-', " ", 1).replacen("class", "Class", 1)
}

/// Shape of the artifact the prompt asks for, and how the reply is parsed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Prose,
    Lines { count: usize, noun: &'static str },
    Commas { noun: &'static str },
    Image,
}

/// Model reply after the tool's post-parse strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOutput {
    Text(String),
    Lines(Vec<String>),
    Tags(Vec<String>),
    Image(String),
}

impl ParsedOutput {
    /// True when the post-parse left nothing to show.
    pub fn is_empty(&self) -> bool {
        match self {
            ParsedOutput::Text(text) | ParsedOutput::Image(text) => text.trim().is_empty(),
            ParsedOutput::Lines(items) | ParsedOutput::Tags(items) => items.is_empty(),
        }
    }
}

impl OutputShape {
    fn hint(&self) -> Option<String> {
        match self {
            OutputShape::Lines { count, noun } => Some(format!(
                "- Return ONLY the {count} {noun}, one per line, numbered 1-{count}"
            )),
            OutputShape::Commas { noun } => {
                Some(format!("- Return ONLY the {noun}, comma-separated on one line"))
            }
            OutputShape::Prose | OutputShape::Image => None,
        }
    }

    pub fn parse(&self, output: &str) -> ParsedOutput {
        match self {
            OutputShape::Prose => ParsedOutput::Text(output.to_string()),
            OutputShape::Image => ParsedOutput::Image(output.to_string()),
            OutputShape::Lines { count, .. } => ParsedOutput::Lines(
                output
                    .lines()
                    .map(|line| NUMBERING.replace(line.trim(), "").trim().to_string())
                    .filter(|line| !line.is_empty() && !line.to_lowercase().contains("here are"))
                    .take(*count)
                    .collect(),
            ),
            OutputShape::Commas { .. } => ParsedOutput::Tags(
                output
                    .split(',')
                    .map(|tag| tag.trim().to_string())
                    .filter(|tag| !tag.is_empty() && tag.chars().count() < 100)
                    .collect(),
            ),
        }
    }
}

/// One tool: catalog entry plus everything needed to build its prompt.
#[derive(Debug)]
pub struct ToolTemplate {
    pub descriptor: ToolDescriptor,
    pub fields: &'static [FieldSpec],
    /// Instruction text with `{field}` placeholders.
    pub body: &'static str,
    pub output: OutputShape,
    pub closing: Option<&'static str>,
    pub system: Option<&'static str>,
}

impl ToolTemplate {
    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }

    pub fn is_image(&self) -> bool {
        self.output == OutputShape::Image
    }

    /// The free-text field that must be filled before a request is made.
    pub fn primary_field(&self) -> &'static FieldSpec {
        self.fields
            .iter()
            .find(|f| matches!(f.kind, FieldKind::Text { required: true }))
            .unwrap_or(&self.fields[0])
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn is_ready(&self, fields: &PromptFields) -> bool {
        fields
            .get(self.primary_field().name)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    /// Validate and store a field value. Choice fields accept a value or a label.
    pub fn assign(
        &self,
        fields: &mut PromptFields,
        name: &str,
        input: &str,
    ) -> Result<(), PromptError> {
        let spec = self.field(name).ok_or_else(|| PromptError::UnknownField {
            tool: self.id().to_string(),
            field: name.to_string(),
        })?;

        match spec.kind {
            FieldKind::Text { .. } => fields.set(spec.name, input),
            FieldKind::Choice { .. } => {
                let choice = spec.find_choice(input).ok_or_else(|| spec.invalid_choice(input))?;
                fields.set(spec.name, choice.value);
            }
        }
        Ok(())
    }

    /// Current value of a field, falling back to the choice default.
    pub fn current_value<'a>(&self, fields: &'a PromptFields, spec: &FieldSpec) -> &'a str {
        match (fields.get(spec.name), spec.kind) {
            (Some(value), _) => value,
            (None, FieldKind::Choice { default, .. }) => default,
            (None, FieldKind::Text { .. }) => "",
        }
    }

    /// Build the prompt for this tool.
    ///
    /// Assumes the primary field is filled; callers check [`Self::is_ready`] first.
    pub fn build(&self, fields: &PromptFields) -> Result<String, PromptError> {
        let mut values = HashMap::new();
        for spec in self.fields {
            values.insert(spec.name, spec.render_value(fields)?);
        }

        let body = collapse_blank_lines(&fill_placeholders(self.body, &values));

        if self.is_image() {
            return Ok(body.trim().to_string());
        }

        let mut prompt = body.trim_end().to_string();
        prompt.push('\n');
        if let Some(hint) = self.output.hint() {
            prompt.push_str(&hint);
            prompt.push('\n');
        }
        prompt.push_str(CONSTRAINT_BLOCK);
        if let Some(closing) = self.closing {
            prompt.push_str("\n\n");
            prompt.push_str(closing);
        }
        Ok(prompt)
    }
}

/// User-supplied field values for one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptFields(BTreeMap<String, String>);

impl PromptFields {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: &str) {
        self.0.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

fn fill_placeholders(template: &str, values: &HashMap<&'static str, String>) -> String {
    let mut out = String::with_capacity(template.len() + 128);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if values.contains_key(&after[..end]) => {
                out.push_str(&values[&after[..end]]);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(id: &str) -> &'static ToolTemplate {
        find_tool(id).unwrap()
    }

    #[test]
    fn test_paragraph_prompt_scenario() {
        let fields = PromptFields::new()
            .with("topic", "My Best Friend")
            .with("word_count", "200")
            .with("class_level", "class-10");
        let prompt = tool("paragraph-writer").build(&fields).unwrap();

        assert!(prompt.contains("\"My Best Friend\""));
        assert!(prompt.contains("200 words"));
        assert!(prompt.contains("Class 10"));
        assert!(prompt.to_lowercase().contains("class 10"));
        assert!(prompt.contains(CONSTRAINT_BLOCK));
        assert!(prompt.ends_with("Respond with the title and paragraph only."));
    }

    #[test]
    fn test_defaults_apply_to_missing_choices() {
        let fields = PromptFields::new().with("topic", "Homework");
        let prompt = tool("debate-writer").build(&fields).unwrap();
        assert!(prompt.contains("in favor of the motion: \"Homework\""));
        assert!(prompt.contains("Class 10 student"));
    }

    #[test]
    fn test_stance_rendering() {
        let base = PromptFields::new().with("topic", "Uniforms");
        let against = tool("debate-writer")
            .build(&base.clone().with("stance", "against"))
            .unwrap();
        assert!(against.contains("Write a debate speech against the motion"));
        let balanced = tool("debate-writer")
            .build(&base.with("stance", "balanced"))
            .unwrap();
        assert!(balanced.contains("presenting both sides of the motion"));
    }

    #[test]
    fn test_label_rendering() {
        let fields = PromptFields::new()
            .with("topic", "rust")
            .with("style", "professional");
        let prompt = tool("youtube-title").build(&fields).unwrap();
        assert!(prompt.starts_with("Generate 6 Professional but Catchy YouTube video titles"));
        assert!(prompt.contains("- Return ONLY the 6 titles, one per line, numbered 1-6"));
    }

    #[test]
    fn test_comma_shape_hint() {
        let fields = PromptFields::new().with("title", "Cooking pasta");
        let prompt = tool("youtube-tags").build(&fields).unwrap();
        assert!(prompt.contains("Language for tags: english"));
        assert!(prompt.contains("- Return ONLY the tags, comma-separated on one line"));
    }

    #[test]
    fn test_optional_field_omitted_cleanly() {
        let without = tool("youtube-description")
            .build(&PromptFields::new().with("title", "Morning Routine"))
            .unwrap();
        assert!(!without.contains("Keywords/Audience"));
        assert!(!without.contains("\n\n\n"));

        let with = tool("youtube-description")
            .build(
                &PromptFields::new()
                    .with("title", "Morning Routine")
                    .with("keywords", "fitness, beginners"),
            )
            .unwrap();
        assert!(with.contains("Keywords/Audience: fitness, beginners"));
    }

    #[test]
    fn test_image_prompt_hints() {
        let image = tool("image-generator");
        let plain = image
            .build(&PromptFields::new().with("prompt", "  a cat in a hat  "))
            .unwrap();
        assert_eq!(plain, "a cat in a hat, high quality, detailed, 4k");

        let styled = image
            .build(
                &PromptFields::new()
                    .with("prompt", "a city")
                    .with("style", "anime style")
                    .with("aspect_ratio", "9:16"),
            )
            .unwrap();
        assert_eq!(
            styled,
            "a city, anime style, high quality, detailed, 4k, portrait orientation"
        );

        let wide = image
            .build(
                &PromptFields::new()
                    .with("prompt", "a beach")
                    .with("aspect_ratio", "16:9"),
            )
            .unwrap();
        assert!(wide.ends_with("landscape orientation"));
        assert!(!wide.contains("Do NOT use"));
    }

    #[test]
    fn test_every_template_fills_all_placeholders() {
        for template in all_tools() {
            let mut fields = PromptFields::new();
            for spec in template.fields {
                if let FieldKind::Text { .. } = spec.kind {
                    fields.set(spec.name, "sample input");
                }
            }
            let prompt = template.build(&fields).unwrap();
            for spec in template.fields {
                let placeholder = format!("{{{}}}", spec.name);
                assert!(
                    !prompt.contains(&placeholder),
                    "{} left {} unfilled",
                    template.id(),
                    placeholder
                );
            }
            assert!(prompt.contains("sample input"), "{} dropped its input", template.id());
            if !template.is_image() {
                assert!(prompt.contains(CONSTRAINT_BLOCK), "{} lacks constraints", template.id());
            }
        }
    }

    #[test]
    fn test_assign_accepts_value_or_label() {
        let template = tool("speech-writer");
        let mut fields = PromptFields::new();
        template.assign(&mut fields, "duration", "Long (10+ min)").unwrap();
        assert_eq!(fields.get("duration"), Some("long"));
        template.assign(&mut fields, "class_level", "CLASS-7").unwrap();
        assert_eq!(fields.get("class_level"), Some("class-7"));
    }

    #[test]
    fn test_assign_rejects_unknown_input() {
        let template = tool("speech-writer");
        let mut fields = PromptFields::new();
        let err = template.assign(&mut fields, "duration", "forever").unwrap_err();
        match err {
            PromptError::InvalidChoice { field, allowed, .. } => {
                assert_eq!(field, "duration");
                assert_eq!(allowed, "short, medium, long");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            template.assign(&mut fields, "colour", "red"),
            Err(PromptError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_build_rejects_invalid_stored_choice() {
        let fields = PromptFields::new()
            .with("topic", "x")
            .with("word_count", "9999");
        assert!(matches!(
            tool("paragraph-writer").build(&fields),
            Err(PromptError::InvalidChoice { .. })
        ));
    }

    #[test]
    fn test_is_ready_checks_primary_field() {
        let template = tool("essay-writer");
        assert!(!template.is_ready(&PromptFields::new()));
        assert!(!template.is_ready(&PromptFields::new().with("topic", "   ")));
        assert!(template.is_ready(&PromptFields::new().with("topic", "Climate")));
    }

    #[test]
    fn test_parse_titles() {
        let shape = OutputShape::Lines { count: 6, noun: "titles" };
        let raw = "Here are your titles:\n1. First Title\n2) Second Title\n\n3.Third\n4. Four\n5. Five\n6. Six\n7. Seven";
        assert_eq!(
            shape.parse(raw),
            ParsedOutput::Lines(vec![
                "First Title".to_string(),
                "Second Title".to_string(),
                "Third".to_string(),
                "Four".to_string(),
                "Five".to_string(),
                "Six".to_string(),
            ])
        );
    }

    #[test]
    fn test_parse_tags() {
        let shape = OutputShape::Commas { noun: "tags" };
        let long = "x".repeat(120);
        let raw = format!("pasta, cooking ,, easy recipes, {}", long);
        assert_eq!(
            shape.parse(&raw),
            ParsedOutput::Tags(vec![
                "pasta".to_string(),
                "cooking".to_string(),
                "easy recipes".to_string(),
            ])
        );
    }

    #[test]
    fn test_level_text() {
        let level = |value| level_text(&Choice { value, label: "ignored" });
        assert_eq!(level("class-10"), "Class 10");
        assert_eq!(level("class-1"), "Class 1");
        assert_eq!(level("university"), "university");

        let prompt = tool("essay-writer")
            .build(
                &PromptFields::new()
                    .with("topic", "Dams")
                    .with("class_level", "university"),
            )
            .unwrap();
        assert!(prompt.contains("university"));
        assert!(!prompt.contains("University"));
    }

    #[test]
    fn test_parsed_output_is_empty() {
        let titles = OutputShape::Lines { count: 6, noun: "titles" };
        assert!(titles.parse("Here are your titles:\n\n").is_empty());
        assert!(!titles.parse("1. One").is_empty());

        let tags = OutputShape::Commas { noun: "tags" };
        assert!(tags.parse(&"x".repeat(150)).is_empty());
        assert!(OutputShape::Prose.parse("  ").is_empty());
        assert!(!OutputShape::Prose.parse("text").is_empty());
    }

    #[test]
    fn test_fill_placeholders_keeps_unknown_braces() {
        let mut values = HashMap::new();
        values.insert("name", "Ada".to_string());
        assert_eq!(
            fill_placeholders("Hi {name}, {other} {", &values),
            "Hi Ada, {other} {"
        );
    }
}
