//! Classification of model replies whose payload shape is not fixed.
//!
//! Each reply is classified once into a variant, in a fixed priority order,
//! and each variant knows how to pull its text or image out.

use serde_json::Value;

use crate::providers::RawOutput;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

const MAX_IMAGE_NESTING: usize = 4;

/// Known shapes of a text-generation payload, highest priority first.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPayload {
    /// The payload is itself a string.
    PlainText(String),
    /// `choices[0].message.content`
    ChatChoice(String),
    /// `content`, as a string or a list of text parts.
    Content(String),
    /// `message.content`
    NestedMessageContent(String),
    /// Top-level array; each item contributes its own text.
    ItemArray(Vec<String>),
    /// `text` or `response`
    GenericField(String),
    /// Anything else that is not null; kept whole.
    Unrecognized(Value),
    Empty,
}

impl TextPayload {
    pub fn classify(output: &Value) -> Self {
        if let Value::String(text) = output {
            return TextPayload::PlainText(text.clone());
        }
        if let Some(text) = non_empty_str(output.pointer("/choices/0/message/content")) {
            return TextPayload::ChatChoice(text);
        }
        if let Some(text) = output.get("content").and_then(content_text) {
            return TextPayload::Content(text);
        }
        if let Some(text) = non_empty_str(output.pointer("/message/content")) {
            return TextPayload::NestedMessageContent(text);
        }
        if let Value::Array(items) = output {
            return TextPayload::ItemArray(items.iter().map(item_text).collect());
        }
        if output.is_object() {
            if let Some(text) =
                non_empty_str(output.get("text")).or_else(|| non_empty_str(output.get("response")))
            {
                return TextPayload::GenericField(text);
            }
        }
        if output.is_null() {
            return TextPayload::Empty;
        }
        TextPayload::Unrecognized(output.clone())
    }

    /// Text carried by this payload, if any.
    pub fn extract(&self) -> Option<String> {
        let text = match self {
            TextPayload::PlainText(text)
            | TextPayload::ChatChoice(text)
            | TextPayload::Content(text)
            | TextPayload::NestedMessageContent(text)
            | TextPayload::GenericField(text) => text.clone(),
            TextPayload::ItemArray(parts) => parts.concat(),
            TextPayload::Unrecognized(value) => value.to_string(),
            TextPayload::Empty => String::new(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(parts) => {
            let text: String = parts.iter().map(item_text).collect();
            if text.is_empty() {
                None
            } else {
                Some(text)
            }
        }
        _ => None,
    }
}

fn item_text(item: &Value) -> String {
    if let Value::String(text) = item {
        return text.clone();
    }
    non_empty_str(item.get("content"))
        .or_else(|| non_empty_str(item.get("text")))
        .or_else(|| non_empty_str(item.pointer("/message/content")))
        .unwrap_or_default()
}

/// Known shapes of an image-generation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Binary(Vec<u8>),
    /// The payload is itself a string (URL, data URI or bare base64).
    Reference(String),
    /// `image`
    ImageField(String),
    /// `url`
    UrlField(String),
    /// `images[0]`, classified again.
    ImagesList(Box<ImagePayload>),
    /// `base64`
    Base64Field(String),
    /// First element of a top-level array, classified again.
    FirstItem(Box<ImagePayload>),
    Unrecognized,
}

/// An image reply reduced to something displayable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedImage {
    /// Raw bytes still needing a local transient reference.
    Bytes(Vec<u8>),
    /// URL, data URI or transient reference.
    Reference(String),
}

impl ImagePayload {
    pub fn classify(output: RawOutput) -> Self {
        match output {
            RawOutput::Binary(bytes) => ImagePayload::Binary(bytes),
            RawOutput::Json(value) => Self::classify_value(&value, 0),
        }
    }

    fn classify_value(value: &Value, depth: usize) -> Self {
        if depth > MAX_IMAGE_NESTING {
            return ImagePayload::Unrecognized;
        }
        match value {
            Value::String(s) => ImagePayload::Reference(s.clone()),
            Value::Object(_) => {
                if let Some(image) = non_empty_str(value.get("image")) {
                    ImagePayload::ImageField(image)
                } else if let Some(url) = non_empty_str(value.get("url")) {
                    ImagePayload::UrlField(url)
                } else if let Some(first) = value.pointer("/images/0") {
                    ImagePayload::ImagesList(Box::new(Self::classify_value(first, depth + 1)))
                } else if let Some(data) = non_empty_str(value.get("base64")) {
                    ImagePayload::Base64Field(data)
                } else {
                    ImagePayload::Unrecognized
                }
            }
            Value::Array(items) => match items.first() {
                Some(first) => {
                    ImagePayload::FirstItem(Box::new(Self::classify_value(first, depth + 1)))
                }
                None => ImagePayload::Unrecognized,
            },
            _ => ImagePayload::Unrecognized,
        }
    }

    pub fn resolve(self) -> Option<ResolvedImage> {
        match self {
            ImagePayload::Binary(bytes) if !bytes.is_empty() => Some(ResolvedImage::Bytes(bytes)),
            ImagePayload::Binary(_) => None,
            ImagePayload::Reference(s) | ImagePayload::ImageField(s) | ImagePayload::UrlField(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(ResolvedImage::Reference(normalize_reference(s)))
                }
            }
            ImagePayload::Base64Field(data) => Some(ResolvedImage::Reference(format!(
                "{}{}",
                PNG_DATA_URI_PREFIX,
                data.trim()
            ))),
            ImagePayload::ImagesList(inner) | ImagePayload::FirstItem(inner) => inner.resolve(),
            ImagePayload::Unrecognized => None,
        }
    }
}

/// Pass URLs, data URIs and transient references through; treat anything else as bare base64.
pub fn normalize_reference(reference: &str) -> String {
    if is_addressable(reference) {
        reference.to_string()
    } else {
        format!("{}{}", PNG_DATA_URI_PREFIX, reference)
    }
}

fn is_addressable(reference: &str) -> bool {
    ["http://", "https://", "data:", super::resource::TRANSIENT_SCHEME]
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}
