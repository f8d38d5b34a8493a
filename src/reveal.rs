//! Typewriter-style reveal of a finished result.
//!
//! Frames are growing prefixes of the display markup. A frame never cuts a tag
//! or an entity in half and closes whatever tags are still open, so every
//! frame is valid markup on its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::RevealConfig;

/// Where reveal frames are shown.
#[async_trait]
pub trait RevealSink: Send + Sync {
    /// Show one frame. Returns false when it could not be shown.
    async fn show(&self, frame: String) -> bool;

    /// Deliver the full result some other way after the last frame failed twice.
    async fn show_final(&self, frame: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealSettings {
    pub interval: Duration,
    pub chunk_chars: usize,
}

impl RevealSettings {
    pub fn from_config(config: &RevealConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms.max(1)),
            chunk_chars: config.chunk_chars.max(1),
        }
    }
}

/// A running reveal. Cancelled on [`Reveal::stop`] or drop.
pub struct Reveal {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Reveal {
    pub fn start(markup: &str, settings: RevealSettings, sink: Arc<dyn RevealSink>) -> Self {
        let frames = reveal_frames(markup, settings.chunk_chars);
        let token = CancellationToken::new();
        let cancelled = token.clone();

        log::debug!("Reveal: {} frames every {:?}", frames.len(), settings.interval);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(settings.interval);
            let last = frames.len().saturating_sub(1);
            for (i, frame) in frames.into_iter().enumerate() {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => {
                        log::debug!("Reveal: cancelled");
                        return;
                    }
                    _ = ticker.tick() => {}
                }
                if i == last {
                    show_last(sink.as_ref(), frame, settings.interval * 3, &cancelled).await;
                } else if !sink.show(frame).await {
                    log::warn!("Reveal: frame {} of {} was dropped", i + 1, last + 1);
                }
            }
        });

        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait until the last frame was shown or the reveal was stopped.
    #[cfg(test)]
    pub async fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::warn!("Reveal task failed: {}", e);
            }
        }
    }
}

/// The last frame carries the whole result, so it is retried once and then
/// handed to [`RevealSink::show_final`].
async fn show_last(
    sink: &dyn RevealSink,
    frame: String,
    retry_after: Duration,
    cancelled: &CancellationToken,
) {
    if sink.show(frame.clone()).await {
        return;
    }
    log::warn!("Reveal: last frame was dropped, retrying in {:?}", retry_after);

    tokio::select! {
        biased;
        _ = cancelled.cancelled() => return,
        _ = tokio::time::sleep(retry_after) => {}
    }
    if sink.show(frame.clone()).await {
        return;
    }

    log::warn!("Reveal: last frame was dropped again, sending the result as a new message");
    sink.show_final(frame).await;
}

impl Drop for Reveal {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Split display markup into frames of `chunk_chars` visible characters each.
/// The last frame is always the full markup.
pub fn reveal_frames(markup: &str, chunk_chars: usize) -> Vec<String> {
    let chunk = chunk_chars.max(1);
    let mut frames = Vec::new();
    let mut open: Vec<&str> = Vec::new();
    let mut visible = 0;
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];

        if rest.starts_with('<') {
            if let Some(end) = rest.find('>') {
                let tag = &rest[1..end];
                if tag.starts_with('/') {
                    open.pop();
                } else {
                    open.push(tag.split_whitespace().next().unwrap_or(tag));
                }
                pos += end + 1;
                continue;
            }
        }

        let entity = if rest.starts_with('&') {
            rest.find(';').filter(|&i| i <= 8).map(|i| i + 1)
        } else {
            None
        };
        pos += entity.unwrap_or_else(|| rest.chars().next().map_or(1, char::len_utf8));
        visible += 1;

        if visible % chunk == 0 {
            let mut frame = markup[..pos].to_string();
            for name in open.iter().rev() {
                frame.push_str("</");
                frame.push_str(name);
                frame.push('>');
            }
            frames.push(frame);
        }
    }

    if frames.last().map(String::as_str) != Some(markup) {
        frames.push(markup.to_string());
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    #[async_trait]
    impl RevealSink for Collect {
        async fn show(&self, frame: String) -> bool {
            self.0.lock().unwrap().push(frame);
            true
        }

        async fn show_final(&self, frame: String) {
            panic!("unexpected fallback for {:?}", frame);
        }
    }

    /// Rejects the first `failures` frames it is given.
    struct Flaky {
        failures: AtomicUsize,
        shown: Mutex<Vec<String>>,
        fallback: Mutex<Option<String>>,
    }

    impl Flaky {
        fn new(failures: usize) -> Self {
            Self {
                failures: AtomicUsize::new(failures),
                shown: Mutex::new(Vec::new()),
                fallback: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl RevealSink for Flaky {
        async fn show(&self, frame: String) -> bool {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return false;
            }
            self.shown.lock().unwrap().push(frame);
            true
        }

        async fn show_final(&self, frame: String) {
            *self.fallback.lock().unwrap() = Some(frame);
        }
    }

    fn settings(ms: u64, chunk_chars: usize) -> RevealSettings {
        RevealSettings {
            interval: Duration::from_millis(ms),
            chunk_chars,
        }
    }

    #[test]
    fn test_frames_plain_text() {
        assert_eq!(reveal_frames("abcdefgh", 3), vec!["abc", "abcdef", "abcdefgh"]);
        assert_eq!(reveal_frames("abcdef", 3), vec!["abc", "abcdef"]);
        assert_eq!(reveal_frames("", 3), vec![""]);
    }

    #[test]
    fn test_frames_close_open_tags() {
        assert_eq!(
            reveal_frames("<b>Hello</b> world", 3),
            vec![
                "<b>Hel</b>",
                "<b>Hello</b> ",
                "<b>Hello</b> wor",
                "<b>Hello</b> world",
            ]
        );
        assert_eq!(
            reveal_frames("<b>A <i>Big</i></b>", 3),
            vec!["<b>A <i>B</i></b>", "<b>A <i>Big</i></b>"]
        );
    }

    #[test]
    fn test_frames_keep_entities_and_multibyte_whole() {
        assert_eq!(reveal_frames("a &amp; b", 3), vec!["a &amp;", "a &amp; b"]);
        assert_eq!(reveal_frames("héllo", 2), vec!["hé", "héll", "héllo"]);
    }

    #[test]
    fn test_settings_from_config() {
        let s = RevealSettings::from_config(&RevealConfig {
            enabled: true,
            interval_ms: 0,
            chunk_chars: 0,
        });
        assert_eq!(s, settings(1, 1));
    }

    #[tokio::test]
    async fn test_reveal_ends_with_full_text() {
        let sink = Arc::new(Collect::default());
        let reveal = Reveal::start("abcdefgh", settings(1, 3), sink.clone());
        reveal.wait().await;

        let frames = sink.0.lock().unwrap().clone();
        assert_eq!(frames, vec!["abc", "abcdef", "abcdefgh"]);
    }

    #[tokio::test]
    async fn test_last_frame_retried_once() {
        let sink = Arc::new(Flaky::new(2));
        let reveal = Reveal::start("abcdef", settings(1, 3), sink.clone());
        reveal.wait().await;

        assert_eq!(sink.shown.lock().unwrap().clone(), vec!["abcdef"]);
        assert_eq!(*sink.fallback.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_frame_falls_back_after_retry() {
        let sink = Arc::new(Flaky::new(usize::MAX));
        let reveal = Reveal::start("<b>Title</b> body", settings(1, 4), sink.clone());
        reveal.wait().await;

        assert!(sink.shown.lock().unwrap().is_empty());
        assert_eq!(sink.fallback.lock().unwrap().as_deref(), Some("<b>Title</b> body"));
    }

    #[tokio::test]
    async fn test_stop_prevents_further_frames() {
        let sink = Arc::new(Collect::default());
        let reveal = Reveal::start(&"x".repeat(50), settings(20, 5), sink.clone());
        reveal.stop();
        reveal.wait().await;

        let frames = sink.0.lock().unwrap().clone();
        assert!(frames.is_empty(), "frames after stop: {:?}", frames);
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let sink = Arc::new(Collect::default());
        let reveal = Reveal::start(&"x".repeat(50), settings(5, 5), sink.clone());
        drop(reveal);
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(sink.0.lock().unwrap().is_empty());
    }
}
