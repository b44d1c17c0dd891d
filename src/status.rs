//! Rotating "thinking" indicator shown while an exchange is pending.

use crate::view::View;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

const FALLBACK_PHRASE: &str = "Thinking...";

/// Cycles through a fixed list of phrases.
#[derive(Debug, Clone)]
pub struct StatusRotation {
    phrases: Vec<String>,
    next: usize,
}

impl StatusRotation {
    pub fn new(phrases: &[String]) -> Self {
        let phrases = if phrases.is_empty() {
            vec![FALLBACK_PHRASE.to_string()]
        } else {
            phrases.to_vec()
        };
        Self { phrases, next: 0 }
    }

    pub fn next_phrase(&mut self) -> &str {
        let idx = self.next;
        self.next = (self.next + 1) % self.phrases.len();
        &self.phrases[idx]
    }
}

/// Shows the first phrase right away, then the next one every `period`.
/// The caller aborts the returned task when the exchange resolves.
pub fn spawn_ticker<V: View>(
    view: Arc<Mutex<V>>,
    mut rotation: StatusRotation,
    period: Duration,
) -> JoinHandle<()> {
    view.lock().unwrap().set_pending(Some(rotation.next_phrase()));
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let phrase = rotation.next_phrase().to_string();
            view.lock().unwrap().set_pending(Some(&phrase));
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOptions;
    use crate::view::HtmlView;

    fn phrases() -> Vec<String> {
        vec!["one".into(), "two".into(), "three".into()]
    }

    #[test]
    fn rotation_wraps_around() {
        let mut rotation = StatusRotation::new(&phrases());
        let seen: Vec<String> = (0..4).map(|_| rotation.next_phrase().to_string()).collect();
        assert_eq!(seen, ["one", "two", "three", "one"]);
    }

    #[test]
    fn empty_phrase_list_uses_fallback() {
        let mut rotation = StatusRotation::new(&[]);
        assert_eq!(rotation.next_phrase(), FALLBACK_PHRASE);
        assert_eq!(rotation.next_phrase(), FALLBACK_PHRASE);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_advances_on_each_period() {
        let view = Arc::new(Mutex::new(HtmlView::new(RenderOptions::default())));
        let handle = spawn_ticker(
            view.clone(),
            StatusRotation::new(&phrases()),
            Duration::from_secs(5),
        );
        assert_eq!(view.lock().unwrap().status(), Some("one"));

        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert_eq!(view.lock().unwrap().status(), Some("two"));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(view.lock().unwrap().status(), Some("three"));

        handle.abort();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(view.lock().unwrap().status(), Some("three"));
    }
}
