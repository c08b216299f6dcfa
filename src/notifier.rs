//! Ads client event fan-out.
//!
//! Observers register with an [`AdsClientNotifier`] and receive every
//! [`AdsClientEvent`] synchronously, in registration order. The notifier only
//! keeps weak references, so an observer that has been dropped is skipped
//! without needing to unregister.

use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Browser, tab, locale and preference events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdsClientEvent {
    /// The operating system locale changed.
    LocaleDidChange { locale: String },

    /// A preference changed at `path`, e.g. `ad_history.retention_period_days`.
    PrefDidChange { path: String },

    /// A resource component was updated.
    DidUpdateResourceComponent { id: String },

    /// Page text is available. The last entry of `redirect_chain` is the
    /// current page.
    TabTextContentDidChange {
        tab_id: i32,
        redirect_chain: Vec<Url>,
        text: String,
    },

    /// Page HTML is available.
    TabHtmlContentDidChange {
        tab_id: i32,
        redirect_chain: Vec<Url>,
        html: String,
    },

    TabDidStartPlayingMedia { tab_id: i32 },
    TabDidStopPlayingMedia { tab_id: i32 },

    /// A tab was updated.
    TabDidChange {
        tab_id: i32,
        redirect_chain: Vec<Url>,
        is_visible: bool,
        is_incognito: bool,
    },

    DidCloseTab { tab_id: i32 },

    UserDidBecomeIdle,

    /// The user is no longer idle after `idle_time`.
    UserDidBecomeActive {
        idle_time: Duration,
        screen_was_locked: bool,
    },

    BrowserDidEnterForeground,
    BrowserDidEnterBackground,
    BrowserDidBecomeActive,
    BrowserDidResignActive,
}

impl AdsClientEvent {
    /// Event name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LocaleDidChange { .. } => "locale_did_change",
            Self::PrefDidChange { .. } => "pref_did_change",
            Self::DidUpdateResourceComponent { .. } => "did_update_resource_component",
            Self::TabTextContentDidChange { .. } => "tab_text_content_did_change",
            Self::TabHtmlContentDidChange { .. } => "tab_html_content_did_change",
            Self::TabDidStartPlayingMedia { .. } => "tab_did_start_playing_media",
            Self::TabDidStopPlayingMedia { .. } => "tab_did_stop_playing_media",
            Self::TabDidChange { .. } => "tab_did_change",
            Self::DidCloseTab { .. } => "did_close_tab",
            Self::UserDidBecomeIdle => "user_did_become_idle",
            Self::UserDidBecomeActive { .. } => "user_did_become_active",
            Self::BrowserDidEnterForeground => "browser_did_enter_foreground",
            Self::BrowserDidEnterBackground => "browser_did_enter_background",
            Self::BrowserDidBecomeActive => "browser_did_become_active",
            Self::BrowserDidResignActive => "browser_did_resign_active",
        }
    }
}

/// A listener for [`AdsClientEvent`]s.
pub trait AdsClientObserver: Send + Sync {
    fn on_event(&self, event: &AdsClientEvent);
}

/// Registry of observers.
#[derive(Default)]
pub struct AdsClientNotifier {
    observers: Vec<Weak<dyn AdsClientObserver>>,
}

impl AdsClientNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `observer`. Registering the same observer twice is a no-op.
    pub fn add_observer(&mut self, observer: &Arc<dyn AdsClientObserver>) {
        self.observers.retain(|weak| weak.strong_count() > 0);

        let weak = Arc::downgrade(observer);
        if !self.observers.iter().any(|existing| existing.ptr_eq(&weak)) {
            self.observers.push(weak);
        }
    }

    /// Unregister `observer`, matched by identity.
    pub fn remove_observer(&mut self, observer: &Arc<dyn AdsClientObserver>) {
        let weak = Arc::downgrade(observer);
        self.observers
            .retain(|existing| !existing.ptr_eq(&weak) && existing.strong_count() > 0);
    }

    /// Number of live observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Deliver `event` to every live observer in registration order.
    pub fn notify(&self, event: &AdsClientEvent) {
        debug!(event = event.name(), observers = self.observer_count(), "Notifying observers");

        for observer in self.observers.iter().filter_map(Weak::upgrade) {
            observer.on_event(event);
        }
    }
}

impl std::fmt::Debug for AdsClientNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdsClientNotifier")
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl AdsClientObserver for Recorder {
        fn on_event(&self, event: &AdsClientEvent) {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.label, event.name()));
        }
    }

    fn recorder(label: &'static str, log: &Arc<Mutex<Vec<String>>>) -> Arc<dyn AdsClientObserver> {
        Arc::new(Recorder {
            label,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn test_notifies_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recorder("first", &log);
        let second = recorder("second", &log);

        let mut notifier = AdsClientNotifier::new();
        notifier.add_observer(&first);
        notifier.add_observer(&second);
        notifier.notify(&AdsClientEvent::BrowserDidBecomeActive);
        notifier.notify(&AdsClientEvent::DidCloseTab { tab_id: 1 });

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:browser_did_become_active",
                "second:browser_did_become_active",
                "first:did_close_tab",
                "second:did_close_tab",
            ]
        );
    }

    #[test]
    fn test_remove_and_duplicate_add() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = recorder("first", &log);
        let second = recorder("second", &log);

        let mut notifier = AdsClientNotifier::new();
        notifier.add_observer(&first);
        notifier.add_observer(&first);
        notifier.add_observer(&second);
        assert_eq!(notifier.observer_count(), 2);

        notifier.remove_observer(&first);
        notifier.notify(&AdsClientEvent::UserDidBecomeIdle);

        assert_eq!(*log.lock().unwrap(), vec!["second:user_did_become_idle"]);
    }

    #[test]
    fn test_dropped_observer_is_skipped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = AdsClientNotifier::new();

        {
            let transient = recorder("transient", &log);
            notifier.add_observer(&transient);
        }
        notifier.notify(&AdsClientEvent::PrefDidChange {
            path: "ad_history.batch_size".to_string(),
        });

        assert_eq!(notifier.observer_count(), 0);
        assert!(log.lock().unwrap().is_empty());
    }
}
