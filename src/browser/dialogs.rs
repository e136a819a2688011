//! Alert watcher - tracks native JavaScript dialogs per session.
//!
//! CDP dialog events are session-specific, so each `BrowserSession`
//! attaches its own listener when the page is created. Dialogs are not
//! auto-handled; they queue until the crawl reads or accepts them,
//! which is how an overlapping (blocking) dialog becomes observable.

use crate::{CrawlError, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::page::{
    DialogType as CdpDialogType, EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use futures::StreamExt;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Alert,
    Confirm,
    Prompt,
    BeforeUnload,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::Alert => write!(f, "alert"),
            AlertKind::Confirm => write!(f, "confirm"),
            AlertKind::Prompt => write!(f, "prompt"),
            AlertKind::BeforeUnload => write!(f, "beforeunload"),
        }
    }
}

/// Observable dialog state: absent, one open dialog, or a dialog that
/// arrived while a previous one was still unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    None,
    Open,
    Blocking,
}

#[derive(Debug, Clone)]
pub struct PendingAlert {
    pub kind: AlertKind,
    pub message: String,
}

#[derive(Clone, Default)]
pub struct AlertWatcher {
    pending: Arc<Mutex<VecDeque<PendingAlert>>>,
}

impl AlertWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the dialog event listener for `page`. Events are queued
    /// until read or accepted.
    pub async fn attach(&self, page: &Arc<Page>) -> Result<()> {
        let pending = self.pending.clone();

        let mut stream = page
            .event_listener::<EventJavascriptDialogOpening>()
            .await
            .map_err(|e| CrawlError::General(format!("Failed to attach dialog listener: {}", e)))?;

        tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                let kind = match event.r#type {
                    CdpDialogType::Alert => AlertKind::Alert,
                    CdpDialogType::Confirm => AlertKind::Confirm,
                    CdpDialogType::Prompt => AlertKind::Prompt,
                    CdpDialogType::Beforeunload => AlertKind::BeforeUnload,
                };

                tracing::debug!("Dialog opened ({}): {}", kind, event.message);

                let mut queue = pending.lock().expect("alert queue poisoned");
                queue.push_back(PendingAlert {
                    kind,
                    message: event.message.clone(),
                });
            }
        });

        Ok(())
    }

    pub fn state(&self) -> AlertState {
        let queue = self.pending.lock().expect("alert queue poisoned");
        match queue.len() {
            0 => AlertState::None,
            1 => AlertState::Open,
            _ => AlertState::Blocking,
        }
    }

    pub fn is_present(&self) -> bool {
        self.state() != AlertState::None
    }

    /// Text of the oldest unhandled dialog. Errors when none is open.
    pub fn text(&self) -> Result<String> {
        let queue = self.pending.lock().expect("alert queue poisoned");
        queue
            .front()
            .map(|alert| alert.message.clone())
            .ok_or(CrawlError::NoAlert)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text().map(|msg| msg.contains(needle)).unwrap_or(false)
    }

    /// Accepts the oldest unhandled dialog. No-op when none is open.
    pub async fn accept(&self, page: &Page) -> Result<()> {
        let front = {
            let mut queue = self.pending.lock().expect("alert queue poisoned");
            queue.pop_front()
        };

        let Some(alert) = front else {
            return Ok(());
        };

        tracing::debug!("Accepting dialog: {}", alert.message);

        let params = HandleJavaScriptDialogParams::builder()
            .accept(true)
            .build()
            .map_err(|e| CrawlError::General(format!("Failed to build dialog params: {}", e)))?;

        page.execute(params)
            .await
            .map_err(|e| CrawlError::General(format!("Failed to accept dialog: {}", e)))?;

        Ok(())
    }
}
