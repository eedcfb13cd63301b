//! Platform notification surface contract.
//!
//! The actual display mechanism (desktop notification, browser API, a
//! status bar) is an external collaborator; this module defines the
//! contract the sync engine talks to and a logging implementation for
//! headless use. Display failures are logged, never propagated into the
//! sync path.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use roomsense_types::{AlertDescriptor, Metric};

use crate::error::Result;

/// Default auto-dismiss duration for displayed notices.
pub const DEFAULT_DISMISS: Duration = Duration::from_secs(5);

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// The user allowed notifications.
    Granted,
    /// The user refused notifications.
    Denied,
    /// The user has not decided yet.
    Undecided,
}

/// A notice to display on the notification surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    /// Short title line.
    pub title: String,
    /// Body text; may span multiple lines.
    pub body: String,
    /// Optional icon location.
    pub icon: Option<String>,
    /// Optional grouping tag; notices with the same tag replace each other.
    pub tag: Option<String>,
    /// Auto-dismiss after this duration.
    pub duration: Duration,
}

impl Notice {
    /// Create a notice with the default dismiss duration.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: None,
            tag: None,
            duration: DEFAULT_DISMISS,
        }
    }

    /// Set the icon.
    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// Set the grouping tag.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the auto-dismiss duration.
    #[must_use]
    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Display surface for user-facing notices.
#[async_trait]
pub trait NotificationSurface: Send + Sync {
    /// Ask the platform for permission to display notices.
    ///
    /// Implementations may cache the answer.
    async fn request_permission(&self) -> Permission;

    /// Display a notice. The surface owns auto-dismiss timing.
    async fn display(&self, notice: &Notice) -> Result<()>;
}

/// Format a batch of alerts into one notice.
///
/// Returns `None` for an empty batch.
pub fn alert_notice(alerts: &[AlertDescriptor]) -> Option<Notice> {
    if alerts.is_empty() {
        return None;
    }

    let body = alerts
        .iter()
        .map(|a| match a.metric {
            Metric::Co2 => format!("Elevated CO2: {} {}", a.value, a.metric.unit()),
            Metric::Temperature => {
                format!("Abnormal temperature: {}{}", a.value, a.metric.unit())
            }
            Metric::Humidity => format!("Abnormal humidity: {}{}", a.value, a.metric.unit()),
            _ => format!("Abnormal {}: {} {}", a.metric, a.value, a.metric.unit()),
        })
        .collect::<Vec<_>>()
        .join("\n");

    Some(
        Notice::new("Alerts detected", body)
            .icon("/alert-icon.png")
            .tag("alert"),
    )
}

/// Display a notice if the surface permits it.
///
/// Requests permission first; undecided or denied permission suppresses the
/// notice, and display failures are logged rather than propagated.
pub async fn raise(surface: &dyn NotificationSurface, notice: &Notice) {
    match surface.request_permission().await {
        Permission::Granted => {
            if let Err(e) = surface.display(notice).await {
                warn!("Notification display failed: {}", e);
            }
        }
        permission => {
            debug!("Notice suppressed, permission is {:?}", permission);
        }
    }
}

/// Surface that writes notices to the log. Useful for headless
/// deployments and as a safe default.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSurface;

#[async_trait]
impl NotificationSurface for LogSurface {
    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    async fn display(&self, notice: &Notice) -> Result<()> {
        info!("{}: {}", notice.title, notice.body);
        Ok(())
    }
}
