use crate::templates::AlertEmailRenderer;
use crate::{EmailMessage, EmailTransport};
use std::sync::Arc;
use vitalmon_common::types::{Alert, NotificationPreferences};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Email or health-alert notifications are switched off.
    NotificationsDisabled,
    /// The subject opted out of emails for this severity.
    SeverityOptedOut,
    /// Preferences allow the email but hold no address.
    NoRecipient,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotificationsDisabled => "notifications_disabled",
            SkipReason::SeverityOptedOut => "severity_opted_out",
            SkipReason::NoRecipient => "no_recipient",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Dispatched { message_id: String },
    Skipped(SkipReason),
    /// Delivery was attempted and failed. Logged, never propagated.
    Failed { error: String },
}

/// Either an address to deliver to or the reason not to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision<'a> {
    Send { to: &'a str },
    Skip(SkipReason),
}

/// Decides per alert whether to email the subject and sends it if so.
pub struct NotificationRouter {
    transport: Arc<dyn EmailTransport>,
}

impl NotificationRouter {
    pub fn new(transport: Arc<dyn EmailTransport>) -> Self {
        Self { transport }
    }

    /// Applies the preference gates in order: global switches, the
    /// per-severity toggle, then the presence of an address.
    pub fn decide<'a>(alert: &Alert, prefs: &'a NotificationPreferences) -> Decision<'a> {
        if !prefs.email_notifications || !prefs.health_alerts {
            return Decision::Skip(SkipReason::NotificationsDisabled);
        }
        if !prefs.email_alert_types.enabled(alert.severity) {
            return Decision::Skip(SkipReason::SeverityOptedOut);
        }
        match prefs.email_address.as_deref().map(str::trim) {
            Some(to) if !to.is_empty() => Decision::Send { to },
            _ => Decision::Skip(SkipReason::NoRecipient),
        }
    }

    /// Routes one persisted alert. Never returns an error: transport and
    /// template failures come back as [`RouteOutcome::Failed`].
    pub async fn route(&self, alert: &Alert, prefs: &NotificationPreferences) -> RouteOutcome {
        let to = match Self::decide(alert, prefs) {
            Decision::Send { to } => to,
            Decision::Skip(reason) => {
                if reason == SkipReason::NoRecipient {
                    tracing::warn!(
                        subject_id = %alert.subject_id,
                        alert_id = %alert.id,
                        "Email alert enabled but no address on file"
                    );
                } else {
                    tracing::debug!(
                        subject_id = %alert.subject_id,
                        alert_id = %alert.id,
                        reason = reason.as_str(),
                        "Notification skipped"
                    );
                }
                return RouteOutcome::Skipped(reason);
            }
        };

        let rendered = match AlertEmailRenderer::render(alert) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(alert_id = %alert.id, error = %e, "Failed to render alert email");
                return RouteOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };
        let message = EmailMessage {
            to: to.to_string(),
            subject: rendered.subject,
            html_body: rendered.html_body,
            text_body: rendered.text_body,
        };

        match self.transport.send(&message).await {
            Ok(receipt) => {
                tracing::info!(
                    subject_id = %alert.subject_id,
                    alert_id = %alert.id,
                    severity = %alert.severity,
                    transport = self.transport.transport_name(),
                    message_id = %receipt.message_id,
                    "Alert email dispatched"
                );
                RouteOutcome::Dispatched {
                    message_id: receipt.message_id,
                }
            }
            Err(e) => {
                tracing::error!(
                    subject_id = %alert.subject_id,
                    alert_id = %alert.id,
                    transport = self.transport.transport_name(),
                    error = %e,
                    "Failed to send alert email"
                );
                RouteOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}
