use crate::error::{NotifyError, Result};
use vitalmon_common::types::{Alert, Severity};

/// Subject and bodies for one alert email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

struct SeverityStyle {
    subject_prefix: &'static str,
    heading: &'static str,
    accent: &'static str,
    guidance: &'static str,
}

fn style(severity: Severity) -> SeverityStyle {
    match severity {
        Severity::Critical => SeverityStyle {
            subject_prefix: "[Critical]",
            heading: "Critical health alert",
            accent: "#c81e1e",
            guidance: "Please review this reading now. If you feel unwell, contact your care team or emergency services.",
        },
        Severity::Warning => SeverityStyle {
            subject_prefix: "[Warning]",
            heading: "Health warning",
            accent: "#d97706",
            guidance: "Keep an eye on this reading and mention it to your care team if it persists.",
        },
        Severity::Info => SeverityStyle {
            subject_prefix: "[Info]",
            heading: "Health update",
            accent: "#2563eb",
            guidance: "No action is needed.",
        },
    }
}

pub struct AlertEmailRenderer;

impl AlertEmailRenderer {
    pub fn render(alert: &Alert) -> Result<RenderedEmail> {
        let style = style(alert.severity);
        let observed_at = alert.observed_at.format("%Y-%m-%d %H:%M UTC").to_string();

        let html_body = include_str!("templates/alert_email.html")
            .replace("{{heading}}", style.heading)
            .replace("{{accent}}", style.accent)
            .replace("{{title}}", &html_escape(&alert.title))
            .replace("{{message}}", &html_escape(&alert.message))
            .replace("{{guidance}}", style.guidance)
            .replace("{{observed_at}}", &observed_at)
            .replace("{{severity}}", alert.severity.as_str());
        if html_body.contains("{{") {
            return Err(NotifyError::Template(
                "unreplaced placeholder in alert_email.html".into(),
            ));
        }

        let text_body = format!(
            "{heading}\n\n{title}\n{message}\n\n{guidance}\n\nObserved {observed_at}\n",
            heading = style.heading,
            title = alert.title,
            message = alert.message,
            guidance = style.guidance,
        );

        Ok(RenderedEmail {
            subject: format!("{} {}", style.subject_prefix, alert.title),
            html_body,
            text_body,
        })
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('{', "&#123;")
}
