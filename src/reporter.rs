use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use log::info;
use serde_json::json;

use crate::collaborators::CommManager;

/// Feedback channel backed by a Discord webhook.
///
/// Reports are grouped under a ticket opened at the start of every print.
/// Without a webhook URL the reporter only logs what it would have sent.
pub struct WebhookReporter {
    webhook_url: Option<String>,
    client: reqwest::blocking::Client,
    running: AtomicBool,
    ticket: Mutex<Option<String>>,
}

impl WebhookReporter {
    /// Create a new WebhookReporter.
    ///
    /// # Arguments
    ///
    /// * `webhook_url` - Discord webhook URL, or `None` to only log reports
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url,
            client: reqwest::blocking::Client::new(),
            running: AtomicBool::new(false),
            ticket: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn current_ticket(&self) -> Option<String> {
        self.ticket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Send a Discord alert with rich embed formatting.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - The Discord API returns an error status
    fn send_embed(&self, url: &str, title: &str, description: &str, color: u32) -> Result<()> {
        let timestamp = chrono::Utc::now().to_rfc3339();

        let embed = json!({
            "embeds": [{
                "title": title,
                "description": description,
                "color": color,
                "timestamp": timestamp,
                "footer": {
                    "text": "Print Telemetry"
                }
            }]
        });

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(&embed)
            .send()?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Failed to send Discord feedback: HTTP {}",
                response.status()
            ));
        }

        Ok(())
    }
}

impl CommManager for WebhookReporter {
    fn start_service(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            info!("Feedback channel started");
        }
    }

    fn kill_service(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("Feedback channel stopped");
        }
    }

    fn new_ticket(&self) {
        let ticket = chrono::Utc::now().format("%Y%m%d-%H%M%S%.3f").to_string();
        info!("Opened feedback ticket {}", ticket);
        *self
            .ticket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(ticket);
    }

    /// Report a defect classification under the current ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is not running or the webhook
    /// request fails.
    fn send_feedback(&self, classification: &str) -> Result<()> {
        if !self.is_running() {
            return Err(anyhow::anyhow!("Feedback channel is not running"));
        }
        let ticket = self.current_ticket().unwrap_or_else(|| "none".to_string());
        let description = format!(
            "Ticket: **{}**\nReported defect: **{}**",
            ticket, classification
        );

        match &self.webhook_url {
            Some(url) => self.send_embed(url, "Print Feedback", &description, 0x0099FF),
            None => {
                info!("Feedback (no webhook configured): {}", description);
                Ok(())
            }
        }
    }
}
