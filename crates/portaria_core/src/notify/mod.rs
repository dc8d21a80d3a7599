//! Outbound resident notifications.
//!
//! # Responsibility
//! - Compose the package-arrival message and its messaging deep link.
//! - Hand the notification to a pluggable `Notifier`.
//!
//! # Invariants
//! - Notification is best effort: a notifier failure never fails the
//!   package registration that triggered it.
//! - Phone numbers and message bodies are never written to logs.

pub mod whatsapp;

use crate::model::package::Package;
use crate::model::resident::Resident;
use chrono::{Local, TimeZone};
use log::info;
use thiserror::Error;

pub use whatsapp::{build_whatsapp_link, normalize_phone};

/// Arrival notice for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalNotification {
    pub resident_id: String,
    pub package_id: String,
    /// Human-readable message text.
    pub message: String,
    /// Deep link that opens the messaging app with `message` prefilled.
    pub link: String,
}

impl ArrivalNotification {
    /// Composes the notice, or `None` when the resident has no usable phone.
    pub fn compose(resident: &Resident, package: &Package) -> Option<Self> {
        let message = arrival_message(resident, package);
        let link = build_whatsapp_link(&resident.phone, &message)?;
        Some(Self {
            resident_id: resident.id.to_string(),
            package_id: package.id.to_string(),
            message,
            link,
        })
    }

    /// Composes the pickup reminder sent from the package list, or `None`
    /// when the resident has no usable phone.
    pub fn compose_reminder(resident: &Resident, package: &Package) -> Option<Self> {
        let message = reminder_message(resident, package);
        let link = build_whatsapp_link(&resident.phone, &message)?;
        Some(Self {
            resident_id: resident.id.to_string(),
            package_id: package.id.to_string(),
            message,
            link,
        })
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Delivery seam for arrival notices.
pub trait Notifier {
    fn notify(&self, notification: &ArrivalNotification) -> Result<(), NotifyError>;
}

/// Default notifier: records that a notice is ready for the UI shell.
///
/// The shell opens `ArrivalNotification::link` itself; this notifier only
/// leaves a metadata trail.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &ArrivalNotification) -> Result<(), NotifyError> {
        info!(
            "event=notify_arrival module=notify status=ok package_id={} link_len={}",
            notification.package_id,
            notification.link.len()
        );
        Ok(())
    }
}

/// Builds the arrival message shown to the resident.
pub fn arrival_message(resident: &Resident, package: &Package) -> String {
    format!(
        "📦 Olá {}! Sua encomenda ({}) chegou na portaria.\nToken: {}\nHorário: {}",
        resident.first_name,
        package.origin,
        package.token,
        format_local_time(package.received_at)
    )
}

/// Builds the reminder carrying the pickup token.
pub fn reminder_message(resident: &Resident, package: &Package) -> String {
    let origin = if package.origin.trim().is_empty() {
        "origem não informada"
    } else {
        package.origin.as_str()
    };
    format!(
        "Olá {}! 📦\n\nSua encomenda de {} chegou na portaria.\n\nToken para retirada: *{}*.\n\nObrigado! 🏢",
        resident.full_name(),
        origin,
        package.token
    )
}

/// Renders epoch milliseconds as `dd/mm/yyyy HH:MM` in local time.
///
/// Returns `—` for out-of-range values.
pub fn format_local_time(epoch_ms: i64) -> String {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .map(|instant| instant.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|| "—".to_string())
}
