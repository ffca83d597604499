//! # Reminder Commands
//!
//! Reminders are attached to a scheduled appointment; the patient is taken
//! from the appointment. Without an explicit date the reminder is due the
//! day before the visit (or today, if that has passed).

use chrono::{Duration, Local};
use serde::Deserialize;
use tracing::info;

use clinic_core::validation::{optional_text, parse_date, parse_time};
use clinic_core::{ContactMethod, NewReminder, PendingReminder, Reminder};

use super::parse_choice;
use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderForm {
    pub appointment_id: i64,
    pub date: Option<String>,
    pub time: Option<String>,
    /// SMS, Email or Call; defaults to SMS
    pub method: Option<String>,
}

pub async fn create_reminder(db: &DbState, form: ReminderForm) -> Result<Reminder, ApiError> {
    let appt = db
        .inner()
        .appointments()
        .get_appointment(form.appointment_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Appointment", form.appointment_id))?;

    let reminder_date = match optional_text(form.date) {
        Some(date) => parse_date(&date)?,
        None => (appt.appointment_date - Duration::days(1)).max(Local::now().date_naive()),
    };
    let reminder_time = optional_text(form.time)
        .map(|t| parse_time(&t))
        .transpose()?;

    let reminder = db
        .inner()
        .reminders()
        .create_reminder(NewReminder {
            appointment_id: appt.id,
            patient_id: appt.patient_id,
            reminder_date,
            reminder_time,
            contact_method: parse_choice::<ContactMethod>(form.method.as_deref())?,
        })
        .await?;

    info!(id = reminder.id, appointment_id = appt.id, %reminder_date, "Reminder set");
    Ok(reminder)
}

/// Reminders due today or earlier that haven't been sent.
pub async fn pending_reminders(db: &DbState) -> Result<Vec<PendingReminder>, ApiError> {
    Ok(db.inner().reminders().get_pending_reminders().await?)
}

pub async fn mark_sent(db: &DbState, id: i64) -> Result<Reminder, ApiError> {
    Ok(db.inner().reminders().mark_sent(id).await?)
}
