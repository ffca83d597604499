//! # Appointment Commands
//!
//! Booking, the day list and completing a visit.
//!
//! ## Appointment Lifecycle
//! ```text
//! schedule ──► Scheduled ──mark_done──► Done ──► archived_appointments
//!                  │                                    │
//!                  └── same doctor/date/time taken?     └── restore brings it
//!                      → DUPLICATE_BOOKING                  back as Done
//! ```

use serde::Deserialize;
use tracing::info;

use clinic_core::validation::{parse_date, parse_time};
use clinic_core::{Appointment, AppointmentView};

use crate::error::ApiError;
use crate::state::DbState;

/// Booking form: ids picked from lists, date and time typed as text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleForm {
    pub patient_id: i64,
    pub doctor_id: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
}

pub async fn schedule_appointment(db: &DbState, form: ScheduleForm) -> Result<Appointment, ApiError> {
    let date = parse_date(&form.date)?;
    let time = parse_time(&form.time)?;

    let appt = db
        .inner()
        .appointments()
        .schedule(form.patient_id, form.doctor_id, date, time)
        .await?;

    info!(id = appt.id, doctor_id = appt.doctor_id, %date, %time, "Appointment booked");
    Ok(appt)
}

/// All live appointments, or only the scheduled ones on `on` (`YYYY-MM-DD`).
pub async fn list_appointments(db: &DbState, on: Option<&str>) -> Result<Vec<AppointmentView>, ApiError> {
    let appointments = db.inner().appointments();
    match on {
        Some(day) => Ok(appointments.list_scheduled_on(parse_date(day)?).await?),
        None => Ok(appointments.list_appointments().await?),
    }
}

/// Completes a visit. The appointment moves to the archive and its
/// reminders are dropped.
pub async fn mark_done(db: &DbState, id: i64) -> Result<(), ApiError> {
    db.inner().appointments().mark_as_done(id).await?;
    info!(id, "Appointment done");
    Ok(())
}
