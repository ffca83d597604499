//! # Domain Types
//!
//! Records and enums used throughout Clinic Desk.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │   People            Visits                 Money                        │
//! │   ───────────       ─────────────────      ─────────────────────        │
//! │   Patient ◄──┬───── Appointment            Bill                         │
//! │   Doctor  ◄──┤      Prescription           Sale ──► SaleItem            │
//! │   User       │      MedicalRecord          Invoice (from a Sale)        │
//! │              └───── Reminder               SalesProduct, Procedure      │
//! │                                            InventoryItem                │
//! │                                                                         │
//! │   Archivable: Patient, Doctor, Appointment, InventoryItem               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Conventions
//! - Ids are SQLite rowids (`i64`).
//! - Money columns end in `_cents` and have a `Money` accessor.
//! - `New*` structs are form input; `*View` structs carry joined names.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::ADULT_AGE;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so the 12% invoice VAT is 1200 bps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (config files, CLI flags).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::INVOICE_TAX_RATE_BPS)
    }
}

// =============================================================================
// Text Enums
// =============================================================================
// Every status/choice column is stored as its display text. This macro gives
// each enum `as_str`, `Display` and a case-insensitive `FromStr` so the CLI
// and config layers can parse operator input.

macro_rules! text_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The stored/display text.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(ValidationError::NotAllowed {
                    field: $field.to_string(),
                    allowed: vec![$($text.to_string()),+],
                })
            }
        }
    };
}

/// Age bracket shown on the patient list and demographics report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum AgeGroup {
    Kids,
    Adult,
}

text_enum!(AgeGroup, "age_group", { Kids => "Kids", Adult => "Adult" });

impl AgeGroup {
    /// Derives the age group from an age.
    ///
    /// Under 18 is `Kids`. A missing age counts as 0, so it is `Kids` too.
    ///
    /// ```rust
    /// use clinic_core::types::AgeGroup;
    ///
    /// assert_eq!(AgeGroup::for_age(Some(17)), AgeGroup::Kids);
    /// assert_eq!(AgeGroup::for_age(Some(18)), AgeGroup::Adult);
    /// assert_eq!(AgeGroup::for_age(None), AgeGroup::Kids);
    /// ```
    pub fn for_age(age: Option<i64>) -> Self {
        if age.unwrap_or(0) < ADULT_AGE {
            AgeGroup::Kids
        } else {
            AgeGroup::Adult
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum Gender {
    Male,
    Female,
    Other,
}

text_enum!(Gender, "gender", { Male => "Male", Female => "Female", Other => "Other" });

/// Appointment lifecycle. `Done` appointments are archived right away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum AppointmentStatus {
    Scheduled,
    Done,
}

text_enum!(AppointmentStatus, "status", { Scheduled => "Scheduled", Done => "Done" });

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Scheduled
    }
}

/// Status shared by bills and invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentStatus {
    Pending,
    Paid,
}

text_enum!(PaymentStatus, "status", { Pending => "Pending", Paid => "Paid" });

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum PaymentMethod {
    Cash,
    Card,
    Check,
}

text_enum!(PaymentMethod, "payment_method", { Cash => "Cash", Card => "Card", Check => "Check" });

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum UserRole {
    Admin,
    Staff,
}

text_enum!(UserRole, "role", { Admin => "Admin", Staff => "Staff" });

/// How a patient is reminded of an upcoming appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum ContactMethod {
    #[serde(rename = "SMS")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "SMS"))]
    Sms,
    Email,
    Call,
}

text_enum!(ContactMethod, "contact_method", { Sms => "SMS", Email => "Email", Call => "Call" });

impl Default for ContactMethod {
    fn default() -> Self {
        ContactMethod::Sms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum ReminderStatus {
    Pending,
    Sent,
}

text_enum!(ReminderStatus, "status", { Pending => "Pending", Sent => "Sent" });

/// The record types that can be soft-deleted into an archive table.
///
/// The archive screen lists and restores records per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveCategory {
    Patient,
    Doctor,
    Appointment,
    InventoryItem,
}

text_enum!(ArchiveCategory, "category", {
    Patient => "Patient",
    Doctor => "Doctor",
    Appointment => "Appointment",
    InventoryItem => "Inventory Item",
});

// =============================================================================
// Names
// =============================================================================

/// Formats a doctor's stored name: `"Surname, FirstName M."`, or
/// `"Surname, FirstName"` without a middle initial.
///
/// ```rust
/// use clinic_core::types::format_doctor_name;
///
/// assert_eq!(format_doctor_name("Reyes", "Ana", Some("B")), "Reyes, Ana B.");
/// assert_eq!(format_doctor_name("Reyes", "Ana", None), "Reyes, Ana");
/// ```
pub fn format_doctor_name(surname: &str, first_name: &str, middle_initial: Option<&str>) -> String {
    match middle_initial.map(str::trim).filter(|mi| !mi.is_empty()) {
        Some(mi) => format!("{}, {} {}.", surname.trim(), first_name.trim(), mi.trim_end_matches('.')),
        None => format!("{}, {}", surname.trim(), first_name.trim()),
    }
}

/// Formats a patient's display name: `"Surname, FirstName M"`.
pub fn format_patient_name(surname: &str, first_name: &str, middle_initial: Option<&str>) -> String {
    match middle_initial.map(str::trim).filter(|mi| !mi.is_empty()) {
        Some(mi) => format!("{}, {} {}", surname.trim(), first_name.trim(), mi),
        None => format!("{}, {}", surname.trim(), first_name.trim()),
    }
}

// =============================================================================
// Patient
// =============================================================================

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Patient {
    pub id: i64,
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    pub age: Option<i64>,
    pub gender: Gender,
    pub age_group: AgeGroup,
    pub address: Option<String>,
    pub contact: String,
    pub email: Option<String>,
    pub medical_history: Option<String>,
    pub registration_date: NaiveDate,
}

impl Patient {
    /// `"Surname, FirstName M"`
    pub fn display_name(&self) -> String {
        format_patient_name(&self.surname, &self.first_name, self.middle_initial.as_deref())
    }
}

/// Registration form input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPatient {
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    /// Derived from `age` when left empty.
    pub age_group: Option<AgeGroup>,
    pub address: Option<String>,
    pub contact: String,
    pub email: Option<String>,
    pub medical_history: Option<String>,
}

impl NewPatient {
    /// The explicit age group, or the one derived from the age.
    pub fn resolved_age_group(&self) -> AgeGroup {
        self.age_group.unwrap_or_else(|| AgeGroup::for_age(self.age))
    }
}

// =============================================================================
// Doctor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Doctor {
    pub id: i64,
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    /// Formatted name, see [`format_doctor_name`].
    pub name: String,
    pub license_number: String,
    pub specialization: String,
    pub contact: Option<String>,
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDoctor {
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    pub license_number: String,
    pub specialization: String,
    pub contact: Option<String>,
    pub schedule: Option<String>,
}

// =============================================================================
// Appointment
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
}

/// Appointment row joined with patient and doctor names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AppointmentView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub appointment: Appointment,
    pub patient_name: String,
    pub doctor_name: String,
}

// =============================================================================
// Inventory
// =============================================================================

/// Clinic stock (lens blanks, drops, consumables).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryItem {
    pub id: i64,
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub supplier: Option<String>,
}

impl InventoryItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Quantity × unit price.
    pub fn stock_value(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub supplier: Option<String>,
}

// =============================================================================
// Billing
// =============================================================================

/// Service assigned by the quick-bill action.
pub const DEFAULT_BILL_SERVICE: &str = "General";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: i64,
    pub patient_id: i64,
    pub amount_cents: i64,
    pub service: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub billing_date: DateTime<Utc>,
}

impl Bill {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub bill: Bill,
    pub patient_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    pub patient_id: i64,
    pub amount: Money,
    pub service: String,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
}

// =============================================================================
// Users
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Procedures
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Procedure {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cost_cents: i64,
}

impl Procedure {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProcedure {
    pub name: String,
    pub description: Option<String>,
    pub cost: Money,
}

// =============================================================================
// Sales
// =============================================================================

/// Retail product sold over the counter (frames, lenses, solutions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SalesProduct {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i64,
}

impl SalesProduct {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSalesProduct {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: Money,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub customer_name: String,
    pub total_cents: i64,
    pub sale_date: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One line of a sale being rung up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
}

impl SaleLine {
    /// Unit price × quantity, or `None` when it doesn't fit in an i64.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply_quantity(self.quantity)
    }
}

/// Sums the line totals of a sale.
///
/// Fails with `InvalidFormat` on "total" when a line or the sum overflows.
pub fn sale_total(lines: &[SaleLine]) -> Result<Money, ValidationError> {
    lines.iter().try_fold(Money::zero(), |total, line| {
        line.line_total()
            .and_then(|amount| total.checked_add(amount))
            .ok_or_else(|| ValidationError::invalid("total", "amount is too large"))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
}

/// Sale item joined with the product name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItemDetail {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub item: SaleItem,
    pub product_name: String,
}

impl SaleItemDetail {
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.item.unit_price_cents).multiply_quantity(self.item.quantity)
    }
}

/// Per-category row of the sales report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CategorySalesSummary {
    pub category: String,
    pub product_count: i64,
    pub total_quantity: i64,
    pub average_price_cents: i64,
}

// =============================================================================
// Prescriptions
// =============================================================================

/// Eyeglass prescription. Lens powers are kept as typed (`"-2.00"`, `"+1.50"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Prescription {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub issued_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub od_sphere: Option<String>,
    pub od_cylinder: Option<String>,
    pub od_axis: Option<String>,
    pub od_add: Option<String>,
    pub os_sphere: Option<String>,
    pub os_cylinder: Option<String>,
    pub os_axis: Option<String>,
    pub os_add: Option<String>,
    pub notes: Option<String>,
}

impl Prescription {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }
}

/// Sphere, cylinder, axis and add for one eye.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LensPower {
    pub sphere: Option<String>,
    pub cylinder: Option<String>,
    pub axis: Option<String>,
    pub add: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPrescription {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    /// Right eye (OD).
    pub right: LensPower,
    /// Left eye (OS).
    pub left: LensPower,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PrescriptionView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub prescription: Prescription,
    pub patient_name: String,
    pub doctor_name: String,
    pub contact: String,
}

// =============================================================================
// Medical Records
// =============================================================================

/// Severity recorded when the visit form leaves it blank.
pub const DEFAULT_SEVERITY: &str = "Normal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MedicalRecord {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub diagnosis: String,
    pub severity: String,
    pub clinical_notes: Option<String>,
    pub recommendations: Option<String>,
    pub followup_days: i64,
    pub recorded_date: NaiveDate,
}

impl MedicalRecord {
    /// The day a follow-up visit becomes due.
    pub fn followup_due(&self) -> NaiveDate {
        self.recorded_date + chrono::Duration::days(self.followup_days)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMedicalRecord {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub diagnosis: String,
    pub severity: Option<String>,
    pub clinical_notes: Option<String>,
    pub recommendations: Option<String>,
    /// Defaults to [`crate::DEFAULT_FOLLOWUP_DAYS`].
    pub followup_days: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MedicalRecordView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub record: MedicalRecord,
    pub patient_name: String,
    pub doctor_name: String,
}

/// A record whose follow-up date has arrived, with patient contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DueFollowup {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub record: MedicalRecord,
    pub patient_name: String,
    pub contact: String,
    pub email: Option<String>,
}

// =============================================================================
// Reminders
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Reminder {
    pub id: i64,
    pub appointment_id: i64,
    pub patient_id: i64,
    pub reminder_date: NaiveDate,
    pub reminder_time: Option<NaiveTime>,
    pub contact_method: ContactMethod,
    pub status: ReminderStatus,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReminder {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub reminder_date: NaiveDate,
    pub reminder_time: Option<NaiveTime>,
    /// Defaults to SMS.
    pub contact_method: Option<ContactMethod>,
}

/// Pending reminder joined with the patient and the appointment slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PendingReminder {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub reminder: Reminder,
    pub patient_name: String,
    pub contact: String,
    pub email: Option<String>,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
}

// =============================================================================
// Invoices
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: i64,
    pub sale_id: i64,
    pub patient_id: Option<i64>,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub total_cents: i64,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
    pub generated_by: String,
    pub status: PaymentStatus,
}

impl Invoice {
    /// `INV-YYYYMMDD-<sale id>`
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use clinic_core::types::Invoice;
    ///
    /// let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
    /// assert_eq!(Invoice::number_for(date, 41), "INV-20260302-41");
    /// ```
    pub fn number_for(date: NaiveDate, sale_id: i64) -> String {
        format!("INV-{}-{}", date.format("%Y%m%d"), sale_id)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }
}

/// Invoice joined with its sale's customer and the patient, if linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InvoiceView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub invoice: Invoice,
    pub customer_name: String,
    pub patient_name: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub patients_today: i64,
    pub total_patients: i64,
    pub total_doctors: i64,
    pub scheduled_appointments: i64,
    pub total_sales: i64,
    pub inventory_items: i64,
    pub pending_reminders: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderCount {
    pub gender: Gender,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub total: i64,
    pub kids: i64,
    pub adults: i64,
    pub by_gender: Vec<GenderCount>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_boundary() {
        assert_eq!(AgeGroup::for_age(Some(0)), AgeGroup::Kids);
        assert_eq!(AgeGroup::for_age(Some(17)), AgeGroup::Kids);
        assert_eq!(AgeGroup::for_age(Some(18)), AgeGroup::Adult);
        assert_eq!(AgeGroup::for_age(Some(90)), AgeGroup::Adult);
        assert_eq!(AgeGroup::for_age(None), AgeGroup::Kids);
    }

    #[test]
    fn test_resolved_age_group_prefers_explicit_value() {
        let mut form = NewPatient {
            age: Some(30),
            ..Default::default()
        };
        assert_eq!(form.resolved_age_group(), AgeGroup::Adult);

        form.age_group = Some(AgeGroup::Kids);
        assert_eq!(form.resolved_age_group(), AgeGroup::Kids);
    }

    #[test]
    fn test_doctor_and_patient_names() {
        assert_eq!(format_doctor_name(" Cruz ", "Jose", Some("P.")), "Cruz, Jose P.");
        assert_eq!(format_doctor_name("Cruz", "Jose", Some("  ")), "Cruz, Jose");
        assert_eq!(format_patient_name("Santos", "Maria", Some("L")), "Santos, Maria L");
        assert_eq!(format_patient_name("Santos", "Maria", None), "Santos, Maria");
    }

    #[test]
    fn test_text_enum_parsing() {
        assert_eq!("sms".parse::<ContactMethod>().unwrap(), ContactMethod::Sms);
        assert_eq!(ContactMethod::Sms.to_string(), "SMS");
        assert_eq!(
            "inventory item".parse::<ArchiveCategory>().unwrap(),
            ArchiveCategory::InventoryItem
        );
        assert!(matches!(
            "maybe".parse::<Gender>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }

    #[test]
    fn test_contact_method_serializes_as_stored_text() {
        let json = serde_json::to_string(&ContactMethod::Sms).unwrap();
        assert_eq!(json, "\"SMS\"");
    }

    #[test]
    fn test_sale_total() {
        let lines = [
            SaleLine {
                product_id: 1,
                quantity: 2,
                unit_price: Money::from_cents(120_000),
            },
            SaleLine {
                product_id: 2,
                quantity: 3,
                unit_price: Money::from_cents(25_050),
            },
        ];
        assert_eq!(sale_total(&lines).unwrap().cents(), 315_150);
        assert_eq!(sale_total(&[]).unwrap().cents(), 0);
    }

    #[test]
    fn test_sale_total_overflow_is_rejected() {
        let huge_quantity = [SaleLine {
            product_id: 1,
            quantity: 100_000_000_000_000,
            unit_price: Money::from_cents(280_000),
        }];
        let err = sale_total(&huge_quantity).unwrap_err();
        assert!(err.to_string().contains("amount is too large"));

        let line = SaleLine {
            product_id: 1,
            quantity: 1,
            unit_price: Money::from_cents(i64::MAX / 2 + 1),
        };
        assert!(sale_total(&[line]).is_ok());
        assert!(sale_total(&[line, line]).is_err());
    }

    #[test]
    fn test_followup_due_date() {
        let record = MedicalRecord {
            id: 1,
            patient_id: 1,
            doctor_id: 1,
            appointment_id: None,
            diagnosis: "Myopia".to_string(),
            severity: DEFAULT_SEVERITY.to_string(),
            clinical_notes: None,
            recommendations: None,
            followup_days: 90,
            recorded_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        };
        assert_eq!(record.followup_due(), NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn test_tax_rate_default_is_invoice_vat() {
        assert_eq!(TaxRate::default().bps(), 1200);
        assert_eq!(TaxRate::from_percentage(12.0).bps(), 1200);
    }
}
