//! Command-line interface definition for the `clinic` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use clinic_core::{ArchiveCategory, LensPower, NewDoctor, NewMedicalRecord};

use crate::commands::clinical::PrescriptionForm;
use crate::commands::patient::PatientForm;
use crate::commands::sales::SaleItemInput;

/// Front-desk tool for an optical clinic: patients, appointments, billing,
/// retail sales and invoices on a local SQLite database
#[derive(Debug, Parser)]
#[command(name = "clinic", version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: config.toml in the platform config dir)
    #[arg(global = true, long)]
    pub config: Option<PathBuf>,

    /// Override the database path
    #[arg(global = true, long)]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the database and run migrations
    Init,

    /// Show the effective configuration
    Config,

    /// Staff accounts
    User {
        #[command(subcommand)]
        action: UserCommand,
    },

    /// Check a username and password
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Patient registration
    Patient {
        #[command(subcommand)]
        action: PatientCommand,
    },

    /// Doctor records
    Doctor {
        #[command(subcommand)]
        action: DoctorCommand,
    },

    /// Book and complete appointments
    Appointment {
        #[command(subcommand)]
        action: AppointmentCommand,
    },

    /// Archived records
    Archive {
        #[command(subcommand)]
        action: ArchiveCommand,
    },

    /// Patient bills
    Bill {
        #[command(subcommand)]
        action: BillCommand,
    },

    /// Clinic supplies and equipment
    Inventory {
        #[command(subcommand)]
        action: InventoryCommand,
    },

    /// Retail catalogue
    Product {
        #[command(subcommand)]
        action: ProductCommand,
    },

    /// Retail sales
    Sale {
        #[command(subcommand)]
        action: SaleCommand,
    },

    /// Procedure price list
    Procedure {
        #[command(subcommand)]
        action: ProcedureCommand,
    },

    /// Eye prescriptions
    Prescription {
        #[command(subcommand)]
        action: PrescriptionCommand,
    },

    /// Medical records
    Record {
        #[command(subcommand)]
        action: RecordCommand,
    },

    /// Patients due for a follow-up visit
    Followups,

    /// Appointment reminders
    Reminder {
        #[command(subcommand)]
        action: ReminderCommand,
    },

    /// Invoices for sales
    Invoice {
        #[command(subcommand)]
        action: InvoiceCommand,
    },

    /// Today's counters and outstanding balances
    Dashboard,

    /// Reports
    Report {
        #[command(subcommand)]
        action: ReportCommand,
    },
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a staff account
    Add {
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Staff")]
        role: String,
    },
    /// List staff accounts
    List,
}

// =============================================================================
// Patients and doctors
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum PatientCommand {
    /// Register a patient
    Add(PatientArgs),
    /// List patients, newest first
    List {
        /// Match surname, first name or contact
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one patient
    Show { id: i64 },
    /// Appointments, prescriptions, records, bills and invoices for one patient
    History { id: i64 },
    /// Replace a patient's details
    Update {
        id: i64,
        #[command(flatten)]
        details: PatientArgs,
    },
    /// Move a patient to the archive
    Archive { id: i64 },
    /// Bring a patient back from the archive
    Restore { id: i64 },
}

#[derive(Debug, Args)]
pub struct PatientArgs {
    #[arg(long)]
    pub surname: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long = "mi")]
    pub middle_initial: Option<String>,
    /// Blank or omitted when unknown
    #[arg(long)]
    pub age: Option<String>,
    /// Male, Female or Other
    #[arg(long)]
    pub gender: String,
    /// Kids or Adult; derived from the age when omitted
    #[arg(long)]
    pub age_group: Option<String>,
    #[arg(long)]
    pub contact: String,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long = "history")]
    pub medical_history: Option<String>,
}

impl From<PatientArgs> for PatientForm {
    fn from(a: PatientArgs) -> Self {
        PatientForm {
            surname: a.surname,
            first_name: a.first_name,
            middle_initial: a.middle_initial,
            age: a.age.unwrap_or_default(),
            gender: a.gender,
            age_group: a.age_group,
            address: a.address,
            contact: a.contact,
            email: a.email,
            medical_history: a.medical_history,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum DoctorCommand {
    /// Add a doctor
    Add(DoctorArgs),
    /// List doctors
    List,
    /// Replace a doctor's details
    Update {
        id: i64,
        #[command(flatten)]
        details: DoctorArgs,
    },
    /// Move a doctor to the archive
    Archive { id: i64 },
}

#[derive(Debug, Args)]
pub struct DoctorArgs {
    #[arg(long)]
    pub surname: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long = "mi")]
    pub middle_initial: Option<String>,
    #[arg(long)]
    pub license: String,
    #[arg(long)]
    pub specialization: String,
    #[arg(long)]
    pub contact: Option<String>,
    /// Free text, e.g. "Mon-Sat 9:00-17:00"
    #[arg(long)]
    pub schedule: Option<String>,
}

impl From<DoctorArgs> for NewDoctor {
    fn from(a: DoctorArgs) -> Self {
        NewDoctor {
            surname: a.surname,
            first_name: a.first_name,
            middle_initial: a.middle_initial,
            license_number: a.license,
            specialization: a.specialization,
            contact: a.contact,
            schedule: a.schedule,
        }
    }
}

// =============================================================================
// Appointments and archive
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum AppointmentCommand {
    /// Book an appointment
    Schedule {
        #[arg(long)]
        patient: i64,
        #[arg(long)]
        doctor: i64,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: String,
    },
    /// List appointments
    List {
        /// Only the scheduled appointments on this day (YYYY-MM-DD)
        #[arg(long)]
        on: Option<String>,
    },
    /// Mark an appointment done (moves it to the archive)
    Done { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ArchiveCommand {
    /// List archived records of one kind
    List { kind: ArchiveKind },
    /// Restore an archived record under its original id
    Restore { kind: ArchiveKind, id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ArchiveKind {
    Patient,
    Doctor,
    Appointment,
    Inventory,
}

impl From<ArchiveKind> for ArchiveCategory {
    fn from(kind: ArchiveKind) -> Self {
        match kind {
            ArchiveKind::Patient => ArchiveCategory::Patient,
            ArchiveKind::Doctor => ArchiveCategory::Doctor,
            ArchiveKind::Appointment => ArchiveCategory::Appointment,
            ArchiveKind::Inventory => ArchiveCategory::InventoryItem,
        }
    }
}

// =============================================================================
// Money
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum BillCommand {
    /// Record a bill
    Add {
        #[arg(long)]
        patient: i64,
        /// Amount, e.g. 1500 or 1,500.50
        #[arg(long)]
        amount: String,
        #[arg(long)]
        service: Option<String>,
        /// Cash, Card or Check
        #[arg(long)]
        method: Option<String>,
        /// Pending or Paid
        #[arg(long)]
        status: Option<String>,
    },
    /// List bills, newest first
    List {
        #[arg(long)]
        patient: Option<i64>,
    },
    /// Mark a bill paid
    Pay { id: i64 },
    /// Total of unpaid bills
    Outstanding,
}

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// Add an inventory item
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        unit_price: String,
        #[arg(long)]
        supplier: Option<String>,
    },
    /// List inventory items
    List,
    /// Receive (positive) or withdraw (negative) stock
    Adjust {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    /// Move an item to the archive
    Archive { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// Add a product to the catalogue
    Add {
        #[arg(long)]
        name: String,
        /// e.g. Frames, Lenses, Contact Lenses, Eye Care Products
        #[arg(long)]
        category: String,
        #[arg(long)]
        price: String,
        #[arg(long, default_value_t = 0)]
        quantity: i64,
        #[arg(long)]
        description: Option<String>,
    },
    /// List the catalogue
    List {
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SaleCommand {
    /// Sell products at catalogue price
    Create {
        #[arg(long)]
        customer: String,
        /// <product id>:<quantity>, repeatable
        #[arg(long = "item", required = true)]
        items: Vec<SaleItemInput>,
    },
    /// List sales, newest first
    List,
    /// Show a sale with its items
    Show { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ProcedureCommand {
    /// Add a procedure to the price list
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        cost: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show the price list
    List,
}

// =============================================================================
// Clinical
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum PrescriptionCommand {
    /// Issue a prescription (valid for one year)
    Add(PrescriptionArgs),
    /// List prescriptions
    List {
        /// One patient's history, with the currently valid prescription
        #[arg(long)]
        patient: Option<i64>,
    },
    /// Prescriptions expiring within 30 days
    Expiring,
    /// Delete a prescription
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct PrescriptionArgs {
    #[arg(long)]
    pub patient: i64,
    #[arg(long)]
    pub doctor: i64,
    #[arg(long)]
    pub appointment: Option<i64>,
    #[arg(long, allow_hyphen_values = true)]
    pub od_sphere: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub od_cylinder: Option<String>,
    #[arg(long)]
    pub od_axis: Option<String>,
    #[arg(long)]
    pub od_add: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub os_sphere: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    pub os_cylinder: Option<String>,
    #[arg(long)]
    pub os_axis: Option<String>,
    #[arg(long)]
    pub os_add: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl From<PrescriptionArgs> for PrescriptionForm {
    fn from(a: PrescriptionArgs) -> Self {
        PrescriptionForm {
            patient_id: a.patient,
            doctor_id: a.doctor,
            appointment_id: a.appointment,
            od: LensPower {
                sphere: a.od_sphere,
                cylinder: a.od_cylinder,
                axis: a.od_axis,
                add: a.od_add,
            },
            os: LensPower {
                sphere: a.os_sphere,
                cylinder: a.os_cylinder,
                axis: a.os_axis,
                add: a.os_add,
            },
            notes: a.notes,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum RecordCommand {
    /// Add a medical record
    Add(RecordArgs),
    /// List medical records
    List {
        #[arg(long)]
        patient: Option<i64>,
    },
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[arg(long)]
    pub patient: i64,
    #[arg(long)]
    pub doctor: i64,
    #[arg(long)]
    pub appointment: Option<i64>,
    #[arg(long)]
    pub diagnosis: String,
    /// Defaults to Normal
    #[arg(long)]
    pub severity: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub recommendations: Option<String>,
    /// Days until the follow-up visit (default 90)
    #[arg(long)]
    pub followup_days: Option<i64>,
}

impl From<RecordArgs> for NewMedicalRecord {
    fn from(a: RecordArgs) -> Self {
        NewMedicalRecord {
            patient_id: a.patient,
            doctor_id: a.doctor,
            appointment_id: a.appointment,
            diagnosis: a.diagnosis,
            severity: a.severity,
            clinical_notes: a.notes,
            recommendations: a.recommendations,
            followup_days: a.followup_days,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ReminderCommand {
    /// Remind a patient of an appointment
    Add {
        #[arg(long)]
        appointment: i64,
        /// YYYY-MM-DD; defaults to the day before the visit
        #[arg(long)]
        date: Option<String>,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        /// SMS, Email or Call
        #[arg(long)]
        method: Option<String>,
    },
    /// Reminders due today or earlier
    Pending,
    /// Mark a reminder sent
    Sent { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum InvoiceCommand {
    /// Invoice a sale at the configured tax rate
    Create {
        #[arg(long)]
        sale: i64,
        #[arg(long)]
        patient: Option<i64>,
        /// Staff member generating the invoice
        #[arg(long, default_value = "admin")]
        by: String,
    },
    /// Show an invoice with its items
    Show { id: i64 },
    /// List invoices
    List {
        #[arg(long)]
        patient: Option<i64>,
    },
    /// Mark an invoice paid
    Pay { id: i64 },
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Products, stock and average price per category
    Sales,
    /// Patients by age group and gender
    Demographics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sale_items_and_globals() {
        let cli = Cli::try_parse_from([
            "clinic", "--json", "sale", "create", "--customer", "Walk-in", "--item", "3:2", "--item", "7",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Command::Sale {
                action: SaleCommand::Create { customer, items },
            } => {
                assert_eq!(customer, "Walk-in");
                assert_eq!(items.len(), 2);
                assert_eq!(items[0].quantity, 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_negative_adjustment() {
        let cli = Cli::try_parse_from(["clinic", "inventory", "adjust", "4", "-3"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Inventory {
                action: InventoryCommand::Adjust { id: 4, delta: -3 }
            }
        ));
    }

    #[test]
    fn test_patient_history() {
        let cli = Cli::try_parse_from(["clinic", "patient", "history", "12"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Patient {
                action: PatientCommand::History { id: 12 }
            }
        ));
    }

    #[test]
    fn test_archive_kind() {
        let cli = Cli::try_parse_from(["clinic", "archive", "restore", "inventory", "9"]).unwrap();
        match cli.command {
            Command::Archive {
                action: ArchiveCommand::Restore { kind, id },
            } => {
                assert_eq!(ArchiveCategory::from(kind), ArchiveCategory::InventoryItem);
                assert_eq!(id, 9);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
