//! # clinic-desk: Front Desk for an Optical Clinic
//!
//! Configuration, logging bootstrap, the command layer and the `clinic`
//! command line.
//!
//! ## Startup Sequence
//! 1. Parse the command line
//! 2. Load configuration (env > config.toml > defaults)
//! 3. Initialize tracing (logging to stderr)
//! 4. Open the database and run migrations
//! 5. Dispatch to a command, print the result as text or JSON

use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use clap::Parser;

pub mod cli;
pub mod commands;
pub mod error;
pub mod state;

use cli::{
    AppointmentCommand, ArchiveCommand, BillCommand, Cli, Command, DoctorCommand, InventoryCommand,
    InvoiceCommand, PatientCommand, PrescriptionCommand, ProcedureCommand, ProductCommand,
    RecordCommand, ReminderCommand, ReportCommand, SaleCommand, UserCommand,
};
use commands::appointment::ScheduleForm;
use commands::billing::BillForm;
use commands::inventory::ItemForm;
use commands::reminder::ReminderForm;
use commands::sales::ProductForm;
use commands::*;
use error::ApiError;
use state::{AppConfig, DbState};

use clinic_core::{ArchiveCategory, Money};

/// Default log filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "info,clinic=debug,sqlx=warn";

/// Runs the `clinic` command line.
pub async fn run() -> Result<(), ApiError> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }

    init_tracing(config.log.as_deref());
    debug!(?config, "Configuration loaded");

    let out = Output { json: cli.json };

    if let Command::Config = cli.command {
        return out.show(&config, |c| {
            format!(
                "clinic:   {}\ndatabase: {}\ncurrency: {} ({})\ntax:      {}%",
                c.clinic_name,
                c.database_path.display(),
                c.currency_code,
                c.currency_symbol,
                c.tax_rate().percentage()
            )
        });
    }

    let db = DbState::open(&config).await?;
    let result = dispatch(cli.command, &db, &config, &out).await;
    db.inner().close().await;
    result
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter. Logs go to stderr so
/// `--json` output stays clean.
fn init_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Command, db: &DbState, config: &AppConfig, out: &Output) -> Result<(), ApiError> {
    let money = |m: Money| config.format_currency(m);

    match command {
        Command::Init | Command::Config => {
            out.done(&format!("Database ready at {}", config.database_path.display()))
        }

        Command::User { action } => match action {
            UserCommand::Add { username, password, role } => {
                let user = auth::create_user(db, &username, &password, &role).await?;
                out.show(&user, |u| format!("Created {} ({})", u.username, u.role))
            }
            UserCommand::List => {
                let users = auth::list_users(db).await?;
                out.show(&users, |list| lines(list, |u| format!("{:>4}  {:<20} {}", u.id, u.username, u.role)))
            }
        },

        Command::Login { username, password } => {
            let user = auth::login(db, &username, &password).await?;
            out.show(&user, |u| format!("Welcome, {} ({})", u.username, u.role))
        }

        Command::Patient { action } => match action {
            PatientCommand::Add(args) => {
                let p = patient::register_patient(db, args.into()).await?;
                out.show(&p, |p| format!("Registered #{} {} [{}]", p.id, p.display_name(), p.age_group))
            }
            PatientCommand::List { search } => {
                let patients = patient::list_patients(db, search.as_deref()).await?;
                out.show(&patients, |list| {
                    lines(list, |p| {
                        format!(
                            "{:>4}  {:<30} {:<6} {:<6} {}",
                            p.id,
                            p.display_name(),
                            p.gender,
                            p.age_group,
                            p.contact
                        )
                    })
                })
            }
            PatientCommand::Show { id } => {
                let p = patient::get_patient(db, id).await?;
                out.show(&p, |p| {
                    format!(
                        "#{} {}\n  age {} ({}), {}\n  contact {}{}\n  registered {}",
                        p.id,
                        p.display_name(),
                        p.age.map_or_else(|| "-".to_string(), |a| a.to_string()),
                        p.age_group,
                        p.gender,
                        p.contact,
                        p.email.as_deref().map(|e| format!(", {}", e)).unwrap_or_default(),
                        p.registration_date
                    )
                })
            }
            PatientCommand::History { id } => {
                let h = patient::patient_history(db, id).await?;
                out.show(&h, |h| {
                    let mut text = format!("#{} {}\n", h.patient.id, h.patient.display_name());
                    text.push_str("Appointments\n");
                    text.push_str(&lines(&h.appointments, |v| {
                        let a = &v.appointment;
                        format!("  {} {}  {:<24} {}", a.appointment_date, a.appointment_time, v.doctor_name, a.status)
                    }));
                    text.push_str("\nPast appointments\n");
                    text.push_str(&lines(&h.past_appointments, |v| {
                        let a = &v.record;
                        format!("  {} {}  doctor #{} {}", a.appointment_date, a.appointment_time, a.doctor_id, a.status)
                    }));
                    text.push_str("\nPrescriptions\n");
                    text.push_str(&lines(&h.prescriptions, |v| {
                        let p = &v.prescription;
                        format!("  #{} issued {} expires {}  {}", p.id, p.issued_date, p.expiry_date, v.doctor_name)
                    }));
                    text.push_str("\nMedical records\n");
                    text.push_str(&lines(&h.records, |v| {
                        let r = &v.record;
                        format!("  {} {} ({})  {}", r.recorded_date, r.diagnosis, r.severity, v.doctor_name)
                    }));
                    text.push_str("\nBills\n");
                    text.push_str(&lines(&h.bills, |b| {
                        format!("  #{} {:>12} {} {}", b.id, money(b.amount()), b.service, b.status)
                    }));
                    text.push_str("\nInvoices\n");
                    text.push_str(&lines(&h.invoices, |v| {
                        let i = &v.invoice;
                        format!("  {} {} {:>12} {}", i.invoice_number, i.invoice_date, money(i.grand_total()), i.status)
                    }));
                    text
                })
            }
            PatientCommand::Update { id, details } => {
                let p = patient::update_patient(db, id, details.into()).await?;
                out.show(&p, |p| format!("Updated #{} {}", p.id, p.display_name()))
            }
            PatientCommand::Archive { id } => {
                patient::archive_patient(db, id).await?;
                out.done(&format!("Patient #{} archived", id))
            }
            PatientCommand::Restore { id } => {
                let entry = archive::restore(db, ArchiveCategory::Patient, id).await?;
                out.show(&entry, |e| format!("Restored #{} {}", e.id, e.label))
            }
        },

        Command::Doctor { action } => match action {
            DoctorCommand::Add(args) => {
                let d = doctor::add_doctor(db, args.into()).await?;
                out.show(&d, |d| format!("Added #{} {}", d.id, d.name))
            }
            DoctorCommand::List => {
                let doctors = doctor::list_doctors(db).await?;
                out.show(&doctors, |list| {
                    lines(list, |d| format!("{:>4}  {:<30} {:<20} {}", d.id, d.name, d.specialization, d.license_number))
                })
            }
            DoctorCommand::Update { id, details } => {
                let d = doctor::update_doctor(db, id, details.into()).await?;
                out.show(&d, |d| format!("Updated #{} {}", d.id, d.name))
            }
            DoctorCommand::Archive { id } => {
                doctor::archive_doctor(db, id).await?;
                out.done(&format!("Doctor #{} archived", id))
            }
        },

        Command::Appointment { action } => match action {
            AppointmentCommand::Schedule { patient, doctor, date, time } => {
                let form = ScheduleForm {
                    patient_id: patient,
                    doctor_id: doctor,
                    date,
                    time,
                };
                let a = appointment::schedule_appointment(db, form).await?;
                out.show(&a, |a| {
                    format!(
                        "Booked #{} on {} at {}",
                        a.id,
                        a.appointment_date,
                        a.appointment_time.format("%H:%M")
                    )
                })
            }
            AppointmentCommand::List { on } => {
                let appts = appointment::list_appointments(db, on.as_deref()).await?;
                out.show(&appts, |list| {
                    lines(list, |v| {
                        format!(
                            "{:>4}  {} {}  {:<28} {:<24} {}",
                            v.appointment.id,
                            v.appointment.appointment_date,
                            v.appointment.appointment_time.format("%H:%M"),
                            v.patient_name,
                            v.doctor_name,
                            v.appointment.status
                        )
                    })
                })
            }
            AppointmentCommand::Done { id } => {
                appointment::mark_done(db, id).await?;
                out.done(&format!("Appointment #{} done and archived", id))
            }
        },

        Command::Archive { action } => match action {
            ArchiveCommand::List { kind } => {
                let entries = archive::list_archived(db, kind.into()).await?;
                out.show(&entries, |list| {
                    lines(list, |e| {
                        let when = e
                            .deleted_on
                            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                            .unwrap_or_default();
                        format!("{:>4}  {:<40} archived {}", e.id, e.label, when)
                    })
                })
            }
            ArchiveCommand::Restore { kind, id } => {
                let entry = archive::restore(db, kind.into(), id).await?;
                out.show(&entry, |e| format!("Restored {} #{} {}", e.category, e.id, e.label))
            }
        },

        Command::Bill { action } => match action {
            BillCommand::Add { patient, amount, service, method, status } => {
                let form = BillForm {
                    patient_id: patient,
                    amount,
                    service,
                    payment_method: method,
                    status,
                };
                let b = billing::add_bill(db, form).await?;
                out.show(&b, |b| format!("Bill #{} {} ({}, {})", b.id, money(b.amount()), b.service, b.status))
            }
            BillCommand::List { patient } => {
                let bills = billing::list_bills(db, patient).await?;
                out.show(&bills, |list| {
                    lines(list, |v| {
                        format!(
                            "{:>4}  {}  {:<28} {:>14}  {:<8} {}",
                            v.bill.id,
                            v.bill.billing_date.format("%Y-%m-%d"),
                            v.patient_name,
                            money(v.bill.amount()),
                            v.bill.payment_method,
                            v.bill.status
                        )
                    })
                })
            }
            BillCommand::Pay { id } => {
                let b = billing::pay_bill(db, id).await?;
                out.show(&b, |b| format!("Bill #{} paid", b.id))
            }
            BillCommand::Outstanding => {
                let o = billing::outstanding(db, config).await?;
                out.show(&o, |o| format!("Outstanding: {}", o.pending))
            }
        },

        Command::Inventory { action } => match action {
            InventoryCommand::Add { name, category, quantity, unit_price, supplier } => {
                let form = ItemForm {
                    item_name: name,
                    category,
                    quantity,
                    unit_price,
                    supplier,
                };
                let i = inventory::add_item(db, form).await?;
                out.show(&i, |i| format!("Added #{} {} x{}", i.id, i.item_name, i.quantity))
            }
            InventoryCommand::List => {
                let items = inventory::list_items(db).await?;
                out.show(&items, |list| {
                    lines(list, |i| {
                        format!(
                            "{:>4}  {:<30} {:<14} {:>6}  {:>12}",
                            i.id,
                            i.item_name,
                            i.category,
                            i.quantity,
                            money(i.unit_price())
                        )
                    })
                })
            }
            InventoryCommand::Adjust { id, delta } => {
                let i = inventory::adjust_stock(db, id, delta).await?;
                out.show(&i, |i| format!("{} now {}", i.item_name, i.quantity))
            }
            InventoryCommand::Archive { id } => {
                inventory::archive_item(db, id).await?;
                out.done(&format!("Inventory item #{} archived", id))
            }
        },

        Command::Product { action } => match action {
            ProductCommand::Add { name, category, price, quantity, description } => {
                let form = ProductForm {
                    name,
                    category,
                    description,
                    price,
                    quantity,
                };
                let p = sales::add_product(db, form).await?;
                out.show(&p, |p| format!("Added #{} {} at {}", p.id, p.name, money(p.price())))
            }
            ProductCommand::List { category } => {
                let products = sales::list_products(db, category.as_deref()).await?;
                out.show(&products, |list| {
                    lines(list, |p| {
                        format!(
                            "{:>4}  {:<18} {:<32} {:>12}  stock {}",
                            p.id,
                            p.category,
                            p.name,
                            money(p.price()),
                            p.quantity
                        )
                    })
                })
            }
        },

        Command::Sale { action } => match action {
            SaleCommand::Create { customer, items } => {
                let s = sales::create_sale(db, &customer, &items).await?;
                out.show(&s, |s| format!("Sale #{} for {}: {}", s.id, s.customer_name, money(s.total())))
            }
            SaleCommand::List => {
                let all = sales::list_sales(db).await?;
                out.show(&all, |list| {
                    lines(list, |s| {
                        format!(
                            "{:>4}  {}  {:<28} {:>14}",
                            s.id,
                            s.sale_date.format("%Y-%m-%d %H:%M"),
                            s.customer_name,
                            money(s.total())
                        )
                    })
                })
            }
            SaleCommand::Show { id } => {
                let r = sales::sale_receipt(db, id).await?;
                out.show(&r, |r| {
                    let mut text = format!("Sale #{} for {}\n", r.sale.id, r.sale.customer_name);
                    for d in &r.items {
                        text.push_str(&format!(
                            "  {:<32} {:>3} x {:>12} = {:>12}\n",
                            d.product_name,
                            d.item.quantity,
                            money(Money::from_cents(d.item.unit_price_cents)),
                            money(d.line_total())
                        ));
                    }
                    text.push_str(&format!("  Total {}", money(r.sale.total())));
                    text
                })
            }
        },

        Command::Procedure { action } => match action {
            ProcedureCommand::Add { name, cost, description } => {
                let p = clinical::add_procedure(db, &name, description, &cost).await?;
                out.show(&p, |p| format!("Added #{} {} at {}", p.id, p.name, money(p.cost())))
            }
            ProcedureCommand::List => {
                let all = clinical::list_procedures(db).await?;
                out.show(&all, |list| {
                    lines(list, |p| format!("{:>4}  {:<32} {:>12}", p.id, p.name, money(p.cost())))
                })
            }
        },

        Command::Prescription { action } => match action {
            PrescriptionCommand::Add(args) => {
                let rx = clinical::add_prescription(db, args.into()).await?;
                out.show(&rx, |rx| format!("Prescription #{} valid until {}", rx.id, rx.expiry_date))
            }
            PrescriptionCommand::List { patient: Some(patient_id) } => {
                let history = clinical::patient_prescriptions(db, patient_id).await?;
                out.show(&history, |h| {
                    let current = h
                        .current
                        .as_ref()
                        .map_or_else(|| "none".to_string(), |c| format!("#{} until {}", c.id, c.expiry_date));
                    format!(
                        "Current: {}\n{}",
                        current,
                        lines(&h.history, |v| format!(
                            "{:>4}  issued {}  {}",
                            v.prescription.id, v.prescription.issued_date, v.doctor_name
                        ))
                    )
                })
            }
            PrescriptionCommand::List { patient: None } => {
                let all = clinical::list_prescriptions(db).await?;
                out.show(&all, |list| {
                    lines(list, |v| {
                        format!(
                            "{:>4}  {:<28} {:<24} expires {}",
                            v.prescription.id, v.patient_name, v.doctor_name, v.prescription.expiry_date
                        )
                    })
                })
            }
            PrescriptionCommand::Expiring => {
                let soon = clinical::expiring_prescriptions(db).await?;
                out.show(&soon, |list| {
                    lines(list, |v| {
                        format!(
                            "{:>4}  {:<28} {:<16} expires {}",
                            v.prescription.id, v.patient_name, v.contact, v.prescription.expiry_date
                        )
                    })
                })
            }
            PrescriptionCommand::Delete { id } => {
                clinical::delete_prescription(db, id).await?;
                out.done(&format!("Prescription #{} deleted", id))
            }
        },

        Command::Record { action } => match action {
            RecordCommand::Add(args) => {
                let r = clinical::add_record(db, args.into()).await?;
                out.show(&r, |r| format!("Record #{} follow-up due {}", r.id, r.followup_due()))
            }
            RecordCommand::List { patient } => {
                let records = clinical::list_records(db, patient).await?;
                out.show(&records, |list| {
                    lines(list, |v| {
                        format!(
                            "{:>4}  {}  {:<28} {:<10} {}",
                            v.record.id, v.record.recorded_date, v.patient_name, v.record.severity, v.record.diagnosis
                        )
                    })
                })
            }
        },

        Command::Followups => {
            let due = clinical::due_followups(db).await?;
            out.show(&due, |list| {
                lines(list, |f| {
                    format!(
                        "{:>4}  {:<28} {:<16} due {}  {}",
                        f.record.id,
                        f.patient_name,
                        f.contact,
                        f.record.followup_due(),
                        f.record.diagnosis
                    )
                })
            })
        }

        Command::Reminder { action } => match action {
            ReminderCommand::Add { appointment, date, time, method } => {
                let form = ReminderForm {
                    appointment_id: appointment,
                    date,
                    time,
                    method,
                };
                let r = reminder::create_reminder(db, form).await?;
                out.show(&r, |r| format!("Reminder #{} by {} on {}", r.id, r.contact_method, r.reminder_date))
            }
            ReminderCommand::Pending => {
                let pending = reminder::pending_reminders(db).await?;
                out.show(&pending, |list| {
                    lines(list, |p| {
                        format!(
                            "{:>4}  {:<28} {:<16} {:<5} visit {} {}",
                            p.reminder.id,
                            p.patient_name,
                            p.contact,
                            p.reminder.contact_method,
                            p.appointment_date,
                            p.appointment_time.format("%H:%M")
                        )
                    })
                })
            }
            ReminderCommand::Sent { id } => {
                let r = reminder::mark_sent(db, id).await?;
                out.show(&r, |r| format!("Reminder #{} sent", r.id))
            }
        },

        Command::Invoice { action } => match action {
            InvoiceCommand::Create { sale, patient, by } => {
                let inv = invoice::create_invoice(db, config, sale, patient, &by).await?;
                out.show(&inv, |i| {
                    format!(
                        "{}  total {}  tax {}  grand total {}",
                        i.invoice_number,
                        money(i.total()),
                        money(i.tax()),
                        money(i.grand_total())
                    )
                })
            }
            InvoiceCommand::Show { id } => {
                let d = invoice::invoice_details(db, config, id).await?;
                out.show(&d, |d| {
                    let inv = &d.invoice.invoice;
                    let mut text = format!(
                        "{}\n{}  {}\nBill to: {}\n",
                        d.clinic_name,
                        inv.invoice_number,
                        inv.invoice_date,
                        d.invoice.patient_name.as_deref().unwrap_or(&d.invoice.customer_name)
                    );
                    for item in &d.items {
                        text.push_str(&format!(
                            "  {:<32} {:>3}  {:>12}\n",
                            item.product_name,
                            item.item.quantity,
                            money(item.line_total())
                        ));
                    }
                    text.push_str(&format!(
                        "  Subtotal {}\n  Tax      {}\n  Due      {} ({})",
                        money(inv.total()),
                        money(inv.tax()),
                        d.amount_due,
                        inv.status
                    ));
                    text
                })
            }
            InvoiceCommand::List { patient } => {
                let all = invoice::list_invoices(db, patient).await?;
                out.show(&all, |list| {
                    lines(list, |v| {
                        format!(
                            "{:>4}  {:<20} {:<28} {:>14}  {}",
                            v.invoice.id,
                            v.invoice.invoice_number,
                            v.patient_name.as_deref().unwrap_or(&v.customer_name),
                            money(v.invoice.grand_total()),
                            v.invoice.status
                        )
                    })
                })
            }
            InvoiceCommand::Pay { id } => {
                let inv = invoice::pay_invoice(db, id).await?;
                out.show(&inv, |i| format!("{} paid", i.invoice_number))
            }
        },

        Command::Dashboard => {
            let d = report::dashboard(db, config).await?;
            out.show(&d, |d| {
                format!(
                    "{}\n  Patients today      {}\n  Total patients      {}\n  Doctors             {}\n  \
                     Scheduled visits    {}\n  Sales               {}\n  Inventory items     {}\n  \
                     Pending reminders   {}\n  Outstanding bills   {}\n  Unpaid invoices     {}",
                    d.clinic_name,
                    d.stats.patients_today,
                    d.stats.total_patients,
                    d.stats.total_doctors,
                    d.stats.scheduled_appointments,
                    d.stats.total_sales,
                    d.stats.inventory_items,
                    d.stats.pending_reminders,
                    d.outstanding_bills,
                    d.unpaid_invoices
                )
            })
        }

        Command::Report { action } => match action {
            ReportCommand::Sales => {
                let rows = sales::sales_report(db).await?;
                out.show(&rows, |list| {
                    lines(list, |r| {
                        format!(
                            "{:<20} {:>4} products  {:>6} in stock  avg {}",
                            r.category,
                            r.product_count,
                            r.total_quantity,
                            money(Money::from_cents(r.average_price_cents))
                        )
                    })
                })
            }
            ReportCommand::Demographics => {
                let demo = report::demographics(db).await?;
                out.show(&demo, |d| {
                    let genders: Vec<String> = d.by_gender.iter().map(|g| format!("{} {}", g.gender, g.count)).collect();
                    format!(
                        "Patients {}  (Kids {}, Adults {})\n{}",
                        d.total,
                        d.kids,
                        d.adults,
                        genders.join(", ")
                    )
                })
            }
        },
    }
}

/// Prints command results as text or pretty JSON.
struct Output {
    json: bool,
}

impl Output {
    fn show<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<(), ApiError> {
        if self.json {
            let rendered = serde_json::to_string_pretty(value)
                .map_err(|e| ApiError::internal(format!("Could not render JSON: {}", e)))?;
            println!("{}", rendered);
        } else {
            println!("{}", text(value));
        }
        Ok(())
    }

    fn done(&self, message: &str) -> Result<(), ApiError> {
        self.show(&serde_json::json!({ "ok": true, "message": message }), |_| message.to_string())
    }
}

/// One line per row, or "(none)".
fn lines<T>(rows: &[T], line: impl Fn(&T) -> String) -> String {
    if rows.is_empty() {
        return "(none)".to_string();
    }
    rows.iter().map(line).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines() {
        assert_eq!(lines::<i64>(&[], |n| n.to_string()), "(none)");
        assert_eq!(lines(&[1, 2], |n| format!("#{}", n)), "#1\n#2");
    }
}
