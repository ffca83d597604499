//! # Seed Data Generator
//!
//! Populates a database with a small optical clinic for development and
//! demos.
//!
//! ## Usage
//! ```bash
//! cargo run -p clinic-db --bin seed
//!
//! # Specify database path
//! cargo run -p clinic-db --bin seed -- --db ./data/clinic.db
//! ```
//!
//! ## Generated Data
//! - An `admin` account (password `admin1234`)
//! - Doctors, patients (kids and adults) and clinic inventory
//! - Retail catalogue across optical categories
//! - Appointments for today and tomorrow, with reminders
//! - One walk-in sale with its invoice, a prescription and a medical record

use chrono::{Duration, Local, NaiveTime};
use std::env;

use clinic_core::{
    Gender, LensPower, Money, NewDoctor, NewInventoryItem, NewMedicalRecord, NewPatient,
    NewPrescription, NewReminder, NewSalesProduct, PaymentMethod, SaleLine, UserRole,
};
use clinic_db::{Database, DbConfig};

const DOCTORS: &[(&str, &str, Option<&str>, &str, &str)] = &[
    ("Reyes", "Ana", Some("B"), "PRC-0012345", "Optometry"),
    ("Cruz", "Jose", None, "PRC-0099887", "Ophthalmology"),
    ("Villanueva", "Marco", Some("D"), "PRC-0045521", "Pediatric Optometry"),
];

const PATIENTS: &[(&str, &str, Option<&str>, i64, Gender, &str)] = &[
    ("Santos", "Maria", Some("L"), 34, Gender::Female, "0917 555 0199"),
    ("Lim", "Carlo", None, 27, Gender::Male, "0917-555-0142"),
    ("Flores", "Mia", Some("C"), 9, Gender::Female, "0918 222 3344"),
    ("Ramos", "Jun", None, 58, Gender::Male, "0999 888 7777"),
    ("Tan", "Grace", Some("S"), 62, Gender::Female, "0920 111 2222"),
    ("Aquino", "Paolo", None, 15, Gender::Male, "(02) 8123 4567"),
];

/// (name, category, price in centavos, stock)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("Single Vision Lenses", "Lenses", 150_000, 40),
    ("Progressive Lenses", "Lenses", 450_000, 15),
    ("Aviator Frame", "Frames", 280_000, 8),
    ("Titanium Rim Frame", "Frames", 350_000, 5),
    ("Blue Light Glasses", "Glasses", 199_900, 12),
    ("Daily Disposable (30 pcs)", "Contact Lenses", 99_900, 30),
    ("Monthly Contacts (6 pcs)", "Contact Lenses", 180_000, 18),
    ("Lubricating Eye Drops 10ml", "Eye Care Products", 18_500, 60),
    ("Multipurpose Solution 360ml", "Cleaning Solutions", 45_000, 25),
    ("Lens Cleaning Spray", "Cleaning Solutions", 12_000, 40),
];

/// (item, category, quantity, unit price in centavos, supplier)
const INVENTORY: &[(&str, &str, i64, i64, &str)] = &[
    ("Trial Lens Set", "Equipment", 2, 2_500_000, "Visionline Supply"),
    ("Tonometer Tips", "Consumables", 200, 1_500, "MedOptic Trading"),
    ("Fluorescein Strips", "Consumables", 300, 800, "MedOptic Trading"),
    ("Occluders", "Equipment", 10, 35_000, "Visionline Supply"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./clinic_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Clinic Desk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./clinic_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Clinic Desk Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.reports().dashboard_stats().await?.total_patients;
    if existing > 0 {
        println!("⚠ Database already has {} patients", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    db.users().create_user("admin", "admin1234", UserRole::Admin).await?;
    println!("✓ Admin account: admin / admin1234");

    let mut doctor_ids = Vec::new();
    for (surname, first_name, mi, license, specialization) in DOCTORS {
        let doctor = db
            .doctors()
            .add_doctor(NewDoctor {
                surname: surname.to_string(),
                first_name: first_name.to_string(),
                middle_initial: mi.map(str::to_string),
                license_number: license.to_string(),
                specialization: specialization.to_string(),
                contact: None,
                schedule: Some("Mon-Sat 9:00-17:00".to_string()),
            })
            .await?;
        doctor_ids.push(doctor.id);
    }
    println!("✓ {} doctors", doctor_ids.len());

    let mut patient_ids = Vec::new();
    for (surname, first_name, mi, age, gender, contact) in PATIENTS {
        let patient = db
            .patients()
            .add_patient(NewPatient {
                surname: surname.to_string(),
                first_name: first_name.to_string(),
                middle_initial: mi.map(str::to_string),
                age: Some(*age),
                gender: Some(*gender),
                contact: contact.to_string(),
                address: Some("Quezon City".to_string()),
                ..Default::default()
            })
            .await?;
        patient_ids.push(patient.id);
    }
    println!("✓ {} patients", patient_ids.len());

    for (item, category, quantity, cents, supplier) in INVENTORY {
        db.inventory()
            .add_item(NewInventoryItem {
                item_name: item.to_string(),
                category: category.to_string(),
                quantity: *quantity,
                unit_price: Money::from_cents(*cents),
                supplier: Some(supplier.to_string()),
            })
            .await?;
    }
    println!("✓ {} inventory items", INVENTORY.len());

    let mut products = Vec::new();
    for (name, category, cents, quantity) in PRODUCTS {
        let product = db
            .sales()
            .add_product(NewSalesProduct {
                name: name.to_string(),
                category: category.to_string(),
                description: None,
                price: Money::from_cents(*cents),
                quantity: *quantity,
            })
            .await?;
        products.push(product);
    }
    println!("✓ {} products", products.len());

    // Appointments: today and tomorrow, on the half hour
    let today = Local::now().date_naive();
    let mut appointments = Vec::new();
    for (n, patient_id) in patient_ids.iter().enumerate() {
        let date = today + Duration::days((n % 2) as i64);
        let hour = 9 + (n / 2) as u32;
        let time = NaiveTime::from_hms_opt(hour, 30, 0).ok_or("invalid seed time")?;
        let doctor_id = doctor_ids[n % doctor_ids.len()];

        let appt = db.appointments().schedule(*patient_id, doctor_id, date, time).await?;
        db.reminders()
            .create_reminder(NewReminder {
                appointment_id: appt.id,
                patient_id: *patient_id,
                reminder_date: today,
                reminder_time: None,
                contact_method: None,
            })
            .await?;
        appointments.push(appt);
    }
    println!("✓ {} appointments with reminders", appointments.len());

    let first = &appointments[0];
    db.prescriptions()
        .create_prescription(NewPrescription {
            patient_id: first.patient_id,
            doctor_id: first.doctor_id,
            appointment_id: Some(first.id),
            right: LensPower {
                sphere: Some("-2.25".to_string()),
                cylinder: Some("-0.50".to_string()),
                axis: Some("180".to_string()),
                add: None,
            },
            left: LensPower {
                sphere: Some("-2.00".to_string()),
                ..Default::default()
            },
            notes: Some("Anti-reflective coating".to_string()),
        })
        .await?;
    db.medical_records()
        .add_record(NewMedicalRecord {
            patient_id: first.patient_id,
            doctor_id: first.doctor_id,
            appointment_id: Some(first.id),
            diagnosis: "Myopia with mild astigmatism".to_string(),
            recommendations: Some("Full-time wear".to_string()),
            ..Default::default()
        })
        .await?;
    println!("✓ Prescription and medical record");

    db.billing()
        .create_bill(first.patient_id, Money::from_cents(80_000), PaymentMethod::Cash)
        .await?;

    let lines: Vec<SaleLine> = products
        .iter()
        .filter(|p| p.category == "Frames" || p.category == "Cleaning Solutions")
        .take(2)
        .map(|p| SaleLine {
            product_id: p.id,
            quantity: 1,
            unit_price: p.price(),
        })
        .collect();
    let sale = db.sales().create_sale("Walk-in", &lines).await?;
    let invoice = db.invoices().create_invoice(sale.id, None, "admin").await?;
    println!(
        "✓ Sale #{} invoiced as {} (grand total {})",
        sale.id,
        invoice.invoice_number,
        invoice.grand_total().format_with("₱")
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
