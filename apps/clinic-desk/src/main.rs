//! # Clinic Desk Entry Point
//!
//! ```bash
//! clinic init
//! clinic patient add --surname Santos --first-name Maria --age 34 --gender female --contact "0917 555 0199"
//! clinic appointment schedule --patient 1 --doctor 1 --date 2026-03-02 --time 09:00
//! clinic --json dashboard
//! ```
//!
//! The setup lives in lib.rs so it can be tested.

use std::process;

#[tokio::main]
async fn main() {
    if let Err(e) = clinic_desk::run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
