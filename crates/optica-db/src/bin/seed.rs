//! # Seed Data Generator
//!
//! Populates a database with an optical-store demo tenant.
//!
//! ## Usage
//! ```bash
//! cargo run -p optica-db --bin seed
//!
//! # Specify database path and branch
//! cargo run -p optica-db --bin seed -- --db ./data/optica.db --branch loja-centro
//! ```
//!
//! ## Generated Data
//! - Frames, ophthalmic lenses and contact lenses (stock-controlled,
//!   except contact lenses which are ordered on demand)
//! - An eye exam and a frame adjustment (services, never move stock)
//! - Two sellers, one with a personal commission rate
//! - A store-credit customer with a R$2.000,00 limit
//! - An open cash shift for the demo branch

use chrono::Utc;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use optica_core::{Customer, Product, ProductKind, Seller, DEFAULT_TENANT_ID};
use optica_db::{Database, DbConfig, DbError};

/// (sku, name, kind, price, cost, stock, stock_controlled)
const CATALOG: &[(&str, &str, ProductKind, i64, i64, i64, bool)] = &[
    ("ARM-ACE-001", "Armação Acetato Preta", ProductKind::Product, 29_900, 11_000, 12, true),
    ("ARM-ACE-002", "Armação Acetato Tartaruga", ProductKind::Product, 32_900, 12_500, 8, true),
    ("ARM-MET-001", "Armação Metal Dourada", ProductKind::Product, 45_900, 18_000, 5, true),
    ("ARM-INF-001", "Armação Infantil Flexível", ProductKind::Product, 19_900, 7_000, 10, true),
    ("LEN-VS-AR", "Lente Visão Simples Antirreflexo", ProductKind::Product, 25_000, 8_000, 40, true),
    ("LEN-MF-AR", "Lente Multifocal Antirreflexo", ProductKind::Product, 89_000, 31_000, 16, true),
    ("LEN-FOTO", "Lente Fotossensível", ProductKind::Product, 62_000, 22_000, 10, true),
    ("LC-MENSAL", "Lente de Contato Mensal (cx 6)", ProductKind::Product, 18_900, 9_000, 0, false),
    ("LC-DIARIA", "Lente de Contato Diária (cx 30)", ProductKind::Product, 21_900, 11_000, 0, false),
    ("SOL-MULTI", "Solução Multiuso 360ml", ProductKind::Product, 3_990, 1_500, 30, true),
    ("SRV-EXAME", "Exame de Vista", ProductKind::Service, 15_000, 0, 0, false),
    ("SRV-AJUSTE", "Ajuste de Armação", ProductKind::Service, 3_000, 0, 0, false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,optica=debug,sqlx=warn")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./optica_dev.db");
    let mut branch_id = String::from("loja-centro");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--branch" | "-b" => {
                if i + 1 < args.len() {
                    branch_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Optica Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>       Database file path (default: ./optica_dev.db)");
                println!("  -b, --branch <ID>     Branch to open a shift for (default: loja-centro)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Optica Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Tenant:   {}", DEFAULT_TENANT_ID);
    println!("Branch:   {}", branch_id);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.products().count(DEFAULT_TENANT_ID).await?;
    if existing > 0 {
        println!("⚠ Tenant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for &(sku, name, kind, price_cents, cost_cents, stock_qty, stock_controlled) in CATALOG {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            kind,
            price_cents,
            cost_cents,
            stock_qty,
            stock_controlled,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;
    }
    println!("✓ {} catalog items", CATALOG.len());

    for (name, commission_bps) in [("Ana Lima", Some(700)), ("Carlos Pereira", None)] {
        let seller = Seller {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            name: name.to_string(),
            commission_bps,
            is_active: true,
            created_at: now,
        };
        db.sellers().insert(&seller).await?;
        println!("✓ Seller {} ({})", seller.name, seller.id);
    }

    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        tenant_id: DEFAULT_TENANT_ID.to_string(),
        name: "Maria Souza".to_string(),
        document: Some("123.456.789-09".to_string()),
        credit_limit_cents: Some(200_000),
        is_active: true,
        created_at: now,
    };
    db.customers().insert(&customer).await?;
    println!("✓ Customer {} ({})", customer.name, customer.id);

    match db.shifts().open(DEFAULT_TENANT_ID, &branch_id, "seed", 20_000).await {
        Ok(shift) => println!("✓ Opened shift {} on {}", shift.id, branch_id),
        Err(DbError::UniqueViolation { .. }) => println!("⚠ {} already has an open shift", branch_id),
        Err(e) => return Err(e.into()),
    }

    info!(path = %db_path, "Seed complete");
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
