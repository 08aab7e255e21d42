//! # Seed Data Generator
//!
//! Populates an empty database with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./storehub_dev.db
//! cargo run -p storehub-db --bin seed
//!
//! # Specify database path and admin password
//! cargo run -p storehub-db --bin seed -- --db ./data/storehub.db --password s3cret-pass
//! ```
//!
//! ## Generated Data
//! - One admin employee (`admin@storehub.local`)
//! - Suppliers with contact e-mails
//! - Products across a few categories, each with opening stock
//! - One customer with a loyalty account
//! - The `low_stock_alert` and `purchase_order_submitted` e-mail templates

use std::env;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use storehub_core::{NewCustomer, NewEmailTemplate, NewEmployee, NewProduct, NewSupplier, Role};
use storehub_db::{Database, DbConfig};

const ADMIN_EMAIL: &str = "admin@storehub.local";

/// (name, contact, email)
const SUPPLIERS: &[(&str, &str, &str)] = &[
    ("Northwind Beverages", "Ana Trujillo", "orders@northwind.example"),
    ("Contoso Snacks", "Thomas Hardy", "sales@contoso.example"),
    ("Fabrikam Dairy", "Maria Anders", "dairy@fabrikam.example"),
];

/// (category code, category, products as (name, price cents, tax bps))
const CATALOG: &[(&str, &str, &[(&str, i64, u32)])] = &[
    (
        "BEV",
        "Beverages",
        &[
            ("Cola 12oz", 199, 825),
            ("Sparkling Water 1L", 149, 825),
            ("Orange Juice 16oz", 349, 0),
            ("Cold Brew Coffee", 429, 825),
            ("Energy Drink", 299, 825),
        ],
    ),
    (
        "SNK",
        "Snacks",
        &[
            ("Potato Chips", 249, 825),
            ("Pretzels", 229, 825),
            ("Chocolate Bar", 179, 825),
            ("Trail Mix", 499, 825),
            ("Gummy Bears", 199, 825),
        ],
    ),
    (
        "DRY",
        "Dairy",
        &[
            ("Whole Milk 1gal", 429, 0),
            ("Greek Yogurt", 129, 0),
            ("Cheddar Cheese", 599, 0),
            ("Butter", 479, 0),
        ],
    ),
];

const LOW_STOCK_HTML: &str = "<p><strong>{{ name }}</strong> ({{ sku }}) is down to \
{{ quantity }} units.</p><p>Reorder level: {{ reorder_level }}</p>";
const LOW_STOCK_TEXT: &str =
    "{{ name }} ({{ sku }}) is down to {{ quantity }} units. Reorder level: {{ reorder_level }}.";

const PO_HTML: &str = "<p>Hello {{ supplier_name }},</p><p>Please find purchase order \
<strong>{{ po_number }}</strong> for a total of {{ total }}.</p><p>Expected delivery: \
{{ expected_date }}</p>";
const PO_TEXT: &str = "Hello {{ supplier_name }}, please find purchase order {{ po_number }} \
for a total of {{ total }}. Expected delivery: {{ expected_date }}.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./storehub_dev.db");
    let mut password = String::from("storehub-admin");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("StoreHub Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./storehub_dev.db)");
                println!("  -p, --password <PASS>    Admin password (default: storehub-admin)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 StoreHub Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.employees().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} employees", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Admin
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| e.to_string())?
        .to_string();
    let admin = db
        .employees()
        .create(
            &NewEmployee {
                email: ADMIN_EMAIL.to_string(),
                full_name: "Store Admin".to_string(),
                role: Role::Admin,
                password: String::new(),
                phone: None,
                hourly_rate_cents: None,
                hired_at: None,
            },
            &hash,
        )
        .await?;
    println!("✓ Admin {} created", admin.email);

    // Suppliers
    for (name, contact, email) in SUPPLIERS {
        db.suppliers()
            .create(&NewSupplier {
                name: name.to_string(),
                contact_name: Some(contact.to_string()),
                email: Some(email.to_string()),
                phone: None,
                address: None,
                notes: None,
            })
            .await?;
    }
    println!("✓ {} suppliers created", SUPPLIERS.len());

    // Products
    let mut generated = 0;
    for (code, category, products) in CATALOG {
        for (idx, (name, price_cents, tax_rate_bps)) in products.iter().enumerate() {
            let seed = generated * 7 + idx;
            let product = NewProduct {
                sku: format!("{}-{:03}", code, idx + 1),
                barcode: Some(format!("590{:010}", seed + 1)),
                name: name.to_string(),
                description: None,
                category: Some(category.to_string()),
                price_cents: *price_cents,
                // cost is 60-80% of price
                cost_cents: Some(price_cents * (60 + (seed % 20) as i64) / 100),
                tax_rate_bps: *tax_rate_bps,
                track_inventory: true,
                allow_negative_stock: false,
                initial_quantity: 10 + (seed % 40) as i64,
                reorder_level: 5,
                location: Some(format!("Aisle {}", code)),
            };

            if let Err(e) = db.products().create(&product, Some(&admin.id)).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ {} products created", generated);

    // Customer
    let customer = db
        .customers()
        .create(&NewCustomer {
            first_name: "Jamie".to_string(),
            last_name: "Rivera".to_string(),
            email: Some("jamie.rivera@example.com".to_string()),
            phone: Some("555-0100".to_string()),
            notes: None,
            marketing_opt_in: true,
        })
        .await?;
    println!("✓ Customer {} created", customer.full_name());

    // Notification templates
    let templates = [
        NewEmailTemplate {
            name: "low_stock_alert".to_string(),
            subject: "Low stock: {{ name }}".to_string(),
            html_body: LOW_STOCK_HTML.to_string(),
            text_body: Some(LOW_STOCK_TEXT.to_string()),
        },
        NewEmailTemplate {
            name: "purchase_order_submitted".to_string(),
            subject: "Purchase order {{ po_number }}".to_string(),
            html_body: PO_HTML.to_string(),
            text_body: Some(PO_TEXT.to_string()),
        },
    ];
    for template in &templates {
        db.email().create_template(template).await?;
    }
    println!("✓ {} e-mail templates created", templates.len());

    println!();
    println!("✓ Seed complete! Log in as {}", ADMIN_EMAIL);

    Ok(())
}
