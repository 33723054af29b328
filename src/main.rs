// Tint Shop CLI - records, search and reports from the terminal

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tint_shop::formulation::ScaledFormulation;
use tint_shop::report::ReportSummary;
use tint_shop::{
    import_catalog, load_catalog_csv, load_report, scale_formulation, search_by_color, search_by_customer,
    share_purchase, PersistenceGateway, ShopConfig, SqliteGateway,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Paint-tinting shop records", long_about = None)]
struct Cli {
    /// SQLite database file (overrides TINT_SHOP_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (overrides TINT_SHOP_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database and schema
    Init,
    /// Import paints and formulations from a catalog CSV
    Import {
        /// color_name,product_type,base_size,base_unit,description,component_name,quantity,unit
        csv: PathBuf,
    },
    /// Shop summary: totals, top colors, top customers, trend
    Report,
    /// List customers
    Customers,
    /// List paints
    Paints,
    /// List purchases, newest first
    Purchases,
    /// First customer whose name contains QUERY, with scaled purchase history
    SearchCustomer { query: String },
    /// First paint whose color contains QUERY, with its formulation and buyers
    SearchColor { query: String },
    /// Scale a paint's formulation to SIZE
    Scale { paint_id: i64, size: f64 },
    /// Print the share text for a purchase
    Share { purchase_id: i64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ShopConfig::from_env();
    if let Some(db) = &cli.db {
        config = config.with_db_path(db.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }

    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_max_level(config.level())
        .with_writer(std::io::stderr)
        .init();

    let gateway = SqliteGateway::open(&config.db_path)
        .with_context(|| format!("Failed to open database {}", config.db_path.display()))?;

    match cli.command {
        Commands::Init => {
            println!("✓ Database ready at {}", config.db_path.display());
        }
        Commands::Import { csv } => run_import(&gateway, &csv)?,
        Commands::Report => run_report(&gateway, &config, cli.json)?,
        Commands::Customers => {
            let customers = gateway.list_customers().context("Failed to list customers")?;
            if cli.json {
                return print_json(&customers);
            }
            println!("👥 Customers ({})", customers.len());
            for c in &customers {
                println!(
                    "  #{:<4} {:<30} {:<10} {}",
                    c.id,
                    c.name,
                    c.customer_type.as_str(),
                    c.phone.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Paints => {
            let paints = gateway.list_paints().context("Failed to list paints")?;
            if cli.json {
                return print_json(&paints);
            }
            println!("🎨 Paints ({})", paints.len());
            for p in &paints {
                println!(
                    "  #{:<4} {:<30} {:<12} base {} {}",
                    p.id, p.color_name, p.product_type, p.base_size, p.base_unit
                );
            }
        }
        Commands::Purchases => {
            let purchases = gateway
                .list_purchases_with_details()
                .context("Failed to list purchases")?;
            if cli.json {
                return print_json(&purchases);
            }
            println!("🧾 Purchases ({})", purchases.len());
            for p in &purchases {
                println!(
                    "  #{:<4} {}  {:<24} {:<24} {} {}",
                    p.purchase.id,
                    p.purchase.purchase_date,
                    p.customer_name,
                    p.color_name,
                    p.purchase.size,
                    p.purchase.unit
                );
            }
        }
        Commands::SearchCustomer { query } => {
            let result = search_by_customer(&gateway, &query).context("Customer search failed")?;
            if cli.json {
                return print_json(&result);
            }
            let Some(customer) = &result.customer else {
                println!("No customer matches \"{}\"", query);
                return Ok(());
            };
            println!("👤 {} ({})", customer.name, customer.customer_type.as_str());
            if result.purchases.is_empty() {
                println!("  No purchases yet");
            }
            for p in &result.purchases {
                println!(
                    "\n  {}  {} {} - {} {}",
                    p.purchase.purchase_date, p.color_name, p.product_type, p.purchase.size, p.purchase.unit
                );
                print_formulation(&p.formulation, &p.purchase.unit);
            }
        }
        Commands::SearchColor { query } => {
            let result = search_by_color(&gateway, &query).context("Color search failed")?;
            if cli.json {
                return print_json(&result);
            }
            let Some(paint) = &result.paint else {
                println!("No color matches \"{}\"", query);
                return Ok(());
            };
            println!("🎨 {} - {} (per {} {})", paint.color_name, paint.product_type, paint.base_size, paint.base_unit);
            for c in &result.base_formulation {
                println!("    • {}: {:.3} {}", c.component_name, c.quantity, c.unit);
            }
            println!("    Total: {:.3} {}", result.base_total(), paint.base_unit);
            println!("\n  Bought by:");
            for buyer in &result.customers {
                println!(
                    "    {}  {:<30} {} {}",
                    buyer.purchase_date, buyer.customer_name, buyer.size, buyer.unit
                );
            }
        }
        Commands::Scale { paint_id, size } => {
            let paint = gateway
                .get_paint(paint_id)
                .context("Failed to load paint")?
                .with_context(|| format!("Paint #{} not found", paint_id))?;
            let scaled = scale_formulation(&paint.formulations, size, Some(paint.paint.base_size))
                .context("Failed to scale formulation")?;
            if cli.json {
                return print_json(&scaled);
            }
            println!(
                "🎨 {} - {} scaled to {} {} (x{:.3})",
                paint.paint.color_name, paint.paint.product_type, size, paint.paint.base_unit, scaled.factor
            );
            print_formulation(&scaled, &paint.paint.base_unit);
        }
        Commands::Share { purchase_id } => {
            let message = share_purchase(&gateway, purchase_id).context("Failed to build share text")?;
            println!("{}", message);
        }
    }

    Ok(())
}

fn run_import(gateway: &SqliteGateway, csv: &Path) -> Result<()> {
    println!("📂 Loading catalog {}...", csv.display());
    let drafts = load_catalog_csv(csv)?;
    println!("✓ Read {} paints", drafts.len());

    let summary = import_catalog(gateway, &drafts)?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✅ Created: {}", summary.created.len());
    if !summary.skipped.is_empty() {
        println!("⚠️  Skipped: {}", summary.skipped.len());
        for skipped in &summary.skipped {
            println!("   {} ({}): {}", skipped.color_name, skipped.product_type, skipped.reason);
        }
    }
    Ok(())
}

fn run_report(gateway: &SqliteGateway, config: &ShopConfig, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let outcome = load_report(gateway, today, &config.report);

    if json {
        return print_json(&outcome);
    }

    if let Some(warning) = &outcome.warning {
        eprintln!("⚠️  {}", warning);
    }
    print_summary(&outcome.summary);
    Ok(())
}

fn print_summary(summary: &ReportSummary) {
    println!("📊 Shop Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Customers: {}", summary.total_customers);
    println!("Paints:    {}", summary.total_paints);
    println!("Purchases: {}", summary.total_purchases);

    println!("\n🏆 Popular colors");
    for color in &summary.popular_colors {
        println!(
            "  {:<30} {:<12} {:>3} sold  {:>8.2} total  {:>6.2} avg",
            color.color_name,
            color.product_type,
            color.purchase_count,
            color.total_volume,
            ReportSummary::average_volume(color)
        );
    }

    println!("\n⭐ Active customers");
    for customer in &summary.active_customers {
        println!(
            "  {:<30} {:<10} {:>3} purchases  last {}",
            customer.name,
            customer.customer_type.as_str(),
            customer.purchase_count,
            customer.last_purchase
        );
    }

    println!("\n🕒 Recent activity");
    for recent in &summary.recent_purchases {
        println!(
            "  {}  {:<24} {:<24} {} {}",
            recent.purchase_date, recent.customer_name, recent.color_name, recent.size, recent.unit
        );
    }

    println!("\n📈 Monthly trend");
    for bucket in &summary.monthly_trend {
        println!("  {}  {}", bucket.month.format("%Y-%m"), bucket.purchase_count);
    }
}

fn print_formulation(formulation: &ScaledFormulation, unit: &str) {
    if formulation.is_empty() {
        println!("    (no formulation recorded)");
        return;
    }
    for c in &formulation.components {
        println!("    • {}: {:.3} {}", c.component_name, c.quantity, c.unit);
    }
    println!("    Total: {:.3} {}", formulation.total, unit);
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
