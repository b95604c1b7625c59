//! Diagnostic tool - Check effective configuration
//!
//! Run with: cargo run --bin diagnose

use std::env;

fn main() {
    println!("🔍 EXMO SNIPER DIAGNOSTIC CHECK\n");

    // Load .env
    dotenvy::dotenv().ok();

    println!("═══════════════════════════════════════════════════");
    println!("                  CONFIGURATION                     ");
    println!("═══════════════════════════════════════════════════\n");

    let checks = [
        ("EXMO_API_URL", "https://api.exmo.com/v1", "Exchange API base URL"),
        ("HTTP_TIMEOUT_SECS", "10", "Per-request timeout"),
        ("CACHE_TTL_SECS", "86400", "Currency/pair cache lifetime"),
        ("TOP_RESULTS", "10", "Rows in the top view"),
        ("MIN_PROFIT_PCT", "(none)", "Hide loops below this profit %"),
        ("SCAN_INTERVAL_SECS", "30", "Seconds between scans in watch mode"),
        ("OUTPUT_FORMAT", "table", "table or json"),
        ("WHITELISTED_CURRENCIES", "(all)", "Only scan these currencies"),
        ("BLACKLISTED_CURRENCIES", "(none)", "Never scan these currencies"),
    ];

    for (key, default, desc) in checks {
        let value = env::var(key).unwrap_or_else(|_| default.to_string());
        let marker = if env::var(key).is_err() { "(default)" } else { "(from .env)" };
        println!("  {}: {} {}", key, value, marker);
        println!("    └─ {}\n", desc);
    }

    let log = env::var("RUST_LOG").unwrap_or_else(|_| "exmo_sniper=info".to_string());
    println!("  RUST_LOG: {}", log);

    println!("\n═══════════════════════════════════════════════════");
    println!("                  WHAT TO EXPECT                    ");
    println!("═══════════════════════════════════════════════════\n");

    println!("  • Every loop is ranked, including ones below break-even");
    println!("  • Profit % = (best chain rate / direct price - 1) * 100");
    println!("  • Bid/ask spread alone makes most two-currency loops negative");

    if let Ok(Ok(min)) = env::var("MIN_PROFIT_PCT").map(|v| v.parse::<f64>()) {
        if min < 0.0 {
            println!("\n  ⚠️  Negative MIN_PROFIT_PCT: losing loops will be shown.");
        }
    }

    println!("\n✅ Diagnostic complete!\n");
}
