//! Plain-text rendering of a [`CartSummary`].
//!
//! ```text
//! Subtotal                                   104.15
//!   New customer discount (5%, max 100.00)    98.94
//!   VAT (7.7%)                               106.56
//! Total                                      106.56
//!
//! Items: 2
//! Bonus points: 50
//! ```
//!
//! Step amounts are shown rounded; the total is the only rounded figure the
//! pipeline itself produces.

use std::fmt::Write;

use tally_core::CartSummary;

const LABEL_WIDTH: usize = 40;
const AMOUNT_WIDTH: usize = 12;

pub fn render(summary: &CartSummary) -> String {
    let mut out = String::new();

    // Writing to a String never fails.
    let _ = writeln!(out, "{:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}", "Subtotal", summary.subtotal);
    for step in &summary.steps {
        let label = format!("  {}", step.description);
        let _ = writeln!(out, "{:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}", label, step.amount);
    }
    let _ = writeln!(out, "{:<LABEL_WIDTH$}{:>AMOUNT_WIDTH$}", "Total", summary.total);
    let _ = writeln!(out);
    let _ = writeln!(out, "Items: {}", summary.item_count);
    let _ = writeln!(out, "Bonus points: {}", summary.bonus_points);

    out
}
