use crate::PricePoint;
use std::fmt::Write;

/// Enumerate a sorted schedule as (quantity, price) steps starting at 1.
///
/// No sorting happens here; pass demand high to low and supply low to high.
pub fn schedule_table(values: &[i64]) -> Vec<PricePoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint {
            quantity: i + 1,
            price,
        })
        .collect()
}

/// Render a schedule as a two-column text table
pub fn render_table(title: &str, points: &[PricePoint]) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}:", title);
    let _ = writeln!(out, "Quantity | Price");
    let _ = writeln!(out, "---------+------");
    for point in points {
        let _ = writeln!(out, "{:>8} | {:>6}", point.quantity, point.price);
    }
    out
}
