//! Vertical card display for a single listing's current state.
//!
//! Renders a one-row `properties` batch grouped into sections, skipping
//! sections with no values.

use arrow::array::*;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

// ── Section groupings ──

const LISTING: &[&str] = &["title", "reference", "category", "description"];

const PRICE_AND_SIZE: &[&str] = &[
    "price",
    "total_area",
    "useful_area",
    "bedrooms",
    "bathrooms",
    "suites",
    "garages",
    "commercial_rooms",
];

const LOCATION: &[&str] = &[
    "street_name",
    "address_number",
    "address_comp",
    "neighborhood",
    "city",
    "state",
    "latitude",
    "longitude",
    "collection_area",
];

const PUBLISHER: &[&str] = &["publisher_name", "publisher_phone", "publisher_landline"];

const FEATURES: &[&str] = &["privative_items", "source_active"];

const LIFECYCLE: &[&str] = &["active", "first_seen_at", "last_seen_at", "updated_at"];

/// Longest description shown before truncation.
const MAX_TEXT: usize = 200;

/// Print a single listing as a vertical card grouped by section.
pub fn print_property_card(batch: &RecordBatch) {
    let id = get_i64(batch, "id").map(|id| id.to_string()).unwrap_or_default();
    let title = get_utf8(batch, "title").unwrap_or_default();

    println!("=== {id} ===");
    if !title.is_empty() {
        println!("{title}");
    }
    println!();

    print_section(batch, "Listing", LISTING);
    print_section(batch, "Price & Size", PRICE_AND_SIZE);
    print_section(batch, "Location", LOCATION);
    print_section(batch, "Publisher", PUBLISHER);
    print_section(batch, "Features", FEATURES);
    print_section(batch, "Lifecycle", LIFECYCLE);
}

fn print_section(batch: &RecordBatch, header: &str, cols: &[&str]) {
    let has_data = cols.iter().any(|&col| {
        batch
            .schema()
            .index_of(col)
            .ok()
            .is_some_and(|i| !batch.column(i).is_null(0))
    });
    if !has_data {
        return;
    }

    println!("{header}");
    for &col_name in cols {
        let Some(col) = batch.column_by_name(col_name) else {
            continue;
        };
        if col.is_null(0) {
            continue;
        }
        match col.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 => {
                if let Some(text) = col_str(col.as_ref(), 0) {
                    println!("  {:<20} {}", col_name, truncate(text));
                }
            }
            DataType::Float64 => {
                if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
                    println!("  {:<20} {}", col_name, arr.value(0));
                }
            }
            DataType::Boolean => {
                if let Some(arr) = col.as_any().downcast_ref::<BooleanArray>() {
                    println!("  {:<20} {}", col_name, if arr.value(0) { "yes" } else { "no" });
                }
            }
            DataType::Timestamp(_, _) => {
                let options = arrow::util::display::FormatOptions::default();
                match arrow::util::display::ArrayFormatter::try_new(col.as_ref(), &options) {
                    Ok(fmt) => println!("  {:<20} {}", col_name, fmt.value(0)),
                    Err(_) => println!("  {:<20} (timestamp)", col_name),
                }
            }
            other => println!("  {:<20} ({other})", col_name),
        }
    }
    println!();
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_TEXT {
        let short: String = text.chars().take(MAX_TEXT - 3).collect();
        format!("{short}...")
    } else {
        text.to_string()
    }
}

// ── Helpers ──

fn get_utf8(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let col = batch.column_by_name(col_name)?;
    col_str(col.as_ref(), 0).map(str::to_string)
}

fn get_i64(batch: &RecordBatch, col_name: &str) -> Option<i64> {
    let col = batch.column_by_name(col_name)?;
    if col.is_null(0) {
        return None;
    }
    col.as_any().downcast_ref::<Int64Array>().map(|a| a.value(0))
}

/// Get a string value from a column that might be Utf8 or LargeUtf8.
fn col_str(col: &dyn Array, i: usize) -> Option<&str> {
    if col.is_null(i) {
        return None;
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        return Some(arr.value(i));
    }
    if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        return Some(arr.value(i));
    }
    None
}
