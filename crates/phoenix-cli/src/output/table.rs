use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{result_of, scalar_text};

/// Render output as tables: scalar fields first, then any row arrays
/// (the event trail, per-path results) as their own tables.
pub fn print_table(value: &Value) {
    let result = result_of(value);
    match result {
        Value::Object(map) => {
            print_fields(map);
            for (key, nested) in map {
                if let Value::Array(rows) = nested {
                    if rows.iter().all(Value::is_object) && !rows.is_empty() {
                        println!("\n{}:", key);
                        print_rows(rows);
                    }
                }
            }
        }
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", scalar_text(result)),
    }

    if let Some(envelope) = value.as_object() {
        print_envelope_notes(envelope);
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut any = false;
    for (key, val) in map {
        let is_row_array = matches!(val, Value::Array(rows) if rows.iter().any(Value::is_object));
        if is_row_array {
            continue;
        }
        let text = match val {
            Value::Array(items) => items.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
            _ => scalar_text(val),
        };
        builder.push_record([key.as_str(), &text]);
        any = true;
    }
    if any {
        println!("{}", Table::from(builder));
    }
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(scalar_text).unwrap_or_default())
                .collect();
            builder.push_record(cells);
        }
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}
