use serde_json::Value;

/// Key answer fields, in priority order.
const PRIORITY_KEYS: [&str; 7] = [
    "monthly_payment",
    "return_on_cash_invested_percent",
    "cap_rate_percent",
    "year_one_roi_percent",
    "total_annual_return",
    "total_cumulative_return",
    "net_operating_income",
];

/// Print just the key answer value from the output.
///
/// Looks for well-known result fields (descending into a nested `metrics`
/// object for full analyses), then falls back to the first field.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let search_order = [result_obj.get("metrics"), Some(result_obj)];
    for obj in search_order.into_iter().flatten() {
        if let Value::Object(map) = obj {
            for key in &PRIORITY_KEYS {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }
        }
    }

    if let Value::Object(map) = result_obj {
        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
