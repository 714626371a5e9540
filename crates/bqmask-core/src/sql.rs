//! Rendering of masking expressions as GoogleSQL.

use bqmask_model::{FingerprintOutput, SelectExpression, TableId, TransformExpression};

/// Quotes an identifier with backticks, escaping backslashes and backticks.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for ch in name.chars() {
        if ch == '`' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('`');
    quoted
}

/// Renders the value expression of a transform applied to `column`, without alias.
pub fn render_transform(transform: TransformExpression, column: &str) -> String {
    let column = quote_identifier(column);
    match transform {
        TransformExpression::Fingerprint(output) => {
            let fingerprint = format!("FARM_FINGERPRINT(CAST({column} AS STRING))");
            match output {
                FingerprintOutput::Int64 => fingerprint,
                FingerprintOutput::Numeric => format!("CAST({fingerprint} AS NUMERIC)"),
                FingerprintOutput::Float64 => format!("CAST({fingerprint} AS FLOAT64)"),
            }
        }
        TransformExpression::Sha256Base64 => format!("TO_BASE64(SHA256({column}))"),
        TransformExpression::Sha256Bytes => format!("SHA256({column})"),
        TransformExpression::Identity => column,
    }
}

/// Renders one projection item. Masked columns keep their name via an alias.
pub fn render_select_item(expression: &SelectExpression) -> String {
    let value = render_transform(expression.transform, &expression.column);
    if expression.transform.is_masking() {
        format!("{value} AS {}", quote_identifier(&expression.column))
    } else {
        value
    }
}

/// Renders the full masking query reading from `source`.
pub fn render_query(select: &[SelectExpression], source: &TableId) -> String {
    let items: Vec<String> = select.iter().map(render_select_item).collect();
    format!(
        "SELECT {} FROM {}",
        items.join(", "),
        quote_identifier(&source.to_string())
    )
}
