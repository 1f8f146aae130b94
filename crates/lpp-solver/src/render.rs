use std::fmt;

use tabled::builder::Builder;
use tabled::settings::{Alignment, Style};

use crate::tableau::Tableau;

/// Format a value with at most three decimals and no trailing zeros
pub fn format_value(value: f64) -> String {
    let rounded = format!("{:.3}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        s => s.to_string(),
    }
}

/// Lay out a tableau as a text grid with a basic-variable column and a header
/// row naming every column.
pub fn render_tableau(tableau: &Tableau) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["Basic".to_string(), "z".to_string()];
    header.extend(tableau.variables().iter().cloned());
    header.push("RHS".to_string());
    builder.push_record(header);

    let labels = std::iter::once("z").chain(tableau.basis().iter().map(String::as_str));
    for (i, label) in labels.enumerate() {
        let mut row = vec![label.to_string()];
        row.extend(tableau.row(i).iter().map(|&v| format_value(v)));
        builder.push_record(row);
    }

    builder
        .build()
        .with(Style::psql())
        .with(Alignment::right())
        .to_string()
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render_tableau(self))
    }
}
