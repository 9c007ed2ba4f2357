use std::fmt::Write as _;

use crate::domain::email::ProcessedRecord;

pub fn render_summary(records: &[ProcessedRecord]) -> String {
    let mut out = String::from("--- Triage Run Completed ---\n");
    if records.is_empty() {
        out.push_str("No emails were processed.\n");
        return out;
    }

    out.push_str("Summary of all processed emails:\n");
    for r in records {
        let items = if r.action_items.is_empty() {
            "None".to_string()
        } else {
            r.action_items.join(", ")
        };
        let _ = write!(
            out,
            "\nSubject: {}\nCategory: {}\nAction Items: {}\n",
            r.subject, r.category, items
        );
    }
    out
}
