use chrono::{DateTime, Utc};
use ctc_assistant::guide::{Checklist, StatusTag};
use ctc_assistant::{ChatReply, EngineTag, VinScan};
use ctc_history::HistoryItem;

pub fn format_timestamp(ms: u64) -> String {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

pub fn history_table(items: &[HistoryItem], total: usize) -> String {
    if items.is_empty() {
        return if total == 0 {
            "No lookups recorded yet.".to_string()
        } else {
            format!("No lookups match ({total} recorded).")
        };
    }
    let width = items
        .iter()
        .map(|item| item.value.chars().count())
        .max()
        .unwrap_or(0)
        .max("VALUE".len());
    let mut out = format!("{:<width$}  {:<6}  {:<20}  LINK\n", "VALUE", "TYPE", "RECORDED");
    for item in items {
        out.push_str(&format!(
            "{:<width$}  {:<6}  {:<20}  {}\n",
            item.value,
            item.kind.as_str(),
            format_timestamp(item.created_at),
            item.lookup_url()
        ));
    }
    if items.len() != total {
        out.push_str(&format!("({} of {total} shown)\n", items.len()));
    }
    out.trim_end().to_string()
}

pub fn chat_reply(reply: &ChatReply) -> String {
    let mut out = reply.text.clone();
    if !reply.grounding.is_empty() {
        out.push_str("\n\nSources:");
        for link in &reply.grounding {
            out.push_str(&format!("\n- {} <{}>", link.title, link.uri));
        }
    }
    out
}

pub fn vin_scan(scan: &VinScan) -> String {
    if scan.is_detected() {
        format!("VIN: {}\nVehicle: {}", scan.vin, scan.description)
    } else {
        format!("No VIN detected. Vehicle: {}", scan.description)
    }
}

pub fn engine_tag(tag: &EngineTag) -> String {
    format!(
        "Engine family: {}\nModel year: {}",
        tag.family_name, tag.model_year
    )
}

pub fn checklist(list: &Checklist) -> String {
    let mut out = format!("{} pre-test checklist", list.label);
    for step in list.items {
        out.push_str(&format!("\n  [ ] {step}"));
    }
    out
}

pub fn status_tags(tags: &[StatusTag]) -> String {
    let width = tags.iter().map(|tag| tag.as_str().len()).max().unwrap_or(0);
    tags.iter()
        .map(|tag| format!("{:<width$}  {}", tag.as_str(), tag.meaning()))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctc_history::LookupKind;
    use pretty_assertions::assert_eq;

    fn item(value: &str, at: u64) -> HistoryItem {
        HistoryItem {
            id: at.to_string(),
            value: value.to_string(),
            kind: LookupKind::Vin,
            created_at: at,
        }
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00 UTC");
        assert_eq!(format_timestamp(1_700_000_000_000), "2023-11-14 22:13 UTC");
    }

    #[test]
    fn table_reports_filtered_count() {
        let out = history_table(&[item("AAA", 0)], 3);
        assert!(out.starts_with("VALUE"));
        assert!(out.contains("?vin=AAA"));
        assert!(out.ends_with("(1 of 3 shown)"));
    }

    #[test]
    fn checklist_lists_every_step() {
        let out = checklist(ctc_assistant::guide::checklist(
            ctc_assistant::guide::TestKind::Obd,
        ));
        assert!(out.starts_with("OBD pre-test checklist"));
        assert_eq!(out.matches("[ ]").count(), 4);
    }

    #[test]
    fn status_tags_are_aligned() {
        let out = status_tags(&[StatusTag::Advisory, StatusTag::NonCompliance]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ADVISORY        Less than 60 days"));
        assert!(lines[1].starts_with("NON-COMPLIANCE  Missing Fee"));
    }

    #[test]
    fn empty_tables() {
        assert_eq!(history_table(&[], 0), "No lookups recorded yet.");
        assert_eq!(history_table(&[], 2), "No lookups match (2 recorded).");
    }
}
