use practice_core::{PieceSummary, MAX_PIECES};
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};

use crate::format::{display_date, minutes_label};

#[derive(Tabled)]
struct PieceRow {
    #[tabled(rename = "#")]
    slot: String,
    #[tabled(rename = "Piece")]
    name: String,
    #[tabled(rename = "Today")]
    today: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "ID")]
    id: String,
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Minutes")]
    minutes: u32,
}

pub fn render_pieces(summaries: &[PieceSummary]) -> String {
    let mut out = format!("Pieces ({}/{})\n", summaries.len(), MAX_PIECES);
    if summaries.is_empty() {
        out.push_str("Add pieces to start tracking your practice!\n");
    }

    let mut rows: Vec<PieceRow> = summaries
        .iter()
        .enumerate()
        .map(|(i, s)| PieceRow {
            slot: (i + 1).to_string(),
            name: s.name.clone(),
            today: minutes_label(u64::from(s.today_minutes)),
            total: minutes_label(s.total_minutes),
            id: s.id.short().to_string(),
        })
        .collect();

    // Unused capacity is shown as empty slots.
    for i in summaries.len()..MAX_PIECES {
        rows.push(PieceRow {
            slot: (i + 1).to_string(),
            name: "Empty slot".to_string(),
            today: String::new(),
            total: String::new(),
            id: String::new(),
        });
    }

    out.push_str(&styled(Table::new(rows)));
    out
}

pub fn render_history(summary: &PieceSummary) -> String {
    let mut out = format!(
        "{}: {} today, {} total\n",
        summary.name,
        minutes_label(u64::from(summary.today_minutes)),
        minutes_label(summary.total_minutes)
    );
    if summary.history.is_empty() {
        out.push_str("No practice logged yet.");
        return out;
    }

    let rows: Vec<HistoryRow> = summary
        .history
        .iter()
        .map(|entry| HistoryRow {
            date: display_date(entry.date),
            minutes: entry.minutes,
        })
        .collect();
    out.push_str(&styled(Table::new(rows)));
    out
}

fn styled(mut table: Table) -> String {
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use practice_core::{HistoryEntry, PieceId};

    fn summary(history: Vec<HistoryEntry>) -> PieceSummary {
        PieceSummary {
            id: PieceId::from("0123456789abcdef"),
            name: "Moonlight Sonata".to_string(),
            today_minutes: 12,
            total_minutes: history.iter().map(|e| u64::from(e.minutes)).sum(),
            history,
        }
    }

    #[test]
    fn test_render_pieces_shows_empty_slots() {
        let out = render_pieces(&[summary(vec![])]);
        assert!(out.starts_with("Pieces (1/10)"));
        assert!(out.contains("Moonlight Sonata"));
        assert!(out.contains("01234567"));
        assert_eq!(out.matches("Empty slot").count(), MAX_PIECES - 1);
    }

    #[test]
    fn test_render_pieces_when_empty() {
        let out = render_pieces(&[]);
        assert!(out.contains("Add pieces to start tracking"));
        assert_eq!(out.matches("Empty slot").count(), MAX_PIECES);
    }

    #[test]
    fn test_render_history() {
        let history = vec![
            HistoryEntry {
                date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
                minutes: 7,
            },
            HistoryEntry {
                date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
                minutes: 3,
            },
        ];
        let out = render_history(&summary(history));
        assert!(out.contains("10 minutes total"));
        let newer = out.find("Sun, 3/10/24").unwrap();
        let older = out.find("Thu, 2/15/24").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_render_history_without_entries() {
        let out = render_history(&summary(vec![]));
        assert!(out.contains("No practice logged yet."));
    }
}
