use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;

use crate::models::CoinSnapshot;
use crate::services::coin_service::CoinLoad;
use crate::utils::format::{format_cache_status, format_change, format_number, format_price};
use crate::utils::Table;

/// Board columns that can be sorted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Change,
    Volume,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "change" | "24h" | "change24h" => Ok(SortColumn::Change),
            "volume" | "vol" => Ok(SortColumn::Volume),
            other => Err(format!("❌ Cannot sort by '{}'. Sortable columns: change, volume", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "↑",
            SortDirection::Descending => "↓",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoardRow {
    pub symbol: &'static str,
    pub snapshot: Result<CoinSnapshot, String>,
    pub cached_remaining: Option<Duration>,
}

impl From<CoinLoad> for BoardRow {
    fn from(load: CoinLoad) -> Self {
        Self {
            symbol: load.symbol,
            snapshot: load.snapshot,
            cached_remaining: load.cached_remaining,
        }
    }
}

/// The coin table: one row per coin, optionally sorted
#[derive(Debug, Clone, Default)]
pub struct Board {
    rows: Vec<BoardRow>,
    show_volume: bool,
    sort: Option<(SortColumn, SortDirection)>,
}

impl Board {
    pub fn new(show_volume: bool) -> Self {
        Self {
            show_volume,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[BoardRow] {
        &self.rows
    }

    pub fn show_volume(&self) -> bool {
        self.show_volume
    }

    pub fn set_show_volume(&mut self, show: bool) {
        self.show_volume = show;
    }

    /// Replace a coin's row in place, or append it
    pub fn upsert(&mut self, row: BoardRow) {
        match self.rows.iter_mut().find(|r| r.symbol == row.symbol) {
            Some(existing) => *existing = row,
            None => self.rows.push(row),
        }
        if let Some((column, direction)) = self.sort {
            self.apply_sort(column, direction);
        }
    }

    /// Sort by a column. Sorting the same column again flips the direction; a new column starts ascending.
    pub fn sort_by(&mut self, column: SortColumn) -> SortDirection {
        let direction = match self.sort {
            Some((current, SortDirection::Ascending)) if current == column => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.sort = Some((column, direction));
        self.apply_sort(column, direction);
        direction
    }

    fn apply_sort(&mut self, column: SortColumn, direction: SortDirection) {
        // Rows without a value always sink to the bottom
        self.rows.sort_by(|a, b| {
            match (sort_key(a, column), sort_key(b, column)) {
                (Some(x), Some(y)) => {
                    let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                    match direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
    }

    pub fn render(&self) -> String {
        let change_header = self.header_for("24h Change", SortColumn::Change);
        let volume_header = self.header_for("Volume", SortColumn::Volume);

        let mut headers = vec!["Coin", "Price (USD)", "Price (BTC)", change_header.as_str()];
        if self.show_volume {
            headers.push(volume_header.as_str());
        }
        headers.push("Status");

        let mut table = Table::new(headers);
        for row in &self.rows {
            table.add_row(self.render_row(row));
        }
        table.render()
    }

    fn header_for(&self, label: &str, column: SortColumn) -> String {
        match self.sort {
            Some((current, direction)) if current == column => format!("{} {}", label, direction.arrow()),
            _ => label.to_string(),
        }
    }

    fn render_row(&self, row: &BoardRow) -> Vec<String> {
        let mut cells = vec![row.symbol.to_string()];
        match &row.snapshot {
            Ok(snapshot) => {
                cells.push(format!("$ {}", format_price(snapshot.price_usd)));
                cells.push(format!("{:.8} BTC", snapshot.price_btc));
                cells.push(format_change(snapshot.change_24h_pct));
                if self.show_volume {
                    cells.push(format!("{} USD", format_number(snapshot.volume_24h_usd, 0)));
                }
                cells.push(format_cache_status(row.cached_remaining));
            }
            Err(e) => {
                cells.push("N/A".to_string());
                cells.push("N/A".to_string());
                cells.push("N/A".to_string());
                if self.show_volume {
                    cells.push("N/A".to_string());
                }
                cells.push(e.clone());
            }
        }
        cells
    }
}

fn sort_key(row: &BoardRow, column: SortColumn) -> Option<f64> {
    let snapshot = row.snapshot.as_ref().ok()?;
    let value = match column {
        SortColumn::Change => snapshot.change_24h_pct?,
        SortColumn::Volume => snapshot.volume_24h_usd,
    };
    value.is_finite().then_some(value)
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortColumn::Change => "24h change",
            SortColumn::Volume => "volume",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &'static str, change: Option<f64>, volume: f64) -> BoardRow {
        BoardRow {
            symbol,
            snapshot: Ok(CoinSnapshot {
                price_usd: 10.0,
                price_btc: 0.0002,
                change_24h_pct: change,
                volume_24h_usd: volume,
            }),
            cached_remaining: None,
        }
    }

    fn order(board: &Board) -> Vec<&'static str> {
        board.rows().iter().map(|r| r.symbol).collect()
    }

    fn board() -> Board {
        let mut board = Board::new(true);
        board.upsert(row("BTC", Some(1.5), 2_000.0));
        board.upsert(BoardRow {
            symbol: "WOW",
            snapshot: Err("Network error: timeout".into()),
            cached_remaining: None,
        });
        board.upsert(row("XMR", Some(-3.0), 9_000.0));
        board.upsert(row("LTC", None, 500.0));
        board
    }

    #[test]
    fn test_sort_toggles_direction() {
        let mut board = board();

        assert_eq!(board.sort_by(SortColumn::Change), SortDirection::Ascending);
        assert_eq!(order(&board), vec!["XMR", "BTC", "WOW", "LTC"]);

        assert_eq!(board.sort_by(SortColumn::Change), SortDirection::Descending);
        assert_eq!(order(&board), vec!["BTC", "XMR", "WOW", "LTC"]);

        assert_eq!(board.sort_by(SortColumn::Volume), SortDirection::Ascending);
        assert_eq!(order(&board), vec!["LTC", "BTC", "XMR", "WOW"]);
    }

    #[test]
    fn test_upsert_replaces_row() {
        let mut board = board();
        board.upsert(row("WOW", Some(0.0), 1.0));
        assert_eq!(board.rows().len(), 4);
        assert!(board.rows().iter().find(|r| r.symbol == "WOW").unwrap().snapshot.is_ok());
    }

    #[test]
    fn test_render_rows() {
        let mut board = board();
        let rendered = board.render();
        assert!(rendered.contains("$ 10.00"));
        assert!(rendered.contains("0.00020000 BTC"));
        assert!(rendered.contains("▼ 3.00%"));
        assert!(rendered.contains("9,000 USD"));
        assert!(rendered.contains("Network error: timeout"));

        board.set_show_volume(false);
        board.sort_by(SortColumn::Change);
        let rendered = board.render();
        assert!(!rendered.contains("9,000 USD"));
        assert!(rendered.lines().next().unwrap().contains("24h Change ↑"));
    }

    #[test]
    fn test_parse_sort_column() {
        assert_eq!("Volume".parse::<SortColumn>().unwrap(), SortColumn::Volume);
        assert_eq!("24h".parse::<SortColumn>().unwrap(), SortColumn::Change);
        assert!("price".parse::<SortColumn>().is_err());
    }
}
