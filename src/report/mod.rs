// Availability report
// Turns reconciliation results into terminal tables

use std::fmt;
use std::str::FromStr;

use crate::models::{Provider, ReconciliationResult};

pub mod progress;
pub mod style;
pub mod table;

pub use table::Table;

const CHECK: &str = "✓";
const CROSS: &str = "✗";
const TITLE_COLUMN: &str = "Show Name";

/// How availability tables are laid out
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableMode {
    /// One combined table, every matched show
    #[default]
    All,
    /// One combined table, only shows available somewhere
    Streamable,
    /// One table per provider, only shows on that provider
    PerProvider,
}

impl FromStr for TableMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "streamable" => Ok(Self::Streamable),
            "per_provider" | "per-provider" => Ok(Self::PerProvider),
            other => Err(format!(
                "unknown table mode '{other}' (expected all, streamable or per_provider)"
            )),
        }
    }
}

impl fmt::Display for TableMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableMode::All => write!(f, "all"),
            TableMode::Streamable => write!(f, "streamable"),
            TableMode::PerProvider => write!(f, "per_provider"),
        }
    }
}

/// A table plus the caption printed above it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedTable {
    pub caption: String,
    pub table: Table,
}

impl fmt::Display for RenderedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.caption)?;
        write!(f, "{}", self.table)
    }
}

pub fn build(
    results: &[ReconciliationResult],
    providers: &[Provider],
    mode: TableMode,
) -> Vec<RenderedTable> {
    match mode {
        TableMode::All => vec![combined_table(results, providers, false)],
        TableMode::Streamable => vec![combined_table(results, providers, true)],
        TableMode::PerProvider => providers
            .iter()
            .map(|p| provider_table(results, p))
            .collect(),
    }
}

fn cell(available: bool) -> String {
    if available {
        style::green(CHECK)
    } else {
        style::red(CROSS)
    }
}

fn provider_table(results: &[ReconciliationResult], provider: &Provider) -> RenderedTable {
    let mut table = Table::new(vec![TITLE_COLUMN.to_string(), provider.name.clone()]);

    for result in results.iter().filter(|r| r.show.has_offer_for(provider.id)) {
        table.push(vec![
            result.show.title.clone(),
            cell(result.show.has_offer_for(provider.id)),
        ]);
    }

    RenderedTable {
        caption: format!("Table for {}:", style::bold_underline(&provider.name)),
        table,
    }
}

fn combined_table(
    results: &[ReconciliationResult],
    providers: &[Provider],
    streamable_only: bool,
) -> RenderedTable {
    let mut head = vec![TITLE_COLUMN.to_string()];
    head.extend(providers.iter().map(|p| p.name.clone()));
    let mut table = Table::new(head);

    for result in results {
        let availability: Vec<bool> = providers
            .iter()
            .map(|p| result.show.has_offer_for(p.id))
            .collect();

        if streamable_only && !availability.iter().any(|&a| a) {
            continue;
        }

        let mut row = vec![result.show.title.clone()];
        row.extend(availability.into_iter().map(cell));
        table.push(row);
    }

    let caption = if streamable_only {
        "Shows streamable on monitored providers:"
    } else {
        "Availability across monitored providers:"
    };

    RenderedTable {
        caption: style::bold_underline(caption),
        table,
    }
}
