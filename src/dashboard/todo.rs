use std::collections::BTreeMap;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::time::date_range;

/// Number of task slots in every section of a day.
pub const TASK_COLUMNS: u8 = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    #[serde(default)]
    pub task: String,
    #[serde(default)]
    pub checked: bool,
}

/// A task slot: section label plus a 1-based column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    section: String,
    column: u8,
}

impl Slot {
    /// Resolves user input against the configured sections. Section names match case-insensitively.
    pub fn resolve(sections: &[String], section: &str, column: u8) -> Result<Self> {
        let Some(label) = sections
            .iter()
            .find(|label| label.eq_ignore_ascii_case(section.trim()))
        else {
            bail!(
                "Unknown section {section:?}, expected one of: {}",
                sections.join(", ")
            );
        };
        if !(1..=TASK_COLUMNS).contains(&column) {
            bail!("Column must be between 1 and {TASK_COLUMNS}, got {column}");
        }
        Ok(Self {
            section: label.clone(),
            column,
        })
    }

    fn id(&self) -> String {
        format!("{}_{}", self.section, self.column)
    }
}

/// Todo items of every day, stored as `{"YYYY-MM-DD": {"<Section>_<column>": item}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoBoard(BTreeMap<NaiveDate, BTreeMap<String, TodoItem>>);

impl TodoBoard {
    pub fn item(&self, date: NaiveDate, slot: &Slot) -> TodoItem {
        self.0
            .get(&date)
            .and_then(|day| day.get(&slot.id()))
            .cloned()
            .unwrap_or_default()
    }

    fn item_mut(&mut self, date: NaiveDate, slot: &Slot) -> &mut TodoItem {
        self.0.entry(date).or_default().entry(slot.id()).or_default()
    }

    pub fn set_task(&mut self, date: NaiveDate, slot: &Slot, task: String) {
        self.item_mut(date, slot).task = task;
    }

    pub fn set_checked(&mut self, date: NaiveDate, slot: &Slot, checked: bool) {
        self.item_mut(date, slot).checked = checked;
    }
}

/// Renders every day between `start` and `end` with all sections and their task slots.
pub fn render_grid(
    board: &TodoBoard,
    sections: &[String],
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let width = sections.iter().map(|v| v.len()).max().unwrap_or(0);
    let mut out = String::new();
    for date in date_range(start, end) {
        out.push_str(&format!("{}\n", date.format("%a %Y-%m-%d")));
        for section in sections {
            let cells = (1..=TASK_COLUMNS)
                .map(|column| {
                    let slot = Slot {
                        section: section.clone(),
                        column,
                    };
                    let item = board.item(date, &slot);
                    let check = if item.checked { 'x' } else { ' ' };
                    let task = if item.task.is_empty() {
                        format!("Task {column}")
                    } else {
                        item.task
                    };
                    format!("[{check}] {task}")
                })
                .collect::<Vec<_>>();
            out.push_str(&format!("  {section:<width$}  {}\n", cells.join("  ")));
        }
        out.push('\n');
    }
    out
}
