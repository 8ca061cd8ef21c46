use anyhow::Result;
use markdown_builder::Markdown;
use markdown_table::{Heading, HeadingAlignment, MarkdownTable};

use super::{Report, ReportGroup};
use crate::gitlab::merge_request::State;

pub trait MarkdownReport {
    fn to_markdown(&self) -> Result<String>;
}

impl MarkdownReport for Report {
    fn to_markdown(&self) -> Result<String> {
        let mut doc = Markdown::new();

        doc.header1(format!("{} merge requests of {}", state_title(self.state), self.username));

        if self.is_empty() {
            doc.paragraph(self.empty_message());
        }

        let mut out = doc.render();
        for group in &self.groups {
            out.add_group(group, self.state)?;
        }

        Ok(out)
    }
}

trait MarkdownExt {
    fn add_block(&mut self, block: &str);
    fn add_group(&mut self, group: &ReportGroup, state: State) -> Result<()>;
}

impl MarkdownExt for String {
    /// Appends `block` separated from what precedes it by one blank line.
    fn add_block(&mut self, block: &str) {
        if !self.is_empty() && !self.ends_with("\n\n") {
            self.push_str(if self.ends_with('\n') { "\n" } else { "\n\n" });
        }
        self.push_str(block.trim_end());
        self.push('\n');
    }

    fn add_group(&mut self, group: &ReportGroup, state: State) -> Result<()> {
        let mut heading = Markdown::new();
        heading.header2(format!("{} ({})", group.project.name, group.rows.len()));
        self.add_block(&heading.render());

        let mut table = group
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.link.clone(), row.date(state).to_owned()];
                if state == State::Merged {
                    cells.push(row.days_open.to_string());
                }
                cells
            })
            .collect::<Vec<_>>();

        let columns = columns(state);
        let mut labels: Vec<String> = columns.iter().map(|(label, _)| label.to_string()).collect();
        pad_columns(&mut labels, &mut table);

        let headings = labels
            .into_iter()
            .zip(columns)
            .map(|(label, (_, alignment))| Heading::new(label, alignment))
            .collect();

        let mut md_table = MarkdownTable::new(table);
        md_table.with_headings(headings);

        let rendered = md_table
            .as_markdown()
            .map_err(|e| anyhow::anyhow!("Failed to render table for {}: {e:?}", group.project.name))?;

        // Added verbatim: a paragraph would re-wrap long rows.
        self.add_block(&rendered);

        Ok(())
    }
}

fn columns(state: State) -> Vec<(&'static str, Option<HeadingAlignment>)> {
    match state {
        State::Merged => vec![
            ("Title", None),
            ("Merged", None),
            ("Days open", Some(HeadingAlignment::Center)),
        ],
        _ => vec![("Title", None), ("Created", None)],
    }
}

/// Pads every cell of a column, label included, to the same number of
/// characters. `MarkdownTable` measures columns in bytes, so multi-byte
/// titles would leave the rows ragged.
fn pad_columns(labels: &mut [String], rows: &mut [Vec<String>]) {
    for (col, label) in labels.iter_mut().enumerate() {
        let width = rows
            .iter()
            .filter_map(|row| row.get(col))
            .chain(std::iter::once(&*label))
            .map(|cell| cell.chars().count())
            .max()
            .unwrap_or_default();

        for cell in rows
            .iter_mut()
            .filter_map(|row| row.get_mut(col))
            .chain(std::iter::once(label))
        {
            *cell = format!("{cell:<width$}");
        }
    }
}

fn state_title(state: State) -> &'static str {
    match state {
        State::Opened => "Open",
        State::Merged => "Merged",
        State::Closed => "Closed",
        State::Locked => "Locked",
    }
}

/// Escapes characters that would break a link label or a table cell.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        if matches!(c, '\\' | '|' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}
