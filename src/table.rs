use console::style;
use once_cell::sync::Lazy;

use crate::gitlab::merge_request::State;
use crate::report::{Report, ReportGroup};

pub static TABLE_FORMAT: Lazy<prettytable::format::TableFormat> = Lazy::new(|| {
    use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};

    FormatBuilder::new()
        .column_separator(' ')
        .separator(LinePosition::Top, LineSeparator::new('─', ' ', ' ', ' '))
        .separator(LinePosition::Title, LineSeparator::new('─', ' ', ' ', ' '))
        .separator(LinePosition::Intern, LineSeparator::new('┈', ' ', ' ', ' '))
        .separator(LinePosition::Bottom, LineSeparator::new('─', ' ', ' ', ' '))
        .padding(1, 1)
        .build()
});

pub struct Table {}

impl Table {
    pub fn new(titles: prettytable::Row) -> prettytable::Table {
        let mut table = prettytable::Table::new();
        table.set_format(*TABLE_FORMAT);
        table.set_titles(titles);

        table
    }
}

/// One table per project group, each headed by the project and its count.
pub fn render(report: &Report) -> String {
    let mut out = String::new();

    if report.is_empty() {
        out.push_str(&format!("{}\n", style(report.empty_message()).dim()));
        return out;
    }

    for group in &report.groups {
        out.push_str(&format!(
            "{} {}\n",
            style(&group.project.name).bold(),
            style(format!("({})", group.rows.len())).dim(),
        ));
        out.push_str(&group_table(group, report.state).to_string());
        out.push('\n');
    }

    out
}

fn group_table(group: &ReportGroup, state: State) -> prettytable::Table {
    let mut table = match state {
        State::Merged => Table::new(row!["", "title", "created", "merged", "days open", "url"]),
        _ => Table::new(row!["", "title", "created", "days open", "url"]),
    };

    for mr in &group.rows {
        let iid = format!("!{}", mr.iid);
        let url = style(mr.web_url.as_str()).blue().underlined();

        match state {
            State::Merged => table.add_row(row![
                iid,
                mr.title,
                mr.created,
                mr.merged.as_deref().unwrap_or("-"),
                r->mr.days_open,
                url
            ]),
            _ => table.add_row(row![iid, mr.title, mr.created, r->mr.days_open, url]),
        };
    }

    table
}
