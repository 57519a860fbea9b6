use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::{
    Attribute, Cell, CellAlignment, ColumnConstraint, ContentArrangement, Table, Width,
};

use crate::config::config::DisplayConfig;
use crate::data::column::Align;
use crate::data::query_state::SortDirection;
use crate::table::render::{HeaderCell, RenderedRow, RenderedTable, TableBody};

struct Glyphs {
    asc: &'static str,
    desc: &'static str,
    sortable: &'static str,
    checked: &'static str,
    unchecked: &'static str,
    partial: &'static str,
}

const UNICODE_GLYPHS: Glyphs = Glyphs {
    asc: "▲",
    desc: "▼",
    sortable: "↕",
    checked: "☑",
    unchecked: "☐",
    partial: "◩",
};

const ASCII_GLYPHS: Glyphs = Glyphs {
    asc: "^",
    desc: "v",
    sortable: "~",
    checked: "[x]",
    unchecked: "[ ]",
    partial: "[-]",
};

fn alignment(align: Align) -> CellAlignment {
    match align {
        Align::Left => CellAlignment::Left,
        Align::Center => CellAlignment::Center,
        Align::Right => CellAlignment::Right,
    }
}

fn header_label(cell: &HeaderCell, glyphs: &Glyphs) -> String {
    match cell.sort {
        Some(control) => {
            let marker = match control.active {
                Some(SortDirection::Ascending) => glyphs.asc,
                Some(SortDirection::Descending) => glyphs.desc,
                None => glyphs.sortable,
            };
            format!("{} {}", cell.label, marker)
        }
        None => cell.label.clone(),
    }
}

fn action_text(rendered: &RenderedTable) -> String {
    let mut parts = Vec::new();
    if rendered.actions.view {
        parts.push("[view]");
    }
    if rendered.actions.edit {
        parts.push("[edit]");
    }
    if rendered.actions.delete {
        parts.push("[delete]");
    }
    parts.join(" ")
}

/// Render a table tree to text for a terminal
pub fn render_to_string(rendered: &RenderedTable, display: &DisplayConfig) -> String {
    let glyphs = if display.use_glyphs {
        &UNICODE_GLYPHS
    } else {
        &ASCII_GLYPHS
    };

    let mut table = Table::new();
    table
        .load_preset(if display.use_glyphs { UTF8_FULL } else { ASCII_FULL })
        .set_content_arrangement(ContentArrangement::Dynamic);

    let mut headers: Vec<Cell> = Vec::new();
    if display.show_row_numbers {
        headers.push(Cell::new("#").add_attribute(Attribute::Bold));
    }
    if let Some(select_all) = rendered.select_all {
        let mark = if select_all.checked {
            glyphs.checked
        } else if select_all.indeterminate {
            glyphs.partial
        } else {
            glyphs.unchecked
        };
        headers.push(Cell::new(mark));
    }
    let leading = headers.len();
    for cell in &rendered.header {
        headers.push(
            Cell::new(header_label(cell, glyphs))
                .add_attribute(Attribute::Bold)
                .set_alignment(alignment(cell.align)),
        );
    }
    if rendered.has_action_column() {
        headers.push(Cell::new("Actions").add_attribute(Attribute::Bold));
    }
    let width = headers.len();
    table.set_header(headers);

    for (idx, cell) in rendered.header.iter().enumerate() {
        if let (Some(min_width), Some(column)) = (cell.min_width, table.column_mut(leading + idx)) {
            column.set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(min_width)));
        }
    }

    match &rendered.body {
        TableBody::Loading(message) | TableBody::Empty(message) => {
            let mut row = vec![Cell::new(""); width];
            if let Some(slot) = row.get_mut(leading) {
                *slot = Cell::new(message).add_attribute(Attribute::Italic);
            }
            table.add_row(row);
        }
        TableBody::Rows(rows) => {
            let first = rendered.pagination.page_index * rendered.pagination.page_size;
            let actions = action_text(rendered);
            for (offset, row) in rows.iter().enumerate() {
                table.add_row(body_row(row, first + offset + 1, display, rendered, glyphs, &actions));
            }
        }
    }

    let mut output = String::new();
    if let Some(title) = &rendered.title {
        output.push_str(title);
        output.push('\n');
    }
    if let Some(search) = &rendered.search {
        if !search.term.is_empty() {
            output.push_str(&format!("Search: {}\n", search.term));
        }
    }
    output.push_str(&table.to_string());
    output.push('\n');
    output.push_str(&pagination_line(rendered));
    output
}

fn body_row(
    row: &RenderedRow,
    number: usize,
    display: &DisplayConfig,
    rendered: &RenderedTable,
    glyphs: &Glyphs,
    actions: &str,
) -> Vec<Cell> {
    let mut cells = Vec::new();
    if display.show_row_numbers {
        cells.push(Cell::new(number).set_alignment(CellAlignment::Right));
    }
    if rendered.select_all.is_some() {
        let mark = match row.selected {
            Some(true) => glyphs.checked,
            Some(false) => glyphs.unchecked,
            None => "",
        };
        cells.push(Cell::new(mark));
    }
    for cell in &row.cells {
        cells.push(Cell::new(&cell.text).set_alignment(alignment(cell.align)));
    }
    if rendered.has_action_column() {
        cells.push(Cell::new(actions));
    }
    cells
}

fn pagination_line(rendered: &RenderedTable) -> String {
    let p = &rendered.pagination;
    let sizes: Vec<String> = p.page_size_options.iter().map(|s| s.to_string()).collect();
    format!(
        "Rows per page: {} ({}) | {} | page {}/{}",
        p.page_size,
        sizes.join("/"),
        p.range_label,
        if p.total == 0 { 0 } else { p.page_index + 1 },
        p.page_count
    )
}
