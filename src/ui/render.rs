//! Terminal user interface rendering module.
//!
//! The screen is split into the cluster table, the detail page of the
//! selected cluster and a one-line footer. Cell text comes from
//! [`super::rows`]; this module only decides layout and styling.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, DetailPage, Focus};
use crate::client::InventoryClient;

use super::rows::{
    cluster_row, instance_rows, service_rows, task_rows, CLUSTER_HEADERS, INSTANCE_HEADERS,
    SERVICE_HEADERS, TASK_HEADERS,
};

/// Height of the cluster table, borders and header included.
const CLUSTER_TABLE_HEIGHT: u16 = 10;

/// Main rendering function that draws the entire UI.
///
/// # Arguments
/// * `f` - The ratatui Frame to render into
/// * `app` - The application state containing data to display
pub fn draw<C: InventoryClient>(f: &mut Frame, app: &App<C>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(CLUSTER_TABLE_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_clusters(f, chunks[0], app);
    draw_details(f, chunks[1], app);
    draw_footer(f, chunks[2], app);
}

fn row_style(selected: bool, focused: bool) -> Style {
    match (selected, focused) {
        (true, true) => Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::White),
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Everything needed to draw one table.
struct TableView<'a> {
    headers: &'a [&'a str],
    cells: Vec<Vec<String>>,
    widths: Vec<Constraint>,
    selected: usize,
    focused: bool,
    title: String,
}

/// Builds a table in the common style and renders it scrolled to the
/// selected row.
fn render_table(f: &mut Frame, area: Rect, view: TableView) {
    let TableView {
        headers,
        cells,
        widths,
        selected,
        focused,
        title,
    } = view;

    let header = Row::new(headers.iter().copied())
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);

    let selected = (!cells.is_empty()).then_some(selected);
    let rows: Vec<Row> = cells
        .into_iter()
        .enumerate()
        .map(|(i, row)| Row::new(row).style(row_style(Some(i) == selected, focused)))
        .collect();

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style(focused)),
    );

    let mut state = TableState::default().with_selected(selected);
    f.render_stateful_widget(table, area, &mut state);
}

/// Renders the cluster table with per-cluster CPU and memory meters.
fn draw_clusters<C: InventoryClient>(f: &mut Frame, area: Rect, app: &App<C>) {
    let meter_width = app.config.ui.cluster_meter_width;

    let cells: Vec<Vec<String>> = app
        .clusters
        .iter()
        .map(|cluster| cluster_row(cluster, &app.instances_of(cluster), meter_width))
        .collect();

    let meter = Constraint::Length(meter_width as u16 + 1);
    let widths = vec![
        Constraint::Min(20),
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(6),
        meter,
        meter,
    ];

    render_table(
        f,
        area,
        TableView {
            headers: &CLUSTER_HEADERS,
            cells,
            widths,
            selected: app.cluster_index,
            focused: app.focus == Focus::Clusters,
            title: format!("Clusters ({})", app.clusters.len()),
        },
    );
}

/// Renders the current detail page of the selected cluster.
fn draw_details<C: InventoryClient>(f: &mut Frame, area: Rect, app: &App<C>) {
    let focused = app.focus == Focus::Details;
    let title = match &app.snapshot {
        Some(snapshot) => format!(
            "{} ({}) - {}",
            app.page.title(),
            app.detail_len(),
            snapshot.cluster.name
        ),
        None => app.page.title().to_string(),
    };

    let Some(snapshot) = &app.snapshot else {
        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style(focused));
        f.render_widget(block, area);
        return;
    };

    let (headers, cells, widths): (&[&str], _, _) = match app.page {
        DetailPage::Services => (
            &SERVICE_HEADERS[..],
            service_rows(snapshot),
            vec![
                Constraint::Percentage(20),
                Constraint::Percentage(15),
                Constraint::Percentage(30),
                Constraint::Percentage(10),
                Constraint::Percentage(15),
                Constraint::Percentage(10),
            ],
        ),
        DetailPage::Tasks => (
            &TASK_HEADERS[..],
            task_rows(snapshot),
            vec![
                Constraint::Percentage(15),
                Constraint::Percentage(20),
                Constraint::Percentage(12),
                Constraint::Percentage(18),
                Constraint::Percentage(15),
                Constraint::Percentage(10),
                Constraint::Percentage(10),
            ],
        ),
        DetailPage::Instances => {
            let meter_width = app.config.ui.instance_meter_width;
            let meter = Constraint::Length(meter_width as u16 + 1);
            (
                &INSTANCE_HEADERS[..],
                instance_rows(
                    snapshot,
                    app.latest_agent_version.as_deref(),
                    meter_width,
                ),
                vec![
                    Constraint::Length(20),
                    Constraint::Length(10),
                    Constraint::Length(12),
                    Constraint::Length(12),
                    Constraint::Length(10),
                    Constraint::Min(20),
                    meter,
                    meter,
                ],
            )
        }
    };

    render_table(
        f,
        area,
        TableView {
            headers,
            cells,
            widths,
            selected: app.detail_index,
            focused,
            title,
        },
    );
}

/// Renders the key hints on the left and the refresh status on the right.
fn draw_footer<C: InventoryClient>(f: &mut Frame, area: Rect, app: &App<C>) {
    let key = |k: &'static str| {
        Span::styled(
            k,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };
    let hint = |h: &'static str| Span::styled(h, Style::default().fg(Color::Gray));

    let page_hint = |page: DetailPage, label: &'static str| {
        if app.page == page {
            Span::styled(
                label,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            hint(label)
        }
    };

    let keys = Line::from(vec![
        key("1"),
        page_hint(DetailPage::Services, ":services "),
        key("2"),
        page_hint(DetailPage::Tasks, ":tasks "),
        key("3"),
        page_hint(DetailPage::Instances, ":instances "),
        Span::styled("• ", Style::default().fg(Color::DarkGray)),
        key("Tab"),
        hint(":focus "),
        key("↑↓/jk"),
        hint(":move "),
        key("r"),
        hint(":refresh "),
        key("q"),
        hint(":quit"),
    ]);

    let status = app.status_line();
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(status.chars().count() as u16 + 1),
        ])
        .split(area);

    f.render_widget(Paragraph::new(keys), chunks[0]);
    f.render_widget(
        Paragraph::new(status)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Right),
        chunks[1],
    );
}
