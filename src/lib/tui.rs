use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::Constraint,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};
use std::io;

use crate::lib::headroom::HeadroomReport;
use crate::lib::humanize::{comma, ratio};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Nodes,
    Candidates,
}

impl View {
    fn toggle(self) -> Self {
        match self {
            View::Nodes => View::Candidates,
            View::Candidates => View::Nodes,
        }
    }
}

/// Pre-rendered rows of one view
struct Page {
    title: String,
    headers: Vec<String>,
    widths: Vec<Constraint>,
    rows: Vec<Vec<String>>,
}

pub fn display_report(report: &HeadroomReport, label: &str) -> io::Result<()> {
    let pages = [node_page(report, label), candidate_page(report)];

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &pages);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn node_page(report: &HeadroomReport, label: &str) -> Page {
    Page {
        title: format!(
            " Node memory headroom, {} of {} nodes short of {} (Tab: containers, q: quit) ",
            report.insufficient_nodes(),
            report.nodes.len(),
            label
        ),
        headers: vec![
            "Name".to_string(),
            "Allocatable".to_string(),
            "Used".to_string(),
            "Free".to_string(),
            "Requests".to_string(),
            "Efficiency".to_string(),
            "Schedulable".to_string(),
            format!("Free - {}", label),
            format!("Sched. - {}", label),
            "Ok?".to_string(),
        ],
        widths: vec![
            Constraint::Percentage(16),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(7),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(11),
            Constraint::Percentage(6),
        ],
        rows: report
            .nodes
            .iter()
            .map(|node| {
                vec![
                    node.name.clone(),
                    comma(node.allocatable),
                    comma(node.used),
                    comma(node.free),
                    comma(node.requests),
                    ratio(node.efficiency),
                    comma(node.schedulable),
                    comma(node.free_with_additional),
                    comma(node.schedulable_with_additional),
                    node.sufficient.to_string(),
                ]
            })
            .collect(),
    }
}

fn candidate_page(report: &HeadroomReport) -> Page {
    Page {
        title: format!(
            " {} containers using more than requested (Tab: nodes, q: quit) ",
            report.candidates.len()
        ),
        headers: ["Node", "Namespace", "Pod", "Container", "Requested", "Used", "Limit"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        widths: vec![
            Constraint::Percentage(15),
            Constraint::Percentage(13),
            Constraint::Percentage(20),
            Constraint::Percentage(14),
            Constraint::Percentage(13),
            Constraint::Percentage(13),
            Constraint::Percentage(12),
        ],
        rows: report
            .candidates
            .iter()
            .map(|c| {
                vec![
                    c.node.clone(),
                    c.namespace.clone(),
                    c.pod.clone(),
                    c.container.clone(),
                    comma(c.requested),
                    comma(c.used),
                    c.limit.map(comma).unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect(),
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    pages: &[Page; 2],
) -> io::Result<()> {
    let mut view = View::Nodes;
    let mut state = TableState::default();
    state.select(Some(0));

    loop {
        let page = match view {
            View::Nodes => &pages[0],
            View::Candidates => &pages[1],
        };

        terminal.draw(|f| {
            let area = f.area();

            let header_cells = page.headers.iter().map(|h| {
                Cell::from(h.as_str()).style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )
            });
            let header = Row::new(header_cells)
                .style(Style::default().bg(Color::DarkGray))
                .height(1);

            let rows = page.rows.iter().map(|row| {
                let cells = row.iter().map(|value| Cell::from(value.as_str()));
                Row::new(cells).height(1)
            });

            let table = Table::new(rows, page.widths.clone())
                .header(header)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(page.title.as_str()),
                )
                .row_highlight_style(Style::default().bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, area, &mut state);
        })?;

        // Handle input
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                let len = page.rows.len();
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Tab => {
                        view = view.toggle();
                        state.select(Some(0));
                    }
                    KeyCode::Down | KeyCode::Char('j') if len > 0 => {
                        let i = match state.selected() {
                            Some(i) if i + 1 < len => i + 1,
                            _ => 0,
                        };
                        state.select(Some(i));
                    }
                    KeyCode::Up | KeyCode::Char('k') if len > 0 => {
                        let i = match state.selected() {
                            Some(0) | None => len - 1,
                            Some(i) => i - 1,
                        };
                        state.select(Some(i));
                    }
                    _ => {}
                }
            }
        }
    }
}
