use parkrelay_core::store::Readiness;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use crate::app::{App, Screen, is_free, is_occupied};

pub(crate) fn draw(frame: &mut Frame<'_>, app: &App) {
    let area = frame.area();

    // Outer layout: title, main content, status line
    let layout_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [header_area, content_area, status_area] = chunks else {
        return;
    };

    let header = Paragraph::new("parkrelay – parking vacancy and sensor occupancy")
        .block(Block::default().borders(Borders::ALL).title("parkrelay"));
    frame.render_widget(header, *header_area);

    match app.screen {
        Screen::CitySelect => draw_city_select(frame, app, *content_area),
        Screen::Dashboard => draw_dashboard(frame, app, *content_area),
    }

    // Status bar
    let nav_hint = match app.screen {
        Screen::CitySelect => "↑/↓ move · Enter/Space select city · q/Ctrl-C quit",
        Screen::Dashboard => "↑/↓ scroll sensors · r refresh · Esc/←/b back · q/Ctrl-C quit",
    };

    let table_state = match app.service.sensor_store().readiness() {
        Readiness::Building => "sensor table building".to_owned(),
        Readiness::Ready => "sensor table ready".to_owned(),
        Readiness::Failed(reason) => format!("sensor table failed: {reason}"),
    };

    let status_text = if app.is_loading {
        format!("Loading… · {table_state} · {nav_hint}")
    } else if let Some(msg) = &app.error_message {
        format!("{msg} · {nav_hint}")
    } else {
        format!("{table_state} · {nav_hint}")
    };

    let status_style = if app.error_message.is_some() {
        Style::default().fg(Color::Red)
    } else if app.is_loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let status = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(status_style)
        .wrap(Wrap { trim: true });

    frame.render_widget(status, *status_area);
}

fn draw_city_select(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let items = app
        .cities
        .iter()
        .enumerate()
        .map(|(idx, city)| {
            let prefix = if idx == app.city_list_index {
                "> "
            } else {
                "  "
            };
            ListItem::new(format!("{prefix}{}", city.name))
        })
        .collect::<Vec<ListItem<'_>>>();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Select city (↑/↓, Enter)"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.cities.is_empty() {
        state.select(Some(app.city_list_index));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_dashboard(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let layout_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let chunks = layout_chunks.as_ref();
    let [vacancy_area, sensor_area] = chunks else {
        return;
    };

    draw_vacancies(frame, app, *vacancy_area);
    draw_sensors(frame, app, *sensor_area);
}

fn draw_vacancies(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let city_name = app
        .selected_city
        .as_ref()
        .map_or("<city>", |city| city.name.as_str());

    let title = match app.window {
        Some(window) => format!(
            "Vacancies in {city_name} ({} – {})",
            window.start.format("%H:%M"),
            window.end.format("%H:%M")
        ),
        None => format!("Vacancies in {city_name}"),
    };

    if app.vacancies.is_empty() {
        let text = if app.is_loading {
            "Loading vacancies…"
        } else {
            "No vacancy data. Press r to refresh."
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.vacancies.iter().enumerate().map(|(rank, zone)| {
        let style = if rank == 0 {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(format!("{}.", rank + 1)),
            Cell::from(zone.name.clone()),
            Cell::from(zone.vacancy.clone()),
        ])
        .style(style)
    });

    let column_widths = [
        Constraint::Length(4),
        Constraint::Min(16),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["#", "Zone", "Vacancy"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(1);

    frame.render_widget(table, area);
}

fn draw_sensors(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let title = format!(
        "Sensors with readings: {} of {} · {} occupied",
        app.sensors.len(),
        app.sensor_total,
        app.occupied_count()
    );

    if app.sensors.is_empty() {
        let text = if app.is_loading {
            "Waiting for occupancy data…"
        } else {
            "No occupancy readings yet."
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let rows = app.sensors.iter().map(|record| {
        let (label, color) = occupancy_label(&record.occupancy);
        Row::new(vec![
            Cell::from(record.id.0.clone()),
            Cell::from(record.latitude.clone()),
            Cell::from(record.longitude.clone()),
            Cell::from(label),
        ])
        .style(Style::default().fg(color))
    });

    let column_widths = [
        Constraint::Min(16),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, column_widths)
        .header(
            Row::new(vec!["Sensor", "Lat", "Long", "Status"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .column_spacing(1);

    let mut state = TableState::default();
    state.select(Some(app.sensor_list_index));
    frame.render_stateful_widget(table, area, &mut state);
}

fn occupancy_label(occupancy: &str) -> (String, Color) {
    if is_occupied(occupancy) {
        ("occupied".to_owned(), Color::Red)
    } else if is_free(occupancy) {
        ("free".to_owned(), Color::Green)
    } else {
        (occupancy.to_owned(), Color::Gray)
    }
}
