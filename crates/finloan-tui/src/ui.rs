//! Rendering for the loan wizard.

use chrono::Utc;
use finloan_form::format::{format_currency, format_percentage};
use finloan_form::{
    FieldDescriptor, FieldKind, LoanApplication, LoanDecision, LoanInsights, RiskLevel, StepStatus,
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Gauge, Paragraph, Wrap},
};

use crate::alert::AlertSeverity;
use crate::app::App;
use crate::view::FieldFeedback;

const FORM_WIDTH: u16 = 76;
const MAX_ALERT_LINES: u16 = 3;

/// Draw the whole wizard.
pub fn draw(f: &mut Frame, app: &App) {
    let size = f.area();
    f.render_widget(Clear, size);

    let alert_lines = (app.alerts().len() as u16).min(MAX_ALERT_LINES);
    let centered = centered_rect(FORM_WIDTH.min(size.width), size.height, size);

    let outer_block = Block::default()
        .title(" FinLoan Application ")
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(outer_block.clone(), centered);
    let inner = outer_block.inner(centered);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(alert_lines), // Alerts
            Constraint::Length(1),           // Step indicator
            Constraint::Length(1),           // Progress
            Constraint::Length(1),           // Spacer
            Constraint::Min(6),              // Fields
            Constraint::Length(1),           // Help
        ])
        .split(inner);

    draw_alerts(f, app, chunks[0]);
    draw_step_indicator(f, app, chunks[1]);
    draw_progress(f, app, chunks[2]);

    let step = app.view().progress.visible();
    if step == app.wizard().state().total_steps() {
        let halves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[4]);
        draw_fields(f, app, halves[0]);
        draw_insights(f, app, halves[1]);
    } else {
        draw_fields(f, app, chunks[4]);
    }

    draw_help(f, app, chunks[5]);
}

fn severity_color(severity: AlertSeverity) -> Color {
    match severity {
        AlertSeverity::Info => Color::Blue,
        AlertSeverity::Success => Color::Green,
        AlertSeverity::Warning => Color::Yellow,
        AlertSeverity::Danger => Color::Red,
    }
}

fn draw_alerts(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = app
        .alerts()
        .visible()
        .take(MAX_ALERT_LINES as usize)
        .map(|alert| {
            Line::from(Span::styled(
                format!(" {} {}", alert.severity.icon(), alert.message),
                Style::default()
                    .fg(Color::Black)
                    .bg(severity_color(alert.severity))
                    .add_modifier(Modifier::BOLD),
            ))
        })
        .collect();
    f.render_widget(Paragraph::new(lines), area);
}

fn draw_step_indicator(f: &mut Frame, app: &App, area: Rect) {
    let progress = &app.view().progress;
    let mut spans = Vec::new();

    for step in app.wizard().form().steps() {
        let status = if progress.is_completed(step.number) {
            StepStatus::Completed
        } else if progress.active() == Some(step.number) {
            StepStatus::Active
        } else {
            StepStatus::Upcoming
        };

        let (marker, style) = match status {
            StepStatus::Completed => ("✔", Style::default().fg(Color::Green)),
            StepStatus::Active => (
                "●",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            StepStatus::Upcoming => ("○", Style::default().fg(Color::DarkGray)),
        };

        if !spans.is_empty() {
            spans.push(Span::styled("  ─  ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            format!("{marker} {}. {}", step.number, step.title),
            style,
        ));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let percent = app.view().progress.percent();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .percent(percent)
        .label(format!("{percent}%"));
    f.render_widget(gauge, area);
}

fn value_text(field: &FieldDescriptor, focused: bool) -> String {
    match &field.kind {
        FieldKind::Text | FieldKind::Number => {
            if focused {
                format!("{}▏", field.value)
            } else {
                field.value.clone()
            }
        }
        FieldKind::Select(_) if field.value.is_empty() => "‹ choose ›".to_string(),
        FieldKind::Select(_) => format!("‹ {} ›", field.value),
        FieldKind::Checkbox if field.is_checked() => "[x]".to_string(),
        FieldKind::Checkbox => "[ ]".to_string(),
    }
}

fn draw_fields(f: &mut Frame, app: &App, area: Rect) {
    let step_number = app.view().progress.visible();
    let Some(step) = app.wizard().form().step(step_number) else {
        return;
    };

    let mut lines = Vec::with_capacity(step.fields.len() * 2);
    for (i, field) in step.fields.iter().enumerate() {
        let focused = i == app.focus();
        let feedback = app.view().feedback.get(&field.name);

        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let value_style = match feedback {
            Some(FieldFeedback::Invalid(_)) => Style::default().fg(Color::Red),
            Some(FieldFeedback::Valid) => Style::default().fg(Color::Green),
            None => Style::default(),
        };
        let required = if field.required { "*" } else { " " };

        lines.push(Line::from(vec![
            Span::styled(if focused { "▶ " } else { "  " }, label_style),
            Span::styled(format!("{:<26}", format!("{}{required}", field.label)), label_style),
            Span::styled(value_text(field, focused), value_style),
        ]));

        let hint = match feedback {
            Some(FieldFeedback::Invalid(message)) => {
                Span::styled(format!("    {message}"), Style::default().fg(Color::Red))
            }
            _ => Span::raw(""),
        };
        lines.push(Line::from(hint));
    }

    let block = Block::default()
        .title(format!(" Step {}: {} ", step.number, step.title))
        .borders(Borders::TOP)
        .style(Style::default().fg(Color::White));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn risk_color(level: RiskLevel) -> Color {
    match level {
        RiskLevel::Low => Color::Green,
        RiskLevel::Medium => Color::Yellow,
        RiskLevel::High => Color::Red,
    }
}

fn draw_insights(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Estimate ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(Color::DarkGray));

    // Only shown once every value converts
    let Ok(application) = LoanApplication::from_form(app.wizard().form(), Utc::now()) else {
        let hint = Paragraph::new("Complete the previous steps to see an estimate.")
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(hint, area);
        return;
    };

    let insights = LoanInsights::for_application(&application);
    let decision = LoanDecision::for_application(&application);
    let row = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label:<16}"), Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().fg(Color::White)),
        ])
    };

    let lines = vec![
        row("Total income", format_currency(insights.total_income as f64)),
        row("Loan / income", format!("{:.2}", insights.loan_to_income_ratio)),
        row("Monthly payment", format_currency(insights.monthly_payment)),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<16}", "Risk score"), Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} ({})",
                    format_percentage(f64::from(insights.risk_score) / 100.0, 0),
                    insights.risk_level.label()
                ),
                Style::default()
                    .fg(risk_color(insights.risk_level))
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<16}", "Likely outcome"), Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{} ({})",
                    if decision.approved { "Approve" } else { "Reject" },
                    format_percentage(decision.approval_probability / 100.0, 0)
                ),
                Style::default().fg(if decision.approved { Color::Green } else { Color::Red }),
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help(f: &mut Frame, app: &App, area: Rect) {
    let next = if app.wizard().state().is_last_step() {
        "Enter: Submit"
    } else {
        "Enter: Next"
    };
    let help_text = format!(
        "Tab/↑↓: Field | ←/→/Space: Choose | {next} | PgUp: Back | ^S Save ^O Load | Esc: Quit"
    );

    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(help, area);
}

/// Helper function to create a centered rectangle.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
