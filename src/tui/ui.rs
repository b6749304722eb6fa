//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, List, ListItem, Paragraph, Wrap},
};
use crate::cpu::MachineState;
use super::app::DebuggerApp;

/// Lay out and draw every panel.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let [left, right] =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(frame.area());

    let [code, regs, status] =
        Layout::vertical([Constraint::Min(10), Constraint::Length(5), Constraint::Length(3)]).areas(left);
    let [memory, output, help] =
        Layout::vertical([Constraint::Min(10), Constraint::Length(6), Constraint::Length(5)]).areas(right);

    draw_disassembly(frame, code, app);
    draw_registers(frame, regs, app);
    draw_status(frame, status, app);
    draw_memory(frame, memory, app);
    draw_output(frame, output, app);
    draw_help(frame, help);
}

fn panel(title: &str, color: Color) -> Block<'_> {
    Block::bordered()
        .title(format!(" {} ", title))
        .border_style(Style::new().fg(color))
}

fn highlight() -> Style {
    Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

/// Disassembly around the current PC, with breakpoint markers.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = (area.height as usize).saturating_sub(2);

    let items: Vec<ListItem> = app
        .get_disassembly(rows)
        .into_iter()
        .map(|(addr, text, at_pc)| {
            let marked = app.breakpoints.contains(&addr);
            let line = format!(
                "{}{}{:04}: {}",
                if marked { "●" } else { " " },
                if at_pc { " ▶ " } else { "   " },
                addr,
                text,
            );

            let style = match (at_pc, marked) {
                (true, _) => highlight(),
                (false, true) => Style::new().fg(Color::Red),
                (false, false) => Style::new(),
            };
            ListItem::new(line).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(panel("Disassembly", Color::Cyan)), area);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let machine = &app.machine;
    let state = machine.state();

    let lines = vec![
        Line::from(vec![
            "PC: ".into(),
            Span::styled(format!("{:<8}", machine.pc()), Style::new().fg(Color::Yellow)),
            "  RB: ".into(),
            machine.relative_base().to_string().into(),
        ]),
        Line::from(vec![
            "Steps: ".into(),
            Span::styled(format!("{:<8}", machine.steps()), Style::new().fg(Color::Cyan)),
            "  Queued input: ".into(),
            machine.pending_input().to_string().into(),
        ]),
        Line::from(vec![
            "State: ".into(),
            Span::styled(format!("{:?}", state), state_style(state)),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(panel("Registers", Color::Green)), area);
}

/// Memory cells from the scroll offset down; unwritten cells are dimmed.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let rows = (area.height as u64).saturating_sub(2);
    let pc = app.machine.pc();
    let mem = app.machine.memory();

    let items: Vec<ListItem> = (app.mem_scroll..app.mem_scroll.saturating_add(rows))
        .map(|addr| {
            let value = mem.read(addr);
            let style = if addr == pc {
                highlight()
            } else if value == 0 {
                Style::new().fg(Color::DarkGray)
            } else {
                Style::new().fg(Color::White)
            };
            ListItem::new(format!("{:04}: {}", addr, value)).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(panel("Memory", Color::Magenta)), area);
}

fn draw_output(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let values: Vec<String> = app.machine.output().iter().map(|w| w.to_string()).collect();

    let output = Paragraph::new(values.join(", "))
        .wrap(Wrap { trim: true })
        .block(panel("Output", Color::Blue));

    frame.render_widget(output, area);
}

/// Status line, replaced by the input prompt while input is being typed.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let widget = match &app.input_line {
        Some(line) => Paragraph::new(format!("> {}_", line))
            .style(Style::new().fg(Color::Yellow))
            .block(panel("Input", Color::Yellow)),
        None => Paragraph::new(app.status.as_str())
            .style(Style::new().fg(Color::White))
            .block(panel("Status", Color::White)),
    };

    frame.render_widget(widget, area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("s step   r run   p pause   b breakpoint"),
        Line::from("i input  x reset  ↑↓/PgUp/PgDn memory"),
        Line::from("q quit"),
    ])
    .style(Style::new().fg(Color::DarkGray))
    .block(panel("Help", Color::DarkGray));

    frame.render_widget(help, area);
}

fn state_style(state: MachineState) -> Style {
    let color = match state {
        MachineState::Ready | MachineState::Running => Color::Green,
        MachineState::AwaitingInput => Color::Yellow,
        MachineState::Halted => Color::Gray,
        MachineState::Faulted => Color::Red,
    };
    Style::new().fg(color)
}
