use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

const PAD_X: u16 = 1; // one empty column inside each side of the border
const PAD_TOP: u16 = 1; // one empty line below the top border

/// Menu area on top, one status line at the bottom.
#[must_use]
pub fn split_main_area(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    (chunks[0], chunks[1])
}

/// Area left for content once the border block is drawn into `area`.
#[must_use]
pub fn inner_area(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1 + PAD_X),
        y: area.y.saturating_add(1 + PAD_TOP),
        width: area.width.saturating_sub(2 + PAD_X * 2),
        height: area.height.saturating_sub(2 + PAD_TOP),
    }
}

pub fn render_border_block<'a>(
    title: impl Into<Line<'a>>,
    style: Style,
    area: Rect,
    f: &mut Frame,
) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
        .padding(Padding::new(PAD_X, PAD_X, PAD_TOP, 0));
    f.render_widget(block, area);
    inner_area(area)
}

pub fn render_modal<'a>(title: impl Into<Line<'a>>, msg: &str, area: Rect, f: &mut Frame) {
    let inverted = Style::default().add_modifier(Modifier::REVERSED);
    let modal = Paragraph::new(Text::from(msg.to_string()))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(inverted),
        )
        .style(inverted);
    f.render_widget(Clear, area);
    f.render_widget(modal, area);
}

pub fn render_status_bar(spans: Line, area: Rect, f: &mut Frame) {
    let status_para = Paragraph::new(spans);
    f.render_widget(Clear, area);
    f.render_widget(status_para, area);
}

/// Rectangle of at most `w`x`h` centred inside `within`.
#[must_use]
pub fn centered_rect_fixed(w: u16, h: u16, within: Rect) -> Rect {
    let ww = w.min(within.width);
    let hh = h.min(within.height);
    Rect {
        x: within.x + within.width.saturating_sub(ww) / 2,
        y: within.y + within.height.saturating_sub(hh) / 2,
        width: ww,
        height: hh,
    }
}
