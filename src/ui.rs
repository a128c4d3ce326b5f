//! Layout and drawing: playfield, score sidebar, game over.

use crate::driver::GameState;
use crate::piece::PieceColor;
use crate::render::{self, Surface};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};

/// One block is two terminal columns by one row, so blocks look roughly square.
const CELL_WIDTH: u16 = 2;
const CELL_HEIGHT: u16 = 1;

const SIDEBAR_WIDTH: u16 = 20;

/// Playfield size in terminal cells including the border.
fn playfield_outer_size(columns: usize, rows: usize) -> (u16, u16) {
    (
        columns as u16 * CELL_WIDTH + 2,
        rows as u16 * CELL_HEIGHT + 2,
    )
}

/// [`Surface`] over a ratatui buffer region. Pixel coordinates are divided by the block
/// size and scaled to terminal cells; fills paint the background, strokes draw `[]`.
pub struct TerminalSurface<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    theme: &'a Theme,
    block_size: u32,
}

impl<'a> TerminalSurface<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect, theme: &'a Theme, block_size: u32) -> Self {
        Self {
            buf,
            area,
            theme,
            block_size: block_size.max(1),
        }
    }

    /// Terminal cells covered by a pixel rectangle, clipped to the area.
    fn cells(&self, x: u32, y: u32, w: u32, h: u32) -> Rect {
        let bs = self.block_size;
        let col = (x / bs) as u16 * CELL_WIDTH;
        let row = (y / bs) as u16 * CELL_HEIGHT;
        let width = (w.div_ceil(bs) as u16).saturating_mul(CELL_WIDTH);
        let height = (h.div_ceil(bs) as u16).saturating_mul(CELL_HEIGHT);
        Rect {
            x: self.area.x.saturating_add(col),
            y: self.area.y.saturating_add(row),
            width,
            height,
        }
        .intersection(self.area)
    }
}

impl Surface for TerminalSurface<'_> {
    fn clear_surface(&mut self, width: u32, height: u32) {
        let region = self.cells(0, 0, width, height);
        let style = Style::default().bg(self.theme.bg).fg(self.theme.div_line);
        for y in region.top()..region.bottom() {
            for x in region.left()..region.right() {
                if let Some(cell) = self.buf.cell_mut((x, y)) {
                    cell.reset();
                    cell.set_symbol(" ").set_style(style);
                }
            }
        }
    }

    fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: PieceColor) {
        let region = self.cells(x, y, w, h);
        self.buf
            .set_style(region, Style::default().bg(self.theme.piece_color(color)));
    }

    fn stroke_rect(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let region = self.cells(x, y, w, h);
        if region.is_empty() {
            return;
        }
        let fg = self.theme.bg;
        for row in region.top()..region.bottom() {
            if let Some(cell) = self.buf.cell_mut((region.left(), row)) {
                cell.set_symbol("[").set_fg(fg);
            }
            if let Some(cell) = self.buf.cell_mut((region.right() - 1, row)) {
                cell.set_symbol("]").set_fg(fg);
            }
        }
    }
}

/// Draw the game: bordered playfield, score sidebar, and the game-over banner when topped out.
pub fn draw(frame: &mut Frame, state: &GameState, theme: &Theme, score: u32, block_size: u32) {
    let area = frame.area();
    let (pw, ph) = playfield_outer_size(state.grid.columns(), state.grid.rows());
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let (playfield_area, sidebar_area) = (inner[0], inner[1]);

    draw_playfield(frame.buffer_mut(), state, theme, playfield_area, block_size);
    draw_sidebar(frame.buffer_mut(), theme, score, sidebar_area);
    if state.is_topped_out() {
        draw_game_over(frame.buffer_mut(), theme, score, playfield_area);
    }
}

fn draw_playfield(buf: &mut Buffer, state: &GameState, theme: &Theme, area: Rect, bs: u32) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(" blocktui ", Style::default().fg(theme.title)));
    let board = block.inner(area);
    block.render(area, buf);
    let mut surface = TerminalSurface::new(buf, board, theme, bs);
    render::render(state, &mut surface, bs);
}

fn draw_sidebar(buf: &mut Buffer, theme: &Theme, score: u32, area: Rect) {
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Score
            Constraint::Length(1), // gap
            Constraint::Length(7), // Keys
        ])
        .split(area);

    Paragraph::new(Line::from(vec![
        Span::styled("Score: ", title_style),
        Span::styled(score.to_string(), fg_style),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line)),
    )
    .render(chunks[0], buf);

    let help = vec![
        Line::from(Span::styled("←/→  Move", fg_style)),
        Line::from(Span::styled("↓    Move down", fg_style)),
        Line::from(Span::styled("↑    Rotate", fg_style)),
        Line::from(Span::styled("Q    Quit", fg_style)),
    ];
    Paragraph::new(Text::from(help))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line))
                .title(Span::styled("Keys", title_style)),
        )
        .render(chunks[2], buf);
}

fn draw_game_over(buf: &mut Buffer, theme: &Theme, score: u32, area: Rect) {
    let popup_h = 6u16;
    let popup = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: area.width,
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", score),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(Span::styled(
            " Q — Quit ",
            Style::default()
                .fg(theme.main_fg)
                .add_modifier(Modifier::BOLD),
        )),
    ];
    Clear.render(popup, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
        )
        .render(popup, buf);
}
