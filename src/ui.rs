use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Frame,
};

use crate::app::App;
use crate::braille::BrailleCanvas;
use crate::map::{draw_ring, MarkerKey, MarkerSpec, TerminalHost};
use crate::markers::Rgb;
use crate::sync::Phase;

const SPINNER: [char; 4] = ['◐', '◓', '◑', '◒'];

fn color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Map
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_map(frame, app, chunks[0]);
    render_status_bar(frame, app, chunks[1]);
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.config.selectable {
        " Fruit Map · click to pick a location "
    } else {
        " Fruit Map "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
        ));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    match app.phase() {
        Phase::Uninitialized | Phase::Loading => render_loading(frame, app, inner),
        Phase::Failed => render_error(frame, app, inner),
        Phase::TornDown => {}
        Phase::Ready => {
            if let Some(host) = app.controller.host() {
                let selected = app.selected_tree.as_ref().and_then(|tree| {
                    app.controller
                        .registry()
                        .and_then(|r| r.tree_handle(tree.id))
                        .map(|h| h.key)
                });
                frame.render_widget(
                    MapWidget {
                        host,
                        frame: app.frame,
                        selected,
                    },
                    inner,
                );
            }
            render_overlays(frame, app, inner);
        }
    }
}

fn render_loading(frame: &mut Frame, app: &App, area: Rect) {
    let spinner = SPINNER[(app.frame / 6) as usize % SPINNER.len()];
    let text = Paragraph::new(format!("{spinner} Loading map…"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(text, centered(area, 24, 1));
}

fn render_error(frame: &mut Frame, app: &App, area: Rect) {
    let reason = app
        .controller
        .error()
        .map(|e| e.to_string())
        .unwrap_or_default();
    let lines = vec![
        Line::from(Span::styled(
            "Failed to load map.",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(reason, Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled(
            "Press r to reload",
            Style::default().fg(Color::LightMagenta),
        )),
    ];
    let popup = centered(area, 50, 6);
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL)),
        popup,
    );
}

/// Banner, hover tooltip and tree detail card drawn over the map
fn render_overlays(frame: &mut Frame, app: &App, area: Rect) {
    if app.controller.user_position().is_none() {
        let text = "Unable to determine your location. Press u to use your location.";
        let width = (text.chars().count() as u16 + 2).min(area.width);
        let banner = Rect::new(area.x + area.width.saturating_sub(width) / 2, area.y, width, 1.min(area.height));
        frame.render_widget(Clear, banner);
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::White)),
            banner,
        );
    }

    if let Some((col, row, tooltip)) = app.hovered_tooltip() {
        let lines: Vec<&str> = tooltip.lines().collect();
        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as u16 + 2;
        let height = lines.len() as u16 + 2;
        let x = col.saturating_sub(width / 2).max(area.x).min((area.x + area.width).saturating_sub(width));
        let y = row.saturating_sub(height).max(area.y);
        let rect = Rect::new(x, y, width.min(area.width), height.min(area.height));
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(tooltip.clone()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightMagenta)),
            ),
            rect,
        );
    }

    if let Some(tree) = &app.selected_tree {
        let mut lines = vec![
            Line::from(Span::styled(
                format!("{} Tree", tree.kind),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(tree.species.clone(), Style::default().fg(Color::Gray))),
            Line::from(tree.position.to_string()),
        ];
        if tree.in_season {
            lines.push(Line::from(Span::styled(
                "✨ In Season ✨",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
        }
        lines.push(Line::from(Span::styled("Esc to close", Style::default().fg(Color::DarkGray))));

        let height = lines.len() as u16 + 2;
        let width = 34.min(area.width);
        let rect = Rect::new(area.x, (area.y + area.height).saturating_sub(height), width, height.min(area.height));
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightMagenta))
                    .title(format!(" {} ", tree.id)),
            ),
            rect,
        );
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Base layer, glow halos and marker glyphs
struct MapWidget<'a> {
    host: &'a TerminalHost,
    frame: u64,
    selected: Option<MarkerKey>,
}

impl MapWidget<'_> {
    /// Breathing phase: on for half of each ~1s cycle at 60fps
    fn breath_on(&self) -> bool {
        (self.frame / 30) % 2 == 0
    }

    fn render_canvas(canvas: &BrailleCanvas, color: Color, area: Rect, buf: &mut Buffer) {
        for (col, row, ch) in canvas.cells() {
            if col >= area.width as usize || row >= area.height as usize {
                continue;
            }
            buf[(area.x + col as u16, area.y + row as u16)].set_char(ch).set_fg(color);
        }
    }

    fn render_glows(&self, markers: &[(MarkerKey, &MarkerSpec)], area: Rect, buf: &mut Buffer) {
        let viewport = &self.host.viewport;
        let outer = if self.breath_on() { 7 } else { 6 };

        // One canvas per glow color
        let mut layers: Vec<(Rgb, BrailleCanvas)> = Vec::new();
        for (_, spec) in markers {
            let Some(glow) = spec.icon.glow else {
                continue;
            };
            let (px, py) = viewport.project(spec.position);
            if !viewport.is_visible(px, py) {
                continue;
            }
            let idx = match layers.iter().position(|(c, _)| *c == glow) {
                Some(idx) => idx,
                None => {
                    layers.push((glow, BrailleCanvas::new(area.width as usize, area.height as usize)));
                    layers.len() - 1
                }
            };
            draw_ring(&mut layers[idx].1, px, py, 4, outer);
        }

        for (glow, canvas) in &layers {
            Self::render_canvas(canvas, color(*glow), area, buf);
        }
    }

    fn render_markers(&self, markers: &[(MarkerKey, &MarkerSpec)], area: Rect, buf: &mut Buffer) {
        let viewport = &self.host.viewport;
        for (key, spec) in markers {
            let (px, py) = viewport.project(spec.position);
            // Negative or far off-screen positions have no cell
            let (Ok(col), Ok(row)) = (
                u16::try_from(px.div_euclid(2)),
                u16::try_from(py.div_euclid(4)),
            ) else {
                continue;
            };
            if col >= area.width || row >= area.height {
                continue;
            }

            let mut style = Style::default().fg(color(spec.icon.fill));
            if spec.icon.animated {
                style = style.add_modifier(if self.breath_on() { Modifier::BOLD } else { Modifier::DIM });
            }
            if Some(*key) == self.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            buf[(area.x + col, area.y + row)]
                .set_char(spec.icon.glyph.symbol())
                .set_style(style);
        }
    }
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = (area.width as usize, area.height as usize);
        let viewport = &self.host.viewport;

        // Back to front: graticule, loaded line work, glows, markers
        let mut grid = BrailleCanvas::new(width, height);
        self.host.base.render_grid(&mut grid, viewport);
        Self::render_canvas(&grid, Color::DarkGray, area, buf);

        let mut lines = BrailleCanvas::new(width, height);
        self.host.base.render_lines(&mut lines, viewport);
        Self::render_canvas(&lines, Color::Cyan, area, buf);

        let markers = self.host.markers();
        self.render_glows(&markers, area, buf);
        self.render_markers(&markers, area, buf);
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut spans = Vec::new();

    if let Some(host) = app.controller.host() {
        spans.push(Span::styled(" Zoom: ", dim));
        spans.push(Span::styled(host.viewport.zoom.to_string(), Style::default().fg(Color::Yellow)));
        spans.push(Span::styled(" | ", dim));
        spans.push(Span::styled(host.viewport.center.to_string(), Style::default().fg(Color::Cyan)));
        spans.push(Span::styled(" | ", dim));
    }

    spans.push(Span::styled(
        format!("{} trees ", app.tree_count()),
        Style::default().fg(Color::Green),
    ));
    spans.push(Span::styled(
        if app.season_only { "[F]in season " } else { "[f]all " },
        Style::default().fg(if app.season_only { Color::Green } else { Color::DarkGray }),
    ));
    spans.push(Span::styled(
        if app.share_location { "[U]location " } else { "[u]location " },
        Style::default().fg(if app.share_location { Color::Green } else { Color::DarkGray }),
    ));
    if let Some(point) = app.selection() {
        spans.push(Span::styled(format!("picked {point} "), Style::default().fg(Color::Red)));
    }
    spans.push(Span::styled(
        "| hjkl:pan +/-:zoom g:grid c:center x:clear r:reload q:quit",
        dim,
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
