// SPDX-License-Identifier: GPL-3.0-only

//! Terminal gallery
//!
//! Renders the live preview and the photo thumbnails with Unicode
//! half-block characters for improved vertical resolution.
//!
//! ```text
//! ┌ Mini Gallery ─────────────────────────────────────────┐
//! │ ┌ Rear camera ───────────┐ ┌ My Photos ──────────────┐ │
//! │ │                        │ │ ┌ 1 ──┐ ┌ 2 ──┐         │ │
//! │ │      live preview      │ │ │ ▀▀▀ │ │ ▀▀▀ │         │ │
//! │ │                        │ │ └─────┘ └─────┘         │ │
//! │ └────────────────────────┘ └─────────────────────────┘ │
//! │ [p] Take photo  [x] Stop camera  [f] Switch to front   │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::app::{AppModel, Message};
use crate::backends::camera::format_converters::yuv_to_rgb;
use crate::backends::camera::types::{CameraFrame, Facing, PixelFormat};
use crate::constants::{APP_TITLE, timing, ui};
use crate::storage::{Photo, PhotoStore};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use image::RgbImage;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Widget, Wrap},
};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{self, stdout};
use tracing::{debug, info, warn};

/// Run the terminal gallery until the user quits
pub fn run(
    app: &mut AppModel,
    runtime: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app, runtime);

    // Quitting stops the camera
    app.camera_mut().stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppModel,
    runtime: &tokio::runtime::Runtime,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut thumbnails = ThumbnailCache::default();
    info!(photos = app.store().len(), "Terminal gallery started");

    loop {
        // Drain all available frames to show the latest
        app.camera_mut().poll_frames();
        thumbnails.sync(app.store());

        terminal.draw(|f| draw(f, app, &thumbnails))?;

        // Handle input with timeout for frame updates
        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key_action(key, app) {
                Some(KeyAction::Quit) => break,
                Some(KeyAction::Send(message)) => runtime.block_on(app.update(message)),
                None => {}
            }
        }
    }

    info!("Terminal gallery closed");
    Ok(())
}

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Send(Message),
}

/// Map a key press to an action for the current state
pub fn key_action(key: KeyEvent, app: &AppModel) -> Option<KeyAction> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(KeyAction::Quit);
    }

    // Any key dismisses the notice
    if app.notice().is_some() {
        return Some(KeyAction::Send(Message::DismissNotice));
    }

    let message = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(KeyAction::Quit),
        KeyCode::Char('s') => Message::StartCamera,
        KeyCode::Char('p') | KeyCode::Char(' ') => Message::TakePhoto,
        KeyCode::Char('x') => Message::StopCamera,
        KeyCode::Char('f') => Message::SwitchCamera,
        KeyCode::Right | KeyCode::Down => Message::SelectNext,
        KeyCode::Left | KeyCode::Up => Message::SelectPrevious,
        KeyCode::Char('d') | KeyCode::Delete => Message::DeletePhoto(app.selected()?),
        _ => return None,
    };

    // Camera keys only act when the matching control is offered
    let offered = app.controls().iter().any(|c| c.message() == message);
    let camera_key = matches!(
        message,
        Message::StartCamera | Message::TakePhoto | Message::StopCamera | Message::SwitchCamera
    );
    if camera_key && !offered {
        debug!(?message, "Control not offered in this state");
        return None;
    }

    Some(KeyAction::Send(message))
}

fn draw(f: &mut Frame, app: &AppModel, thumbnails: &ThumbnailCache) {
    let area = f.area();
    let outer = Block::bordered().title(Span::styled(
        format!(" {APP_TITLE} "),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .split(inner);
    let columns =
        Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)]).split(rows[0]);

    draw_preview(f, app, columns[0]);
    draw_gallery(f, app, thumbnails, columns[1]);
    f.render_widget(KeyHints { app }, rows[1]);
    f.render_widget(StatusBar { app }, rows[2]);

    if let Some(notice) = app.notice() {
        draw_notice(f, &notice.message, area);
    }
}

fn draw_preview(f: &mut Frame, app: &AppModel, area: Rect) {
    let camera = app.camera();
    let title = match camera.session() {
        Some(session) => format!(" {} camera: {} ", session.facing(), session.device().name),
        None => " Camera ".to_string(),
    };
    let block = Block::bordered().title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    match camera.current_frame() {
        Some(frame) => {
            let mirror = app.config.mirror_preview && camera.facing() == Facing::Front;
            f.render_widget(HalfBlockImage { source: frame, mirror }, inner);
        }
        None if camera.is_active() => {
            f.render_widget(centered_text(ui::WAITING_FOR_CAMERA_TEXT), inner);
        }
        None => f.render_widget(centered_text(ui::CAMERA_OFF_TEXT), inner),
    }
}

fn draw_gallery(f: &mut Frame, app: &AppModel, thumbnails: &ThumbnailCache, area: Rect) {
    let photos = app.store().photos();
    let block = Block::bordered().title(format!(" {} ({}) ", ui::GALLERY_TITLE, photos.len()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if photos.is_empty() {
        f.render_widget(centered_text(ui::EMPTY_GALLERY_TEXT), inner);
        return;
    }

    let columns = (inner.width / ui::THUMBNAIL_CELL_WIDTH).max(1) as usize;
    let visible_rows = (inner.height / ui::THUMBNAIL_CELL_HEIGHT).max(1) as usize;
    let selected = app.selected();

    // Scroll so the selected row stays on screen
    let selected_row = selected.unwrap_or(0) / columns;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    for index in (first_row * columns)..photos.len() {
        let row = index / columns - first_row;
        if row >= visible_rows {
            break;
        }
        let col = index % columns;
        let cell = Rect {
            x: inner.x + col as u16 * ui::THUMBNAIL_CELL_WIDTH,
            y: inner.y + row as u16 * ui::THUMBNAIL_CELL_HEIGHT,
            width: ui::THUMBNAIL_CELL_WIDTH.min(inner.width),
            height: ui::THUMBNAIL_CELL_HEIGHT.min(inner.height),
        };

        let border_style = if selected == Some(index) {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let block = Block::bordered()
            .border_style(border_style)
            .title(format!(" {} ", index + 1));
        let thumb_area = block.inner(cell);
        f.render_widget(block, cell);

        match thumbnails.get(index) {
            Some(thumbnail) => f.render_widget(
                HalfBlockImage {
                    source: thumbnail,
                    mirror: false,
                },
                thumb_area,
            ),
            None => f.render_widget(centered_text("?"), thumb_area),
        }
    }
}

fn draw_notice(f: &mut Frame, message: &str, area: Rect) {
    let width = (message.len() as u16 + 6).min(area.width);
    let height = 5.min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let text = vec![
        Line::from(message.to_string()),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::bordered()
                .border_style(Style::default().fg(Color::Red))
                .title(" Notice "),
        );

    f.render_widget(Clear, popup);
    f.render_widget(paragraph, popup);
}

fn centered_text(text: &str) -> CenteredText<'_> {
    CenteredText { text }
}

struct CenteredText<'a> {
    text: &'a str,
}

impl Widget for CenteredText<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let len = self.text.chars().count() as u16;
        let x = area.x + area.width.saturating_sub(len) / 2;
        let y = area.y + area.height / 2;
        buf.set_stringn(x, y, self.text, area.width as usize, Style::default());
    }
}

/// Key hints reflecting the controls currently offered
struct KeyHints<'a> {
    app: &'a AppModel,
}

impl Widget for KeyHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        let mut spans = Vec::new();
        for control in self.app.controls() {
            spans.push(Span::styled(format!("[{}]", control.key_hint()), key_style));
            spans.push(Span::raw(format!(" {}  ", control.label())));
        }
        if !self.app.store().is_empty() {
            spans.push(Span::styled("[←/→]", key_style));
            spans.push(Span::raw(" select  "));
            spans.push(Span::styled("[d]", key_style));
            spans.push(Span::raw(" delete  "));
        }
        spans.push(Span::styled("[q]", key_style));
        spans.push(Span::raw(" quit"));

        Line::from(spans).render(area, buf);
    }
}

/// Status bar widget
struct StatusBar<'a> {
    app: &'a AppModel,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let message = match (self.app.status(), self.app.camera().session()) {
            (Some(status), _) => status.to_string(),
            (None, Some(session)) => format!("{} | {}", session.device().name, session.format()),
            (None, None) => format!("{} saved photos", self.app.store().len()),
        };

        // Fill background
        let style = Style::default().bg(Color::DarkGray).fg(Color::White);
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_style(style);
            }
        }
        buf.set_stringn(area.x + 1, area.y, &message, area.width.saturating_sub(2) as usize, style);
    }
}

/// Anything the half-block renderer can sample
trait PixelSource {
    fn dimensions(&self) -> (u32, u32);
    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8);
}

impl PixelSource for CameraFrame {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        sample_pixel_rgb(self, x, y)
    }
}

impl PixelSource for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbImage::dimensions(self)
    }

    fn rgb_at(&self, x: u32, y: u32) -> (u8, u8, u8) {
        let image::Rgb([r, g, b]) = *self.get_pixel(x, y);
        (r, g, b)
    }
}

/// Widget that renders an image using half-block characters
struct HalfBlockImage<'a, S: PixelSource> {
    source: &'a S,
    mirror: bool,
}

impl<S: PixelSource> Widget for HalfBlockImage<'_, S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.source.dimensions();
        if width == 0 || height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Each terminal cell displays 2 vertical pixels
        let frame_aspect = width as f64 / height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > frame_aspect {
            // Terminal is wider - fit to height
            let w = term_height * frame_aspect;
            ((w as u16).max(1), area.height)
        } else {
            // Terminal is taller - fit to width
            let h = term_width / frame_aspect;
            (area.width, ((h / 2.0) as u16).max(1))
        };

        // Center the image
        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = width as f64 / display_width as f64;
        let y_scale = height as f64 / (display_height * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = ((tx as f64 * x_scale) as u32).min(width - 1);
                let src_x = if self.mirror { width - 1 - src_x } else { src_x };
                let src_y_top = ((ty as f64 * 2.0 * y_scale) as u32).min(height - 1);
                let src_y_bottom = (((ty as f64 * 2.0 + 1.0) * y_scale) as u32).min(height - 1);

                let (r, g, b) = self.source.rgb_at(src_x, src_y_top);
                let top = Color::Rgb(r, g, b);
                let (r, g, b) = self.source.rgb_at(src_x, src_y_bottom);
                let bottom = Color::Rgb(r, g, b);

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    let x = x.min(frame.width.saturating_sub(1));
    let y = y.min(frame.height.saturating_sub(1));
    let data = frame.data_slice();

    match frame.format {
        PixelFormat::RGBA | PixelFormat::RGB24 => {
            let bpp = frame.format.bytes_per_pixel();
            let idx = (y * frame.stride + x * bpp) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            data.get(idx).map(|&v| (v, v, v)).unwrap_or((0, 0, 0))
        }
        PixelFormat::YUYV | PixelFormat::UYVY => {
            // Packed 4:2:2: two pixels share chroma
            let pair_x = (x & !1) as usize;
            let base = (y as usize) * (frame.stride as usize) + pair_x * 2;
            if base + 3 >= data.len() {
                return (0, 0, 0);
            }
            let (y0, y1, u, v) = if frame.format == PixelFormat::YUYV {
                (data[base], data[base + 2], data[base + 1], data[base + 3])
            } else {
                (data[base + 1], data[base + 3], data[base], data[base + 2])
            };
            let luma = if x & 1 == 0 { y0 } else { y1 };
            yuv_to_rgb(luma, u, v)
        }
    }
}

/// Decoded thumbnails by gallery position
///
/// Rebuilt only when the store revision changes. Thumbnails of photos that
/// survive a change are carried over instead of decoded again.
#[derive(Default)]
struct ThumbnailCache {
    revision: Option<u64>,
    keys: Vec<u64>,
    slots: Vec<Option<RgbImage>>,
}

impl ThumbnailCache {
    fn key(photo: &Photo) -> u64 {
        let mut hasher = DefaultHasher::new();
        photo.as_data_url().hash(&mut hasher);
        hasher.finish()
    }

    fn decode(photo: &Photo) -> Option<RgbImage> {
        match photo.decode_image() {
            Ok(image) => {
                let edge = ui::THUMBNAIL_PIXELS;
                Some(
                    image
                        .resize_to_fill(edge, edge, image::imageops::FilterType::Triangle)
                        .to_rgb8(),
                )
            }
            Err(e) => {
                warn!(error = %e, "Failed to decode thumbnail");
                None
            }
        }
    }

    /// Follow the store after a mutation; a no-op while it is unchanged
    fn sync(&mut self, store: &PhotoStore) {
        if self.revision == Some(store.revision()) {
            return;
        }
        self.revision = Some(store.revision());

        let mut previous: HashMap<u64, Option<RgbImage>> =
            self.keys.drain(..).zip(self.slots.drain(..)).collect();
        for photo in store.photos() {
            let key = Self::key(photo);
            let thumbnail = previous.remove(&key).unwrap_or_else(|| Self::decode(photo));
            self.keys.push(key);
            self.slots.push(thumbnail);
        }
        debug!(count = self.slots.len(), "Thumbnails synced");
    }

    fn get(&self, index: usize) -> Option<&RgbImage> {
        self.slots.get(index)?.as_ref()
    }
}
