//! Page layout for ticket exports.
//!
//! Pure geometry: blocks go in, pages of positioned text and image items come
//! out. All positions are millimetres measured from the top-left corner.

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 20.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * MARGIN_MM;
pub const IMAGE_MAX_HEIGHT_MM: f32 = 100.0;

pub const TITLE_PT: f32 = 16.0;
pub const HEADING_PT: f32 = 12.0;
pub const BODY_PT: f32 = 11.0;
pub const LINE_HEIGHT: f32 = 1.4;

const PT_TO_MM: f32 = 0.352_778;
const BLOCK_GAP_MM: f32 = 5.0;
/// Pixel density assumed for embedded images
pub const IMAGE_DPI: f32 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockBody {
    /// `label: value` rows
    Fields(Vec<Field>),
    /// Free text, wrapped to the content width
    Text(String),
    Image { width_px: u32, height_px: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub heading: String,
    pub body: BlockBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub title: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Placed {
    Text {
        x_mm: f32,
        baseline_mm: f32,
        text: String,
        size_pt: f32,
        style: TextStyle,
    },
    Image {
        x_mm: f32,
        top_mm: f32,
        width_mm: f32,
        height_mm: f32,
        /// Factor applied to the image's natural size at `IMAGE_DPI`
        scale: f32,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub items: Vec<Placed>,
}

fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x2FFFD
        | 0x30000..=0x3FFFD)
}

fn glyph_width_mm(ch: char, size_pt: f32) -> f32 {
    let em = if is_cjk(ch) { 1.0 } else { 0.5 };
    em * size_pt * PT_TO_MM
}

/// Estimated rendered width of `text`
pub fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().map(|ch| glyph_width_mm(ch, size_pt)).sum()
}

pub fn line_height_mm(size_pt: f32) -> f32 {
    size_pt * LINE_HEIGHT * PT_TO_MM
}

struct LineBuilder {
    lines: Vec<String>,
    current: String,
    width: f32,
    max_width: f32,
    size_pt: f32,
}

impl LineBuilder {
    fn new(size_pt: f32, max_width: f32) -> Self {
        Self {
            lines: Vec::new(),
            current: String::new(),
            width: 0.0,
            max_width,
            size_pt,
        }
    }

    fn flush(&mut self) {
        self.lines.push(std::mem::take(&mut self.current));
        self.width = 0.0;
    }

    fn push_char(&mut self, ch: char) {
        let w = glyph_width_mm(ch, self.size_pt);
        if !self.current.is_empty() && self.width + w > self.max_width {
            self.flush();
            if ch == ' ' {
                return;
            }
        }
        self.current.push(ch);
        self.width += w;
    }

    fn push_word(&mut self, word: &str, space_before: bool) {
        let w = text_width_mm(word, self.size_pt);
        let sep = if space_before && !self.current.is_empty() {
            glyph_width_mm(' ', self.size_pt)
        } else {
            0.0
        };
        if self.current.is_empty() && w <= self.max_width {
            self.current.push_str(word);
            self.width = w;
            return;
        }
        if self.width + sep + w <= self.max_width {
            if sep > 0.0 {
                self.current.push(' ');
            }
            self.current.push_str(word);
            self.width += sep + w;
            return;
        }
        if !self.current.is_empty() {
            self.flush();
        }
        if w <= self.max_width {
            self.current.push_str(word);
            self.width = w;
        } else {
            for ch in word.chars() {
                self.push_char(ch);
            }
        }
    }

    fn wrap_paragraph(&mut self, paragraph: &str) {
        let mut word = String::new();
        let mut pending_space = false;
        for ch in paragraph.chars() {
            if ch.is_whitespace() {
                if !word.is_empty() {
                    self.push_word(&word, pending_space);
                    word.clear();
                }
                pending_space = true;
            } else if is_cjk(ch) {
                if !word.is_empty() {
                    self.push_word(&word, pending_space);
                    word.clear();
                    pending_space = false;
                }
                if pending_space && !self.current.is_empty() {
                    self.push_char(' ');
                }
                pending_space = false;
                self.push_char(ch);
            } else {
                word.push(ch);
            }
        }
        if !word.is_empty() {
            self.push_word(&word, pending_space);
        }
        self.flush();
    }
}

/// Breaks `text` into lines no wider than `max_width_mm`.
///
/// Latin text breaks on whitespace; CJK text and words longer than a full
/// line break between characters. Explicit newlines are kept.
pub fn wrap(text: &str, size_pt: f32, max_width_mm: f32) -> Vec<String> {
    let mut builder = LineBuilder::new(size_pt, max_width_mm);
    for paragraph in text.split('\n') {
        builder.wrap_paragraph(paragraph.trim_end_matches('\r'));
    }
    builder.lines
}

/// Scale factor and size fitting an image into the content width and the
/// maximum image height, never enlarging it
pub fn fit_image(width_px: u32, height_px: u32) -> Option<(f32, f32, f32)> {
    if width_px == 0 || height_px == 0 {
        return None;
    }
    let natural_w = width_px as f32 * 25.4 / IMAGE_DPI;
    let natural_h = height_px as f32 * 25.4 / IMAGE_DPI;
    let scale = (CONTENT_WIDTH_MM / natural_w)
        .min(IMAGE_MAX_HEIGHT_MM / natural_h)
        .min(1.0);
    Some((scale, natural_w * scale, natural_h * scale))
}

struct Line {
    text: String,
    size_pt: f32,
    style: TextStyle,
}

impl Line {
    fn height(&self) -> f32 {
        line_height_mm(self.size_pt)
    }
}

fn block_lines(block: &Block) -> Vec<Line> {
    let mut lines: Vec<Line> = wrap(&block.heading, HEADING_PT, CONTENT_WIDTH_MM)
        .into_iter()
        .map(|text| Line {
            text,
            size_pt: HEADING_PT,
            style: TextStyle::Bold,
        })
        .collect();
    let body = |text: String| Line {
        text,
        size_pt: BODY_PT,
        style: TextStyle::Regular,
    };
    match &block.body {
        BlockBody::Fields(fields) => {
            for field in fields {
                let row = format!("{}: {}", field.label, field.value);
                lines.extend(wrap(&row, BODY_PT, CONTENT_WIDTH_MM).into_iter().map(body));
            }
        }
        BlockBody::Text(text) => {
            lines.extend(wrap(text, BODY_PT, CONTENT_WIDTH_MM).into_iter().map(body));
        }
        BlockBody::Image { .. } => {}
    }
    lines
}

struct Cursor {
    pages: Vec<PageLayout>,
    top: f32,
}

impl Cursor {
    fn bottom_limit() -> f32 {
        PAGE_HEIGHT_MM - MARGIN_MM
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map_or(true, |page| page.items.is_empty())
    }

    fn new_page(&mut self) {
        self.pages.push(PageLayout::default());
        self.top = MARGIN_MM;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.top + height > Self::bottom_limit() && !self.page_is_empty() {
            self.new_page();
        }
    }

    fn place(&mut self, item: Placed) {
        if let Some(page) = self.pages.last_mut() {
            page.items.push(item);
        }
    }

    fn place_line(&mut self, line: Line) {
        let height = line.height();
        self.ensure_room(height);
        self.place(Placed::Text {
            x_mm: MARGIN_MM,
            baseline_mm: self.top + line.size_pt * PT_TO_MM,
            text: line.text,
            size_pt: line.size_pt,
            style: line.style,
        });
        self.top += height;
    }
}

/// Lays the document out on A4 pages. A block that would overflow the
/// current page starts on a new one; a block taller than a page flows on.
pub fn layout(document: &Document) -> Vec<PageLayout> {
    let mut cursor = Cursor {
        pages: vec![PageLayout::default()],
        top: MARGIN_MM,
    };

    for text in wrap(&document.title, TITLE_PT, CONTENT_WIDTH_MM) {
        cursor.place_line(Line {
            text,
            size_pt: TITLE_PT,
            style: TextStyle::Bold,
        });
    }

    for block in &document.blocks {
        let lines = block_lines(block);
        let image = match block.body {
            BlockBody::Image {
                width_px,
                height_px,
            } => match fit_image(width_px, height_px) {
                Some(fitted) => Some(fitted),
                None => continue,
            },
            _ => None,
        };

        let height = BLOCK_GAP_MM
            + lines.iter().map(Line::height).sum::<f32>()
            + image.map_or(0.0, |(_, _, h)| h);
        if cursor.top + height > Cursor::bottom_limit() && !cursor.page_is_empty() {
            cursor.new_page();
        } else if !cursor.page_is_empty() {
            cursor.top += BLOCK_GAP_MM;
        }

        for line in lines {
            cursor.place_line(line);
        }

        if let Some((scale, width_mm, height_mm)) = image {
            cursor.ensure_room(height_mm);
            cursor.place(Placed::Image {
                x_mm: MARGIN_MM,
                top_mm: cursor.top,
                width_mm,
                height_mm,
                scale,
            });
            cursor.top += height_mm;
        }
    }

    cursor.pages
}
