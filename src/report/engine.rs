//! PDF rendering engine.
//!
//! Paginates a [`ReportDocument`] onto A4 pages and writes the result with
//! `lopdf`. Every page repeats the document header and footer; a table that
//! spills over a page boundary repeats its header row.

use std::sync::OnceLock;

use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use super::font::{encode_win_ansi, text_width, wrap_text, FontFace};
use super::layout::{Block, ColumnWidth, HeaderLine, ReportDocument, Table};
use super::RenderError;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;

const LINE_SPACING: f32 = 1.25;
const ASCENT: f32 = 0.93;
const BODY_SIZE: f32 = 11.0;
const HEADING_SIZE: f32 = 14.0;
const TABLE_SIZE: f32 = 10.0;
const FOOTER_SIZE: f32 = 10.0;
const CONTENT_PADDING: f32 = 20.0;
const SECTION_GAP: f32 = 15.0;
const TABLE_GAP: f32 = 10.0;
const FIELD_INDENT: f32 = 10.0;
const CELL_PADDING: f32 = 5.0;
const HEADER_RULE_GAP: f32 = 10.0;

const HEADER_FILL: f32 = 0.878;
const TOTAL_FILL: f32 = 0.933;

const PRODUCER: &str = concat!("relatorio-veiculo-server ", env!("CARGO_PKG_VERSION"));
const DOCUMENT_TITLE: &str = "Relatório de Veículo";

/// Process-wide engine options, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Outline the content area of every page in red.
    pub debug_layout: bool,
    /// Flate-compress page content streams.
    pub compress: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            debug_layout: false,
            compress: true,
        }
    }
}

static SETTINGS: OnceLock<EngineSettings> = OnceLock::new();

/// Install the global engine settings. Returns `false` if they were already set.
pub fn configure(settings: EngineSettings) -> bool {
    SETTINGS.set(settings).is_ok()
}

/// Global engine settings, or the defaults if [`configure`] was never called.
pub fn settings() -> &'static EngineSettings {
    SETTINGS.get_or_init(EngineSettings::default)
}

#[derive(Debug, Clone, Default)]
pub struct PdfRenderEngine {
    settings: EngineSettings,
}

impl PdfRenderEngine {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    /// Engine using the process-wide settings.
    pub fn from_global() -> Self {
        Self::new(settings().clone())
    }

    /// Render `document` to PDF bytes. `generated_at` becomes the document's
    /// creation date, so equal inputs produce equal output.
    pub fn render(
        &self,
        document: &ReportDocument,
        generated_at: NaiveDateTime,
    ) -> Result<Vec<u8>, RenderError> {
        let chrome = PageChrome::prepare(document)?;
        let mut composer = Composer::new(&chrome, self.settings.debug_layout)?;

        for block in &document.body {
            composer.place(block)?;
        }

        let pages = composer.finish();
        log::debug!("Report laid out on {} page(s)", pages.len());

        self.write(pages, generated_at)
    }

    fn write(
        &self,
        pages: Vec<Canvas>,
        generated_at: NaiveDateTime,
    ) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font_dictionary(FontFace::Regular));
        let bold_id = doc.add_object(font_dictionary(FontFace::Bold));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FontFace::Regular.resource_name() => regular_id,
                FontFace::Bold.resource_name() => bold_id,
            },
        });

        let mut kids = Vec::with_capacity(pages.len());
        for canvas in pages {
            let content = Content {
                operations: canvas.ops,
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH),
                Object::Real(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(DOCUMENT_TITLE), StringFormat::Literal),
            "Producer" => Object::string_literal(PRODUCER),
            "CreationDate" => Object::string_literal(
                format!("D:{}", generated_at.format("%Y%m%d%H%M%S"))
            ),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        if self.settings.compress {
            doc.compress();
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn font_dictionary(face: FontFace) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn face_of(bold: bool) -> FontFace {
    if bold {
        FontFace::Bold
    } else {
        FontFace::Regular
    }
}

fn line_height(size: f32) -> f32 {
    size * LINE_SPACING
}

/// Content operations for one page.
#[derive(Default)]
struct Canvas {
    ops: Vec<Operation>,
}

impl Canvas {
    /// Draw one line of text whose line box starts at `top`.
    fn text(&mut self, x: f32, top: f32, face: FontFace, size: f32, text: &str) {
        if text.is_empty() {
            return;
        }
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(face.resource_name().as_bytes().to_vec()),
                Object::Real(size),
            ],
        ));
        self.ops.push(Operation::new(
            "Td",
            vec![Object::Real(x), Object::Real(top - size * ASCENT)],
        ));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn centered_text(&mut self, top: f32, face: FontFace, size: f32, text: &str) {
        let x = MARGIN + (CONTENT_WIDTH - text_width(text, face, size)) / 2.0;
        self.text(x, top, face, size, text);
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        self.ops.push(Operation::new("w", vec![Object::Real(width)]));
        self.ops.push(Operation::new("m", vec![Object::Real(x1), Object::Real(y1)]));
        self.ops.push(Operation::new("l", vec![Object::Real(x2), Object::Real(y2)]));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn rect_operands(x: f32, y: f32, w: f32, h: f32) -> Vec<Object> {
        vec![
            Object::Real(x),
            Object::Real(y),
            Object::Real(w),
            Object::Real(h),
        ]
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, gray: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("g", vec![Object::Real(gray)]));
        self.ops.push(Operation::new("re", Self::rect_operands(x, y, w, h)));
        self.ops.push(Operation::new("f", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32) {
        self.ops.push(Operation::new("w", vec![Object::Real(width)]));
        self.ops.push(Operation::new("re", Self::rect_operands(x, y, w, h)));
        self.ops.push(Operation::new("S", vec![]));
    }

    fn debug_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "RG",
            vec![Object::Real(1.0), Object::Real(0.0), Object::Real(0.0)],
        ));
        self.stroke_rect(x, y, w, h, 0.5);
        self.ops.push(Operation::new("Q", vec![]));
    }
}

/// Header and footer, wrapped once and stamped onto every page.
struct PageChrome {
    header: Vec<(HeaderLine, Vec<String>)>,
    header_height: f32,
    footer: String,
}

impl PageChrome {
    fn prepare(document: &ReportDocument) -> Result<Self, RenderError> {
        let mut height = 0.0;
        let mut header = Vec::with_capacity(document.header.len());

        for line in &document.header {
            let lines = wrap_text(&line.text, face_of(line.bold), line.size, CONTENT_WIDTH);
            height += line.padding_top + lines.len() as f32 * line_height(line.size);
            header.push((line.clone(), lines));
        }
        height += HEADER_RULE_GAP;

        let footer_width = text_width(&document.footer, FontFace::Regular, FOOTER_SIZE);
        if footer_width > CONTENT_WIDTH {
            return Err(RenderError::Layout(format!(
                "rodapé com {:.0}pt excede a largura útil de {:.0}pt",
                footer_width, CONTENT_WIDTH
            )));
        }

        Ok(Self {
            header,
            header_height: height,
            footer: document.footer.clone(),
        })
    }

    fn content_top(&self) -> f32 {
        PAGE_HEIGHT - MARGIN - self.header_height - CONTENT_PADDING
    }

    fn content_bottom(&self) -> f32 {
        MARGIN + line_height(FOOTER_SIZE) + CONTENT_PADDING
    }

    fn draw(&self, canvas: &mut Canvas) {
        let mut y = PAGE_HEIGHT - MARGIN;
        for (line, wrapped) in &self.header {
            y -= line.padding_top;
            for text in wrapped {
                canvas.centered_text(y, face_of(line.bold), line.size, text);
                y -= line_height(line.size);
            }
        }
        y -= HEADER_RULE_GAP;
        canvas.line(MARGIN, y, PAGE_WIDTH - MARGIN, y, 1.0);

        canvas.centered_text(
            MARGIN + line_height(FOOTER_SIZE),
            FontFace::Regular,
            FOOTER_SIZE,
            &self.footer,
        );
    }
}

/// A table row with its cells already wrapped to their column widths.
struct PreparedRow {
    cells: Vec<Vec<String>>,
    height: f32,
    face: FontFace,
    fill: Option<f32>,
}

/// Flows body blocks down the page, breaking to a new page when needed.
struct Composer<'a> {
    chrome: &'a PageChrome,
    debug_layout: bool,
    finished: Vec<Canvas>,
    current: Canvas,
    cursor: f32,
    top: f32,
    bottom: f32,
}

impl<'a> Composer<'a> {
    fn new(chrome: &'a PageChrome, debug_layout: bool) -> Result<Self, RenderError> {
        let top = chrome.content_top();
        let bottom = chrome.content_bottom();
        if top - bottom < line_height(HEADING_SIZE) {
            return Err(RenderError::Layout(
                "cabeçalho não deixa espaço para o conteúdo da página".to_string(),
            ));
        }

        let mut composer = Self {
            chrome,
            debug_layout,
            finished: Vec::new(),
            current: Canvas::default(),
            cursor: top,
            top,
            bottom,
        };
        composer.decorate();
        Ok(composer)
    }

    fn decorate(&mut self) {
        self.chrome.draw(&mut self.current);
        if self.debug_layout {
            self.current
                .debug_rect(MARGIN, self.bottom, CONTENT_WIDTH, self.top - self.bottom);
        }
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.finished.push(page);
        self.cursor = self.top;
        self.decorate();
        log::debug!("Starting page {}", self.finished.len() + 1);
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= self.top
    }

    fn capacity(&self) -> f32 {
        self.top - self.bottom
    }

    /// Make room for `height` points, breaking the page if necessary.
    fn ensure(&mut self, height: f32) -> Result<(), RenderError> {
        if height > self.capacity() {
            return Err(RenderError::Layout(format!(
                "bloco com {:.0}pt não cabe em uma página ({:.0}pt disponíveis)",
                height,
                self.capacity()
            )));
        }
        if self.cursor - height < self.bottom {
            self.new_page();
        }
        Ok(())
    }

    fn place(&mut self, block: &Block) -> Result<(), RenderError> {
        match block {
            Block::Heading(text) => self.heading(text),
            Block::Field { label, value } => self.field(label, value),
            Block::Table(table) => self.table(table),
        }
    }

    fn heading(&mut self, text: &str) -> Result<(), RenderError> {
        let lines = wrap_text(text, FontFace::Bold, HEADING_SIZE, CONTENT_WIDTH);
        let height = lines.len() as f32 * line_height(HEADING_SIZE);

        self.ensure(SECTION_GAP + height)?;
        if !self.at_page_top() {
            self.cursor -= SECTION_GAP;
        }
        for line in &lines {
            self.current
                .text(MARGIN, self.cursor, FontFace::Bold, HEADING_SIZE, line);
            self.cursor -= line_height(HEADING_SIZE);
        }
        Ok(())
    }

    fn field(&mut self, label: &str, value: &str) -> Result<(), RenderError> {
        let text = format!("{}: {}", label, value);
        let width = CONTENT_WIDTH - FIELD_INDENT;

        for line in wrap_text(&text, FontFace::Regular, BODY_SIZE, width) {
            self.ensure(line_height(BODY_SIZE))?;
            self.current.text(
                MARGIN + FIELD_INDENT,
                self.cursor,
                FontFace::Regular,
                BODY_SIZE,
                &line,
            );
            self.cursor -= line_height(BODY_SIZE);
        }
        Ok(())
    }

    fn table(&mut self, table: &Table) -> Result<(), RenderError> {
        let widths = resolve_columns(&table.columns)?;

        let header = prepare_row(&table.header, &widths, FontFace::Bold, Some(HEADER_FILL))?;
        let mut body = Vec::with_capacity(table.rows.len() + 1);
        for row in &table.rows {
            body.push(prepare_row(row, &widths, FontFace::Regular, None)?);
        }
        body.push(prepare_row(&table.total, &widths, FontFace::Bold, Some(TOTAL_FILL))?);

        let first = body.first().map_or(0.0, |row| row.height);
        self.ensure(TABLE_GAP + header.height + first)?;
        if !self.at_page_top() {
            self.cursor -= TABLE_GAP;
        }
        self.draw_row(&header, &widths);

        for row in &body {
            if header.height + row.height > self.capacity() {
                return Err(RenderError::Layout(format!(
                    "linha da tabela com {:.0}pt excede a altura útil da página",
                    row.height
                )));
            }
            if self.cursor - row.height < self.bottom {
                self.new_page();
                self.draw_row(&header, &widths);
            }
            self.draw_row(row, &widths);
        }
        Ok(())
    }

    fn draw_row(&mut self, row: &PreparedRow, widths: &[f32]) {
        let bottom = self.cursor - row.height;

        if let Some(gray) = row.fill {
            let mut x = MARGIN;
            for width in widths {
                self.current.fill_rect(x, bottom, *width, row.height, gray);
                x += width;
            }
        }

        let mut x = MARGIN;
        for (cell, width) in row.cells.iter().zip(widths) {
            self.current.stroke_rect(x, bottom, *width, row.height, 1.0);
            let mut top = self.cursor - CELL_PADDING;
            for line in cell {
                self.current
                    .text(x + CELL_PADDING, top, row.face, TABLE_SIZE, line);
                top -= line_height(TABLE_SIZE);
            }
            x += width;
        }

        self.cursor = bottom;
    }

    fn finish(mut self) -> Vec<Canvas> {
        self.finished.push(self.current);
        self.finished
    }
}

/// Turn column specs into absolute widths spanning the content width.
fn resolve_columns(columns: &[ColumnWidth]) -> Result<Vec<f32>, RenderError> {
    let fixed: f32 = columns
        .iter()
        .map(|c| match c {
            ColumnWidth::Constant(w) => *w,
            ColumnWidth::Relative(_) => 0.0,
        })
        .sum();
    let shares: f32 = columns
        .iter()
        .map(|c| match c {
            ColumnWidth::Relative(s) => *s,
            ColumnWidth::Constant(_) => 0.0,
        })
        .sum();
    let remaining = CONTENT_WIDTH - fixed;

    if remaining < 0.0 || (shares > 0.0 && remaining < 2.0 * CELL_PADDING + TABLE_SIZE) {
        return Err(RenderError::Layout(format!(
            "colunas fixas somam {:.0}pt e excedem a largura útil de {:.0}pt",
            fixed, CONTENT_WIDTH
        )));
    }

    Ok(columns
        .iter()
        .map(|c| match c {
            ColumnWidth::Constant(w) => *w,
            ColumnWidth::Relative(s) => remaining * s / shares,
        })
        .collect())
}

fn prepare_row(
    cells: &[String],
    widths: &[f32],
    face: FontFace,
    fill: Option<f32>,
) -> Result<PreparedRow, RenderError> {
    if cells.len() != widths.len() {
        return Err(RenderError::Layout(format!(
            "linha com {} células para {} colunas",
            cells.len(),
            widths.len()
        )));
    }

    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap_text(cell, face, TABLE_SIZE, width - 2.0 * CELL_PADDING))
        .collect();
    let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);

    Ok(PreparedRow {
        cells: wrapped,
        height: lines as f32 * line_height(TABLE_SIZE) + 2.0 * CELL_PADDING,
        face,
        fill,
    })
}
