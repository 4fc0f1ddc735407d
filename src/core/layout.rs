// 版面座標單位為公釐，原點在 A4 頁面左上角

use crate::domain::model::{ContentBlock, ReportDocument, ReportSection, SectionKind, Table};

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
pub const SIDE_MARGIN_MM: f32 = 10.0;
pub const BOTTOM_MARGIN_MM: f32 = 20.0;
pub const CONTENT_WIDTH_MM: f32 = PAGE_WIDTH_MM - 2.0 * SIDE_MARGIN_MM;

const PT_TO_MM: f32 = 0.352_778;
const HEADER_TOP_MM: f32 = 25.0;
const HEADER_LINE_MM: f32 = 10.0;
const CONTENT_TOP_MM: f32 = HEADER_TOP_MM + HEADER_LINE_MM + 10.0;

const TABLE_FONT_PT: f32 = 8.0;
const TABLE_LINE_MM: f32 = 4.0;
const CELL_PADDING_MM: f32 = 1.5;
const MIN_COLUMN_CHARS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb8(pub u8, pub u8, pub u8);

pub const BLACK: Rgb8 = Rgb8(0, 0, 0);
pub const DARK_PURPLE: Rgb8 = Rgb8(102, 0, 204);
pub const LIGHT_PURPLE: Rgb8 = Rgb8(153, 102, 255);
pub const LIGHT_GREY: Rgb8 = Rgb8(211, 211, 211);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Baseline, from the top of the page.
    pub baseline: f32,
    pub size_pt: f32,
    pub style: FontStyle,
    pub color: Rgb8,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextRun),
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
    FillRect { x: f32, y: f32, w: f32, h: f32, color: Rgb8 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub ops: Vec<DrawOp>,
}

impl LaidOutPage {
    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct TextStyle {
    size_pt: f32,
    style: FontStyle,
    color: Rgb8,
    line_mm: f32,
}

const SECTION_TITLE: TextStyle = TextStyle {
    size_pt: 12.0,
    style: FontStyle::Bold,
    color: LIGHT_PURPLE,
    line_mm: 10.0,
};

const BODY: TextStyle = TextStyle {
    size_pt: 10.0,
    style: FontStyle::Regular,
    color: BLACK,
    line_mm: 5.5,
};

const DISCLAIMER: TextStyle = TextStyle {
    size_pt: 8.0,
    style: FontStyle::Italic,
    color: BLACK,
    line_mm: 4.5,
};

pub fn layout_document(document: &ReportDocument) -> Vec<LaidOutPage> {
    let mut layout = PageLayout::new(&document.title);
    for section in &document.sections {
        layout.section(section);
    }
    layout.finish()
}

struct PageLayout {
    title: String,
    pages: Vec<LaidOutPage>,
    y: f32,
}

impl PageLayout {
    fn new(title: &str) -> Self {
        let mut layout = Self {
            title: normalize_text(title),
            pages: Vec::new(),
            y: 0.0,
        };
        layout.new_page();
        layout
    }

    fn finish(self) -> Vec<LaidOutPage> {
        self.pages
    }

    fn page(&mut self) -> &mut LaidOutPage {
        // new() 一定先開一頁
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(LaidOutPage::default());
        let size_pt = 16.0;
        let width = text_width_mm(&self.title, size_pt, FontStyle::Bold);
        let x = SIDE_MARGIN_MM + ((CONTENT_WIDTH_MM - width) / 2.0).max(0.0);
        let baseline = HEADER_TOP_MM + baseline_offset(HEADER_LINE_MM, size_pt);
        let title = self.title.clone();
        self.page().ops.push(DrawOp::Text(TextRun {
            x,
            baseline,
            size_pt,
            style: FontStyle::Bold,
            color: DARK_PURPLE,
            text: title,
        }));
        self.y = CONTENT_TOP_MM;
    }

    fn remaining(&self) -> f32 {
        PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM - self.y
    }

    fn ensure_space(&mut self, height: f32) {
        if height > self.remaining() {
            self.new_page();
        }
    }

    fn advance(&mut self, mm: f32) {
        self.y += mm;
    }

    fn section(&mut self, section: &ReportSection) {
        let (title_style, body_style) = match section.kind {
            SectionKind::Standard => (SECTION_TITLE, BODY),
            SectionKind::Disclaimer => (
                TextStyle {
                    line_mm: 10.0,
                    ..DISCLAIMER
                },
                DISCLAIMER,
            ),
        };

        self.text_line(&section.title, title_style);
        self.advance(3.0);

        for block in &section.blocks {
            match block {
                ContentBlock::Paragraph(text) => {
                    self.paragraph(text, body_style);
                    self.advance(5.0);
                }
                ContentBlock::Table(table) => {
                    self.table(table);
                    self.advance(10.0);
                }
            }
        }
        self.advance(5.0);
    }

    fn text_line(&mut self, text: &str, style: TextStyle) {
        self.ensure_space(style.line_mm);
        let baseline = self.y + baseline_offset(style.line_mm, style.size_pt);
        self.page().ops.push(DrawOp::Text(TextRun {
            x: SIDE_MARGIN_MM,
            baseline,
            size_pt: style.size_pt,
            style: style.style,
            color: style.color,
            text: normalize_text(text),
        }));
        self.advance(style.line_mm);
    }

    fn paragraph(&mut self, text: &str, style: TextStyle) {
        for source_line in text.lines() {
            let wrapped = wrap_text(source_line, CONTENT_WIDTH_MM, style.size_pt, style.style);
            if wrapped.is_empty() {
                // 空白行保留段落間距
                self.advance(style.line_mm);
                continue;
            }
            for line in wrapped {
                self.text_line(&line, style);
            }
        }
    }

    fn table(&mut self, table: &Table) {
        let widths = column_widths(table, CONTENT_WIDTH_MM);
        let header = self.layout_row(&table.header, &widths, FontStyle::Bold);
        self.ensure_space(header.height);
        self.draw_row(&header, &widths, Some(LIGHT_GREY));

        // 一列高於整頁時，拆成多段分頁繪製
        let usable = PAGE_HEIGHT_MM - BOTTOM_MARGIN_MM - CONTENT_TOP_MM - header.height;
        let max_lines = (((usable - 2.0 * CELL_PADDING_MM) / TABLE_LINE_MM).floor() as usize).max(1);

        for row in &table.rows {
            let row = self.layout_row(row, &widths, FontStyle::Regular);
            for part in row.split(max_lines) {
                if part.height > self.remaining() {
                    self.new_page();
                    self.draw_row(&header, &widths, Some(LIGHT_GREY));
                }
                self.draw_row(&part, &widths, None);
            }
        }
    }

    fn layout_row(&self, cells: &[String], widths: &[f32], style: FontStyle) -> RowLayout {
        let lines: Vec<Vec<String>> = cells
            .iter()
            .zip(widths)
            .map(|(cell, w)| wrap_text(cell, w - 2.0 * CELL_PADDING_MM, TABLE_FONT_PT, style))
            .collect();
        let max_lines = lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
        RowLayout {
            lines,
            style,
            height: max_lines as f32 * TABLE_LINE_MM + 2.0 * CELL_PADDING_MM,
        }
    }

    fn draw_row(&mut self, row: &RowLayout, widths: &[f32], fill: Option<Rgb8>) {
        let top = self.y;
        let bottom = top + row.height;
        let left = SIDE_MARGIN_MM;
        let right = left + widths.iter().sum::<f32>();
        let mut ops = Vec::new();

        if let Some(color) = fill {
            ops.push(DrawOp::FillRect {
                x: left,
                y: top,
                w: right - left,
                h: row.height,
                color,
            });
        }

        let mut x = left;
        for (cell_lines, width) in row.lines.iter().zip(widths) {
            for (i, line) in cell_lines.iter().enumerate() {
                let line_width = text_width_mm(line, TABLE_FONT_PT, row.style);
                let line_top = top + CELL_PADDING_MM + i as f32 * TABLE_LINE_MM;
                ops.push(DrawOp::Text(TextRun {
                    x: x + ((width - line_width) / 2.0).max(CELL_PADDING_MM),
                    baseline: line_top + baseline_offset(TABLE_LINE_MM, TABLE_FONT_PT),
                    size_pt: TABLE_FONT_PT,
                    style: row.style,
                    color: BLACK,
                    text: line.clone(),
                }));
            }
            ops.push(DrawOp::Line {
                x1: x,
                y1: top,
                x2: x,
                y2: bottom,
            });
            x += width;
        }

        ops.push(DrawOp::Line { x1: right, y1: top, x2: right, y2: bottom });
        ops.push(DrawOp::Line { x1: left, y1: top, x2: right, y2: top });
        ops.push(DrawOp::Line { x1: left, y1: bottom, x2: right, y2: bottom });

        self.page().ops.extend(ops);
        self.y = bottom;
    }
}

struct RowLayout {
    lines: Vec<Vec<String>>,
    style: FontStyle,
    height: f32,
}

impl RowLayout {
    fn split(self, max_lines: usize) -> Vec<RowLayout> {
        let tallest = self.lines.iter().map(Vec::len).max().unwrap_or(0);
        if tallest <= max_lines {
            return vec![self];
        }
        (0..tallest)
            .step_by(max_lines)
            .map(|start| {
                let lines: Vec<Vec<String>> = self
                    .lines
                    .iter()
                    .map(|cell| cell.iter().skip(start).take(max_lines).cloned().collect())
                    .collect();
                let count = lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
                RowLayout {
                    lines,
                    style: self.style,
                    height: count as f32 * TABLE_LINE_MM + 2.0 * CELL_PADDING_MM,
                }
            })
            .collect()
    }
}

fn baseline_offset(line_mm: f32, size_pt: f32) -> f32 {
    // 文字在行高中垂直置中，基線約在字高的 0.75 處
    let glyph = size_pt * PT_TO_MM;
    (line_mm - glyph) / 2.0 + glyph * 0.75
}

/// Column widths proportional to each column's longest cell, scaled to `total`.
pub fn column_widths(table: &Table, total: f32) -> Vec<f32> {
    let natural: Vec<usize> = (0..table.column_count())
        .map(|col| {
            std::iter::once(&table.header)
                .chain(table.rows.iter())
                .map(|row| row[col].chars().count())
                .max()
                .unwrap_or(0)
                .max(MIN_COLUMN_CHARS)
        })
        .collect();
    let sum: usize = natural.iter().sum();
    if sum == 0 {
        return Vec::new();
    }
    natural
        .iter()
        .map(|&n| total * n as f32 / sum as f32)
        .collect()
}

/// Approximate Helvetica advance width in em units.
fn char_width_em(ch: char, style: FontStyle) -> f32 {
    let base = match ch {
        'i' | 'j' | 'l' | '.' | ',' | '\'' | '|' | '!' | ':' | ';' => 0.25,
        'f' | 't' | 'r' | 'I' | ' ' | '(' | ')' | '[' | ']' | '-' | '/' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.85,
        'A'..='Z' => 0.68,
        '0'..='9' | '$' => 0.556,
        _ => 0.53,
    };
    match style {
        FontStyle::Bold | FontStyle::BoldItalic => base * 1.06,
        _ => base,
    }
}

pub fn text_width_mm(text: &str, size_pt: f32, style: FontStyle) -> f32 {
    text.chars().map(|c| char_width_em(c, style)).sum::<f32>() * size_pt * PT_TO_MM
}

/// Greedy word wrap. Words wider than `width` are split across lines.
pub fn wrap_text(text: &str, width: f32, size_pt: f32, style: FontStyle) -> Vec<String> {
    let text = normalize_text(text);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if text_width_mm(&candidate, size_pt, style) <= width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if text_width_mm(word, size_pt, style) <= width {
            current = word.to_string();
        } else {
            for ch in word.chars() {
                let mut next = current.clone();
                next.push(ch);
                if !current.is_empty() && text_width_mm(&next, size_pt, style) > width {
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                } else {
                    current = next;
                }
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// 內建字型只支援 Latin-1，先把常見的排版符號換成 ASCII
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{2013}' | '\u{2014}' | '\u{2212}' => '-',
            '\u{2022}' | '\u{25CF}' => '*',
            '\u{00A0}' | '\u{2009}' | '\u{202F}' => ' ',
            '\t' => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}
