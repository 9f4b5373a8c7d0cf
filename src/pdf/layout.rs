//! 分页排版
//!
//! 把 `ReportDocument` 排成若干页的绘制指令。坐标单位为毫米，原点在页面左下角。
//! 字宽按 Helvetica 平均字宽估算，不做精确测量。

use super::document::{Align, Block, ReportDocument, Table};
use crate::config::ReportConfig;

const PT_TO_MM: f32 = 0.352_778;
// Helvetica 平均字宽约为字号的一半
const AVG_CHAR_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.45;
const CELL_PADDING_MM: f32 = 1.5;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        y: f32,
        size: f32,
        bold: bool,
        text: String,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rule { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSetup {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub font_size: f32,
}

impl PageSetup {
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 15.0,
            font_size: 10.0,
        }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        let (width, height) = match config.paper.to_ascii_lowercase().as_str() {
            "letter" => (215.9, 279.4),
            _ => (210.0, 297.0),
        };
        let (width, height) = if config.landscape {
            (height, width)
        } else {
            (width, height)
        };
        Self {
            width,
            height,
            margin: config.margin_mm.clamp(5.0, 40.0),
            font_size: config.font_size.clamp(6.0, 16.0),
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    fn line_height(&self, size: f32) -> f32 {
        size * PT_TO_MM * LINE_SPACING
    }
}

/// 按估算字宽截断文本，超出时以 `...` 结尾
pub fn fit_text(text: &str, width_mm: f32, size: f32) -> String {
    let char_width = size * PT_TO_MM * AVG_CHAR_EM;
    let capacity = (width_mm / char_width).floor().max(0.0) as usize;
    let count = text.chars().count();
    if count <= capacity {
        return text.to_string();
    }
    if capacity <= ELLIPSIS.len() {
        return ELLIPSIS.chars().take(capacity).collect();
    }
    let mut fitted: String = text.chars().take(capacity - ELLIPSIS.len()).collect();
    fitted.push_str(ELLIPSIS);
    fitted
}

// 内置字体只覆盖 Latin-1，其余字符替换为 '?'
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => ' ',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

struct Cursor<'a> {
    setup: &'a PageSetup,
    pages: Vec<Page>,
    y: f32,
}

impl<'a> Cursor<'a> {
    fn new(setup: &'a PageSetup) -> Self {
        Self {
            setup,
            pages: vec![Page::default()],
            y: setup.height - setup.margin,
        }
    }

    // 底部预留一行给页脚
    fn bottom(&self) -> f32 {
        self.setup.margin + self.setup.line_height(self.setup.font_size)
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= self.bottom()
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.setup.height - self.setup.margin;
    }

    fn ensure(&mut self, height: f32) -> bool {
        if self.fits(height) {
            return false;
        }
        self.new_page();
        true
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    fn text_line(&mut self, x: f32, size: f32, bold: bool, text: &str) {
        let height = self.setup.line_height(size);
        self.ensure(height);
        self.y -= height;
        let width = self.setup.margin + self.setup.content_width() - x;
        let text = fit_text(&printable(text), width, size);
        let y = self.y;
        self.push(DrawOp::Text {
            x,
            y,
            size,
            bold,
            text,
        });
    }

    fn rule(&mut self) {
        let (x1, x2) = (
            self.setup.margin,
            self.setup.margin + self.setup.content_width(),
        );
        let y = self.y - 1.0;
        self.push(DrawOp::Rule { x1, x2, y });
    }
}

fn column_layout(table: &Table, setup: &PageSetup) -> Vec<(f32, f32)> {
    let total: f32 = table
        .columns
        .iter()
        .map(|c| c.weight.max(0.1))
        .sum::<f32>()
        .max(0.1);
    let mut x = setup.margin;
    table
        .columns
        .iter()
        .map(|c| {
            let width = setup.content_width() * c.weight.max(0.1) / total;
            let start = x;
            x += width;
            (start, width)
        })
        .collect()
}

fn table_row(
    cursor: &mut Cursor<'_>,
    table: &Table,
    columns: &[(f32, f32)],
    cells: &[String],
    bold: bool,
) {
    let size = cursor.setup.font_size;
    cursor.y -= cursor.setup.line_height(size);
    let y = cursor.y;
    for ((column, &(x, width)), cell) in table.columns.iter().zip(columns).zip(cells) {
        let inner = (width - 2.0 * CELL_PADDING_MM).max(0.0);
        let text = fit_text(&printable(cell), inner, size);
        let x = match column.align {
            Align::Left => x + CELL_PADDING_MM,
            Align::Center => {
                let used = text.chars().count() as f32 * size * PT_TO_MM * AVG_CHAR_EM;
                x + (width - used).max(0.0) / 2.0
            }
        };
        cursor.push(DrawOp::Text {
            x,
            y,
            size,
            bold,
            text,
        });
    }
    if bold {
        cursor.rule();
    }
}

fn layout_table(cursor: &mut Cursor<'_>, table: &Table) {
    let columns = column_layout(table, cursor.setup);
    let headers: Vec<String> = table.columns.iter().map(|c| c.title.clone()).collect();
    let row_height = cursor.setup.line_height(cursor.setup.font_size);

    // 表头至少带一行数据，避免表头孤立在页尾
    cursor.ensure(row_height * 2.0 + 1.0);
    table_row(cursor, table, &columns, &headers, true);

    for row in &table.rows {
        if cursor.ensure(row_height) {
            table_row(cursor, table, &columns, &headers, true);
        }
        table_row(cursor, table, &columns, row, false);
    }
}

/// 排版整份文档
pub fn layout(doc: &ReportDocument, setup: &PageSetup) -> Vec<Page> {
    let mut cursor = Cursor::new(setup);
    let body = setup.font_size;

    cursor.text_line(setup.margin, body * 1.8, true, &doc.title);
    cursor.y -= body * PT_TO_MM;

    for block in &doc.blocks {
        match block {
            Block::Heading(text) => {
                cursor.y -= body * PT_TO_MM * 0.5;
                cursor.text_line(setup.margin, body * 1.3, true, text);
            }
            Block::Fields(pairs) => {
                let label_width = pairs
                    .iter()
                    .map(|(k, _)| k.chars().count())
                    .max()
                    .unwrap_or(0) as f32
                    * body
                    * PT_TO_MM
                    * 0.6
                    + 4.0;
                for (label, value) in pairs {
                    cursor.text_line(setup.margin, body, true, &format!("{label}:"));
                    let y = cursor.y;
                    let x = setup.margin + label_width;
                    let text = fit_text(&printable(value), setup.content_width() - label_width, body);
                    cursor.push(DrawOp::Text {
                        x,
                        y,
                        size: body,
                        bold: false,
                        text,
                    });
                }
            }
            Block::Table(table) => {
                if !table.columns.is_empty() {
                    layout_table(&mut cursor, table);
                }
            }
            Block::Text(text) => cursor.text_line(setup.margin, body, false, text),
            Block::Spacer(mm) => {
                if cursor.fits(*mm) {
                    cursor.y -= mm;
                } else {
                    cursor.new_page();
                }
            }
        }
    }

    let mut pages = cursor.pages;
    let total = pages.len();
    let footer_size = body * 0.8;
    for (index, page) in pages.iter_mut().enumerate() {
        let label = match &doc.footer {
            Some(footer) => format!("{} | Page {} of {}", printable(footer), index + 1, total),
            None => format!("Page {} of {}", index + 1, total),
        };
        page.ops.push(DrawOp::Text {
            x: setup.margin,
            y: setup.margin,
            size: footer_size,
            bold: false,
            text: fit_text(&label, setup.content_width(), footer_size),
        });
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::TableColumn;

    fn long_table(rows: usize) -> Table {
        let mut table = Table::new(vec![
            TableColumn::new("Date", 1.0),
            TableColumn::new("Status", 1.0).centered(),
        ]);
        for i in 0..rows {
            table.push_row([format!("row-{i}"), "Present".to_string()]);
        }
        table
    }

    #[test]
    fn test_fit_text() {
        assert_eq!(fit_text("short", 100.0, 10.0), "short");
        let cut = fit_text(&"x".repeat(200), 20.0, 10.0);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() < 200);
        assert_eq!(fit_text("abcdef", 0.0, 10.0), "");
    }

    #[test]
    fn test_printable_replaces_wide_chars() {
        assert_eq!(printable("Zoë 张三\t"), "Zoë ?? ");
    }

    #[test]
    fn test_page_setup_from_config() {
        let config = ReportConfig {
            paper: "Letter".to_string(),
            landscape: true,
            margin_mm: 100.0,
            font_size: 10.0,
            file_name: "Attendance Report.pdf".to_string(),
        };
        let setup = PageSetup::from_config(&config);
        assert_eq!(setup.width, 279.4);
        assert_eq!(setup.height, 215.9);
        assert_eq!(setup.margin, 40.0);
    }

    #[test]
    fn test_long_table_repeats_header_on_each_page() {
        let mut doc = ReportDocument::new("Attendance Report");
        doc.table(long_table(200));
        let pages = layout(&doc, &PageSetup::a4());
        assert!(pages.len() > 1);

        for page in &pages {
            assert!(page.texts().any(|t| t == "Date"));
        }
        let rows: usize = pages
            .iter()
            .map(|p| p.texts().filter(|t| t.starts_with("row-")).count())
            .sum();
        assert_eq!(rows, 200);

        let last = pages.len();
        assert!(
            pages[last - 1]
                .texts()
                .any(|t| t == format!("Page {last} of {last}"))
        );
    }

    #[test]
    fn test_ops_stay_inside_margins() {
        let setup = PageSetup::a4();
        let mut doc = ReportDocument::new("Attendance Report");
        let mut table = long_table(0);
        table.push_row(["y".repeat(300), "z".repeat(300)]);
        doc.fields(vec![("Student Name", "a".repeat(400))]).table(table);

        for page in layout(&doc, &setup) {
            for op in page.ops {
                if let DrawOp::Text { x, y, size, text, .. } = op {
                    let width = text.chars().count() as f32 * size * PT_TO_MM * AVG_CHAR_EM;
                    assert!(x >= setup.margin - 0.01);
                    assert!(x + width <= setup.width - setup.margin + 0.01);
                    assert!(y >= setup.margin - 0.01);
                }
            }
        }
    }
}
