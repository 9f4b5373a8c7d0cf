//! PDF 报表渲染
//!
//! `document` 描述报表内容，`layout` 负责分页，`render` 交给 printpdf 输出。

pub mod document;
pub mod layout;
pub mod render;

pub use document::{Align, Block, ReportDocument, Table, TableColumn};
pub use layout::{PageSetup, layout};
pub use render::render_pdf;

use crate::errors::Result;

/// 排版并渲染为 PDF 字节
pub fn render_report(doc: &ReportDocument, setup: &PageSetup) -> Result<Vec<u8>> {
    let pages = layout(doc, setup);
    render_pdf(&doc.title, &pages, setup)
}
