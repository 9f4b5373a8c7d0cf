use printpdf::{BuiltinFont, Line, Mm, PdfDocument, Point};

use super::layout::{DrawOp, Page, PageSetup};
use crate::errors::{AttendanceError, Result};

const LAYER_NAME: &str = "Layer 1";

/// 将排好的页面写成 PDF 字节
pub fn render_pdf(title: &str, pages: &[Page], setup: &PageSetup) -> Result<Vec<u8>> {
    if pages.is_empty() {
        return Err(AttendanceError::report_render("Document has no pages"));
    }

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(setup.width), Mm(setup.height), LAYER_NAME);
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(Mm(setup.width), Mm(setup.height), LAYER_NAME)
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        layer.set_outline_thickness(0.4);

        for op in &page.ops {
            match op {
                DrawOp::Text {
                    x,
                    y,
                    size,
                    bold: is_bold,
                    text,
                } => {
                    let font = if *is_bold { &bold } else { &regular };
                    layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), font);
                }
                DrawOp::Rule { x1, x2, y } => {
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(*x1), Mm(*y)), false),
                            (Point::new(Mm(*x2), Mm(*y)), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    Ok(doc.save_to_bytes()?)
}
