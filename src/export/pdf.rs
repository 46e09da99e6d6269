//! PDF rendering of laid-out pages with the built-in Helvetica faces

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{BuiltinFont, Line, Mm, PdfDocument, Point};

use crate::export::layout::{layout, PageGeometry};
use crate::export::{ExportError, ReportDocument};

fn pdf_err(e: printpdf::Error) -> ExportError {
    ExportError::Pdf(e.to_string())
}

/// Built-in fonts only cover Latin-1
fn latin1(text: &str) -> String {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c } else { '?' })
        .collect()
}

pub(crate) fn render(doc: &ReportDocument, path: &Path) -> Result<(), ExportError> {
    let geometry = PageGeometry::for_columns(doc.columns.len());
    let pages = layout(doc, &geometry);
    let (width, height) = (Mm(geometry.width as f32), Mm(geometry.height as f32));

    let (pdf, first_page, first_layer) = PdfDocument::new(latin1(&doc.title), width, height, "Layer 1");
    let regular = pdf.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = pdf.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

    for (i, page) in pages.iter().enumerate() {
        let (page_index, layer_index) = if i == 0 {
            (first_page, first_layer)
        } else {
            pdf.add_page(width, height, "Layer 1")
        };
        let layer = pdf.get_page(page_index).get_layer(layer_index);

        for run in &page.texts {
            let font = if run.bold { &bold } else { &regular };
            layer.use_text(
                latin1(&run.text),
                run.size as f32,
                Mm(run.x as f32),
                Mm(run.y as f32),
                font,
            );
        }

        layer.set_outline_thickness(0.5);
        for rule in &page.rules {
            layer.add_line(Line {
                points: vec![
                    (Point::new(Mm(rule.x1 as f32), Mm(rule.y as f32)), false),
                    (Point::new(Mm(rule.x2 as f32), Mm(rule.y as f32)), false),
                ],
                is_closed: false,
            });
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    pdf.save(&mut writer).map_err(pdf_err)?;
    tracing::debug!(pages = pages.len(), path = %path.display(), "rendered PDF");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_replaces_wide_chars() {
        assert_eq!(latin1("DFT 75 µm, 21 °C"), "DFT 75 µm, 21 °C");
        assert_eq!(latin1("弱 weld"), "? weld");
    }
}
