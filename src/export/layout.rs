//! Page layout of a [`ReportDocument`]
//!
//! Pure geometry: positions are millimetres from the bottom-left corner, the
//! way PDF places text. The renderer only draws what this produces.

use crate::export::ReportDocument;

/// Page size, margins and type sizes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub title_size: f64,
    pub body_size: f64,
    pub line_height: f64,
}

impl PageGeometry {
    pub fn a4_portrait() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            margin: 15.0,
            title_size: 16.0,
            body_size: 8.0,
            line_height: 5.0,
        }
    }

    pub fn a4_landscape() -> Self {
        Self {
            width: 297.0,
            height: 210.0,
            ..Self::a4_portrait()
        }
    }

    /// Landscape for wide tables
    pub fn for_columns(count: usize) -> Self {
        if count > 7 {
            Self::a4_landscape()
        } else {
            Self::a4_portrait()
        }
    }

    /// Approximate average glyph width in mm at `size` points
    fn char_width(&self, size: f64) -> f64 {
        size * 0.5 * 0.3528
    }

    fn usable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Lowest baseline for body content; the footer sits below it
    fn floor(&self) -> f64 {
        self.margin + self.line_height
    }
}

/// One run of text at a fixed position
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub bold: bool,
    pub text: String,
}

/// A horizontal rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub x1: f64,
    pub x2: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub texts: Vec<TextRun>,
    pub rules: Vec<Rule>,
    /// Indexes into `ReportDocument::rows` placed on this page
    pub row_indexes: Vec<usize>,
}

/// Column widths proportional to content length, within bounds
fn column_widths(doc: &ReportDocument, geometry: &PageGeometry) -> Vec<f64> {
    let count = doc.columns.len();
    if count == 0 {
        return Vec::new();
    }
    let weights: Vec<f64> = (0..count)
        .map(|i| {
            let longest = doc
                .rows
                .iter()
                .filter_map(|r| r.get(i))
                .chain(std::iter::once(&doc.columns[i]))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0);
            longest.clamp(4, 40) as f64
        })
        .collect();
    let total: f64 = weights.iter().sum();
    weights
        .iter()
        .map(|w| geometry.usable_width() * w / total)
        .collect()
}

/// Cut `text` to fit `width` mm, marking the cut with "..."
pub fn fit(text: &str, width: f64, geometry: &PageGeometry, size: f64) -> String {
    let max_chars = (width / geometry.char_width(size)).floor().max(1.0) as usize;
    let single_line = text.replace(['\n', '\r', '\t'], " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    if max_chars <= 3 {
        return single_line.chars().take(max_chars).collect();
    }
    let mut cut: String = single_line.chars().take(max_chars - 3).collect();
    cut.push_str("...");
    cut
}

/// Lay the document out over as many pages as needed. The table header is
/// repeated on every page and every page gets a "page i of n" footer.
pub fn layout(doc: &ReportDocument, geometry: &PageGeometry) -> Vec<PageLayout> {
    let g = geometry;
    let widths = column_widths(doc, g);
    let left = g.margin;
    let right = g.width - g.margin;

    let mut pages = vec![PageLayout::default()];
    let mut y = g.height - g.margin;

    let title = fit(&doc.title, g.usable_width(), g, g.title_size);
    pages[0].texts.push(TextRun {
        x: left,
        y,
        size: g.title_size,
        bold: true,
        text: title,
    });
    y -= g.line_height * 2.0;

    for (label, value) in &doc.meta {
        if y < g.floor() {
            pages.push(PageLayout::default());
            y = g.height - g.margin;
        }
        let line = fit(&format!("{}: {}", label, value), g.usable_width(), g, g.body_size);
        if let Some(page) = pages.last_mut() {
            page.texts.push(TextRun {
                x: left,
                y,
                size: g.body_size,
                bold: false,
                text: line,
            });
        }
        y -= g.line_height;
    }

    if !doc.columns.is_empty() {
        y -= g.line_height;

        let header = |page: &mut PageLayout, y: f64| {
            let mut x = left;
            for (column, width) in doc.columns.iter().zip(&widths) {
                page.texts.push(TextRun {
                    x,
                    y,
                    size: g.body_size,
                    bold: true,
                    text: fit(column, width - 1.0, g, g.body_size),
                });
                x += width;
            }
            page.rules.push(Rule {
                x1: left,
                x2: right,
                y: y - 1.5,
            });
        };

        // Header plus at least one row must fit, otherwise start fresh
        if y - g.line_height < g.floor() {
            pages.push(PageLayout::default());
            y = g.height - g.margin;
        }
        if let Some(page) = pages.last_mut() {
            header(page, y);
        }
        y -= g.line_height;

        if doc.rows.is_empty() {
            if let Some(page) = pages.last_mut() {
                page.texts.push(TextRun {
                    x: left,
                    y,
                    size: g.body_size,
                    bold: false,
                    text: "No records".to_string(),
                });
            }
        }

        for (index, row) in doc.rows.iter().enumerate() {
            if y < g.floor() {
                pages.push(PageLayout::default());
                y = g.height - g.margin;
                if let Some(page) = pages.last_mut() {
                    header(page, y);
                }
                y -= g.line_height;
            }
            let Some(page) = pages.last_mut() else {
                break;
            };
            let mut x = left;
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                if !cell.is_empty() {
                    page.texts.push(TextRun {
                        x,
                        y,
                        size: g.body_size,
                        bold: false,
                        text: fit(cell, width - 1.0, g, g.body_size),
                    });
                }
                x += width;
            }
            page.row_indexes.push(index);
            y -= g.line_height;
        }
    }

    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        page.texts.push(TextRun {
            x: left,
            y: g.margin - g.line_height,
            size: g.body_size,
            bold: false,
            text: fit(
                &format!("{} - page {} of {}", doc.title, i + 1, total),
                g.usable_width(),
                g,
                g.body_size,
            ),
        });
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_rows(n: usize) -> ReportDocument {
        let mut doc = ReportDocument::new("Welders")
            .meta("Total", n)
            .columns(&["Name", "Cert", "Repair rate"]);
        for i in 0..n {
            doc.row(vec![format!("Welder {}", i), format!("W-{:03}", i), "2.0%".to_string()]);
        }
        doc
    }

    #[test]
    fn test_single_page() {
        let pages = layout(&doc_with_rows(3), &PageGeometry::a4_portrait());
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].row_indexes, vec![0, 1, 2]);
        assert!(pages[0].texts.iter().any(|t| t.text == "Welders - page 1 of 1"));
    }

    #[test]
    fn test_rows_break_across_pages() {
        let g = PageGeometry::a4_portrait();
        let pages = layout(&doc_with_rows(150), &g);
        assert!(pages.len() > 1);

        // Every row placed exactly once, in order
        let placed: Vec<usize> = pages.iter().flat_map(|p| p.row_indexes.clone()).collect();
        assert_eq!(placed, (0..150).collect::<Vec<_>>());

        for page in &pages {
            assert!(page.texts.iter().any(|t| t.bold && t.text == "Name"));
            assert!(page
                .texts
                .iter()
                .filter(|t| !t.text.contains("page"))
                .all(|t| t.y >= g.floor() - 1e-9 && t.y <= g.height - g.margin + 1e-9));
        }
    }

    #[test]
    fn test_empty_table_says_so() {
        let pages = layout(&doc_with_rows(0), &PageGeometry::a4_portrait());
        assert!(pages[0].texts.iter().any(|t| t.text == "No records"));
    }

    #[test]
    fn test_fit_truncates() {
        let g = PageGeometry::a4_portrait();
        let long = "x".repeat(500);
        let fitted = fit(&long, 20.0, &g, 8.0);
        assert!(fitted.ends_with("..."));
        assert!(fitted.chars().count() < 500);
        assert_eq!(fit("short", 20.0, &g, 8.0), "short");
    }

    #[test]
    fn test_wide_tables_use_landscape() {
        assert_eq!(PageGeometry::for_columns(14).width, 297.0);
        assert_eq!(PageGeometry::for_columns(3).width, 210.0);
    }
}
