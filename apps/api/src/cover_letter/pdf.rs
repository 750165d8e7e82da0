//! Serializes a [`CoverLetter`] to PDF with lopdf.
//!
//! Text uses the base-14 Helvetica fonts with WinAnsiEncoding, so nothing is
//! embedded. Lines are positioned with whole-point coordinates; a paragraph
//! that runs past the bottom margin continues on a new page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::cover_letter::document::{CoverLetter, ParagraphStyle};
use crate::cover_letter::RenderError;
use crate::layout::{get_metrics, PageConfig, StandardFont};

struct StyleSpec {
    font: StandardFont,
    size_pt: i64,
    leading_pt: f32,
    space_after_pt: f32,
    centered: bool,
}

fn style_spec(style: ParagraphStyle) -> StyleSpec {
    match style {
        ParagraphStyle::Title => StyleSpec {
            font: StandardFont::HelveticaBold,
            size_pt: 16,
            leading_pt: 19.0,
            space_after_pt: 12.0,
            centered: true,
        },
        ParagraphStyle::Heading => StyleSpec {
            font: StandardFont::HelveticaBold,
            size_pt: 14,
            leading_pt: 17.0,
            space_after_pt: 6.0,
            centered: false,
        },
        ParagraphStyle::Normal => StyleSpec {
            font: StandardFont::Helvetica,
            size_pt: 10,
            leading_pt: 12.0,
            space_after_pt: 8.0,
            centered: false,
        },
    }
}

/// Accumulates positioned text runs, one operation list per page.
struct PageWriter {
    config: PageConfig,
    pages: Vec<Vec<Operation>>,
    cursor_y: f32,
}

impl PageWriter {
    fn new(config: PageConfig) -> Self {
        Self {
            config,
            pages: vec![Vec::new()],
            cursor_y: config.height_pt - config.margin_top_pt,
        }
    }

    fn advance(&mut self, leading: f32) -> f32 {
        if self.cursor_y - leading < self.config.margin_bottom_pt {
            self.pages.push(Vec::new());
            self.cursor_y = self.config.height_pt - self.config.margin_top_pt;
        }
        self.cursor_y -= leading;
        self.cursor_y
    }

    fn skip(&mut self, points: f32) {
        self.cursor_y = (self.cursor_y - points).max(self.config.margin_bottom_pt);
    }

    fn text_line(&mut self, spec: &StyleSpec, text: &str) {
        let baseline = self.advance(spec.leading_pt);
        if text.is_empty() {
            return;
        }
        let mut x = self.config.margin_left_pt;
        if spec.centered {
            let width = get_metrics(spec.font).measure_str(text, spec.size_pt as f32);
            x += ((self.config.text_width_pt() - width) / 2.0).max(0.0);
        }
        if let Some(ops) = self.pages.last_mut() {
            ops.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![
                        Object::Name(spec.font.resource_name().as_bytes().to_vec()),
                        Object::Integer(spec.size_pt),
                    ],
                ),
                Operation::new(
                    "Td",
                    vec![
                        Object::Integer(x.round() as i64),
                        Object::Integer(baseline.round() as i64),
                    ],
                ),
                Operation::new(
                    "Tj",
                    vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ]);
        }
    }
}

/// Lays out every section and writes a complete PDF document.
pub fn write_pdf(letter: &CoverLetter, config: &PageConfig) -> Result<Vec<u8>, RenderError> {
    let mut writer = PageWriter::new(*config);
    let text_width = config.text_width_pt();

    for section in &letter.sections {
        for paragraph in &section.paragraphs {
            let spec = style_spec(paragraph.style);
            let metrics = get_metrics(spec.font);
            for line in &paragraph.lines {
                let wrapped = metrics.wrap(line, spec.size_pt as f32, text_width);
                if wrapped.is_empty() {
                    writer.text_line(&spec, "");
                }
                for part in &wrapped {
                    writer.text_line(&spec, part);
                }
            }
            writer.skip(spec.space_after_pt);
        }
        writer.skip(section.spacing_after_pt);
    }

    assemble(writer.pages, config)
}

fn assemble(pages: Vec<Vec<Operation>>, config: &PageConfig) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for font in [StandardFont::Helvetica, StandardFont::HelveticaBold] {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(config.width_pt.round() as i64),
                Object::Integer(config.height_pt.round() as i64),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(buffer)
}

/// Maps text to WinAnsiEncoding bytes. Characters without a WinAnsi code
/// become `?`; control characters are dropped.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            ' '..='~' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}
