//! Flyer assembly
//!
//! Builds the A4 flyer document with lopdf:
//!
//! 1. Embed the cropped map and the two QR codes as Image XObjects
//! 2. Draw the header block (title, subtitle, info lines, info QR)
//! 3. Draw the map with the event link and its QR beside it
//! 4. Lay out the sorted, numbered address list in columns, overflowing
//!    onto bare continuation pages when it outgrows the first page

use std::fs;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use tracing::{info, warn};

use crate::error::RenderError;
use crate::image::EmbeddedImage;
use crate::layout::{address_slots, AddressLayout, A4_HEIGHT, A4_WIDTH};
use crate::qr;
use crate::text::win_ansi;

const TITLE_POS: (f32, f32) = (90.0, 770.0);
const SUBTITLE_POS: (f32, f32) = (90.0, 750.0);
const INFO_START_Y: f32 = 730.0;
const INFO_LINE_STEP: f32 = 20.0;
const INFO_QR_RECT: (f32, f32, f32, f32) = (450.0, 700.0, 70.0, 70.0);
const MAP_POS: (f32, f32) = (90.0, 430.0);
const LINK_TEXT_POS: (f32, f32) = (300.0, 410.0);
const LINK_QR_RECT: (f32, f32, f32, f32) = (370.0, 400.0, 170.0, 170.0);

const TITLE_SIZE: i64 = 28;
const BODY_SIZE: i64 = 10;

/// Everything the flyer page needs, already fetched and decoded.
#[derive(Debug, Clone)]
pub struct Flyer {
    pub title: String,
    pub subtitle: String,
    pub info_lines: Vec<String>,
    /// Link shown as a QR in the top right corner.
    pub info_link: String,
    /// Event short link, printed next to the map with its own QR.
    pub short_link: String,
    pub map: EmbeddedImage,
    pub map_width_pt: f32,
    pub map_height_pt: f32,
    pub addresses: Vec<String>,
    /// Address drawn bold in the list, if it occurs.
    pub highlight: Option<String>,
    pub layout: AddressLayout,
}

impl Flyer {
    /// Render the flyer to PDF bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RenderError> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(base_font("Helvetica"));
        let bold_id = doc.add_object(base_font("Helvetica-Bold"));

        let map_id = doc.add_object(self.map.to_xobject()?);
        let info_qr = EmbeddedImage::from_png(&qr::qr_png(&self.info_link)?)?;
        let link_qr = EmbeddedImage::from_png(&qr::qr_png(&self.short_link)?)?;
        let info_qr_id = doc.add_object(info_qr.to_xobject()?);
        let link_qr_id = doc.add_object(link_qr.to_xobject()?);

        let mut fonts = Dictionary::new();
        fonts.set("F1", Object::Reference(regular_id));
        fonts.set("F2", Object::Reference(bold_id));
        let mut xobjects = Dictionary::new();
        xobjects.set("ImMap", Object::Reference(map_id));
        xobjects.set("ImQrInfo", Object::Reference(info_qr_id));
        xobjects.set("ImQrLink", Object::Reference(link_qr_id));
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        resources.set("XObject", Object::Dictionary(xobjects));
        let resources_id = doc.add_object(resources);

        // Sorting is the assembler's job; extraction preserves document order
        let mut addresses: Vec<&str> = self.addresses.iter().map(String::as_str).collect();
        addresses.sort_unstable();

        let slots = address_slots(&self.layout, addresses.len());
        let page_count = slots.iter().map(|s| s.page + 1).max().unwrap_or(1);
        if page_count > 1 {
            warn!(
                continuation_pages = page_count - 1,
                addresses = addresses.len(),
                "Address list overflows the first page"
            );
        }

        let mut page_ops: Vec<Vec<Operation>> = vec![Vec::new(); page_count];
        self.header_ops(&mut page_ops[0]);

        for (index, (slot, address)) in slots.iter().zip(&addresses).enumerate() {
            let bold = self.highlight.as_deref() == Some(*address);
            let font = if bold { "F2" } else { "F1" };
            let line = format!("{:02}. {}", index + 1, address);
            push_text(&mut page_ops[slot.page], font, BODY_SIZE, slot.x, slot.y, &line);
        }

        let mut page_ids = Vec::new();
        for ops in page_ops {
            let content = Content { operations: ops };
            let encoded = content
                .encode()
                .map_err(|e| RenderError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Real(0.0),
                        Object::Real(0.0),
                        Object::Real(A4_WIDTH),
                        Object::Real(A4_HEIGHT),
                    ]),
                ),
                ("Resources", Object::Reference(resources_id)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", Object::Reference(catalog_id));

        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| RenderError::Pdf(format!("Save failed: {}", e)))?;
        Ok(buffer)
    }

    /// Render and write the flyer to `path`.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        let bytes = self.to_bytes()?;
        fs::write(path, bytes)?;
        info!(path = %path.display(), "PDF created");
        Ok(())
    }

    fn header_ops(&self, ops: &mut Vec<Operation>) {
        push_text(ops, "F2", TITLE_SIZE, TITLE_POS.0, TITLE_POS.1, &self.title);
        push_text(ops, "F2", BODY_SIZE, SUBTITLE_POS.0, SUBTITLE_POS.1, &self.subtitle);
        for (i, line) in self.info_lines.iter().enumerate() {
            let y = INFO_START_Y - i as f32 * INFO_LINE_STEP;
            push_text(ops, "F1", BODY_SIZE, SUBTITLE_POS.0, y, line);
        }
        push_image(ops, "ImQrInfo", INFO_QR_RECT);

        push_image(
            ops,
            "ImMap",
            (MAP_POS.0, MAP_POS.1, self.map_width_pt, self.map_height_pt),
        );
        push_text(
            ops,
            "F1",
            BODY_SIZE,
            LINK_TEXT_POS.0,
            LINK_TEXT_POS.1,
            &self.short_link,
        );
        push_image(ops, "ImQrLink", LINK_QR_RECT);
    }
}

fn base_font(name: &str) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(name.as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ])
}

fn push_text(ops: &mut Vec<Operation>, font: &str, size: i64, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Real(x), Object::Real(y)],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn push_image(ops: &mut Vec<Operation>, name: &str, rect: (f32, f32, f32, f32)) {
    let (x, y, width, height) = rect;
    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            Object::Real(width),
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(height),
            Object::Real(x),
            Object::Real(y),
        ],
    ));
    ops.push(Operation::new(
        "Do",
        vec![Object::Name(name.as_bytes().to_vec())],
    ));
    ops.push(Operation::new("Q", vec![]));
}
