//! Assembly of page scans into a PDF with uniform A4 pages.
//!
//! Scans come in whatever pixel size the viewer renders, often small. Every
//! page is therefore given a fixed 210×297 mm media box and the image is
//! fitted inside it, keeping its aspect ratio and centring it.
//!
//! JPEG scans are embedded byte-for-byte (`DCTDecode`) with the colour space
//! their frame header declares. PNG scans are decoded and stored as
//! Flate-compressed samples at their own bit depth, so no page is re-encoded
//! lossily. PNG alpha channels are dropped; scans are opaque.

mod error;

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{ColorType, DynamicImage, ImageDecoder, ImageFormat};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{debug, instrument, warn};

pub use error::PdfError;

/// A4 width in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;
/// A4 height in millimetres.
pub const A4_HEIGHT_MM: f32 = 297.0;

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const PRODUCER: &str = concat!("elibrary ", env!("CARGO_PKG_VERSION"));

/// Raster formats accepted as page scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    /// JPEG, embedded verbatim.
    Jpeg,
    /// PNG, decoded and re-compressed losslessly.
    Png,
}

/// Identifies a page scan by its leading magic bytes.
#[must_use]
pub fn detect_page_format(bytes: &[u8]) -> Option<PageFormat> {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => Some(PageFormat::Jpeg),
        Ok(ImageFormat::Png) => Some(PageFormat::Png),
        _ => None,
    }
}

/// Converts millimetres to PDF points.
#[must_use]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

/// Placement of an image on a page, in points: `(x, y, width, height)`.
///
/// The image is scaled up or down to fit the page and centred.
#[must_use]
pub fn fit_into_page(
    image_width: u32,
    image_height: u32,
    page_width: f32,
    page_height: f32,
) -> (f32, f32, f32, f32) {
    if image_width == 0 || image_height == 0 {
        return (0.0, 0.0, page_width, page_height);
    }
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (image_width as f32, image_height as f32);
    let scale = (page_width / w).min(page_height / h);
    let (fitted_w, fitted_h) = (w * scale, h * scale);
    (
        (page_width - fitted_w) / 2.0,
        (page_height - fitted_h) / 2.0,
        fitted_w,
        fitted_h,
    )
}

/// Assembles page scans, in order, into one PDF document.
///
/// An empty slice produces a single blank A4 page.
///
/// # Errors
///
/// - [`PdfError::UnsupportedImage`] when a page is neither JPEG nor PNG
/// - [`PdfError::Decode`] when a page cannot be decoded
/// - [`PdfError::Serialize`] when the document cannot be written
#[instrument(skip(pages), fields(pages = pages.len()))]
pub fn assemble(pages: &[Vec<u8>], title: Option<&str>) -> Result<Vec<u8>, PdfError> {
    let page_width = mm_to_pt(A4_WIDTH_MM);
    let page_height = mm_to_pt(A4_HEIGHT_MM);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len().max(1));

    for (index, bytes) in pages.iter().enumerate() {
        let image = embed_image(index, bytes)?;
        let (x, y, w, h) = fit_into_page(image.width, image.height, page_width, page_height);
        let image_id = doc.add_object(image.stream);
        let content = format!("q\n{w:.4} 0 0 {h:.4} {x:.4} {y:.4} cm\n/Im0 Do\nQ\n");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(page_width, page_height),
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        kids.push(page_id.into());
        debug!(page = index, width = image.width, height = image.height, "page placed");
    }

    if kids.is_empty() {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(page_width, page_height),
            "Resources" => Dictionary::new(),
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = info_dictionary(&mut doc, title);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|source| PdfError::Serialize { source })?;
    debug!(bytes = output.len(), "PDF serialised");
    Ok(output)
}

struct EmbeddedImage {
    stream: Stream,
    width: u32,
    height: u32,
}

fn embed_image(page: usize, bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
    match detect_page_format(bytes) {
        Some(PageFormat::Jpeg) => embed_jpeg(page, bytes),
        Some(PageFormat::Png) => embed_png(page, bytes),
        None => Err(PdfError::UnsupportedImage {
            page,
            len: bytes.len(),
        }),
    }
}

/// Frame facts read from the marker segments of a JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JpegLayout {
    width: u32,
    height: u32,
    components: u8,
    /// An Adobe APP14 segment is present; its CMYK samples are stored inverted.
    adobe: bool,
}

/// Walks the markers up to the first scan, collecting the frame header and
/// the Adobe segment. Returns `None` for a truncated or malformed header.
fn jpeg_layout(bytes: &[u8]) -> Option<JpegLayout> {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut frame = None;
    let mut adobe = false;
    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return None;
        }
        let marker = bytes[pos + 1];
        match marker {
            // fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xD9 | 0xDA => break,
            _ => {}
        }
        let len = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        let segment = bytes.get(pos + 4..pos + 2 + len)?;
        match marker {
            0xC4 | 0xC8 | 0xCC => {}
            0xC0..=0xCF => {
                let &[_, h0, h1, w0, w1, components, ..] = segment else {
                    return None;
                };
                frame = Some((
                    u32::from(u16::from_be_bytes([w0, w1])),
                    u32::from(u16::from_be_bytes([h0, h1])),
                    components,
                ));
            }
            0xEE => adobe |= segment.starts_with(b"Adobe"),
            _ => {}
        }
        pos += 2 + len;
    }
    let (width, height, components) = frame?;
    (width > 0 && height > 0).then_some(JpegLayout {
        width,
        height,
        components,
        adobe,
    })
}

fn decoded_jpeg_layout(page: usize, bytes: &[u8]) -> Result<JpegLayout, PdfError> {
    let decoder =
        JpegDecoder::new(Cursor::new(bytes)).map_err(|source| PdfError::Decode { page, source })?;
    let (width, height) = decoder.dimensions();
    let components = match decoder.color_type() {
        ColorType::L8 | ColorType::L16 => 1,
        _ => 3,
    };
    Ok(JpegLayout {
        width,
        height,
        components,
        adobe: false,
    })
}

fn embed_jpeg(page: usize, bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
    let layout = match jpeg_layout(bytes) {
        Some(layout) => layout,
        None => decoded_jpeg_layout(page, bytes)?,
    };
    let color_space = match layout.components {
        1 => "DeviceGray",
        4 => "DeviceCMYK",
        _ => "DeviceRGB",
    };
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(layout.width),
        "Height" => i64::from(layout.height),
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    if layout.components == 4 && layout.adobe {
        let decode: Vec<Object> = [1, 0, 1, 0, 1, 0, 1, 0]
            .into_iter()
            .map(Object::Integer)
            .collect();
        dict.set("Decode", decode);
    }
    let stream = Stream::new(dict, bytes.to_vec()).with_compression(false);
    Ok(EmbeddedImage {
        stream,
        width: layout.width,
        height: layout.height,
    })
}

fn embed_png(page: usize, bytes: &[u8]) -> Result<EmbeddedImage, PdfError> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|source| PdfError::Decode { page, source })?;
    let (width, height) = (decoded.width(), decoded.height());
    let (color_space, bits, samples) = match &decoded {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageLumaA8(_) => {
            ("DeviceGray", 8_i64, decoded.to_luma8().into_raw())
        }
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            ("DeviceGray", 16, big_endian(&decoded.to_luma16().into_raw()))
        }
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            ("DeviceRGB", 16, big_endian(&decoded.to_rgb16().into_raw()))
        }
        _ => ("DeviceRGB", 8, decoded.to_rgb8().into_raw()),
    };
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(width),
            "Height" => i64::from(height),
            "ColorSpace" => color_space,
            "BitsPerComponent" => bits,
        },
        samples,
    );
    if let Err(error) = stream.compress() {
        warn!(page, %error, "storing PNG samples uncompressed");
    }
    Ok(EmbeddedImage {
        stream,
        width,
        height,
    })
}

/// 16-bit PDF samples are big-endian.
fn big_endian(samples: &[u16]) -> Vec<u8> {
    samples.iter().flat_map(|sample| sample.to_be_bytes()).collect()
}

fn media_box(width: f32, height: f32) -> Vec<Object> {
    vec![0.into(), 0.into(), width.into(), height.into()]
}

fn info_dictionary(doc: &mut Document, title: Option<&str>) -> ObjectId {
    let mut info = dictionary! {
        "Producer" => text_string(PRODUCER),
    };
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        info.set("Title", text_string(title));
    }
    doc.add_object(info)
}

/// PDF text string: literal for ASCII, UTF-16BE with byte order mark otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
