//! Fit every page of a document onto a new page size.
//!
//! Each page's content is wrapped in a `q <matrix> cm ... Q` pair that scales
//! it uniformly to the largest size fitting the target box and centers it.
//! The media box is replaced and the other page boxes are dropped, since they
//! are expressed in the old coordinate space.

use std::path::Path;

use bookrelease_shared::{BookReleaseError, PageSize, Result};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::{info, instrument};

const STALE_BOXES: [&[u8]; 4] = [b"CropBox", b"BleedBox", b"TrimBox", b"ArtBox"];

/// Affine placement of an old page onto the target page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

/// Width and height of the new media box. A page shown turned a quarter
/// (`/Rotate` 90 or 270) keeps its rotation, so its unrotated box is the
/// target on its side.
fn target_box(target: PageSize, rotate: i64) -> (f64, f64) {
    let (w, h) = (target.width_pt(), target.height_pt());
    if rotate.rem_euclid(180) == 90 { (h, w) } else { (w, h) }
}

impl Placement {
    /// Uniform scale-to-fit of `media_box` (`[llx, lly, urx, ury]`) into `target`.
    pub fn fit(media_box: [f64; 4], target: PageSize) -> Self {
        Self::fit_rotated(media_box, target, 0)
    }

    /// Like [`Placement::fit`] for a page carrying `/Rotate rotate`.
    pub fn fit_rotated(media_box: [f64; 4], target: PageSize, rotate: i64) -> Self {
        let [llx, lly, urx, ury] = media_box;
        let (w, h) = (urx - llx, ury - lly);
        let (tw, th) = target_box(target, rotate);
        let scale = (tw / w).min(th / h);
        Self {
            scale,
            tx: (tw - w * scale) / 2.0 - llx * scale,
            ty: (th - h * scale) / 2.0 - lly * scale,
        }
    }

    fn prologue(&self) -> Vec<u8> {
        format!(
            "q {s:.6} 0 0 {s:.6} {tx:.4} {ty:.4} cm\n",
            s = self.scale,
            tx = self.tx,
            ty = self.ty
        )
        .into_bytes()
    }
}

/// Rescale every page of `input` to `target` and write the result to `output`.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display(), target = %target))]
pub fn rescale_pdf(input: &Path, output: &Path, target: PageSize) -> Result<()> {
    let mut doc = crate::load(input)?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in &page_ids {
        rescale_page(&mut doc, *page_id, target).map_err(|e| {
            BookReleaseError::Pdf(format!("page {page_id:?} of {}: {e}", input.display()))
        })?;
    }

    crate::save(&mut doc, output)?;
    info!(pages = page_ids.len(), "rescaled document");
    Ok(())
}

fn rescale_page(doc: &mut Document, page_id: ObjectId, target: PageSize) -> lopdf::Result<()> {
    let media_box = media_box(doc, page_id)?;
    let rotate = match inherited(doc, page_id, b"Rotate")? {
        Some(value) => number(value)? as i64,
        None => 0,
    };
    let placement = Placement::fit_rotated(media_box, target, rotate);
    let (width, height) = target_box(target, rotate);

    let mut contents = vec![];
    if let Ok(existing) = doc.get_dictionary(page_id)?.get(b"Contents") {
        match existing {
            Object::Reference(id) => match doc.get_object(*id)? {
                Object::Array(items) => contents.extend(items.iter().cloned()),
                _ => contents.push(existing.clone()),
            },
            Object::Array(items) => contents.extend(items.iter().cloned()),
            other => contents.push(other.clone()),
        }
    }

    let open_id = doc.add_object(Stream::new(dictionary! {}, placement.prologue()));
    let close_id = doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
    contents.insert(0, Object::Reference(open_id));
    contents.push(Object::Reference(close_id));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", Object::Array(contents));
    page.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width as _),
            Object::Real(height as _),
        ]),
    );
    for key in STALE_BOXES {
        page.remove(key);
    }
    Ok(())
}

/// A page attribute, resolved and following `Parent` links when inherited.
fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> lopdf::Result<Option<&'a Object>> {
    let mut current = page_id;
    loop {
        let dict = doc.get_dictionary(current)?;
        if let Ok(value) = dict.get(key) {
            return match value {
                Object::Reference(id) => doc.get_object(*id).map(Some),
                other => Ok(Some(other)),
            };
        }
        match dict.get(b"Parent") {
            Ok(parent) => current = parent.as_reference()?,
            Err(_) => return Ok(None),
        }
    }
}

/// The page's media box.
fn media_box(doc: &Document, page_id: ObjectId) -> lopdf::Result<[f64; 4]> {
    let value = inherited(doc, page_id, b"MediaBox")?
        .ok_or(lopdf::Error::ObjectNotFound(page_id))?;
    let items = value.as_array()?;
    let mut rect = [0.0; 4];
    if items.len() != 4 {
        return Err(lopdf::Error::ObjectNotFound(page_id));
    }
    for (slot, item) in rect.iter_mut().zip(items) {
        *slot = number(item)?;
    }
    Ok(rect)
}

fn number(object: &Object) -> lopdf::Result<f64> {
    match object {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(*r as f64),
        _ => object.as_i64().map(|i| i as f64),
    }
}
