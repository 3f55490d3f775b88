// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small synthetic PDFs for tests.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

/// Write a document with one page per content stream. `resources` builds the
/// resource dictionary, which is attached to the page tree root so pages
/// inherit it through `Parent`.
fn build(
    path: &Path,
    contents: Vec<Content>,
    resources: impl FnOnce(&mut Document) -> Dictionary,
) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let resources = resources(&mut doc);
    let resources_id = doc.add_object(resources);

    let mut kids: Vec<Object> = Vec::new();
    for content in contents {
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

/// One page per entry of `pages`, each showing that string in Courier.
pub fn text_pdf(path: &Path, pages: &[&str]) {
    let contents = pages
        .iter()
        .map(|text| Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        })
        .collect();

    build(path, contents, |doc| {
        let font = courier(doc);
        dictionary! { "Font" => dictionary! { "F1" => font } }
    });
}

fn courier(doc: &mut Document) -> Object {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    })
    .into()
}

/// One page drawing `image` one inch square at (100, 100), optionally below
/// a line of Courier text. With `in_form` the image is drawn by a Form
/// XObject rather than by the page itself.
fn single_image_page(path: &Path, caption: Option<&str>, image: Stream, in_form: bool) {
    let mut operations = Vec::new();
    if let Some(text) = caption {
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }
    let drawn = if in_form { "Fm1" } else { "Im1" };
    operations.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![72.into(), 0.into(), 0.into(), 72.into(), 100.into(), 100.into()],
        ),
        Operation::new("Do", vec![Object::Name(drawn.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]);

    build(path, vec![Content { operations }], |doc| {
        let font = courier(doc);
        let image_id = doc.add_object(image);
        let xobjects = if in_form {
            let draw = Content {
                operations: vec![Operation::new("Do", vec![Object::Name(b"Im1".to_vec())])],
            };
            let form_id = doc.add_object(Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), 1.into(), 1.into()],
                    "Resources" => dictionary! {
                        "XObject" => dictionary! { "Im1" => image_id },
                    },
                },
                draw.encode().unwrap(),
            ));
            dictionary! { "Fm1" => form_id }
        } else {
            dictionary! { "Im1" => image_id }
        };
        dictionary! {
            "Font" => dictionary! { "F1" => font },
            "XObject" => xobjects,
        }
    });
}

/// A 4×4 striped grayscale image stored uncompressed.
fn gray_stripes() -> Stream {
    let samples: Vec<u8> = (0..16).map(|i| if i % 2 == 0 { 0 } else { 255 }).collect();
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 4,
            "Height" => 4,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        samples,
    )
}

/// A single page with a 4×4 grayscale image drawn one inch square at
/// (100, 100), optionally above a line of Courier text.
pub fn image_pdf(path: &Path, caption: Option<&str>) {
    single_image_page(path, caption, gray_stripes(), false);
}

/// Like [`image_pdf`], but the image is placed by a Form XObject.
pub fn form_image_pdf(path: &Path) {
    single_image_page(path, None, gray_stripes(), true);
}

/// A scanned-fax page: an 8×8 bilevel image in CCITT Group 4. Each all-white
/// row is a single vertical-mode `V0` code, so the data is one byte of ones.
pub fn ccitt_pdf(path: &Path) {
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 8,
            "Height" => 8,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 1,
            "Filter" => "CCITTFaxDecode",
            "DecodeParms" => dictionary! { "K" => -1, "Columns" => 8, "Rows" => 8 },
        },
        vec![0xff],
    );
    single_image_page(path, None, image, false);
}

/// An image that declares far more samples than any buffer could hold.
pub fn oversized_image_pdf(path: &Path) {
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2_000_000_000i64,
            "Height" => 2_000_000_000i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        },
        vec![0u8; 12],
    );
    single_image_page(path, None, image, false);
}
