//! Test images. The fake vision service treats a pure black image as
//! containing no face; any other colour has exactly one.
#![allow(dead_code)]

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;

pub const FACE: [u8; 3] = [224, 172, 105];
pub const NO_FACE: [u8; 3] = [0, 0, 0];
pub const SWAPPED: [u8; 3] = [120, 60, 200];
pub const GENERATED: [u8; 3] = [30, 144, 255];

/// Encode a small solid-colour PNG.
pub fn png(color: [u8; 3]) -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(8, 8, Rgb(color));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .expect("encoding a PNG in memory cannot fail");
    buf.into_inner()
}

pub fn png_base64(color: [u8; 3]) -> String {
    STANDARD.encode(png(color))
}

/// Colour of the top-left pixel of an encoded image.
pub fn dominant_color(bytes: &[u8]) -> [u8; 3] {
    let img = image::load_from_memory(bytes).expect("fixture image should decode").to_rgb8();
    img.get_pixel(0, 0).0
}

pub fn test_image_body(callback_url: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "test_sonucu": "You are remarkably tidy",
        "test_adı": "How tidy are you",
        "test_aciklamasi": "A test measuring tidiness",
        "gender": "Female",
        "age": 31,
        "image_place": "kitchen",
        "image_style": "bright stock photo",
        "source_face_image_base64": png_base64(FACE),
    });
    if let Some(url) = callback_url {
        body["callback_url"] = serde_json::Value::String(url.to_string());
    }
    body
}

pub fn face_swap_body(target: [u8; 3], callback_url: Option<&str>) -> serde_json::Value {
    let mut body = serde_json::json!({
        "source_image_base64": png_base64(FACE),
        "target_image_base64": png_base64(target),
    });
    if let Some(url) = callback_url {
        body["callback_url"] = serde_json::Value::String(url.to_string());
    }
    body
}
