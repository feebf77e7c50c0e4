use base64::{prelude::BASE64_STANDARD, Engine};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::application::glyphs::{glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use crate::domain::{
    damage::{DamageRecord, DamageType},
    errors::{DomainError, DomainResult},
};

const JPEG_QUALITY: u8 = 90;
const BOX_THICKNESS: i32 = 2;

#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub base64: String,
}

fn color_for(damage_type: DamageType) -> Rgb<u8> {
    match damage_type {
        DamageType::Retak => Rgb([230, 57, 70]),
        DamageType::Penyok => Rgb([244, 162, 97]),
        DamageType::PecahKaca => Rgb([69, 123, 157]),
        DamageType::LampuRusak => Rgb([233, 196, 106]),
        DamageType::Goresan => Rgb([42, 157, 143]),
        DamageType::BanKempes => Rgb([131, 56, 236]),
    }
}

/// Dibuja cajas y etiquetas sobre una copia RGB de la imagen y la devuelve como
/// JPEG en base64. Sin registros, devuelve la imagen sin anotar.
pub fn render(image: &DynamicImage, records: &[DamageRecord]) -> DomainResult<RenderedImage> {
    let mut canvas = image.to_rgb8();
    let (w, h) = canvas.dimensions();

    for record in records {
        draw_record(&mut canvas, record);
    }

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder
        .encode_image(&canvas)
        .map_err(|e| DomainError::OperationFailed(format!("jpeg: {e}")))?;

    Ok(RenderedImage {
        content_type: "image/jpeg",
        width: w,
        height: h,
        base64: BASE64_STANDARD.encode(buf),
    })
}

fn draw_record(canvas: &mut RgbImage, record: &DamageRecord) {
    let (w, h) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let color = color_for(record.damage_type);

    let x1 = record.bbox.x1.clamp(0.0, (w - 1) as f32) as i32;
    let y1 = record.bbox.y1.clamp(0.0, (h - 1) as f32) as i32;
    let x2 = record.bbox.x2.clamp(0.0, (w - 1) as f32) as i32;
    let y2 = record.bbox.y2.clamp(0.0, (h - 1) as f32) as i32;

    for t in 0..BOX_THICKNESS {
        let bw = (x2 - x1 - 2 * t + 1).max(1) as u32;
        let bh = (y2 - y1 - 2 * t + 1).max(1) as u32;
        draw_hollow_rect_mut(canvas, Rect::at(x1 + t, y1 + t).of_size(bw, bh), color);
    }

    let text = format!("{} {:.0}%", record.damage_type.label(), record.confidence * 100.0);
    let scale: u32 = if w >= 480 { 2 } else { 1 };
    let tab_w = text.chars().count() as u32 * (GLYPH_WIDTH + 1) * scale + 4;
    let tab_h = GLYPH_HEIGHT * scale + 4;
    // La pestaña va encima de la caja si cabe, si no por dentro.
    let tab_y = if y1 >= tab_h as i32 { y1 - tab_h as i32 } else { y1 };

    draw_filled_rect_mut(canvas, Rect::at(x1, tab_y).of_size(tab_w, tab_h), color);
    draw_text(canvas, &text, x1 + 2, tab_y + 2, scale, Rgb([255, 255, 255]));
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let (w, h) = canvas.dimensions();
    let advance = ((GLYPH_WIDTH + 1) * scale) as i32;

    for (i, ch) in text.chars().enumerate() {
        let gx = x + i as i32 * advance;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let px = gx + (col * scale + dx) as i32;
                        let py = y + (row as u32 * scale + dy) as i32;
                        if px >= 0 && py >= 0 && (px as u32) < w && (py as u32) < h {
                            canvas.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
    }
}
