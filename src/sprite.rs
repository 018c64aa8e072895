//! Pokemon artwork decoded for the kitty graphics protocol

use std::io::Cursor;

use base64::{engine::general_purpose, Engine as _};
use image::{GenericImageView, ImageFormat};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Longest edge, in pixels, artwork is scaled down to before encoding.
pub const SPRITE_MAX_EDGE: u32 = 160;
/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: f32 = 2.0;
const CHUNK_SIZE: usize = 4096;

/// Base64 PNG plus its pixel size
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpriteData {
    pub payload: String,
    pub width: u32,
    pub height: u32,
}

pub fn decode_sprite(bytes: &[u8]) -> Result<SpriteData, String> {
    let image = image::load_from_memory(bytes).map_err(|err| err.to_string())?;
    let image = if image.width() > SPRITE_MAX_EDGE || image.height() > SPRITE_MAX_EDGE {
        image.thumbnail(SPRITE_MAX_EDGE, SPRITE_MAX_EDGE)
    } else {
        image
    };
    let (width, height) = image.dimensions();
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|err| err.to_string())?;
    Ok(SpriteData {
        payload: general_purpose::STANDARD.encode(&png),
        width,
        height,
    })
}

/// Escape sequence that places `sprite` over `cols` x `rows` cells.
pub fn kitty_sequence(sprite: &SpriteData, cols: u16, rows: u16) -> Result<String, String> {
    let mut sequences = String::new();
    let payload = sprite.payload.as_bytes();
    let total_chunks = payload.len().div_ceil(CHUNK_SIZE);

    for (index, chunk) in payload.chunks(CHUNK_SIZE).enumerate() {
        let more = u8::from(index + 1 < total_chunks);
        let chunk = std::str::from_utf8(chunk).map_err(|err| err.to_string())?;
        if index == 0 {
            let mut params = format!(
                "f=100,s={},v={},a=T,t=d,i=1",
                sprite.width, sprite.height
            );
            if cols > 0 {
                params.push_str(&format!(",c={cols}"));
            }
            if rows > 0 {
                params.push_str(&format!(",r={rows}"));
            }
            sequences.push_str(&format!("\x1b_G{params},m={more};{chunk}\x1b\\"));
        } else {
            sequences.push_str(&format!("\x1b_Gm={more};{chunk}\x1b\\"));
        }
    }
    Ok(sequences)
}

/// Largest cell box inside `max_cols` x `max_rows` that keeps the
/// sprite's aspect ratio.
pub fn sprite_fit(sprite: &SpriteData, max_cols: u16, max_rows: u16) -> (u16, u16) {
    if max_cols == 0 || max_rows == 0 || sprite.height == 0 {
        return (max_cols, max_rows);
    }
    let image_ratio = sprite.width as f32 / sprite.height as f32;
    let cols_for_max_rows = image_ratio * max_rows as f32 * CELL_ASPECT;
    if cols_for_max_rows <= max_cols as f32 {
        let cols = cols_for_max_rows.max(1.0).round() as u16;
        return (cols.max(1), max_rows);
    }
    let rows = (max_cols as f32 / (image_ratio * CELL_ASPECT)).max(1.0).round() as u16;
    (max_cols, rows.clamp(1, max_rows))
}
