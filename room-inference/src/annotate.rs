use image::{DynamicImage, Rgba};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::types::RoomRecord;

pub const BOX_COLOR: Rgba<u8> = Rgba([0, 255, 0, 255]);
pub const LABEL_COLOR: Rgba<u8> = Rgba([255, 0, 0, 255]);

const BOX_THICKNESS: u32 = 2;
const LABEL_SCALE: u32 = 2;
/// Gap between the label baseline and the top of the room box
const LABEL_OFFSET: i32 = 10;

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

/// Copy the image and overlay every room's box and label
pub fn annotate_rooms(image: &DynamicImage, rooms: &[RoomRecord]) -> DynamicImage {
    let mut canvas = image.clone();
    for room in rooms {
        draw_room(&mut canvas, room);
    }
    canvas
}

/// Draw one room's rectangle and `Room N` label in place
pub fn draw_room(canvas: &mut DynamicImage, room: &RoomRecord) {
    let bbox = room.bounding_box;
    let x = bbox.x1 as i32;
    let y = bbox.y1 as i32;

    // The far edge is drawn on x2/y2 itself, matching a closed rectangle
    for t in 0..BOX_THICKNESS {
        let w = (bbox.width() + 1).saturating_sub(2 * t);
        let h = (bbox.height() + 1).saturating_sub(2 * t);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at(x + t as i32, y + t as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, BOX_COLOR);
    }

    let label = format!("Room {}", room.id);
    let text_top = y - LABEL_OFFSET - (GLYPH_HEIGHT * LABEL_SCALE) as i32;
    draw_label(canvas, &label, x, text_top, LABEL_COLOR);
}

/// Render text with the built-in bitmap glyphs; pixels off-canvas are clipped
fn draw_label(canvas: &mut DynamicImage, text: &str, x: i32, y: i32, color: Rgba<u8>) {
    let advance = ((GLYPH_WIDTH + 1) * LABEL_SCALE) as i32;
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else { continue };
        let origin_x = x + i as i32 * advance;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let rect = Rect::at(
                    origin_x + (col * LABEL_SCALE) as i32,
                    y + (row as u32 * LABEL_SCALE) as i32,
                )
                .of_size(LABEL_SCALE, LABEL_SCALE);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}

/// 5x7 bitmaps, one byte per row, high bit on the left
fn glyph(ch: char) -> Option<[u8; GLYPH_HEIGHT as usize]> {
    let rows = match ch {
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'o' => [0b00000, 0b00000, 0b01110, 0b10001, 0b10001, 0b10001, 0b01110],
        'm' => [0b00000, 0b00000, 0b11010, 0b10101, 0b10101, 0b10001, 0b10001],
        _ => return None,
    };
    Some(rows)
}
