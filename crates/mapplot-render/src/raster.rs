//! Pixel-level drawing onto RGBA buffers.
//!
//! All drawing is source-over alpha blending with straight alpha. Anything
//! falling outside the buffer is clipped silently.

use image::{Rgba, RgbaImage};
use mapplot_core::Color;

pub fn blend_pixel(image: &mut RgbaImage, x: i32, y: i32, color: Color, coverage: u8) {
    if x < 0 || y < 0 || x as u32 >= image.width() || y as u32 >= image.height() {
        return;
    }
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    *pixel = blend(*pixel, color, coverage);
}

fn blend(dst: Rgba<u8>, color: Color, coverage: u8) -> Rgba<u8> {
    let src_a = (f32::from(color.a) / 255.0) * (f32::from(coverage) / 255.0);
    if src_a <= 0.0 {
        return dst;
    }
    let [r, g, b, a] = dst.0;
    let dst_a = f32::from(a) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |s: u8, d: u8| {
        let v = (f32::from(s) * src_a + f32::from(d) * dst_a * (1.0 - src_a)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(color.r, r),
        channel(color.g, g),
        channel(color.b, b),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Blend onto one raw RGBA pixel, for passes that walk the buffer directly.
pub fn blend_raw(pixel: &mut [u8], color: Color) {
    let out = blend(Rgba([pixel[0], pixel[1], pixel[2], pixel[3]]), color, 255);
    pixel.copy_from_slice(&out.0);
}

pub fn set_pixel(image: &mut RgbaImage, x: i32, y: i32, color: Color) {
    blend_pixel(image, x, y, color, 255);
}

/// Inclusive span `[min, max]` clipped to `[0, limit)`. Empty when the result
/// has `min > max`.
fn clip_span(min: i32, max: i32, limit: u32) -> (i32, i32) {
    let last = i32::try_from(limit).unwrap_or(i32::MAX).saturating_sub(1);
    (min.max(0), max.min(last))
}

/// Fill the half-open rectangle `[min_x, max_x) × [min_y, max_y)`.
pub fn fill_rect(image: &mut RgbaImage, min_x: i32, min_y: i32, max_x: i32, max_y: i32, color: Color) {
    let min_x = min_x.max(0);
    let min_y = min_y.max(0);
    let max_x = max_x.min(image.width() as i32);
    let max_y = max_y.min(image.height() as i32);
    for y in min_y..max_y {
        for x in min_x..max_x {
            set_pixel(image, x, y, color);
        }
    }
}

pub fn stroke_rect(
    image: &mut RgbaImage,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    thickness: i32,
    color: Color,
) {
    let t = thickness.max(1);
    fill_rect(image, min_x, min_y, max_x, min_y + t, color);
    fill_rect(image, min_x, max_y - t, max_x, max_y, color);
    fill_rect(image, min_x, min_y + t, min_x + t, max_y - t, color);
    fill_rect(image, max_x - t, min_y + t, max_x, max_y - t, color);
}

pub fn fill_circle(image: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: Color) {
    let r = radius.max(0.5);
    let r_sq = r * r;
    let (min_x, max_x) = clip_span((cx - r).floor() as i32, (cx + r).ceil() as i32, image.width());
    let (min_y, max_y) = clip_span((cy - r).floor() as i32, (cy + r).ceil() as i32, image.height());
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r_sq {
                set_pixel(image, x, y, color);
            }
        }
    }
}

/// Ring of the given thickness whose outer edge is `radius`.
pub fn stroke_circle(image: &mut RgbaImage, cx: f32, cy: f32, radius: f32, thickness: f32, color: Color) {
    let outer = radius.max(1.0);
    let inner = (outer - thickness.max(1.0)).max(0.0);
    let outer_sq = outer * outer;
    let inner_sq = inner * inner;
    let (min_x, max_x) = clip_span((cx - outer).floor() as i32, (cx + outer).ceil() as i32, image.width());
    let (min_y, max_y) = clip_span((cy - outer).floor() as i32, (cy + outer).ceil() as i32, image.height());
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist_sq = dx * dx + dy * dy;
            if dist_sq <= outer_sq && dist_sq >= inner_sq {
                set_pixel(image, x, y, color);
            }
        }
    }
}

/// A line with round-ish ends, `thickness` pixels wide.
pub fn draw_line(
    image: &mut RgbaImage,
    from: (f32, f32),
    to: (f32, f32),
    thickness: f32,
    color: Color,
) {
    let half = (thickness.max(1.0)) / 2.0;
    let (x0, y0) = from;
    let (x1, y1) = to;
    let (min_x, max_x) = clip_span(
        (x0.min(x1) - half).floor() as i32,
        (x0.max(x1) + half).ceil() as i32,
        image.width(),
    );
    let (min_y, max_y) = clip_span(
        (y0.min(y1) - half).floor() as i32,
        (y0.max(y1) + half).ceil() as i32,
        image.height(),
    );
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    let half_sq = half * half;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 + 0.5;
            let py = y as f32 + 0.5;
            let t = if len_sq > 0.0 {
                (((px - x0) * dx + (py - y0) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let ex = px - (x0 + t * dx);
            let ey = py - (y0 + t * dy);
            if ex * ex + ey * ey <= half_sq {
                set_pixel(image, x, y, color);
            }
        }
    }
}

/// Closed outline through `points`.
pub fn stroke_polygon(image: &mut RgbaImage, points: &[(f32, f32)], thickness: f32, color: Color) {
    if points.len() < 2 {
        return;
    }
    // Rasterise into a mask first so overlapping segment ends are not blended twice.
    let pad = thickness.max(1.0).ceil() + 1.0;
    let min_x = points.iter().map(|p| p.0).fold(f32::INFINITY, f32::min) - pad;
    let min_y = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min) - pad;
    let max_x = points.iter().map(|p| p.0).fold(f32::NEG_INFINITY, f32::max) + pad;
    let max_y = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max) + pad;
    let origin = (min_x.floor() as i32, min_y.floor() as i32);
    let mut mask = RgbaImage::new(
        (max_x - min_x).ceil().max(1.0) as u32,
        (max_y - min_y).ceil().max(1.0) as u32,
    );
    let local = |(x, y): (f32, f32)| (x - origin.0 as f32, y - origin.1 as f32);
    for (i, &from) in points.iter().enumerate() {
        let to = points[(i + 1) % points.len()];
        draw_line(&mut mask, local(from), local(to), thickness, Color::WHITE);
    }
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[3] > 0 {
            set_pixel(image, origin.0 + x as i32, origin.1 + y as i32, color);
        }
    }
}

/// Even-odd scanline fill.
pub fn fill_polygon(image: &mut RgbaImage, points: &[(f32, f32)], color: Color) {
    if points.len() < 3 {
        return;
    }
    let (min_y, max_y) = clip_span(
        points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min).floor() as i32,
        points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max).ceil() as i32,
        image.height(),
    );
    let mut crossings = Vec::with_capacity(points.len());
    for y in min_y..=max_y {
        let scan = y as f32 + 0.5;
        crossings.clear();
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            if (y0 <= scan && y1 > scan) || (y1 <= scan && y0 > scan) {
                crossings.push(x0 + (scan - y0) / (y1 - y0) * (x1 - x0));
            }
        }
        crossings.sort_by(f32::total_cmp);
        for pair in crossings.chunks_exact(2) {
            let (start, end) = clip_span(
                (pair[0] - 0.5).ceil() as i32,
                (pair[1] - 0.5).floor() as i32,
                image.width(),
            );
            for x in start..=end {
                set_pixel(image, x, y, color);
            }
        }
    }
}

/// Fill a `width × height` rectangle or ellipse centred on `(cx, cy)` and
/// rotated clockwise by `degrees`.
pub fn fill_rotated(
    image: &mut RgbaImage,
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    degrees: f64,
    ellipse: bool,
    color: Color,
) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let hw = width / 2.0;
    let hh = height / 2.0;
    let extent_x = hw * cos.abs() + hh * sin.abs();
    let extent_y = hw * sin.abs() + hh * cos.abs();
    let (min_x, max_x) = clip_span((cx - extent_x).floor() as i32, (cx + extent_x).ceil() as i32, image.width());
    let (min_y, max_y) = clip_span((cy - extent_y).floor() as i32, (cy + extent_y).ceil() as i32, image.height());
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = f64::from(x) + 0.5 - cx;
            let py = f64::from(y) + 0.5 - cy;
            // Rotate the sample back into the shape's own frame.
            let lx = px * cos + py * sin;
            let ly = -px * sin + py * cos;
            let inside = if ellipse {
                hw > 0.0 && hh > 0.0 && (lx / hw).powi(2) + (ly / hh).powi(2) <= 1.0
            } else {
                lx.abs() <= hw && ly.abs() <= hh
            };
            if inside {
                set_pixel(image, x, y, color);
            }
        }
    }
}

/// Composite `src` onto `dst` with its top-left corner at `(x, y)`.
pub fn blit(dst: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32) {
    for (sx, sy, pixel) in src.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        set_pixel(dst, x + sx as i32, y + sy as i32, Color::rgba(r, g, b, a));
    }
}

/// Draw `src` centred on `(cx, cy)`.
pub fn blit_centered(dst: &mut RgbaImage, src: &RgbaImage, cx: f64, cy: f64) {
    let x = (cx - f64::from(src.width()) / 2.0).floor() as i32;
    let y = (cy - f64::from(src.height()) / 2.0).floor() as i32;
    blit(dst, src, x, y);
}
