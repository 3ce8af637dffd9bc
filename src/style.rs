//! Entity colors: explicit `#RRGGBB` values from the configuration, with a
//! deterministic fallback so unknown entities keep the same color in every
//! frame and every run.
//!
//! Fallback design:
//! - entity key hashed (FNV-1a) to a hue angle;
//! - fixed saturation/lightness that reads well on a white background.

use crate::models::EntityId;
use ahash::AHashMap;
use plotters::style::RGBColor;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB` (also `#RGB`).
    pub fn from_hex(s: &str) -> Option<Self> {
        let h = s.trim().trim_start_matches('#');
        let full: String = match h.len() {
            3 => h.chars().flat_map(|c| [c, c]).collect(),
            6 => h.to_string(),
            _ => return None,
        };
        let byte = |i: usize| u8::from_str_radix(full.get(i..i + 2)?, 16).ok();
        Some(Self::new(byte(0)?, byte(2)?, byte(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_plotters(self) -> RGBColor {
        RGBColor(self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Hsl {
    pub h_deg: f64, // 0..360
    pub s: f64,     // 0..1
    pub l: f64,     // 0..1
}

/// Typed entity -> color lookup with a deterministic fallback.
#[derive(Debug, Clone, Default)]
pub struct Palette {
    colors: AHashMap<EntityId, Rgb8>,
}

impl Palette {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityId, color: Rgb8) {
        self.colors.insert(entity, color);
    }

    /// Configured color, if any.
    pub fn get(&self, entity: &EntityId) -> Option<Rgb8> {
        self.colors.get(entity).copied()
    }

    /// Configured color, or the entity's stable fallback color.
    pub fn color_for(&self, entity: &EntityId) -> Rgb8 {
        self.get(entity).unwrap_or_else(|| fallback_color(entity))
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Deterministic color for entities without a configured one.
pub fn fallback_color(entity: &EntityId) -> Rgb8 {
    let hue = (stable_hash64(entity.key()) % 360) as f64;
    hsl_to_rgb8(Hsl {
        h_deg: hue,
        s: 0.60,
        l: 0.50,
    })
}

// ------------------------ Utilities ------------------------

// FNV-1a: unlike `DefaultHasher`, stable across Rust releases.
fn stable_hash64(s: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

// HSL -> RGB conversion (linear; sufficient for chart colors)
pub fn hsl_to_rgb8(hsl: Hsl) -> Rgb8 {
    let h = (hsl.h_deg % 360.0) / 360.0;
    let s = clamp01(hsl.s);
    let l = clamp01(hsl.l);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return Rgb8 { r: v, g: v, b: v };
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 1.0 / 2.0 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    }

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    Rgb8 {
        r: (r * 255.0).round() as u8,
        g: (g * 255.0).round() as u8,
        b: (b * 255.0).round() as u8,
    }
}
