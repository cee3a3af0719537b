//! WinAnsiEncoding text encoding and Helvetica glyph metrics.

/// Helvetica advance widths (1/1000 em) for bytes 0x20..=0x7E.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const DEFAULT_WIDTH: u16 = 556;
const REPLACEMENT: u8 = b'?';

/// Map a character onto its WinAnsiEncoding byte, if it has one.
fn to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u32 as u8),
        _ => match c {
            '\t' => Some(b' '),
            '\u{20AC}' => Some(0x80),
            '\u{201A}' => Some(0x82),
            '\u{0192}' => Some(0x83),
            '\u{201E}' => Some(0x84),
            '\u{2026}' => Some(0x85),
            '\u{2020}' => Some(0x86),
            '\u{2021}' => Some(0x87),
            '\u{02C6}' => Some(0x88),
            '\u{2030}' => Some(0x89),
            '\u{0160}' => Some(0x8A),
            '\u{2039}' => Some(0x8B),
            '\u{0152}' => Some(0x8C),
            '\u{017D}' => Some(0x8E),
            '\u{2018}' => Some(0x91),
            '\u{2019}' => Some(0x92),
            '\u{201C}' => Some(0x93),
            '\u{201D}' => Some(0x94),
            '\u{2022}' => Some(0x95),
            '\u{2013}' => Some(0x96),
            '\u{2014}' => Some(0x97),
            '\u{02DC}' => Some(0x98),
            '\u{2122}' => Some(0x99),
            '\u{0161}' => Some(0x9A),
            '\u{203A}' => Some(0x9B),
            '\u{0153}' => Some(0x9C),
            '\u{017E}' => Some(0x9E),
            '\u{0178}' => Some(0x9F),
            _ => None,
        },
    }
}

/// Encode text for a Type1 font using WinAnsiEncoding. Characters outside
/// the encoding become `?`.
pub(crate) fn encode(text: &str) -> Vec<u8> {
    text.chars().map(|c| to_winansi(c).unwrap_or(REPLACEMENT)).collect()
}

fn byte_width(b: u8) -> u16 {
    match b {
        0x20..=0x7E => ASCII_WIDTHS[(b - 0x20) as usize],
        0x85 | 0x97 | 0x99 => 1000,
        0x91 | 0x92 => 222,
        0x93 | 0x94 => 333,
        0x95 => 350,
        0xA0 => 278,
        0xB0 => 400,
        0xBC..=0xBE => 834,
        _ => DEFAULT_WIDTH,
    }
}

/// Width of `text` in points when set in Helvetica at `size`.
pub(crate) fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = encode(text).into_iter().map(|b| byte_width(b) as u32).sum();
    units as f32 * size / 1000.0
}
