use annotate::line::{DecodedLine, LineKind, Page};
use std::fmt::Write;

pub const fn rgb(v: u32) -> [u8; 3] {
    let [_, r, g, b] = v.to_be_bytes();
    [r, g, b]
}

const COMMENT: [u8; 3] = rgb(0x6a9955);
const FUNCTION: [u8; 3] = rgb(0xdcdcaa);
const CALL: [u8; 3] = rgb(0x4ec9b0);
const IO: [u8; 3] = rgb(0xce9178);
const DIM: [u8; 3] = rgb(0x808080);

/// Hue in `0.0..1.0` to a muted colour that stays readable on dark terminals.
pub fn highlight_color(hue: f32) -> [u8; 3] {
    let (s, v) = (0.7f32, 0.6f32);
    let h = hue.rem_euclid(1.0) * 6.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    [r, g, b].map(|n| ((n + m) * 255.0).round() as u8)
}

fn paint(out: &mut String, [r, g, b]: [u8; 3], text: &str) {
    let _ = write!(out, "\x1b[38;2;{r};{g};{b}m{text}\x1b[m");
}

pub fn line(line: &DecodedLine, color: bool) -> String {
    let mut out = " ".repeat(line.indent);
    let text = line.text.as_str();
    if !color {
        out.push_str(text);
        return out;
    }
    let fg = match line.kind {
        LineKind::Comment => Some(COMMENT),
        LineKind::Function => Some(FUNCTION),
        LineKind::Call(_) => Some(CALL),
        LineKind::Io(_) => Some(IO),
        LineKind::Decode | LineKind::Script | LineKind::Wram => None,
    };
    match (line.highlight, fg) {
        (Some(hue), _) if matches!(line.kind, LineKind::Decode | LineKind::Wram) => {
            paint(&mut out, highlight_color(hue), "\u{258c}");
            out.push_str(text);
        }
        (_, Some(fg)) => paint(&mut out, fg, text),
        _ => out.push_str(text),
    }
    out
}

pub fn page(title: &str, page: &Page, color: bool) -> String {
    let mut out = String::new();
    let header = format!("{title} [item {} of {}]", page.first_item, page.total);
    if color {
        paint(&mut out, DIM, &header);
    } else {
        out.push_str(&header);
    }
    out.push('\n');
    for l in &page.lines {
        out.push_str(&line(l, color));
        out.push('\n');
    }
    out
}
