//! Rendered output of the views.

use crate::addr_space::{Location, Region};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Comment,
    Function,
    /// Names the function a control transfer lands on.
    Call(Location),
    /// Best comment of the cells the instruction touches in one region.
    Io(Region),
    Decode,
    Script,
    Wram,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedLine {
    pub indent: usize,
    pub address: u32,
    pub text: String,
    /// Evenly spread value in `0.0..1.0`, or `None` for no highlight.
    pub highlight: Option<f32>,
    pub kind: LineKind,
    /// Mnemonic of the instruction rendered on this line, if any.
    pub mnemonic: Option<&'static str>,
}

impl DecodedLine {
    pub fn new(address: u32, text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            indent: 0,
            address,
            text: text.into(),
            highlight: None,
            kind,
            mnemonic: None,
        }
    }

    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn highlight(mut self, highlight: Option<f32>) -> Self {
        self.highlight = highlight;
        self
    }
}

/// What the render sink needs to know about one address beyond its lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressMeta {
    pub function: Option<String>,
    pub context: Option<u32>,
    pub function_start: bool,
    pub jump_to: Option<Location>,
}

/// One page of a view, ready for a render sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<DecodedLine>,
    pub meta: BTreeMap<Location, AddressMeta>,
    pub first_item: usize,
    pub total: usize,
}

/// Width of the `"XXXXXX "` address prefix of an instruction line.
const PREFIX: usize = 7;

const ALIASES: [(&str, &str); 2] = [("BCC", "BLT"), ("BCS", "BGE")];

fn after_compare(mnemonic: Option<&str>) -> bool {
    matches!(mnemonic, Some("BEQ" | "CMP" | "CPX" | "CPY"))
}

/// Renames `BCC` to `BLT` and `BCS` to `BGE` right after a comparison.
///
/// Adjacency is by rendered line, so an interleaved comment line breaks it.
pub fn apply_branch_aliases(lines: &mut [DecodedLine]) {
    for i in 1..lines.len() {
        if !after_compare(lines[i - 1].mnemonic) {
            continue;
        }
        let line = &mut lines[i];
        let Some(&(from, to)) = ALIASES
            .iter()
            .find(|(from, _)| line.mnemonic == Some(*from))
        else {
            continue;
        };
        let Some(tail) = line.text.get(PREFIX..) else {
            continue;
        };
        let tail = tail.replacen(from, to, 1);
        line.text.truncate(PREFIX);
        line.text.push_str(&tail);
        line.mnemonic = Some(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(text: &str, mnemonic: &'static str) -> DecodedLine {
        DecodedLine {
            mnemonic: Some(mnemonic),
            ..DecodedLine::new(0x8000, text, LineKind::Decode)
        }
    }

    #[test]
    fn bcc_after_cmp_is_blt() {
        let mut lines = vec![
            instruction("008000 CMP #$10", "CMP"),
            instruction("008002 BCC $8010", "BCC"),
        ];
        apply_branch_aliases(&mut lines);
        assert_eq!(lines[1].text, "008002 BLT $8010");
        assert_eq!(lines[1].mnemonic, Some("BLT"));
    }

    #[test]
    fn bcs_after_beq_is_bge() {
        let mut lines = vec![
            instruction("008000 BEQ $8004", "BEQ"),
            instruction("008002 BCS $8010", "BCS"),
        ];
        apply_branch_aliases(&mut lines);
        assert_eq!(lines[1].text, "008002 BGE $8010");
    }

    #[test]
    fn only_adjacent_lines_count() {
        let mut lines = vec![
            instruction("008000 CPX #$10", "CPX"),
            DecodedLine::new(0x8002, "loop end", LineKind::Comment),
            instruction("008002 BCC $8010", "BCC"),
            instruction("008004 LDA #$00", "LDA"),
            instruction("008006 BCC $8010", "BCC"),
        ];
        apply_branch_aliases(&mut lines);
        assert!(lines[2].text.contains("BCC"));
        assert!(lines[4].text.contains("BCC"));
    }

    #[test]
    fn annotation_text_is_kept() {
        let text = format!("{:<21} {}", "008002 BCC $8010", "BCC here");
        let mut lines = vec![instruction("008000 CMP #$10", "CMP"), instruction(&text, "BCC")];
        apply_branch_aliases(&mut lines);
        assert!(lines[1].text.starts_with("008002 BLT $8010"));
        assert!(lines[1].text.ends_with("BCC here"));
    }
}
