//! Event script bytecode.
//!
//! A script blob starts with an event count, followed by a table of 16-bit
//! pointers (sixteen per event), followed by opcodes.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    /// Little-endian operands of the given byte widths.
    Fixed(&'static [u8]),
    /// `address:2 code:1 count:2` followed by `count + 2` single bytes.
    Block,
    /// Operand layout is not known; only the opcode byte is consumed.
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptOp {
    pub name: &'static str,
    pub operands: Operands,
}

macro_rules! op {
    ($name:literal) => {
        ScriptOp {
            name: $name,
            operands: Operands::Fixed(&[]),
        }
    };
    ($name:literal, block) => {
        ScriptOp {
            name: $name,
            operands: Operands::Block,
        }
    };
    ($name:literal, unsupported) => {
        ScriptOp {
            name: $name,
            operands: Operands::Unsupported,
        }
    };
    ($name:literal, $($width:literal),+) => {
        ScriptOp {
            name: $name,
            operands: Operands::Fixed(&[$($width),+]),
        }
    };
}

pub static SCRIPT_OPS: [ScriptOp; 256] = [
    // 0x00
    op!("return"),
    op!("color crash"),
    op!("call event", 1, 1),
    op!("call event", 1, 1),
    op!("call event", 1, 1),
    op!("call PC event", 1, 1),
    op!("call PC event", 1, 1),
    op!("call PC event", 1, 1),
    op!("object activation"),
    op!("object activation"),
    op!("remove object", 1),
    op!("script processing", 1),
    op!("script processing", 1),
    op!("npc move props", 1),
    op!("npc positioning", 1),
    op!("npc facing (up)"),
    // 0x10
    op!("jump fwd", 1),
    op!("jump back", 1),
    op!("if statement", 1, 1, 1, 1),
    op!("if statement", 1, 2, 1, 1),
    op!("if statement", 1, 1, 1, 1),
    op!("if statement", 1, 1, 1, 1),
    op!("if statement", 1, 1, 1, 1),
    op!("npc facing (down)"),
    op!("check storyline", 1, 1),
    op!("get result", 1),
    op!("result", 1, 1),
    op!("npc facing (left)"),
    op!("get result", 2),
    op!("npc facing (right)"),
    op!("npc facing (up)", 1),
    op!("npc facing (down)", 1),
    // 0x20
    op!("get pc1", 1),
    op!("get object coord", 1, 1, 1),
    op!("get pc coord", 1, 1, 1),
    op!("get obj facing", 1, 1),
    op!("get pc facing", 1, 1),
    op!("npc facing (left)", 1),
    op!("npc facing (right)", 1),
    op!("check object status", 1, 1),
    op!("check battle range", 1, 1),
    op!("load ascii text", 1),
    op!("unknown"),
    op!("unknown"),
    op!("unknown", 1, 1),
    op!("check any btn", 1),
    op!("color math", unsupported),
    op!("unknown", 1, 1),
    // 0x30
    op!("check Dash btn", 1),
    op!("check Confirm btn", 1),
    op!("unknown"),
    op!("change palette", 1),
    op!("check a btn", 1),
    op!("check b btn", 1),
    op!("check x btn", 1),
    op!("check y btn", 1),
    op!("check l btn", 1),
    op!("check r btn", 1),
    op!("alias"),
    op!("check Dash btn", 1),
    op!("check Confirm btn", 1),
    op!("alias"),
    op!("alias"),
    op!("check a btn", 1),
    // 0x40
    op!("check b btn", 1),
    op!("check x btn", 1),
    op!("check y btn", 1),
    op!("check l btn", 1),
    op!("check r btn", 1),
    op!("alias"),
    op!("alias"),
    op!("animation limiter", 1),
    op!("assignment", 3, 1),
    op!("assignment", 3, 1),
    op!("assignment", 3, 1),
    op!("assignment", 3, 2),
    op!("assignment", 3, 1),
    op!("assignment", 3, 1),
    op!("memcpy", block),
    op!("assignment", 1, 1),
    // 0x50
    op!("assignment", 2, 1),
    op!("assignment", 1, 1),
    op!("assignment", 1, 1),
    op!("assignment", 2, 1),
    op!("assignment", 2, 1),
    op!("get storyline ctr", 1),
    op!("assignment", 1, 2),
    op!("load crono"),
    op!("assignment", 1, 2),
    op!("assignment", 1, 2),
    op!("assign storyline ctr", 1),
    op!("add", 1, 1),
    op!("load marle"),
    op!("add", 1, 1),
    op!("add", 1, 1),
    op!("subtract", 1, 1),
    // 0x60
    op!("subtract", 2, 1),
    op!("subtract", 1, 1),
    op!("load lucca"),
    op!("set bit", 1, 1),
    op!("reset bit", 1, 1),
    op!("set bit", 1, 1),
    op!("reset bit", 1, 1),
    op!("reset bits", 1, 1),
    op!("load frog"),
    op!("set bits", 1, 1),
    op!("load robo"),
    op!("toggle bits", 1, 1),
    op!("load ayla"),
    op!("load magus"),
    op!("alias"),
    op!("downshift", 1, 1),
    // 0x70
    op!("alias"),
    op!("increment", 1),
    op!("increment", 1),
    op!("decrement", 1),
    op!("alias"),
    op!("set byte", 1),
    op!("set byte", 1),
    op!("reset byte", 1),
    op!("alias"),
    op!("alias"),
    op!("npc jump", 1, 1, 1),
    op!("npc jump", 1, 1, 1, 1),
    op!("object drawing", 1),
    op!("object drawing", 1),
    op!("object drawing"),
    op!("random", 1),
    // 0x80
    op!("load pc", 1),
    op!("load pc", 1),
    op!("load npc", 1),
    op!("load enemy", 1, 1),
    op!("npc solid props", 1),
    op!("alias"),
    op!("alias"),
    op!("script timing", 1),
    op!("memcpy", unsupported),
    op!("set npc speed", 1),
    op!("set npc speed", 1),
    op!("set object coord", 1, 1),
    op!("set object coord", 1, 1),
    op!("set object coord", 2, 2),
    op!("sprite priority", 1),
    op!("distant object follow", 1),
    // 0x90
    op!("object drawing"),
    op!("object drawing"),
    op!("vector move", 1, 1),
    op!("alias"),
    op!("object follow", 1),
    op!("pc follow", 1),
    op!("move npc", 1, 1),
    op!("move sprite", 1, 1),
    op!("move to object", 1, 1),
    op!("move to pc", 1, 1),
    op!("move to coord", 1, 1, 1),
    op!("alias"),
    op!("vector move", 1, 1),
    op!("vector move", 1, 1),
    op!("vector move to object", 1),
    op!("vector move to pc", 1),
    // 0xA0
    op!("animated move", 1, 1),
    op!("animated move", 1, 1),
    op!("alias"),
    op!("alias"),
    op!("alias"),
    op!("alias"),
    op!("npc facing", 1),
    op!("npc facing", 1),
    op!("face object", 1),
    op!("face pc", 1),
    op!("animation", 1),
    op!("animation", 1),
    op!("static animation", 1),
    op!("pause", 1),
    op!("reset animation"),
    op!("exploration"),
    // 0xB0
    op!("exploration"),
    op!("break"),
    op!("end"),
    op!("animation"),
    op!("animation"),
    op!("move to object", 1),
    op!("move to pc", 1),
    op!("loop animation", 1, 1),
    op!("string index", 3),
    op!("pause"),
    op!("pause"),
    op!("personal textbox", 1),
    op!("pause"),
    op!("pause"),
    op!("alias"),
    op!("alias"),
    // 0xC0
    op!("dec box auto", 1, 1),
    op!("textbox top", 1),
    op!("textbox bottom", 1),
    op!("dec box top", 1, 1),
    op!("dec box bottom", 1, 1),
    op!("alias"),
    op!("alias"),
    op!("add item", 1),
    op!("special dialog", 1),
    op!("check item", 1, 1),
    op!("add item", 1),
    op!("remove item", 1),
    op!("check gold", 2, 1),
    op!("add gold", 2),
    op!("subtract gold", 2),
    op!("check recruited pc", 1, 1),
    // 0xD0
    op!("add reserve pc", 1),
    op!("remove pc", 1),
    op!("check active pc", 1, 1),
    op!("add active pc", 1),
    op!("move pc to reserve", 1),
    op!("equip item", 1, 1),
    op!("remove active pc", 1),
    op!("get item amount", 1, 1),
    op!("battle", 2),
    op!("move party", 1, 1, 1, 1, 1, 1),
    op!("party follow"),
    op!("alias"),
    op!("change location", 2, 1, 1),
    op!("change location", 2, 1, 1),
    op!("change location", 2, 1, 1),
    op!("change location", 2, 1, 1),
    // 0xE0
    op!("change location", 2, 1, 1),
    op!("change location", 2, 1, 1),
    op!("change location", 1, 1, 1, 1),
    op!("explore mode", 1),
    op!("copy tiles", 1, 1, 1, 1, 1, 1, 1),
    op!("copy tiles", 1, 1, 1, 1, 1, 1, 1),
    op!("scroll layers", 2, 1, 1),
    op!("scroll screen", 1, 1),
    op!("play sound", 1),
    op!("alias"),
    op!("play song", 1),
    op!("music volume", 1, 1),
    op!("all purpose sound", 1, 1, 1),
    op!("wait for silence"),
    op!("wait for song end"),
    op!("alias"),
    // 0xF0
    op!("darken", 1),
    op!("color addition", unsupported),
    op!("fade out screen"),
    op!("wait for brighten end"),
    op!("shake", 1),
    op!("alias"),
    op!("alias"),
    op!("alias"),
    op!("restore hp / mp"),
    op!("restore hp"),
    op!("restore mp"),
    op!("alias"),
    op!("alias"),
    op!("alias"),
    op!("gfx (17 args)", unsupported),
    op!("mode 7 scene", unsupported),
];

const POINTERS_PER_EVENT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("script truncated at {offset:06X}: {needed} byte(s) needed, {available} left")]
pub struct ScriptFault {
    pub offset: usize,
    pub needed: usize,
    pub available: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub value: u32,
    pub width: u8,
}

impl core::fmt::Display for Operand {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "${:0w$X}", self.value, w = self.width as usize * 2)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptItem {
    Count {
        offset: usize,
        events: u8,
    },
    Pointer {
        offset: usize,
        value: u16,
    },
    Op {
        offset: usize,
        opcode: u8,
        operands: Vec<Operand>,
    },
    Fault(ScriptFault),
}

impl ScriptItem {
    pub fn offset(&self) -> usize {
        match self {
            Self::Count { offset, .. } | Self::Pointer { offset, .. } | Self::Op { offset, .. } => {
                *offset
            }
            Self::Fault(fault) => fault.offset,
        }
    }
}

impl core::fmt::Display for ScriptItem {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::Count { offset, events } => write!(f, "{offset:06X} ${events:02X}"),
            Self::Pointer { offset, value } => write!(f, "{offset:06X} ${value:04X}"),
            Self::Op {
                offset,
                opcode,
                operands,
            } => {
                let op = &SCRIPT_OPS[*opcode as usize];
                write!(f, "{offset:06X} {opcode:02X} {}", op.name)?;
                if op.operands == Operands::Unsupported {
                    return f.write_str(" <unsupported>");
                }
                for operand in operands {
                    write!(f, " {operand}")?;
                }
                Ok(())
            }
            Self::Fault(fault) => write!(f, "{:06X} <truncated>", fault.offset),
        }
    }
}

struct Cursor<'a> {
    blob: &'a [u8],
    start: usize,
    pos: usize,
}

impl Cursor<'_> {
    fn read(&mut self, width: u8) -> Result<Operand, ScriptFault> {
        let len = width as usize;
        let bytes = self
            .blob
            .get(self.pos..self.pos + len)
            .ok_or(ScriptFault {
                offset: self.start,
                needed: self.pos + len - self.start,
                available: self.blob.len() - self.start,
            })?;
        let mut le = [0; 4];
        le[..len].copy_from_slice(bytes);
        self.pos += len;
        Ok(Operand {
            value: u32::from_le_bytes(le),
            width,
        })
    }
}

/// Decodes the opcode at `offset`, returning the item and the number of bytes it consumed.
pub fn decode_op(blob: &[u8], offset: usize) -> Result<(ScriptItem, usize), ScriptFault> {
    let opcode = *blob.get(offset).ok_or(ScriptFault {
        offset,
        needed: 1,
        available: 0,
    })?;
    let mut cursor = Cursor {
        blob,
        start: offset,
        pos: offset + 1,
    };
    let mut operands = vec![];
    match SCRIPT_OPS[opcode as usize].operands {
        Operands::Fixed(widths) => {
            for &width in widths {
                operands.push(cursor.read(width)?);
            }
        }
        Operands::Block => {
            operands.push(cursor.read(2)?);
            operands.push(cursor.read(1)?);
            let count = cursor.read(2)?;
            operands.push(count);
            for _ in 0..count.value + 2 {
                operands.push(cursor.read(1)?);
            }
        }
        Operands::Unsupported => {}
    }
    let item = ScriptItem::Op {
        offset,
        opcode,
        operands,
    };
    Ok((item, cursor.pos - offset))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub items: Vec<ScriptItem>,
    pub fault: Option<ScriptFault>,
}

/// Decodes a whole script blob, header included.
///
/// Decoding stops at the first item that would read past the end of the blob;
/// that item is replaced by a [`ScriptItem::Fault`].
pub fn decode_script(blob: &[u8]) -> Script {
    let mut script = Script::default();
    let Some(&events) = blob.first() else {
        return script;
    };
    script.items.push(ScriptItem::Count { offset: 0, events });
    let header_end = events as usize * POINTERS_PER_EVENT * 2;
    let mut offset = 1;
    while offset < blob.len() {
        let step = if offset < header_end {
            let mut cursor = Cursor {
                blob,
                start: offset,
                pos: offset,
            };
            cursor.read(2).map(|word| {
                let value = word.value as u16;
                (ScriptItem::Pointer { offset, value }, 2)
            })
        } else {
            decode_op(blob, offset)
        };
        match step {
            Ok((item, len)) => {
                script.items.push(item);
                offset += len;
            }
            Err(fault) => {
                log::warn!("{fault}");
                script.items.push(ScriptItem::Fault(fault));
                script.fault = Some(fault);
                break;
            }
        }
    }
    script
}
