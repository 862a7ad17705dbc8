//! Builds the annotated lines of one item of a disassembly source.

use crate::{
    addr_space::{Location, Region, translate},
    config::Config,
    instruction::{self, Instruction, OpCode},
    line::{AddressMeta, DecodedLine, LineKind},
    store::{CommentRecord, Item, ItemKind, RankedFunction, Store, StoreResult},
    timing::PageTimer,
};

/// What a page prefetches once for all of its items.
#[derive(Debug, Clone, Copy)]
pub struct PageScope<'a> {
    pub source: Location,
    pub functions: &'a [RankedFunction],
    /// Comments of the page span, highest context first.
    pub comments: &'a [CommentRecord],
    pub config: &'a Config,
}

impl PageScope<'_> {
    fn function(&self, at: Location) -> Option<&RankedFunction> {
        self.functions.iter().find(|f| f.record.contains(at))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub lines: Vec<DecodedLine>,
    pub meta: AddressMeta,
}

fn le16(bytes: &[u8]) -> u32 {
    u16::from_le_bytes([bytes[1], bytes[2]]) as u32
}

fn le24(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[1], bytes[2], bytes[3], 0])
}

/// Where an instruction transfers control to, as far as its own bytes tell.
///
/// Indirect jumps have no static target.
fn static_target(at: Location, ins: &Instruction, window: &[u8; 4]) -> Option<Location> {
    match ins.opcode {
        op if op.is_branch() => ins.target.map(|target| Location::new(at.region, target)),
        OpCode::JMP => Some(Location::new(at.region, at.bank() | le16(window))),
        OpCode::JML => translate(le24(window)),
        _ => None,
    }
}

/// Renders one item: annotation lines first, merged with the decoded text.
///
/// `open_comment` shows an empty comment line when an edit is started at an
/// address that has no comment yet.
pub fn render_item(
    store: &mut dyn Store,
    timer: &mut PageTimer,
    scope: &PageScope,
    item: Item,
    open_comment: bool,
) -> StoreResult<Rendered> {
    let at = item.at;
    let spacing = scope.config.spacing;
    let function = scope.function(at);
    let highlight = function.map(RankedFunction::highlight);
    let mut meta = AddressMeta {
        function: function.map(|f| f.record.name.clone()),
        context: function.map(|f| f.record.context),
        ..Default::default()
    };
    let context = meta.context.unwrap_or(0);
    let annotation = |text: String, kind: LineKind| {
        DecodedLine::new(at.address, text, kind)
            .indent(spacing)
            .highlight(highlight)
    };
    let mut lines = vec![];
    let mut tail = vec![];

    let fetch = match item.kind {
        ItemKind::Code { .. } => 4,
        ItemKind::Data { length } => length as usize,
    };
    let bytes = timer.time("bytes", || store.bytes(scope.source, at, fetch))?;

    let (text, mnemonic) = match item.kind {
        ItemKind::Code { acc16, idx16 } => match instruction::window(&bytes) {
            Some(window) => {
                let ins = instruction::decode(at.address, acc16, idx16, window);
                if let Some(f) = function.filter(|f| f.record.start == at) {
                    lines.push(annotation(format!("{}()", f.record.name), LineKind::Function));
                    meta.function_start = true;
                }
                let (calls, jump_to) = resolve_calls(store, timer, scope.source, at, &ins, &window)?;
                lines.extend(calls.into_iter().map(|(text, kind)| annotation(text, kind)));
                meta.jump_to = jump_to;
                (ins.to_string(), Some(ins.mnemonic()))
            }
            None => (format!("{:06X} Error", at.address), None),
        },
        ItemKind::Data { length } => (
            render_data(at.address, length, &bytes, scope.config.data_columns, &mut tail, highlight),
            None,
        ),
    };

    match scope.comments.iter().find(|c| c.at == at) {
        Some(comment) => lines.push(annotation(comment.text.clone(), LineKind::Comment)),
        None if open_comment => lines.push(annotation(String::new(), LineKind::Comment)),
        None => {}
    }

    if matches!(item.kind, ItemKind::Code { .. }) {
        for (region, comment) in io_comments(store, timer, scope.source, at, context)? {
            lines.push(annotation(format!("{region} - {comment}"), LineKind::Io(region)));
        }
    }

    match lines.first_mut() {
        Some(first) => {
            first.indent = 0;
            first.text = format!("{text:<w$} {}", first.text, w = spacing.saturating_sub(1));
            first.mnemonic = mnemonic;
        }
        None => lines.push(DecodedLine {
            mnemonic,
            ..DecodedLine::new(at.address, text, LineKind::Decode).highlight(highlight)
        }),
    }
    lines.append(&mut tail);
    Ok(Rendered { lines, meta })
}

/// Call lines of an instruction and the address the render sink may jump to.
fn resolve_calls(
    store: &mut dyn Store,
    timer: &mut PageTimer,
    source: Location,
    at: Location,
    ins: &Instruction,
    window: &[u8; 4],
) -> StoreResult<(Vec<(String, LineKind)>, Option<Location>)> {
    let mut calls = vec![];
    let mut jump_to = None;
    let explicit = match ins.opcode {
        OpCode::JSR => Some(Location::new(at.region, at.bank() | le16(window))),
        OpCode::JSL => translate(le24(window)),
        _ => None,
    };
    if let Some(target) = explicit {
        if let Some(callee) = timer.time("function", || store.function_at(source, target))? {
            calls.push((format!("Call {}()", callee.name), LineKind::Call(target)));
        }
        jump_to = Some(target);
    }

    if ins.opcode.transfers_control() {
        if let Some(callee) = timer.time("call", || store.recorded_call(source, at))? {
            calls.push((format!("Call {}()", callee.name), LineKind::Call(callee.start)));
            jump_to = Some(callee.start);
        }
    }

    Ok((calls, jump_to.or_else(|| static_target(at, ins, window))))
}

/// Best comment per touched region: highest context, then lowest address.
fn io_comments(
    store: &mut dyn Store,
    timer: &mut PageTimer,
    source: Location,
    code: Location,
    context: u32,
) -> StoreResult<Vec<(Region, String)>> {
    let refs = timer.time("data", || store.data_refs(source, code))?;
    let mut best: Vec<(Region, Option<(u32, u32, String)>)> = vec![];
    for cell in refs.iter().map(|r| r.data) {
        if !best.iter().any(|(region, _)| *region == cell.region) {
            best.push((cell.region, None));
        }
        let comments = timer.time("data", || store.data_comments(cell))?;
        let Some((_, slot)) = best.iter_mut().find(|(region, _)| *region == cell.region) else {
            continue;
        };
        for c in comments.into_iter().filter(|c| c.context == 0 || c.context == context) {
            let better = slot.as_ref().is_none_or(|(ctx, addr, _)| {
                (c.context, core::cmp::Reverse(cell.address)) > (*ctx, core::cmp::Reverse(*addr))
            });
            if better {
                *slot = Some((c.context, cell.address, c.text));
            }
        }
    }
    best.sort_by_key(|(region, _)| *region);
    Ok(best
        .into_iter()
        .map(|(region, slot)| (region, slot.map(|(_, _, text)| text).unwrap_or_default()))
        .collect())
}

fn render_data(
    address: u32,
    length: u32,
    bytes: &[u8],
    columns: usize,
    tail: &mut Vec<DecodedLine>,
    highlight: Option<f32>,
) -> String {
    let length = length as usize;
    if length == 0 || bytes.len() < length {
        return format!("{address:06X} Error");
    }
    if length <= 4 {
        let mut le = [0; 4];
        le[..length].copy_from_slice(&bytes[..length]);
        let directive = ['B', 'W', 'L', 'D'][length - 1];
        return format!(
            "{address:06X} D{directive} ${:0w$X}",
            u32::from_le_bytes(le),
            w = length * 2
        );
    }
    let head = format!("{address:06X} DB ");
    let mut rows = bytes.chunks(columns.max(1)).map(|row| {
        row.iter()
            .map(|b| format!("${b:02X}"))
            .collect::<Vec<_>>()
            .join(", ")
    });
    let first = rows.next().unwrap_or_default();
    tail.extend(rows.map(|row| {
        DecodedLine::new(address, row, LineKind::Decode)
            .indent(head.len())
            .highlight(highlight)
    }));
    head + &first
}
