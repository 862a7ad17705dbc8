use crate::app::ViewKind;
use annotate::{
    addr::Addr,
    addr_space::{Location, Region},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NextPage,
    PrevPage,
    WheelDown,
    WheelUp,
    Goto(String),
    Undo,
    Redo,
    Comment(String, String),
    DataComment(String, String),
    Rename(String, String),
    Io(String),
    Find(String),
    Source(Location),
    View(ViewKind),
    Sources,
    Refresh,
    Write,
    Help,
    Quit,
}

pub const HELP: &str = "\
n / p             next / previous page
j / k             scroll down / up
g ADDR            jump to an address (first item on script and wram)
u / r             undo / redo jump
c ADDR TEXT       set the comment at ADDR, empty text deletes
f ADDR NAME       rename the function containing ADDR
io ADDR           list memory touched by the instruction at ADDR
dc CELL TEXT      comment a cell of the last io list
find TERM         jump to the best matching function
src REGION:ADDR   disassemble another source
view asm|script|wram
sources           list sources
refresh           drop cached lines
w                 save the project
q                 quit";

fn split_arg(rest: &str) -> Option<(String, String)> {
    let rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    let (first, text) = rest.split_once(' ').unwrap_or((rest, ""));
    Some((first.to_string(), text.trim().to_string()))
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let need = |what: &str| format!("`{word}` needs {what}");
    Ok(match word {
        "n" => Command::NextPage,
        "p" => Command::PrevPage,
        "j" => Command::WheelDown,
        "k" => Command::WheelUp,
        "u" => Command::Undo,
        "r" => Command::Redo,
        "w" => Command::Write,
        "q" => Command::Quit,
        "sources" => Command::Sources,
        "refresh" => Command::Refresh,
        "help" | "?" => Command::Help,
        "g" | "io" | "find" if rest.is_empty() => return Err(need("an argument")),
        "g" => Command::Goto(rest.to_string()),
        "io" => Command::Io(rest.to_string()),
        "find" => Command::Find(rest.to_string()),
        "c" | "f" | "dc" => {
            let (addr, text) = split_arg(rest).ok_or_else(|| need("an address"))?;
            match word {
                "c" => Command::Comment(addr, text),
                "f" if text.is_empty() => return Err(need("a name")),
                "f" => Command::Rename(addr, text),
                _ => Command::DataComment(addr, text),
            }
        }
        "src" => Command::Source(rest.parse()?),
        "view" => Command::View(match rest {
            "asm" => ViewKind::Asm,
            "script" => ViewKind::Script,
            "wram" => ViewKind::Wram,
            _ => return Err(format!("unknown view `{rest}`")),
        }),
        _ => return Err(format!("unknown command `{word}`, try `help`")),
    })
}

fn hex(text: &str) -> Option<u32> {
    let text = text.trim().trim_start_matches("0x").trim_start_matches('$');
    if text.is_empty() {
        return Some(0);
    }
    u32::from_str_radix(text, 16).ok()
}

/// Parses `REGION:ADDR`, `BANK:ADDR` or a flat hex address in `region`.
pub fn parse_location(text: &str, region: Region) -> Option<Location> {
    if let Some((left, right)) = text.split_once(':') {
        if let Ok(region) = left.parse::<Region>() {
            if left.trim().chars().any(|c| !c.is_ascii_digit()) {
                return Some(Location::new(region, hex(right)?));
            }
        }
        let bank = u8::try_from(hex(left)?).ok()?;
        let addr = u16::try_from(hex(right)?).ok()?;
        return Some(Location::new(region, Addr::new(bank, addr).to_u32()));
    }
    Some(Location::new(region, Addr::from_u32(hex(text)?).to_u32()))
}

/// Parses an item number for views that jump by position.
pub fn parse_item(text: &str) -> Option<usize> {
    hex(text).map(|n| n as usize)
}
