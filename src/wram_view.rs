use crate::{
    cache::{Cache, Lru},
    config::Config,
    error::Result,
    line::{DecodedLine, LineKind, Page},
    store::{Store, WramRef},
    timing::PageTimer,
    window::Window,
};

/// Addresses listed by the work RAM view.
pub const WRAM_ITEMS: usize = 0x1_ffff;
const WRAM_END: u32 = 0x2_0000;

/// Every work RAM address with the code that touches it.
#[derive(Debug)]
pub struct WramView {
    window: Window,
    cache: Lru<u32, Vec<DecodedLine>>,
}

impl WramView {
    pub fn new(config: &Config) -> Self {
        let mut window = Window::new(config.page_size);
        window.items_len = WRAM_ITEMS;
        Self {
            window,
            cache: Lru::new(config.cache_capacity),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn jump(&mut self, first: usize) {
        self.window.set_first(first as i64);
    }

    /// Forgets rendered addresses, e.g. after a data comment changed.
    pub fn refresh(&mut self) {
        self.cache.clear();
    }

    pub fn render(&mut self, store: &mut dyn Store, config: &Config) -> Result<Page> {
        let diagnostics = &config.diagnostics;
        let mut timer = PageTimer::start("wram", diagnostics.page_trip(), diagnostics.query_trip());
        self.window.page_size = config.page_size;
        self.window.set_len(WRAM_ITEMS);
        let first = u32::try_from(self.window.first_item).unwrap_or(WRAM_END);
        let span = u32::try_from(config.page_size).unwrap_or(u32::MAX);
        let end = first.saturating_add(span).min(WRAM_END);

        // Entries can be evicted while the page fills, so fetch up to the end.
        let refs = match (first..end).find(|a| !self.cache.contains(a)) {
            Some(lo) => timer.time("query", || store.wram_refs(lo, end))?,
            None => vec![],
        };

        let mut page = Page {
            first_item: first as usize,
            total: WRAM_ITEMS,
            ..Default::default()
        };
        for address in first..end {
            if page.lines.len() > config.page_size {
                break;
            }
            if let Some(lines) = self.cache.get(&address) {
                page.lines.extend(lines.iter().cloned());
                continue;
            }
            let here: Vec<_> = refs.iter().filter(|r| r.data.address == address).collect();
            let lines = wram_lines(address, &here, config.spacing);
            page.lines.extend(lines.iter().cloned());
            self.cache.put(address, lines);
        }
        timer.finish(first as usize);
        Ok(page)
    }
}

fn wram_lines(address: u32, refs: &[&WramRef], spacing: usize) -> Vec<DecodedLine> {
    let highlight = Some((address % 16) as f32 / 16.0);
    let comment = refs
        .iter()
        .rev()
        .find_map(|r| r.comment.as_deref())
        .unwrap_or_default();
    let head = format!("{address:06X}");
    let w = spacing.saturating_sub(1);
    let line = |text: String| DecodedLine::new(address, text, LineKind::Wram).highlight(highlight);
    let mut lines: Vec<_> = refs
        .iter()
        .map(|r| {
            let function = r.function.as_deref().map(|f| format!("{f}()"));
            let text = format!("{} - {}", r.code, function.unwrap_or_default());
            line(text).indent(spacing)
        })
        .collect();
    match lines.first_mut() {
        Some(first) => {
            first.indent = 0;
            first.text = format!("{head:<w$} {} {comment}", first.text);
        }
        None => lines.push(line(format!("{head:<w$} {comment}"))),
    }
    lines
}
