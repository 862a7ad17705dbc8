use crate::{
    addr_space::Location,
    config::Config,
    error::Result,
    line::{DecodedLine, LineKind, Page},
    script::{ScriptFault, decode_script},
    store::{SegmentKind, Store},
    timing::PageTimer,
    window::Window,
};

/// Script blob of one source, decoded in full and paged from the buffer.
///
/// The whole blob is decoded again only after the view is marked dirty.
#[derive(Debug, Clone)]
pub struct ScriptView {
    source: Option<Location>,
    window: Window,
    buffered: Vec<DecodedLine>,
    fault: Option<ScriptFault>,
    dirty: bool,
}

impl ScriptView {
    /// A view on the first source that owns a script.
    pub fn new(page_size: usize) -> Self {
        Self {
            source: None,
            window: Window::new(page_size),
            buffered: vec![],
            fault: None,
            dirty: true,
        }
    }

    pub fn source(&self) -> Option<Location> {
        self.source
    }

    pub fn set_source(&mut self, source: Location) {
        if self.source != Some(source) {
            self.source = Some(source);
            self.window.reset();
            self.dirty = true;
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn fault(&self) -> Option<&ScriptFault> {
        self.fault.as_ref()
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn jump(&mut self, first: usize) {
        self.window.set_first(first as i64);
    }

    pub fn render(&mut self, store: &mut dyn Store, config: &Config) -> Result<Page> {
        let diagnostics = &config.diagnostics;
        let mut timer =
            PageTimer::start("script", diagnostics.page_trip(), diagnostics.query_trip());
        if self.source.is_none() {
            let sources = timer.time("query", || store.sources(SegmentKind::Script))?;
            self.source = sources.first().copied();
        }
        let Some(source) = self.source else {
            return Ok(Page::default());
        };

        if self.dirty {
            let blob = timer.time("script", || store.script(source))?;
            let script = decode_script(&blob);
            self.buffered = script
                .items
                .iter()
                .map(|item| DecodedLine::new(item.offset() as u32, item.to_string(), LineKind::Script))
                .collect();
            self.fault = script.fault;
            self.dirty = false;
        }

        self.window.page_size = config.page_size;
        self.window.set_len(self.buffered.len());
        let first = self.window.first_item;
        let end = (first + config.page_size).min(self.buffered.len());
        let page = Page {
            lines: self.buffered[first..end].to_vec(),
            first_item: first,
            total: self.buffered.len(),
            ..Default::default()
        };
        timer.finish(first);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory_store::{MemoryStore, tests::SOURCE},
        project::{Project, Segment},
    };

    fn script(bytes: &[u8]) -> Segment {
        Segment {
            source: SOURCE,
            kind: SegmentKind::Script,
            start: Location::rom(0),
            bytes: bytes.to_vec(),
        }
    }

    fn store(bytes: &[u8]) -> MemoryStore {
        let mut project = Project::default();
        project.segments.push(script(bytes));
        MemoryStore::new(project)
    }

    #[test]
    fn discovers_source_and_pages_buffer() {
        let mut store = store(&[0x00, 0x00, 0x10, 0x05, 0x00]);
        let config = Config {
            page_size: 2,
            ..Default::default()
        };
        let mut view = ScriptView::new(config.page_size);
        let page = view.render(&mut store, &config).unwrap();
        assert_eq!(view.source(), Some(SOURCE));
        assert_eq!(page.total, 4);
        assert_eq!(page.lines.len(), 2);
        assert_eq!(page.lines[0].text, "000000 $00");
        assert_eq!(page.lines[1].kind, LineKind::Script);
        assert_eq!(page.lines[1].highlight, None);

        view.jump(2);
        let page = view.render(&mut store, &config).unwrap();
        assert_eq!(page.first_item, 2);
        assert_eq!(page.lines[0].text, "000002 10 jump fwd $05");
        assert_eq!(page.lines[0].address, 2);
        assert_eq!(store.queries("script"), 1);
    }

    #[test]
    fn dirty_view_decodes_again() {
        let mut store = store(&[0x00, 0x00]);
        let config = Config::default();
        let mut view = ScriptView::new(config.page_size);
        view.render(&mut store, &config).unwrap();
        assert!(!view.is_dirty());
        view.mark_dirty();
        view.render(&mut store, &config).unwrap();
        assert_eq!(store.queries("script"), 2);
    }

    #[test]
    fn truncated_blob_ends_with_fault_line() {
        let mut store = store(&[0x00, 0x1c, 0x34]);
        let config = Config::default();
        let mut view = ScriptView::new(config.page_size);
        let page = view.render(&mut store, &config).unwrap();
        assert_eq!(page.lines.last().unwrap().text, "000001 <truncated>");
        assert_eq!(view.fault().map(|f| f.offset), Some(1));
    }

    #[test]
    fn no_script_source_is_empty() {
        let mut store = MemoryStore::default();
        let config = Config::default();
        let mut view = ScriptView::new(config.page_size);
        assert_eq!(view.render(&mut store, &config).unwrap(), Page::default());
    }
}
