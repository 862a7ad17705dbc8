use crate::{
    addr_space::Location,
    asm_view::DecodeCache,
    config::Config,
    error::Result,
    line::{DecodedLine, LineKind, Page},
    store::{CommentKey, CommentRecord, Store},
    timing::PageTimer,
    window::Window,
};

/// Memory cells read or written by one instruction.
#[derive(Debug, Clone)]
pub struct DataView {
    source: Location,
    code: Option<Location>,
    window: Window,
}

impl DataView {
    pub fn new(source: Location, page_size: usize) -> Self {
        Self {
            source,
            code: None,
            window: Window::new(page_size),
        }
    }

    pub fn set_source(&mut self, source: Location) {
        if source != self.source {
            self.source = source;
            self.code = None;
            self.window.reset();
        }
    }

    pub fn set_address(&mut self, code: Location) {
        if Some(code) != self.code {
            self.code = Some(code);
            self.window.reset();
        }
    }

    pub fn address(&self) -> Option<Location> {
        self.code
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    fn context(&self, store: &mut dyn Store, code: Location) -> Result<u32> {
        Ok(store
            .functions_overlapping(self.source, code, code)?
            .into_iter()
            .find(|f| f.record.contains(code))
            .map_or(0, |f| f.record.context))
    }

    pub fn render(&mut self, store: &mut dyn Store, config: &Config) -> Result<Page> {
        let diagnostics = &config.diagnostics;
        let mut timer =
            PageTimer::start("data", diagnostics.data_page_trip(), diagnostics.query_trip());
        let Some(code) = self.code else {
            return Ok(Page::default());
        };
        let source = self.source;
        let refs = timer.time("data", || store.data_refs(source, code))?;
        let context = timer.time("function", || self.context(store, code))?;
        self.window.page_size = config.page_size;
        self.window.set_len(refs.len());
        let first = self.window.first_item;

        let mut page = Page {
            first_item: first,
            total: refs.len(),
            ..Default::default()
        };
        for r in refs.iter().skip(first).take(config.page_size) {
            let comments = timer.time("comment", || store.data_comments(r.data))?;
            let comment = best_comment(&comments, context).unwrap_or_default();
            let text = format!(
                "{} {} 0x{:06X} - {comment}",
                r.data.region,
                if r.read { 'r' } else { 'w' },
                r.data.address
            );
            page.lines.push(DecodedLine::new(r.data.address, text, LineKind::Io(r.data.region)));
        }
        timer.finish(first);
        Ok(page)
    }

    /// Sets the comment of a cell in the context of the selected instruction.
    ///
    /// Callers render the comment on every instruction touching the cell, so the
    /// whole decode cache is dropped.
    pub fn commit_comment(
        &mut self,
        store: &mut dyn Store,
        cache: &mut DecodeCache,
        cell: Location,
        text: &str,
    ) -> Result<()> {
        let context = match self.code {
            Some(code) => self.context(store, code)?,
            None => 0,
        };
        let key = CommentKey {
            scope: None,
            at: cell,
            context,
        };
        if text.is_empty() {
            store.delete_comment(key)?;
        } else {
            store.upsert_comment(key, text)?;
        }
        cache.clear();
        Ok(())
    }
}

/// Comment of the function context, else the global one.
fn best_comment(comments: &[CommentRecord], context: u32) -> Option<String> {
    comments
        .iter()
        .find(|c| c.context == context)
        .or_else(|| comments.iter().find(|c| c.context == 0))
        .map(|c| c.text.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        addr_space::Region,
        cache::{Cache, Lru},
        memory_store::{MemoryStore, tests::*},
        project::Project,
        resolve::Rendered,
        store::DataRef,
    };

    fn store() -> MemoryStore {
        let mut project = Project::default();
        project.functions.push(function(0x8000, 0x80ff, "nmi", 7));
        let code = Location::rom(0x8010);
        for (data, read) in [
            (Location::new(Region::Register, 0x2100), false),
            (Location::wram(0x10), true),
            (Location::wram(0x10), false),
        ] {
            project.data.push(DataRef {
                source: SOURCE,
                code,
                data,
                read,
            });
        }
        for (context, text) in [(0, "global"), (7, "in nmi")] {
            project.comments.push(CommentRecord {
                scope: None,
                ..comment(Location::wram(0x10), context, text)
            });
        }
        MemoryStore::new(project)
    }

    #[test]
    fn lists_cells_with_context_comments() {
        let mut store = store();
        let config = Config::default();
        let mut view = DataView::new(SOURCE, config.page_size);
        assert_eq!(view.render(&mut store, &config).unwrap(), Page::default());
        view.set_address(Location::rom(0x8010));
        let page = view.render(&mut store, &config).unwrap();
        let texts: Vec<_> = page.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            [
                "WRAM w 0x000010 - in nmi",
                "WRAM r 0x000010 - in nmi",
                "REG w 0x002100 - ",
            ]
        );
        assert_eq!(page.lines[2].kind, LineKind::Io(Region::Register));
    }

    #[test]
    fn falls_back_to_global_context() {
        let comments = [
            CommentRecord {
                scope: None,
                ..comment(Location::wram(0), 0, "global")
            },
            CommentRecord {
                scope: None,
                ..comment(Location::wram(0), 3, "other")
            },
        ];
        assert_eq!(best_comment(&comments, 5).as_deref(), Some("global"));
        assert_eq!(best_comment(&comments, 3).as_deref(), Some("other"));
        assert_eq!(best_comment(&[], 3), None);
    }

    #[test]
    fn new_address_resets_position() {
        let mut store = store();
        let config = Config {
            page_size: 2,
            ..Default::default()
        };
        let mut view = DataView::new(SOURCE, config.page_size);
        view.set_address(Location::rom(0x8010));
        view.render(&mut store, &config).unwrap();
        view.window_mut().set_first(1);
        assert_eq!(view.render(&mut store, &config).unwrap().first_item, 1);
        view.set_address(Location::rom(0x8020));
        let page = view.render(&mut store, &config).unwrap();
        assert_eq!(page.first_item, 0);
        assert!(page.lines.is_empty());
    }

    #[test]
    fn comment_commit_clears_cache() {
        let mut store = store();
        let config = Config::default();
        let mut cache: Lru<Location, Rendered> = Lru::new(4);
        cache.put(
            Location::rom(0x8010),
            Rendered {
                lines: vec![],
                meta: Default::default(),
            },
        );
        let mut view = DataView::new(SOURCE, config.page_size);
        view.set_address(Location::rom(0x8010));
        view.commit_comment(&mut store, &mut cache, Location::new(Region::Register, 0x2100), "INIDISP")
            .unwrap();
        assert!(cache.is_empty());
        let page = view.render(&mut store, &config).unwrap();
        assert_eq!(page.lines[2].text, "REG w 0x002100 - INIDISP");
    }
}
