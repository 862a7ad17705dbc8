//! Paginated, annotated disassembly of one source.

use crate::{
    addr_space::Location,
    cache::Cache,
    config::Config,
    error::{Error, Result},
    jump_list::{JumpList, Position},
    line::{Page, apply_branch_aliases},
    resolve::{PageScope, Rendered, render_item},
    store::{CommentKey, FunctionRecord, Store},
    timing::PageTimer,
    window::Window,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Comment,
    FunctionName,
}

/// An entry edit in progress. Its address is never served from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edit {
    pub at: Location,
    pub target: EditTarget,
}

/// Decode cache shared by every disassembly view, keyed by absolute location.
pub type DecodeCache = dyn Cache<Location, Rendered>;

#[derive(Debug, Clone)]
pub struct AsmView {
    source: Location,
    window: Window,
    edit: Option<Edit>,
    jumps: JumpList,
}

impl AsmView {
    pub fn new(source: Location, page_size: usize) -> Self {
        Self {
            source,
            window: Window::new(page_size),
            edit: None,
            jumps: JumpList::default(),
        }
    }

    pub fn source(&self) -> Location {
        self.source
    }

    fn position(&self) -> Position {
        Position {
            source: self.source,
            first_item: self.window.first_item,
        }
    }

    /// Switches to another source and goes back to its top. The switch is
    /// recorded in the jump history.
    pub fn set_source(&mut self, source: Location) {
        if source != self.source {
            let from = self.position();
            self.source = source;
            self.edit = None;
            self.jumps.record(from, Position { source, first_item: 0 });
        }
        self.window.reset();
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn edit(&self) -> Option<Edit> {
        self.edit
    }

    pub fn render(
        &mut self,
        store: &mut dyn Store,
        cache: &mut DecodeCache,
        config: &Config,
    ) -> Result<Page> {
        let diagnostics = &config.diagnostics;
        let mut timer = PageTimer::start("asm", diagnostics.page_trip(), diagnostics.query_trip());
        let source = self.source;
        let total = timer.time("count", || store.count_items(source))?;
        self.window.page_size = config.page_size;
        self.window.set_len(total);
        let first = self.window.first_item;
        let mut page = Page {
            first_item: first,
            total,
            ..Default::default()
        };

        let Some(start) = timer.time("seek", || store.seek_item(source, first))? else {
            timer.finish(first);
            return Ok(page);
        };
        let items = timer.time("page", || store.page_items(source, start, config.page_size))?;
        let (Some(lo), Some(hi)) = (items.first(), items.last()) else {
            timer.finish(first);
            return Ok(page);
        };
        let (lo, hi) = (lo.at, hi.at);
        let functions = timer.time("function", || store.functions_overlapping(source, lo, hi))?;
        let comments = timer.time("comment", || store.comments_in_range(source, lo, hi))?;
        let scope = PageScope {
            source,
            functions: &functions,
            comments: &comments,
            config,
        };

        for item in items {
            if page.lines.len() > config.page_size {
                break;
            }
            let editing = self.edit.filter(|edit| edit.at == item.at);
            if editing.is_none() {
                if let Some(hit) = cache.get(&item.at) {
                    if page.lines.last() != hit.lines.first() {
                        page.lines.extend(hit.lines.iter().cloned());
                        page.meta.insert(item.at, hit.meta.clone());
                    }
                    continue;
                }
            }
            let open_comment = editing.is_some_and(|edit| edit.target == EditTarget::Comment);
            let rendered = render_item(store, &mut timer, &scope, item, open_comment)?;
            page.lines.extend(rendered.lines.iter().cloned());
            page.meta.insert(item.at, rendered.meta.clone());
            if editing.is_none() {
                cache.put(item.at, rendered);
            }
        }
        apply_branch_aliases(&mut page.lines);
        timer.finish(first);
        Ok(page)
    }

    /// Makes the item at `at` the first visible one.
    pub fn jump(&mut self, store: &mut dyn Store, at: Location) -> Result<()> {
        let index = store
            .item_index(self.source, at)?
            .ok_or(Error::NotMapped(at))?;
        self.window.set_len(store.count_items(self.source)?);
        let from = self.position();
        self.window.set_first(index as i64);
        self.jumps.record(from, self.position());
        Ok(())
    }

    fn restore(&mut self, store: &mut dyn Store, position: Option<Position>) -> Result<bool> {
        let Some(position) = position else {
            return Ok(false);
        };
        if position.source != self.source {
            self.source = position.source;
            self.edit = None;
        }
        self.window.set_len(store.count_items(self.source)?);
        self.window.set_first(position.first_item as i64);
        Ok(true)
    }

    /// Goes back to where the view was before the last jump. Returns whether it moved.
    pub fn undo(&mut self, store: &mut dyn Store) -> Result<bool> {
        let back = self.jumps.back(self.position());
        self.restore(store, back)
    }

    pub fn redo(&mut self, store: &mut dyn Store) -> Result<bool> {
        let forward = self.jumps.forward();
        self.restore(store, forward)
    }

    fn function_containing(
        &self,
        store: &mut dyn Store,
        at: Location,
    ) -> Result<Option<FunctionRecord>> {
        Ok(store
            .functions_overlapping(self.source, at, at)?
            .into_iter()
            .map(|f| f.record)
            .find(|f| f.contains(at)))
    }

    /// Starts editing the comment or function name at `at`, returning the current text.
    pub fn begin_edit(
        &mut self,
        store: &mut dyn Store,
        cache: &mut DecodeCache,
        at: Location,
        target: EditTarget,
    ) -> Result<String> {
        if store.item_index(self.source, at)?.is_none() {
            return Err(Error::NotMapped(at));
        }
        let text = match target {
            EditTarget::Comment => store
                .comments_in_range(self.source, at, at)?
                .into_iter()
                .next()
                .map(|c| c.text)
                .unwrap_or_default(),
            EditTarget::FunctionName => {
                self.function_containing(store, at)?
                    .ok_or(Error::NoFunction(at))?
                    .name
            }
        };
        if let Some(old) = self.edit.replace(Edit { at, target }) {
            cache.invalidate(&old.at);
        }
        cache.invalidate(&at);
        Ok(text)
    }

    /// Writes the edit through the store. An empty comment deletes it.
    pub fn commit_edit(
        &mut self,
        store: &mut dyn Store,
        cache: &mut DecodeCache,
        text: &str,
    ) -> Result<()> {
        let edit = self.edit.ok_or(Error::NoEdit)?;
        let function = self.function_containing(store, edit.at)?;
        match edit.target {
            EditTarget::Comment => {
                let key = CommentKey {
                    scope: Some(self.source),
                    at: edit.at,
                    context: function.map_or(0, |f| f.context),
                };
                if text.is_empty() {
                    store.delete_comment(key)?;
                } else {
                    store.upsert_comment(key, text)?;
                }
                cache.invalidate(&edit.at);
            }
            EditTarget::FunctionName => {
                let function = function.ok_or(Error::NoFunction(edit.at))?;
                store.rename_function(self.source, function.start, text)?;
                cache.clear();
            }
        }
        log::debug!("committed {:?} at {}", edit.target, edit.at);
        self.edit = None;
        Ok(())
    }

    pub fn cancel_edit(&mut self, cache: &mut DecodeCache) {
        if let Some(edit) = self.edit.take() {
            cache.invalidate(&edit.at);
        }
    }

    /// Drops every rendered address so the next page is built from the store.
    pub fn refresh(&mut self, cache: &mut DecodeCache) {
        cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::Lru,
        line::LineKind,
        memory_store::{MemoryStore, tests::*},
        project::Project,
        store::{Reconnecting, tests::Flaky},
    };

    fn project() -> Project {
        let mut project = Project::default();
        project.segments.push(asm(
            0x8000,
            &[0xc9, 0x10, 0x90, 0x02, 0x20, 0x00, 0x90, 0x60],
        ));
        project.segments.push(asm(0x9000, &[0xea, 0x60]));
        for at in [0x8000, 0x8002, 0x8004, 0x8007, 0x9000, 0x9001] {
            project.code.push(code(at));
        }
        project.functions.push(function(0x8000, 0x8007, "main", 0));
        project.functions.push(function(0x9000, 0x9001, "helper", 1));
        project
    }

    fn setup() -> (AsmView, MemoryStore, Lru<Location, Rendered>, Config) {
        let config = Config::default();
        (
            AsmView::new(SOURCE, config.page_size),
            MemoryStore::new(project()),
            Lru::new(config.cache_capacity),
            config,
        )
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn renders_annotated_page() {
        let (mut view, mut store, mut cache, config) = setup();
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(
            texts(&page),
            [
                format!("{:<21} main()", "008000 CMP #$10").as_str(),
                "008002 BLT $8006",
                format!("{:<21} Call helper()", "008004 JSR $9000").as_str(),
                "008007 RTS",
                format!("{:<21} helper()", "009000 NOP").as_str(),
                "009001 RTS",
            ]
        );
        assert_eq!(page.lines[2].kind, LineKind::Call(Location::rom(0x9000)));
        assert_eq!(page.meta[&Location::rom(0x8004)].jump_to, Some(Location::rom(0x9000)));
        assert_eq!(page.meta[&Location::rom(0x8002)].jump_to, Some(Location::rom(0x8006)));
    }

    #[test]
    fn highlight_is_rank_over_count() {
        let (mut view, mut store, mut cache, config) = setup();
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.lines[0].highlight, Some(0.0));
        assert_eq!(page.lines[3].highlight, Some(0.0));
        assert_eq!(page.lines[4].highlight, Some(0.5));
    }

    #[test]
    fn cached_addresses_skip_the_store() {
        let (mut view, mut store, mut cache, config) = setup();
        let first = view.render(&mut store, &mut cache, &config).unwrap();
        let bytes = store.queries("bytes");
        assert_eq!(bytes, 6);
        let second = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(first, second);
        assert_eq!(store.queries("bytes"), bytes);
    }

    #[test]
    fn comment_edit_rerenders_its_address() {
        let (mut view, mut store, mut cache, config) = setup();
        view.render(&mut store, &mut cache, &config).unwrap();
        let rts = Location::rom(0x8007);
        let text = view
            .begin_edit(&mut store, &mut cache, rts, EditTarget::Comment)
            .unwrap();
        assert_eq!(text, "");
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.lines[3].kind, LineKind::Comment);
        assert_eq!(page.lines[3].text.trim_end(), "008007 RTS");
        assert!(!cache.contains(&rts));

        view.commit_edit(&mut store, &mut cache, "done").unwrap();
        let before = store.queries("bytes");
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.lines[3].text, format!("{:<21} done", "008007 RTS"));
        assert_eq!(store.queries("bytes"), before + 1);
        assert_eq!(view.edit(), None);

        view.begin_edit(&mut store, &mut cache, rts, EditTarget::Comment)
            .unwrap();
        view.commit_edit(&mut store, &mut cache, "").unwrap();
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.lines[3].text, "008007 RTS");
    }

    #[test]
    fn rename_reaches_callers() {
        let (mut view, mut store, mut cache, config) = setup();
        view.render(&mut store, &mut cache, &config).unwrap();
        let name = view
            .begin_edit(&mut store, &mut cache, Location::rom(0x9001), EditTarget::FunctionName)
            .unwrap();
        assert_eq!(name, "helper");
        view.commit_edit(&mut store, &mut cache, "sub").unwrap();
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert!(page.lines[2].text.ends_with("Call sub()"));
        assert!(page.lines[4].text.ends_with("sub()"));
    }

    #[test]
    fn edit_errors() {
        let (mut view, mut store, mut cache, _) = setup();
        assert!(matches!(
            view.commit_edit(&mut store, &mut cache, "x"),
            Err(Error::NoEdit)
        ));
        assert!(matches!(
            view.begin_edit(&mut store, &mut cache, Location::rom(0x8001), EditTarget::Comment),
            Err(Error::NotMapped(_))
        ));
    }

    #[test]
    fn first_item_is_clamped() {
        let (mut view, mut store, mut cache, config) = setup();
        let config = Config {
            page_size: 4,
            ..config
        };
        view.render(&mut store, &mut cache, &config).unwrap();
        view.window_mut().set_first(100);
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.first_item, 4);
        assert_eq!(page.lines.len(), 2);
        assert_eq!(page.lines[1].text, "009001 RTS");
    }

    #[test]
    fn jump_and_undo() {
        let (_, mut store, mut cache, config) = setup();
        let config = Config {
            page_size: 2,
            ..config
        };
        let mut view = AsmView::new(SOURCE, config.page_size);
        view.jump(&mut store, Location::rom(0x8007)).unwrap();
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.first_item, 3);
        assert!(page.lines[0].text.starts_with("008007 RTS"));
        assert!(view.undo(&mut store).unwrap());
        assert_eq!(view.window().first_item, 0);
        assert!(view.redo(&mut store).unwrap());
        assert_eq!(view.window().first_item, 3);
        assert!(!view.redo(&mut store).unwrap());

        let err = view.jump(&mut store, Location::rom(0x8001)).unwrap_err();
        assert_eq!(err.to_string(), "Address 008001 not mapped");
    }

    #[test]
    fn source_switch_resets_position() {
        let (mut view, mut store, mut cache, config) = setup();
        view.jump(&mut store, Location::rom(0x9000)).unwrap();
        view.set_source(Location::rom(0xc1_0000));
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.first_item, 0);
        assert_eq!(page.total, 0);
        assert!(page.lines.is_empty());
    }

    #[test]
    fn undo_returns_to_previous_source() {
        let (_, mut store, mut cache, config) = setup();
        let config = Config {
            page_size: 2,
            ..config
        };
        let mut view = AsmView::new(SOURCE, config.page_size);
        view.jump(&mut store, Location::rom(0x9000)).unwrap();
        let first = view.window().first_item;
        assert_eq!(first, 4);
        view.set_source(Location::rom(0xc1_0000));
        assert_eq!(view.window().first_item, 0);
        assert!(view.undo(&mut store).unwrap());
        assert_eq!(view.source(), SOURCE);
        assert_eq!(view.window().first_item, first);
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert!(page.lines[0].text.starts_with("009000"));
        assert!(view.redo(&mut store).unwrap());
        assert_eq!(view.source(), Location::rom(0xc1_0000));
    }

    #[test]
    fn dropped_connection_is_retried() {
        let (mut view, store, mut cache, config) = setup();
        let mut store = Reconnecting::new(Flaky {
            inner: store,
            drops: 1,
            reconnects: 0,
        });
        let page = view.render(&mut store, &mut cache, &config).unwrap();
        assert_eq!(page.lines.len(), 6);
        assert_eq!(store.get_ref().reconnects, 1);
    }
}
