use crate::{
    addr_space::{Location, Region},
    error::Result,
    project::Project,
    store::*,
    vecmap::VecMap,
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    path::Path,
};

/// A [`Store`] over a [`Project`] held in memory.
///
/// Query counts are kept per query name so callers can see what a page cost.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    project: Project,
    items: BTreeMap<Location, VecMap<Location, ItemKind>>,
    queries: HashMap<&'static str, usize>,
}

impl MemoryStore {
    pub fn new(project: Project) -> Self {
        let mut slf = Self {
            project,
            items: BTreeMap::new(),
            queries: HashMap::new(),
        };
        slf.reindex();
        slf
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Project::load(path).map(Self::new)
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn queries(&self, name: &str) -> usize {
        self.queries.get(name).copied().unwrap_or(0)
    }

    fn count(&mut self, name: &'static str) {
        *self.queries.entry(name).or_default() += 1;
    }

    fn reindex(&mut self) {
        self.items.clear();
        for row in &self.project.code {
            let kind = ItemKind::Code {
                acc16: !row.m,
                idx16: !row.x,
            };
            self.items.entry(row.source).or_default().insert(row.at, kind);
        }
        for comment in &self.project.comments {
            if let (Some(scope), Some(length)) = (comment.scope, comment.length) {
                let kind = ItemKind::Data { length };
                self.items.entry(scope).or_default().insert(comment.at, kind);
            }
        }
    }

    fn source_functions(&self, source: Location) -> Vec<&FunctionRecord> {
        let mut functions: Vec<_> = self
            .project
            .functions
            .iter()
            .filter(|f| f.source == source)
            .collect();
        functions.sort_by_key(|f| f.start);
        functions
    }

    fn enclosing_function(&self, source: Location, at: Location) -> Option<&FunctionRecord> {
        self.project
            .functions
            .iter()
            .find(|f| f.source == source && f.contains(at))
    }
}

impl Store for MemoryStore {
    fn reconnect(&mut self) -> StoreResult<()> {
        self.count("reconnect");
        Ok(())
    }

    fn sources(&mut self, kind: SegmentKind) -> StoreResult<Vec<Location>> {
        self.count("sources");
        let sources: BTreeSet<_> = self
            .project
            .segments
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.source)
            .collect();
        Ok(sources.into_iter().collect())
    }

    fn count_items(&mut self, source: Location) -> StoreResult<usize> {
        self.count("count");
        Ok(self.items.get(&source).map_or(0, VecMap::len))
    }

    fn seek_item(&mut self, source: Location, index: usize) -> StoreResult<Option<Location>> {
        self.count("seek");
        Ok(self
            .items
            .get(&source)
            .and_then(|items| items.get_index(index))
            .map(|(at, _)| *at))
    }

    fn page_items(
        &mut self,
        source: Location,
        from: Location,
        limit: usize,
    ) -> StoreResult<Vec<Item>> {
        self.count("page");
        let Some(items) = self.items.get(&source) else {
            return Ok(vec![]);
        };
        Ok(items
            .range_from(&from)
            .take(limit)
            .map(|(&at, &kind)| Item { at, kind })
            .collect())
    }

    fn item_index(&mut self, source: Location, at: Location) -> StoreResult<Option<usize>> {
        self.count("index");
        Ok(self.items.get(&source).and_then(|items| items.position(&at)))
    }

    fn functions_overlapping(
        &mut self,
        source: Location,
        lo: Location,
        hi: Location,
    ) -> StoreResult<Vec<RankedFunction>> {
        self.count("functions");
        let mut functions: Vec<_> = self.project.functions.iter().collect();
        functions.sort_by_key(|f| (f.start, f.source));
        let total = functions.len();
        Ok(functions
            .into_iter()
            .enumerate()
            .filter(|(_, f)| {
                f.source == source
                    && f.start <= hi
                    && Location::new(f.start.region, f.end) >= lo
            })
            .map(|(rank, f)| RankedFunction {
                record: f.clone(),
                rank,
                total,
            })
            .collect())
    }

    fn function_at(
        &mut self,
        source: Location,
        start: Location,
    ) -> StoreResult<Option<FunctionRecord>> {
        self.count("function");
        Ok(self
            .project
            .functions
            .iter()
            .find(|f| f.source == source && f.start == start)
            .cloned())
    }

    fn functions(&mut self, source: Location) -> StoreResult<Vec<FunctionRecord>> {
        self.count("functions");
        Ok(self.source_functions(source).into_iter().cloned().collect())
    }

    fn comments_in_range(
        &mut self,
        source: Location,
        lo: Location,
        hi: Location,
    ) -> StoreResult<Vec<CommentRecord>> {
        self.count("comments");
        let mut comments: Vec<_> = self
            .project
            .comments
            .iter()
            .filter(|c| c.scope == Some(source) && (lo..=hi).contains(&c.at))
            .cloned()
            .collect();
        comments.sort_by_key(|c| core::cmp::Reverse(c.context));
        Ok(comments)
    }

    fn recorded_call(
        &mut self,
        source: Location,
        at: Location,
    ) -> StoreResult<Option<FunctionRecord>> {
        self.count("call");
        let Some(target) = self
            .project
            .calls
            .iter()
            .find(|c| c.source == source && c.at == at)
            .map(|c| c.target)
        else {
            return Ok(None);
        };
        Ok(self
            .project
            .functions
            .iter()
            .find(|f| f.source == source && f.start == target)
            .cloned())
    }

    fn data_refs(&mut self, source: Location, code: Location) -> StoreResult<Vec<DataRef>> {
        self.count("data");
        let mut refs: Vec<_> = self
            .project
            .data
            .iter()
            .filter(|d| d.source == source && d.code == code)
            .cloned()
            .collect();
        refs.sort_by_key(|d| (d.data, d.read));
        Ok(refs)
    }

    fn data_comments(&mut self, cell: Location) -> StoreResult<Vec<CommentRecord>> {
        self.count("data comments");
        Ok(self
            .project
            .comments
            .iter()
            .filter(|c| c.scope.is_none() && c.at == cell)
            .cloned()
            .collect())
    }

    fn bytes(&mut self, source: Location, at: Location, len: usize) -> StoreResult<Vec<u8>> {
        self.count("bytes");
        let segment = self.project.segments.iter().find(|s| {
            s.source == source
                && s.start.region == at.region
                && at.address >= s.start.address
                && ((at.address - s.start.address) as usize) < s.bytes.len()
        });
        Ok(segment.map_or_else(Vec::new, |s| {
            let offset = (at.address - s.start.address) as usize;
            let end = (offset + len).min(s.bytes.len());
            s.bytes[offset..end].to_vec()
        }))
    }

    fn script(&mut self, source: Location) -> StoreResult<Vec<u8>> {
        self.count("script");
        let mut segments: Vec<_> = self
            .project
            .segments
            .iter()
            .filter(|s| s.source == source && s.kind == SegmentKind::Script)
            .collect();
        segments.sort_by_key(|s| s.start);
        Ok(segments.into_iter().flat_map(|s| s.bytes.iter().copied()).collect())
    }

    fn wram_refs(&mut self, first: u32, end: u32) -> StoreResult<Vec<WramRef>> {
        self.count("wram");
        let mut refs: Vec<_> = self
            .project
            .data
            .iter()
            .filter(|d| d.data.region == Region::Wram && (first..end).contains(&d.data.address))
            .collect();
        refs.sort_by_key(|d| (d.data.address, d.source, d.code));
        Ok(refs
            .into_iter()
            .map(|d| WramRef {
                data: d.data,
                code: d.code,
                function: self.enclosing_function(d.source, d.code).map(|f| f.name.clone()),
                comment: self
                    .project
                    .comments
                    .iter()
                    .filter(|c| c.scope.is_none() && c.at == d.data)
                    .min_by_key(|c| c.context)
                    .map(|c| c.text.clone()),
            })
            .collect())
    }

    fn rename_function(
        &mut self,
        source: Location,
        start: Location,
        name: &str,
    ) -> StoreResult<()> {
        self.count("rename");
        let function = self
            .project
            .functions
            .iter_mut()
            .find(|f| f.source == source && f.start == start)
            .ok_or_else(|| StoreError::Backend(format!("no function starts at {start}")))?;
        function.name = name.to_string();
        Ok(())
    }

    fn upsert_comment(&mut self, key: CommentKey, text: &str) -> StoreResult<()> {
        self.count("upsert");
        match self.project.comments.iter_mut().find(|c| c.key() == key) {
            Some(comment) => comment.text = text.to_string(),
            None => self.project.comments.push(CommentRecord {
                scope: key.scope,
                at: key.at,
                context: key.context,
                text: text.to_string(),
                length: None,
            }),
        }
        Ok(())
    }

    fn delete_comment(&mut self, key: CommentKey) -> StoreResult<()> {
        self.count("delete");
        self.project.comments.retain(|c| c.key() != key);
        self.reindex();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::project::{CodeRow, Segment};

    pub(crate) const SOURCE: Location = Location::rom(0xc0_0000);

    pub(crate) fn function(start: u32, end: u32, name: &str, context: u32) -> FunctionRecord {
        FunctionRecord {
            source: SOURCE,
            start: Location::rom(start),
            end,
            name: name.to_string(),
            context,
        }
    }

    pub(crate) fn code(at: u32) -> CodeRow {
        CodeRow {
            source: SOURCE,
            at: Location::rom(at),
            m: true,
            x: true,
        }
    }

    pub(crate) fn comment(at: Location, context: u32, text: &str) -> CommentRecord {
        CommentRecord {
            scope: Some(SOURCE),
            at,
            context,
            text: text.to_string(),
            length: None,
        }
    }

    pub(crate) fn asm(start: u32, bytes: &[u8]) -> Segment {
        Segment {
            source: SOURCE,
            kind: SegmentKind::Asm,
            start: Location::rom(start),
            bytes: bytes.to_vec(),
        }
    }

    fn store() -> MemoryStore {
        let mut project = Project::default();
        project.segments.push(asm(0x8000, &[0xea, 0xea, 0x60]));
        project.code.extend([code(0x8000), code(0x8001), code(0x8002)]);
        project.comments.push(CommentRecord {
            length: Some(4),
            ..comment(Location::rom(0x9000), 0, "table")
        });
        project.functions.push(function(0x8001, 0x8002, "second", 0));
        project.functions.push(function(0x8000, 0x8000, "first", 0));
        MemoryStore::new(project)
    }

    #[test]
    fn items_are_code_and_data_in_order() {
        let mut store = store();
        assert_eq!(store.count_items(SOURCE), Ok(4));
        assert_eq!(store.seek_item(SOURCE, 3), Ok(Some(Location::rom(0x9000))));
        assert_eq!(store.seek_item(SOURCE, 4), Ok(None));
        let page = store.page_items(SOURCE, Location::rom(0x8001), 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[1].at, Location::rom(0x8002));
        assert_eq!(
            page[0].kind,
            ItemKind::Code {
                acc16: false,
                idx16: false
            }
        );
        assert_eq!(
            store.item_index(SOURCE, Location::rom(0x9000)),
            Ok(Some(3))
        );
        assert_eq!(store.count_items(Location::rom(0)), Ok(0));
    }

    #[test]
    fn functions_are_ranked_by_start() {
        let mut store = store();
        let ranked = store
            .functions_overlapping(SOURCE, Location::rom(0x8001), Location::rom(0x8002))
            .unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].record.name, "second");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[0].highlight(), 0.5);
    }

    #[test]
    fn rank_counts_functions_of_every_source() {
        let mut store = store();
        store.project.functions.push(FunctionRecord {
            source: Location::rom(0xc1_0000),
            start: Location::rom(0xc1_8000),
            end: 0xc1_80ff,
            name: "elsewhere".into(),
            context: 0,
        });
        let ranked = store
            .functions_overlapping(SOURCE, Location::rom(0x8000), Location::rom(0x8002))
            .unwrap();
        let ranks: Vec<_> = ranked.iter().map(|f| (f.record.name.as_str(), f.rank, f.total)).collect();
        assert_eq!(ranks, [("first", 0, 3), ("second", 1, 3)]);
        let other = store
            .functions_overlapping(
                Location::rom(0xc1_0000),
                Location::rom(0xc1_8000),
                Location::rom(0xc1_8000),
            )
            .unwrap();
        assert_eq!(other[0].rank, 2);
        assert!((other[0].highlight() - 2.0 / 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn wram_refs_cover_an_address_range() {
        let mut project = Project::default();
        for (code, data) in [(0x8000, 0x10), (0x8001, 0x10), (0x8002, 0x11), (0x8003, 0x12)] {
            project.data.push(DataRef {
                source: SOURCE,
                code: Location::rom(code),
                data: Location::wram(data),
                read: true,
            });
        }
        let mut store = MemoryStore::new(project);
        let refs = store.wram_refs(0x10, 0x12).unwrap();
        let cells: Vec<_> = refs.iter().map(|r| r.data.address).collect();
        assert_eq!(cells, [0x10, 0x10, 0x11]);
        assert!(store.wram_refs(0x13, 0x20).unwrap().is_empty());
    }

    #[test]
    fn bytes_stop_at_segment_end() {
        let mut store = store();
        assert_eq!(
            store.bytes(SOURCE, Location::rom(0x8001), 4),
            Ok(vec![0xea, 0x60])
        );
        assert_eq!(store.bytes(SOURCE, Location::rom(0x8003), 4), Ok(vec![]));
        assert_eq!(store.queries("bytes"), 2);
    }

    #[test]
    fn comment_upsert_and_delete() {
        let mut store = store();
        let key = CommentKey {
            scope: Some(SOURCE),
            at: Location::rom(0x8000),
            context: 0,
        };
        store.upsert_comment(key, "hello").unwrap();
        store.upsert_comment(key, "hello again").unwrap();
        let comments = store
            .comments_in_range(SOURCE, Location::rom(0x8000), Location::rom(0x8000))
            .unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "hello again");
        store.delete_comment(key).unwrap();
        assert_eq!(store.count_items(SOURCE), Ok(4));
        let data = CommentKey {
            at: Location::rom(0x9000),
            ..key
        };
        store.delete_comment(data).unwrap();
        assert_eq!(store.count_items(SOURCE), Ok(3));
    }
}
