//! Query interface to the annotation database.
//!
//! Every method is one query shape. Paging goes through
//! [`Store::count_items`], [`Store::seek_item`] and [`Store::page_items`]
//! so that the cost of a page never depends on how far into a source it is.

use crate::addr_space::Location;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("connection to the annotation store was lost")]
    ConnectionLost,
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionLost)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Asm,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Code { acc16: bool, idx16: bool },
    /// A data span of `length` bytes, declared by a comment.
    Data { length: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    pub at: Location,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FunctionRecord {
    pub source: Location,
    pub start: Location,
    pub end: u32,
    pub name: String,
    #[serde(default)]
    pub context: u32,
}

impl FunctionRecord {
    pub fn contains(&self, at: Location) -> bool {
        at.region == self.start.region && (self.start.address..=self.end).contains(&at.address)
    }
}

/// A function together with its position among all functions of its source.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedFunction {
    pub record: FunctionRecord,
    pub rank: usize,
    pub total: usize,
}

impl RankedFunction {
    pub fn highlight(&self) -> f32 {
        self.rank as f32 / self.total.max(1) as f32
    }
}

/// `scope` is the owning source, or `None` for comments on data memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommentKey {
    pub scope: Option<Location>,
    pub at: Location,
    pub context: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Location>,
    pub at: Location,
    #[serde(default)]
    pub context: u32,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

impl CommentRecord {
    pub fn key(&self) -> CommentKey {
        CommentKey {
            scope: self.scope,
            at: self.at,
            context: self.context,
        }
    }
}

/// A control transfer recorded by an earlier static pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CallRecord {
    pub source: Location,
    pub at: Location,
    pub target: Location,
}

/// A memory cell touched by the instruction at `code`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataRef {
    pub source: Location,
    pub code: Location,
    pub data: Location,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WramRef {
    pub data: Location,
    pub code: Location,
    pub function: Option<String>,
    pub comment: Option<String>,
}

pub trait Store {
    fn reconnect(&mut self) -> StoreResult<()>;

    fn sources(&mut self, kind: SegmentKind) -> StoreResult<Vec<Location>>;

    fn count_items(&mut self, source: Location) -> StoreResult<usize>;

    fn seek_item(&mut self, source: Location, index: usize) -> StoreResult<Option<Location>>;

    fn page_items(&mut self, source: Location, from: Location, limit: usize)
    -> StoreResult<Vec<Item>>;

    fn item_index(&mut self, source: Location, at: Location) -> StoreResult<Option<usize>>;

    /// Functions intersecting `lo..=hi`, ranked by start among the functions of `source`.
    fn functions_overlapping(
        &mut self,
        source: Location,
        lo: Location,
        hi: Location,
    ) -> StoreResult<Vec<RankedFunction>>;

    fn function_at(
        &mut self,
        source: Location,
        start: Location,
    ) -> StoreResult<Option<FunctionRecord>>;

    fn functions(&mut self, source: Location) -> StoreResult<Vec<FunctionRecord>>;

    /// Comments of `source` in `lo..=hi`, highest context first.
    fn comments_in_range(
        &mut self,
        source: Location,
        lo: Location,
        hi: Location,
    ) -> StoreResult<Vec<CommentRecord>>;

    /// The function a recorded call at `at` lands on.
    fn recorded_call(&mut self, source: Location, at: Location)
    -> StoreResult<Option<FunctionRecord>>;

    /// Cells touched by the instruction at `code`, ordered by (cell, read).
    fn data_refs(&mut self, source: Location, code: Location) -> StoreResult<Vec<DataRef>>;

    fn data_comments(&mut self, cell: Location) -> StoreResult<Vec<CommentRecord>>;

    /// Up to `len` bytes starting at `at`. Shorter at the end of a segment.
    fn bytes(&mut self, source: Location, at: Location, len: usize) -> StoreResult<Vec<u8>>;

    fn script(&mut self, source: Location) -> StoreResult<Vec<u8>>;

    /// Every reference to work RAM addresses in `first..end`, by address.
    fn wram_refs(&mut self, first: u32, end: u32) -> StoreResult<Vec<WramRef>>;

    fn rename_function(&mut self, source: Location, start: Location, name: &str)
    -> StoreResult<()>;

    fn upsert_comment(&mut self, key: CommentKey, text: &str) -> StoreResult<()>;

    fn delete_comment(&mut self, key: CommentKey) -> StoreResult<()>;
}

/// Retries a query once after reconnecting when the connection drops.
///
/// A second failure is returned to the caller as is.
#[derive(Debug, Clone, Default)]
pub struct Reconnecting<S> {
    inner: S,
}

impl<S: Store> Reconnecting<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn retry<T>(&mut self, mut query: impl FnMut(&mut S) -> StoreResult<T>) -> StoreResult<T> {
        match query(&mut self.inner) {
            Err(err) if err.is_transient() => {
                log::warn!("{err}, reconnecting");
                self.inner.reconnect()?;
                query(&mut self.inner)
            }
            res => res,
        }
    }
}

macro_rules! reconnecting_queries {
    ($(fn $name:ident(&mut self $(, $arg:ident: $ty:ty)*) -> $ret:ty;)*) => {
        impl<S: Store> Store for Reconnecting<S> {
            fn reconnect(&mut self) -> StoreResult<()> {
                self.inner.reconnect()
            }

            $(
                fn $name(&mut self $(, $arg: $ty)*) -> StoreResult<$ret> {
                    self.retry(|store| store.$name($($arg),*))
                }
            )*
        }
    };
}

reconnecting_queries! {
    fn sources(&mut self, kind: SegmentKind) -> Vec<Location>;
    fn count_items(&mut self, source: Location) -> usize;
    fn seek_item(&mut self, source: Location, index: usize) -> Option<Location>;
    fn page_items(&mut self, source: Location, from: Location, limit: usize) -> Vec<Item>;
    fn item_index(&mut self, source: Location, at: Location) -> Option<usize>;
    fn functions_overlapping(&mut self, source: Location, lo: Location, hi: Location) -> Vec<RankedFunction>;
    fn function_at(&mut self, source: Location, start: Location) -> Option<FunctionRecord>;
    fn functions(&mut self, source: Location) -> Vec<FunctionRecord>;
    fn comments_in_range(&mut self, source: Location, lo: Location, hi: Location) -> Vec<CommentRecord>;
    fn recorded_call(&mut self, source: Location, at: Location) -> Option<FunctionRecord>;
    fn data_refs(&mut self, source: Location, code: Location) -> Vec<DataRef>;
    fn data_comments(&mut self, cell: Location) -> Vec<CommentRecord>;
    fn bytes(&mut self, source: Location, at: Location, len: usize) -> Vec<u8>;
    fn script(&mut self, source: Location) -> Vec<u8>;
    fn wram_refs(&mut self, first: u32, end: u32) -> Vec<WramRef>;
    fn rename_function(&mut self, source: Location, start: Location, name: &str) -> ();
    fn upsert_comment(&mut self, key: CommentKey, text: &str) -> ();
    fn delete_comment(&mut self, key: CommentKey) -> ();
}
