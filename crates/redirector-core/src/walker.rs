//! Lazy depth-first enumeration of a remote subtree
//!
//! [`TreeWalk`] yields every file below a folder together with the file's
//! effective public flag: public if any folder on the way down (or the
//! starting flag) was public, or if the file's own link is public.
//! Children are listed one page at a time; a page shorter than the page
//! size ends that folder's listing.

use std::collections::VecDeque;

use crate::Result;
use crate::model::RemoteObject;
use crate::publicity::is_effectively_public;
use crate::remote::{OBJECT_FIELDS, RemoteStore};

/// Children requested per listing call
pub const ITEM_PAGE_LIMIT: usize = 1000;

/// A file reached by the walk and whether it should be public
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub file: RemoteObject,
    pub public: bool,
}

/// Factory for subtree walks against one remote store
pub struct TreeWalker<'a, R: ?Sized> {
    remote: &'a R,
    page_size: usize,
}

impl<'a, R: RemoteStore + ?Sized> TreeWalker<'a, R> {
    pub fn new(remote: &'a R) -> Self {
        Self {
            remote,
            page_size: ITEM_PAGE_LIMIT,
        }
    }

    /// Override the listing page size. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Start a fresh walk below `folder_id`.
    pub fn walk(&self, folder_id: &str, inherited_public: bool) -> TreeWalk<'a, R> {
        TreeWalk {
            remote: self.remote,
            page_size: self.page_size,
            stack: vec![Frame::new(folder_id.to_string(), inherited_public)],
            failed: false,
        }
    }
}

#[derive(Debug)]
struct Frame {
    folder_id: String,
    inherited_public: bool,
    offset: usize,
    pending: VecDeque<RemoteObject>,
    exhausted: bool,
}

impl Frame {
    fn new(folder_id: String, inherited_public: bool) -> Self {
        Self {
            folder_id,
            inherited_public,
            offset: 0,
            pending: VecDeque::new(),
            exhausted: false,
        }
    }
}

/// In-progress walk; see [`TreeWalker::walk`]
///
/// Yields `Err` at most once, after which the walk is over.
pub struct TreeWalk<'a, R: ?Sized> {
    remote: &'a R,
    page_size: usize,
    stack: Vec<Frame>,
    failed: bool,
}

impl<R: RemoteStore + ?Sized> TreeWalk<'_, R> {
    fn step(&mut self) -> Result<Option<WalkedFile>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };

            if let Some(item) = frame.pending.pop_front() {
                let public = frame.inherited_public || is_effectively_public(&item)?;
                if item.is_folder() {
                    self.stack.push(Frame::new(item.id, public));
                    continue;
                }
                return Ok(Some(WalkedFile { file: item, public }));
            }

            if frame.exhausted {
                self.stack.pop();
                continue;
            }

            let page = self.remote.list_folder_items(
                &frame.folder_id,
                self.page_size,
                frame.offset,
                OBJECT_FIELDS,
            )?;
            tracing::trace!(
                folder_id = %frame.folder_id,
                offset = frame.offset,
                count = page.items.len(),
                "Listed folder page"
            );
            frame.offset += page.entries;
            frame.exhausted = page.entries < self.page_size;
            frame.pending.extend(page.items);
        }
    }
}

impl<R: RemoteStore + ?Sized> Iterator for TreeWalk<'_, R> {
    type Item = Result<WalkedFile>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(item) => item.map(Ok),
            Err(e) => {
                self.failed = true;
                self.stack.clear();
                Some(Err(e))
            }
        }
    }
}
