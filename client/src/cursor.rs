//! Page-by-page walk over a [`ResultView`].
//!
//! States: not started, loaded (a page is being handed out), exhausted.
//! A view whose previous walk ran to completion is replayed from its cache.

use serde_json::Value;

use crate::errors::ClientError;
use crate::range::ContentRange;
use crate::result_view::ResultView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    NotStarted,
    Loaded,
    Replaying(usize),
    Exhausted,
}

#[derive(Debug)]
pub(crate) struct CursorState {
    url: String,
    phase: Phase,
    next_offset: usize,
    fetched: usize,
    last_range: Option<ContentRange>,
    page: std::vec::IntoIter<Value>,
}

impl CursorState {
    pub(crate) fn new(view: &ResultView) -> Self {
        let phase = if view.complete && view.cache.is_some() {
            Phase::Replaying(0)
        } else {
            Phase::NotStarted
        };
        Self {
            url: view.request_url(),
            phase,
            next_offset: view.offset(),
            fetched: 0,
            last_range: None,
            page: Vec::new().into_iter(),
        }
    }

    /// Limit of the next request, or `None` when the walk is over.
    fn next_limit(&self, view: &ResultView) -> Option<usize> {
        let remaining = view.window().map(|window| window.len() - self.fetched.min(window.len()));
        if remaining == Some(0) {
            return None;
        }
        if self.phase == Phase::Loaded && self.last_range.is_some_and(|r| r.is_last_page()) {
            return None;
        }
        Some(match remaining {
            Some(remaining) => remaining.min(view.page_size()),
            None => view.page_size(),
        })
    }

    pub(crate) async fn advance(
        &mut self,
        view: &mut ResultView,
    ) -> Result<Option<Value>, ClientError> {
        loop {
            match self.phase {
                Phase::Exhausted => return Ok(None),
                Phase::Replaying(index) => {
                    let record = view.cache.as_ref().and_then(|cache| cache.get(index)).cloned();
                    return Ok(match record {
                        Some(record) => {
                            self.phase = Phase::Replaying(index + 1);
                            Some(view.shape(record))
                        }
                        None => {
                            self.phase = Phase::Exhausted;
                            None
                        }
                    });
                }
                Phase::NotStarted | Phase::Loaded => {
                    if let Some(record) = self.page.next() {
                        return Ok(Some(view.shape(record)));
                    }
                    let Some(limit) = self.next_limit(view) else {
                        self.finish(view);
                        return Ok(None);
                    };
                    if let Err(e) = self.load_page(view, limit).await {
                        self.phase = Phase::Exhausted;
                        return Err(e);
                    }
                }
            }
        }
    }

    async fn load_page(&mut self, view: &mut ResultView, limit: usize) -> Result<(), ClientError> {
        let first_page = self.phase == Phase::NotStarted;
        let offset = self.next_offset;
        if first_page {
            view.complete = false;
        }

        let (records, range) = view.fetch_page(&self.url, limit, offset).await?;
        self.last_range = range;

        if records.is_empty() {
            if first_page {
                view.cache = Some(Vec::new());
            } else {
                // Earlier metadata promised more records than the server returned
                tracing::warn!(
                    "Empty page at offset {} of {} (range {:?}), stopping",
                    offset,
                    self.url,
                    self.last_range
                );
            }
            self.finish(view);
            return Ok(());
        }

        self.fetched += records.len();
        self.next_offset = if view.is_bounded() {
            offset + records.len()
        } else {
            offset + view.page_size()
        };
        match (&mut view.cache, first_page) {
            (Some(cache), false) => cache.extend(records.iter().cloned()),
            (cache, _) => *cache = Some(records.clone()),
        }
        self.page = records.into_iter();
        self.phase = Phase::Loaded;
        Ok(())
    }

    fn finish(&mut self, view: &mut ResultView) {
        self.phase = Phase::Exhausted;
        view.complete = true;
    }
}

/// Lazily fetching iterator over a view's records.
///
/// Fetched pages are written back into the owning view, so `count()` and
/// `range()` observed after a walk reflect the latest response.
pub struct PageCursor<'a> {
    view: &'a mut ResultView,
    state: CursorState,
}

impl<'a> PageCursor<'a> {
    pub(crate) fn new(view: &'a mut ResultView) -> Self {
        let state = CursorState::new(view);
        Self { view, state }
    }

    pub async fn next_record(&mut self) -> Result<Option<Value>, ClientError> {
        self.state.advance(&mut *self.view).await
    }

    pub fn range(&self) -> Option<ContentRange> {
        self.view.range()
    }

    pub fn is_exhausted(&self) -> bool {
        self.state.phase == Phase::Exhausted
    }
}
