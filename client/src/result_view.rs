//! Deferred, composable views over a remote collection.
//!
//! Builder calls return new views and never touch the receiver. Records are
//! only fetched by the eager operations (`count`, `first`, `exists`, `get`)
//! and by iteration through a [`PageCursor`].

use std::ops::{Bound, Range, RangeBounds};
use std::sync::Arc;

use futures::Stream;
use rql::{parse_query, Expr, Value as RqlValue};
use serde_json::{Map, Value};

use crate::cursor::{CursorState, PageCursor};
use crate::errors::ClientError;
use crate::projection::project;
use crate::range::ContentRange;
use crate::transport::Transport;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Result of [`ResultView::values`].
#[derive(Debug)]
pub enum Values {
    /// The view was already materialized; projections computed immediately.
    Ready(Vec<Map<String, Value>>),
    /// A new view that projects each record while iterating.
    Deferred(ResultView),
}

pub struct ResultView {
    transport: Arc<dyn Transport>,
    path: String,
    filter: Expr,
    select: Vec<String>,
    order: Vec<String>,
    search: Option<String>,
    page_size: usize,
    offset: usize,
    window: Option<Range<usize>>,
    projection: Option<Vec<String>>,
    // Fetch-time state, reset on every copy.
    pub(crate) cache: Option<Vec<Value>>,
    pub(crate) complete: bool,
    pub(crate) range: Option<ContentRange>,
}

impl Clone for ResultView {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            path: self.path.clone(),
            filter: self.filter.clone(),
            select: self.select.clone(),
            order: self.order.clone(),
            search: self.search.clone(),
            page_size: self.page_size,
            offset: self.offset,
            window: self.window.clone(),
            projection: self.projection.clone(),
            cache: None,
            complete: false,
            range: None,
        }
    }
}

impl std::fmt::Debug for ResultView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultView")
            .field("path", &self.path)
            .field("query", &self.query_string())
            .field("search", &self.search)
            .field("page_size", &self.page_size)
            .field("offset", &self.offset)
            .field("window", &self.window)
            .field("projection", &self.projection)
            .field("cached", &self.cache.as_ref().map(Vec::len))
            .field("range", &self.range)
            .finish()
    }
}

fn validate_fields<I, S>(what: &str, fields: I) -> Result<Vec<String>, ClientError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| {
            let field = field.as_ref();
            let name = field.strip_prefix('-').unwrap_or(field);
            let malformed = name.is_empty()
                || name
                    .chars()
                    .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '&'));
            if malformed {
                return Err(ClientError::invalid_input(format!(
                    "Invalid {} field name: {:?}",
                    what, field
                )));
            }
            Ok(field.to_string())
        })
        .collect()
}

impl ResultView {
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<String>) -> Self {
        Self {
            transport,
            path: path.into(),
            filter: Expr::empty(),
            select: Vec::new(),
            order: Vec::new(),
            search: None,
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            window: None,
            projection: None,
            cache: None,
            complete: false,
            range: None,
        }
    }

    /// Copy of this view with one aspect changed by `change`.
    fn with_changes(&self, change: impl FnOnce(&mut Self)) -> Self {
        let mut view = self.clone();
        change(&mut view);
        view
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn filter_expr(&self) -> &Expr {
        &self.filter
    }

    pub fn selected(&self) -> &[String] {
        &self.select
    }

    pub fn ordering(&self) -> &[String] {
        &self.order
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute `[start, stop)` window of a sliced view.
    pub fn window(&self) -> Option<Range<usize>> {
        self.window.clone()
    }

    pub fn is_bounded(&self) -> bool {
        self.window.is_some()
    }

    pub fn projection(&self) -> Option<&[String]> {
        self.projection.as_deref()
    }

    /// Records materialized so far, `None` before the first page fetch.
    pub fn cached(&self) -> Option<&[Value]> {
        self.cache.as_deref()
    }

    /// Range metadata of the most recent response that carried it.
    pub fn range(&self) -> Option<ContentRange> {
        self.range
    }

    pub fn filter(&self, expr: Expr) -> Self {
        self.with_changes(|view| view.filter = view.filter.and(&expr))
    }

    /// Adds an already-rendered RQL fragment such as `eq(a,1)&lt(b,2)`.
    pub fn filter_raw(&self, rql: &str) -> Result<Self, ClientError> {
        let rql = rql.trim();
        if rql.is_empty() {
            return Err(ClientError::invalid_input("Raw filter must not be empty"));
        }
        let expr = parse_query(rql)?
            .iter()
            .fold(Expr::empty(), |acc, term| acc.and(&Expr::raw(term.to_string())));
        Ok(self.filter(expr))
    }

    /// Adds `name__operator` lookups, see [`Expr::from_lookups`].
    pub fn filter_by<K, V, I>(&self, lookups: I) -> Result<Self, ClientError>
    where
        K: AsRef<str>,
        V: Into<RqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let expr = Expr::from_lookups(lookups)?;
        Ok(self.filter(expr))
    }

    /// Fields to return; a `-` prefix excludes a field instead.
    pub fn select<I, S>(&self, fields: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let select = validate_fields("select", fields)?;
        Ok(self.with_changes(|view| view.select = select))
    }

    /// Sort fields; a `-` prefix sorts descending.
    pub fn order_by<I, S>(&self, fields: I) -> Result<Self, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let order = validate_fields("ordering", fields)?;
        Ok(self.with_changes(|view| view.order = order))
    }

    pub fn search(&self, term: &str) -> Self {
        let term = term.trim();
        self.with_changes(|view| {
            view.search = if term.is_empty() {
                None
            } else {
                Some(term.to_string())
            }
        })
    }

    pub fn limit(&self, page_size: usize) -> Result<Self, ClientError> {
        self.configure(Some(page_size), None)
    }

    pub fn configure(
        &self,
        page_size: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Self, ClientError> {
        if page_size == Some(0) {
            return Err(ClientError::invalid_input("Page size must be positive"));
        }
        let window = match (offset, &self.window) {
            (Some(offset), Some(window)) => {
                let stop = offset.checked_add(window.len()).ok_or_else(|| {
                    ClientError::invalid_input(format!("Offset {} overflows the window", offset))
                })?;
                Some(offset..stop)
            }
            _ => self.window.clone(),
        };
        Ok(self.with_changes(|view| {
            if let Some(page_size) = page_size {
                view.page_size = page_size;
            }
            if let Some(offset) = offset {
                view.offset = offset;
            }
            view.window = window;
        }))
    }

    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Bounded view over `range`, relative to this view's offset. No I/O.
    ///
    /// Slicing a bounded view intersects the new window with the old one.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Result<Self, ClientError> {
        let overflow = || ClientError::invalid_input("Slice bounds overflow the record offset");
        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).ok_or_else(overflow)?,
            Bound::Unbounded => 0,
        };
        let stop = match range.end_bound() {
            Bound::Included(&n) => Some(n.checked_add(1).ok_or_else(overflow)?),
            Bound::Excluded(&n) => Some(n),
            Bound::Unbounded => None,
        };
        if let Some(stop) = stop {
            if start > stop {
                return Err(ClientError::invalid_input(format!(
                    "Slice start {} is past its stop {}",
                    start, stop
                )));
            }
        }

        let absolute_start = self.offset.checked_add(start).ok_or_else(overflow)?;
        let absolute_stop = match stop {
            Some(stop) => Some(self.offset.checked_add(stop).ok_or_else(overflow)?),
            None => None,
        };
        let window = match (&self.window, absolute_stop) {
            (Some(current), Some(stop)) => {
                Some(absolute_start.min(current.end)..stop.min(current.end))
            }
            (Some(current), None) => Some(absolute_start.min(current.end)..current.end),
            (None, Some(stop)) => Some(absolute_start..stop),
            (None, None) => None,
        };

        // The cursor keeps fetching pages until the window is filled.
        Ok(self.with_changes(|view| match window {
            Some(window) => {
                view.offset = window.start;
                view.page_size = view.page_size.min(window.len()).max(1);
                view.window = Some(window);
            }
            None => view.offset = absolute_start,
        }))
    }

    /// `select(...)`, the rendered filter and `ordering(...)`, `&`-joined.
    pub fn query_string(&self) -> String {
        let mut parts = Vec::new();
        if !self.select.is_empty() {
            parts.push(format!("select({})", self.select.join(",")));
        }
        let filter = self.filter.render();
        if !filter.is_empty() {
            parts.push(filter);
        }
        if !self.order.is_empty() {
            parts.push(format!("ordering({})", self.order.join(",")));
        }
        parts.join("&")
    }

    pub(crate) fn request_url(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, query)
        }
    }

    pub(crate) fn request_params(&self, limit: usize, offset: usize) -> Vec<(String, String)> {
        let mut params = vec![
            ("limit".to_string(), limit.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
        }
        params
    }

    /// Fetches one page and records its range metadata on the view.
    pub(crate) async fn fetch_page(
        &mut self,
        url: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Value>, Option<ContentRange>), ClientError> {
        let params = self.request_params(limit, offset);
        tracing::debug!("Fetching {} offset={} limit={}", url, offset, limit);

        let page = self.transport.fetch(url, &params).await?;
        let range = match &page.content_range {
            Some(header) => Some(header.parse::<ContentRange>()?),
            None => None,
        };
        if range.is_some() {
            self.range = range;
        }
        Ok((page.records, range))
    }

    pub(crate) fn shape(&self, record: Value) -> Value {
        match &self.projection {
            Some(fields) => Value::Object(project(&record, fields)),
            None => record,
        }
    }

    fn window_len(&self) -> Option<usize> {
        self.window.as_ref().map(|window| window.len())
    }

    fn materialized(&self) -> Option<&[Value]> {
        if self.complete {
            self.cache.as_deref()
        } else {
            None
        }
    }

    /// Total matching records as reported by the server.
    ///
    /// Issues a single zero-limit request the first time; later calls use the
    /// cached range. `None` when the server sends no range metadata.
    pub async fn count(&mut self) -> Result<Option<u64>, ClientError> {
        if let Some(range) = self.range {
            return Ok(Some(range.count));
        }
        let url = self.request_url();
        self.fetch_page(&url, 0, self.offset).await?;
        Ok(self.range.map(|range| range.count))
    }

    pub async fn first(&mut self) -> Result<Option<Value>, ClientError> {
        self.get(0).await
    }

    pub async fn exists(&mut self) -> Result<bool, ClientError> {
        if let Some(cached) = &self.cache {
            if self.complete || !cached.is_empty() {
                return Ok(!cached.is_empty());
            }
        }
        Ok(self.get(0).await?.is_some())
    }

    /// Record at `index` relative to the view.
    ///
    /// Served from the cache when it holds the index, otherwise a one-record
    /// fetch; bounded views return `None` past their window without I/O.
    pub async fn get(&mut self, index: usize) -> Result<Option<Value>, ClientError> {
        if let Some(record) = self.cache.as_ref().and_then(|cache| cache.get(index)) {
            return Ok(Some(self.shape(record.clone())));
        }
        if self.window_len().is_some_and(|len| index >= len) {
            return Ok(None);
        }
        if self.materialized().is_some() {
            return Ok(None);
        }
        let url = self.request_url();
        let (records, _) = self.fetch_page(&url, 1, self.offset + index).await?;
        Ok(records.into_iter().next().map(|record| self.shape(record)))
    }

    /// Flat projection of `fields` (dotted paths) for every record.
    pub fn values<I, S>(&self, fields: I) -> Result<Values, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let fields = validate_fields("projection", fields)?;
        if let Some(records) = self.materialized() {
            return Ok(Values::Ready(
                records.iter().map(|record| project(record, &fields)).collect(),
            ));
        }
        Ok(Values::Deferred(
            self.with_changes(|view| view.projection = Some(fields)),
        ))
    }

    /// Starts a page walk, or a replay of the cache once a walk has finished.
    pub fn cursor(&mut self) -> PageCursor<'_> {
        PageCursor::new(self)
    }

    pub async fn collect_records(&mut self) -> Result<Vec<Value>, ClientError> {
        let mut records = Vec::new();
        let mut cursor = self.cursor();
        while let Some(record) = cursor.next_record().await? {
            records.push(record);
        }
        Ok(records)
    }

    /// Consumes the view into a stream of records.
    pub fn into_stream(self) -> impl Stream<Item = Result<Value, ClientError>> + Send {
        let state = CursorState::new(&self);
        futures::stream::try_unfold((self, state), |(mut view, mut state)| async move {
            let record = state.advance(&mut view).await?;
            Ok(record.map(|record| (record, (view, state))))
        })
    }
}
