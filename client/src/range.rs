use crate::errors::ClientError;

/// Range metadata from a `Content-Range: items <first>-<last>/<count>` header.
///
/// `last` is signed because servers answer a zero-limit request with
/// `items 0--1/<count>`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ContentRange {
    pub first: i64,
    pub last: i64,
    pub count: u64,
}

impl ContentRange {
    /// True when `last` is the final record of the collection.
    pub fn is_last_page(&self) -> bool {
        self.last + 1 >= self.count as i64
    }
}

impl std::fmt::Display for ContentRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "items {}-{}/{}", self.first, self.last, self.count)
    }
}

impl std::str::FromStr for ContentRange {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ClientError::Decode(format!("Invalid Content-Range header: {:?}", s));

        let rest = s.trim().strip_prefix("items ").ok_or_else(invalid)?;
        let (span, count) = rest.split_once('/').ok_or_else(invalid)?;
        let (first, last) = span.split_once('-').ok_or_else(invalid)?;

        Ok(ContentRange {
            first: first.trim().parse().map_err(|_| invalid())?,
            last: last.trim().parse().map_err(|_| invalid())?,
            count: count.trim().parse().map_err(|_| invalid())?,
        })
    }
}
