//! Query options: sort, limit, skip (§4.D).

/// Sort direction: `1` ascending, `-1` descending, matching the wire
/// convention in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Parse the `1`/`-1` wire convention.
    #[must_use]
    pub const fn from_sign(sign: i32) -> Self {
        if sign < 0 {
            Self::Descending
        } else {
            Self::Ascending
        }
    }
}

/// Options accompanying a filter translation: sort keys (in order), a
/// limit, and a skip (offset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub sort: Vec<(String, SortDirection)>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_skip(mut self, skip: i64) -> Self {
        self.skip = Some(skip);
        self
    }
}
