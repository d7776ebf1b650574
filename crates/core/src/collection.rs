//! Named collections of the backing record store.

/// A collection (table) exposed by the record store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    WatchedMovies,
    Ratings,
}

impl Collection {
    pub const ALL: [Collection; 3] =
        [Collection::Users, Collection::WatchedMovies, Collection::Ratings];

    /// Name of the collection as known by the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::WatchedMovies => "watched_movies",
            Collection::Ratings => "ratings",
        }
    }

    /// Columns that uniquely identify a row for upsert purposes.
    pub fn conflict_keys(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["id"],
            Collection::WatchedMovies => &["id"],
            Collection::Ratings => &["user_id", "movie_id"],
        }
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
