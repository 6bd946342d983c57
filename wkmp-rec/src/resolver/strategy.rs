//! Catalog query formulations, tried in order until one yields an
//! acceptable match

use crate::types::AbstractSong;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// `track:"T" artist:"A"`
    FieldScoped,
    /// `T A`
    FreeText,
}

impl SearchStrategy {
    /// Strict first, then loose
    pub const ORDER: [SearchStrategy; 2] = [SearchStrategy::FieldScoped, SearchStrategy::FreeText];

    pub fn query(self, song: &AbstractSong) -> String {
        match self {
            SearchStrategy::FieldScoped => {
                format!("track:\"{}\" artist:\"{}\"", song.title, song.artist)
            }
            SearchStrategy::FreeText => format!("{} {}", song.title, song.artist),
        }
    }

    /// Recorded on the resolved track
    pub fn label(self) -> &'static str {
        match self {
            SearchStrategy::FieldScoped => "field_scoped",
            SearchStrategy::FreeText => "free_text",
        }
    }
}
