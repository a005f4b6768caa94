//! # Dashboard
//!
//! A user's own content, bookmarks, and the engagement totals across
//! everything they published.

use serde::{Deserialize, Serialize};

use crate::models::{ArticleView, CadModelView, SavedArticleView, SavedCadModelView, Stats};

/// Summed engagement counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTotals {
    pub views: i64,
    pub likes: i64,
    pub comments: i64,
}

impl StatTotals {
    pub fn add(mut self, stats: &Stats) -> Self {
        self.views += stats.views;
        self.likes += stats.likes;
        self.comments += stats.comments;
        self
    }

    /// Sums every row; content without a Stats row contributes zero.
    pub fn from_stats<'a, I>(stats: I) -> Self
    where
        I: IntoIterator<Item = &'a Stats>,
    {
        stats.into_iter().fold(Self::default(), Self::add)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub articles: Vec<ArticleView>,
    pub cad_models: Vec<CadModelView>,
    pub stats: StatTotals,
    pub saved_articles: Vec<SavedArticleView>,
    pub saved_cad_models: Vec<SavedCadModelView>,
}
