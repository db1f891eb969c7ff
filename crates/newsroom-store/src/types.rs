use serde::{Deserialize, Serialize};

/// Lifecycle state of an article.
///
/// The sweeper only ever moves Draft → Published; nothing in this subsystem
/// transitions an article back to Draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleStatus {
    /// Not visible to readers; eligible for scheduled publication.
    Draft,
    /// Live. The sweeper never touches articles in this state.
    Published,
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::Published => "published",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ArticleStatus::Draft),
            "published" => Ok(ArticleStatus::Published),
            other => Err(format!("unknown article status: {other}")),
        }
    }
}

/// A persisted news article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// UUID v4 string — primary key.
    pub id: String,
    pub title: String,
    pub content: String,
    /// Author label recorded at creation time.
    pub author: String,
    /// Current lifecycle state.
    pub status: ArticleStatus,
    /// ISO-8601 UTC instant of scheduled publication. `None` means the
    /// article is only published by explicit user action.
    pub publish_at: Option<String>,
    /// ISO-8601 timestamp of article creation.
    pub created_at: String,
    /// ISO-8601 timestamp of the last edit.
    pub updated_at: String,
}

/// Fields required to create an article. New articles always start as Draft.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub author: String,
    pub publish_at: Option<String>,
}

/// Partial update — `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<ArticleStatus>,
    pub publish_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_str() {
        for status in [ArticleStatus::Draft, ArticleStatus::Published] {
            let s = status.to_string();
            assert_eq!(ArticleStatus::from_str(&s).unwrap(), status);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(ArticleStatus::from_str("archived").is_err());
    }
}
