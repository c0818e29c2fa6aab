use chrono::Utc;
use mcn_core::{Article, Error, Result, StorySubmission};
use uuid::Uuid;

pub const DEFAULT_CONTRIBUTOR: &str = "Community Contributor";
pub const COMMUNITY_SOURCE: &str = "Community Submission";
pub const SUBMITTED_MESSAGE: &str = "Your story has been submitted successfully! Generating a cover image...";

/// Check a reader submission and turn it into an article placed at `location`.
pub fn build_article(submission: StorySubmission, location: &str) -> Result<Article> {
    let title = submission.title.trim();
    let description = submission.description.trim();
    if title.is_empty() {
        return Err(Error::InvalidInput("Title is required".to_string()));
    }
    if description.is_empty() {
        return Err(Error::InvalidInput("Description is required".to_string()));
    }
    if !submission.category.is_user_selectable() {
        return Err(Error::InvalidInput(format!(
            "Category '{}' cannot be chosen for a submission",
            submission.category
        )));
    }

    let author = submission
        .author
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(DEFAULT_CONTRIBUTOR);

    let id = format!("user-gen-{}", Uuid::new_v4());
    let now = Utc::now();
    Ok(Article {
        url: format!("#{}", id),
        title: title.to_string(),
        description: description.to_string(),
        source: COMMUNITY_SOURCE.to_string(),
        image: None,
        published: now,
        fetched_at: now,
        location: location.to_string(),
        category: submission.category,
        author: Some(author.to_string()),
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcn_core::Category;

    fn submission(title: &str, description: &str, author: Option<&str>, category: Category) -> StorySubmission {
        StorySubmission {
            title: title.to_string(),
            description: description.to_string(),
            author: author.map(str::to_string),
            category,
        }
    }

    #[test]
    fn test_builds_community_article() {
        let article = build_article(
            submission("  Park cleanup Saturday ", "Bring gloves.", Some(" Dana "), Category::Local),
            "Toronto",
        )
        .unwrap();

        assert!(article.id.starts_with("user-gen-"));
        assert_eq!(article.url, format!("#{}", article.id));
        assert_eq!(article.title, "Park cleanup Saturday");
        assert_eq!(article.source, COMMUNITY_SOURCE);
        assert_eq!(article.author.as_deref(), Some("Dana"));
        assert_eq!(article.location, "Toronto");
        assert!(article.image.is_none());
        assert!(article.needs_image());
    }

    #[test]
    fn test_blank_author_defaults() {
        let article = build_article(submission("t", "d", Some("   "), Category::Sports), "Ottawa").unwrap();
        assert_eq!(article.author.as_deref(), Some(DEFAULT_CONTRIBUTOR));

        let article = build_article(submission("t", "d", None, Category::Sports), "Ottawa").unwrap();
        assert_eq!(article.author.as_deref(), Some(DEFAULT_CONTRIBUTOR));
    }

    #[test]
    fn test_rejects_invalid_submissions() {
        assert!(build_article(submission(" ", "d", None, Category::Local), "Toronto").is_err());
        assert!(build_article(submission("t", "", None, Category::Local), "Toronto").is_err());
        assert!(matches!(
            build_article(submission("t", "d", None, Category::General), "Toronto"),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = build_article(submission("t", "d", None, Category::Local), "Toronto").unwrap();
        let b = build_article(submission("t", "d", None, Category::Local), "Toronto").unwrap();
        assert_ne!(a.id, b.id);
    }
}
