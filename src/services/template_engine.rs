//! Reply template rendering and matching.
//!
//! Templates carry `{placeholder}` tokens drawn from a fixed set; rendering
//! substitutes review fields, and matching selects the best active template
//! for a star rating.

use crate::db::pool::DbPool;
use crate::error::AppError;
use crate::models::{ReplyTemplate, Review};

/// The placeholders a template may reference, with descriptions for the API.
pub const PLACEHOLDERS: [(&str, &str); 4] = [
    ("author", "Display name of the review author"),
    ("rating", "Star rating of the review (1-5)"),
    ("comment", "Review text (empty when the review has none)"),
    ("location", "Name of the business location"),
];

/// Values substituted into a template body.
#[derive(Debug, Clone)]
pub struct TemplateVars<'a> {
    pub author: &'a str,
    pub rating: i64,
    pub comment: &'a str,
    pub location: &'a str,
}

impl<'a> TemplateVars<'a> {
    /// Build substitution values from a review and its location name.
    ///
    /// A missing review comment substitutes an empty string.
    pub fn from_review(review: &'a Review, location_name: &'a str) -> Self {
        Self {
            author: &review.author_name,
            rating: review.rating,
            comment: review.comment.as_deref().unwrap_or(""),
            location: location_name,
        }
    }
}

/// Render a template body by substituting `{placeholder}` tokens.
///
/// Unknown tokens are left in place; [`validate_content`] rejects them at
/// template-save time, so any leftovers here come from pre-validation data.
pub fn render(content: &str, vars: &TemplateVars<'_>) -> String {
    let rendered = content
        .replace("{author}", vars.author)
        .replace("{rating}", &vars.rating.to_string())
        .replace("{comment}", vars.comment)
        .replace("{location}", vars.location);

    let leftover = find_placeholders(&rendered);
    if !leftover.is_empty() {
        log::warn!("Unreplaced placeholders in rendered template: {:?}", leftover);
    }

    rendered
}

/// Extract `{word}` placeholder names from a template body.
pub fn find_placeholders(content: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    let mut chars = content.chars();

    while let Some(ch) = chars.next() {
        if ch != '{' {
            continue;
        }
        let mut name = String::new();
        let mut closed = false;
        for inner in chars.by_ref() {
            if inner == '}' {
                closed = true;
                break;
            }
            if inner.is_alphanumeric() || inner == '_' {
                name.push(inner);
            } else {
                // Not a placeholder token (space, brace, punctuation)
                break;
            }
        }
        if closed && !name.is_empty() && !placeholders.contains(&name) {
            placeholders.push(name);
        }
    }

    placeholders
}

/// Validate a template body, returning the placeholders it uses.
///
/// Fails with an invalid-input error naming any unknown placeholders.
pub fn validate_content(content: &str) -> Result<Vec<String>, AppError> {
    let used = find_placeholders(content);
    let unknown: Vec<&String> = used
        .iter()
        .filter(|name| !PLACEHOLDERS.iter().any(|(known, _)| known == &name.as_str()))
        .collect();

    if unknown.is_empty() {
        Ok(used)
    } else {
        let known: Vec<&str> = PLACEHOLDERS.iter().map(|(name, _)| *name).collect();
        Err(AppError::invalid_input(format!(
            "Unknown placeholders in template: {:?}. Available placeholders: {:?}",
            unknown, known
        )))
    }
}

/// Select the best active template covering `rating`.
///
/// Tie-break: narrowest rating range first, then most recently updated,
/// then lowest range start so the result is deterministic. Returns `None`
/// when no active template covers the rating - a soft miss the caller
/// turns into a no-template error only when a suggestion was actually
/// requested.
pub async fn match_template(
    pool: &DbPool,
    rating: i64,
) -> Result<Option<ReplyTemplate>, AppError> {
    let template: Option<ReplyTemplate> = sqlx::query_as(
        r#"
        SELECT id, name, content, rating_min, rating_max, is_active, created_at, updated_at
        FROM templates
        WHERE is_active = 1 AND rating_min <= ? AND rating_max >= ?
        ORDER BY (rating_max - rating_min) ASC, updated_at DESC, rating_min ASC
        LIMIT 1
        "#,
    )
    .bind(rating)
    .bind(rating)
    .fetch_optional(pool)
    .await?;

    Ok(template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars<'static> {
        TemplateVars {
            author: "Alice",
            rating: 5,
            comment: "Great service",
            location: "Corner Cafe",
        }
    }

    #[test]
    fn test_render_substitutes_all_placeholders() {
        let rendered = render(
            "Dear {author}, thanks for the {rating} stars at {location}: {comment}",
            &vars(),
        );
        assert_eq!(
            rendered,
            "Dear Alice, thanks for the 5 stars at Corner Cafe: Great service"
        );
    }

    #[test]
    fn test_render_missing_comment_is_empty() {
        let review = Review {
            id: 1,
            location_id: 1,
            review_id: "rev-1".into(),
            author_name: "Bob".into(),
            rating: 4,
            comment: None,
            reply: None,
            reply_time: None,
            created_at: 0,
            synced_at: 0,
        };
        let vars = TemplateVars::from_review(&review, "Corner Cafe");
        assert_eq!(render("{comment}", &vars), "");
    }

    #[test]
    fn test_find_placeholders() {
        assert_eq!(
            find_placeholders("Hi {author}, {rating} stars! {author}"),
            vec!["author".to_string(), "rating".to_string()]
        );
        assert!(find_placeholders("no tokens here").is_empty());
        // Unclosed or non-word braces are not placeholders
        assert!(find_placeholders("brace { only").is_empty());
        assert!(find_placeholders("{not a token}").is_empty());
    }

    #[test]
    fn test_validate_content() {
        assert_eq!(
            validate_content("Thanks {author}!").unwrap(),
            vec!["author".to_string()]
        );
        let err = validate_content("Thanks {customer}!").unwrap_err();
        assert!(err.to_string().contains("Invalid input"));
    }
}
