//! Article CRUD

use super::{now, Repository};
use crate::db::models::*;
use crate::errors::{AppError, Result};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

/// Body of `POST` and `PUT` on articles
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewArticle {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub content: String,

    #[validate(length(min = 1, max = 100, message = "Author must be between 1 and 100 characters"))]
    pub author: String,

    #[serde(default)]
    pub is_published: bool,
}

/// Body of `PATCH` on articles; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ArticleChanges {
    #[validate(length(min = 5, max = 200, message = "Title must be between 5 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "This field may not be blank"))]
    pub content: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Author must be between 1 and 100 characters"))]
    pub author: Option<String>,

    pub is_published: Option<bool>,
}

impl From<NewArticle> for ArticleChanges {
    fn from(article: NewArticle) -> Self {
        Self {
            title: Some(article.title),
            content: Some(article.content),
            author: Some(article.author),
            is_published: Some(article.is_published),
        }
    }
}

impl Repository {
    /// All articles, newest first
    pub async fn list_articles(&self) -> Result<Vec<Article>> {
        ArticleEntity::find()
            .order_by_desc(ArticleColumn::CreatedAt)
            .order_by_desc(ArticleColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn create_article(&self, input: NewArticle) -> Result<Article> {
        let now = now();
        let article = ArticleActiveModel {
            title: Set(input.title),
            content: Set(input.content),
            author: Set(input.author),
            is_published: Set(input.is_published),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let article = article.insert(self.write_conn()).await?;
        info!(article_id = article.id, "Article created");
        Ok(article)
    }

    /// Find article by ID
    pub async fn find_article(&self, id: i32) -> Result<Option<Article>> {
        ArticleEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Replace every writable field
    pub async fn update_article(&self, id: i32, input: NewArticle) -> Result<Article> {
        self.patch_article(id, input.into()).await
    }

    /// Apply the fields present in `changes`; `updated_at` is always refreshed
    pub async fn patch_article(&self, id: i32, changes: ArticleChanges) -> Result<Article> {
        let mut article = ArticleEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::not_found("Article", id))?
            .into_active_model();

        if let Some(title) = changes.title {
            article.title = Set(title);
        }
        if let Some(content) = changes.content {
            article.content = Set(content);
        }
        if let Some(author) = changes.author {
            article.author = Set(author);
        }
        if let Some(is_published) = changes.is_published {
            article.is_published = Set(is_published);
        }
        article.updated_at = Set(now());

        article.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete article by ID
    pub async fn delete_article(&self, id: i32) -> Result<bool> {
        let result = ArticleEntity::delete_by_id(id).exec(self.write_conn()).await?;
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, author: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            content: "Body".to_string(),
            author: author.to_string(),
            is_published: false,
        }
    }

    #[test]
    fn test_title_length_bounds() {
        assert!(article("Hello", "Ann").validate().is_ok());
        assert!(article("Hey", "Ann").validate().is_err());
        assert!(article(&"x".repeat(201), "Ann").validate().is_err());
        assert!(article(&"x".repeat(200), "Ann").validate().is_ok());
    }

    #[test]
    fn test_author_must_not_be_blank() {
        let errors = article("Hello there", "").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("author"));
    }

    #[test]
    fn test_is_published_defaults_to_false() {
        let parsed: NewArticle =
            serde_json::from_str(r#"{"title":"Hello","content":"c","author":"a"}"#).unwrap();
        assert!(!parsed.is_published);
    }

    #[test]
    fn test_partial_changes_validate_present_fields_only() {
        assert!(ArticleChanges::default().validate().is_ok());
        let changes = ArticleChanges { title: Some("abc".into()), ..Default::default() };
        assert!(changes.validate().is_err());
    }
}
