use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::collection::{Collection, REVIEWS};
use crate::database::models::{trimmed, Model, Validation};
use crate::database::store::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: String,
    pub title: String,
    pub text: String,
    pub rating: i64,
    pub created_at: DateTime<Utc>,
    pub bootcamp: String,
    pub user: String,
}

impl Model for Review {
    const COLLECTION: &'static Collection = &REVIEWS;
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewInput {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i64>,
}

impl ReviewInput {
    pub fn validate(&self, update: bool) -> Result<(), StoreError> {
        let mut v = Validation::for_update(update);
        v.required_text(&self.title, "Please add a title for the review")
            .check(
                self.title.as_ref().map_or(true, |t| t.trim().chars().count() <= 100),
                "Title can not be more than 100 characters",
            )
            .required_text(&self.text, "Please add some text")
            .required(&self.rating, "Please add a rating between 1 and 10")
            .check(
                self.rating.map_or(true, |r| (1..=10).contains(&r)),
                "Please add a rating between 1 and 10",
            );
        v.finish()
    }

    pub fn into_document(self) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(title) = trimmed(self.title) {
            doc.insert("title".into(), Value::String(title));
        }
        if let Some(text) = self.text {
            doc.insert("text".into(), Value::String(text));
        }
        if let Some(rating) = self.rating {
            doc.insert("rating".into(), Value::from(rating));
        }
        doc
    }

    pub fn into_new_document(self, bootcamp: &str, author: &str) -> Map<String, Value> {
        let mut doc = self.into_document();
        doc.insert("bootcamp".into(), Value::String(bootcamp.to_string()));
        doc.insert("user".into(), Value::String(author.to_string()));
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_bounds() {
        for (rating, ok) in [(0, false), (1, true), (10, true), (11, false)] {
            let body = ReviewInput { title: Some("t".into()), text: Some("x".into()), rating: Some(rating) };
            assert_eq!(body.validate(false).is_ok(), ok, "rating {}", rating);
        }
    }

    #[test]
    fn missing_rating_reported_once() {
        let body = ReviewInput { title: Some("t".into()), text: Some("x".into()), rating: None };
        let StoreError::Validation(messages) = body.validate(false).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(messages, vec!["Please add a rating between 1 and 10".to_string()]);
    }
}
