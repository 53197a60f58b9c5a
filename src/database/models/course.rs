use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::collection::{Collection, COURSES};
use crate::database::models::{trimmed, Model, Validation};
use crate::database::store::StoreError;

pub const SKILLS: [&str; 3] = ["beginner", "intermediate", "advanced"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub weeks: i64,
    pub tuition: f64,
    pub minimum_skill: String,
    #[serde(default)]
    pub scholarships_available: bool,
    pub created_at: DateTime<Utc>,
    pub bootcamp: String,
    pub user: String,
}

impl Model for Course {
    const COLLECTION: &'static Collection = &COURSES;
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub weeks: Option<i64>,
    pub tuition: Option<f64>,
    pub minimum_skill: Option<String>,
    pub scholarships_available: Option<bool>,
}

impl CourseInput {
    pub fn validate(&self, update: bool) -> Result<(), StoreError> {
        let mut v = Validation::for_update(update);
        v.required_text(&self.title, "Please add a course title")
            .required_text(&self.description, "Please add a description")
            .required(&self.weeks, "Please add number of weeks")
            .check(self.weeks.map_or(true, |w| w >= 1), "Weeks must be at least 1")
            .required(&self.tuition, "Please add tuition cost")
            .check(self.tuition.map_or(true, |t| t >= 0.0), "Tuition can not be negative")
            .required_text(&self.minimum_skill, "Please enter a minimum skill required")
            .check(
                self.minimum_skill.as_deref().map_or(true, |s| SKILLS.contains(&s)),
                "Minimum skill must be one of: beginner, intermediate, advanced",
            );
        v.finish()
    }

    pub fn into_document(self) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(title) = trimmed(self.title) {
            doc.insert("title".into(), Value::String(title));
        }
        if let Some(description) = self.description {
            doc.insert("description".into(), Value::String(description));
        }
        if let Some(weeks) = self.weeks {
            doc.insert("weeks".into(), Value::from(weeks));
        }
        if let Some(tuition) = self.tuition {
            doc.insert("tuition".into(), Value::from(tuition));
        }
        if let Some(skill) = self.minimum_skill {
            doc.insert("minimumSkill".into(), Value::String(skill));
        }
        if let Some(scholarships) = self.scholarships_available {
            doc.insert("scholarshipsAvailable".into(), Value::Bool(scholarships));
        }
        doc
    }

    pub fn into_new_document(self, bootcamp: &str, owner: &str) -> Map<String, Value> {
        let mut doc = self.into_document();
        doc.entry("scholarshipsAvailable").or_insert(Value::Bool(false));
        doc.insert("bootcamp".into(), Value::String(bootcamp.to_string()));
        doc.insert("user".into(), Value::String(owner.to_string()));
        doc
    }
}
