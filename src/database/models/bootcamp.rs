use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::collection::{Collection, BOOTCAMPS};
use crate::database::models::{is_email, is_http_url, trimmed, Model, Validation};
use crate::database::store::StoreError;

pub const CAREERS: [&str; 6] = [
    "Web Development",
    "Mobile Development",
    "UI/UX",
    "Data Science",
    "Business",
    "Other",
];

pub const DEFAULT_PHOTO: &str = "no-photo.jpg";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bootcamp {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub description: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    #[serde(default)]
    pub careers: Vec<String>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub average_cost: Option<f64>,
    #[serde(default = "default_photo")]
    pub photo: String,
    #[serde(default)]
    pub housing: bool,
    #[serde(default)]
    pub job_assistance: bool,
    #[serde(default)]
    pub job_guarantee: bool,
    #[serde(default)]
    pub accept_gi: bool,
    pub created_at: DateTime<Utc>,
    pub user: String,
}

fn default_photo() -> String {
    DEFAULT_PHOTO.to_string()
}

impl Model for Bootcamp {
    const COLLECTION: &'static Collection = &BOOTCAMPS;
}

/// Client-writable bootcamp fields. Derived averages, photo and owner are
/// not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootcampInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub careers: Option<Vec<String>>,
    pub housing: Option<bool>,
    pub job_assistance: Option<bool>,
    pub job_guarantee: Option<bool>,
    pub accept_gi: Option<bool>,
}

impl BootcampInput {
    pub fn validate(&self, update: bool) -> Result<(), StoreError> {
        let mut v = Validation::for_update(update);
        v.required_text(&self.name, "Please add a name")
            .check(self.name.as_ref().map_or(true, |n| n.trim().chars().count() <= 50), "Name can not be more than 50 characters")
            .required_text(&self.description, "Please add a description")
            .check(
                self.description.as_ref().map_or(true, |d| d.chars().count() <= 500),
                "Description can not be more than 500 characters",
            )
            .check(self.website.as_deref().map_or(true, is_http_url), "Please use a valid URL with HTTP or HTTPS")
            .check(self.phone.as_ref().map_or(true, |p| p.chars().count() <= 20), "Phone number can not be longer than 20 characters")
            .check(self.email.as_deref().map_or(true, is_email), "Please add a valid email")
            .required_text(&self.address, "Please add an address")
            .required(&self.careers, "Please add at least one career")
            .check(self.careers.as_ref().map_or(true, |c| !c.is_empty()), "Please add at least one career")
            .check(
                self.careers.as_ref().map_or(true, |c| c.iter().all(|career| CAREERS.contains(&career.as_str()))),
                "Careers must be one of: Web Development, Mobile Development, UI/UX, Data Science, Business, Other",
            );
        v.finish()
    }

    /// Only the supplied fields, ready to be stored. A new name also
    /// refreshes the slug.
    pub fn into_document(self) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(name) = trimmed(self.name) {
            doc.insert("slug".into(), Value::String(slugify(&name)));
            doc.insert("name".into(), Value::String(name));
        }
        let text_fields = [
            ("description", self.description),
            ("website", self.website),
            ("phone", self.phone),
            ("email", self.email),
            ("address", self.address),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                doc.insert(key.into(), Value::String(value));
            }
        }
        if let Some(careers) = self.careers {
            doc.insert("careers".into(), Value::from(careers));
        }
        let flags = [
            ("housing", self.housing),
            ("jobAssistance", self.job_assistance),
            ("jobGuarantee", self.job_guarantee),
            ("acceptGi", self.accept_gi),
        ];
        for (key, value) in flags {
            if let Some(value) = value {
                doc.insert(key.into(), Value::Bool(value));
            }
        }
        doc
    }

    /// Full document for a new bootcamp owned by `owner`, defaults filled in
    pub fn into_new_document(self, owner: &str) -> Map<String, Value> {
        let mut doc = self.into_document();
        for key in ["website", "phone", "email", "averageRating", "averageCost"] {
            doc.entry(key).or_insert(Value::Null);
        }
        for key in ["housing", "jobAssistance", "jobGuarantee", "acceptGi"] {
            doc.entry(key).or_insert(Value::Bool(false));
        }
        doc.insert("photo".into(), Value::String(DEFAULT_PHOTO.into()));
        doc.insert("user".into(), Value::String(owner.to_string()));
        doc
    }
}

/// URL-friendly lowercase form of a name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
