use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::auth::hash_password;
use crate::database::collection::ALL;
use crate::database::models::{Bootcamp, BootcampInput, Course, CourseInput, RegisterInput, Review, ReviewInput, User};
use crate::database::store::new_object_id;
use crate::server::AppState;

type Record = Map<String, Value>;

/// How many documents of each kind an import created
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

/// Loads fixture files through the repositories, so the observers fill in
/// the bootcamp averages as courses and reviews arrive.
///
/// Records may carry their own `_id` (or `id`) and reference each other by
/// it; every record gets a fresh id and references are rewritten to match.
pub struct Seeder<'a> {
    state: &'a AppState,
    ids: HashMap<String, String>,
}

impl<'a> Seeder<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            ids: HashMap::new(),
        }
    }

    pub async fn import(&mut self, dir: &Path) -> anyhow::Result<SeedReport> {
        let mut report = SeedReport::default();

        for record in read_records(dir, "users.json")? {
            self.import_user(record).await?;
            report.users += 1;
        }
        for record in read_records(dir, "bootcamps.json")? {
            self.import_bootcamp(record).await?;
            report.bootcamps += 1;
        }
        for record in read_records(dir, "courses.json")? {
            self.import_course(record).await?;
            report.courses += 1;
        }
        for record in read_records(dir, "reviews.json")? {
            self.import_review(record).await?;
            report.reviews += 1;
        }

        tracing::info!(
            "Imported {} users, {} bootcamps, {} courses, {} reviews",
            report.users, report.bootcamps, report.courses, report.reviews
        );
        Ok(report)
    }

    async fn import_user(&mut self, mut record: Record) -> anyhow::Result<()> {
        let id = self.assign_id(&mut record);
        let input: RegisterInput = decode(record, "user")?;
        let email = input.email.clone().unwrap_or_default();
        let password = input
            .password
            .clone()
            .ok_or_else(|| anyhow!("user {} has no password", email))?;

        // Fixture files may already hold hashes
        let hash = if password.starts_with("$argon2") {
            password
        } else {
            hash_password(&self.state.config.security, &password)?
        };

        let mut doc = input.into_document(hash);
        doc.insert("id".into(), Value::String(id));
        self.state
            .repository::<User>()
            .create(doc)
            .await
            .with_context(|| format!("importing user {}", email))?;
        Ok(())
    }

    async fn import_bootcamp(&mut self, mut record: Record) -> anyhow::Result<()> {
        let id = self.assign_id(&mut record);
        let owner = self.resolve(&mut record, "user")?;
        let input: BootcampInput = decode(record, "bootcamp")?;
        let name = input.name.clone().unwrap_or_default();
        input.validate(false).with_context(|| format!("bootcamp {}", name))?;

        let mut doc = input.into_new_document(&owner);
        doc.insert("id".into(), Value::String(id));
        self.state
            .repository::<Bootcamp>()
            .create(doc)
            .await
            .with_context(|| format!("importing bootcamp {}", name))?;
        Ok(())
    }

    async fn import_course(&mut self, mut record: Record) -> anyhow::Result<()> {
        let id = self.assign_id(&mut record);
        let bootcamp = self.resolve(&mut record, "bootcamp")?;
        let owner = self.resolve(&mut record, "user")?;
        let input: CourseInput = decode(record, "course")?;
        let title = input.title.clone().unwrap_or_default();
        input.validate(false).with_context(|| format!("course {}", title))?;

        let mut doc = input.into_new_document(&bootcamp, &owner);
        doc.insert("id".into(), Value::String(id));
        self.state
            .repository::<Course>()
            .create(doc)
            .await
            .with_context(|| format!("importing course {}", title))?;
        Ok(())
    }

    async fn import_review(&mut self, mut record: Record) -> anyhow::Result<()> {
        let id = self.assign_id(&mut record);
        let bootcamp = self.resolve(&mut record, "bootcamp")?;
        let author = self.resolve(&mut record, "user")?;
        let input: ReviewInput = decode(record, "review")?;
        let title = input.title.clone().unwrap_or_default();
        input.validate(false).with_context(|| format!("review {}", title))?;

        let mut doc = input.into_new_document(&bootcamp, &author);
        doc.insert("id".into(), Value::String(id));
        self.state
            .repository::<Review>()
            .create(doc)
            .await
            .with_context(|| format!("importing review {}", title))?;
        Ok(())
    }

    /// Fresh id for the record, remembering the one it came with
    fn assign_id(&mut self, record: &mut Record) -> String {
        let id = new_object_id();
        let original = record.remove("_id").or_else(|| record.remove("id"));
        if let Some(Value::String(original)) = original {
            self.ids.insert(original, id.clone());
        }
        id
    }

    /// Rewrite a reference field to the id its target was imported under
    fn resolve(&self, record: &mut Record, field: &str) -> anyhow::Result<String> {
        let original = match record.remove(field) {
            Some(Value::String(original)) => original,
            _ => return Err(anyhow!("record is missing its {} reference", field)),
        };
        self.ids
            .get(&original)
            .cloned()
            .ok_or_else(|| anyhow!("{} {} was not imported", field, original))
    }
}

/// Remove everything; returns the number of documents deleted
pub async fn destroy(state: &AppState) -> anyhow::Result<u64> {
    let mut removed = 0;
    for collection in ALL.iter().rev() {
        let count = state.store.delete_all(collection).await?;
        tracing::info!("Removed {} document(s) from {}", count, collection.name);
        removed += count;
    }
    Ok(removed)
}

fn read_records(dir: &Path, file: &str) -> anyhow::Result<Vec<Record>> {
    let path = dir.join(file);
    if !path.exists() {
        tracing::warn!("{} not found, skipping", path.display());
        return Ok(vec![]);
    }
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn decode<T: DeserializeOwned>(record: Record, kind: &str) -> anyhow::Result<T> {
    serde_json::from_value(Value::Object(record)).with_context(|| format!("malformed {} record", kind))
}
