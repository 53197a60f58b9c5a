use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::collection::{Collection, USERS};
use crate::database::models::{is_email, trimmed, Model, Validation};
use crate::database::store::StoreError;
use crate::types::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Argon2 PHC string; never leaves the server
    #[serde(default, skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl Model for User {
    const COLLECTION: &'static Collection = &USERS;
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl RegisterInput {
    pub fn validate(&self) -> Result<(), StoreError> {
        let mut v = Validation::full();
        v.required_text(&self.name, "Please add a name")
            .required_text(&self.email, "Please add an email")
            .check(self.email.as_deref().map_or(true, |e| is_email(e.trim())), "Please add a valid email")
            .required(&self.password, "Please add a password")
            .check(
                self.password.as_ref().map_or(true, |p| p.chars().count() >= 6),
                "Password must be at least 6 characters",
            )
            .check(self.role != Some(Role::Admin), "Please choose a role of user or publisher");
        v.finish()
    }

    /// Stored form; `password_hash` replaces the plain password
    pub fn into_document(self, password_hash: String) -> Map<String, Value> {
        let mut doc = Map::new();
        if let Some(name) = trimmed(self.name) {
            doc.insert("name".into(), Value::String(name));
        }
        if let Some(email) = trimmed(self.email) {
            doc.insert("email".into(), Value::String(email.to_lowercase()));
        }
        doc.insert("role".into(), Value::String(self.role.unwrap_or_default().to_string()));
        doc.insert("password".into(), Value::String(password_hash));
        doc
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn admin_role_cannot_self_register() {
        let body: RegisterInput = serde_json::from_value(json!({
            "name": "Mallory", "email": "mallory@gmail.com", "password": "123456", "role": "admin"
        }))
        .unwrap();
        assert!(body.validate().is_err());
    }

    #[test]
    fn password_hash_replaces_plain_text_and_is_never_serialized() {
        let body: RegisterInput = serde_json::from_value(json!({
            "name": "John Doe", "email": "John@Gmail.com", "password": "123456"
        }))
        .unwrap();
        body.validate().unwrap();
        let doc = body.into_document("$argon2id$hash".into());
        assert_eq!(doc["email"], json!("john@gmail.com"));
        assert_eq!(doc["role"], json!("user"));

        let mut stored = doc.clone();
        stored.insert("id".into(), json!("u1"));
        stored.insert("createdAt".into(), json!("2024-01-01T00:00:00Z"));
        let user: User = serde_json::from_value(Value::Object(stored)).unwrap();
        assert_eq!(user.password, "$argon2id$hash");
        assert!(serde_json::to_value(&user).unwrap().get("password").is_none());
    }
}
