/// Static description of a stored collection: its table name, which fields
/// clients may filter/sort/select on, which of those hold lists, and which
/// field combinations must be unique.
#[derive(Debug, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    pub fields: &'static [&'static str],
    pub list_fields: &'static [&'static str],
    pub numeric_fields: &'static [&'static str],
    pub boolean_fields: &'static [&'static str],
    pub timestamp_fields: &'static [&'static str],
    pub unique_keys: &'static [&'static [&'static str]],
}

/// Storage type of a queryable field; query-string values are cast to it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
    Boolean,
    Timestamp,
}

impl Collection {
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains(&field)
    }

    pub fn is_list_field(&self, field: &str) -> bool {
        self.list_fields.contains(&field)
    }

    pub fn kind(&self, field: &str) -> FieldKind {
        if self.numeric_fields.contains(&field) {
            FieldKind::Numeric
        } else if self.boolean_fields.contains(&field) {
            FieldKind::Boolean
        } else if self.timestamp_fields.contains(&field) {
            FieldKind::Timestamp
        } else {
            FieldKind::Text
        }
    }
}

pub const USERS: Collection = Collection {
    name: "users",
    fields: &["id", "name", "email", "role", "createdAt"],
    list_fields: &[],
    numeric_fields: &[],
    boolean_fields: &[],
    timestamp_fields: &["createdAt"],
    unique_keys: &[&["email"]],
};

pub const BOOTCAMPS: Collection = Collection {
    name: "bootcamps",
    fields: &[
        "id", "name", "slug", "description", "website", "phone", "email", "address", "careers",
        "averageRating", "averageCost", "photo", "housing", "jobAssistance", "jobGuarantee",
        "acceptGi", "createdAt", "user",
    ],
    list_fields: &["careers"],
    numeric_fields: &["averageRating", "averageCost"],
    boolean_fields: &["housing", "jobAssistance", "jobGuarantee", "acceptGi"],
    timestamp_fields: &["createdAt"],
    unique_keys: &[&["name"]],
};

pub const COURSES: Collection = Collection {
    name: "courses",
    fields: &[
        "id", "title", "description", "weeks", "tuition", "minimumSkill",
        "scholarshipsAvailable", "createdAt", "bootcamp", "user",
    ],
    list_fields: &[],
    numeric_fields: &["weeks", "tuition"],
    boolean_fields: &["scholarshipsAvailable"],
    timestamp_fields: &["createdAt"],
    unique_keys: &[],
};

pub const REVIEWS: Collection = Collection {
    name: "reviews",
    fields: &["id", "title", "text", "rating", "createdAt", "bootcamp", "user"],
    list_fields: &[],
    numeric_fields: &["rating"],
    boolean_fields: &[],
    timestamp_fields: &["createdAt"],
    // One review per user per bootcamp
    unique_keys: &[&["bootcamp", "user"]],
};

pub const ALL: [&Collection; 4] = [&USERS, &BOOTCAMPS, &COURSES, &REVIEWS];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kinds_follow_the_table_columns() {
        assert_eq!(COURSES.kind("tuition"), FieldKind::Numeric);
        assert_eq!(COURSES.kind("title"), FieldKind::Text);
        assert_eq!(BOOTCAMPS.kind("housing"), FieldKind::Boolean);
        assert_eq!(REVIEWS.kind("createdAt"), FieldKind::Timestamp);
        assert_eq!(BOOTCAMPS.kind("careers"), FieldKind::Text);
    }
}
