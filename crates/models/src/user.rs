use common::TaggedError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Constraint;
use crate::shared::{Audited, Id, Patch, Record, Upsert};
use crate::validation::{Field, Schema};

/// Account flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub is_active: bool,
    pub is_verified: bool,
    /// Locked after failed logins or for security reasons.
    pub is_locked: bool,
}

/// User fields other than identity and audit metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    /// Password hash, never the plain password.
    pub password: String,
    pub status: UserStatus,
}

pub type User = Audited<UserData>;

impl Audited<UserData> {
    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.data.first_name, self.data.last_name)
    }

    /// "FL"
    pub fn initials(&self) -> String {
        self.data
            .first_name
            .chars()
            .take(1)
            .chain(self.data.last_name.chars().take(1))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

impl Patch for UserPatch {
    fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.status.is_none()
    }
}

impl Record for UserData {
    type Patch = UserPatch;

    const NAME: &'static str = "User";

    fn merge(&mut self, patch: UserPatch) {
        if let Some(v) = patch.first_name { self.first_name = v; }
        if let Some(v) = patch.last_name { self.last_name = v; }
        if let Some(v) = patch.username { self.username = v; }
        if let Some(v) = patch.email { self.email = v; }
        if let Some(v) = patch.password { self.password = v; }
        if let Some(v) = patch.status { self.status = v; }
    }

    fn to_patch(&self) -> UserPatch {
        UserPatch {
            first_name: Some(self.first_name.clone()),
            last_name: Some(self.last_name.clone()),
            username: Some(self.username.clone()),
            email: Some(self.email.clone()),
            password: Some(self.password.clone()),
            status: Some(self.status),
        }
    }
}

const NAME_RULES: &[Constraint] = &[Constraint::MinLength(1), Constraint::MaxLength(255)];
const USERNAME_RULES: &[Constraint] = &[Constraint::MinLength(3), Constraint::MaxLength(255)];
const EMAIL_RULES: &[Constraint] = &[Constraint::Email];
const PASSWORD_RULES: &[Constraint] = &[Constraint::MinLength(8)];

pub static USER_STATUS: Schema = Schema {
    name: "user_status",
    fields: &[Field::boolean("isActive"), Field::boolean("isVerified"), Field::boolean("isLocked")],
};

pub static CREATE_USER: Schema = Schema {
    name: "create_user",
    fields: &[
        Field::text("firstName", NAME_RULES),
        Field::text("lastName", NAME_RULES),
        Field::text("username", USERNAME_RULES),
        Field::text("email", EMAIL_RULES),
        Field::text("password", PASSWORD_RULES),
        Field::object("status", &USER_STATUS),
    ],
};

pub static UPDATE_USER: Schema = Schema {
    name: "update_user",
    fields: &[
        Field::text("firstName", NAME_RULES).optional(),
        Field::text("lastName", NAME_RULES).optional(),
        Field::text("username", USERNAME_RULES).optional(),
        Field::text("email", EMAIL_RULES).optional(),
        Field::text("password", PASSWORD_RULES).optional(),
        Field::object("status", &USER_STATUS).optional(),
    ],
};

pub static UPSERT_USER: Schema = Schema {
    name: "upsert_user",
    fields: &[
        Field::text("id", &[]).optional(),
        Field::text("firstName", NAME_RULES),
        Field::text("lastName", NAME_RULES),
        Field::text("username", USERNAME_RULES),
        Field::text("email", EMAIL_RULES),
        Field::text("password", PASSWORD_RULES),
        Field::object("status", &USER_STATUS),
    ],
};

/// Validated input for creating a user. `password` is plain text here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserInput {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub status: UserStatus,
}

impl CreateUserInput {
    pub fn parse(raw: &Value) -> Result<Self, TaggedError> { CREATE_USER.parse(raw) }

    pub fn into_user_data(self, password_hash: String) -> UserData {
        UserData {
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            password: password_hash,
            status: self.status,
        }
    }
}

/// Validated partial update. `password` is plain text here.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserInput {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub status: Option<UserStatus>,
}

impl UpdateUserInput {
    pub fn parse(raw: &Value) -> Result<Self, TaggedError> { UPDATE_USER.parse(raw) }

    pub fn into_patch(self, password_hash: Option<String>) -> UserPatch {
        UserPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            email: self.email,
            password: password_hash,
            status: self.status,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertUserInput {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(flatten)]
    pub user: CreateUserInput,
}

impl UpsertUserInput {
    pub fn parse(raw: &Value) -> Result<Self, TaggedError> { UPSERT_USER.parse(raw) }

    pub fn into_upsert(self, password_hash: String) -> Upsert<UserData> {
        Upsert { id: self.id, data: self.user.into_user_data(password_hash) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationIssue;
    use crate::shared::ActorId;
    use chrono::Utc;
    use common::ErrorKind;
    use serde_json::json;

    fn raw_user() -> Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "username": "ada",
            "email": "ada@example.com",
            "password": "analytical",
            "status": {"isActive": true, "isVerified": false, "isLocked": false}
        })
    }

    fn issue_of(err: &TaggedError) -> ValidationIssue {
        err.cause()
            .and_then(|c| c.downcast_ref::<ValidationIssue>())
            .cloned()
            .expect("validation issue cause")
    }

    #[test]
    fn create_input_parses_valid_payload() {
        let input = CreateUserInput::parse(&raw_user()).unwrap();
        assert_eq!(input.username, "ada");
        assert!(input.status.is_active);
    }

    #[test]
    fn create_rejects_short_username_first() {
        let mut raw = raw_user();
        raw["username"] = json!("ad");
        raw["email"] = json!("broken");
        let err = CreateUserInput::parse(&raw).unwrap_err();
        assert!(err.is(ErrorKind::Validation));
        let issue = issue_of(&err);
        assert_eq!(issue.field, "username");
        assert_eq!(issue.constraint, Constraint::MinLength(3));
    }

    #[test]
    fn create_rejects_bad_email_and_short_password() {
        let mut raw = raw_user();
        raw["email"] = json!("ada.example.com");
        assert_eq!(issue_of(&CreateUserInput::parse(&raw).unwrap_err()).constraint, Constraint::Email);

        let mut raw = raw_user();
        raw["password"] = json!("short");
        assert_eq!(issue_of(&CreateUserInput::parse(&raw).unwrap_err()).constraint, Constraint::MinLength(8));
    }

    #[test]
    fn create_requires_complete_status() {
        let mut raw = raw_user();
        raw["status"] = json!({"isActive": true, "isVerified": false});
        let issue = issue_of(&CreateUserInput::parse(&raw).unwrap_err());
        assert_eq!(issue.field, "status.isLocked");
        assert_eq!(issue.constraint, Constraint::Required);
    }

    #[test]
    fn update_accepts_empty_and_partial_payloads() {
        let empty = UpdateUserInput::parse(&json!({})).unwrap();
        assert!(empty.is_empty());
        let partial = UpdateUserInput::parse(&json!({"lastName": "Byron"})).unwrap();
        assert_eq!(partial.last_name.as_deref(), Some("Byron"));
        assert!(!partial.is_empty());
        assert!(UpdateUserInput::parse(&json!({"firstName": ""})).is_err());
    }

    #[test]
    fn upsert_input_carries_optional_id() {
        let mut raw = raw_user();
        raw["id"] = json!("u-1");
        let input = UpsertUserInput::parse(&raw).unwrap();
        assert_eq!(input.id.as_deref(), Some("u-1"));
        let upsert = input.into_upsert("hash".into());
        assert_eq!(upsert.data.password, "hash");

        let input = UpsertUserInput::parse(&raw_user()).unwrap();
        assert!(input.id.is_none());
    }

    #[test]
    fn merge_applies_only_present_fields() {
        let mut data = CreateUserInput::parse(&raw_user()).unwrap().into_user_data("h".into());
        data.merge(UserPatch { email: Some("ada@new.example".into()), ..Default::default() });
        assert_eq!(data.email, "ada@new.example");
        assert_eq!(data.first_name, "Ada");
        assert_eq!(data.password, "h");
        assert!(data.to_patch().password.is_some());
        assert!(UserPatch::default().is_empty());
    }

    #[test]
    fn full_name_and_initials() {
        let data = CreateUserInput::parse(&raw_user()).unwrap().into_user_data("h".into());
        let actor = ActorId::new("tester").unwrap();
        let user: User = Audited::new("u-1".into(), Utc::now(), &actor, data);
        assert_eq!(user.full_name(), "Ada Lovelace");
        assert_eq!(user.initials(), "AL");
    }
}
