//! Request payloads and their value checks.
//!
//! Shape (required fields, types, no unknown fields) is enforced by serde;
//! [`Validate`] adds the range and format rules serde cannot express.

use serde::{Deserialize, Deserializer};

use crate::database::models::{NewCompany, NewJob, NewUser};
use crate::sql::{SqlParam, UpdatePayload};

pub trait Validate {
    /// Every rule violation, as `field: message`. Empty when valid.
    fn validate(&self) -> Vec<String>;
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Optional field that may be left out but not sent as `null`.
fn non_null<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Default)]
struct Rules(Vec<String>);

impl Rules {
    fn text(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        if len < min {
            self.0.push(format!("{}: must be at least {} characters", field, min));
        } else if len > max {
            self.0.push(format!("{}: must be at most {} characters", field, max));
        }
        self
    }

    fn non_negative(&mut self, field: &str, value: Option<i32>) -> &mut Self {
        if matches!(value, Some(n) if n < 0) {
            self.0.push(format!("{}: must be greater than or equal to 0", field));
        }
        self
    }

    fn fraction(&mut self, field: &str, value: Option<f64>) -> &mut Self {
        if matches!(value, Some(n) if !(0.0..=1.0).contains(&n)) {
            self.0.push(format!("{}: must be between 0 and 1", field));
        }
        self
    }

    fn email(&mut self, field: &str, value: &str) -> &mut Self {
        self.text(field, value, 6, 60);
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => self.0.push(format!("{}: must be an email address", field)),
        }
        self
    }

    fn url(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            if url::Url::parse(v).is_err() {
                self.0.push(format!("{}: must be a URL", field));
            }
        }
        self
    }

    fn finish(&mut self) -> Vec<String> {
        std::mem::take(&mut self.0)
    }
}

// ---------------------------------------------------------------- jobs

impl Validate for NewJob {
    fn validate(&self) -> Vec<String> {
        Rules::default()
            .text("title", &self.title, 1, 200)
            .non_negative("salary", self.salary)
            .fraction("equity", self.equity)
            .text("companyHandle", &self.company_handle, 1, 25)
            .finish()
    }
}

/// PATCH /jobs/:id body. The id and company of a job cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(default, deserialize_with = "non_null")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub equity: Option<Option<f64>>,
}

impl JobUpdate {
    pub fn into_payload(self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        if let Some(title) = self.title {
            payload.push(("title", SqlParam::Text(Some(title))));
        }
        if let Some(salary) = self.salary {
            payload.push(("salary", SqlParam::Int(salary)));
        }
        if let Some(equity) = self.equity {
            payload.push(("equity", SqlParam::Float(equity)));
        }
        payload
    }
}

impl Validate for JobUpdate {
    fn validate(&self) -> Vec<String> {
        let mut rules = Rules::default();
        if let Some(title) = &self.title {
            rules.text("title", title, 1, 200);
        }
        rules
            .non_negative("salary", self.salary.flatten())
            .fraction("equity", self.equity.flatten())
            .finish()
    }
}

// ----------------------------------------------------------- companies

impl Validate for NewCompany {
    fn validate(&self) -> Vec<String> {
        let mut rules = Rules::default();
        rules
            .text("handle", &self.handle, 1, 25)
            .text("name", &self.name, 1, 200)
            .non_negative("numEmployees", self.num_employees)
            .url("logoUrl", self.logo_url.as_deref());
        if self.handle != self.handle.to_lowercase() {
            rules.0.push("handle: must be lowercase".to_string());
        }
        rules.finish()
    }
}

/// PATCH /companies/:handle body. The handle cannot be changed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CompanyUpdate {
    #[serde(default, deserialize_with = "non_null")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyUpdate {
    pub fn into_payload(self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        if let Some(name) = self.name {
            payload.push(("name", SqlParam::Text(Some(name))));
        }
        if let Some(description) = self.description {
            payload.push(("description", SqlParam::Text(Some(description))));
        }
        if let Some(num_employees) = self.num_employees {
            payload.push(("numEmployees", SqlParam::Int(num_employees)));
        }
        if let Some(logo_url) = self.logo_url {
            payload.push(("logoUrl", SqlParam::Text(logo_url)));
        }
        payload
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> Vec<String> {
        let mut rules = Rules::default();
        if let Some(name) = &self.name {
            rules.text("name", name, 1, 200);
        }
        rules
            .non_negative("numEmployees", self.num_employees.flatten())
            .url("logoUrl", self.logo_url.as_ref().and_then(|v| v.as_deref()))
            .finish()
    }
}

// --------------------------------------------------------------- users

impl Validate for NewUser {
    fn validate(&self) -> Vec<String> {
        Rules::default()
            .text("username", &self.username, 1, 25)
            .text("password", &self.password, 5, 20)
            .text("firstName", &self.first_name, 1, 25)
            .text("lastName", &self.last_name, 1, 25)
            .email("email", &self.email)
            .finish()
    }
}

/// POST /auth/register body. Self-registered users are never admins.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserRegister {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<UserRegister> for NewUser {
    fn from(register: UserRegister) -> Self {
        NewUser {
            username: register.username,
            password: register.password,
            first_name: register.first_name,
            last_name: register.last_name,
            email: register.email,
            is_admin: false,
        }
    }
}

impl Validate for UserRegister {
    fn validate(&self) -> Vec<String> {
        NewUser::from(self.clone()).validate()
    }
}

/// POST /auth/token body
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserAuth {
    pub username: String,
    pub password: String,
}

impl Validate for UserAuth {
    fn validate(&self) -> Vec<String> {
        Rules::default()
            .text("username", &self.username, 1, 25)
            .text("password", &self.password, 1, 20)
            .finish()
    }
}

/// PATCH /users/:username body. Username and admin flag cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default, deserialize_with = "non_null")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub email: Option<String>,
}

impl UserUpdate {
    pub fn into_payload(self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        if let Some(first_name) = self.first_name {
            payload.push(("firstName", SqlParam::Text(Some(first_name))));
        }
        if let Some(last_name) = self.last_name {
            payload.push(("lastName", SqlParam::Text(Some(last_name))));
        }
        if let Some(password) = self.password {
            payload.push(("password", SqlParam::Text(Some(password))));
        }
        if let Some(email) = self.email {
            payload.push(("email", SqlParam::Text(Some(email))));
        }
        payload
    }
}

impl Validate for UserUpdate {
    fn validate(&self) -> Vec<String> {
        let mut rules = Rules::default();
        if let Some(v) = &self.first_name {
            rules.text("firstName", v, 1, 25);
        }
        if let Some(v) = &self.last_name {
            rules.text("lastName", v, 1, 25);
        }
        if let Some(v) = &self.password {
            rules.text("password", v, 5, 20);
        }
        if let Some(v) = &self.email {
            rules.email("email", v);
        }
        rules.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn accepts_valid_new_job() {
        let job: NewJob = parse(json!({"title": "new", "salary": 50, "equity": 0.5, "companyHandle": "c3"})).unwrap();
        assert!(job.validate().is_empty());
    }

    #[test]
    fn new_job_requires_title() {
        assert!(parse::<NewJob>(json!({"salary": 10, "equity": 0.1, "companyHandle": "c1"})).is_err());
    }

    #[test]
    fn new_job_rejects_wrong_types() {
        assert!(parse::<NewJob>(json!({"title": 61, "companyHandle": "c1"})).is_err());
        assert!(parse::<NewJob>(json!({"title": "t", "salary": 6234.5, "companyHandle": "c1"})).is_err());
        assert!(parse::<NewJob>(json!({"title": "t", "companyHandle": 5312})).is_err());
    }

    #[test]
    fn new_job_checks_ranges() {
        let job: NewJob = parse(json!({"title": "t", "salary": -1, "equity": 1.5, "companyHandle": "c1"})).unwrap();
        let errors = job.validate();
        assert_eq!(errors.len(), 2, "{:?}", errors);
    }

    #[test]
    fn job_update_rejects_id_and_company() {
        assert!(parse::<JobUpdate>(json!({"id": 7})).is_err());
        assert!(parse::<JobUpdate>(json!({"companyHandle": "not-a-company"})).is_err());
    }

    #[test]
    fn empty_job_update_has_empty_payload() {
        let update: JobUpdate = parse(json!({})).unwrap();
        assert!(update.validate().is_empty());
        assert!(update.into_payload().is_empty());
    }

    #[test]
    fn null_is_rejected_for_required_columns() {
        assert!(parse::<JobUpdate>(json!({"title": null})).is_err());
        assert!(parse::<JobUpdate>(json!({"title": null, "salary": 5})).is_err());
        assert!(parse::<CompanyUpdate>(json!({"name": null})).is_err());
        assert!(parse::<CompanyUpdate>(json!({"description": null, "numEmployees": 3})).is_err());
        for field in ["firstName", "lastName", "password", "email"] {
            assert!(parse::<UserUpdate>(json!({ field: null })).is_err(), "{}", field);
        }
    }

    #[test]
    fn job_update_keeps_explicit_null() {
        let update: JobUpdate = parse(json!({"title": "j1-new", "salary": null})).unwrap();
        assert_eq!(
            update.into_payload(),
            vec![
                ("title", SqlParam::Text(Some("j1-new".into()))),
                ("salary", SqlParam::Int(None)),
            ]
        );
    }

    #[test]
    fn company_rules() {
        let company: NewCompany = parse(json!({
            "handle": "New",
            "name": "New",
            "description": "d",
            "numEmployees": -3,
            "logoUrl": "nope"
        }))
        .unwrap();
        assert_eq!(company.validate().len(), 3);
    }

    #[test]
    fn company_update_uses_domain_names() {
        let update: CompanyUpdate = parse(json!({"numEmployees": 10, "logoUrl": null})).unwrap();
        let payload = update.into_payload();
        assert_eq!(payload[0], ("numEmployees", SqlParam::Int(Some(10))));
        assert_eq!(payload[1], ("logoUrl", SqlParam::Text(None)));
    }

    #[test]
    fn register_cannot_set_admin() {
        assert!(parse::<UserRegister>(json!({
            "username": "new",
            "password": "password",
            "firstName": "F",
            "lastName": "L",
            "email": "new@email.com",
            "isAdmin": true
        }))
        .is_err());
    }

    #[test]
    fn user_rules() {
        let user: NewUser = parse(json!({
            "username": "new",
            "password": "pw",
            "firstName": "F",
            "lastName": "L",
            "email": "not-an-email"
        }))
        .unwrap();
        let errors = user.validate();
        assert!(errors.iter().any(|e| e.starts_with("password")), "{:?}", errors);
        assert!(errors.iter().any(|e| e.starts_with("email")), "{:?}", errors);
    }

    #[test]
    fn user_update_rejects_username_change() {
        assert!(parse::<UserUpdate>(json!({"username": "other"})).is_err());
        assert!(parse::<UserUpdate>(json!({"isAdmin": true})).is_err());
    }
}
