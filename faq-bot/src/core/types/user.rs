//! User identity.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// `@username` when set, else the first name, else the numeric id.
    pub fn display_name(&self) -> String {
        match (&self.username, &self.first_name) {
            (Some(u), _) => format!("@{}", u),
            (None, Some(f)) => f.clone(),
            (None, None) => self.id.to_string(),
        }
    }
}
