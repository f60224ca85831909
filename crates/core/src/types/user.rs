//! User identity types.

use serde::{Deserialize, Serialize};

/// The identity stored in the session after a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name as returned by the auth API.
    pub name: String,
    /// Login username.
    pub username: String,
    /// Account email.
    pub email: String,
}

/// Extended profile information from `GET /user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Login username.
    pub user_name: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_details_wire_names() {
        let details: UserDetails = serde_json::from_str(
            r#"{
                "name": "Juan",
                "email": "juan@x.com",
                "phoneNumber": "5512345678",
                "userName": "juan"
            }"#,
        )
        .unwrap();
        assert_eq!(details.phone_number, "5512345678");
        assert_eq!(details.user_name, "juan");
    }
}
