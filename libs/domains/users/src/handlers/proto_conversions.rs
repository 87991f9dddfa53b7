//! Proto conversion helpers for gRPC handlers

use rpc::users as proto;

use crate::models::{UpdateUser, User};

pub fn user_to_proto(user: User) -> proto::User {
    proto::User {
        id: user.id,
        name: user.name,
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
        updated_at: user.updated_at.to_rfc3339(),
    }
}

/// Proto3 strings cannot be absent; empty means "leave unchanged"
pub fn update_request_to_domain(req: &proto::UpdateUserRequest) -> UpdateUser {
    UpdateUser {
        name: Some(req.name.clone()),
        email: Some(req.email.clone()),
    }
    .normalized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_user_to_proto_uses_rfc3339() {
        let at = Utc.with_ymd_and_hms(2024, 11, 29, 12, 0, 0).unwrap();
        let proto = user_to_proto(User {
            id: 3,
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password_digest: "digest".into(),
            created_at: at,
            updated_at: at,
        });

        assert_eq!(proto.id, 3);
        assert_eq!(proto.created_at, "2024-11-29T12:00:00+00:00");
    }

    #[test]
    fn test_empty_update_fields_are_dropped() {
        let changes = update_request_to_domain(&proto::UpdateUserRequest {
            id: 1,
            name: String::new(),
            email: "new@x.com".into(),
        });

        assert_eq!(changes.name, None);
        assert_eq!(changes.email.as_deref(), Some("new@x.com"));
    }
}
