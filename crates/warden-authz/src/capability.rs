use crate::AuthzError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    CreatePost,
    EditOwnPost,
    DeleteOwnPost,
    EditAnyPost,
    DeleteAnyPost,
    PublishPost,
    SchedulePost,
    ModerateComments,
    DeleteComments,
    UploadMedia,
    DeleteMedia,
    ViewAnalytics,
    ViewUsers,
    CreateUsers,
    EditUsers,
    DeleteUsers,
    ManageRoles,
    ManagePermissions,
    ManageSettings,
}

impl Capability {
    /// Every capability in the catalog, in declaration order.
    pub const ALL: [Capability; 19] = [
        Capability::CreatePost,
        Capability::EditOwnPost,
        Capability::DeleteOwnPost,
        Capability::EditAnyPost,
        Capability::DeleteAnyPost,
        Capability::PublishPost,
        Capability::SchedulePost,
        Capability::ModerateComments,
        Capability::DeleteComments,
        Capability::UploadMedia,
        Capability::DeleteMedia,
        Capability::ViewAnalytics,
        Capability::ViewUsers,
        Capability::CreateUsers,
        Capability::EditUsers,
        Capability::DeleteUsers,
        Capability::ManageRoles,
        Capability::ManagePermissions,
        Capability::ManageSettings,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::CreatePost => "CREATE_POST",
            Capability::EditOwnPost => "EDIT_OWN_POST",
            Capability::DeleteOwnPost => "DELETE_OWN_POST",
            Capability::EditAnyPost => "EDIT_ANY_POST",
            Capability::DeleteAnyPost => "DELETE_ANY_POST",
            Capability::PublishPost => "PUBLISH_POST",
            Capability::SchedulePost => "SCHEDULE_POST",
            Capability::ModerateComments => "MODERATE_COMMENTS",
            Capability::DeleteComments => "DELETE_COMMENTS",
            Capability::UploadMedia => "UPLOAD_MEDIA",
            Capability::DeleteMedia => "DELETE_MEDIA",
            Capability::ViewAnalytics => "VIEW_ANALYTICS",
            Capability::ViewUsers => "VIEW_USERS",
            Capability::CreateUsers => "CREATE_USERS",
            Capability::EditUsers => "EDIT_USERS",
            Capability::DeleteUsers => "DELETE_USERS",
            Capability::ManageRoles => "MANAGE_ROLES",
            Capability::ManagePermissions => "MANAGE_PERMISSIONS",
            Capability::ManageSettings => "MANAGE_SETTINGS",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = AuthzError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| AuthzError::InvalidCapability(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::Capability;
    use crate::AuthzError;

    #[test]
    fn capability_string_roundtrip() {
        for capability in Capability::ALL {
            let as_str = capability.as_str();
            assert_eq!(as_str.parse::<Capability>().ok(), Some(capability));
            assert_eq!(capability.to_string(), as_str);
        }
    }

    #[test]
    fn capability_from_str_invalid() {
        let err = "view_users".parse::<Capability>().expect_err("lowercase tag");
        assert_eq!(err, AuthzError::InvalidCapability("view_users".to_string()));
    }

    #[test]
    fn serde_uses_canonical_tags() {
        let json = serde_json::to_string(&Capability::EditAnyPost).expect("serialize");
        assert_eq!(json, "\"EDIT_ANY_POST\"");
        let parsed: Capability = serde_json::from_str("\"VIEW_USERS\"").expect("deserialize");
        assert_eq!(parsed, Capability::ViewUsers);
    }

    #[test]
    fn catalog_has_no_duplicates() {
        let mut tags: Vec<&str> = Capability::ALL.iter().map(|c| c.as_str()).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), Capability::ALL.len());
    }
}
