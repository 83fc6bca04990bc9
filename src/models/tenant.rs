use serde::Serialize;
use uuid::Uuid;

use super::Timestamps;

/// A store operating on the platform. Name and slug are globally unique and
/// the slug never changes once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_email: String,
    pub active: bool,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Tenant {
    pub fn new(name: impl Into<String>, slug: impl Into<String>, owner_email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            owner_email: owner_email.into(),
            active: true,
            timestamps: Timestamps::now(),
        }
    }
}
