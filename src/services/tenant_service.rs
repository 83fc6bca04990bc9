use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation::{is_valid_slug, normalize_email, FieldErrors, MIN_PASSWORD_LENGTH};
use crate::auth::hash_password;
use crate::database::TenantStore;
use crate::models::{Role, Tenant, User};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 50;

/// Store that owns platform ADMIN accounts.
pub const PLATFORM_TENANT_NAME: &str = "Platform Administration";
pub const PLATFORM_TENANT_SLUG: &str = "platform";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTenant {
    pub name: String,
    pub slug: String,
    pub owner_email: String,
}

/// Merchant sign-up: a new store plus its first MERCHANT user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMerchant {
    pub store_name: String,
    pub store_slug: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

#[derive(Clone)]
pub struct TenantService {
    tenants: Arc<dyn TenantStore>,
}

impl TenantService {
    pub fn new(tenants: Arc<dyn TenantStore>) -> Self {
        Self { tenants }
    }

    pub async fn create_tenant(&self, request: NewTenant) -> ServiceResult<Tenant> {
        let tenant = self.prepare(&request.name, &request.slug, &request.owner_email, None).await?;
        self.tenants.insert(&tenant).await?;
        tracing::info!(tenant_id = %tenant.id, slug = %tenant.slug, "tenant created");
        Ok(tenant)
    }

    pub async fn register_merchant(&self, request: RegisterMerchant) -> ServiceResult<(Tenant, User)> {
        let (tenant, owner) = self.register_owner(request, Role::Merchant).await?;
        tracing::info!(
            tenant_id = %tenant.id,
            slug = %tenant.slug,
            user_id = %owner.id,
            "merchant registered"
        );
        Ok((tenant, owner))
    }

    /// Create the platform store together with an ADMIN account. Fails with
    /// a duplicate error once the platform store exists.
    pub async fn register_platform_admin(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ServiceResult<(Tenant, User)> {
        let request = RegisterMerchant {
            store_name: PLATFORM_TENANT_NAME.to_string(),
            store_slug: PLATFORM_TENANT_SLUG.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
        };
        let (tenant, admin) = self.register_owner(request, Role::Admin).await?;
        tracing::info!(tenant_id = %tenant.id, user_id = %admin.id, "platform admin provisioned");
        Ok((tenant, admin))
    }

    async fn register_owner(&self, request: RegisterMerchant, role: Role) -> ServiceResult<(Tenant, User)> {
        let tenant = self
            .prepare(
                &request.store_name,
                &request.store_slug,
                &request.email,
                Some((&request.password, &request.full_name)),
            )
            .await?;

        let password_hash =
            hash_password(&request.password).map_err(|e| ServiceError::Internal(e.to_string()))?;
        let owner = User::new(
            tenant.id,
            tenant.owner_email.clone(),
            request.full_name.trim(),
            password_hash,
            role,
        );

        self.tenants.insert_with_owner(&tenant, &owner).await?;
        Ok((tenant, owner))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Tenant> {
        self.tenants
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Tenant not found with slug: {}", slug)))
    }

    pub async fn get_by_id(&self, id: Uuid) -> ServiceResult<Tenant> {
        self.tenants
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Tenant not found with id: {}", id)))
    }

    pub async fn list(&self) -> ServiceResult<Vec<Tenant>> {
        Ok(self.tenants.list().await?)
    }

    /// Validate the fields of a new tenant, check both unique keys and build
    /// the entity. `owner` carries the password and full name for a merchant
    /// sign-up.
    async fn prepare(
        &self,
        name: &str,
        slug: &str,
        owner_email: &str,
        owner: Option<(&str, &str)>,
    ) -> ServiceResult<Tenant> {
        let name = name.trim();
        let slug = slug.trim();
        let owner_email = normalize_email(owner_email);

        let name_len = name.chars().count();
        let mut errors = FieldErrors::new();
        errors
            .require(name, "name")
            .check(
                (NAME_MIN..=NAME_MAX).contains(&name_len),
                "name",
                "Store name must be between 3 and 50 characters",
            )
            .require(slug, "slug")
            .check(
                is_valid_slug(slug),
                "slug",
                "Slug must contain only lowercase letters, numbers, and hyphens",
            )
            .email(&owner_email, "ownerEmail");
        if let Some((password, full_name)) = owner {
            errors
                .check(
                    password.chars().count() >= MIN_PASSWORD_LENGTH,
                    "password",
                    "Password must be at least 8 characters",
                )
                .require(full_name, "fullName");
        }
        errors.finish()?;

        if self.tenants.exists_by_slug(slug).await? {
            return Err(ServiceError::duplicate(format!(
                "Tenant with slug '{}' already exists",
                slug
            )));
        }
        if self.tenants.exists_by_name(name).await? {
            return Err(ServiceError::duplicate(format!(
                "Tenant with name '{}' already exists",
                name
            )));
        }

        Ok(Tenant::new(name, slug, owner_email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;

    fn service() -> (TenantService, Stores) {
        let stores = Stores::memory();
        (TenantService::new(stores.tenants.clone()), stores)
    }

    fn acme() -> NewTenant {
        NewTenant {
            name: "Acme Store".into(),
            slug: "acme-store".into(),
            owner_email: "a@acme.com".into(),
        }
    }

    #[tokio::test]
    async fn creates_active_tenant() {
        let (service, _) = service();
        let tenant = service.create_tenant(acme()).await.unwrap();
        assert!(tenant.active);
        assert_eq!(tenant.slug, "acme-store");
        assert_eq!(service.get_by_slug("acme-store").await.unwrap().id, tenant.id);
    }

    #[tokio::test]
    async fn duplicate_slug_or_name_is_rejected() {
        let (service, _) = service();
        service.create_tenant(acme()).await.unwrap();

        let err = service.create_tenant(acme()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));

        let same_name = NewTenant { slug: "acme-2".into(), ..acme() };
        let err = service.create_tenant(same_name).await.unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(ref m) if m.contains("name")));
    }

    #[tokio::test]
    async fn reports_every_invalid_field() {
        let (service, _) = service();
        let err = service
            .create_tenant(NewTenant {
                name: "Ab".into(),
                slug: "Bad Slug".into(),
                owner_email: "nobody".into(),
            })
            .await
            .unwrap_err();

        match err {
            ServiceError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("name"));
                assert!(field_errors.contains_key("slug"));
                assert!(field_errors.contains_key("ownerEmail"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_slug_is_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.get_by_slug("ghost").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn merchant_registration_creates_owner() {
        let (service, stores) = service();
        let (tenant, owner) = service
            .register_merchant(RegisterMerchant {
                store_name: "Bolt Bikes".into(),
                store_slug: "bolt-bikes".into(),
                email: "Owner@Bolt.io".into(),
                password: "s3cretpass".into(),
                full_name: "Bo Lt".into(),
            })
            .await
            .unwrap();

        assert_eq!(owner.role, Role::Merchant);
        assert_eq!(owner.email, "owner@bolt.io");
        let stored = stores.users.find_by_email(tenant.id, "owner@bolt.io").await.unwrap();
        assert_eq!(stored.map(|u| u.id), Some(owner.id));
    }

    #[tokio::test]
    async fn short_password_blocks_registration() {
        let (service, stores) = service();
        let err = service
            .register_merchant(RegisterMerchant {
                store_name: "Bolt Bikes".into(),
                store_slug: "bolt-bikes".into(),
                email: "owner@bolt.io".into(),
                password: "short".into(),
                full_name: "Bo".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
        assert!(stores.tenants.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn platform_admin_is_provisioned_once() {
        let (service, _) = service();
        let (tenant, admin) = service
            .register_platform_admin("root@platform.io", "rootpass1", "Root")
            .await
            .unwrap();
        assert_eq!(tenant.slug, PLATFORM_TENANT_SLUG);
        assert_eq!(admin.role, Role::Admin);

        let err = service
            .register_platform_admin("other@platform.io", "rootpass2", "Other")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
    }
}
