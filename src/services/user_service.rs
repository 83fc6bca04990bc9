use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Deserialize;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation::{normalize_email, FieldErrors, MIN_PASSWORD_LENGTH};
use crate::auth::{hash_password, verify_password};
use crate::database::{CustomerStore, TenantStore, UserStore};
use crate::models::{Customer, Role, User};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Verified against when there is no account, so unknown emails cost the
/// same as wrong passwords.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash_password("not-a-real-password").ok());

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub store_slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSignup {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    tenants: Arc<dyn TenantStore>,
    users: Arc<dyn UserStore>,
    customers: Arc<dyn CustomerStore>,
}

impl UserService {
    pub fn new(
        tenants: Arc<dyn TenantStore>,
        users: Arc<dyn UserStore>,
        customers: Arc<dyn CustomerStore>,
    ) -> Self {
        Self {
            tenants,
            users,
            customers,
        }
    }

    /// Add a user to an existing tenant. Only an ADMIN may hand out the
    /// ADMIN role.
    pub async fn create_user(&self, tenant_id: Uuid, actor: Role, request: NewUser) -> ServiceResult<User> {
        if request.role == Role::Admin && actor != Role::Admin {
            return Err(ServiceError::Forbidden("Only administrators can create ADMIN users".into()));
        }

        let email = normalize_email(&request.email);
        let mut errors = FieldErrors::new();
        errors
            .email(&email, "email")
            .check(
                request.password.chars().count() >= MIN_PASSWORD_LENGTH,
                "password",
                "Password must be at least 8 characters",
            )
            .require(&request.full_name, "fullName");
        errors.finish()?;

        if self.tenants.find_by_id(tenant_id).await?.is_none() {
            return Err(ServiceError::not_found(format!("Tenant not found with id: {}", tenant_id)));
        }
        if self.users.exists_by_email(tenant_id, &email).await? {
            return Err(ServiceError::duplicate(format!("User with email '{}' already exists", email)));
        }

        let user = User::new(
            tenant_id,
            email,
            request.full_name.trim(),
            self.hash(&request.password)?,
            request.role,
        );
        self.users.insert(&user).await?;
        tracing::info!(user_id = %user.id, %tenant_id, role = %user.role, "user created");
        Ok(user)
    }

    pub async fn get_by_email(&self, tenant_id: Uuid, email: &str) -> ServiceResult<User> {
        let email = normalize_email(email);
        self.users
            .find_by_email(tenant_id, &email)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User not found with email: {}", email)))
    }

    pub async fn get_by_id(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<User> {
        self.users
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("User not found with id: {}", id)))
    }

    pub async fn list_by_tenant(&self, tenant_id: Uuid) -> ServiceResult<Vec<User>> {
        Ok(self.users.list_by_tenant(tenant_id).await?)
    }

    /// Resolve credentials to a user. With a store slug the lookup is scoped
    /// to that store. Without one, the password is checked against every
    /// account using the email and must open exactly one of them.
    ///
    /// Every failure is the same `Unauthorized`, and a password hash is
    /// verified even when no account exists.
    pub async fn authenticate(&self, request: &LoginRequest) -> ServiceResult<User> {
        let email = normalize_email(&request.email);

        let candidates = match request.store_slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => match self.tenants.find_by_slug(slug).await? {
                Some(tenant) => self.users.find_by_email(tenant.id, &email).await?.into_iter().collect(),
                None => Vec::new(),
            },
            _ => self.users.list_by_email(&email).await?,
        };

        if candidates.is_empty() {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(&request.password, dummy);
            }
            tracing::warn!(%email, "login rejected: unknown account");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let mut opened = Vec::new();
        for user in candidates {
            let matches = verify_password(&request.password, &user.password_hash)
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            if matches && user.enabled {
                opened.push(user);
            }
        }

        match opened.len() {
            1 => Ok(opened.remove(0)),
            0 => {
                tracing::warn!(%email, "login rejected");
                Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
            n => {
                tracing::warn!(%email, accounts = n, "login rejected: password opens several stores");
                Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()))
            }
        }
    }

    /// Shopper sign-up on a store: a CUSTOMER login plus the matching CRM
    /// record.
    pub async fn register_customer(
        &self,
        store_slug: &str,
        request: CustomerSignup,
    ) -> ServiceResult<(User, Customer)> {
        let tenant = self
            .tenants
            .find_by_slug(store_slug)
            .await?
            .filter(|tenant| tenant.active)
            .ok_or_else(|| ServiceError::not_found(format!("Store not found: {}", store_slug)))?;

        let email = normalize_email(&request.email);
        let mut errors = FieldErrors::new();
        errors
            .email(&email, "email")
            .check(
                request.password.chars().count() >= MIN_PASSWORD_LENGTH,
                "password",
                "Password must be at least 8 characters",
            )
            .require(&request.first_name, "firstName")
            .require(&request.last_name, "lastName");
        errors.finish()?;

        if self.users.exists_by_email(tenant.id, &email).await?
            || self.customers.exists_by_email(tenant.id, &email).await?
        {
            return Err(ServiceError::duplicate(format!(
                "An account with email '{}' already exists in this store",
                email
            )));
        }

        let full_name = format!("{} {}", request.first_name.trim(), request.last_name.trim());
        let user = User::new(
            tenant.id,
            email.clone(),
            full_name,
            self.hash(&request.password)?,
            Role::Customer,
        );
        let customer = Customer::new(
            tenant.id,
            request.first_name.trim(),
            request.last_name.trim(),
            email,
            request.phone.filter(|p| !p.trim().is_empty()),
        );

        self.users.insert_with_customer(&user, &customer).await?;
        tracing::info!(tenant_id = %tenant.id, user_id = %user.id, "customer registered");
        Ok((user, customer))
    }

    fn hash(&self, password: &str) -> ServiceResult<String> {
        hash_password(password).map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;
    use crate::models::Tenant;

    async fn setup() -> (UserService, Stores, Tenant) {
        let stores = Stores::memory();
        let tenant = Tenant::new("Acme Store", "acme-store", "a@acme.com");
        stores.tenants.insert(&tenant).await.unwrap();
        let service = UserService::new(
            stores.tenants.clone(),
            stores.users.clone(),
            stores.customers.clone(),
        );
        (service, stores, tenant)
    }

    fn staff(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password: "password123".into(),
            full_name: "Sam Staff".into(),
            role: Role::Staff,
        }
    }

    #[tokio::test]
    async fn email_is_unique_per_tenant_only() {
        let (service, stores, acme) = setup().await;
        let other = Tenant::new("Other Shop", "other-shop", "o@other.com");
        stores.tenants.insert(&other).await.unwrap();

        service.create_user(acme.id, Role::Merchant, staff("sam@x.com")).await.unwrap();
        let err = service
            .create_user(acme.id, Role::Merchant, staff("SAM@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));

        service.create_user(other.id, Role::Merchant, staff("sam@x.com")).await.unwrap();
    }

    #[tokio::test]
    async fn merchants_cannot_mint_admins() {
        let (service, _, acme) = setup().await;
        let request = NewUser { role: Role::Admin, ..staff("boss@x.com") };
        assert!(matches!(
            service.create_user(acme.id, Role::Merchant, request).await,
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.create_user(Uuid::new_v4(), Role::Admin, staff("a@b.com")).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn authenticate_checks_password() {
        let (service, _, acme) = setup().await;
        service.create_user(acme.id, Role::Merchant, staff("sam@x.com")).await.unwrap();

        let login = |password: &str| LoginRequest {
            email: "sam@x.com".into(),
            password: password.into(),
            store_slug: None,
        };
        assert!(service.authenticate(&login("password123")).await.is_ok());
        assert!(matches!(
            service.authenticate(&login("nope")).await,
            Err(ServiceError::Unauthorized(ref m)) if m == INVALID_CREDENTIALS
        ));
    }

    #[tokio::test]
    async fn unknown_and_wrong_logins_look_the_same() {
        let (service, _, acme) = setup().await;
        service.create_user(acme.id, Role::Merchant, staff("sam@x.com")).await.unwrap();

        let attempts = [
            ("ghost@x.com", "password123", None),
            ("sam@x.com", "wrong-pass", None),
            ("sam@x.com", "password123", Some("no-such-store")),
            ("ghost@x.com", "password123", Some("acme-store")),
        ];
        for (email, password, slug) in attempts {
            let login = LoginRequest {
                email: email.into(),
                password: password.into(),
                store_slug: slug.map(str::to_string),
            };
            assert!(matches!(
                service.authenticate(&login).await,
                Err(ServiceError::Unauthorized(ref m)) if m == INVALID_CREDENTIALS
            ));
        }
    }

    #[tokio::test]
    async fn shared_email_logs_into_the_store_the_password_opens() {
        let (service, stores, acme) = setup().await;
        let other = Tenant::new("Other Shop", "other-shop", "o@other.com");
        stores.tenants.insert(&other).await.unwrap();
        service.create_user(acme.id, Role::Merchant, staff("sam@x.com")).await.unwrap();
        let different = NewUser {
            password: "another-secret".into(),
            ..staff("sam@x.com")
        };
        service.create_user(other.id, Role::Merchant, different).await.unwrap();

        let login = LoginRequest {
            email: "sam@x.com".into(),
            password: "another-secret".into(),
            store_slug: None,
        };
        let user = service.authenticate(&login).await.unwrap();
        assert_eq!(user.scope.tenant_id, other.id);
    }

    #[tokio::test]
    async fn ambiguous_email_needs_store_slug() {
        let (service, stores, acme) = setup().await;
        let other = Tenant::new("Other Shop", "other-shop", "o@other.com");
        stores.tenants.insert(&other).await.unwrap();
        service.create_user(acme.id, Role::Merchant, staff("sam@x.com")).await.unwrap();
        service.create_user(other.id, Role::Merchant, staff("sam@x.com")).await.unwrap();

        let mut login = LoginRequest {
            email: "sam@x.com".into(),
            password: "password123".into(),
            store_slug: None,
        };
        assert!(matches!(
            service.authenticate(&login).await,
            Err(ServiceError::Unauthorized(ref m)) if m == INVALID_CREDENTIALS
        ));

        login.store_slug = Some("other-shop".into());
        let user = service.authenticate(&login).await.unwrap();
        assert_eq!(user.scope.tenant_id, other.id);
    }

    #[tokio::test]
    async fn customer_signup_creates_user_and_record() {
        let (service, stores, acme) = setup().await;
        let signup = CustomerSignup {
            email: "shopper@example.com".into(),
            password: "password123".into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            phone: None,
        };
        let (user, customer) = service.register_customer("acme-store", signup.clone()).await.unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(customer.email, "shopper@example.com");
        assert!(stores
            .customers
            .find_by_email(acme.id, "shopper@example.com")
            .await
            .unwrap()
            .is_some());

        assert!(matches!(
            service.register_customer("acme-store", signup.clone()).await,
            Err(ServiceError::Duplicate(_))
        ));
        assert!(matches!(
            service.register_customer("missing", signup).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
