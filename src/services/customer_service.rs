use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;

use super::error::{ServiceError, ServiceResult};
use super::validation::{normalize_email, FieldErrors};
use crate::database::CustomerStore;
use crate::models::Customer;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub active: Option<bool>,
}

impl CustomerInput {
    fn validate(&self) -> ServiceResult<String> {
        let email = normalize_email(&self.email);
        let mut errors = FieldErrors::new();
        errors
            .require(&self.first_name, "firstName")
            .require(&self.last_name, "lastName")
            .email(&email, "email");
        errors.finish()?;
        Ok(email)
    }

    fn phone(&self) -> Option<String> {
        self.phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
    }
}

/// Tenant-scoped CRM records.
#[derive(Clone)]
pub struct CustomerService {
    customers: Arc<dyn CustomerStore>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerStore>) -> Self {
        Self { customers }
    }

    pub async fn create(&self, tenant_id: Uuid, input: CustomerInput) -> ServiceResult<Customer> {
        let email = input.validate()?;
        if self.customers.exists_by_email(tenant_id, &email).await? {
            return Err(ServiceError::duplicate(format!(
                "Customer with email '{}' already exists",
                email
            )));
        }

        let mut customer = Customer::new(
            tenant_id,
            input.first_name.trim(),
            input.last_name.trim(),
            email,
            input.phone(),
        );
        customer.active = input.active.unwrap_or(true);
        self.customers.insert(&customer).await?;
        tracing::info!(customer_id = %customer.id, %tenant_id, "customer created");
        Ok(customer)
    }

    pub async fn get_by_email(&self, tenant_id: Uuid, email: &str) -> ServiceResult<Customer> {
        let email = normalize_email(email);
        self.customers
            .find_by_email(tenant_id, &email)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Customer not found with email: {}", email)))
    }

    pub async fn list(&self, tenant_id: Uuid) -> ServiceResult<Vec<Customer>> {
        Ok(self.customers.list(tenant_id).await?)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, input: CustomerInput) -> ServiceResult<Customer> {
        let email = input.validate()?;
        let mut customer = self
            .customers
            .find_by_id(tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Customer not found with id: {}", id)))?;

        if customer.email != email && self.customers.exists_by_email(tenant_id, &email).await? {
            return Err(ServiceError::duplicate(format!(
                "Customer with email '{}' already exists",
                email
            )));
        }

        customer.first_name = input.first_name.trim().to_string();
        customer.last_name = input.last_name.trim().to_string();
        customer.phone = input.phone();
        customer.email = email;
        if let Some(active) = input.active {
            customer.active = active;
        }
        customer.timestamps.touch();

        self.customers.update(&customer).await?;
        Ok(customer)
    }

    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> ServiceResult<()> {
        self.customers.delete(tenant_id, id).await.map_err(|err| match ServiceError::from(err) {
            ServiceError::NotFound(_) => ServiceError::not_found(format!("Customer not found with id: {}", id)),
            other => other,
        })?;
        tracing::info!(customer_id = %id, %tenant_id, "customer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;

    fn input(email: &str) -> CustomerInput {
        CustomerInput {
            first_name: "Ann".into(),
            last_name: "Lee".into(),
            email: email.into(),
            phone: Some(" ".into()),
            active: None,
        }
    }

    fn service() -> CustomerService {
        CustomerService::new(Stores::memory().customers)
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let service = service();
        let tenant = Uuid::new_v4();
        let created = service.create(tenant, input("Ann@Example.com")).await.unwrap();
        assert_eq!(created.email, "ann@example.com");
        assert!(created.active);
        assert_eq!(created.phone, None);
        assert_eq!(service.get_by_email(tenant, "ann@example.com").await.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn duplicate_email_in_tenant() {
        let service = service();
        let tenant = Uuid::new_v4();
        service.create(tenant, input("ann@example.com")).await.unwrap();
        assert!(matches!(
            service.create(tenant, input("ann@example.com")).await,
            Err(ServiceError::Duplicate(_))
        ));
        service.create(Uuid::new_v4(), input("ann@example.com")).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_ids_are_not_found() {
        let service = service();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let customer = service.create(owner, input("ann@example.com")).await.unwrap();

        assert!(matches!(
            service.update(intruder, customer.id, input("x@example.com")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(intruder, customer.id).await,
            Err(ServiceError::NotFound(_))
        ));
        service.delete(owner, customer.id).await.unwrap();
        assert!(service.list(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_changes_fields() {
        let service = service();
        let tenant = Uuid::new_v4();
        let customer = service.create(tenant, input("ann@example.com")).await.unwrap();
        let updated = service
            .update(
                tenant,
                customer.id,
                CustomerInput {
                    last_name: "Smith".into(),
                    active: Some(false),
                    ..input("ann.smith@example.com")
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.last_name, "Smith");
        assert_eq!(updated.email, "ann.smith@example.com");
        assert!(!updated.active);
    }
}
