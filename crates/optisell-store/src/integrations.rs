use chrono::Utc;
use optisell_core::{Integration, IntegrationPatch, IntegrationSource, NewIntegration};

use crate::{JsonStore, StoreError, INTEGRATIONS_FILE};

impl JsonStore {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read.
    pub async fn list_integrations(&self) -> Result<Vec<Integration>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_collection(INTEGRATIONS_FILE).await
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read.
    pub async fn get_integration(&self, id: &str) -> Result<Option<Integration>, StoreError> {
        let _guard = self.lock.lock().await;
        let all: Vec<Integration> = self.read_collection(INTEGRATIONS_FILE).await?;
        Ok(all.into_iter().find(|i| i.id == id))
    }

    /// Looks up by canonical `{handle}.myshopify.com` domain.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read.
    pub async fn find_integration_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<Integration>, StoreError> {
        let _guard = self.lock.lock().await;
        let all: Vec<Integration> = self.read_collection(INTEGRATIONS_FILE).await?;
        Ok(all.into_iter().find(|i| i.store_domain == domain))
    }

    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn insert_integration(&self, input: NewIntegration) -> Result<Integration, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<Integration> = self.read_collection(INTEGRATIONS_FILE).await?;
        let integration = Integration::create(input, Utc::now());
        all.push(integration.clone());
        self.write_collection(INTEGRATIONS_FILE, &all).await?;
        tracing::info!(
            integration_id = %integration.id,
            store_domain = %integration.store_domain,
            "integration created"
        );
        Ok(integration)
    }

    /// Returns `None` when no integration has this id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn update_integration(
        &self,
        id: &str,
        patch: IntegrationPatch,
    ) -> Result<Option<Integration>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<Integration> = self.read_collection(INTEGRATIONS_FILE).await?;
        let Some(existing) = all.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        existing.apply(patch, Utc::now());
        let updated = existing.clone();
        self.write_collection(INTEGRATIONS_FILE, &all).await?;
        Ok(Some(updated))
    }

    /// Returns `false` when no integration has this id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn delete_integration(&self, id: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<Integration> = self.read_collection(INTEGRATIONS_FILE).await?;
        let before = all.len();
        all.retain(|i| i.id != id);
        if all.len() == before {
            return Ok(false);
        }
        self.write_collection(INTEGRATIONS_FILE, &all).await?;
        tracing::info!(integration_id = %id, "integration deleted");
        Ok(true)
    }

    /// Stores the token from a completed OAuth install, updating the
    /// integration for `domain` when one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be read or written.
    pub async fn upsert_oauth_integration(
        &self,
        domain: &str,
        token: String,
        scope: Option<String>,
    ) -> Result<Integration, StoreError> {
        let _guard = self.lock.lock().await;
        let mut all: Vec<Integration> = self.read_collection(INTEGRATIONS_FILE).await?;
        let now = Utc::now();

        let position = all.iter().position(|i| i.store_domain == domain);
        let integration = if let Some(index) = position {
            let existing = &mut all[index];
            existing.apply(
                IntegrationPatch {
                    admin_access_token: Some(token),
                    scope: Some(scope),
                    source: Some(IntegrationSource::Oauth),
                    ..IntegrationPatch::default()
                },
                now,
            );
            existing.clone()
        } else {
            let created = Integration::create(
                NewIntegration {
                    integration_name: None,
                    store_domain: domain.to_string(),
                    admin_access_token: token,
                    scope,
                    source: IntegrationSource::Oauth,
                },
                now,
            );
            all.push(created.clone());
            created
        };

        self.write_collection(INTEGRATIONS_FILE, &all).await?;
        tracing::info!(
            integration_id = %integration.id,
            store_domain = %domain,
            "oauth token stored"
        );
        Ok(integration)
    }
}
