//! Label display-name lookup with a moka hot cache in front of `list_labels`.

use std::collections::HashMap;
use std::time::Duration;

use crate::constants::LABEL_CACHE_MAX_CAPACITY;
use crate::error::MailResult;
use crate::mail::MailService;
use crate::mail::types::MessageId;

use super::patch::CachePatch;

/// Hot cache type alias: label ID -> display name.
pub type LabelNameCache = moka::future::Cache<String, String>;

pub struct LabelDirectory {
    names: LabelNameCache,
}

impl LabelDirectory {
    pub fn new(ttl: Duration) -> Self {
        Self {
            names: moka::future::Cache::builder()
                .max_capacity(LABEL_CACHE_MAX_CAPACITY)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Reload every label from the remote side. Returns the number of labels.
    pub async fn refresh<S: MailService>(&self, service: &S) -> MailResult<usize> {
        let labels = service.list_labels().await?;
        let count = labels.len();
        for label in labels {
            self.names.insert(label.id, label.name).await;
        }
        self.names.run_pending_tasks().await;
        tracing::debug!("Label directory refreshed with {} labels", count);
        Ok(count)
    }

    /// Resolve display names for `ids`.
    ///
    /// Cached names are used when every ID is present; otherwise the label list
    /// is fetched once. IDs still unknown afterwards map to themselves.
    pub async fn resolve<S: MailService>(
        &self,
        service: &S,
        ids: &[String],
    ) -> MailResult<HashMap<String, String>> {
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut missing = false;
        for id in ids {
            match self.names.get(id).await {
                Some(name) => {
                    resolved.insert(id.clone(), name);
                }
                None => missing = true,
            }
        }
        if !missing {
            return Ok(resolved);
        }

        self.refresh(service).await?;
        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            let name = self.names.get(id).await.unwrap_or_else(|| id.clone());
            resolved.insert(id.clone(), name);
        }
        Ok(resolved)
    }

    /// Label patch for `ids` with display names attached when the lookup works.
    /// A failed lookup still yields a patch; only the names are left out.
    pub async fn label_patch<S: MailService>(
        &self,
        service: &S,
        ids: &[MessageId],
        add: Vec<String>,
        remove: Vec<String>,
    ) -> CachePatch {
        let touched: Vec<String> = add.iter().chain(remove.iter()).cloned().collect();
        let names = match self.resolve(service, &touched).await {
            Ok(names) => Some(names),
            Err(e) => {
                tracing::warn!("Label lookup failed, skipping name patch: {}", e);
                None
            }
        };
        CachePatch::Labels {
            ids: ids.to_vec(),
            add,
            remove,
            names,
        }
    }

    /// Look up a label ID by display name (case-insensitive) among cached labels
    pub fn id_for_name(&self, name: &str) -> Option<String> {
        self.names
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(id, _)| id.to_string())
    }
}
