//! Single-owner in-memory policy collection
//!
//! `PolicyStore` owns the collection and the backing key/value store. Every
//! mutation goes through `&mut self` and re-persists the full collection
//! before returning.

use crate::backup::{parse_import, ImportError};
use crate::policy::{DraftError, InsurancePolicy, PolicyDraft};
use crate::storage::{load_collection, save_collection, KeyValueStore};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::collections::HashSet;
use std::path::{Component, Path};
use thiserror::Error;

const FALLBACK_CONTRACT_NAME: &str = "contract";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no policy with id {0:?}")]
    NotFound(String),
    #[error("policy id {0:?} already exists")]
    DuplicateId(String),
    #[error(transparent)]
    Draft(#[from] DraftError),
    #[error("policy {0:?} has no attached contract")]
    NoContract(String),
    #[error("stored contract data is not valid base64: {0}")]
    CorruptContract(#[from] base64::DecodeError),
}

/// A contract document to attach to a policy
#[derive(Debug, Clone)]
pub struct ContractDocument {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Reduce a stored or user-supplied file name to its last path component
///
/// Names come from imported backups as well as local files, so directory
/// parts and `..` never reach the filesystem.
fn sanitize_file_name(name: &str) -> String {
    let last = Path::new(name.trim())
        .components()
        .next_back()
        .and_then(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .filter(|part| !part.trim().is_empty());

    match last {
        Some(part) => part.to_string(),
        None => FALLBACK_CONTRACT_NAME.to_string(),
    }
}

/// Owner of the policy collection
pub struct PolicyStore<S: KeyValueStore> {
    backend: S,
    policies: Vec<InsurancePolicy>,
}

impl<S: KeyValueStore> PolicyStore<S> {
    /// Hydrate the collection from `backend`
    pub fn open(backend: S) -> Self {
        let policies = load_collection(&backend);
        Self { backend, policies }
    }

    /// Policies in insertion order
    pub fn policies(&self) -> &[InsurancePolicy] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&InsurancePolicy> {
        self.policies.iter().find(|p| p.id == id)
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.policies
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn persist(&mut self) {
        save_collection(&mut self.backend, &self.policies);
    }

    /// Create a policy from a complete draft, generating a fresh id
    pub fn add(&mut self, draft: PolicyDraft) -> Result<&InsurancePolicy, StoreError> {
        self.add_with_id(uuid::Uuid::new_v4().to_string(), draft)
    }

    /// Create a policy with a caller-chosen id
    pub fn add_with_id(
        &mut self,
        id: impl Into<String>,
        draft: PolicyDraft,
    ) -> Result<&InsurancePolicy, StoreError> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(StoreError::DuplicateId(id));
        }

        let policy = draft.into_policy(id)?;
        if policy.end_date < policy.start_date {
            log::warn!(
                "Policy {} ends ({}) before it starts ({})",
                policy.policy_number, policy.end_date, policy.start_date
            );
        }
        log::info!("Adding policy {} ({})", policy.id, policy.provider);

        self.policies.push(policy);
        self.persist();
        let last = self.policies.len() - 1;
        Ok(&self.policies[last])
    }

    /// Replace the fields carried by `draft` on an existing policy
    pub fn update(&mut self, id: &str, draft: PolicyDraft) -> Result<&InsurancePolicy, StoreError> {
        let idx = self.position(id)?;
        draft.apply_to(&mut self.policies[idx])?;
        log::info!("Updated policy {}", id);

        self.persist();
        Ok(&self.policies[idx])
    }

    /// Remove a policy, returning it
    pub fn delete(&mut self, id: &str) -> Result<InsurancePolicy, StoreError> {
        let idx = self.position(id)?;
        let removed = self.policies.remove(idx);
        log::info!("Deleted policy {}", id);

        self.persist();
        Ok(removed)
    }

    /// Replace the entire collection, as an import does
    ///
    /// Ids are kept verbatim; duplicates are logged, not rejected.
    pub fn replace_all(&mut self, policies: Vec<InsurancePolicy>) -> usize {
        let mut seen = HashSet::new();
        for p in &policies {
            if !seen.insert(p.id.as_str()) {
                log::warn!("Imported collection contains duplicate id {:?}", p.id);
            }
        }

        self.policies = policies;
        log::info!("Replaced collection with {} policies", self.policies.len());

        self.persist();
        self.policies.len()
    }

    /// Replace the collection with the records in a backup file
    ///
    /// `approve` sees the parsed records and may decline; nothing changes
    /// unless the file parses and the import is approved. Returns the number
    /// of imported policies, or `None` when declined.
    pub fn import_backup<F>(&mut self, contents: &str, approve: F) -> Result<Option<usize>, ImportError>
    where
        F: FnOnce(&[InsurancePolicy]) -> bool,
    {
        let incoming = parse_import(contents)?;
        if !approve(&incoming) {
            log::info!("Import of {} policies declined", incoming.len());
            return Ok(None);
        }
        Ok(Some(self.replace_all(incoming)))
    }

    /// Store a contract document on a policy
    pub fn attach_contract(
        &mut self,
        id: &str,
        document: ContractDocument,
    ) -> Result<&InsurancePolicy, StoreError> {
        let idx = self.position(id)?;
        let policy = &mut self.policies[idx];
        policy.contract_file_name = Some(sanitize_file_name(&document.file_name));
        policy.contract_mime_type = Some(document.mime_type);
        policy.contract_data = Some(BASE64.encode(&document.bytes));
        log::info!("Attached contract ({} bytes) to policy {}", document.bytes.len(), id);

        self.persist();
        Ok(&self.policies[idx])
    }

    /// Remove any attached contract from a policy
    pub fn detach_contract(&mut self, id: &str) -> Result<&InsurancePolicy, StoreError> {
        let idx = self.position(id)?;
        let policy = &mut self.policies[idx];
        policy.contract_file_name = None;
        policy.contract_mime_type = None;
        policy.contract_data = None;

        self.persist();
        Ok(&self.policies[idx])
    }

    /// Decode the contract attached to a policy
    pub fn contract(&self, id: &str) -> Result<ContractDocument, StoreError> {
        let policy = self
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let data = policy
            .contract_data
            .as_deref()
            .ok_or_else(|| StoreError::NoContract(id.to_string()))?;

        Ok(ContractDocument {
            file_name: policy
                .contract_file_name
                .as_deref()
                .map(sanitize_file_name)
                .unwrap_or_else(|| FALLBACK_CONTRACT_NAME.to_string()),
            mime_type: policy
                .contract_mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            bytes: BASE64.decode(data)?,
        })
    }

    /// Give up ownership of the backing store
    pub fn into_backend(self) -> S {
        self.backend
    }
}
