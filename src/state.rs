//! Host state blob: patch location plus normalized parameter values.

use std::path::PathBuf;

use patchhost_core::PatchEngine;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::params::ParameterSet;
use crate::patch::PatchInfo;
use crate::PatchInstance;

/// What a host saves with its session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub patch_name: Option<String>,
    pub patch_path: Option<PathBuf>,
    /// (parameter name, normalized value)
    pub parameters: Vec<(String, f32)>,
}

impl PersistedState {
    pub fn capture<E: PatchEngine>(instance: &PatchInstance<E>, params: &ParameterSet) -> Self {
        let patch = instance.patch();
        Self {
            patch_name: patch.as_ref().map(|p| p.name.clone()),
            patch_path: patch.map(|p| p.dir),
            parameters: params
                .iter()
                .map(|p| (p.name().to_string(), p.normalized()))
                .collect(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }

    /// Apply parameter values, reload the saved patch and push every value
    /// that has a send symbol into it.
    ///
    /// Values for parameters that no longer exist are skipped.
    pub fn restore<E: PatchEngine>(
        &self,
        instance: &PatchInstance<E>,
        params: &ParameterSet,
    ) -> Result<Option<PatchInfo>> {
        for (name, value) in &self.parameters {
            match params.index_of(name) {
                Some(index) => params.set_normalized(index, *value)?,
                None => tracing::debug!("Skipping saved value for unknown parameter '{}'", name),
            }
        }

        let info = match (&self.patch_name, &self.patch_path) {
            (Some(name), Some(dir)) => Some(instance.load_patch(name, dir)?),
            _ => None,
        };
        if info.is_none() {
            return Ok(None);
        }

        for index in 0..params.len() {
            let has_send = params
                .get(index)
                .is_some_and(|p| p.spec().send.is_some());
            if has_send {
                if let Err(e) = instance.send_parameter(params, index) {
                    tracing::debug!("Parameter {} not pushed to patch: {}", index, e);
                }
            }
        }
        Ok(info)
    }
}
