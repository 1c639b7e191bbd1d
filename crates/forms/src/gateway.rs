//! Persistence boundary the controller hands validated records to.

use std::{collections::BTreeMap, marker::PhantomData};

use anyhow::Result;
use async_trait::async_trait;
use shared::protocol::{SaveMode, SaveOutcome};
use tokio::sync::Mutex;

use crate::entities::FormEntity;

/// Stores one record. `Ok(SaveOutcome::Rejected)` is an application-level refusal;
/// `Err` means the call itself failed.
#[async_trait]
pub trait Gateway<E: FormEntity>: Send + Sync {
    async fn save(&self, record: E::Record, mode: SaveMode) -> Result<SaveOutcome>;
}

#[derive(Debug, Clone)]
pub struct GatewayCall<R> {
    pub record: R,
    pub mode: SaveMode,
}

struct MemoryState<R> {
    records: BTreeMap<String, (i64, R)>,
    calls: Vec<GatewayCall<R>>,
    next_id: i64,
}

/// In-process gateway keyed by each record's natural key.
pub struct MemoryGateway<E: FormEntity> {
    state: Mutex<MemoryState<E::Record>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: FormEntity> Default for MemoryGateway<E> {
    fn default() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records: BTreeMap::new(),
                calls: Vec::new(),
                next_id: 1,
            }),
            _entity: PhantomData,
        }
    }
}

impl<E: FormEntity> MemoryGateway<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<E::Record> {
        self.state
            .lock()
            .await
            .records
            .values()
            .map(|(_, record)| record.clone())
            .collect()
    }

    pub async fn get(&self, key: &str) -> Option<E::Record> {
        self.state
            .lock()
            .await
            .records
            .get(key)
            .map(|(_, record)| record.clone())
    }

    pub async fn calls(&self) -> Vec<GatewayCall<E::Record>> {
        self.state.lock().await.calls.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.state.lock().await.calls.len()
    }
}

#[async_trait]
impl<E: FormEntity> Gateway<E> for MemoryGateway<E> {
    async fn save(&self, record: E::Record, mode: SaveMode) -> Result<SaveOutcome> {
        let key = E::record_key(&record);
        let mut state = self.state.lock().await;
        state.calls.push(GatewayCall {
            record: record.clone(),
            mode,
        });

        let existing = state.records.get(&key).map(|(id, _)| *id);
        match (mode, existing) {
            (SaveMode::Create, Some(_)) => Ok(SaveOutcome::rejected(format!(
                "Ya existe un registro con el identificador {key}"
            ))),
            (SaveMode::Update, None) => Ok(SaveOutcome::rejected(format!(
                "No existe un registro con el identificador {key}"
            ))),
            (SaveMode::Update, Some(id)) => {
                state.records.insert(key, (id, record));
                Ok(SaveOutcome::saved(id))
            }
            (SaveMode::Create, None) => {
                let id = state.next_id;
                state.next_id += 1;
                state.records.insert(key, (id, record));
                Ok(SaveOutcome::saved(id))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
