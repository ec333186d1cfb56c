use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use client_core::{DirectoryError, EmployeeDirectory};
use shared::domain::{Employee, EmployeeFields, EmployeeId};
use tokio::sync::{oneshot, Mutex};

type ScriptedList = (
    Option<oneshot::Receiver<()>>,
    Result<Vec<Employee>, DirectoryError>,
);

pub(crate) fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0)
        .single()
        .expect("timestamp")
        + Duration::minutes(minutes)
}

pub(crate) fn employee(id: &str, name: &str, minutes: i64) -> Employee {
    Employee {
        id: EmployeeId::new(id),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        address: "1 Main St".to_string(),
        phone: "12345678901".to_string(),
        created_at: at(minutes),
    }
}

pub(crate) fn fields(name: &str) -> EmployeeFields {
    EmployeeFields {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_ascii_lowercase()),
        address: "1 Main St".to_string(),
        phone: "12345678901".to_string(),
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    records: Mutex<Vec<Employee>>,
    next_id: AtomicU64,
    scripted_lists: Mutex<VecDeque<ScriptedList>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    reply_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    failures: Mutex<HashMap<String, DirectoryError>>,
    panics: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeDirectory {
    pub(crate) fn with_records(records: Vec<Employee>) -> Arc<Self> {
        let directory = Self {
            next_id: AtomicU64::new(100),
            ..Self::default()
        };
        *directory.records.try_lock().expect("fresh lock") = records;
        Arc::new(directory)
    }

    /// Queues a list reply that is held until the returned sender fires or drops.
    pub(crate) async fn script_list(
        &self,
        result: Result<Vec<Employee>, DirectoryError>,
    ) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.scripted_lists
            .lock()
            .await
            .push_back((Some(gate), result));
        release
    }

    pub(crate) async fn script_list_now(&self, result: Result<Vec<Employee>, DirectoryError>) {
        self.scripted_lists.lock().await.push_back((None, result));
    }

    /// Holds the next call with `key` (e.g. `"replace:2"`) until released.
    pub(crate) async fn hold(&self, key: &str) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.gates.lock().await.insert(key.to_string(), gate);
        release
    }

    /// Lets the next call with `key` take effect but holds its reply until released.
    pub(crate) async fn hold_reply(&self, key: &str) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.reply_gates.lock().await.insert(key.to_string(), gate);
        release
    }

    pub(crate) async fn fail(&self, key: &str, err: DirectoryError) {
        self.failures.lock().await.insert(key.to_string(), err);
    }

    pub(crate) async fn panic_on(&self, key: &str) {
        self.panics.lock().await.insert(key.to_string());
    }

    pub(crate) async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn records(&self) -> Vec<Employee> {
        self.records.lock().await.clone()
    }

    async fn enter(&self, key: String) -> Result<(), DirectoryError> {
        self.calls.lock().await.push(key.clone());
        if self.panics.lock().await.contains(&key) {
            panic!("scripted panic for {key}");
        }
        let gate = self.gates.lock().await.remove(&key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        match self.failures.lock().await.remove(&key) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn reply(&self, key: &str) {
        let gate = self.reply_gates.lock().await.remove(key);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }
}

#[async_trait]
impl EmployeeDirectory for FakeDirectory {
    async fn list(&self) -> Result<Vec<Employee>, DirectoryError> {
        self.enter("list".to_string()).await?;
        let scripted = self.scripted_lists.lock().await.pop_front();
        if let Some((gate, result)) = scripted {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            return result;
        }
        let mut records = self.records.lock().await.clone();
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(records)
    }

    async fn create(&self, fields: &EmployeeFields) -> Result<Employee, DirectoryError> {
        self.enter("create".to_string()).await?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = Employee::from_fields(
            EmployeeId::new(n.to_string()),
            fields.clone(),
            at(n as i64),
        );
        self.records.lock().await.push(record.clone());
        self.reply("create").await;
        Ok(record)
    }

    async fn replace(
        &self,
        id: &EmployeeId,
        fields: &EmployeeFields,
    ) -> Result<Employee, DirectoryError> {
        let key = format!("replace:{id}");
        self.enter(key.clone()).await?;
        let updated = {
            let mut records = self.records.lock().await;
            let held = records
                .iter_mut()
                .find(|record| &record.id == id)
                .ok_or_else(|| DirectoryError::NotFound { id: id.clone() })?;
            *held = Employee::from_fields(id.clone(), fields.clone(), held.created_at);
            held.clone()
        };
        self.reply(&key).await;
        Ok(updated)
    }

    async fn remove(&self, id: &EmployeeId) -> Result<(), DirectoryError> {
        let key = format!("remove:{id}");
        self.enter(key.clone()).await?;
        {
            let mut records = self.records.lock().await;
            let index = records
                .iter()
                .position(|record| &record.id == id)
                .ok_or_else(|| DirectoryError::NotFound { id: id.clone() })?;
            records.remove(index);
        }
        self.reply(&key).await;
        Ok(())
    }
}
