use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    str::FromStr,
};

use shared::{
    domain::{Employee, EmployeeId},
    error::ErrorInfo,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Fetch,
    Add,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PendingOp {
    Fetch,
    Add,
    Update(EmployeeId),
    Delete(EmployeeId),
}

impl PendingOp {
    pub fn kind(&self) -> OperationKind {
        match self {
            PendingOp::Fetch => OperationKind::Fetch,
            PendingOp::Add => OperationKind::Add,
            PendingOp::Update(_) => OperationKind::Update,
            PendingOp::Delete(_) => OperationKind::Delete,
        }
    }
}

/// Operations awaiting a remote outcome, counted so overlapping requests of the
/// same key stay pending until the last one resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSet {
    counts: BTreeMap<PendingOp, usize>,
}

impl PendingSet {
    pub fn insert(&mut self, op: PendingOp) {
        *self.counts.entry(op).or_insert(0) += 1;
    }

    pub fn remove(&mut self, op: &PendingOp) {
        self.remove_n(op, 1);
    }

    pub fn remove_n(&mut self, op: &PendingOp, n: usize) {
        if let Some(count) = self.counts.get_mut(op) {
            *count = count.saturating_sub(n);
            if *count == 0 {
                self.counts.remove(op);
            }
        }
    }

    pub fn contains(&self, op: &PendingOp) -> bool {
        self.counts.contains_key(op)
    }

    pub fn count(&self, op: &PendingOp) -> usize {
        self.counts.get(op).copied().unwrap_or(0)
    }

    pub fn contains_kind(&self, kind: OperationKind) -> bool {
        self.counts.keys().any(|op| op.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOp> {
        self.counts.keys()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    #[default]
    ReinsertOnUpdate,
    /// Late updates for a deleted id are dropped.
    DeleteWins,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::ReinsertOnUpdate => f.write_str("reinsert_on_update"),
            ConflictPolicy::DeleteWins => f.write_str("delete_wins"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reinsert_on_update" | "reinsert" => Ok(ConflictPolicy::ReinsertOnUpdate),
            "delete_wins" => Ok(ConflictPolicy::DeleteWins),
            other => Err(format!(
                "unknown conflict policy '{other}' (expected reinsert_on_update or delete_wins)"
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collection {
    records: Vec<Employee>,
}

impl Collection {
    /// Later duplicates of an id replace earlier ones.
    pub fn from_records(records: impl IntoIterator<Item = Employee>) -> Self {
        let mut positions: HashMap<EmployeeId, usize> = HashMap::new();
        let mut deduped: Vec<Employee> = Vec::new();
        for record in records {
            match positions.get(&record.id) {
                Some(&index) => deduped[index] = record,
                None => {
                    positions.insert(record.id.clone(), deduped.len());
                    deduped.push(record);
                }
            }
        }
        let mut collection = Self { records: deduped };
        collection.sort();
        collection
    }

    pub fn get(&self, id: &EmployeeId) -> Option<&Employee> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn contains(&self, id: &EmployeeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns true when the id was not held before.
    pub fn upsert(&mut self, record: Employee) -> bool {
        let inserted = match self.records.iter_mut().find(|held| held.id == record.id) {
            Some(held) => {
                *held = record;
                false
            }
            None => {
                self.records.push(record);
                true
            }
        };
        self.sort();
        inserted
    }

    pub fn remove(&mut self, id: &EmployeeId) -> Option<Employee> {
        let index = self.records.iter().position(|record| &record.id == id)?;
        Some(self.records.remove(index))
    }

    pub fn as_slice(&self) -> &[Employee] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Employee> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &EmployeeId> {
        self.records.iter().map(|record| &record.id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn sort(&mut self) {
        // stable: equal timestamps keep arrival order
        self.records
            .sort_by(|left, right| right.created_at.cmp(&left.created_at));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub is_modal_open: bool,
    pub selected: Option<EmployeeId>,
    pub pending: PendingSet,
    pub last_error: Option<ErrorInfo>,
}

/// Fetch sequence numbers: the n-th applied `FetchRequested` is fetch `n`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchLedger {
    pub issued: u64,
    /// Highest sequence whose outcome has been applied.
    pub settled: u64,
}

impl FetchLedger {
    pub fn outstanding(&self) -> bool {
        self.issued > self.settled
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterState {
    pub collection: Collection,
    pub ui: UiState,
    pub fetches: FetchLedger,
    pub policy: ConflictPolicy,
    /// Ids deleted while an update for them was in flight; pruned once it resolves.
    pub(crate) tombstones: BTreeSet<EmployeeId>,
}

impl RosterState {
    pub fn new(policy: ConflictPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn employees(&self) -> &[Employee] {
        self.collection.as_slice()
    }

    pub fn selected_employee(&self) -> Option<&Employee> {
        self.ui
            .selected
            .as_ref()
            .and_then(|id| self.collection.get(id))
    }

    pub fn is_pending(&self, op: &PendingOp) -> bool {
        self.ui.pending.contains(op)
    }

    pub fn is_idle(&self) -> bool {
        self.ui.pending.is_empty()
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.policy);
    }
}
