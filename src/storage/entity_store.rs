// Canonical in-memory copies of the agent, fleet and contracts
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::{Agent, Contract, ContractTerms, Ship, ShipCargo, ShipFuel, ShipModule, ShipMount, ShipNav};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Agent,
    Ship,
    Contract,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Agent => "agent",
            EntityKind::Ship => "ship",
            EntityKind::Contract => "contract",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKey {
    Agent,
    Ship(String),
    Contract(String),
}

impl EntityKey {
    pub fn ship(symbol: impl Into<String>) -> Self {
        EntityKey::Ship(symbol.into())
    }

    pub fn contract(id: impl Into<String>) -> Self {
        EntityKey::Contract(id.into())
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            EntityKey::Agent => EntityKind::Agent,
            EntityKey::Ship(_) => EntityKind::Ship,
            EntityKey::Contract(_) => EntityKind::Contract,
        }
    }

    /// Identity within the kind; the agent is a singleton.
    pub fn id(&self) -> &str {
        match self {
            EntityKey::Agent => "agent",
            EntityKey::Ship(symbol) => symbol,
            EntityKey::Contract(id) => id,
        }
    }

    fn not_found(&self) -> StoreError {
        StoreError::NotFound {
            kind: self.kind(),
            key: self.id().to_string(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Agent => f.write_str("agent"),
            other => write!(f, "{}:{}", other.kind(), other.id()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Agent(Agent),
    Ship(Box<Ship>),
    Contract(Contract),
}

impl Entity {
    pub fn key(&self) -> EntityKey {
        match self {
            Entity::Agent(_) => EntityKey::Agent,
            Entity::Ship(ship) => EntityKey::Ship(ship.symbol.clone()),
            Entity::Contract(contract) => EntityKey::Contract(contract.id.clone()),
        }
    }
}

/// Top-level ship fields that responses replace. `None` leaves the field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShipPatch {
    pub nav: Option<ShipNav>,
    pub fuel: Option<ShipFuel>,
    pub cargo: Option<ShipCargo>,
    pub mounts: Option<Vec<ShipMount>>,
    pub modules: Option<Vec<ShipModule>>,
}

impl ShipPatch {
    pub fn is_empty(&self) -> bool {
        self.nav.is_none()
            && self.fuel.is_none()
            && self.cargo.is_none()
            && self.mounts.is_none()
            && self.modules.is_none()
    }

    /// Names of the slices this patch replaces, in wire spelling.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.nav.is_some() {
            names.push("nav");
        }
        if self.fuel.is_some() {
            names.push("fuel");
        }
        if self.cargo.is_some() {
            names.push("cargo");
        }
        if self.mounts.is_some() {
            names.push("mounts");
        }
        if self.modules.is_some() {
            names.push("modules");
        }
        names
    }

    /// Whole ship refresh: every patchable slice taken from `ship`.
    pub fn from_ship(ship: Ship) -> Self {
        Self {
            nav: Some(ship.nav),
            fuel: Some(ship.fuel),
            cargo: Some(ship.cargo),
            mounts: Some(ship.mounts),
            modules: Some(ship.modules),
        }
    }

    fn apply_to(self, ship: &mut Ship) {
        if let Some(nav) = self.nav {
            ship.nav = nav;
        }
        if let Some(fuel) = self.fuel {
            ship.fuel = fuel;
        }
        if let Some(cargo) = self.cargo {
            ship.cargo = cargo;
        }
        if let Some(mounts) = self.mounts {
            ship.mounts = mounts;
        }
        if let Some(modules) = self.modules {
            ship.modules = modules;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractPatch {
    pub terms: Option<ContractTerms>,
    pub accepted: Option<bool>,
    pub fulfilled: Option<bool>,
    pub expiration: Option<String>,
    pub deadline_to_accept: Option<Option<String>>,
}

impl ContractPatch {
    pub fn from_contract(contract: Contract) -> Self {
        Self {
            terms: Some(contract.terms),
            accepted: Some(contract.accepted),
            fulfilled: Some(contract.fulfilled),
            expiration: Some(contract.expiration),
            deadline_to_accept: Some(contract.deadline_to_accept),
        }
    }

    pub fn field_names(&self) -> Vec<&'static str> {
        [
            ("terms", self.terms.is_some()),
            ("accepted", self.accepted.is_some()),
            ("fulfilled", self.fulfilled.is_some()),
            ("expiration", self.expiration.is_some()),
            ("deadlineToAccept", self.deadline_to_accept.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect()
    }

    fn apply_to(self, contract: &mut Contract) {
        if let Some(terms) = self.terms {
            contract.terms = terms;
        }
        // accepted and fulfilled only ever flip false -> true
        if let Some(accepted) = self.accepted {
            contract.accepted |= accepted;
        }
        if let Some(fulfilled) = self.fulfilled {
            contract.fulfilled |= fulfilled;
        }
        if let Some(expiration) = self.expiration {
            contract.expiration = expiration;
        }
        if let Some(deadline) = self.deadline_to_accept {
            contract.deadline_to_accept = deadline;
        }
    }
}

/// One replace-by-key write. A batch of these is applied atomically.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    ReplaceAgent(Agent),
    UpsertShip(Box<Ship>),
    PatchShip { symbol: String, patch: ShipPatch },
    UpsertContract(Contract),
    PatchContract { id: String, patch: ContractPatch },
}

impl Mutation {
    pub fn key(&self) -> EntityKey {
        match self {
            Mutation::ReplaceAgent(_) => EntityKey::Agent,
            Mutation::UpsertShip(ship) => EntityKey::Ship(ship.symbol.clone()),
            Mutation::PatchShip { symbol, .. } => EntityKey::Ship(symbol.clone()),
            Mutation::UpsertContract(contract) => EntityKey::Contract(contract.id.clone()),
            Mutation::PatchContract { id, .. } => EntityKey::Contract(id.clone()),
        }
    }
}

/// Deep copy of everything the store holds, comparable with `==`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub agent: Option<Agent>,
    pub ships: BTreeMap<String, Ship>,
    pub contracts: BTreeMap<String, Contract>,
}

/// Single owner of entity state. Readers get clones; writers go through
/// `apply`, which holds one write lock for the whole batch.
#[derive(Debug, Default)]
pub struct EntityStore {
    state: RwLock<StoreSnapshot>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded from a bootstrap snapshot.
    pub fn seeded(agent: Agent, ships: Vec<Ship>, contracts: Vec<Contract>) -> Self {
        let store = Self::new();
        {
            let mut state = store.write();
            state.agent = Some(agent);
            state.ships = ships.into_iter().map(|s| (s.symbol.clone(), s)).collect();
            state.contracts = contracts.into_iter().map(|c| (c.id.clone(), c)).collect();
            info!(
                ships = state.ships.len(),
                contracts = state.contracts.len(),
                "💾 entity store seeded"
            );
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreSnapshot> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreSnapshot> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &EntityKey) -> Result<Entity, StoreError> {
        let state = self.read();
        let entity = match key {
            EntityKey::Agent => state.agent.clone().map(Entity::Agent),
            EntityKey::Ship(symbol) => state.ships.get(symbol).cloned().map(|s| Entity::Ship(Box::new(s))),
            EntityKey::Contract(id) => state.contracts.get(id).cloned().map(Entity::Contract),
        };
        entity.ok_or_else(|| key.not_found())
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        let state = self.read();
        match key {
            EntityKey::Agent => state.agent.is_some(),
            EntityKey::Ship(symbol) => state.ships.contains_key(symbol),
            EntityKey::Contract(id) => state.contracts.contains_key(id),
        }
    }

    pub fn agent(&self) -> Result<Agent, StoreError> {
        self.read()
            .agent
            .clone()
            .ok_or_else(|| EntityKey::Agent.not_found())
    }

    pub fn ship(&self, symbol: &str) -> Result<Ship, StoreError> {
        self.read()
            .ships
            .get(symbol)
            .cloned()
            .ok_or_else(|| EntityKey::ship(symbol).not_found())
    }

    pub fn contract(&self, id: &str) -> Result<Contract, StoreError> {
        self.read()
            .contracts
            .get(id)
            .cloned()
            .ok_or_else(|| EntityKey::contract(id).not_found())
    }

    pub fn ship_symbols(&self) -> Vec<String> {
        self.read().ships.keys().cloned().collect()
    }

    pub fn contract_ids(&self) -> Vec<String> {
        self.read().contracts.keys().cloned().collect()
    }

    pub fn upsert(&self, entity: Entity) -> Result<(), StoreError> {
        let mutation = match entity {
            Entity::Agent(agent) => Mutation::ReplaceAgent(agent),
            Entity::Ship(ship) => Mutation::UpsertShip(ship),
            Entity::Contract(contract) => Mutation::UpsertContract(contract),
        };
        self.apply(vec![mutation])
    }

    pub fn patch_ship(&self, symbol: &str, patch: ShipPatch) -> Result<(), StoreError> {
        self.apply(vec![Mutation::PatchShip {
            symbol: symbol.to_string(),
            patch,
        }])
    }

    pub fn patch_contract(&self, id: &str, patch: ContractPatch) -> Result<(), StoreError> {
        self.apply(vec![Mutation::PatchContract {
            id: id.to_string(),
            patch,
        }])
    }

    /// Applies every mutation or none. Patches must target keys that exist
    /// (or are created earlier in the same batch); cargo slices are normalized
    /// and checked against capacity before the first write.
    pub fn apply(&self, batch: Vec<Mutation>) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.apply_then(batch, || {})
    }

    /// `apply`, then `after` while the write lock is still held. Readers
    /// going through `read_with` see the batch and whatever `after` wrote
    /// together or not at all. `after` does not run when the batch is refused.
    pub fn apply_then<F: FnOnce()>(&self, batch: Vec<Mutation>, after: F) -> Result<(), StoreError> {
        let mut state = self.write();
        let batch = Self::prepare(&state, batch)?;
        let count = batch.len();

        for mutation in batch {
            debug!(key = %mutation.key(), "applying mutation");
            match mutation {
                Mutation::ReplaceAgent(agent) => {
                    state.agent = Some(agent);
                }
                Mutation::UpsertShip(ship) => {
                    state.ships.insert(ship.symbol.clone(), *ship);
                }
                Mutation::PatchShip { symbol, patch } => {
                    if let Some(ship) = state.ships.get_mut(&symbol) {
                        patch.apply_to(ship);
                    }
                }
                Mutation::UpsertContract(contract) => match state.contracts.get_mut(&contract.id) {
                    Some(existing) => ContractPatch::from_contract(contract).apply_to(existing),
                    None => {
                        state.contracts.insert(contract.id.clone(), contract);
                    }
                },
                Mutation::PatchContract { id, patch } => {
                    if let Some(contract) = state.contracts.get_mut(&id) {
                        patch.apply_to(contract);
                    }
                }
            }
        }

        debug!(mutations = count, "batch applied");
        after();
        Ok(())
    }

    // Validation pass run under the write lock, before anything is written.
    fn prepare(state: &StoreSnapshot, batch: Vec<Mutation>) -> Result<Vec<Mutation>, StoreError> {
        let mut created: HashSet<EntityKey> = HashSet::new();
        let mut prepared = Vec::with_capacity(batch.len());

        for mutation in batch {
            let mutation = match mutation {
                Mutation::UpsertShip(mut ship) => {
                    ship.cargo = normalize_cargo(&ship.symbol, ship.cargo)?;
                    created.insert(EntityKey::Ship(ship.symbol.clone()));
                    Mutation::UpsertShip(ship)
                }
                Mutation::PatchShip { symbol, mut patch } => {
                    let key = EntityKey::Ship(symbol.clone());
                    if !state.ships.contains_key(&symbol) && !created.contains(&key) {
                        return Err(key.not_found());
                    }
                    if let Some(cargo) = patch.cargo.take() {
                        patch.cargo = Some(normalize_cargo(&symbol, cargo)?);
                    }
                    Mutation::PatchShip { symbol, patch }
                }
                Mutation::UpsertContract(contract) => {
                    created.insert(EntityKey::Contract(contract.id.clone()));
                    Mutation::UpsertContract(contract)
                }
                Mutation::PatchContract { id, patch } => {
                    let key = EntityKey::Contract(id.clone());
                    if !state.contracts.contains_key(&id) && !created.contains(&key) {
                        return Err(key.not_found());
                    }
                    Mutation::PatchContract { id, patch }
                }
                agent @ Mutation::ReplaceAgent(_) => agent,
            };
            prepared.push(mutation);
        }

        Ok(prepared)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.read().clone()
    }

    /// Runs `f` under the read lock, so no `apply_then` lands halfway through.
    pub fn read_with<R>(&self, f: impl FnOnce(&StoreSnapshot) -> R) -> R {
        f(&self.read())
    }
}

fn normalize_cargo(ship: &str, cargo: ShipCargo) -> Result<ShipCargo, StoreError> {
    cargo.normalized().map_err(|reason| StoreError::InvalidCargo {
        ship: ship.to_string(),
        reason,
    })
}
