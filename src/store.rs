//! LMDB-backed user store: the persisted side of role sets
//!
//! Each user record keeps its role set as the raw comma-joined string.
//! `add_role`/`remove_role` read, decode, update and write that string
//! inside a single write transaction; LMDB allows one writer at a time,
//! so concurrent changes to the same user cannot lose updates.

use std::path::Path;

use byteorder::BigEndian;
use heed::types::{Str, U64};
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use tracing::info;

use crate::error::{RbacError, Result};
use crate::guard::Principal;
use crate::role::SUPER_ROLE;
use crate::roleset::RoleSet;

pub(crate) type ById = Database<U64<BigEndian>, Str>;

/// All database handles
#[derive(Clone)]
pub(crate) struct Dbs {
    /// id -> display name
    pub names: ById,
    /// id -> raw role-set string
    pub roles: ById,
    /// name -> id
    pub by_name: Database<Str, U64<BigEndian>>,
    /// sha256(token) -> "user|created|expires"
    pub sessions: Database<Str, Str>,
    pub meta: Database<Str, Str>,
}

/// Handle to an opened store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    env: Env,
    dbs: Dbs,
}

impl Store {
    /// Open (creating if needed) a store in directory `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        // SAFETY: LMDB requires no other processes access this path concurrently during open.
        let env = unsafe { EnvOpenOptions::new().map_size(1 << 30).max_dbs(5).open(path)? };
        let mut tx = env.write_txn()?;
        let dbs = Dbs {
            names: env.create_database(&mut tx, Some("names"))?,
            roles: env.create_database(&mut tx, Some("roles"))?,
            by_name: env.create_database(&mut tx, Some("by_name"))?,
            sessions: env.create_database(&mut tx, Some("sessions"))?,
            meta: env.create_database(&mut tx, Some("meta"))?,
        };
        tx.commit()?;
        Ok(Store { env, dbs })
    }

    /// Execute a read-only operation
    pub(crate) fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        f(&self.dbs, &self.env.read_txn()?)
    }

    /// Execute a read-write operation and commit it
    pub(crate) fn write<T, F: FnOnce(&Dbs, &mut RwTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = self.env.write_txn()?;
        let r = f(&self.dbs, &mut tx)?;
        tx.commit()?;
        Ok(r)
    }

    /// Create a user with no roles.
    pub fn create_user(&self, name: &str) -> Result<u64> {
        let id = self.write(|d, tx| insert_user(d, tx, name, &RoleSet::new()))?;
        info!(user = id, name, "user created");
        Ok(id)
    }

    /// Create the first user, holding the super role. Fails once any user exists.
    pub fn bootstrap(&self, name: &str) -> Result<u64> {
        let admin: RoleSet = [SUPER_ROLE].into_iter().collect();
        let id = self.write(|d, tx| {
            if d.names.len(tx)? > 0 {
                return Err(RbacError::AlreadyBootstrapped);
            }
            insert_user(d, tx, name, &admin)
        })?;
        info!(user = id, name, "bootstrapped super user");
        Ok(id)
    }

    pub fn is_bootstrapped(&self) -> Result<bool> {
        self.read(|d, tx| Ok(d.names.len(tx)? > 0))
    }

    pub fn user(&self, id: u64) -> Result<Option<Principal>> {
        self.read(|d, tx| load(d, tx, id))
    }

    pub fn user_by_name(&self, name: &str) -> Result<Option<Principal>> {
        self.read(|d, tx| match d.by_name.get(tx, name)? {
            Some(id) => load(d, tx, id),
            None => Ok(None),
        })
    }

    pub fn list_users(&self) -> Result<Vec<Principal>> {
        self.read(|d, tx| {
            let mut r = Vec::new();
            for item in d.names.iter(tx)? {
                let (id, name) = item?;
                let roles = d.roles.get(tx, &id)?.map(RoleSet::decode).unwrap_or_default();
                r.push(Principal { id, name: name.to_string(), roles });
            }
            Ok(r)
        })
    }

    /// Add `role` to the user's role set. Holding it already is a no-op.
    pub fn add_role(&self, id: u64, role: &str) -> Result<RoleSet> {
        let set = self.update_roles(id, |set| set.insert(role))?;
        info!(user = id, role, roles = %set, "role added");
        Ok(set)
    }

    /// Remove `role` from the user's role set. Not holding it is a no-op.
    pub fn remove_role(&self, id: u64, role: &str) -> Result<RoleSet> {
        let set = self.update_roles(id, |set| set.remove(role))?;
        info!(user = id, role, roles = %set, "role removed");
        Ok(set)
    }

    fn update_roles<F: FnOnce(&mut RoleSet) -> bool>(&self, id: u64, f: F) -> Result<RoleSet> {
        self.write(|d, tx| {
            if d.names.get(tx, &id)?.is_none() {
                return Err(RbacError::UserNotFound(id));
            }
            let mut set = d.roles.get(tx, &id)?.map(RoleSet::decode).unwrap_or_default();
            if f(&mut set) {
                d.roles.put(tx, &id, &set.encode())?;
            }
            Ok(set)
        })
    }

    /// Raw stored role string, exactly as persisted.
    pub fn raw_roles(&self, id: u64) -> Result<Option<String>> {
        self.read(|d, tx| Ok(d.roles.get(tx, &id)?.map(str::to_string)))
    }

    /// Overwrite the raw role string (imports, repairs).
    pub fn set_raw_roles(&self, id: u64, raw: &str) -> Result<()> {
        self.write(|d, tx| {
            if d.names.get(tx, &id)?.is_none() {
                return Err(RbacError::UserNotFound(id));
            }
            Ok(d.roles.put(tx, &id, raw)?)
        })
    }

    /// Clear all databases (for testing)
    pub fn clear(&self) -> Result<()> {
        self.write(|d, tx| {
            d.names.clear(tx)?;
            d.roles.clear(tx)?;
            d.by_name.clear(tx)?;
            d.sessions.clear(tx)?;
            Ok(d.meta.clear(tx)?)
        })
    }
}

fn next_id(d: &Dbs, tx: &mut RwTxn) -> Result<u64> {
    let id = d.meta.get(tx, "next_id")?.and_then(|s| s.parse().ok()).unwrap_or(1u64);
    d.meta.put(tx, "next_id", &(id + 1).to_string())?;
    Ok(id)
}

fn insert_user(d: &Dbs, tx: &mut RwTxn, name: &str, roles: &RoleSet) -> Result<u64> {
    if d.by_name.get(tx, name)?.is_some() {
        return Err(RbacError::UserExists(name.to_string()));
    }
    let id = next_id(d, tx)?;
    d.names.put(tx, &id, name)?;
    d.roles.put(tx, &id, &roles.encode())?;
    d.by_name.put(tx, name, &id)?;
    Ok(id)
}

pub(crate) fn load(d: &Dbs, tx: &RoTxn, id: u64) -> Result<Option<Principal>> {
    let Some(name) = d.names.get(tx, &id)? else { return Ok(None) };
    let roles = d.roles.get(tx, &id)?.map(RoleSet::decode).unwrap_or_default();
    Ok(Some(Principal { id, name: name.to_string(), roles }))
}
