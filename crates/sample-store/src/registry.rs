//! Table registry.
//!
//! The registry maps table names to [`Table`]s and owns them. Handles hold
//! an `Arc` to their table plus a registered user count, which drop and
//! rename use to wait until every other handle has closed.
//!
//! # Lifecycle
//!
//! ```text
//!   absent ──open──▶ live(users=1) ──open──▶ live(users+1)
//!                        │  ▲
//!                  close │  │ open
//!                        ▼  │
//!                    live(users=0)   (stays registered)
//!                        │
//!              delete ───┴──▶ dropping ──(users == 1)──▶ absent
//! ```
//!
//! Three locks are involved and none is ever held while acquiring another:
//! the registry map lock, each table's row lock, and the seed lock.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use sample_common::constants::MARKER_EXTENSION;
use sample_common::{SampleConfig, SampleError, SampleResult};

use crate::handle::TableHandle;
use crate::sampler::{Sampler, SeedSequence};
use crate::stats::StoreStats;
use crate::table::{Table, TableOptions};

type TableMap = HashMap<String, Arc<Table>>;

/// Registry of named sampling tables.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sample_common::{SampleConfig, Value};
/// use sample_store::TableRegistry;
///
/// let registry = Arc::new(TableRegistry::new(SampleConfig::default().with_rate(1)).unwrap());
/// let mut handle = registry.open("events", 2).unwrap();
/// handle.write_row(&[Value::from(1_i64), Value::from("login")]).unwrap();
///
/// let rows: Vec<_> = handle.scan().collect::<Result<_, _>>().unwrap();
/// assert_eq!(rows.len(), 1);
/// ```
#[derive(Debug)]
pub struct TableRegistry {
    /// Registry configuration.
    config: SampleConfig,
    /// Tables by name.
    tables: Mutex<TableMap>,
    /// Signalled whenever a user leaves or a drop/rename finishes.
    released: Condvar,
    /// Per-handle seed source.
    seeds: SeedSequence,
    /// Reporting counters.
    stats: Arc<StoreStats>,
}

impl TableRegistry {
    /// Creates an empty registry.
    pub fn new(config: SampleConfig) -> SampleResult<Self> {
        config.validate()?;

        if let Some(dir) = &config.marker_dir {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            config,
            tables: Mutex::new(HashMap::new()),
            released: Condvar::new(),
            seeds: SeedSequence::default(),
            stats: Arc::new(StoreStats::new()),
        })
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &SampleConfig {
        &self.config
    }

    /// Returns the reporting counters.
    pub fn stats(&self) -> &Arc<StoreStats> {
        &self.stats
    }

    /// Opens `name`, creating it with the configured rate and limit if it
    /// does not exist.
    pub fn open(self: &Arc<Self>, name: &str, width: usize) -> SampleResult<TableHandle> {
        self.open_with(name, TableOptions::from_config(width, &self.config))
    }

    /// Opens `name`, creating it with `options` if it does not exist.
    ///
    /// The options are ignored when the table already exists. Creating a
    /// table with zero width, rate, or limit fails with a configuration error.
    /// If the table is being dropped or renamed, this waits for that to
    /// finish first.
    pub fn open_with(
        self: &Arc<Self>,
        name: &str,
        options: TableOptions,
    ) -> SampleResult<TableHandle> {
        let mut tables = self.tables.lock();

        let table = loop {
            match tables.get(name) {
                Some(table) if table.is_dropping() || table.is_renaming() => {
                    self.released
                        .wait_for(&mut tables, self.config.quiesce_poll_interval());
                }
                Some(table) => break Arc::clone(table),
                None => {
                    options.validate()?;
                    let table = Arc::new(Table::new(name, options));
                    tables.insert(name.to_string(), Arc::clone(&table));
                    debug!(
                        table = name,
                        width = options.width,
                        rate = options.rate,
                        limit = options.limit,
                        "created sampling table"
                    );
                    self.touch_marker(name);
                    break table;
                }
            }
        };
        table.acquire();
        debug!(table = name, users = table.users(), "opened table handle");
        drop(tables);

        let sampler = Sampler::new(self.seeds.next_seed(), table.rate());
        Ok(TableHandle::new(Arc::clone(self), table, sampler))
    }

    /// Looks up a table without creating it.
    pub fn lookup(&self, name: &str) -> Option<Arc<Table>> {
        self.tables.lock().get(name).cloned()
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.tables.lock().contains_key(name)
    }

    /// Returns the registered table names.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.lock().keys().cloned().collect()
    }

    /// Returns the number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.lock().len()
    }

    /// Returns true if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.lock().is_empty()
    }

    /// Drops `name` once every open handle on it has closed.
    ///
    /// Blocks the calling thread while handles remain open. Returns
    /// `Ok(false)` if the table does not exist or is already being dropped.
    /// The calling thread must not itself hold a handle on the table.
    pub fn delete(&self, name: &str) -> SampleResult<bool> {
        let mut tables = self.tables.lock();

        let table = loop {
            match tables.get(name) {
                None => return Ok(false),
                Some(table) if table.is_dropping() => return Ok(false),
                Some(table) if table.is_renaming() => {
                    self.released
                        .wait_for(&mut tables, self.config.quiesce_poll_interval());
                }
                Some(table) => break Arc::clone(table),
            }
        };

        table.acquire();
        table.set_dropping();
        self.wait_for_quiescence(&mut tables, &table);

        tables.remove(name);
        let discarded = table.clear_rows();
        self.released.notify_all();
        drop(tables);

        self.remove_marker(name);
        info!(table = name, discarded, "dropped sampling table");
        Ok(true)
    }

    /// Renames `from` to `to` once every open handle on it has closed.
    ///
    /// The table keeps its rows and settings. Returns `Ok(false)` if `from`
    /// does not exist or is being dropped, and fails if `to` is taken.
    /// Renaming a table to its own name still waits for the other handles.
    /// The calling thread must not itself hold a handle on the table; use
    /// [`TableHandle::rename`] for that.
    pub fn rename(&self, from: &str, to: &str) -> SampleResult<bool> {
        self.rename_table(from, to, None)
    }

    pub(crate) fn rename_table(
        &self,
        from: &str,
        to: &str,
        caller: Option<&Arc<Table>>,
    ) -> SampleResult<bool> {
        let mut tables = self.tables.lock();

        let table = loop {
            match tables.get(from) {
                None => return Ok(false),
                Some(table) if table.is_dropping() => return Ok(false),
                // The name now belongs to a table the caller never opened.
                Some(table) if caller.is_some_and(|c| !Arc::ptr_eq(c, table)) => {
                    return Ok(false)
                }
                // A handle on the table never waits on another rename of it.
                Some(table) if table.is_renaming() && caller.is_some() => return Ok(false),
                Some(table) if table.is_renaming() => {
                    self.released
                        .wait_for(&mut tables, self.config.quiesce_poll_interval());
                }
                Some(table) => break Arc::clone(table),
            }
        };

        if from != to && tables.contains_key(to) {
            return Err(SampleError::TableExists {
                name: to.to_string(),
            });
        }

        // The caller's own handle already counts as the one remaining user.
        let is_caller = caller.is_some_and(|c| Arc::ptr_eq(c, &table));
        if !is_caller {
            table.acquire();
        }
        table.set_renaming(true);
        self.wait_for_quiescence(&mut tables, &table);

        // `to` may have been created while we waited.
        let result = if from == to {
            Ok(true)
        } else if tables.contains_key(to) {
            Err(SampleError::TableExists {
                name: to.to_string(),
            })
        } else {
            tables.remove(from);
            table.set_name(to);
            tables.insert(to.to_string(), Arc::clone(&table));
            Ok(true)
        };

        table.set_renaming(false);
        if !is_caller {
            table.release();
        }
        self.released.notify_all();
        drop(tables);

        if result.is_ok() && from != to {
            self.move_marker(from, to);
            info!(from, to, "renamed sampling table");
        }
        result
    }

    /// Drops every registered table, returning how many were dropped.
    ///
    /// Marker files are left in place. Handles that are still open keep
    /// their table alive but it is no longer reachable by name.
    pub fn shutdown(&self) -> usize {
        let mut tables = self.tables.lock();
        let count = tables.len();
        for (_, table) in tables.drain() {
            table.clear_rows();
        }
        self.released.notify_all();
        drop(tables);

        info!(tables = count, "sampling registry shut down");
        count
    }

    /// Unregisters one user of `table`.
    pub(crate) fn release(&self, table: &Table) {
        let tables = self.tables.lock();
        table.release();
        debug!(table = %table.name(), users = table.users(), "closed table handle");
        self.released.notify_all();
        drop(tables);
    }

    /// Blocks until `table` has exactly one user: the caller.
    fn wait_for_quiescence(&self, tables: &mut MutexGuard<'_, TableMap>, table: &Table) {
        let poll = self.config.quiesce_poll_interval();
        while table.users() > 1 {
            debug!(
                table = %table.name(),
                users = table.users(),
                "waiting for table users to close"
            );
            self.released.wait_for(tables, poll);
        }
    }

    fn marker_path(&self, name: &str) -> Option<PathBuf> {
        self.config
            .marker_dir
            .as_ref()
            .map(|dir| dir.join(format!("{name}.{MARKER_EXTENSION}")))
    }

    fn touch_marker(&self, name: &str) {
        if let Some(path) = self.marker_path(name) {
            if let Err(e) = std::fs::write(&path, b"") {
                warn!(path = %path.display(), error = %e, "failed to create table marker");
            }
        }
    }

    fn remove_marker(&self, name: &str) {
        if let Some(path) = self.marker_path(name) {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove table marker");
                }
            }
        }
    }

    fn move_marker(&self, from: &str, to: &str) {
        if let (Some(old), Some(new)) = (self.marker_path(from), self.marker_path(to)) {
            match std::fs::rename(&old, &new) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(from = %old.display(), to = %new.display(), error = %e, "failed to move table marker");
                }
            }
        }
    }
}
