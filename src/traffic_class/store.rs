//! Persistence collaborator for traffic classes

use crate::condition::{self, validate, ClassId};
use crate::error::{ClassError, Result};
use crate::traffic_class::record::{SiteId, TrafficClass};
use ahash::AHashMap;
use async_trait::async_trait;
use parking_lot::RwLock;

/// Load/save endpoint for traffic class records.
///
/// Implementations resolve `cond_str` over `cond` and return the record as
/// stored, with the structured tree filled in.
#[async_trait]
pub trait TrafficClassStore: Send + Sync {
    async fn get(&self, id: ClassId) -> Result<TrafficClass>;

    async fn list(&self, site: SiteId) -> Result<Vec<TrafficClass>>;

    async fn create(&self, site: SiteId, class: &TrafficClass) -> Result<TrafficClass>;

    async fn update(&self, class: &TrafficClass) -> Result<TrafficClass>;
}

#[derive(Default)]
struct Tables {
    next_id: ClassId,
    classes: AHashMap<ClassId, (SiteId, TrafficClass)>,
}

/// In-process store keeping records in memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored classes across all sites
    pub fn len(&self) -> usize {
        self.tables.read().classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate a submitted record and resolve its condition.
///
/// A raw override wins over the structured tree and is cleared in the result.
fn resolve(class: &TrafficClass) -> Result<TrafficClass> {
    if class.name.trim().is_empty() {
        return Err(ClassError::Persistence("traffic class name is empty".to_string()));
    }

    let cond = if !class.cond_str.trim().is_empty() {
        condition::get_or_parse(&class.cond_str)?
    } else {
        class
            .cond
            .clone()
            .ok_or_else(|| ClassError::Persistence("traffic class has no condition".to_string()))?
    };

    // Everything stored must render to text the grammar reads back
    let problems = validate::issues(&cond);
    if !problems.is_empty() {
        return Err(ClassError::Persistence(format!(
            "invalid condition: {}",
            problems.join("; ")
        )));
    }

    Ok(TrafficClass {
        id: class.id,
        name: class.name.clone(),
        cond: Some(cond),
        cond_str: String::new(),
    })
}

#[async_trait]
impl TrafficClassStore for MemoryStore {
    async fn get(&self, id: ClassId) -> Result<TrafficClass> {
        self.tables
            .read()
            .classes
            .get(&id)
            .map(|(_, class)| class.clone())
            .ok_or(ClassError::NotFound(id))
    }

    async fn list(&self, site: SiteId) -> Result<Vec<TrafficClass>> {
        let tables = self.tables.read();
        let mut classes: Vec<TrafficClass> = tables
            .classes
            .values()
            .filter(|(owner, _)| *owner == site)
            .map(|(_, class)| class.clone())
            .collect();
        classes.sort_by_key(|class| class.id);
        Ok(classes)
    }

    async fn create(&self, site: SiteId, class: &TrafficClass) -> Result<TrafficClass> {
        let mut stored = resolve(class)?;
        let mut tables = self.tables.write();
        tables.next_id += 1;
        let id = tables.next_id;
        stored.id = Some(id);
        tables.classes.insert(id, (site, stored.clone()));
        tracing::debug!(site, class = id, "traffic class created");
        Ok(stored)
    }

    async fn update(&self, class: &TrafficClass) -> Result<TrafficClass> {
        let id = class
            .id
            .ok_or_else(|| ClassError::Persistence("cannot update a class without id".to_string()))?;
        let stored = resolve(class)?;
        let mut tables = self.tables.write();
        let entry = tables.classes.get_mut(&id).ok_or(ClassError::NotFound(id))?;
        entry.1 = stored.clone();
        tracing::debug!(class = id, "traffic class updated");
        Ok(stored)
    }
}
