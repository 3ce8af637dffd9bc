use crate::models::EntityId;
use std::collections::BTreeSet;

/// Set of entities the user wants to see (checkbox filters).
///
/// Filtering happens on snapshots only; the series keeps every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<EntityId>),
}

impl Selection {
    pub fn only<I, E>(entities: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EntityId>,
    {
        Selection::Only(entities.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, entity: &EntityId) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(entity),
        }
    }

    /// Add `entity`. Selecting under `All` is a no-op.
    pub fn select(&mut self, entity: EntityId) {
        if let Selection::Only(set) = self {
            set.insert(entity);
        }
    }

    /// Remove `entity`; `all` is needed to materialize the set when everything
    /// is currently selected.
    pub fn deselect(&mut self, entity: &EntityId, all: &BTreeSet<EntityId>) {
        match self {
            Selection::All => {
                let mut set = all.clone();
                set.remove(entity);
                *self = Selection::Only(set);
            }
            Selection::Only(set) => {
                set.remove(entity);
            }
        }
    }

    pub fn toggle(&mut self, entity: &EntityId, all: &BTreeSet<EntityId>) {
        if self.contains(entity) {
            self.deselect(entity, all);
        } else {
            self.select(entity.clone());
        }
    }
}

/// Case-insensitive substring match used by the search box.
pub fn matches_search(entity: &EntityId, query: &str) -> bool {
    let q = query.trim().to_lowercase();
    q.is_empty() || entity.key().contains(&q)
}
