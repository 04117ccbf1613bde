use crate::types::{StableId, WindowItem};

/// One applied window mutation, in window positions.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSet<P> {
    /// Positions are ascending indices in the window after insertion.
    Added {
        items: Vec<WindowItem<P>>,
        positions: Vec<usize>,
    },
    Updated {
        items: Vec<WindowItem<P>>,
        positions: Vec<usize>,
    },
    /// Positions are descending indices in the window before removal.
    Deleted {
        ids: Vec<StableId>,
        positions: Vec<usize>,
    },
    /// Contents were replaced wholesale.
    Reload,
    /// Nothing changed, e.g. after a failed read or a stale page.
    Unchanged,
}

impl<P> ChangeSet<P> {
    pub fn is_empty(&self) -> bool {
        match self {
            ChangeSet::Added { positions, .. }
            | ChangeSet::Updated { positions, .. }
            | ChangeSet::Deleted { positions, .. } => positions.is_empty(),
            ChangeSet::Reload => false,
            ChangeSet::Unchanged => true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChangeSet::Added { .. } => "added",
            ChangeSet::Updated { .. } => "updated",
            ChangeSet::Deleted { .. } => "deleted",
            ChangeSet::Reload => "reload",
            ChangeSet::Unchanged => "unchanged",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChangeSet::Added { positions, .. }
            | ChangeSet::Updated { positions, .. }
            | ChangeSet::Deleted { positions, .. } => positions.len(),
            ChangeSet::Reload | ChangeSet::Unchanged => 0,
        }
    }
}
