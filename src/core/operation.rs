//! Operation classification for replicated mutations.
//!
//! A mutation reaches the gateway as a listener callback kind. It is reduced
//! to a wire [`Action`] plus an [`OperationDetail`], and receivers rebuild the
//! richer [`Operation`] from that pair.

use std::fmt;

/// Listener callback that produced the mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListenerOperation {
    AfterCreate,
    AfterUpdate,
    AfterDestroy,
    TimestampUpdate,
}

impl ListenerOperation {
    pub fn action(self) -> Action {
        match self {
            ListenerOperation::AfterCreate => Action::Create,
            ListenerOperation::AfterUpdate => Action::Update,
            ListenerOperation::AfterDestroy => Action::Destroy,
            ListenerOperation::TimestampUpdate => Action::VersionUpdate,
        }
    }
}

/// Action code carried on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Action {
    Create = 0,
    Update = 1,
    Destroy = 2,
    VersionUpdate = 3,
}

impl Action {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Action::Create),
            1 => Some(Action::Update),
            2 => Some(Action::Destroy),
            3 => Some(Action::VersionUpdate),
            _ => None,
        }
    }

    /// Message part count for this action.
    ///
    /// Parts: action, possible-duplicate, region, event id, key, value
    /// (create/update only), callback-present flag, callback argument (when
    /// present), version timestamp.
    pub fn number_of_parts(self, has_callback_argument: bool) -> i32 {
        let base = match self {
            Action::Create | Action::Update => 8,
            Action::Destroy | Action::VersionUpdate => 7,
        };
        if has_callback_argument { base + 1 } else { base }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::VersionUpdate => "version_update",
        };
        f.write_str(name)
    }
}

/// Fine-grained operation flags exposed by a mutation record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationFlags {
    pub local_load: bool,
    pub net_load: bool,
    pub put_all: bool,
    pub remove_all: bool,
}

/// Operation detail recorded alongside the action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum OperationDetail {
    #[default]
    None = 10,
    LocalLoad = 11,
    NetLoad = 12,
    PutAll = 13,
    RemoveAll = 14,
}

impl OperationDetail {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Unrecognized codes collapse to [`OperationDetail::None`].
    pub fn from_code(code: i32) -> Self {
        match code {
            11 => OperationDetail::LocalLoad,
            12 => OperationDetail::NetLoad,
            13 => OperationDetail::PutAll,
            14 => OperationDetail::RemoveAll,
            _ => OperationDetail::None,
        }
    }

    /// First matching flag wins: local load, net load, put-all, remove-all.
    pub fn from_flags(flags: OperationFlags) -> Self {
        if flags.local_load {
            OperationDetail::LocalLoad
        } else if flags.net_load {
            OperationDetail::NetLoad
        } else if flags.put_all {
            OperationDetail::PutAll
        } else if flags.remove_all {
            OperationDetail::RemoveAll
        } else {
            OperationDetail::None
        }
    }
}

/// Operation reported to receivers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    LocalLoadCreate,
    NetLoadCreate,
    PutAllCreate,
    Update,
    LocalLoadUpdate,
    NetLoadUpdate,
    PutAllUpdate,
    Destroy,
    RemoveAllDestroy,
    UpdateVersionStamp,
}

impl Operation {
    /// Details that make no sense for an action fall back to the bare action.
    pub fn resolve(action: Action, detail: OperationDetail) -> Self {
        match (action, detail) {
            (Action::Create, OperationDetail::LocalLoad) => Operation::LocalLoadCreate,
            (Action::Create, OperationDetail::NetLoad) => Operation::NetLoadCreate,
            (Action::Create, OperationDetail::PutAll) => Operation::PutAllCreate,
            (Action::Create, _) => Operation::Create,
            (Action::Update, OperationDetail::LocalLoad) => Operation::LocalLoadUpdate,
            (Action::Update, OperationDetail::NetLoad) => Operation::NetLoadUpdate,
            (Action::Update, OperationDetail::PutAll) => Operation::PutAllUpdate,
            (Action::Update, _) => Operation::Update,
            (Action::Destroy, OperationDetail::RemoveAll) => Operation::RemoveAllDestroy,
            (Action::Destroy, _) => Operation::Destroy,
            (Action::VersionUpdate, _) => Operation::UpdateVersionStamp,
        }
    }
}
