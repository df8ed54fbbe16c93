//! Operation status enum mapping to SMALLINT values in `hc_operations`.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Health-check operation lifecycle status.
///
/// Discriminants match the values stored in `hc_operations.status_id`.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Pending = 1,
    Running = 2,
    Completed = 3,
    Failed = 4,
}

impl OperationStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a database status ID back to the enum.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Running),
            3 => Some(Self::Completed),
            4 => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the operation can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Allowed transitions: Pending->Running, Running->Completed,
    /// Running->Failed, and Pending->Failed (abort path).
    pub fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Pending, Self::Failed)
        )
    }
}

impl From<OperationStatus> for StatusId {
    fn from(value: OperationStatus) -> Self {
        value as StatusId
    }
}
