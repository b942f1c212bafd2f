//! Status helper enums mapping to SMALLSERIAL/SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Background task execution status.
    ///
    /// The orchestrator creates tasks as `Pending` and only ever moves
    /// them to `Error` (when dispatch could not even begin). All other
    /// transitions belong to the worker runtime's reporting path.
    TaskStatus {
        Pending = 1,
        Running = 2,
        Success = 3,
        Error = 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_ids_match_seed_data() {
        assert_eq!(TaskStatus::Pending.id(), 1);
        assert_eq!(TaskStatus::Running.id(), 2);
        assert_eq!(TaskStatus::Success.id(), 3);
        assert_eq!(TaskStatus::Error.id(), 4);
    }

    #[test]
    fn status_into_status_id() {
        let id: StatusId = TaskStatus::Error.into();
        assert_eq!(id, 4);
    }
}
