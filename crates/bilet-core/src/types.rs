//! Domain identifier newtypes and shared enums.
//!
//! Ids are plain database integers wrapped for type safety; serde sees them
//! as bare numbers so they can travel through cache keys and JSON bodies
//! unchanged.

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(
    /// Account row id.
    UserId
);
id_newtype!(
    /// Event row id.
    EventId
);
id_newtype!(
    /// Ticket type row id (the "Vip"/"Standard" parent of concrete tickets).
    TicketTypeId
);
id_newtype!(
    /// Concrete ticket (QR code) row id.
    TicketId
);

/// Lifecycle status of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Published,
    Finished,
    Draft,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Finished => "finished",
            Self::Draft => "draft",
        }
    }
}

impl std::str::FromStr for EventStatus {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Self::Published),
            "finished" => Ok(Self::Finished),
            "draft" => Ok(Self::Draft),
            other => Err(crate::CoreError::validation(format!(
                "unknown event status: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
