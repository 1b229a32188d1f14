use std::fmt;
use std::io::Write;
use std::str::FromStr;

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed enumeration stored as its text label in a `VARCHAR` column.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                std::str::from_utf8(bytes.as_bytes())?
                    .parse()
                    .map_err(Into::into)
            }
        }
    };
}

text_enum! {
    /// Lifecycle of a tender. Moves forward only.
    TenderStatus {
        Created => "Created",
        Published => "Published",
        Closed => "Closed",
    }
}

text_enum! {
    ServiceType {
        Construction => "Construction",
        Delivery => "Delivery",
        Manufacture => "Manufacture",
    }
}

text_enum! {
    /// Bid status. Any member may be requested by the bid's author.
    BidStatus {
        Created => "Created",
        Published => "Published",
        Closed => "Closed",
        Approved => "Approved",
        Rejected => "Rejected",
    }
}

text_enum! {
    AuthorType {
        User => "User",
        Organization => "Organization",
    }
}

text_enum! {
    /// Verdict recorded by a responsible of the tender's organization.
    Decision {
        Approved => "Approved",
        Rejected => "Rejected",
    }
}

text_enum! {
    OrganizationKind {
        Ie => "IE",
        Llc => "LLC",
        Jsc => "JSC",
    }
}

impl TenderStatus {
    /// Transition table: `Created -> Published -> Closed`, plus closing a tender that was
    /// never published. Same-state requests are not transitions.
    pub fn can_transition_to(self, next: TenderStatus) -> bool {
        matches!(
            (self, next),
            (TenderStatus::Created, TenderStatus::Published)
                | (TenderStatus::Created, TenderStatus::Closed)
                | (TenderStatus::Published, TenderStatus::Closed)
        )
    }
}

impl From<Decision> for BidStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => BidStatus::Approved,
            Decision::Rejected => BidStatus::Rejected,
        }
    }
}
