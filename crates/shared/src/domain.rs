use std::{fmt, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::UnknownToken;

/// Row identifier assigned by a persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! token_enum {
    ($name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $token)]
                $variant,
            )+
        }

        impl $name {
            pub const TOKENS: &'static [&'static str] = &[$($token),+];

            pub fn as_token(self) -> &'static str {
                match self {
                    $(Self::$variant => $token,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownToken;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $($token => Ok(Self::$variant),)+
                    other => Err(UnknownToken::new(stringify!($name), other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_token())
            }
        }
    };
}

token_enum!(Trimester {
    First => "1",
    Second => "2",
    Third => "3",
});

token_enum!(ContractType {
    FullTime => "full-time",
    PartTime => "part-time",
    Hourly => "hourly",
});

token_enum!(ProfessorStatus {
    Active => "active",
    Inactive => "inactive",
    Sabbatical => "sabbatical",
    Leave => "leave",
});

/// Academic period as edited in the period form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub trimester: Trimester,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub enrollment_start: NaiveDate,
    pub enrollment_end: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Professor {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contract_type: ContractType,
    pub status: ProfessorStatus,
    pub hire_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aspirant {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub program: String,
    pub birth_date: NaiveDate,
    pub application_date: NaiveDate,
    pub is_admitted: bool,
}
