use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Disposition {
    Home => "home",
    Admitted => "admitted",
    Transferred => "transferred",
    Expired => "expired",
    LeftWithoutBeingSeen => "lwbs",
    AgainstMedicalAdvice => "ama",
});

str_enum!(ArrivalMode {
    Ambulance => "ambulance",
    WalkIn => "walk_in",
    Transfer => "transfer",
    Other => "other",
});

str_enum!(DrugClass {
    Antiviral => "antiviral",
    Antibiotic => "antibiotic",
    Other => "other",
});

str_enum!(TestResult {
    Positive => "positive",
    Negative => "negative",
    Indeterminate => "indeterminate",
});

// REDCap choice codes. Label strings must match the data dictionary.

impl Disposition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Home => "Discharged home",
            Self::Admitted => "Admitted",
            Self::Transferred => "Transferred to another facility",
            Self::Expired => "Expired in ED",
            Self::LeftWithoutBeingSeen => "Left without being seen",
            Self::AgainstMedicalAdvice => "Left against medical advice",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Home => "1",
            Self::Admitted => "2",
            Self::Transferred => "3",
            Self::Expired => "4",
            Self::LeftWithoutBeingSeen => "5",
            Self::AgainstMedicalAdvice => "6",
        }
    }

    /// Patient left the ED for the community, so discharge prescriptions apply.
    pub fn leaves_to_community(&self) -> bool {
        matches!(self, Self::Home | Self::AgainstMedicalAdvice)
    }
}

impl ArrivalMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ambulance => "Ambulance",
            Self::WalkIn => "Walk-in",
            Self::Transfer => "Transfer from outside facility",
            Self::Other => "Other",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Ambulance => "1",
            Self::WalkIn => "2",
            Self::Transfer => "3",
            Self::Other => "4",
        }
    }
}

impl TestResult {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Indeterminate => "indeterminate",
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Positive => "1",
            Self::Negative => "0",
            Self::Indeterminate => "2",
        }
    }
}
