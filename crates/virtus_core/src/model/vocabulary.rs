//! Enumerated vocabularies and their code/label translation tables.
//!
//! # Responsibility
//! - Define the stable codes exposed to callers and the French display labels
//!   persisted in the store.
//! - Build immutable code->label and label->code tables once per process.
//!
//! # Invariants
//! - Every code maps to exactly one label and back.
//! - Lookups of unknown keys return the key unchanged, so legacy or foreign
//!   rows never fail to read.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

macro_rules! vocabulary_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($code:literal, $label:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stable code exposed to callers.
            pub fn code(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }

            /// Canonical label persisted in the store.
            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn from_code(code: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|value| value.code() == code)
            }
        }
    };
}

vocabulary_enum! {
    /// Primary muscle group targeted by an exercise.
    PrimaryMuscle {
        Pectoraux => ("PECTORAUX", "Pectoraux"),
        Dorsaux => ("DORSAUX", "Dorsaux"),
        Epaules => ("EPAULES", "Épaules"),
        Biceps => ("BICEPS", "Biceps"),
        Triceps => ("TRICEPS", "Triceps"),
        Trapezes => ("TRAPEZES", "Trapèzes"),
        Lombaires => ("LOMBAIRES", "Lombaires"),
        Abdominaux => ("ABDOMINAUX", "Abdominaux"),
        Obliques => ("OBLIQUES", "Obliques"),
        Quadriceps => ("QUADRICEPS", "Quadriceps"),
        IschioJambiers => ("ISCHIO_JAMBIERS", "Ischio-jambiers"),
        Fessiers => ("FESSIERS", "Fessiers"),
        Mollets => ("MOLLETS", "Mollets"),
        AvantBras => ("AVANT_BRAS", "Avant-bras"),
        Cou => ("COU", "Cou"),
        CorpsEntier => ("CORPS_ENTIER", "Corps entier"),
    }
}

vocabulary_enum! {
    /// Equipment required by an exercise.
    Equipment {
        Bar => ("BAR", "Barre"),
        Dumbbell => ("DB", "Haltères"),
        Kettlebell => ("KB", "Kettlebell"),
        Cable => ("CBL", "Poulie/Câble"),
        Machine => ("MACH", "Machine guidée"),
        Smith => ("SMITH", "Smith"),
        Band => ("BAND", "Élastiques"),
        Trx => ("TRX", "TRX/Anneaux"),
        Bodyweight => ("BW", "Poids du corps"),
        Bench => ("BENCH", "Banc/Step/Box"),
        SwissBall => ("SBALL", "Swiss Ball"),
        MedicineBall => ("MBALL", "Médecine ball"),
        Sled => ("SLED", "Sled/Prowler"),
    }
}

vocabulary_enum! {
    /// Movement pattern of an exercise.
    MovementPattern {
        Squat => ("SQUAT", "Squat"),
        Hinge => ("HINGE", "Hinge"),
        Lunge => ("LUNGE", "Fente"),
        PushHorizontal => ("PH", "Push horizontal"),
        PushVertical => ("PV", "Push vertical"),
        PullHorizontal => ("RH", "Tirage horizontal"),
        PullVertical => ("RV", "Tirage vertical"),
        CoreAntiExtension => ("CORE_AEXT", "Gainage"),
        CoreAntiRotation => ("CORE_AROT", "Anti-rotation"),
        CoreRotation => ("CORE_ROT", "Rotation"),
        Locomotion => ("LOCO", "Locomotion/Carry"),
        Plyometrics => ("PLYO", "Saut/Pliométrie"),
        Conditioning => ("COND", "Conditioning"),
        Mobility => ("MOB", "Mobilité"),
    }
}

vocabulary_enum! {
    /// Payment state of an invoice.
    InvoiceStatus {
        Paid => ("PAID", "Payée"),
        Unpaid => ("UNPAID", "Non payée"),
    }
}

/// Bidirectional code/label table for one enumeration.
#[derive(Debug)]
pub struct Vocabulary {
    labels_by_code: HashMap<&'static str, &'static str>,
    codes_by_label: HashMap<&'static str, &'static str>,
}

impl Vocabulary {
    fn from_pairs(pairs: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        let mut labels_by_code = HashMap::new();
        let mut codes_by_label = HashMap::new();
        for (code, label) in pairs {
            labels_by_code.insert(code, label);
            codes_by_label.insert(label, code);
        }
        Self {
            labels_by_code,
            codes_by_label,
        }
    }

    /// Returns the stored label for `code`, or `code` itself when unknown.
    pub fn label_for<'a>(&self, code: &'a str) -> &'a str {
        match self.labels_by_code.get(code) {
            Some(label) => *label,
            None => code,
        }
    }

    /// Returns the code for a stored `label`, or `label` itself when unknown.
    pub fn code_for<'a>(&self, label: &'a str) -> &'a str {
        match self.codes_by_label.get(label) {
            Some(code) => *code,
            None => label,
        }
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.labels_by_code.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.labels_by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels_by_code.is_empty()
    }
}

pub static PRIMARY_MUSCLES: Lazy<Vocabulary> = Lazy::new(|| {
    Vocabulary::from_pairs(PrimaryMuscle::ALL.iter().map(|m| (m.code(), m.label())))
});

pub static EQUIPMENT: Lazy<Vocabulary> =
    Lazy::new(|| Vocabulary::from_pairs(Equipment::ALL.iter().map(|e| (e.code(), e.label()))));

pub static MOVEMENT_PATTERNS: Lazy<Vocabulary> = Lazy::new(|| {
    Vocabulary::from_pairs(MovementPattern::ALL.iter().map(|p| (p.code(), p.label())))
});

pub static INVOICE_STATUSES: Lazy<Vocabulary> = Lazy::new(|| {
    Vocabulary::from_pairs(InvoiceStatus::ALL.iter().map(|s| (s.code(), s.label())))
});
