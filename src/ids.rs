//! Identifier newtypes shared by the terrain layers and the element catalogs.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($name:ident, $repr:ty) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub $repr);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

// Placed things
define_id!(ElementId, u64);
define_id!(SettlementId, u64);
define_id!(CitizenId, u64);

// Categorical tile layers; the type catalogs themselves live outside the terrain
define_id!(SoilTypeId, u16);
define_id!(MineralTypeId, u16);
define_id!(PlantTypeId, u16);
define_id!(AnimalTypeId, u16);
