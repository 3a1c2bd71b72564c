//! Wire types for the diagnostic server's JSON endpoints.
//!
//! Only the fields the console reads or writes are modelled; unknown fields
//! are ignored. Go servers encode empty slices as `null`, which decodes to an
//! empty `Vec` here.

pub mod probe;
pub mod queue;
pub mod system;
pub mod workload;

use serde::{Deserialize, Deserializer};

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
