// crates/wstar-azimuth/src/lib.rs
//
// wstar-azimuth: The point registry the treasury escrows against.
//
// `Azimuth` is the ownership/hierarchy/proxy registry; `Ecliptic` is the
// controller that owns it and is the only way to mutate it. Treasury custody
// flows (spawn into the treasury, transfer via transfer proxy) go through
// the Ecliptic rules exactly as an end user's calls would.

pub mod azimuth;
pub mod ecliptic;

pub use azimuth::{Azimuth, PointKeys, PointRecord};
pub use ecliptic::{Ecliptic, GALAXY_SPAWN_LIMIT, STAR_SPAWN_LIMIT};
