#[cfg(feature = "youtube")]
pub mod youtube;
