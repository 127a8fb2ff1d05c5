pub mod conflict;
pub mod info;
pub mod split;
