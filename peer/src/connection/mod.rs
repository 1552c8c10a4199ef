pub mod record;
pub mod registry;
