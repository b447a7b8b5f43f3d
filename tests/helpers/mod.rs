pub mod builders;
pub mod db;

pub use builders::{ManifestDir, RoleBuilder};
pub use db::TestDb;
