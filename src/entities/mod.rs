pub mod acl;
pub mod component;
pub mod resource;
pub mod role;
