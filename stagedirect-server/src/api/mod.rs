//! HTTP API handlers for stagedirect-server

pub mod buildinfo;
pub mod companies;
pub mod contacts;
pub mod health;
pub mod internships;
pub mod kanban;
pub mod merge;
pub mod sectors;

pub use buildinfo::buildinfo_routes;
pub use companies::company_routes;
pub use contacts::contact_routes;
pub use health::health_routes;
pub use internships::internship_routes;
pub use kanban::kanban_routes;
pub use merge::merge_routes;
pub use sectors::sector_routes;
