pub mod cat;
pub mod dump_info;
pub mod extract;
pub mod list;
