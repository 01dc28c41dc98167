pub mod row_list;
pub mod theme;
pub mod timeline;
pub mod toolbar;
