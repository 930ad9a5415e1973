//! Definitions consumed by schema operations

mod defs;

pub use defs::{
    ColumnDef, ForeignKey, IndexColumn, TableOptions, DEFAULT_CHARSET, DEFAULT_COLLATE,
    DEFAULT_ENGINE,
};
