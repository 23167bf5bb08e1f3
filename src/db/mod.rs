//! Database access: lazily created pool, stored-procedure calls, transactions.
//!
//! Routines are PostgreSQL functions called with named-argument notation. A
//! function whose result is a single `refcursor` column yields several result
//! sets, one per cursor, in order.

mod params;
mod pool;
mod procedure;
mod rows;

pub use params::PgBindValue;
pub use pool::Database;
pub use procedure::{
    begin_transaction, commit_transaction, db_request, rollback_transaction, shape_result_sets, ExpectedReturn,
    ResultSet, Transaction,
};
