//! Generic record lifecycle contract.

use rusqlite::Connection;

/// The persistence lifecycle shared by every entity stored in Rolodex.
///
/// A record is *transient* until [`create`](Record::create) assigns it an
/// id, *persisted* (and visible to [`find`](Record::find) and
/// [`all`](Record::all)) afterwards, and gone for good once
/// [`delete`](Record::delete) returns. Implementations own their table
/// schema and row mapping; this trait only fixes the operation surface.
///
/// Every operation takes the connection it should use. Nothing here holds
/// shared state, so transactional scope and locking are whatever the caller
/// arranged on that connection.
pub trait Record: Sized {
    /// Error type for lifecycle operations. Storage failures are expected
    /// to pass through untranslated, hence the `From<rusqlite::Error>`
    /// bound.
    type Error: From<rusqlite::Error>;

    /// The primary key, or `None` while the record is transient.
    fn id(&self) -> Option<i64>;

    /// Inserts the record and stores the storage-assigned id on `self`.
    ///
    /// After a successful return, [`id`](Record::id) is `Some` and the
    /// record is retrievable through [`find`](Record::find) and
    /// [`all`](Record::all).
    fn create(&mut self, conn: &Connection) -> Result<(), Self::Error>;

    /// Writes the record's current field values over the stored row.
    ///
    /// Calling this on a transient record is a caller contract violation
    /// and must surface as an error, not as silent misbehavior.
    fn update(&self, conn: &Connection) -> Result<(), Self::Error>;

    /// Removes the stored row. Terminal; the id is never reused.
    fn delete(&self, conn: &Connection) -> Result<(), Self::Error>;

    /// Looks up a record by primary key. A miss is `Ok(None)`, not an error.
    fn find(conn: &Connection, id: i64) -> Result<Option<Self>, Self::Error>;

    /// Returns every persisted record in storage order.
    fn all(conn: &Connection) -> Result<Vec<Self>, Self::Error>;
}
