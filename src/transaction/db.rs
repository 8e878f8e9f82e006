//! Database operations for transactions.

use rusqlite::{Connection, OptionalExtension, Row};
use time::{OffsetDateTime, UtcOffset};

use crate::{
    Error,
    category::CategoryId,
    transaction::{Transaction, TransactionBuilder, TransactionId},
    user::UserID,
};

/// Check that `category_id` refers to a category owned by `user_id`.
fn check_category(
    category_id: Option<CategoryId>,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(category_id) = category_id else {
        return Ok(());
    };

    connection
        .query_row(
            "SELECT id FROM category WHERE id = ?1 AND user_id = ?2",
            (category_id, user_id.as_i64()),
            |row| row.get::<_, CategoryId>(0),
        )
        .optional()?
        .map(|_| ())
        .ok_or(Error::InvalidCategory(category_id))
}

/// Create a new transaction for `user_id` from a builder.
///
/// The date defaults to the current time. Dates are stored in UTC.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the category ID does not refer to one of the user's categories,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_category(builder.category_id, user_id, connection)?;

    let date = builder
        .date
        .unwrap_or_else(OffsetDateTime::now_utc)
        .to_offset(UtcOffset::UTC);

    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, description, amount, date, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, description, amount, date, category_id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.description,
                builder.amount,
                date,
                builder.category_id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, user_id, description, amount, date, category_id
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve all of a user's transactions, newest first.
pub fn get_transactions_for_user(
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, amount, date, category_id
             FROM \"transaction\" WHERE user_id = :user_id
             ORDER BY date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(|error| error.into()))
        .collect()
}

fn get_owned_transaction(
    id: TransactionId,
    user_id: UserID,
    missing: Error,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = match get_transaction(id, connection) {
        Ok(transaction) => transaction,
        Err(Error::NotFound) => return Err(missing),
        Err(error) => return Err(error),
    };

    if transaction.user_id != user_id {
        return Err(Error::Forbidden);
    }

    Ok(transaction)
}

/// Replace the fields of a transaction owned by `user_id`.
///
/// If the builder has no date, the stored date is kept.
///
/// # Errors
/// This function will return a:
/// - [Error::UpdateMissing] if the transaction does not exist,
/// - [Error::Forbidden] if it belongs to another user,
/// - or [Error::InvalidCategory] if the category ID does not refer to one of the user's categories.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let stored = get_owned_transaction(
        id,
        user_id,
        Error::UpdateMissing("transaction"),
        connection,
    )?;
    check_category(builder.category_id, user_id, connection)?;

    let date = builder
        .date
        .map(|date| date.to_offset(UtcOffset::UTC))
        .unwrap_or(stored.date);

    let transaction = connection
        .prepare(
            "UPDATE \"transaction\" SET description = ?1, amount = ?2, date = ?3, category_id = ?4
             WHERE id = ?5
             RETURNING id, user_id, description, amount, date, category_id",
        )?
        .query_row(
            (
                builder.description,
                builder.amount,
                date,
                builder.category_id,
                id,
            ),
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a [Error::DeleteMissing] if the transaction does
/// not exist, or [Error::Forbidden] if it belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_owned_transaction(id, user_id, Error::DeleteMissing("transaction"), connection)?;

    connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                description TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER REFERENCES category(id) ON DELETE SET NULL
                )",
        (),
    )?;

    // Listing and summing a user's transactions filters by user and date.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = UserID::new(row.get(1)?);
    let description = row.get(2)?;
    let amount = row.get(3)?;
    let date = row.get(4)?;
    let category_id = row.get(5)?;

    Ok(Transaction {
        id,
        user_id,
        description,
        amount,
        date,
        category_id,
    })
}

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use rust_decimal_macros::dec;
    use time::{Duration, OffsetDateTime, UtcOffset, macros::datetime};

    use crate::{
        Error,
        amount::Amount,
        category::{CategoryName, create_category, delete_category},
        test_utils::{create_test_user, get_test_connection},
        transaction::{
            Transaction, create_transaction, delete_transaction, get_transaction,
            get_transactions_for_user, update_transaction,
        },
        user::{Role, UserID},
    };

    fn get_connection_with_users() -> (Connection, UserID, UserID) {
        let connection = get_test_connection();
        let alice = create_test_user("alice", Role::User, &connection).id;
        let bob = create_test_user("bob", Role::User, &connection).id;

        (connection, alice, bob)
    }

    fn amount(value: rust_decimal::Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[test]
    fn create_succeeds() {
        let (connection, alice, _) = get_connection_with_users();
        let date = datetime!(2025-10-05 12:00:00 UTC);

        let transaction = create_transaction(
            alice,
            Transaction::build(amount(dec!(125.50)), "Weekly shop").date(Some(date)),
            &connection,
        )
        .unwrap();

        assert!(transaction.id > 0);
        assert_eq!(transaction.user_id, alice);
        assert_eq!(transaction.amount, amount(dec!(125.50)));
        assert_eq!(transaction.date, date);
        assert_eq!(transaction.description, "Weekly shop");
        assert_eq!(transaction.category_id, None);
    }

    #[test]
    fn create_defaults_date_to_now() {
        let (connection, alice, _) = get_connection_with_users();

        let transaction =
            create_transaction(alice, Transaction::build(amount(dec!(1)), ""), &connection)
                .unwrap();

        let difference = (OffsetDateTime::now_utc() - transaction.date).abs();
        assert!(difference < Duration::seconds(5), "date was {}", transaction.date);
    }

    #[test]
    fn create_stores_dates_in_utc() {
        let (connection, alice, _) = get_connection_with_users();
        let date = datetime!(2025-10-05 12:00:00 +13:00);

        let transaction = create_transaction(
            alice,
            Transaction::build(amount(dec!(1)), "").date(Some(date)),
            &connection,
        )
        .unwrap();

        assert_eq!(transaction.date, date);
        assert_eq!(transaction.date.offset(), UtcOffset::UTC);
    }

    #[test]
    fn create_fails_on_missing_category() {
        let (connection, alice, _) = get_connection_with_users();

        let result = create_transaction(
            alice,
            Transaction::build(amount(dec!(1)), "").category_id(Some(42)),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(42)));
    }

    #[test]
    fn create_fails_on_other_users_category() {
        let (connection, alice, bob) = get_connection_with_users();
        let category =
            create_category(bob, CategoryName::new_unchecked("Concerts"), &connection).unwrap();

        let result = create_transaction(
            alice,
            Transaction::build(amount(dec!(1)), "").category_id(Some(category.id)),
            &connection,
        );

        assert_eq!(result, Err(Error::InvalidCategory(category.id)));
    }

    #[test]
    fn get_transaction_returns_created_transaction() {
        let (connection, alice, _) = get_connection_with_users();
        let created =
            create_transaction(alice, Transaction::build(amount(dec!(9.99)), ""), &connection)
                .unwrap();

        assert_eq!(get_transaction(created.id, &connection), Ok(created));
    }

    #[test]
    fn list_is_newest_first_and_per_user() {
        let (connection, alice, bob) = get_connection_with_users();
        let base = datetime!(2025-10-01 00:00:00 UTC);
        for days in [2, 0, 1] {
            create_transaction(
                alice,
                Transaction::build(amount(dec!(1)), "").date(Some(base + Duration::days(days))),
                &connection,
            )
            .unwrap();
        }
        create_transaction(bob, Transaction::build(amount(dec!(1)), ""), &connection).unwrap();

        let dates: Vec<OffsetDateTime> = get_transactions_for_user(alice, &connection)
            .unwrap()
            .into_iter()
            .map(|transaction| transaction.date)
            .collect();

        assert_eq!(
            dates,
            vec![base + Duration::days(2), base + Duration::days(1), base]
        );
    }

    #[test]
    fn update_keeps_date_when_omitted() {
        let (connection, alice, _) = get_connection_with_users();
        let date = datetime!(2025-10-05 12:00:00 UTC);
        let created = create_transaction(
            alice,
            Transaction::build(amount(dec!(1)), "Before").date(Some(date)),
            &connection,
        )
        .unwrap();

        let updated = update_transaction(
            created.id,
            alice,
            Transaction::build(amount(dec!(2.5)), "After"),
            &connection,
        )
        .unwrap();

        assert_eq!(updated.date, date);
        assert_eq!(updated.amount, amount(dec!(2.5)));
        assert_eq!(updated.description, "After");
    }

    #[test]
    fn update_other_users_transaction_is_forbidden() {
        let (connection, alice, bob) = get_connection_with_users();
        let created =
            create_transaction(alice, Transaction::build(amount(dec!(1)), ""), &connection)
                .unwrap();

        let result = update_transaction(
            created.id,
            bob,
            Transaction::build(amount(dec!(0)), ""),
            &connection,
        );

        assert_eq!(result, Err(Error::Forbidden));
    }

    #[test]
    fn update_missing_transaction_fails() {
        let (connection, alice, _) = get_connection_with_users();

        let result = update_transaction(
            1234,
            alice,
            Transaction::build(amount(dec!(0)), ""),
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissing("transaction")));
    }

    #[test]
    fn delete_succeeds() {
        let (connection, alice, _) = get_connection_with_users();
        let created =
            create_transaction(alice, Transaction::build(amount(dec!(1)), ""), &connection)
                .unwrap();

        delete_transaction(created.id, alice, &connection).unwrap();

        assert_eq!(get_transaction(created.id, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_other_users_transaction_is_forbidden() {
        let (connection, alice, bob) = get_connection_with_users();
        let created =
            create_transaction(alice, Transaction::build(amount(dec!(1)), ""), &connection)
                .unwrap();

        assert_eq!(
            delete_transaction(created.id, bob, &connection),
            Err(Error::Forbidden)
        );
    }

    #[test]
    fn deleting_category_detaches_transactions() {
        let (connection, alice, _) = get_connection_with_users();
        let category =
            create_category(alice, CategoryName::new_unchecked("Groceries"), &connection)
                .unwrap();
        let created = create_transaction(
            alice,
            Transaction::build(amount(dec!(125.50)), "").category_id(Some(category.id)),
            &connection,
        )
        .unwrap();

        delete_category(category.id, alice, &connection).unwrap();

        let transaction = get_transaction(created.id, &connection).unwrap();
        assert_eq!(transaction.category_id, None);
        assert_eq!(transaction.amount, amount(dec!(125.50)));
    }
}
