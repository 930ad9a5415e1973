// Integration tests for schema adapters
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use sqlparser::dialect::{MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use sqlshift_core::adapter::{MySqlAdapter, PostgresAdapter, SchemaAdapter};
use sqlshift_core::connection::{DryRunConnection, Param, Row, StatementKind, Value};
use sqlshift_core::dialect::SqlDialect;
use sqlshift_core::error::MigrationError;
use sqlshift_core::schema::{ColumnDef, ForeignKey, IndexColumn, TableOptions};
use sqlshift_core::types::TypeMap;

fn mysql() -> DryRunConnection {
    DryRunConnection::new(SqlDialect::MySQL)
}

fn postgres() -> DryRunConnection {
    DryRunConnection::new(SqlDialect::PostgreSQL)
}

fn column_type_rows(column_type: &str) -> Vec<Row> {
    let mut row = Row::new();
    row.insert("column_type".to_string(), Value::from(column_type));
    vec![row]
}

fn users_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::typed("id", "integer").with_modifiers("PRIMARY KEY"),
        ColumnDef::typed("name", "string"),
    ]
}

/// Quoted identifiers in `sql`, as seen by a real SQL tokenizer
fn quoted_words(dialect: &dyn sqlparser::dialect::Dialect, sql: &str) -> Vec<(char, String)> {
    Tokenizer::new(dialect, sql)
        .tokenize()
        .unwrap()
        .into_iter()
        .filter_map(|token| match token {
            Token::Word(word) => word.quote_style.map(|q| (q, word.value)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_create_table_example() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);

    adapter
        .create_table("users", &users_columns(), &TableOptions::default(), None)
        .unwrap();

    assert_eq!(
        conn.executed(),
        vec![
            "CREATE TABLE IF NOT EXISTS `users` (`id` INT PRIMARY KEY, `name` VARCHAR(255)) \
             ENGINE=InnoDB DEFAULT CHARACTER SET=utf8 COLLATE=utf8_general_ci"
                .to_string()
        ]
    );
}

#[test]
fn test_create_table_options_never_leak() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);
    let mut bag = IndexMap::new();
    bag.insert("engine".to_string(), "MyISAM".to_string());
    bag.insert("row_format".to_string(), "COMPRESSED".to_string());
    let options = TableOptions::from_map(bag);

    let sql = adapter
        .create_table_sql(
            "logs",
            &[ColumnDef::typed("line", "text")],
            &options,
            Some("AUTO_INCREMENT=10"),
        )
        .unwrap();

    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS `logs` (`line` TEXT) ENGINE=MyISAM \
         DEFAULT CHARACTER SET=utf8 COLLATE=utf8_general_ci AUTO_INCREMENT=10"
    );
    assert!(!sql.contains("row_format"));
    assert!(!sql.contains("COMPRESSED"));
    assert!(!sql.contains("engine"));
}

#[test]
fn test_create_table_bare_column_and_passthrough_type() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);

    let sql = adapter
        .create_table_sql(
            "t",
            &[
                ColumnDef::new("plain"),
                ColumnDef::typed("body", "MEDIUMTEXT").with_modifiers("NOT NULL"),
            ],
            &TableOptions::default().with_charset("utf8mb4"),
            None,
        )
        .unwrap();

    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS `t` (`plain`, `body` MEDIUMTEXT NOT NULL)"));
    assert!(sql.contains("DEFAULT CHARACTER SET=utf8mb4"));
}

#[test]
fn test_every_mapped_type_is_emitted_verbatim() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);
    let map = TypeMap::mysql();

    for (token, native) in map.iter() {
        let add = adapter.add_column_sql("t", "c", token, None).unwrap();
        assert_eq!(add, format!("ALTER TABLE `t` ADD `c` {}", native));

        let change = adapter.change_column_sql("t", "c", token, None).unwrap();
        assert_eq!(change, format!("ALTER TABLE `t` CHANGE `c` `c` {}", native));
    }
}

#[test]
fn test_strict_type_map_rejects_unknown_tokens() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn).with_type_map(TypeMap::mysql().strict());

    let err = adapter
        .create_table("t", &[ColumnDef::typed("c", "geometry")], &TableOptions::default(), None)
        .unwrap_err();
    assert!(matches!(err, MigrationError::Translation { ref token, .. } if token == "geometry"));
    assert!(conn.statements().is_empty());

    let err = adapter.add_column("t", "c", "money", None).unwrap_err();
    assert!(matches!(err, MigrationError::Translation { .. }));
}

#[test]
fn test_drop_and_remove_table_are_synonyms() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);

    adapter.drop_table("sessions").unwrap();
    adapter.remove_table("sessions").unwrap();

    let executed = conn.executed();
    assert_eq!(executed[0], "DROP TABLE `sessions`");
    assert_eq!(executed[0], executed[1]);
}

#[test]
fn test_rename_table() {
    let conn = mysql();
    MySqlAdapter::new(&conn).rename_table("old", "new").unwrap();
    assert_eq!(conn.executed(), vec!["RENAME TABLE `old` TO `new`".to_string()]);
}

#[test]
fn test_add_column_with_options() {
    let conn = mysql();
    MySqlAdapter::new(&conn)
        .add_column("users", "active", "boolean", Some("NOT NULL DEFAULT 1"))
        .unwrap();
    assert_eq!(
        conn.executed(),
        vec!["ALTER TABLE `users` ADD `active` TINYINT(1) NOT NULL DEFAULT 1".to_string()]
    );
}

#[test]
fn test_rename_column_example() {
    let conn = mysql();
    conn.push_rows(column_type_rows("VARCHAR(255)"));
    let adapter = MySqlAdapter::new(&conn);

    adapter.rename_column("users", "fname", "first_name").unwrap();

    let recorded = conn.recorded();
    assert_eq!(recorded.len(), 2);
    assert_eq!(recorded[0].kind, StatementKind::Query);
    assert_eq!(recorded[1].kind, StatementKind::Execute);
    assert_eq!(
        recorded[1].sql,
        "ALTER TABLE `users` CHANGE `fname` `first_name` VARCHAR(255)"
    );
}

#[test]
fn test_rename_column_unresolved_type_is_an_error() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);

    let err = adapter.rename_column("users", "fname", "first_name").unwrap_err();
    assert!(matches!(err, MigrationError::ColumnResolution { .. }));
    assert!(conn.executed().is_empty());

    conn.push_rows(column_type_rows("  "));
    let err = adapter.rename_column("users", "fname", "first_name").unwrap_err();
    assert!(matches!(err, MigrationError::ColumnResolution { .. }));
    assert!(conn.executed().is_empty());
}

#[test]
fn test_change_and_remove_column() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);

    adapter
        .change_column("users", "age", "smallint", Some("UNSIGNED NOT NULL"))
        .unwrap();
    adapter.remove_column("users", "age").unwrap();

    assert_eq!(
        conn.executed(),
        vec![
            "ALTER TABLE `users` CHANGE `age` `age` SMALLINT UNSIGNED NOT NULL".to_string(),
            "ALTER TABLE `users` DROP `age`".to_string(),
        ]
    );
}

#[test]
fn test_add_index_example() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);

    adapter
        .add_index("orders", "idx_customer", &["customer_id".into()], true)
        .unwrap();
    adapter
        .add_index(
            "orders",
            "idx_recent",
            &[
                IndexColumn::new("created_at").with_modifier("DESC"),
                IndexColumn::new("note").with_modifier("(10)"),
            ],
            false,
        )
        .unwrap();
    adapter.remove_index("orders", "idx_recent").unwrap();

    assert_eq!(
        conn.executed(),
        vec![
            "CREATE UNIQUE INDEX `idx_customer` ON `orders` (`customer_id`)".to_string(),
            "CREATE INDEX `idx_recent` ON `orders` (`created_at` DESC, `note` (10))".to_string(),
            "DROP INDEX `idx_recent` ON `orders`".to_string(),
        ]
    );
}

#[test]
fn test_add_constraint_default_name() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);
    let fk = ForeignKey::new("Orders", "customer_id", "Customers", "id")
        .with_options("ON DELETE CASCADE");

    adapter.add_constraint(&fk).unwrap();
    adapter.add_constraint(&fk).unwrap();

    let executed = conn.executed();
    assert_eq!(
        executed[0],
        "ALTER TABLE `Orders` ADD CONSTRAINT `orders_customer_id_customers_id` \
         FOREIGN KEY (`customer_id`) REFERENCES `Customers` (`id`) ON DELETE CASCADE"
    );
    assert_eq!(executed[0], executed[1]);
}

#[test]
fn test_add_constraint_explicit_name() {
    let conn = mysql();
    let fk = ForeignKey::new("orders", "customer_id", "customers", "id").named("fk_customer");
    let sql = MySqlAdapter::new(&conn).add_constraint_sql(&fk);
    assert_eq!(
        sql,
        "ALTER TABLE `orders` ADD CONSTRAINT `fk_customer` FOREIGN KEY (`customer_id`) \
         REFERENCES `customers` (`id`)"
    );
}

#[test]
fn test_remove_constraint_sequence() {
    let conn = mysql();
    MySqlAdapter::new(&conn)
        .remove_constraint("orders", "fk_customer")
        .unwrap();

    assert_eq!(
        conn.executed(),
        vec![
            "SET FOREIGN_KEY_CHECKS = 0".to_string(),
            "ALTER TABLE `orders` DROP FOREIGN KEY `fk_customer`".to_string(),
            "SET FOREIGN_KEY_CHECKS = 1".to_string(),
        ]
    );
}

#[test]
fn test_remove_constraint_reenables_checks_after_failed_drop() {
    let conn = mysql().failing_on("ALTER TABLE");
    let err = MySqlAdapter::new(&conn)
        .remove_constraint("orders", "fk_customer")
        .unwrap_err();

    // the drop failure is surfaced
    match err {
        MigrationError::Execution { sql, .. } => {
            assert_eq!(sql, "ALTER TABLE `orders` DROP FOREIGN KEY `fk_customer`")
        }
        other => panic!("expected execution error, got {:?}", other),
    }
    assert_eq!(
        conn.executed().last().map(String::as_str),
        Some("SET FOREIGN_KEY_CHECKS = 1")
    );
    assert_eq!(conn.executed().len(), 3);
}

#[test]
fn test_remove_constraint_reports_failed_restore() {
    let conn = mysql()
        .failing_on("ALTER TABLE")
        .failing_on("SET FOREIGN_KEY_CHECKS = 1");
    let err = MySqlAdapter::new(&conn)
        .remove_constraint("orders", "fk_customer")
        .unwrap_err();

    assert!(matches!(err, MigrationError::Sequence { ref constraint, .. } if constraint == "fk_customer"));
    assert_eq!(conn.executed().len(), 3);
}

#[test]
fn test_remove_constraint_stops_when_disable_fails() {
    let conn = mysql().failing_on("SET FOREIGN_KEY_CHECKS = 0");
    let err = MySqlAdapter::new(&conn)
        .remove_constraint("orders", "fk_customer")
        .unwrap_err();

    assert!(matches!(err, MigrationError::Execution { .. }));
    assert_eq!(conn.executed(), vec!["SET FOREIGN_KEY_CHECKS = 0".to_string()]);
}

#[test]
fn test_execute_and_query_bind_params() {
    let conn = mysql();
    let adapter = MySqlAdapter::new(&conn);
    conn.push_rows(column_type_rows("int"));

    adapter
        .execute(
            "UPDATE users SET name = :name WHERE id = :id",
            &[Param::named(":name", "ann"), Param::named(":id", 1)],
        )
        .unwrap();
    let rows = adapter
        .query("SELECT * FROM users WHERE id = ?", &[Param::positional(1, 1)])
        .unwrap();

    assert_eq!(rows.len(), 1);
    let recorded = conn.recorded();
    assert_eq!(recorded[0].params.len(), 2);
    assert_eq!(recorded[0].params[0].value, Value::from("ann"));
    assert_eq!(recorded[1].kind, StatementKind::Query);
    // values are bound, never spliced into the statement
    assert!(!recorded[0].sql.contains("ann"));
}

#[test]
fn test_execution_error_carries_statement() {
    let conn = mysql().failing_on("DROP");
    let err = MySqlAdapter::new(&conn).drop_table("t").unwrap_err();
    let detailed = err.format_detailed();
    assert!(detailed.contains("DROP TABLE `t`"));
    assert!(detailed.contains("simulated failure"));
}

#[test]
fn test_mysql_identifiers_survive_tokenizer() {
    let conn = mysql();
    let sql = MySqlAdapter::new(&conn)
        .add_index_sql("order", "select", &["group".into()], false);

    assert_eq!(
        quoted_words(&MySqlDialect {}, &sql),
        vec![
            ('`', "select".to_string()),
            ('`', "order".to_string()),
            ('`', "group".to_string()),
        ]
    );
}

#[test]
fn test_postgres_statements() {
    let conn = postgres();
    let adapter = PostgresAdapter::new(&conn);

    adapter
        .create_table(
            "users",
            &users_columns(),
            &TableOptions::default(),
            Some("CONSTRAINT name_unique UNIQUE (name)"),
        )
        .unwrap();
    adapter.rename_table("users", "members").unwrap();
    adapter.add_column("members", "active", "boolean", Some("DEFAULT TRUE")).unwrap();
    adapter.remove_column("members", "active").unwrap();
    adapter
        .add_index("members", "idx_name", &["name".into()], false)
        .unwrap();
    adapter.remove_index("members", "idx_name").unwrap();
    adapter.drop_table("members").unwrap();

    assert_eq!(
        conn.executed(),
        vec![
            "CREATE TABLE IF NOT EXISTS \"users\" (\"id\" INTEGER PRIMARY KEY, \"name\" VARCHAR(255)) \
             CONSTRAINT name_unique UNIQUE (name)"
                .to_string(),
            "ALTER TABLE \"users\" RENAME TO \"members\"".to_string(),
            "ALTER TABLE \"members\" ADD \"active\" BOOLEAN DEFAULT TRUE".to_string(),
            "ALTER TABLE \"members\" DROP COLUMN \"active\"".to_string(),
            "CREATE INDEX \"idx_name\" ON \"members\" (\"name\")".to_string(),
            "DROP INDEX \"idx_name\"".to_string(),
            "DROP TABLE \"members\"".to_string(),
        ]
    );
}

#[test]
fn test_postgres_rename_column() {
    let conn = postgres();
    conn.push_rows(column_type_rows("character varying(255)"));
    PostgresAdapter::new(&conn)
        .rename_column("users", "fname", "first_name")
        .unwrap();

    assert_eq!(
        conn.executed(),
        vec!["ALTER TABLE \"users\" RENAME COLUMN \"fname\" TO \"first_name\"".to_string()]
    );
}

#[test]
fn test_change_column_attributes_parse_in_both_dialects() {
    let my = mysql();
    let pg = postgres();

    let mysql_sql = MySqlAdapter::new(&my)
        .change_column_sql("users", "age", "integer", Some("NOT NULL DEFAULT 0"))
        .unwrap();
    let postgres_sql = PostgresAdapter::new(&pg)
        .change_column_sql("users", "age", "integer", Some("NOT NULL DEFAULT 0"))
        .unwrap();

    assert_eq!(
        postgres_sql,
        "ALTER TABLE \"users\" ALTER COLUMN \"age\" TYPE INTEGER, \
         ALTER COLUMN \"age\" SET NOT NULL, ALTER COLUMN \"age\" SET DEFAULT 0"
    );
    Parser::parse_sql(&MySqlDialect {}, &mysql_sql).unwrap();
    Parser::parse_sql(&PostgreSqlDialect {}, &postgres_sql).unwrap();
}

#[test]
fn test_schema_qualified_table_names() {
    let conn = postgres();
    let sql = PostgresAdapter::new(&conn).rename_table_sql("public.users", "members");

    assert_eq!(sql, "ALTER TABLE \"public\".\"users\" RENAME TO \"members\"");
    assert_eq!(
        quoted_words(&PostgreSqlDialect {}, &sql),
        vec![
            ('"', "public".to_string()),
            ('"', "users".to_string()),
            ('"', "members".to_string()),
        ]
    );
}

#[test]
fn test_postgres_remove_constraint_restores_role() {
    let conn = postgres().failing_on("ALTER TABLE");
    let err = PostgresAdapter::new(&conn)
        .remove_constraint("orders", "orders_customer_id_customers_id")
        .unwrap_err();

    assert!(matches!(err, MigrationError::Execution { .. }));
    assert_eq!(
        conn.executed(),
        vec![
            "SET session_replication_role = replica".to_string(),
            "ALTER TABLE \"orders\" DROP CONSTRAINT \"orders_customer_id_customers_id\"".to_string(),
            "SET session_replication_role = DEFAULT".to_string(),
        ]
    );
}

#[test]
fn test_postgres_identifiers_survive_tokenizer() {
    let conn = postgres();
    let fk = ForeignKey::new("line items", "order", "orders", "id");
    let sql = PostgresAdapter::new(&conn).add_constraint_sql(&fk);

    let words = quoted_words(&PostgreSqlDialect {}, &sql);
    assert_eq!(words[0], ('"', "line items".to_string()));
    assert_eq!(words[1], ('"', "line items_order_orders_id".to_string()));
    assert!(words.iter().all(|(q, _)| *q == '"'));
}

#[test]
fn test_adapters_are_usable_as_trait_objects() {
    let my = mysql();
    let pg = postgres();
    let adapters: Vec<Box<dyn SchemaAdapter + '_>> = vec![
        sqlshift_core::adapter::for_dialect(SqlDialect::MySQL, &my, TypeMap::mysql()),
        sqlshift_core::adapter::for_dialect(SqlDialect::PostgreSQL, &pg, TypeMap::postgres()),
    ];

    let drops: Vec<String> = adapters.iter().map(|a| a.remove_table_sql("t")).collect();
    assert_eq!(drops, vec!["DROP TABLE `t`".to_string(), "DROP TABLE \"t\"".to_string()]);
}
