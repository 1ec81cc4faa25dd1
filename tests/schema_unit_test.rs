//! Unit tests for schema parsing and foreign-key resolution.

use sql_seeder::schema::{
    extract_create_table_name, parse_column_list, parse_create_table, quote_identifier,
    split_table_body, sql_identifier, Column, ColumnId, ColumnRef, ColumnType, Schema,
    SchemaBuilder, Table, TableId,
};
use sql_seeder::Error;

const SHOP_DUMP: &str = r#"
-- MySQL dump
SET NAMES utf8mb4;
/*!40101 SET @OLD_CHARACTER_SET_CLIENT=@@CHARACTER_SET_CLIENT */;

CREATE TABLE `users` (
  `id` int(11) NOT NULL AUTO_INCREMENT,
  `email` varchar(255) NOT NULL,
  `manager_id` int(11) DEFAULT NULL,
  PRIMARY KEY (`id`),
  UNIQUE KEY `users_email_unique` (`email`),
  CONSTRAINT `fk_manager` FOREIGN KEY (`manager_id`) REFERENCES `users` (`id`)
) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;

CREATE TABLE orders (
  id BIGINT PRIMARY KEY,
  user_id INT NOT NULL REFERENCES users,
  total DECIMAL(10,2),
  placed_at TIMESTAMP
);

CREATE INDEX idx_orders_user ON orders (user_id);
"#;

mod column_tests {
    use super::*;

    #[test]
    fn test_column_type_parsing() {
        assert_eq!(ColumnType::from_sql_type("int(11)"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("BIGSERIAL"), ColumnType::Integer);
        assert_eq!(ColumnType::from_sql_type("DOUBLE PRECISION"), ColumnType::Float);
        assert_eq!(ColumnType::from_sql_type("DECIMAL(10,2)"), ColumnType::Decimal);
        assert_eq!(ColumnType::from_sql_type("VARCHAR(255)"), ColumnType::Text);
        assert_eq!(ColumnType::from_sql_type("TIMESTAMP"), ColumnType::DateTime);
        assert_eq!(ColumnType::from_sql_type("tinyint"), ColumnType::Integer);
        assert_eq!(
            ColumnType::from_sql_type("JSONB"),
            ColumnType::Other("JSONB".to_string())
        );
    }

    #[test]
    fn test_table_column_lookup() {
        let mut table = Table::new("users", TableId(0));
        table.add_column(Column::new("id", "INT", ColumnId(0)));
        table.add_column(Column::new("Email", "TEXT", ColumnId(0)));

        assert_eq!(table.get_column_id("id"), Some(ColumnId(0)));
        assert_eq!(table.get_column_id("email"), Some(ColumnId(1)));
        assert!(table.get_column("missing").is_none());
        assert_eq!(table.column_list(), "id, Email");
    }
}

mod parse_tests {
    use super::*;

    #[test]
    fn test_mysql_dump() {
        let schema = Schema::parse(SHOP_DUMP).unwrap();
        assert_eq!(schema.len(), 2);

        let users = schema.get_table("users").unwrap();
        assert_eq!(users.id, TableId(0));
        assert!(users.definition.starts_with("CREATE TABLE `users`"));

        let id = users.get_column("id").unwrap();
        assert!(id.is_primary_key);
        assert!(id.is_auto_increment);
        assert!(users.get_column("email").unwrap().is_unique);

        let manager = users.get_column("manager_id").unwrap();
        assert_eq!(
            manager.reference,
            Some(ColumnRef {
                table: TableId(0),
                column: ColumnId(0)
            })
        );
    }

    #[test]
    fn test_inline_reference_targets_primary_key() {
        let schema = Schema::parse(SHOP_DUMP).unwrap();
        let orders = schema.get_table("ORDERS").unwrap();
        let user_id = orders.get_column("user_id").unwrap();

        let (table, column) = schema.resolve(user_id.reference.unwrap()).unwrap();
        assert_eq!(table.name, "users");
        assert_eq!(column.name, "id");
        assert!(orders.get_column("total").unwrap().reference.is_none());
    }

    #[test]
    fn test_insertable_columns_skip_auto_increment() {
        let schema = Schema::parse(SHOP_DUMP).unwrap();
        let users = schema.get_table("users").unwrap();
        let names: Vec<&str> = users.insertable_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["email", "manager_id"]);
    }

    #[test]
    fn test_table_sql_helpers() {
        let schema = Schema::parse("CREATE TABLE t (a INT, b TEXT)").unwrap();
        let table = &schema.tables()[0];
        assert_eq!(table.count_sql(), "SELECT COUNT(*) FROM t");
        assert_eq!(table.select_all_sql(), "SELECT a, b FROM t;");
        assert_eq!(
            table.select_random_sql(2),
            "SELECT a, b FROM t ORDER BY RANDOM() LIMIT 2;"
        );
    }

    #[test]
    fn test_reserved_and_odd_names_are_quoted() {
        let schema = Schema::parse("CREATE TABLE `order` (id INT, `group` TEXT, `unit-price` DOUBLE, note TEXT)").unwrap();
        let table = &schema.tables()[0];
        assert_eq!(table.count_sql(), "SELECT COUNT(*) FROM \"order\"");
        assert_eq!(
            table.select_all_sql(),
            "SELECT id, \"group\", \"unit-price\", note FROM \"order\";"
        );
        assert_eq!(sql_identifier("Note"), "Note");
        assert_eq!(sql_identifier("Select"), "\"Select\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_keyword_named_columns() {
        let schema = Schema::parse(
            "CREATE TABLE setting (id INT PRIMARY KEY, key VARCHAR(20) NOT NULL, check DECIMAL(4,2), KEY idx_key (key))",
        )
        .unwrap();
        let setting = schema.get_table("setting").unwrap();
        let names: Vec<&str> = setting.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "key", "check"]);
    }

    #[test]
    fn test_qualified_name() {
        let table = parse_create_table("CREATE TABLE IF NOT EXISTS shop.items (id INT)").unwrap();
        assert_eq!(table.name, "items");
        assert_eq!(table.qualified_name(), "shop.items");
    }

    #[test]
    fn test_helpers() {
        assert_eq!(
            extract_create_table_name("CREATE TABLE IF NOT EXISTS `audit_log` (id INT)"),
            Some("audit_log".to_string())
        );
        assert_eq!(parse_column_list("`a`, \"b\" , c"), vec!["a", "b", "c"]);
        assert_eq!(split_table_body("a INT, b DECIMAL(4,2)").len(), 2);
    }

    #[test]
    fn test_builder_incremental() {
        let mut builder = SchemaBuilder::new();
        builder.add_create_table("CREATE TABLE a (id INT PRIMARY KEY)").unwrap();
        builder
            .add_create_table("CREATE TABLE b (id INT, a_id INT REFERENCES a(id))")
            .unwrap();
        assert_eq!(builder.schema().len(), 2);

        let schema = builder.build().unwrap();
        assert!(schema.get_table("b").unwrap().get_column("a_id").unwrap().reference.is_some());
    }
}

mod error_tests {
    use super::*;

    fn parse_err(sql: &str) -> String {
        match Schema::parse(sql) {
            Err(Error::SchemaParse(msg)) => msg,
            other => panic!("expected schema error, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_no_tables() {
        assert!(parse_err("SET NAMES utf8;").contains("no CREATE TABLE"));
        assert!(parse_err("").contains("no CREATE TABLE"));
    }

    #[test]
    fn test_unknown_statement() {
        assert!(parse_err("CREATE TABLE a (id INT); GRANT ALL ON a TO bob;").contains("unrecognized"));
    }

    #[test]
    fn test_duplicate_table() {
        assert!(parse_err("CREATE TABLE a (id INT); CREATE TABLE a (id INT);").contains("more than once"));
    }

    #[test]
    fn test_unknown_referenced_table() {
        assert!(parse_err("CREATE TABLE a (b_id INT REFERENCES b(id));").contains("unknown table b"));
    }

    #[test]
    fn test_unknown_referenced_column() {
        let msg = parse_err(
            "CREATE TABLE b (id INT); CREATE TABLE a (b_id INT, FOREIGN KEY (b_id) REFERENCES b(code));",
        );
        assert!(msg.contains("unknown column"));
    }

    #[test]
    fn test_missing_column_type() {
        parse_err("CREATE TABLE a (id, name TEXT);");
    }
}
