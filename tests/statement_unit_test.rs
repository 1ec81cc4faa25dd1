//! Unit tests for INSERT parsing, coercion, rendering and merging.

use sql_seeder::schema::Schema;
use sql_seeder::statement::{parse_insert_statements, InsertStatement, Row, Value};
use sql_seeder::Error;

const SCHEMA: &str = r#"
CREATE TABLE product (
    id INT PRIMARY KEY AUTO_INCREMENT,
    sku VARCHAR(20) NOT NULL,
    stock INT,
    price DOUBLE,
    active BOOLEAN
);
CREATE TABLE supplier (
    id INT PRIMARY KEY,
    name VARCHAR(50)
);
"#;

fn schema() -> Schema {
    Schema::parse(SCHEMA).unwrap()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

mod parse_tests {
    use super::*;

    #[test]
    fn test_tuples_become_rows() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        let stmt = InsertStatement::parse(
            product,
            "INSERT INTO product (sku, stock, price, active) VALUES ('A-1', 3, 9.99, TRUE), ('B-2', NULL, 0.5, FALSE), ('C''3', 7, 1e2, NULL);",
        )
        .unwrap()
        .unwrap();

        assert_eq!(stmt.len(), 3);
        let sku = product.get_column_id("sku").unwrap();
        let stock = product.get_column_id("stock").unwrap();
        let price = product.get_column_id("price").unwrap();
        assert_eq!(stmt.rows()[0][&sku], text("A-1"));
        assert_eq!(stmt.rows()[1][&stock], Value::Null);
        assert_eq!(stmt.rows()[2][&sku], text("C'3"));
        assert_eq!(stmt.rows()[2][&price], Value::Double(100.0));
    }

    #[test]
    fn test_round_trip_strips_auto_increment() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        let original = InsertStatement::parse(
            product,
            "INSERT INTO `product` (`id`, `sku`, `stock`) VALUES (10, 'x', 1), (11, 'y', 2)",
        )
        .unwrap()
        .unwrap();

        let rendered = original.generate_insert_statement();
        assert_eq!(
            rendered,
            "INSERT INTO product (sku, stock) VALUES \n\t('x', 1),\n\t('y', 2);"
        );

        let reparsed = InsertStatement::parse(product, &rendered).unwrap().unwrap();
        assert_eq!(reparsed.len(), 2);
        let sku = product.get_column_id("sku").unwrap();
        for (a, b) in original.rows().iter().zip(reparsed.rows()) {
            assert_eq!(a[&sku], b[&sku]);
        }
    }

    #[test]
    fn test_text_coercion() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        let stmt = InsertStatement::parse(product, "INSERT INTO product (stock, price) VALUES ('42', '3.14')")
            .unwrap()
            .unwrap();

        let row = &stmt.rows()[0];
        assert_eq!(row[&product.get_column_id("stock").unwrap()], Value::Int(42));
        assert_eq!(row[&product.get_column_id("price").unwrap()], Value::Double(3.14));
    }

    #[test]
    fn test_invalid_coercion() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        let err = InsertStatement::parse(product, "INSERT INTO product (stock) VALUES ('many')").unwrap_err();
        assert!(matches!(err, Error::InvalidLiteral { ref column, .. } if column == "stock"));
    }

    #[test]
    fn test_shape_errors() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();

        assert_eq!(
            InsertStatement::parse(product, "INSERT INTO product (sku, stock) VALUES ('a')").unwrap_err(),
            Error::ColumnCountMismatch {
                expected: 2,
                found: 1
            }
        );
        assert_eq!(
            InsertStatement::parse(product, "INSERT INTO product (colour) VALUES ('red')").unwrap_err(),
            Error::UnknownColumn {
                table: "product".to_string(),
                column: "colour".to_string()
            }
        );
        assert!(matches!(
            InsertStatement::parse(product, "INSERT product VALUES (1)"),
            Err(Error::StatementParse(_))
        ));
    }

    #[test]
    fn test_escaped_multibyte_char() {
        let schema = schema();
        let supplier = schema.get_table("supplier").unwrap();
        let stmt = InsertStatement::parse(supplier, "INSERT INTO supplier (id, name) VALUES (1, 'Caf\\é')")
            .unwrap()
            .unwrap();
        let name = supplier.get_column_id("name").unwrap();
        assert_eq!(stmt.rows()[0][&name], text("Café"));
    }

    #[test]
    fn test_non_insert_and_empty() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        assert_eq!(InsertStatement::parse(product, "").unwrap(), None);
        assert_eq!(InsertStatement::parse(product, "SELECT 1").unwrap(), None);
    }

    #[test]
    fn test_set_form() {
        let schema = schema();
        let supplier = schema.get_table("supplier").unwrap();
        let stmt = InsertStatement::parse(supplier, "INSERT INTO supplier SET id = 4, name = 'Acme'")
            .unwrap()
            .unwrap();
        assert_eq!(stmt.generate_insert_statement(), "INSERT INTO supplier (id, name) VALUES (4, 'Acme');");
    }

    #[test]
    fn test_script_skips_unknown_tables() {
        let schema = schema();
        let statements = parse_insert_statements(
            &schema,
            "-- seed\nINSERT INTO supplier VALUES (1, 'a;b');\nINSERT INTO warehouse VALUES (1);\nUPDATE supplier SET name = 'c';\nINSERT INTO product (sku) VALUES ('p');",
        )
        .unwrap();

        let tables: Vec<&str> = statements.iter().map(|s| s.table().name.as_str()).collect();
        assert_eq!(tables, vec!["supplier", "product"]);
        let name = schema.get_table("supplier").unwrap().get_column_id("name").unwrap();
        assert_eq!(statements[0].rows()[0][&name], text("a;b"));
    }
}

mod merge_tests {
    use super::*;

    fn parse<'a>(schema: &'a Schema, table: &str, sql: &str) -> InsertStatement<'a> {
        InsertStatement::parse(schema.get_table(table).unwrap(), sql).unwrap().unwrap()
    }

    #[test]
    fn test_merge_concatenates_in_order() {
        let schema = schema();
        let a = parse(&schema, "supplier", "INSERT INTO supplier VALUES (1, 'a'), (2, 'b')");
        let b = parse(&schema, "supplier", "INSERT INTO supplier VALUES (3, 'c')");

        let merged = InsertStatement::merge_statements(&[a, b]).unwrap().unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(
            merged.to_string(),
            "INSERT INTO supplier (id, name) VALUES \n\t(1, 'a'),\n\t(2, 'b'),\n\t(3, 'c');"
        );
    }

    #[test]
    fn test_merge_ignores_auto_increment_differences() {
        let schema = schema();
        let a = parse(&schema, "product", "INSERT INTO product (id, sku) VALUES (1, 'a')");
        let b = parse(&schema, "product", "INSERT INTO product (sku) VALUES ('b')");

        let merged = InsertStatement::merge_statements(&[a, b]).unwrap().unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_empty_is_none() {
        assert_eq!(InsertStatement::merge_statements(&[]).unwrap(), None);
    }

    #[test]
    fn test_merge_table_mismatch() {
        let schema = schema();
        let a = parse(&schema, "supplier", "INSERT INTO supplier VALUES (1, 'a')");
        let b = parse(&schema, "product", "INSERT INTO product (sku) VALUES ('b')");

        assert_eq!(
            InsertStatement::merge_statements(&[a, b]).unwrap_err(),
            Error::TableMismatch {
                expected: "supplier".to_string(),
                found: "product".to_string()
            }
        );
    }

    #[test]
    fn test_merge_column_mismatch() {
        let schema = schema();
        let a = parse(&schema, "product", "INSERT INTO product (sku, stock) VALUES ('a', 1)");
        let b = parse(&schema, "product", "INSERT INTO product (sku) VALUES ('b')");

        assert_eq!(
            InsertStatement::merge_statements(&[a, b]).unwrap_err(),
            Error::ColumnMismatch {
                table: "product".to_string()
            }
        );
    }
}

mod render_tests {
    use super::*;

    #[test]
    fn test_direct_rows_fill_missing_with_null() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        let sku = product.get_column_id("sku").unwrap();
        let stock = product.get_column_id("stock").unwrap();

        let mut first = Row::new();
        first.insert(sku, text("a"));
        first.insert(stock, Value::Int(5));
        let mut second = Row::new();
        second.insert(sku, text("b"));

        let stmt = InsertStatement::new(product, vec![first, second]);
        assert_eq!(
            stmt.generate_insert_statement(),
            "INSERT INTO product (sku, stock) VALUES \n\t('a', 5),\n\t('b', NULL);"
        );
    }

    #[test]
    fn test_only_auto_increment_renders_default_values() {
        let schema = Schema::parse("CREATE TABLE counter (id INT PRIMARY KEY AUTO_INCREMENT)").unwrap();
        let table = &schema.tables()[0];
        let stmt = InsertStatement::new(table, vec![Row::new(), Row::new()]);

        assert_eq!(
            stmt.generate_insert_statement(),
            "INSERT INTO counter DEFAULT VALUES;\nINSERT INTO counter DEFAULT VALUES;"
        );
    }

    #[test]
    fn test_values_render_as_literals() {
        assert_eq!(Value::Double(2.0).to_sql(), "2.0");
        assert_eq!(Value::Bool(true).to_sql(), "TRUE");
        assert_eq!(text("it's").to_sql(), "'it''s'");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn test_backfill_incrementing() {
        let schema = schema();
        let product = schema.get_table("product").unwrap();
        let mut stmt = InsertStatement::parse(product, "INSERT INTO product (sku) VALUES ('a'), ('b')")
            .unwrap()
            .unwrap();
        let id = product.get_column_id("id").unwrap();

        stmt.set_auto_increment_values_incrementing(id, 7);
        assert_eq!(stmt.rows()[0][&id], Value::Int(7));
        assert_eq!(stmt.rows()[1][&id], Value::Int(8));
    }
}
