use sql_seeder::parser::{
    classify_statement, split_qualified_name, split_statements, unquote_identifier, StatementType,
};

mod split_tests {
    use super::*;

    #[test]
    fn test_comments_between_statements_are_dropped() {
        let sql = "-- header\n/* block; with semicolon */\nCREATE TABLE a (id INT);\n-- trailing\n";
        assert_eq!(split_statements(sql), vec!["CREATE TABLE a (id INT)"]);
    }

    #[test]
    fn test_quotes_of_every_kind() {
        let sql = r#"INSERT INTO t VALUES ('it''s; fine', "x;y"); CREATE TABLE `we;ird` (id INT);"#;
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], r#"INSERT INTO t VALUES ('it''s; fine', "x;y")"#);
        assert_eq!(stmts[1], "CREATE TABLE `we;ird` (id INT)");
    }

    #[test]
    fn test_backslash_escape_in_string() {
        let stmts = split_statements(r"INSERT INTO t VALUES ('a\';b'); SELECT 1");
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].ends_with(r"('a\';b')"));
    }

    #[test]
    fn test_multibyte_text_is_kept() {
        let stmts = split_statements("INSERT INTO t VALUES ('Zoë – Ωmega');");
        assert_eq!(stmts, vec!["INSERT INTO t VALUES ('Zoë – Ωmega')"]);
    }

    #[test]
    fn test_backslash_before_multibyte_char() {
        let stmts = split_statements("INSERT INTO t (a) VALUES ('Caf\\é'); INSERT INTO t (a) VALUES ('x\\ü;')");
        assert_eq!(
            stmts,
            vec![
                "INSERT INTO t (a) VALUES ('Caf\\é')",
                "INSERT INTO t (a) VALUES ('x\\ü;')"
            ]
        );
    }

    #[test]
    fn test_empty_statements_are_skipped() {
        assert!(split_statements(" ;; \n ; ").is_empty());
        assert_eq!(split_statements("SELECT 1").len(), 1);
    }
}

mod classify_tests {
    use super::*;

    #[test]
    fn test_create_index_targets_table() {
        assert_eq!(
            classify_statement("CREATE UNIQUE INDEX idx_email ON `users` (email)"),
            (StatementType::CreateIndex, "users".to_string())
        );
    }

    #[test]
    fn test_insert_variants() {
        assert_eq!(
            classify_statement("INSERT IGNORE INTO shop.orders (id) VALUES (1)"),
            (StatementType::Insert, "orders".to_string())
        );
        assert_eq!(
            classify_statement("INSERT orders VALUES (1)").0,
            StatementType::Unknown
        );
    }

    #[test]
    fn test_temporary_table() {
        assert_eq!(
            classify_statement("CREATE TEMPORARY TABLE scratch (id INT)"),
            (StatementType::CreateTable, "scratch".to_string())
        );
    }

    #[test]
    fn test_qualified_names() {
        assert_eq!(
            split_qualified_name("`shop`.`orders`"),
            (Some("shop".to_string()), "orders".to_string())
        );
        assert_eq!(split_qualified_name("[dbo].[users]").1, "users");
        assert_eq!(split_qualified_name("plain"), (None, "plain".to_string()));
        assert_eq!(unquote_identifier("\"Quoted\""), "Quoted");
    }
}
