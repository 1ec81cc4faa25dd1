//! Type conversion from MySQL/PostgreSQL/SQLite types to DuckDB types.

use once_cell::sync::Lazy;
use regex::Regex;

/// Converter for SQL types to DuckDB-compatible types
pub struct TypeConverter;

impl TypeConverter {
    /// Convert a declared SQL type to a DuckDB-compatible type string
    pub fn convert(type_str: &str) -> String {
        let upper = type_str.to_uppercase();
        let trimmed = upper.trim();

        let converted = match trimmed {
            "BOOL" | "BOOLEAN" | "BIT" | "TINYINT(1)" => "BOOLEAN",

            "TINYINT" => "TINYINT",
            "SMALLINT" | "YEAR" => "SMALLINT",
            "MEDIUMINT" | "INT" | "INTEGER" => "INTEGER",
            "BIGINT" => "BIGINT",

            // DuckDB has unsigned types
            "TINYINT UNSIGNED" => "UTINYINT",
            "SMALLINT UNSIGNED" => "USMALLINT",
            "MEDIUMINT UNSIGNED" | "INT UNSIGNED" | "INTEGER UNSIGNED" => "UINTEGER",
            "BIGINT UNSIGNED" => "UBIGINT",

            // Serial types get their default from a sequence
            "SERIAL" => "INTEGER",
            "BIGSERIAL" => "BIGINT",
            "SMALLSERIAL" => "SMALLINT",

            "FLOAT" | "FLOAT4" | "REAL" => "FLOAT",
            "DOUBLE" | "DOUBLE PRECISION" | "FLOAT8" => "DOUBLE",

            "DECIMAL" | "NUMERIC" | "DEC" | "FIXED" => "DECIMAL",
            "MONEY" => "DECIMAL(19,4)",

            "CHAR" | "VARCHAR" | "CHARACTER VARYING" | "NCHAR" | "NVARCHAR" => "VARCHAR",
            "TINYTEXT" => "VARCHAR(255)",
            "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "NTEXT" | "CLOB" => "TEXT",

            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BYTEA" => {
                "BLOB"
            }

            "DATE" => "DATE",
            "TIME" | "TIME WITHOUT TIME ZONE" => "TIME",
            "TIMETZ" | "TIME WITH TIME ZONE" => "TIMETZ",
            "DATETIME" | "DATETIME2" | "TIMESTAMP" | "TIMESTAMP WITHOUT TIME ZONE" => "TIMESTAMP",
            "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" => "TIMESTAMPTZ",

            "JSON" | "JSONB" => "JSON",
            "UUID" | "UNIQUEIDENTIFIER" => "UUID",

            _ => return Self::convert_parameterized(trimmed),
        };

        converted.to_string()
    }

    /// Handle parameterized types like VARCHAR(255), DECIMAL(10,2), INT(11) UNSIGNED
    fn convert_parameterized(type_str: &str) -> String {
        static RE_PARAMETERIZED: Lazy<Regex> =
            Lazy::new(|| Regex::new(r"^(\w+(?:\s+VARYING)?)\s*\(([^)]+)\)(.*)$").unwrap());

        let Some(caps) = RE_PARAMETERIZED.captures(type_str) else {
            // Unknown type - pass through as-is
            return type_str.to_string();
        };

        let base_type = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let params = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        let unsigned = caps
            .get(3)
            .map(|m| m.as_str().contains("UNSIGNED"))
            .unwrap_or(false);

        let converted = match (base_type, unsigned) {
            // Integer display widths are dropped
            ("TINYINT", _) if params == "1" => "BOOLEAN",
            ("TINYINT", false) => "TINYINT",
            ("TINYINT", true) => "UTINYINT",
            ("SMALLINT", false) => "SMALLINT",
            ("SMALLINT", true) => "USMALLINT",
            ("MEDIUMINT" | "INT" | "INTEGER", false) => "INTEGER",
            ("MEDIUMINT" | "INT" | "INTEGER", true) => "UINTEGER",
            ("BIGINT", false) => "BIGINT",
            ("BIGINT", true) => "UBIGINT",

            ("CHAR" | "CHARACTER" | "VARCHAR" | "CHARACTER VARYING" | "NCHAR" | "NVARCHAR", _) => {
                if params.eq_ignore_ascii_case("MAX") {
                    return "TEXT".to_string();
                }
                return format!("VARCHAR({})", params);
            }
            ("BINARY" | "VARBINARY", _) => "BLOB",

            ("DECIMAL" | "NUMERIC" | "DEC" | "FIXED", _) => {
                return format!("DECIMAL({})", params);
            }

            ("FLOAT", _) => match params.parse::<u32>() {
                Ok(precision) if precision > 24 => "DOUBLE",
                _ => "FLOAT",
            },
            ("DOUBLE" | "REAL", _) => "DOUBLE",

            ("TIME", _) => "TIME",
            ("TIMESTAMP" | "DATETIME" | "DATETIME2", _) => "TIMESTAMP",
            ("BIT", _) if params == "1" => "BOOLEAN",
            ("ENUM" | "SET", _) => "VARCHAR",

            _ => return type_str.to_string(),
        };

        converted.to_string()
    }
}
