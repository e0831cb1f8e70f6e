//! Reserved keyword lists

use std::collections::HashSet;

use once_cell::sync::Lazy;

const SQL_COMMON: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "ASC", "BETWEEN", "BY", "CASE", "CHECK", "COLUMN",
    "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP",
    "DEFAULT", "DELETE", "DESC", "DISTINCT", "DROP", "ELSE", "END", "EXISTS", "FALSE", "FOR",
    "FOREIGN", "FROM", "GROUP", "HAVING", "IN", "INNER", "INSERT", "INTO", "IS", "JOIN", "LEFT",
    "LIKE", "LIMIT", "NOT", "NULL", "ON", "OR", "ORDER", "OUTER", "PRIMARY", "REFERENCES",
    "RIGHT", "SELECT", "SET", "TABLE", "THEN", "TO", "TRUE", "UNION", "UNIQUE", "UPDATE",
    "USING", "VALUES", "WHEN", "WHERE", "WITH",
];

const MYSQL: &[&str] = &[
    "ACCESSIBLE", "ANALYZE", "BEFORE", "BIGINT", "BINARY", "BLOB", "BOTH", "CALL", "CASCADE",
    "CHANGE", "CHAR", "CHARACTER", "COLLATE", "CONDITION", "CONTINUE", "CONVERT", "CURSOR",
    "DATABASE", "DATABASES", "DAY_HOUR", "DEC", "DECIMAL", "DECLARE", "DELAYED", "DESCRIBE",
    "DIV", "DOUBLE", "DUAL", "EACH", "ENCLOSED", "ESCAPED", "EXIT", "EXPLAIN", "FETCH", "FLOAT",
    "FORCE", "FULLTEXT", "GENERATED", "GRANT", "GROUPS", "HIGH_PRIORITY", "IF", "IGNORE",
    "INDEX", "INFILE", "INT", "INTEGER", "INTERVAL", "ITERATE", "KEY", "KEYS", "KILL", "LEADING",
    "LEAVE", "LINES", "LOAD", "LOCK", "LONG", "LONGBLOB", "LONGTEXT", "LOOP", "MATCH",
    "MEDIUMBLOB", "MEDIUMINT", "MEDIUMTEXT", "MOD", "NATURAL", "NUMERIC", "OPTIMIZE", "OPTION",
    "OUT", "PARTITION", "PRECISION", "PROCEDURE", "PURGE", "RANGE", "RANK", "READ", "REAL",
    "RECURSIVE", "REGEXP", "RELEASE", "RENAME", "REPEAT", "REPLACE", "REQUIRE", "RESTRICT",
    "RETURN", "REVOKE", "RLIKE", "ROW", "ROWS", "SCHEMA", "SCHEMAS", "SEPARATOR", "SHOW",
    "SMALLINT", "SPATIAL", "SQL", "STARTING", "STORED", "TERMINATED", "TINYBLOB", "TINYINT",
    "TINYTEXT", "TRAILING", "TRIGGER", "UNDO", "UNLOCK", "UNSIGNED", "USAGE", "USE", "UTC_DATE",
    "VARBINARY", "VARCHAR", "VARYING", "VIRTUAL", "WHILE", "WINDOW", "WRITE", "XOR",
    "YEAR_MONTH", "ZEROFILL",
];

const POSTGRES: &[&str] = &[
    "ANALYSE", "ANALYZE", "ANY", "ARRAY", "ASYMMETRIC", "AUTHORIZATION", "BINARY", "BOTH",
    "CAST", "COLLATE", "COLLATION", "CONCURRENTLY", "CURRENT_CATALOG", "CURRENT_ROLE",
    "CURRENT_SCHEMA", "CURRENT_USER", "DEFERRABLE", "DO", "EXCEPT", "FETCH", "FREEZE", "FULL",
    "GRANT", "ILIKE", "INITIALLY", "INTERSECT", "ISNULL", "LATERAL", "LEADING", "LOCALTIME",
    "LOCALTIMESTAMP", "NATURAL", "NOTNULL", "OFFSET", "ONLY", "OVERLAPS", "PLACING",
    "RETURNING", "SESSION_USER", "SIMILAR", "SOME", "SYMMETRIC", "TABLESAMPLE", "TRAILING",
    "USER", "VARIADIC", "VERBOSE", "WINDOW",
];

const SQLITE: &[&str] = &[
    "ABORT", "ACTION", "AFTER", "ANALYZE", "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN",
    "CASCADE", "CAST", "COLLATE", "COMMIT", "CONFLICT", "DATABASE", "DEFERRABLE", "DEFERRED",
    "DETACH", "EACH", "ESCAPE", "EXCEPT", "EXCLUSIVE", "EXPLAIN", "FAIL", "FULL", "GLOB", "IF",
    "IGNORE", "IMMEDIATE", "INDEX", "INDEXED", "INITIALLY", "INSTEAD", "INTERSECT", "ISNULL",
    "KEY", "MATCH", "NATURAL", "NO", "NOTNULL", "OF", "OFFSET", "PLAN", "PRAGMA", "QUERY",
    "RAISE", "RECURSIVE", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE", "RESTRICT",
    "ROLLBACK", "ROW", "SAVEPOINT", "TEMP", "TEMPORARY", "TRANSACTION", "TRIGGER", "VACUUM",
    "VIEW", "VIRTUAL",
];

fn build(lists: &[&[&'static str]]) -> HashSet<&'static str> {
    lists.iter().flat_map(|list| list.iter().copied()).collect()
}

static MYSQL_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| build(&[SQL_COMMON, MYSQL]));
static POSTGRES_KEYWORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| build(&[SQL_COMMON, POSTGRES]));
static SQLITE_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| build(&[SQL_COMMON, SQLITE]));

/// Words a dialect refuses as bare identifiers
#[derive(Debug, Clone, Copy)]
pub struct KeywordList {
    name: &'static str,
    words: &'static Lazy<HashSet<&'static str>>,
}

impl KeywordList {
    pub fn mysql() -> Self {
        Self {
            name: "mysql",
            words: &MYSQL_KEYWORDS,
        }
    }

    pub fn postgres() -> Self {
        Self {
            name: "postgresql",
            words: &POSTGRES_KEYWORDS,
        }
    }

    pub fn sqlite() -> Self {
        Self {
            name: "sqlite",
            words: &SQLITE_KEYWORDS,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.words.contains(word.to_uppercase().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        assert!(KeywordList::mysql().is_keyword("order"));
        assert!(KeywordList::mysql().is_keyword("Key"));
        assert!(!KeywordList::mysql().is_keyword("user"));
        assert!(KeywordList::postgres().is_keyword("user"));
        assert!(!KeywordList::sqlite().is_keyword("users"));
    }
}
