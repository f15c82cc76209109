//! Deterministic table names.
//!
//! Several suites (and several machines) may share one database server, so
//! every table a suite touches is suffixed with a hash of the suite id and
//! the connection it is created through. The same inputs always give the
//! same name, which is what lets a later run drop an earlier run's leftovers.

const FNV_OFFSET: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(parts: &[&str]) -> u32 {
    let mut hash = FNV_OFFSET;
    for part in parts {
        for &b in part.as_bytes() {
            hash ^= b as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        // Separator so ("ab", "c") and ("a", "bc") differ.
        hash ^= 0xff;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Keeps ASCII letters, digits and underscores; everything else becomes `_`.
pub fn sanitize_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNamer {
    suite_id: String,
}

impl TableNamer {
    pub fn new(suite_id: &str) -> Self {
        Self {
            suite_id: suite_id.to_string(),
        }
    }

    pub fn suite_id(&self) -> &str {
        &self.suite_id
    }

    /// Name of the fixture table `base` as seen through `connection`.
    pub fn table_name(&self, base: &str, connection: &str) -> String {
        let hash = fnv1a(&[&self.suite_id, connection]);
        format!("{}_{hash:08x}", sanitize_identifier(base))
    }

    /// Name of a table owned by a single case run.
    pub fn scoped_name(&self, base: &str, case: &str, connection: &str) -> String {
        let hash = fnv1a(&[&self.suite_id, connection, case]);
        format!("{}_{hash:08x}", sanitize_identifier(base))
    }
}
