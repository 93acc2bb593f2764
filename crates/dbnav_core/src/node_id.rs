/// Prefix carried by every node that belongs to a database connection.
pub const DATABASE_NODE_PREFIX: &str = "database://";

/// Converts a connection node id (`database://<connection>`) to the id of the
/// connection itself. Ids without the prefix are returned unchanged.
pub fn connection_node_id_to_connection_id(node_id: &str, prefix: &str) -> String {
    node_id.strip_prefix(prefix).unwrap_or(node_id).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_connection_prefix() {
        assert_eq!(
            connection_node_id_to_connection_id("database://pg-1", DATABASE_NODE_PREFIX),
            "pg-1"
        );
        assert_eq!(
            connection_node_id_to_connection_id("pg-1", DATABASE_NODE_PREFIX),
            "pg-1"
        );
    }
}
