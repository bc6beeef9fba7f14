//! Relay-style connections

use async_graphql::SimpleObject;
use serde::Serialize;

use crate::cursor::CursorCodec;
use crate::executor::RawWindow;
use crate::store::Record;

/// Page information
///
/// Cursors are empty strings when the page has no edges.
#[derive(SimpleObject, Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: String,
    pub end_cursor: String,
}

/// Edge in a connection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge<T> {
    pub cursor: String,
    pub node: T,
}

/// Connection (paginated result)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    pub edges: Vec<Edge<T>>,
    pub page_info: PageInfo,
    /// Size of the filtered candidate set, not of this page
    pub total_count: u64,
}

impl<T> Connection<T> {
    /// Create empty connection
    pub fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo::default(),
            total_count: 0,
        }
    }

    /// Convert every node, failing on the first error.
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<Connection<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        let edges = self
            .edges
            .into_iter()
            .map(|edge| -> Result<Edge<U>, E> {
                Ok(Edge {
                    cursor: edge.cursor,
                    node: f(edge.node)?,
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(Connection {
            edges,
            page_info: self.page_info,
            total_count: self.total_count,
        })
    }
}

/// Turns a fetched window into a connection.
pub struct ResultAssembler<'a> {
    tag: &'a str,
}

impl<'a> ResultAssembler<'a> {
    pub fn new(tag: &'a str) -> Self {
        Self { tag }
    }

    pub fn assemble(&self, window: RawWindow) -> Connection<Record> {
        if window.records.is_empty() {
            return Connection::empty();
        }

        let edges: Vec<Edge<Record>> = window
            .records
            .into_iter()
            .map(|node| Edge {
                cursor: CursorCodec::encode(self.tag, &node.key),
                node,
            })
            .collect();

        let start_cursor = edges.first().map(|e| e.cursor.clone()).unwrap_or_default();
        let end_cursor = edges.last().map(|e| e.cursor.clone()).unwrap_or_default();

        Connection {
            edges,
            page_info: PageInfo {
                has_next_page: window.has_next_page,
                has_previous_page: window.has_previous_page,
                start_cursor,
                end_cursor,
            },
            total_count: window.total_count,
        }
    }
}

/// Define GraphQL connection and edge objects for a node type.
///
/// ```ignore
/// define_connection!(GuidanceTagConnection, GuidanceTagEdge, GuidanceTag);
/// ```
#[macro_export]
macro_rules! define_connection {
    ($conn_name:ident, $edge_name:ident, $node_type:ty) => {
        /// Edge containing a node and its cursor
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $edge_name {
            pub cursor: String,
            pub node: $node_type,
        }

        /// Paginated list of edges
        #[derive(async_graphql::SimpleObject, Debug, Clone)]
        pub struct $conn_name {
            pub edges: Vec<$edge_name>,
            pub page_info: $crate::pagination::PageInfo,
            pub total_count: u64,
        }

        impl From<$crate::pagination::Connection<$node_type>> for $conn_name {
            fn from(connection: $crate::pagination::Connection<$node_type>) -> Self {
                Self {
                    edges: connection
                        .edges
                        .into_iter()
                        .map(|edge| $edge_name {
                            cursor: edge.cursor,
                            node: edge.node,
                        })
                        .collect(),
                    page_info: connection.page_info,
                    total_count: connection.total_count,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_window_is_canonical() {
        let window = RawWindow {
            records: Vec::new(),
            has_next_page: true,
            has_previous_page: true,
            total_count: 12,
        };
        let conn = ResultAssembler::new("domains").assemble(window);
        assert_eq!(conn, Connection::empty());
        assert_eq!(conn.page_info.start_cursor, "");
        assert_eq!(conn.total_count, 0);
    }

    #[test]
    fn test_connection_creation() {
        let window = RawWindow {
            records: vec![
                Record::new("a1", json!({"name": "one"})),
                Record::new("a2", json!({"name": "two"})),
            ],
            has_next_page: true,
            has_previous_page: false,
            total_count: 5,
        };
        let conn = ResultAssembler::new("organizations").assemble(window);

        assert_eq!(conn.edges.len(), 2);
        assert_eq!(conn.edges[0].cursor, CursorCodec::encode("organizations", "a1"));
        assert_eq!(conn.page_info.start_cursor, conn.edges[0].cursor);
        assert_eq!(conn.page_info.end_cursor, conn.edges[1].cursor);
        assert!(conn.page_info.has_next_page);
        assert!(!conn.page_info.has_previous_page);
        assert_eq!(conn.total_count, 5);
    }

    #[test]
    fn test_try_map_keeps_page_info() {
        let conn = Connection {
            edges: vec![Edge {
                cursor: "c".to_string(),
                node: 1,
            }],
            page_info: PageInfo {
                has_next_page: true,
                ..PageInfo::default()
            },
            total_count: 3,
        };
        let mapped: Connection<String> =
            conn.clone().try_map(|n| Ok::<_, ()>(n.to_string())).unwrap();
        assert_eq!(mapped.edges[0].node, "1");
        assert_eq!(mapped.page_info, conn.page_info);
        assert_eq!(conn.try_map(|_| Err::<u8, _>("bad")), Err("bad"));
    }
}
