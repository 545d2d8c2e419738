//! # Repository Query
//!
//! The orchestrator: one [`RepositoryQuery`] per annotated repository method,
//! running the binder → assembler → dispatcher → adapter chain synchronously
//! on the calling thread. The compiled template is memoized per query object;
//! everything else is call-local.
//!
//! [`QueryRegistry`] holds the queries of a repository keyed by method name.

use std::sync::Arc;

use dashmap::DashMap;

use crate::adapter::{adapt, ResultProcessor, ReturnValue};
use crate::assembler::assemble;
use crate::binder::bind;
use crate::dispatch::ExecutionDispatcher;
use crate::error::{QueryError, QueryResult};
use crate::metadata::{ProjectionTarget, QueryMethod};
use crate::template::TemplateSlot;
use crate::value::Value;

/// An executable annotated repository query: method metadata, the store
/// session, the result processor, and the compile-once template slot.
pub struct RepositoryQuery {
    method: QueryMethod,
    session: Arc<dyn crate::session::Session>,
    processor: Arc<dyn ResultProcessor>,
    template: TemplateSlot,
}

impl std::fmt::Debug for RepositoryQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryQuery")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl RepositoryQuery {
    /// Create a query for an annotated method
    pub fn new(
        method: QueryMethod,
        session: Arc<dyn crate::session::Session>,
        processor: Arc<dyn ResultProcessor>,
    ) -> Self {
        RepositoryQuery {
            method,
            session,
            processor,
            template: TemplateSlot::new(),
        }
    }

    /// The method this query executes
    pub fn method(&self) -> &QueryMethod {
        &self.method
    }

    /// Execute with the method's declared projection, if any
    pub fn execute(&self, arguments: &[Value]) -> QueryResult<ReturnValue> {
        self.execute_with_projection(arguments, None)
    }

    /// Execute, optionally overriding the declared projection with a
    /// call-time dynamic projection target.
    pub fn execute_with_projection(
        &self,
        arguments: &[Value],
        dynamic_projection: Option<&ProjectionTarget>,
    ) -> QueryResult<ReturnValue> {
        let parameters = bind(
            self.method.name(),
            self.method.parameters(),
            arguments,
            self.session.as_ref(),
        )?;

        let template = self.template.get_or_compile(&self.method);
        let descriptor = assemble(self.method.name(), &template, parameters)?;

        let dispatcher = ExecutionDispatcher::new(self.session.as_ref());
        let execution =
            dispatcher.dispatch(self.method.name(), &descriptor, self.method.return_shape())?;

        let projection = dynamic_projection.or_else(|| self.method.projection());
        adapt(
            execution,
            self.method.return_shape(),
            projection,
            self.processor.as_ref(),
        )
    }

    /// A plain annotated query is never a count query; that classification
    /// belongs to other query kinds.
    pub fn is_count_query(&self) -> bool {
        false
    }

    /// Never an exists query for this query kind
    pub fn is_exists_query(&self) -> bool {
        false
    }

    /// Never a delete query for this query kind
    pub fn is_delete_query(&self) -> bool {
        false
    }
}

/// Concurrent registry of a repository's queries, keyed by method name.
#[derive(Default)]
pub struct QueryRegistry {
    queries: DashMap<String, Arc<RepositoryQuery>>,
}

impl QueryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        QueryRegistry::default()
    }

    /// Register a query under its method name, rejecting duplicates
    pub fn register(&self, query: RepositoryQuery) -> QueryResult<Arc<RepositoryQuery>> {
        let name = query.method().name().to_string();
        let entry = Arc::new(query);
        match self.queries.entry(name.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(QueryError::AlreadyRegistered(name))
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&entry));
                Ok(entry)
            }
        }
    }

    /// Look up a registered query
    pub fn get(&self, method_name: &str) -> Option<Arc<RepositoryQuery>> {
        self.queries.get(method_name).map(|q| Arc::clone(q.value()))
    }

    /// Number of registered queries
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{MetadataResultProcessor, StoreMetadata};
    use crate::metadata::{ParameterDescriptor, ReturnShape};
    use crate::session::{MemorySession, TabularResult};

    fn registry_fixture() -> (Arc<MemorySession>, QueryRegistry) {
        let session = Arc::new(MemorySession::new());
        (session, QueryRegistry::new())
    }

    fn simple_query(session: &Arc<MemorySession>, name: &str) -> RepositoryQuery {
        let method = QueryMethod::new(
            name,
            "MATCH (n) RETURN n",
            None,
            vec![],
            ReturnShape::Collection,
        )
        .unwrap();
        RepositoryQuery::new(
            method,
            Arc::clone(session) as Arc<dyn crate::session::Session>,
            Arc::new(MetadataResultProcessor::new(Arc::new(StoreMetadata::new()))),
        )
    }

    #[test]
    fn test_query_kind_predicates_fixed_false() {
        let (session, _) = registry_fixture();
        let query = simple_query(&session, "findAll");

        assert!(!query.is_count_query());
        assert!(!query.is_exists_query());
        assert!(!query.is_delete_query());
    }

    #[test]
    fn test_registry_rejects_duplicate_names() {
        let (session, registry) = registry_fixture();
        registry.register(simple_query(&session, "findAll")).unwrap();

        let err = registry
            .register(simple_query(&session, "findAll"))
            .unwrap_err();
        assert_eq!(err, QueryError::AlreadyRegistered("findAll".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_lookup_and_execute() {
        let (session, registry) = registry_fixture();
        session.respond(
            "MATCH (n) RETURN n",
            TabularResult::new(vec!["n".into()], vec![vec![Value::Int(1)]]),
        );
        registry.register(simple_query(&session, "findAll")).unwrap();

        let query = registry.get("findAll").expect("registered query");
        let result = query.execute(&[]).unwrap();
        assert_eq!(result, ReturnValue::Collection(vec![Value::Int(1)]));

        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_dynamic_projection_overrides_declared() {
        let (session, registry) = registry_fixture();
        session.respond(
            "MATCH (p:Person) RETURN p.name AS name, p.age AS age",
            TabularResult::new(
                vec!["name".into(), "age".into()],
                vec![vec![Value::from("alice"), Value::Int(30)]],
            ),
        );

        let metadata = Arc::new(StoreMetadata::new());
        metadata.register_projection("NameOnly", vec!["name".to_string()]);
        metadata.register_projection("AgeOnly", vec!["age".to_string()]);

        let method = QueryMethod::new(
            "findSummaries",
            "MATCH (p:Person) RETURN p.name AS name, p.age AS age",
            None,
            vec![],
            ReturnShape::Collection,
        )
        .unwrap()
        .with_projection(ProjectionTarget::new("NameOnly", vec!["name".to_string()]));

        let query = registry
            .register(RepositoryQuery::new(
                method,
                Arc::clone(&session) as Arc<dyn crate::session::Session>,
                Arc::new(MetadataResultProcessor::new(metadata)),
            ))
            .unwrap();

        // Declared projection applies by default.
        let declared = query.execute(&[]).unwrap();
        let ReturnValue::Collection(items) = declared else {
            panic!("expected collection");
        };
        let Value::Map(row) = &items[0] else {
            panic!("expected map row");
        };
        assert!(row.contains_key("name") && !row.contains_key("age"));

        // Dynamic projection wins over the declared one.
        let dynamic = query
            .execute_with_projection(
                &[],
                Some(&ProjectionTarget::new("AgeOnly", vec!["age".to_string()])),
            )
            .unwrap();
        let ReturnValue::Collection(items) = dynamic else {
            panic!("expected collection");
        };
        let Value::Map(row) = &items[0] else {
            panic!("expected map row");
        };
        assert!(row.contains_key("age") && !row.contains_key("name"));
    }

    #[test]
    fn test_parameter_descriptors_flow_through_execute() {
        let (session, _) = registry_fixture();
        session.respond("MATCH (n) WHERE n.name = {name} RETURN n", {
            TabularResult::new(vec!["n".into()], vec![vec![Value::from("alice")]])
        });

        let method = QueryMethod::new(
            "findByName",
            "MATCH (n) WHERE n.name = {name} RETURN n",
            None,
            vec![ParameterDescriptor::named(0, "name")],
            ReturnShape::Single,
        )
        .unwrap();
        let query = RepositoryQuery::new(
            method,
            Arc::clone(&session) as Arc<dyn crate::session::Session>,
            Arc::new(MetadataResultProcessor::new(Arc::new(StoreMetadata::new()))),
        );

        let result = query.execute(&[Value::from("alice")]).unwrap();
        assert_eq!(result, ReturnValue::Single(Some(Value::from("alice"))));

        // Missing argument surfaces as arity mismatch, not a store call.
        let err = query.execute(&[]).unwrap_err();
        assert!(matches!(err, QueryError::ArityMismatch { .. }));
    }
}
