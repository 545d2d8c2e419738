//! End-to-end pipeline tests: bind → compile → assemble → dispatch → adapt
//! against the in-memory session.

use std::sync::Arc;

use graphrepo::{
    MemorySession, MetadataResultProcessor, ParameterDescriptor, ProjectionTarget, QueryError,
    QueryMethod, RepositoryQuery, ReturnShape, ReturnValue, StoreMetadata, TabularResult, Value,
};

// Test Helpers
fn session() -> Arc<MemorySession> {
    Arc::new(MemorySession::new())
}

fn processor() -> Arc<MetadataResultProcessor> {
    let metadata = Arc::new(StoreMetadata::new());
    metadata.register_projection("PersonName", vec!["name".to_string()]);
    Arc::new(MetadataResultProcessor::new(metadata))
}

fn query(session: &Arc<MemorySession>, method: QueryMethod) -> RepositoryQuery {
    RepositoryQuery::new(
        method,
        Arc::clone(session) as Arc<dyn graphrepo::Session>,
        processor(),
    )
}

#[test]
fn test_entity_argument_resolves_to_persisted_id() {
    // A persisted Person passed as the {0} argument binds index "0" to its
    // store identity 42, not the entity itself.
    let session = session();
    let key = Value::String("alice".into());
    session.persist_entity("Person", &key, Value::Int(42));
    session.respond(
        "MATCH (n:Person) WHERE n.id = {0} RETURN n",
        TabularResult::new(vec!["n".into()], vec![vec![Value::from("alice-node")]]),
    );

    let method = QueryMethod::new(
        "findSelf",
        "MATCH (n:Person) WHERE n.id = {0} RETURN n",
        None,
        vec![ParameterDescriptor::positional(0)],
        ReturnShape::Single,
    )
    .unwrap();

    let result = query(&session, method)
        .execute(&[Value::entity("Person", key)])
        .unwrap();
    assert_eq!(result, ReturnValue::Single(Some(Value::from("alice-node"))));
}

#[test]
fn test_repeated_execution_reuses_compiled_template() {
    // Same method, different arguments: one compiled template, two resolved
    // queries, equivalent descriptors for equal arguments.
    let session = session();
    session.respond(
        "MATCH (n) WHERE n.name = {name} RETURN n",
        TabularResult::new(vec!["n".into()], vec![vec![Value::Int(1)]]),
    );

    let method = QueryMethod::new(
        "findByName",
        "MATCH (n) WHERE n.name = {name} RETURN n",
        None,
        vec![ParameterDescriptor::named(0, "name")],
        ReturnShape::Collection,
    )
    .unwrap();
    let repo_query = query(&session, method);

    let first = repo_query.execute(&[Value::from("alice")]).unwrap();
    let second = repo_query.execute(&[Value::from("alice")]).unwrap();
    let different = repo_query.execute(&[Value::from("bob")]).unwrap();

    assert_eq!(first, second);
    // Different arguments still execute; the canned store answers by text.
    assert_eq!(different, first);
}

#[test]
fn test_concurrent_executions_share_one_method() {
    let session = session();
    session.respond(
        "MATCH (n) RETURN n",
        TabularResult::new(vec!["n".into()], vec![vec![Value::Int(7)]]),
    );

    let method = QueryMethod::new(
        "findAll",
        "MATCH (n) RETURN n",
        None,
        vec![],
        ReturnShape::Collection,
    )
    .unwrap();
    let repo_query = Arc::new(query(&session, method));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let q = Arc::clone(&repo_query);
            std::thread::spawn(move || q.execute(&[]))
        })
        .collect();

    for handle in handles {
        let result = handle.join().expect("execute thread panicked").unwrap();
        assert_eq!(result, ReturnValue::Collection(vec![Value::Int(7)]));
    }
}

#[test]
fn test_raw_shape_returns_store_result_untouched() {
    let session = session();
    let raw = TabularResult::new(
        vec!["a".into(), "b".into()],
        vec![vec![Value::Int(1), Value::Int(2)]],
    );
    session.respond("RETURN 1, 2", raw.clone());

    let method = QueryMethod::new("rawResult", "RETURN 1, 2", None, vec![], ReturnShape::Raw)
        .unwrap()
        // A declared projection must not trigger conversion for raw shapes.
        .with_projection(ProjectionTarget::new("PersonName", vec!["name".to_string()]));

    let result = query(&session, method).execute(&[]).unwrap();
    assert_eq!(result, ReturnValue::Raw(raw));
}

#[test]
fn test_paged_query_runs_count_query() {
    let session = session();
    session.respond(
        "MATCH (n:Person) WHERE n.name = {name} RETURN n",
        TabularResult::new(
            vec!["n".into()],
            vec![vec![Value::from("alice")], vec![Value::from("alice2")]],
        ),
    );
    session.respond(
        "MATCH (n:Person) WHERE n.name = {name} RETURN count(n)",
        TabularResult::new(vec!["count(n)".into()], vec![vec![Value::Int(31)]]),
    );

    let method = QueryMethod::new(
        "findPage",
        "MATCH (n:Person) WHERE n.name = {name} RETURN n",
        Some("MATCH (n:Person) WHERE n.name = {name} RETURN count(n)".to_string()),
        vec![
            ParameterDescriptor::named(0, "name"),
            ParameterDescriptor::special(1, "pageable"),
        ],
        ReturnShape::Paged,
    )
    .unwrap();

    let result = query(&session, method)
        .execute(&[Value::from("alice"), Value::Int(0)])
        .unwrap();
    assert_eq!(
        result,
        ReturnValue::Page {
            items: vec![Value::from("alice"), Value::from("alice2")],
            total: Some(31),
        }
    );
}

#[test]
fn test_unresolved_placeholder_fails_before_store() {
    let session = session();
    // No canned response needed: assembly must fail first.
    let method = QueryMethod::new(
        "findByCity",
        "MATCH (n) WHERE n.city = {city} RETURN n",
        None,
        vec![ParameterDescriptor::named(0, "name")],
        ReturnShape::Collection,
    )
    .unwrap();

    let err = query(&session, method)
        .execute(&[Value::from("alice")])
        .unwrap_err();
    assert_eq!(
        err,
        QueryError::UnresolvedParameter {
            method: "findByCity".to_string(),
            placeholder: "city".to_string(),
        }
    );
}

#[test]
fn test_store_failure_reaches_caller_unwrapped() {
    let session = session();
    session.fail("MTCH (n) RETURN n", "Invalid input 'MTCH'");

    let method = QueryMethod::new(
        "typo",
        "MTCH (n) RETURN n",
        None,
        vec![],
        ReturnShape::Collection,
    )
    .unwrap();

    let err = query(&session, method).execute(&[]).unwrap_err();
    assert!(matches!(err, QueryError::Store(_)));
    assert_eq!(format!("{err}"), "Invalid input 'MTCH'");
}

#[test]
fn test_conversion_failure_distinct_from_store_failure() {
    let session = session();
    session.respond(
        "MATCH (n) RETURN n",
        TabularResult::new(
            vec!["n".into()],
            vec![vec![Value::Int(1)], vec![Value::Int(2)]],
        ),
    );

    let method = QueryMethod::new(
        "findOne",
        "MATCH (n) RETURN n",
        None,
        vec![],
        ReturnShape::Single,
    )
    .unwrap();

    let err = query(&session, method).execute(&[]).unwrap_err();
    assert!(matches!(err, QueryError::Conversion(_)));
}
