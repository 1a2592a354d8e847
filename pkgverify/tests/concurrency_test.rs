mod common;

use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinSet;

use pkgverify::{PackageDescriptor, ValidationError};

use common::{MockRegistry, RunningRegistry, validator};

enum Expected {
    Owned,
    Mismatch,
    InvalidReference,
}

struct Case {
    registry: RunningRegistry,
    identifier: String,
    server_name: String,
    expected: Expected,
}

async fn case(i: usize) -> Case {
    let labelled_as = format!("com.example/server-{}", i);
    let (identifier, server_name, expected) = match i % 3 {
        0 => (format!("ns{}/repo{}", i, i), labelled_as.clone(), Expected::Owned),
        1 => (
            format!("ns{}/repo{}", i, i),
            format!("com.other/server-{}", i),
            Expected::Mismatch,
        ),
        _ => (
            format!("ns{}/group/repo{}", i, i),
            labelled_as.clone(),
            Expected::InvalidReference,
        ),
    };

    let registry = MockRegistry::new()
        .image(
            &format!("ns{}/repo{}", i, i),
            "latest",
            json!({ "io.modelcontextprotocol.server.name": labelled_as }),
        )
        .start()
        .await;

    Case {
        registry,
        identifier,
        server_name,
        expected,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_validations_are_independent() {
    let mut cases = Vec::new();
    for i in 0..12 {
        cases.push(case(i).await);
    }

    let validator = Arc::new(validator());
    let mut tasks = JoinSet::new();
    for (i, case) in cases.iter().enumerate().rev() {
        let validator = Arc::clone(&validator);
        let package = PackageDescriptor::oci(&case.registry.base_url, &case.identifier, "latest");
        let server_name = case.server_name.clone();
        tasks.spawn(async move {
            (i, validator.validate_ownership(&package, &server_name).await)
        });
    }

    let mut seen = 0;
    while let Some(joined) = tasks.join_next().await {
        let (i, result) = joined.unwrap();
        match (&cases[i].expected, result) {
            (Expected::Owned, Ok(())) => {}
            (
                Expected::Mismatch,
                Err(ValidationError::OwnershipMismatch { expected, actual, .. }),
            ) => {
                assert_eq!(expected, cases[i].server_name);
                assert_eq!(actual, format!("com.example/server-{}", i));
            }
            (Expected::InvalidReference, Err(ValidationError::InvalidReference(_))) => {
                assert!(cases[i].registry.requests().is_empty());
            }
            (_, result) => panic!("case {} produced unexpected result {:?}", i, result),
        }
        seen += 1;
    }
    assert_eq!(seen, cases.len());
}
