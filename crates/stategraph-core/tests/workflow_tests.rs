//! End-to-end workflow scenarios
//!
//! The running example is the job-application flow: analyze a job
//! description, and only when it is suitable, generate an application.

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use stategraph_core::state::{AppendReducer, OverwriteReducer};
use stategraph_core::{
    FailureKind, GraphError, NodeError, NodeId, RetryPolicy, RunConfig, StateGraph, END,
};

/// Build the tutorial graph: analyze -> [conditional] -> generate -> END.
///
/// `analyze` marks the job suitable when the description is longer than 100
/// characters; `generate` records the application and appends an action.
/// `generate_calls` counts how often the downstream node actually ran.
fn job_application_graph(generate_calls: Arc<AtomicUsize>) -> StateGraph {
    let mut graph = StateGraph::new();
    graph
        .add_field("job_description", Box::new(OverwriteReducer))
        .add_field("is_suitable", Box::new(OverwriteReducer))
        .add_field("application", Box::new(OverwriteReducer))
        .add_field("actions", Box::new(AppendReducer));

    graph.add_node("analyze", |state: Value, _config| async move {
        let jd = state["job_description"].as_str().unwrap_or("");
        Ok(json!({"is_suitable": jd.len() > 100, "actions": ["action1"]}))
    });

    graph.add_node("generate", move |_state, config: RunConfig| {
        let calls = generate_calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            let provider = config.str_or("model_provider", "Google").to_string();
            Ok(json!({
                "application": format!("application via {provider}"),
                "actions": ["action2"],
            }))
        }
    });

    graph.set_entry("analyze");
    graph.add_conditional_edge(
        "analyze",
        |state: &Value| -> NodeId {
            if state["is_suitable"].as_bool().unwrap_or(false) {
                "generate".to_string()
            } else {
                END.to_string()
            }
        },
        ["generate", END],
    );
    graph.add_edge("generate", END);
    graph
}

fn long_description() -> String {
    "software engineer role ".repeat(10)
}

#[tokio::test]
async fn short_description_ends_after_analyze() {
    let generate_calls = Arc::new(AtomicUsize::new(0));
    let compiled = job_application_graph(generate_calls.clone()).compile().unwrap();

    let result = compiled
        .invoke(json!({"job_description": "short"}))
        .await
        .unwrap();

    assert_eq!(result["is_suitable"], json!(false));
    assert!(result.get("application").is_none());
    assert_eq!(result["actions"], json!(["action1"]));
    assert_eq!(generate_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn suitable_description_runs_generate_exactly_once() {
    let generate_calls = Arc::new(AtomicUsize::new(0));
    let compiled = job_application_graph(generate_calls.clone()).compile().unwrap();

    let result = compiled
        .invoke(json!({"job_description": long_description()}))
        .await
        .unwrap();

    assert_eq!(result["is_suitable"], json!(true));
    assert_eq!(result["application"], json!("application via Google"));
    assert_eq!(result["actions"], json!(["action1", "action2"]));
    assert_eq!(generate_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_config_reaches_nodes_read_only() {
    let generate_calls = Arc::new(AtomicUsize::new(0));
    let compiled = job_application_graph(generate_calls).compile().unwrap();

    let config = RunConfig::new().with_option("model_provider", "fake");
    let result = compiled
        .invoke_with_config(json!({"job_description": long_description()}), config)
        .await
        .unwrap();

    assert_eq!(result["application"], json!("application via fake"));
}

#[tokio::test]
async fn generate_appends_to_empty_actions() {
    // Same shape, but analyze writes no actions: generate starts the list.
    let mut graph = StateGraph::new();
    graph
        .add_field("job_description", Box::new(OverwriteReducer))
        .add_field("is_suitable", Box::new(OverwriteReducer))
        .add_field("application", Box::new(OverwriteReducer))
        .add_field("actions", Box::new(AppendReducer));

    graph.add_node("analyze", |_state, _config| async move {
        Ok(json!({"is_suitable": true}))
    });
    graph.add_node("generate", |_state, _config| async move {
        Ok(json!({"application": "some_fake_application", "actions": ["action2"]}))
    });
    graph.set_entry("analyze");
    graph.add_conditional_edge(
        "analyze",
        |state: &Value| -> NodeId {
            if state["is_suitable"].as_bool().unwrap_or(false) {
                "generate".to_string()
            } else {
                END.to_string()
            }
        },
        ["generate", END],
    );
    graph.add_edge("generate", END);

    let compiled = graph.compile().unwrap();
    let result = compiled.invoke(json!({"job_description": "jd"})).await.unwrap();

    assert_eq!(result["application"], json!("some_fake_application"));
    assert_eq!(result["actions"], json!(["action2"]));
}

#[tokio::test]
async fn identical_runs_produce_identical_final_states() {
    let compiled = job_application_graph(Arc::new(AtomicUsize::new(0)))
        .compile()
        .unwrap();

    let input = json!({"job_description": long_description()});
    let first = compiled.invoke(input.clone()).await.unwrap();
    let second = compiled.invoke(input).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn compiled_graph_is_shareable_across_concurrent_runs() {
    let compiled = Arc::new(
        job_application_graph(Arc::new(AtomicUsize::new(0)))
            .compile()
            .unwrap(),
    );

    let long = tokio::spawn({
        let compiled = compiled.clone();
        let jd = long_description();
        async move { compiled.invoke(json!({"job_description": jd})).await }
    });
    let short = tokio::spawn({
        let compiled = compiled.clone();
        async move { compiled.invoke(json!({"job_description": "short"})).await }
    });

    let long = long.await.unwrap().unwrap();
    let short = short.await.unwrap().unwrap();

    assert_eq!(long["actions"], json!(["action1", "action2"]));
    assert_eq!(short["actions"], json!(["action1"]));
}

#[tokio::test]
async fn node_failure_names_node_and_kind() {
    let mut graph = StateGraph::new();
    graph.add_field("x", Box::new(OverwriteReducer));
    graph.add_node("broken", |_, _| async {
        Err(NodeError::fatal("backend rejected the request"))
    });
    graph.set_entry("broken").add_edge("broken", END);

    let compiled = graph.compile().unwrap();
    let err = compiled.invoke(json!({})).await.unwrap_err();

    match err {
        GraphError::NodeExecution { node, source } => {
            assert_eq!(node, "broken");
            assert_eq!(source.kind, FailureKind::Fatal);
        }
        other => panic!("expected NodeExecution, got {other:?}"),
    }
}

#[tokio::test]
async fn retried_node_recovers_inside_a_graph_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut graph = StateGraph::new();
    graph
        .add_field("is_suitable", Box::new(OverwriteReducer))
        .add_field("application", Box::new(OverwriteReducer));

    let policy = RetryPolicy::new(2)
        .with_initial_interval(0.001)
        .with_jitter(false)
        .retry_on(FailureKind::Transient);

    // Fails on odd-numbered calls, succeeds on even-numbered calls.
    graph.add_node_with_retry(
        "analyze",
        move |_state, _config| {
            let counter = counter.clone();
            async move {
                let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if call % 2 == 1 {
                    Err(NodeError::transient("something went wrong"))
                } else {
                    Ok(json!({"is_suitable": true}))
                }
            }
        },
        policy,
    );
    graph.add_node("generate", |_state, _config| async move {
        Ok(json!({"application": "some_fake_application"}))
    });
    graph.set_entry("analyze");
    graph.add_conditional_edge(
        "analyze",
        |state: &Value| -> NodeId {
            if state["is_suitable"].as_bool().unwrap_or(false) {
                "generate".to_string()
            } else {
                END.to_string()
            }
        },
        ["generate", END],
    );
    graph.add_edge("generate", END);

    let compiled = graph.compile().unwrap();
    let result = compiled.invoke(json!({})).await.unwrap();

    assert_eq!(result["application"], json!("some_fake_application"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
