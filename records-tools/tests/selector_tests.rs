//! OpenAI tool selector against a mock chat-completions endpoint

use error_common::{Classify, ErrorKind};
use mockito::Matcher;
use records_tools::*;
use serde_json::json;

fn selector(url: &str) -> OpenAiToolSelector {
    let config = SelectorConfig {
        api_url: url.to_string(),
        api_key: "sk-test".to_string(),
        model: "gpt-3.5-turbo".to_string(),
    };
    OpenAiToolSelector::new(config, &ToolsRegistry::new()).unwrap()
}

#[tokio::test]
async fn returns_tool_calls_in_order() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "model": "gpt-3.5-turbo", "tool_choice": "auto" })),
            Matcher::Regex("You are a medical records assistant".to_string()),
            Matcher::Regex("Get Steven Moss's DOB and MRI scans".to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [
                            {
                                "id": "call_1",
                                "type": "function",
                                "function": { "name": "get_patient_dob", "arguments": "{\"name\": \"Steven Moss\"}" }
                            },
                            {
                                "id": "call_2",
                                "type": "function",
                                "function": { "name": "get_mri_scans", "arguments": "{\"name\": \"Steven Moss\"}" }
                            }
                        ]
                    }
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let selection = selector(&server.url())
        .select("Get Steven Moss's DOB and MRI scans")
        .await
        .unwrap();

    mock.assert_async().await;
    let names: Vec<&str> = selection.calls.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["get_patient_dob", "get_mri_scans"]);
    assert_eq!(selection.calls[0].arguments, json!({ "name": "Steven Moss" }));
    assert_eq!(selection.reply, None);
}

#[tokio::test]
async fn request_advertises_every_tool() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::Regex("\"add_annotation\".*\"get_patient_annotations\"".to_string()))
        .with_status(200)
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#)
        .create_async()
        .await;

    let selection = selector(&server.url()).select("hi").await.unwrap();
    assert!(selection.calls.is_empty());
    assert_eq!(selection.reply.as_deref(), Some("Hello"));
}

#[tokio::test]
async fn api_error_is_upstream_failure() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .with_body(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
        .create_async()
        .await;

    let err = selector(&server.url()).select("hi").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    assert!(err.to_string().contains("Incorrect API key provided"));
}
